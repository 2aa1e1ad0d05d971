use ocperms_schema::{parse_request_document, parse_response_document};
use serde::Serialize;

use crate::cmd::{read_input, DocumentKind, NormalizeArgs};
use crate::exit::{schema_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::OutputFormat;

pub fn run(args: NormalizeArgs, format: OutputFormat) -> CliResult<i32> {
    let payload = read_input(&args.input)?;

    let rendered = match args.kind {
        DocumentKind::Request => {
            let document = parse_request_document(&payload)
                .map_err(|err| schema_error("invalid request", err))?;
            render(&document, format)?
        }
        DocumentKind::Response => {
            let document = parse_response_document(&payload)
                .map_err(|err| schema_error("invalid response", err))?;
            render(&document, format)?
        }
    };

    println!("{rendered}");
    Ok(SUCCESS)
}

/// Compact for `json`, indented otherwise.
fn render<T: Serialize>(document: &T, format: OutputFormat) -> CliResult<String> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string(document),
        OutputFormat::Table | OutputFormat::Pretty => serde_json::to_string_pretty(document),
    };
    rendered.map_err(|err| CliError::new(INTERNAL, format!("failed rendering document: {err}")))
}
