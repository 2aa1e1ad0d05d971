use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand, ValueEnum};
use ocperms_schema::{DEFAULT_MAX_SCHEMA_BYTES, DEFAULT_MAX_SCHEMA_FILES};
use serde::Serialize;

use crate::exit::{io_error, CliResult};
use crate::output::OutputFormat;

pub mod normalize;
pub mod validate;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a permissions request or grant response.
    Validate(ValidateArgs),
    /// Print the canonical JSON of a valid document.
    Normalize(NormalizeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Validate(args) => validate::run(args, format),
        Command::Normalize(args) => normalize::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Which side of the exchange a document comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Sent by the requesting application.
    Request,
    /// Returned by the grantor.
    Response,
}

impl DocumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Response => "response",
        }
    }
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Document to read, or `-` for stdin.
    pub input: PathBuf,
    /// Document kind.
    #[arg(long, value_enum, default_value = "request")]
    pub kind: DocumentKind,
    /// Directory of `permission.<type>.schema.json` / `policy.<type>.schema.json` files.
    #[arg(long, value_name = "DIR")]
    pub schemas: Option<PathBuf>,
    /// Reject data properties the schemas do not declare.
    #[arg(long, requires = "schemas")]
    pub strict: bool,
    /// Reject permission and policy types without a schema.
    #[arg(long, requires = "schemas")]
    pub fail_on_unknown_type: bool,
    /// Refuse schema directories holding more schema files than this.
    #[arg(long, value_name = "COUNT", requires = "schemas", default_value_t = DEFAULT_MAX_SCHEMA_FILES)]
    pub max_schema_files: usize,
    /// Refuse schema files larger than this many bytes.
    #[arg(long, value_name = "BYTES", requires = "schemas", default_value_t = DEFAULT_MAX_SCHEMA_BYTES)]
    pub max_schema_bytes: usize,
}

#[derive(Args, Debug)]
pub struct NormalizeArgs {
    /// Document to read, or `-` for stdin.
    pub input: PathBuf,
    /// Document kind.
    #[arg(long, value_enum, default_value = "request")]
    pub kind: DocumentKind,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn read_input(path: &Path) -> CliResult<Vec<u8>> {
    if path == Path::new("-") {
        let mut payload = Vec::new();
        std::io::stdin()
            .read_to_end(&mut payload)
            .map_err(|err| io_error("failed reading stdin", err))?;
        return Ok(payload);
    }

    std::fs::read(path).map_err(|err| io_error(&format!("failed reading {}", path.display()), err))
}
