use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use ocperms_schema::{ValidationError, WireVersion};
use serde::Serialize;

use crate::cmd::DocumentKind;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// One permission or grant of an accepted document.
#[derive(Debug, Serialize)]
pub struct EntryReport {
    pub index: usize,
    pub type_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub path: String,
    pub kind: &'static str,
    pub message: String,
}

impl From<&ValidationError> for ErrorReport {
    fn from(err: &ValidationError) -> Self {
        Self {
            path: err.path().to_string(),
            kind: err.root_cause().kind().as_str(),
            message: err.reason(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub schema_id: &'static str,
    pub kind: DocumentKind,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<WireVersion>,
    pub entries: Vec<EntryReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

const REPORT_SCHEMA_ID: &str = "ocperms/cli/v1/validation-report";

impl ValidationReport {
    pub fn accepted(kind: DocumentKind, version: WireVersion, entries: Vec<EntryReport>) -> Self {
        Self {
            schema_id: REPORT_SCHEMA_ID,
            kind,
            valid: true,
            version: Some(version),
            entries,
            error: None,
        }
    }

    /// `version` is known when the shape dispatched but a later check failed.
    pub fn rejected(
        kind: DocumentKind,
        version: Option<WireVersion>,
        err: &ValidationError,
    ) -> Self {
        Self {
            schema_id: REPORT_SCHEMA_ID,
            kind,
            valid: false,
            version,
            entries: Vec::new(),
            error: Some(ErrorReport::from(err)),
        }
    }
}

pub fn print_report(report: &ValidationReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(report).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => match &report.error {
            Some(error) => {
                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(vec!["PATH", "KIND", "MESSAGE"])
                    .add_row(vec![
                        error.path.clone(),
                        error.kind.to_string(),
                        error.message.clone(),
                    ]);
                println!("{table}");
            }
            None => {
                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(vec!["#", "TYPE", "CHAIN", "REQUIRED", "DETAIL"]);
                for entry in &report.entries {
                    table.add_row(vec![
                        entry.index.to_string(),
                        entry.type_name.clone(),
                        entry.chain_id.clone().unwrap_or_else(|| "-".to_string()),
                        entry
                            .required
                            .map(|required| required.to_string())
                            .unwrap_or_else(|| "-".to_string()),
                        entry.detail.clone(),
                    ]);
                }
                println!("{table}");
            }
        },
        OutputFormat::Pretty => {
            let version = report
                .version
                .map(|version| version.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            match &report.error {
                Some(error) => println!(
                    "{} {version}: invalid at {} ({}): {}",
                    report.kind.as_str(),
                    error.path,
                    error.kind,
                    error.message
                ),
                None => {
                    println!(
                        "{} {version}: valid, {} entries",
                        report.kind.as_str(),
                        report.entries.len()
                    );
                    for entry in &report.entries {
                        println!("  [{}] {} {}", entry.index, entry.type_name, entry.detail);
                    }
                }
            }
        }
    }
}
