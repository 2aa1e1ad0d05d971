use ocperms_schema::{
    parse_request_document, parse_response_document, DataRegistry, RegistryConfig,
    RequestDocument, ResponseDocument, SchemaError,
};

use crate::cmd::{read_input, DocumentKind, ValidateArgs};
use crate::exit::{schema_error, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_report, EntryReport, OutputFormat, ValidationReport};

pub fn run(args: ValidateArgs, format: OutputFormat) -> CliResult<i32> {
    let registry = load_registry(&args)?;
    let payload = read_input(&args.input)?;

    let report = match args.kind {
        DocumentKind::Request => request_report(&payload, registry.as_ref())?,
        DocumentKind::Response => response_report(&payload, registry.as_ref())?,
    };

    if let Some(error) = &report.error {
        tracing::info!(kind = args.kind.as_str(), path = %error.path, "document rejected");
    }
    print_report(&report, format);

    if report.valid {
        Ok(SUCCESS)
    } else {
        Ok(DATA_INVALID)
    }
}

fn load_registry(args: &ValidateArgs) -> CliResult<Option<DataRegistry>> {
    let Some(dir) = &args.schemas else {
        return Ok(None);
    };

    let config = RegistryConfig {
        strict_mode: args.strict,
        fail_on_unknown_type: args.fail_on_unknown_type,
        max_schema_files: args.max_schema_files,
        max_schema_bytes: args.max_schema_bytes,
    };
    let registry = DataRegistry::from_directory_with_config(dir, config)
        .map_err(|err| schema_error(&format!("failed loading {}", dir.display()), err))?;
    tracing::debug!(?registry, "loaded data schemas");
    Ok(Some(registry))
}

fn request_report(payload: &[u8], registry: Option<&DataRegistry>) -> CliResult<ValidationReport> {
    let kind = DocumentKind::Request;
    let document = match parse_request_document(payload) {
        Ok(document) => document,
        Err(SchemaError::Invalid(err)) => return Ok(ValidationReport::rejected(kind, None, &err)),
        Err(err) => return Err(schema_error("failed parsing request", err)),
    };

    if let Some(registry) = registry {
        if let Err(err) = registry.check_request_document(&document) {
            return Ok(ValidationReport::rejected(kind, Some(document.version()), &err));
        }
    }

    Ok(ValidationReport::accepted(
        kind,
        document.version(),
        request_entries(&document),
    ))
}

fn response_report(payload: &[u8], registry: Option<&DataRegistry>) -> CliResult<ValidationReport> {
    let kind = DocumentKind::Response;
    let document = match parse_response_document(payload) {
        Ok(document) => document,
        Err(SchemaError::Invalid(err)) => return Ok(ValidationReport::rejected(kind, None, &err)),
        Err(err) => return Err(schema_error("failed parsing response", err)),
    };

    if let Some(registry) = registry {
        if let Err(err) = registry.check_response_document(&document) {
            return Ok(ValidationReport::rejected(kind, Some(document.version()), &err));
        }
    }

    Ok(ValidationReport::accepted(
        kind,
        document.version(),
        response_entries(&document),
    ))
}

pub(crate) fn request_entries(document: &RequestDocument) -> Vec<EntryReport> {
    match document {
        RequestDocument::V1(request) => request
            .permissions
            .iter()
            .enumerate()
            .map(|(index, permission)| EntryReport {
                index,
                type_name: permission.kind.name().to_string(),
                chain_id: None,
                required: Some(permission.required),
                detail: permission.justification.clone().unwrap_or_default(),
            })
            .collect(),
        RequestDocument::V2(requests) => requests
            .iter()
            .enumerate()
            .map(|(index, request)| EntryReport {
                index,
                type_name: request.type_name().to_string(),
                chain_id: Some(request.chain_id.to_string()),
                required: Some(request.required),
                detail: request.justification.clone().unwrap_or_default(),
            })
            .collect(),
    }
}

pub(crate) fn response_entries(document: &ResponseDocument) -> Vec<EntryReport> {
    match document {
        ResponseDocument::V1(response) => response
            .granted_permissions
            .iter()
            .enumerate()
            .map(|(index, grant)| EntryReport {
                index,
                type_name: grant.kind.name().to_string(),
                chain_id: None,
                required: None,
                detail: grant_detail(&grant.permissions_context, grant.account_meta.is_some()),
            })
            .collect(),
        ResponseDocument::V2(grants) => grants
            .iter()
            .enumerate()
            .map(|(index, grant)| EntryReport {
                index,
                type_name: grant
                    .permission
                    .as_ref()
                    .map(|request| request.type_name().to_string())
                    .unwrap_or_else(|| "-".to_string()),
                chain_id: grant
                    .permission
                    .as_ref()
                    .map(|request| request.chain_id.to_string()),
                required: None,
                detail: grant_detail(&grant.context, grant.needs_deployment()),
            })
            .collect(),
    }
}

fn grant_detail(context: &str, needs_deployment: bool) -> String {
    if needs_deployment {
        format!("context={context} (deploy account first)")
    } else {
        format!("context={context}")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const ACCOUNT: &str = "0x1111111111111111111111111111111111111111";

    #[test]
    fn request_entries_follow_document_order() {
        let payload = serde_json::to_vec(&json!([
            { "chainId": 1, "permission": { "type": "native-token-transfer" } },
            {
                "chainId": 137,
                "permission": { "type": "erc20-token-transfer" },
                "required": false,
                "justification": "swap"
            }
        ]))
        .unwrap();

        let report = request_report(&payload, None).unwrap();
        assert!(report.valid);
        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.entries[1].chain_id.as_deref(), Some("137"));
        assert_eq!(report.entries[1].required, Some(false));
        assert_eq!(report.entries[1].detail, "swap");
    }

    #[test]
    fn invalid_request_reports_path() {
        let payload = br#"[{"chainId":1,"permission":{"type":"x"}},{"permission":{"type":"x"}}]"#;
        let report = request_report(payload, None).unwrap();

        assert!(!report.valid);
        assert_eq!(report.error.unwrap().path, "[1].chainId");
    }

    #[test]
    fn malformed_json_is_a_cli_error() {
        let err = request_report(b"{", None).unwrap_err();
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn response_entries_flag_deployment() {
        let payload = serde_json::to_vec(&json!([{
            "context": "0xabc",
            "signerMeta": {},
            "accountMeta": { "factory": ACCOUNT, "factoryData": "0xdead" }
        }]))
        .unwrap();

        let report = response_report(&payload, None).unwrap();
        assert!(report.valid);
        assert_eq!(report.entries[0].type_name, "-");
        assert!(report.entries[0].detail.contains("deploy account first"));
    }

    #[test]
    fn registry_rejection_keeps_version() {
        let mut registry = DataRegistry::new();
        registry
            .register(
                ocperms_schema::DataKind::Permission,
                "native-token-transfer",
                r#"{"type":"object","required":["allowance"]}"#,
            )
            .unwrap();

        let payload = serde_json::to_vec(&json!({
            "permissions": [{ "type": "native-token-transfer", "policies": [] }]
        }))
        .unwrap();
        let report = request_report(&payload, Some(&registry)).unwrap();

        assert!(!report.valid);
        assert_eq!(report.version, Some(ocperms_schema::WireVersion::V1));
        assert_eq!(report.error.unwrap().path, "permissions[0].data");
    }
}
