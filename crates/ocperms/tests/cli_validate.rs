#![cfg(feature = "cli")]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

const FACTORY: &str = "0x1111111111111111111111111111111111111111";

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "ocperms-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("fixture should be writable");
    path
}

fn ocperms(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ocperms"))
        .args(["--log-level", "error", "--format", "json"])
        .args(args)
        .output()
        .expect("ocperms should run")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

const V2_REQUEST: &str = r#"[
    {
        "chainId": 1,
        "permission": { "type": "native-token-transfer", "data": { "allowance": "0x10" } },
        "policies": [{ "type": "rate-limit", "data": { "count": 2, "interval": 60 } }]
    },
    {
        "chainId": 10,
        "account": "0x2222222222222222222222222222222222222222",
        "permission": { "type": { "name": "erc20-token-transfer" } },
        "required": false
    }
]"#;

#[test]
fn valid_v2_request_succeeds() {
    let dir = unique_temp_dir("valid-v2");
    let input = write_file(&dir, "request.json", V2_REQUEST);

    let output = ocperms(&["validate", input.to_str().unwrap()]);
    assert!(output.status.success());

    let report = stdout_json(&output);
    assert_eq!(report["valid"], true);
    assert_eq!(report["version"], "v2");
    assert_eq!(report["entries"][1]["type_name"], "erc20-token-transfer");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn invalid_element_exits_60_with_path() {
    let dir = unique_temp_dir("invalid-element");
    let input = write_file(
        &dir,
        "request.json",
        r#"[{ "chainId": 1, "permission": { "type": "x" } }, { "permission": { "type": "x" } }]"#,
    );

    let output = ocperms(&["validate", input.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(60));

    let report = stdout_json(&output);
    assert_eq!(report["valid"], false);
    assert_eq!(report["error"]["path"], "[1].chainId");
    assert_eq!(report["error"]["kind"], "missing_field");
    assert_eq!(report["error"]["message"], "missing required field");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn v1_response_is_detected() {
    let dir = unique_temp_dir("v1-response");
    let input = write_file(
        &dir,
        "response.json",
        r#"{
            "grantedPermissions": [{
                "sessionAccount": { "type": "address", "data": {} },
                "type": "native-token-transfer",
                "signerMeta": {},
                "permissionsContext": "0x01"
            }],
            "expiry": 1700000000
        }"#,
    );

    let output = ocperms(&["validate", "--kind", "response", input.to_str().unwrap()]);
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["version"], "v1");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn schema_directory_rejects_policy_data() {
    let dir = unique_temp_dir("schema-dir");
    let schemas = dir.join("schemas");
    std::fs::create_dir_all(&schemas).expect("schema dir should be creatable");
    write_file(
        &schemas,
        "policy.rate-limit.schema.json",
        r#"{
            "type": "object",
            "properties": { "count": { "type": "integer", "maximum": 1 } },
            "required": ["count"]
        }"#,
    );
    let input = write_file(&dir, "request.json", V2_REQUEST);

    let output = ocperms(&[
        "validate",
        input.to_str().unwrap(),
        "--schemas",
        schemas.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(60));

    let report = stdout_json(&output);
    assert_eq!(report["version"], "v2");
    assert_eq!(report["error"]["path"], "[0].policies[0].data");
    assert_eq!(report["error"]["kind"], "data_rejected");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn schema_file_limit_fails_load() {
    let dir = unique_temp_dir("schema-limit");
    let schemas = dir.join("schemas");
    std::fs::create_dir_all(&schemas).expect("schema dir should be creatable");
    write_file(&schemas, "policy.a.schema.json", r#"{ "type": "object" }"#);
    write_file(&schemas, "policy.b.schema.json", r#"{ "type": "object" }"#);
    let input = write_file(&dir, "request.json", V2_REQUEST);

    let output = ocperms(&[
        "validate",
        input.to_str().unwrap(),
        "--schemas",
        schemas.to_str().unwrap(),
        "--max-schema-files",
        "1",
    ]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("schema count exceeds"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn v1_request_accepts_opaque_data() {
    let dir = unique_temp_dir("v1-opaque");
    let input = write_file(
        &dir,
        "request.json",
        r#"{
            "signer": { "type": "address", "data": "0x4444444444444444444444444444444444444444" },
            "permissions": [{ "type": "native-token-transfer", "data": "0xdeadbeef", "policies": [] }]
        }"#,
    );

    let output = ocperms(&["validate", input.to_str().unwrap()]);
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["version"], "v1");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn unknown_types_fail_when_requested() {
    let dir = unique_temp_dir("unknown-type");
    let schemas = dir.join("schemas");
    std::fs::create_dir_all(&schemas).expect("schema dir should be creatable");
    write_file(
        &schemas,
        "permission.native-token-transfer.schema.json",
        r#"{ "type": "object" }"#,
    );
    let input = write_file(&dir, "request.json", V2_REQUEST);

    let output = ocperms(&[
        "validate",
        input.to_str().unwrap(),
        "--schemas",
        schemas.to_str().unwrap(),
        "--fail-on-unknown-type",
    ]);
    assert_eq!(output.status.code(), Some(60));
    assert_eq!(stdout_json(&output)["error"]["path"], "[0].policies[0].type");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn malformed_json_exits_60() {
    let dir = unique_temp_dir("malformed");
    let input = write_file(&dir, "request.json", "[{");

    let output = ocperms(&["validate", input.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(60));
    assert!(String::from_utf8_lossy(&output.stderr).contains("not valid JSON"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_input_exits_64() {
    let output = ocperms(&["validate", "/definitely/not/here/request.json"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn normalize_reads_stdin_and_applies_defaults() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_ocperms"))
        .args(["--format", "json", "normalize", "--kind", "response", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("normalize should start");

    let payload = format!(
        r#"[{{
            "context": "0xabc",
            "signerMeta": {{}},
            "accountMeta": {{ "factory": "{FACTORY}", "factoryData": "0xdead" }},
            "permission": {{ "chainId": 1, "permission": {{ "type": "x" }} }}
        }}]"#
    );
    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(payload.as_bytes())
        .expect("stdin should accept payload");

    let output = child.wait_with_output().expect("normalize should finish");
    assert!(output.status.success());

    let normalized = stdout_json(&output);
    assert_eq!(normalized[0]["permission"]["required"], true);
    assert_eq!(normalized[0]["accountMeta"]["factory"], FACTORY);
}

#[test]
fn normalize_rejects_invalid_document() {
    let dir = unique_temp_dir("normalize-invalid");
    let input = write_file(&dir, "request.json", r#"[{ "chainId": 1 }]"#);

    let output = ocperms(&["normalize", input.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(60));
    assert!(String::from_utf8_lossy(&output.stderr).contains("[0].permission"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn version_reports_package_version() {
    let output = ocperms(&["version"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("ocperms "));
}
