//! The earlier batch wire shape.
//!
//! A v1 request is one object carrying many permissions; a v1 response wraps
//! the grants with a shared expiry. Field names differ from v2
//! (`permissionsContext` rather than `context`, plus `sessionAccount`), so the
//! two shapes are kept as separate types.
//!
//! v1 is looser than v2 and is accepted as it was first published: `data`
//! members may hold any JSON value, and address or call-data fields only need
//! a `0x` prefix.

use serde::Serialize;
use serde_json::{Number, Value};

use crate::address::hex_prefixed;
use crate::descriptor::TypeDescriptor;
use crate::error::ValidationError;
use crate::fields::{expect_bool, expect_number, owned_string, sequence, Fields, Outcome};
use crate::path::FieldPath;
use crate::signer::{signer_type, SignerType, ADDRESS_DATA_KEY};

fn any_value(value: &Value, _path: &FieldPath) -> Outcome<Value> {
    Ok(value.clone())
}

/// A v1 signer. `data` is unconstrained and may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignerV1 {
    #[serde(rename = "type")]
    pub kind: SignerType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl SignerV1 {
    /// The address string under [`ADDRESS_DATA_KEY`] when `data` is an object.
    pub fn address(&self) -> Option<&str> {
        self.data.as_ref()?.get(ADDRESS_DATA_KEY)?.as_str()
    }

    pub(crate) fn validate_at(value: &Value, path: &FieldPath) -> Outcome<Self> {
        let fields = Fields::of(value, path)?;
        Ok(Self {
            kind: fields.required("type", signer_type)?,
            data: fields.optional("data", any_value)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyV1 {
    #[serde(rename = "type")]
    pub kind: TypeDescriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl PolicyV1 {
    pub(crate) fn validate_at(value: &Value, path: &FieldPath) -> Outcome<Self> {
        let fields = Fields::of(value, path)?;
        Ok(Self {
            kind: fields.required("type", TypeDescriptor::validate_at)?,
            data: fields.optional("data", any_value)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionV1 {
    #[serde(rename = "type")]
    pub kind: TypeDescriptor,
    pub policies: Vec<PolicyV1>,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signer: Option<SignerV1>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
}

impl PermissionV1 {
    pub(crate) fn validate_at(value: &Value, path: &FieldPath) -> Outcome<Self> {
        let fields = Fields::of(value, path)?;
        Ok(Self {
            kind: fields.required("type", TypeDescriptor::validate_at)?,
            policies: fields.required("policies", |v, p| sequence(v, p, PolicyV1::validate_at))?,
            required: fields.optional("required", expect_bool)?.unwrap_or(true),
            data: fields.optional("data", any_value)?,
            signer: fields.optional("signer", SignerV1::validate_at)?,
            justification: fields.optional("justification", owned_string)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionsRequestV1 {
    /// Request-wide default; per-permission signers take precedence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signer: Option<SignerV1>,
    pub permissions: Vec<PermissionV1>,
}

impl PermissionsRequestV1 {
    /// Signer for permission `index`, falling back to the request default.
    pub fn effective_signer(&self, index: usize) -> Option<&SignerV1> {
        let permission = self.permissions.get(index)?;
        permission.signer.as_ref().or(self.signer.as_ref())
    }

    pub(crate) fn validate_at(value: &Value, path: &FieldPath) -> Outcome<Self> {
        let fields = Fields::of(value, path)?;
        Ok(Self {
            signer: fields.optional("signer", SignerV1::validate_at)?,
            permissions: fields
                .required("permissions", |v, p| sequence(v, p, PermissionV1::validate_at))?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpgradeOpV1 {
    pub target: SignerV1,
    pub operation: String,
}

impl UpgradeOpV1 {
    pub(crate) fn validate_at(value: &Value, path: &FieldPath) -> Outcome<Self> {
        let fields = Fields::of(value, path)?;
        Ok(Self {
            target: fields.required("target", SignerV1::validate_at)?,
            operation: fields.required("operation", owned_string)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountMetaV1 {
    pub factory: String,
    pub factory_data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upgrade_ops: Option<Vec<UpgradeOpV1>>,
}

impl AccountMetaV1 {
    pub(crate) fn validate_at(value: &Value, path: &FieldPath) -> Outcome<Self> {
        let fields = Fields::of(value, path)?;
        Ok(Self {
            factory: fields.required("factory", hex_prefixed)?,
            factory_data: fields.required("factoryData", hex_prefixed)?,
            upgrade_ops: fields
                .optional("upgradeOps", |v, p| sequence(v, p, UpgradeOpV1::validate_at))?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignerMetaV1 {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delegation_manager: Option<String>,
}

impl SignerMetaV1 {
    pub(crate) fn validate_at(value: &Value, path: &FieldPath) -> Outcome<Self> {
        let fields = Fields::of(value, path)?;
        Ok(Self {
            delegation_manager: fields.optional("delegationManager", hex_prefixed)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantedPermissionV1 {
    pub session_account: SignerV1,
    #[serde(rename = "type")]
    pub kind: TypeDescriptor,
    pub signer_meta: SignerMetaV1,
    pub permissions_context: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_meta: Option<AccountMetaV1>,
}

impl GrantedPermissionV1 {
    pub(crate) fn validate_at(value: &Value, path: &FieldPath) -> Outcome<Self> {
        let fields = Fields::of(value, path)?;
        Ok(Self {
            session_account: fields.required("sessionAccount", SignerV1::validate_at)?,
            kind: fields.required("type", TypeDescriptor::validate_at)?,
            signer_meta: fields.required("signerMeta", SignerMetaV1::validate_at)?,
            permissions_context: fields.required("permissionsContext", owned_string)?,
            account_meta: fields.optional("accountMeta", AccountMetaV1::validate_at)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantedPermissionsResponseV1 {
    pub granted_permissions: Vec<GrantedPermissionV1>,
    pub expiry: Number,
}

impl GrantedPermissionsResponseV1 {
    pub fn expiry_secs(&self) -> Option<u64> {
        self.expiry.as_u64()
    }

    pub(crate) fn validate_at(value: &Value, path: &FieldPath) -> Outcome<Self> {
        let fields = Fields::of(value, path)?;
        Ok(Self {
            granted_permissions: fields.required("grantedPermissions", |v, p| {
                sequence(v, p, GrantedPermissionV1::validate_at)
            })?,
            expiry: fields.required("expiry", expect_number)?,
        })
    }
}

pub fn validate_permission_v1(value: &Value) -> Result<PermissionV1, ValidationError> {
    PermissionV1::validate_at(value, &FieldPath::root())
}

pub fn validate_permissions_request_v1(
    value: &Value,
) -> Result<PermissionsRequestV1, ValidationError> {
    PermissionsRequestV1::validate_at(value, &FieldPath::root())
}

pub fn validate_granted_permission_v1(
    value: &Value,
) -> Result<GrantedPermissionV1, ValidationError> {
    GrantedPermissionV1::validate_at(value, &FieldPath::root())
}

pub fn validate_granted_permissions_response_v1(
    value: &Value,
) -> Result<GrantedPermissionsResponseV1, ValidationError> {
    GrantedPermissionsResponseV1::validate_at(value, &FieldPath::root())
}

validated_record!(PermissionV1, validate_permission_v1);
validated_record!(PermissionsRequestV1, validate_permissions_request_v1);
validated_record!(GrantedPermissionV1, validate_granted_permission_v1);
validated_record!(
    GrantedPermissionsResponseV1,
    validate_granted_permissions_response_v1
);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::ErrorKind;

    const SESSION: &str = "0x4444444444444444444444444444444444444444";

    fn signer(address: &str) -> Value {
        json!({ "type": "address", "data": { "address": address } })
    }

    #[test]
    fn v1_request_applies_required_default() {
        let request = validate_permissions_request_v1(&json!({
            "permissions": [
                { "type": "native-token-transfer", "policies": [] },
                { "type": "native-token-transfer", "policies": [], "required": false }
            ]
        }))
        .unwrap();

        assert!(request.permissions[0].required);
        assert!(!request.permissions[1].required);
    }

    #[test]
    fn v1_permission_requires_policies() {
        let err = validate_permission_v1(&json!({ "type": "x" })).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingField);
        assert_eq!(err.path().to_string(), "policies");
    }

    #[test]
    fn effective_signer_prefers_permission_signer() {
        let own = "0x5555555555555555555555555555555555555555";
        let request = validate_permissions_request_v1(&json!({
            "signer": signer(SESSION),
            "permissions": [
                { "type": "a", "policies": [], "signer": signer(own) },
                { "type": "b", "policies": [] }
            ]
        }))
        .unwrap();

        assert_eq!(request.effective_signer(0).and_then(SignerV1::address), Some(own));
        assert_eq!(
            request.effective_signer(1).and_then(SignerV1::address),
            Some(SESSION)
        );
        assert!(request.effective_signer(2).is_none());
    }

    #[test]
    fn v1_response_round_trips() {
        let raw = json!({
            "grantedPermissions": [{
                "sessionAccount": signer(SESSION),
                "type": { "name": "native-token-transfer" },
                "signerMeta": { "delegationManager": SESSION },
                "permissionsContext": "0x00ff"
            }],
            "expiry": 1_700_000_000u64
        });
        let response = validate_granted_permissions_response_v1(&raw).unwrap();
        assert_eq!(response.expiry_secs(), Some(1_700_000_000));
        assert_eq!(serde_json::to_value(&response).unwrap(), raw);
    }

    #[test]
    fn v1_response_requires_expiry() {
        let err = validate_granted_permissions_response_v1(&json!({ "grantedPermissions": [] }))
            .unwrap_err();
        assert_eq!(err.path().to_string(), "expiry");
    }

    #[test]
    fn v1_grant_error_path() {
        let err = validate_granted_permissions_response_v1(&json!({
            "grantedPermissions": [{
                "sessionAccount": { "type": "key", "data": {} },
                "type": "x",
                "signerMeta": {},
                "permissionsContext": "0x"
            }],
            "expiry": 1
        }))
        .unwrap_err();
        assert_eq!(err.path().to_string(), "grantedPermissions[0].sessionAccount.type");
        assert_eq!(err.root_cause().kind(), ErrorKind::InvalidLiteral);
    }

    #[test]
    fn v1_accepts_unconstrained_data() {
        let raw = json!({
            "signer": { "type": "address" },
            "permissions": [{
                "type": "native-token-transfer",
                "data": "0xdeadbeef",
                "policies": [{ "type": "rate-limit", "data": [1, 2] }],
                "signer": { "type": "address", "data": SESSION }
            }, {
                "type": "native-token-transfer",
                "data": null,
                "policies": []
            }]
        });
        let request = validate_permissions_request_v1(&raw).unwrap();

        assert_eq!(request.permissions[0].data, Some(json!("0xdeadbeef")));
        assert_eq!(request.permissions[0].policies[0].data, Some(json!([1, 2])));
        assert_eq!(request.permissions[1].data, Some(Value::Null));
        assert_eq!(request.signer.as_ref().and_then(|s| s.data.as_ref()), None);
        assert!(request.effective_signer(0).and_then(SignerV1::address).is_none());

        let mut expected = raw;
        expected["permissions"][0]["required"] = json!(true);
        expected["permissions"][1]["required"] = json!(true);
        assert_eq!(serde_json::to_value(&request).unwrap(), expected);
    }

    #[test]
    fn v1_grant_fields_need_only_hex_prefix() {
        let grant = validate_granted_permission_v1(&json!({
            "sessionAccount": { "type": "address", "data": SESSION },
            "type": "native-token-transfer",
            "signerMeta": { "delegationManager": "0xabc" },
            "permissionsContext": "0x01",
            "accountMeta": {
                "factory": "0xfac",
                "factoryData": "0x",
                "upgradeOps": [{ "target": { "type": "address" }, "operation": "0x01" }]
            }
        }))
        .unwrap();

        assert_eq!(grant.signer_meta.delegation_manager.as_deref(), Some("0xabc"));
        assert_eq!(grant.session_account.data, Some(json!(SESSION)));
        let account_meta = grant.account_meta.unwrap();
        assert_eq!(account_meta.factory, "0xfac");
        assert_eq!(account_meta.upgrade_ops.unwrap()[0].target.data, None);
    }

    #[test]
    fn v1_grant_rejects_missing_prefix() {
        let err = validate_granted_permission_v1(&json!({
            "sessionAccount": { "type": "address" },
            "type": "x",
            "signerMeta": { "delegationManager": "abc" },
            "permissionsContext": "0x01"
        }))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PatternMismatch);
        assert_eq!(err.path().to_string(), "signerMeta.delegationManager");
    }
}
