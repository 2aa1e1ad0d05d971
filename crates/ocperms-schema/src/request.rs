use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::address::Address;
use crate::descriptor::{Policy, TypeDescriptor};
use crate::error::ValidationError;
use crate::fields::{expect_bool, expect_number, owned_object, owned_string, sequence, Fields, Outcome};
use crate::path::FieldPath;
use crate::signer::Signer;

/// The capability asked for by a [`PermissionRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestedPermission {
    #[serde(rename = "type")]
    pub kind: TypeDescriptor,
    /// Type-specific parameters, interpreted by the permission's provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
}

impl RequestedPermission {
    pub(crate) fn validate_at(value: &Value, path: &FieldPath) -> Outcome<Self> {
        let fields = Fields::of(value, path)?;
        Ok(Self {
            kind: fields.required("type", TypeDescriptor::validate_at)?,
            data: fields.optional("data", owned_object)?,
        })
    }
}

/// One permission asked of a grantor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRequest {
    pub chain_id: Number,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<Address>,
    /// Absolute timestamp, seconds by convention.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<Number>,
    /// Overrides any request-wide default signer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signer: Option<Signer>,
    pub permission: RequestedPermission,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policies: Option<Vec<Policy>>,
    /// Whether the whole request fails when this permission is refused.
    pub required: bool,
    /// Shown to the end user while asking for consent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
}

impl PermissionRequest {
    pub fn chain_id_u64(&self) -> Option<u64> {
        self.chain_id.as_u64()
    }

    pub fn expiry_secs(&self) -> Option<u64> {
        self.expiry.as_ref().and_then(Number::as_u64)
    }

    pub fn type_name(&self) -> &str {
        self.permission.kind.name()
    }

    /// Policies in request order; empty when none were sent.
    pub fn policies(&self) -> &[Policy] {
        self.policies.as_deref().unwrap_or_default()
    }

    pub(crate) fn validate_at(value: &Value, path: &FieldPath) -> Outcome<Self> {
        let fields = Fields::of(value, path)?;
        Ok(Self {
            chain_id: fields.required("chainId", expect_number)?,
            account: fields.optional("account", Address::validate_at)?,
            expiry: fields.optional("expiry", expect_number)?,
            signer: fields.optional("signer", Signer::validate_at)?,
            permission: fields.required("permission", RequestedPermission::validate_at)?,
            policies: fields.optional("policies", |v, p| sequence(v, p, Policy::validate_at))?,
            required: fields.optional("required", expect_bool)?.unwrap_or(true),
            justification: fields.optional("justification", owned_string)?,
        })
    }
}

/// An ordered batch of permission requests.
pub type PermissionsRequest = Vec<PermissionRequest>;

/// Validate an untyped value as a [`PermissionRequest`].
pub fn validate_permission_request(value: &Value) -> Result<PermissionRequest, ValidationError> {
    PermissionRequest::validate_at(value, &FieldPath::root())
}

/// Validate an untyped value as a [`PermissionsRequest`], preserving order.
pub fn validate_permissions_request(value: &Value) -> Result<PermissionsRequest, ValidationError> {
    sequence(value, &FieldPath::root(), PermissionRequest::validate_at)
}

validated_record!(RequestedPermission, |value| {
    RequestedPermission::validate_at(value, &FieldPath::root())
});
validated_record!(PermissionRequest, validate_permission_request);
