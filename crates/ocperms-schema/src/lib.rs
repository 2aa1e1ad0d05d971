//! Validated record shapes for the Onchain Permissions Standard.
//!
//! Untrusted JSON (a wallet RPC payload, an API body) enters through one of
//! the `validate_*` functions and leaves as a typed value or a
//! [`ValidationError`] naming the exact field path that failed.
//!
//! Two wire shapes exist. v2 is canonical: a request is a bare array of
//! single-permission requests and a response a bare array of grants. The
//! older v1 batch shape lives in [`v1`], and [`document`] dispatches between
//! the two when both must be accepted.
//!
//! Type-specific `data` payloads are opaque here. A [`DataRegistry`] holds
//! per-type validators (JSON Schema or hand-written) for a second pass.

/// Implements `TryFrom<Value>` and a validating `Deserialize` for a record.
macro_rules! validated_record {
    ($ty:ty, $validate:expr) => {
        impl TryFrom<serde_json::Value> for $ty {
            type Error = $crate::error::ValidationError;

            fn try_from(value: serde_json::Value) -> ::std::result::Result<Self, Self::Error> {
                ($validate)(&value)
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let value = <serde_json::Value as serde::Deserialize>::deserialize(deserializer)?;
                ($validate)(&value).map_err(serde::de::Error::custom)
            }
        }
    };
}

pub mod address;
pub mod config;
pub mod descriptor;
pub mod document;
pub mod error;
mod fields;
pub mod grant;
pub mod path;
pub mod registry;
pub mod request;
pub mod signer;
mod strict;
pub mod v1;
pub mod validator;

pub use address::{Address, HexData, ADDRESS_PATTERN, HEX_DATA_PATTERN, HEX_PREFIX_PATTERN};
pub use config::{RegistryConfig, DEFAULT_MAX_SCHEMA_BYTES, DEFAULT_MAX_SCHEMA_FILES};
pub use descriptor::{validate_policy, validate_type_descriptor, Policy, TypeDescriptor};
pub use document::{
    parse_request_document, parse_response_document, validate_request_document,
    validate_response_document, RequestDocument, ResponseDocument, WireVersion,
};
pub use error::{ErrorKind, Result, SchemaError, ValidationError, ValueKind};
pub use grant::{
    validate_granted_permission, validate_granted_permissions_response, AccountMeta,
    GrantedPermission, GrantedPermissionsResponse, SignerMeta,
};
pub use path::{FieldPath, PathSegment};
pub use registry::{DataKind, DataRegistry};
pub use request::{
    validate_permission_request, validate_permissions_request, PermissionRequest,
    PermissionsRequest, RequestedPermission,
};
pub use signer::{validate_signer, validate_upgrade_op, Signer, SignerType, UpgradeOp};
pub use v1::{
    validate_granted_permission_v1, validate_granted_permissions_response_v1,
    validate_permission_v1, validate_permissions_request_v1, AccountMetaV1,
    GrantedPermissionV1, GrantedPermissionsResponseV1, PermissionV1, PermissionsRequestV1,
    PolicyV1, SignerMetaV1, SignerV1, UpgradeOpV1,
};
pub use validator::{DataValidator, SchemaDataValidator};
