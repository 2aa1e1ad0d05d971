//! Top-level dispatch between the v1 and v2 wire shapes.
//!
//! Which shape a consumer expects is a protocol decision made outside the
//! payload. When both are accepted, the shape of the top-level value decides:
//! a bare array is v2, an object carrying the v1 list member is v1.

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use tracing::trace;

use crate::error::{Result, ValidationError};
use crate::fields::sequence;
use crate::grant::{GrantedPermission, GrantedPermissionsResponse};
use crate::path::FieldPath;
use crate::request::{PermissionRequest, PermissionsRequest};
use crate::v1::{GrantedPermissionsResponseV1, PermissionsRequestV1};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WireVersion {
    V1,
    V2,
}

impl fmt::Display for WireVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => f.write_str("v1"),
            Self::V2 => f.write_str("v2"),
        }
    }
}

/// A permissions request in whichever wire shape it arrived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RequestDocument {
    V1(PermissionsRequestV1),
    V2(PermissionsRequest),
}

impl RequestDocument {
    pub fn version(&self) -> WireVersion {
        match self {
            Self::V1(_) => WireVersion::V1,
            Self::V2(_) => WireVersion::V2,
        }
    }

    /// Number of permissions asked for.
    pub fn len(&self) -> usize {
        match self {
            Self::V1(request) => request.permissions.len(),
            Self::V2(requests) => requests.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A grant response in whichever wire shape it arrived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResponseDocument {
    V1(GrantedPermissionsResponseV1),
    V2(GrantedPermissionsResponse),
}

impl ResponseDocument {
    pub fn version(&self) -> WireVersion {
        match self {
            Self::V1(_) => WireVersion::V1,
            Self::V2(_) => WireVersion::V2,
        }
    }

    /// Number of grants carried.
    pub fn len(&self) -> usize {
        match self {
            Self::V1(response) => response.granted_permissions.len(),
            Self::V2(grants) => grants.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn is_v1_object(value: &Value, member: &str) -> bool {
    value
        .as_object()
        .is_some_and(|map| map.contains_key(member))
}

/// Validate a request of either wire shape.
pub fn validate_request_document(
    value: &Value,
) -> std::result::Result<RequestDocument, ValidationError> {
    let root = FieldPath::root();
    let document = if value.is_array() {
        sequence(value, &root, PermissionRequest::validate_at).map(RequestDocument::V2)?
    } else if is_v1_object(value, "permissions") {
        PermissionsRequestV1::validate_at(value, &root).map(RequestDocument::V1)?
    } else {
        return Err(ValidationError::UnionMismatch {
            path: root,
            expected: "array of permission requests (v2) or object with `permissions` (v1)",
        });
    };

    trace!(version = %document.version(), entries = document.len(), "request document accepted");
    Ok(document)
}

/// Validate a response of either wire shape.
pub fn validate_response_document(
    value: &Value,
) -> std::result::Result<ResponseDocument, ValidationError> {
    let root = FieldPath::root();
    let document = if value.is_array() {
        sequence(value, &root, GrantedPermission::validate_at).map(ResponseDocument::V2)?
    } else if is_v1_object(value, "grantedPermissions") {
        GrantedPermissionsResponseV1::validate_at(value, &root).map(ResponseDocument::V1)?
    } else {
        return Err(ValidationError::UnionMismatch {
            path: root,
            expected: "array of granted permissions (v2) or object with `grantedPermissions` (v1)",
        });
    };

    trace!(version = %document.version(), entries = document.len(), "response document accepted");
    Ok(document)
}

/// Parse and validate raw request bytes.
pub fn parse_request_document(payload: &[u8]) -> Result<RequestDocument> {
    let value: Value = serde_json::from_slice(payload)?;
    Ok(validate_request_document(&value)?)
}

/// Parse and validate raw response bytes.
pub fn parse_response_document(payload: &[u8]) -> Result<ResponseDocument> {
    let value: Value = serde_json::from_slice(payload)?;
    Ok(validate_response_document(&value)?)
}

validated_record!(RequestDocument, validate_request_document);
validated_record!(ResponseDocument, validate_response_document);
