use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::fields::{owned_object, owned_string, Fields, Outcome};
use crate::path::FieldPath;

/// Names a permission or policy kind.
///
/// Requestors may send a bare name or an object that leaves room for
/// forward-compatible metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TypeDescriptor {
    Name(String),
    Descriptor {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

impl TypeDescriptor {
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Descriptor { name, .. } => name,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Name(_) => None,
            Self::Descriptor { description, .. } => description.as_deref(),
        }
    }

    pub(crate) fn validate_at(value: &Value, path: &FieldPath) -> Outcome<Self> {
        match value {
            Value::String(name) => Ok(Self::Name(name.clone())),
            Value::Object(_) => {
                let fields = Fields::of(value, path)?;
                Ok(Self::Descriptor {
                    name: fields.required("name", owned_string)?,
                    description: fields.optional("description", owned_string)?,
                })
            }
            _ => Err(ValidationError::UnionMismatch {
                path: path.clone(),
                expected: "type name string or {name, description?} object",
            }),
        }
    }
}

impl From<&str> for TypeDescriptor {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

/// An extra constraint the grantor must enforce on a permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Policy {
    #[serde(rename = "type")]
    pub kind: TypeDescriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
}

impl Policy {
    pub(crate) fn validate_at(value: &Value, path: &FieldPath) -> Outcome<Self> {
        let fields = Fields::of(value, path)?;
        Ok(Self {
            kind: fields.required("type", TypeDescriptor::validate_at)?,
            data: fields.optional("data", owned_object)?,
        })
    }
}

/// Validate an untyped value as a [`TypeDescriptor`].
pub fn validate_type_descriptor(value: &Value) -> Result<TypeDescriptor, ValidationError> {
    TypeDescriptor::validate_at(value, &FieldPath::root())
}

/// Validate an untyped value as a [`Policy`].
pub fn validate_policy(value: &Value) -> Result<Policy, ValidationError> {
    Policy::validate_at(value, &FieldPath::root())
}

validated_record!(TypeDescriptor, validate_type_descriptor);
validated_record!(Policy, validate_policy);
