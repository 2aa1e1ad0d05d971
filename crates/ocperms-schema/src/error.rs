use std::fmt;

use serde_json::Value;

use crate::path::FieldPath;

/// Base JSON type of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
}

impl ValueKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flat discriminant of a [`ValidationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingField,
    TypeMismatch,
    PatternMismatch,
    UnionMismatch,
    InvalidLiteral,
    Element,
    DataRejected,
    UnknownType,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::TypeMismatch => "type_mismatch",
            Self::PatternMismatch => "pattern_mismatch",
            Self::UnionMismatch => "union_mismatch",
            Self::InvalidLiteral => "invalid_literal",
            Self::Element => "element",
            Self::DataRejected => "data_rejected",
            Self::UnknownType => "unknown_type",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payload did not match its record shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required field is absent.
    #[error("{path}: missing required field")]
    MissingField { path: FieldPath },

    /// A field holds the wrong base JSON type.
    #[error("{path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: FieldPath,
        expected: ValueKind,
        found: ValueKind,
    },

    /// A string field does not match its address or hex pattern.
    #[error("{path}: value does not match {pattern}")]
    PatternMismatch {
        path: FieldPath,
        pattern: &'static str,
    },

    /// A value matches none of the shapes a union allows.
    #[error("{path}: expected {expected}")]
    UnionMismatch {
        path: FieldPath,
        expected: &'static str,
    },

    /// An enumerated string is not one of the accepted literals.
    #[error("{path}: expected literal {expected:?}")]
    InvalidLiteral {
        path: FieldPath,
        expected: &'static str,
    },

    /// A sequence element failed validation.
    #[error("element {index} rejected: {source}")]
    Element {
        index: usize,
        #[source]
        source: Box<ValidationError>,
    },

    /// A registered data validator rejected a `data` payload.
    #[error("{path}: data rejected for type {type_name:?}: {message}")]
    DataRejected {
        path: FieldPath,
        type_name: String,
        message: String,
    },

    /// No data validator is registered for a type name.
    #[error("{path}: no data validator registered for type {type_name:?}")]
    UnknownType { path: FieldPath, type_name: String },
}

impl ValidationError {
    pub(crate) fn element(index: usize, source: ValidationError) -> Self {
        Self::Element {
            index,
            source: Box::new(source),
        }
    }

    /// Full path of the offending value.
    pub fn path(&self) -> &FieldPath {
        match self {
            Self::Element { source, .. } => source.path(),
            Self::MissingField { path }
            | Self::TypeMismatch { path, .. }
            | Self::PatternMismatch { path, .. }
            | Self::UnionMismatch { path, .. }
            | Self::InvalidLiteral { path, .. }
            | Self::DataRejected { path, .. }
            | Self::UnknownType { path, .. } => path,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingField { .. } => ErrorKind::MissingField,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::PatternMismatch { .. } => ErrorKind::PatternMismatch,
            Self::UnionMismatch { .. } => ErrorKind::UnionMismatch,
            Self::InvalidLiteral { .. } => ErrorKind::InvalidLiteral,
            Self::Element { .. } => ErrorKind::Element,
            Self::DataRejected { .. } => ErrorKind::DataRejected,
            Self::UnknownType { .. } => ErrorKind::UnknownType,
        }
    }

    /// The innermost failure, unwrapping sequence elements.
    pub fn root_cause(&self) -> &ValidationError {
        match self {
            Self::Element { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// What went wrong at [`path`](Self::path), without the path itself.
    pub fn reason(&self) -> String {
        match self {
            Self::Element { source, .. } => source.reason(),
            Self::MissingField { .. } => "missing required field".to_string(),
            Self::TypeMismatch {
                expected, found, ..
            } => format!("expected {expected}, found {found}"),
            Self::PatternMismatch { pattern, .. } => format!("value does not match {pattern}"),
            Self::UnionMismatch { expected, .. } => format!("expected {expected}"),
            Self::InvalidLiteral { expected, .. } => format!("expected literal {expected:?}"),
            Self::DataRejected {
                type_name, message, ..
            } => format!("data rejected for type {type_name:?}: {message}"),
            Self::UnknownType { type_name, .. } => {
                format!("no data validator registered for type {type_name:?}")
            }
        }
    }
}

/// Errors raised at the document and schema-loading boundary.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A data schema file could not be loaded.
    #[error("failed to load schema: {0}")]
    LoadFailed(String),

    /// A data schema could not be compiled.
    #[error("failed to compile schema: {0}")]
    CompileFailed(String),

    /// The payload is not valid JSON.
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The payload is JSON but does not match its record shape.
    #[error("validation failed: {0}")]
    Invalid(#[from] ValidationError),
}

pub type Result<T> = std::result::Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_omits_path() {
        let err = ValidationError::element(
            1,
            ValidationError::MissingField {
                path: FieldPath::root().index(1).field("chainId"),
            },
        );
        assert_eq!(err.reason(), "missing required field");
        assert_eq!(
            err.root_cause().to_string(),
            format!("{}: {}", err.path(), err.reason())
        );
    }

    #[test]
    fn element_reports_inner_path_and_cause() {
        let inner = ValidationError::MissingField {
            path: FieldPath::root().index(1).field("chainId"),
        };
        let err = ValidationError::element(1, inner.clone());

        assert_eq!(err.kind(), ErrorKind::Element);
        assert_eq!(err.path().to_string(), "[1].chainId");
        assert_eq!(err.root_cause(), &inner);
        assert_eq!(
            err.to_string(),
            "element 1 rejected: [1].chainId: missing required field"
        );
    }

    #[test]
    fn type_mismatch_message_names_both_kinds() {
        let err = ValidationError::TypeMismatch {
            path: FieldPath::root().field("required"),
            expected: ValueKind::Boolean,
            found: ValueKind::of(&Value::String("yes".into())),
        };
        assert_eq!(err.to_string(), "required: expected boolean, found string");
    }
}
