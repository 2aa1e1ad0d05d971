//! Field-by-field accessors shared by every record validator.

use serde_json::{Map, Number, Value};

use crate::error::{ValidationError, ValueKind};
use crate::path::FieldPath;

pub(crate) type Outcome<T> = std::result::Result<T, ValidationError>;

fn mismatch(value: &Value, path: &FieldPath, expected: ValueKind) -> ValidationError {
    ValidationError::TypeMismatch {
        path: path.clone(),
        expected,
        found: ValueKind::of(value),
    }
}

pub(crate) fn expect_object<'a>(
    value: &'a Value,
    path: &FieldPath,
) -> Outcome<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| mismatch(value, path, ValueKind::Object))
}

pub(crate) fn expect_string<'a>(value: &'a Value, path: &FieldPath) -> Outcome<&'a str> {
    value
        .as_str()
        .ok_or_else(|| mismatch(value, path, ValueKind::String))
}

pub(crate) fn expect_number(value: &Value, path: &FieldPath) -> Outcome<Number> {
    match value {
        Value::Number(number) => Ok(number.clone()),
        other => Err(mismatch(other, path, ValueKind::Number)),
    }
}

pub(crate) fn expect_bool(value: &Value, path: &FieldPath) -> Outcome<bool> {
    value
        .as_bool()
        .ok_or_else(|| mismatch(value, path, ValueKind::Boolean))
}

pub(crate) fn owned_string(value: &Value, path: &FieldPath) -> Outcome<String> {
    expect_string(value, path).map(str::to_owned)
}

pub(crate) fn owned_object(value: &Value, path: &FieldPath) -> Outcome<Map<String, Value>> {
    expect_object(value, path).cloned()
}

/// Validate every element of an array, wrapping failures with their index.
pub(crate) fn sequence<T>(
    value: &Value,
    path: &FieldPath,
    mut element: impl FnMut(&Value, &FieldPath) -> Outcome<T>,
) -> Outcome<Vec<T>> {
    let items = value
        .as_array()
        .ok_or_else(|| mismatch(value, path, ValueKind::Array))?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            element(item, &path.index(index)).map_err(|err| ValidationError::element(index, err))
        })
        .collect()
}

/// View over the members of a JSON object at a known path.
pub(crate) struct Fields<'a> {
    map: &'a Map<String, Value>,
    path: FieldPath,
}

impl<'a> Fields<'a> {
    pub(crate) fn of(value: &'a Value, path: &FieldPath) -> Outcome<Self> {
        Ok(Self {
            map: expect_object(value, path)?,
            path: path.clone(),
        })
    }

    /// Present members must match; `null` is not treated as absent.
    pub(crate) fn optional<T>(
        &self,
        name: &'static str,
        check: impl FnOnce(&'a Value, &FieldPath) -> Outcome<T>,
    ) -> Outcome<Option<T>> {
        match self.map.get(name) {
            Some(value) => check(value, &self.path.field(name)).map(Some),
            None => Ok(None),
        }
    }

    pub(crate) fn required<T>(
        &self,
        name: &'static str,
        check: impl FnOnce(&'a Value, &FieldPath) -> Outcome<T>,
    ) -> Outcome<T> {
        let path = self.path.field(name);
        match self.map.get(name) {
            Some(value) => check(value, &path),
            None => Err(ValidationError::MissingField { path }),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn required_reports_full_path() {
        let value = json!({ "outer": {} });
        let outer = Fields::of(&value, &FieldPath::root()).unwrap();
        let inner = outer
            .required("outer", |v, p| Fields::of(v, p))
            .unwrap();

        let err = inner.required("name", owned_string).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingField);
        assert_eq!(err.path().to_string(), "outer.name");
    }

    #[test]
    fn optional_rejects_null() {
        let value = json!({ "justification": null });
        let fields = Fields::of(&value, &FieldPath::root()).unwrap();

        let err = fields.optional("justification", owned_string).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::TypeMismatch {
                expected: ValueKind::String,
                found: ValueKind::Null,
                ..
            }
        ));
        assert_eq!(fields.optional("absent", owned_string).unwrap(), None);
    }

    #[test]
    fn sequence_wraps_failing_index() {
        let value = json!([true, "no", false]);
        let err = sequence(&value, &FieldPath::root(), expect_bool).unwrap_err();

        assert!(matches!(err, ValidationError::Element { index: 1, .. }));
        assert_eq!(err.path().to_string(), "[1]");
        assert_eq!(err.root_cause().kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn sequence_requires_array() {
        let err = sequence(&json!({}), &FieldPath::root(), expect_bool).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::TypeMismatch {
                expected: ValueKind::Array,
                found: ValueKind::Object,
                ..
            }
        ));
    }
}
