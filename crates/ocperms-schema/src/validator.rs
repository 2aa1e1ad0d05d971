use jsonschema::Validator;
use serde_json::{Map, Value};

use crate::error::{Result, SchemaError};

/// Checks the type-specific `data` of one permission or policy type.
///
/// Implementations receive `None` when the payload omitted `data` and return
/// a human-readable reason on rejection.
pub trait DataValidator: Send + Sync {
    fn validate_data(&self, data: Option<&Map<String, Value>>) -> std::result::Result<(), String>;
}

impl<F> DataValidator for F
where
    F: Fn(Option<&Map<String, Value>>) -> std::result::Result<(), String> + Send + Sync,
{
    fn validate_data(&self, data: Option<&Map<String, Value>>) -> std::result::Result<(), String> {
        self(data)
    }
}

/// A [`DataValidator`] backed by a compiled JSON Schema.
///
/// Absent `data` is validated as `null`, so a schema requiring an object
/// also makes `data` mandatory for its type.
pub struct SchemaDataValidator {
    compiled: Validator,
}

impl SchemaDataValidator {
    pub fn compile(schema: &Value) -> Result<Self> {
        let compiled = jsonschema::validator_for(schema)
            .map_err(|err| SchemaError::CompileFailed(err.to_string()))?;
        Ok(Self { compiled })
    }
}

impl DataValidator for SchemaDataValidator {
    fn validate_data(&self, data: Option<&Map<String, Value>>) -> std::result::Result<(), String> {
        let instance = data.map_or(Value::Null, |map| Value::Object(map.clone()));

        let mut errors = self.compiled.iter_errors(&instance);
        if let Some(first) = errors.next() {
            let mut message = first.to_string();
            for err in errors.take(3) {
                message.push_str("; ");
                message.push_str(&err.to_string());
            }
            return Err(message);
        }

        Ok(())
    }
}
