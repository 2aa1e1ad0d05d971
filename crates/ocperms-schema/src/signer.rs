use serde::Serialize;
use serde_json::{Map, Value};

use crate::address::Address;
use crate::error::ValidationError;
use crate::fields::{expect_string, owned_object, owned_string, Fields, Outcome};
use crate::path::FieldPath;

/// Key under which an address signer carries its address in `data`.
pub const ADDRESS_DATA_KEY: &str = "address";

/// Signer kinds this implementation accepts.
///
/// The wider standard also allows raw public keys. Only address signers are
/// accepted so granted permissions can carry policies that a key signer
/// cannot enforce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SignerType {
    Address,
}

impl SignerType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Address => "address",
        }
    }
}

/// The entity allowed to exercise a permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signer {
    #[serde(rename = "type")]
    pub kind: SignerType,
    pub data: Map<String, Value>,
}

impl Signer {
    /// An address signer with `data = {"address": address}`.
    pub fn for_address(address: &Address) -> Self {
        let mut data = Map::new();
        data.insert(
            ADDRESS_DATA_KEY.to_string(),
            Value::String(address.to_string()),
        );
        Self {
            kind: SignerType::Address,
            data,
        }
    }

    /// The address string under [`ADDRESS_DATA_KEY`], if any.
    pub fn address(&self) -> Option<&str> {
        self.data.get(ADDRESS_DATA_KEY).and_then(Value::as_str)
    }

    pub(crate) fn validate_at(value: &Value, path: &FieldPath) -> Outcome<Self> {
        let fields = Fields::of(value, path)?;
        let kind = fields.required("type", signer_type)?;
        let data = fields.required("data", owned_object)?;
        Ok(Self { kind, data })
    }
}

pub(crate) fn signer_type(value: &Value, path: &FieldPath) -> Outcome<SignerType> {
    match expect_string(value, path)? {
        "address" => Ok(SignerType::Address),
        _ => Err(ValidationError::InvalidLiteral {
            path: path.clone(),
            expected: SignerType::Address.as_str(),
        }),
    }
}

/// Account-abstraction step run after a fresh account is deployed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpgradeOp {
    pub target: Signer,
    pub operation: String,
}

impl UpgradeOp {
    pub(crate) fn validate_at(value: &Value, path: &FieldPath) -> Outcome<Self> {
        let fields = Fields::of(value, path)?;
        Ok(Self {
            target: fields.required("target", Signer::validate_at)?,
            operation: fields.required("operation", owned_string)?,
        })
    }
}

/// Validate an untyped value as a [`Signer`].
pub fn validate_signer(value: &Value) -> Result<Signer, ValidationError> {
    Signer::validate_at(value, &FieldPath::root())
}

/// Validate an untyped value as an [`UpgradeOp`].
pub fn validate_upgrade_op(value: &Value) -> Result<UpgradeOp, ValidationError> {
    UpgradeOp::validate_at(value, &FieldPath::root())
}

validated_record!(Signer, validate_signer);
validated_record!(UpgradeOp, validate_upgrade_op);
