use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::error::ValidationError;
use crate::fields::{expect_string, Outcome};
use crate::path::FieldPath;

/// 20-byte account or contract address, `0x`-prefixed.
pub const ADDRESS_PATTERN: &str = r"^0x[a-fA-F0-9]{40}$";

/// Arbitrary-length `0x`-prefixed hex call data.
pub const HEX_DATA_PATTERN: &str = r"^0x[a-fA-F0-9]*$";

/// The only constraint the v1 shape puts on its address and call-data fields.
pub const HEX_PREFIX_PATTERN: &str = "^0x";

static ADDRESS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(ADDRESS_PATTERN).expect("invalid address pattern"));

static HEX_DATA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(HEX_DATA_PATTERN).expect("invalid hex data pattern"));

fn matching(
    text: &str,
    regex: &Regex,
    pattern: &'static str,
    path: &FieldPath,
) -> Outcome<String> {
    if regex.is_match(text) {
        Ok(text.to_owned())
    } else {
        Err(ValidationError::PatternMismatch {
            path: path.clone(),
            pattern,
        })
    }
}

/// A string starting with `0x`, with nothing checked after the prefix.
pub(crate) fn hex_prefixed(value: &Value, path: &FieldPath) -> Outcome<String> {
    let text = expect_string(value, path)?;
    if text.starts_with("0x") {
        Ok(text.to_owned())
    } else {
        Err(ValidationError::PatternMismatch {
            path: path.clone(),
            pattern: HEX_PREFIX_PATTERN,
        })
    }
}

/// An address string as it appeared on the wire. Case is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn validate_at(value: &Value, path: &FieldPath) -> Outcome<Self> {
        let text = expect_string(value, path)?;
        matching(text, &ADDRESS_RE, ADDRESS_PATTERN, path).map(Self)
    }
}

impl FromStr for Address {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        matching(s, &ADDRESS_RE, ADDRESS_PATTERN, &FieldPath::root()).map(Self)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hex-encoded call data such as `factoryData`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct HexData(String);

impl HexData {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of encoded bytes, rounding a trailing nibble up.
    pub fn byte_len(&self) -> usize {
        (self.0.len() - 2).div_ceil(2)
    }

    pub(crate) fn validate_at(value: &Value, path: &FieldPath) -> Outcome<Self> {
        let text = expect_string(value, path)?;
        matching(text, &HEX_DATA_RE, HEX_DATA_PATTERN, path).map(Self)
    }
}

impl FromStr for HexData {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        matching(s, &HEX_DATA_RE, HEX_DATA_PATTERN, &FieldPath::root()).map(Self)
    }
}

impl fmt::Display for HexData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

validated_record!(Address, |value| Address::validate_at(value, &FieldPath::root()));
validated_record!(HexData, |value| HexData::validate_at(value, &FieldPath::root()));
