use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::OdxError;

/// Physical values keyed by parameter short name.
pub type ParameterValues = BTreeMap<String, PhysicalValue>;

/// ODX base data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    AInt32,
    AUint32,
    AFloat32,
    AFloat64,
    AAsciiString,
    AUtf8String,
    AUnicode2String,
    ABytefield,
}

impl DataType {
    pub fn from_odx(name: &str) -> Option<Self> {
        match name {
            "A_INT32" => Some(Self::AInt32),
            "A_UINT32" => Some(Self::AUint32),
            "A_FLOAT32" => Some(Self::AFloat32),
            "A_FLOAT64" => Some(Self::AFloat64),
            "A_ASCIISTRING" => Some(Self::AAsciiString),
            "A_UTF8STRING" => Some(Self::AUtf8String),
            "A_UNICODE2STRING" => Some(Self::AUnicode2String),
            "A_BYTEFIELD" => Some(Self::ABytefield),
            _ => None,
        }
    }

    pub fn as_odx(self) -> &'static str {
        match self {
            Self::AInt32 => "A_INT32",
            Self::AUint32 => "A_UINT32",
            Self::AFloat32 => "A_FLOAT32",
            Self::AFloat64 => "A_FLOAT64",
            Self::AAsciiString => "A_ASCIISTRING",
            Self::AUtf8String => "A_UTF8STRING",
            Self::AUnicode2String => "A_UNICODE2STRING",
            Self::ABytefield => "A_BYTEFIELD",
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(self, Self::AInt32 | Self::AUint32)
    }

    pub fn is_float(self) -> bool {
        matches!(self, Self::AFloat32 | Self::AFloat64)
    }

    pub fn is_string(self) -> bool {
        matches!(
            self,
            Self::AAsciiString | Self::AUtf8String | Self::AUnicode2String
        )
    }

    /// Whether `value` may be handed to an object of this type.
    /// Float types also accept integers.
    pub fn accepts(self, value: &PhysicalValue) -> bool {
        match value {
            PhysicalValue::Integer(_) => self.is_integer() || self.is_float(),
            PhysicalValue::Float(_) => self.is_float(),
            PhysicalValue::Text(_) => self.is_string(),
            PhysicalValue::Bytes(_) => self == Self::ABytefield,
            PhysicalValue::Structure(_) => false,
        }
    }

    /// Parses the textual form used in ODX documents (`CODED-VALUE`,
    /// `PHYSICAL-DEFAULT-VALUE`, table row `KEY`).
    pub fn parse_value(self, text: &str) -> Result<PhysicalValue, OdxError> {
        let invalid = |reason: &str| OdxError::InvalidValue {
            value: text.to_owned(),
            data_type: self,
            reason: reason.to_owned(),
        };
        let trimmed = text.trim();
        match self {
            Self::AInt32 | Self::AUint32 => {
                let parsed = match trimmed
                    .strip_prefix("0x")
                    .or_else(|| trimmed.strip_prefix("0X"))
                {
                    Some(hex) => i64::from_str_radix(hex, 16),
                    None => trimmed.parse::<i64>(),
                };
                parsed
                    .map(PhysicalValue::Integer)
                    .map_err(|e| invalid(&e.to_string()))
            }
            Self::AFloat32 | Self::AFloat64 => trimmed
                .parse::<f64>()
                .map(PhysicalValue::Float)
                .map_err(|e| invalid(&e.to_string())),
            Self::AAsciiString | Self::AUtf8String | Self::AUnicode2String => {
                Ok(PhysicalValue::Text(text.to_owned()))
            }
            Self::ABytefield => parse_hex(trimmed)
                .map(PhysicalValue::Bytes)
                .ok_or_else(|| invalid("not a hex string")),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_odx())
    }
}

/// A decoded or to-be-encoded parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PhysicalValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Structure(ParameterValues),
}

impl PhysicalValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Structure(_) => "structure",
        }
    }

    /// Text, integer, float or byte string.
    pub fn is_atomic(&self) -> bool {
        !matches!(self, Self::Structure(_))
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            #[allow(clippy::cast_possible_truncation)]
            Self::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Self::Integer(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Equality used to match table row keys: integers and floats compare
    /// numerically, everything else structurally.
    pub fn key_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Integer(_), Self::Float(_)) | (Self::Float(_), Self::Integer(_)) => {
                self.as_f64() == other.as_f64()
            }
            _ => self == other,
        }
    }
}

impl fmt::Display for PhysicalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "'{v}'"),
            Self::Bytes(v) => write!(f, "0x{}", format_hex(v)),
            Self::Structure(values) => {
                f.write_str("{")?;
                for (i, (name, value)) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<i64> for PhysicalValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for PhysicalValue {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<u32> for PhysicalValue {
    fn from(v: u32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<f64> for PhysicalValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for PhysicalValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for PhysicalValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<u8>> for PhysicalValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<ParameterValues> for PhysicalValue {
    fn from(v: ParameterValues) -> Self {
        Self::Structure(v)
    }
}

/// Uppercase hex without separators.
pub fn format_hex(bytes: &[u8]) -> String {
    use fmt::Write;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
        let _ = write!(s, "{b:02X}");
        s
    })
}

/// Parses hex digits, ignoring whitespace and an optional `0x` prefix.
pub fn parse_hex(text: &str) -> Option<Vec<u8>> {
    let text = text.strip_prefix("0x").unwrap_or(text);
    let digits: Vec<u8> = text
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    if digits.len() % 2 != 0 {
        return None;
    }
    digits
        .chunks(2)
        .map(|pair| {
            let s = std::str::from_utf8(pair).ok()?;
            u8::from_str_radix(s, 16).ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_key_eq_mixes_int_and_float() {
        assert!(PhysicalValue::Integer(2).key_eq(&PhysicalValue::Float(2.0)));
        assert!(!PhysicalValue::Integer(2).key_eq(&PhysicalValue::Float(2.5)));
        assert!(!PhysicalValue::Integer(2).key_eq(&PhysicalValue::Text("2".into())));
    }

    #[test]
    fn test_parse_value_hex_and_decimal() {
        assert_eq!(
            DataType::AUint32.parse_value("0x2E").unwrap(),
            PhysicalValue::Integer(0x2E)
        );
        assert_eq!(
            DataType::AInt32.parse_value(" -5 ").unwrap(),
            PhysicalValue::Integer(-5)
        );
        assert!(DataType::AUint32.parse_value("abc").is_err());
    }

    #[test]
    fn test_hex_helpers() {
        assert_eq!(parse_hex("2e 01 ff"), Some(vec![0x2E, 0x01, 0xFF]));
        assert_eq!(parse_hex("abc"), None);
        assert_eq!(format_hex(&[0x2E, 0x01]), "2E01");
    }

    #[test]
    fn test_untagged_json_values() {
        let values: ParameterValues =
            serde_json::from_str(r#"{"a": 1, "b": 2.5, "c": "x", "d": {"e": 3}}"#).unwrap();
        assert_eq!(values["a"], PhysicalValue::Integer(1));
        assert_eq!(values["b"], PhysicalValue::Float(2.5));
        assert_eq!(values["c"], PhysicalValue::Text("x".into()));
        assert!(matches!(values["d"], PhysicalValue::Structure(_)));
    }
}
