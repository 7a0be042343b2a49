use crate::error::{DecodeError, EncodeError};
use crate::odxtypes::{DataType, PhysicalValue};

/// Conversion between internal (coded) and physical values.
#[derive(Debug, Clone, PartialEq)]
pub enum CompuMethod {
    Identical,
    Linear(LinearCompuMethod),
}

/// `physical = (offset + factor * internal) / denominator`
#[derive(Debug, Clone, PartialEq)]
pub struct LinearCompuMethod {
    pub offset: f64,
    pub factor: f64,
    pub denominator: f64,
}

impl LinearCompuMethod {
    pub fn new(offset: f64, factor: f64) -> Self {
        Self {
            offset,
            factor,
            denominator: 1.0,
        }
    }
}

impl CompuMethod {
    pub fn convert_physical_to_internal(
        &self,
        value: &PhysicalValue,
        internal_type: DataType,
    ) -> Result<PhysicalValue, EncodeError> {
        let incompatible = || EncodeError::IncompatibleValue {
            value: value.clone(),
            data_type: internal_type,
        };
        match self {
            Self::Identical => coerce(value, internal_type).ok_or_else(incompatible),
            Self::Linear(linear) => {
                let physical = value.as_f64().ok_or_else(incompatible)?;
                if linear.factor == 0.0 {
                    return Err(incompatible());
                }
                let internal = (physical * linear.denominator - linear.offset) / linear.factor;
                Ok(numeric(internal, internal_type))
            }
        }
    }

    pub fn convert_internal_to_physical(
        &self,
        value: &PhysicalValue,
        physical_type: DataType,
    ) -> Result<PhysicalValue, DecodeError> {
        match self {
            Self::Identical => {
                coerce(value, physical_type).ok_or_else(|| DecodeError::InvalidCodedValue {
                    data_type: physical_type,
                    reason: format!("cannot represent {value}"),
                })
            }
            Self::Linear(linear) => {
                let internal = value.as_f64().ok_or_else(|| DecodeError::InvalidCodedValue {
                    data_type: physical_type,
                    reason: format!("linear conversion of non-numeric {value}"),
                })?;
                let denominator = if linear.denominator == 0.0 {
                    1.0
                } else {
                    linear.denominator
                };
                let physical = (linear.offset + linear.factor * internal) / denominator;
                Ok(numeric(physical, physical_type))
            }
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn numeric(value: f64, data_type: DataType) -> PhysicalValue {
    if data_type.is_integer() {
        PhysicalValue::Integer(value.round() as i64)
    } else {
        PhysicalValue::Float(value)
    }
}

fn coerce(value: &PhysicalValue, data_type: DataType) -> Option<PhysicalValue> {
    match value {
        PhysicalValue::Integer(_) | PhysicalValue::Float(_) if data_type.is_integer() => {
            value.as_i64().map(PhysicalValue::Integer)
        }
        PhysicalValue::Integer(_) | PhysicalValue::Float(_) if data_type.is_float() => {
            value.as_f64().map(PhysicalValue::Float)
        }
        PhysicalValue::Text(_) if data_type.is_string() => Some(value.clone()),
        PhysicalValue::Bytes(_) if data_type == DataType::ABytefield => Some(value.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_linear_round_trip_values() {
        let compu = CompuMethod::Linear(LinearCompuMethod::new(-40.0, 0.5));
        let internal = compu
            .convert_physical_to_internal(&PhysicalValue::Float(20.0), DataType::AUint32)
            .unwrap();
        assert_eq!(internal, PhysicalValue::Integer(120));
        let physical = compu
            .convert_internal_to_physical(&internal, DataType::AFloat64)
            .unwrap();
        assert_eq!(physical, PhysicalValue::Float(20.0));
    }

    #[test]
    fn test_identical_rejects_text_for_integer() {
        assert!(CompuMethod::Identical
            .convert_physical_to_internal(&PhysicalValue::Text("x".into()), DataType::AUint32)
            .is_err());
    }
}
