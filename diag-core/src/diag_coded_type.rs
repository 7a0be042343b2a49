//! Coded (wire) representation of internal values.

use crate::decode_state::DecodeState;
use crate::error::{DecodeError, EncodeError};
use crate::odxtypes::{DataType, PhysicalValue};

#[derive(Debug, Clone, PartialEq)]
pub struct DiagCodedType {
    pub base_data_type: DataType,
    pub is_highlow_byte_order: bool,
    pub kind: CodedTypeKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CodedTypeKind {
    /// Fixed number of bits.
    StandardLength { bit_length: u32, bit_mask: Option<u64> },
    /// A length prefix of `bit_length` bits followed by the payload bytes.
    LeadingLengthInfo { bit_length: u32 },
}

impl DiagCodedType {
    pub fn standard_length(base_data_type: DataType, bit_length: u32) -> Self {
        Self {
            base_data_type,
            is_highlow_byte_order: true,
            kind: CodedTypeKind::StandardLength {
                bit_length,
                bit_mask: None,
            },
        }
    }

    pub fn leading_length_info(base_data_type: DataType, bit_length: u32) -> Self {
        Self {
            base_data_type,
            is_highlow_byte_order: true,
            kind: CodedTypeKind::LeadingLengthInfo { bit_length },
        }
    }

    #[must_use]
    pub fn with_byte_order(mut self, is_highlow: bool) -> Self {
        self.is_highlow_byte_order = is_highlow;
        self
    }

    #[must_use]
    pub fn with_bit_mask(mut self, mask: u64) -> Self {
        if let CodedTypeKind::StandardLength { bit_mask, .. } = &mut self.kind {
            *bit_mask = Some(mask);
        }
        self
    }

    /// Number of bits occupied, when independent of the value.
    pub fn static_bit_length(&self) -> Option<u32> {
        match self.kind {
            CodedTypeKind::StandardLength { bit_length, .. } => Some(bit_length),
            CodedTypeKind::LeadingLengthInfo { .. } => None,
        }
    }

    pub fn convert_internal_to_bytes(
        &self,
        internal: &PhysicalValue,
        bit_position: u32,
    ) -> Result<Vec<u8>, EncodeError> {
        match self.kind {
            CodedTypeKind::StandardLength {
                bit_length,
                bit_mask,
            } => {
                if self.base_data_type.is_integer() || self.base_data_type.is_float() {
                    let mut raw = self.internal_to_raw(internal, bit_length)?;
                    if let Some(mask) = bit_mask {
                        raw &= mask;
                    }
                    return pack_bits(raw, bit_length, bit_position, self.is_highlow_byte_order)
                        .ok_or(EncodeError::BitRangeTooWide {
                            bit_length,
                            bit_position,
                        });
                }
                if bit_position != 0 || bit_length % 8 != 0 {
                    return Err(EncodeError::Unsupported(format!(
                        "{} with {bit_length} bits at bit position {bit_position}",
                        self.base_data_type
                    )));
                }
                let mut payload = self.encode_payload(internal)?;
                let len = (bit_length / 8) as usize;
                if payload.len() > len {
                    return Err(EncodeError::ValueOutOfRange {
                        value: internal.clone(),
                        data_type: self.base_data_type,
                        bit_length,
                    });
                }
                payload.resize(len, 0);
                Ok(payload)
            }
            CodedTypeKind::LeadingLengthInfo { bit_length } => {
                let payload = self.encode_payload(internal)?;
                let len = payload.len() as u64;
                if len > mask(bit_length) {
                    return Err(EncodeError::ValueOutOfRange {
                        value: internal.clone(),
                        data_type: self.base_data_type,
                        bit_length,
                    });
                }
                let mut out = pack_bits(len, bit_length, bit_position, self.is_highlow_byte_order)
                    .ok_or(EncodeError::BitRangeTooWide {
                        bit_length,
                        bit_position,
                    })?;
                out.extend_from_slice(&payload);
                Ok(out)
            }
        }
    }

    /// Reads a value at the cursor of `state`. Returns the value and the
    /// byte position following it; the cursor itself is left untouched.
    pub fn convert_bytes_to_internal(
        &self,
        state: &DecodeState<'_>,
        bit_position: u32,
    ) -> Result<(PhysicalValue, usize), DecodeError> {
        let position = state.cursor_byte_position;
        match self.kind {
            CodedTypeKind::StandardLength {
                bit_length,
                bit_mask,
            } => {
                if self.base_data_type.is_integer() || self.base_data_type.is_float() {
                    let too_wide = || DecodeError::BitRangeTooWide {
                        bit_length,
                        bit_position,
                    };
                    let num_bytes =
                        packed_byte_count(bit_length, bit_position).ok_or_else(too_wide)?;
                    let bytes = state.extract_bytes(position, num_bytes)?;
                    let mut raw =
                        unpack_bits(bytes, bit_length, bit_position, self.is_highlow_byte_order)
                            .ok_or_else(too_wide)?;
                    if let Some(mask) = bit_mask {
                        raw &= mask;
                    }
                    let value = self.raw_to_internal(raw, bit_length)?;
                    return Ok((value, position + num_bytes));
                }
                let len = (bit_length / 8) as usize;
                let bytes = state.extract_bytes(position, len)?;
                Ok((self.decode_payload(bytes)?, position + len))
            }
            CodedTypeKind::LeadingLengthInfo { bit_length } => {
                let too_wide = || DecodeError::BitRangeTooWide {
                    bit_length,
                    bit_position,
                };
                let prefix_len = packed_byte_count(bit_length, bit_position).ok_or_else(too_wide)?;
                let prefix = state.extract_bytes(position, prefix_len)?;
                let len = unpack_bits(prefix, bit_length, bit_position, self.is_highlow_byte_order)
                    .ok_or_else(too_wide)?;
                let len = usize::try_from(len).unwrap_or(usize::MAX);
                let payload = state.extract_bytes(position + prefix_len, len)?;
                Ok((self.decode_payload(payload)?, position + prefix_len + len))
            }
        }
    }

    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    fn internal_to_raw(&self, internal: &PhysicalValue, bit_length: u32) -> Result<u64, EncodeError> {
        let out_of_range = || EncodeError::ValueOutOfRange {
            value: internal.clone(),
            data_type: self.base_data_type,
            bit_length,
        };
        let incompatible = || EncodeError::IncompatibleValue {
            value: internal.clone(),
            data_type: self.base_data_type,
        };
        match self.base_data_type {
            DataType::AUint32 => {
                let v = internal.as_i64().ok_or_else(incompatible)?;
                if v < 0 || (bit_length < 64 && (v as u64) >> bit_length != 0) {
                    return Err(out_of_range());
                }
                Ok(v as u64)
            }
            DataType::AInt32 => {
                let v = internal.as_i64().ok_or_else(incompatible)?;
                if bit_length == 0 || bit_length > 64 {
                    return Err(out_of_range());
                }
                if bit_length < 64 {
                    let limit = 1i64 << (bit_length - 1);
                    if v < -limit || v >= limit {
                        return Err(out_of_range());
                    }
                }
                Ok((v as u64) & mask(bit_length))
            }
            DataType::AFloat32 => {
                let v = internal.as_f64().ok_or_else(incompatible)?;
                if bit_length != 32 {
                    return Err(out_of_range());
                }
                Ok(u64::from((v as f32).to_bits()))
            }
            DataType::AFloat64 => {
                let v = internal.as_f64().ok_or_else(incompatible)?;
                if bit_length != 64 {
                    return Err(out_of_range());
                }
                Ok(v.to_bits())
            }
            _ => Err(incompatible()),
        }
    }

    #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
    fn raw_to_internal(&self, raw: u64, bit_length: u32) -> Result<PhysicalValue, DecodeError> {
        match self.base_data_type {
            DataType::AUint32 => Ok(PhysicalValue::Integer(raw as i64)),
            DataType::AInt32 => {
                let signed = if bit_length > 0 && bit_length < 64 && (raw >> (bit_length - 1)) & 1 == 1
                {
                    (raw | !mask(bit_length)) as i64
                } else {
                    raw as i64
                };
                Ok(PhysicalValue::Integer(signed))
            }
            DataType::AFloat32 if bit_length == 32 => Ok(PhysicalValue::Float(f64::from(
                f32::from_bits(raw as u32),
            ))),
            DataType::AFloat64 if bit_length == 64 => Ok(PhysicalValue::Float(f64::from_bits(raw))),
            other => Err(DecodeError::InvalidCodedValue {
                data_type: other,
                reason: format!("unsupported bit length {bit_length}"),
            }),
        }
    }

    fn encode_payload(&self, internal: &PhysicalValue) -> Result<Vec<u8>, EncodeError> {
        let incompatible = || EncodeError::IncompatibleValue {
            value: internal.clone(),
            data_type: self.base_data_type,
        };
        match (self.base_data_type, internal) {
            (DataType::AAsciiString, PhysicalValue::Text(s)) if s.is_ascii() => {
                Ok(s.as_bytes().to_vec())
            }
            (DataType::AUtf8String, PhysicalValue::Text(s)) => Ok(s.as_bytes().to_vec()),
            (DataType::AUnicode2String, PhysicalValue::Text(s)) => Ok(s
                .encode_utf16()
                .flat_map(|unit| {
                    if self.is_highlow_byte_order {
                        unit.to_be_bytes()
                    } else {
                        unit.to_le_bytes()
                    }
                })
                .collect()),
            (DataType::ABytefield, PhysicalValue::Bytes(b)) => Ok(b.clone()),
            _ => Err(incompatible()),
        }
    }

    fn decode_payload(&self, bytes: &[u8]) -> Result<PhysicalValue, DecodeError> {
        let invalid = |reason: String| DecodeError::InvalidCodedValue {
            data_type: self.base_data_type,
            reason,
        };
        match self.base_data_type {
            DataType::AAsciiString | DataType::AUtf8String => {
                let end = bytes.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
                std::str::from_utf8(&bytes[..end])
                    .map(|s| PhysicalValue::Text(s.to_owned()))
                    .map_err(|e| invalid(e.to_string()))
            }
            DataType::AUnicode2String => {
                let mut units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| {
                        let pair = [pair[0], pair[1]];
                        if self.is_highlow_byte_order {
                            u16::from_be_bytes(pair)
                        } else {
                            u16::from_le_bytes(pair)
                        }
                    })
                    .collect();
                while units.last() == Some(&0) {
                    units.pop();
                }
                String::from_utf16(&units)
                    .map(PhysicalValue::Text)
                    .map_err(|e| invalid(e.to_string()))
            }
            DataType::ABytefield => Ok(PhysicalValue::Bytes(bytes.to_vec())),
            other => Err(DecodeError::InvalidCodedValue {
                data_type: other,
                reason: "numeric type without a bit length".to_owned(),
            }),
        }
    }
}

fn mask(bit_length: u32) -> u64 {
    if bit_length >= 64 {
        u64::MAX
    } else {
        (1u64 << bit_length) - 1
    }
}

/// Widest bit range that is packed into a single integer.
const MAX_PACKED_BITS: u32 = 128;

pub(crate) fn byte_count(bit_length: u32, bit_position: u32) -> usize {
    let bits = u64::from(bit_length) + u64::from(bit_position);
    usize::try_from(bits.div_ceil(8)).unwrap_or(usize::MAX)
}

/// Bytes spanned by `bit_length` bits at `bit_position`, or `None` when the
/// range does not fit into [`MAX_PACKED_BITS`].
fn packed_byte_count(bit_length: u32, bit_position: u32) -> Option<usize> {
    bit_length
        .checked_add(bit_position)
        .filter(|bits| *bits <= MAX_PACKED_BITS && bit_position < MAX_PACKED_BITS)
        .map(|bits| bits.div_ceil(8) as usize)
}

/// Places the low `bit_length` bits of `raw` at `bit_position` within the
/// smallest number of whole bytes.
fn pack_bits(raw: u64, bit_length: u32, bit_position: u32, big_endian: bool) -> Option<Vec<u8>> {
    let num_bytes = packed_byte_count(bit_length, bit_position)?;
    let shifted = u128::from(raw & mask(bit_length)) << bit_position;
    let be = shifted.to_be_bytes();
    let mut out = be[16 - num_bytes..].to_vec();
    if !big_endian {
        out.reverse();
    }
    Some(out)
}

#[allow(clippy::cast_possible_truncation)]
fn unpack_bits(bytes: &[u8], bit_length: u32, bit_position: u32, big_endian: bool) -> Option<u64> {
    packed_byte_count(bit_length, bit_position)?;
    let n = bytes.len().min(16);
    let mut buf = [0u8; 16];
    if big_endian {
        buf[16 - n..].copy_from_slice(&bytes[..n]);
    } else {
        for (i, b) in bytes[..n].iter().rev().enumerate() {
            buf[16 - n + i] = *b;
        }
    }
    let value = u128::from_be_bytes(buf) >> bit_position;
    Some((value as u64) & mask(bit_length))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pack_with_bit_position() {
        assert_eq!(pack_bits(0b101, 3, 2, true), Some(vec![0b10100]));
        assert_eq!(pack_bits(0x1234, 16, 0, true), Some(vec![0x12, 0x34]));
        assert_eq!(pack_bits(0x1234, 16, 0, false), Some(vec![0x34, 0x12]));
        assert_eq!(pack_bits(0xFF, 8, 4, true), Some(vec![0x0F, 0xF0]));
    }

    #[test]
    fn test_unpack_inverse_of_pack() {
        assert_eq!(unpack_bits(&[0x0F, 0xF0], 8, 4, true), Some(0xFF));
        assert_eq!(unpack_bits(&[0x34, 0x12], 16, 0, false), Some(0x1234));
    }

    #[test]
    fn test_range_beyond_packed_width_rejected() {
        assert_eq!(pack_bits(1, 8, 200, true), None);
        assert_eq!(pack_bits(1, 8, 121, true), None);
        assert_eq!(pack_bits(1, 8, 120, true).map(|b| b.len()), Some(16));
        assert_eq!(unpack_bits(&[0; 16], 1, 128, true), None);
        assert_eq!(packed_byte_count(u32::MAX, 1), None);
        assert_eq!(byte_count(u32::MAX, 1), 1 << 29);

        let dct = DiagCodedType::standard_length(DataType::AUint32, 8);
        assert!(matches!(
            dct.convert_internal_to_bytes(&PhysicalValue::Integer(1), 200),
            Err(EncodeError::BitRangeTooWide {
                bit_length: 8,
                bit_position: 200
            })
        ));
        let message = [0u8; 32];
        let model = crate::database::Database::default();
        let state = DecodeState::new(&model, &message);
        assert!(matches!(
            dct.convert_bytes_to_internal(&state, 200),
            Err(DecodeError::BitRangeTooWide { .. })
        ));
    }

    #[test]
    fn test_signed_value_range() {
        let dct = DiagCodedType::standard_length(DataType::AInt32, 8);
        assert_eq!(
            dct.convert_internal_to_bytes(&PhysicalValue::Integer(-1), 0).unwrap(),
            vec![0xFF]
        );
        assert!(matches!(
            dct.convert_internal_to_bytes(&PhysicalValue::Integer(128), 0),
            Err(EncodeError::ValueOutOfRange { .. })
        ));
    }

    #[test]
    fn test_unsigned_overflow_rejected() {
        let dct = DiagCodedType::standard_length(DataType::AUint32, 8);
        assert!(matches!(
            dct.convert_internal_to_bytes(&PhysicalValue::Integer(256), 0),
            Err(EncodeError::ValueOutOfRange { .. })
        ));
    }

    #[test]
    fn test_leading_length_prefix() {
        let dct = DiagCodedType::leading_length_info(DataType::AAsciiString, 8);
        assert_eq!(
            dct.convert_internal_to_bytes(&PhysicalValue::Text("AB".into()), 0)
                .unwrap(),
            vec![2, b'A', b'B']
        );
    }
}
