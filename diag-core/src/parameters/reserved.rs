use super::{Parameter, ParameterCodec};
use crate::decode_state::DecodeState;
use crate::diag_coded_type::{DiagCodedType, byte_count};
use crate::encode_state::EncodeState;
use crate::error::{DecodeError, EncodeError};
use crate::odxtypes::{DataType, PhysicalValue};

/// Bits that are written as zero and skipped when decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct ReservedParameter {
    pub bit_length: u32,
}

impl ReservedParameter {
    pub fn new(bit_length: u32) -> Self {
        Self { bit_length }
    }
}

impl ParameterCodec for ReservedParameter {
    fn is_required(&self) -> bool {
        false
    }

    fn encode_positioned<'a>(
        &self,
        param: &Parameter,
        state: &mut EncodeState<'a>,
    ) -> Result<(), EncodeError> {
        let zeros = vec![0u8; byte_count(self.bit_length, state.cursor_bit_position)];
        state.emplace_bytes(&zeros, &param.short_name);
        Ok(())
    }

    fn decode_positioned<'a>(
        &self,
        _param: &Parameter,
        state: &mut DecodeState<'a>,
    ) -> Result<PhysicalValue, DecodeError> {
        if self.bit_length <= 64 {
            let dct = DiagCodedType::standard_length(DataType::AUint32, self.bit_length);
            let (value, next) = dct.convert_bytes_to_internal(state, state.cursor_bit_position)?;
            state.cursor_byte_position = next;
            return Ok(value);
        }
        let len = byte_count(self.bit_length, state.cursor_bit_position);
        let bytes = state.extract_bytes(state.cursor_byte_position, len)?;
        state.cursor_byte_position += len;
        Ok(PhysicalValue::Bytes(bytes.to_vec()))
    }
}
