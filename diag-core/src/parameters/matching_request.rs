use super::{Parameter, ParameterCodec};
use crate::decode_state::DecodeState;
use crate::encode_state::EncodeState;
use crate::error::{DecodeError, EncodeError};
use crate::odxtypes::PhysicalValue;

/// Response bytes copied from the triggering request.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchingRequestParameter {
    pub request_byte_position: u32,
    pub byte_length: u32,
}

impl MatchingRequestParameter {
    pub fn new(request_byte_position: u32, byte_length: u32) -> Self {
        Self {
            request_byte_position,
            byte_length,
        }
    }
}

impl ParameterCodec for MatchingRequestParameter {
    fn is_required(&self) -> bool {
        false
    }

    fn encode_positioned<'a>(
        &self,
        param: &Parameter,
        state: &mut EncodeState<'a>,
    ) -> Result<(), EncodeError> {
        let request = state
            .triggering_request
            .ok_or_else(|| EncodeError::MissingTriggeringRequest {
                param: param.short_name.clone(),
            })?;
        let start = self.request_byte_position as usize;
        let needed = start + self.byte_length as usize;
        let bytes = request
            .get(start..needed)
            .ok_or_else(|| EncodeError::RequestTooShort {
                param: param.short_name.clone(),
                len: request.len(),
                needed,
            })?;
        state.emplace_bytes(bytes, &param.short_name);
        Ok(())
    }

    fn decode_positioned<'a>(
        &self,
        _param: &Parameter,
        state: &mut DecodeState<'a>,
    ) -> Result<PhysicalValue, DecodeError> {
        let len = self.byte_length as usize;
        let bytes = state.extract_bytes(state.cursor_byte_position, len)?;
        state.cursor_byte_position += len;
        if len <= 8 {
            #[allow(clippy::cast_possible_wrap)]
            let value = bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)) as i64;
            Ok(PhysicalValue::Integer(value))
        } else {
            Ok(PhysicalValue::Bytes(bytes.to_vec()))
        }
    }
}
