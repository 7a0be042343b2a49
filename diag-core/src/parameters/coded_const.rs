use super::{Parameter, ParameterCodec};
use crate::decode_state::DecodeState;
use crate::diag_coded_type::DiagCodedType;
use crate::encode_state::EncodeState;
use crate::error::{DecodeError, EncodeError};
use crate::odxtypes::PhysicalValue;

/// A fixed value, typically a service identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct CodedConstParameter {
    pub diag_coded_type: DiagCodedType,
    pub coded_value: PhysicalValue,
}

impl CodedConstParameter {
    pub fn new(diag_coded_type: DiagCodedType, coded_value: impl Into<PhysicalValue>) -> Self {
        Self {
            diag_coded_type,
            coded_value: coded_value.into(),
        }
    }
}

impl ParameterCodec for CodedConstParameter {
    fn is_required(&self) -> bool {
        false
    }

    fn encode_positioned<'a>(
        &self,
        param: &Parameter,
        state: &mut EncodeState<'a>,
    ) -> Result<(), EncodeError> {
        if let Some(given) = state.physical_value(&param.short_name)
            && !given.key_eq(&self.coded_value)
        {
            return Err(EncodeError::CodedConstMismatch {
                param: param.short_name.clone(),
                expected: self.coded_value.clone(),
                found: given.clone(),
            });
        }
        let bytes = self
            .diag_coded_type
            .convert_internal_to_bytes(&self.coded_value, state.cursor_bit_position)?;
        state.emplace_bytes(&bytes, &param.short_name);
        Ok(())
    }

    fn decode_positioned<'a>(
        &self,
        param: &Parameter,
        state: &mut DecodeState<'a>,
    ) -> Result<PhysicalValue, DecodeError> {
        let (value, next) = self
            .diag_coded_type
            .convert_bytes_to_internal(state, state.cursor_bit_position)?;
        state.cursor_byte_position = next;
        if !value.key_eq(&self.coded_value) {
            return Err(DecodeError::CodedConstMismatch {
                param: param.short_name.clone(),
                expected: self.coded_value.clone(),
                found: value,
            });
        }
        Ok(value)
    }
}
