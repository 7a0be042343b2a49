use std::borrow::Cow;

use super::{Parameter, ParameterCodec};
use crate::decode_state::DecodeState;
use crate::dop::DopBase;
use crate::encode_state::EncodeState;
use crate::error::{DecodeError, EncodeError, OdxError};
use crate::odxlink::{DopId, OdxLinkDatabase, OdxLinkRef};
use crate::odxtypes::PhysicalValue;
use crate::snref::SnRefContext;

/// A caller-supplied value converted by a DOP.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueParameter {
    pub dop_ref: Option<OdxLinkRef>,
    pub dop_snref: Option<String>,
    /// Textual default from the model, interpreted by the DOP's physical type.
    pub physical_default_value: Option<String>,
    dop: Option<DopId>,
}

impl ValueParameter {
    pub fn new(dop_ref: OdxLinkRef) -> Self {
        Self {
            dop_ref: Some(dop_ref),
            dop_snref: None,
            physical_default_value: None,
            dop: None,
        }
    }

    pub fn by_short_name(dop_snref: impl Into<String>) -> Self {
        Self {
            dop_ref: None,
            dop_snref: Some(dop_snref.into()),
            physical_default_value: None,
            dop: None,
        }
    }

    #[must_use]
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.physical_default_value = Some(value.into());
        self
    }

    pub fn dop(&self) -> Option<DopId> {
        self.dop
    }

    pub(crate) fn resolve_odxlinks(
        &mut self,
        links: &OdxLinkDatabase,
        context: &str,
    ) -> Result<(), OdxError> {
        if let Some(dop_ref) = &self.dop_ref {
            self.dop = Some(links.resolve(dop_ref).map_err(OdxError::link(context))?);
        }
        Ok(())
    }

    pub(crate) fn resolve_snrefs(&mut self, ctx: &SnRefContext<'_>) -> Result<(), OdxError> {
        if let Some(snref) = &self.dop_snref {
            self.dop = Some(ctx.dop_id(snref)?);
        }
        Ok(())
    }
}

impl ParameterCodec for ValueParameter {
    fn is_required(&self) -> bool {
        self.physical_default_value.is_none()
    }

    fn encode_positioned<'a>(
        &self,
        param: &Parameter,
        state: &mut EncodeState<'a>,
    ) -> Result<(), EncodeError> {
        let unresolved = || EncodeError::Unresolved {
            param: param.short_name.clone(),
        };
        let dop = state.model().dop(self.dop.ok_or_else(unresolved)?);
        let value = match (state.physical_value(&param.short_name), &self.physical_default_value) {
            (Some(value), _) => Cow::Borrowed(value),
            (None, Some(default)) => Cow::Owned(dop.physical_type.parse_value(default).map_err(
                |_| EncodeError::IncompatibleValue {
                    value: PhysicalValue::Text(default.clone()),
                    data_type: dop.physical_type,
                },
            )?),
            (None, None) => {
                return Err(EncodeError::MissingValue {
                    param: param.short_name.clone(),
                });
            }
        };
        let bytes = dop.convert_physical_to_bytes(&value, state, state.cursor_bit_position)?;
        state.emplace_bytes(&bytes, &param.short_name);
        Ok(())
    }

    fn decode_positioned<'a>(
        &self,
        param: &Parameter,
        state: &mut DecodeState<'a>,
    ) -> Result<PhysicalValue, DecodeError> {
        let dop_id = self.dop.ok_or_else(|| DecodeError::Unresolved {
            param: param.short_name.clone(),
        })?;
        let (value, next) = state
            .model()
            .dop(dop_id)
            .convert_bytes_to_physical(state, state.cursor_bit_position)?;
        state.cursor_byte_position = next;
        Ok(value)
    }
}
