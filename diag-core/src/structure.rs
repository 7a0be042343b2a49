use std::collections::HashMap;

use crate::database::Database;
use crate::decode_state::DecodeState;
use crate::encode_state::EncodeState;
use crate::error::{DecodeError, EncodeError, OdxError};
use crate::odxlink::{
    LinkError, LinkTarget, OdxLinkDatabase, OdxLinkDatabaseBuilder, OdxLinkId, ParamId, StructureId,
};
use crate::odxtypes::ParameterValues;
use crate::parameters::{Parameter, ParameterKind};
use crate::snref::SnRefContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureKind {
    Structure,
    Request,
    PositiveResponse,
    NegativeResponse,
}

impl StructureKind {
    pub fn is_response(self) -> bool {
        matches!(self, Self::PositiveResponse | Self::NegativeResponse)
    }
}

/// An ordered list of parameters: a `STRUCTURE`, `REQUEST` or response.
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    pub odx_id: OdxLinkId,
    pub short_name: String,
    pub long_name: Option<String>,
    pub kind: StructureKind,
    /// Fixed size in bytes; shorter contents are zero padded.
    pub byte_size: Option<u32>,
    pub parameters: Vec<Parameter>,
}

impl Structure {
    pub fn new(odx_id: OdxLinkId, short_name: impl Into<String>, kind: StructureKind) -> Self {
        Self {
            odx_id,
            short_name: short_name.into(),
            long_name: None,
            kind,
            byte_size: None,
            parameters: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    #[must_use]
    pub fn with_byte_size(mut self, byte_size: u32) -> Self {
        self.byte_size = Some(byte_size);
        self
    }

    pub fn parameter(&self, short_name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.short_name == short_name)
    }

    pub fn required_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter().filter(|p| p.is_required())
    }

    pub fn has_short_name_refs(&self) -> bool {
        self.parameters.iter().any(Parameter::has_short_name_refs)
    }

    /// Encodes a complete message from `values`.
    pub fn encode(&self, model: &Database, values: &ParameterValues) -> Result<Vec<u8>, EncodeError> {
        let mut state = EncodeState::new(model, values);
        self.encode_into_pdu(&mut state)?;
        Ok(state.coded_message)
    }

    /// Encodes a response, copying matching-request bytes from `request`.
    pub fn encode_response(
        &self,
        model: &Database,
        values: &ParameterValues,
        request: &[u8],
    ) -> Result<Vec<u8>, EncodeError> {
        let mut state = EncodeState::new(model, values).with_triggering_request(request);
        self.encode_into_pdu(&mut state)?;
        Ok(state.coded_message)
    }

    pub fn decode(&self, model: &Database, message: &[u8]) -> Result<ParameterValues, DecodeError> {
        let mut state = DecodeState::new(model, message);
        let values = self.decode_from_pdu(&mut state)?;
        if state.remaining() > 0 {
            log::debug!(
                "'{}': {} trailing bytes left undecoded",
                self.short_name,
                state.remaining()
            );
        }
        Ok(values)
    }

    /// Encodes all parameters in declaration order, relative to the current
    /// origin of `state`.
    pub fn encode_into_pdu(&self, state: &mut EncodeState<'_>) -> Result<(), EncodeError> {
        for name in state.parameter_values.keys() {
            if self.parameter(name).is_none() {
                log::warn!(
                    "'{}' has no parameter '{name}', ignoring its value",
                    self.short_name
                );
            }
        }
        for parameter in &self.parameters {
            parameter.encode_into_pdu(state)?;
        }
        if let Some(byte_size) = self.byte_size {
            let end = state.origin_byte_position + byte_size as usize;
            if state.cursor_byte_position > end {
                return Err(EncodeError::ByteSizeExceeded {
                    structure: self.short_name.clone(),
                    byte_size: byte_size as usize,
                    actual: state.cursor_byte_position - state.origin_byte_position,
                });
            }
            if state.coded_message.len() < end {
                state.coded_message.resize(end, 0);
            }
            state.cursor_byte_position = end;
        }
        Ok(())
    }

    pub fn decode_from_pdu(&self, state: &mut DecodeState<'_>) -> Result<ParameterValues, DecodeError> {
        let mut values = ParameterValues::new();
        for parameter in &self.parameters {
            let (value, _) = parameter.decode_from_pdu(state)?;
            values.insert(parameter.short_name.clone(), value);
        }
        if let Some(byte_size) = self.byte_size {
            state.cursor_byte_position = state
                .cursor_byte_position
                .max(state.origin_byte_position + byte_size as usize);
        }
        Ok(values)
    }

    /// Encodes this structure as the value of an enclosing parameter: the
    /// cursor becomes the new origin and `values` the visible values.
    pub(crate) fn encode_nested<'a>(
        &self,
        values: &'a ParameterValues,
        state: &mut EncodeState<'a>,
    ) -> Result<(), EncodeError> {
        let outer_values = state.parameter_values;
        let outer_origin = state.origin_byte_position;
        state.parameter_values = values;
        state.origin_byte_position = state.cursor_byte_position;
        let result = self.encode_into_pdu(state);
        state.parameter_values = outer_values;
        state.origin_byte_position = outer_origin;
        result
    }

    pub(crate) fn decode_nested(&self, state: &mut DecodeState<'_>) -> Result<ParameterValues, DecodeError> {
        let outer_origin = state.origin_byte_position;
        state.origin_byte_position = state.cursor_byte_position;
        let result = self.decode_from_pdu(state);
        state.origin_byte_position = outer_origin;
        result
    }

    pub(crate) fn build_odxlinks(
        &self,
        id: StructureId,
        builder: &mut OdxLinkDatabaseBuilder,
    ) -> Result<(), LinkError> {
        builder.register(&self.odx_id, LinkTarget::Structure(id))?;
        for (index, parameter) in self.parameters.iter().enumerate() {
            let param_id = ParamId {
                structure: id,
                index: u32::try_from(index).unwrap_or(u32::MAX),
            };
            parameter.build_odxlinks(param_id, builder)?;
        }
        Ok(())
    }

    pub(crate) fn resolve_odxlinks(&mut self, links: &OdxLinkDatabase) -> Result<(), OdxError> {
        for parameter in &mut self.parameters {
            parameter.resolve_odxlinks(links)?;
        }
        Ok(())
    }

    /// Resolves short-name references of all parameters as seen from the
    /// layer described by `ctx`. `id` is the handle this structure is stored
    /// under.
    pub(crate) fn resolve_snrefs(
        &mut self,
        id: StructureId,
        ctx: &SnRefContext<'_>,
    ) -> Result<(), OdxError> {
        let siblings: HashMap<String, (u32, bool)> = self
            .parameters
            .iter()
            .enumerate()
            .map(|(index, p)| {
                (
                    p.short_name.clone(),
                    (
                        u32::try_from(index).unwrap_or(u32::MAX),
                        matches!(p.kind, ParameterKind::TableKey(_)),
                    ),
                )
            })
            .collect();
        for parameter in &mut self.parameters {
            match &mut parameter.kind {
                ParameterKind::Value(p) => p.resolve_snrefs(ctx)?,
                ParameterKind::TableKey(p) => p.resolve_snrefs(ctx, &parameter.short_name)?,
                ParameterKind::TableStruct(p) => {
                    p.resolve_snrefs(&parameter.short_name, id, &siblings)?;
                }
                _ => {}
            }
        }
        Ok(())
    }
}
