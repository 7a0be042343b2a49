//! Message parameters and their codec.
//!
//! [`Parameter`] carries the fields shared by every parameter kind and
//! handles positioning within the message; the kind-specific behaviour is
//! dispatched through [`ParameterCodec`].

mod coded_const;
mod matching_request;
mod reserved;
mod table_key;
mod table_struct;
mod value;

pub use coded_const::CodedConstParameter;
pub use matching_request::MatchingRequestParameter;
pub use reserved::ReservedParameter;
pub use table_key::{TableKeyLinkage, TableKeyParameter};
pub use table_struct::TableStructParameter;
pub use value::ValueParameter;

use crate::decode_state::DecodeState;
use crate::encode_state::EncodeState;
use crate::error::{DecodeError, EncodeError, OdxError};
use crate::odxlink::{LinkError, LinkTarget, OdxLinkDatabase, OdxLinkDatabaseBuilder, OdxLinkId, ParamId};
use crate::odxtypes::PhysicalValue;

/// Kind-specific encoding and decoding of a parameter.
pub trait ParameterCodec {
    /// Whether encoding fails when the caller provides no value.
    fn is_required(&self) -> bool;

    /// Whether the parameter occupies bytes of the message. Parameters that
    /// do not are processed without moving the cursor.
    fn is_positioned(&self) -> bool {
        true
    }

    fn encode_positioned<'a>(
        &self,
        param: &Parameter,
        state: &mut EncodeState<'a>,
    ) -> Result<(), EncodeError>;

    fn decode_positioned<'a>(
        &self,
        param: &Parameter,
        state: &mut DecodeState<'a>,
    ) -> Result<PhysicalValue, DecodeError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub short_name: String,
    pub semantic: Option<String>,
    /// Offset from the start of the enclosing structure; `None` means the
    /// parameter follows its predecessor.
    pub byte_position: Option<u32>,
    pub bit_position: Option<u32>,
    pub kind: ParameterKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParameterKind {
    CodedConst(CodedConstParameter),
    Value(ValueParameter),
    Reserved(ReservedParameter),
    MatchingRequest(MatchingRequestParameter),
    TableKey(TableKeyParameter),
    TableStruct(TableStructParameter),
}

impl Parameter {
    pub fn new(short_name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            short_name: short_name.into(),
            semantic: None,
            byte_position: None,
            bit_position: None,
            kind,
        }
    }

    /// Creates a table key parameter, rejecting one without any linkage.
    pub fn table_key(
        short_name: impl Into<String>,
        odx_id: OdxLinkId,
        linkage: TableKeyLinkage,
    ) -> Result<Self, OdxError> {
        let short_name = short_name.into();
        let kind = TableKeyParameter::new(&short_name, odx_id, linkage)?;
        Ok(Self::new(short_name, ParameterKind::TableKey(kind)))
    }

    #[must_use]
    pub fn at_byte(mut self, byte_position: u32) -> Self {
        self.byte_position = Some(byte_position);
        self
    }

    #[must_use]
    pub fn at_bit(mut self, bit_position: u32) -> Self {
        self.bit_position = Some(bit_position);
        self
    }

    pub fn parameter_type(&self) -> &'static str {
        match &self.kind {
            ParameterKind::CodedConst(_) => "CODED-CONST",
            ParameterKind::Value(_) => "VALUE",
            ParameterKind::Reserved(_) => "RESERVED",
            ParameterKind::MatchingRequest(_) => "MATCHING-REQUEST-PARAM",
            ParameterKind::TableKey(_) => "TABLE-KEY",
            ParameterKind::TableStruct(_) => "TABLE-STRUCT",
        }
    }

    fn codec(&self) -> &dyn ParameterCodec {
        match &self.kind {
            ParameterKind::CodedConst(p) => p,
            ParameterKind::Value(p) => p,
            ParameterKind::Reserved(p) => p,
            ParameterKind::MatchingRequest(p) => p,
            ParameterKind::TableKey(p) => p,
            ParameterKind::TableStruct(p) => p,
        }
    }

    pub fn is_required(&self) -> bool {
        self.codec().is_required()
    }

    pub fn odx_id(&self) -> Option<&OdxLinkId> {
        match &self.kind {
            ParameterKind::TableKey(p) => Some(&p.odx_id),
            _ => None,
        }
    }

    pub fn has_short_name_refs(&self) -> bool {
        match &self.kind {
            ParameterKind::Value(p) => p.dop_snref.is_some(),
            ParameterKind::TableKey(p) => p.table_snref.is_some() || p.table_row_snref.is_some(),
            ParameterKind::TableStruct(p) => p.table_key_snref.is_some(),
            _ => false,
        }
    }

    /// Encodes the parameter at its declared position.
    ///
    /// The cursor is moved to the declared byte position (relative to the
    /// structure origin), the kind-specific encoder runs, and afterwards the
    /// cursor never ends up before where it started.
    pub fn encode_into_pdu(&self, state: &mut EncodeState<'_>) -> Result<(), EncodeError> {
        let codec = self.codec();
        if !codec.is_positioned() {
            return codec.encode_positioned(self, state);
        }
        let start = state.cursor_byte_position;
        if let Some(byte_position) = self.byte_position {
            state.cursor_byte_position = state.origin_byte_position + byte_position as usize;
        }
        state.cursor_bit_position = self.bit_position.unwrap_or(0);
        let result = codec.encode_positioned(self, state);
        state.cursor_byte_position = state.cursor_byte_position.max(start);
        state.cursor_bit_position = 0;
        result
    }

    /// Decodes the parameter at its declared position. Returns the value and
    /// the cursor position after it.
    pub fn decode_from_pdu(
        &self,
        state: &mut DecodeState<'_>,
    ) -> Result<(PhysicalValue, usize), DecodeError> {
        let codec = self.codec();
        if !codec.is_positioned() {
            let value = codec.decode_positioned(self, state)?;
            return Ok((value, state.cursor_byte_position));
        }
        let start = state.cursor_byte_position;
        if let Some(byte_position) = self.byte_position {
            state.cursor_byte_position = state.origin_byte_position + byte_position as usize;
        }
        state.cursor_bit_position = self.bit_position.unwrap_or(0);
        let result = codec.decode_positioned(self, state);
        state.cursor_byte_position = state.cursor_byte_position.max(start);
        state.cursor_bit_position = 0;
        result.map(|value| (value, state.cursor_byte_position))
    }

    pub(crate) fn build_odxlinks(
        &self,
        id: ParamId,
        builder: &mut OdxLinkDatabaseBuilder,
    ) -> Result<(), LinkError> {
        if let Some(odx_id) = self.odx_id() {
            builder.register(odx_id, LinkTarget::Parameter(id))?;
        }
        Ok(())
    }

    pub(crate) fn resolve_odxlinks(&mut self, links: &OdxLinkDatabase) -> Result<(), OdxError> {
        if let Some(bit_position) = self.bit_position.filter(|bit| *bit > 7) {
            return Err(OdxError::InvalidBitPosition {
                param: self.short_name.clone(),
                bit_position,
            });
        }
        let context = format!("parameter '{}'", self.short_name);
        match &mut self.kind {
            ParameterKind::Value(p) => p.resolve_odxlinks(links, &context),
            ParameterKind::TableKey(p) => p.resolve_odxlinks(links, &self.short_name),
            ParameterKind::TableStruct(p) => p.resolve_odxlinks(links, &context),
            _ => Ok(()),
        }
    }
}
