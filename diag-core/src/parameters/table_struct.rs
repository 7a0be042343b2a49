use std::collections::HashMap;

use super::{Parameter, ParameterCodec};
use crate::database::Database;
use crate::decode_state::DecodeState;
use crate::dop::DopBase;
use crate::encode_state::EncodeState;
use crate::error::{DecodeError, EncodeError, OdxError};
use crate::odxlink::{OdxLinkDatabase, OdxLinkRef, ParamId, StructureId};
use crate::odxtypes::{ParameterValues, PhysicalValue};

/// Data whose layout is chosen by the row selected by a table key
/// parameter of the same message.
#[derive(Debug, Clone, PartialEq)]
pub struct TableStructParameter {
    pub table_key_ref: Option<OdxLinkRef>,
    pub table_key_snref: Option<String>,
    table_key: Option<ParamId>,
}

impl TableStructParameter {
    pub fn new(
        short_name: &str,
        table_key_ref: Option<OdxLinkRef>,
        table_key_snref: Option<String>,
    ) -> Result<Self, OdxError> {
        if table_key_ref.is_none() && table_key_snref.is_none() {
            return Err(OdxError::MissingTableKeyLinkage {
                param: short_name.to_owned(),
            });
        }
        Ok(Self {
            table_key_ref,
            table_key_snref,
            table_key: None,
        })
    }

    pub fn table_key(&self) -> Option<ParamId> {
        self.table_key
    }

    pub(crate) fn resolve_odxlinks(
        &mut self,
        links: &OdxLinkDatabase,
        context: &str,
    ) -> Result<(), OdxError> {
        if let Some(key_ref) = &self.table_key_ref {
            self.table_key = Some(links.resolve(key_ref).map_err(OdxError::link(context))?);
        }
        Ok(())
    }

    /// `siblings` maps the parameter names of the enclosing structure to
    /// their index and whether they are table keys.
    pub(crate) fn resolve_snrefs(
        &mut self,
        short_name: &str,
        structure: StructureId,
        siblings: &HashMap<String, (u32, bool)>,
    ) -> Result<(), OdxError> {
        let Some(key_snref) = &self.table_key_snref else {
            return Ok(());
        };
        match siblings.get(key_snref) {
            Some(&(index, true)) => {
                self.table_key = Some(ParamId { structure, index });
                Ok(())
            }
            Some(&(_, false)) => Err(OdxError::NotATableKey {
                param: short_name.to_owned(),
                key: key_snref.clone(),
            }),
            None => Err(OdxError::UnknownShortName {
                kind: "table key parameter",
                name: key_snref.clone(),
                layer: format!("structure of '{short_name}'"),
            }),
        }
    }

    fn key_name<'m>(&self, model: &'m Database) -> Option<&'m str> {
        self.table_key
            .map(|id| model.parameter(id).short_name.as_str())
    }
}

impl ParameterCodec for TableStructParameter {
    fn is_required(&self) -> bool {
        true
    }

    fn encode_positioned<'a>(
        &self,
        param: &Parameter,
        state: &mut EncodeState<'a>,
    ) -> Result<(), EncodeError> {
        let name = &param.short_name;
        let model = state.model();
        let key_name = self
            .key_name(model)
            .ok_or_else(|| EncodeError::Unresolved { param: name.clone() })?;
        let row = state
            .table_key(key_name)
            .ok_or_else(|| EncodeError::MissingTableKeyBinding {
                param: name.clone(),
                key: key_name.to_owned(),
            })?;
        if let Some(structure_id) = row.structure() {
            let value = state
                .physical_value(name)
                .ok_or_else(|| EncodeError::MissingValue { param: name.clone() })?;
            let PhysicalValue::Structure(values) = value else {
                return Err(EncodeError::InvalidValueType {
                    param: name.clone(),
                    expected: "structure",
                    found: value.kind_name(),
                });
            };
            model.structure(structure_id).encode_nested(values, state)
        } else if let Some(dop_id) = row.dop() {
            let value = state
                .physical_value(name)
                .ok_or_else(|| EncodeError::MissingValue { param: name.clone() })?;
            let bytes = model
                .dop(dop_id)
                .convert_physical_to_bytes(value, state, state.cursor_bit_position)?;
            state.emplace_bytes(&bytes, name);
            Ok(())
        } else {
            log::debug!("table row '{}' carries no data for '{name}'", row.short_name);
            Ok(())
        }
    }

    fn decode_positioned<'a>(
        &self,
        param: &Parameter,
        state: &mut DecodeState<'a>,
    ) -> Result<PhysicalValue, DecodeError> {
        let name = &param.short_name;
        let model = state.model();
        let key_name = self
            .key_name(model)
            .ok_or_else(|| DecodeError::Unresolved { param: name.clone() })?;
        let row = state
            .table_key(key_name)
            .ok_or_else(|| DecodeError::MissingTableKeyBinding {
                param: name.clone(),
                key: key_name.to_owned(),
            })?;
        if let Some(structure_id) = row.structure() {
            let values = model.structure(structure_id).decode_nested(state)?;
            Ok(PhysicalValue::Structure(values))
        } else if let Some(dop_id) = row.dop() {
            let (value, next) = model
                .dop(dop_id)
                .convert_bytes_to_physical(state, state.cursor_bit_position)?;
            state.cursor_byte_position = next;
            Ok(value)
        } else {
            Ok(PhysicalValue::Structure(ParameterValues::new()))
        }
    }
}
