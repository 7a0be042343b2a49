use super::{Parameter, ParameterCodec};
use crate::database::Database;
use crate::decode_state::DecodeState;
use crate::dop::DopBase;
use crate::encode_state::EncodeState;
use crate::error::{DecodeError, EncodeError, OdxError};
use crate::odxlink::{OdxLinkDatabase, OdxLinkId, OdxLinkRef, TableId, TableRowId};
use crate::odxtypes::PhysicalValue;
use crate::snref::SnRefContext;
use crate::table::{RowMatch, Table, row_names};

/// How a table key parameter designates its table and, optionally, a fixed
/// row of it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableKeyLinkage {
    pub table_ref: Option<OdxLinkRef>,
    pub table_snref: Option<String>,
    pub table_row_ref: Option<OdxLinkRef>,
    pub table_row_snref: Option<String>,
}

impl TableKeyLinkage {
    pub fn table(table_ref: OdxLinkRef) -> Self {
        Self {
            table_ref: Some(table_ref),
            ..Self::default()
        }
    }

    pub fn table_short_name(name: impl Into<String>) -> Self {
        Self {
            table_snref: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn row(table_row_ref: OdxLinkRef) -> Self {
        Self {
            table_row_ref: Some(table_row_ref),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_row_short_name(mut self, name: impl Into<String>) -> Self {
        self.table_row_snref = Some(name.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.table_ref.is_none()
            && self.table_snref.is_none()
            && self.table_row_ref.is_none()
            && self.table_row_snref.is_none()
    }
}

/// Selects a table row. With a fixed row the parameter is static and
/// contributes no bytes; otherwise the key is taken from the caller (encode)
/// or from the message (decode) and must match exactly one row.
#[derive(Debug, Clone, PartialEq)]
pub struct TableKeyParameter {
    pub odx_id: OdxLinkId,
    pub table_ref: Option<OdxLinkRef>,
    pub table_snref: Option<String>,
    pub table_row_ref: Option<OdxLinkRef>,
    pub table_row_snref: Option<String>,
    table: Option<TableId>,
    table_row: Option<TableRowId>,
}

impl TableKeyParameter {
    pub fn new(
        short_name: &str,
        odx_id: OdxLinkId,
        linkage: TableKeyLinkage,
    ) -> Result<Self, OdxError> {
        if linkage.is_empty() {
            return Err(OdxError::MissingTableLinkage {
                param: short_name.to_owned(),
            });
        }
        Ok(Self {
            odx_id,
            table_ref: linkage.table_ref,
            table_snref: linkage.table_snref,
            table_row_ref: linkage.table_row_ref,
            table_row_snref: linkage.table_row_snref,
            table: None,
            table_row: None,
        })
    }

    pub fn table(&self) -> Option<TableId> {
        self.table
    }

    pub fn table_row(&self) -> Option<TableRowId> {
        self.table_row
    }

    pub(crate) fn resolve_odxlinks(
        &mut self,
        links: &OdxLinkDatabase,
        short_name: &str,
    ) -> Result<(), OdxError> {
        let context = format!("table key parameter '{short_name}'");
        if let Some(table_ref) = &self.table_ref {
            self.table = Some(links.resolve(table_ref).map_err(OdxError::link(&context))?);
        }
        if let Some(row_ref) = &self.table_row_ref {
            let row: TableRowId = links.resolve(row_ref).map_err(OdxError::link(&context))?;
            match self.table {
                Some(table) if table != row.table => {
                    return Err(OdxError::RowOutsideTable {
                        param: short_name.to_owned(),
                        row: row_ref.ref_id.clone(),
                        table: self
                            .table_ref
                            .as_ref()
                            .map_or_else(String::new, |r| r.ref_id.clone()),
                    });
                }
                _ => self.table = Some(row.table),
            }
            self.table_row = Some(row);
        }
        Ok(())
    }

    /// Resolves the short-name linkage in the scope of one layer. A row named
    /// by short name is looked up in the table resolved just before.
    pub(crate) fn resolve_snrefs(
        &mut self,
        ctx: &SnRefContext<'_>,
        short_name: &str,
    ) -> Result<(), OdxError> {
        if let Some(table_snref) = &self.table_snref {
            self.table = Some(ctx.table_id(table_snref)?);
        }
        if let Some(row_snref) = &self.table_row_snref {
            let table_id = self.table.ok_or_else(|| OdxError::TableRowWithoutTable {
                param: short_name.to_owned(),
                row: row_snref.clone(),
            })?;
            let table = ctx.table(table_id);
            let (index, _) = table.row_by_short_name(row_snref).ok_or_else(|| {
                OdxError::UnknownShortName {
                    kind: "table row",
                    name: format!("{}.{row_snref}", table.short_name),
                    layer: ctx.layer_name.to_owned(),
                }
            })?;
            self.table_row = Some(TableRowId {
                table: table_id,
                row: index,
            });
        }
        Ok(())
    }

    fn resolved_table<'m>(&self, model: &'m Database) -> Option<&'m Table> {
        self.table.map(|id| model.table(id))
    }
}

impl ParameterCodec for TableKeyParameter {
    fn is_required(&self) -> bool {
        self.table_row.is_none()
    }

    fn is_positioned(&self) -> bool {
        self.table_row.is_none()
    }

    fn encode_positioned<'a>(
        &self,
        param: &Parameter,
        state: &mut EncodeState<'a>,
    ) -> Result<(), EncodeError> {
        let name = &param.short_name;
        let model = state.model();
        if let Some(row_id) = self.table_row {
            state.bind_table_key(name, model.table_row(row_id));
            return Ok(());
        }
        let table = self
            .resolved_table(model)
            .ok_or_else(|| EncodeError::Unresolved { param: name.clone() })?;
        let key = state
            .physical_value(name)
            .ok_or_else(|| EncodeError::MissingValue { param: name.clone() })?;
        if !key.is_atomic() {
            return Err(EncodeError::InvalidValueType {
                param: name.clone(),
                expected: "text, integer, float or bytes",
                found: key.kind_name(),
            });
        }
        let row = match table.match_key(key) {
            RowMatch::Unique(row) => row,
            RowMatch::None => {
                return Err(EncodeError::NoMatchingTableRow {
                    param: name.clone(),
                    table: table.short_name.clone(),
                    key: key.clone(),
                });
            }
            RowMatch::Ambiguous(rows) => {
                return Err(EncodeError::AmbiguousTableRow {
                    param: name.clone(),
                    table: table.short_name.clone(),
                    key: key.clone(),
                    rows: row_names(&rows),
                });
            }
        };
        let key_dop = table.key_dop().ok_or_else(|| EncodeError::MissingKeyDop {
            param: name.clone(),
            table: table.short_name.clone(),
        })?;
        state.bind_table_key(name, row);
        let bytes = model
            .dop(key_dop)
            .convert_physical_to_bytes(&row.key, state, state.cursor_bit_position)?;
        state.emplace_bytes(&bytes, name);
        Ok(())
    }

    fn decode_positioned<'a>(
        &self,
        param: &Parameter,
        state: &mut DecodeState<'a>,
    ) -> Result<PhysicalValue, DecodeError> {
        let name = &param.short_name;
        let model = state.model();
        if let Some(row_id) = self.table_row {
            let row = model.table_row(row_id);
            state.bind_table_key(name, row);
            return Ok(row.key.clone());
        }
        let table = self
            .resolved_table(model)
            .ok_or_else(|| DecodeError::Unresolved { param: name.clone() })?;
        let key_dop = table.key_dop().ok_or_else(|| DecodeError::MissingKeyDop {
            param: name.clone(),
            table: table.short_name.clone(),
        })?;
        let (key, next) = model
            .dop(key_dop)
            .convert_bytes_to_physical(state, state.cursor_bit_position)?;
        state.cursor_byte_position = next;
        match table.match_key(&key) {
            RowMatch::Unique(row) => {
                state.bind_table_key(name, row);
                Ok(key)
            }
            RowMatch::None => Err(DecodeError::NoMatchingTableRow {
                param: name.clone(),
                table: table.short_name.clone(),
                key,
            }),
            RowMatch::Ambiguous(rows) => Err(DecodeError::AmbiguousTableRow {
                param: name.clone(),
                table: table.short_name.clone(),
                rows: row_names(&rows),
                key,
            }),
        }
    }
}
