use crate::dop::DataObjectProperty;
use crate::error::OdxError;
use crate::odxlink::{
    DopId, LinkError, LinkTarget, OdxLinkDatabase, OdxLinkDatabaseBuilder, OdxLinkId, OdxLinkRef,
    StructureId, TableId, TableRowId,
};
use crate::odxtypes::{DataType, PhysicalValue};

/// A keyed lookup table. Each row pairs a key with the structure or DOP
/// used for the data that follows a table key in a message.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub odx_id: OdxLinkId,
    pub short_name: String,
    pub long_name: Option<String>,
    pub semantic: Option<String>,
    pub key_label: Option<String>,
    pub struct_label: Option<String>,
    pub key_dop_ref: Option<OdxLinkRef>,
    pub rows: Vec<TableRow>,
    key_dop: Option<DopId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub odx_id: OdxLinkId,
    pub short_name: String,
    pub long_name: Option<String>,
    pub semantic: Option<String>,
    pub key: PhysicalValue,
    pub structure_ref: Option<OdxLinkRef>,
    pub dop_ref: Option<OdxLinkRef>,
    structure: Option<StructureId>,
    dop: Option<DopId>,
}

/// Result of looking up the rows exhibiting a key.
#[derive(Debug)]
pub enum RowMatch<'t> {
    None,
    Unique(&'t TableRow),
    Ambiguous(Vec<&'t TableRow>),
}

impl Table {
    pub fn new(odx_id: OdxLinkId, short_name: impl Into<String>) -> Self {
        Self {
            odx_id,
            short_name: short_name.into(),
            long_name: None,
            semantic: None,
            key_label: None,
            struct_label: None,
            key_dop_ref: None,
            rows: Vec::new(),
            key_dop: None,
        }
    }

    #[must_use]
    pub fn with_key_dop(mut self, key_dop_ref: OdxLinkRef) -> Self {
        self.key_dop_ref = Some(key_dop_ref);
        self
    }

    #[must_use]
    pub fn with_row(mut self, row: TableRow) -> Self {
        self.rows.push(row);
        self
    }

    pub fn key_dop(&self) -> Option<DopId> {
        self.key_dop
    }

    pub fn rows_with_key<'t, 'k>(
        &'t self,
        key: &'k PhysicalValue,
    ) -> impl Iterator<Item = &'t TableRow> + use<'t, 'k> {
        self.rows.iter().filter(move |row| row.key.key_eq(key))
    }

    pub fn match_key(&self, key: &PhysicalValue) -> RowMatch<'_> {
        let mut rows: Vec<&TableRow> = self.rows.iter().filter(|row| row.key.key_eq(key)).collect();
        match rows.len() {
            0 => RowMatch::None,
            1 => RowMatch::Unique(rows.remove(0)),
            _ => RowMatch::Ambiguous(rows),
        }
    }

    pub fn row_by_short_name(&self, short_name: &str) -> Option<(u32, &TableRow)> {
        self.rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.short_name == short_name)
            .map(|(index, row)| (u32::try_from(index).unwrap_or(u32::MAX), row))
    }

    pub fn row(&self, index: u32) -> Option<&TableRow> {
        self.rows.get(index as usize)
    }

    pub(crate) fn build_odxlinks(
        &self,
        id: TableId,
        builder: &mut OdxLinkDatabaseBuilder,
    ) -> Result<(), LinkError> {
        builder.register(&self.odx_id, LinkTarget::Table(id))?;
        for (index, row) in self.rows.iter().enumerate() {
            let row_id = TableRowId {
                table: id,
                row: u32::try_from(index).unwrap_or(u32::MAX),
            };
            builder.register(&row.odx_id, LinkTarget::TableRow(row_id))?;
        }
        Ok(())
    }

    pub(crate) fn resolve_odxlinks(&mut self, links: &OdxLinkDatabase) -> Result<(), OdxError> {
        let context = format!("table '{}'", self.short_name);
        self.key_dop = links
            .resolve_opt(self.key_dop_ref.as_ref())
            .map_err(OdxError::link(&context))?;
        for row in &mut self.rows {
            let context = format!("table '{}' row '{}'", self.short_name, row.short_name);
            row.structure = links
                .resolve_opt(row.structure_ref.as_ref())
                .map_err(OdxError::link(&context))?;
            row.dop = links
                .resolve_opt(row.dop_ref.as_ref())
                .map_err(OdxError::link(&context))?;
        }
        Ok(())
    }

    /// Re-types textual row keys by the physical type of the key DOP.
    pub(crate) fn retype_keys(&mut self, key_dop: &DataObjectProperty) -> Result<(), OdxError> {
        let data_type: DataType = key_dop.physical_type;
        for row in &mut self.rows {
            if let PhysicalValue::Text(text) = &row.key
                && !data_type.is_string()
            {
                row.key = data_type.parse_value(text)?;
            }
        }
        Ok(())
    }
}

impl TableRow {
    pub fn new(odx_id: OdxLinkId, short_name: impl Into<String>, key: impl Into<PhysicalValue>) -> Self {
        Self {
            odx_id,
            short_name: short_name.into(),
            long_name: None,
            semantic: None,
            key: key.into(),
            structure_ref: None,
            dop_ref: None,
            structure: None,
            dop: None,
        }
    }

    #[must_use]
    pub fn with_structure(mut self, structure_ref: OdxLinkRef) -> Self {
        self.structure_ref = Some(structure_ref);
        self
    }

    #[must_use]
    pub fn with_dop(mut self, dop_ref: OdxLinkRef) -> Self {
        self.dop_ref = Some(dop_ref);
        self
    }

    pub fn structure(&self) -> Option<StructureId> {
        self.structure
    }

    pub fn dop(&self) -> Option<DopId> {
        self.dop
    }
}

/// Short names of `rows`, for diagnostics.
pub(crate) fn row_names(rows: &[&TableRow]) -> String {
    rows.iter()
        .map(|row| row.short_name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::odxlink::DocFragment;
    use pretty_assertions::assert_eq;

    fn id(name: &str) -> OdxLinkId {
        OdxLinkId::new(name, DocFragment::container("Doc"))
    }

    #[test]
    fn test_match_key_outcomes() {
        let table = Table::new(id("T"), "T")
            .with_row(TableRow::new(id("R1"), "r1", 1))
            .with_row(TableRow::new(id("R2"), "r2", 2))
            .with_row(TableRow::new(id("R3"), "r3", 2));
        assert!(matches!(table.match_key(&PhysicalValue::Integer(1)), RowMatch::Unique(r) if r.short_name == "r1"));
        assert!(matches!(table.match_key(&PhysicalValue::Integer(2)), RowMatch::Ambiguous(rows) if rows.len() == 2));
        assert!(matches!(table.match_key(&PhysicalValue::Integer(9)), RowMatch::None));
    }

    #[test]
    fn test_matched_rows_outlive_key() {
        let table = Table::new(id("T"), "T")
            .with_row(TableRow::new(id("R1"), "r1", 1))
            .with_row(TableRow::new(id("R2"), "r2", 2.0))
            .with_row(TableRow::new(id("R3"), "r3", 2));
        let matched = {
            let key = PhysicalValue::Integer(2);
            table.match_key(&key)
        };
        let RowMatch::Ambiguous(rows) = matched else {
            panic!("expected two rows for key 2");
        };
        assert_eq!(row_names(&rows), "r2, r3");

        let names: Vec<&str> = {
            let key = PhysicalValue::Float(1.0);
            table
                .rows_with_key(&key)
                .map(|row| row.short_name.as_str())
                .collect()
        };
        assert_eq!(names, vec!["r1"]);
    }

    #[test]
    fn test_retype_textual_keys() {
        let dop = DataObjectProperty::identical_uint(id("D"), "d", 8);
        let mut table = Table::new(id("T"), "T").with_row(TableRow::new(id("R1"), "r1", "0x10"));
        table.retype_keys(&dop).unwrap();
        assert_eq!(table.rows[0].key, PhysicalValue::Integer(16));
    }
}
