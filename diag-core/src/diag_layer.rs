use crate::dop::DataObjectProperty;
use crate::odxlink::{OdxLinkId, OdxLinkRef};
use crate::structure::Structure;
use crate::table::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagLayerType {
    Protocol,
    FunctionalGroup,
    BaseVariant,
    EcuVariant,
    EcuSharedData,
}

impl DiagLayerType {
    pub fn as_odx(self) -> &'static str {
        match self {
            Self::Protocol => "PROTOCOL",
            Self::FunctionalGroup => "FUNCTIONAL-GROUP",
            Self::BaseVariant => "BASE-VARIANT",
            Self::EcuVariant => "ECU-VARIANT",
            Self::EcuSharedData => "ECU-SHARED-DATA",
        }
    }
}

/// Inheritance from a parent layer, minus the objects it excludes.
#[derive(Debug, Clone, PartialEq)]
pub struct ParentRef {
    pub layer_ref: OdxLinkRef,
    pub not_inherited_dops: Vec<String>,
    pub not_inherited_tables: Vec<String>,
}

impl ParentRef {
    pub fn new(layer_ref: OdxLinkRef) -> Self {
        Self {
            layer_ref,
            not_inherited_dops: Vec::new(),
            not_inherited_tables: Vec::new(),
        }
    }
}

/// Everything one diagnostic layer declares, as produced by a loader.
/// Requests, responses and structures all live in `structures`,
/// distinguished by their kind.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagLayer {
    pub odx_id: OdxLinkId,
    pub short_name: String,
    pub long_name: Option<String>,
    pub layer_type: DiagLayerType,
    pub parent_refs: Vec<ParentRef>,
    pub data_object_props: Vec<DataObjectProperty>,
    pub tables: Vec<Table>,
    pub structures: Vec<Structure>,
}

impl DiagLayer {
    pub fn new(odx_id: OdxLinkId, short_name: impl Into<String>, layer_type: DiagLayerType) -> Self {
        Self {
            odx_id,
            short_name: short_name.into(),
            long_name: None,
            layer_type,
            parent_refs: Vec::new(),
            data_object_props: Vec::new(),
            tables: Vec::new(),
            structures: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_parent(mut self, parent: ParentRef) -> Self {
        self.parent_refs.push(parent);
        self
    }

    #[must_use]
    pub fn with_dop(mut self, dop: DataObjectProperty) -> Self {
        self.data_object_props.push(dop);
        self
    }

    #[must_use]
    pub fn with_table(mut self, table: Table) -> Self {
        self.tables.push(table);
        self
    }

    #[must_use]
    pub fn with_structure(mut self, structure: Structure) -> Self {
        self.structures.push(structure);
        self
    }
}
