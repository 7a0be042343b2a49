//! Short-name scopes of diagnostic layers.
//!
//! A layer sees its own objects plus everything inherited from its parents,
//! minus the parents' NOT-INHERITED exclusions. Own objects override
//! inherited ones with the same short name. Short-name references are
//! resolved against the scope of the layer that uses them, so the same
//! inherited structure may resolve to different tables in different layers.

use std::collections::{BTreeMap, HashSet};

use crate::database::LayerData;
use crate::dop::DataObjectProperty;
use crate::error::OdxError;
use crate::odxlink::{DopId, LayerId, StructureId, TableId};
use crate::structure::{Structure, StructureKind};
use crate::table::Table;

/// Short-name dictionaries visible from one diagnostic layer.
#[derive(Debug, Clone, Default)]
pub struct LayerScope {
    pub(crate) dops: BTreeMap<String, DopId>,
    pub(crate) tables: BTreeMap<String, TableId>,
    pub(crate) structures: BTreeMap<String, StructureId>,
    pub(crate) requests: BTreeMap<String, StructureId>,
    pub(crate) responses: BTreeMap<String, StructureId>,
}

impl LayerScope {
    pub fn dop(&self, short_name: &str) -> Option<DopId> {
        self.dops.get(short_name).copied()
    }

    pub fn table(&self, short_name: &str) -> Option<TableId> {
        self.tables.get(short_name).copied()
    }

    pub fn structure(&self, short_name: &str) -> Option<StructureId> {
        self.structures.get(short_name).copied()
    }

    pub fn request(&self, short_name: &str) -> Option<StructureId> {
        self.requests.get(short_name).copied()
    }

    pub fn response(&self, short_name: &str) -> Option<StructureId> {
        self.responses.get(short_name).copied()
    }

    pub fn dops(&self) -> impl Iterator<Item = (&str, DopId)> {
        self.dops.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn tables(&self) -> impl Iterator<Item = (&str, TableId)> {
        self.tables.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn requests(&self) -> impl Iterator<Item = (&str, StructureId)> {
        self.requests.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn responses(&self) -> impl Iterator<Item = (&str, StructureId)> {
        self.responses.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn structures(&self) -> impl Iterator<Item = (&str, StructureId)> {
        self.structures.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// All structure-like entries (structures, requests, responses).
    pub(crate) fn structure_slots_mut(&mut self) -> impl Iterator<Item = &mut StructureId> {
        self.structures
            .values_mut()
            .chain(self.requests.values_mut())
            .chain(self.responses.values_mut())
    }

    fn inherit_from(&mut self, parent: LayerScope, excluded_dops: &[String], excluded_tables: &[String]) {
        for (name, id) in parent.dops {
            if !excluded_dops.contains(&name) {
                self.dops.insert(name, id);
            }
        }
        for (name, id) in parent.tables {
            if !excluded_tables.contains(&name) {
                self.tables.insert(name, id);
            }
        }
        self.structures.extend(parent.structures);
        self.requests.extend(parent.requests);
        self.responses.extend(parent.responses);
    }

    fn add_own(&mut self, layer: &LayerData, arenas: &Arenas<'_>) {
        for &id in &layer.own_dops {
            self.dops
                .insert(arenas.dops[id.index()].short_name.clone(), id);
        }
        for &id in &layer.own_tables {
            self.tables
                .insert(arenas.tables[id.index()].short_name.clone(), id);
        }
        for &id in &layer.own_structures {
            let structure = &arenas.structures[id.index()];
            let map = match structure.kind {
                StructureKind::Structure => &mut self.structures,
                StructureKind::Request => &mut self.requests,
                StructureKind::PositiveResponse | StructureKind::NegativeResponse => {
                    &mut self.responses
                }
            };
            map.insert(structure.short_name.clone(), id);
        }
    }
}

pub(crate) struct Arenas<'m> {
    pub layers: &'m [LayerData],
    pub dops: &'m [DataObjectProperty],
    pub tables: &'m [Table],
    pub structures: &'m [Structure],
}

/// Computes the scope of `layer` from its resolved parents.
pub(crate) fn build_scope(layer: LayerId, arenas: &Arenas<'_>) -> LayerScope {
    let mut path = HashSet::new();
    build_scope_inner(layer, arenas, &mut path)
}

fn build_scope_inner(layer: LayerId, arenas: &Arenas<'_>, path: &mut HashSet<LayerId>) -> LayerScope {
    let data = &arenas.layers[layer.index()];
    let mut scope = LayerScope::default();
    if !path.insert(layer) {
        log::warn!(
            "Circular parent reference detected at layer '{}', stopping inheritance",
            data.short_name
        );
        scope.add_own(data, arenas);
        return scope;
    }
    for parent in &data.parents {
        let parent_scope = build_scope_inner(parent.layer, arenas, path);
        scope.inherit_from(
            parent_scope,
            &parent.not_inherited_dops,
            &parent.not_inherited_tables,
        );
    }
    scope.add_own(data, arenas);
    path.remove(&layer);
    scope
}

/// What a short-name reference may see while being resolved.
pub struct SnRefContext<'m> {
    pub layer_name: &'m str,
    pub scope: &'m LayerScope,
    pub tables: &'m [Table],
}

impl<'m> SnRefContext<'m> {
    pub fn table_id(&self, short_name: &str) -> Result<TableId, OdxError> {
        self.scope
            .table(short_name)
            .ok_or_else(|| self.unknown("table", short_name))
    }

    pub fn table(&self, id: TableId) -> &'m Table {
        &self.tables[id.index()]
    }

    pub fn dop_id(&self, short_name: &str) -> Result<DopId, OdxError> {
        self.scope
            .dop(short_name)
            .ok_or_else(|| self.unknown("data object property", short_name))
    }

    fn unknown(&self, kind: &'static str, name: &str) -> OdxError {
        OdxError::UnknownShortName {
            kind,
            name: name.to_owned(),
            layer: self.layer_name.to_owned(),
        }
    }
}
