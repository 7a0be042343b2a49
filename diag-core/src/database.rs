//! The loaded, fully linked model.
//!
//! [`Database::load`] runs the linking passes in a fixed order:
//!
//! 1. Flatten: every object of every layer gets a handle in the arenas.
//! 2. Identity pass: all `OdxLinkId`s are registered.
//! 3. Reference pass: every `OdxLinkRef` is resolved; table row keys are
//!    re-typed by their table's key DOP.
//! 4. Scopes: the short-name dictionaries of each layer are computed.
//! 5. Short-name pass: short-name references are resolved per layer.
//!    Inherited structures that use short-name references are copied into
//!    the inheriting layer first, so each layer resolves against its own
//!    scope.
//!
//! The database is immutable afterwards.

use std::collections::HashMap;

use crate::diag_layer::{DiagLayer, DiagLayerType, ParentRef};
use crate::dop::DataObjectProperty;
use crate::error::{DecodeError, EncodeError, OdxError};
use crate::odxlink::{
    DopId, FromLinkTarget, LayerId, LinkError, LinkTarget, OdxLinkDatabase,
    OdxLinkDatabaseBuilder, OdxLinkId, OdxLinkRef, ParamId, StructureId, TableId, TableRowId,
};
use crate::odxtypes::ParameterValues;
use crate::parameters::Parameter;
use crate::snref::{Arenas, LayerScope, SnRefContext, build_scope};
use crate::structure::Structure;
use crate::table::{Table, TableRow};

#[derive(Debug)]
pub(crate) struct LayerData {
    pub odx_id: OdxLinkId,
    pub short_name: String,
    pub long_name: Option<String>,
    pub layer_type: DiagLayerType,
    pub parent_refs: Vec<ParentRef>,
    pub parents: Vec<ResolvedParent>,
    pub own_dops: Vec<DopId>,
    pub own_tables: Vec<TableId>,
    pub own_structures: Vec<StructureId>,
    pub scope: LayerScope,
}

#[derive(Debug)]
pub(crate) struct ResolvedParent {
    pub layer: LayerId,
    pub not_inherited_dops: Vec<String>,
    pub not_inherited_tables: Vec<String>,
}

#[derive(Debug, Default)]
pub struct Database {
    layers: Vec<LayerData>,
    dops: Vec<DataObjectProperty>,
    tables: Vec<Table>,
    structures: Vec<Structure>,
    structure_owner: Vec<LayerId>,
    odxlinks: OdxLinkDatabase,
}

impl Database {
    /// Links the given layers into a database.
    pub fn load(layers: Vec<DiagLayer>) -> Result<Self, OdxError> {
        let mut db = Self::flatten(layers);
        let odxlinks = db.build_odxlinks()?;
        db.resolve_odxlinks(&odxlinks)?;
        db.odxlinks = odxlinks;
        db.build_scopes();
        db.resolve_snrefs()?;
        log::info!(
            "Loaded {} layers: {} DOPs, {} tables, {} structures, {} identities",
            db.layers.len(),
            db.dops.len(),
            db.tables.len(),
            db.structures.len(),
            db.odxlinks.len()
        );
        Ok(db)
    }

    fn flatten(layers: Vec<DiagLayer>) -> Self {
        let mut db = Self::default();
        for layer in layers {
            let layer_id = LayerId::from_index(db.layers.len());
            let mut data = LayerData {
                odx_id: layer.odx_id,
                short_name: layer.short_name,
                long_name: layer.long_name,
                layer_type: layer.layer_type,
                parent_refs: layer.parent_refs,
                parents: Vec::new(),
                own_dops: Vec::new(),
                own_tables: Vec::new(),
                own_structures: Vec::new(),
                scope: LayerScope::default(),
            };
            for dop in layer.data_object_props {
                data.own_dops.push(DopId::from_index(db.dops.len()));
                db.dops.push(dop);
            }
            for table in layer.tables {
                data.own_tables.push(TableId::from_index(db.tables.len()));
                db.tables.push(table);
            }
            for structure in layer.structures {
                data.own_structures
                    .push(StructureId::from_index(db.structures.len()));
                db.structures.push(structure);
                db.structure_owner.push(layer_id);
            }
            db.layers.push(data);
        }
        db
    }

    fn build_odxlinks(&self) -> Result<OdxLinkDatabase, OdxError> {
        let mut builder = OdxLinkDatabaseBuilder::new();
        for (index, layer) in self.layers.iter().enumerate() {
            builder
                .register(&layer.odx_id, LinkTarget::DiagLayer(LayerId::from_index(index)))
                .map_err(OdxError::link(format!("layer '{}'", layer.short_name)))?;
        }
        for (index, dop) in self.dops.iter().enumerate() {
            builder
                .register(&dop.odx_id, LinkTarget::Dop(DopId::from_index(index)))
                .map_err(OdxError::link(format!("DOP '{}'", dop.short_name)))?;
        }
        for (index, table) in self.tables.iter().enumerate() {
            table
                .build_odxlinks(TableId::from_index(index), &mut builder)
                .map_err(OdxError::link(format!("table '{}'", table.short_name)))?;
        }
        for (index, structure) in self.structures.iter().enumerate() {
            structure
                .build_odxlinks(StructureId::from_index(index), &mut builder)
                .map_err(OdxError::link(format!("'{}'", structure.short_name)))?;
        }
        log::debug!("Registered {} identities", builder.len());
        Ok(builder.finish())
    }

    fn resolve_odxlinks(&mut self, links: &OdxLinkDatabase) -> Result<(), OdxError> {
        for layer in &mut self.layers {
            let mut parents = Vec::with_capacity(layer.parent_refs.len());
            for parent_ref in &layer.parent_refs {
                let parent: LayerId = links
                    .resolve(&parent_ref.layer_ref)
                    .map_err(OdxError::link(format!("parent of layer '{}'", layer.short_name)))?;
                parents.push(ResolvedParent {
                    layer: parent,
                    not_inherited_dops: parent_ref.not_inherited_dops.clone(),
                    not_inherited_tables: parent_ref.not_inherited_tables.clone(),
                });
            }
            layer.parents = parents;
        }
        for table in &mut self.tables {
            table.resolve_odxlinks(links)?;
            if let Some(key_dop) = table.key_dop() {
                table.retype_keys(&self.dops[key_dop.index()])?;
            }
        }
        for structure in &mut self.structures {
            structure.resolve_odxlinks(links)?;
        }
        Ok(())
    }

    fn build_scopes(&mut self) {
        let arenas = Arenas {
            layers: &self.layers,
            dops: &self.dops,
            tables: &self.tables,
            structures: &self.structures,
        };
        let scopes: Vec<LayerScope> = (0..self.layers.len())
            .map(|index| build_scope(LayerId::from_index(index), &arenas))
            .collect();
        for (layer, scope) in self.layers.iter_mut().zip(scopes) {
            layer.scope = scope;
        }
    }

    fn resolve_snrefs(&mut self) -> Result<(), OdxError> {
        for index in 0..self.layers.len() {
            let layer_id = LayerId::from_index(index);
            let mut to_resolve = self.layers[index].own_structures.clone();
            let mut copies: HashMap<StructureId, StructureId> = HashMap::new();
            for slot in self.layers[index].scope.structure_slots_mut() {
                let original = *slot;
                if self.structure_owner[original.index()] == layer_id
                    || !self.structures[original.index()].has_short_name_refs()
                {
                    continue;
                }
                let copy = match copies.get(&original) {
                    Some(copy) => *copy,
                    None => {
                        let copy = StructureId::from_index(self.structures.len());
                        let structure = self.structures[original.index()].clone();
                        self.structures.push(structure);
                        self.structure_owner.push(layer_id);
                        copies.insert(original, copy);
                        to_resolve.push(copy);
                        copy
                    }
                };
                *slot = copy;
            }
            if !copies.is_empty() {
                log::debug!(
                    "Layer '{}': {} inherited structures re-resolved in its own scope",
                    self.layers[index].short_name,
                    copies.len()
                );
            }

            let layer = &self.layers[index];
            let ctx = SnRefContext {
                layer_name: &layer.short_name,
                scope: &layer.scope,
                tables: &self.tables,
            };
            for id in to_resolve {
                self.structures[id.index()].resolve_snrefs(id, &ctx)?;
            }
        }
        Ok(())
    }

    pub fn layers(&self) -> impl Iterator<Item = LayerRef<'_>> {
        (0..self.layers.len()).map(|index| LayerRef {
            db: self,
            id: LayerId::from_index(index),
        })
    }

    pub fn layer(&self, short_name: &str) -> Option<LayerRef<'_>> {
        self.layers().find(|layer| layer.short_name() == short_name)
    }

    pub fn layer_by_id(&self, id: LayerId) -> LayerRef<'_> {
        LayerRef { db: self, id }
    }

    /// Handles are only produced by this database, so the lookups below
    /// cannot miss.
    pub fn dop(&self, id: DopId) -> &DataObjectProperty {
        &self.dops[id.index()]
    }

    pub fn table(&self, id: TableId) -> &Table {
        &self.tables[id.index()]
    }

    pub fn table_row(&self, id: TableRowId) -> &TableRow {
        &self.tables[id.table.index()].rows[id.row as usize]
    }

    pub fn structure(&self, id: StructureId) -> &Structure {
        &self.structures[id.index()]
    }

    pub fn parameter(&self, id: ParamId) -> &Parameter {
        &self.structures[id.structure.index()].parameters[id.index as usize]
    }

    pub fn dops(&self) -> &[DataObjectProperty] {
        &self.dops
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// All structures together with the layer they are resolved in.
    pub fn structures(&self) -> impl Iterator<Item = (LayerRef<'_>, &Structure)> {
        self.structures
            .iter()
            .zip(&self.structure_owner)
            .map(|(structure, owner)| (self.layer_by_id(*owner), structure))
    }

    pub fn odxlinks(&self) -> &OdxLinkDatabase {
        &self.odxlinks
    }

    pub fn resolve<T: FromLinkTarget>(&self, reference: &OdxLinkRef) -> Result<T, LinkError> {
        self.odxlinks.resolve(reference)
    }
}

/// A diagnostic layer of a loaded [`Database`].
#[derive(Debug, Clone, Copy)]
pub struct LayerRef<'m> {
    db: &'m Database,
    id: LayerId,
}

impl<'m> LayerRef<'m> {
    fn data(&self) -> &'m LayerData {
        &self.db.layers[self.id.index()]
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn short_name(&self) -> &'m str {
        &self.data().short_name
    }

    pub fn long_name(&self) -> Option<&'m str> {
        self.data().long_name.as_deref()
    }

    pub fn layer_type(&self) -> DiagLayerType {
        self.data().layer_type
    }

    pub fn odx_id(&self) -> &'m OdxLinkId {
        &self.data().odx_id
    }

    pub fn scope(&self) -> &'m LayerScope {
        &self.data().scope
    }

    pub fn parents(&self) -> impl Iterator<Item = LayerRef<'m>> + use<'m> {
        let db = self.db;
        self.data()
            .parents
            .iter()
            .map(move |parent| db.layer_by_id(parent.layer))
    }

    pub fn dop(&self, short_name: &str) -> Option<&'m DataObjectProperty> {
        self.scope().dop(short_name).map(|id| self.db.dop(id))
    }

    pub fn table(&self, short_name: &str) -> Option<&'m Table> {
        self.scope().table(short_name).map(|id| self.db.table(id))
    }

    pub fn structure(&self, short_name: &str) -> Option<&'m Structure> {
        self.scope()
            .structure(short_name)
            .map(|id| self.db.structure(id))
    }

    pub fn request(&self, short_name: &str) -> Option<&'m Structure> {
        self.scope().request(short_name).map(|id| self.db.structure(id))
    }

    pub fn response(&self, short_name: &str) -> Option<&'m Structure> {
        self.scope()
            .response(short_name)
            .map(|id| self.db.structure(id))
    }

    /// Request, response or structure with the given name, in that order.
    pub fn message(&self, short_name: &str) -> Option<&'m Structure> {
        self.request(short_name)
            .or_else(|| self.response(short_name))
            .or_else(|| self.structure(short_name))
    }

    pub fn encode_request(
        &self,
        short_name: &str,
        values: &ParameterValues,
    ) -> Result<Vec<u8>, EncodeError> {
        self.message(short_name)
            .ok_or_else(|| EncodeError::UnknownMessage {
                layer: self.short_name().to_owned(),
                name: short_name.to_owned(),
            })?
            .encode(self.db, values)
    }

    pub fn encode_response(
        &self,
        short_name: &str,
        values: &ParameterValues,
        request: &[u8],
    ) -> Result<Vec<u8>, EncodeError> {
        self.message(short_name)
            .ok_or_else(|| EncodeError::UnknownMessage {
                layer: self.short_name().to_owned(),
                name: short_name.to_owned(),
            })?
            .encode_response(self.db, values, request)
    }

    pub fn decode(&self, short_name: &str, message: &[u8]) -> Result<ParameterValues, DecodeError> {
        self.message(short_name)
            .ok_or_else(|| DecodeError::UnknownMessage {
                layer: self.short_name().to_owned(),
                name: short_name.to_owned(),
            })?
            .decode(self.db, message)
    }
}
