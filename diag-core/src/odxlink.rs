//! Object identities, references to them, and the link database that
//! connects the two.
//!
//! Linking is strictly two-phase. Every object first reports the identities
//! it declares to an [`OdxLinkDatabaseBuilder`]. [`OdxLinkDatabaseBuilder::finish`]
//! consumes the builder and yields an [`OdxLinkDatabase`], which only supports
//! lookups. No reference can be resolved before all identities are known.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::hash::{Hash, Hasher};

use thiserror::Error;

/// The document an identity lives in.
///
/// Two fragments are the same document when their names match; the document
/// type is informational only.
#[derive(Debug, Clone, Eq)]
pub struct DocFragment {
    pub doc_name: String,
    pub doc_type: Option<String>,
}

impl DocFragment {
    pub fn new(doc_name: impl Into<String>, doc_type: Option<&str>) -> Self {
        Self {
            doc_name: doc_name.into(),
            doc_type: doc_type.map(str::to_owned),
        }
    }

    /// Fragment of a `DIAG-LAYER-CONTAINER` document.
    pub fn container(doc_name: impl Into<String>) -> Self {
        Self::new(doc_name, Some("CONTAINER"))
    }
}

impl PartialEq for DocFragment {
    fn eq(&self, other: &Self) -> bool {
        self.doc_name == other.doc_name
    }
}

impl Hash for DocFragment {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.doc_name.hash(state);
    }
}

impl fmt::Display for DocFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.doc_name)
    }
}

/// Globally unique identity of a model object: a local ID qualified by the
/// document that declares it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OdxLinkId {
    pub local_id: String,
    pub doc_fragment: DocFragment,
}

impl OdxLinkId {
    pub fn new(local_id: impl Into<String>, doc_fragment: DocFragment) -> Self {
        Self {
            local_id: local_id.into(),
            doc_fragment,
        }
    }
}

impl fmt::Display for OdxLinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.local_id, self.doc_fragment)
    }
}

/// Which document a reference points into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefDoc {
    /// The reference names its target document (`DOCREF`).
    Explicit(DocFragment),
    /// No `DOCREF`; the target is expected in the referencing document but
    /// may live in any loaded document.
    Source(DocFragment),
    /// Constructed programmatically without any document context.
    Unspecified,
}

/// A not-yet-resolved pointer to an [`OdxLinkId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OdxLinkRef {
    pub ref_id: String,
    pub ref_doc: RefDoc,
}

impl OdxLinkRef {
    pub fn new(ref_id: impl Into<String>) -> Self {
        Self {
            ref_id: ref_id.into(),
            ref_doc: RefDoc::Unspecified,
        }
    }

    pub fn in_fragment(ref_id: impl Into<String>, doc_fragment: DocFragment) -> Self {
        Self {
            ref_id: ref_id.into(),
            ref_doc: RefDoc::Explicit(doc_fragment),
        }
    }

    pub fn from_id(id: &OdxLinkId) -> Self {
        Self::in_fragment(id.local_id.clone(), id.doc_fragment.clone())
    }

    /// Builds a reference from the `ID-REF`/`DOCREF`/`DOCTYPE` attributes of
    /// a reference element found in document `source`.
    pub fn from_attributes(
        id_ref: &str,
        docref: Option<&str>,
        doctype: Option<&str>,
        source: &DocFragment,
    ) -> Self {
        let ref_doc = match docref {
            Some(name) => RefDoc::Explicit(DocFragment::new(name, doctype)),
            None => RefDoc::Source(source.clone()),
        };
        Self {
            ref_id: id_ref.to_owned(),
            ref_doc,
        }
    }

    /// Whether this reference designates `id` by an exact document match.
    pub fn matches(&self, id: &OdxLinkId) -> bool {
        if self.ref_id != id.local_id {
            return false;
        }
        match &self.ref_doc {
            RefDoc::Explicit(doc) | RefDoc::Source(doc) => *doc == id.doc_fragment,
            RefDoc::Unspecified => true,
        }
    }
}

impl fmt::Display for OdxLinkRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ref_doc {
            RefDoc::Explicit(doc) | RefDoc::Source(doc) => write!(f, "{}@{}", self.ref_id, doc),
            RefDoc::Unspecified => f.write_str(&self.ref_id),
        }
    }
}

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }

            pub(crate) fn from_index(index: usize) -> Self {
                Self(u32::try_from(index).unwrap_or(u32::MAX))
            }
        }
    };
}

arena_id!(
    /// Handle of a diagnostic layer inside a [`crate::Database`].
    LayerId
);
arena_id!(
    /// Handle of a data object property.
    DopId
);
arena_id!(
    /// Handle of a table.
    TableId
);
arena_id!(
    /// Handle of a structure, request or response.
    StructureId
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableRowId {
    pub table: TableId,
    pub row: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamId {
    pub structure: StructureId,
    pub index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    DiagLayer,
    Dop,
    Table,
    TableRow,
    Structure,
    Parameter,
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DiagLayer => "diagnostic layer",
            Self::Dop => "data object property",
            Self::Table => "table",
            Self::TableRow => "table row",
            Self::Structure => "structure",
            Self::Parameter => "parameter",
        };
        f.write_str(name)
    }
}

/// The object an identity was registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTarget {
    DiagLayer(LayerId),
    Dop(DopId),
    Table(TableId),
    TableRow(TableRowId),
    Structure(StructureId),
    Parameter(ParamId),
}

impl LinkTarget {
    pub fn kind(&self) -> LinkKind {
        match self {
            Self::DiagLayer(_) => LinkKind::DiagLayer,
            Self::Dop(_) => LinkKind::Dop,
            Self::Table(_) => LinkKind::Table,
            Self::TableRow(_) => LinkKind::TableRow,
            Self::Structure(_) => LinkKind::Structure,
            Self::Parameter(_) => LinkKind::Parameter,
        }
    }
}

/// Handles that can be obtained by resolving a reference.
pub trait FromLinkTarget: Sized + Copy {
    const KIND: LinkKind;

    fn from_target(target: LinkTarget) -> Option<Self>;
}

impl FromLinkTarget for LayerId {
    const KIND: LinkKind = LinkKind::DiagLayer;

    fn from_target(target: LinkTarget) -> Option<Self> {
        match target {
            LinkTarget::DiagLayer(id) => Some(id),
            _ => None,
        }
    }
}

impl FromLinkTarget for DopId {
    const KIND: LinkKind = LinkKind::Dop;

    fn from_target(target: LinkTarget) -> Option<Self> {
        match target {
            LinkTarget::Dop(id) => Some(id),
            _ => None,
        }
    }
}

impl FromLinkTarget for TableId {
    const KIND: LinkKind = LinkKind::Table;

    fn from_target(target: LinkTarget) -> Option<Self> {
        match target {
            LinkTarget::Table(id) => Some(id),
            _ => None,
        }
    }
}

impl FromLinkTarget for TableRowId {
    const KIND: LinkKind = LinkKind::TableRow;

    fn from_target(target: LinkTarget) -> Option<Self> {
        match target {
            LinkTarget::TableRow(id) => Some(id),
            _ => None,
        }
    }
}

impl FromLinkTarget for StructureId {
    const KIND: LinkKind = LinkKind::Structure;

    fn from_target(target: LinkTarget) -> Option<Self> {
        match target {
            LinkTarget::Structure(id) => Some(id),
            _ => None,
        }
    }
}

impl FromLinkTarget for ParamId {
    const KIND: LinkKind = LinkKind::Parameter;

    fn from_target(target: LinkTarget) -> Option<Self> {
        match target {
            LinkTarget::Parameter(id) => Some(id),
            _ => None,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LinkError {
    #[error("duplicate identity '{id}': declared by a {first} and by a {second}")]
    DuplicateId {
        id: OdxLinkId,
        first: LinkKind,
        second: LinkKind,
    },
    #[error("reference '{reference}' does not match any registered identity")]
    NotFound { reference: OdxLinkRef },
    #[error("reference '{reference}' designates a {found}, expected a {expected}")]
    TypeMismatch {
        reference: OdxLinkRef,
        expected: LinkKind,
        found: LinkKind,
    },
    #[error("reference '{reference}' is ambiguous, candidates in documents {candidates:?}")]
    Ambiguous {
        reference: OdxLinkRef,
        candidates: Vec<String>,
    },
}

/// Registry filled during the identity pass.
#[derive(Debug, Default)]
pub struct OdxLinkDatabaseBuilder {
    entries: HashMap<OdxLinkId, LinkTarget>,
}

impl OdxLinkDatabaseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: &OdxLinkId, target: LinkTarget) -> Result<(), LinkError> {
        match self.entries.entry(id.clone()) {
            Entry::Occupied(existing) => Err(LinkError::DuplicateId {
                id: id.clone(),
                first: existing.get().kind(),
                second: target.kind(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(target);
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Closes the identity pass.
    pub fn finish(self) -> OdxLinkDatabase {
        let mut by_local_id: HashMap<String, Vec<OdxLinkId>> = HashMap::new();
        for id in self.entries.keys() {
            by_local_id
                .entry(id.local_id.clone())
                .or_default()
                .push(id.clone());
        }
        for ids in by_local_id.values_mut() {
            ids.sort_by(|a, b| a.doc_fragment.doc_name.cmp(&b.doc_fragment.doc_name));
        }
        OdxLinkDatabase {
            entries: self.entries,
            by_local_id,
        }
    }
}

/// Frozen identity registry. Only supports lookups.
#[derive(Debug, Default)]
pub struct OdxLinkDatabase {
    entries: HashMap<OdxLinkId, LinkTarget>,
    by_local_id: HashMap<String, Vec<OdxLinkId>>,
}

impl OdxLinkDatabase {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &OdxLinkId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &OdxLinkId) -> Option<LinkTarget> {
        self.entries.get(id).copied()
    }

    /// Looks up the target of `reference` without checking its kind.
    ///
    /// An explicit document is searched exclusively. A reference without
    /// `DOCREF` first tries its source document, then falls back to every
    /// loaded document, which must yield a unique match.
    pub fn resolve_target(&self, reference: &OdxLinkRef) -> Result<LinkTarget, LinkError> {
        match &reference.ref_doc {
            RefDoc::Explicit(doc) => {
                self.lookup(&reference.ref_id, doc)
                    .ok_or_else(|| LinkError::NotFound {
                        reference: reference.clone(),
                    })
            }
            RefDoc::Source(doc) => match self.lookup(&reference.ref_id, doc) {
                Some(target) => Ok(target),
                None => {
                    let target = self.search_all_documents(reference)?;
                    log::debug!(
                        "reference '{reference}' resolved outside its source document"
                    );
                    Ok(target)
                }
            },
            RefDoc::Unspecified => self.search_all_documents(reference),
        }
    }

    /// Resolves `reference` to a typed handle.
    pub fn resolve<T: FromLinkTarget>(&self, reference: &OdxLinkRef) -> Result<T, LinkError> {
        let target = self.resolve_target(reference)?;
        T::from_target(target).ok_or_else(|| LinkError::TypeMismatch {
            reference: reference.clone(),
            expected: T::KIND,
            found: target.kind(),
        })
    }

    pub fn resolve_opt<T: FromLinkTarget>(
        &self,
        reference: Option<&OdxLinkRef>,
    ) -> Result<Option<T>, LinkError> {
        reference.map(|r| self.resolve(r)).transpose()
    }

    fn lookup(&self, local_id: &str, doc: &DocFragment) -> Option<LinkTarget> {
        self.entries
            .get(&OdxLinkId::new(local_id, doc.clone()))
            .copied()
    }

    fn search_all_documents(&self, reference: &OdxLinkRef) -> Result<LinkTarget, LinkError> {
        let candidates = self
            .by_local_id
            .get(&reference.ref_id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let not_found = || LinkError::NotFound {
            reference: reference.clone(),
        };
        match candidates {
            [] => Err(not_found()),
            [only] => self.entries.get(only).copied().ok_or_else(not_found),
            many => Err(LinkError::Ambiguous {
                reference: reference.clone(),
                candidates: many
                    .iter()
                    .map(|id| id.doc_fragment.doc_name.clone())
                    .collect(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_equality_ignores_doc_type() {
        let a = DocFragment::new("Doc", Some("CONTAINER"));
        let b = DocFragment::new("Doc", Some("LAYER"));
        assert_eq!(a, b);
        assert_eq!(
            OdxLinkId::new("X", a),
            OdxLinkId::new("X", b),
        );
    }

    #[test]
    fn test_reference_without_docref_points_at_source() {
        let source = DocFragment::container("Source");
        let r = OdxLinkRef::from_attributes("T1", None, None, &source);
        assert_eq!(r.ref_doc, RefDoc::Source(source.clone()));
        assert!(r.matches(&OdxLinkId::new("T1", source)));
    }
}
