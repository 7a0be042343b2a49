//! ODX reference resolution and table-driven PDU encoding.
//!
//! A model is described as a list of [`DiagLayer`]s and linked into an
//! immutable [`Database`] by [`Database::load`]. Messages are then encoded
//! and decoded through [`LayerRef`]s obtained from the database.

pub mod compu_method;
pub mod database;
pub mod decode_state;
pub mod diag_coded_type;
pub mod diag_layer;
pub mod dop;
pub mod encode_state;
pub mod error;
pub mod odxlink;
pub mod odxtypes;
pub mod parameters;
pub mod snref;
pub mod structure;
pub mod table;
pub mod validate;

pub use compu_method::{CompuMethod, LinearCompuMethod};
pub use database::{Database, LayerRef};
pub use decode_state::DecodeState;
pub use diag_coded_type::DiagCodedType;
pub use diag_layer::{DiagLayer, DiagLayerType, ParentRef};
pub use dop::{DataObjectProperty, DopBase};
pub use encode_state::EncodeState;
pub use error::{DecodeError, EncodeError, OdxError};
pub use odxlink::{DocFragment, OdxLinkDatabase, OdxLinkDatabaseBuilder, OdxLinkId, OdxLinkRef};
pub use odxtypes::{DataType, ParameterValues, PhysicalValue};
pub use parameters::{Parameter, ParameterKind, TableKeyLinkage};
pub use structure::{Structure, StructureKind};
pub use table::{Table, TableRow};
pub use validate::{ValidationError, validate_database};
