//! ODX and PDX loading into a linked [`diag_core::Database`].

pub mod odx_model;
pub mod parser;
pub mod pdx_reader;

pub use parser::{OdxParseError, parse_odx, parse_odx_documents, read_layers};
pub use pdx_reader::{PdxReadError, read_pdx_file};
