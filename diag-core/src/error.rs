use thiserror::Error;

use crate::odxlink::LinkError;
use crate::odxtypes::{DataType, PhysicalValue};

/// Errors raised while constructing, loading and linking a model.
#[derive(Debug, Error)]
pub enum OdxError {
    #[error("table key parameter '{param}' references neither a table nor a table row")]
    MissingTableLinkage { param: String },

    #[error("table struct parameter '{param}' does not reference a table key")]
    MissingTableKeyLinkage { param: String },

    #[error("{context}: {source}")]
    Link {
        context: String,
        #[source]
        source: LinkError,
    },

    #[error("layer '{layer}' has no {kind} named '{name}'")]
    UnknownShortName {
        kind: &'static str,
        name: String,
        layer: String,
    },

    #[error("table key parameter '{param}' names table row '{row}' without a table")]
    TableRowWithoutTable { param: String, row: String },

    #[error("table key parameter '{param}': row '{row}' is not part of table '{table}'")]
    RowOutsideTable {
        param: String,
        row: String,
        table: String,
    },

    #[error("parameter '{param}' has bit position {bit_position}, expected 0 to 7")]
    InvalidBitPosition { param: String, bit_position: u32 },

    #[error("table struct parameter '{param}' uses '{key}', which is not a table key parameter")]
    NotATableKey { param: String, key: String },

    #[error("invalid {data_type} value '{value}': {reason}")]
    InvalidValue {
        value: String,
        data_type: DataType,
        reason: String,
    },
}

impl OdxError {
    /// Wraps a link failure with the object that holds the reference.
    pub(crate) fn link(context: impl Into<String>) -> impl FnOnce(LinkError) -> Self {
        let context = context.into();
        move |source| Self::Link { context, source }
    }
}

/// Errors raised while encoding a message.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("no value given for required parameter '{param}'")]
    MissingValue { param: String },

    #[error("parameter '{param}': expected a {expected} value, got {found}")]
    InvalidValueType {
        param: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("table key '{param}': no matching table row for key {key} in table '{table}'")]
    NoMatchingTableRow {
        param: String,
        table: String,
        key: PhysicalValue,
    },

    #[error("table key '{param}': ambiguous table row for key {key} in table '{table}' ({rows})")]
    AmbiguousTableRow {
        param: String,
        table: String,
        key: PhysicalValue,
        rows: String,
    },

    #[error("table '{table}' used by table key '{param}' has no key DOP")]
    MissingKeyDop { param: String, table: String },

    #[error("parameter '{param}' depends on table key '{key}', which has not been processed yet")]
    MissingTableKeyBinding { param: String, key: String },

    #[error("parameter '{param}' has not been resolved against a loaded model")]
    Unresolved { param: String },

    #[error("coded constant '{param}' is fixed to {expected}, got {found}")]
    CodedConstMismatch {
        param: String,
        expected: PhysicalValue,
        found: PhysicalValue,
    },

    #[error("parameter '{param}' requires the triggering request")]
    MissingTriggeringRequest { param: String },

    #[error("parameter '{param}': triggering request has {len} bytes, {needed} required")]
    RequestTooShort {
        param: String,
        len: usize,
        needed: usize,
    },

    #[error("value {value} does not fit into {bit_length} bits of {data_type}")]
    ValueOutOfRange {
        value: PhysicalValue,
        data_type: DataType,
        bit_length: u32,
    },

    #[error("value {value} cannot be represented as {data_type}")]
    IncompatibleValue {
        value: PhysicalValue,
        data_type: DataType,
    },

    #[error("structure '{structure}' exceeds its byte size of {byte_size} ({actual} bytes)")]
    ByteSizeExceeded {
        structure: String,
        byte_size: usize,
        actual: usize,
    },

    #[error("{bit_length} bits at bit position {bit_position} exceed the packable width")]
    BitRangeTooWide { bit_length: u32, bit_position: u32 },

    #[error("unsupported encoding: {0}")]
    Unsupported(String),

    #[error("layer '{layer}' has no message named '{name}'")]
    UnknownMessage { layer: String, name: String },
}

/// Errors raised while decoding a message.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unexpected end of PDU: {needed} bytes required at position {position}, {available} available")]
    UnexpectedEndOfPdu {
        needed: usize,
        position: usize,
        available: usize,
    },

    #[error("table key '{param}': no matching table row for key {key} in table '{table}'")]
    NoMatchingTableRow {
        param: String,
        table: String,
        key: PhysicalValue,
    },

    #[error("table key '{param}': ambiguous table row for key {key} in table '{table}' ({rows})")]
    AmbiguousTableRow {
        param: String,
        table: String,
        key: PhysicalValue,
        rows: String,
    },

    #[error("table '{table}' used by table key '{param}' has no key DOP")]
    MissingKeyDop { param: String, table: String },

    #[error("parameter '{param}' depends on table key '{key}', which has not been processed yet")]
    MissingTableKeyBinding { param: String, key: String },

    #[error("parameter '{param}' has not been resolved against a loaded model")]
    Unresolved { param: String },

    #[error("coded constant '{param}' expected {expected}, found {found}")]
    CodedConstMismatch {
        param: String,
        expected: PhysicalValue,
        found: PhysicalValue,
    },

    #[error("{bit_length} bits at bit position {bit_position} exceed the packable width")]
    BitRangeTooWide { bit_length: u32, bit_position: u32 },

    #[error("cannot decode {data_type}: {reason}")]
    InvalidCodedValue { data_type: DataType, reason: String },

    #[error("layer '{layer}' has no message named '{name}'")]
    UnknownMessage { layer: String, name: String },
}
