use std::collections::HashMap;

use crate::database::Database;
use crate::error::DecodeError;
use crate::table::TableRow;

/// Mutable state threaded through the parameters of one message while it is
/// being decoded.
#[derive(Debug)]
pub struct DecodeState<'a> {
    model: &'a Database,
    pub coded_message: &'a [u8],
    pub cursor_byte_position: usize,
    pub cursor_bit_position: u32,
    pub origin_byte_position: usize,
    /// Rows selected by table key parameters, keyed by parameter short name.
    pub table_keys: HashMap<String, &'a TableRow>,
}

impl<'a> DecodeState<'a> {
    pub fn new(model: &'a Database, coded_message: &'a [u8]) -> Self {
        Self {
            model,
            coded_message,
            cursor_byte_position: 0,
            cursor_bit_position: 0,
            origin_byte_position: 0,
            table_keys: HashMap::new(),
        }
    }

    pub fn model(&self) -> &'a Database {
        self.model
    }

    pub fn bind_table_key(&mut self, short_name: &str, row: &'a TableRow) {
        log::trace!("table key '{short_name}' bound to row '{}'", row.short_name);
        self.table_keys.insert(short_name.to_owned(), row);
    }

    pub fn table_key(&self, short_name: &str) -> Option<&'a TableRow> {
        self.table_keys.get(short_name).copied()
    }

    pub fn extract_bytes(&self, position: usize, len: usize) -> Result<&'a [u8], DecodeError> {
        position
            .checked_add(len)
            .and_then(|end| self.coded_message.get(position..end))
            .ok_or(DecodeError::UnexpectedEndOfPdu {
                needed: len,
                position,
                available: self.coded_message.len().saturating_sub(position),
            })
    }

    pub fn remaining(&self) -> usize {
        self.coded_message
            .len()
            .saturating_sub(self.cursor_byte_position)
    }
}
