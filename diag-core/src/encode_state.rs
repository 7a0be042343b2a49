use std::collections::HashMap;

use crate::database::Database;
use crate::odxtypes::{ParameterValues, PhysicalValue};
use crate::table::TableRow;

/// Mutable state threaded through the parameters of one message while it is
/// being encoded.
#[derive(Debug)]
pub struct EncodeState<'a> {
    model: &'a Database,
    /// Bytes produced so far.
    pub coded_message: Vec<u8>,
    pub cursor_byte_position: usize,
    pub cursor_bit_position: u32,
    /// Start of the structure currently being encoded. Parameter byte
    /// positions are relative to it.
    pub origin_byte_position: usize,
    /// Values of the structure currently being encoded.
    pub parameter_values: &'a ParameterValues,
    pub triggering_request: Option<&'a [u8]>,
    /// Rows selected by table key parameters, keyed by parameter short name.
    pub table_keys: HashMap<String, &'a TableRow>,
}

impl<'a> EncodeState<'a> {
    pub fn new(model: &'a Database, parameter_values: &'a ParameterValues) -> Self {
        Self {
            model,
            coded_message: Vec::new(),
            cursor_byte_position: 0,
            cursor_bit_position: 0,
            origin_byte_position: 0,
            parameter_values,
            triggering_request: None,
            table_keys: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_triggering_request(mut self, request: &'a [u8]) -> Self {
        self.triggering_request = Some(request);
        self
    }

    pub fn model(&self) -> &'a Database {
        self.model
    }

    pub fn physical_value(&self, short_name: &str) -> Option<&'a PhysicalValue> {
        self.parameter_values.get(short_name)
    }

    pub fn bind_table_key(&mut self, short_name: &str, row: &'a TableRow) {
        log::trace!("table key '{short_name}' bound to row '{}'", row.short_name);
        self.table_keys.insert(short_name.to_owned(), row);
    }

    pub fn table_key(&self, short_name: &str) -> Option<&'a TableRow> {
        self.table_keys.get(short_name).copied()
    }

    /// ORs `data` into the message at the cursor, growing it as needed, and
    /// moves the cursor behind the written bytes.
    pub fn emplace_bytes(&mut self, data: &[u8], param_name: &str) {
        let position = self.cursor_byte_position;
        let end = position + data.len();
        if self.coded_message.len() < end {
            self.coded_message.resize(end, 0);
        }
        for (offset, byte) in data.iter().enumerate() {
            let slot = &mut self.coded_message[position + offset];
            if *slot & byte != 0 {
                log::warn!(
                    "parameter '{param_name}' overlaps already encoded bits at byte {}",
                    position + offset
                );
            }
            *slot |= byte;
        }
        self.cursor_byte_position = end;
    }
}
