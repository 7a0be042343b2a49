use std::collections::HashSet;

use thiserror::Error;

use crate::database::Database;
use crate::parameters::ParameterKind;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("rows '{1}' and '{2}' of table '{0}' share the same key")]
    DuplicateTableKey(String, String, String),
    #[error("table struct '{1}' in '{0}' precedes its table key '{2}'")]
    TableStructBeforeKey(String, String, String),
    #[error("table key '{1}' in '{0}' uses table '{2}', which has no key DOP")]
    MissingKeyDop(String, String, String),
    #[error("duplicate parameter name '{1}' in '{0}'")]
    DuplicateParameterName(String, String),
}

/// Validate a loaded database for table consistency.
pub fn validate_database(db: &Database) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for table in db.tables() {
        if table.rows.is_empty() {
            log::warn!("table '{}' has no rows", table.short_name);
        }
        for (i, row) in table.rows.iter().enumerate() {
            if row.structure_ref.is_some() && row.dop_ref.is_some() {
                log::warn!(
                    "row '{}' of table '{}' references both a structure and a DOP, the structure wins",
                    row.short_name,
                    table.short_name
                );
            }
            for other in &table.rows[i + 1..] {
                if row.key.key_eq(&other.key) {
                    errors.push(ValidationError::DuplicateTableKey(
                        table.short_name.clone(),
                        row.short_name.clone(),
                        other.short_name.clone(),
                    ));
                }
            }
        }
    }

    for (layer, structure) in db.structures() {
        let sname = format!("{}.{}", layer.short_name(), structure.short_name);

        let mut names = HashSet::new();
        for param in &structure.parameters {
            if !names.insert(param.short_name.as_str()) {
                errors.push(ValidationError::DuplicateParameterName(
                    sname.clone(),
                    param.short_name.clone(),
                ));
            }
        }

        for (index, param) in structure.parameters.iter().enumerate() {
            match &param.kind {
                ParameterKind::TableKey(key) if key.table_row().is_none() => {
                    if let Some(table) = key.table().map(|id| db.table(id))
                        && table.key_dop().is_none()
                    {
                        errors.push(ValidationError::MissingKeyDop(
                            sname.clone(),
                            param.short_name.clone(),
                            table.short_name.clone(),
                        ));
                    }
                }
                ParameterKind::TableStruct(ts) => {
                    let Some(key_id) = ts.table_key() else {
                        continue;
                    };
                    let key_name = &db.parameter(key_id).short_name;
                    let key_index = structure
                        .parameters
                        .iter()
                        .position(|p| &p.short_name == key_name);
                    if key_index.is_some_and(|k| k > index) {
                        errors.push(ValidationError::TableStructBeforeKey(
                            sname.clone(),
                            param.short_name.clone(),
                            key_name.clone(),
                        ));
                    }
                }
                _ => {}
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
