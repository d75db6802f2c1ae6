//! Pre-flight checks run before any migration statement is produced
//!
//! None of these are evaluated in force mode; callers decide that, the
//! functions here always check.

use crate::error::{Error, Result};
use crate::schema::table::Table;
use crate::schema::types::TableMap;

const NOT_NULL_MARKER: &str = " NOT NULL";
const DEFAULT_MARKER: &str = " DEFAULT ";

/// Every column must have a rendered definition
pub fn validate_columns(table: &Table) -> Result<()> {
    match table.columns().find(|item| item.sql.trim().is_empty()) {
        Some(item) => Err(Error::MissingColumnTypeError {
            table: table.name.clone(),
            column: item.name.clone(),
        }),
        None => Ok(()),
    }
}

/// A table present on both sides must use the same storage engine
pub fn validate_engines(definitions: &TableMap, database: &TableMap) -> Result<()> {
    for (name, table) in definitions {
        if let Some(database_table) = database.get(name) {
            if !database_table.engine.eq_ignore_ascii_case(&table.engine) {
                return Err(Error::EngineMismatchError {
                    table: name.clone(),
                    definition_engine: table.engine.clone(),
                    database_engine: database_table.engine.clone(),
                });
            }
        }
    }

    Ok(())
}

/// Tightening a column to NOT NULL needs a default for the existing rows
pub fn validate_modify_operation(operation: &str) -> Result<()> {
    let upper = operation.to_uppercase();

    if upper.contains(NOT_NULL_MARKER) && !upper.contains(DEFAULT_MARKER) {
        return Err(Error::UnsafeNullabilityChangeError {
            operation: operation.to_string(),
        });
    }

    Ok(())
}
