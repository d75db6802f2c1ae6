//! Migration generator
//!
//! Turns a pair of whole-schema maps into the `up` and `down` bodies of a
//! migration script.

use crate::error::{Error, Result};
use crate::schema::diff::{diff_tables, Direction};
use crate::schema::filter::TableFilter;
use crate::schema::order::sort_by_references;
use crate::schema::types::TableMap;
use crate::schema::validation::validate_engines;

/// Statement switching referential checks off for the down body
pub const DISABLE_FOREIGN_KEY_CHECKS: &str = "SET foreign_key_checks = 0;";
/// Statement switching referential checks back on after the down body
pub const ENABLE_FOREIGN_KEY_CHECKS: &str = "SET foreign_key_checks = 1;";

const CALL_SEPARATOR: &str = "\n        ";
const EMPTY_BODY: &str = "-- this section is auto-generated, please modify it to your needs";

/// Rendered bodies of a migration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationBody {
    pub up: String,
    pub down: String,
}

/// Migration SQL generator
#[derive(Debug, Clone, Default)]
pub struct MigrationGenerator {
    filter: TableFilter,
    force: bool,
}

impl MigrationGenerator {
    /// Create a new migration generator
    pub fn new(filter: TableFilter, force: bool) -> Self {
        Self { filter, force }
    }

    /// Bodies for a hand-written migration
    pub fn make_empty_migration(&self) -> MigrationBody {
        MigrationBody {
            up: EMPTY_BODY.to_string(),
            down: EMPTY_BODY.to_string(),
        }
    }

    /// Diff model definitions against the database.
    ///
    /// Returns `Ok(None)` when the database already matches the definitions.
    /// Both bodies are computed from the same pair of maps.
    pub fn make_diff_migration(
        &self,
        definitions: &TableMap,
        database: &TableMap,
    ) -> Result<Option<MigrationBody>> {
        let definitions = self.filter.apply(definitions);
        let database = self.filter.apply(database);

        if self.force {
            tracing::warn!("Force mode: skipping migration validations");
        } else {
            validate_engines(&definitions, &database)?;
        }

        let definitions = match sort_by_references(&definitions) {
            Ok(sorted) => sorted,
            Err(Error::CyclicReferenceError { tables }) if self.force => {
                tracing::warn!(
                    tables = tables.join(", "),
                    "Cyclic foreign keys, keeping definition order"
                );
                definitions
            }
            Err(e) => return Err(e),
        };

        let up = diff_tables(&definitions, &database, Direction::Up, self.force)?;
        let down = diff_tables(&database, &definitions, Direction::Down, self.force)?;

        if up.is_empty() {
            return Ok(None);
        }

        let down_calls = [
            add_sql_call(DISABLE_FOREIGN_KEY_CHECKS),
            render_calls(&down),
            add_sql_call(ENABLE_FOREIGN_KEY_CHECKS),
        ];

        Ok(Some(MigrationBody {
            up: render_calls(&up),
            down: down_calls.join(CALL_SEPARATOR),
        }))
    }
}

/// Render statements as one `add_sql('...');` call per line
pub fn render_calls(operations: &[String]) -> String {
    operations
        .iter()
        .map(|operation| add_sql_call(operation))
        .collect::<Vec<_>>()
        .join(CALL_SEPARATOR)
}

fn add_sql_call(operation: &str) -> String {
    format!("add_sql('{}');", escape_single_quoted(operation))
}

/// Backslash-escape a statement for a single-quoted string literal
pub fn escape_single_quoted(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' | '\'' | '"' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '\0' => escaped.push_str("\\0"),
            _ => escaped.push(c),
        }
    }
    escaped
}
