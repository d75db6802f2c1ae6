//! Whole-schema difference calculator
//!
//! Compares two whole-schema maps and produces the ordered list of
//! statements that turns the destination schema into the source schema.

use std::fmt;

use crate::error::Result;
use crate::schema::types::TableMap;
use crate::schema::validation::{validate_columns, validate_modify_operation};

/// Which half of a migration is being computed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Definitions to database
    Up,
    /// Database back to its previous shape
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// Table names split by what has to happen to them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TablePartition {
    pub create: Vec<String>,
    pub drop: Vec<String>,
    pub modify: Vec<String>,
}

impl TablePartition {
    /// Partition table names, each list following its map's iteration order
    pub fn new(source: &TableMap, dest: &TableMap) -> Self {
        Self {
            create: source.keys().filter(|name| !dest.contains_key(*name)).cloned().collect(),
            drop: dest.keys().filter(|name| !source.contains_key(*name)).cloned().collect(),
            modify: source.keys().filter(|name| dest.contains_key(*name)).cloned().collect(),
        }
    }
}

/// Compute the statements turning `dest` into `source`.
///
/// For `Direction::Down` both maps are walked back to front, undoing the
/// creation order of the up migration. Unless `force` is set every source
/// table is checked for untyped columns before anything is produced, and in
/// the up direction every modification must pass the nullability check.
pub fn diff_tables(
    source: &TableMap,
    dest: &TableMap,
    direction: Direction,
    force: bool,
) -> Result<Vec<String>> {
    let (source, dest) = match direction {
        Direction::Up => (source.clone(), dest.clone()),
        Direction::Down => (reversed(source), reversed(dest)),
    };

    let partition = TablePartition::new(&source, &dest);

    if !force {
        for table in source.values() {
            validate_columns(table)?;
        }
    }

    let mut operations = Vec::new();

    for name in &partition.create {
        operations.extend(source[name.as_str()].make_create_operations());
    }

    for name in &partition.drop {
        operations.push(dest[name.as_str()].make_drop_sql());
    }

    for name in &partition.modify {
        let source_table = &source[name.as_str()];
        let dest_table = &dest[name.as_str()];

        let add_operations = source_table.make_add_operations(dest_table);
        let drop_operations = source_table.make_drop_operations(dest_table)?;
        let modify_operations = source_table.make_modify_operations(dest_table)?;

        if direction == Direction::Up && !force {
            for operation in &modify_operations {
                validate_modify_operation(operation)?;
            }
        }

        tracing::debug!(
            table = name.as_str(),
            %direction,
            added = add_operations.len(),
            dropped = drop_operations.len(),
            modified = modify_operations.len(),
            "Table diff computed"
        );

        operations.extend(add_operations);
        operations.extend(drop_operations);
        operations.extend(modify_operations);
    }

    tracing::debug!(
        %direction,
        created = partition.create.len(),
        dropped = partition.drop.len(),
        compared = partition.modify.len(),
        operations = operations.len(),
        "Schema diff computed"
    );

    Ok(operations)
}

fn reversed(tables: &TableMap) -> TableMap {
    tables
        .iter()
        .rev()
        .map(|(name, table)| (name.clone(), table.clone()))
        .collect()
}
