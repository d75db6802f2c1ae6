//! Type definitions for schema snapshot objects

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::schema::table::Table;

/// Whole-schema map: table name to snapshot, in a meaningful order
pub type TableMap = IndexMap<String, Table>;

/// What kind of constraint an item is, fixed when the item is built
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintKind {
    /// Plain or unique index
    Index,
    /// Foreign key pointing at `references`
    ForeignKey { references: String },
    /// Composite primary key
    PrimaryKey,
    /// Anything else (CHECK constraints, vendor extensions, ...)
    Other,
}

/// Whether an item is a column or a constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    Column,
    Constraint(ConstraintKind),
}

/// A column or constraint inside a table snapshot
///
/// Two items with the same `key` in two snapshots are the same item for
/// diffing purposes; whether it changed is decided by comparing `sql`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableItem {
    pub key: String,
    pub name: String,
    pub kind: ItemKind,
    /// Rendered definition. For columns this is the column definition, for
    /// constraints a complete statement that creates the constraint.
    pub sql: String,
}

impl TableItem {
    /// Create a column item keyed by its name
    pub fn column(name: &str, sql: &str) -> Self {
        Self {
            key: name.to_string(),
            name: name.to_string(),
            kind: ItemKind::Column,
            sql: sql.to_string(),
        }
    }

    /// Create an index item
    pub fn index(name: &str, sql: &str) -> Self {
        Self::constraint_item(format!("INDEX {}", name), name, ConstraintKind::Index, sql)
    }

    /// Create a foreign key item referencing `references`
    pub fn foreign_key(name: &str, references: &str, sql: &str) -> Self {
        Self::constraint_item(
            format!("FOREIGN KEY {}", name),
            name,
            ConstraintKind::ForeignKey {
                references: references.to_string(),
            },
            sql,
        )
    }

    /// Create a composite primary key item
    pub fn primary_key(sql: &str) -> Self {
        Self::constraint_item("PRIMARY KEY".to_string(), "PRIMARY", ConstraintKind::PrimaryKey, sql)
    }

    /// Create a constraint item of no known kind
    pub fn constraint(name: &str, sql: &str) -> Self {
        Self::constraint_item(format!("CONSTRAINT {}", name), name, ConstraintKind::Other, sql)
    }

    fn constraint_item(key: String, name: &str, kind: ConstraintKind, sql: &str) -> Self {
        Self {
            key,
            name: name.to_string(),
            kind: ItemKind::Constraint(kind),
            sql: sql.to_string(),
        }
    }

    pub fn is_column(&self) -> bool {
        self.kind == ItemKind::Column
    }

    /// The constraint kind, if this item is a constraint
    pub fn constraint_kind(&self) -> Option<&ConstraintKind> {
        match &self.kind {
            ItemKind::Constraint(kind) => Some(kind),
            ItemKind::Column => None,
        }
    }
}

/// Represents a field definition from a Rust model
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    /// Rust type as written, whitespace removed (`Option<String>`)
    pub rust_type: String,
    pub db_type: Option<String>,
    pub nullable: bool,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub unique: bool,
    pub index: bool,
    pub default: Option<String>,
    pub foreign_key: Option<ForeignKeyDefinition>,
}

/// Represents a foreign key definition from a Rust model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyDefinition {
    pub ref_table: String,
    pub ref_column: String,
    pub on_delete: Option<String>,
    pub on_update: Option<String>,
}

impl ForeignKeyDefinition {
    /// Parse a `table.column` reference
    pub fn parse(reference: &str) -> Option<Self> {
        let (ref_table, ref_column) = reference.split_once('.')?;
        if ref_table.is_empty() || ref_column.is_empty() {
            return None;
        }

        Some(Self {
            ref_table: ref_table.to_string(),
            ref_column: ref_column.to_string(),
            on_delete: None,
            on_update: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_keys_do_not_collide_with_columns() {
        let column = TableItem::column("email", "`email` VARCHAR(255) NOT NULL");
        let index = TableItem::index("email", "ALTER TABLE users ADD INDEX `email` (`email`)");

        assert_ne!(column.key, index.key);
        assert_eq!(index.name, "email");
        assert_eq!(index.constraint_kind(), Some(&ConstraintKind::Index));
        assert!(column.is_column());
        assert!(column.constraint_kind().is_none());
    }

    #[test]
    fn parses_foreign_key_reference() {
        let fk = ForeignKeyDefinition::parse("users.id").expect("valid reference");
        assert_eq!(fk.ref_table, "users");
        assert_eq!(fk.ref_column, "id");

        assert!(ForeignKeyDefinition::parse("users").is_none());
        assert!(ForeignKeyDefinition::parse(".id").is_none());
    }
}
