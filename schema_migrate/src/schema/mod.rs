//! Schema module for schema_migrate
//!
//! This module handles schema snapshots, their comparison, and migration generation.

pub mod analyzer;
pub mod diff;
pub mod filter;
pub mod generator;
pub mod order;
pub mod render;
pub mod table;
pub mod types;
pub mod validation;

// Re-export key types
pub use analyzer::{DatabaseSource, SchemaAnalyzer};
pub use diff::{diff_tables, Direction};
pub use filter::TableFilter;
pub use generator::{MigrationBody, MigrationGenerator};
pub use table::Table;
pub use types::{
    ConstraintKind, FieldDefinition, ForeignKeyDefinition, ItemKind, TableItem, TableMap,
};
