//! Model registry for schema_migrate
//!
//! This module manages the registration of model structs and turns them into
//! table snapshots.

use crate::config::{Config, NamingConfig, SchemaConfig, TypeMappingConfig, DEFAULT_CONNECTION};
use crate::error::{Error, Result};
use crate::schema::render::{self, ColumnSpec, ForeignKeySpec};
use crate::schema::table::Table;
use crate::schema::types::{FieldDefinition, TableMap};
use crate::utils::naming::{get_foreign_key_name, get_index_name, get_table_name};

/// A model whose table is managed by schema_migrate
///
/// Usually implemented with `#[derive(SchemaModel)]`.
pub trait SchemaModel {
    /// Struct name of the model
    fn model_name() -> &'static str;

    /// Explicit table name, derived from the model name when `None`
    fn table_name() -> Option<&'static str> {
        None
    }

    /// Explicit storage engine, the configured default when `None`
    fn engine() -> Option<&'static str> {
        None
    }

    /// Connection the table lives on
    fn connection() -> &'static str {
        DEFAULT_CONNECTION
    }

    /// Get field definitions for this model
    fn field_definitions() -> Vec<FieldDefinition>;
}

/// Source of the definition side of a diff
pub trait DefinitionSource {
    /// Snapshot every table defined for `connection`
    fn snapshots(&self, connection: &str) -> Result<TableMap>;
}

/// Information about a registered model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub name: String,
    pub table_name: Option<String>,
    pub engine: Option<String>,
    pub connection: String,
    pub fields: Vec<FieldDefinition>,
}

impl ModelInfo {
    /// Collect the information a model type exposes
    pub fn of<M: SchemaModel>() -> Self {
        Self {
            name: M::model_name().to_string(),
            table_name: M::table_name().map(str::to_string),
            engine: M::engine().map(str::to_string),
            connection: M::connection().to_string(),
            fields: M::field_definitions(),
        }
    }
}

/// Registry for schema_migrate models
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: Vec<ModelInfo>,
    schema: SchemaConfig,
    naming: NamingConfig,
    type_mapping: TypeMappingConfig,
}

impl ModelRegistry {
    /// Create an empty registry using default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Take schema, naming and type mapping settings from configuration
    pub fn apply_config(&mut self, config: &Config) {
        self.schema = config.schema.clone();
        self.naming = config.naming.clone();
        self.type_mapping = config.type_mapping.clone();
    }

    /// Register a model type
    pub fn register<M: SchemaModel>(&mut self) -> &mut Self {
        self.register_info(ModelInfo::of::<M>())
    }

    /// Register model information directly
    pub fn register_info(&mut self, info: ModelInfo) -> &mut Self {
        tracing::debug!(model = info.name.as_str(), connection = info.connection.as_str(), "Registered model");
        self.models.push(info);
        self
    }

    /// Get all registered models, in registration order
    pub fn get_models(&self) -> &[ModelInfo] {
        &self.models
    }

    /// Get a specific model by name
    pub fn get_model(&self, name: &str) -> Option<&ModelInfo> {
        self.models.iter().find(|model| model.name == name)
    }

    /// Resolve the table name of a model
    pub fn table_name_of(&self, model: &ModelInfo) -> String {
        match &model.table_name {
            Some(name) => name.clone(),
            None => get_table_name(&model.name, self.naming.pluralize_tables),
        }
    }

    /// Convert a registered model to a table snapshot
    pub fn to_table(&self, model: &ModelInfo) -> Table {
        let table_name = self.table_name_of(model);
        let engine = model.engine.as_deref().unwrap_or(&self.schema.default_engine);
        let mut table = Table::new(&table_name, engine);

        let primary_columns: Vec<String> = model
            .fields
            .iter()
            .filter(|field| field.primary_key)
            .map(|field| field.name.clone())
            .collect();
        let inline_primary_key = primary_columns.len() == 1;

        for field in &model.fields {
            let db_type = match &field.db_type {
                Some(db_type) => db_type.clone(),
                None => self.map_type_to_db_type(&field.rust_type).unwrap_or_default(),
            };
            let default = field.default.as_deref().map(|raw| render::default_literal(raw, &db_type));

            table.add_item(render::column_item(&ColumnSpec {
                name: &field.name,
                db_type: &db_type,
                // MySQL forces primary key columns to NOT NULL
                nullable: field.nullable && !field.primary_key,
                default: default.as_deref(),
                auto_increment: field.auto_increment,
                primary_key: field.primary_key && inline_primary_key,
            }));
        }

        if primary_columns.len() > 1 {
            table.add_item(render::primary_key_item(&table_name, &primary_columns));
        }

        for field in model.fields.iter().filter(|field| field.unique || field.index) {
            let columns = vec![field.name.clone()];
            let index_name = get_index_name(&self.naming.index_pattern, &table_name, &columns);
            table.add_item(render::index_item(&table_name, &index_name, &columns, field.unique));
        }

        for field in &model.fields {
            if let Some(foreign_key) = &field.foreign_key {
                let name = get_foreign_key_name(&self.naming.foreign_key_pattern, &table_name, &field.name);
                let columns = vec![field.name.clone()];
                let ref_columns = vec![foreign_key.ref_column.clone()];

                table.add_item(render::foreign_key_item(
                    &table_name,
                    &ForeignKeySpec {
                        name: &name,
                        columns: &columns,
                        ref_table: &foreign_key.ref_table,
                        ref_columns: &ref_columns,
                        on_delete: foreign_key.on_delete.as_deref(),
                        on_update: foreign_key.on_update.as_deref(),
                    },
                ));
            }
        }

        table
    }

    /// Map Rust type to MySQL column type; `None` when nothing matches
    pub fn map_type_to_db_type(&self, rust_type: &str) -> Option<String> {
        let inner = strip_option(rust_type);

        // First check for custom type mappings
        if let Some(custom_mappings) = &self.type_mapping.custom {
            for mapping in custom_mappings {
                if mapping.rust_type == rust_type || mapping.rust_type == inner {
                    return Some(mapping.db_type.clone());
                }
            }
        }

        let db_type = match last_segment(inner) {
            "String" | "str" | "&str" => "VARCHAR(255)",
            "i8" => "TINYINT",
            "i16" => "SMALLINT",
            "i32" => "INT",
            "i64" => "BIGINT",
            "u8" => "TINYINT UNSIGNED",
            "u16" => "SMALLINT UNSIGNED",
            "u32" => "INT UNSIGNED",
            "u64" => "BIGINT UNSIGNED",
            "f32" => "FLOAT",
            "f64" => "DOUBLE",
            "bool" => "TINYINT(1)",
            "Vec" if inner.ends_with("Vec<u8>") => "BLOB",
            "DateTime" | "NaiveDateTime" => "DATETIME",
            "NaiveDate" => "DATE",
            "NaiveTime" => "TIME",
            "Uuid" => "CHAR(36)",
            "Decimal" => "DECIMAL(20,6)",
            "Json" | "Value" => "JSON",
            _ => return None,
        };

        Some(db_type.to_string())
    }
}

impl DefinitionSource for ModelRegistry {
    fn snapshots(&self, connection: &str) -> Result<TableMap> {
        let mut tables = TableMap::new();

        for model in self.models.iter().filter(|model| model.connection == connection) {
            let table = self.to_table(model);
            if tables.contains_key(&table.name) {
                return Err(Error::ConfigError(format!(
                    "Table {} is defined by more than one model (last: {})",
                    table.name, model.name
                )));
            }
            tables.insert(table.name.clone(), table);
        }

        Ok(tables)
    }
}

/// `Option<T>` to `T`, anything else unchanged
fn strip_option(rust_type: &str) -> &str {
    let unqualified = rust_type
        .trim_start_matches("::")
        .trim_start_matches("std::option::")
        .trim_start_matches("core::option::");

    unqualified
        .strip_prefix("Option<")
        .and_then(|inner| inner.strip_suffix('>'))
        .unwrap_or(rust_type)
}

/// Last path segment without generic arguments (`chrono::DateTime<Utc>` to `DateTime`)
fn last_segment(rust_type: &str) -> &str {
    let head = rust_type.split('<').next().unwrap_or(rust_type);
    head.rsplit("::").next().unwrap_or(head)
}
