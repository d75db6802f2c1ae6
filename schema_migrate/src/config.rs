//! Configuration handling for schema_migrate

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;

use crate::error::{Error, Result};

/// Name of the connection used when none is given
pub const DEFAULT_CONNECTION: &str = "default";

/// Load configuration from a TOML file
pub fn load_from_file(path: &str) -> Result<Config> {
    let config_str = fs::read_to_string(path)
        .map_err(|e| Error::ConfigError(format!("Failed to read config file: {}", e)))?;

    let config: Config = toml::from_str(&config_str)
        .map_err(|e| Error::ConfigError(format!("Failed to parse config file: {}", e)))?;

    Ok(config)
}

/// Represents the complete schema_migrate configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub connections: IndexMap<String, ConnectionConfig>,
    #[serde(default)]
    pub migrations: MigrationsConfig,
    #[serde(default)]
    pub schema: SchemaConfig,
    #[serde(default)]
    pub naming: NamingConfig,
    #[serde(default)]
    pub type_mapping: TypeMappingConfig,
    pub logging: Option<LoggingConfig>,
}

/// A named database connection
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ConnectionConfig {
    pub url: String,
    pub pool_size: Option<u32>,
    pub timeout_seconds: Option<u64>,
}

/// Migration file settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MigrationsConfig {
    pub directory: String,
    /// Template file; the built-in template is used when unset
    pub template: Option<String>,
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            directory: "migrations".to_string(),
            template: None,
        }
    }
}

/// Schema generation behavior configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SchemaConfig {
    pub default_engine: String,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            default_engine: "InnoDB".to_string(),
        }
    }
}

/// Naming conventions configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NamingConfig {
    pub pluralize_tables: bool,
    pub index_pattern: String,
    pub foreign_key_pattern: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            pluralize_tables: true,
            index_pattern: "ix_{table}_{columns}".to_string(),
            foreign_key_pattern: "fk_{table}_{column}".to_string(),
        }
    }
}

/// Type mapping configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct TypeMappingConfig {
    pub custom: Option<Vec<CustomTypeMapping>>,
}

/// Custom type mapping
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CustomTypeMapping {
    pub rust_type: String,
    pub db_type: String,
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub format: String,
    pub stdout: bool,
}
