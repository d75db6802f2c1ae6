//! Error types for schema_migrate

use thiserror::Error;

/// Result type for schema_migrate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for schema_migrate
///
/// Every variant is fatal to the migration run that raised it; nothing is
/// written to disk once one of these has been returned.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Engine {definition_engine} on table {table} doesn't match database engine {database_engine}")]
    EngineMismatchError {
        table: String,
        definition_engine: String,
        database_engine: String,
    },

    #[error("Column {column} on table {table} doesn't have a type")]
    MissingColumnTypeError { table: String, column: String },

    #[error("You need to set a default value when changing a column from nullable to not null: {operation}")]
    UnsafeNullabilityChangeError { operation: String },

    #[error("Constraint {constraint} on table {table} is neither an index nor a foreign key, don't know how to drop it")]
    AmbiguousConstraintDropError { table: String, constraint: String },

    #[error("Cyclic foreign key references between tables: {}", tables.join(", "))]
    CyclicReferenceError { tables: Vec<String> },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),
}

/// Convert TOML deserialization errors to schema_migrate errors
impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::ConfigError(error.to_string())
    }
}

/// Convert filter pattern compilation errors to schema_migrate errors
impl From<regex::Error> for Error {
    fn from(error: regex::Error) -> Self {
        Error::ConfigError(format!("Invalid table filter: {}", error))
    }
}
