//! schema_migrate: diff Rust model definitions against a live MySQL database
//!
//! Models describe the tables they want through `#[derive(SchemaModel)]`. The
//! generator compares those definitions with what the database reports and
//! writes a migration file whose `up` half brings the database in line with
//! the models and whose `down` half undoes it.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod migrations;
pub mod models;
pub mod schema;
pub mod utils;

// Re-export main types for easier access
pub use config::Config;
pub use db::{ConnectionRegistry, DatabaseConnection};
pub use error::{Error, Result};
pub use migrations::{MakeMigration, MigrationOutcome, MigrationWriter};
pub use models::{DefinitionSource, ModelRegistry, SchemaModel};
pub use schema::{DatabaseSource, MigrationGenerator, SchemaAnalyzer};
pub use schema_migrate_macros::SchemaModel;

/// Initialize schema_migrate with the specified configuration file
pub fn init(config_path: &str, models: ModelRegistry) -> Result<SchemaMigrateClient> {
    let config = config::load_from_file(config_path)?;
    Ok(SchemaMigrateClient::new(config, models))
}

/// The main client for interacting with schema_migrate
pub struct SchemaMigrateClient {
    config: Config,
    connections: ConnectionRegistry,
    model_registry: ModelRegistry,
}

impl SchemaMigrateClient {
    /// Create a new client; connections are opened when a migration needs them
    pub fn new(config: Config, mut model_registry: ModelRegistry) -> Self {
        model_registry.apply_config(&config);
        let connections = ConnectionRegistry::new(&config.connections);

        Self {
            config,
            connections,
            model_registry,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn models(&self) -> &ModelRegistry {
        &self.model_registry
    }

    /// Create a migration file, empty or diffed against the named connection
    ///
    /// Only a diff request opens the connection; an empty migration just
    /// checks that it is configured.
    pub async fn make_migration(&mut self, request: &MakeMigration) -> Result<MigrationOutcome> {
        let writer = MigrationWriter::new(&self.config.migrations)?;

        if !request.diff {
            if !self.connections.contains(&request.connection) {
                return Err(Error::DatabaseError(format!(
                    "Unknown connection: {}",
                    request.connection
                )));
            }
            let database = schema::TableMap::new();
            return migrations::make_migration(request, &self.model_registry, &database, &writer).await;
        }

        let connection = self.connections.get(&request.connection).await?;
        let analyzer = SchemaAnalyzer::new(connection.clone());

        migrations::make_migration(request, &self.model_registry, &analyzer, &writer).await
    }

    /// Close every opened database connection
    pub async fn close(self) {
        self.connections.close().await;
    }
}
