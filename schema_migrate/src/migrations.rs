//! Migration file generation
//!
//! This module turns a migration request into a migration file on disk.

use chrono::{DateTime, Local};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::config::{MigrationsConfig, DEFAULT_CONNECTION};
use crate::error::{Error, Result};
use crate::models::DefinitionSource;
use crate::schema::analyzer::DatabaseSource;
use crate::schema::filter::{TableFilter, MATCH_ALL};
use crate::schema::generator::{MigrationBody, MigrationGenerator};
use crate::utils::naming::get_migration_name;

/// Template used when no template file is configured
pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/migration.tpl");

/// Extension of written migration files
pub const MIGRATION_EXTENSION: &str = "migration";

const CLASS_NAME_PLACEHOLDER: &str = "ClassNamePlaceholder";
const CONNECTION_PLACEHOLDER: &str = "ConnectionPlaceholder";
const UP_PLACEHOLDER: &str = "/* UpMethodPlaceholder */";
const DOWN_PLACEHOLDER: &str = "/* DownMethodPlaceholder */";

/// Options of one `make-migration` run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MakeMigration {
    /// Diff the models against the database instead of writing an empty migration
    pub diff: bool,
    /// Table name glob, `*` wildcards only
    pub filter: String,
    /// Skip every validation
    pub force: bool,
    pub connection: String,
}

impl Default for MakeMigration {
    fn default() -> Self {
        Self {
            diff: false,
            filter: MATCH_ALL.to_string(),
            force: false,
            connection: DEFAULT_CONNECTION.to_string(),
        }
    }
}

/// Result of a `make-migration` run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// A migration file was written at this path
    Created(PathBuf),
    /// The database already matches the models; nothing was written
    NoChanges,
}

/// Writes migration bodies into timestamped files
#[derive(Debug, Clone)]
pub struct MigrationWriter {
    directory: PathBuf,
    template: String,
}

impl MigrationWriter {
    /// Create a writer from configuration, reading the template file if one is set
    pub fn new(config: &MigrationsConfig) -> Result<Self> {
        let template = match &config.template {
            Some(path) => fs::read_to_string(path).map_err(|e| {
                Error::ConfigError(format!("Failed to read migration template {}: {}", path, e))
            })?,
            None => DEFAULT_TEMPLATE.to_string(),
        };

        Ok(Self::with_template(&config.directory, template))
    }

    pub fn with_template(directory: impl AsRef<Path>, template: impl Into<String>) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            template: template.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Fill the template. Bodies go in last so their SQL is never rewritten.
    pub fn render(&self, name: &str, connection: &str, body: &MigrationBody) -> String {
        self.template
            .replace(CLASS_NAME_PLACEHOLDER, name)
            .replace(CONNECTION_PLACEHOLDER, connection)
            .replace(UP_PLACEHOLDER, &body.up)
            .replace(DOWN_PLACEHOLDER, &body.down)
    }

    /// Write a migration named after the current local time
    pub fn write(&self, connection: &str, body: &MigrationBody) -> Result<PathBuf> {
        self.write_at(Local::now(), connection, body)
    }

    /// Write a migration named after `timestamp`
    pub fn write_at(
        &self,
        timestamp: DateTime<Local>,
        connection: &str,
        body: &MigrationBody,
    ) -> Result<PathBuf> {
        let name = get_migration_name(&timestamp.format("%Y%m%d%H%M%S").to_string());
        let path = self
            .directory
            .join(format!("{}.{}", name, MIGRATION_EXTENSION));

        fs::create_dir_all(&self.directory)?;
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                return Err(Error::MigrationError(format!(
                    "Migration file already exists: {}",
                    path.display()
                )));
            }
            Err(err) => return Err(err.into()),
        };
        file.write_all(self.render(&name, connection, body).as_bytes())?;

        tracing::info!(path = %path.display(), connection, "Migration file created");

        Ok(path)
    }
}

/// Run one `make-migration` request against the given snapshot sources
pub async fn make_migration<D, S>(
    request: &MakeMigration,
    definitions: &D,
    database: &S,
    writer: &MigrationWriter,
) -> Result<MigrationOutcome>
where
    D: DefinitionSource + ?Sized,
    S: DatabaseSource + Sync + ?Sized,
{
    let filter = TableFilter::new(&request.filter)?;
    let generator = MigrationGenerator::new(filter, request.force);

    let body = if request.diff {
        let definition_tables = definitions.snapshots(&request.connection)?;
        let database_tables = database.snapshots().await?;

        match generator.make_diff_migration(&definition_tables, &database_tables)? {
            Some(body) => body,
            None => {
                tracing::info!(connection = request.connection.as_str(), "No changes detected");
                return Ok(MigrationOutcome::NoChanges);
            }
        }
    } else {
        generator.make_empty_migration()
    };

    let path = writer.write(&request.connection, &body)?;
    Ok(MigrationOutcome::Created(path))
}
