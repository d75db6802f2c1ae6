//! Command line interface
//!
//! A downstream binary registers its models and hands them to [`run`]:
//!
//! ```ignore
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut models = ModelRegistry::new();
//!     models.register::<User>().register::<Post>();
//!     schema_migrate::cli::run(models).await
//! }
//! ```

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use crate::config::{self, DEFAULT_CONNECTION};
use crate::migrations::{MakeMigration, MigrationOutcome};
use crate::models::ModelRegistry;
use crate::schema::filter::MATCH_ALL;
use crate::utils::logging::init_logging;
use crate::SchemaMigrateClient;

/// Migration generator for schema_migrate models
#[derive(Parser, Debug)]
#[command(name = "schema_migrate")]
#[command(version)]
#[command(about = "Generate MySQL migrations from model definitions", long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(long, default_value = "schema_migrate.toml")]
    pub config: String,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a migration file
    MakeMigration(MakeMigrationArgs),
}

/// Arguments for the `make-migration` command
#[derive(Args, Debug)]
pub struct MakeMigrationArgs {
    /// Make a diff migration from the current model definitions
    #[arg(short, long)]
    pub diff: bool,

    /// Only consider tables matching this pattern (`*` is a wildcard)
    #[arg(long, default_value = MATCH_ALL)]
    pub filter: String,

    /// Ignore validations
    #[arg(short, long)]
    pub force: bool,

    /// Connection used on migration
    #[arg(long, default_value = DEFAULT_CONNECTION)]
    pub connection: String,
}

impl From<&MakeMigrationArgs> for MakeMigration {
    fn from(args: &MakeMigrationArgs) -> Self {
        Self {
            diff: args.diff,
            filter: args.filter.clone(),
            force: args.force,
            connection: args.connection.clone(),
        }
    }
}

/// Parse the process arguments and run the requested command
pub async fn run(models: ModelRegistry) -> anyhow::Result<()> {
    execute(Cli::parse(), models).await
}

/// Run an already parsed command line
pub async fn execute(cli: Cli, models: ModelRegistry) -> anyhow::Result<()> {
    let config = config::load_from_file(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config))?;
    init_logging(config.logging.as_ref())?;

    let mut client = SchemaMigrateClient::new(config, models);

    let outcome = match &cli.command {
        Command::MakeMigration(args) => client
            .make_migration(&MakeMigration::from(args))
            .await
            .with_context(|| format!("Failed to create a migration for connection {}", args.connection)),
    };
    client.close().await;

    match outcome? {
        MigrationOutcome::Created(path) => println!("Migration file created at {}", path.display()),
        MigrationOutcome::NoChanges => println!("No changes detected."),
    }

    Ok(())
}
