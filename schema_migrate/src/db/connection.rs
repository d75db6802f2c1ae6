//! Database connection handling
//!
//! This module provides functionality to establish and close database connections.

use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use std::time::Duration;

use crate::config::ConnectionConfig;
use crate::error::{Error, Result};

/// A named MySQL connection pool
#[derive(Debug, Clone)]
pub struct DatabaseConnection {
    name: String,
    pool: MySqlPool,
}

impl DatabaseConnection {
    /// Create a new database connection from configuration
    pub async fn connect(name: &str, config: &ConnectionConfig) -> Result<Self> {
        if !config.url.starts_with("mysql://") {
            return Err(Error::DatabaseError(format!(
                "Unsupported database url for connection {}: only mysql:// is supported",
                name
            )));
        }

        let pool_size = config.pool_size.unwrap_or(5);
        let timeout_seconds = config.timeout_seconds.unwrap_or(30);

        let pool = MySqlPoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(Duration::from_secs(timeout_seconds))
            .connect(&config.url)
            .await?;

        tracing::info!(connection = name, "Connected to database");

        Ok(Self {
            name: name.to_string(),
            pool,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Close every connection of the pool
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::debug!(connection = self.name.as_str(), "Closed database connection");
    }
}
