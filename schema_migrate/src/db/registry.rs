//! Connection registry
//!
//! Holds the configured connections of one run and opens each one the first
//! time it is asked for, so a broken entry only fails the runs that use it.
//! The caller closes the registry afterwards.

use indexmap::IndexMap;

use crate::config::ConnectionConfig;
use crate::db::connection::DatabaseConnection;
use crate::error::{Error, Result};

/// Named database connections, in configuration order
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    configs: IndexMap<String, ConnectionConfig>,
    connections: IndexMap<String, DatabaseConnection>,
}

impl ConnectionRegistry {
    /// Create a registry for the given connections without connecting
    pub fn new(configs: &IndexMap<String, ConnectionConfig>) -> Self {
        Self {
            configs: configs.clone(),
            connections: IndexMap::new(),
        }
    }

    /// Look up a connection by name, connecting on first use
    pub async fn get(&mut self, name: &str) -> Result<&DatabaseConnection> {
        let config = self
            .configs
            .get(name)
            .ok_or_else(|| Error::DatabaseError(format!("Unknown connection: {}", name)))?;

        if !self.connections.contains_key(name) {
            let connection = DatabaseConnection::connect(name, config).await?;
            self.connections.insert(name.to_string(), connection);
        }

        self.connections
            .get(name)
            .ok_or_else(|| Error::DatabaseError(format!("Connection {} is not open", name)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.configs.contains_key(name)
    }

    /// Configured connection names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.configs.keys().map(String::as_str)
    }

    /// Names of the connections opened so far
    pub fn connected(&self) -> impl Iterator<Item = &str> {
        self.connections.keys().map(String::as_str)
    }

    /// Close every opened connection; the registry is unusable afterwards
    pub async fn close(self) {
        for connection in self.connections.values() {
            connection.close().await;
        }
    }
}
