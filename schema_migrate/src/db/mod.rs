//! Database module for schema_migrate
//!
//! This module handles named database connections.

pub mod connection;
pub mod registry;

// Re-export key types
pub use connection::DatabaseConnection;
pub use registry::ConnectionRegistry;
