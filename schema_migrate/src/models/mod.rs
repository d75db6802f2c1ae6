//! Models module for schema_migrate
//!
//! This module handles model registration.

pub mod registry;

// Re-export key types
pub use registry::{DefinitionSource, ModelInfo, ModelRegistry, SchemaModel};
