//! Glob-style table name filtering
//!
//! Only `*` is special; everything else matches literally.

use regex::Regex;

use crate::error::Result;
use crate::schema::types::TableMap;

pub const MATCH_ALL: &str = "*";

/// Compiled table name pattern
#[derive(Debug, Clone)]
pub struct TableFilter {
    pattern: String,
    /// `None` matches every name
    regex: Option<Regex>,
}

impl TableFilter {
    pub fn new(pattern: &str) -> Result<Self> {
        if pattern == MATCH_ALL {
            return Ok(Self::match_all());
        }

        let body = pattern
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");

        Ok(Self {
            pattern: pattern.to_string(),
            regex: Some(Regex::new(&format!("^{}$", body))?),
        })
    }

    pub fn match_all() -> Self {
        Self {
            pattern: MATCH_ALL.to_string(),
            regex: None,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self, table_name: &str) -> bool {
        self.regex
            .as_ref()
            .map_or(true, |regex| regex.is_match(table_name))
    }

    /// Keep the matching tables, preserving order
    pub fn apply(&self, tables: &TableMap) -> TableMap {
        tables
            .iter()
            .filter(|(name, _)| self.matches(name))
            .map(|(name, table)| (name.clone(), table.clone()))
            .collect()
    }
}

impl Default for TableFilter {
    fn default() -> Self {
        Self::match_all()
    }
}
