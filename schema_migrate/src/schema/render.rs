//! MySQL rendering of schema items
//!
//! Both the model registry and the database analyzer build their items
//! through these functions, so an unchanged column renders to the same text
//! on both sides and is not reported as modified.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::schema::types::TableItem;

/// Suffix of a column definition that carries its own primary key
pub const INLINE_PRIMARY_KEY: &str = " PRIMARY KEY";

/// Plain decimal numbers MySQL echoes back unchanged
static NUMERIC_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?(0|[1-9][0-9]*)(\.[0-9]+)?$").expect("valid numeric literal pattern"));

/// Type keywords whose defaults are always string literals
const STRING_TYPES: &[&str] = &[
    "CHAR", "VARCHAR", "TINYTEXT", "TEXT", "MEDIUMTEXT", "LONGTEXT", "ENUM", "SET",
];

/// Structured description of a column, before rendering
#[derive(Debug, Clone, Default)]
pub struct ColumnSpec<'a> {
    pub name: &'a str,
    pub db_type: &'a str,
    pub nullable: bool,
    pub default: Option<&'a str>,
    pub auto_increment: bool,
    pub primary_key: bool,
}

/// Structured description of a foreign key, before rendering
#[derive(Debug, Clone, Default)]
pub struct ForeignKeySpec<'a> {
    pub name: &'a str,
    pub columns: &'a [String],
    pub ref_table: &'a str,
    pub ref_columns: &'a [String],
    pub on_delete: Option<&'a str>,
    pub on_update: Option<&'a str>,
}

/// Quote an identifier with backticks
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

fn quote_list(names: &[String]) -> String {
    names
        .iter()
        .map(|name| quote_identifier(name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render a column definition. A column without a type renders to empty text.
pub fn column_sql(spec: &ColumnSpec<'_>) -> String {
    let db_type = spec.db_type.trim();
    if db_type.is_empty() {
        return String::new();
    }

    let mut sql = format!(
        "{} {} {}",
        quote_identifier(spec.name),
        normalize_type(db_type),
        if spec.nullable { "NULL" } else { "NOT NULL" }
    );

    if let Some(default) = spec.default {
        sql.push_str(" DEFAULT ");
        sql.push_str(default);
    }
    if spec.auto_increment {
        sql.push_str(" AUTO_INCREMENT");
    }
    if spec.primary_key {
        sql.push_str(INLINE_PRIMARY_KEY);
    }

    sql
}

/// Uppercase a column type, leaving quoted ENUM/SET values alone
pub fn normalize_type(db_type: &str) -> String {
    let mut normalized = String::with_capacity(db_type.len());
    let mut quoted = false;

    for c in db_type.chars() {
        if c == '\'' {
            quoted = !quoted;
        }
        if quoted || c == '\'' {
            normalized.push(c);
        } else {
            normalized.extend(c.to_uppercase());
        }
    }

    normalized
}

fn is_string_type(db_type: &str) -> bool {
    let keyword = db_type
        .trim()
        .split(|c: char| c == '(' || c.is_whitespace())
        .next()
        .unwrap_or_default()
        .to_uppercase();

    STRING_TYPES.contains(&keyword.as_str())
}

pub fn column_item(spec: &ColumnSpec<'_>) -> TableItem {
    TableItem::column(spec.name, &column_sql(spec))
}

pub fn index_item(table: &str, name: &str, columns: &[String], unique: bool) -> TableItem {
    let sql = format!(
        "ALTER TABLE {} ADD {}INDEX {} ({})",
        table,
        if unique { "UNIQUE " } else { "" },
        quote_identifier(name),
        quote_list(columns)
    );
    TableItem::index(name, &sql)
}

pub fn foreign_key_item(table: &str, spec: &ForeignKeySpec<'_>) -> TableItem {
    let mut sql = format!(
        "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
        table,
        quote_identifier(spec.name),
        quote_list(spec.columns),
        quote_identifier(spec.ref_table),
        quote_list(spec.ref_columns)
    );

    if let Some(rule) = significant_rule(spec.on_delete) {
        sql.push_str(" ON DELETE ");
        sql.push_str(&rule);
    }
    if let Some(rule) = significant_rule(spec.on_update) {
        sql.push_str(" ON UPDATE ");
        sql.push_str(&rule);
    }

    TableItem::foreign_key(spec.name, spec.ref_table, &sql)
}

pub fn primary_key_item(table: &str, columns: &[String]) -> TableItem {
    TableItem::primary_key(&format!("ALTER TABLE {} ADD PRIMARY KEY ({})", table, quote_list(columns)))
}

/// `RESTRICT` and `NO ACTION` are what the engine does anyway
fn significant_rule(rule: Option<&str>) -> Option<String> {
    let rule = rule?.trim().to_uppercase();
    match rule.as_str() {
        "" | "RESTRICT" | "NO ACTION" => None,
        _ => Some(rule),
    }
}

/// Turn a raw `COLUMN_DEFAULT` value into a SQL literal for a `db_type` column
///
/// String typed columns always get a quoted literal; elsewhere plain decimals
/// and `CURRENT_TIMESTAMP` expressions stay bare.
pub fn default_literal(raw: &str, db_type: &str) -> String {
    let upper = raw.to_uppercase();
    let is_bare = upper == "NULL"
        || (raw.starts_with('\'') && raw.ends_with('\'') && raw.len() >= 2)
        || (!is_string_type(db_type)
            && (upper.starts_with("CURRENT_TIMESTAMP") || NUMERIC_LITERAL.is_match(raw)));

    if is_bare {
        raw.to_string()
    } else {
        format!("'{}'", raw.replace('\'', "''"))
    }
}
