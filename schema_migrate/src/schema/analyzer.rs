//! Database schema analyzer
//!
//! Introspects a live MySQL database into table snapshots rendered the same
//! way as model definitions.

use async_trait::async_trait;
use indexmap::IndexMap;
use sqlx::FromRow;

use crate::db::connection::DatabaseConnection;
use crate::error::Result;
use crate::schema::render::{self, ColumnSpec, ForeignKeySpec};
use crate::schema::table::Table;
use crate::schema::types::TableMap;

const PRIMARY_INDEX: &str = "PRIMARY";

/// Source of the database side of a diff
#[async_trait]
pub trait DatabaseSource {
    /// Snapshot every table of the connected database
    async fn snapshots(&self) -> Result<TableMap>;
}

/// A snapshot map already in memory
#[async_trait]
impl DatabaseSource for TableMap {
    async fn snapshots(&self) -> Result<TableMap> {
        Ok(self.clone())
    }
}

/// Schema analyzer for database schema introspection
pub struct SchemaAnalyzer {
    connection: DatabaseConnection,
}

impl SchemaAnalyzer {
    /// Create a new schema analyzer
    pub fn new(connection: DatabaseConnection) -> Self {
        Self { connection }
    }
}

#[derive(Debug, Clone, FromRow)]
struct TableRow {
    table_name: String,
    engine: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
struct ColumnRow {
    column_name: String,
    column_type: String,
    is_nullable: String,
    column_default: Option<String>,
    extra: String,
}

#[derive(Debug, Clone, FromRow)]
struct IndexRow {
    index_name: String,
    column_name: String,
    non_unique: i64,
}

#[derive(Debug, Clone, FromRow)]
struct ForeignKeyRow {
    constraint_name: String,
    column_name: String,
    ref_table: String,
    ref_column: String,
    delete_rule: String,
    update_rule: String,
}

#[async_trait]
impl DatabaseSource for SchemaAnalyzer {
    async fn snapshots(&self) -> Result<TableMap> {
        let pool = self.connection.pool();
        let mut tables = TableMap::new();

        let sql = r#"
            SELECT TABLE_NAME AS table_name, ENGINE AS engine
            FROM information_schema.TABLES
            WHERE TABLE_SCHEMA = DATABASE() AND TABLE_TYPE = 'BASE TABLE'
            ORDER BY TABLE_NAME
        "#;

        let table_rows = sqlx::query_as::<_, TableRow>(sql).fetch_all(pool).await?;

        for table_row in table_rows {
            let sql = r#"
                SELECT COLUMN_NAME AS column_name, COLUMN_TYPE AS column_type,
                       IS_NULLABLE AS is_nullable, COLUMN_DEFAULT AS column_default,
                       EXTRA AS extra
                FROM information_schema.COLUMNS
                WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?
                ORDER BY ORDINAL_POSITION
            "#;

            let column_rows = sqlx::query_as::<_, ColumnRow>(sql)
                .bind(&table_row.table_name)
                .fetch_all(pool)
                .await?;

            let sql = r#"
                SELECT INDEX_NAME AS index_name, COLUMN_NAME AS column_name,
                       CAST(NON_UNIQUE AS SIGNED) AS non_unique
                FROM information_schema.STATISTICS
                WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?
                ORDER BY INDEX_NAME, SEQ_IN_INDEX
            "#;

            let index_rows = sqlx::query_as::<_, IndexRow>(sql)
                .bind(&table_row.table_name)
                .fetch_all(pool)
                .await?;

            let sql = r#"
                SELECT k.CONSTRAINT_NAME AS constraint_name, k.COLUMN_NAME AS column_name,
                       k.REFERENCED_TABLE_NAME AS ref_table, k.REFERENCED_COLUMN_NAME AS ref_column,
                       r.DELETE_RULE AS delete_rule, r.UPDATE_RULE AS update_rule
                FROM information_schema.KEY_COLUMN_USAGE k
                JOIN information_schema.REFERENTIAL_CONSTRAINTS r
                  ON r.CONSTRAINT_SCHEMA = k.CONSTRAINT_SCHEMA
                 AND r.CONSTRAINT_NAME = k.CONSTRAINT_NAME
                WHERE k.TABLE_SCHEMA = DATABASE() AND k.TABLE_NAME = ?
                ORDER BY k.CONSTRAINT_NAME, k.ORDINAL_POSITION
            "#;

            let foreign_key_rows = sqlx::query_as::<_, ForeignKeyRow>(sql)
                .bind(&table_row.table_name)
                .fetch_all(pool)
                .await?;

            let table = build_table(&table_row, &column_rows, &index_rows, &foreign_key_rows);
            tracing::debug!(
                connection = self.connection.name(),
                table = table.name.as_str(),
                items = table.items.len(),
                "Introspected table"
            );
            tables.insert(table.name.clone(), table);
        }

        Ok(tables)
    }
}

/// Index columns grouped by index name
struct IndexColumns {
    unique: bool,
    columns: Vec<String>,
}

/// Foreign key columns grouped by constraint name
struct ForeignKeyColumns {
    ref_table: String,
    columns: Vec<String>,
    ref_columns: Vec<String>,
    delete_rule: String,
    update_rule: String,
}

fn build_table(
    table_row: &TableRow,
    columns: &[ColumnRow],
    indexes: &[IndexRow],
    foreign_keys: &[ForeignKeyRow],
) -> Table {
    let name = table_row.table_name.as_str();
    let mut table = Table::new(name, table_row.engine.as_deref().unwrap_or_default());

    let mut index_columns: IndexMap<&str, IndexColumns> = IndexMap::new();
    for row in indexes {
        index_columns
            .entry(row.index_name.as_str())
            .or_insert_with(|| IndexColumns {
                unique: row.non_unique == 0,
                columns: Vec::new(),
            })
            .columns
            .push(row.column_name.clone());
    }

    let mut foreign_key_columns: IndexMap<&str, ForeignKeyColumns> = IndexMap::new();
    for row in foreign_keys {
        let entry = foreign_key_columns
            .entry(row.constraint_name.as_str())
            .or_insert_with(|| ForeignKeyColumns {
                ref_table: row.ref_table.clone(),
                columns: Vec::new(),
                ref_columns: Vec::new(),
                delete_rule: row.delete_rule.clone(),
                update_rule: row.update_rule.clone(),
            });
        entry.columns.push(row.column_name.clone());
        entry.ref_columns.push(row.ref_column.clone());
    }

    let primary_columns = index_columns
        .get(PRIMARY_INDEX)
        .map(|index| index.columns.as_slice())
        .unwrap_or_default();
    let inline_primary_key = match primary_columns {
        [single] => Some(single.as_str()),
        _ => None,
    };

    for column in columns {
        let default = column
            .column_default
            .as_deref()
            .map(|raw| render::default_literal(raw, &column.column_type));
        table.add_item(render::column_item(&ColumnSpec {
            name: &column.column_name,
            db_type: &column.column_type,
            nullable: column.is_nullable.eq_ignore_ascii_case("YES"),
            default: default.as_deref(),
            auto_increment: column.extra.to_lowercase().contains("auto_increment"),
            primary_key: inline_primary_key == Some(column.column_name.as_str()),
        }));
    }

    if primary_columns.len() > 1 {
        table.add_item(render::primary_key_item(name, primary_columns));
    }

    for (index_name, index) in &index_columns {
        // MySQL backs every foreign key with an index of the same name
        if *index_name == PRIMARY_INDEX || foreign_key_columns.contains_key(index_name) {
            continue;
        }
        table.add_item(render::index_item(name, index_name, &index.columns, index.unique));
    }

    for (constraint_name, foreign_key) in &foreign_key_columns {
        table.add_item(render::foreign_key_item(
            name,
            &ForeignKeySpec {
                name: constraint_name,
                columns: &foreign_key.columns,
                ref_table: &foreign_key.ref_table,
                ref_columns: &foreign_key.ref_columns,
                on_delete: Some(foreign_key.delete_rule.as_str()),
                on_update: Some(foreign_key.update_rule.as_str()),
            },
        ));
    }

    table
}
