//! Table snapshots and per-table diff operations
//!
//! A [`Table`] is an immutable, point-in-time description of one table. The
//! `make_*_operations` methods are called on the *source* snapshot with the
//! *destination* snapshot as argument and return the statements that turn
//! the destination into the source.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::schema::render::INLINE_PRIMARY_KEY;
use crate::schema::types::{ConstraintKind, ItemKind, TableItem};

/// Comment attached to every table created from model definitions
pub const ENTITY_TABLE_TAG: &str = "SCHEMA_MIGRATE_ENTITY";

/// Separator between statements inside a single operation
pub const STATEMENT_SEPARATOR: char = ';';

/// Represents one table: its columns and constraints plus storage engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub engine: String,
    pub items: IndexMap<String, TableItem>,
}

impl Table {
    /// Create a new empty table
    pub fn new(name: &str, engine: &str) -> Self {
        Self {
            name: name.to_string(),
            engine: engine.to_string(),
            items: IndexMap::new(),
        }
    }

    /// Add an item, replacing any item with the same key
    pub fn add_item(&mut self, item: TableItem) {
        self.items.insert(item.key.clone(), item);
    }

    /// Builder-style [`Table::add_item`]
    pub fn with_item(mut self, item: TableItem) -> Self {
        self.add_item(item);
        self
    }

    pub fn columns(&self) -> impl Iterator<Item = &TableItem> {
        self.items.values().filter(|item| item.is_column())
    }

    pub fn constraints(&self) -> impl Iterator<Item = &TableItem> {
        self.items.values().filter(|item| !item.is_column())
    }

    /// Statements creating this table: the `CREATE TABLE` first, then one
    /// statement per constraint
    pub fn make_create_operations(&self) -> Vec<String> {
        let column_sql = self
            .columns()
            .map(|item| item.sql.trim())
            .collect::<Vec<_>>()
            .join(", ");

        let create = format!(
            "CREATE TABLE {} ( {} ) ENGINE={} COMMENT '{}'",
            self.name, column_sql, self.engine, ENTITY_TABLE_TAG
        );

        std::iter::once(create)
            .chain(
                self.constraints()
                    .map(|item| item.sql.trim().trim_end_matches(STATEMENT_SEPARATOR).to_string())
                    .filter(|sql| !sql.is_empty()),
            )
            .collect()
    }

    /// [`Table::make_create_operations`] joined into a single script
    pub fn make_create_sql(&self) -> String {
        self.make_create_operations().join(&STATEMENT_SEPARATOR.to_string())
    }

    pub fn make_drop_sql(&self) -> String {
        format!("DROP TABLE {}", self.name)
    }

    /// Items present here but absent from `other`
    pub fn make_add_operations(&self, other: &Table) -> Vec<String> {
        self.items
            .values()
            .filter(|item| !other.items.contains_key(&item.key))
            .map(|item| self.make_add_operation(item))
            .collect()
    }

    pub fn make_add_operation(&self, item: &TableItem) -> String {
        match item.kind {
            ItemKind::Column => format!("ALTER TABLE {} ADD COLUMN {}", self.name, item.sql),
            ItemKind::Constraint(_) => item.sql.clone(),
        }
    }

    /// Items present in `other` but absent here
    pub fn make_drop_operations(&self, other: &Table) -> Result<Vec<String>> {
        other
            .items
            .values()
            .filter(|item| !self.items.contains_key(&item.key))
            .map(|item| self.make_drop_operation(item))
            .collect()
    }

    pub fn make_drop_operation(&self, item: &TableItem) -> Result<String> {
        match item.kind {
            ItemKind::Column => Ok(format!("ALTER TABLE {} DROP COLUMN {}", self.name, item.key)),
            ItemKind::Constraint(_) => Ok(format!(
                "ALTER TABLE {} {}",
                self.name,
                self.drop_constraint_clause(item)?
            )),
        }
    }

    /// Items present on both sides whose rendered text differs
    pub fn make_modify_operations(&self, other: &Table) -> Result<Vec<String>> {
        self.items
            .values()
            .filter_map(|item| {
                other
                    .items
                    .get(&item.key)
                    .filter(|previous| previous.sql != item.sql)
                    .map(|previous| self.make_modify_operation(item, previous))
            })
            .collect()
    }

    /// Statement replacing `previous` with `item`
    pub fn make_modify_operation(&self, item: &TableItem, previous: &TableItem) -> Result<String> {
        match item.kind {
            ItemKind::Column => {
                // A key that is already in place must not be declared again
                let sql = match item.sql.strip_suffix(INLINE_PRIMARY_KEY) {
                    Some(stripped) if previous.sql.ends_with(INLINE_PRIMARY_KEY) => stripped,
                    _ => item.sql.as_str(),
                };
                Ok(format!("ALTER TABLE {} MODIFY COLUMN {}", self.name, sql))
            }
            ItemKind::Constraint(_) => Ok(format!(
                "ALTER TABLE {} {}{}{}",
                self.name,
                self.drop_constraint_clause(item)?,
                STATEMENT_SEPARATOR,
                item.sql
            )),
        }
    }

    fn drop_constraint_clause(&self, item: &TableItem) -> Result<String> {
        match item.constraint_kind() {
            Some(ConstraintKind::Index) => Ok(format!("DROP INDEX {}", item.name)),
            Some(ConstraintKind::ForeignKey { .. }) => Ok(format!("DROP FOREIGN KEY {}", item.name)),
            Some(ConstraintKind::PrimaryKey) => Ok("DROP PRIMARY KEY".to_string()),
            Some(ConstraintKind::Other) | None => Err(Error::AmbiguousConstraintDropError {
                table: self.name.clone(),
                constraint: item.name.clone(),
            }),
        }
    }

    /// Names of the tables this one points at through foreign keys
    pub fn referenced_tables(&self) -> impl Iterator<Item = &str> {
        self.items.values().filter_map(|item| match item.constraint_kind() {
            Some(ConstraintKind::ForeignKey { references }) => Some(references.as_str()),
            _ => None,
        })
    }

    /// Check if this table has a foreign key to `other`
    pub fn has_reference(&self, other: &Table) -> bool {
        self.referenced_tables()
            .any(|name| name.eq_ignore_ascii_case(&other.name))
    }

    /// Migration order between two tables; `Greater` means this one goes after
    /// `other`. Cycles are not detected, see [`crate::schema::order`].
    pub fn compare(&self, other: &Table) -> Ordering {
        if self.has_reference(other) {
            Ordering::Greater
        } else if other.has_reference(self) {
            Ordering::Less
        } else {
            Ordering::Equal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn posts_source() -> Table {
        Table::new("posts", "InnoDB")
            .with_item(TableItem::column("id", "id INT PK"))
            .with_item(TableItem::column("name", "name VARCHAR(255) NOT NULL"))
    }

    fn posts_dest() -> Table {
        Table::new("posts", "InnoDB").with_item(TableItem::column("id", "id INT PK"))
    }

    fn comments() -> Table {
        Table::new("comments", "InnoDB")
            .with_item(TableItem::column("id", "`id` INT NOT NULL AUTO_INCREMENT PRIMARY KEY"))
            .with_item(TableItem::column("post_id", "`post_id` INT NOT NULL"))
            .with_item(TableItem::index(
                "ix_comments_post_id",
                "ALTER TABLE comments ADD INDEX `ix_comments_post_id` (`post_id`)",
            ))
            .with_item(TableItem::foreign_key(
                "fk_comments_post_id",
                "posts",
                "ALTER TABLE comments ADD CONSTRAINT `fk_comments_post_id` FOREIGN KEY (`post_id`) REFERENCES `posts` (`id`)",
            ))
    }

    #[test]
    fn create_sql_appends_constraints_as_statements() {
        assert_eq!(
            comments().make_create_sql(),
            "CREATE TABLE comments ( `id` INT NOT NULL AUTO_INCREMENT PRIMARY KEY, `post_id` INT NOT NULL ) \
             ENGINE=InnoDB COMMENT 'SCHEMA_MIGRATE_ENTITY';\
             ALTER TABLE comments ADD INDEX `ix_comments_post_id` (`post_id`);\
             ALTER TABLE comments ADD CONSTRAINT `fk_comments_post_id` FOREIGN KEY (`post_id`) REFERENCES `posts` (`id`)"
        );
    }

    #[test]
    fn create_sql_without_constraints_has_no_trailing_separator() {
        assert_eq!(
            posts_dest().make_create_sql(),
            "CREATE TABLE posts ( id INT PK ) ENGINE=InnoDB COMMENT 'SCHEMA_MIGRATE_ENTITY'"
        );
    }

    #[test]
    fn drop_sql() {
        assert_eq!(posts_dest().make_drop_sql(), "DROP TABLE posts");
    }

    #[test]
    fn add_and_drop_are_mirror_images() {
        let source = posts_source();
        let dest = posts_dest();

        assert_eq!(
            source.make_add_operations(&dest),
            vec!["ALTER TABLE posts ADD COLUMN name VARCHAR(255) NOT NULL"]
        );
        assert_eq!(
            dest.make_drop_operations(&source).unwrap(),
            vec!["ALTER TABLE posts DROP COLUMN name"]
        );
        assert!(source.make_drop_operations(&dest).unwrap().is_empty());
        assert!(dest.make_add_operations(&source).is_empty());
    }

    #[rstest]
    #[case(posts_source())]
    #[case(posts_dest())]
    #[case(comments())]
    #[case(Table::new("empty", "InnoDB"))]
    fn diff_against_self_is_empty(#[case] table: Table) {
        assert!(table.make_add_operations(&table).is_empty());
        assert!(table.make_drop_operations(&table).unwrap().is_empty());
        assert!(table.make_modify_operations(&table).unwrap().is_empty());
    }

    #[test]
    fn disjoint_tables_have_no_modifications() {
        let left = Table::new("t", "InnoDB").with_item(TableItem::column("a", "`a` INT NOT NULL"));
        let right = Table::new("t", "InnoDB").with_item(TableItem::column("b", "`b` INT NOT NULL"));

        assert!(left.make_modify_operations(&right).unwrap().is_empty());
        assert!(right.make_modify_operations(&left).unwrap().is_empty());
    }

    #[test]
    fn constraints_are_added_verbatim() {
        let source = comments();
        let dest = Table::new("comments", "InnoDB");

        let ops = source.make_add_operations(&dest);
        assert_eq!(ops.len(), 4);
        assert_eq!(ops[2], "ALTER TABLE comments ADD INDEX `ix_comments_post_id` (`post_id`)");
    }

    #[test]
    fn constraints_are_dropped_by_kind() {
        let source = Table::new("comments", "InnoDB");
        let dest = comments().with_item(TableItem::primary_key(
            "ALTER TABLE comments ADD PRIMARY KEY (`id`, `post_id`)",
        ));

        let ops = source.make_drop_operations(&dest).unwrap();
        assert_eq!(
            ops,
            vec![
                "ALTER TABLE comments DROP COLUMN id",
                "ALTER TABLE comments DROP COLUMN post_id",
                "ALTER TABLE comments DROP INDEX ix_comments_post_id",
                "ALTER TABLE comments DROP FOREIGN KEY fk_comments_post_id",
                "ALTER TABLE comments DROP PRIMARY KEY",
            ]
        );
    }

    #[test]
    fn dropping_an_unknown_constraint_is_an_error() {
        let source = Table::new("users", "InnoDB");
        let dest = Table::new("users", "InnoDB").with_item(TableItem::constraint(
            "chk_age",
            "ALTER TABLE users ADD CONSTRAINT chk_age CHECK (age > 0)",
        ));

        let err = source.make_drop_operations(&dest).unwrap_err();
        assert!(matches!(
            err,
            Error::AmbiguousConstraintDropError { ref table, ref constraint }
                if table == "users" && constraint == "chk_age"
        ));
    }

    #[test]
    fn modified_column_and_constraint() {
        let source = Table::new("users", "InnoDB")
            .with_item(TableItem::column("name", "`name` VARCHAR(120) NOT NULL DEFAULT ''"))
            .with_item(TableItem::index(
                "ix_users_name",
                "ALTER TABLE users ADD UNIQUE INDEX `ix_users_name` (`name`)",
            ));
        let dest = Table::new("users", "InnoDB")
            .with_item(TableItem::column("name", "`name` VARCHAR(255) NULL"))
            .with_item(TableItem::index(
                "ix_users_name",
                "ALTER TABLE users ADD INDEX `ix_users_name` (`name`)",
            ));

        assert_eq!(
            source.make_modify_operations(&dest).unwrap(),
            vec![
                "ALTER TABLE users MODIFY COLUMN `name` VARCHAR(120) NOT NULL DEFAULT ''",
                "ALTER TABLE users DROP INDEX ix_users_name;ALTER TABLE users ADD UNIQUE INDEX `ix_users_name` (`name`)",
            ]
        );
    }

    #[test]
    fn retyping_an_inline_primary_key_keeps_the_key() {
        let source = Table::new("users", "InnoDB")
            .with_item(TableItem::column("id", "`id` BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY"));
        let dest = Table::new("users", "InnoDB")
            .with_item(TableItem::column("id", "`id` INT NOT NULL AUTO_INCREMENT PRIMARY KEY"));

        assert_eq!(
            source.make_modify_operations(&dest).unwrap(),
            vec!["ALTER TABLE users MODIFY COLUMN `id` BIGINT NOT NULL AUTO_INCREMENT"]
        );
        assert_eq!(
            dest.make_modify_operations(&source).unwrap(),
            vec!["ALTER TABLE users MODIFY COLUMN `id` INT NOT NULL AUTO_INCREMENT"]
        );
    }

    #[test]
    fn promoting_a_column_to_primary_key_declares_it() {
        let source = Table::new("tags", "InnoDB")
            .with_item(TableItem::column("slug", "`slug` VARCHAR(64) NOT NULL PRIMARY KEY"));
        let dest = Table::new("tags", "InnoDB").with_item(TableItem::column("slug", "`slug` VARCHAR(64) NOT NULL"));

        assert_eq!(
            source.make_modify_operations(&dest).unwrap(),
            vec!["ALTER TABLE tags MODIFY COLUMN `slug` VARCHAR(64) NOT NULL PRIMARY KEY"]
        );
    }

    #[test]
    fn create_operations_keep_separators_inside_literals() {
        let table = Table::new("notes", "InnoDB")
            .with_item(TableItem::column("sep", "`sep` VARCHAR(10) NOT NULL DEFAULT 'a;b'"))
            .with_item(TableItem::index("ix_notes_sep", "ALTER TABLE notes ADD INDEX `ix_notes_sep` (`sep`);"));

        assert_eq!(
            table.make_create_operations(),
            vec![
                "CREATE TABLE notes ( `sep` VARCHAR(10) NOT NULL DEFAULT 'a;b' ) ENGINE=InnoDB COMMENT 'SCHEMA_MIGRATE_ENTITY'",
                "ALTER TABLE notes ADD INDEX `ix_notes_sep` (`sep`)",
            ]
        );
    }

    #[test]
    fn modifying_an_unknown_constraint_is_an_error() {
        let source = Table::new("users", "InnoDB")
            .with_item(TableItem::constraint("chk_age", "ALTER TABLE users ADD CONSTRAINT chk_age CHECK (age > 0)"));
        let dest = Table::new("users", "InnoDB")
            .with_item(TableItem::constraint("chk_age", "ALTER TABLE users ADD CONSTRAINT chk_age CHECK (age > 1)"));

        assert!(matches!(
            source.make_modify_operations(&dest),
            Err(Error::AmbiguousConstraintDropError { .. })
        ));
    }

    #[test]
    fn references_drive_comparison() {
        let posts = posts_dest();
        let comments = comments();
        let users = Table::new("users", "InnoDB");

        assert!(comments.has_reference(&posts));
        assert!(!posts.has_reference(&comments));
        assert_eq!(comments.compare(&posts), Ordering::Greater);
        assert_eq!(posts.compare(&comments), Ordering::Less);
        assert_eq!(posts.compare(&users), Ordering::Equal);
    }
}
