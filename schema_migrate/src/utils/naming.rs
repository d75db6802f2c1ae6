//! Naming utilities for schema_migrate
//!
//! This module provides utilities for naming conventions and transformations.

use inflector::Inflector;

/// Format a name according to a pattern with placeholders
pub fn format_name(pattern: &str, replacements: &[(&str, &str)]) -> String {
    let mut result = pattern.to_string();

    for (placeholder, value) in replacements {
        result = result.replace(&format!("{{{}}}", placeholder), value);
    }

    result
}

/// Get table name from a model name: snake_case, optionally pluralized
pub fn get_table_name(model_name: &str, pluralize: bool) -> String {
    let name = model_name.to_snake_case();

    if pluralize {
        pluralize_last_word(&name)
    } else {
        name
    }
}

/// Pluralize the last word of a snake_case name
fn pluralize_last_word(name: &str) -> String {
    match name.rsplit_once('_') {
        Some((head, last)) => format!("{}_{}", head, pluralize(last)),
        None => pluralize(name),
    }
}

/// Convert a singular name to plural
pub fn pluralize(name: &str) -> String {
    // Handle special cases first
    match name.to_lowercase().as_str() {
        "person" => "people".to_string(),
        "child" => "children".to_string(),
        "man" => "men".to_string(),
        "woman" => "women".to_string(),
        "mouse" => "mice".to_string(),
        _ => name.to_plural(),
    }
}

/// Get index name from table and columns according to pattern
pub fn get_index_name(pattern: &str, table_name: &str, columns: &[String]) -> String {
    let columns_str = columns.join("_");

    format_name(pattern, &[("table", table_name), ("columns", &columns_str)])
}

/// Get foreign key constraint name according to pattern
pub fn get_foreign_key_name(pattern: &str, table_name: &str, column_name: &str) -> String {
    format_name(pattern, &[("table", table_name), ("column", column_name)])
}

/// Class name of a migration generated at `timestamp` (`%Y%m%d%H%M%S`)
pub fn get_migration_name(timestamp: &str) -> String {
    format!("Migration{}", timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[test]
    fn test_format_name() {
        assert_eq!(
            format_name("ix_{table}_{columns}", &[("table", "users"), ("columns", "email")]),
            "ix_users_email"
        );
        assert_eq!(format_name("plain", &[("table", "users")]), "plain");
    }

    #[rstest]
    #[case("User", true, "users")]
    #[case("UserProfile", true, "user_profiles")]
    #[case("UserProfile", false, "user_profile")]
    #[case("Person", true, "people")]
    #[case("BlogCategory", true, "blog_categories")]
    fn test_table_name(#[case] model: &str, #[case] pluralize: bool, #[case] expected: &str) {
        assert_eq!(get_table_name(model, pluralize), expected);
    }

    #[test]
    fn test_index_name() {
        assert_eq!(
            get_index_name("ix_{table}_{columns}", "users", &["email".to_string()]),
            "ix_users_email"
        );

        assert_eq!(
            get_index_name(
                "idx_{table}_{columns}",
                "orders",
                &["customer_id".to_string(), "order_date".to_string()]
            ),
            "idx_orders_customer_id_order_date"
        );
    }

    #[test]
    fn test_foreign_key_name() {
        assert_eq!(
            get_foreign_key_name("fk_{table}_{column}", "posts", "author_id"),
            "fk_posts_author_id"
        );

        assert_eq!(
            get_foreign_key_name("fk_{column}_to_{table}", "users", "created_by"),
            "fk_created_by_to_users"
        );
    }

    #[test]
    fn test_migration_name() {
        assert_eq!(get_migration_name("20240102030405"), "Migration20240102030405");
    }
}
