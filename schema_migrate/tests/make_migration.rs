use pretty_assertions::assert_eq;
use schema_migrate::migrations::{make_migration, MakeMigration, MigrationOutcome, MigrationWriter, DEFAULT_TEMPLATE};
use schema_migrate::schema::{ForeignKeyDefinition, Table, TableItem, TableMap};
use schema_migrate::{DefinitionSource, Error, ModelRegistry, SchemaModel};
use tempfile::tempdir;

#[allow(dead_code)]
#[derive(SchemaModel)]
struct User {
    #[schema_field(primary_key, auto_increment)]
    id: i32,
    #[schema_field(unique)]
    email: String,
    nickname: Option<String>,
    #[schema_field(skip)]
    session_token: Vec<u8>,
}

#[allow(dead_code)]
#[derive(SchemaModel)]
#[schema_model(table = "posts", engine = "InnoDB")]
struct Post {
    #[schema_field(primary_key, auto_increment)]
    id: i32,
    #[schema_field(foreign_key = "users.id", on_delete = "CASCADE")]
    user_id: i32,
    #[schema_field(db_type = "varchar(20)", default = "draft")]
    status: String,
    #[schema_field(index)]
    published_at: Option<chrono::NaiveDateTime>,
}

#[allow(dead_code)]
#[derive(SchemaModel)]
#[schema_model(connection = "reporting")]
struct DailyReport {
    #[schema_field(primary_key)]
    day: chrono::NaiveDate,
    r#type: String,
}

fn registry() -> ModelRegistry {
    let mut registry = ModelRegistry::new();
    // Registered child first; ordering puts users before posts
    registry.register::<Post>().register::<User>().register::<DailyReport>();
    registry
}

#[test]
fn derive_describes_fields() {
    assert_eq!(User::model_name(), "User");
    assert_eq!(User::table_name(), None);
    assert_eq!(User::connection(), "default");
    assert_eq!(Post::table_name(), Some("posts"));
    assert_eq!(Post::engine(), Some("InnoDB"));
    assert_eq!(DailyReport::connection(), "reporting");

    let fields = User::field_definitions();
    let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["id", "email", "nickname"]);
    assert!(fields[0].primary_key && fields[0].auto_increment);
    assert!(fields[1].unique);
    assert!(fields[2].nullable);
    assert_eq!(fields[2].rust_type, "Option<String>");

    let post_fields = Post::field_definitions();
    let foreign_key = post_fields[1].foreign_key.as_ref().expect("foreign key");
    assert_eq!(foreign_key.ref_table, "users");
    assert_eq!(foreign_key.ref_column, "id");
    assert_eq!(foreign_key.on_delete.as_deref(), Some("CASCADE"));
    assert_eq!(foreign_key.on_update, None);
    assert_eq!(
        Some(foreign_key.clone()),
        ForeignKeyDefinition::parse("users.id").map(|parsed| ForeignKeyDefinition {
            on_delete: Some("CASCADE".to_string()),
            ..parsed
        })
    );
    assert_eq!(post_fields[2].default.as_deref(), Some("draft"));

    assert_eq!(DailyReport::field_definitions()[1].name, "type");
}

#[test]
fn registry_snapshots_per_connection() {
    let registry = registry();

    let tables = registry.snapshots("default").unwrap();
    assert_eq!(tables.keys().collect::<Vec<_>>(), vec!["posts", "users"]);
    assert_eq!(tables["users"].items["nickname"].sql, "`nickname` VARCHAR(255) NULL");

    let reporting = registry.snapshots("reporting").unwrap();
    assert_eq!(reporting.keys().collect::<Vec<_>>(), vec!["daily_reports"]);
    assert_eq!(
        reporting["daily_reports"].items["day"].sql,
        "`day` DATE NOT NULL PRIMARY KEY"
    );
}

#[tokio::test]
async fn creates_diff_migration_against_empty_database() {
    let dir = tempdir().unwrap();
    let writer = MigrationWriter::with_template(dir.path(), DEFAULT_TEMPLATE);
    let request = MakeMigration {
        diff: true,
        ..Default::default()
    };

    let outcome = make_migration(&request, &registry(), &TableMap::new(), &writer)
        .await
        .unwrap();

    let path = match outcome {
        MigrationOutcome::Created(path) => path,
        MigrationOutcome::NoChanges => panic!("expected a migration"),
    };
    assert_eq!(path.parent(), Some(dir.path()));
    assert!(path.file_name().unwrap().to_string_lossy().starts_with("Migration"));

    let contents = std::fs::read_to_string(&path).unwrap();
    let users_at = contents.find("add_sql('CREATE TABLE users (").unwrap();
    let posts_at = contents.find("add_sql('CREATE TABLE posts (").unwrap();
    assert!(users_at < posts_at);
    assert!(contents.contains("DEFAULT \\'draft\\'"));
    assert!(contents.contains(
        "add_sql('ALTER TABLE posts ADD CONSTRAINT `fk_posts_user_id` FOREIGN KEY (`user_id`) REFERENCES `users` (`id`) ON DELETE CASCADE');"
    ));
    assert!(!contents.contains("daily_reports"));

    let down_at = contents.find("down {").unwrap();
    let down = &contents[down_at..];
    assert!(down.contains(
        "add_sql('SET foreign_key_checks = 0;');\n        add_sql('DROP TABLE posts');\n        add_sql('DROP TABLE users');\n        add_sql('SET foreign_key_checks = 1;');"
    ));
}

#[tokio::test]
async fn no_changes_writes_nothing() {
    let dir = tempdir().unwrap();
    let directory = dir.path().join("migrations");
    let writer = MigrationWriter::with_template(&directory, DEFAULT_TEMPLATE);
    let registry = registry();
    let database = registry.snapshots("default").unwrap();

    let request = MakeMigration {
        diff: true,
        ..Default::default()
    };
    let outcome = make_migration(&request, &registry, &database, &writer).await.unwrap();

    assert_eq!(outcome, MigrationOutcome::NoChanges);
    assert!(!directory.exists());
}

#[tokio::test]
async fn empty_migration_ignores_the_database() {
    let dir = tempdir().unwrap();
    let writer = MigrationWriter::with_template(dir.path(), DEFAULT_TEMPLATE);
    let request = MakeMigration {
        connection: "reporting".to_string(),
        ..Default::default()
    };

    let outcome = make_migration(&request, &registry(), &TableMap::new(), &writer)
        .await
        .unwrap();
    let MigrationOutcome::Created(path) = outcome else {
        panic!("expected a migration");
    };

    let contents = std::fs::read_to_string(path).unwrap();
    assert!(contents.contains("-- connection: reporting"));
    assert!(contents.contains("-- this section is auto-generated, please modify it to your needs"));
}

#[tokio::test]
async fn unsafe_changes_abort_unless_forced() {
    let dir = tempdir().unwrap();
    let writer = MigrationWriter::with_template(dir.path(), DEFAULT_TEMPLATE);
    let registry = registry();

    let mut database = registry.snapshots("default").unwrap();
    let users = database.get_mut("users").unwrap();
    users.add_item(TableItem::column("email", "`email` VARCHAR(255) NULL"));

    let request = MakeMigration {
        diff: true,
        ..Default::default()
    };
    let err = make_migration(&request, &registry, &database, &writer)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnsafeNullabilityChangeError { .. }));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

    let forced = MakeMigration {
        force: true,
        ..request
    };
    let outcome = make_migration(&forced, &registry, &database, &writer).await.unwrap();
    let MigrationOutcome::Created(path) = outcome else {
        panic!("expected a migration");
    };
    let contents = std::fs::read_to_string(path).unwrap();
    assert!(contents.contains("add_sql('ALTER TABLE users MODIFY COLUMN `email` VARCHAR(255) NOT NULL');"));
    assert!(contents.contains("add_sql('ALTER TABLE users MODIFY COLUMN `email` VARCHAR(255) NULL');"));
}

#[tokio::test]
async fn filter_limits_tables() {
    let dir = tempdir().unwrap();
    let writer = MigrationWriter::with_template(dir.path(), DEFAULT_TEMPLATE);
    let mut database = TableMap::new();
    database.insert(
        "legacy_audit".to_string(),
        Table::new("legacy_audit", "InnoDB").with_item(TableItem::column("id", "`id` INT NOT NULL")),
    );

    let request = MakeMigration {
        diff: true,
        filter: "legacy_*".to_string(),
        ..Default::default()
    };
    let outcome = make_migration(&request, &registry(), &database, &writer).await.unwrap();
    let MigrationOutcome::Created(path) = outcome else {
        panic!("expected a migration");
    };

    let contents = std::fs::read_to_string(path).unwrap();
    assert!(contents.contains("add_sql('DROP TABLE legacy_audit');"));
    assert!(!contents.contains("CREATE TABLE users"));
}
