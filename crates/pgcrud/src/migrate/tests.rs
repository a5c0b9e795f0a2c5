use super::*;
use std::fs;

fn write(dir: &Path, name: &str, body: &str) {
    fs::write(dir.join(name), body).expect("write migration");
}

#[test]
fn parse_versioned_names() {
    assert_eq!(
        parse_migration_filename("V1__create_tasks.sql"),
        Some((1, "create_tasks".to_string()))
    );
    assert_eq!(
        parse_migration_filename("V2__add_index.up.sql"),
        Some((2, "add_index".to_string()))
    );
    assert_eq!(
        parse_migration_filename("20240101120000_create_tasks.up.sql"),
        Some((20240101120000, "create_tasks".to_string()))
    );
}

#[test]
fn parse_rejects_other_files() {
    assert_eq!(parse_migration_filename("V1__create_tasks.down.sql"), None);
    assert_eq!(parse_migration_filename("README.md"), None);
    assert_eq!(parse_migration_filename("V__missing_version.sql"), None);
    assert_eq!(parse_migration_filename("Vx__bad.sql"), None);
    assert_eq!(parse_migration_filename("V0__zero.sql"), None);
    assert_eq!(parse_migration_filename("V3__.sql"), None);
    assert_eq!(parse_migration_filename("schema.sql"), None);
}

#[test]
fn dir_source_reads_and_sorts() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "V2__add_status.sql", "ALTER TABLE tasks ADD status TEXT;");
    write(dir.path(), "V1__create_tasks.up.sql", "CREATE TABLE tasks (id BIGSERIAL);");
    write(dir.path(), "V1__create_tasks.down.sql", "DROP TABLE tasks;");
    write(dir.path(), "notes.txt", "ignored");
    fs::create_dir(dir.path().join("V9__nested.sql")).expect("mkdir");

    let migrations = DirSource::new(dir.path()).migrations().expect("migrations");
    let versions: Vec<i64> = migrations.iter().map(|m| m.version).collect();
    assert_eq!(versions, [1, 2]);
    assert_eq!(migrations[0].name, "create_tasks");
    assert_eq!(migrations[0].sql, "CREATE TABLE tasks (id BIGSERIAL);");
}

#[test]
fn dir_source_rejects_duplicate_versions() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "V1__one.sql", "SELECT 1;");
    write(dir.path(), "1_other.up.sql", "SELECT 1;");

    let err = DirSource::new(dir.path()).migrations().unwrap_err();
    assert!(matches!(err, StoreError::MigrationSource(_)));
    assert!(err.to_string().contains("duplicate migration version 1"));
}

#[test]
fn dir_source_reports_missing_dir() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("nope");
    let err = DirSource::new(&missing).migrations().unwrap_err();
    assert!(err.is_migration());
}

#[test]
fn embedded_source_sorts_by_version() {
    static MIGRATIONS: &[EmbeddedMigration] = &[
        EmbeddedMigration::new(3, "third", "SELECT 3;"),
        EmbeddedMigration::new(1, "first", "SELECT 1;"),
    ];
    let migrations = EmbeddedSource::new(MIGRATIONS).migrations().expect("migrations");
    let names: Vec<&str> = migrations.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["first", "third"]);
}

#[test]
fn memory_source_rejects_duplicates() {
    let m = |version, name: &str| Migration {
        version,
        name: name.to_string(),
        sql: String::new(),
    };
    let err = MemorySource::new(vec![m(1, "a"), m(1, "b")])
        .migrations()
        .unwrap_err();
    assert!(err.is_migration());
}

#[test]
fn tracking_table_is_validated() {
    let migrator = Migrator::new(MemorySource::default());
    assert_eq!(migrator.table_name(), "schema_migrations");

    let migrator = migrator.table("app_migrations").expect("valid table");
    assert_eq!(migrator.table_name(), "app_migrations");

    let err = Migrator::new(MemorySource::default())
        .table("migrations; DROP TABLE x")
        .unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn from_config_uses_configured_table() {
    let config = DbConfig {
        migrations_table: "todo_migrations".into(),
        ..DbConfig::default()
    };
    let migrator = Migrator::from_config(MemorySource::default(), &config).expect("migrator");
    assert_eq!(migrator.table_name(), "todo_migrations");
}

#[test]
fn lock_key_depends_on_table() {
    let a = Ident::parse("schema_migrations").expect("ident");
    let b = Ident::parse("other_migrations").expect("ident");
    assert_eq!(lock_key(&a), lock_key(&a.clone()));
    assert_ne!(lock_key(&a), lock_key(&b));
}

#[test]
fn settle_prefers_run_error() {
    let out: StoreResult<usize> = settle(
        Err(StoreError::migration(2, StoreError::not_found("run"))),
        Err(StoreError::MigrationSource("source".into())),
        Err(StoreError::Connection("store".into())),
    );
    let err = out.unwrap_err();
    assert!(matches!(err, StoreError::Migration { version: 2, .. }));
}

#[test]
fn settle_reports_source_close_before_store_close() {
    let out = settle(
        Ok(1usize),
        Err(StoreError::MigrationSource("source".into())),
        Err(StoreError::Connection("store".into())),
    );
    assert!(matches!(out, Err(StoreError::MigrationSource(_))));
}

#[test]
fn settle_reports_store_close_alone() {
    let out = settle(
        Ok(1usize),
        Ok(()),
        Err(StoreError::Connection("store".into())),
    );
    assert!(matches!(out, Err(StoreError::Connection(_))));
}

#[test]
fn settle_passes_through_success() {
    assert_eq!(settle(Ok(3usize), Ok(()), Ok(())).expect("ok"), 3);
}
