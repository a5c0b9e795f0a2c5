use crate::cli::{GlobalArgs, MigrateCommand, MigrateDirArgs, MigrateNewArgs, MigrateUpArgs};
use crate::config::ProjectConfig;
use anyhow::Context;
use chrono::Utc;
use heck::ToSnakeCase;
use pgcrud::Pool;
use pgcrud::migrate::{DirSource, MigrationSource, Migrator};
use std::collections::HashSet;
use std::path::Path;

pub async fn run(global: &GlobalArgs, cmd: MigrateCommand) -> anyhow::Result<()> {
    let cfg = ProjectConfig::load_or_default(&global.config)?;
    match cmd {
        MigrateCommand::Up(args) => run_up(global, &cfg, args).await,
        MigrateCommand::Status(args) => run_status(global, &cfg, args).await,
        MigrateCommand::New(args) => run_new(&cfg, args),
    }
}

fn normalize_name(name: &str) -> anyhow::Result<String> {
    let mut s = name
        .to_snake_case()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect::<String>();
    while s.contains("__") {
        s = s.replace("__", "_");
    }
    let s = s.trim_matches('_').to_string();
    if s.is_empty() {
        anyhow::bail!("migration name becomes empty after normalization");
    }
    Ok(s)
}

fn current_version() -> anyhow::Result<i64> {
    Utc::now()
        .format("%Y%m%d%H%M%S")
        .to_string()
        .parse::<i64>()
        .context("failed to create migration version")
}

fn existing_versions(dir: &Path) -> anyhow::Result<HashSet<i64>> {
    if !dir.exists() {
        return Ok(HashSet::new());
    }
    let migrations = DirSource::new(dir).migrations()?;
    Ok(migrations.into_iter().map(|m| m.version).collect())
}

fn migrator(
    cfg: &ProjectConfig,
    args: &MigrateDirArgs,
) -> anyhow::Result<Migrator<DirSource>> {
    let dir = cfg.migrations_dir(args.dir.as_deref());
    let migrator = Migrator::from_config(DirSource::new(dir), &cfg.file.database.config)?
        .atomic(cfg.file.migrations.transactional);
    Ok(migrator)
}

async fn connect(global: &GlobalArgs, cfg: &ProjectConfig) -> anyhow::Result<Pool> {
    let db = &cfg.file.database.config;
    let dsn = cfg.file.dsn(global.database_url.as_deref())?;
    Pool::connect_with(&dsn, db.max_connections)
        .await
        .context("failed to connect to database")
}

fn create_migration_file(dir: &Path, name: &str) -> anyhow::Result<std::path::PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let name = normalize_name(name)?;
    let used_versions = existing_versions(dir)?;

    let mut version = current_version()?;
    while used_versions.contains(&version) {
        version += 1;
    }

    let base = format!("V{version}__{name}");
    let path = dir.join(format!("{base}.sql"));
    if path.exists() {
        anyhow::bail!("refusing to overwrite existing file: {}", path.display());
    }

    let template = format!(
        "-- Migration: {base}\n-- Created at: {} UTC\n\n-- Write your migration here.\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S")
    );
    std::fs::write(&path, template).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

fn run_new(cfg: &ProjectConfig, args: MigrateNewArgs) -> anyhow::Result<()> {
    let dir = cfg.migrations_dir(args.dir.dir.as_deref());
    let path = create_migration_file(&dir, &args.name)?;
    println!("created {}", path.display());
    Ok(())
}

async fn run_up(global: &GlobalArgs, cfg: &ProjectConfig, args: MigrateUpArgs) -> anyhow::Result<()> {
    let mut migrator = migrator(cfg, &args.dir)?;
    if args.no_transaction {
        migrator = migrator.atomic(false);
    }
    let pool = connect(global, cfg).await?;

    let result = if args.dry_run {
        dry_run(&migrator, &pool).await
    } else {
        migrator
            .up(&pool)
            .await
            .map(|applied| println!("applied {applied} migration(s)"))
            .context("migration failed")
    };

    pool.close();
    result
}

async fn dry_run(migrator: &Migrator<DirSource>, pool: &Pool) -> anyhow::Result<()> {
    let st = migrator.status(pool).await?;
    if st.pending.is_empty() {
        println!("no pending migrations");
    } else {
        println!("pending migrations (dry-run):");
        for m in st.pending {
            println!("  V{}__{}", m.version, m.name);
        }
    }
    Ok(())
}

async fn run_status(
    global: &GlobalArgs,
    cfg: &ProjectConfig,
    args: MigrateDirArgs,
) -> anyhow::Result<()> {
    let migrator = migrator(cfg, &args)?;
    let pool = connect(global, cfg).await?;
    let st = migrator.status(&pool).await;
    pool.close();
    let st = st?;

    println!("tracking table: {}", migrator.table_name());
    println!("local:   {}", st.local.len());
    println!("applied: {}", st.applied.len());
    println!("pending: {}", st.pending.len());

    if !st.pending.is_empty() {
        println!("\npending:");
        for m in st.pending {
            println!("  V{}__{}", m.version, m.name);
        }
    }

    if !st.missing_local.is_empty() {
        println!("\nmissing local files (applied in DB, not found on disk):");
        for m in st.missing_local {
            println!(
                "  V{} (applied {})",
                m.version,
                m.applied_at.format("%Y-%m-%d %H:%M:%S")
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pgcrud::migrate::parse_migration_filename;

    #[test]
    fn normalize_name_snake_cases() {
        assert_eq!(normalize_name("Create Tasks").unwrap(), "create_tasks");
        assert_eq!(normalize_name("add-status--column").unwrap(), "add_status_column");
        assert!(normalize_name("--").is_err());
    }

    #[test]
    fn new_file_is_picked_up_by_dir_source() {
        let dir = tempfile::tempdir().expect("tempdir");
        let first = create_migration_file(dir.path(), "create tasks").expect("first");
        let second = create_migration_file(dir.path(), "add status").expect("second");

        let name = first.file_name().and_then(|s| s.to_str()).expect("utf8");
        let (v1, n1) = parse_migration_filename(name).expect("parsable name");
        assert_eq!(n1, "create_tasks");

        let migrations = DirSource::new(dir.path()).migrations().expect("migrations");
        assert_eq!(migrations.len(), 2);
        assert_eq!(migrations[0].version, v1);
        assert!(migrations[1].version > v1);
        assert!(second.exists());
    }
}
