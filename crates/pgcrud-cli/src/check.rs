use crate::cli::GlobalArgs;
use crate::config::ProjectConfig;
use anyhow::Context;
use pgcrud::Pool;

/// Open a pool (which runs the liveness ping), report the server version and close it.
pub async fn run(global: &GlobalArgs) -> anyhow::Result<()> {
    let cfg = ProjectConfig::load_or_default(&global.config)?;
    let db = &cfg.file.database.config;
    let dsn = cfg.file.dsn(global.database_url.as_deref())?;

    let pool = Pool::connect_with(&dsn, db.max_connections)
        .await
        .context("database check failed")?;

    let version = pool.query("SHOW server_version", &[]).await;
    pool.close();

    let version: String = version?
        .into_rows()
        .first()
        .map(|row| row.try_get::<_, String>(0))
        .transpose()?
        .unwrap_or_default();

    tracing::info!(server_version = %version, "database reachable");
    println!("ok: database reachable (PostgreSQL {version})");
    Ok(())
}
