use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pgcrud", version, about = "Apply SQL migrations and check PostgreSQL connectivity")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Project config file. Optional when it does not exist.
    #[arg(long, global = true, default_value = "pgcrud.toml")]
    pub config: PathBuf,
    /// Connection string; overrides `[database]` from the config file.
    #[arg(long, global = true, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage schema migrations.
    #[command(subcommand)]
    Migrate(MigrateCommand),
    /// Open a pool and run the liveness ping.
    Check,
}

#[derive(Subcommand, Debug)]
pub enum MigrateCommand {
    /// Apply pending migrations.
    Up(MigrateUpArgs),
    /// Show local, applied and pending migrations.
    Status(MigrateDirArgs),
    /// Create a new migration file.
    New(MigrateNewArgs),
}

#[derive(Args, Debug)]
pub struct MigrateDirArgs {
    /// Migrations directory (default: `migrations.dir` from config, else `migrations`).
    #[arg(long)]
    pub dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct MigrateUpArgs {
    #[command(flatten)]
    pub dir: MigrateDirArgs,
    /// List pending migrations without applying them.
    #[arg(long)]
    pub dry_run: bool,
    /// Apply each migration outside a transaction.
    #[arg(long)]
    pub no_transaction: bool,
}

#[derive(Args, Debug)]
pub struct MigrateNewArgs {
    /// Descriptive name, normalized to snake_case.
    pub name: String,
    #[command(flatten)]
    pub dir: MigrateDirArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_migrate_up_with_flags() {
        let cli = Cli::try_parse_from([
            "pgcrud",
            "--database-url",
            "postgres://localhost/app",
            "migrate",
            "up",
            "--dry-run",
            "--dir",
            "db/migrations",
        ])
        .expect("parse");

        assert_eq!(
            cli.global.database_url.as_deref(),
            Some("postgres://localhost/app")
        );
        match cli.command {
            Command::Migrate(MigrateCommand::Up(args)) => {
                assert!(args.dry_run);
                assert!(!args.no_transaction);
                assert_eq!(args.dir.dir, Some(PathBuf::from("db/migrations")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_migrate_new_name() {
        let cli = Cli::try_parse_from(["pgcrud", "migrate", "new", "create tasks"]).expect("parse");
        match cli.command {
            Command::Migrate(MigrateCommand::New(args)) => assert_eq!(args.name, "create tasks"),
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.global.config, PathBuf::from("pgcrud.toml"));
    }

    #[test]
    fn rejects_unknown_subcommand() {
        assert!(Cli::try_parse_from(["pgcrud", "migrate", "down"]).is_err());
    }
}
