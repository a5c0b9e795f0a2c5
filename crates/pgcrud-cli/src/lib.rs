mod check;
mod cli;
mod config;
mod migrate_cmd;

use clap::Parser;
use std::ffi::OsString;
use tracing_subscriber::EnvFilter;

pub async fn run<I, T>(args: I) -> anyhow::Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = cli::Cli::parse_from(args);
    init_logging();

    match cli.command {
        cli::Command::Migrate(cmd) => migrate_cmd::run(&cli.global, cmd).await,
        cli::Command::Check => check::run(&cli.global).await,
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
