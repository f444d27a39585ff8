mod cli;
mod commands;
mod config;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::config::DaemonConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,kiosk=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = DaemonConfig::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.database_path = Some(db);
    }

    match cli.command {
        Command::Run => commands::run(&config).await,
        Command::Allow(args) => commands::allow(&config, &args.packages),
        Command::Revoke(args) => commands::revoke(&config, &args.packages),
        Command::List(args) => commands::list(&config, args.all),
        Command::Clear => commands::clear(&config),
        Command::Config => commands::print_config(&config),
    }
}
