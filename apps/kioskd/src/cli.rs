use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Kiosk-mode daemon: keeps the device on whitelisted apps.
#[derive(Parser, Debug)]
#[command(name = "kioskd", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the JSON config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the whitelist database (overrides the config file).
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the foreground monitor until interrupted.
    Run,

    /// Add packages to the user whitelist.
    Allow(PackagesArg),

    /// Remove packages from the user whitelist.
    Revoke(PackagesArg),

    /// Print the whitelist.
    List(ListArgs),

    /// Remove every user-selected package.
    Clear,

    /// Print the effective configuration as JSON.
    Config,
}

#[derive(clap::Args, Debug)]
pub struct PackagesArg {
    /// Package identifiers, matched exactly.
    #[arg(required = true)]
    pub packages: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Include the always-allowed system packages.
    #[arg(long)]
    pub all: bool,
}
