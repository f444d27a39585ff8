use anyhow::Context;
use kiosk_monitor::platform::PlatformProvider;
use kiosk_monitor::{BlockingSurface, KioskMonitor, MonitorCallback, MonitorEvent, RunningTaskSource};
use kiosk_storage::Database;
use kiosk_whitelist::{PackageId, SystemAllowlist, WhitelistEditor, WhitelistStore};
use std::sync::Arc;

use crate::config::DaemonConfig;

fn open_database(config: &DaemonConfig) -> anyhow::Result<Database> {
    open_database_with(config, config.system_allowlist())
}

fn open_database_with(config: &DaemonConfig, system: SystemAllowlist) -> anyhow::Result<Database> {
    let path = config.database_path();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    Database::open(&path, system)
        .with_context(|| format!("failed to open whitelist database {}", path.display()))
}

/// Configured system allowlist plus everything the kiosk must never block on
/// this platform: the surfaces a block redirects to, and the app in front when
/// the daemon starts (the terminal or launcher hosting it).
fn monitor_allowlist(
    config: &DaemonConfig,
    surface: &dyn BlockingSurface,
    tasks: &dyn RunningTaskSource,
) -> SystemAllowlist {
    let mut extra = surface.home_packages();
    match tasks.top_task_package() {
        Ok(Some(host)) => {
            tracing::info!(host = %host, "exempting the app hosting the daemon");
            extra.push(host);
        }
        Ok(None) => {}
        Err(e) => tracing::debug!(error = %e, "could not resolve the hosting app"),
    }
    config.system_allowlist().with_extra(extra)
}

/// Run the monitor until Ctrl-C.
pub async fn run(config: &DaemonConfig) -> anyhow::Result<()> {
    let provider = Arc::new(PlatformProvider::new());
    let system = monitor_allowlist(config, &*provider, &*provider);
    let store = Arc::new(open_database_with(config, system)?);

    let user = store.list_user_allowed()?;
    tracing::info!(user_packages = user.len(), "whitelist loaded");

    // Events go to stdout as JSON lines for whatever UI is watching
    let callback: MonitorCallback = Arc::new(|event: MonitorEvent| {
        match serde_json::to_string(&event) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::warn!(error = %e, "failed to encode monitor event"),
        }
    });

    let mut monitor = KioskMonitor::new(
        config.monitor.clone(),
        provider.clone(),
        provider.clone(),
        provider,
        store,
    )?
    .with_callback(callback);

    monitor.start();
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    tracing::info!("shutdown requested");
    monitor.stop();
    Ok(())
}

pub fn allow(config: &DaemonConfig, packages: &[String]) -> anyhow::Result<()> {
    let db = open_database(config)?;
    for package in packages {
        let id = PackageId::from(package.as_str());
        if db.system().contains(&id) {
            println!("{id} is a system package and always allowed");
            continue;
        }
        db.add(&id)?;
        println!("allowed {id}");
    }
    Ok(())
}

pub fn revoke(config: &DaemonConfig, packages: &[String]) -> anyhow::Result<()> {
    let db = open_database(config)?;
    for package in packages {
        let id = PackageId::from(package.as_str());
        db.remove(&id)?;
        println!("revoked {id}");
    }
    Ok(())
}

pub fn list(config: &DaemonConfig, all: bool) -> anyhow::Result<()> {
    let db = open_database(config)?;
    let packages = if all {
        db.list_allowed()?
    } else {
        db.list_user_allowed()?
    };
    for package in packages {
        println!("{package}");
    }
    Ok(())
}

pub fn clear(config: &DaemonConfig) -> anyhow::Result<()> {
    let db = open_database(config)?;
    db.clear()?;
    println!("user whitelist cleared");
    Ok(())
}

pub fn print_config(config: &DaemonConfig) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    println!("{json}");
    Ok(())
}
