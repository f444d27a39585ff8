//! Daemon configuration, loaded from JSON.

use anyhow::Context;
use kiosk_monitor::MonitorConfig;
use kiosk_whitelist::{PackageId, SystemAllowlist};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Package id the kiosk itself runs under.
pub const DEFAULT_OWN_PACKAGE: &str = "com.kiosk.kioskmode";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub own_package: String,
    /// Extra always-allowed packages, e.g. a vendor launcher.
    pub extra_system_packages: Vec<String>,
    pub database_path: Option<PathBuf>,
    pub monitor: MonitorConfig,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            own_package: DEFAULT_OWN_PACKAGE.to_string(),
            extra_system_packages: Vec::new(),
            database_path: None,
            monitor: MonitorConfig::default(),
        }
    }
}

impl DaemonConfig {
    /// Load from `path`, or from the default location when `None`.
    ///
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => default_config_path(),
        };

        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("invalid config {}", path.display()))?;
        config.validate()?;

        tracing::info!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.own_package.trim().is_empty() {
            anyhow::bail!("own_package must not be empty");
        }
        self.monitor.validate().context("invalid monitor settings")?;
        Ok(())
    }

    pub fn system_allowlist(&self) -> SystemAllowlist {
        SystemAllowlist::new(PackageId::from(self.own_package.as_str()))
            .with_extra(self.extra_system_packages.iter().map(String::as_str))
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path.clone().unwrap_or_else(default_database_path)
    }
}

/// Platform-specific paths:
/// - macOS: ~/Library/Application Support/kiosk/config.json
/// - Linux: ~/.config/kiosk/config.json
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("kiosk")
        .join("config.json")
}

pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("kiosk")
        .join("whitelist.db")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = DaemonConfig::load(Some(&dir.path().join("absent.json"))).unwrap();
        assert_eq!(config, DaemonConfig::default());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"own_package": "org.example.kiosk", "monitor": {"poll_interval_ms": 400}}"#,
        )
        .unwrap();

        let config = DaemonConfig::load(Some(&path)).unwrap();
        assert_eq!(config.own_package, "org.example.kiosk");
        assert_eq!(config.monitor.poll_interval_ms, 400);
        assert_eq!(config.monitor.debounce_window_ms, 2000);
        assert!(config
            .system_allowlist()
            .contains(&PackageId::from("org.example.kiosk")));
    }

    #[test]
    fn test_rejects_invalid_monitor_settings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"monitor": {"poll_interval_ms": 900}}"#).unwrap();

        assert!(DaemonConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn test_rejects_malformed_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(DaemonConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn test_extra_system_packages() {
        let config = DaemonConfig {
            extra_system_packages: vec!["com.vendor.launcher".into()],
            ..Default::default()
        };
        let allowlist = config.system_allowlist();
        assert!(allowlist.contains(&PackageId::from("com.vendor.launcher")));
        assert!(allowlist.contains(&PackageId::from(DEFAULT_OWN_PACKAGE)));
    }
}
