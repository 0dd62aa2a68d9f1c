use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{info, warn};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/umpire.db?mode=rwc";
const DEFAULT_LOCAL_STORE_PATH: &str = "data/local_store.json";
const DEFAULT_SESSION_HOURS: i64 = 12;

pub fn load_environment() -> Result<(), Box<dyn std::error::Error>> {
    let is_production =
        dotenvy::var("ROCKET_PROFILE").unwrap_or("development".to_string()) == "production";

    let env_files = if is_production {
        vec!["config/common.env", "config/prod.env", ".secrets.env"]
    } else {
        vec!["config/common.env", "config/dev.env", ".secrets.env"]
    };

    for env_file in env_files {
        load_env_file(env_file)?;
    }

    Ok(())
}

fn load_env_file(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !Path::new(path).exists() {
        warn!("Warning: Environment file {} not found, skipping", path);
        return Ok(());
    }

    dotenvy::from_filename_override(path)?;
    info!("Loaded environment from: {}", path);
    Ok(())
}

/// Settings read from the process environment after the env files are loaded.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub local_store_path: PathBuf,
    /// Seeds the master admin account at startup when present.
    pub master_admin_password: Option<String>,
    pub session_hours: i64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            dotenvy::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let local_store_path = dotenvy::var("LOCAL_STORE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_LOCAL_STORE_PATH));

        let master_admin_password = dotenvy::var("MASTER_ADMIN_PASSWORD")
            .ok()
            .filter(|p| !p.trim().is_empty());

        let session_hours = match dotenvy::var("SESSION_HOURS") {
            Ok(raw) => raw
                .trim()
                .parse::<i64>()
                .with_context(|| format!("SESSION_HOURS must be a whole number, got '{}'", raw))?,
            Err(_) => DEFAULT_SESSION_HOURS,
        };

        anyhow::ensure!(session_hours > 0, "SESSION_HOURS must be positive");

        Ok(Self {
            database_url,
            local_store_path,
            master_admin_password,
            session_hours,
        })
    }

    /// Creates the directory holding the SQLite file for `sqlite://` file URLs.
    pub fn ensure_data_dirs(&self) -> anyhow::Result<()> {
        let mut dirs = Vec::new();

        if let Some(path) = self.database_url.strip_prefix("sqlite://") {
            let file = path.split('?').next().unwrap_or_default();
            if !file.is_empty() && !file.starts_with(':') {
                dirs.extend(Path::new(file).parent().map(Path::to_path_buf));
            }
        }
        dirs.extend(self.local_store_path.parent().map(Path::to_path_buf));

        for dir in dirs.into_iter().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create directory {}", dir.display()))?;
        }

        Ok(())
    }
}

#[cfg(test)]
pub fn load_test_environment() -> Result<(), Box<dyn std::error::Error>> {
    let test_env_files = vec!["config/common.env", ".secrets.env"];

    for env_file in test_env_files {
        load_env_file(env_file)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn config_reads_environment() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("sqlite::memory:")),
                ("LOCAL_STORE_PATH", Some("/tmp/umpire/store.json")),
                ("MASTER_ADMIN_PASSWORD", Some("hunter22")),
                ("SESSION_HOURS", Some("3")),
            ],
            || {
                let config = AppConfig::from_env().unwrap();
                assert_eq!(config.database_url, "sqlite::memory:");
                assert_eq!(
                    config.local_store_path,
                    PathBuf::from("/tmp/umpire/store.json")
                );
                assert_eq!(config.master_admin_password.as_deref(), Some("hunter22"));
                assert_eq!(config.session_hours, 3);
            },
        );
    }

    #[test]
    #[serial]
    fn config_falls_back_to_defaults() {
        temp_env::with_vars_unset(
            [
                "DATABASE_URL",
                "LOCAL_STORE_PATH",
                "MASTER_ADMIN_PASSWORD",
                "SESSION_HOURS",
            ],
            || {
                let config = AppConfig::from_env().unwrap();
                assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
                assert_eq!(config.session_hours, DEFAULT_SESSION_HOURS);
                assert!(config.master_admin_password.is_none());
            },
        );
    }

    #[test]
    #[serial]
    fn invalid_session_hours_are_rejected() {
        temp_env::with_var("SESSION_HOURS", Some("soon"), || {
            assert!(AppConfig::from_env().is_err());
        });

        temp_env::with_var("SESSION_HOURS", Some("0"), || {
            assert!(AppConfig::from_env().is_err());
        });
    }
}
