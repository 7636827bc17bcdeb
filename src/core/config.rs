//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Project-local config file, looked up in the working directory
pub const PROJECT_CONFIG_FILE: &str = ".onboardify.yaml";

/// Default number of rows shown by `preview`
const DEFAULT_PREVIEW_ROWS: usize = 20;

/// Onboardify configuration with layered hierarchy
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Identity recorded with each submission
    pub user: Option<String>,

    /// SQLite database submissions are stored in
    pub database: Option<PathBuf>,

    /// Default output format
    pub default_format: Option<String>,

    /// Rows shown by `preview` when --limit is not given
    pub preview_rows: Option<usize>,

    /// Log filter directive (e.g. "debug", "onboardify=trace")
    pub log: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::load_from(Self::global_config_path().as_deref(), &cwd)
    }

    /// Load with an explicit global config path and project directory
    pub fn load_from(global_path: Option<&Path>, project_dir: &Path) -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/onboardify/config.yaml)
        if let Some(global) = global_path.and_then(Self::read_layer) {
            config.merge(global);
        }

        // 3. Project config (./.onboardify.yaml)
        if let Some(project) = Self::read_layer(&project_dir.join(PROJECT_CONFIG_FILE)) {
            config.merge(project);
        }

        // 4. Environment variables
        if let Ok(user) = std::env::var("ONBOARDIFY_USER") {
            config.user = Some(user);
        }
        if let Ok(database) = std::env::var("ONBOARDIFY_DATABASE") {
            config.database = Some(PathBuf::from(database));
        }
        if let Ok(log) = std::env::var("ONBOARDIFY_LOG") {
            config.log = Some(log);
        }

        config
    }

    /// Parse one config layer; unreadable or malformed files are skipped
    fn read_layer(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_yml::from_str::<Config>(&contents) {
            Ok(layer) => Some(layer),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config");
                None
            }
        }
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "onboardify")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.user.is_some() {
            self.user = other.user;
        }
        if other.database.is_some() {
            self.database = other.database;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
        if other.preview_rows.is_some() {
            self.preview_rows = other.preview_rows;
        }
        if other.log.is_some() {
            self.log = other.log;
        }
    }

    /// Get the submitting user, falling back to git config or username
    pub fn user(&self) -> String {
        if let Some(ref user) = self.user {
            return user.clone();
        }

        // Try git config
        if let Ok(output) = std::process::Command::new("git")
            .args(["config", "user.email"])
            .output()
        {
            if output.status.success() {
                let email = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !email.is_empty() {
                    return email;
                }
            }
        }

        // Fall back to username
        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string())
    }

    /// Database path, defaulting to the user data directory
    pub fn database(&self) -> PathBuf {
        self.database.clone().unwrap_or_else(|| {
            directories::ProjectDirs::from("", "", "onboardify")
                .map(|dirs| dirs.data_dir().join("vehicle_data.db"))
                .unwrap_or_else(|| PathBuf::from("vehicle_data.db"))
        })
    }

    pub fn preview_rows(&self) -> usize {
        self.preview_rows.unwrap_or(DEFAULT_PREVIEW_ROWS)
    }
}
