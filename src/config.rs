//! Runtime settings: built-in defaults, an optional JSON file, and environment overrides.

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use directories::BaseDirs;
use serde::Deserialize;

use crate::models::{EntityKind, KindConfig};

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".school-admin";
/// Optional JSON configuration file stored inside the data directory.
const CONFIG_FILE_NAME: &str = "config.json";
/// Environment variable that overrides `api_base_url`.
pub const API_URL_ENV: &str = "SCHOOL_ADMIN_API_URL";

/// Runtime settings. Every field has a default, so a config file only needs
/// to list what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub login_delay_ms: u64,
    pub username: String,
    pub password: String,
    pub students: KindConfig,
    pub teachers: KindConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000".to_string(),
            request_timeout_secs: 10,
            login_delay_ms: 1000,
            username: "admin".to_string(),
            password: "password".to_string(),
            students: EntityKind::Student.default_config(),
            teachers: EntityKind::Teacher.default_config(),
        }
    }
}

impl AppConfig {
    /// Read `~/.school-admin/config.json` when it exists, fall back to the
    /// defaults otherwise, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = config_path()?;
        let mut config = if path.exists() {
            Self::from_path(&path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(API_URL_ENV).filter(|url| !url.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
    }

    /// Reject category sets that would break the record invariants.
    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.trim().is_empty() {
            bail!("api_base_url must not be empty");
        }
        for (expected, kind) in [
            (EntityKind::Student, &self.students),
            (EntityKind::Teacher, &self.teachers),
        ] {
            if kind.kind != expected {
                bail!(
                    "configuration for {} declares kind {:?}",
                    kind.plural,
                    kind.kind
                );
            }
            if kind.category_field.trim().is_empty() {
                bail!("{} need a category field name", kind.plural);
            }
            if kind.categories.is_empty() {
                bail!("{} need at least one {}", kind.plural, kind.category_field);
            }
            let mut seen = HashSet::new();
            for category in &kind.categories {
                if category.trim().is_empty() {
                    bail!("{} has an empty {} value", kind.plural, kind.category_field);
                }
                if !seen.insert(category.as_str()) {
                    return Err(anyhow!(
                        "{} lists {} '{category}' twice",
                        kind.plural,
                        kind.category_field
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn kind(&self, kind: EntityKind) -> &KindConfig {
        match kind {
            EntityKind::Student => &self.students,
            EntityKind::Teacher => &self.teachers,
        }
    }

    pub fn login_delay(&self) -> Duration {
        Duration::from_millis(self.login_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Resolve the absolute path to the config file inside the user's home.
pub fn config_path() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs
        .home_dir()
        .join(DATA_DIR_NAME)
        .join(CONFIG_FILE_NAME))
}
