use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub catalog: CatalogConfig,

    pub rescan: RescanConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Path of the JSON drama database.
    pub database_path: String,

    pub log_level: String,

    /// Emit logs as JSON lines instead of human readable text.
    pub log_json: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "drama-database.json".to_string(),
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: String,

    /// Sent as the `mdl-api-key` header on every request.
    pub api_key: String,

    pub user_agent: String,

    /// Request timeout in seconds (default: 30)
    pub request_timeout_seconds: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.mydramalist.com/v1".to_string(),
            api_key: String::new(),
            user_agent: format!("Dramarr/{}", env!("CARGO_PKG_VERSION")),
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RescanConfig {
    /// File holding the last processed id.
    pub cursor_path: String,

    /// Number of ids visited per rescan run.
    pub window: u64,

    /// Id to begin from when no cursor has been written yet.
    pub start_id: u64,
}

impl Default for RescanConfig {
    fn default() -> Self {
        Self {
            cursor_path: "step.txt".to_string(),
            window: 1000,
            start_id: 1,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!(path = %path.display(), "Loading dramarr config");
                return Self::load_from_path(path);
            }
        }

        info!("No dramarr config found; using the default catalog endpoint and drama database path");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read dramarr config {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid TOML in dramarr config {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!(path = %path.display(), "Wrote dramarr config");
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(Self::default_config_path());

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("dramarr").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".dramarr").join("config.toml"));
        }

        paths
    }

    #[must_use]
    pub fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    /// Writes the default config to `path` unless a file already exists there.
    pub fn create_default_if_missing(path: &Path) -> Result<bool> {
        if path.exists() {
            Ok(false)
        } else {
            Self::default().save_to_path(path)?;
            info!(path = %path.display(), "Created default dramarr config");
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.general.database_path.trim().is_empty() {
            anyhow::bail!("Database path cannot be empty");
        }

        url::Url::parse(&self.catalog.base_url)
            .with_context(|| format!("Invalid catalog base URL: {}", self.catalog.base_url))?;

        if self.catalog.request_timeout_seconds == 0 {
            anyhow::bail!("Catalog request timeout must be > 0");
        }

        if self.rescan.window == 0 {
            anyhow::bail!("Rescan window must be > 0");
        }

        Ok(())
    }
}
