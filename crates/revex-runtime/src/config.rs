use anyhow::{Context, Result, anyhow};
use chrono::Duration;
use revex_source::ChunkerConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Resolve the workspace data directory path based on priority:
/// 1. Explicit path (with tilde expansion)
/// 2. REVEX_PATH environment variable (with tilde expansion)
/// 3. XDG data directory
/// 4. ~/.revex (fallback for systems without XDG)
pub fn resolve_workspace_path(explicit_path: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(expand_tilde(path));
    }

    if let Ok(env_path) = std::env::var("REVEX_PATH") {
        return Ok(expand_tilde(&env_path));
    }

    if let Some(data_dir) = dirs::data_dir() {
        return Ok(data_dir.join("revex"));
    }

    if let Some(home) = std::env::var_os("HOME") {
        return Ok(PathBuf::from(home).join(".revex"));
    }

    Err(anyhow!(
        "Could not determine workspace path: no HOME directory or XDG data directory found"
    ))
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return PathBuf::from(home).join(stripped);
    }
    PathBuf::from(path)
}

/// Chunker tuning as it appears in the config file. Durations are whole
/// days here; the chunker itself is not limited to day granularity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkerSettings {
    pub initial_window_days: i64,
    pub window_growth_days: i64,
    pub growth_ceiling_days: i64,
    pub window_floor_days: i64,
    pub max_items_per_query: usize,
}

impl Default for ChunkerSettings {
    fn default() -> Self {
        Self {
            initial_window_days: 120,
            window_growth_days: 1,
            growth_ceiling_days: 30,
            window_floor_days: 1,
            max_items_per_query: 20_000,
        }
    }
}

impl ChunkerSettings {
    pub fn to_chunker_config(&self) -> ChunkerConfig {
        ChunkerConfig {
            initial_window: Duration::days(self.initial_window_days),
            window_growth: Duration::days(self.window_growth_days),
            growth_ceiling: Duration::days(self.growth_ceiling_days),
            window_floor: Duration::days(self.window_floor_days),
            max_items_per_query: self.max_items_per_query,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,
    #[serde(default)]
    pub chunker: ChunkerSettings,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::default_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(resolve_workspace_path(None)?.join("config.toml"))
    }

    /// Storage root: explicit config value, or `export` under the
    /// workspace directory.
    pub fn resolve_storage_dir(&self) -> Result<PathBuf> {
        match &self.storage_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(resolve_workspace_path(None)?.join("export")),
        }
    }
}
