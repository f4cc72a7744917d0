//! Application configuration for KeywordForge.
//!
//! User config lives at `~/.keywordforge/keywordforge.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{KeywordForgeError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "keywordforge.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".keywordforge";

// ---------------------------------------------------------------------------
// Config structs (matching keywordforge.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Embedding provider settings.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Report rendering settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Path to the snapshot database.
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Directory for rendered reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Maximum number of keyword groups per clustering run.
    #[serde(default = "default_max_groups")]
    pub max_groups: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            output_dir: default_output_dir(),
            max_groups: default_max_groups(),
        }
    }
}

fn default_db_path() -> String {
    "~/.keywordforge/keywordforge.db".into()
}
fn default_output_dir() -> String {
    "~/keywordforge-reports".into()
}
fn default_max_groups() -> u32 {
    5
}

/// `[embedding]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider kind: "hash" (local, deterministic) or "http".
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Endpoint for the HTTP provider (OpenAI-style `/embeddings`).
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Embedding model identifier sent to the HTTP provider.
    #[serde(default = "default_model")]
    pub model: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
        }
    }
}

fn default_provider() -> String {
    "hash".into()
}
fn default_endpoint() -> String {
    "http://localhost:8080/v1/embeddings".into()
}
fn default_model() -> String {
    "all-minilm-l6-v2".into()
}
fn default_api_key_env() -> String {
    "KEYWORDFORGE_EMBED_API_KEY".into()
}

/// `[report]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Lines per rendered report page before a page break is emitted.
    #[serde(default = "default_lines_per_page")]
    pub lines_per_page: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            lines_per_page: default_lines_per_page(),
        }
    }
}

fn default_lines_per_page() -> usize {
    54
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.keywordforge/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| KeywordForgeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.keywordforge/keywordforge.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| KeywordForgeError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        KeywordForgeError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| KeywordForgeError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| KeywordForgeError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| KeywordForgeError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the embedding API key env var is set when the HTTP provider
/// is configured. The hash provider needs no key.
pub fn validate_api_key(config: &AppConfig) -> Result<()> {
    if config.embedding.provider != "http" {
        return Ok(());
    }
    let var_name = &config.embedding.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(()),
        _ => Err(KeywordForgeError::config(format!(
            "embedding API key not found. Set the {var_name} environment variable."
        ))),
    }
}

/// Expand a leading `~/` in a configured path to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
