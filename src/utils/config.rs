//! Configuration for Oak
//!
//! Oak can be configured via:
//! - `oak.toml` in the current directory (or `--config <path>`)
//! - Environment variables (a `.env` file is honoured)
//! - Command line arguments
//!
//! Later sources override earlier ones. Every field has a default, so an absent
//! file is not an error; an unreadable or malformed one is.

use crate::types::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Default data source
pub const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OakConfig {
    pub data: DataConfig,
    pub cache: CacheConfig,
    pub analysis: AnalysisConfig,
    pub orchestrator: OrchestratorConfig,
    pub narrator: NarratorConfig,
    pub logging: LoggingConfig,
}

/// HTTP data source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Base URL without trailing slash
    pub base_url: String,

    /// Attempts per request before giving up (at least 1)
    pub max_retries: u32,

    /// Per-request timeout (seconds)
    pub timeout_secs: u64,

    /// Pause between attempts (milliseconds, 0 = none)
    pub retry_delay_ms: u64,

    /// Bearer credential sent as `Authorization: Bearer <token>`
    pub api_token: Option<String>,

    /// Refuse to start without `api_token`
    pub require_credential: bool,

    pub user_agent: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_retries: 3,
            timeout_secs: 10,
            retry_delay_ms: 0,
            api_token: None,
            require_credential: false,
            user_agent: format!("oak/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Entity cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether the cache is enabled
    pub enabled: bool,

    /// Persist entries to `directory`
    pub persist: bool,

    /// Cache directory for the persisted store
    pub directory: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            persist: true,
            directory: PathBuf::from("data/cache"),
        }
    }
}

/// Category analysis settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Maximum entities fetched in detail per category
    pub sample_bound: usize,

    /// Concurrent detail fetches (1 = sequential)
    pub fetch_concurrency: usize,

    /// Optional TOML file replacing the built-in adjacency table
    pub adjacency_file: Option<PathBuf>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_bound: 10,
            fetch_concurrency: 1,
            adjacency_file: None,
        }
    }
}

/// Turn limits for the research loop
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub max_rounds: usize,
    pub max_no_progress: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_rounds: 20,
            max_no_progress: 10,
        }
    }
}

/// Optional language-model narrator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NarratorConfig {
    pub enabled: bool,
    /// Ollama base URL
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
}

impl Default for NarratorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            temperature: 0.1,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "oak=info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl OakConfig {
    /// Load configuration from file, then apply environment overrides.
    ///
    /// With `path == None`, `oak.toml` in the working directory is used if it exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let config_path = path.map(Path::to_path_buf).or_else(|| {
            let oak_toml = PathBuf::from("oak.toml");
            oak_toml.exists().then_some(oak_toml)
        });

        let mut config = match config_path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse a config file without consulting the environment.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
            .map_err(|e| AppError::Configuration(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| AppError::Configuration(format!("Failed to parse: {}", e)))
    }

    /// Apply `OAK_*` / `OLLAMA_URL` environment variables.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// Same as [`apply_env_overrides`](Self::apply_env_overrides) with an injectable lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("OAK_BASE_URL") {
            self.data.base_url = url;
        }
        if let Some(token) = lookup("OAK_API_TOKEN").filter(|t| !t.trim().is_empty()) {
            self.data.api_token = Some(token);
        }
        if let Some(dir) = lookup("OAK_CACHE_DIR") {
            self.cache.directory = PathBuf::from(dir);
        }
        if let Some(url) = lookup("OLLAMA_URL") {
            self.narrator.base_url = url;
        }
    }

    /// Check invariants that would make a run meaningless. Startup-fatal.
    pub fn validate(&self) -> Result<()> {
        if self.data.base_url.trim().is_empty() {
            return Err(AppError::Configuration("data.base_url is empty".to_string()));
        }
        if self.data.require_credential && self.data.api_token.is_none() {
            return Err(AppError::Configuration(
                "data.require_credential is set but no API token was provided (set OAK_API_TOKEN)"
                    .to_string(),
            ));
        }
        if self.orchestrator.max_rounds == 0 {
            return Err(AppError::Configuration(
                "orchestrator.max_rounds must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
