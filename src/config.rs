use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SiftConfig {
    pub server: ServerConfig,
    pub retrieval: RetrievalConfig,
    pub scoring: ScoringConfig,
    pub synthesis: SynthesisConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Per-source result limit for the first retrieval pass.
    pub initial_limit: usize,
    /// Hard cap on the per-source limit after refinement doubling.
    pub limit_cap: usize,
    /// Maximum items surviving the merge step.
    pub max_merged_results: usize,
    /// Per-branch retrieval timeout in milliseconds.
    pub branch_timeout_ms: u64,
    /// Seed file with private document chunks.
    pub docs_path: String,
    /// Seed file with relationship graph edges.
    pub graph_path: String,
    /// When false, a total retrieval failure is reported as an unrecovered
    /// infrastructure failure instead of a low-evidence outcome.
    pub fallback_enabled: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScoringConfig {
    /// Below this confidence the orchestrator attempts a refinement round.
    pub confidence_threshold: f64,
    /// Minimum merged evidence count the critic considers adequate.
    pub min_evidence_count: usize,
    /// Extra retrieval passes allowed when confidence stays low.
    pub max_refinement_rounds: u32,
    /// Tier boundaries consumed by the finalize policy.
    pub high_threshold: f64,
    pub medium_threshold: f64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Gemini API key. Empty means generation is disabled and answers are
    /// assembled extractively from evidence.
    pub gemini_api_key: String,
    pub gemini_model: String,
    /// Generation request timeout in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for SiftConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            retrieval: RetrievalConfig::default(),
            scoring: ScoringConfig::default(),
            synthesis: SynthesisConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8024,
            log_level: "info".into(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        let docs_path = default_sift_dir()
            .join("private_documents.json")
            .to_string_lossy()
            .into_owned();
        let graph_path = default_sift_dir()
            .join("graph_edges.json")
            .to_string_lossy()
            .into_owned();
        Self {
            initial_limit: 3,
            limit_cap: 12,
            max_merged_results: 5,
            branch_timeout_ms: 2_000,
            docs_path,
            graph_path,
            fallback_enabled: true,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.62,
            min_evidence_count: 3,
            max_refinement_rounds: 1,
            high_threshold: 0.70,
            medium_threshold: 0.40,
        }
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: String::new(),
            gemini_model: "gemini-2.5-flash".into(),
            request_timeout_ms: 10_000,
        }
    }
}

/// Returns `~/.sift/`
pub fn default_sift_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".sift")
}

/// Returns the default config file path: `~/.sift/config.toml`
pub fn default_config_path() -> PathBuf {
    default_sift_dir().join("config.toml")
}

impl SiftConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            SiftConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (SIFT_LOG_LEVEL, SIFT_DOCS_PATH,
    /// SIFT_GRAPH_PATH, SIFT_GEMINI_API_KEY).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SIFT_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("SIFT_DOCS_PATH") {
            self.retrieval.docs_path = val;
        }
        if let Ok(val) = std::env::var("SIFT_GRAPH_PATH") {
            self.retrieval.graph_path = val;
        }
        if let Ok(val) = std::env::var("SIFT_GEMINI_API_KEY") {
            self.synthesis.gemini_api_key = val;
        }
    }

    /// Resolve the document seed path, expanding `~` if needed.
    pub fn resolved_docs_path(&self) -> PathBuf {
        expand_tilde(&self.retrieval.docs_path)
    }

    /// Resolve the graph seed path, expanding `~` if needed.
    pub fn resolved_graph_path(&self) -> PathBuf {
        expand_tilde(&self.retrieval.graph_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .expect("home directory must exist")
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}
