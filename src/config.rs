//! Configuration
//!
//! Every section has a `Default`, so a partial YAML file (or none at all) is a
//! valid configuration. Secrets are read from the environment when the file
//! leaves them unset.

use crate::algo::PartitionWeights;
use crate::layout::LayoutConfig;
use crate::similarity::NeighborStrategy;
use crate::vector::IndexKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// External model provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Local feature-hashing embedder (embeddings only, no network)
    Hashing,
    OpenAI,
    Ollama,
    Gemini,
}

/// Embedding model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// The provider to use
    pub provider: Provider,
    /// Model name (e.g., "text-embedding-3-small", "all-minilm")
    pub model: String,
    /// API Key (optional, can be loaded from env if None)
    pub api_key: Option<String>,
    /// API Base URL (required for Ollama on a non-default host)
    pub api_base_url: Option<String>,
    /// Vector dimension size
    pub dimensions: usize,
    /// Texts per backend request
    pub batch_size: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Hashing,
            model: "all-MiniLM-L6-v2".to_string(),
            api_key: None,
            api_base_url: None,
            dimensions: 384,
            batch_size: 64,
            timeout_secs: 30,
        }
    }
}

/// Query service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Matches returned per query
    pub top_k: usize,
    /// Index backend
    pub index: IndexKind,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            index: IndexKind::Flat,
        }
    }
}

/// Similarity graph and partitioner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Which profile pairs get an edge
    pub strategy: NeighborStrategy,
    /// Louvain resolution
    pub resolution: f64,
    /// Edge weights the partitioner runs on
    pub weights: PartitionWeights,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            strategy: NeighborStrategy::Complete,
            resolution: 1.0,
            weights: PartitionWeights::Normalized,
        }
    }
}

/// Visualization run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizeConfig {
    /// Only lay out the first N profiles
    pub limit: Option<usize>,
    /// HTML output path
    pub output: PathBuf,
}

impl Default for VisualizeConfig {
    fn default() -> Self {
        Self {
            limit: None,
            output: PathBuf::from("./output/profiles.html"),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub address: String,
    /// Port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

/// Language-model configuration for description generation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    /// The LLM provider to use
    pub provider: Provider,
    /// Model name (e.g., "gpt-3.5-turbo", "llama3")
    pub model: String,
    /// API Key (optional, can be loaded from env if None)
    pub api_key: Option<String>,
    /// API Base URL
    pub api_base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            provider: Provider::OpenAI,
            model: "gpt-3.5-turbo".to_string(),
            api_key: None,
            api_base_url: None,
            temperature: 0.7,
            max_tokens: 150,
            timeout_secs: 60,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CohortConfig {
    pub embedding: EmbeddingConfig,
    pub search: SearchConfig,
    pub graph: GraphConfig,
    pub layout: LayoutConfig,
    pub visualize: VisualizeConfig,
    pub server: ServerConfig,
    pub summary: SummaryConfig,
}

impl CohortConfig {
    /// Load a YAML file and apply environment overrides
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let mut config = Self::from_yaml_str(&text)?;
        config.apply_env_overrides();
        debug!(path = %path.as_ref().display(), "Configuration loaded");
        Ok(config)
    }

    /// Load `path` if given, otherwise defaults; environment overrides apply either way
    pub fn load_or_default(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let mut config = Self::default();
                config.apply_env_overrides();
                Ok(config)
            }
        }
    }

    /// Parse YAML without touching the environment
    pub fn from_yaml_str(text: &str) -> ConfigResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Fill unset API keys from `COHORT_EMBEDDING_API_KEY`, `COHORT_SUMMARY_API_KEY`
    /// and, for OpenAI, `OPENAI_API_KEY`
    pub fn apply_env_overrides(&mut self) {
        self.apply_env_with(|name| std::env::var(name).ok());
    }

    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let openai = |provider: Provider| {
            if provider == Provider::OpenAI {
                lookup("OPENAI_API_KEY")
            } else {
                None
            }
        };

        if self.embedding.api_key.is_none() {
            self.embedding.api_key =
                lookup("COHORT_EMBEDDING_API_KEY").or_else(|| openai(self.embedding.provider));
        }
        if self.summary.api_key.is_none() {
            self.summary.api_key =
                lookup("COHORT_SUMMARY_API_KEY").or_else(|| openai(self.summary.provider));
        }
    }
}
