//! Runtime configuration, read from a TOML file.
//!
//! Every section is optional. A missing file yields the defaults; a file that
//! exists but cannot be read or parsed is an error.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, SentinelError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentinelConfig {
    pub segmenter: SegmenterConfig,
    pub retrieval: RetrievalConfig,
    pub generator: GeneratorConfig,
    pub catalog: CatalogConfig,
    pub corpus: CorpusConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    /// Fragments shorter than this (in characters) are discarded.
    pub min_clause_chars: usize,
    /// Documents shorter than this are rejected as input errors.
    pub min_document_chars: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            min_clause_chars: 20,
            min_document_chars: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub contract_top_k: usize,
    pub law_top_k: usize,
}

impl RetrievalConfig {
    pub const MAX_TOP_K: usize = 5;
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            contract_top_k: 3,
            law_top_k: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub endpoint: String,
    pub model: String,
    pub timeout_secs: u64,
    pub max_output_tokens: u32,
    pub temperature: f32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-1.5-flash".to_string(),
            timeout_secs: 30,
            max_output_tokens: 1024,
            temperature: 0.2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Alternative rules file. The built-in catalog is used when unset.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Alternative statutory corpus. The built-in corpus is used when unset.
    pub path: Option<PathBuf>,
}

impl SentinelConfig {
    /// Load from `path`, falling back to defaults when no path is given or the
    /// file does not exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            info!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| SentinelError::Config(e.to_string()))?;
        config.validated()
    }

    /// Clamp out-of-range values and reject settings that cannot work.
    fn validated(mut self) -> Result<Self> {
        let clamp = |k: usize| k.clamp(1, RetrievalConfig::MAX_TOP_K);
        self.retrieval.contract_top_k = clamp(self.retrieval.contract_top_k);
        self.retrieval.law_top_k = clamp(self.retrieval.law_top_k);

        if self.generator.timeout_secs == 0 {
            return Err(SentinelError::Config(
                "generator.timeout_secs must be at least 1".into(),
            ));
        }
        if self.generator.model.trim().is_empty() {
            return Err(SentinelError::Config("generator.model must not be empty".into()));
        }
        Ok(self)
    }
}
