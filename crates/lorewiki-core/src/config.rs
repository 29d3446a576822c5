//! Lorewiki Configuration Management
//!
//! Handles configuration from environment variables and config files
//! with defaults matching the authoring tool's behavior.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Candidate extraction
    pub extraction: ExtractionConfig,

    /// Relation suggestion
    pub relations: RelationConfig,

    /// Wiki behavior
    pub wiki: WikiConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_vars(|key| std::env::var(key).ok())
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(self) -> Result<Self, ConfigError> {
        self.with_vars(|key| std::env::var(key).ok())
    }

    /// Override every field whose variable `var` returns
    fn with_vars<F>(mut self, var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = &var;

        if let Some(value) = parse_var(var, "LOREWIKI_MIN_TEXT_LEN")? {
            self.extraction.min_text_len = value;
        }
        if let Some(value) = parse_var(var, "LOREWIKI_MAX_CANDIDATES")? {
            self.extraction.max_candidates = value;
        }
        if let Some(value) = parse_var(var, "LOREWIKI_CONTEXT_RADIUS")? {
            self.extraction.context_radius = value;
        }
        if let Some(value) = parse_var(var, "LOREWIKI_DEBOUNCE_MS")? {
            self.extraction.debounce_ms = value;
        }

        if let Some(value) = parse_var(var, "LOREWIKI_RELATION_MIN_CONFIDENCE")? {
            self.relations.min_confidence = value;
        }
        if let Some(value) = parse_var(var, "LOREWIKI_MAX_RELATION_SUGGESTIONS")? {
            self.relations.max_suggestions = value;
        }

        if let Some(value) = parse_var(var, "LOREWIKI_AUTO_EXTRACTION")? {
            self.wiki.auto_extraction = value;
        }
        if let Some(value) = parse_var(var, "LOREWIKI_EXTRACTION_THRESHOLD")? {
            self.wiki.extraction_threshold = value;
        }
        if let Some(value) = parse_var(var, "LOREWIKI_SHOW_RELATED_ENTRIES")? {
            self.wiki.show_related_entries = value;
        }
        if let Some(value) = parse_var(var, "LOREWIKI_MAX_RELATED_ENTRIES")? {
            self.wiki.max_related_entries = value;
        }

        // Logging
        if let Some(level) = var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(value) = parse_var(var, "LOG_JSON")? {
            self.logging.json_format = value;
        }

        self.validate()?;
        Ok(self)
    }

    /// Reject values outside their meaningful range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.relations.min_confidence) {
            return Err(ConfigError::InvalidValue {
                key: "relations.min_confidence".to_string(),
                value: self.relations.min_confidence.to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.wiki.extraction_threshold) {
            return Err(ConfigError::InvalidValue {
                key: "wiki.extraction_threshold".to_string(),
                value: self.wiki.extraction_threshold.to_string(),
            });
        }
        Ok(())
    }
}

fn parse_var<T, F>(var: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            }),
        None => Ok(None),
    }
}

/// Candidate extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Texts shorter than this (in characters) are not scanned
    pub min_text_len: usize,

    /// Maximum number of candidates returned per pass
    pub max_candidates: usize,

    /// Characters of context kept on each side of a match
    pub context_radius: usize,

    /// Quiet period after the last edit before a pass runs
    pub debounce_ms: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_text_len: 10,
            max_candidates: 10,
            context_radius: 20,
            debounce_ms: 1000,
        }
    }
}

/// Relation suggestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationConfig {
    /// Suggestions must score strictly above this
    pub min_confidence: f64,

    /// Maximum number of suggestions returned
    pub max_suggestions: usize,
}

impl Default for RelationConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.3,
            max_suggestions: 10,
        }
    }
}

/// Wiki behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WikiConfig {
    /// Run extraction while the author types
    pub auto_extraction: bool,

    /// Minimum confidence for bulk acceptance
    pub extraction_threshold: f32,

    /// Show related entries next to the selected entry
    pub show_related_entries: bool,

    /// Maximum related entries shown
    pub max_related_entries: usize,
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            auto_extraction: true,
            extraction_threshold: 0.7,
            show_related_entries: true,
            max_related_entries: 8,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

impl From<ConfigError> for crate::WikiError {
    fn from(err: ConfigError) -> Self {
        crate::WikiError::ConfigError(err.to_string())
    }
}
