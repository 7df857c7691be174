//! Environment-driven configuration for the processing pipeline.
//!
//! All thresholds are plain struct fields with defaults, so tests and
//! embedders can build a [`PipelineConfig`] directly; [`PipelineConfig::
//! from_env`] layers `.env`/environment values on top for deployments.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::extract::AnalyzeMode;

/// Tunables for heading detection.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadingRules {
    /// Minimum length of an all-uppercase line treated as a heading.
    pub uppercase_min_len: usize,
    /// Maximum length of a colon-terminated line treated as a heading.
    pub colon_max_len: usize,
    /// A key-phrase result counts as a heading only when the phrase count is
    /// non-zero and strictly below this limit.
    pub keyphrase_limit: usize,
    /// Language hint passed to the key-phrase collaborator.
    pub language: String,
}

impl Default for HeadingRules {
    fn default() -> Self {
        Self {
            uppercase_min_len: 5,
            colon_max_len: 50,
            keyphrase_limit: 2,
            language: "es".to_string(),
        }
    }
}

/// Size thresholds applied by the chunk quality engine.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityLimits {
    /// Chunks strictly below this character count are flagged undersized.
    pub min_chunk_size: usize,
    /// Chunks strictly above this character count are flagged oversized.
    pub max_chunk_size: usize,
    /// Number of leading characters of the joined chunk text used as the
    /// deduplication key.
    pub dedup_prefix_chars: usize,
}

impl Default for QualityLimits {
    fn default() -> Self {
        Self {
            min_chunk_size: 200,
            max_chunk_size: 2000,
            dedup_prefix_chars: 100,
        }
    }
}

/// Configuration for one document-processing pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub analyze_mode: AnalyzeMode,
    pub heading: HeadingRules,
    pub limits: QualityLimits,
    /// Documents whose coverage falls below this percentage are logged as
    /// suspicious; processing still succeeds.
    pub coverage_threshold_pct: f64,
    /// Processing longer than this marks the metrics record as slow.
    pub slow_threshold: Duration,
    /// Upper bound on one extraction call; on expiry the document fails.
    pub extraction_timeout: Duration,
    /// Expected embedding vector width.
    pub embedding_dimension: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            analyze_mode: AnalyzeMode::Layout,
            heading: HeadingRules::default(),
            limits: QualityLimits::default(),
            coverage_threshold_pct: 70.0,
            slow_threshold: Duration::from_secs(30),
            extraction_timeout: Duration::from_secs(120),
            embedding_dimension: 1536,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variables: {0}")]
    Missing(String),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl PipelineConfig {
    /// Loads configuration from the environment, reading `.env` first.
    ///
    /// `ANALYZE_MODE`, `MIN_CHUNK_SIZE_CHARS`, `MAX_CHUNK_SIZE_CHARS`,
    /// `COVERAGE_THRESHOLD_PCT` and `SLOW_THRESHOLD_S` are required; every
    /// other knob falls back to its [`Default`] value. All missing required
    /// variables are reported in one error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let mut missing = Vec::new();
        let analyze_mode = require("ANALYZE_MODE", &mut missing);
        let min_chunk = require("MIN_CHUNK_SIZE_CHARS", &mut missing);
        let max_chunk = require("MAX_CHUNK_SIZE_CHARS", &mut missing);
        let coverage = require("COVERAGE_THRESHOLD_PCT", &mut missing);
        let slow = require("SLOW_THRESHOLD_S", &mut missing);
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing.join(", ")));
        }

        let defaults = Self::default();
        let heading = HeadingRules {
            uppercase_min_len: parse_opt(
                "HEADING_UPPERCASE_MIN_LEN",
                defaults.heading.uppercase_min_len,
            )?,
            colon_max_len: parse_opt("HEADING_COLON_MAX_LEN", defaults.heading.colon_max_len)?,
            keyphrase_limit: parse_opt("KEYPHRASE_LIMIT", defaults.heading.keyphrase_limit)?,
            language: env::var("KEYPHRASE_LANGUAGE").unwrap_or(defaults.heading.language),
        };

        Ok(Self {
            analyze_mode: parse_value("ANALYZE_MODE", &analyze_mode)?,
            heading,
            limits: QualityLimits {
                min_chunk_size: parse_value("MIN_CHUNK_SIZE_CHARS", &min_chunk)?,
                max_chunk_size: parse_value("MAX_CHUNK_SIZE_CHARS", &max_chunk)?,
                dedup_prefix_chars: parse_opt(
                    "DEDUP_PREFIX_CHARS",
                    defaults.limits.dedup_prefix_chars,
                )?,
            },
            coverage_threshold_pct: parse_value("COVERAGE_THRESHOLD_PCT", &coverage)?,
            slow_threshold: Duration::from_secs_f64(parse_value("SLOW_THRESHOLD_S", &slow)?),
            extraction_timeout: Duration::from_secs_f64(parse_opt(
                "EXTRACTION_TIMEOUT_S",
                defaults.extraction_timeout.as_secs_f64(),
            )?),
            embedding_dimension: parse_opt("EMBEDDING_DIMENSION", defaults.embedding_dimension)?,
        })
    }
}

fn require(name: &'static str, missing: &mut Vec<&'static str>) -> String {
    match env::var(name) {
        Ok(value) if !value.is_empty() => value,
        _ => {
            missing.push(name);
            String::new()
        }
    }
}

fn parse_value<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|err: T::Err| ConfigError::Invalid {
        name,
        reason: err.to_string(),
    })
}

fn parse_opt<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.is_empty() => parse_value(name, &raw),
        _ => Ok(default),
    }
}
