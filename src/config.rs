use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::decomposition::{DecompositionParams, FeatureImportance};

/// Which decomposition engine to train with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    /// Embedding engine when the model files are present, LSA otherwise (default)
    Auto,
    /// TF-IDF latent semantic analysis — no model files needed
    Lsa,
    /// Sentence embeddings + independent component analysis
    Embedding,
}

impl EngineKind {
    fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "auto" | "" => Ok(Self::Auto),
            "lsa" => Ok(Self::Lsa),
            "embedding" | "embeddings" => Ok(Self::Embedding),
            other => anyhow::bail!(
                "Unknown SEMAXIS_ENGINE value {other:?}. Expected auto, lsa or embedding."
            ),
        }
    }
}

fn parse_feature_importance(value: &str) -> Result<FeatureImportance> {
    match value.to_ascii_lowercase().as_str() {
        "combined" | "" => Ok(FeatureImportance::Combined),
        "axial" => Ok(FeatureImportance::Axial),
        "angular" => Ok(FeatureImportance::Angular),
        other => anyhow::bail!(
            "Unknown SEMAXIS_FEATURE_IMPORTANCE value {other:?}. Expected axial, angular or combined."
        ),
    }
}

/// Default upload cap for the train endpoint (16 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. Every value
/// has a default, so an empty environment is a valid configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Interface the web server binds to (SEMAXIS_BIND)
    pub bind: String,
    /// Port the web server listens on (SEMAXIS_PORT)
    pub port: u16,
    /// Decomposition engine selection (SEMAXIS_ENGINE)
    pub engine: EngineKind,
    /// Directory containing the embedding model files (SEMAXIS_MODEL_DIR)
    pub model_dir: PathBuf,
    /// Fixed solver seed for reproducible training (SEMAXIS_SEED)
    pub seed: Option<u64>,
    /// Term scoring for the embedding engine (SEMAXIS_FEATURE_IMPORTANCE)
    pub feature_importance: FeatureImportance,
    /// Largest accepted upload in bytes (SEMAXIS_MAX_UPLOAD_BYTES)
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 5000,
            engine: EngineKind::Auto,
            model_dir: crate::decomposition::download::default_model_dir(),
            seed: None,
            feature_importance: FeatureImportance::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        let defaults = Self::default();

        let port = match env::var("SEMAXIS_PORT") {
            Ok(v) => v
                .parse()
                .with_context(|| format!("SEMAXIS_PORT must be a port number, got {v:?}"))?,
            Err(_) => defaults.port,
        };

        let engine = match env::var("SEMAXIS_ENGINE") {
            Ok(v) => EngineKind::parse(&v)?,
            Err(_) => defaults.engine,
        };

        let seed = match env::var("SEMAXIS_SEED") {
            Ok(v) if !v.is_empty() => Some(
                v.parse()
                    .with_context(|| format!("SEMAXIS_SEED must be an unsigned integer, got {v:?}"))?,
            ),
            _ => None,
        };

        let feature_importance = match env::var("SEMAXIS_FEATURE_IMPORTANCE") {
            Ok(v) => parse_feature_importance(&v)?,
            Err(_) => defaults.feature_importance,
        };

        let max_upload_bytes = match env::var("SEMAXIS_MAX_UPLOAD_BYTES") {
            Ok(v) => v.parse().with_context(|| {
                format!("SEMAXIS_MAX_UPLOAD_BYTES must be a byte count, got {v:?}")
            })?,
            Err(_) => defaults.max_upload_bytes,
        };

        Ok(Self {
            bind: env::var("SEMAXIS_BIND").unwrap_or(defaults.bind),
            port,
            engine,
            model_dir: env::var("SEMAXIS_MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_dir),
            seed,
            feature_importance,
            max_upload_bytes,
        })
    }

    /// Training parameters for a new session.
    pub fn decomposition_params(&self) -> DecompositionParams {
        DecompositionParams {
            seed: self.seed,
            feature_importance: self.feature_importance,
            ..DecompositionParams::default()
        }
    }
}
