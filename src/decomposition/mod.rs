// Decomposition engines — corpus in, vocabulary and axis weight matrix out.

pub mod download;
pub mod embeddings;
pub mod linalg;
pub mod lsa;
pub mod model;
pub mod separation;
pub mod traits;
pub mod vocabulary;

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::config::{Config, EngineKind};

pub use lsa::LatentSemanticEngine;
pub use model::Decomposition;
pub use separation::SignalSeparationEngine;
pub use traits::{DecompositionEngine, DecompositionParams, FeatureImportance};

/// Number of semantic axes every training run produces.
pub const N_AXES: usize = 20;

/// Iteration budget for the iterative solvers.
pub const MAX_ITER: usize = 500;

/// Build the engine selected by the configuration.
///
/// `Auto` prefers the embedding engine and falls back to LSA when the model
/// files are missing or fail to load. An explicit `Embedding` choice fails
/// instead of falling back.
pub fn build_engine(config: &Config) -> Result<Arc<dyn DecompositionEngine>> {
    let embed_dir = download::embedding_model_dir(&config.model_dir);
    match config.engine {
        EngineKind::Lsa => {
            info!("Using latent semantic engine");
            Ok(Arc::new(LatentSemanticEngine))
        }
        EngineKind::Embedding => {
            if !download::embedding_files_present(&config.model_dir) {
                anyhow::bail!(
                    "Embedding model files not found in {}\n\
                     Run `semaxis download-model` to download them.\n\
                     Or set SEMAXIS_ENGINE=lsa to use the latent semantic engine instead.",
                    embed_dir.display()
                );
            }
            info!("Using signal separation engine");
            Ok(Arc::new(SignalSeparationEngine::load(&embed_dir)?))
        }
        EngineKind::Auto => {
            if download::embedding_files_present(&config.model_dir) {
                match SignalSeparationEngine::load(&embed_dir) {
                    Ok(engine) => {
                        info!("Using signal separation engine");
                        return Ok(Arc::new(engine));
                    }
                    Err(e) => {
                        warn!(error = %e, "Embedding model failed to load, using latent semantic fallback");
                    }
                }
            } else {
                warn!("Embedding model not downloaded, using latent semantic engine");
            }
            Ok(Arc::new(LatentSemanticEngine))
        }
    }
}
