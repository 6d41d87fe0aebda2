// Decomposition engine trait — the swap-ready abstraction.
//
// The axis summarizer and plot reducer only see the Decomposition an engine
// returns. Two engines ship with the crate (latent semantic analysis and
// embedding-based signal separation); tests plug in deterministic stubs.

use anyhow::Result;
use async_trait::async_trait;

use super::model::Decomposition;
use super::{MAX_ITER, N_AXES};
use crate::corpus::Corpus;

/// How term weights are derived from the separated axes.
///
/// Only the signal separation engine distinguishes these; the latent
/// semantic engine always reports the singular-vector loadings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeatureImportance {
    /// Projection of the term embedding onto the axis.
    Axial,
    /// Cosine between the term embedding and the axis.
    Angular,
    /// Projection scaled by the absolute cosine.
    #[default]
    Combined,
}

impl FeatureImportance {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Axial => "axial",
            Self::Angular => "angular",
            Self::Combined => "combined",
        }
    }
}

/// Fixed training parameters handed to every engine.
#[derive(Debug, Clone, PartialEq)]
pub struct DecompositionParams {
    /// Number of axes (rows of the weight matrix) to produce
    pub n_axes: usize,
    /// Iteration budget for the iterative solvers
    pub max_iter: usize,
    /// Seed for solver initialization; `None` draws from the OS
    pub seed: Option<u64>,
    pub feature_importance: FeatureImportance,
}

impl Default for DecompositionParams {
    fn default() -> Self {
        Self {
            n_axes: N_AXES,
            max_iter: MAX_ITER,
            seed: None,
            feature_importance: FeatureImportance::default(),
        }
    }
}

/// Trait for turning a validated corpus into a vocabulary and axis weights.
///
/// Implementations must return exactly `params.n_axes` rows. Async because
/// the embedding engine offloads inference to blocking threads.
#[async_trait]
pub trait DecompositionEngine: Send + Sync {
    /// Short name reported in status output and logs.
    fn name(&self) -> &str;

    /// Decompose the corpus into `params.n_axes` semantic axes.
    async fn decompose(
        &self,
        corpus: &Corpus,
        params: &DecompositionParams,
    ) -> Result<Decomposition>;
}
