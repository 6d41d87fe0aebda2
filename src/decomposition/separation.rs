// Signal separation engine — independent semantic axes in embedding space.
//
// Documents are embedded with the sentence model, centered and whitened;
// FastICA then unmixes the whitened document cloud into statistically
// independent directions. Each direction is mapped back into embedding
// space and every vocabulary term is scored against it by embedding the term
// itself, so terms that never co-occur can still load on the same axis.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::Rng;
use tracing::{info, warn};

use super::embeddings::{mean_embedding, SentenceEmbedder};
use super::linalg::{
    cosine, dot, effective_rank, mat_vec, normalize, orthogonalize, solver_rng, top_eigenpairs,
};
use super::model::Decomposition;
use super::traits::{DecompositionEngine, DecompositionParams, FeatureImportance};
use super::vocabulary::build_vocabulary;
use crate::corpus::Corpus;

/// Relative residual at which the whitening eigen solver stops.
const EIGEN_TOLERANCE: f64 = 1e-9;

/// FastICA stops once successive unmixing vectors agree to this tolerance.
const ICA_TOLERANCE: f64 = 1e-4;

/// Embedding-based engine. Holds the loaded sentence model.
pub struct SignalSeparationEngine {
    embedder: SentenceEmbedder,
}

impl SignalSeparationEngine {
    /// Load the sentence embedding model from `model_dir`.
    pub fn load(model_dir: &Path) -> Result<Self> {
        Ok(Self {
            embedder: SentenceEmbedder::load(model_dir)?,
        })
    }
}

#[async_trait]
impl DecompositionEngine for SignalSeparationEngine {
    fn name(&self) -> &str {
        "embedding"
    }

    async fn decompose(
        &self,
        corpus: &Corpus,
        params: &DecompositionParams,
    ) -> Result<Decomposition> {
        let vocabulary = build_vocabulary(corpus.documents());
        if vocabulary.is_empty() {
            anyhow::bail!(
                "No terms of at least two characters in {} documents",
                corpus.len()
            );
        }

        let document_embeddings = self
            .embedder
            .embed(corpus.documents())
            .await
            .context("Failed to embed documents")?;
        let term_embeddings = self
            .embedder
            .embed(&vocabulary)
            .await
            .context("Failed to embed vocabulary")?;

        let params = params.clone();
        let weights = tokio::task::spawn_blocking(move || {
            separate(&document_embeddings, &term_embeddings, &params)
        })
        .await
        .context("spawn_blocking panicked")??;

        info!(
            axes = weights.len(),
            terms = vocabulary.len(),
            "Signal separation complete"
        );

        Decomposition::new(vocabulary, weights)
    }
}

/// Compute the axis weight matrix from document and term embeddings.
///
/// Returns `params.n_axes` rows of `term_embeddings.len()` weights. Axes
/// beyond the rank of the centered document embeddings are zero rows.
pub fn separate(
    document_embeddings: &[Vec<f64>],
    term_embeddings: &[Vec<f64>],
    params: &DecompositionParams,
) -> Result<Vec<Vec<f64>>> {
    let n = document_embeddings.len();
    if n == 0 {
        anyhow::bail!("No document embeddings to separate");
    }

    let mean = mean_embedding(document_embeddings);
    let centered: Vec<Vec<f64>> = document_embeddings
        .iter()
        .map(|e| e.iter().zip(&mean).map(|(x, m)| x - m).collect())
        .collect();

    let dim = mean.len();
    let covariance = covariance(&centered, dim);

    let mut rng = solver_rng(params.seed);
    let pairs = top_eigenpairs(
        dim,
        params.n_axes,
        |x| mat_vec(&covariance, x),
        params.max_iter,
        EIGEN_TOLERANCE,
        &mut rng,
    );
    let rank = effective_rank(&pairs);
    if rank == 0 {
        anyhow::bail!("Document embeddings have no variance; all documents embed identically");
    }

    // Whitening direction p = e / sqrt(λ) for each principal pair (λ, e);
    // the whitened coordinate of a centered embedding x is p·x.
    let directions: Vec<Vec<f64>> = pairs
        .iter()
        .take(rank)
        .map(|pair| {
            let scale = pair.value.sqrt();
            pair.vector.iter().map(|e| e / scale).collect()
        })
        .collect();
    let whitened: Vec<Vec<f64>> = centered
        .iter()
        .map(|x| directions.iter().map(|p| dot(p, x)).collect())
        .collect();

    let unmixing = fast_ica(&whitened, rank, params.max_iter, &mut rng);

    // Axis i in embedding space: a_i = Σ_j w_ij * p_j (whitening folded in).
    let mut weights: Vec<Vec<f64>> = unmixing
        .iter()
        .map(|w| {
            let mut axis = vec![0.0; dim];
            for (&wj, p) in w.iter().zip(&directions) {
                for (acc, x) in axis.iter_mut().zip(p) {
                    *acc += wj * x;
                }
            }
            term_embeddings
                .iter()
                .map(|t| importance(t, &axis, params.feature_importance))
                .collect()
        })
        .collect();

    if rank < params.n_axes {
        warn!(
            requested = params.n_axes,
            supported = rank,
            "Corpus supports fewer axes than requested; remaining axes are empty"
        );
        weights.resize(params.n_axes, vec![0.0; term_embeddings.len()]);
    }

    Ok(weights)
}

/// `XᵀX / n` over centered rows: a `dim` x `dim` matrix, independent of the
/// number of documents.
fn covariance(centered: &[Vec<f64>], dim: usize) -> Vec<Vec<f64>> {
    let mut cov = vec![vec![0.0; dim]; dim];
    for x in centered {
        for i in 0..dim {
            if x[i] == 0.0 {
                continue;
            }
            for j in i..dim {
                cov[i][j] += x[i] * x[j];
            }
        }
    }
    let n = centered.len().max(1) as f64;
    for i in 0..dim {
        for j in i..dim {
            cov[i][j] /= n;
            cov[j][i] = cov[i][j];
        }
    }
    cov
}

/// Score one term embedding against one axis direction.
pub fn importance(term: &[f64], axis: &[f64], mode: FeatureImportance) -> f64 {
    match mode {
        FeatureImportance::Axial => dot(term, axis),
        FeatureImportance::Angular => cosine(term, axis),
        FeatureImportance::Combined => dot(term, axis) * cosine(term, axis).abs(),
    }
}

/// Deflationary FastICA with the logcosh contrast on whitened data.
///
/// `data` is n samples x `components` whitened features. Returns one unit
/// unmixing vector per component, mutually orthogonal.
pub fn fast_ica(
    data: &[Vec<f64>],
    components: usize,
    max_iter: usize,
    rng: &mut impl Rng,
) -> Vec<Vec<f64>> {
    let n = data.len() as f64;
    let mut unmixing: Vec<Vec<f64>> = Vec::with_capacity(components);

    for _ in 0..components {
        let mut w: Vec<f64> = (0..components)
            .map(|_| rng.random_range(-1.0..1.0))
            .collect();
        orthogonalize(&mut w, &unmixing);
        normalize(&mut w);

        for _ in 0..max_iter {
            // w+ = E[z g(wᵀz)] - E[g'(wᵀz)] w, with g = tanh
            let mut next = vec![0.0; components];
            let mut g_prime_mean = 0.0;
            for z in data {
                let g = dot(&w, z).tanh();
                g_prime_mean += 1.0 - g * g;
                for (acc, x) in next.iter_mut().zip(z) {
                    *acc += x * g;
                }
            }
            g_prime_mean /= n;
            for (acc, wj) in next.iter_mut().zip(&w) {
                *acc = *acc / n - g_prime_mean * wj;
            }

            orthogonalize(&mut next, &unmixing);
            if normalize(&mut next) <= f64::EPSILON {
                break;
            }

            let converged = (dot(&next, &w).abs() - 1.0).abs() < ICA_TOLERANCE;
            w = next;
            if converged {
                break;
            }
        }

        unmixing.push(w);
    }

    unmixing
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(n_axes: usize) -> DecompositionParams {
        DecompositionParams {
            n_axes,
            seed: Some(3),
            ..DecompositionParams::default()
        }
    }

    /// Synthetic 4-dim "embeddings": documents spread along two directions.
    fn documents() -> Vec<Vec<f64>> {
        (0..12)
            .map(|i| {
                let a = (i as f64 * 0.7).sin();
                let b = if i % 3 == 0 { 1.0 } else { -0.5 };
                vec![a, b, 0.1 * a, 0.0]
            })
            .collect()
    }

    #[test]
    fn test_shape_and_zero_padding() {
        let terms = vec![
            vec![1.0, 0.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 1.0],
        ];
        let weights = separate(&documents(), &terms, &params(5)).unwrap();
        assert_eq!(weights.len(), 5);
        assert!(weights.iter().all(|row| row.len() == 3));
        // The documents span two directions; later axes are empty.
        for row in &weights[2..] {
            assert!(row.iter().all(|&w| w == 0.0));
        }
        // A term orthogonal to every document direction scores zero.
        assert!(weights[0][2].abs() < 1e-9);
        assert!(weights[0].iter().all(|w| w.is_finite()));
    }

    #[test]
    fn test_whitened_documents_have_identity_covariance() {
        let docs = documents();
        let mean = mean_embedding(&docs);
        let centered: Vec<Vec<f64>> = docs
            .iter()
            .map(|e| e.iter().zip(&mean).map(|(x, m)| x - m).collect())
            .collect();
        let cov = covariance(&centered, 4);
        let mut rng = solver_rng(Some(1));
        let pairs = top_eigenpairs(4, 4, |x| mat_vec(&cov, x), 500, 1e-12, &mut rng);
        assert_eq!(effective_rank(&pairs), 2);

        let whitened: Vec<Vec<f64>> = centered
            .iter()
            .map(|x| {
                pairs[..2]
                    .iter()
                    .map(|p| dot(&p.vector, x) / p.value.sqrt())
                    .collect()
            })
            .collect();
        let n = whitened.len() as f64;
        for a in 0..2 {
            for b in 0..2 {
                let c: f64 = whitened.iter().map(|z| z[a] * z[b]).sum::<f64>() / n;
                let want = if a == b { 1.0 } else { 0.0 };
                assert!((c - want).abs() < 1e-6, "cov[{a}][{b}] = {c}");
            }
        }
    }

    #[test]
    fn test_many_documents_in_embedding_space() {
        // Thousands of documents only grow the covariance pass, not the solve.
        let docs: Vec<Vec<f64>> = (0..2000)
            .map(|i| {
                let t = i as f64 * 0.013;
                (0..8)
                    .map(|d| ((d as f64 + 1.0) * t).sin() / (d as f64 + 1.0))
                    .collect()
            })
            .collect();
        let terms: Vec<Vec<f64>> = (0..8)
            .map(|d| (0..8).map(|k| if k == d { 1.0 } else { 0.0 }).collect())
            .collect();

        let started = std::time::Instant::now();
        let weights = separate(&docs, &terms, &params(20)).unwrap();
        assert!(started.elapsed().as_secs() < 60);
        assert_eq!(weights.len(), 20);
        assert!(weights.iter().flatten().all(|w| w.is_finite()));
    }

    #[test]
    fn test_identical_documents_fail() {
        let docs = vec![vec![1.0, 2.0]; 10];
        let terms = vec![vec![1.0, 0.0]];
        assert!(separate(&docs, &terms, &params(3)).is_err());
    }

    #[test]
    fn test_fast_ica_returns_orthonormal_rows() {
        let mut rng = solver_rng(Some(11));
        let data: Vec<Vec<f64>> = (0..50)
            .map(|i| {
                let t = i as f64 * 0.37;
                vec![t.sin() * 1.2, (t * 3.1).cos() * 0.8, ((i % 5) as f64 - 2.0) * 0.5]
            })
            .collect();
        let w = fast_ica(&data, 3, 200, &mut rng);
        assert_eq!(w.len(), 3);
        for (i, a) in w.iter().enumerate() {
            assert!((dot(a, a) - 1.0).abs() < 1e-9);
            for b in &w[i + 1..] {
                assert!(dot(a, b).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_importance_modes() {
        let term = [2.0, 0.0];
        let axis = [1.0, 1.0];
        let axial = importance(&term, &axis, FeatureImportance::Axial);
        let angular = importance(&term, &axis, FeatureImportance::Angular);
        let combined = importance(&term, &axis, FeatureImportance::Combined);
        assert!((axial - 2.0).abs() < 1e-12);
        assert!((angular - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-12);
        assert!((combined - axial * angular).abs() < 1e-12);

        let opposite = importance(&[-2.0, 0.0], &axis, FeatureImportance::Combined);
        assert!(opposite < 0.0);
    }
}
