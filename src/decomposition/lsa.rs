// Latent semantic engine — TF-IDF plus a centered truncated SVD.
//
// Runs entirely in-process with no model files, so it is always available
// and serves as the fallback when the embedding model is not downloaded.
//
// Documents become sparse, L2-normalized TF-IDF rows (smoothed IDF). The
// axes are the leading right singular vectors of the mean-centered
// document-term matrix A_c = A - 1μᵀ, found as eigenvectors of A_cᵀA_c.
// That product is never formed: each solver step applies it to a vector
// straight from the sparse rows, with the centering folded in through the
// column mean μ, so memory and per-step work stay linear in the non-zeros.
// Centering gives every axis a positive and a negative pole.

use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::linalg::{align_sign, effective_rank, solver_rng, top_eigenpairs};
use super::model::Decomposition;
use super::traits::{DecompositionEngine, DecompositionParams};
use super::vocabulary::{build_vocabulary, tokenize};
use crate::corpus::Corpus;

/// Relative residual at which the eigen solver stops.
const EIGEN_TOLERANCE: f64 = 1e-6;

/// Sparse row: (term index, weight), sorted by term index.
type SparseRow = Vec<(usize, f64)>;

/// TF-IDF + truncated SVD engine. Stateless; parameters come per call.
#[derive(Debug, Default, Clone, Copy)]
pub struct LatentSemanticEngine;

#[async_trait]
impl DecompositionEngine for LatentSemanticEngine {
    fn name(&self) -> &str {
        "lsa"
    }

    async fn decompose(
        &self,
        corpus: &Corpus,
        params: &DecompositionParams,
    ) -> Result<Decomposition> {
        let documents = corpus.documents().to_vec();
        let params = params.clone();
        tokio::task::spawn_blocking(move || decompose_documents(&documents, &params))
            .await
            .context("spawn_blocking panicked")?
    }
}

/// Synchronous decomposition. Called from spawn_blocking.
pub fn decompose_documents(
    documents: &[String],
    params: &DecompositionParams,
) -> Result<Decomposition> {
    let vocabulary = build_vocabulary(documents);
    if vocabulary.is_empty() {
        anyhow::bail!(
            "No terms of at least two characters in {} documents",
            documents.len()
        );
    }

    let matrix = CenteredTfidf::new(tfidf_rows(documents, &vocabulary), vocabulary.len());

    let mut rng = solver_rng(params.seed);
    let pairs = top_eigenpairs(
        vocabulary.len(),
        params.n_axes,
        |x| matrix.apply(x),
        params.max_iter,
        EIGEN_TOLERANCE,
        &mut rng,
    );
    let rank = effective_rank(&pairs);

    debug!(
        documents = documents.len(),
        terms = vocabulary.len(),
        non_zeros = matrix.non_zeros(),
        rank,
        "Solved centered term covariance eigenproblem"
    );

    let mut weights: Vec<Vec<f64>> = pairs
        .into_iter()
        .take(rank)
        .map(|pair| {
            let mut loadings = pair.vector;
            align_sign(&mut loadings);
            loadings
        })
        .collect();

    if rank < params.n_axes {
        warn!(
            requested = params.n_axes,
            supported = rank,
            "Corpus supports fewer axes than requested; remaining axes are empty"
        );
        weights.resize(params.n_axes, vec![0.0; vocabulary.len()]);
    }

    info!(
        axes = weights.len(),
        terms = vocabulary.len(),
        "Latent semantic decomposition complete"
    );

    Decomposition::new(vocabulary, weights)
}

/// Build L2-normalized TF-IDF rows with smoothed IDF:
/// `idf(t) = ln((1 + n) / (1 + df(t))) + 1`.
fn tfidf_rows(documents: &[String], vocabulary: &[String]) -> Vec<SparseRow> {
    let index: HashMap<&str, usize> = vocabulary
        .iter()
        .enumerate()
        .map(|(i, term)| (term.as_str(), i))
        .collect();

    let counts: Vec<BTreeMap<usize, f64>> = documents
        .iter()
        .map(|doc| {
            let mut tf = BTreeMap::new();
            for token in tokenize(doc) {
                if let Some(&i) = index.get(token) {
                    *tf.entry(i).or_insert(0.0) += 1.0;
                }
            }
            tf
        })
        .collect();

    let mut df = vec![0usize; vocabulary.len()];
    for tf in &counts {
        for &term in tf.keys() {
            df[term] += 1;
        }
    }

    let n = documents.len() as f64;
    let idf: Vec<f64> = df
        .iter()
        .map(|&d| ((1.0 + n) / (1.0 + d as f64)).ln() + 1.0)
        .collect();

    counts
        .into_iter()
        .map(|tf| {
            let mut row: SparseRow = tf.into_iter().map(|(t, c)| (t, c * idf[t])).collect();
            let norm = row.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
            if norm > 0.0 {
                for (_, w) in &mut row {
                    *w /= norm;
                }
            }
            row
        })
        .collect()
}

/// TF-IDF rows with their column mean, acting as the operator A_cᵀA_c.
struct CenteredTfidf {
    rows: Vec<SparseRow>,
    mean: Vec<f64>,
}

impl CenteredTfidf {
    fn new(rows: Vec<SparseRow>, terms: usize) -> Self {
        let mut mean = vec![0.0; terms];
        for row in &rows {
            for &(term, w) in row {
                mean[term] += w;
            }
        }
        let n = rows.len().max(1) as f64;
        for m in &mut mean {
            *m /= n;
        }
        Self { rows, mean }
    }

    fn non_zeros(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// `A_cᵀ (A_c x)` where row i of A_c is `rows[i] - mean`.
    fn apply(&self, x: &[f64]) -> Vec<f64> {
        let shift: f64 = self.mean.iter().zip(x).map(|(m, v)| m * v).sum();
        let mut out = vec![0.0; self.mean.len()];
        let mut total = 0.0;
        for row in &self.rows {
            let projection = row.iter().map(|&(t, w)| w * x[t]).sum::<f64>() - shift;
            total += projection;
            for &(t, w) in row {
                out[t] += projection * w;
            }
        }
        for (o, m) in out.iter_mut().zip(&self.mean) {
            *o -= total * m;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<String> {
        [
            "cats purr and cats sleep",
            "dogs bark and dogs run",
            "cats chase mice at night",
            "dogs fetch sticks in the park",
            "kittens are young cats",
            "puppies are young dogs",
            "the stock market fell today",
            "investors sold shares on the market",
            "bond yields rose as stocks fell",
            "the market rallied after earnings",
            "cats and kittens nap in the sun",
            "dogs and puppies play fetch",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn params() -> DecompositionParams {
        DecompositionParams {
            seed: Some(42),
            ..DecompositionParams::default()
        }
    }

    #[test]
    fn test_shape_matches_params() {
        let docs = corpus();
        let d = decompose_documents(&docs, &params()).unwrap();
        assert_eq!(d.axis_count(), 20);
        assert_eq!(d.vocabulary(), build_vocabulary(&docs).as_slice());
    }

    #[test]
    fn test_axes_beyond_rank_are_zero() {
        let docs = corpus();
        let d = decompose_documents(&docs, &params()).unwrap();
        // 12 centered documents span at most 11 dimensions
        for row in &d.weights()[11..] {
            assert!(row.iter().all(|&w| w == 0.0));
        }
        assert!(d.weights()[0].iter().any(|&w| w != 0.0));
    }

    #[test]
    fn test_leading_axes_are_unit_norm_and_sign_aligned() {
        let d = decompose_documents(&corpus(), &params()).unwrap();
        let row = &d.weights()[0];
        let norm = row.iter().map(|w| w * w).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6, "norm {norm}");

        let max_abs = row.iter().fold(0.0_f64, |m, w| m.max(w.abs()));
        assert!(row.iter().any(|&w| (w - max_abs).abs() < 1e-12));
    }

    #[test]
    fn test_same_seed_is_reproducible() {
        let docs = corpus();
        let a = decompose_documents(&docs, &params()).unwrap();
        let b = decompose_documents(&docs, &params()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_leading_axes_separate_topics() {
        let d = decompose_documents(&corpus(), &params()).unwrap();
        let vocab = d.vocabulary();
        let weight = |axis: usize, term: &str| {
            let i = vocab.iter().position(|t| t == term).unwrap();
            d.weights()[axis][i]
        };
        // The pets/finance and cats/dogs splits dominate the variance, so on
        // one of the first two axes "market" sits opposite a pet term.
        let separated = (0..2).any(|axis| {
            weight(axis, "market") * weight(axis, "cats") < 0.0
                || weight(axis, "market") * weight(axis, "dogs") < 0.0
        });
        assert!(separated);
    }

    #[test]
    fn test_no_terms_fails() {
        let docs: Vec<String> = (0..10).map(|_| "a b c".to_string()).collect();
        assert!(decompose_documents(&docs, &params()).is_err());
    }

    #[test]
    fn test_centered_operator_matches_dense_covariance() {
        let docs = corpus();
        let vocab = build_vocabulary(&docs);
        let matrix = CenteredTfidf::new(tfidf_rows(&docs, &vocab), vocab.len());

        let centered: Vec<Vec<f64>> = matrix
            .rows
            .iter()
            .map(|row| {
                let mut dense: Vec<f64> = matrix.mean.iter().map(|m| -m).collect();
                for &(t, w) in row {
                    dense[t] += w;
                }
                dense
            })
            .collect();

        let x: Vec<f64> = (0..vocab.len()).map(|i| ((i * 7) % 5) as f64 - 2.0).collect();
        let mut expected = vec![0.0; vocab.len()];
        for row in &centered {
            let p: f64 = row.iter().zip(&x).map(|(a, b)| a * b).sum();
            for (e, a) in expected.iter_mut().zip(row) {
                *e += p * a;
            }
        }

        for (got, want) in matrix.apply(&x).iter().zip(&expected) {
            assert!((got - want).abs() < 1e-10, "{got} vs {want}");
        }
    }

    #[test]
    fn test_leading_axes_are_orthogonal() {
        let d = decompose_documents(&corpus(), &params()).unwrap();
        let w = d.weights();
        for i in 0..5 {
            for j in i + 1..5 {
                let overlap: f64 = w[i].iter().zip(&w[j]).map(|(a, b)| a * b).sum();
                assert!(overlap.abs() < 1e-6, "axes {i} and {j}: {overlap}");
            }
        }
    }

    #[test]
    fn test_several_thousand_documents_train_quickly() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        // 3000 documents over five topics of forty words each.
        let mut rng = StdRng::seed_from_u64(19);
        let docs: Vec<String> = (0..3000)
            .map(|i| {
                let topic = i % 5;
                (0..8)
                    .map(|k| {
                        let t = if k < 6 { topic } else { rng.random_range(0..5) };
                        format!("t{t}w{:02}", rng.random_range(0..40))
                    })
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect();

        let started = std::time::Instant::now();
        let d = decompose_documents(&docs, &params()).unwrap();
        let elapsed = started.elapsed();

        assert!(elapsed.as_secs() < 60, "took {elapsed:?}");
        assert_eq!(d.axis_count(), 20);
        assert_eq!(d.vocabulary().len(), 200);
        assert!(d.weights().iter().flatten().all(|w| w.is_finite()));
        // Topic structure gives at least four non-empty axes.
        assert!(d.weights()[..4].iter().all(|row| row.iter().any(|&w| w != 0.0)));
    }

    #[test]
    fn test_tfidf_rows_normalized() {
        let docs = corpus();
        let vocab = build_vocabulary(&docs);
        for row in tfidf_rows(&docs, &vocab) {
            let norm = row.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
            assert!((norm - 1.0).abs() < 1e-12);
        }
    }
}
