// Decomposition — the vocabulary and axis weight matrix produced by an engine.
//
// Construction validates the engine's output so every consumer can rely on a
// rectangular, finite matrix aligned with a non-empty, duplicate-free
// vocabulary.

use std::collections::HashSet;

use anyhow::Result;

/// Vocabulary plus one signed weight row per axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition {
    vocabulary: Vec<String>,
    /// Shape: [axis_count][vocabulary.len()]
    weights: Vec<Vec<f64>>,
}

impl Decomposition {
    pub fn new(vocabulary: Vec<String>, weights: Vec<Vec<f64>>) -> Result<Self> {
        if vocabulary.is_empty() {
            anyhow::bail!("Decomposition has an empty vocabulary");
        }
        if weights.is_empty() {
            anyhow::bail!("Decomposition has no axes");
        }

        let mut seen = HashSet::with_capacity(vocabulary.len());
        if let Some(dup) = vocabulary.iter().find(|term| !seen.insert(term.as_str())) {
            anyhow::bail!("Vocabulary contains duplicate term {dup:?}");
        }

        for (axis, row) in weights.iter().enumerate() {
            if row.len() != vocabulary.len() {
                anyhow::bail!(
                    "Axis {axis} has {} weights but the vocabulary has {} terms",
                    row.len(),
                    vocabulary.len()
                );
            }
            if let Some(pos) = row.iter().position(|w| !w.is_finite()) {
                anyhow::bail!("Axis {axis} has a non-finite weight for term {:?}", vocabulary[pos]);
            }
        }

        Ok(Self {
            vocabulary,
            weights,
        })
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn weights(&self) -> &[Vec<f64>] {
        &self.weights
    }

    pub fn axis_count(&self) -> usize {
        self.weights.len()
    }

    /// Weight row for one axis, or `None` if the index is out of range.
    pub fn axis(&self, index: usize) -> Option<&[f64]> {
        self.weights.get(index).map(Vec::as_slice)
    }
}
