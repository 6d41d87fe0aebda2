// Axis summarizer — the terms at each pole of every axis.

use serde::{Deserialize, Serialize};

use super::rank::{top_ascending, top_descending};
use crate::decomposition::Decomposition;

/// Terms reported per pole.
pub const TOP_TERMS: usize = 10;

/// Both poles of one axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisSummary {
    /// Axis index within the current decomposition
    pub id: usize,
    /// Display name, "Axis {id}"
    pub name: String,
    /// Highest-weighted terms, strongest first
    pub positive: Vec<String>,
    /// Lowest-weighted terms, most negative first
    pub negative: Vec<String>,
}

pub fn axis_name(index: usize) -> String {
    format!("Axis {index}")
}

/// Summarize one weight row. Short vocabularies yield shorter lists.
pub fn summarize_axis(
    index: usize,
    row: &[f64],
    vocabulary: &[String],
    top_k: usize,
) -> AxisSummary {
    let terms = |indices: Vec<usize>| -> Vec<String> {
        indices
            .into_iter()
            .filter_map(|i| vocabulary.get(i).cloned())
            .collect()
    };

    AxisSummary {
        id: index,
        name: axis_name(index),
        positive: terms(top_descending(row, top_k)),
        negative: terms(top_ascending(row, top_k)),
    }
}

/// Summarize every axis of a decomposition, in axis order.
pub fn summarize_axes(decomposition: &Decomposition, top_k: usize) -> Vec<AxisSummary> {
    decomposition
        .weights()
        .iter()
        .enumerate()
        .map(|(i, row)| summarize_axis(i, row, decomposition.vocabulary(), top_k))
        .collect()
}
