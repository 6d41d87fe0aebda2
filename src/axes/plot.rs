// Visualization reducer — the terms worth plotting on a chosen pair of axes.
//
// Terms are ranked by their L1 magnitude over both axes, |x| + |y|, and the
// top MAX_PLOT_TERMS are kept with their coordinates.

use serde::{Deserialize, Serialize};

use super::label::axis_label;
use super::rank::top_descending;
use crate::decomposition::Decomposition;
use crate::error::AxisError;

/// Most terms returned for one scatter plot.
pub const MAX_PLOT_TERMS: usize = 200;

/// One plotted term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotPoint {
    pub word: String,
    pub x: f64,
    pub y: f64,
    pub magnitude: f64,
}

/// Scatter dataset for a pair of axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotData {
    /// Selected terms, largest magnitude first (order is not part of the contract)
    pub plot_data: Vec<PlotPoint>,
    pub axis_x_label: String,
    pub axis_y_label: String,
}

/// Convert a requested (possibly negative) axis index into a valid one.
pub fn resolve_axis(requested: i64, axis_count: usize) -> Result<usize, AxisError> {
    usize::try_from(requested)
        .ok()
        .filter(|&axis| axis < axis_count)
        .ok_or_else(|| AxisError::invalid_axis(requested, axis_count))
}

/// Build the scatter dataset for `axis_x` against `axis_y`.
///
/// Returns exactly `min(limit, vocabulary_size)` points. The two axes may be
/// the same.
pub fn reduce_for_plot(
    decomposition: &Decomposition,
    axis_x: usize,
    axis_y: usize,
    limit: usize,
) -> Result<PlotData, AxisError> {
    let axis_count = decomposition.axis_count();
    let row = |axis: usize| {
        decomposition
            .axis(axis)
            .ok_or_else(|| AxisError::invalid_axis(axis as i64, axis_count))
    };
    let xs = row(axis_x)?;
    let ys = row(axis_y)?;
    let vocabulary = decomposition.vocabulary();

    let magnitude: Vec<f64> = xs.iter().zip(ys).map(|(x, y)| x.abs() + y.abs()).collect();

    let plot_data = top_descending(&magnitude, limit)
        .into_iter()
        .map(|i| PlotPoint {
            word: vocabulary[i].clone(),
            x: xs[i],
            y: ys[i],
            magnitude: magnitude[i],
        })
        .collect();

    Ok(PlotData {
        plot_data,
        axis_x_label: axis_label(xs, vocabulary),
        axis_y_label: axis_label(ys, vocabulary),
    })
}
