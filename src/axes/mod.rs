// Axis views over a trained decomposition — per-axis term summaries, axis
// labels, and the reduced two-axis scatter dataset.

pub mod label;
pub mod plot;
pub mod rank;
pub mod summary;

pub use label::axis_label;
pub use plot::{reduce_for_plot, resolve_axis, PlotData, PlotPoint, MAX_PLOT_TERMS};
pub use summary::{summarize_axes, AxisSummary, TOP_TERMS};
