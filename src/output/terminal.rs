// Colored terminal output for axis summaries and scatter plots.
//
// Used by the `analyze` and `plot` commands; the web server returns the
// same data as JSON instead.

use colored::Colorize;

use super::truncate_chars;
use crate::axes::{AxisSummary, PlotData};
use crate::session::TrainReport;

/// Plot area for the text scatter, in characters.
const GRID_WIDTH: usize = 64;
const GRID_HEIGHT: usize = 20;

/// Display the axes found by a training run.
pub fn display_training_report(report: &TrainReport) {
    println!(
        "\n{}",
        format!(
            "=== {} semantic axes ({} documents, {} terms) ===",
            report.topics.len(),
            report.n_documents,
            report.vocabulary_size
        )
        .bold()
    );
    println!();

    for axis in &report.topics {
        display_axis(axis);
    }
}

fn display_axis(axis: &AxisSummary) {
    let pole = |terms: &[String]| terms.join(", ");
    println!("  {}", axis.name.bold());
    println!("      {} {}", "+".green().bold(), pole(&axis.positive).green());
    println!("      {} {}", "-".red().bold(), pole(&axis.negative).red());
    println!();
}

/// Display a reduced scatter dataset as a text plot followed by a table of
/// the strongest terms.
pub fn display_plot(plot: &PlotData, table_rows: usize) {
    println!(
        "\n{}",
        format!(
            "=== {} (x) against {} (y), {} terms ===",
            plot.axis_x_label,
            plot.axis_y_label,
            plot.plot_data.len()
        )
        .bold()
    );
    println!();

    for line in render_grid(plot) {
        println!("  {line}");
    }
    println!();

    println!(
        "  {:<24} {:>9} {:>9} {:>9}",
        "Term".dimmed(),
        "x".dimmed(),
        "y".dimmed(),
        "|x|+|y|".dimmed(),
    );
    println!("  {}", "-".repeat(54).dimmed());
    for point in plot.plot_data.iter().take(table_rows) {
        println!(
            "  {:<24} {:>9.4} {:>9.4} {:>9.4}",
            truncate_chars(&point.word, 21),
            point.x,
            point.y,
            point.magnitude,
        );
    }
    if plot.plot_data.len() > table_rows {
        println!(
            "  {}",
            format!("... {} more", plot.plot_data.len() - table_rows).dimmed()
        );
    }
}

/// Render plotted terms onto a character grid, one '*' per occupied cell.
/// The plotted range always includes the origin, which is drawn as axes.
pub fn render_grid(plot: &PlotData) -> Vec<String> {
    let mut grid = vec![vec![' '; GRID_WIDTH]; GRID_HEIGHT];
    if plot.plot_data.is_empty() {
        return grid.into_iter().map(|row| row.into_iter().collect()).collect();
    }

    let bounds = |values: Vec<f64>| {
        let lo = values.iter().cloned().fold(f64::INFINITY, f64::min).min(0.0);
        let hi = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max).max(0.0);
        (lo, if hi > lo { hi } else { lo + 1.0 })
    };
    let (x_lo, x_hi) = bounds(plot.plot_data.iter().map(|p| p.x).collect());
    let (y_lo, y_hi) = bounds(plot.plot_data.iter().map(|p| p.y).collect());

    let to_col = |x: f64| (((x - x_lo) / (x_hi - x_lo)) * (GRID_WIDTH - 1) as f64).round() as usize;
    // Row 0 is the top of the plot.
    let to_row = |y: f64| {
        GRID_HEIGHT - 1 - (((y - y_lo) / (y_hi - y_lo)) * (GRID_HEIGHT - 1) as f64).round() as usize
    };

    let origin_col = to_col(0.0);
    let origin_row = to_row(0.0);
    for cells in grid.iter_mut() {
        cells[origin_col] = '|';
    }
    for cell in grid[origin_row].iter_mut() {
        *cell = '-';
    }
    grid[origin_row][origin_col] = '+';

    for point in &plot.plot_data {
        grid[to_row(point.y)][to_col(point.x)] = '*';
    }

    grid.into_iter().map(|row| row.into_iter().collect()).collect()
}
