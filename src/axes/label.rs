// Axis labeler — "<most positive term> vs. <most negative term>".

/// First index holding the value that `better` prefers over all others.
fn first_extreme(row: &[f64], better: impl Fn(f64, f64) -> bool) -> Option<usize> {
    row.iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &w)| match best {
            Some((_, b)) if !better(w, b) => best,
            _ => Some((i, w)),
        })
        .map(|(i, _)| i)
}

/// Label an axis from its single most positive and most negative term.
///
/// A one-term vocabulary labels as `"t vs. t"`. An empty row yields an
/// empty label.
pub fn axis_label(row: &[f64], vocabulary: &[String]) -> String {
    let positive = first_extreme(row, |w, best| w > best).and_then(|i| vocabulary.get(i));
    let negative = first_extreme(row, |w, best| w < best).and_then(|i| vocabulary.get(i));
    match (positive, negative) {
        (Some(pos), Some(neg)) => format!("{pos} vs. {neg}"),
        _ => String::new(),
    }
}
