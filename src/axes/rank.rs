// Stable ranking of weight rows.
//
// Ties always keep vocabulary order, so every view is deterministic for a
// given decomposition.

use std::cmp::Ordering;

/// Indices of the `k` largest values, largest first.
pub fn top_descending(values: &[f64], k: usize) -> Vec<usize> {
    ranked(values, k, |a, b| b.partial_cmp(&a).unwrap_or(Ordering::Equal))
}

/// Indices of the `k` smallest values, smallest first.
pub fn top_ascending(values: &[f64], k: usize) -> Vec<usize> {
    ranked(values, k, |a, b| a.partial_cmp(&b).unwrap_or(Ordering::Equal))
}

fn ranked(values: &[f64], k: usize, mut cmp: impl FnMut(f64, f64) -> Ordering) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..values.len()).collect();
    // sort_by is stable: equal values stay in index order.
    indices.sort_by(|&a, &b| cmp(values[a], values[b]));
    indices.truncate(k);
    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descending_with_ties() {
        let values = [0.5, 0.9, 0.5, -1.0, 0.9];
        assert_eq!(top_descending(&values, 3), vec![1, 4, 0]);
    }

    #[test]
    fn test_ascending_with_ties() {
        let values = [0.5, -1.0, 0.5, -1.0];
        assert_eq!(top_ascending(&values, 3), vec![1, 3, 0]);
    }

    #[test]
    fn test_k_larger_than_len() {
        assert_eq!(top_descending(&[1.0, 2.0], 10), vec![1, 0]);
        assert!(top_ascending(&[], 5).is_empty());
    }
}
