//! Summary statistics over portfolio values.
//!
//! Values are rounded to cents before any statistic is taken, so two
//! portfolios that differ only by floating-point noise count as equal when
//! looking for a mode.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// `None` when no single value occurs more often than every other
    pub mode: Option<f64>,
    pub min: f64,
    pub max: f64,
}

/// Rounds to two decimal places.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Returns `None` for an empty group.
pub fn summarize(values: &[f64]) -> Option<GroupStats> {
    if values.is_empty() {
        return None;
    }

    let mut sorted: Vec<f64> = values.iter().map(|v| round_cents(*v)).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let count = sorted.len();
    let mean = sorted.iter().sum::<f64>() / count as f64;

    Some(GroupStats {
        count,
        mean: round_cents(mean),
        median: round_cents(median_of_sorted(&sorted)),
        mode: unique_mode_of_sorted(&sorted),
        min: sorted[0],
        max: sorted[count - 1],
    })
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn unique_mode_of_sorted(sorted: &[f64]) -> Option<f64> {
    let mut best: Option<(f64, usize)> = None;
    let mut tied = false;

    let mut start = 0;
    while start < sorted.len() {
        let value = sorted[start];
        let len = sorted[start..].iter().take_while(|v| **v == value).count();
        match best {
            Some((_, n)) if len < n => {}
            Some((_, n)) if len == n => tied = true,
            _ => {
                best = Some((value, len));
                tied = false;
            }
        }
        start += len;
    }

    match best {
        Some((value, _)) if !tied => Some(value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_group() {
        assert_eq!(summarize(&[]), None);
    }

    #[test]
    fn test_basic_stats() {
        let stats = summarize(&[1100.0, 900.0, 1000.0, 1000.0]).unwrap();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean, 1000.0);
        assert_eq!(stats.median, 1000.0);
        assert_eq!(stats.mode, Some(1000.0));
        assert_eq!(stats.min, 900.0);
        assert_eq!(stats.max, 1100.0);
    }

    #[test]
    fn test_no_unique_mode() {
        let stats = summarize(&[858.0, 660.0]).unwrap();
        assert_eq!(stats.mode, None);
        assert_eq!(stats.median, 759.0);
        assert_eq!(stats.mean, 759.0);
    }

    #[test]
    fn test_single_value_is_its_own_mode() {
        let stats = summarize(&[1000.0]).unwrap();
        assert_eq!(stats.mode, Some(1000.0));
        assert_eq!(stats.median, 1000.0);
    }

    #[test]
    fn test_rounding_merges_float_noise() {
        let stats = summarize(&[858.0000000000001, 858.0, 660.0]).unwrap();
        assert_eq!(stats.mode, Some(858.0));
    }
}
