// Copyright 2026 the Cartolayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Class counts and class breaks for numeric value sets.
//!
//! A [`Classifier`] decides how many classes a value set supports
//! ([`Classifier::class_count`]) and where their representative values lie
//! ([`Classifier::breaks`]).
//!
//! # Class count
//!
//! The class count is the number of distinct finite values, capped at
//! [`Classifier::max_classes`]. Fewer than two distinct values yield `0`,
//! which means "no classification possible"; callers special-case it.
//!
//! # Breaks
//!
//! `breaks(values, c)` returns exactly `c` non-decreasing values. The first
//! break is always the minimum and the last is always the maximum, so a
//! gradient built from the breaks spans the whole data range.
//!
//! - [`ClassificationMethod::Quantile`] places break `i` at probability
//!   `i / (c - 1)` of the sorted values, interpolating linearly between
//!   neighbouring ranks. Heavily skewed data therefore gets more breaks
//!   where the data is dense.
//! - [`ClassificationMethod::EqualInterval`] splits `[min, max]` into equal
//!   steps regardless of distribution.
//!
//! Non-finite values are ignored everywhere.

use serde::{Deserialize, Serialize};

/// Default cap on the number of classes.
pub const DEFAULT_MAX_CLASSES: usize = 6;

/// Strategy for choosing class breaks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassificationMethod {
    /// Breaks at evenly spaced quantiles of the data.
    #[default]
    Quantile,
    /// Breaks at evenly spaced values between minimum and maximum.
    EqualInterval,
}

/// Class-count heuristic plus break strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Classifier {
    /// How breaks are placed.
    pub method: ClassificationMethod,
    /// Upper bound for [`class_count`](Self::class_count). Values below 2
    /// are treated as 2.
    pub max_classes: usize,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            method: ClassificationMethod::Quantile,
            max_classes: DEFAULT_MAX_CLASSES,
        }
    }
}

impl Classifier {
    /// Creates a classifier with the given method and class cap.
    #[must_use]
    pub fn new(method: ClassificationMethod, max_classes: usize) -> Self {
        Self {
            method,
            max_classes,
        }
    }

    /// Number of classes `values` supports, or `0` for fewer than two
    /// distinct finite values.
    #[must_use]
    pub fn class_count(&self, values: &[f64]) -> usize {
        let distinct = distinct_sorted(values).len();
        if distinct < 2 {
            0
        } else {
            distinct.min(self.max_classes.max(2))
        }
    }

    /// Returns `class_count` non-decreasing break values.
    ///
    /// Returns an empty vector when `class_count` is `0` or `values` has no
    /// finite values. A single class is represented by the median.
    #[must_use]
    pub fn breaks(&self, values: &[f64], class_count: usize) -> Vec<f64> {
        let sorted = sorted_finite(values);
        if class_count == 0 || sorted.is_empty() {
            return Vec::new();
        }
        if class_count == 1 {
            return vec![quantile(&sorted, 0.5)];
        }

        let last = (class_count - 1) as f64;
        match self.method {
            ClassificationMethod::Quantile => (0..class_count)
                .map(|i| quantile(&sorted, i as f64 / last))
                .collect(),
            ClassificationMethod::EqualInterval => {
                let lo = sorted[0];
                let hi = sorted[sorted.len() - 1];
                (0..class_count)
                    .map(|i| {
                        if i + 1 == class_count {
                            hi
                        } else {
                            (lo + (hi - lo) * (i as f64 / last)).min(hi)
                        }
                    })
                    .collect()
            }
        }
    }
}

/// Returns the finite values of `values`, sorted ascending.
#[must_use]
pub fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Returns the distinct finite values of `values`, sorted ascending.
#[must_use]
pub fn distinct_sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = sorted_finite(values);
    sorted.dedup();
    sorted
}

/// Linear-interpolated quantile `p` in `[0, 1]` of non-empty sorted data.
#[expect(
    clippy::cast_possible_truncation,
    reason = "rank is in 0..len after floor/ceil of a clamped position"
)]
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let pos = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let (a, b) = (sorted[lo], sorted[hi]);
    if lo == hi {
        return a;
    }
    (a + (b - a) * (pos - lo as f64)).clamp(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_count_is_zero_below_two_distinct_values() {
        let c = Classifier::default();
        assert_eq!(c.class_count(&[]), 0);
        assert_eq!(c.class_count(&[7.0]), 0);
        assert_eq!(c.class_count(&[7.0, 7.0, 7.0]), 0);
        assert_eq!(c.class_count(&[f64::NAN, 1.0]), 0);
    }

    #[test]
    fn class_count_is_capped() {
        let c = Classifier::default();
        assert_eq!(c.class_count(&[1.0, 2.0, 2.0, 3.0]), 3);
        let many: Vec<f64> = (0_u8..100).map(f64::from).collect();
        assert_eq!(c.class_count(&many), DEFAULT_MAX_CLASSES);
        let narrow = Classifier::new(ClassificationMethod::Quantile, 0);
        assert_eq!(narrow.class_count(&many), 2);
    }

    #[test]
    fn quantile_breaks_span_the_data() {
        let values: Vec<f64> = (1_u8..=10).map(f64::from).collect();
        let c = Classifier::default();
        let breaks = c.breaks(&values, 6);
        assert_eq!(breaks.len(), 6);
        assert_eq!(breaks[0], 1.0);
        assert_eq!(breaks[5], 10.0);
        let expected = [1.0, 2.8, 4.6, 6.4, 8.2, 10.0];
        for (b, e) in breaks.iter().zip(expected) {
            assert!((b - e).abs() < 1e-9, "break {b} != {e}");
        }
    }

    #[test]
    fn quantile_breaks_follow_density() {
        let values = [0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 100.0];
        let breaks = Classifier::default().breaks(&values, 3);
        assert_eq!(breaks, [0.0, 1.0, 100.0]);
    }

    #[test]
    fn equal_interval_breaks_ignore_density() {
        let values = [0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 100.0];
        let c = Classifier::new(ClassificationMethod::EqualInterval, 6);
        assert_eq!(c.breaks(&values, 3), [0.0, 50.0, 100.0]);
    }

    #[test]
    fn degenerate_break_requests() {
        let c = Classifier::default();
        assert!(c.breaks(&[1.0, 2.0], 0).is_empty(), "zero classes");
        assert!(c.breaks(&[], 3).is_empty(), "no data");
        assert_eq!(c.breaks(&[1.0, 2.0, 9.0], 1), [2.0]);
    }
}
