// Copyright 2026 the Cartolayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cached value summaries owned by data sources.

use super::{Column, Value, numbers};

/// The values of one bound field plus their numeric bounds.
///
/// An unbound field is represented by [`Limits::empty`], which classifies to
/// an empty stop list instead of failing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Limits {
    /// Field values as seen by the active data set; may contain duplicates.
    pub values: Vec<Value>,
    /// Smallest finite number in `values`.
    pub min: Option<f64>,
    /// Largest finite number in `values`.
    pub max: Option<f64>,
}

impl Limits {
    /// Neutral limits for an unbound field.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Summarizes `values`.
    #[must_use]
    pub fn from_values(values: Vec<Value>) -> Self {
        let nums = numbers(&values);
        let min = nums.iter().copied().reduce(f64::min);
        let max = nums.iter().copied().reduce(f64::max);
        Self { values, min, max }
    }

    /// Summarizes a column, or returns neutral limits when it is unbound.
    #[must_use]
    pub fn from_column(column: Option<&Column>) -> Self {
        column.map_or_else(Self::empty, |c| Self::from_values(c.values.clone()))
    }

    /// Returns true if no field is bound or the field has no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns true if `min` and `max` are both known and differ.
    #[must_use]
    pub fn has_range(&self) -> bool {
        matches!((self.min, self.max), (Some(lo), Some(hi)) if lo < hi)
    }
}

/// Color and size limits of one data source.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceLimits {
    /// Limits of the color field.
    pub color: Limits,
    /// Limits of the size field.
    pub size: Limits,
}
