// Copyright 2026 the Cartolayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Color and size stops.
//!
//! A stop pairs a data value with a visual attribute. Ordered stops feed the
//! interpolation and match expressions built by [`expr`](crate::expr).
//!
//! # Color modes
//!
//! [`generate_color_stops`] picks one of four paths:
//!
//! - **Categorical** (`is_gradient == false`): one stop per distinct value,
//!   colored by the [`Palette`].
//! - **Gradient**: classify the values and sample `[min, max]` colors at
//!   each break.
//! - **Diverging with a midpoint**: split the windowed values at the
//!   midpoint, classify each half against its own two-color scale, and join
//!   the halves so the midpoint appears once.
//! - **Diverging without a midpoint**: classify the windowed values against
//!   a three-color `[min, mid, max]` scale.
//!
//! A value set with a single distinct value always yields exactly one stop
//! in the first color. An empty value set yields no stops.

use std::collections::{BTreeMap, BTreeSet};

use crate::classify::{Classifier, distinct_sorted};
use crate::color::{ColorScale, Rgb};
use crate::data::{Limits, Value, numbers};

/// A data value paired with a color.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorStop {
    /// Data value at which `color` applies.
    pub stop: Value,
    /// Hex color.
    pub color: String,
}

impl ColorStop {
    /// Creates a stop.
    #[must_use]
    pub fn new(stop: impl Into<Value>, color: impl Into<String>) -> Self {
        Self {
            stop: stop.into(),
            color: color.into(),
        }
    }
}

/// An ordered stop sequence.
pub type ColorStops = Vec<ColorStop>;

/// Source of colors for categorical values.
pub trait Palette {
    /// Returns the color for `category`.
    fn color(&self, category: &str) -> String;
}

/// A [`Palette`] that cycles through fixed colors in category order, with
/// optional per-category overrides.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryPalette {
    colors: Vec<String>,
    categories: Vec<String>,
    overrides: BTreeMap<String, String>,
}

impl Default for CategoryPalette {
    fn default() -> Self {
        Self::new(
            [
                "#01b8aa", "#374649", "#fd625e", "#f2c80f", "#5f6b6d", "#8ad4eb", "#fe9666",
                "#a66999",
            ]
            .map(str::to_owned)
            .to_vec(),
        )
    }
}

impl CategoryPalette {
    /// Creates a palette cycling through `colors`.
    #[must_use]
    pub fn new(colors: Vec<String>) -> Self {
        Self {
            colors,
            categories: Vec::new(),
            overrides: BTreeMap::new(),
        }
    }

    /// Assigns `color` to `category`, overriding the cycle.
    #[must_use]
    pub fn with_override(mut self, category: &str, color: &str) -> Self {
        self.overrides.insert(category.to_owned(), color.to_owned());
        self
    }

    /// Registers categories in first-seen order. Known categories keep their
    /// position, so colors stay stable across updates.
    pub fn update<'a>(&mut self, categories: impl IntoIterator<Item = &'a str>) {
        for c in categories {
            if !self.categories.iter().any(|known| known == c) {
                self.categories.push(c.to_owned());
            }
        }
    }
}

impl Palette for CategoryPalette {
    fn color(&self, category: &str) -> String {
        if let Some(c) = self.overrides.get(category) {
            return c.clone();
        }
        if self.colors.is_empty() {
            return Rgb::BLACK.to_string();
        }
        let index = self
            .categories
            .iter()
            .position(|known| known == category)
            .unwrap_or(0);
        self.colors[index % self.colors.len()].clone()
    }
}

/// Color ramp configuration of one layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorRampSettings<'a> {
    /// Use a three-color scale.
    pub diverging: bool,
    /// Color of the lowest class.
    pub min_color: &'a str,
    /// Color at the midpoint.
    pub mid_color: &'a str,
    /// Color of the highest class.
    pub max_color: &'a str,
    /// Lower bound of the diverging window.
    pub min_value: Option<f64>,
    /// Split point.
    pub mid_value: Option<f64>,
    /// Upper bound of the diverging window.
    pub max_value: Option<f64>,
}

/// Builds color stops for one layer.
///
/// `limits` are the color limits of the layer's data source; unbound fields
/// arrive as [`Limits::empty`] and produce no stops.
#[must_use]
pub fn generate_color_stops(
    ramp: &ColorRampSettings<'_>,
    is_gradient: bool,
    limits: &Limits,
    palette: &dyn Palette,
    classifier: &Classifier,
) -> ColorStops {
    if !is_gradient {
        let mut seen = BTreeSet::new();
        return limits
            .values
            .iter()
            .map(ToString::to_string)
            .filter(|label| seen.insert(label.clone()))
            .map(|label| {
                let color = palette.color(&label);
                ColorStop::new(label, color)
            })
            .collect();
    }

    let values = numbers(&limits.values);
    if !ramp.diverging {
        let class_count = classifier.class_count(&values);
        return map_values_to_color_stops(
            &[ramp.min_color, ramp.max_color],
            classifier,
            class_count,
            &values,
        );
    }

    let window = |v: &f64| {
        ramp.min_value.is_none_or(|lo| *v >= lo) && ramp.max_value.is_none_or(|hi| *v <= hi)
    };
    let mut filtered: Vec<f64> = values.into_iter().filter(window).collect();

    let Some(mid) = ramp.mid_value else {
        filtered.extend(ramp.min_value);
        filtered.extend(ramp.max_value);
        let class_count = classifier.class_count(&filtered);
        return map_values_to_color_stops(
            &[ramp.min_color, ramp.mid_color, ramp.max_color],
            classifier,
            class_count,
            &filtered,
        );
    };

    let mut lower: Vec<f64> = ramp.min_value.into_iter().collect();
    let mut upper = vec![mid];
    for v in filtered {
        if v < mid {
            lower.push(v);
        } else {
            upper.push(v);
        }
    }
    upper.extend(ramp.max_value);
    lower.push(mid);

    let lower_count = classifier.class_count(&lower) >> 1;
    let upper_count = classifier.class_count(&upper) >> 1;
    let mut stops = map_values_to_color_stops(
        &[ramp.min_color, ramp.mid_color],
        classifier,
        lower_count,
        &lower,
    );
    let upper_stops = map_values_to_color_stops(
        &[ramp.mid_color, ramp.max_color],
        classifier,
        upper_count,
        &upper,
    );
    // Both halves end on the midpoint.
    stops.pop();
    stops.extend(upper_stops);
    stops
}

/// Maps `values` onto `colors`, one stop per class break.
///
/// With fewer than two classes the distinct values themselves are used as
/// the domain. Equal adjacent breaks are merged so interpolation inputs stay
/// strictly ascending.
#[must_use]
pub fn map_values_to_color_stops(
    colors: &[&str],
    classifier: &Classifier,
    class_count: usize,
    values: &[f64],
) -> ColorStops {
    let distinct = distinct_sorted(values);
    let scale = ColorScale::new(colors);
    match distinct.as_slice() {
        [] => return Vec::new(),
        [only] => return vec![ColorStop::new(*only, scale.at(0.0).to_string())],
        _ => {}
    }
    let domain = if class_count >= 2 {
        let mut breaks = classifier.breaks(values, class_count);
        breaks.dedup();
        breaks
    } else {
        distinct
    };
    let colors = scale.colors(domain.len());
    domain
        .into_iter()
        .zip(colors)
        .map(|(v, c)| ColorStop::new(v, c))
        .collect()
}

/// Evaluates gradient color stops at arbitrary values.
///
/// Values below the first stop take its color, values above the last stop
/// take the last color, and values in between are interpolated in RGB.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorRamp {
    stops: Vec<(f64, Rgb)>,
}

impl ColorRamp {
    /// Builds a ramp from the numeric stops of `stops`.
    #[must_use]
    pub fn new(stops: &[ColorStop]) -> Self {
        Self {
            stops: stops
                .iter()
                .filter_map(|s| Some((s.stop.as_number()?, Rgb::parse_or_black(&s.color))))
                .collect(),
        }
    }

    /// Color at `value`, or `None` for an empty ramp.
    #[must_use]
    pub fn color_at(&self, value: f64) -> Option<Rgb> {
        let (first, last) = (self.stops.first()?, self.stops.last()?);
        if value <= first.0 {
            return Some(first.1);
        }
        if value >= last.0 {
            return Some(last.1);
        }
        self.stops.windows(2).find_map(|w| {
            let ((a, ca), (b, cb)) = (w[0], w[1]);
            (value <= b).then(|| ca.lerp(cb, (value - a) / (b - a)))
        })
    }
}

/// A data value paired with a size in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SizeStop {
    /// Data value at which `size` applies.
    pub stop: f64,
    /// Size in pixels.
    pub size: f64,
}

/// Builds size stops ramping from `base` to `base * scale_factor` across
/// the classified size values.
///
/// Returns `None` when the size field is unbound, has no range, or cannot
/// be classified; callers then fall back to a zoom-only ramp.
#[must_use]
pub fn size_stops(
    limits: &Limits,
    base: f64,
    scale_factor: f64,
    classifier: &Classifier,
) -> Option<Vec<SizeStop>> {
    if !limits.has_range() {
        return None;
    }
    let values = numbers(&limits.values);
    let class_count = classifier.class_count(&values);
    if class_count == 0 {
        return None;
    }
    let mut breaks = classifier.breaks(&values, class_count);
    breaks.dedup();
    let steps = (breaks.len().max(2) - 1) as f64;
    let delta = (base * scale_factor - base) / steps;
    Some(
        breaks
            .into_iter()
            .enumerate()
            .map(|(i, stop)| SizeStop {
                stop,
                size: base + i as f64 * delta,
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp<'a>(diverging: bool) -> ColorRampSettings<'a> {
        ColorRampSettings {
            diverging,
            min_color: "#000000",
            mid_color: "#808080",
            max_color: "#ffffff",
            min_value: None,
            mid_value: None,
            max_value: None,
        }
    }

    fn limits(values: &[f64]) -> Limits {
        Limits::from_values(values.iter().copied().map(Value::Number).collect())
    }

    fn stop_values(stops: &[ColorStop]) -> Vec<f64> {
        stops.iter().filter_map(|s| s.stop.as_number()).collect()
    }

    #[test]
    fn gradient_spans_min_to_max_color() {
        let values: Vec<f64> = (1_u8..=10).map(f64::from).collect();
        let stops = generate_color_stops(
            &ramp(false),
            true,
            &limits(&values),
            &CategoryPalette::default(),
            &Classifier::default(),
        );
        assert_eq!(stops.len(), 6);
        assert_eq!(stops[0], ColorStop::new(1.0, "#000000"));
        assert_eq!(stops[5], ColorStop::new(10.0, "#ffffff"));
        let v = stop_values(&stops);
        assert!(v.windows(2).all(|w| w[0] < w[1]), "ascending: {v:?}");
    }

    #[test]
    fn single_value_yields_one_stop_in_first_color() {
        let stops = generate_color_stops(
            &ramp(false),
            true,
            &limits(&[4.0, 4.0, 4.0]),
            &CategoryPalette::default(),
            &Classifier::default(),
        );
        assert_eq!(stops, [ColorStop::new(4.0, "#000000")]);
    }

    #[test]
    fn unbound_field_yields_no_stops() {
        let stops = generate_color_stops(
            &ramp(false),
            true,
            &Limits::empty(),
            &CategoryPalette::default(),
            &Classifier::default(),
        );
        assert!(stops.is_empty(), "got {stops:?}");
    }

    #[test]
    fn diverging_midpoint_appears_once() {
        let mut r = ramp(true);
        r.min_value = Some(0.0);
        r.mid_value = Some(5.0);
        r.max_value = Some(10.0);
        let stops = generate_color_stops(
            &r,
            true,
            &limits(&[0.0, 2.0, 4.0, 6.0, 8.0, 10.0]),
            &CategoryPalette::default(),
            &Classifier::default(),
        );
        let v = stop_values(&stops);
        assert_eq!(v.iter().filter(|x| **x == 5.0).count(), 1, "stops {v:?}");
        assert_eq!(v.first(), Some(&0.0));
        assert_eq!(v.last(), Some(&10.0));
        assert!(v.windows(2).all(|w| w[0] < w[1]), "ascending: {v:?}");
        let mid = stops.iter().find(|s| s.stop == Value::Number(5.0)).unwrap();
        assert_eq!(mid.color, "#808080");
    }

    #[test]
    fn diverging_window_drops_outliers() {
        let mut r = ramp(true);
        r.min_value = Some(0.0);
        r.mid_value = Some(5.0);
        r.max_value = Some(10.0);
        let stops = generate_color_stops(
            &r,
            true,
            &limits(&[-50.0, 1.0, 9.0, 500.0]),
            &CategoryPalette::default(),
            &Classifier::default(),
        );
        let v = stop_values(&stops);
        assert!(v.iter().all(|x| (0.0..=10.0).contains(x)), "stops {v:?}");
    }

    #[test]
    fn diverging_without_midpoint_uses_three_colors() {
        let r = ramp(true);
        let stops = generate_color_stops(
            &r,
            true,
            &limits(&[0.0, 5.0, 10.0]),
            &CategoryPalette::default(),
            &Classifier::default(),
        );
        let colors: Vec<&str> = stops.iter().map(|s| s.color.as_str()).collect();
        assert_eq!(colors, ["#000000", "#808080", "#ffffff"]);
    }

    #[test]
    fn categorical_stops_are_distinct_and_palette_colored() {
        let mut palette = CategoryPalette::new(vec!["#111111".into(), "#222222".into()])
            .with_override("gold", "#ffd700");
        palette.update(["north", "south"]);
        let values = Limits::from_values(
            ["north", "south", "north", "gold"]
                .into_iter()
                .map(Value::from)
                .collect(),
        );
        let stops =
            generate_color_stops(&ramp(false), false, &values, &palette, &Classifier::default());
        assert_eq!(
            stops,
            [
                ColorStop::new("north", "#111111"),
                ColorStop::new("south", "#222222"),
                ColorStop::new("gold", "#ffd700"),
            ]
        );
    }

    #[test]
    fn ramp_interpolates_between_stops() {
        let r = ColorRamp::new(&[ColorStop::new(0.0, "#000000"), ColorStop::new(10.0, "#ffffff")]);
        assert_eq!(r.color_at(-3.0), Some(Rgb::BLACK));
        assert_eq!(r.color_at(5.0), Some(Rgb::new(128, 128, 128)));
        assert_eq!(r.color_at(99.0), Some(Rgb::new(255, 255, 255)));
        assert_eq!(ColorRamp::new(&[]).color_at(1.0), None);
    }

    #[test]
    fn size_stops_grow_linearly() {
        let stops = size_stops(&limits(&[1.0, 2.0, 3.0]), 3.0, 5.0, &Classifier::default())
            .unwrap();
        assert_eq!(
            stops,
            [
                SizeStop { stop: 1.0, size: 3.0 },
                SizeStop { stop: 2.0, size: 9.0 },
                SizeStop { stop: 3.0, size: 15.0 },
            ]
        );
    }

    #[test]
    fn size_stops_need_a_range() {
        let c = Classifier::default();
        assert!(size_stops(&Limits::empty(), 3.0, 5.0, &c).is_none(), "unbound");
        assert!(size_stops(&limits(&[2.0, 2.0]), 3.0, 5.0, &c).is_none(), "constant");
    }
}
