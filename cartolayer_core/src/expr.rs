// Copyright 2026 the Cartolayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Declarative style expressions.
//!
//! Expressions are JSON arrays in the renderer's style language, e.g.
//! `["interpolate", ["linear"], ["to-number", ["get", "pop"]], 1, "#000000"]`.
//! Builders here only assemble arrays; the renderer evaluates them.

use serde_json::{Value, json};

use crate::data::Value as CellValue;
use crate::stops::{ColorStop, SizeStop};

/// Fully transparent color used as the `match` fallback.
pub const TRANSPARENT: &str = "rgba(0,0,0,0)";

/// Minimum length of a `match` expression accepted by the renderer:
/// operator, input, one label/output pair, and a fallback.
pub const MATCH_MIN_LEN: usize = 5;

/// Zoom level at which zoom ramps reach their final value.
pub const RAMP_MAX_ZOOM: f64 = 18.0;

/// `["get", field]`.
#[must_use]
pub fn get(field: &str) -> Value {
    json!(["get", field])
}

/// `["to-number", ["get", field]]`.
#[must_use]
pub fn get_number(field: &str) -> Value {
    json!(["to-number", get(field)])
}

/// `["to-string", ["get", field]]`.
#[must_use]
pub fn get_string(field: &str) -> Value {
    json!(["to-string", get(field)])
}

/// Linear interpolation of `input` through `(stop, output)` pairs.
#[must_use]
pub fn interpolate(input: Value, stops: impl IntoIterator<Item = (Value, Value)>) -> Value {
    let mut expr = vec![json!("interpolate"), json!(["linear"]), input];
    for (stop, output) in stops {
        expr.push(stop);
        expr.push(output);
    }
    Value::Array(expr)
}

/// Linear ramp from `at_zero` at zoom 0 to `at_max` at [`RAMP_MAX_ZOOM`].
#[must_use]
pub fn zoom_ramp(at_zero: f64, at_max: f64) -> Value {
    interpolate(
        json!(["zoom"]),
        [(json!(0), json!(at_zero)), (json!(RAMP_MAX_ZOOM), json!(at_max))],
    )
}

/// Discrete `match` on `input`, padded with `fallback` so the expression
/// always has at least [`MATCH_MIN_LEN`] entries and ends in a default.
#[must_use]
pub fn match_expr(
    input: Value,
    cases: impl IntoIterator<Item = (Value, Value)>,
    fallback: &str,
) -> Value {
    let mut expr = vec![json!("match"), input];
    for (label, output) in cases {
        expr.push(label);
        expr.push(output);
    }
    let padding = MATCH_MIN_LEN.saturating_sub(expr.len()).max(1);
    expr.extend(core::iter::repeat_n(json!(fallback), padding));
    Value::Array(expr)
}

/// Color style for a data field.
///
/// Without a bound field the layer is painted flat in `flat_color`.
/// Gradient stops interpolate over the field as a number; categorical stops
/// match the field as a string with a transparent fallback.
#[must_use]
pub fn color_expression(
    field: Option<&str>,
    is_gradient: bool,
    stops: &[ColorStop],
    flat_color: &str,
) -> Value {
    let Some(field) = field else {
        return json!(flat_color);
    };
    if stops.is_empty() {
        return json!(flat_color);
    }
    if is_gradient {
        interpolate(
            get_number(field),
            stops.iter().map(|s| (s.stop.to_json(), json!(s.color))),
        )
    } else {
        match_expr(
            get_string(field),
            stops
                .iter()
                .map(|s| (json!(s.stop.to_string()), json!(s.color))),
            TRANSPARENT,
        )
    }
}

/// Size style for a data field, falling back to a zoom ramp from `base` to
/// `base * scale_factor` when no size stops are available.
#[must_use]
pub fn size_expression(
    field: Option<&str>,
    stops: Option<&[SizeStop]>,
    base: f64,
    scale_factor: f64,
) -> Value {
    match (field, stops) {
        (Some(field), Some(stops)) if !stops.is_empty() => interpolate(
            get_number(field),
            stops.iter().map(|s| (json!(s.stop), json!(s.size))),
        ),
        _ => zoom_ramp(base, base * scale_factor),
    }
}

/// Legacy equality filter `["==", property, value]`.
#[must_use]
pub fn eq_filter(property: &str, value: &CellValue) -> Value {
    json!(["==", property, value.to_json()])
}

/// Filter that matches nothing: `["==", property, ""]` on a numeric property.
#[must_use]
pub fn empty_filter(property: &str) -> Value {
    json!(["==", property, ""])
}

/// `["all", ...]` of the given filters.
#[must_use]
pub fn all(filters: impl IntoIterator<Item = Value>) -> Value {
    let mut expr = vec![json!("all")];
    expr.extend(filters);
    Value::Array(expr)
}

/// `["any", ...]` of the given filters.
#[must_use]
pub fn any(filters: impl IntoIterator<Item = Value>) -> Value {
    let mut expr = vec![json!("any")];
    expr.extend(filters);
    Value::Array(expr)
}
