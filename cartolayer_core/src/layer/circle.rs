// Copyright 2026 the Cartolayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use serde_json::json;

use super::{LayerKind, LayerStyle, Selection, StyleContext, field_index, is_gradient};
use crate::backend::{LayerDescriptor, LayerType, MapRenderer};
use crate::data::{Column, RoleMap};
use crate::error::RendererError;
use crate::expr;
use crate::settings::{MapSettings, opacity};
use crate::stops::{ColorStops, generate_color_stops, size_stops};

/// Proportional circles colored and sized by data.
#[derive(Clone, Copy, Debug, Default)]
pub struct CircleLayer;

/// Latitude and longitude identify a point feature.
pub(super) fn coordinate_keys(roles: &RoleMap) -> Vec<(String, String)> {
    [roles.latitude(), roles.longitude()]
        .into_iter()
        .flatten()
        .map(|name| (name.to_owned(), name.to_owned()))
        .collect()
}

/// Filter matching no point, used for empty highlight overlays.
pub(super) fn no_points(roles: &RoleMap) -> serde_json::Value {
    expr::empty_filter(roles.latitude().unwrap_or_default())
}

impl LayerStyle for CircleLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::Circle
    }

    fn descriptors(&self, cx: &StyleContext<'_>) -> Vec<LayerDescriptor> {
        let source = self.kind().source().id();
        vec![
            LayerDescriptor::new("circle", LayerType::Circle, source),
            LayerDescriptor::new("circle-highlight", LayerType::Circle, source)
                .with_filter(no_points(cx.roles))
                .with_paint("circle-opacity", json!(1))
                .with_paint("circle-stroke-width", json!(1))
                .with_paint("circle-stroke-color", json!("black")),
        ]
    }

    fn apply(
        &mut self,
        renderer: &mut dyn MapRenderer,
        cx: &StyleContext<'_>,
    ) -> Result<ColorStops, RendererError> {
        let settings = &cx.settings.circle;
        let column = self.color_column(cx.settings, cx.roles);
        let gradient = is_gradient(column);
        let limits = cx.source.color_limits(field_index(settings.color_field));
        let stops = generate_color_stops(
            &settings.ramp(),
            gradient,
            &limits,
            cx.palette,
            cx.classifier,
        );
        let color = expr::color_expression(
            column.map(|c| c.display_name.as_str()),
            gradient,
            &stops,
            &settings.min_color,
        );

        let size_field = cx.roles.size().map(|c| c.display_name.as_str());
        let sizes = size_stops(
            &cx.source.size_limits(),
            settings.radius,
            settings.scale_factor,
            cx.classifier,
        );
        let radius = expr::size_expression(
            size_field,
            sizes.as_deref(),
            settings.radius,
            settings.scale_factor,
        );

        renderer.set_paint_property("circle", "circle-radius", radius.clone())?;
        renderer.set_paint_property("circle-highlight", "circle-radius", radius)?;
        renderer.set_paint_property(
            "circle-highlight",
            "circle-color",
            json!(settings.highlight_color),
        )?;
        renderer.set_paint_property("circle", "circle-color", color)?;
        renderer.set_paint_property("circle", "circle-blur", json!(settings.blur / 100.0))?;
        renderer.set_paint_property("circle", "circle-opacity", json!(opacity(settings.opacity)))?;
        renderer.set_paint_property(
            "circle",
            "circle-stroke-width",
            json!(settings.stroke_width),
        )?;
        renderer.set_paint_property(
            "circle",
            "circle-stroke-opacity",
            json!(opacity(settings.stroke_opacity)),
        )?;
        renderer.set_paint_property(
            "circle",
            "circle-stroke-color",
            json!(settings.stroke_color),
        )?;
        Ok(stops)
    }

    fn color_column<'r>(&self, settings: &MapSettings, roles: &'r RoleMap) -> Option<&'r Column> {
        roles.color(settings.circle.color_field)
    }

    fn selection(&self) -> Option<Selection> {
        Some(Selection {
            overlay: "circle-highlight",
            base: "circle",
            opacity_property: "circle-opacity",
        })
    }

    fn selection_keys(&self, _settings: &MapSettings, roles: &RoleMap) -> Vec<(String, String)> {
        coordinate_keys(roles)
    }

    fn base_opacity(&self, settings: &MapSettings) -> f64 {
        opacity(settings.circle.opacity)
    }
}
