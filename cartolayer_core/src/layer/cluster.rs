// Copyright 2026 the Cartolayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use serde_json::json;

use super::{LayerKind, LayerStyle, StyleContext};
use crate::backend::{LayerDescriptor, LayerType, MapRenderer};
use crate::data::{Column, RoleMap};
use crate::error::RendererError;
use crate::expr;
use crate::settings::{MapSettings, opacity};
use crate::stops::{ColorStops, generate_color_stops, size_stops};

/// Property of a cluster feature holding its aggregated value.
const VALUE: &str = "value";

/// Ratio of the largest to the smallest cluster radius.
const RADIUS_SCALE: f64 = 3.0;

/// Grid-aggregated point clusters with a value label.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClusterLayer;

impl LayerStyle for ClusterLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::Cluster
    }

    fn descriptors(&self, _cx: &StyleContext<'_>) -> Vec<LayerDescriptor> {
        let source = self.kind().source().id();
        vec![
            LayerDescriptor::new("cluster", LayerType::Circle, source),
            LayerDescriptor::new("cluster-label", LayerType::Symbol, source)
                .with_layout("text-field", json!(["to-string", expr::get(VALUE)]))
                .with_layout("text-size", json!(12)),
        ]
    }

    fn apply(
        &mut self,
        renderer: &mut dyn MapRenderer,
        cx: &StyleContext<'_>,
    ) -> Result<ColorStops, RendererError> {
        let settings = &cx.settings.cluster;
        let limits = cx.source.color_limits(0);
        let stops = generate_color_stops(
            &settings.ramp(),
            true,
            &limits,
            cx.palette,
            cx.classifier,
        );
        let color = expr::color_expression(Some(VALUE), true, &stops, &settings.min_color);
        let sizes = size_stops(&limits, settings.radius, RADIUS_SCALE, cx.classifier);
        let radius = expr::size_expression(
            Some(VALUE),
            sizes.as_deref(),
            settings.radius,
            RADIUS_SCALE,
        );

        renderer.set_paint_property("cluster", "circle-color", color)?;
        renderer.set_paint_property("cluster", "circle-radius", radius)?;
        renderer.set_paint_property(
            "cluster",
            "circle-stroke-width",
            json!(settings.stroke_width),
        )?;
        renderer.set_paint_property(
            "cluster",
            "circle-stroke-color",
            json!(settings.stroke_color),
        )?;
        renderer.set_paint_property(
            "cluster",
            "circle-stroke-opacity",
            json!(opacity(settings.stroke_opacity)),
        )?;
        Ok(stops)
    }

    fn color_column<'r>(&self, _settings: &MapSettings, roles: &'r RoleMap) -> Option<&'r Column> {
        roles.cluster()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Role;
    use crate::layer::test_util::Fixture;
    use crate::memory::MemoryRenderer;
    use crate::source::{ClusterSource, Datasource};
    use crate::trace::Tracer;

    #[test]
    fn colors_follow_aggregated_values() {
        let mut settings = MapSettings::default();
        settings.cluster.show = true;
        let roles = RoleMap::new(vec![
            Column::numeric("lat", [10.0, -10.0, 40.0]).with_role(Role::Latitude),
            Column::numeric("lon", [10.0, -60.0, 120.0]).with_role(Role::Longitude),
        ]);
        let fixture = Fixture::new(settings, roles);
        let mut renderer = MemoryRenderer::new();
        renderer.set_zoom(14.0);
        let mut source = ClusterSource::new();
        source
            .update(
                &mut renderer,
                &fixture.roles,
                &fixture.roles.features(),
                &fixture.settings,
            )
            .unwrap();
        source
            .ensure(&mut renderer, LayerKind::Cluster, &fixture.settings, &mut Tracer::none())
            .unwrap();
        let cx = fixture.cx(&source);
        for d in ClusterLayer.descriptors(&cx) {
            renderer.add_layer(d, None).unwrap();
        }
        let stops = ClusterLayer.apply(&mut renderer, &cx).unwrap();
        // Above the cluster limit every point counts one: a single value.
        assert_eq!(stops.len(), 1);
        assert_eq!(stops[0].color, "#ffffcc");
        assert_eq!(
            renderer.paint("cluster", "circle-radius"),
            Some(&expr::zoom_ramp(10.0, 30.0))
        );
    }
}
