// Copyright 2026 the Cartolayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Filled regions joined to data by location.
//!
//! Region geometry comes from vector tiles, so the data cannot be read by
//! the renderer through `["get", field]`. Instead the fill color is a
//! `match` on the tile's region property whose outputs are precomputed per
//! location: gradient stops are evaluated at each location's value and
//! categorical stops are looked up by label. Regions without data fall
//! through to transparent.

use serde_json::{Value, json};

use super::{LayerKind, LayerStyle, Selection, StyleContext, field_index, is_gradient};
use crate::backend::{LayerDescriptor, LayerType, MapRenderer};
use crate::data::{Column, Role, RoleMap, Value as CellValue};
use crate::error::RendererError;
use crate::expr::{self, TRANSPARENT};
use crate::settings::{MapSettings, opacity};
use crate::stops::{ColorRamp, ColorStop, ColorStops, generate_color_stops};

/// Filled regions colored by data.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChoroplethLayer;

/// Builds the per-region fill color `match`.
fn region_colors(
    property: &str,
    gradient: bool,
    stops: &[ColorStop],
    locations: &[(String, CellValue)],
) -> Value {
    let ramp = gradient.then(|| ColorRamp::new(stops));
    let cases = locations.iter().filter_map(|(location, value)| {
        let color = match &ramp {
            Some(ramp) => ramp.color_at(value.as_number()?)?.to_string(),
            None => {
                let label = value.to_string();
                stops
                    .iter()
                    .find(|s| s.stop.to_string() == label)?
                    .color
                    .clone()
            }
        };
        Some((json!(location), json!(color)))
    });
    expr::match_expr(expr::get(property), cases, TRANSPARENT)
}

impl LayerStyle for ChoroplethLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::Choropleth
    }

    fn descriptors(&self, cx: &StyleContext<'_>) -> Vec<LayerDescriptor> {
        let settings = &cx.settings.choropleth;
        let source = self.kind().source().id();
        vec![
            LayerDescriptor::new("choropleth", LayerType::Fill, source)
                .with_source_layer(&settings.source_layer),
            LayerDescriptor::new("choropleth-highlight", LayerType::Fill, source)
                .with_source_layer(&settings.source_layer)
                .with_filter(expr::empty_filter(&settings.vector_property)),
        ]
    }

    fn apply(
        &mut self,
        renderer: &mut dyn MapRenderer,
        cx: &StyleContext<'_>,
    ) -> Result<ColorStops, RendererError> {
        let settings = &cx.settings.choropleth;
        let column = self.color_column(cx.settings, cx.roles);
        let gradient = is_gradient(column);
        let field = field_index(settings.color_field);
        let limits = cx.source.color_limits(field);
        let stops = generate_color_stops(
            &settings.ramp(),
            gradient,
            &limits,
            cx.palette,
            cx.classifier,
        );
        let fill = if column.is_some() && !stops.is_empty() {
            region_colors(
                &settings.vector_property,
                gradient,
                &stops,
                cx.source.location_values(field),
            )
        } else {
            json!(settings.min_color)
        };

        renderer.set_paint_property("choropleth", "fill-color", fill)?;
        renderer.set_paint_property("choropleth", "fill-opacity", json!(opacity(settings.opacity)))?;
        renderer.set_paint_property(
            "choropleth",
            "fill-outline-color",
            json!(settings.outline_color),
        )?;
        renderer.set_paint_property(
            "choropleth-highlight",
            "fill-color",
            json!(settings.highlight_color),
        )?;
        renderer.set_paint_property(
            "choropleth-highlight",
            "fill-outline-color",
            json!(settings.outline_color),
        )?;
        renderer.set_paint_property("choropleth-highlight", "fill-opacity", json!(1))?;
        Ok(stops)
    }

    fn color_column<'r>(&self, settings: &MapSettings, roles: &'r RoleMap) -> Option<&'r Column> {
        roles.color(settings.choropleth.color_field)
    }

    fn selection(&self) -> Option<Selection> {
        Some(Selection {
            overlay: "choropleth-highlight",
            base: "choropleth",
            opacity_property: "fill-opacity",
        })
    }

    fn selection_keys(&self, settings: &MapSettings, roles: &RoleMap) -> Vec<(String, String)> {
        roles
            .get(Role::Location, 0)
            .map(|c| {
                vec![(
                    settings.choropleth.vector_property.clone(),
                    c.display_name.clone(),
                )]
            })
            .unwrap_or_default()
    }

    fn base_opacity(&self, settings: &MapSettings) -> f64 {
        opacity(settings.choropleth.opacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::test_util::Fixture;
    use crate::memory::MemoryRenderer;
    use crate::source::{ChoroplethSource, Datasource};
    use crate::trace::Tracer;

    fn fill_color(roles: RoleMap) -> Value {
        let mut settings = MapSettings::default();
        settings.choropleth.show = true;
        settings.choropleth.min_color = "#000000".to_owned();
        settings.choropleth.max_color = "#ffffff".to_owned();
        let fixture = Fixture::new(settings, roles);
        let mut renderer = MemoryRenderer::new();
        let mut source = ChoroplethSource::new();
        source
            .update(&mut renderer, &fixture.roles, &[], &fixture.settings)
            .unwrap();
        source
            .ensure(
                &mut renderer,
                LayerKind::Choropleth,
                &fixture.settings,
                &mut Tracer::none(),
            )
            .unwrap();
        let cx = fixture.cx(&source);
        for d in ChoroplethLayer.descriptors(&cx) {
            renderer.add_layer(d, None).unwrap();
        }
        ChoroplethLayer.apply(&mut renderer, &cx).unwrap();
        renderer.paint("choropleth", "fill-color").cloned().unwrap()
    }

    #[test]
    fn gradient_colors_are_evaluated_per_region() {
        let fill = fill_color(RoleMap::new(vec![
            Column::text("country", ["Chad", "Peru", "Fiji"]).with_role(Role::Location),
            Column::numeric("gdp", [0.0, 5.0, 10.0]).with_role(Role::Color),
        ]));
        assert_eq!(
            fill,
            json!([
                "match",
                ["get", "name"],
                "Chad",
                "#000000",
                "Peru",
                "#808080",
                "Fiji",
                "#ffffff",
                TRANSPARENT
            ])
        );
    }

    #[test]
    fn categories_use_palette_colors() {
        let fill = fill_color(RoleMap::new(vec![
            Column::text("country", ["Chad", "Peru"]).with_role(Role::Location),
            Column::text("bloc", ["A", "B"]).with_role(Role::Color),
        ]));
        assert_eq!(fill[0], "match");
        assert_eq!(fill[2], "Chad");
        assert_eq!(fill.as_array().map(Vec::len), Some(7));
    }

    #[test]
    fn without_a_color_field_regions_are_flat() {
        let fill = fill_color(RoleMap::new(vec![
            Column::text("country", ["Chad"]).with_role(Role::Location),
        ]));
        assert_eq!(fill, json!("#000000"));
    }
}
