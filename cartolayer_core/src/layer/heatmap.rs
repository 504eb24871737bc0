// Copyright 2026 the Cartolayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Point density.
//!
//! The color ramp is keyed on `heatmap-density` rather than data: zero
//! density is transparent, then the configured min, mid, and max colors at
//! 10 %, 50 %, and full density. A bound size field weights each point by
//! its position within the size limits.

use serde_json::{Value, json};

use super::{LayerKind, LayerStyle, StyleContext};
use crate::backend::{LayerDescriptor, LayerType, MapRenderer};
use crate::error::RendererError;
use crate::expr::{self, TRANSPARENT};
use crate::settings::{HeatmapSettings, opacity};
use crate::stops::ColorStops;

/// Point density heatmap.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeatmapLayer;

fn density_ramp(settings: &HeatmapSettings) -> Value {
    expr::interpolate(
        json!(["heatmap-density"]),
        [
            (json!(0), json!(TRANSPARENT)),
            (json!(0.1), json!(settings.min_color)),
            (json!(0.5), json!(settings.mid_color)),
            (json!(1), json!(settings.max_color)),
        ],
    )
}

impl LayerStyle for HeatmapLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::Heatmap
    }

    fn descriptors(&self, _cx: &StyleContext<'_>) -> Vec<LayerDescriptor> {
        let kind = self.kind();
        vec![LayerDescriptor::new(kind.id(), LayerType::Heatmap, kind.source().id())]
    }

    fn apply(
        &mut self,
        renderer: &mut dyn MapRenderer,
        cx: &StyleContext<'_>,
    ) -> Result<ColorStops, RendererError> {
        let settings = &cx.settings.heatmap;
        let limits = cx.source.size_limits();
        let weight = match (cx.roles.size(), limits.min, limits.max) {
            (Some(field), Some(min), Some(max)) if min < max => expr::interpolate(
                expr::get_number(&field.display_name),
                [(json!(min), json!(0)), (json!(max), json!(1))],
            ),
            _ => json!(1),
        };
        let id = "heatmap";
        renderer.set_paint_property(id, "heatmap-radius", json!(settings.radius))?;
        renderer.set_paint_property(id, "heatmap-intensity", json!(settings.intensity))?;
        renderer.set_paint_property(id, "heatmap-opacity", json!(opacity(settings.opacity)))?;
        renderer.set_paint_property(id, "heatmap-color", density_ramp(settings))?;
        renderer.set_paint_property(id, "heatmap-weight", weight)?;
        Ok(ColorStops::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn density_ramp_starts_transparent() {
        let ramp = density_ramp(&HeatmapSettings::default());
        assert_eq!(ramp[3], json!(0));
        assert_eq!(ramp[4], json!(TRANSPARENT));
        assert_eq!(ramp[10], json!(1));
        assert_eq!(ramp[11], json!("#ca0020"));
    }
}
