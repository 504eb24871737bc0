// Copyright 2026 the Cartolayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use serde_json::json;

use super::{LayerKind, LayerStyle, StyleContext};
use crate::backend::{LayerDescriptor, LayerType, MapRenderer};
use crate::error::RendererError;
use crate::settings::opacity;
use crate::stops::ColorStops;

/// Raster tile overlay.
#[derive(Clone, Copy, Debug, Default)]
pub struct RasterLayer;

impl LayerStyle for RasterLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::Raster
    }

    fn descriptors(&self, _cx: &StyleContext<'_>) -> Vec<LayerDescriptor> {
        let kind = self.kind();
        vec![LayerDescriptor::new(kind.id(), LayerType::Raster, kind.source().id())]
    }

    fn apply(
        &mut self,
        renderer: &mut dyn MapRenderer,
        cx: &StyleContext<'_>,
    ) -> Result<ColorStops, RendererError> {
        renderer.set_paint_property(
            "raster",
            "raster-opacity",
            json!(opacity(cx.settings.raster.opacity)),
        )?;
        Ok(ColorStops::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SourceDescriptor;
    use crate::data::RoleMap;
    use crate::layer::test_util::Fixture;
    use crate::memory::MemoryRenderer;
    use crate::settings::MapSettings;
    use crate::source::RasterSource;

    #[test]
    fn opacity_follows_settings() {
        let mut settings = MapSettings::default();
        settings.raster.opacity = 35.0;
        let fixture = Fixture::new(settings, RoleMap::default());
        let source = RasterSource::new();
        let cx = fixture.cx(&source);
        let mut renderer = MemoryRenderer::new();
        renderer
            .add_source(
                "raster",
                SourceDescriptor::Raster {
                    tiles: vec!["https://tiles.example/{z}/{x}/{y}.png".into()],
                    tile_size: 256,
                },
            )
            .unwrap();
        for d in RasterLayer.descriptors(&cx) {
            renderer.add_layer(d, None).unwrap();
        }
        let stops = RasterLayer.apply(&mut renderer, &cx).unwrap();
        assert!(stops.is_empty(), "raster has no color encoding");
        assert_eq!(renderer.paint("raster", "raster-opacity"), Some(&json!(0.35)));
    }
}
