// Copyright 2026 the Cartolayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Icon markers.
//!
//! Every restyle requests the icon image again through the renderer's
//! fire-and-forget loader. Only the most recent request is honored: a
//! completion carrying an older ticket is ignored, so a slow load from a
//! previous URL never replaces a newer icon.

use serde_json::json;

use super::circle::{coordinate_keys, no_points};
use super::{LayerKind, LayerStyle, Selection, StyleContext};
use crate::backend::{ImageTicket, LayerDescriptor, LayerType, MapRenderer};
use crate::data::RoleMap;
use crate::error::RendererError;
use crate::settings::{MapSettings, opacity};
use crate::stops::ColorStops;

/// Name under which the icon is registered with the renderer.
pub const ICON_IMAGE: &str = "symbol";

/// Icon used when no URL is configured: a 16 px marker.
const DEFAULT_ICON_URL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAABAAAAAQCAYAAAAf8/9hAAAAAXNSR0IArs4c6QAAAERlWElmTU0AKgAAAAgAAYdpAAQAAAABAAAAGgAAAAAAA6ABAAMAAAABAAEAAKACAAQAAAABAAAAEKADAAQAAAABAAAAEAAAAAA0VXHyAAAAyUlEQVQ4EYVSSw4CIQwFx8StcVZuvY0b7+I5PM6sPIvxIkajfZWSRy3YBGjfpzSElOLYCfx2K1TmAIVxFI1nRcpZ8n9myLsaPzLqLRwlPK+wjRN1Nc4a4HzJ4qkzFyxk852IifKaHiQLxysKcLjZ4iGJ6RW7EQDirOh3MyHOfcEXOQ1X6EkACB8eM7PieIOjd7ia38NRKRnJtxj2IxaAdeDzOlIFmDdWCd/WFVV1m6iX/8G15YfVpseehMAko8VT9/ok/izW7BKpP1obQQCwnRAcAAAAAElFTkSuQmCC";

/// Icon markers at each point.
#[derive(Clone, Debug, Default)]
pub struct SymbolLayer {
    pending: Option<ImageTicket>,
}

impl SymbolLayer {
    /// Creates a symbol style with no image request in flight.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ticket of the image load in flight, if any.
    #[must_use]
    pub fn pending_image(&self) -> Option<ImageTicket> {
        self.pending
    }
}

impl LayerStyle for SymbolLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::Symbol
    }

    fn descriptors(&self, cx: &StyleContext<'_>) -> Vec<LayerDescriptor> {
        let source = self.kind().source().id();
        let icon_size = cx.settings.symbol.icon_size;
        vec![
            LayerDescriptor::new("symbol", LayerType::Symbol, source)
                .with_layout("icon-image", json!(ICON_IMAGE))
                .with_layout("icon-size", json!(icon_size)),
            LayerDescriptor::new("symbol-highlight", LayerType::Symbol, source)
                .with_filter(no_points(cx.roles))
                .with_layout("icon-image", json!(ICON_IMAGE))
                .with_layout("icon-size", json!(icon_size))
                .with_paint("icon-opacity", json!(1)),
        ]
    }

    fn apply(
        &mut self,
        renderer: &mut dyn MapRenderer,
        cx: &StyleContext<'_>,
    ) -> Result<ColorStops, RendererError> {
        let settings = &cx.settings.symbol;
        let url = if settings.url.is_empty() {
            DEFAULT_ICON_URL
        } else {
            settings.url.as_str()
        };
        self.pending = Some(renderer.load_image(url));

        for id in ["symbol", "symbol-highlight"] {
            renderer.set_layout_property(id, "icon-size", json!(settings.icon_size))?;
        }
        renderer.set_paint_property("symbol", "icon-opacity", json!(opacity(settings.opacity)))?;
        Ok(ColorStops::new())
    }

    fn selection(&self) -> Option<Selection> {
        Some(Selection {
            overlay: "symbol-highlight",
            base: "symbol",
            opacity_property: "icon-opacity",
        })
    }

    fn selection_keys(&self, _settings: &MapSettings, roles: &RoleMap) -> Vec<(String, String)> {
        coordinate_keys(roles)
    }

    fn base_opacity(&self, settings: &MapSettings) -> f64 {
        opacity(settings.symbol.opacity)
    }

    fn claim_image(&mut self, ticket: ImageTicket) -> Option<&'static str> {
        if self.pending != Some(ticket) {
            return None;
        }
        self.pending = None;
        Some(ICON_IMAGE)
    }
}
