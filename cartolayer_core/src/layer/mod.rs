// Copyright 2026 the Cartolayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Thematic layers and their lifecycle.
//!
//! Each [`LayerKind`] owns a fixed list of renderer sub-layers (a base layer
//! plus an optional highlight overlay or label layer) and draws from one
//! shared [`Datasource`]. The per-kind behaviour is a [`LayerStyle`]:
//!
//! - [`descriptors`](LayerStyle::descriptors) builds the sub-layers when
//!   the kind becomes visible.
//! - [`apply`](LayerStyle::apply) pushes paint and layout properties and
//!   returns the color stops it used.
//! - [`selection`](LayerStyle::selection) and
//!   [`selection_keys`](LayerStyle::selection_keys) describe how features
//!   are highlighted, for kinds that support it.
//!
//! Everything structural (adding, moving, and removing sub-layers, keeping
//! source references, and keeping z-order) is done by the
//! [`LayerController`], which is the same for every kind.
//!
//! # Ordering
//!
//! Kinds are drawn in [`LayerKind::ALL`] order. The controller walks that
//! list top-down with one anchor cursor, so each kind is inserted directly
//! below the kind processed before it. See [`LayerController::sync`].

mod choropleth;
mod circle;
mod cluster;
mod controller;
mod heatmap;
mod kind;
mod raster;
mod record;
mod symbol;

use core::fmt;

pub use choropleth::ChoroplethLayer;
pub use circle::CircleLayer;
pub use cluster::ClusterLayer;
pub use controller::{LayerController, MAX_SELECTION_COUNT, SyncInput, SyncReport};
pub use heatmap::HeatmapLayer;
pub use kind::LayerKind;
pub use raster::RasterLayer;
pub use record::{LayerRecord, LayerState};
pub use symbol::{ICON_IMAGE, SymbolLayer};

use crate::backend::{ImageTicket, LayerDescriptor, MapRenderer};
use crate::classify::Classifier;
use crate::data::{Column, RoleMap};
use crate::error::RendererError;
use crate::settings::MapSettings;
use crate::source::Datasource;
use crate::stops::{ColorStops, Palette};

/// Everything a [`LayerStyle`] reads while styling.
#[derive(Clone, Copy)]
pub struct StyleContext<'a> {
    /// Current settings.
    pub settings: &'a MapSettings,
    /// Field bindings of the current data set.
    pub roles: &'a RoleMap,
    /// Colors for categorical values.
    pub palette: &'a dyn Palette,
    /// Class count and break strategy.
    pub classifier: &'a Classifier,
    /// The kind's shared source, with up-to-date limits.
    pub source: &'a dyn Datasource,
}

impl fmt::Debug for StyleContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleContext")
            .field("classifier", self.classifier)
            .field("source", &self.source.id())
            .finish_non_exhaustive()
    }
}

/// Sub-layers and paint property used to highlight selected features.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selection {
    /// Overlay sub-layer whose filter selects the highlighted features.
    pub overlay: &'static str,
    /// Base sub-layer that is dimmed while a selection is active.
    pub base: &'static str,
    /// Opacity paint property of the base sub-layer.
    pub opacity_property: &'static str,
}

/// Per-kind layer behaviour.
pub trait LayerStyle: fmt::Debug {
    /// Kind this style belongs to.
    fn kind(&self) -> LayerKind;

    /// Descriptors of every sub-layer, in [`LayerKind::sub_layers`] order.
    fn descriptors(&self, cx: &StyleContext<'_>) -> Vec<LayerDescriptor>;

    /// Applies paint and layout properties to existing sub-layers and
    /// returns the color stops behind the color encoding.
    fn apply(
        &mut self,
        renderer: &mut dyn MapRenderer,
        cx: &StyleContext<'_>,
    ) -> Result<ColorStops, RendererError>;

    /// Column behind the color encoding, used as the legend title.
    fn color_column<'r>(&self, settings: &MapSettings, roles: &'r RoleMap) -> Option<&'r Column> {
        _ = (settings, roles);
        None
    }

    /// Highlight support, if any.
    fn selection(&self) -> Option<Selection> {
        None
    }

    /// `(rendered property, data column)` pairs that identify a feature.
    fn selection_keys(&self, settings: &MapSettings, roles: &RoleMap) -> Vec<(String, String)> {
        _ = (settings, roles);
        Vec::new()
    }

    /// Undimmed opacity of the base sub-layer.
    fn base_opacity(&self, settings: &MapSettings) -> f64 {
        _ = settings;
        1.0
    }

    /// Claims a completed image load. Returns the image name to install if
    /// `ticket` is the latest load this style requested.
    fn claim_image(&mut self, ticket: ImageTicket) -> Option<&'static str> {
        _ = ticket;
        None
    }
}

/// Index of the 0-based color field for a 1-based setting.
pub(crate) fn field_index(color_field: usize) -> usize {
    color_field.saturating_sub(1)
}

/// A column is classified as a gradient when it is numeric.
pub(crate) fn is_gradient(column: Option<&Column>) -> bool {
    column.is_some_and(|c| c.numeric)
}

/// Every style, indexed by [`LayerKind::index`].
pub(crate) fn default_styles() -> Vec<Box<dyn LayerStyle>> {
    vec![
        Box::new(RasterLayer),
        Box::new(ChoroplethLayer),
        Box::new(CircleLayer),
        Box::new(HeatmapLayer),
        Box::new(ClusterLayer),
        Box::new(SymbolLayer::new()),
    ]
}
