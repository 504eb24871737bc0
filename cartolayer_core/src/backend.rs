// Copyright 2026 the Cartolayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Renderer contract for map integrations.
//!
//! Cartolayer never draws anything itself. Every visible effect goes through
//! the primitive operations of a [`MapRenderer`]:
//!
//! - **Layers**: add before an anchor, remove, move, query, and list in draw
//!   order.
//! - **Sources**: add, remove, query, and replace GeoJSON data.
//! - **Properties**: paint and layout properties, zoom ranges, and filters,
//!   all as [`serde_json::Value`] style expressions.
//! - **Viewport and style**: current zoom, fit to bounds, and load a new
//!   base style.
//! - **Images**: fire-and-forget loading plus add/remove of named images.
//!
//! # Events
//!
//! Renderer events are not abstracted by a trait because subscription
//! mechanics differ between renderers. The integration forwards them to
//! [`ThematicMap`](crate::map::ThematicMap):
//!
//! ```rust,ignore
//! renderer.on("style.load", || map.on_style_load(&mut renderer, &mut tracer, done));
//! renderer.on("zoom", |z| map.on_zoom(&mut renderer, z, &mut tracer));
//! renderer.on("moveend", || map.on_move_end());
//! loader.on_complete(|ticket, image| map.on_image_loaded(&mut renderer, ticket, image));
//! ```
//!
//! # Crate boundaries
//!
//! `cartolayer_core` owns classification, stop generation, and the layer
//! lifecycle. Renderer integrations implement this trait and own the native
//! map object. [`MemoryRenderer`](crate::memory::MemoryRenderer) is a
//! headless implementation for tests and dry runs.

use kurbo::Rect;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::RendererError;

/// Renderer layer type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerType {
    /// Solid background.
    Background,
    /// Raster tiles.
    Raster,
    /// Filled polygons.
    Fill,
    /// Polygon or line outlines.
    Line,
    /// Circles at points.
    Circle,
    /// Point density.
    Heatmap,
    /// Icons and text labels.
    Symbol,
}

/// A layer as handed to [`MapRenderer::add_layer`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LayerDescriptor {
    /// Unique layer id.
    pub id: String,
    /// Layer type.
    #[serde(rename = "type")]
    pub layer_type: LayerType,
    /// Id of the source the layer draws from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Layer inside a vector tile source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_layer: Option<String>,
    /// Feature filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    /// Layout properties.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub layout: Map<String, Value>,
    /// Paint properties.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub paint: Map<String, Value>,
}

impl LayerDescriptor {
    /// Creates a descriptor drawing from `source`.
    #[must_use]
    pub fn new(id: &str, layer_type: LayerType, source: &str) -> Self {
        Self {
            id: id.to_owned(),
            layer_type,
            source: Some(source.to_owned()),
            source_layer: None,
            filter: None,
            layout: Map::new(),
            paint: Map::new(),
        }
    }

    /// Creates a descriptor without a source, as used by base styles.
    #[must_use]
    pub fn base(id: &str, layer_type: LayerType) -> Self {
        Self {
            source: None,
            ..Self::new(id, layer_type, "")
        }
    }

    /// Sets the vector tile layer.
    #[must_use]
    pub fn with_source_layer(mut self, source_layer: &str) -> Self {
        self.source_layer = Some(source_layer.to_owned());
        self
    }

    /// Sets the feature filter.
    #[must_use]
    pub fn with_filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Sets a layout property.
    #[must_use]
    pub fn with_layout(mut self, name: &str, value: Value) -> Self {
        self.layout.insert(name.to_owned(), value);
        self
    }

    /// Sets a paint property.
    #[must_use]
    pub fn with_paint(mut self, name: &str, value: Value) -> Self {
        self.paint.insert(name.to_owned(), value);
        self
    }
}

/// A source as handed to [`MapRenderer::add_source`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceDescriptor {
    /// Inline GeoJSON feature collection.
    GeoJson {
        /// `FeatureCollection` object.
        data: Value,
    },
    /// Raster tile template.
    Raster {
        /// Tile URL templates.
        tiles: Vec<String>,
        /// Tile size in pixels.
        #[serde(rename = "tileSize")]
        tile_size: u32,
    },
    /// Vector tile set.
    Vector {
        /// Tile set URL.
        url: String,
    },
}

/// Handle for an in-flight image load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageTicket(pub u64);

/// A decoded RGBA image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major RGBA8 pixels.
    pub pixels: Vec<u8>,
}

/// Primitive operations of a declarative map renderer.
///
/// Layer order is bottom to top. "Before `x`" means directly below `x`;
/// `None` means on top of everything.
pub trait MapRenderer {
    /// Inserts `layer` directly below `before`, or on top when `None`.
    fn add_layer(&mut self, layer: LayerDescriptor, before: Option<&str>)
    -> Result<(), RendererError>;

    /// Removes the layer `id`.
    fn remove_layer(&mut self, id: &str) -> Result<(), RendererError>;

    /// Moves the layer `id` directly below `before`, or to the top.
    fn move_layer(&mut self, id: &str, before: Option<&str>) -> Result<(), RendererError>;

    /// Returns the layer `id`, if it exists in the current style.
    fn layer(&self, id: &str) -> Option<&LayerDescriptor>;

    /// Returns every layer id in draw order, bottom first.
    fn layer_ids(&self) -> Vec<String>;

    /// Adds a source.
    fn add_source(&mut self, id: &str, source: SourceDescriptor) -> Result<(), RendererError>;

    /// Removes a source that no layer draws from anymore.
    fn remove_source(&mut self, id: &str) -> Result<(), RendererError>;

    /// Returns the source `id`, if it exists in the current style.
    fn source(&self, id: &str) -> Option<&SourceDescriptor>;

    /// Replaces the data of a GeoJSON source.
    fn set_source_data(&mut self, id: &str, data: Value) -> Result<(), RendererError>;

    /// Sets a paint property of a layer.
    fn set_paint_property(&mut self, layer: &str, name: &str, value: Value)
    -> Result<(), RendererError>;

    /// Sets a layout property of a layer.
    fn set_layout_property(
        &mut self,
        layer: &str,
        name: &str,
        value: Value,
    ) -> Result<(), RendererError>;

    /// Restricts a layer to the zoom range `min..=max`.
    fn set_layer_zoom_range(&mut self, layer: &str, min: f64, max: f64)
    -> Result<(), RendererError>;

    /// Sets or clears a layer filter.
    fn set_filter(&mut self, layer: &str, filter: Option<Value>) -> Result<(), RendererError>;

    /// Current (fractional) zoom level.
    fn zoom(&self) -> f64;

    /// Fits the viewport to `bounds` in (longitude, latitude) degrees.
    fn fit_bounds(&mut self, bounds: Rect);

    /// Starts loading a new base style. Layers and sources of the current
    /// style are gone once the renderer reports `style.load`.
    fn set_style(&mut self, url: &str);

    /// Starts loading the image at `url`. Completion is reported through
    /// the integration's image callback with the returned ticket.
    fn load_image(&mut self, url: &str) -> ImageTicket;

    /// Returns true if an image named `name` is registered.
    fn has_image(&self, name: &str) -> bool;

    /// Registers an image under `name`.
    fn add_image(&mut self, name: &str, image: Image) -> Result<(), RendererError>;

    /// Unregisters the image `name`.
    fn remove_image(&mut self, name: &str) -> Result<(), RendererError>;
}

/// Returns the first symbol layer among `layer_ids` that is not in
/// `managed`, i.e. the first label layer of the base style.
#[must_use]
pub fn first_base_symbol(renderer: &dyn MapRenderer, managed: &[&str]) -> Option<String> {
    renderer.layer_ids().into_iter().find(|id| {
        !managed.contains(&id.as_str())
            && renderer
                .layer(id)
                .is_some_and(|l| l.layer_type == LayerType::Symbol)
    })
}
