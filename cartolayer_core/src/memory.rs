// Copyright 2026 the Cartolayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Headless in-process renderer.
//!
//! [`MemoryRenderer`] keeps an ordered layer stack, a source table, and an
//! image registry, and enforces the same structural rules as a real
//! renderer: ids are unique, anchors must exist, layers need their source,
//! and a source cannot be removed while a layer draws from it. Every
//! mutating call is appended to a [`RendererCall`] log so tests can assert
//! on exactly what the engine asked for.
//!
//! A base style can be simulated with [`with_base_layers`]. Loading a new
//! style through [`MapRenderer::set_style`] discards every layer, source,
//! and image and reinstalls the base layers, as a real style reload does.
//!
//! [`with_base_layers`]: MemoryRenderer::with_base_layers

use std::collections::BTreeMap;

use kurbo::Rect;
use serde_json::Value;

use crate::backend::{Image, ImageTicket, LayerDescriptor, LayerType, MapRenderer, SourceDescriptor};
use crate::error::RendererError;

/// One mutating call received by a [`MemoryRenderer`].
#[derive(Clone, Debug, PartialEq)]
pub enum RendererCall {
    /// `add_layer(id, before)`.
    AddLayer {
        /// Layer id.
        id: String,
        /// Anchor.
        before: Option<String>,
    },
    /// `remove_layer(id)`.
    RemoveLayer(String),
    /// `move_layer(id, before)`.
    MoveLayer {
        /// Layer id.
        id: String,
        /// Anchor.
        before: Option<String>,
    },
    /// `add_source(id)`.
    AddSource(String),
    /// `remove_source(id)`.
    RemoveSource(String),
    /// `set_source_data(id)`.
    SetSourceData(String),
    /// `set_paint_property(layer, name)`.
    SetPaint {
        /// Layer id.
        layer: String,
        /// Property name.
        name: String,
    },
    /// `set_layout_property(layer, name)`.
    SetLayout {
        /// Layer id.
        layer: String,
        /// Property name.
        name: String,
    },
    /// `set_layer_zoom_range(layer)`.
    SetZoomRange(String),
    /// `set_filter(layer)`.
    SetFilter(String),
    /// `fit_bounds(bounds)`.
    FitBounds(Rect),
    /// `set_style(url)`.
    SetStyle(String),
    /// `load_image(url)`.
    LoadImage(String),
    /// `add_image(name)`.
    AddImage(String),
    /// `remove_image(name)`.
    RemoveImage(String),
}

/// A renderer that keeps all state in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryRenderer {
    base: Vec<LayerDescriptor>,
    layers: Vec<LayerDescriptor>,
    zoom_ranges: BTreeMap<String, (f64, f64)>,
    sources: BTreeMap<String, SourceDescriptor>,
    images: BTreeMap<String, Image>,
    pending_images: Vec<(ImageTicket, String)>,
    next_ticket: u64,
    style: Option<String>,
    zoom: f64,
    calls: Vec<RendererCall>,
}

impl MemoryRenderer {
    /// Creates an empty renderer with no base style layers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a renderer whose style contains the given base layers,
    /// bottom first.
    #[must_use]
    pub fn with_base_layers(layers: &[(&str, LayerType)]) -> Self {
        let base: Vec<LayerDescriptor> = layers
            .iter()
            .map(|(id, ty)| LayerDescriptor::base(id, *ty))
            .collect();
        Self {
            layers: base.clone(),
            base,
            ..Self::default()
        }
    }

    /// Sets the current zoom level.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom;
    }

    /// Calls received so far.
    #[must_use]
    pub fn calls(&self) -> &[RendererCall] {
        &self.calls
    }

    /// Forgets the call log.
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Number of logged calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&RendererCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    /// Paint property `name` of `layer`.
    #[must_use]
    pub fn paint(&self, layer: &str, name: &str) -> Option<&Value> {
        self.layer(layer)?.paint.get(name)
    }

    /// Layout property `name` of `layer`.
    #[must_use]
    pub fn layout(&self, layer: &str, name: &str) -> Option<&Value> {
        self.layer(layer)?.layout.get(name)
    }

    /// Filter of `layer`.
    #[must_use]
    pub fn filter(&self, layer: &str) -> Option<&Value> {
        self.layer(layer)?.filter.as_ref()
    }

    /// Zoom range of `layer`.
    #[must_use]
    pub fn zoom_range(&self, layer: &str) -> Option<(f64, f64)> {
        self.zoom_ranges.get(layer).copied()
    }

    /// Most recently requested style URL.
    #[must_use]
    pub fn style(&self) -> Option<&str> {
        self.style.as_deref()
    }

    /// Takes the image loads that have not been completed yet.
    pub fn take_pending_images(&mut self) -> Vec<(ImageTicket, String)> {
        core::mem::take(&mut self.pending_images)
    }

    /// Ids of layers that draw from a source, in draw order. Base style
    /// layers are excluded.
    #[must_use]
    pub fn data_layer_ids(&self) -> Vec<String> {
        self.layers
            .iter()
            .filter(|l| l.source.is_some())
            .map(|l| l.id.clone())
            .collect()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    fn insert_index(&self, before: Option<&str>) -> Result<usize, RendererError> {
        match before {
            None => Ok(self.layers.len()),
            Some(b) => self
                .position(b)
                .ok_or_else(|| RendererError::UnknownLayer(b.to_owned())),
        }
    }

    fn layer_mut(&mut self, id: &str) -> Result<&mut LayerDescriptor, RendererError> {
        self.layers
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| RendererError::UnknownLayer(id.to_owned()))
    }
}

impl MapRenderer for MemoryRenderer {
    fn add_layer(
        &mut self,
        layer: LayerDescriptor,
        before: Option<&str>,
    ) -> Result<(), RendererError> {
        if self.position(&layer.id).is_some() {
            return Err(RendererError::DuplicateLayer(layer.id));
        }
        if let Some(source) = &layer.source
            && !self.sources.contains_key(source)
        {
            return Err(RendererError::UnknownSource(source.clone()));
        }
        let index = self.insert_index(before)?;
        self.calls.push(RendererCall::AddLayer {
            id: layer.id.clone(),
            before: before.map(str::to_owned),
        });
        self.layers.insert(index, layer);
        Ok(())
    }

    fn remove_layer(&mut self, id: &str) -> Result<(), RendererError> {
        let index = self
            .position(id)
            .ok_or_else(|| RendererError::UnknownLayer(id.to_owned()))?;
        self.layers.remove(index);
        self.zoom_ranges.remove(id);
        self.calls.push(RendererCall::RemoveLayer(id.to_owned()));
        Ok(())
    }

    fn move_layer(&mut self, id: &str, before: Option<&str>) -> Result<(), RendererError> {
        let from = self
            .position(id)
            .ok_or_else(|| RendererError::UnknownLayer(id.to_owned()))?;
        if before == Some(id) {
            return Ok(());
        }
        self.insert_index(before)?;
        let layer = self.layers.remove(from);
        let index = self.insert_index(before)?;
        self.layers.insert(index, layer);
        self.calls.push(RendererCall::MoveLayer {
            id: id.to_owned(),
            before: before.map(str::to_owned),
        });
        Ok(())
    }

    fn layer(&self, id: &str) -> Option<&LayerDescriptor> {
        self.layers.iter().find(|l| l.id == id)
    }

    fn layer_ids(&self) -> Vec<String> {
        self.layers.iter().map(|l| l.id.clone()).collect()
    }

    fn add_source(&mut self, id: &str, source: SourceDescriptor) -> Result<(), RendererError> {
        if self.sources.contains_key(id) {
            return Err(RendererError::DuplicateSource(id.to_owned()));
        }
        self.sources.insert(id.to_owned(), source);
        self.calls.push(RendererCall::AddSource(id.to_owned()));
        Ok(())
    }

    fn remove_source(&mut self, id: &str) -> Result<(), RendererError> {
        if !self.sources.contains_key(id) {
            return Err(RendererError::UnknownSource(id.to_owned()));
        }
        if let Some(user) = self
            .layers
            .iter()
            .find(|l| l.source.as_deref() == Some(id))
        {
            return Err(RendererError::SourceInUse {
                id: id.to_owned(),
                layer: user.id.clone(),
            });
        }
        self.sources.remove(id);
        self.calls.push(RendererCall::RemoveSource(id.to_owned()));
        Ok(())
    }

    fn source(&self, id: &str) -> Option<&SourceDescriptor> {
        self.sources.get(id)
    }

    fn set_source_data(&mut self, id: &str, data: Value) -> Result<(), RendererError> {
        match self.sources.get_mut(id) {
            Some(SourceDescriptor::GeoJson { data: current }) => *current = data,
            Some(_) => {}
            None => return Err(RendererError::UnknownSource(id.to_owned())),
        }
        self.calls.push(RendererCall::SetSourceData(id.to_owned()));
        Ok(())
    }

    fn set_paint_property(
        &mut self,
        layer: &str,
        name: &str,
        value: Value,
    ) -> Result<(), RendererError> {
        self.layer_mut(layer)?.paint.insert(name.to_owned(), value);
        self.calls.push(RendererCall::SetPaint {
            layer: layer.to_owned(),
            name: name.to_owned(),
        });
        Ok(())
    }

    fn set_layout_property(
        &mut self,
        layer: &str,
        name: &str,
        value: Value,
    ) -> Result<(), RendererError> {
        self.layer_mut(layer)?.layout.insert(name.to_owned(), value);
        self.calls.push(RendererCall::SetLayout {
            layer: layer.to_owned(),
            name: name.to_owned(),
        });
        Ok(())
    }

    fn set_layer_zoom_range(
        &mut self,
        layer: &str,
        min: f64,
        max: f64,
    ) -> Result<(), RendererError> {
        self.layer_mut(layer)?;
        self.zoom_ranges.insert(layer.to_owned(), (min, max));
        self.calls.push(RendererCall::SetZoomRange(layer.to_owned()));
        Ok(())
    }

    fn set_filter(&mut self, layer: &str, filter: Option<Value>) -> Result<(), RendererError> {
        self.layer_mut(layer)?.filter = filter;
        self.calls.push(RendererCall::SetFilter(layer.to_owned()));
        Ok(())
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn fit_bounds(&mut self, bounds: Rect) {
        self.calls.push(RendererCall::FitBounds(bounds));
    }

    fn set_style(&mut self, url: &str) {
        self.layers = self.base.clone();
        self.sources.clear();
        self.images.clear();
        self.zoom_ranges.clear();
        self.pending_images.clear();
        self.style = Some(url.to_owned());
        self.calls.push(RendererCall::SetStyle(url.to_owned()));
    }

    fn load_image(&mut self, url: &str) -> ImageTicket {
        self.next_ticket += 1;
        let ticket = ImageTicket(self.next_ticket);
        self.pending_images.push((ticket, url.to_owned()));
        self.calls.push(RendererCall::LoadImage(url.to_owned()));
        ticket
    }

    fn has_image(&self, name: &str) -> bool {
        self.images.contains_key(name)
    }

    fn add_image(&mut self, name: &str, image: Image) -> Result<(), RendererError> {
        self.images.insert(name.to_owned(), image);
        self.calls.push(RendererCall::AddImage(name.to_owned()));
        Ok(())
    }

    fn remove_image(&mut self, name: &str) -> Result<(), RendererError> {
        self.images.remove(name);
        self.calls.push(RendererCall::RemoveImage(name.to_owned()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geojson() -> SourceDescriptor {
        SourceDescriptor::GeoJson {
            data: serde_json::json!({ "type": "FeatureCollection", "features": [] }),
        }
    }

    #[test]
    fn insert_before_places_directly_below_anchor() {
        let mut r = MemoryRenderer::with_base_layers(&[
            ("background", LayerType::Background),
            ("place-label", LayerType::Symbol),
        ]);
        r.add_source("data", geojson()).unwrap();
        r.add_layer(LayerDescriptor::new("a", LayerType::Circle, "data"), Some("place-label"))
            .unwrap();
        r.add_layer(LayerDescriptor::new("b", LayerType::Circle, "data"), Some("a"))
            .unwrap();
        assert_eq!(r.layer_ids(), ["background", "b", "a", "place-label"]);
        r.move_layer("b", None).unwrap();
        assert_eq!(r.layer_ids(), ["background", "a", "place-label", "b"]);
    }

    #[test]
    fn structural_rules_are_enforced() {
        let mut r = MemoryRenderer::new();
        let circle = LayerDescriptor::new("a", LayerType::Circle, "data");
        assert_eq!(
            r.add_layer(circle.clone(), None),
            Err(RendererError::UnknownSource("data".into()))
        );
        r.add_source("data", geojson()).unwrap();
        assert_eq!(
            r.add_layer(circle.clone(), Some("missing")),
            Err(RendererError::UnknownLayer("missing".into()))
        );
        r.add_layer(circle.clone(), None).unwrap();
        assert_eq!(
            r.add_layer(circle, None),
            Err(RendererError::DuplicateLayer("a".into()))
        );
        assert_eq!(
            r.remove_source("data"),
            Err(RendererError::SourceInUse {
                id: "data".into(),
                layer: "a".into()
            })
        );
    }

    #[test]
    fn set_style_discards_everything_but_base_layers() {
        let mut r = MemoryRenderer::with_base_layers(&[("water", LayerType::Fill)]);
        r.add_source("data", geojson()).unwrap();
        r.add_layer(LayerDescriptor::new("a", LayerType::Circle, "data"), None)
            .unwrap();
        r.set_style("mapbox://styles/mapbox/dark-v10");
        assert_eq!(r.layer_ids(), ["water"]);
        assert!(r.source("data").is_none(), "sources are gone");
        assert_eq!(r.style(), Some("mapbox://styles/mapbox/dark-v10"));
    }
}
