// Copyright 2026 the Cartolayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared, reference-counted backing sources.
//!
//! Several layer kinds draw from the same renderer source (circle, heatmap,
//! and symbol all share the point source). A [`Datasource`] records which
//! layers reference it in its [`SourceRefs`] and ties the renderer source's
//! lifetime to that set:
//!
//! - [`ensure`](Datasource::ensure) adds a layer to the set. Sources whose
//!   [`creates_on_ensure`](Datasource::creates_on_ensure) is true also add
//!   the renderer source if it is missing.
//! - [`remove_from_map`](Datasource::remove_from_map) drops a layer from the
//!   set and removes the renderer source exactly when the set goes from
//!   non-empty to empty. Releasing a layer that holds no reference is a
//!   no-op, so repeated releases never remove a source twice.
//!
//! After a style reload the renderer has already discarded every source.
//! [`Datasources::forget_all`] clears the reference sets without touching
//! the renderer so the next update pass recreates everything from scratch.
//!
//! Each source also caches the [`Limits`] its layers classify, and may
//! bucket its data by zoom level ([`handle_zoom`](Datasource::handle_zoom)).

mod choropleth;
mod cluster;
mod point;
mod raster;

use std::collections::BTreeSet;

use kurbo::Rect;

pub use choropleth::ChoroplethSource;
pub use cluster::{Cluster, ClusterSource};
pub use point::PointSource;
pub use raster::RasterSource;

use crate::backend::{MapRenderer, SourceDescriptor};
use crate::data::{Feature, Limits, RoleMap, Value};
use crate::error::RendererError;
use crate::layer::LayerKind;
use crate::settings::MapSettings;
use crate::trace::{SourceAddedEvent, SourceRemovedEvent, Tracer};

/// Identifies one of the shared sources.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKey {
    /// Raster tiles.
    Raster,
    /// GeoJSON points shared by circle, heatmap, and symbol.
    Point,
    /// Vector tile regions.
    Choropleth,
    /// Grid-aggregated GeoJSON points.
    Cluster,
}

impl SourceKey {
    /// Every key.
    pub const ALL: [Self; 4] = [Self::Raster, Self::Point, Self::Choropleth, Self::Cluster];

    /// Renderer source id.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Raster => "raster",
            Self::Point => "data",
            Self::Choropleth => "choropleth-source",
            Self::Cluster => "clusterData",
        }
    }

    /// Position in [`ALL`](Self::ALL).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// The set of layers currently referencing a source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceRefs {
    key: SourceKey,
    owners: BTreeSet<LayerKind>,
}

impl SourceRefs {
    /// Creates an empty reference set for `key`.
    #[must_use]
    pub fn new(key: SourceKey) -> Self {
        Self {
            key,
            owners: BTreeSet::new(),
        }
    }

    /// Source this set belongs to.
    #[must_use]
    pub fn key(&self) -> SourceKey {
        self.key
    }

    /// Adds `layer`. Returns true if it was not referencing the source yet.
    pub fn ensure(&mut self, layer: LayerKind) -> bool {
        self.owners.insert(layer)
    }

    /// Drops `layer`. Returns true only if this call emptied the set.
    pub fn release(&mut self, layer: LayerKind) -> bool {
        self.owners.remove(&layer) && self.owners.is_empty()
    }

    /// Returns true if any layer references the source.
    #[must_use]
    pub fn is_referenced(&self) -> bool {
        !self.owners.is_empty()
    }

    /// Layers referencing the source.
    pub fn owners(&self) -> impl Iterator<Item = LayerKind> + '_ {
        self.owners.iter().copied()
    }

    /// Forgets every reference without touching the renderer.
    pub fn clear(&mut self) {
        self.owners.clear();
    }
}

/// A shared backing source.
///
/// Implementors provide the reference set, the renderer descriptor, and
/// their data handling. The reference-counted lifecycle is provided.
pub trait Datasource: core::fmt::Debug {
    /// Reference set.
    fn refs(&self) -> &SourceRefs;

    /// Mutable reference set.
    fn refs_mut(&mut self) -> &mut SourceRefs;

    /// Renderer descriptor for the current data.
    fn descriptor(&self, settings: &MapSettings) -> SourceDescriptor;

    /// Whether [`ensure`](Self::ensure) creates a missing renderer source.
    fn creates_on_ensure(&self) -> bool {
        false
    }

    /// Renderer source id.
    fn id(&self) -> &'static str {
        self.refs().key().id()
    }

    /// Recomputes cached data and limits after the data set changed, and
    /// pushes new data to the renderer source if it exists.
    fn update(
        &mut self,
        renderer: &mut dyn MapRenderer,
        roles: &RoleMap,
        features: &[Feature],
        settings: &MapSettings,
    ) -> Result<(), RendererError> {
        _ = (renderer, roles, features, settings);
        Ok(())
    }

    /// Color limits of the 0-based color field `field`. Unbound fields
    /// yield [`Limits::empty`].
    fn color_limits(&self, field: usize) -> Limits {
        _ = field;
        Limits::empty()
    }

    /// Size limits. An unbound size field yields [`Limits::empty`].
    fn size_limits(&self) -> Limits {
        Limits::empty()
    }

    /// Geographic bounds of the data in (longitude, latitude) degrees.
    fn bounds(&self) -> Option<Rect> {
        None
    }

    /// `(location, value)` pairs of the 0-based color field `field` for
    /// sources joined by location.
    fn location_values(&self, field: usize) -> &[(String, Value)] {
        _ = field;
        &[]
    }

    /// Re-buckets zoom-dependent data. Returns true if the bucketing
    /// changed and layers drawing from this source need a restyle.
    fn handle_zoom(
        &mut self,
        renderer: &mut dyn MapRenderer,
        settings: &MapSettings,
        zoom: f64,
    ) -> Result<bool, RendererError> {
        _ = (renderer, settings, zoom);
        Ok(false)
    }

    /// Adds the renderer source if it does not exist yet.
    fn add_to_map(
        &mut self,
        renderer: &mut dyn MapRenderer,
        settings: &MapSettings,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), RendererError> {
        let id = self.id();
        if renderer.source(id).is_none() {
            renderer.add_source(id, self.descriptor(settings))?;
            tracer.source_added(&SourceAddedEvent { source: id });
        }
        Ok(())
    }

    /// Records `layer` as a referencing owner. Idempotent.
    fn ensure(
        &mut self,
        renderer: &mut dyn MapRenderer,
        layer: LayerKind,
        settings: &MapSettings,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), RendererError> {
        self.refs_mut().ensure(layer);
        if self.creates_on_ensure() {
            self.add_to_map(renderer, settings, tracer)?;
        }
        Ok(())
    }

    /// Drops `layer`'s reference and tears the renderer source down when
    /// it was the last one.
    fn remove_from_map(
        &mut self,
        renderer: &mut dyn MapRenderer,
        layer: LayerKind,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), RendererError> {
        if !self.refs_mut().release(layer) {
            return Ok(());
        }
        let id = self.id();
        if renderer.source(id).is_some() {
            if let Err(err) = renderer.remove_source(id) {
                // Keep the reference so the next release retries the removal.
                self.refs_mut().ensure(layer);
                return Err(err);
            }
            tracer.source_removed(&SourceRemovedEvent { source: id });
        }
        Ok(())
    }
}

/// Every shared source, addressable by [`SourceKey`].
#[derive(Debug)]
pub struct Datasources {
    raster: RasterSource,
    point: PointSource,
    choropleth: ChoroplethSource,
    cluster: ClusterSource,
}

impl Default for Datasources {
    fn default() -> Self {
        Self::new()
    }
}

impl Datasources {
    /// Creates every source with no references and no data.
    #[must_use]
    pub fn new() -> Self {
        Self {
            raster: RasterSource::new(),
            point: PointSource::new(),
            choropleth: ChoroplethSource::new(),
            cluster: ClusterSource::new(),
        }
    }

    /// Returns the source for `key`.
    #[must_use]
    pub fn get(&self, key: SourceKey) -> &dyn Datasource {
        match key {
            SourceKey::Raster => &self.raster,
            SourceKey::Point => &self.point,
            SourceKey::Choropleth => &self.choropleth,
            SourceKey::Cluster => &self.cluster,
        }
    }

    /// Returns the source for `key`, mutably.
    pub fn get_mut(&mut self, key: SourceKey) -> &mut dyn Datasource {
        match key {
            SourceKey::Raster => &mut self.raster,
            SourceKey::Point => &mut self.point,
            SourceKey::Choropleth => &mut self.choropleth,
            SourceKey::Cluster => &mut self.cluster,
        }
    }

    /// The choropleth source, for location joins.
    #[must_use]
    pub fn choropleth(&self) -> &ChoroplethSource {
        &self.choropleth
    }

    /// The cluster source.
    #[must_use]
    pub fn cluster(&self) -> &ClusterSource {
        &self.cluster
    }

    /// Forgets every reference after the renderer discarded its style.
    pub fn forget_all(&mut self) {
        for key in SourceKey::ALL {
            self.get_mut(key).refs_mut().clear();
        }
    }

    /// Union of the bounds of every referenced source.
    #[must_use]
    pub fn referenced_bounds(&self) -> Option<Rect> {
        SourceKey::ALL
            .into_iter()
            .map(|key| self.get(key))
            .filter(|s| s.refs().is_referenced())
            .filter_map(|s| s.bounds())
            .reduce(|a, b| a.union(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{LayerDescriptor, LayerType};
    use crate::memory::{MemoryRenderer, RendererCall};

    #[test]
    fn release_reports_only_the_emptying_call() {
        let mut refs = SourceRefs::new(SourceKey::Point);
        assert!(refs.ensure(LayerKind::Circle), "first reference");
        assert!(!refs.ensure(LayerKind::Circle), "already referenced");
        refs.ensure(LayerKind::Heatmap);
        assert!(!refs.release(LayerKind::Circle), "heatmap still holds it");
        assert!(!refs.release(LayerKind::Symbol), "never referenced");
        assert!(refs.release(LayerKind::Heatmap), "last reference");
        assert!(!refs.release(LayerKind::Heatmap), "already released");
    }

    #[test]
    fn shared_source_is_removed_once_after_last_release() {
        let mut renderer = MemoryRenderer::new();
        let mut sources = Datasources::new();
        let settings = MapSettings::default();
        let mut tracer = Tracer::none();
        let point = sources.get_mut(SourceKey::Point);
        point
            .ensure(&mut renderer, LayerKind::Circle, &settings, &mut tracer)
            .unwrap();
        point
            .ensure(&mut renderer, LayerKind::Heatmap, &settings, &mut tracer)
            .unwrap();
        assert!(renderer.source("data").is_some(), "created on first ensure");

        point
            .remove_from_map(&mut renderer, LayerKind::Heatmap, &mut tracer)
            .unwrap();
        assert!(renderer.source("data").is_some(), "circle still references it");
        point
            .remove_from_map(&mut renderer, LayerKind::Circle, &mut tracer)
            .unwrap();
        point
            .remove_from_map(&mut renderer, LayerKind::Circle, &mut tracer)
            .unwrap();
        assert!(renderer.source("data").is_none(), "torn down");
        let removals = renderer
            .calls()
            .iter()
            .filter(|c| matches!(c, RendererCall::RemoveSource(id) if id == "data"))
            .count();
        assert_eq!(removals, 1);
    }

    #[test]
    fn failed_teardown_is_retried_on_the_next_release() {
        let mut renderer = MemoryRenderer::new();
        let mut sources = Datasources::new();
        let settings = MapSettings::default();
        let mut tracer = Tracer::none();
        let point = sources.get_mut(SourceKey::Point);
        point
            .ensure(&mut renderer, LayerKind::Circle, &settings, &mut tracer)
            .unwrap();
        renderer
            .add_layer(LayerDescriptor::new("stray", LayerType::Circle, "data"), None)
            .unwrap();

        let err = point
            .remove_from_map(&mut renderer, LayerKind::Circle, &mut tracer)
            .unwrap_err();
        assert!(matches!(err, RendererError::SourceInUse { .. }), "{err:?}");
        assert!(point.refs().is_referenced(), "reference kept for the retry");

        renderer.remove_layer("stray").unwrap();
        point
            .remove_from_map(&mut renderer, LayerKind::Circle, &mut tracer)
            .unwrap();
        assert!(renderer.source("data").is_none(), "torn down on retry");
        assert!(!point.refs().is_referenced());
    }

    #[test]
    fn forget_all_leaves_renderer_untouched() {
        let mut renderer = MemoryRenderer::new();
        let mut sources = Datasources::new();
        let settings = MapSettings::default();
        sources
            .get_mut(SourceKey::Point)
            .ensure(&mut renderer, LayerKind::Circle, &settings, &mut Tracer::none())
            .unwrap();
        renderer.clear_calls();
        sources.forget_all();
        assert!(!sources.get(SourceKey::Point).refs().is_referenced(), "cleared");
        assert!(renderer.calls().is_empty(), "no renderer calls");
    }
}
