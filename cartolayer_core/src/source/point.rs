// Copyright 2026 the Cartolayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::Rect;
use serde_json::json;

use super::{Datasource, SourceKey, SourceRefs};
use crate::backend::{MapRenderer, SourceDescriptor};
use crate::data::{Feature, Limits, Role, RoleMap};
use crate::error::RendererError;
use crate::settings::MapSettings;

/// GeoJSON points shared by the circle, heatmap, and symbol layers.
#[derive(Clone, Debug)]
pub struct PointSource {
    refs: SourceRefs,
    data: serde_json::Value,
    color: Vec<Limits>,
    size: Limits,
    bounds: Option<Rect>,
}

impl PointSource {
    /// Creates an unreferenced, empty point source.
    #[must_use]
    pub fn new() -> Self {
        Self {
            refs: SourceRefs::new(SourceKey::Point),
            data: feature_collection(Vec::new()),
            color: Vec::new(),
            size: Limits::empty(),
            bounds: None,
        }
    }

    /// Current GeoJSON feature collection.
    #[must_use]
    pub fn data(&self) -> &serde_json::Value {
        &self.data
    }
}

impl Default for PointSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Wraps features in a GeoJSON `FeatureCollection`.
pub(crate) fn feature_collection(features: Vec<serde_json::Value>) -> serde_json::Value {
    json!({ "type": "FeatureCollection", "features": features })
}

/// Bounding box of every positioned feature.
pub(crate) fn point_bounds<'a>(points: impl IntoIterator<Item = &'a kurbo::Point>) -> Option<Rect> {
    points.into_iter().fold(None, |acc: Option<Rect>, p| {
        Some(acc.map_or_else(|| Rect::from_points(*p, *p), |r| r.union_pt(*p)))
    })
}

impl Datasource for PointSource {
    fn refs(&self) -> &SourceRefs {
        &self.refs
    }

    fn refs_mut(&mut self) -> &mut SourceRefs {
        &mut self.refs
    }

    fn creates_on_ensure(&self) -> bool {
        true
    }

    fn descriptor(&self, _settings: &MapSettings) -> SourceDescriptor {
        SourceDescriptor::GeoJson {
            data: self.data.clone(),
        }
    }

    fn update(
        &mut self,
        renderer: &mut dyn MapRenderer,
        roles: &RoleMap,
        features: &[Feature],
        _settings: &MapSettings,
    ) -> Result<(), RendererError> {
        self.data = feature_collection(features.iter().filter_map(Feature::to_geojson).collect());
        self.color = roles
            .get_all(Role::Color)
            .map(|c| Limits::from_column(Some(c)))
            .collect();
        self.size = Limits::from_column(roles.size());
        self.bounds = point_bounds(features.iter().filter_map(|f| f.position.as_ref()));

        if renderer.source(self.refs.key().id()).is_some() {
            renderer.set_source_data(self.refs.key().id(), self.data.clone())?;
        }
        Ok(())
    }

    fn color_limits(&self, field: usize) -> Limits {
        self.color
            .get(field)
            .or_else(|| self.color.first())
            .cloned()
            .unwrap_or_default()
    }

    fn size_limits(&self) -> Limits {
        self.size.clone()
    }

    fn bounds(&self) -> Option<Rect> {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Column, Value};
    use crate::layer::LayerKind;
    use crate::memory::{MemoryRenderer, RendererCall};
    use crate::trace::Tracer;

    fn roles() -> RoleMap {
        RoleMap::new(vec![
            Column::numeric("lat", [10.0, -5.0]).with_role(Role::Latitude),
            Column::numeric("lon", [20.0, 40.0]).with_role(Role::Longitude),
            Column::numeric("pop", [3.0, 8.0]).with_role(Role::Color),
            Column::numeric("area", [1.0, 2.0]).with_role(Role::Size),
        ])
    }

    #[test]
    fn update_computes_limits_and_bounds() {
        let roles = roles();
        let mut renderer = MemoryRenderer::new();
        let mut source = PointSource::new();
        source
            .update(&mut renderer, &roles, &roles.features(), &MapSettings::default())
            .unwrap();
        assert_eq!(source.color_limits(0).max, Some(8.0));
        assert_eq!(source.color_limits(7).max, Some(8.0), "falls back to first field");
        assert_eq!(source.size_limits().values, [Value::from(1.0), Value::from(2.0)]);
        assert_eq!(source.bounds(), Some(Rect::new(20.0, -5.0, 40.0, 10.0)));
        assert!(renderer.calls().is_empty(), "no source in the renderer yet");
    }

    #[test]
    fn update_pushes_data_to_existing_source() {
        let roles = roles();
        let settings = MapSettings::default();
        let mut renderer = MemoryRenderer::new();
        let mut source = PointSource::new();
        source
            .ensure(&mut renderer, LayerKind::Circle, &settings, &mut Tracer::none())
            .unwrap();
        source
            .update(&mut renderer, &roles, &roles.features(), &settings)
            .unwrap();
        assert!(
            renderer
                .calls()
                .iter()
                .any(|c| matches!(c, RendererCall::SetSourceData(id) if id == "data")),
            "data pushed"
        );
        assert_eq!(source.data()["features"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn unbound_fields_give_neutral_limits() {
        let source = PointSource::new();
        assert!(source.color_limits(0).is_empty(), "no color field");
        assert!(source.size_limits().is_empty(), "no size field");
        assert_eq!(source.bounds(), None);
    }
}
