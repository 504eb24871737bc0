// Copyright 2026 the Cartolayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Grid clustering of points by integer zoom level.
//!
//! At zoom `z` the world is `512 * 2^z` pixels wide in Web Mercator. Points
//! falling into the same `clusterRadius`-sized pixel cell form one cluster
//! centered on their mean position. Above `clusterMaxZoom` every point is
//! its own cluster, so all deeper zoom levels share a single bucket.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use kurbo::{Point, Rect};
use serde_json::json;

use super::point::{feature_collection, point_bounds};
use super::{Datasource, SourceKey, SourceRefs};
use crate::backend::{MapRenderer, SourceDescriptor};
use crate::data::{Feature, Limits, RoleMap, Value};
use crate::error::RendererError;
use crate::settings::{Aggregation, ClusterSettings, MapSettings};

/// Pixel size of a Web Mercator tile at integer zoom levels.
const TILE_SIZE: f64 = 512.0;

/// Latitude limit of the Web Mercator projection.
const MAX_LATITUDE: f64 = 85.051_128_78;

/// Aggregated group of points.
#[derive(Clone, Debug, PartialEq)]
pub struct Cluster {
    /// Mean position of the members.
    pub center: Point,
    /// Number of members.
    pub count: usize,
    /// Aggregated cluster field value.
    pub value: f64,
}

/// Points grouped into zoom-dependent grid clusters.
#[derive(Clone, Debug)]
pub struct ClusterSource {
    refs: SourceRefs,
    points: Vec<(Point, Option<f64>)>,
    bucket: Option<i32>,
    clusters: Vec<Cluster>,
}

impl ClusterSource {
    /// Creates an unreferenced, empty cluster source.
    #[must_use]
    pub fn new() -> Self {
        Self {
            refs: SourceRefs::new(SourceKey::Cluster),
            points: Vec::new(),
            bucket: None,
            clusters: Vec::new(),
        }
    }

    /// Clusters for the current bucket.
    #[must_use]
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// Zoom bucket the clusters were computed for.
    #[must_use]
    pub fn bucket(&self) -> Option<i32> {
        self.bucket
    }

    fn recluster(&mut self, bucket: i32, settings: &ClusterSettings) {
        self.bucket = Some(bucket);
        self.clusters = cluster_points(&self.points, bucket, settings);
    }

    fn data(&self) -> serde_json::Value {
        feature_collection(
            self.clusters
                .iter()
                .map(|c| {
                    json!({
                        "type": "Feature",
                        "geometry": { "type": "Point", "coordinates": [c.center.x, c.center.y] },
                        "properties": { "count": c.count, "value": c.value },
                    })
                })
                .collect(),
        )
    }

    fn push_data(&self, renderer: &mut dyn MapRenderer) -> Result<(), RendererError> {
        let id = self.refs.key().id();
        if renderer.source(id).is_some() {
            renderer.set_source_data(id, self.data())?;
        }
        Ok(())
    }
}

impl Default for ClusterSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Integer zoom bucket for `zoom`, collapsing everything above the cluster
/// limit into one bucket.
#[expect(
    clippy::cast_possible_truncation,
    reason = "zoom levels are small; the cast saturates for pathological input"
)]
pub(crate) fn bucket_for(zoom: f64, settings: &ClusterSettings) -> i32 {
    let limit = settings.cluster_max_zoom.floor() as i32 + 1;
    (zoom.floor() as i32).min(limit)
}

/// Projects (longitude, latitude) to Web Mercator pixels at `bucket`.
fn project(p: Point, bucket: i32) -> Point {
    let world = TILE_SIZE * 2_f64.powi(bucket);
    let lat = p.y.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (p.x + 180.0) / 360.0 * world;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * world;
    Point::new(x, y)
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "cell coordinates fit in i64 for any zoom the renderer supports"
)]
fn cluster_points(points: &[(Point, Option<f64>)], bucket: i32, settings: &ClusterSettings) -> Vec<Cluster> {
    let clustering = f64::from(bucket) <= settings.cluster_max_zoom;
    let radius = settings.cluster_radius.max(1.0);
    let mut cells: BTreeMap<(i64, i64), Vec<(Point, Option<f64>)>> = BTreeMap::new();
    for (i, &(p, v)) in points.iter().enumerate() {
        let cell = if clustering {
            let px = project(p, bucket);
            ((px.x / radius).floor() as i64, (px.y / radius).floor() as i64)
        } else {
            (i as i64, 0)
        };
        cells.entry(cell).or_default().push((p, v));
    }
    cells
        .into_values()
        .map(|members| {
            let count = members.len();
            let n = count as f64;
            let sum = members
                .iter()
                .fold(Point::ZERO, |acc, (p, _)| Point::new(acc.x + p.x, acc.y + p.y));
            let values: Vec<f64> = members.iter().filter_map(|(_, v)| *v).collect();
            Cluster {
                center: Point::new(sum.x / n, sum.y / n),
                count,
                value: aggregate(settings.aggregation, count, &values),
            }
        })
        .collect()
}

fn aggregate(aggregation: Aggregation, count: usize, values: &[f64]) -> f64 {
    let fold = |f: fn(f64, f64) -> f64| values.iter().copied().reduce(f).unwrap_or(0.0);
    match aggregation {
        Aggregation::Count => count as f64,
        Aggregation::Sum => values.iter().sum(),
        Aggregation::Average if values.is_empty() => 0.0,
        Aggregation::Average => values.iter().sum::<f64>() / values.len() as f64,
        Aggregation::Minimum => fold(f64::min),
        Aggregation::Maximum => fold(f64::max),
    }
}

impl Datasource for ClusterSource {
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
        SourceDescriptor::GeoJson { data: self.data() }
    }

    fn update(
        &mut self,
        renderer: &mut dyn MapRenderer,
        roles: &RoleMap,
        features: &[Feature],
        settings: &MapSettings,
    ) -> Result<(), RendererError> {
        let field = roles.cluster().map(|c| c.display_name.as_str());
        self.points = features
            .iter()
            .filter_map(|f| {
                let value = field
                    .and_then(|name| f.property(name))
                    .and_then(Value::as_number);
                Some((f.position?, value))
            })
            .collect();
        self.recluster(bucket_for(renderer.zoom(), &settings.cluster), &settings.cluster);
        self.push_data(renderer)
    }

    fn color_limits(&self, _field: usize) -> Limits {
        if self.clusters.is_empty() {
            return Limits::empty();
        }
        Limits::from_values(self.clusters.iter().map(|c| Value::Number(c.value)).collect())
    }

    fn bounds(&self) -> Option<Rect> {
        point_bounds(self.points.iter().map(|(p, _)| p))
    }

    fn handle_zoom(
        &mut self,
        renderer: &mut dyn MapRenderer,
        settings: &MapSettings,
        zoom: f64,
    ) -> Result<bool, RendererError> {
        let bucket = bucket_for(zoom, &settings.cluster);
        if self.bucket == Some(bucket) {
            return Ok(false);
        }
        self.recluster(bucket, &settings.cluster);
        self.push_data(renderer)?;
        Ok(true)
    }
}
