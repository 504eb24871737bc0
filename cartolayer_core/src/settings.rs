// Copyright 2026 the Cartolayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-layer-kind configuration.
//!
//! [`MapSettings`] is a plain serde tree. Every section and field has a
//! default, so a partial JSON document only overrides what it names:
//!
//! ```
//! use cartolayer_core::settings::{LabelPosition, MapSettings};
//!
//! let settings = MapSettings::from_json(
//!     r##"{ "api": { "labelPosition": "below" }, "circle": { "show": true } }"##,
//! )
//! .unwrap();
//! assert_eq!(settings.api.label_position, LabelPosition::Below);
//! assert!(settings.circle.show);
//! assert_eq!(settings.circle.radius, 3.0);
//! ```
//!
//! Opacities are percentages in `0..=100`; [`opacity`] converts them to the
//! renderer's `0..=1` range.

use serde::{Deserialize, Serialize};

use crate::classify::DEFAULT_MAX_CLASSES;
use crate::error::SettingsError;
use crate::layer::LayerKind;
use crate::stops::ColorRampSettings;

/// Highest zoom level accepted in a layer zoom range.
pub const MAX_ZOOM_LEVEL: f64 = 24.0;

/// Converts a percentage opacity to the renderer's `0..=1` range.
#[must_use]
pub fn opacity(percent: f64) -> f64 {
    (percent / 100.0).clamp(0.0, 1.0)
}

/// Where data layers sit relative to the base style's labels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelPosition {
    /// Base-map labels are drawn on top of data layers.
    #[default]
    Above,
    /// Data layers are drawn on top of base-map labels.
    Below,
}

/// How the cluster layer combines the values of grouped points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Aggregation {
    /// Number of points.
    #[default]
    Count,
    /// Sum of the cluster field.
    Sum,
    /// Mean of the cluster field.
    Average,
    /// Smallest cluster field value.
    Minimum,
    /// Largest cluster field value.
    Maximum,
}

/// Complete configuration for one map.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapSettings {
    /// Map-wide options.
    pub api: ApiSettings,
    /// Raster tile overlay.
    pub raster: RasterSettings,
    /// Filled regions joined by location.
    pub choropleth: ChoroplethSettings,
    /// Proportional circles.
    pub circle: CircleSettings,
    /// Point density heatmap.
    pub heatmap: HeatmapSettings,
    /// Grid-aggregated point clusters.
    pub cluster: ClusterSettings,
    /// Icon markers.
    pub symbol: SymbolSettings,
}

impl MapSettings {
    /// Parses settings from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks that every zoom range satisfies `0 <= min <= max <= 24`.
    pub fn validate(&self) -> Result<(), SettingsError> {
        for kind in LayerKind::ALL {
            let (min, max) = self.zoom_range(kind);
            if !(0.0..=MAX_ZOOM_LEVEL).contains(&min)
                || !(0.0..=MAX_ZOOM_LEVEL).contains(&max)
                || min > max
            {
                return Err(SettingsError::InvalidZoomRange {
                    layer: kind,
                    min,
                    max,
                });
            }
        }
        Ok(())
    }

    /// Returns whether `kind` is enabled.
    #[must_use]
    pub fn show(&self, kind: LayerKind) -> bool {
        match kind {
            LayerKind::Raster => self.raster.show && !self.raster.url.is_empty(),
            LayerKind::Choropleth => self.choropleth.display(),
            LayerKind::Circle => self.circle.show,
            LayerKind::Heatmap => self.heatmap.show,
            LayerKind::Cluster => self.cluster.show,
            LayerKind::Symbol => self.symbol.show,
        }
    }

    /// Returns the `(min, max)` zoom range of `kind`.
    #[must_use]
    pub fn zoom_range(&self, kind: LayerKind) -> (f64, f64) {
        match kind {
            LayerKind::Raster => (self.raster.min_zoom, self.raster.max_zoom),
            LayerKind::Choropleth => (self.choropleth.min_zoom, self.choropleth.max_zoom),
            LayerKind::Circle => (self.circle.min_zoom, self.circle.max_zoom),
            LayerKind::Heatmap => (self.heatmap.min_zoom, self.heatmap.max_zoom),
            LayerKind::Cluster => (self.cluster.min_zoom, self.cluster.max_zoom),
            LayerKind::Symbol => (self.symbol.min_zoom, self.symbol.max_zoom),
        }
    }

    /// Returns whether `kind` wants a legend.
    #[must_use]
    pub fn legend(&self, kind: LayerKind) -> bool {
        match kind {
            LayerKind::Choropleth => self.choropleth.legend,
            LayerKind::Circle => self.circle.legend,
            LayerKind::Cluster => self.cluster.legend,
            LayerKind::Raster | LayerKind::Heatmap | LayerKind::Symbol => false,
        }
    }

    /// Returns the style URL to load, resolving the `custom` choice.
    #[must_use]
    pub fn style_url(&self) -> &str {
        if self.api.style == "custom" {
            &self.api.style_url
        } else {
            &self.api.style
        }
    }
}

/// Map-wide options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiSettings {
    /// Base style URL, or `custom` to use [`style_url`](Self::style_url).
    pub style: String,
    /// Custom base style URL.
    pub style_url: String,
    /// Where data layers sit relative to base-map labels.
    pub label_position: LabelPosition,
    /// Fit the viewport to the data after each update.
    pub autozoom: bool,
    /// Initial zoom when `autozoom` is off.
    pub zoom: f64,
    /// Initial longitude when `autozoom` is off.
    pub start_long: f64,
    /// Initial latitude when `autozoom` is off.
    pub start_lat: f64,
    /// Cap on the number of color and size classes.
    pub max_classes: usize,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            style: "mapbox://styles/mapbox/light-v10?optimize=true".to_owned(),
            style_url: String::new(),
            label_position: LabelPosition::Above,
            autozoom: true,
            zoom: 0.0,
            start_long: 0.0,
            start_lat: 0.0,
            max_classes: DEFAULT_MAX_CLASSES,
        }
    }
}

/// Raster tile overlay options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RasterSettings {
    /// Whether the layer is enabled.
    pub show: bool,
    /// Tile URL template.
    pub url: String,
    /// Tile size in pixels.
    pub raster_tile_size: u32,
    /// Opacity percentage.
    pub opacity: f64,
    /// Minimum zoom at which the layer is drawn.
    pub min_zoom: f64,
    /// Maximum zoom at which the layer is drawn.
    pub max_zoom: f64,
}

impl Default for RasterSettings {
    fn default() -> Self {
        Self {
            show: false,
            url: String::new(),
            raster_tile_size: 256,
            opacity: 80.0,
            min_zoom: 0.0,
            max_zoom: 22.0,
        }
    }
}

/// Choropleth options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChoroplethSettings {
    /// Whether the layer is enabled.
    pub show: bool,
    /// 1-based index of the color column.
    pub color_field: usize,
    /// Use a three-color scale split at `mid_value`.
    pub diverging: bool,
    /// Color of the lowest class.
    pub min_color: String,
    /// Color at the midpoint of a diverging scale.
    pub mid_color: String,
    /// Color of the highest class.
    pub max_color: String,
    /// Lower bound of the diverging window.
    pub min_value: Option<f64>,
    /// Split point of the diverging scale.
    pub mid_value: Option<f64>,
    /// Upper bound of the diverging window.
    pub max_value: Option<f64>,
    /// Vector tile source URL.
    pub vector_tile_url: String,
    /// Layer inside the vector tiles holding the regions.
    pub source_layer: String,
    /// Region property joined against the location column.
    pub vector_property: String,
    /// Fill opacity percentage.
    pub opacity: f64,
    /// Region outline color.
    pub outline_color: String,
    /// Region outline width in pixels.
    pub outline_width: f64,
    /// Region outline opacity percentage.
    pub outline_opacity: f64,
    /// Fill color of highlighted regions.
    pub highlight_color: String,
    /// Minimum zoom at which the layer is drawn.
    pub min_zoom: f64,
    /// Maximum zoom at which the layer is drawn.
    pub max_zoom: f64,
    /// Whether to report a legend.
    pub legend: bool,
}

impl Default for ChoroplethSettings {
    fn default() -> Self {
        Self {
            show: false,
            color_field: 1,
            diverging: false,
            min_color: "#edf8b1".to_owned(),
            mid_color: "#7fcdbb".to_owned(),
            max_color: "#2c7fb8".to_owned(),
            min_value: None,
            mid_value: None,
            max_value: None,
            vector_tile_url: "mapbox://mapbox.pbi-countries-v1".to_owned(),
            source_layer: "pbi-countries".to_owned(),
            vector_property: "name".to_owned(),
            opacity: 80.0,
            outline_color: "#bdbdbd".to_owned(),
            outline_width: 1.0,
            outline_opacity: 50.0,
            highlight_color: "#2c7fb8".to_owned(),
            min_zoom: 0.0,
            max_zoom: 22.0,
            legend: true,
        }
    }
}

impl ChoroplethSettings {
    /// Enabled and pointing at a usable vector tile layer.
    #[must_use]
    pub fn display(&self) -> bool {
        self.show
            && !self.vector_tile_url.is_empty()
            && !self.source_layer.is_empty()
            && !self.vector_property.is_empty()
    }

    /// Color ramp inputs for stop generation.
    #[must_use]
    pub fn ramp(&self) -> ColorRampSettings<'_> {
        ColorRampSettings {
            diverging: self.diverging,
            min_color: &self.min_color,
            mid_color: &self.mid_color,
            max_color: &self.max_color,
            min_value: self.min_value,
            mid_value: self.mid_value,
            max_value: self.max_value,
        }
    }
}

/// Circle options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CircleSettings {
    /// Whether the layer is enabled.
    pub show: bool,
    /// 1-based index of the color column.
    pub color_field: usize,
    /// Base radius in pixels.
    pub radius: f64,
    /// Ratio of the largest to the smallest radius.
    pub scale_factor: f64,
    /// Use a three-color scale split at `mid_value`.
    pub diverging: bool,
    /// Color of the lowest class.
    pub min_color: String,
    /// Color at the midpoint of a diverging scale.
    pub mid_color: String,
    /// Color of the highest class.
    pub max_color: String,
    /// Lower bound of the diverging window.
    pub min_value: Option<f64>,
    /// Split point of the diverging scale.
    pub mid_value: Option<f64>,
    /// Upper bound of the diverging window.
    pub max_value: Option<f64>,
    /// Color of highlighted circles.
    pub highlight_color: String,
    /// Circle blur.
    pub blur: f64,
    /// Fill opacity percentage.
    pub opacity: f64,
    /// Stroke width in pixels.
    pub stroke_width: f64,
    /// Stroke color.
    pub stroke_color: String,
    /// Stroke opacity percentage.
    pub stroke_opacity: f64,
    /// Minimum zoom at which the layer is drawn.
    pub min_zoom: f64,
    /// Maximum zoom at which the layer is drawn.
    pub max_zoom: f64,
    /// Whether to report a legend.
    pub legend: bool,
}

impl Default for CircleSettings {
    fn default() -> Self {
        Self {
            show: false,
            color_field: 1,
            radius: 3.0,
            scale_factor: 5.0,
            diverging: false,
            min_color: "#ffffcc".to_owned(),
            mid_color: "#41b6c4".to_owned(),
            max_color: "#253494".to_owned(),
            min_value: None,
            mid_value: None,
            max_value: None,
            highlight_color: "#253494".to_owned(),
            blur: 0.0,
            opacity: 80.0,
            stroke_width: 1.0,
            stroke_color: "#bdbdbd".to_owned(),
            stroke_opacity: 50.0,
            min_zoom: 0.0,
            max_zoom: 22.0,
            legend: true,
        }
    }
}

impl CircleSettings {
    /// Color ramp inputs for stop generation.
    #[must_use]
    pub fn ramp(&self) -> ColorRampSettings<'_> {
        ColorRampSettings {
            diverging: self.diverging,
            min_color: &self.min_color,
            mid_color: &self.mid_color,
            max_color: &self.max_color,
            min_value: self.min_value,
            mid_value: self.mid_value,
            max_value: self.max_value,
        }
    }
}

/// Heatmap options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeatmapSettings {
    /// Whether the layer is enabled.
    pub show: bool,
    /// Kernel radius in pixels.
    pub radius: f64,
    /// Density multiplier.
    pub intensity: f64,
    /// Opacity percentage.
    pub opacity: f64,
    /// Color at low density.
    pub min_color: String,
    /// Color at medium density.
    pub mid_color: String,
    /// Color at full density.
    pub max_color: String,
    /// Minimum zoom at which the layer is drawn.
    pub min_zoom: f64,
    /// Maximum zoom at which the layer is drawn.
    pub max_zoom: f64,
}

impl Default for HeatmapSettings {
    fn default() -> Self {
        Self {
            show: false,
            radius: 5.0,
            intensity: 0.5,
            opacity: 100.0,
            min_color: "#0571b0".to_owned(),
            mid_color: "#f7f7f7".to_owned(),
            max_color: "#ca0020".to_owned(),
            min_zoom: 0.0,
            max_zoom: 22.0,
        }
    }
}

/// Cluster options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClusterSettings {
    /// Whether the layer is enabled.
    pub show: bool,
    /// How grouped values are combined.
    pub aggregation: Aggregation,
    /// Grid cell size in pixels.
    pub cluster_radius: f64,
    /// Highest zoom level at which points are grouped.
    pub cluster_max_zoom: f64,
    /// Color of the smallest aggregate.
    pub min_color: String,
    /// Color of the largest aggregate.
    pub max_color: String,
    /// Base radius in pixels.
    pub radius: f64,
    /// Stroke width in pixels.
    pub stroke_width: f64,
    /// Stroke color.
    pub stroke_color: String,
    /// Stroke opacity percentage.
    pub stroke_opacity: f64,
    /// Minimum zoom at which the layer is drawn.
    pub min_zoom: f64,
    /// Maximum zoom at which the layer is drawn.
    pub max_zoom: f64,
    /// Whether to report a legend.
    pub legend: bool,
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            show: false,
            aggregation: Aggregation::Count,
            cluster_radius: 50.0,
            cluster_max_zoom: 12.0,
            min_color: "#ffffcc".to_owned(),
            max_color: "#253494".to_owned(),
            radius: 10.0,
            stroke_width: 1.0,
            stroke_color: "#bdbdbd".to_owned(),
            stroke_opacity: 50.0,
            min_zoom: 0.0,
            max_zoom: 22.0,
            legend: true,
        }
    }
}

impl ClusterSettings {
    /// Color ramp inputs for stop generation. Clusters never diverge.
    #[must_use]
    pub fn ramp(&self) -> ColorRampSettings<'_> {
        ColorRampSettings {
            diverging: false,
            min_color: &self.min_color,
            mid_color: &self.min_color,
            max_color: &self.max_color,
            min_value: None,
            mid_value: None,
            max_value: None,
        }
    }
}

/// Icon marker options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SymbolSettings {
    /// Whether the layer is enabled.
    pub show: bool,
    /// Icon image URL; empty draws the renderer's default marker.
    pub url: String,
    /// Icon scale.
    pub icon_size: f64,
    /// Opacity percentage.
    pub opacity: f64,
    /// Minimum zoom at which the layer is drawn.
    pub min_zoom: f64,
    /// Maximum zoom at which the layer is drawn.
    pub max_zoom: f64,
}

impl Default for SymbolSettings {
    fn default() -> Self {
        Self {
            show: false,
            url: String::new(),
            icon_size: 1.0,
            opacity: 100.0,
            min_zoom: 0.0,
            max_zoom: 22.0,
        }
    }
}
