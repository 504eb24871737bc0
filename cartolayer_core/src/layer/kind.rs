// Copyright 2026 the Cartolayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer kinds and their fixed identities.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::source::SourceKey;

/// One of the six thematic layer kinds.
///
/// Declaration order is draw order, bottom first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    /// Raster tile overlay.
    Raster,
    /// Filled regions joined by location.
    Choropleth,
    /// Proportional circles.
    Circle,
    /// Point density.
    Heatmap,
    /// Grid-aggregated point clusters.
    Cluster,
    /// Icon markers.
    Symbol,
}

impl LayerKind {
    /// Every kind in draw order, bottom first.
    pub const ALL: [Self; 6] = [
        Self::Raster,
        Self::Choropleth,
        Self::Circle,
        Self::Heatmap,
        Self::Cluster,
        Self::Symbol,
    ];

    /// Id of the base sub-layer, which also identifies the kind.
    #[must_use]
    pub const fn id(self) -> &'static str {
        self.sub_layers()[0]
    }

    /// Renderer layer ids owned by this kind, bottom first.
    #[must_use]
    pub const fn sub_layers(self) -> &'static [&'static str] {
        match self {
            Self::Raster => &["raster"],
            Self::Choropleth => &["choropleth", "choropleth-highlight"],
            Self::Circle => &["circle", "circle-highlight"],
            Self::Heatmap => &["heatmap"],
            Self::Cluster => &["cluster", "cluster-label"],
            Self::Symbol => &["symbol", "symbol-highlight"],
        }
    }

    /// Shared data source this kind draws from.
    #[must_use]
    pub const fn source(self) -> SourceKey {
        match self {
            Self::Raster => SourceKey::Raster,
            Self::Choropleth => SourceKey::Choropleth,
            Self::Circle | Self::Heatmap | Self::Symbol => SourceKey::Point,
            Self::Cluster => SourceKey::Cluster,
        }
    }

    /// Position in [`ALL`](Self::ALL).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns true if this kind stays under base-map labels regardless of
    /// the label position setting.
    #[must_use]
    pub const fn stays_below_labels(self) -> bool {
        matches!(self, Self::Choropleth)
    }

    /// Every renderer layer id owned by any kind.
    pub fn managed_ids() -> impl Iterator<Item = &'static str> {
        Self::ALL.into_iter().flat_map(|k| k.sub_layers().iter().copied())
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
