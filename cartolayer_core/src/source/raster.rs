// Copyright 2026 the Cartolayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::{Datasource, SourceKey, SourceRefs};
use crate::backend::SourceDescriptor;
use crate::settings::MapSettings;

/// Raster tiles from the configured URL template.
#[derive(Clone, Debug)]
pub struct RasterSource {
    refs: SourceRefs,
}

impl RasterSource {
    /// Creates an unreferenced raster source.
    #[must_use]
    pub fn new() -> Self {
        Self {
            refs: SourceRefs::new(SourceKey::Raster),
        }
    }
}

impl Default for RasterSource {
    fn default() -> Self {
        Self::new()
    }
}

impl Datasource for RasterSource {
    fn refs(&self) -> &SourceRefs {
        &self.refs
    }

    fn refs_mut(&mut self) -> &mut SourceRefs {
        &mut self.refs
    }

    fn creates_on_ensure(&self) -> bool {
        true
    }

    fn descriptor(&self, settings: &MapSettings) -> SourceDescriptor {
        SourceDescriptor::Raster {
            tiles: vec![settings.raster.url.clone()],
            tile_size: settings.raster.raster_tile_size,
        }
    }
}
