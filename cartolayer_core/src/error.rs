// Copyright 2026 the Cartolayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.
//!
//! Renderer primitives fail with [`RendererError`]. Configuration loading
//! fails with [`SettingsError`]. A layer that fails during an update pass is
//! reported as a [`SyncError`], which names the layer and keeps the renderer
//! failure as its source.
//!
//! Missing field bindings and degenerate value sets are not errors: they
//! degrade to neutral styles inside [`stops`](crate::stops).

use crate::layer::LayerKind;

/// Failure reported by a [`MapRenderer`](crate::backend::MapRenderer)
/// primitive.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RendererError {
    /// The referenced layer does not exist in the current style.
    #[error("layer `{0}` does not exist")]
    UnknownLayer(String),

    /// The referenced source does not exist in the current style.
    #[error("source `{0}` does not exist")]
    UnknownSource(String),

    /// A layer with this id already exists.
    #[error("layer `{0}` already exists")]
    DuplicateLayer(String),

    /// A source with this id already exists.
    #[error("source `{0}` already exists")]
    DuplicateSource(String),

    /// The source cannot be removed while a layer still draws from it.
    #[error("source `{id}` is still used by layer `{layer}`")]
    SourceInUse {
        /// Source that was asked to be removed.
        id: String,
        /// A layer that still references it.
        layer: String,
    },

    /// The renderer has no loaded style to operate on.
    #[error("style is not loaded")]
    StyleNotLoaded,

    /// An image could not be fetched or decoded.
    #[error("failed to load image: {0}")]
    ImageLoad(String),
}

/// Failure while loading or validating [`MapSettings`](crate::settings::MapSettings).
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The settings document is not valid JSON for the settings schema.
    #[error("invalid settings document: {0}")]
    Parse(#[from] serde_json::Error),

    /// A layer's zoom range is outside `0..=24` or inverted.
    #[error("invalid zoom range for {layer}: {min}..{max}")]
    InvalidZoomRange {
        /// Layer whose range is invalid.
        layer: LayerKind,
        /// Configured minimum zoom.
        min: f64,
        /// Configured maximum zoom.
        max: f64,
    },
}

/// A layer that could not be synchronized during an update pass.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    /// A renderer primitive failed while processing `layer`.
    #[error("failed to synchronize {layer} layer")]
    Renderer {
        /// Layer being processed.
        layer: LayerKind,
        /// Underlying renderer failure.
        #[source]
        source: RendererError,
    },
}

impl SyncError {
    /// Layer that failed.
    #[must_use]
    pub fn layer(&self) -> LayerKind {
        match self {
            Self::Renderer { layer, .. } => *layer,
        }
    }
}
