// Copyright 2026 the Cartolayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structured tracing of the layer lifecycle.
//!
//! This module provides a [`TraceSink`] trait with one method per lifecycle
//! event. All method bodies default to no-ops, so implementing only the
//! events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace`
//! feature is **off**, every `Tracer` method compiles to nothing. When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! Diagnostics that are not part of the lifecycle (renderer failures,
//! unparsable colors) go through the `tracing` crate instead.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).

use crate::layer::LayerKind;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted after a layer's sub-layers were added to the renderer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerAddedEvent {
    /// Layer that was added.
    pub layer: LayerKind,
    /// Anchor the sub-layers were inserted below, `None` for the top.
    pub before: Option<String>,
}

/// Emitted after a layer's sub-layers were moved to a new anchor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerMovedEvent {
    /// Layer that was moved.
    pub layer: LayerKind,
    /// New anchor, `None` for the top.
    pub before: Option<String>,
}

/// Emitted after a layer's sub-layers were removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerRemovedEvent {
    /// Layer that was removed.
    pub layer: LayerKind,
}

/// Emitted after a layer's style properties were applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerRestyledEvent {
    /// Layer that was restyled.
    pub layer: LayerKind,
    /// Number of color stops in the new style.
    pub color_stops: usize,
    /// Whether a zoom bucket change caused the restyle.
    pub from_zoom: bool,
}

/// Emitted when a backing source was created in the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceAddedEvent {
    /// Renderer source id.
    pub source: &'static str,
}

/// Emitted when a backing source was torn down.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceRemovedEvent {
    /// Renderer source id.
    pub source: &'static str,
}

/// Emitted when a style load invalidated every layer and source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleResetEvent {
    /// Style that finished loading.
    pub style: String,
}

/// Emitted when the zoom level crossed an integer boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZoomSettledEvent {
    /// New integer zoom bucket.
    pub bucket: i32,
    /// Number of layers restyled in response.
    pub restyled: usize,
}

/// Emitted at the end of a full update pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassCompletedEvent {
    /// Layers visible after the pass.
    pub visible: usize,
    /// Layers that failed during the pass.
    pub errors: usize,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives lifecycle trace events.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called after a layer was added.
    fn on_layer_added(&mut self, e: &LayerAddedEvent) {
        _ = e;
    }

    /// Called after a layer was moved.
    fn on_layer_moved(&mut self, e: &LayerMovedEvent) {
        _ = e;
    }

    /// Called after a layer was removed.
    fn on_layer_removed(&mut self, e: &LayerRemovedEvent) {
        _ = e;
    }

    /// Called after a layer was restyled.
    fn on_layer_restyled(&mut self, e: &LayerRestyledEvent) {
        _ = e;
    }

    /// Called after a source was created.
    fn on_source_added(&mut self, e: &SourceAddedEvent) {
        _ = e;
    }

    /// Called after a source was torn down.
    fn on_source_removed(&mut self, e: &SourceRemovedEvent) {
        _ = e;
    }

    /// Called when a style load reset the renderer.
    fn on_style_reset(&mut self, e: &StyleResetEvent) {
        _ = e;
    }

    /// Called when the zoom crossed an integer level.
    fn on_zoom_settled(&mut self, e: &ZoomSettledEvent) {
        _ = e;
    }

    /// Called at the end of an update pass.
    fn on_pass_completed(&mut self, e: &PassCompletedEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing.
/// When **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

macro_rules! emit {
    ($self:ident, $method:ident, $e:expr) => {{
        #[cfg(feature = "trace")]
        if let Some(s) = &mut $self.sink {
            s.$method($e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = $e;
        }
    }};
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`LayerAddedEvent`].
    #[inline]
    pub fn layer_added(&mut self, e: &LayerAddedEvent) {
        emit!(self, on_layer_added, e);
    }

    /// Emits a [`LayerMovedEvent`].
    #[inline]
    pub fn layer_moved(&mut self, e: &LayerMovedEvent) {
        emit!(self, on_layer_moved, e);
    }

    /// Emits a [`LayerRemovedEvent`].
    #[inline]
    pub fn layer_removed(&mut self, e: &LayerRemovedEvent) {
        emit!(self, on_layer_removed, e);
    }

    /// Emits a [`LayerRestyledEvent`].
    #[inline]
    pub fn layer_restyled(&mut self, e: &LayerRestyledEvent) {
        emit!(self, on_layer_restyled, e);
    }

    /// Emits a [`SourceAddedEvent`].
    #[inline]
    pub fn source_added(&mut self, e: &SourceAddedEvent) {
        emit!(self, on_source_added, e);
    }

    /// Emits a [`SourceRemovedEvent`].
    #[inline]
    pub fn source_removed(&mut self, e: &SourceRemovedEvent) {
        emit!(self, on_source_removed, e);
    }

    /// Emits a [`StyleResetEvent`].
    #[inline]
    pub fn style_reset(&mut self, e: &StyleResetEvent) {
        emit!(self, on_style_reset, e);
    }

    /// Emits a [`ZoomSettledEvent`].
    #[inline]
    pub fn zoom_settled(&mut self, e: &ZoomSettledEvent) {
        emit!(self, on_zoom_settled, e);
    }

    /// Emits a [`PassCompletedEvent`].
    #[inline]
    pub fn pass_completed(&mut self, e: &PassCompletedEvent) {
        emit!(self, on_pass_completed, e);
    }
}
