// Copyright 2026 the Cartolayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory event recording.
//!
//! [`RecorderSink`] implements [`TraceSink`] and appends every event to a
//! log of [`RecordedEvent`]s, in emission order. The log can be inspected
//! directly in tests or handed to [`json::export`](crate::json::export).

use cartolayer_core::trace::{
    LayerAddedEvent, LayerMovedEvent, LayerRemovedEvent, LayerRestyledEvent, PassCompletedEvent,
    SourceAddedEvent, SourceRemovedEvent, StyleResetEvent, TraceSink, ZoomSettledEvent,
};

// ---------------------------------------------------------------------------
// RecordedEvent
// ---------------------------------------------------------------------------

/// One recorded lifecycle event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    /// A layer's sub-layers were added.
    LayerAdded(LayerAddedEvent),
    /// A layer's sub-layers were moved.
    LayerMoved(LayerMovedEvent),
    /// A layer's sub-layers were removed.
    LayerRemoved(LayerRemovedEvent),
    /// A layer was restyled.
    LayerRestyled(LayerRestyledEvent),
    /// A backing source was created.
    SourceAdded(SourceAddedEvent),
    /// A backing source was torn down.
    SourceRemoved(SourceRemovedEvent),
    /// The renderer style was reloaded.
    StyleReset(StyleResetEvent),
    /// The integer zoom level changed.
    ZoomSettled(ZoomSettledEvent),
    /// An update pass finished.
    PassCompleted(PassCompletedEvent),
}

impl RecordedEvent {
    /// Event name, as used in exports.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::LayerAdded(_) => "LayerAdded",
            Self::LayerMoved(_) => "LayerMoved",
            Self::LayerRemoved(_) => "LayerRemoved",
            Self::LayerRestyled(_) => "LayerRestyled",
            Self::SourceAdded(_) => "SourceAdded",
            Self::SourceRemoved(_) => "SourceRemoved",
            Self::StyleReset(_) => "StyleReset",
            Self::ZoomSettled(_) => "ZoomSettled",
            Self::PassCompleted(_) => "PassCompleted",
        }
    }
}

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecorderSink {
    events: Vec<RecordedEvent>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded events, oldest first.
    #[must_use]
    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }

    /// Consumes the recorder and returns the recorded events.
    #[must_use]
    pub fn into_events(self) -> Vec<RecordedEvent> {
        self.events
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drops every recorded event.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl TraceSink for RecorderSink {
    fn on_layer_added(&mut self, e: &LayerAddedEvent) {
        self.events.push(RecordedEvent::LayerAdded(e.clone()));
    }

    fn on_layer_moved(&mut self, e: &LayerMovedEvent) {
        self.events.push(RecordedEvent::LayerMoved(e.clone()));
    }

    fn on_layer_removed(&mut self, e: &LayerRemovedEvent) {
        self.events.push(RecordedEvent::LayerRemoved(*e));
    }

    fn on_layer_restyled(&mut self, e: &LayerRestyledEvent) {
        self.events.push(RecordedEvent::LayerRestyled(*e));
    }

    fn on_source_added(&mut self, e: &SourceAddedEvent) {
        self.events.push(RecordedEvent::SourceAdded(*e));
    }

    fn on_source_removed(&mut self, e: &SourceRemovedEvent) {
        self.events.push(RecordedEvent::SourceRemoved(*e));
    }

    fn on_style_reset(&mut self, e: &StyleResetEvent) {
        self.events.push(RecordedEvent::StyleReset(e.clone()));
    }

    fn on_zoom_settled(&mut self, e: &ZoomSettledEvent) {
        self.events.push(RecordedEvent::ZoomSettled(*e));
    }

    fn on_pass_completed(&mut self, e: &PassCompletedEvent) {
        self.events.push(RecordedEvent::PassCompleted(*e));
    }
}
