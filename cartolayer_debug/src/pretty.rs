// Copyright 2026 the Cartolayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use cartolayer_core::trace::{
    LayerAddedEvent, LayerMovedEvent, LayerRemovedEvent, LayerRestyledEvent, PassCompletedEvent,
    SourceAddedEvent, SourceRemovedEvent, StyleResetEvent, TraceSink, ZoomSettledEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns the destination.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn anchor(before: Option<&str>) -> &str {
    before.unwrap_or("<top>")
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_layer_added(&mut self, e: &LayerAddedEvent) {
        let _ = writeln!(
            self.writer,
            "[layer:add] {} before={}",
            e.layer,
            anchor(e.before.as_deref()),
        );
    }

    fn on_layer_moved(&mut self, e: &LayerMovedEvent) {
        let _ = writeln!(
            self.writer,
            "[layer:move] {} before={}",
            e.layer,
            anchor(e.before.as_deref()),
        );
    }

    fn on_layer_removed(&mut self, e: &LayerRemovedEvent) {
        let _ = writeln!(self.writer, "[layer:remove] {}", e.layer);
    }

    fn on_layer_restyled(&mut self, e: &LayerRestyledEvent) {
        let cause = if e.from_zoom { "zoom" } else { "update" };
        let _ = writeln!(
            self.writer,
            "[layer:style] {} stops={} cause={cause}",
            e.layer, e.color_stops,
        );
    }

    fn on_source_added(&mut self, e: &SourceAddedEvent) {
        let _ = writeln!(self.writer, "[source:add] {}", e.source);
    }

    fn on_source_removed(&mut self, e: &SourceRemovedEvent) {
        let _ = writeln!(self.writer, "[source:remove] {}", e.source);
    }

    fn on_style_reset(&mut self, e: &StyleResetEvent) {
        let _ = writeln!(self.writer, "[style] reset {}", e.style);
    }

    fn on_zoom_settled(&mut self, e: &ZoomSettledEvent) {
        let _ = writeln!(
            self.writer,
            "[zoom] bucket={} restyled={}",
            e.bucket, e.restyled,
        );
    }

    fn on_pass_completed(&mut self, e: &PassCompletedEvent) {
        let status = if e.errors == 0 { "ok" } else { "FAILED" };
        let _ = writeln!(
            self.writer,
            "[pass] visible={} errors={} {status}",
            e.visible, e.errors,
        );
    }
}
