// Copyright 2026 the Cartolayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Zoom-reactive restyling.
//!
//! Renderers fire `zoom` continuously while the user zooms. Only integer
//! zoom transitions matter here: [`ZoomTracker`] turns the stream into
//! bucket changes, and `moveend` records the settled bucket so that the
//! next small zoom does not retrigger.
//!
//! When a bucket changes, each visible layer's source gets a chance to
//! re-bucket its data ([`Datasource::handle_zoom`]). Sources that changed
//! are marked on the [`RESTYLE`] channel of a [`RestyleGraph`], where every
//! existing layer depends on its source. Draining the channel yields the
//! layers to restyle, in draw order, without touching the rest of the
//! chain:
//!
//! ```text
//!   source:Cluster ──► layer:Cluster        marked ─► drained
//!   source:Point   ──► layer:Circle
//!                  ──► layer:Symbol          (untouched)
//! ```
//!
//! [`Datasource::handle_zoom`]: crate::source::Datasource::handle_zoom

use understory_dirty::{Channel, CycleHandling, DirtyTracker, EagerPolicy};

use crate::layer::LayerKind;
use crate::source::SourceKey;

/// Source data changed with the zoom bucket; dependent layers need a
/// restyle.
pub const RESTYLE: Channel = Channel::new(0);

/// Keys below this value are sources; layers start here.
const LAYER_KEY_BASE: u32 = 100;

#[expect(
    clippy::cast_possible_truncation,
    reason = "there are four sources and six layer kinds"
)]
fn source_key(key: SourceKey) -> u32 {
    key.index() as u32
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "there are four sources and six layer kinds"
)]
fn layer_key(kind: LayerKind) -> u32 {
    LAYER_KEY_BASE + kind.index() as u32
}

/// Debounces continuous zoom events to integer zoom transitions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ZoomTracker {
    bucket: Option<i32>,
}

impl ZoomTracker {
    /// Creates a tracker that has not seen any zoom level yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last recorded integer zoom level.
    #[must_use]
    pub fn bucket(&self) -> Option<i32> {
        self.bucket
    }

    /// Records `zoom` and returns the new bucket if the integer zoom level
    /// changed.
    pub fn settle(&mut self, zoom: f64) -> Option<i32> {
        let bucket = bucket(zoom);
        if self.bucket == Some(bucket) {
            return None;
        }
        self.bucket = Some(bucket);
        Some(bucket)
    }

    /// Records the zoom level at the end of a camera movement.
    pub fn move_end(&mut self, zoom: f64) {
        self.bucket = Some(bucket(zoom));
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "zoom levels are small; the cast saturates for pathological input"
)]
fn bucket(zoom: f64) -> i32 {
    zoom.floor() as i32
}

/// Dependency graph from sources to the existing layers drawing from them.
pub struct RestyleGraph {
    tracker: DirtyTracker<u32>,
}

impl core::fmt::Debug for RestyleGraph {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RestyleGraph").finish_non_exhaustive()
    }
}

impl Default for RestyleGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl RestyleGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tracker: DirtyTracker::with_cycle_handling(CycleHandling::Error),
        }
    }

    /// Makes `kind` depend on its source. Called when its layers are added.
    pub fn link(&mut self, kind: LayerKind) {
        let _ = self
            .tracker
            .add_dependency(layer_key(kind), source_key(kind.source()), RESTYLE);
    }

    /// Removes the dependency of `kind` on its source.
    pub fn unlink(&mut self, kind: LayerKind) {
        self.tracker
            .remove_dependency(layer_key(kind), source_key(kind.source()), RESTYLE);
    }

    /// Removes every dependency.
    pub fn clear(&mut self) {
        for kind in LayerKind::ALL {
            self.unlink(kind);
        }
        // Drop marks left behind by an undrained zoom event.
        let _ = self.drain();
    }

    /// Marks `key` changed, propagating to every linked layer.
    pub fn mark(&mut self, key: SourceKey) {
        self.tracker.mark_with(source_key(key), RESTYLE, &EagerPolicy);
    }

    /// Drains the channel and returns the affected layers in draw order.
    pub fn drain(&mut self) -> Vec<LayerKind> {
        let mut kinds: Vec<LayerKind> = self
            .tracker
            .drain(RESTYLE)
            .affected()
            .deterministic()
            .run()
            .filter_map(|key| key.checked_sub(LAYER_KEY_BASE))
            .filter_map(|i| LayerKind::ALL.get(i as usize).copied())
            .collect();
        kinds.sort_unstable();
        kinds.dedup();
        kinds
    }
}
