// Copyright 2026 the Cartolayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::LayerKind;
use crate::source::SourceKey;
use crate::stops::ColorStops;

/// Lifecycle state of one layer kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LayerState {
    /// No sub-layers in the renderer and no source reference.
    #[default]
    Hidden,
    /// Sub-layers exist and the source is referenced.
    Visible,
}

/// What the controller remembers about one layer kind between passes.
///
/// The record outlives the renderer layers: they are created and destroyed
/// repeatedly as the kind is toggled or the style reloads.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerRecord {
    kind: LayerKind,
    pub(crate) state: LayerState,
    pub(crate) before: Option<String>,
    pub(crate) color_stops: ColorStops,
    pub(crate) selected: bool,
}

impl LayerRecord {
    /// Creates a hidden record for `kind`.
    #[must_use]
    pub fn new(kind: LayerKind) -> Self {
        Self {
            kind,
            state: LayerState::Hidden,
            before: None,
            color_stops: ColorStops::new(),
            selected: false,
        }
    }

    /// Layer kind.
    #[must_use]
    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    /// Id of the base sub-layer.
    #[must_use]
    pub fn id(&self) -> &'static str {
        self.kind.id()
    }

    /// Sub-layer ids, bottom first.
    #[must_use]
    pub fn sub_layers(&self) -> &'static [&'static str] {
        self.kind.sub_layers()
    }

    /// Shared source.
    #[must_use]
    pub fn source(&self) -> SourceKey {
        self.kind.source()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> LayerState {
        self.state
    }

    /// Anchor the sub-layers were last inserted or moved below. `None`
    /// means the top of the stack.
    #[must_use]
    pub fn before(&self) -> Option<&str> {
        self.before.as_deref()
    }

    /// Color stops of the last restyle. Empty while hidden.
    #[must_use]
    pub fn color_stops(&self) -> &ColorStops {
        &self.color_stops
    }

    /// Whether a selection is highlighted.
    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Marks the layer hidden and forgets per-visibility state.
    pub(crate) fn hide(&mut self) {
        self.state = LayerState::Hidden;
        self.before = None;
        self.color_stops.clear();
        self.selected = false;
    }

    /// Forgets everything after the renderer discarded its style.
    pub(crate) fn reset(&mut self) {
        self.hide();
    }
}
