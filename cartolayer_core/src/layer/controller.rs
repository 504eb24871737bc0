// Copyright 2026 the Cartolayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The layer lifecycle state machine.
//!
//! [`LayerController::sync`] is the update pass. It visits every kind once,
//! top of the stack first, threading a single anchor cursor:
//!
//! ```text
//!   cursor = first base-map label (labels above) | top (labels below)
//!
//!   symbol     visible, missing  ─► add sub-layers below cursor ─► cursor = "symbol"
//!   cluster    hidden            ─► remove, release source      ─► cursor unchanged
//!   heatmap    visible, exists   ─► restyle                     ─► cursor = "heatmap"
//!   circle     ...
//!   choropleth anchors to the lower of cursor and the first base-map label
//!   raster     ...
//! ```
//!
//! Because every kind is placed directly below the kind processed before
//! it, the stack is always raster, choropleth, circle, heatmap, cluster,
//! symbol from bottom to top, whichever subset is visible and in whatever
//! order kinds were enabled. Existing sub-layers are only moved when they
//! are not already directly below their anchor, which happens after a label
//! position change or when a neighbour pinned below the labels appears.
//!
//! Before the walk, every shown kind claims its source, so a source that
//! passes from a kind being hidden to a kind being shown is never torn down
//! in between.
//!
//! A failing renderer call aborts only the kind being processed. The error
//! is logged, collected in the [`SyncReport`], and the pass continues with
//! the next kind. If the failed kind's sub-layers are in the stack, the next
//! kind is still placed below them.

use serde_json::json;

use super::{LayerKind, LayerRecord, LayerState, LayerStyle, StyleContext, default_styles};
use crate::backend::{ImageTicket, MapRenderer, first_base_symbol};
use crate::classify::Classifier;
use crate::data::{Feature, RoleMap};
use crate::error::{RendererError, SyncError};
use crate::expr;
use crate::settings::{LabelPosition, MapSettings};
use crate::source::{Datasource, Datasources, SourceKey};
use crate::stops::Palette;
use crate::trace::{LayerAddedEvent, LayerMovedEvent, LayerRemovedEvent, LayerRestyledEvent, Tracer};
use crate::zoom::RestyleGraph;

/// Maximum number of features highlighted by one selection.
pub const MAX_SELECTION_COUNT: usize = 1000;

/// Factor applied to a base sub-layer's opacity while a selection is shown.
const SELECTION_DIM: f64 = 0.5;

/// Inputs shared by every kind during one pass.
#[derive(Clone, Copy)]
pub struct SyncInput<'a> {
    /// Current settings.
    pub settings: &'a MapSettings,
    /// Field bindings of the current data set.
    pub roles: &'a RoleMap,
    /// Colors for categorical values.
    pub palette: &'a dyn Palette,
    /// Class count and break strategy.
    pub classifier: &'a Classifier,
}

impl core::fmt::Debug for SyncInput<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SyncInput")
            .field("classifier", self.classifier)
            .finish_non_exhaustive()
    }
}

impl<'a> SyncInput<'a> {
    fn cx<'s>(&self, source: &'s dyn Datasource) -> StyleContext<'s>
    where
        'a: 's,
    {
        StyleContext {
            settings: self.settings,
            roles: self.roles,
            palette: self.palette,
            classifier: self.classifier,
            source,
        }
    }
}

/// Outcome of an update pass or a zoom restyle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Kinds visible afterwards.
    pub visible: usize,
    /// Kinds restyled because of a zoom bucket change.
    pub restyled: usize,
    /// Kinds that failed.
    pub errors: Vec<SyncError>,
}

impl SyncReport {
    /// Returns true if no kind failed.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    fn fail(&mut self, layer: LayerKind, source: RendererError) {
        tracing::error!(layer = %layer, error = %source, "layer synchronization failed");
        self.errors.push(SyncError::Renderer { layer, source });
    }

    fn failed(&self, kind: LayerKind) -> bool {
        self.errors.iter().any(|e| e.layer() == kind)
    }
}

/// Owns one [`LayerRecord`] and one [`LayerStyle`] per kind and keeps the
/// renderer's sub-layers in sync with the settings.
#[derive(Debug)]
pub struct LayerController {
    styles: Vec<Box<dyn LayerStyle>>,
    records: Vec<LayerRecord>,
    restyle: RestyleGraph,
}

impl Default for LayerController {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerController {
    /// Creates a controller with every kind hidden.
    #[must_use]
    pub fn new() -> Self {
        Self {
            styles: default_styles(),
            records: LayerKind::ALL.into_iter().map(LayerRecord::new).collect(),
            restyle: RestyleGraph::new(),
        }
    }

    /// Record of `kind`.
    #[must_use]
    pub fn record(&self, kind: LayerKind) -> &LayerRecord {
        &self.records[kind.index()]
    }

    /// Every record, bottom kind first.
    #[must_use]
    pub fn records(&self) -> &[LayerRecord] {
        &self.records
    }

    /// Style of `kind`.
    #[must_use]
    pub fn style(&self, kind: LayerKind) -> &dyn LayerStyle {
        self.styles[kind.index()].as_ref()
    }

    /// Runs one update pass over every kind.
    pub fn sync(
        &mut self,
        renderer: &mut dyn MapRenderer,
        sources: &mut Datasources,
        input: &SyncInput<'_>,
        tracer: &mut Tracer<'_>,
    ) -> SyncReport {
        let managed: Vec<&str> = LayerKind::managed_ids().collect();
        let mut cursor = match input.settings.api.label_position {
            LabelPosition::Above => first_base_symbol(renderer, &managed),
            LabelPosition::Below => None,
        };
        let mut report = SyncReport::default();

        // Shown kinds claim their sources before any kind releases one, so a
        // source handed from one owner to another in the same pass survives.
        let mut unsourced = Vec::new();
        for kind in LayerKind::ALL {
            if !input.settings.show(kind) {
                continue;
            }
            if let Err(source) = sources
                .get_mut(kind.source())
                .ensure(renderer, kind, input.settings, tracer)
            {
                report.fail(kind, source);
                unsourced.push(kind);
            }
        }

        for kind in LayerKind::ALL.into_iter().rev() {
            let result = if unsourced.contains(&kind) {
                Ok(None)
            } else {
                self.sync_layer(kind, renderer, sources, input, cursor.clone(), &managed, tracer)
            };
            match result {
                Ok(Some(next)) => cursor = Some(next),
                Ok(None) => {}
                Err(source) => report.fail(kind, source),
            }
            // A kind that failed halfway still sits in the stack; the next
            // kind goes below it.
            if report.failed(kind) && renderer.layer(kind.id()).is_some() {
                cursor = Some(kind.id().to_owned());
            }
        }
        report.visible = self
            .records
            .iter()
            .filter(|r| r.state == LayerState::Visible)
            .count();
        report
    }

    fn sync_layer(
        &mut self,
        kind: LayerKind,
        renderer: &mut dyn MapRenderer,
        sources: &mut Datasources,
        input: &SyncInput<'_>,
        cursor: Option<String>,
        managed: &[&str],
        tracer: &mut Tracer<'_>,
    ) -> Result<Option<String>, RendererError> {
        if !input.settings.show(kind) {
            self.hide(kind, renderer, sources, tracer)?;
            return Ok(None);
        }

        let anchor = if kind.stays_below_labels() {
            let labels = first_base_symbol(renderer, managed);
            lower_anchor(renderer, cursor, labels)
        } else {
            cursor
        };
        let i = kind.index();

        let missing: Vec<&str> = kind
            .sub_layers()
            .iter()
            .copied()
            .filter(|id| renderer.layer(id).is_none())
            .collect();
        if !missing.is_empty() {
            let cx = input.cx(sources.get(kind.source()));
            for descriptor in self.styles[i].descriptors(&cx) {
                if missing.contains(&descriptor.id.as_str()) {
                    renderer.add_layer(descriptor, anchor.as_deref())?;
                }
            }
            self.restyle.link(kind);
            tracing::debug!(layer = %kind, before = ?anchor, "added layer");
            tracer.layer_added(&LayerAddedEvent {
                layer: kind,
                before: anchor.clone(),
            });
        } else if !in_place(renderer, kind, anchor.as_deref()) {
            for id in kind.sub_layers() {
                renderer.move_layer(id, anchor.as_deref())?;
            }
            tracing::debug!(layer = %kind, before = ?anchor, "moved layer");
            tracer.layer_moved(&LayerMovedEvent {
                layer: kind,
                before: anchor.clone(),
            });
        }

        let record = &mut self.records[i];
        record.state = LayerState::Visible;
        record.before = anchor;

        self.restyle_layer(kind, renderer, sources, input, false, tracer)?;
        Ok(Some(kind.id().to_owned()))
    }

    fn restyle_layer(
        &mut self,
        kind: LayerKind,
        renderer: &mut dyn MapRenderer,
        sources: &Datasources,
        input: &SyncInput<'_>,
        from_zoom: bool,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), RendererError> {
        let i = kind.index();
        let cx = input.cx(sources.get(kind.source()));
        let stops = self.styles[i].apply(renderer, &cx)?;

        let (min, max) = input.settings.zoom_range(kind);
        for id in kind.sub_layers() {
            renderer.set_layer_zoom_range(id, min, max)?;
        }
        if self.records[i].selected
            && let Some(selection) = self.styles[i].selection()
        {
            let opacity = self.styles[i].base_opacity(input.settings) * SELECTION_DIM;
            renderer.set_paint_property(selection.base, selection.opacity_property, json!(opacity))?;
        }

        tracer.layer_restyled(&LayerRestyledEvent {
            layer: kind,
            color_stops: stops.len(),
            from_zoom,
        });
        self.records[i].color_stops = stops;
        Ok(())
    }

    fn hide(
        &mut self,
        kind: LayerKind,
        renderer: &mut dyn MapRenderer,
        sources: &mut Datasources,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), RendererError> {
        let mut removed = false;
        for id in kind.sub_layers().iter().rev() {
            if renderer.layer(id).is_some() {
                renderer.remove_layer(id)?;
                removed = true;
            }
        }
        if removed {
            self.restyle.unlink(kind);
            tracing::debug!(layer = %kind, "removed layer");
            tracer.layer_removed(&LayerRemovedEvent { layer: kind });
        }
        sources
            .get_mut(kind.source())
            .remove_from_map(renderer, kind, tracer)?;
        self.records[kind.index()].hide();
        Ok(())
    }

    /// Reacts to a settled integer zoom level.
    ///
    /// Sources of visible kinds re-bucket their data; kinds whose source
    /// changed are restyled in place. Nothing is added, moved, or removed.
    pub fn on_zoom(
        &mut self,
        renderer: &mut dyn MapRenderer,
        sources: &mut Datasources,
        input: &SyncInput<'_>,
        zoom: f64,
        tracer: &mut Tracer<'_>,
    ) -> SyncReport {
        let settings = input.settings;
        let visible: Vec<LayerKind> = LayerKind::ALL
            .into_iter()
            .filter(|k| settings.show(*k) && renderer.layer(k.id()).is_some())
            .collect();
        let mut report = SyncReport {
            visible: visible.len(),
            ..SyncReport::default()
        };

        for key in SourceKey::ALL {
            let Some(owner) = visible.iter().copied().find(|k| k.source() == key) else {
                continue;
            };
            match sources.get_mut(key).handle_zoom(renderer, settings, zoom) {
                Ok(true) => self.restyle.mark(key),
                Ok(false) => {}
                Err(source) => {
                    tracing::warn!(source = key.id(), error = %source, "zoom update failed");
                    report.errors.push(SyncError::Renderer { layer: owner, source });
                }
            }
        }

        for kind in self.restyle.drain() {
            if renderer.layer(kind.id()).is_none() {
                continue;
            }
            match self.restyle_layer(kind, renderer, sources, input, true, tracer) {
                Ok(()) => report.restyled += 1,
                Err(source) => {
                    tracing::error!(layer = %kind, error = %source, "zoom restyle failed");
                    report.errors.push(SyncError::Renderer { layer: kind, source });
                }
            }
        }
        report
    }

    /// Forgets every layer after the renderer discarded its style. The next
    /// [`sync`](Self::sync) replays everything from scratch.
    pub fn reset(&mut self) {
        for record in &mut self.records {
            record.reset();
        }
        self.restyle.clear();
    }

    /// Hands a completed image load to the style that requested it.
    /// Returns the owning kind and the image name if the ticket is current.
    pub fn claim_image(&mut self, ticket: ImageTicket) -> Option<(LayerKind, &'static str)> {
        self.styles
            .iter_mut()
            .find_map(|style| Some((style.kind(), style.claim_image(ticket)?)))
    }

    /// Highlights the rendered feature matching `feature` in `kind`'s
    /// overlay. Returns false if `kind` has no overlay in the renderer or
    /// the feature lacks an identifying property.
    pub fn highlight(
        &mut self,
        renderer: &mut dyn MapRenderer,
        settings: &MapSettings,
        roles: &RoleMap,
        kind: LayerKind,
        feature: &Feature,
    ) -> Result<bool, RendererError> {
        let style = self.styles[kind.index()].as_ref();
        let Some(selection) = style.selection() else {
            return Ok(false);
        };
        if renderer.layer(selection.overlay).is_none() {
            return Ok(false);
        }
        let keys = style.selection_keys(settings, roles);
        let Some(filter) = feature_filter(&keys, feature) else {
            return Ok(false);
        };
        renderer.set_filter(selection.overlay, Some(filter))?;
        Ok(true)
    }

    /// Empties `kind`'s overlay and restores the base opacity.
    pub fn clear_highlight(
        &mut self,
        renderer: &mut dyn MapRenderer,
        settings: &MapSettings,
        roles: &RoleMap,
        kind: LayerKind,
    ) -> Result<(), RendererError> {
        let style = self.styles[kind.index()].as_ref();
        let Some(selection) = style.selection() else {
            return Ok(());
        };
        if renderer.layer(selection.overlay).is_none() {
            return Ok(());
        }
        let keys = style.selection_keys(settings, roles);
        let property = keys.first().map_or("", |(p, _)| p.as_str());
        renderer.set_filter(selection.overlay, Some(expr::empty_filter(property)))?;
        renderer.set_paint_property(
            selection.base,
            selection.opacity_property,
            json!(style.base_opacity(settings)),
        )?;
        self.records[kind.index()].selected = false;
        Ok(())
    }

    /// Highlights up to [`MAX_SELECTION_COUNT`] features and dims the rest
    /// of the layer. Returns the ids of the highlighted features. An empty
    /// selection clears the highlight.
    pub fn update_selection(
        &mut self,
        renderer: &mut dyn MapRenderer,
        settings: &MapSettings,
        roles: &RoleMap,
        kind: LayerKind,
        features: &[Feature],
    ) -> Result<Vec<u64>, RendererError> {
        let style = self.styles[kind.index()].as_ref();
        let Some(selection) = style.selection() else {
            return Ok(Vec::new());
        };
        if renderer.layer(selection.overlay).is_none() {
            return Ok(Vec::new());
        }
        let keys = style.selection_keys(settings, roles);
        let (ids, filters): (Vec<u64>, Vec<_>) = features
            .iter()
            .filter_map(|f| Some((f.id, feature_filter(&keys, f)?)))
            .take(MAX_SELECTION_COUNT)
            .unzip();
        if ids.is_empty() {
            self.clear_highlight(renderer, settings, roles, kind)?;
            return Ok(ids);
        }
        let opacity = style.base_opacity(settings) * SELECTION_DIM;
        renderer.set_filter(selection.overlay, Some(expr::any(filters)))?;
        renderer.set_paint_property(selection.base, selection.opacity_property, json!(opacity))?;
        self.records[kind.index()].selected = true;
        Ok(ids)
    }
}

/// Of two anchors, the one lower in the stack. `None` is the top.
fn lower_anchor(
    renderer: &dyn MapRenderer,
    a: Option<String>,
    b: Option<String>,
) -> Option<String> {
    match (a, b) {
        (None, other) | (other, None) => other,
        (Some(a), Some(b)) => {
            let ids = renderer.layer_ids();
            let position = |id: &str| ids.iter().position(|x| x == id);
            if position(&a) <= position(&b) {
                Some(a)
            } else {
                Some(b)
            }
        }
    }
}

/// Returns true if `kind`'s sub-layers sit, in order, directly below
/// `anchor`.
fn in_place(renderer: &dyn MapRenderer, kind: LayerKind, anchor: Option<&str>) -> bool {
    let ids = renderer.layer_ids();
    let end = match anchor {
        Some(anchor) => match ids.iter().position(|id| id == anchor) {
            Some(end) => end,
            None => return false,
        },
        None => ids.len(),
    };
    let subs = kind.sub_layers();
    end >= subs.len() && ids[end - subs.len()..end].iter().zip(subs).all(|(a, b)| a == b)
}

/// `["all", ["==", property, value], ...]` identifying `feature`.
fn feature_filter(keys: &[(String, String)], feature: &Feature) -> Option<serde_json::Value> {
    if keys.is_empty() {
        return None;
    }
    let filters = keys
        .iter()
        .map(|(property, column)| Some(expr::eq_filter(property, feature.property(column)?)))
        .collect::<Option<Vec<_>>>()?;
    Some(expr::all(filters))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::LayerType;
    use crate::data::{Column, Role};
    use crate::memory::{MemoryRenderer, RendererCall};
    use crate::stops::CategoryPalette;

    fn roles() -> RoleMap {
        RoleMap::new(vec![
            Column::numeric("lat", [48.85, 48.86, -33.9]).with_role(Role::Latitude),
            Column::numeric("lon", [2.35, 2.36, 151.2]).with_role(Role::Longitude),
            Column::numeric("sales", [4.0, 6.0, 1.0]).with_role(Role::Color),
            Column::text("country", ["France", "France", "Australia"]).with_role(Role::Location),
        ])
    }

    fn renderer() -> MemoryRenderer {
        MemoryRenderer::with_base_layers(&[
            ("background", LayerType::Background),
            ("water", LayerType::Fill),
            ("road-label", LayerType::Symbol),
            ("place-label", LayerType::Symbol),
        ])
    }

    struct Harness {
        renderer: MemoryRenderer,
        sources: Datasources,
        controller: LayerController,
        roles: RoleMap,
        palette: CategoryPalette,
        classifier: Classifier,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                renderer: renderer(),
                sources: Datasources::new(),
                controller: LayerController::new(),
                roles: roles(),
                palette: CategoryPalette::default(),
                classifier: Classifier::default(),
            }
        }

        fn sync(&mut self, settings: &MapSettings) -> SyncReport {
            let features = self.roles.features();
            for key in SourceKey::ALL {
                self.sources
                    .get_mut(key)
                    .update(&mut self.renderer, &self.roles, &features, settings)
                    .unwrap();
            }
            let input = SyncInput {
                settings,
                roles: &self.roles,
                palette: &self.palette,
                classifier: &self.classifier,
            };
            self.controller
                .sync(&mut self.renderer, &mut self.sources, &input, &mut Tracer::none())
        }

        fn zoom(&mut self, settings: &MapSettings, zoom: f64) -> SyncReport {
            self.renderer.set_zoom(zoom);
            let input = SyncInput {
                settings,
                roles: &self.roles,
                palette: &self.palette,
                classifier: &self.classifier,
            };
            self.controller.on_zoom(
                &mut self.renderer,
                &mut self.sources,
                &input,
                zoom,
                &mut Tracer::none(),
            )
        }
    }

    fn show(kinds: &[LayerKind]) -> MapSettings {
        let mut settings = MapSettings::default();
        settings.raster.url = "https://tiles.example/{z}/{x}/{y}.png".to_owned();
        for kind in kinds {
            match kind {
                LayerKind::Raster => settings.raster.show = true,
                LayerKind::Choropleth => settings.choropleth.show = true,
                LayerKind::Circle => settings.circle.show = true,
                LayerKind::Heatmap => settings.heatmap.show = true,
                LayerKind::Cluster => settings.cluster.show = true,
                LayerKind::Symbol => settings.symbol.show = true,
            }
        }
        settings
    }

    #[test]
    fn all_kinds_stack_in_fixed_order_below_labels() {
        let mut h = Harness::new();
        let report = h.sync(&show(&LayerKind::ALL));
        assert!(report.is_ok(), "{:?}", report.errors);
        assert_eq!(report.visible, 6);
        assert_eq!(
            h.renderer.layer_ids(),
            [
                "background",
                "water",
                "raster",
                "choropleth",
                "choropleth-highlight",
                "circle",
                "circle-highlight",
                "heatmap",
                "cluster",
                "cluster-label",
                "symbol",
                "symbol-highlight",
                "road-label",
                "place-label",
            ]
        );
    }

    #[test]
    fn enabling_a_middle_kind_later_keeps_the_order() {
        let mut h = Harness::new();
        h.sync(&show(&[LayerKind::Circle, LayerKind::Symbol]));
        h.sync(&show(&[LayerKind::Circle, LayerKind::Heatmap, LayerKind::Symbol]));
        assert_eq!(
            h.renderer.data_layer_ids(),
            ["circle", "circle-highlight", "heatmap", "symbol", "symbol-highlight"]
        );
        assert_eq!(h.controller.record(LayerKind::Heatmap).before(), Some("symbol"));
    }

    #[test]
    fn toggling_adds_and_removes_once() {
        let mut h = Harness::new();
        h.sync(&show(&[]));
        h.sync(&show(&[LayerKind::Circle]));
        h.sync(&show(&[]));
        let calls = h.renderer.calls();
        let added = calls
            .iter()
            .filter(|c| matches!(c, RendererCall::AddLayer { id, .. } if id == "circle"))
            .count();
        let removed = calls
            .iter()
            .filter(|c| matches!(c, RendererCall::RemoveLayer(id) if id == "circle"))
            .count();
        let sources = calls
            .iter()
            .filter(|c| matches!(c, RendererCall::RemoveSource(id) if id == "data"))
            .count();
        assert_eq!((added, removed, sources), (1, 1, 1));
        assert_eq!(h.controller.record(LayerKind::Circle).state(), LayerState::Hidden);
        assert!(h.controller.record(LayerKind::Circle).color_stops().is_empty(), "discarded");
    }

    #[test]
    fn shared_point_source_outlives_one_owner() {
        let mut h = Harness::new();
        h.sync(&show(&[LayerKind::Circle, LayerKind::Heatmap]));
        h.sync(&show(&[LayerKind::Heatmap]));
        assert!(h.renderer.source("data").is_some(), "heatmap still draws from it");
        h.sync(&show(&[]));
        assert!(h.renderer.source("data").is_none(), "released by the last owner");
    }

    #[test]
    fn shared_source_survives_a_hand_over_in_one_pass() {
        let mut h = Harness::new();
        h.sync(&show(&[LayerKind::Heatmap]));
        h.renderer.clear_calls();

        let report = h.sync(&show(&[LayerKind::Circle]));
        assert!(report.is_ok(), "{:?}", report.errors);
        let churn = h.renderer.count(|c| {
            matches!(c, RendererCall::AddSource(id) | RendererCall::RemoveSource(id) if id == "data")
        });
        assert_eq!(churn, 0, "{:?}", h.renderer.calls());
        assert!(h.renderer.source("data").is_some());
        assert_eq!(h.renderer.data_layer_ids(), ["circle", "circle-highlight"]);
    }

    #[test]
    fn label_position_change_moves_existing_layers() {
        let mut h = Harness::new();
        let mut settings = show(&[LayerKind::Choropleth, LayerKind::Circle]);
        h.sync(&settings);
        h.renderer.clear_calls();

        settings.api.label_position = LabelPosition::Below;
        h.sync(&settings);
        assert!(
            !h.renderer
                .calls()
                .iter()
                .any(|c| matches!(c, RendererCall::AddLayer { .. })),
            "no layer recreated"
        );
        assert_eq!(
            h.renderer.layer_ids(),
            [
                "background",
                "water",
                "choropleth",
                "choropleth-highlight",
                "road-label",
                "place-label",
                "circle",
                "circle-highlight",
            ]
        );

        h.renderer.clear_calls();
        h.sync(&settings);
        assert!(
            !h.renderer
                .calls()
                .iter()
                .any(|c| matches!(c, RendererCall::MoveLayer { .. })),
            "moved only once"
        );
    }

    #[test]
    fn kinds_pinned_below_labels_pull_lower_kinds_down() {
        let mut h = Harness::new();
        let mut settings = show(&[LayerKind::Raster]);
        settings.api.label_position = LabelPosition::Below;
        h.sync(&settings);
        assert_eq!(h.renderer.layer_ids().last().map(String::as_str), Some("raster"));

        settings.choropleth.show = true;
        h.sync(&settings);
        assert_eq!(
            h.renderer.layer_ids(),
            [
                "background",
                "water",
                "raster",
                "choropleth",
                "choropleth-highlight",
                "road-label",
                "place-label",
            ]
        );
    }

    #[test]
    fn zoom_restyles_only_rebucketed_kinds() {
        let mut h = Harness::new();
        let settings = show(&[LayerKind::Circle, LayerKind::Cluster]);
        h.renderer.set_zoom(2.0);
        h.sync(&settings);
        h.renderer.clear_calls();

        let report = h.zoom(&settings, 5.0);
        assert_eq!(report.restyled, 1);
        let calls = h.renderer.calls();
        assert!(
            calls
                .iter()
                .any(|c| matches!(c, RendererCall::SetPaint { layer, .. } if layer == "cluster")),
            "cluster restyled"
        );
        assert!(
            !calls
                .iter()
                .any(|c| matches!(c, RendererCall::SetPaint { layer, .. } if layer == "circle")),
            "circle untouched"
        );
        assert!(
            !calls.iter().any(|c| matches!(
                c,
                RendererCall::AddLayer { .. }
                    | RendererCall::RemoveLayer(_)
                    | RendererCall::AddSource(_)
                    | RendererCall::RemoveSource(_)
            )),
            "no structural changes"
        );
    }

    #[test]
    fn reset_replays_from_scratch() {
        let mut h = Harness::new();
        let settings = show(&[LayerKind::Circle]);
        h.sync(&settings);
        h.renderer.set_style("mapbox://styles/mapbox/dark-v10");
        h.sources.forget_all();
        h.controller.reset();

        let report = h.sync(&settings);
        assert!(report.is_ok(), "{:?}", report.errors);
        assert!(h.renderer.layer("circle").is_some(), "re-added");
        assert!(h.renderer.source("data").is_some(), "re-created");
    }

    #[test]
    fn selection_is_capped_and_dims_the_base_layer() {
        let mut h = Harness::new();
        let settings = show(&[LayerKind::Circle]);
        h.sync(&settings);
        let features = h.roles.features();
        let many: Vec<Feature> = features.iter().cycle().take(1500).cloned().collect();

        let ids = h
            .controller
            .update_selection(&mut h.renderer, &settings, &h.roles, LayerKind::Circle, &many)
            .unwrap();
        assert_eq!(ids.len(), MAX_SELECTION_COUNT);
        assert_eq!(h.renderer.paint("circle", "circle-opacity"), Some(&json!(0.4)));
        assert!(h.controller.record(LayerKind::Circle).is_selected());

        h.controller
            .clear_highlight(&mut h.renderer, &settings, &h.roles, LayerKind::Circle)
            .unwrap();
        assert_eq!(h.renderer.paint("circle", "circle-opacity"), Some(&json!(0.8)));
        assert_eq!(
            h.renderer.filter("circle-highlight"),
            Some(&json!(["==", "lat", ""]))
        );
    }

    #[test]
    fn highlight_filters_on_coordinates() {
        let mut h = Harness::new();
        let settings = show(&[LayerKind::Circle]);
        h.sync(&settings);
        let features = h.roles.features();
        let feature = &features[0];
        assert!(
            h.controller
                .highlight(&mut h.renderer, &settings, &h.roles, LayerKind::Circle, feature)
                .unwrap()
        );
        assert_eq!(
            h.renderer.filter("circle-highlight"),
            Some(&json!(["all", ["==", "lat", 48.85], ["==", "lon", 2.35]]))
        );
        assert!(
            !h.controller
                .highlight(&mut h.renderer, &settings, &h.roles, LayerKind::Heatmap, feature)
                .unwrap(),
            "heatmap has no overlay"
        );
    }
}
