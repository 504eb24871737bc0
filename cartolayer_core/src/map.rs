// Copyright 2026 the Cartolayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The top-level orchestrator.
//!
//! [`ThematicMap`] owns every piece of engine state and reacts to the
//! renderer's discrete events:
//!
//! | Event             | Method                                  |
//! |-------------------|-----------------------------------------|
//! | host update       | [`update`](ThematicMap::update)         |
//! | `style.load`      | [`on_style_load`](ThematicMap::on_style_load) |
//! | `zoom`            | [`on_zoom`](ThematicMap::on_zoom)       |
//! | `moveend`         | [`on_move_end`](ThematicMap::on_move_end) |
//! | image loaded      | [`on_image_loaded`](ThematicMap::on_image_loaded) |
//!
//! A style load wipes every layer and source in the renderer, so
//! [`on_style_load`](ThematicMap::on_style_load) forgets all bookkeeping and
//! replays the last update from scratch. Changing the configured base style
//! therefore only calls [`MapRenderer::set_style`] and leaves the pass to
//! the load event.

use crate::backend::{Image, ImageTicket, MapRenderer};
use crate::classify::{ClassificationMethod, Classifier};
use crate::data::{Feature, Role, RoleMap, Value};
use crate::error::{RendererError, SyncError};
use crate::layer::{LayerController, LayerKind, LayerState, SyncInput, SyncReport};
use crate::settings::MapSettings;
use crate::source::{Datasources, SourceKey};
use crate::stops::{CategoryPalette, ColorStops};
use crate::trace::{PassCompletedEvent, StyleResetEvent, Tracer, ZoomSettledEvent};
use crate::zoom::ZoomTracker;

/// Color stops of one visible layer, for a legend.
#[derive(Clone, Debug, PartialEq)]
pub struct Legend {
    /// Layer the stops belong to.
    pub layer: LayerKind,
    /// Display name of the bound color field.
    pub title: String,
    /// Stops as last applied.
    pub stops: ColorStops,
}

/// Runs the wrapped callback when dropped.
struct Completion<F: FnOnce()>(Option<F>);

impl<F: FnOnce()> Drop for Completion<F> {
    fn drop(&mut self) {
        if let Some(f) = self.0.take() {
            f();
        }
    }
}

/// Settings and data of the last update, replayed after a style load.
#[derive(Debug)]
struct Snapshot {
    settings: MapSettings,
    roles: RoleMap,
}

/// Thematic layers over one renderer.
#[derive(Debug, Default)]
pub struct ThematicMap {
    method: ClassificationMethod,
    palette: CategoryPalette,
    sources: Datasources,
    controller: LayerController,
    zoom: ZoomTracker,
    snapshot: Option<Snapshot>,
    active_style: Option<String>,
    awaiting_style: bool,
}

impl ThematicMap {
    /// Creates a map with no layers, using quantile breaks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `method` for class breaks from the next pass on.
    #[must_use]
    pub fn with_classification(mut self, method: ClassificationMethod) -> Self {
        self.method = method;
        self
    }

    /// Uses `palette` for categorical colors.
    #[must_use]
    pub fn with_palette(mut self, palette: CategoryPalette) -> Self {
        self.palette = palette;
        self
    }

    /// The layer state machine.
    #[must_use]
    pub fn controller(&self) -> &LayerController {
        &self.controller
    }

    /// The shared sources.
    #[must_use]
    pub fn sources(&self) -> &Datasources {
        &self.sources
    }

    /// Settings of the last update.
    #[must_use]
    pub fn settings(&self) -> Option<&MapSettings> {
        self.snapshot.as_ref().map(|s| &s.settings)
    }

    /// Returns true while a base style switch is waiting for its load event.
    #[must_use]
    pub fn is_awaiting_style(&self) -> bool {
        self.awaiting_style
    }

    /// Applies new settings and data.
    ///
    /// `on_updated` runs exactly once when this call returns, whether the
    /// pass succeeded, failed for some layers, or was deferred to a style
    /// load. Returns the pass report, or `None` if the pass was deferred.
    pub fn update(
        &mut self,
        renderer: &mut dyn MapRenderer,
        settings: MapSettings,
        roles: RoleMap,
        tracer: &mut Tracer<'_>,
        on_updated: impl FnOnce(),
    ) -> Option<SyncReport> {
        let _completion = Completion(Some(on_updated));

        let categories: Vec<String> = roles
            .get_all(Role::Color)
            .flat_map(|c| c.values.iter().filter(|v| matches!(v, Value::Text(_))))
            .map(ToString::to_string)
            .collect();
        self.palette.update(categories.iter().map(String::as_str));

        let style = settings.style_url().to_owned();
        self.snapshot = Some(Snapshot { settings, roles });
        match &self.active_style {
            Some(active) if *active != style => {
                tracing::debug!(from = %active, to = %style, "switching base style");
                renderer.set_style(&style);
                self.active_style = Some(style);
                self.awaiting_style = true;
                return None;
            }
            Some(_) => {}
            None => self.active_style = Some(style),
        }
        if self.awaiting_style {
            return None;
        }
        self.run_pass(renderer, tracer)
    }

    /// Handles the renderer's `style.load` event: every layer and source is
    /// gone, so all bookkeeping is dropped and the last update replayed.
    pub fn on_style_load(
        &mut self,
        renderer: &mut dyn MapRenderer,
        tracer: &mut Tracer<'_>,
    ) -> Option<SyncReport> {
        self.sources.forget_all();
        self.controller.reset();
        self.awaiting_style = false;
        let style = self.active_style.clone().unwrap_or_default();
        tracing::debug!(%style, "style loaded, replaying layers");
        tracer.style_reset(&StyleResetEvent { style });
        self.run_pass(renderer, tracer)
    }

    /// Handles the renderer's `zoom` event. Only a change of the integer
    /// zoom level restyles anything.
    pub fn on_zoom(
        &mut self,
        renderer: &mut dyn MapRenderer,
        zoom: f64,
        tracer: &mut Tracer<'_>,
    ) -> Option<SyncReport> {
        let bucket = self.zoom.settle(zoom)?;
        if self.awaiting_style {
            return None;
        }
        let snapshot = self.snapshot.as_ref()?;
        let classifier = Classifier::new(self.method, snapshot.settings.api.max_classes);
        let input = SyncInput {
            settings: &snapshot.settings,
            roles: &snapshot.roles,
            palette: &self.palette,
            classifier: &classifier,
        };
        let report = self
            .controller
            .on_zoom(renderer, &mut self.sources, &input, zoom, tracer);
        tracer.zoom_settled(&ZoomSettledEvent {
            bucket,
            restyled: report.restyled,
        });
        Some(report)
    }

    /// Handles the renderer's `moveend` event.
    pub fn on_move_end(&mut self, zoom: f64) {
        self.zoom.move_end(zoom);
    }

    /// Installs a loaded image if `ticket` is the latest request of a layer
    /// that still exists. Stale completions and load failures are logged
    /// and dropped.
    pub fn on_image_loaded(
        &mut self,
        renderer: &mut dyn MapRenderer,
        ticket: ImageTicket,
        result: Result<Image, RendererError>,
    ) {
        let Some((kind, name)) = self.controller.claim_image(ticket) else {
            tracing::debug!(ticket = ticket.0, "ignoring superseded image load");
            return;
        };
        let image = match result {
            Ok(image) => image,
            Err(error) => {
                tracing::warn!(layer = %kind, %error, "image load failed");
                return;
            }
        };
        if renderer.layer(kind.id()).is_none() {
            tracing::debug!(layer = %kind, "layer gone before its image loaded");
            return;
        }
        let installed = if renderer.has_image(name) {
            renderer.remove_image(name)
        } else {
            Ok(())
        }
        .and_then(|()| renderer.add_image(name, image));
        if let Err(error) = installed {
            tracing::warn!(layer = %kind, %error, "failed to install image");
        }
    }

    /// Legend data for every visible layer that has a legend enabled and a
    /// bound color field, bottom layer first.
    #[must_use]
    pub fn legends(&self) -> Vec<Legend> {
        let Some(snapshot) = &self.snapshot else {
            return Vec::new();
        };
        LayerKind::ALL
            .into_iter()
            .filter(|k| snapshot.settings.legend(*k))
            .filter_map(|kind| {
                let record = self.controller.record(kind);
                if record.state() != LayerState::Visible || record.color_stops().is_empty() {
                    return None;
                }
                let column = self
                    .controller
                    .style(kind)
                    .color_column(&snapshot.settings, &snapshot.roles)?;
                Some(Legend {
                    layer: kind,
                    title: column.display_name.clone(),
                    stops: record.color_stops().clone(),
                })
            })
            .collect()
    }

    /// Highlights `feature` in `kind`'s overlay.
    pub fn highlight(
        &mut self,
        renderer: &mut dyn MapRenderer,
        kind: LayerKind,
        feature: &Feature,
    ) -> Result<bool, RendererError> {
        let Some(snapshot) = &self.snapshot else {
            return Ok(false);
        };
        self.controller
            .highlight(renderer, &snapshot.settings, &snapshot.roles, kind, feature)
    }

    /// Clears `kind`'s highlight overlay.
    pub fn clear_highlight(
        &mut self,
        renderer: &mut dyn MapRenderer,
        kind: LayerKind,
    ) -> Result<(), RendererError> {
        let Some(snapshot) = &self.snapshot else {
            return Ok(());
        };
        self.controller
            .clear_highlight(renderer, &snapshot.settings, &snapshot.roles, kind)
    }

    /// Highlights the selected `features` in `kind`'s overlay.
    pub fn update_selection(
        &mut self,
        renderer: &mut dyn MapRenderer,
        kind: LayerKind,
        features: &[Feature],
    ) -> Result<Vec<u64>, RendererError> {
        let Some(snapshot) = &self.snapshot else {
            return Ok(Vec::new());
        };
        self.controller.update_selection(
            renderer,
            &snapshot.settings,
            &snapshot.roles,
            kind,
            features,
        )
    }

    fn run_pass(
        &mut self,
        renderer: &mut dyn MapRenderer,
        tracer: &mut Tracer<'_>,
    ) -> Option<SyncReport> {
        let snapshot = self.snapshot.as_ref()?;
        let settings = &snapshot.settings;
        let classifier = Classifier::new(self.method, settings.api.max_classes);
        let features = snapshot.roles.features();

        let mut errors = Vec::new();
        for key in SourceKey::ALL {
            let Some(owner) = LayerKind::ALL
                .into_iter()
                .find(|k| k.source() == key && settings.show(*k))
            else {
                continue;
            };
            let updated =
                self.sources
                    .get_mut(key)
                    .update(renderer, &snapshot.roles, &features, settings);
            if let Err(source) = updated {
                tracing::warn!(source = key.id(), error = %source, "source update failed");
                errors.push(SyncError::Renderer { layer: owner, source });
            }
        }

        let input = SyncInput {
            settings,
            roles: &snapshot.roles,
            palette: &self.palette,
            classifier: &classifier,
        };
        let mut report = self
            .controller
            .sync(renderer, &mut self.sources, &input, tracer);
        errors.append(&mut report.errors);
        report.errors = errors;

        tracer.pass_completed(&PassCompletedEvent {
            visible: report.visible,
            errors: report.errors.len(),
        });
        if settings.api.autozoom
            && let Some(bounds) = self.sources.referenced_bounds()
        {
            renderer.fit_bounds(bounds);
        }
        Some(report)
    }
}
