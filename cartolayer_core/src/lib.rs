// Copyright 2026 the Cartolayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Thematic classification and layer synchronization for declarative map
//! renderers.
//!
//! `cartolayer_core` turns tabular, column-oriented data into thematic map
//! layers and keeps those layers synchronized with user styling rules while
//! the external renderer may throw away its whole style at any moment.
//!
//! # Architecture
//!
//! The crate is organized around an update pass that threads one anchor
//! cursor through a fixed list of layer kinds:
//!
//! ```text
//!   RoleMap + MapSettings
//!       │
//!       ▼
//!   Datasources::update() ──► Limits ──► stops::generate_color_stops()
//!                                               │
//!                 ┌─────────────────────────────┘
//!                 ▼
//!   LayerController::sync() ──► MapRenderer (add / move / restyle / remove)
//!                 ▲
//!                 │
//!   ZoomTracker::settle() ──► Datasource::handle_zoom() ──► restyle only
//! ```
//!
//! **[`classify`]**: Class counts and quantile / equal-interval breaks.
//!
//! **[`stops`]**: Gradient, categorical, and diverging color stops, plus
//! size stops, built on [`classify`] and [`color`].
//!
//! **[`expr`]**: Declarative style expressions (`interpolate`, `match`,
//! filters) as [`serde_json::Value`].
//!
//! **[`source`]**: Reference-counted shared backing sources. A source is
//! created on first [`ensure`](source::Datasource::ensure) and torn down on
//! the last [`remove_from_map`](source::Datasource::remove_from_map).
//!
//! **[`layer`]**: Per-kind layer behaviour and the
//! [`LayerController`](layer::LayerController) state machine that adds,
//! moves, restyles, and removes sub-layers in a deterministic z-order.
//!
//! **[`zoom`]**: Integer zoom settling and the restyle dirty channel.
//!
//! **[`backend`]**: The [`MapRenderer`](backend::MapRenderer) contract that
//! renderer integrations implement. [`memory`] provides a headless one.
//!
//! **[`map`]**: [`ThematicMap`](map::ThematicMap), which wires update,
//! style-load, zoom, and image events together.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and lifecycle event
//! types, with a zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one
//!   branch per call site).

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod backend;
pub mod classify;
pub mod color;
pub mod data;
pub mod error;
pub mod expr;
pub mod layer;
pub mod map;
pub mod memory;
pub mod settings;
pub mod source;
pub mod stops;
pub mod trace;
pub mod zoom;
