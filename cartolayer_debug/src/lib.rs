// Copyright 2026 the Cartolayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and JSON export for cartolayer lifecycle
//! traces.
//!
//! This crate provides [`TraceSink`](cartolayer_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`]: in-memory event log of [`recorder::RecordedEvent`]s.
//! - [`json::export`]: writes recorded events as a JSON array.

pub mod json;
pub mod pretty;
pub mod recorder;
