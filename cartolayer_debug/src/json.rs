// Copyright 2026 the Cartolayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON exporter.
//!
//! [`export`] writes events recorded by a
//! [`RecorderSink`](super::recorder::RecorderSink) as a JSON array. Each
//! element carries the sequence number, the event name, and its fields:
//!
//! ```json
//! [
//!   { "seq": 0, "event": "SourceAdded", "args": { "source": "data" } },
//!   { "seq": 1, "event": "LayerAdded", "args": { "layer": "circle", "before": "place-label" } }
//! ]
//! ```

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::RecordedEvent;

/// Converts recorded events into a JSON array value.
#[must_use]
pub fn to_value(events: &[RecordedEvent]) -> Value {
    Value::Array(
        events
            .iter()
            .enumerate()
            .map(|(seq, event)| {
                json!({
                    "seq": seq,
                    "event": event.name(),
                    "args": args(event),
                })
            })
            .collect(),
    )
}

/// Writes recorded events as a pretty-printed JSON array.
pub fn export(events: &[RecordedEvent], writer: &mut dyn Write) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, &to_value(events))?;
    writeln!(writer)
}

fn args(event: &RecordedEvent) -> Value {
    match event {
        RecordedEvent::LayerAdded(e) => json!({
            "layer": e.layer,
            "before": e.before,
        }),
        RecordedEvent::LayerMoved(e) => json!({
            "layer": e.layer,
            "before": e.before,
        }),
        RecordedEvent::LayerRemoved(e) => json!({ "layer": e.layer }),
        RecordedEvent::LayerRestyled(e) => json!({
            "layer": e.layer,
            "color_stops": e.color_stops,
            "from_zoom": e.from_zoom,
        }),
        RecordedEvent::SourceAdded(e) => json!({ "source": e.source }),
        RecordedEvent::SourceRemoved(e) => json!({ "source": e.source }),
        RecordedEvent::StyleReset(e) => json!({ "style": e.style }),
        RecordedEvent::ZoomSettled(e) => json!({
            "bucket": e.bucket,
            "restyled": e.restyled,
        }),
        RecordedEvent::PassCompleted(e) => json!({
            "visible": e.visible,
            "errors": e.errors,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartolayer_core::layer::LayerKind;
    use cartolayer_core::trace::{LayerAddedEvent, SourceAddedEvent};

    #[test]
    fn exports_a_json_array() {
        let events = [
            RecordedEvent::SourceAdded(SourceAddedEvent { source: "data" }),
            RecordedEvent::LayerAdded(LayerAddedEvent {
                layer: LayerKind::Circle,
                before: None,
            }),
        ];
        let mut out = Vec::new();
        export(&events, &mut out).unwrap();
        let parsed: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed[0]["event"], "SourceAdded");
        assert_eq!(parsed[0]["args"]["source"], "data");
        assert_eq!(parsed[1]["seq"], 1);
        assert_eq!(parsed[1]["args"]["layer"], "circle");
        assert_eq!(parsed[1]["args"]["before"], Value::Null);
    }
}
