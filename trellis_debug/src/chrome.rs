// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format export.
//!
//! [`ChromeTraceSink`] stamps each event with the time elapsed since the sink
//! was created and [`export`](ChromeTraceSink::export)s them as
//! [Chrome Trace Event Format][spec] JSON.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};
use std::time::Instant;

use serde_json::{Value, json};

use trellis_core::trace::{
    CycleBeginEvent, CycleSummary, DroppedMessageEvent, PathAction, PathEvent, PhaseBeginEvent,
    PhaseEndEvent, TraceSink,
};

/// Collects trace events for export as Chrome Trace Event Format JSON.
///
/// The output is loadable in `chrome://tracing` or
/// [Perfetto](https://ui.perfetto.dev/). Phases become duration slices;
/// everything else becomes an instant event.
#[derive(Debug)]
pub struct ChromeTraceSink {
    origin: Instant,
    events: Vec<Value>,
}

impl Default for ChromeTraceSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ChromeTraceSink {
    /// Creates an empty sink whose clock starts now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            events: Vec::new(),
        }
    }

    /// Number of events collected.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Writes the collected events as a JSON array.
    pub fn export(&self, writer: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer_pretty(writer, &self.events)?;
        Ok(())
    }

    fn now_us(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1_000_000.0
    }

    fn instant(&mut self, name: &str, cat: &str, args: Value) {
        let ts = self.now_us();
        self.events.push(json!({
            "ph": "i",
            "name": name,
            "cat": cat,
            "ts": ts,
            "pid": 0,
            "tid": 0,
            "s": "t",
            "args": args,
        }));
    }
}

impl TraceSink for ChromeTraceSink {
    fn on_cycle_begin(&mut self, e: &CycleBeginEvent) {
        self.instant(
            "CycleBegin",
            "Cycle",
            json!({ "cycle": e.cycle, "queued": e.queued }),
        );
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let ts = self.now_us();
        self.events.push(json!({
            "ph": "B",
            "name": e.phase.name(),
            "cat": "Cycle",
            "ts": ts,
            "pid": 0,
            "tid": 0,
            "args": { "cycle": e.cycle },
        }));
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let ts = self.now_us();
        self.events.push(json!({
            "ph": "E",
            "name": e.phase.name(),
            "cat": "Cycle",
            "ts": ts,
            "pid": 0,
            "tid": 0,
            "args": { "cycle": e.cycle },
        }));
    }

    fn on_dropped_message(&mut self, e: &DroppedMessageEvent) {
        self.instant(
            "DroppedMessage",
            "Queue",
            json!({ "cycle": e.cycle, "kind": e.kind.name() }),
        );
    }

    fn on_cycle_summary(&mut self, s: &CycleSummary) {
        self.instant(
            "CycleSummary",
            "Summary",
            json!({
                "cycle": s.cycle,
                "messages": s.messages,
                "coalesced": s.coalesced,
                "dropped": s.dropped,
                "active": s.active,
                "deferred": s.deferred,
                "merged": s.merged,
                "notifications": s.notifications,
                "published": s.published,
                "backlog": s.backlog,
                "structure_changed": s.structure_changed,
            }),
        );
    }

    fn on_path_events(&mut self, cycle: u64, events: &[PathEvent]) {
        let paths = |action| {
            events
                .iter()
                .filter(|e| e.action == action)
                .map(|e| format!("{}{}", e.path.node, e.path.key))
                .collect::<Vec<_>>()
        };
        self.instant(
            "Paths",
            "Rich",
            json!({
                "cycle": cycle,
                "published": paths(PathAction::Published),
                "deferred": paths(PathAction::Deferred),
                "merged": paths(PathAction::Merged),
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::engine::{CycleChanges, PropagationEngine};
    use trellis_core::graph::SceneGraph;
    use trellis_core::trace::{PhaseKind, Tracer};
    use trellis_core::transform::Transform3d;

    #[test]
    fn export_produces_valid_json() {
        let mut sink = ChromeTraceSink::new();
        sink.on_phase_begin(&PhaseBeginEvent {
            cycle: 0,
            phase: PhaseKind::Recompute,
        });
        sink.on_phase_end(&PhaseEndEvent {
            cycle: 0,
            phase: PhaseKind::Recompute,
        });
        sink.on_cycle_summary(&CycleSummary::default());

        let mut out = Vec::new();
        sink.export(&mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0]["ph"], "B");
        assert_eq!(parsed[0]["name"], "recompute");
        assert_eq!(parsed[1]["ph"], "E");
        assert_eq!(parsed[2]["ph"], "i");
        assert_eq!(parsed[2]["name"], "CycleSummary");
        assert!(parsed[1]["ts"].as_f64() >= parsed[0]["ts"].as_f64());
    }

    #[test]
    fn export_empty() {
        let sink = ChromeTraceSink::new();
        let mut out = Vec::new();
        sink.export(&mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn records_a_full_cycle() {
        let mut graph = SceneGraph::new();
        let mut engine = PropagationEngine::new();
        let tx = graph.change_sender();
        let node = graph.create_transform(Transform3d::from_translation(1.0, 0.0, 0.0));
        tx.attach(graph.root(), node);

        let mut sink = ChromeTraceSink::new();
        let mut changes = CycleChanges::default();
        engine.run_cycle_into(&mut graph, &mut changes, &mut Tracer::new(&mut sink));

        let mut out = Vec::new();
        sink.export(&mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        let begins = parsed.iter().filter(|e| e["ph"] == "B").count();
        let ends = parsed.iter().filter(|e| e["ph"] == "E").count();
        assert_eq!(begins, PhaseKind::ALL.len());
        assert_eq!(ends, PhaseKind::ALL.len());
        let paths = parsed.iter().find(|e| e["name"] == "Paths").unwrap();
        assert_eq!(paths["args"]["published"][0], format!("{}/", node.index()));
    }
}
