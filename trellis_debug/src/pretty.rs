// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use trellis_core::trace::{
    CycleBeginEvent, CycleSummary, DroppedMessageEvent, PathAction, PathEvent, PhaseBeginEvent,
    PhaseEndEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    phases: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("phases", &self.phases)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::with_writer(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self::with_writer(writer)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            phases: false,
        }
    }

    /// Also print a line for every phase boundary.
    #[must_use]
    pub fn with_phases(mut self, phases: bool) -> Self {
        self.phases = phases;
        self
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_cycle_begin(&mut self, e: &CycleBeginEvent) {
        let _ = writeln!(self.writer, "[cycle] {} queued={}", e.cycle, e.queued);
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        if self.phases {
            let _ = writeln!(
                self.writer,
                "[phase:begin] cycle={} {}",
                e.cycle,
                e.phase.name()
            );
        }
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        if self.phases {
            let _ = writeln!(self.writer, "[phase:end] cycle={} {}", e.cycle, e.phase.name());
        }
    }

    fn on_dropped_message(&mut self, e: &DroppedMessageEvent) {
        let _ = writeln!(self.writer, "[dropped] cycle={} {}", e.cycle, e.kind.name());
    }

    fn on_cycle_summary(&mut self, s: &CycleSummary) {
        let structure = if s.structure_changed { " structure" } else { "" };
        let _ = writeln!(
            self.writer,
            "[summary] cycle={} messages={} coalesced={} dropped={} active={} \
             deferred={} merged={} notified={} published={} backlog={}{structure}",
            s.cycle,
            s.messages,
            s.coalesced,
            s.dropped,
            s.active,
            s.deferred,
            s.merged,
            s.notifications,
            s.published,
            s.backlog,
        );
    }

    fn on_path_events(&mut self, cycle: u64, events: &[PathEvent]) {
        let count = |action| events.iter().filter(|e| e.action == action).count();
        let _ = writeln!(
            self.writer,
            "[paths] cycle={cycle} published={} deferred={} merged={}",
            count(PathAction::Published),
            count(PathAction::Deferred),
            count(PathAction::Merged),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::queue::ChangeKind;
    use trellis_core::trace::PhaseKind;

    #[test]
    fn pretty_print_summary() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_cycle_summary(&CycleSummary {
            cycle: 3,
            published: 2,
            structure_changed: true,
            ..CycleSummary::default()
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.starts_with("[summary] cycle=3"), "got: {output}");
        assert!(output.contains("published=2"), "got: {output}");
        assert!(output.trim_end().ends_with("structure"), "got: {output}");
    }

    #[test]
    fn phases_are_opt_in() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_phase_begin(&PhaseBeginEvent {
            cycle: 0,
            phase: PhaseKind::Sort,
        });
        sink.on_dropped_message(&DroppedMessageEvent {
            cycle: 0,
            kind: ChangeKind::SubtreeAttached,
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(output, "[dropped] cycle=0 SUBTREE_ATTACHED\n");

        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new()).with_phases(true);
        sink.on_phase_end(&PhaseEndEvent {
            cycle: 1,
            phase: PhaseKind::Sort,
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(output, "[phase:end] cycle=1 sort\n");
    }
}
