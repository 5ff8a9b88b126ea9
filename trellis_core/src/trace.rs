// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for propagation cycles.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! propagation engine calls at each stage of a cycle. All method bodies
//! default to no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! Events carry no timestamps; sinks that want timing read their own clock
//! when an event arrives.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates [`PathEvent`] and the
//!   corresponding `TraceSink` method.

use crate::queue::ChangeKind;

#[cfg(feature = "trace-rich")]
use crate::graph::PathRef;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which phase of a propagation cycle is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Draining and compacting the change queue.
    Drain,
    /// Applying attach/detach and re-deriving affected paths.
    Structure,
    /// Applying switch toggles and admitting transform changes.
    Switch,
    /// Merging the switch-deferred backlog.
    Merge,
    /// Depth-sorting the active set.
    Sort,
    /// Recomputing pending world transforms.
    Recompute,
    /// Fan-out notification of dependents.
    Notify,
    /// Flipping published slots.
    Publish,
}

impl PhaseKind {
    /// Every phase, in execution order.
    pub const ALL: [Self; 8] = [
        Self::Drain,
        Self::Structure,
        Self::Switch,
        Self::Merge,
        Self::Sort,
        Self::Recompute,
        Self::Notify,
        Self::Publish,
    ];

    /// Short lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Drain => "drain",
            Self::Structure => "structure",
            Self::Switch => "switch",
            Self::Merge => "merge",
            Self::Sort => "sort",
            Self::Recompute => "recompute",
            Self::Notify => "notify",
            Self::Publish => "publish",
        }
    }
}

/// What happened to one path during a cycle.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PathAction {
    /// Recomputed and published.
    Published,
    /// Held back behind a switch that is off.
    Deferred,
    /// Taken from the backlog because its switch turned on.
    Merged,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted once per cycle, after the queue has been drained.
#[derive(Clone, Copy, Debug)]
pub struct CycleBeginEvent {
    /// Cycle counter.
    pub cycle: u64,
    /// Messages drained, before compaction.
    pub queued: usize,
}

/// Marks the beginning of a cycle phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Cycle counter.
    pub cycle: u64,
    /// Which phase is starting.
    pub phase: PhaseKind,
}

/// Marks the end of a cycle phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Cycle counter.
    pub cycle: u64,
    /// Which phase is ending.
    pub phase: PhaseKind,
}

/// Emitted for each message dropped because its target no longer exists.
#[derive(Clone, Copy, Debug)]
pub struct DroppedMessageEvent {
    /// Cycle counter.
    pub cycle: u64,
    /// Kind of the dropped message.
    pub kind: ChangeKind,
}

/// Per-cycle counts, emitted after publication.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// Cycle counter.
    pub cycle: u64,
    /// Messages drained, before compaction.
    pub messages: usize,
    /// Writes replaced by a later write to the same node in the batch.
    pub coalesced: usize,
    /// Messages dropped because their target no longer exists.
    pub dropped: usize,
    /// Paths in the active set after closure.
    pub active: usize,
    /// Paths newly deferred behind a switch this cycle.
    pub deferred: usize,
    /// Paths merged from the backlog this cycle.
    pub merged: usize,
    /// Dependent notifications delivered.
    pub notifications: usize,
    /// Paths whose published slot flipped.
    pub published: usize,
    /// Paths still waiting in the backlog.
    pub backlog: usize,
    /// Whether attach/detach changed the set of paths.
    pub structure_changed: bool,
}

/// A per-path record (requires `trace-rich` feature).
#[cfg(feature = "trace-rich")]
#[derive(Clone, Debug)]
pub struct PathEvent {
    /// The transform path.
    pub path: PathRef,
    /// What happened to it.
    pub action: PathAction,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the propagation engine.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called once per cycle after the queue drain.
    fn on_cycle_begin(&mut self, e: &CycleBeginEvent) {
        _ = e;
    }

    /// Called at the beginning of a cycle phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a cycle phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called when a stale message is dropped.
    fn on_dropped_message(&mut self, e: &DroppedMessageEvent) {
        _ = e;
    }

    /// Called with the per-cycle summary.
    fn on_cycle_summary(&mut self, s: &CycleSummary) {
        _ = s;
    }

    /// Called with per-path records (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_path_events(&mut self, cycle: u64, events: &[PathEvent]) {
        _ = (cycle, events);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`CycleBeginEvent`].
    #[inline]
    pub fn cycle_begin(&mut self, e: &CycleBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_cycle_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, cycle: u64, phase: PhaseKind) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_begin(&PhaseBeginEvent { cycle, phase });
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = (cycle, phase);
        }
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, cycle: u64, phase: PhaseKind) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_end(&PhaseEndEvent { cycle, phase });
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = (cycle, phase);
        }
    }

    /// Emits a [`DroppedMessageEvent`].
    #[inline]
    pub fn dropped_message(&mut self, e: &DroppedMessageEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_dropped_message(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CycleSummary`].
    #[inline]
    pub fn cycle_summary(&mut self, s: &CycleSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_cycle_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }

    /// Emits per-path records (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn path_events(&mut self, cycle: u64, events: &[PathEvent]) {
        if let Some(s) = &mut self.sink {
            s.on_path_events(cycle, events);
        }
    }

    /// Whether per-path records are wanted this cycle.
    #[cfg(feature = "trace-rich")]
    #[inline]
    #[must_use]
    pub fn wants_path_events(&self) -> bool {
        self.sink.is_some()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_cycle_begin(&CycleBeginEvent {
            cycle: 0,
            queued: 3,
        });
        sink.on_cycle_summary(&CycleSummary::default());
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.cycle_begin(&CycleBeginEvent {
            cycle: 1,
            queued: 0,
        });
        tracer.phase_begin(1, PhaseKind::Sort);
        tracer.phase_end(1, PhaseKind::Sort);
    }

    #[test]
    fn phase_names_are_unique() {
        for (i, a) in PhaseKind::ALL.iter().enumerate() {
            for b in &PhaseKind::ALL[i + 1..] {
                assert_ne!(a.name(), b.name(), "duplicate phase name");
            }
        }
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        struct RecordingSink {
            phases: Vec<(u64, PhaseKind)>,
        }
        impl TraceSink for RecordingSink {
            fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
                self.phases.push((e.cycle, e.phase));
            }
        }

        let mut sink = RecordingSink { phases: Vec::new() };
        let mut tracer = Tracer::new(&mut sink);
        tracer.phase_begin(7, PhaseKind::Notify);
        // Access sink after tracer is dropped.
        drop(tracer);
        assert_eq!(sink.phases, &[(7, PhaseKind::Notify)]);
    }
}
