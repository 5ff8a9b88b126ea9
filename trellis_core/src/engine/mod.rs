// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The transform propagation engine.
//!
//! [`PropagationEngine::run_cycle`] performs one complete cycle against a
//! [`SceneGraph`]:
//!
//! 1. **Drain** the change queue and compact the batch.
//! 2. **Structure**: apply attach/detach in arrival order, then re-derive the
//!    paths of the affected subtrees and update the fan-out lists.
//! 3. **Switch**: apply the final per-batch state of each toggled switch,
//!    then admit every path of every node whose transform was set. A path
//!    whose switch is off goes to the backlog instead of the active set.
//! 4. **Merge** backlog paths whose switch is now on, then extend the active
//!    set with every transform path below an active path, via the fan-out
//!    lists.
//! 5. **Sort** the active set by depth level, parents first.
//! 6. **Recompute** each active path's world transform into its unpublished
//!    slot. A parent recomputed in the same cycle contributes its pending
//!    value, otherwise its published one.
//! 7. **Notify** every dependent registered under an active path.
//! 8. **Publish**: flip the published slot of every active path, clear the
//!    per-cycle flags, and tell [`CycleListener`]s.
//!
//! A cycle runs to completion once the queue has been drained.

mod cycle;
mod sort;

use crate::graph::{PathRef, SceneGraph};
use crate::queue::{ChangeBatch, ChangeMessage};
use crate::trace::{CycleSummary, Tracer};

use crate::graph::StructureDelta;
use cycle::ActiveSet;

/// Configuration for the [`PropagationEngine`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Initial capacity of the active-set scratch buffer. It grows as
    /// needed.
    pub active_capacity: usize,
    /// Initial capacity of the switch-deferred backlog. It grows as needed.
    pub backlog_capacity: usize,
    /// Active sets shorter than this are depth-sorted by insertion sort;
    /// longer ones by the standard library's stable sort.
    pub insertion_sort_threshold: usize,
}

impl EngineConfig {
    /// Defaults suited to interactive scenes with a few dozen changes per
    /// cycle.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            active_capacity: 64,
            backlog_capacity: 16,
            insertion_sort_threshold: 7,
        }
    }

    /// Larger preallocation for scenes that routinely change thousands of
    /// paths per cycle.
    #[must_use]
    pub const fn large_scene() -> Self {
        Self {
            active_capacity: 4096,
            backlog_capacity: 512,
            insertion_sort_threshold: 7,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// The set of changes produced by a single cycle.
#[derive(Clone, Debug, Default)]
pub struct CycleChanges {
    /// Which cycle this describes.
    pub cycle: u64,
    /// Transform paths whose published slot flipped, parents first.
    pub published: Vec<PathRef>,
    /// Transform paths newly held back behind a switch that is off.
    pub deferred: Vec<PathRef>,
    /// Paths merged from the backlog because their switch turned on.
    pub merged: usize,
    /// Dependent notifications delivered.
    pub notifications: usize,
    /// Messages dropped because their target no longer exists or, for
    /// attaches, because the attach is not valid for the current topology.
    pub dropped: usize,
    /// Whether attach/detach changed the set of instantiation paths.
    pub structure_changed: bool,
}

impl CycleChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.cycle = 0;
        self.published.clear();
        self.deferred.clear();
        self.merged = 0;
        self.notifications = 0;
        self.dropped = 0;
        self.structure_changed = false;
    }

    /// Whether the cycle changed nothing observable.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.published.is_empty()
            && self.deferred.is_empty()
            && self.notifications == 0
            && !self.structure_changed
    }
}

/// Told when a cycle's results have been published.
///
/// Listeners run on the update context right after the publish flip, with
/// the scene graph still borrowed by the engine.
pub trait CycleListener: Send {
    /// Called once per cycle, after every touched path has flipped.
    fn on_cycle_swapped(&mut self, summary: &CycleSummary);
}

impl<F: FnMut(&CycleSummary) + Send> CycleListener for F {
    fn on_cycle_swapped(&mut self, summary: &CycleSummary) {
        self(summary);
    }
}

/// Runs propagation cycles against a [`SceneGraph`].
///
/// The engine owns only scratch buffers and the switch-deferred backlog; all
/// per-path state lives in the graph. One engine should drive one graph.
pub struct PropagationEngine {
    config: EngineConfig,
    cycle: u64,
    inbox: Vec<ChangeMessage>,
    batch: ChangeBatch,
    delta: StructureDelta,
    work: ActiveSet,
    listeners: Vec<Box<dyn CycleListener>>,
}

impl core::fmt::Debug for PropagationEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PropagationEngine")
            .field("config", &self.config)
            .field("cycle", &self.cycle)
            .field("backlog", &self.work.backlog.len())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl Default for PropagationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PropagationEngine {
    /// Creates an engine with [`EngineConfig::new`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EngineConfig::new())
    }

    /// Creates an engine with the given configuration.
    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            cycle: 0,
            inbox: Vec::new(),
            batch: ChangeBatch::default(),
            delta: StructureDelta::default(),
            work: ActiveSet::with_capacity(config.active_capacity, config.backlog_capacity),
            listeners: Vec::new(),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Number of cycles completed so far, which is also the number of the
    /// next cycle.
    #[must_use]
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Number of entries waiting in the switch-deferred backlog.
    ///
    /// Entries for paths that have since been detached are pruned lazily, so
    /// this is an upper bound.
    #[must_use]
    pub fn backlog_len(&self) -> usize {
        self.work.backlog.len()
    }

    /// Registers a listener told after every publish.
    pub fn add_listener(&mut self, listener: Box<dyn CycleListener>) {
        self.listeners.push(listener);
    }

    /// Runs one cycle and returns what changed.
    pub fn run_cycle(&mut self, graph: &mut SceneGraph) -> CycleChanges {
        let mut changes = CycleChanges::default();
        self.run_cycle_into(graph, &mut changes, &mut Tracer::none());
        changes
    }
}
