// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One propagation cycle.

use super::sort::sort_by_depth;
use super::{CycleChanges, PropagationEngine};
use crate::graph::{PathEntry, PathRef, SceneGraph, SwitchState};
use crate::queue::{ChangeKind, ChangeMessage};
use crate::trace::{CycleBeginEvent, CycleSummary, DroppedMessageEvent, PhaseKind, Tracer};
use crate::transform::Transform3d;

#[cfg(feature = "trace-rich")]
use crate::trace::{PathAction, PathEvent};

/// One transform path scheduled for recomputation.
#[derive(Clone, Debug)]
pub(crate) struct ActiveEntry {
    pub(crate) path: PathRef,
    /// Depth level of the node when the path was admitted.
    pub(crate) depth: u32,
}

/// The active set and the switch-deferred backlog.
#[derive(Debug, Default)]
pub(crate) struct ActiveSet {
    pub(crate) active: Vec<ActiveEntry>,
    /// Paths held back behind a switch that is off.
    pub(crate) backlog: Vec<PathRef>,
    /// Switch paths whose state was re-derived this cycle.
    touched: Vec<PathRef>,
    /// Scratch list of paths to admit.
    pending: Vec<PathRef>,
    merged: usize,
    #[cfg(feature = "trace-rich")]
    events: Vec<PathEvent>,
}

impl ActiveSet {
    pub(crate) fn with_capacity(active: usize, backlog: usize) -> Self {
        Self {
            active: Vec::with_capacity(active),
            backlog: Vec::with_capacity(backlog),
            ..Self::default()
        }
    }

    fn begin(&mut self) {
        self.active.clear();
        self.touched.clear();
        self.pending.clear();
        self.merged = 0;
        #[cfg(feature = "trace-rich")]
        self.events.clear();
    }

    /// Admits one transform path into this cycle.
    ///
    /// A path whose switch is off is flagged and parked in the backlog
    /// instead. Paths that are already active, or that are not transform
    /// paths, are ignored.
    fn admit(&mut self, graph: &mut SceneGraph, path: PathRef, changes: &mut CycleChanges) {
        let Some(entry) = graph.entry(path.node, &path.key) else {
            return;
        };
        let open = graph.gate_open(entry.gate, &path.key);
        let depth = graph.depth[path.node as usize];
        let Some(state) = graph
            .entry_mut(path.node, &path.key)
            .and_then(PathEntry::transform_mut)
        else {
            return;
        };
        if state.marked_dirty {
            return;
        }
        if open {
            state.marked_dirty = true;
            state.switch_dirty = false;
            self.active.push(ActiveEntry { path, depth });
        } else if !state.switch_dirty {
            state.switch_dirty = true;
            #[cfg(feature = "trace-rich")]
            self.events.push(PathEvent {
                path: path.clone(),
                action: PathAction::Deferred,
            });
            self.backlog.push(path.clone());
            changes.deferred.push(path);
        }
    }

    /// Admits every path collected in `pending`.
    fn admit_pending(&mut self, graph: &mut SceneGraph, changes: &mut CycleChanges) {
        let mut pending = core::mem::take(&mut self.pending);
        for path in pending.drain(..) {
            self.admit(graph, path, changes);
        }
        self.pending = pending;
    }

    /// Moves backlog paths whose switch is now on into the active set.
    ///
    /// Entries for paths that no longer exist, or that were admitted directly
    /// since they were parked, are discarded.
    fn merge_backlog(&mut self, graph: &mut SceneGraph) {
        let mut backlog = core::mem::take(&mut self.backlog);
        backlog.retain(|path| {
            let Some(entry) = graph.entry(path.node, &path.key) else {
                return false;
            };
            if !entry.transform().is_some_and(|t| t.switch_dirty) {
                return false;
            }
            if !graph.gate_open(entry.gate, &path.key) {
                return true;
            }
            let depth = graph.depth[path.node as usize];
            if let Some(state) = graph
                .entry_mut(path.node, &path.key)
                .and_then(PathEntry::transform_mut)
            {
                state.switch_dirty = false;
                state.marked_dirty = true;
                self.active.push(ActiveEntry {
                    path: path.clone(),
                    depth,
                });
                self.merged += 1;
                #[cfg(feature = "trace-rich")]
                self.events.push(PathEvent {
                    path: path.clone(),
                    action: PathAction::Merged,
                });
            }
            false
        });
        self.backlog = backlog;
    }

    /// Extends the active set with every transform path below an active
    /// path, following the fan-out lists.
    fn close_over_fanout(&mut self, graph: &mut SceneGraph, changes: &mut CycleChanges) {
        let mut n = 0;
        while n < self.active.len() {
            if let Some(list) = graph.fanout.get(&self.active[n].path) {
                self.pending.extend(list.transforms.iter().cloned());
            }
            self.admit_pending(graph, changes);
            n += 1;
        }
    }
}

fn record_drop(changes: &mut CycleChanges, tracer: &mut Tracer<'_>, cycle: u64, kind: ChangeKind) {
    changes.dropped += 1;
    tracer.dropped_message(&DroppedMessageEvent { cycle, kind });
}

impl PropagationEngine {
    /// Runs one cycle, writing what changed into a caller-provided buffer and
    /// reporting progress to `tracer`.
    pub fn run_cycle_into(
        &mut self,
        graph: &mut SceneGraph,
        changes: &mut CycleChanges,
        tracer: &mut Tracer<'_>,
    ) {
        changes.clear();
        let cycle = self.cycle;
        changes.cycle = cycle;
        self.work.begin();
        self.delta.clear();

        // -- Drain --
        tracer.phase_begin(cycle, PhaseKind::Drain);
        graph.queue.drain_into(&mut self.inbox);
        self.batch.compact(&mut self.inbox);
        tracer.phase_end(cycle, PhaseKind::Drain);
        tracer.cycle_begin(&CycleBeginEvent {
            cycle,
            queued: self.batch.queued,
        });

        // -- Structure --
        tracer.phase_begin(cycle, PhaseKind::Structure);
        for message in &self.batch.structure {
            let applied = match *message {
                ChangeMessage::SubtreeAttached { parent, child } => graph.attach_now(parent, child),
                ChangeMessage::SubtreeDetached { child } => graph.detach_now(child),
                ChangeMessage::TransformSet { .. } | ChangeMessage::SwitchToggled { .. } => true,
            };
            if !applied {
                record_drop(changes, tracer, cycle, message.kind());
            }
        }
        graph.rebuild_paths(&mut self.delta);
        changes.structure_changed = self.delta.changed();
        self.work.touched.extend(self.delta.switches.drain(..));
        tracer.phase_end(cycle, PhaseKind::Structure);

        // -- Switch toggles and transform admission --
        tracer.phase_begin(cycle, PhaseKind::Switch);
        for &(node, on) in &self.batch.switches {
            if !graph.toggle_switch_now(node, on, &mut self.work.touched) {
                record_drop(changes, tracer, cycle, ChangeKind::SwitchToggled);
            }
        }
        for &(node, transform) in &self.batch.transforms {
            if !graph.set_local_now(node, transform) {
                record_drop(changes, tracer, cycle, ChangeKind::TransformSet);
                continue;
            }
            self.work.pending.extend(
                graph.paths[node.idx as usize]
                    .iter()
                    .map(|e| PathRef::new(node.idx, e.key.clone())),
            );
            self.work.admit_pending(graph, changes);
        }
        self.work.pending.extend(self.delta.recompute.drain(..));
        self.work.admit_pending(graph, changes);
        tracer.phase_end(cycle, PhaseKind::Switch);

        // -- Backlog merge and fan-out closure --
        tracer.phase_begin(cycle, PhaseKind::Merge);
        let switch_turned_on = self.work.touched.iter().any(|path| {
            graph
                .entry(path.node, &path.key)
                .and_then(PathEntry::switch)
                .is_some_and(SwitchState::just_turned_on)
        });
        if switch_turned_on || changes.structure_changed {
            self.work.merge_backlog(graph);
        }
        self.work.close_over_fanout(graph, changes);
        changes.merged = self.work.merged;
        tracer.phase_end(cycle, PhaseKind::Merge);

        // -- Sort --
        tracer.phase_begin(cycle, PhaseKind::Sort);
        sort_by_depth(&mut self.work.active, self.config.insertion_sort_threshold);
        tracer.phase_end(cycle, PhaseKind::Sort);

        // -- Recompute --
        tracer.phase_begin(cycle, PhaseKind::Recompute);
        for active in &self.work.active {
            let path = &active.path;
            let Some(entry) = graph.entry(path.node, &path.key) else {
                continue;
            };
            let parent_world = entry
                .owner
                .path_ref(&path.key)
                .and_then(|owner| graph.entry(owner.node, &owner.key))
                .and_then(PathEntry::transform)
                .map_or(Transform3d::IDENTITY, |owner| {
                    if owner.needs_publish {
                        owner.pending
                    } else {
                        owner.world
                    }
                });
            let world = parent_world * graph.local_transform[path.node as usize];
            let Some(state) = graph
                .entry_mut(path.node, &path.key)
                .and_then(PathEntry::transform_mut)
            else {
                continue;
            };
            state.pending = world;
            state.slots.write_pending(world);
            state.needs_publish = true;
        }
        tracer.phase_end(cycle, PhaseKind::Recompute);

        // -- Notify --
        tracer.phase_begin(cycle, PhaseKind::Notify);
        for active in &self.work.active {
            let path = &active.path;
            let Some(world) = graph
                .entry(path.node, &path.key)
                .and_then(PathEntry::transform)
                .map(|t| t.pending)
            else {
                continue;
            };
            if let Some(list) = graph.fanout.get(path) {
                for leaf in &list.leaves {
                    leaf.handle.lock().notify(&leaf.leaf.key, &world);
                    changes.notifications += 1;
                }
            }
        }
        for fresh in &self.delta.fresh_leaves {
            let owner = fresh
                .owner
                .as_ref()
                .and_then(|owner| graph.entry(owner.node, &owner.key))
                .and_then(PathEntry::transform);
            let world = match owner {
                // Delivered through the owner's fan-out list above.
                Some(owner) if owner.needs_publish => continue,
                Some(owner) => owner.world,
                None => Transform3d::IDENTITY,
            };
            fresh.leaf.handle.lock().notify(&fresh.leaf.leaf.key, &world);
            changes.notifications += 1;
        }
        tracer.phase_end(cycle, PhaseKind::Notify);

        // -- Publish --
        tracer.phase_begin(cycle, PhaseKind::Publish);
        for active in &self.work.active {
            let path = &active.path;
            let Some(state) = graph
                .entry_mut(path.node, &path.key)
                .and_then(PathEntry::transform_mut)
            else {
                continue;
            };
            if state.needs_publish {
                state.slots.flip();
                state.world = state.pending;
                changes.published.push(path.clone());
                #[cfg(feature = "trace-rich")]
                self.work.events.push(PathEvent {
                    path: path.clone(),
                    action: PathAction::Published,
                });
            }
        }
        graph.publish_structure(&mut self.delta);
        tracer.phase_end(cycle, PhaseKind::Publish);

        // Clear per-cycle flags.
        for active in &self.work.active {
            if let Some(state) = graph
                .entry_mut(active.path.node, &active.path.key)
                .and_then(PathEntry::transform_mut)
            {
                state.needs_publish = false;
                state.marked_dirty = false;
            }
        }
        for path in self.work.touched.drain(..) {
            if let Some(state) = graph
                .entry_mut(path.node, &path.key)
                .and_then(PathEntry::switch_mut)
            {
                state.end_cycle(cycle);
            }
        }

        let summary = CycleSummary {
            cycle,
            messages: self.batch.queued,
            coalesced: self.batch.superseded,
            dropped: changes.dropped,
            active: self.work.active.len(),
            deferred: changes.deferred.len(),
            merged: changes.merged,
            notifications: changes.notifications,
            published: changes.published.len(),
            backlog: self.work.backlog.len(),
            structure_changed: changes.structure_changed,
        };
        for listener in &mut self.listeners {
            listener.on_cycle_swapped(&summary);
        }
        #[cfg(feature = "trace-rich")]
        if tracer.wants_path_events() && !self.work.events.is_empty() {
            tracer.path_events(cycle, &self.work.events);
        }
        tracer.cycle_summary(&summary);

        self.cycle += 1;
    }
}
