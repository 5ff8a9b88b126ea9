// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Re-deriving instantiation paths after attach and detach.
//!
//! The structure pass drains the [`STRUCTURE`](crate::dirty::STRUCTURE)
//! channel, which yields every node below an attached or detached subtree
//! root (and below every link into an affected shared group) in dependency
//! order. For each node it derives the new path list from its parent's paths,
//! or from its links' paths for a shared group, and diffs it against the old
//! list by key:
//!
//! - a path whose key, nearest transform ancestor, and nearest switch
//!   ancestor are unchanged keeps its state; a kept switch path re-derives
//!   its effective state, since its enclosing switch may have been replaced;
//! - a path that disappeared is retired: it is removed from its owner's
//!   fan-out list and from the switch index, and a leaf's dependent is told
//!   to forget it;
//! - a new path is instantiated: transform paths get a fresh published
//!   handle and are scheduled for recomputation, leaves are registered in
//!   their owner's fan-out list, and switches take the effective state of
//!   their enclosing switch.
//!
//! A transform path re-created under the same key (because its owner or
//! switch changed) starts from the value its retired predecessor published.
//!
//! Reader table changes are only staged here. The engine applies them with
//! [`SceneGraph::publish_structure`] after the cycle's flips, so readers keep
//! seeing the previous cycle's paths until the new ones hold composed
//! values.

use std::sync::Arc;

use super::fanout::FanoutLeaf;
use super::id::{INVALID, NodeId, NodeKind};
use super::path::{Anchor, PathKey, PathRef};
use super::state::{PathEntry, PathState, TransformPathState};
use super::store::SceneGraph;
use super::switch::SwitchState;
use crate::dirty;
use crate::publish::PublishedHandle;
use crate::transform::Transform3d;

/// A leaf path instantiated by the structure pass.
#[derive(Clone, Debug)]
pub(crate) struct FreshLeaf {
    pub(crate) leaf: FanoutLeaf,
    /// Nearest transform ancestor path, if any.
    pub(crate) owner: Option<PathRef>,
}

/// What a structure pass changed.
#[derive(Debug, Default)]
pub(crate) struct StructureDelta {
    /// Transform paths instantiated this pass.
    pub(crate) recompute: Vec<PathRef>,
    /// Leaf paths instantiated this pass.
    pub(crate) fresh_leaves: Vec<FreshLeaf>,
    /// Kept switch paths whose effective state changed.
    pub(crate) switches: Vec<PathRef>,
    /// Reader table removals, applied at publish.
    pub(crate) unpublish: Vec<(NodeId, PathKey)>,
    /// Reader table insertions, applied at publish after the removals.
    pub(crate) publish: Vec<(NodeId, PathKey, PublishedHandle)>,
    pub(crate) created: usize,
    pub(crate) retired: usize,
}

impl StructureDelta {
    pub(crate) fn clear(&mut self) {
        self.recompute.clear();
        self.fresh_leaves.clear();
        self.switches.clear();
        self.unpublish.clear();
        self.publish.clear();
        self.created = 0;
        self.retired = 0;
    }

    /// Whether any path was created or retired.
    pub(crate) fn changed(&self) -> bool {
        self.created + self.retired > 0
    }
}

type Derived = (PathKey, Anchor, Anchor);

impl SceneGraph {
    /// Re-derives the paths of every node marked since the last pass.
    pub(crate) fn rebuild_paths(&mut self, delta: &mut StructureDelta) {
        let affected: Vec<u32> = self
            .dirty
            .drain(dirty::STRUCTURE)
            .affected()
            .deterministic()
            .run()
            .collect();
        let mut derived = Vec::new();
        for idx in affected {
            self.derive_paths(idx, &mut derived);
            self.reconcile(idx, &derived, delta);
        }
    }

    /// Applies the reader table changes staged by
    /// [`rebuild_paths`](Self::rebuild_paths).
    pub(crate) fn publish_structure(&mut self, delta: &mut StructureDelta) {
        if delta.unpublish.is_empty() && delta.publish.is_empty() {
            return;
        }
        let mut table = self.published.write();
        for (node, key) in delta.unpublish.drain(..) {
            table.remove(node, &key);
        }
        for (node, key, handle) in delta.publish.drain(..) {
            table.insert(node, key, handle);
        }
    }

    /// Computes the `(key, owner, gate)` triples a node should have now.
    fn derive_paths(&self, idx: u32, out: &mut Vec<Derived>) {
        out.clear();
        let i = idx as usize;
        if idx == self.root {
            out.push((PathKey::root(), Anchor::NONE, Anchor::NONE));
            return;
        }
        if self.kind[i] == NodeKind::SharedGroup {
            for &link in &self.instances[i] {
                for e in &self.paths[link as usize] {
                    out.push((e.key.through(link), e.owner, e.gate));
                }
            }
            return;
        }

        let p = self.parent[i];
        if p == INVALID {
            return;
        }
        let parent_kind = self.kind[p as usize];
        for e in &self.paths[p as usize] {
            let here = Anchor {
                node: p,
                key_len: e.key.len(),
            };
            let owner = if parent_kind == NodeKind::Transform {
                here
            } else {
                e.owner
            };
            let gate = if parent_kind == NodeKind::Switch {
                here
            } else {
                e.gate
            };
            out.push((e.key.clone(), owner, gate));
        }
    }

    fn reconcile(&mut self, idx: u32, derived: &[Derived], delta: &mut StructureDelta) {
        let i = idx as usize;
        let mut old = core::mem::take(&mut self.paths[i]);
        if old.is_empty() && derived.is_empty() {
            return;
        }

        let mut next = Vec::with_capacity(derived.len());
        let mut fresh = Vec::new();
        for (n, (key, owner, gate)) in derived.iter().enumerate() {
            match old
                .iter()
                .position(|e| e.key == *key && e.owner == *owner && e.gate == *gate)
            {
                Some(pos) => {
                    let mut entry = old.swap_remove(pos);
                    self.refresh_switch(idx, &mut entry, delta);
                    next.push(entry);
                }
                None => fresh.push(n),
            }
        }

        // Retire before instantiating so a key that changed owner is removed
        // from the old fan-out list first.
        let mut seeds = Vec::new();
        for entry in old {
            if let Some(seed) = self.retire(idx, entry, delta) {
                seeds.push(seed);
            }
            delta.retired += 1;
        }
        for n in fresh {
            let (key, owner, gate) = &derived[n];
            let seed = seeds
                .iter()
                .find(|(k, _)| k == key)
                .map_or(Transform3d::IDENTITY, |(_, world)| *world);
            let entry = self.instantiate(idx, key.clone(), *owner, *gate, seed, delta);
            next.push(entry);
            delta.created += 1;
        }

        if self.kind[i] == NodeKind::Transform {
            let depth = next
                .iter()
                .map(|e| {
                    if e.owner.is_none() {
                        1
                    } else {
                        self.depth[e.owner.node as usize] + 1
                    }
                })
                .max()
                .unwrap_or(0);
            self.depth[i] = depth;
        }
        self.paths[i] = next;
    }

    /// Re-derives the effective state of a kept switch path.
    ///
    /// The enclosing switch was reconciled earlier in this pass, so its state
    /// is already current.
    fn refresh_switch(&self, idx: u32, entry: &mut PathEntry, delta: &mut StructureDelta) {
        let on = self.switch_on[idx as usize] && self.gate_open(entry.gate, &entry.key);
        if let PathState::Switch(state) = &mut entry.state {
            if state.currently_on != on {
                state.currently_on = on;
                delta.switches.push(PathRef::new(idx, entry.key.clone()));
            }
        }
    }

    /// Retires one path. Returns the last published world of a transform
    /// path, keyed by path.
    fn retire(
        &mut self,
        idx: u32,
        entry: PathEntry,
        delta: &mut StructureDelta,
    ) -> Option<(PathKey, Transform3d)> {
        let i = idx as usize;
        let here = PathRef::new(idx, entry.key);
        let owner = entry.owner.path_ref(&here.key);
        match entry.state {
            PathState::Transform(state) => {
                if let Some(owner) = owner {
                    self.fanout.remove_transform(&owner, &here);
                }
                delta.unpublish.push((self.node_id(idx), here.key.clone()));
                return Some((here.key, state.world));
            }
            PathState::Leaf => {
                if let Some(owner) = owner {
                    self.fanout.remove_leaf(&owner, &here);
                }
                if let Some(handle) = &self.dependent[i] {
                    handle.lock().forget(&here.key);
                }
            }
            PathState::Switch(_) => {
                if let Some(gate) = entry.gate.path_ref(&here.key) {
                    self.switches.remove(&gate, &here);
                }
            }
            PathState::Plain => {}
        }
        None
    }

    fn instantiate(
        &mut self,
        idx: u32,
        key: PathKey,
        owner: Anchor,
        gate: Anchor,
        seed: Transform3d,
        delta: &mut StructureDelta,
    ) -> PathEntry {
        let i = idx as usize;
        let here = PathRef::new(idx, key.clone());
        let owner_ref = owner.path_ref(&key);
        let state = match self.kind[i] {
            NodeKind::Transform => {
                let slots = PublishedHandle::new(seed);
                delta
                    .publish
                    .push((self.node_id(idx), key.clone(), slots.clone()));
                if let Some(owner) = owner_ref {
                    self.fanout.add_transform(owner, here.clone());
                }
                delta.recompute.push(here);
                PathState::Transform(TransformPathState::new(slots))
            }
            NodeKind::Leaf => {
                if let Some(handle) = &self.dependent[i] {
                    let leaf = FanoutLeaf {
                        leaf: here,
                        handle: Arc::clone(handle),
                    };
                    if let Some(owner) = &owner_ref {
                        self.fanout.add_leaf(owner.clone(), leaf.clone());
                    }
                    delta.fresh_leaves.push(FreshLeaf {
                        leaf,
                        owner: owner_ref,
                    });
                }
                PathState::Leaf
            }
            NodeKind::Switch => {
                let on = self.switch_on[i] && self.gate_open(gate, &key);
                if let Some(gate) = gate.path_ref(&key) {
                    self.switches.add(gate, here);
                }
                PathState::Switch(SwitchState::new(on))
            }
            NodeKind::Group | NodeKind::SharedGroup | NodeKind::Link => PathState::Plain,
        };
        PathEntry {
            key,
            owner,
            gate,
            state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::{Dependent, GeometryAtom};

    fn attach(graph: &mut SceneGraph, parent: NodeId, child: NodeId) {
        assert!(graph.attach_now(parent, child), "attach applied");
    }

    fn rebuild(graph: &mut SceneGraph) -> StructureDelta {
        let mut delta = StructureDelta::default();
        graph.rebuild_paths(&mut delta);
        graph.publish_structure(&mut delta);
        delta
    }

    #[test]
    fn single_path_outside_shared_groups() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.create_transform(Transform3d::IDENTITY);
        let b = graph.create_transform(Transform3d::IDENTITY);
        attach(&mut graph, root, a);
        attach(&mut graph, a, b);

        let delta = rebuild(&mut graph);
        assert_eq!(graph.path_keys(b), vec![PathKey::root()]);
        assert_eq!(graph.depth_level(a), 1);
        assert_eq!(graph.depth_level(b), 2);
        assert_eq!(delta.recompute.len(), 2);
        assert!(delta.changed());
    }

    #[test]
    fn shared_group_yields_one_path_per_link() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let shared = graph.create_shared_group();
        let inner = graph.create_transform(Transform3d::IDENTITY);
        attach(&mut graph, shared, inner);

        let left = graph.create_transform(Transform3d::IDENTITY);
        let right = graph.create_group();
        let l1 = graph.create_link(shared);
        let l2 = graph.create_link(shared);
        attach(&mut graph, root, left);
        attach(&mut graph, root, right);
        attach(&mut graph, left, l1);
        attach(&mut graph, right, l2);
        rebuild(&mut graph);

        let mut keys = graph.path_keys(inner);
        keys.sort();
        assert_eq!(
            keys,
            vec![
                PathKey::from_tokens(&[l1.idx]),
                PathKey::from_tokens(&[l2.idx]),
            ]
        );
        // One path has a transform ancestor, the other does not.
        assert_eq!(graph.depth_level(inner), 2);
        assert_eq!(
            graph.reader().published_transform(inner, &PathKey::from_tokens(&[l2.idx])),
            Some(Transform3d::IDENTITY)
        );
    }

    #[test]
    fn nested_shared_groups_compose_keys() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let inner_shared = graph.create_shared_group();
        let t = graph.create_transform(Transform3d::IDENTITY);
        attach(&mut graph, inner_shared, t);

        let outer_shared = graph.create_shared_group();
        let inner_link_a = graph.create_link(inner_shared);
        let inner_link_b = graph.create_link(inner_shared);
        attach(&mut graph, outer_shared, inner_link_a);
        attach(&mut graph, outer_shared, inner_link_b);

        let outer_link = graph.create_link(outer_shared);
        attach(&mut graph, root, outer_link);
        rebuild(&mut graph);

        assert_eq!(graph.path_count(t), 2);
        assert!(
            graph
                .path_keys(t)
                .contains(&PathKey::from_tokens(&[outer_link.idx, inner_link_b.idx]))
        );
    }

    #[test]
    fn detach_retires_every_path_below() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.create_transform(Transform3d::IDENTITY);
        let b = graph.create_transform(Transform3d::IDENTITY);
        let leaf = graph.create_leaf(Dependent::Geometry(GeometryAtom::new()));
        attach(&mut graph, root, a);
        attach(&mut graph, a, b);
        attach(&mut graph, b, leaf);
        rebuild(&mut graph);
        assert_eq!(graph.fanout_len(b, &PathKey::root()), 1);

        assert!(graph.detach_now(a));
        let delta = rebuild(&mut graph);
        assert_eq!(delta.retired, 3);
        assert_eq!(graph.path_count(a), 0);
        assert_eq!(graph.path_count(leaf), 0);
        assert_eq!(graph.depth_level(b), 0);
        assert_eq!(graph.fanout_len(b, &PathKey::root()), 0);
        assert!(graph.reader().published_transform(b, &PathKey::root()).is_none());
    }

    #[test]
    fn unchanged_paths_keep_their_state() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.create_transform(Transform3d::IDENTITY);
        attach(&mut graph, root, a);
        rebuild(&mut graph);
        let before = graph.reader().handle(a, &PathKey::root());

        let sibling = graph.create_group();
        attach(&mut graph, root, sibling);
        let delta = rebuild(&mut graph);
        assert!(delta.recompute.is_empty());
        assert_eq!((delta.created, delta.retired), (1, 0));
        let after = graph.reader().handle(a, &PathKey::root());
        assert!(before.is_some() && after.is_some());
    }

    #[test]
    fn switch_paths_inherit_enclosing_state() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let outer = graph.create_switch(false);
        let inner = graph.create_switch(true);
        attach(&mut graph, root, outer);
        attach(&mut graph, outer, inner);
        rebuild(&mut graph);

        let state = graph.switch_state(inner, &PathKey::root()).unwrap();
        assert!(!state.currently_on(), "enclosing switch is off");
        assert!(!state.just_turned_on());
    }

    #[test]
    fn kept_switch_follows_replaced_enclosing_switch() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let off = graph.create_switch(false);
        let outer = graph.create_switch(true);
        let inner = graph.create_switch(true);
        attach(&mut graph, root, off);
        attach(&mut graph, off, outer);
        attach(&mut graph, outer, inner);
        rebuild(&mut graph);
        let key = PathKey::root();
        assert!(!graph.switch_state(inner, &key).unwrap().currently_on());

        assert!(graph.detach_now(outer));
        attach(&mut graph, root, outer);
        let delta = rebuild(&mut graph);
        assert!(graph.switch_state(outer, &key).unwrap().currently_on());
        assert!(graph.switch_state(inner, &key).unwrap().currently_on());
        assert_eq!(delta.switches, [PathRef::new(inner.idx, key)]);
    }

    #[test]
    fn table_changes_wait_for_publish() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.create_transform(Transform3d::IDENTITY);
        attach(&mut graph, root, a);
        let mut delta = StructureDelta::default();
        graph.rebuild_paths(&mut delta);
        let reader = graph.reader();
        assert!(reader.handle(a, &PathKey::root()).is_none());
        assert_eq!(delta.publish.len(), 1);

        graph.publish_structure(&mut delta);
        assert!(reader.handle(a, &PathKey::root()).is_some());
        assert!(delta.publish.is_empty());
    }

    #[test]
    fn recreated_transform_starts_from_last_published_value() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let gate = graph.create_switch(true);
        let a = graph.create_transform(Transform3d::IDENTITY);
        attach(&mut graph, root, gate);
        attach(&mut graph, gate, a);
        rebuild(&mut graph);
        let key = PathKey::root();
        let moved = Transform3d::from_translation(4.0, 0.0, 0.0);
        let old = graph.reader().handle(a, &key).unwrap();
        old.write_pending(moved);
        old.flip();

        // Leaving the switch changes the path's gate, so it is re-created.
        assert!(graph.detach_now(a));
        attach(&mut graph, root, a);
        let mut delta = StructureDelta::default();
        graph.rebuild_paths(&mut delta);
        assert_eq!((delta.created, delta.retired), (1, 1));
        assert_eq!(graph.world_transform(a, &key), Some(moved));
        assert_eq!(graph.reader().published_transform(a, &key), Some(moved));

        graph.publish_structure(&mut delta);
        assert_eq!(graph.reader().published_transform(a, &key), Some(moved));
    }
}
