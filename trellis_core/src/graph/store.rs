// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays scene graph storage with allocation, topology, and queries.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use super::fanout::FanoutIndex;
use super::id::{INVALID, NodeId, NodeKind};
use super::path::{Anchor, PathKey, PathRef, locate};
use super::state::{PathEntry, PathState};
use super::switch::{SwitchIndex, SwitchState};
use super::traverse::Children;
use crate::dirty;
use crate::publish::{PublishedTable, TransformReader};
use crate::queue::{ChangeQueue, ChangeSender};
use crate::target::{Dependent, DependentHandle};
use crate::transform::Transform3d;

/// Struct-of-arrays storage for every node of a scene graph.
///
/// Nodes are addressed by [`NodeId`] handles. Each node occupies a slot in
/// parallel arrays. Destroyed nodes are recycled via a free list, and
/// generation counters prevent stale handle access.
///
/// The graph is created with a root [`Group`](NodeKind::Group). Every other
/// node starts detached. Nodes are attached and detached by sending
/// messages through a [`ChangeSender`]; the next propagation cycle applies
/// them, re-derives the affected instantiation paths, and updates the
/// fan-out lists.
///
/// Holding `&mut SceneGraph` for a whole cycle is what serializes structural
/// change against propagation. Readers on other threads never touch the graph
/// itself; they go through a [`TransformReader`].
#[derive(Debug)]
pub struct SceneGraph {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,
    pub(crate) kind: Vec<NodeKind>,

    // -- Authored properties --
    pub(crate) local_transform: Vec<Transform3d>,
    pub(crate) switch_on: Vec<bool>,
    /// Shared group instanced by each link.
    pub(crate) link_target: Vec<u32>,
    /// Links instancing each shared group.
    pub(crate) instances: Vec<Vec<u32>>,
    pub(crate) dependent: Vec<Option<DependentHandle>>,

    // -- Derived per-path state (written by the structure pass) --
    pub(crate) paths: Vec<Vec<PathEntry>>,
    pub(crate) depth: Vec<u32>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,
    pub(crate) root: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,

    // -- Indices --
    pub(crate) fanout: FanoutIndex,
    pub(crate) switches: SwitchIndex,

    // -- Shared with other threads --
    pub(crate) published: Arc<RwLock<PublishedTable>>,
    pub(crate) queue: Arc<ChangeQueue>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Creates a graph holding only its root group.
    #[must_use]
    pub fn new() -> Self {
        let mut graph = Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            kind: Vec::new(),
            local_transform: Vec::new(),
            switch_on: Vec::new(),
            link_target: Vec::new(),
            instances: Vec::new(),
            dependent: Vec::new(),
            paths: Vec::new(),
            depth: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            root: INVALID,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            fanout: FanoutIndex::default(),
            switches: SwitchIndex::default(),
            published: Arc::new(RwLock::new(PublishedTable::default())),
            queue: Arc::new(ChangeQueue::default()),
        };
        let root = graph.alloc(NodeKind::Group);
        graph.root = root;
        graph.paths[root as usize].push(PathEntry {
            key: PathKey::root(),
            owner: Anchor::NONE,
            gate: Anchor::NONE,
            state: PathState::Plain,
        });
        graph
    }

    /// Returns the root group.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.node_id(self.root)
    }

    // -- Allocation API --

    fn alloc(&mut self, kind: NodeKind) -> u32 {
        if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot.
            let i = idx as usize;
            self.generation[i] += 1;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.kind[i] = kind;
            self.local_transform[i] = Transform3d::IDENTITY;
            self.switch_on[i] = true;
            self.link_target[i] = INVALID;
            self.instances[i].clear();
            self.dependent[i] = None;
            self.paths[i].clear();
            self.depth[i] = 0;
            idx
        } else {
            // Allocate a new slot.
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.kind.push(kind);
            self.local_transform.push(Transform3d::IDENTITY);
            self.switch_on.push(true);
            self.link_target.push(INVALID);
            self.instances.push(Vec::new());
            self.dependent.push(None);
            self.paths.push(Vec::new());
            self.depth.push(0);
            self.generation.push(0);
            idx
        }
    }

    /// Creates a detached group node.
    pub fn create_group(&mut self) -> NodeId {
        let idx = self.alloc(NodeKind::Group);
        self.node_id(idx)
    }

    /// Creates a detached transform node with the given local transform.
    pub fn create_transform(&mut self, local: Transform3d) -> NodeId {
        let idx = self.alloc(NodeKind::Transform);
        self.local_transform[idx as usize] = local;
        self.node_id(idx)
    }

    /// Creates a detached switch node.
    pub fn create_switch(&mut self, on: bool) -> NodeId {
        let idx = self.alloc(NodeKind::Switch);
        self.switch_on[idx as usize] = on;
        self.node_id(idx)
    }

    /// Creates a shared group.
    ///
    /// A shared group is never attached to a parent. It is instantiated once
    /// per attached [`Link`](NodeKind::Link) created with
    /// [`create_link`](Self::create_link).
    pub fn create_shared_group(&mut self) -> NodeId {
        let idx = self.alloc(NodeKind::SharedGroup);
        self.node_id(idx)
    }

    /// Creates a detached link instancing `shared`.
    ///
    /// The link's slot index becomes the path token that distinguishes this
    /// instantiation of the shared subtree.
    ///
    /// # Panics
    ///
    /// Panics if `shared` is stale or is not a shared group.
    pub fn create_link(&mut self, shared: NodeId) -> NodeId {
        self.validate(shared);
        let s = shared.idx;
        assert!(
            self.kind[s as usize] == NodeKind::SharedGroup,
            "links can only instance shared groups"
        );
        let idx = self.alloc(NodeKind::Link);
        self.link_target[idx as usize] = s;
        self.instances[s as usize].push(idx);
        let linked = self.dirty.add_dependency(s, idx, dirty::STRUCTURE);
        debug_assert!(linked.is_ok(), "a fresh link cannot close a cycle");
        self.node_id(idx)
    }

    /// Creates a detached leaf carrying `dependent`.
    pub fn create_leaf(&mut self, dependent: Dependent) -> NodeId {
        let idx = self.alloc(NodeKind::Leaf);
        self.dependent[idx as usize] = Some(Arc::new(Mutex::new(dependent)));
        self.node_id(idx)
    }

    /// Destroys a node, freeing its slot for reuse.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale, if the node is the root, is still
    /// attached, still has children, or is a shared group that some link
    /// still instances.
    pub fn destroy_node(&mut self, id: NodeId) {
        self.validate(id);
        let idx = id.idx;
        let i = idx as usize;
        assert!(idx != self.root, "cannot destroy the root");
        assert!(
            self.parent[i] == INVALID,
            "cannot destroy an attached node (detach it first)"
        );
        assert!(
            self.first_child[i] == INVALID,
            "cannot destroy node with children"
        );
        if self.kind[i] == NodeKind::SharedGroup {
            assert!(
                self.instances[i].is_empty(),
                "cannot destroy a shared group that is still instanced"
            );
        }
        if self.kind[i] == NodeKind::Link {
            let s = self.link_target[i] as usize;
            self.instances[s].retain(|&l| l != idx);
        }

        // Remove dirty tracking dependencies.
        self.dirty.remove_key(idx);

        self.dependent[i] = None;

        // Bump generation so old handles immediately fail validation.
        self.generation[i] += 1;

        self.free_list.push(idx);
    }

    /// Returns whether the given handle refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    // -- Messaging --

    /// Returns a sender for queueing mutations from any thread.
    #[must_use]
    pub fn change_sender(&self) -> ChangeSender {
        ChangeSender::new(Arc::clone(&self.queue))
    }

    /// Returns a reader for published world transforms, usable from any
    /// thread.
    #[must_use]
    pub fn reader(&self) -> TransformReader {
        TransformReader::new(Arc::clone(&self.published))
    }

    // -- Topology API --

    /// Returns the kind of a node.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.validate(id);
        self.kind[id.idx as usize]
    }

    /// Returns the parent of a node, if attached.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        (p != INVALID).then(|| self.node_id(p))
    }

    /// Returns an iterator over the direct children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns the shared group a link instances.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or not a link.
    #[must_use]
    pub fn link_target(&self, id: NodeId) -> NodeId {
        self.validate(id);
        assert!(
            self.kind[id.idx as usize] == NodeKind::Link,
            "node is not a link"
        );
        self.node_id(self.link_target[id.idx as usize])
    }

    // -- Property getters --

    /// Returns the authored local transform of a node.
    ///
    /// Nodes other than transform nodes always report identity.
    #[must_use]
    pub fn local_transform(&self, id: NodeId) -> Transform3d {
        self.validate(id);
        self.local_transform[id.idx as usize]
    }

    /// Returns the authored on/off flag of a switch node.
    ///
    /// The effective state along a path also depends on enclosing switches;
    /// see [`switch_state`](Self::switch_state).
    #[must_use]
    pub fn switch_on(&self, id: NodeId) -> bool {
        self.validate(id);
        self.switch_on[id.idx as usize]
    }

    /// Returns the dependent carried by a leaf.
    #[must_use]
    pub fn dependent(&self, id: NodeId) -> Option<DependentHandle> {
        self.validate(id);
        self.dependent[id.idx as usize].clone()
    }

    // -- Derived state --

    /// Returns the keys of every instantiation path currently reaching a
    /// node.
    ///
    /// Only valid after the propagation cycle that applied the latest
    /// attach/detach messages.
    #[must_use]
    pub fn path_keys(&self, id: NodeId) -> Vec<PathKey> {
        self.validate(id);
        self.paths[id.idx as usize]
            .iter()
            .map(|e| e.key.clone())
            .collect()
    }

    /// Returns the number of instantiation paths currently reaching a node.
    #[must_use]
    pub fn path_count(&self, id: NodeId) -> usize {
        self.validate(id);
        self.paths[id.idx as usize].len()
    }

    /// Returns the depth level of a transform node.
    ///
    /// A transform node with no transform ancestor has level 1; otherwise its
    /// level is one more than the deepest level among its nearest transform
    /// ancestors over all paths. Other kinds and detached nodes report 0.
    #[must_use]
    pub fn depth_level(&self, id: NodeId) -> u32 {
        self.validate(id);
        self.depth[id.idx as usize]
    }

    /// Returns the state of a switch node along one path.
    #[must_use]
    pub fn switch_state(&self, id: NodeId, path: &PathKey) -> Option<SwitchState> {
        self.validate(id);
        self.entry(id.idx, path)?.switch().copied()
    }

    /// Returns the published world transform of a transform node along one
    /// path, as seen by the update context.
    #[must_use]
    pub fn world_transform(&self, id: NodeId, path: &PathKey) -> Option<Transform3d> {
        self.validate(id);
        self.entry(id.idx, path)?.transform().map(|t| t.world)
    }

    /// Whether a transform path has a change held back by a switch that is
    /// off.
    #[must_use]
    pub fn is_deferred(&self, id: NodeId, path: &PathKey) -> bool {
        self.validate(id);
        self.entry(id.idx, path)
            .and_then(PathEntry::transform)
            .is_some_and(|t| t.switch_dirty)
    }

    /// Returns how many leaves are notified when the given transform path
    /// changes.
    #[must_use]
    pub fn fanout_len(&self, id: NodeId, path: &PathKey) -> usize {
        self.validate(id);
        self.fanout
            .leaf_count(&PathRef::new(id.idx, path.clone()))
    }

    // -- Raw-index helpers --

    /// Builds a handle for a raw slot index.
    pub(crate) fn node_id(&self, idx: u32) -> NodeId {
        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    pub(crate) fn entry(&self, node: u32, key: &PathKey) -> Option<&PathEntry> {
        let entries = &self.paths[node as usize];
        locate(entries, |e| &e.key, key.tokens()).map(|pos| &entries[pos])
    }

    pub(crate) fn entry_mut(&mut self, node: u32, key: &PathKey) -> Option<&mut PathEntry> {
        let entries = &mut self.paths[node as usize];
        let pos = locate(entries, |e| &e.key, key.tokens())?;
        Some(&mut entries[pos])
    }

    /// Whether the switch gating a path (if any) is effectively on.
    pub(crate) fn gate_open(&self, gate: Anchor, key: &PathKey) -> bool {
        if gate.is_none() {
            return true;
        }
        let entries = &self.paths[gate.node as usize];
        locate(entries, |e| &e.key, &key.tokens()[..gate.key_len])
            .and_then(|pos| entries[pos].switch())
            .is_none_or(SwitchState::currently_on)
    }

    // -- Message application (called by the propagation engine) --

    /// Attaches `child` as the last child of `parent`.
    ///
    /// Returns `false` without doing anything if either handle is stale, if
    /// `child` already has a parent, is the root, or is a shared group, if
    /// `parent` cannot have children, or if the attach would place a shared
    /// group beneath one of its own links.
    pub(crate) fn attach_now(&mut self, parent: NodeId, child: NodeId) -> bool {
        if !self.is_alive(parent) || !self.is_alive(child) {
            return false;
        }
        let p = parent.idx;
        let c = child.idx;
        if self.parent[c as usize] != INVALID
            || c == self.root
            || self.kind[c as usize] == NodeKind::SharedGroup
            || !self.kind[p as usize].accepts_children()
        {
            return false;
        }

        self.link_last_child(p, c);

        // Child depends on parent.
        if self.dirty.add_dependency(c, p, dirty::STRUCTURE).is_err() {
            self.unlink_from_parent(c);
            return false;
        }

        self.dirty.mark_with(c, dirty::STRUCTURE, &EagerPolicy);
        true
    }

    /// Detaches `child` from its parent.
    ///
    /// Returns `false` if the handle is stale. Detaching a node with no
    /// parent does nothing.
    pub(crate) fn detach_now(&mut self, child: NodeId) -> bool {
        if !self.is_alive(child) {
            return false;
        }
        let c = child.idx;
        let p = self.parent[c as usize];
        if p == INVALID {
            return true;
        }
        self.unlink_from_parent(c);
        self.dirty.remove_dependency(c, p, dirty::STRUCTURE);
        self.dirty.mark_with(c, dirty::STRUCTURE, &EagerPolicy);
        true
    }

    /// Replaces the authored transform of a transform node.
    ///
    /// Returns `false` if the handle is stale or not a transform node.
    pub(crate) fn set_local_now(&mut self, id: NodeId, transform: Transform3d) -> bool {
        if !self.is_alive(id) || self.kind[id.idx as usize] != NodeKind::Transform {
            return false;
        }
        self.local_transform[id.idx as usize] = transform;
        true
    }

    /// Sets a switch's own flag and re-derives the effective state of its
    /// paths and of every switch path nested beneath them.
    ///
    /// Every switch path whose state was re-derived is appended to
    /// `touched`. Returns `false` if the handle is stale or not a switch.
    pub(crate) fn toggle_switch_now(
        &mut self,
        id: NodeId,
        on: bool,
        touched: &mut Vec<PathRef>,
    ) -> bool {
        if !self.is_alive(id) || self.kind[id.idx as usize] != NodeKind::Switch {
            return false;
        }
        self.switch_on[id.idx as usize] = on;

        let mut stack: Vec<PathRef> = self.paths[id.idx as usize]
            .iter()
            .map(|e| PathRef::new(id.idx, e.key.clone()))
            .collect();
        while let Some(path) = stack.pop() {
            let Some(entry) = self.entry(path.node, &path.key) else {
                continue;
            };
            let effective = self.switch_on[path.node as usize] && self.gate_open(entry.gate, &path.key);
            let Some(state) = self
                .entry_mut(path.node, &path.key)
                .and_then(PathEntry::switch_mut)
            else {
                continue;
            };
            let changed = state.currently_on != effective;
            state.currently_on = effective;
            if changed {
                stack.extend(self.switches.nested(&path).iter().cloned());
            }
            touched.push(path);
        }
        true
    }

    // -- Internal helpers --

    /// Appends `c` to the child list of `p`.
    fn link_last_child(&mut self, p: u32, c: u32) {
        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;

        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            // Walk to last child.
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }
    }

    /// Unlinks `idx` from its parent's child list.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            self.first_child[p as usize] = next;
        }
        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: NodeId) {
        assert!(
            self.is_alive(id),
            "stale NodeId: slot {} generation {}",
            id.idx,
            id.generation
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::GeometryAtom;

    #[test]
    fn new_graph_has_root_path() {
        let graph = SceneGraph::new();
        let root = graph.root();
        assert_eq!(graph.kind(root), NodeKind::Group);
        assert_eq!(graph.path_keys(root), vec![PathKey::root()]);
        assert_eq!(graph.parent(root), None);
    }

    #[test]
    fn create_and_destroy() {
        let mut graph = SceneGraph::new();
        let a = graph.create_transform(Transform3d::from_translation(1.0, 0.0, 0.0));
        assert!(graph.is_alive(a));
        assert_eq!(graph.kind(a), NodeKind::Transform);
        assert_eq!(graph.path_count(a), 0);

        graph.destroy_node(a);
        assert!(!graph.is_alive(a));
    }

    #[test]
    fn slot_reuse_bumps_generation() {
        let mut graph = SceneGraph::new();
        let a = graph.create_group();
        let idx = a.idx;
        graph.destroy_node(a);

        let b = graph.create_switch(false);
        assert_eq!(b.idx, idx, "slot should be reused");
        assert_ne!(b.generation, a.generation);
        assert!(!graph.is_alive(a));
        assert!(graph.is_alive(b));
        assert!(!graph.switch_on(b));
    }

    #[test]
    fn attach_links_children_in_order() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.create_group();
        let b = graph.create_group();
        let c = graph.create_group();
        assert!(graph.attach_now(root, a));
        assert!(graph.attach_now(root, b));
        assert!(graph.attach_now(root, c));
        assert_eq!(graph.children(root).collect::<Vec<_>>(), vec![a, b, c]);

        assert!(graph.detach_now(b));
        assert_eq!(graph.children(root).collect::<Vec<_>>(), vec![a, c]);
        assert_eq!(graph.parent(b), None);
        assert_eq!(graph.parent(c), Some(root));
    }

    #[test]
    fn stale_handles_are_not_applied() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.create_group();
        graph.destroy_node(a);
        assert!(!graph.attach_now(root, a));
        assert!(!graph.detach_now(a));
        assert!(!graph.set_local_now(a, Transform3d::IDENTITY));
    }

    #[test]
    fn set_local_requires_transform_node() {
        let mut graph = SceneGraph::new();
        let g = graph.create_group();
        let t = graph.create_transform(Transform3d::IDENTITY);
        assert!(!graph.set_local_now(g, Transform3d::from_scale(2.0, 2.0, 2.0)));
        assert!(graph.set_local_now(t, Transform3d::from_scale(2.0, 2.0, 2.0)));
        assert_eq!(graph.local_transform(t), Transform3d::from_scale(2.0, 2.0, 2.0));
    }

    #[test]
    fn links_register_with_their_shared_group() {
        let mut graph = SceneGraph::new();
        let shared = graph.create_shared_group();
        let l1 = graph.create_link(shared);
        let l2 = graph.create_link(shared);
        assert_eq!(graph.link_target(l1), shared);
        assert_eq!(graph.instances[shared.idx as usize], vec![l1.idx, l2.idx]);

        graph.destroy_node(l1);
        assert_eq!(graph.instances[shared.idx as usize], vec![l2.idx]);
    }

    #[test]
    #[should_panic(expected = "still instanced")]
    fn destroying_instanced_shared_group_panics() {
        let mut graph = SceneGraph::new();
        let shared = graph.create_shared_group();
        let _link = graph.create_link(shared);
        graph.destroy_node(shared);
    }

    #[test]
    fn leaves_reject_children() {
        let mut graph = SceneGraph::new();
        let leaf = graph.create_leaf(Dependent::Geometry(GeometryAtom::new()));
        let g = graph.create_group();
        assert!(!graph.attach_now(leaf, g));
        assert_eq!(graph.parent(g), None);
        assert_eq!(graph.children(leaf).count(), 0);
    }

    #[test]
    fn shared_groups_cannot_be_attached() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let shared = graph.create_shared_group();
        assert!(!graph.attach_now(root, shared));
        assert_eq!(graph.parent(shared), None);
    }

    #[test]
    fn attached_children_and_root_cannot_be_reattached() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.create_group();
        let b = graph.create_group();
        assert!(graph.attach_now(root, a));
        assert!(graph.attach_now(root, b));
        assert!(!graph.attach_now(b, a));
        assert_eq!(graph.parent(a), Some(root));
        assert_eq!(graph.children(b).count(), 0);
        assert!(!graph.attach_now(a, root));
        assert_eq!(graph.parent(root), None);
    }

    #[test]
    fn self_instancing_is_rejected() {
        let mut graph = SceneGraph::new();
        let shared = graph.create_shared_group();
        let inner = graph.create_group();
        let link = graph.create_link(shared);
        assert!(graph.attach_now(shared, inner));
        assert!(!graph.attach_now(inner, link));
        assert_eq!(graph.parent(link), None);
        assert_eq!(graph.children(inner).count(), 0);
    }

    #[test]
    #[should_panic(expected = "attached node")]
    fn destroying_attached_node_panics() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.create_group();
        graph.attach_now(root, a);
        graph.destroy_node(a);
    }

    #[test]
    #[should_panic(expected = "stale NodeId")]
    fn stale_handle_panics_on_query() {
        let mut graph = SceneGraph::new();
        let a = graph.create_group();
        graph.destroy_node(a);
        let _ = graph.kind(a);
    }
}
