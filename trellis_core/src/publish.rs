// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Double-buffered publication of world transforms to reader contexts.
//!
//! Every instantiation path of a transform node owns a [`PublishedHandle`]:
//! two transform slots plus the index of the slot readers should use, kept
//! together under one small per-path lock. During a cycle the propagation
//! engine writes only the unpublished slot. Once every path of the cycle has
//! been recomputed and every dependent notified, the engine flips the index
//! of each touched path. A reader therefore always gets a transform that was
//! fully composed by a completed cycle, and never waits for more than one
//! slot copy.
//!
//! [`TransformReader`] is the clonable entry point handed to renderer,
//! picking, and audio threads. Attach and detach change its path table only
//! in the publish phase, after the new paths' slots have been written and
//! flipped, so a path never appears before its first composed value and never
//! disappears before the cycle that removed it completes. The table is
//! write-locked only then, so steady-state reads never contend with
//! propagation.

use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::{Mutex, RwLock};

use crate::graph::{NodeId, PathKey, locate};
use crate::transform::Transform3d;

#[derive(Debug)]
struct WorldSlots {
    slots: [Transform3d; 2],
    published: usize,
}

/// Shared handle to one path's double-buffered world transform.
///
/// Cloning is cheap. A handle stays readable after its path is detached; it
/// then keeps returning the last transform published for that path.
#[derive(Clone, Debug)]
pub struct PublishedHandle {
    inner: Arc<Mutex<WorldSlots>>,
}

impl PublishedHandle {
    pub(crate) fn new(initial: Transform3d) -> Self {
        Self {
            inner: Arc::new(Mutex::new(WorldSlots {
                slots: [initial; 2],
                published: 0,
            })),
        }
    }

    /// Returns the most recently published world transform.
    #[must_use]
    pub fn get(&self) -> Transform3d {
        let slots = self.inner.lock();
        slots.slots[slots.published]
    }

    /// Returns which slot (0 or 1) readers currently use.
    #[must_use]
    pub fn published_index(&self) -> usize {
        self.inner.lock().published
    }

    /// Writes the slot readers are *not* using.
    pub(crate) fn write_pending(&self, world: Transform3d) {
        let mut slots = self.inner.lock();
        let pending = 1 - slots.published;
        slots.slots[pending] = world;
    }

    /// Makes the pending slot the published one.
    pub(crate) fn flip(&self) {
        let mut slots = self.inner.lock();
        slots.published = 1 - slots.published;
    }
}

/// Per-node list of published handles, keyed by path.
#[derive(Debug, Default)]
pub(crate) struct PublishedTable {
    nodes: HashMap<NodeId, Vec<(PathKey, PublishedHandle)>>,
}

impl PublishedTable {
    pub(crate) fn insert(&mut self, node: NodeId, key: PathKey, handle: PublishedHandle) {
        self.nodes.entry(node).or_default().push((key, handle));
    }

    pub(crate) fn remove(&mut self, node: NodeId, key: &PathKey) {
        let Some(paths) = self.nodes.get_mut(&node) else {
            return;
        };
        if let Some(pos) = locate(paths, |(k, _)| k, key.tokens()) {
            paths.swap_remove(pos);
        }
        if paths.is_empty() {
            self.nodes.remove(&node);
        }
    }

    fn get(&self, node: NodeId, key: &PathKey) -> Option<&PublishedHandle> {
        let paths = self.nodes.get(&node)?;
        locate(paths, |(k, _)| k, key.tokens()).map(|pos| &paths[pos].1)
    }
}

/// Read-only access to published world transforms from any thread.
///
/// Obtained from [`SceneGraph::reader`](crate::graph::SceneGraph::reader).
#[derive(Clone, Debug)]
pub struct TransformReader {
    table: Arc<RwLock<PublishedTable>>,
}

impl TransformReader {
    pub(crate) fn new(table: Arc<RwLock<PublishedTable>>) -> Self {
        Self { table }
    }

    /// Returns the published world transform of `node` along `path`.
    ///
    /// Returns `None` if `node` is not a transform node or is not currently
    /// instantiated along `path`. Never observes a cycle in progress.
    #[must_use]
    pub fn published_transform(&self, node: NodeId, path: &PathKey) -> Option<Transform3d> {
        self.table.read().get(node, path).map(PublishedHandle::get)
    }

    /// Resolves a handle for repeated sampling of one path.
    #[must_use]
    pub fn handle(&self, node: NodeId, path: &PathKey) -> Option<PublishedHandle> {
        self.table.read().get(node, path).cloned()
    }
}
