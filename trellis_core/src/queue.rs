// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mutation messages and the queue that batches them per cycle.
//!
//! Any thread holding a [`ChangeSender`] can enqueue messages at any time.
//! The propagation engine drains the whole queue at the start of a cycle and
//! compacts the batch:
//!
//! - attach and detach messages keep their arrival order and are applied
//!   first, so a transform message for a subtree detached in the same batch
//!   finds its paths already gone and is dropped;
//! - switch toggles are coalesced per node, last write wins, so only the
//!   end-of-batch state of each switch matters;
//! - transform sets are coalesced per node, last write wins.

use std::sync::Arc;

use hashbrown::HashMap;
use hashbrown::hash_map::Entry;
use parking_lot::Mutex;

use crate::graph::NodeId;
use crate::transform::Transform3d;

/// Kind of a [`ChangeMessage`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// A transform node's authored transform was replaced.
    TransformSet,
    /// A switch node was turned on or off.
    SwitchToggled,
    /// A subtree was attached under a parent.
    SubtreeAttached,
    /// A subtree was detached from its parent.
    SubtreeDetached,
}

impl ChangeKind {
    /// Short name in the style of the message constants.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::TransformSet => "TRANSFORM_SET",
            Self::SwitchToggled => "SWITCH_TOGGLED",
            Self::SubtreeAttached => "SUBTREE_ATTACHED",
            Self::SubtreeDetached => "SUBTREE_DETACHED",
        }
    }
}

/// One mutation of the scene graph, consumed exactly once by a cycle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ChangeMessage {
    /// Replace the authored transform of a transform node.
    TransformSet {
        /// The transform node.
        node: NodeId,
        /// Its new local transform.
        transform: Transform3d,
    },
    /// Turn a switch node on or off.
    SwitchToggled {
        /// The switch node.
        node: NodeId,
        /// Its new state.
        on: bool,
    },
    /// Attach `child` as the last child of `parent`.
    SubtreeAttached {
        /// New parent.
        parent: NodeId,
        /// Root of the attached subtree.
        child: NodeId,
    },
    /// Detach `child` from its parent.
    SubtreeDetached {
        /// Root of the detached subtree.
        child: NodeId,
    },
}

impl ChangeMessage {
    /// Returns the kind of this message.
    #[must_use]
    pub const fn kind(&self) -> ChangeKind {
        match self {
            Self::TransformSet { .. } => ChangeKind::TransformSet,
            Self::SwitchToggled { .. } => ChangeKind::SwitchToggled,
            Self::SubtreeAttached { .. } => ChangeKind::SubtreeAttached,
            Self::SubtreeDetached { .. } => ChangeKind::SubtreeDetached,
        }
    }

    /// Returns the node this message is about.
    ///
    /// For attach messages this is the child.
    #[must_use]
    pub const fn target(&self) -> NodeId {
        match *self {
            Self::TransformSet { node, .. } | Self::SwitchToggled { node, .. } => node,
            Self::SubtreeAttached { child, .. } | Self::SubtreeDetached { child } => child,
        }
    }
}

/// Shared, thread-safe message queue.
#[derive(Debug, Default)]
pub(crate) struct ChangeQueue {
    pending: Mutex<Vec<ChangeMessage>>,
}

impl ChangeQueue {
    pub(crate) fn push(&self, message: ChangeMessage) {
        self.pending.lock().push(message);
    }

    /// Moves every queued message into `out`, leaving the queue empty.
    ///
    /// `out` is cleared first; its allocation is handed to the queue so the
    /// two buffers alternate between cycles.
    pub(crate) fn drain_into(&self, out: &mut Vec<ChangeMessage>) {
        out.clear();
        core::mem::swap(&mut *self.pending.lock(), out);
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.lock().len()
    }
}

/// Clonable handle for enqueueing mutations from any thread.
///
/// Obtained from [`SceneGraph::change_sender`](crate::graph::SceneGraph::change_sender).
/// Nothing takes effect until the next propagation cycle.
#[derive(Clone, Debug)]
pub struct ChangeSender {
    queue: Arc<ChangeQueue>,
}

impl ChangeSender {
    pub(crate) fn new(queue: Arc<ChangeQueue>) -> Self {
        Self { queue }
    }

    /// Enqueues a message.
    pub fn send(&self, message: ChangeMessage) {
        self.queue.push(message);
    }

    /// Enqueues a transform change.
    ///
    /// The message is dropped if `node` is not a live transform node when the
    /// cycle runs.
    pub fn set_transform(&self, node: NodeId, transform: Transform3d) {
        self.send(ChangeMessage::TransformSet { node, transform });
    }

    /// Enqueues a switch toggle.
    ///
    /// The message is dropped if `node` is not a live switch node when the
    /// cycle runs.
    pub fn set_switch(&self, node: NodeId, on: bool) {
        self.send(ChangeMessage::SwitchToggled { node, on });
    }

    /// Enqueues attaching `child` as the last child of `parent`.
    ///
    /// The message is dropped if either node is gone when the cycle runs, if
    /// `child` already has a parent, if `child` is a shared group or the
    /// root, if `parent` cannot hold children, or if the attach would make a
    /// shared group instance itself. Messages earlier in the batch stay
    /// applied.
    pub fn attach(&self, parent: NodeId, child: NodeId) {
        self.send(ChangeMessage::SubtreeAttached { parent, child });
    }

    /// Enqueues detaching `child` from its parent.
    ///
    /// Detaching a node that has no parent is a no-op.
    pub fn detach(&self, child: NodeId) {
        self.send(ChangeMessage::SubtreeDetached { child });
    }

    /// Number of messages waiting for the next cycle.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

/// A drained batch, split by kind and compacted.
#[derive(Debug, Default)]
pub(crate) struct ChangeBatch {
    /// Attach and detach messages in arrival order.
    pub(crate) structure: Vec<ChangeMessage>,
    /// Final switch state per node, in order of first toggle.
    pub(crate) switches: Vec<(NodeId, bool)>,
    /// Final transform per node, in order of first write.
    pub(crate) transforms: Vec<(NodeId, Transform3d)>,
    /// Messages drained before compaction.
    pub(crate) queued: usize,
    /// Writes replaced by a later write to the same node.
    pub(crate) superseded: usize,
    switch_slot: HashMap<NodeId, usize>,
    transform_slot: HashMap<NodeId, usize>,
}

impl ChangeBatch {
    pub(crate) fn clear(&mut self) {
        self.structure.clear();
        self.switches.clear();
        self.transforms.clear();
        self.queued = 0;
        self.superseded = 0;
        self.switch_slot.clear();
        self.transform_slot.clear();
    }

    /// Compacts `messages` into this batch, consuming them.
    pub(crate) fn compact(&mut self, messages: &mut Vec<ChangeMessage>) {
        self.clear();
        self.queued = messages.len();
        for message in messages.drain(..) {
            match message {
                ChangeMessage::TransformSet { node, transform } => {
                    match self.transform_slot.entry(node) {
                        Entry::Occupied(slot) => {
                            self.transforms[*slot.get()].1 = transform;
                            self.superseded += 1;
                        }
                        Entry::Vacant(slot) => {
                            slot.insert(self.transforms.len());
                            self.transforms.push((node, transform));
                        }
                    }
                }
                ChangeMessage::SwitchToggled { node, on } => match self.switch_slot.entry(node) {
                    Entry::Occupied(slot) => {
                        self.switches[*slot.get()].1 = on;
                        self.superseded += 1;
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(self.switches.len());
                        self.switches.push((node, on));
                    }
                },
                ChangeMessage::SubtreeAttached { .. } | ChangeMessage::SubtreeDetached { .. } => {
                    self.structure.push(message);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(idx: u32) -> NodeId {
        NodeId { idx, generation: 0 }
    }

    #[test]
    fn drain_empties_queue() {
        let queue = Arc::new(ChangeQueue::default());
        let sender = ChangeSender::new(Arc::clone(&queue));
        sender.set_switch(id(1), false);
        sender.detach(id(2));
        assert_eq!(sender.pending(), 2);

        let mut out = vec![ChangeMessage::SubtreeDetached { child: id(9) }];
        queue.drain_into(&mut out);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].kind(), ChangeKind::SwitchToggled);
        assert_eq!(sender.pending(), 0);
    }

    #[test]
    fn transforms_coalesce_last_write_wins() {
        let mut messages = vec![
            ChangeMessage::TransformSet {
                node: id(1),
                transform: Transform3d::from_translation(1.0, 0.0, 0.0),
            },
            ChangeMessage::TransformSet {
                node: id(2),
                transform: Transform3d::IDENTITY,
            },
            ChangeMessage::TransformSet {
                node: id(1),
                transform: Transform3d::from_translation(3.0, 0.0, 0.0),
            },
        ];
        let mut batch = ChangeBatch::default();
        batch.compact(&mut messages);

        assert!(messages.is_empty());
        assert_eq!(batch.queued, 3);
        assert_eq!(batch.superseded, 1);
        assert_eq!(
            batch.transforms,
            vec![
                (id(1), Transform3d::from_translation(3.0, 0.0, 0.0)),
                (id(2), Transform3d::IDENTITY),
            ]
        );
    }

    #[test]
    fn switch_toggles_coalesce_per_batch() {
        let mut messages = vec![
            ChangeMessage::SwitchToggled {
                node: id(4),
                on: true,
            },
            ChangeMessage::SwitchToggled {
                node: id(4),
                on: false,
            },
            ChangeMessage::SwitchToggled {
                node: id(4),
                on: true,
            },
        ];
        let mut batch = ChangeBatch::default();
        batch.compact(&mut messages);
        assert_eq!(batch.switches, vec![(id(4), true)]);
    }

    #[test]
    fn structure_keeps_arrival_order() {
        let mut messages = vec![
            ChangeMessage::TransformSet {
                node: id(3),
                transform: Transform3d::IDENTITY,
            },
            ChangeMessage::SubtreeDetached { child: id(3) },
            ChangeMessage::SubtreeAttached {
                parent: id(0),
                child: id(3),
            },
        ];
        let mut batch = ChangeBatch::default();
        batch.compact(&mut messages);
        assert_eq!(
            batch.structure.iter().map(ChangeMessage::kind).collect::<Vec<_>>(),
            vec![ChangeKind::SubtreeDetached, ChangeKind::SubtreeAttached]
        );
        assert_eq!(batch.transforms.len(), 1);
        assert_eq!(batch.structure[1].target(), id(3));
    }
}
