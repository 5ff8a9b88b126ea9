// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node identity and kind.

use core::fmt;

/// Sentinel value indicating "no node" in index fields.
pub const INVALID: u32 = u32::MAX;

/// A handle to a node in a [`SceneGraph`](super::SceneGraph).
///
/// Contains both a slot index and a generation counter so that stale handles
/// can be detected after a node is destroyed and the slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl NodeId {
    /// Returns the raw slot index.
    ///
    /// Path tokens and [`PathRef`](super::PathRef)s refer to nodes by this
    /// index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}@gen{})", self.idx, self.generation)
    }
}

/// What a node does during propagation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Plain grouping node; passes its ancestry through unchanged.
    Group,
    /// Holds an authored transform and one world transform per
    /// instantiation path.
    Transform,
    /// Visibility switch; gates recomputation of everything beneath it.
    Switch,
    /// Root of a subtree that is instanced through [`Link`](Self::Link)s
    /// instead of being attached to a parent.
    SharedGroup,
    /// Leaf that instantiates a [`SharedGroup`](Self::SharedGroup).
    Link,
    /// Leaf carrying a dependent that is notified of world transform changes.
    Leaf,
}

impl NodeKind {
    /// Whether nodes of this kind may have children.
    #[must_use]
    pub const fn accepts_children(self) -> bool {
        !matches!(self, Self::Link | Self::Leaf)
    }
}
