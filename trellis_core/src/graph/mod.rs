// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene graph data model.
//!
//! A *node* is a vertex of a directed acyclic scene graph. Each node has:
//!
//! - An identity ([`NodeId`]): a generational handle that becomes stale when
//!   the node is destroyed, preventing use-after-free bugs at the API level.
//! - A [`NodeKind`]: group, transform, switch, shared group, link, or leaf.
//! - Topology: parent, first-child, and sibling links. Every node has at
//!   most one parent; a subtree appears more than once only when it hangs
//!   below a [`SharedGroup`](NodeKind::SharedGroup) that several
//!   [`Link`](NodeKind::Link)s instance.
//! - **Per-path state** derived by the propagation engine: one entry per
//!   instantiation path ([`PathKey`]) currently reaching the node. Transform
//!   nodes cache a world transform per path, switch nodes an on/off state per
//!   path, and leaves a fan-out registration per path.
//!
//! Nodes are stored in struct-of-arrays layout with index-based handles.
//!
//! # Structural change
//!
//! Attach and detach are applied by the engine at the start of a cycle (see
//! [`dirty`](crate::dirty)). Only the affected subtrees are re-derived, and
//! the fan-out lists and depth levels are maintained incrementally; nothing
//! walks the whole graph during steady-state propagation.

mod fanout;
mod id;
mod path;
mod state;
mod store;
mod structure;
mod switch;
mod traverse;

pub use id::{INVALID, NodeId, NodeKind};
pub(crate) use path::locate;
pub use path::{PathKey, PathRef};
pub(crate) use state::PathEntry;
pub use store::SceneGraph;
pub(crate) use structure::StructureDelta;
pub use switch::SwitchState;
pub use traverse::Children;
