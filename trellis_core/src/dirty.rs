// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! Trellis uses [`understory_dirty`] to find which nodes must have their
//! instantiation paths re-derived after a structural change.
//!
//! # Dependency edges
//!
//! - A child depends on its parent. The edge is added when a child is
//!   attached and removed when it is detached.
//! - A shared group depends on every [`Link`](crate::graph::NodeKind::Link)
//!   that instances it. The edge is added when the link is created.
//!
//! Attach and detach mark the child with
//! [`EagerPolicy`](understory_dirty::EagerPolicy), so the whole subtree below
//! it is marked, including everything reached through links. The structure
//! pass drains the channel in dependency order, so a node is always
//! reconciled after its parent and after every link into it.
//!
//! The tracker is created with
//! [`CycleHandling::Error`](understory_dirty::CycleHandling::Error): a shared
//! group that would end up instancing itself is rejected when its edge is
//! added.
//!
//! Transform changes do not go through this tracker. They are routed through
//! the precomputed fan-out lists instead, which are keyed by instantiation
//! path rather than by node.

use understory_dirty::Channel;

/// Node ancestry or instancing changed; its paths must be re-derived.
pub const STRUCTURE: Channel = Channel::new(0);
