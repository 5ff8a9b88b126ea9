// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-path cached state.

use super::path::{Anchor, PathKey};
use super::switch::SwitchState;
use crate::publish::PublishedHandle;
use crate::transform::Transform3d;

/// Cached world transform of one instantiation of a transform node.
#[derive(Debug)]
pub(crate) struct TransformPathState {
    /// Reader-visible double buffer.
    pub(crate) slots: PublishedHandle,
    /// Value in the published slot.
    pub(crate) world: Transform3d,
    /// Value written to the unpublished slot this cycle.
    pub(crate) pending: Transform3d,
    /// In this cycle's active set.
    pub(crate) marked_dirty: bool,
    /// Waiting in the backlog behind a switch that is off.
    pub(crate) switch_dirty: bool,
    /// Recomputed this cycle; flips at publish.
    pub(crate) needs_publish: bool,
}

impl TransformPathState {
    /// Starts from whatever `slots` currently publishes.
    pub(crate) fn new(slots: PublishedHandle) -> Self {
        let world = slots.get();
        Self {
            slots,
            world,
            pending: world,
            marked_dirty: false,
            switch_dirty: false,
            needs_publish: false,
        }
    }
}

#[derive(Debug)]
pub(crate) enum PathState {
    /// Groups, shared groups, and links carry nothing per path.
    Plain,
    Transform(TransformPathState),
    Switch(SwitchState),
    /// Registered in its owner's fan-out list.
    Leaf,
}

/// One instantiation of one node.
#[derive(Debug)]
pub(crate) struct PathEntry {
    pub(crate) key: PathKey,
    /// Nearest transform ancestor along this path.
    pub(crate) owner: Anchor,
    /// Nearest switch ancestor along this path.
    pub(crate) gate: Anchor,
    pub(crate) state: PathState,
}

impl PathEntry {
    pub(crate) fn transform(&self) -> Option<&TransformPathState> {
        match &self.state {
            PathState::Transform(t) => Some(t),
            _ => None,
        }
    }

    pub(crate) fn transform_mut(&mut self) -> Option<&mut TransformPathState> {
        match &mut self.state {
            PathState::Transform(t) => Some(t),
            _ => None,
        }
    }

    pub(crate) fn switch(&self) -> Option<&SwitchState> {
        match &self.state {
            PathState::Switch(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn switch_mut(&mut self) -> Option<&mut SwitchState> {
        match &mut self.state {
            PathState::Switch(s) => Some(s),
            _ => None,
        }
    }
}
