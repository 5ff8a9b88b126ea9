// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-path visibility switch state.

use hashbrown::HashMap;

use super::path::PathRef;

/// On/off state of one instantiation of a switch node.
///
/// `currently_on` is the *effective* state: the switch's own flag and every
/// enclosing switch along the same path. Paths beneath an effectively-off
/// switch are not recomputed; their changes wait in the engine's backlog
/// until the switch turns back on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwitchState {
    pub(crate) currently_on: bool,
    pub(crate) was_on_last_cycle: bool,
    pub(crate) last_on_cycle: Option<u64>,
}

impl SwitchState {
    pub(crate) const fn new(on: bool) -> Self {
        Self {
            currently_on: on,
            was_on_last_cycle: on,
            last_on_cycle: None,
        }
    }

    /// Effective on/off state.
    #[must_use]
    pub const fn currently_on(&self) -> bool {
        self.currently_on
    }

    /// State at the end of the previous cycle.
    #[must_use]
    pub const fn was_on_last_cycle(&self) -> bool {
        self.was_on_last_cycle
    }

    /// Turned on since the previous cycle.
    #[must_use]
    pub const fn just_turned_on(&self) -> bool {
        self.currently_on && !self.was_on_last_cycle
    }

    /// Turned off since the previous cycle.
    #[must_use]
    pub const fn just_turned_off(&self) -> bool {
        !self.currently_on && self.was_on_last_cycle
    }

    /// Cycle in which this switch last turned on.
    ///
    /// `None` if it has not turned on since it was instantiated.
    #[must_use]
    pub const fn last_on_cycle(&self) -> Option<u64> {
        self.last_on_cycle
    }

    /// Latches the current state as the previous-cycle state.
    pub(crate) fn end_cycle(&mut self, cycle: u64) {
        if self.just_turned_on() {
            self.last_on_cycle = Some(cycle);
        }
        self.was_on_last_cycle = self.currently_on;
    }
}

/// Switch paths nested directly beneath each switch path.
///
/// Lets a toggle re-derive the effective state of nested switches without
/// walking the graph.
#[derive(Debug, Default)]
pub(crate) struct SwitchIndex {
    nested: HashMap<PathRef, Vec<PathRef>>,
}

impl SwitchIndex {
    pub(crate) fn add(&mut self, outer: PathRef, inner: PathRef) {
        self.nested.entry(outer).or_default().push(inner);
    }

    pub(crate) fn remove(&mut self, outer: &PathRef, inner: &PathRef) {
        if let Some(list) = self.nested.get_mut(outer) {
            list.retain(|p| p != inner);
            if list.is_empty() {
                self.nested.remove(outer);
            }
        }
    }

    pub(crate) fn nested(&self, outer: &PathRef) -> &[PathRef] {
        self.nested.get(outer).map_or(&[], Vec::as_slice)
    }
}
