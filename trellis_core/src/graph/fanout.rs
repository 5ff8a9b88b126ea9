// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Precomputed fan-out from transform paths to their dependents.
//!
//! For every instantiation of a transform node the index lists
//!
//! - the transform paths whose nearest transform ancestor it is, which must be
//!   recomputed after it, and
//! - the leaves whose nearest transform ancestor it is, which must be
//!   notified with its new world transform.
//!
//! Entries are added and removed only while attach/detach messages are
//! applied, one node at a time. Propagation never walks the graph to find
//! dependents.

use hashbrown::HashMap;

use super::path::PathRef;
use crate::target::DependentHandle;

/// A leaf registration: which instantiation, and where to deliver.
#[derive(Clone, Debug)]
pub(crate) struct FanoutLeaf {
    pub(crate) leaf: PathRef,
    pub(crate) handle: DependentHandle,
}

#[derive(Debug, Default)]
pub(crate) struct FanoutList {
    pub(crate) transforms: Vec<PathRef>,
    pub(crate) leaves: Vec<FanoutLeaf>,
}

impl FanoutList {
    fn is_empty(&self) -> bool {
        self.transforms.is_empty() && self.leaves.is_empty()
    }
}

#[derive(Debug, Default)]
pub(crate) struct FanoutIndex {
    lists: HashMap<PathRef, FanoutList>,
}

impl FanoutIndex {
    pub(crate) fn add_transform(&mut self, owner: PathRef, child: PathRef) {
        self.lists.entry(owner).or_default().transforms.push(child);
    }

    pub(crate) fn add_leaf(&mut self, owner: PathRef, leaf: FanoutLeaf) {
        self.lists.entry(owner).or_default().leaves.push(leaf);
    }

    pub(crate) fn remove_transform(&mut self, owner: &PathRef, child: &PathRef) {
        self.edit(owner, |list| list.transforms.retain(|t| t != child));
    }

    pub(crate) fn remove_leaf(&mut self, owner: &PathRef, leaf: &PathRef) {
        self.edit(owner, |list| list.leaves.retain(|l| &l.leaf != leaf));
    }

    pub(crate) fn get(&self, owner: &PathRef) -> Option<&FanoutList> {
        self.lists.get(owner)
    }

    /// Number of leaves registered under `owner`.
    pub(crate) fn leaf_count(&self, owner: &PathRef) -> usize {
        self.lists.get(owner).map_or(0, |l| l.leaves.len())
    }

    fn edit(&mut self, owner: &PathRef, f: impl FnOnce(&mut FanoutList)) {
        if let Some(list) = self.lists.get_mut(owner) {
            f(list);
            if list.is_empty() {
                self.lists.remove(owner);
            }
        }
    }
}
