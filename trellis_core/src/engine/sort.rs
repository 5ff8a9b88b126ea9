// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Depth ordering of the active set.

use super::cycle::ActiveEntry;

/// Sorts `entries` by non-decreasing depth level, keeping the relative order
/// of equal depths.
pub(crate) fn sort_by_depth(entries: &mut [ActiveEntry], insertion_threshold: usize) {
    if entries.len() < insertion_threshold {
        insertion_sort(entries);
    } else {
        entries.sort_by_key(|e| e.depth);
    }
}

fn insertion_sort(entries: &mut [ActiveEntry]) {
    for i in 1..entries.len() {
        let mut j = i;
        while j > 0 && entries[j - 1].depth > entries[j].depth {
            entries.swap(j - 1, j);
            j -= 1;
        }
    }
}
