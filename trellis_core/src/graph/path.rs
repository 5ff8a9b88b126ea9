// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Instantiation path identity.
//!
//! A node inside one or more shared groups is reached once per chain of
//! [`Link`](super::NodeKind::Link)s leading to it from the root. A
//! [`PathKey`] names one such chain as the ordered list of link slot indices,
//! outermost first. Nodes outside every shared group have exactly one path:
//! the empty key.

use core::fmt;

use super::id::INVALID;

/// Ordered link tokens identifying one instantiation of a node.
///
/// Two keys are equal iff their token sequences are equal.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PathKey {
    tokens: Vec<u32>,
}

impl PathKey {
    /// The key of the single implicit path outside every shared group.
    #[must_use]
    pub const fn root() -> Self {
        Self { tokens: Vec::new() }
    }

    /// Creates a key from link slot indices, outermost first.
    #[must_use]
    pub fn from_tokens(tokens: &[u32]) -> Self {
        Self {
            tokens: tokens.to_vec(),
        }
    }

    /// Returns the link tokens, outermost first.
    #[inline]
    #[must_use]
    pub fn tokens(&self) -> &[u32] {
        &self.tokens
    }

    /// Number of shared-group boundaries crossed by this path.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether this is the implicit path outside every shared group.
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Returns the key extended by one more link crossing.
    #[must_use]
    pub fn through(&self, link: u32) -> Self {
        let mut tokens = Vec::with_capacity(self.tokens.len() + 1);
        tokens.extend_from_slice(&self.tokens);
        tokens.push(link);
        Self { tokens }
    }

    /// Returns the key truncated to its first `len` tokens.
    ///
    /// # Panics
    ///
    /// Panics if `len` exceeds the key length.
    #[must_use]
    pub fn prefix(&self, len: usize) -> Self {
        Self::from_tokens(&self.tokens[..len])
    }

    /// Whether this key's tokens equal `tokens`.
    #[inline]
    #[must_use]
    pub fn matches(&self, tokens: &[u32]) -> bool {
        self.tokens == tokens
    }

    /// Returns the index of this key within `keys`, if present.
    #[must_use]
    pub fn position_in(&self, keys: &[Self]) -> Option<usize> {
        locate(keys, |k| k, &self.tokens)
    }
}

impl fmt::Debug for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PathKey({self})")
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tokens.is_empty() {
            return f.write_str("/");
        }
        for t in &self.tokens {
            write!(f, "/{t}")?;
        }
        Ok(())
    }
}

/// Finds the entry of `entries` whose key equals `tokens`.
///
/// Per-path arrays of nodes outside every shared group hold exactly one
/// root-keyed entry; those are answered without comparing tokens.
pub(crate) fn locate<T>(
    entries: &[T],
    key_of: impl Fn(&T) -> &PathKey,
    tokens: &[u32],
) -> Option<usize> {
    if let [only] = entries {
        let key = key_of(only);
        if key.is_root() {
            return tokens.is_empty().then_some(0);
        }
        return key.matches(tokens).then_some(0);
    }
    entries.iter().position(|e| key_of(e).matches(tokens))
}

/// One instantiation of one node: a slot index plus a [`PathKey`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PathRef {
    /// Raw slot index of the node.
    pub node: u32,
    /// Which instantiation of the node.
    pub key: PathKey,
}

impl PathRef {
    /// Creates a reference to instantiation `key` of slot `node`.
    #[must_use]
    pub const fn new(node: u32, key: PathKey) -> Self {
        Self { node, key }
    }

    /// Whether this refers to the virtual root owner (no transform ancestor).
    #[must_use]
    pub const fn is_unowned(&self) -> bool {
        self.node == INVALID
    }
}

impl fmt::Debug for PathRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PathRef({}{})", self.node, self.key)
    }
}

/// The nearest ancestor of some kind along one path.
///
/// The ancestor's own key is the first `key_len` tokens of the descendant's
/// key, because everything crossed in between is a link into a shared group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Anchor {
    pub(crate) node: u32,
    pub(crate) key_len: usize,
}

impl Anchor {
    pub(crate) const NONE: Self = Self {
        node: INVALID,
        key_len: 0,
    };

    pub(crate) const fn is_none(self) -> bool {
        self.node == INVALID
    }

    /// Resolves this anchor against the descendant key `key`.
    pub(crate) fn path_ref(self, key: &PathKey) -> Option<PathRef> {
        (!self.is_none()).then(|| PathRef::new(self.node, key.prefix(self.key_len)))
    }
}
