// Copyright 2026 the Uplift Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rebuild units: pooled handles that correlate a pending rebuild with its
//! root node.

use core::fmt;
use core::hash::{Hash, Hasher};

use crate::node::{NodeId, NodeTree};

/// Stable identity of a rebuild request.
///
/// Derived once from the root's [`NodeId`] when a unit is bound, so a unit
/// keeps comparing and hashing the same way after its node is destroyed.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RebuildKey(u64);

impl RebuildKey {
    /// The key of an unbound unit.
    pub const NONE: Self = Self(u64::MAX);

    /// Computes the key for a node handle.
    #[inline]
    #[must_use]
    pub const fn of(node: NodeId) -> Self {
        Self(((node.generation() as u64) << 32) | node.index() as u64)
    }

    /// Wraps a value previously returned by [`get`](Self::get).
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Returns the packed `(generation << 32) | index` value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for RebuildKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::NONE {
            f.write_str("RebuildKey(none)")
        } else {
            write!(f, "RebuildKey({}@gen{})", self.0 & 0xffff_ffff, self.0 >> 32)
        }
    }
}

/// A request to rebuild the layout sub-tree rooted at one node.
///
/// Units are move-only and come from a [`UnitPool`](super::UnitPool). A unit
/// holds no ownership of its node; equality and hashing use only the cached
/// [`RebuildKey`], so two units bound to the same node are the same request.
pub struct RebuildUnit {
    target: Option<NodeId>,
    key: RebuildKey,
}

impl RebuildUnit {
    /// Creates an unbound unit.
    pub(crate) const fn unbound() -> Self {
        Self {
            target: None,
            key: RebuildKey::NONE,
        }
    }

    pub(crate) fn bind(&mut self, node: NodeId) {
        self.target = Some(node);
        self.key = RebuildKey::of(node);
    }

    pub(crate) fn clear(&mut self) {
        self.target = None;
        self.key = RebuildKey::NONE;
    }

    /// The node this unit rebuilds, if bound.
    #[must_use]
    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    /// The identity used for deduplication.
    #[must_use]
    pub fn key(&self) -> RebuildKey {
        self.key
    }

    /// Returns whether the unit is unbound or its node no longer exists.
    /// Such units are skipped by [`rebuild`](super::LayoutRebuilder::rebuild).
    #[must_use]
    pub fn is_destroyed(&self, tree: &NodeTree) -> bool {
        self.target.is_none_or(|node| !tree.is_alive(node))
    }
}

impl PartialEq for RebuildUnit {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for RebuildUnit {}

impl Hash for RebuildUnit {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Debug for RebuildUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RebuildUnit")
            .field("target", &self.target)
            .field("key", &self.key)
            .finish()
    }
}
