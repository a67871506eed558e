// Copyright 2026 the Uplift Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-root resolution.

use crate::node::{Capability, NodeId, NodeTree};

/// Finds the node whose sub-tree must be rebuilt when `node`'s layout inputs
/// change.
///
/// Starting at `node`, the walk climbs while the parent hosts an active
/// group behavior, stopping at the first parent that does not or at a
/// [layout boundary](crate::node::NodeFlags::layout_boundary). The last
/// group ancestor reached is the root.
///
/// Returns `None` when `node` is destroyed, or when no group ancestor was
/// found and `node` has no active controller of its own: nothing would
/// arrange the sub-tree, so rebuilding it is wasted work.
#[must_use]
pub fn resolve_root(tree: &NodeTree, node: NodeId) -> Option<NodeId> {
    if !tree.is_alive(node) {
        return None;
    }

    let mut root = node;
    for ancestor in tree.ancestors(node) {
        if tree.flags(ancestor).layout_boundary || !tree.has_active(ancestor, Capability::Group) {
            break;
        }
        root = ancestor;
    }

    // A promoted root is known to arrange its children; `node` itself still
    // needs checking.
    if root == node && !tree.has_active(node, Capability::Controller) {
        return None;
    }
    Some(root)
}
