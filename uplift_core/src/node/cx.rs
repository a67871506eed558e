// Copyright 2026 the Uplift Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The view a behavior gets of the tree while it runs.

use kurbo::{Rect, Size};

use super::id::{INVALID, NodeId};
use super::store::{Geometry, Links, NodeFlags};
use super::traverse::Children;
use crate::axis::{Axis, AxisExtent};

/// Which pass a [`LayoutCx`] was created for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Role {
    Calculate,
    SelfControl,
    Control,
}

/// Layout context handed to [`LayoutBehavior`](super::LayoutBehavior) methods.
///
/// Topology and geometry of the whole tree are readable. Writes are scoped to
/// the visited node: calculators publish its [`AxisExtent`], controllers set
/// its span, and ordinary (non-self) controllers may also place its direct
/// children. Nothing written here records layout dirt.
#[derive(Debug)]
pub struct LayoutCx<'a> {
    node: NodeId,
    role: Role,
    links: &'a Links,
    flags: &'a [NodeFlags],
    geometry: &'a mut Geometry,
}

impl<'a> LayoutCx<'a> {
    pub(crate) fn new(
        node: u32,
        role: Role,
        links: &'a Links,
        flags: &'a [NodeFlags],
        geometry: &'a mut Geometry,
    ) -> Self {
        Self {
            node: links.id_at(node),
            role,
            links,
            flags,
            geometry,
        }
    }

    /// The node whose behavior is running.
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The parent of the visited node, if any.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        let p = self.links.parent[self.node.idx as usize];
        (p != INVALID).then(|| self.links.id_at(p))
    }

    /// The visited node's children in sibling order.
    #[must_use]
    pub fn children(&self) -> Children<'_> {
        Children::new(self.links, self.links.first_child[self.node.idx as usize])
    }

    /// The visited node's active children in sibling order.
    ///
    /// The visited node is always active in hierarchy, so these are exactly
    /// the children the walk descends into.
    pub fn active_children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children().filter(|c| self.flags[c.idx as usize].active)
    }

    /// The current rect of `node` in its parent's space.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn rect(&self, node: NodeId) -> Rect {
        self.links.validate(node);
        self.geometry.rect[node.idx as usize]
    }

    /// The current size of `node`.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn size(&self, node: NodeId) -> Size {
        self.rect(node).size()
    }

    /// The extent `node` published along `axis`.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn extent(&self, node: NodeId, axis: Axis) -> AxisExtent {
        self.links.validate(node);
        self.geometry.extent[node.idx as usize][axis.index()]
    }

    /// Publishes the visited node's extent along `axis`.
    pub fn set_extent(&mut self, axis: Axis, extent: AxisExtent) {
        debug_assert!(
            self.role == Role::Calculate,
            "extents are published during the calculation pass"
        );
        self.geometry.extent[self.node.idx as usize][axis.index()] = extent;
    }

    /// Sets the visited node's `(start, length)` along `axis`.
    pub fn set_span(&mut self, axis: Axis, start: f64, length: f64) {
        debug_assert!(
            self.role != Role::Calculate,
            "spans are assigned during the control pass"
        );
        let slot = &mut self.geometry.rect[self.node.idx as usize];
        *slot = axis.with_span(*slot, start, length);
    }

    /// Sets the `(start, length)` of a direct child along `axis`.
    ///
    /// # Panics
    ///
    /// Panics if `child` is stale or not a direct child of the visited node.
    pub fn set_child_span(&mut self, child: NodeId, axis: Axis, start: f64, length: f64) {
        debug_assert!(
            self.role == Role::Control,
            "only ordinary controllers arrange children"
        );
        self.links.validate(child);
        assert!(
            self.links.parent[child.idx as usize] == self.node.idx,
            "{child:?} is not a child of {:?}",
            self.node
        );
        let slot = &mut self.geometry.rect[child.idx as usize];
        *slot = axis.with_span(*slot, start, length);
    }
}
