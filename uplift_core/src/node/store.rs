// Copyright 2026 the Uplift Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays node storage with allocation, topology, behavior, and
//! geometry management.

use alloc::boxed::Box;
use alloc::vec::Vec;

use kurbo::{Rect, Size};
use understory_dirty::{CycleHandling, DirtyTracker};

use super::behavior::{Attached, Capabilities, Capability, LayoutBehavior};
use super::id::{BehaviorId, INVALID, NodeId};
use super::traverse::{Ancestors, Children};
use crate::axis::{Axis, AxisExtent};
use crate::dirty;

/// Per-node flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeFlags {
    /// Whether the node is active. A node is active in hierarchy only when it
    /// and every ancestor are active; behaviors on nodes that are not never
    /// run.
    pub active: bool,
    /// Whether the node is a layout boundary (for example a canvas root).
    /// Dirty-root resolution never looks at this node's ancestors from below.
    pub layout_boundary: bool,
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self {
            active: true,
            layout_boundary: false,
        }
    }
}

/// Parent, child, and sibling links plus slot generations.
///
/// Kept apart from [`Geometry`] so a behavior can read topology while the
/// walker lends it mutable geometry.
#[derive(Debug, Default)]
pub(crate) struct Links {
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,
    pub(crate) generation: Vec<u32>,
}

impl Links {
    /// Builds the current handle for slot `idx`.
    #[inline]
    pub(crate) fn id_at(&self, idx: u32) -> NodeId {
        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: NodeId) {
        let current = self.generation.get(id.idx as usize).copied();
        assert!(
            current == Some(id.generation),
            "stale NodeId: {id:?} (current gen: {})",
            current.unwrap_or(u32::MAX)
        );
    }
}

/// Layout outputs of every node.
#[derive(Debug, Default)]
pub(crate) struct Geometry {
    /// Final placement in the parent's space, written by controllers.
    pub(crate) rect: Vec<Rect>,
    /// Size inputs per axis, written by calculators.
    pub(crate) extent: Vec<[AxisExtent; 2]>,
}

/// Struct-of-arrays storage for all nodes.
///
/// Nodes are addressed by [`NodeId`] handles. Internally, each node occupies
/// a slot in parallel arrays. Destroyed nodes are recycled via a free list,
/// and generation counters prevent stale handle access.
///
/// Mutations that change layout inputs record the affected node in the
/// [`LAYOUT`](dirty::LAYOUT) channel; see
/// [`drain_layout_dirty`](Self::drain_layout_dirty).
#[derive(Debug)]
pub struct NodeTree {
    // -- Topology --
    pub(crate) links: Links,

    // -- Local state (set by callers) --
    pub(crate) flags: Vec<NodeFlags>,
    pub(crate) behaviors: Vec<Vec<Option<Attached>>>,

    // -- Layout outputs (written by behaviors during rebuilds) --
    pub(crate) geometry: Geometry,

    // -- Allocation --
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            links: Links::default(),
            flags: Vec::new(),
            behaviors: Vec::new(),
            geometry: Geometry::default(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
        }
    }

    // -- Allocation API --

    /// Creates a new node and returns its handle.
    ///
    /// The node starts active, with no parent, no behaviors, an empty rect,
    /// and zero extents.
    pub fn create_node(&mut self) -> NodeId {
        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.links.generation[i] += 1;
            self.links.parent[i] = INVALID;
            self.links.first_child[i] = INVALID;
            self.links.next_sibling[i] = INVALID;
            self.links.prev_sibling[i] = INVALID;
            self.flags[i] = NodeFlags::default();
            self.behaviors[i].clear();
            self.geometry.rect[i] = Rect::ZERO;
            self.geometry.extent[i] = [AxisExtent::ZERO; 2];
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.links.parent.push(INVALID);
            self.links.first_child.push(INVALID);
            self.links.next_sibling.push(INVALID);
            self.links.prev_sibling.push(INVALID);
            self.links.generation.push(0);
            self.flags.push(NodeFlags::default());
            self.behaviors.push(Vec::new());
            self.geometry.rect.push(Rect::ZERO);
            self.geometry.extent.push([AxisExtent::ZERO; 2]);
            idx
        };

        self.dirty.mark(idx, dirty::LAYOUT);
        self.links.id_at(idx)
    }

    /// Destroys a node, dropping its behaviors and freeing its slot for reuse.
    ///
    /// The former parent is marked dirty, since its remaining children need
    /// rearranging.
    ///
    /// # Panics
    ///
    /// Panics if the node has children (remove them first) or if the handle
    /// is stale.
    pub fn destroy_node(&mut self, id: NodeId) {
        self.links.validate(id);
        let idx = id.idx;
        assert!(
            self.links.first_child[idx as usize] == INVALID,
            "cannot destroy node with children"
        );

        let p = self.links.parent[idx as usize];
        if p != INVALID {
            self.unlink_from_parent(idx);
            self.dirty.mark(p, dirty::LAYOUT);
        }

        self.dirty.remove_key(idx);
        self.behaviors[idx as usize].clear();

        // Bump generation so old handles immediately fail validation.
        self.links.generation[idx as usize] += 1;
        self.free_list.push(idx);
    }

    /// Returns whether the given handle refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        (id.idx < self.len)
            && self.links.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    /// Returns the number of live nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.len as usize - self.free_list.len()
    }

    // -- Topology API --

    /// Adds `child` as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, if `child` already has a parent, or
    /// if `parent` lies inside `child`'s subtree.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.links.validate(parent);
        self.links.validate(child);
        assert!(
            self.links.parent[child.idx as usize] == INVALID,
            "child already has a parent"
        );
        self.assert_not_in_subtree(parent.idx, child.idx);

        self.append_child(parent.idx, child.idx);
        self.dirty.mark(parent.idx, dirty::LAYOUT);
        self.dirty.mark(child.idx, dirty::LAYOUT);
    }

    /// Removes `child` from its current parent.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the node has no parent.
    pub fn remove_from_parent(&mut self, child: NodeId) {
        self.links.validate(child);
        let c = child.idx;
        let p = self.links.parent[c as usize];
        assert!(p != INVALID, "node has no parent");

        self.unlink_from_parent(c);
        self.dirty.mark(p, dirty::LAYOUT);
        self.dirty.mark(c, dirty::LAYOUT);
    }

    /// Moves `child` to be the last child of `new_parent`.
    ///
    /// If `child` already has a parent, it is removed first.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale or if `new_parent` lies inside
    /// `child`'s subtree.
    pub fn reparent(&mut self, child: NodeId, new_parent: NodeId) {
        self.links.validate(child);
        self.links.validate(new_parent);
        self.assert_not_in_subtree(new_parent.idx, child.idx);

        let old_p = self.links.parent[child.idx as usize];
        if old_p != INVALID {
            self.unlink_from_parent(child.idx);
            self.dirty.mark(old_p, dirty::LAYOUT);
        }

        self.append_child(new_parent.idx, child.idx);
        self.dirty.mark(new_parent.idx, dirty::LAYOUT);
        self.dirty.mark(child.idx, dirty::LAYOUT);
    }

    /// Inserts `child` before `sibling` in the sibling list.
    ///
    /// `child` must not already have a parent. `sibling` must have a parent.
    ///
    /// # Panics
    ///
    /// Panics if handles are stale, `child` already has a parent, `sibling`
    /// has no parent, or the insertion would create a cycle.
    pub fn insert_before(&mut self, child: NodeId, sibling: NodeId) {
        self.links.validate(child);
        self.links.validate(sibling);
        let c = child.idx;
        let s = sibling.idx;
        assert!(
            self.links.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        let p = self.links.parent[s as usize];
        assert!(p != INVALID, "sibling has no parent");
        self.assert_not_in_subtree(p, c);

        let links = &mut self.links;
        links.parent[c as usize] = p;
        links.next_sibling[c as usize] = s;
        links.prev_sibling[c as usize] = links.prev_sibling[s as usize];

        if links.prev_sibling[s as usize] != INVALID {
            let prev = links.prev_sibling[s as usize];
            links.next_sibling[prev as usize] = c;
        } else {
            // `sibling` was the first child.
            links.first_child[p as usize] = c;
        }
        links.prev_sibling[s as usize] = c;

        self.dirty.mark(p, dirty::LAYOUT);
        self.dirty.mark(c, dirty::LAYOUT);
    }

    /// Returns the parent of a node, if any.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.links.validate(id);
        let p = self.links.parent[id.idx as usize];
        (p != INVALID).then(|| self.links.id_at(p))
    }

    /// Returns an iterator over the direct children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Children<'_> {
        self.links.validate(id);
        Children::new(&self.links, self.links.first_child[id.idx as usize])
    }

    /// Returns an iterator from the parent of `id` up to its root.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        self.links.validate(id);
        Ancestors::new(&self.links, id.idx)
    }

    /// Returns the number of ancestors of a node (0 for a root).
    #[must_use]
    pub fn depth(&self, id: NodeId) -> u32 {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "depth is bounded by the u32 slot count"
        )]
        let depth = self.ancestors(id).count() as u32;
        depth
    }

    /// Returns the root nodes (those with no parent).
    #[must_use]
    pub fn roots(&self) -> Vec<NodeId> {
        (0..self.len)
            .filter(|&idx| {
                self.links.parent[idx as usize] == INVALID && !self.free_list.contains(&idx)
            })
            .map(|idx| self.links.id_at(idx))
            .collect()
    }

    // -- Node state --

    /// Returns the flags of a node.
    #[must_use]
    pub fn flags(&self, id: NodeId) -> NodeFlags {
        self.links.validate(id);
        self.flags[id.idx as usize]
    }

    /// Sets the flags of a node.
    pub fn set_flags(&mut self, id: NodeId, flags: NodeFlags) {
        self.links.validate(id);
        self.flags[id.idx as usize] = flags;
        self.dirty.mark(id.idx, dirty::LAYOUT);
    }

    /// Sets only the `active` flag of a node.
    pub fn set_active(&mut self, id: NodeId, active: bool) {
        let flags = NodeFlags {
            active,
            ..self.flags(id)
        };
        self.set_flags(id, flags);
    }

    /// Returns whether the node and all of its ancestors are active.
    #[must_use]
    pub fn is_active_in_hierarchy(&self, id: NodeId) -> bool {
        self.links.validate(id);
        self.flags[id.idx as usize].active
            && self.ancestors(id).all(|a| self.flags[a.idx as usize].active)
    }

    // -- Behavior API --

    /// Attaches a behavior to a node, after any already attached.
    ///
    /// The behavior starts enabled.
    pub fn attach_behavior(&mut self, node: NodeId, behavior: Box<dyn LayoutBehavior>) -> BehaviorId {
        self.links.validate(node);
        let list = &mut self.behaviors[node.idx as usize];
        #[expect(
            clippy::cast_possible_truncation,
            reason = "per-node behavior count fits in u32"
        )]
        let slot = list.len() as u32;
        list.push(Some(Attached::new(behavior)));
        self.dirty.mark(node.idx, dirty::LAYOUT);
        BehaviorId { node, slot }
    }

    /// Detaches a behavior and returns it, or `None` if it was already
    /// detached. Other behaviors keep their ids and order.
    pub fn detach_behavior(&mut self, id: BehaviorId) -> Option<Box<dyn LayoutBehavior>> {
        let attached = self.attached_mut(id).take()?;
        self.dirty.mark(id.node.idx, dirty::LAYOUT);
        Some(attached.behavior)
    }

    /// Enables or disables a behavior. Disabled behaviors are invisible to
    /// layout.
    ///
    /// # Panics
    ///
    /// Panics if the node is stale or the behavior was detached.
    pub fn set_behavior_enabled(&mut self, id: BehaviorId, enabled: bool) {
        let attached = self
            .attached_mut(id)
            .as_mut()
            .expect("behavior was detached");
        if attached.enabled != enabled {
            attached.enabled = enabled;
            self.dirty.mark(id.node.idx, dirty::LAYOUT);
        }
    }

    /// Returns whether a behavior is attached and enabled.
    #[must_use]
    pub fn is_behavior_enabled(&self, id: BehaviorId) -> bool {
        self.attached(id).is_some_and(|a| a.enabled)
    }

    /// Returns the capabilities of an attached behavior.
    #[must_use]
    pub fn capabilities(&self, id: BehaviorId) -> Option<Capabilities> {
        self.attached(id).map(|a| a.capabilities)
    }

    /// Returns the behaviors on `node` that answer to `capability`, in
    /// attachment order. Disabled behaviors are included.
    pub fn behaviors_with(
        &self,
        node: NodeId,
        capability: Capability,
    ) -> impl Iterator<Item = BehaviorId> + '_ {
        self.links.validate(node);
        self.behaviors[node.idx as usize]
            .iter()
            .enumerate()
            .filter_map(move |(slot, a)| {
                let a = a.as_ref()?;
                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "per-node behavior count fits in u32"
                )]
                let slot = slot as u32;
                a.capabilities
                    .has(capability)
                    .then_some(BehaviorId { node, slot })
            })
    }

    /// Returns whether `node` is active in hierarchy and hosts an enabled
    /// behavior answering to `capability`.
    #[must_use]
    pub fn has_active(&self, node: NodeId, capability: Capability) -> bool {
        self.links.validate(node);
        self.has_enabled_at(node.idx, capability) && self.is_active_in_hierarchy(node)
    }

    // -- Geometry API --

    /// Returns the rect of a node in its parent's space.
    #[must_use]
    pub fn rect(&self, id: NodeId) -> Rect {
        self.links.validate(id);
        self.geometry.rect[id.idx as usize]
    }

    /// Returns the size of a node.
    #[must_use]
    pub fn size(&self, id: NodeId) -> Size {
        self.rect(id).size()
    }

    /// Resizes a node from the host side, keeping its origin.
    ///
    /// Use this for sizes no layout behavior owns, such as a canvas root that
    /// follows the window.
    pub fn set_size(&mut self, id: NodeId, size: Size) {
        self.links.validate(id);
        let rect = &mut self.geometry.rect[id.idx as usize];
        *rect = rect.with_size(size);
        self.dirty.mark(id.idx, dirty::LAYOUT);
    }

    /// Returns the extent a node's calculators published along `axis`.
    #[must_use]
    pub fn extent(&self, id: NodeId, axis: Axis) -> AxisExtent {
        self.links.validate(id);
        self.geometry.extent[id.idx as usize][axis.index()]
    }

    // -- Dirty tracking --

    /// Drains the [`LAYOUT`](dirty::LAYOUT) channel and returns the live
    /// nodes whose layout inputs changed, in deterministic order.
    pub fn drain_layout_dirty(&mut self) -> Vec<NodeId> {
        let drained: Vec<u32> = self
            .dirty
            .drain(dirty::LAYOUT)
            .deterministic()
            .run()
            .collect();
        drained
            .into_iter()
            .filter(|&idx| idx < self.len && !self.free_list.contains(&idx))
            .map(|idx| self.links.id_at(idx))
            .collect()
    }

    // -- Internal helpers --

    /// Returns whether slot `idx` hosts an enabled behavior answering to
    /// `capability`, ignoring hierarchy activity.
    pub(crate) fn has_enabled_at(&self, idx: u32, capability: Capability) -> bool {
        self.behaviors[idx as usize]
            .iter()
            .flatten()
            .any(|a| a.enabled && a.capabilities.has(capability))
    }

    fn attached(&self, id: BehaviorId) -> Option<&Attached> {
        self.links.validate(id.node);
        self.behaviors[id.node.idx as usize]
            .get(id.slot as usize)?
            .as_ref()
    }

    fn attached_mut(&mut self, id: BehaviorId) -> &mut Option<Attached> {
        self.links.validate(id.node);
        self.behaviors[id.node.idx as usize]
            .get_mut(id.slot as usize)
            .expect("behavior slot out of range")
    }

    /// Links `c` as the last child of `p`.
    fn append_child(&mut self, p: u32, c: u32) {
        let links = &mut self.links;
        links.parent[c as usize] = p;
        links.prev_sibling[c as usize] = INVALID;
        links.next_sibling[c as usize] = INVALID;

        if links.first_child[p as usize] == INVALID {
            links.first_child[p as usize] = c;
        } else {
            // Walk to last child.
            let mut last = links.first_child[p as usize];
            while links.next_sibling[last as usize] != INVALID {
                last = links.next_sibling[last as usize];
            }
            links.next_sibling[last as usize] = c;
            links.prev_sibling[c as usize] = last;
        }
    }

    /// Removes `idx` from its parent's child list without touching dirty state.
    fn unlink_from_parent(&mut self, idx: u32) {
        let links = &mut self.links;
        let p = links.parent[idx as usize];
        let prev = links.prev_sibling[idx as usize];
        let next = links.next_sibling[idx as usize];

        if prev != INVALID {
            links.next_sibling[prev as usize] = next;
        } else {
            // Was first child.
            links.first_child[p as usize] = next;
        }

        if next != INVALID {
            links.prev_sibling[next as usize] = prev;
        }

        links.parent[idx as usize] = INVALID;
        links.prev_sibling[idx as usize] = INVALID;
        links.next_sibling[idx as usize] = INVALID;
    }

    /// Panics if `node` is `root` or one of its descendants.
    fn assert_not_in_subtree(&self, node: u32, root: u32) {
        let mut cur = node;
        while cur != INVALID {
            assert!(cur != root, "node cannot be attached inside its own subtree");
            cur = self.links.parent[cur as usize];
        }
    }
}
