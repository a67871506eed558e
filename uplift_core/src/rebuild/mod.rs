// Copyright 2026 the Uplift Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deferred layout rebuilds.
//!
//! A rebuild request travels through three stages:
//!
//! 1. [`resolve_root`] turns a changed node into the node whose sub-tree
//!    must be rebuilt, or decides nothing needs to happen.
//! 2. [`LayoutRebuilder::mark_for_rebuild`] binds a pooled [`RebuildUnit`] to
//!    that root and submits it to a [`RebuildRegistry`]. Redundant units go
//!    straight back to the pool.
//! 3. When the registry runs the unit, [`LayoutRebuilder::rebuild`] walks the
//!    sub-tree (calculation bottom-up, then control top-down, per axis) and
//!    [`LayoutRebuilder::complete`] hands the unit back.
//!
//! [`LayoutRebuilder::force_rebuild_immediate`] skips the registry and runs
//! stage 3 on the spot.

mod pool;
mod resolve;
mod unit;
mod walk;

use alloc::vec::Vec;

pub use pool::{PoolConfig, UnitPool};
pub use resolve::resolve_root;
pub use unit::{RebuildKey, RebuildUnit};
pub use walk::RebuildStats;

use crate::node::{NodeId, NodeTree};
use crate::phase::UpdatePhase;
use crate::registry::{RebuildRegistry, Submission};
use crate::trace::{MarkEvent, Tracer};

/// Configuration for a [`LayoutRebuilder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RebuilderConfig {
    /// Unit pool settings.
    pub pool: PoolConfig,
    /// Initial capacity of the traversal scratch buffer, in behavior slots.
    pub scratch_capacity: usize,
}

impl RebuilderConfig {
    /// Default pool, room for 32 behaviors along one root-to-leaf path.
    pub const DEFAULT: Self = Self {
        pool: PoolConfig::DEFAULT,
        scratch_capacity: 32,
    };
}

impl Default for RebuilderConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// What [`LayoutRebuilder::mark_for_rebuild`] did with a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkOutcome {
    /// A unit for the root is now pending in the registry.
    Submitted(NodeId),
    /// The registry already had a unit for the root; the new one was
    /// released.
    Coalesced(NodeId),
    /// The registry refused the unit (for example while it is performing
    /// layout); the unit was released.
    Rejected(NodeId),
    /// Nothing arranges the node, so there is nothing to rebuild.
    Dropped,
    /// The node was already destroyed.
    Stale,
}

impl MarkOutcome {
    /// The resolved root, if resolution got that far.
    #[must_use]
    pub fn root(self) -> Option<NodeId> {
        match self {
            Self::Submitted(root) | Self::Coalesced(root) | Self::Rejected(root) => Some(root),
            Self::Dropped | Self::Stale => None,
        }
    }
}

/// Owns the unit pool and traversal scratch space, and exposes the rebuild
/// entry points.
///
/// One rebuilder serves one update thread. It holds no reference to the tree
/// or the registry; both are passed to each call.
#[derive(Debug)]
pub struct LayoutRebuilder {
    pool: UnitPool,
    scratch: Vec<u32>,
}

impl Default for LayoutRebuilder {
    fn default() -> Self {
        Self::new(RebuilderConfig::DEFAULT)
    }
}

impl LayoutRebuilder {
    /// Creates a rebuilder.
    #[must_use]
    pub fn new(config: RebuilderConfig) -> Self {
        Self {
            pool: UnitPool::new(config.pool),
            scratch: Vec::with_capacity(config.scratch_capacity),
        }
    }

    /// Requests a deferred rebuild for whatever sub-tree `node` belongs to.
    ///
    /// Tolerates destroyed nodes. Every unit acquired here either ends up in
    /// the registry or is back in the pool when this returns.
    pub fn mark_for_rebuild<R>(
        &mut self,
        tree: &NodeTree,
        registry: &mut R,
        node: NodeId,
    ) -> MarkOutcome
    where
        R: RebuildRegistry + ?Sized,
    {
        if !tree.is_alive(node) {
            return MarkOutcome::Stale;
        }
        let Some(root) = resolve_root(tree, node) else {
            return MarkOutcome::Dropped;
        };

        let unit = self.pool.acquire_bound(root);
        match registry.submit(unit) {
            Submission::Accepted => MarkOutcome::Submitted(root),
            Submission::Duplicate(unit) => {
                self.pool.release(unit);
                MarkOutcome::Coalesced(root)
            }
            Submission::Rejected(unit) => {
                self.pool.release(unit);
                MarkOutcome::Rejected(root)
            }
        }
    }

    /// Drains the tree's layout dirt and marks every changed node.
    ///
    /// Returns how many units were newly submitted.
    pub fn mark_dirty_nodes<R>(
        &mut self,
        tree: &mut NodeTree,
        registry: &mut R,
        tracer: &mut Tracer<'_>,
    ) -> usize
    where
        R: RebuildRegistry + ?Sized,
    {
        let mut submitted = 0;
        for node in tree.drain_layout_dirty() {
            let outcome = self.mark_for_rebuild(tree, registry, node);
            if matches!(outcome, MarkOutcome::Submitted(_)) {
                submitted += 1;
            }
            tracer.mark(&MarkEvent {
                frame_index: registry.frame_index(),
                node,
                outcome,
            });
        }
        submitted
    }

    /// Runs `phase` of `unit`.
    ///
    /// Only [`UpdatePhase::Layout`] does anything. Returns `None` for other
    /// phases, for units whose node is gone, and for roots that are not
    /// [active in hierarchy](NodeTree::is_active_in_hierarchy).
    pub fn rebuild(
        &mut self,
        tree: &mut NodeTree,
        unit: &RebuildUnit,
        phase: UpdatePhase,
    ) -> Option<RebuildStats> {
        if phase != UpdatePhase::Layout {
            return None;
        }
        let root = unit
            .target()
            .filter(|&n| tree.is_alive(n) && tree.is_active_in_hierarchy(n))?;
        Some(walk::rebuild_subtree(tree, root, &mut self.scratch))
    }

    /// Rebuilds the sub-tree at `node` right now, bypassing any registry.
    ///
    /// A destroyed `node` is a no-op.
    pub fn force_rebuild_immediate(&mut self, tree: &mut NodeTree, node: NodeId) -> RebuildStats {
        if !tree.is_alive(node) {
            return RebuildStats::default();
        }
        let unit = self.pool.acquire_bound(node);
        let stats = self
            .rebuild(tree, &unit, UpdatePhase::Layout)
            .unwrap_or_default();
        self.pool.release(unit);
        stats
    }

    /// Reports `unit` as finished to `registry`, then returns it to the pool.
    pub fn complete<R>(&mut self, registry: &mut R, unit: RebuildUnit)
    where
        R: RebuildRegistry + ?Sized,
    {
        registry.unit_completed(&unit);
        self.pool.release(unit);
    }

    /// The unit pool.
    #[must_use]
    pub fn pool(&self) -> &UnitPool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::vec;

    use kurbo::{Rect, Size};

    use super::*;
    use crate::axis::{Axis, AxisExtent};
    use crate::node::{Capabilities, LayoutBehavior, LayoutCx};

    /// Accepts everything, deduplicating by key.
    #[derive(Default)]
    struct VecRegistry {
        pending: Vec<RebuildUnit>,
        completed: Vec<RebuildKey>,
        closed: bool,
    }

    impl RebuildRegistry for VecRegistry {
        fn submit(&mut self, unit: RebuildUnit) -> Submission {
            if self.closed {
                Submission::Rejected(unit)
            } else if self.pending.contains(&unit) {
                Submission::Duplicate(unit)
            } else {
                self.pending.push(unit);
                Submission::Accepted
            }
        }

        fn unit_completed(&mut self, unit: &RebuildUnit) {
            self.completed.push(unit.key());
        }
    }

    /// Publishes a fixed size on both axes.
    struct Fixed(Size);

    impl LayoutBehavior for Fixed {
        fn capabilities(&self) -> Capabilities {
            Capabilities::CALCULATOR
        }

        fn calculate(&mut self, axis: Axis, cx: &mut LayoutCx<'_>) {
            cx.set_extent(axis, AxisExtent::fixed(axis.of_size(self.0)));
        }
    }

    /// Stacks children vertically, stretching them horizontally.
    struct Column;

    impl LayoutBehavior for Column {
        fn capabilities(&self) -> Capabilities {
            Capabilities::CALCULATOR | Capabilities::CONTROLLER | Capabilities::GROUP
        }

        fn calculate(&mut self, axis: Axis, cx: &mut LayoutCx<'_>) {
            let mut total = 0.0_f64;
            for child in cx.children() {
                let preferred = cx.extent(child, axis).preferred;
                total = match axis {
                    Axis::Horizontal => total.max(preferred),
                    Axis::Vertical => total + preferred,
                };
            }
            cx.set_extent(axis, AxisExtent::fixed(total));
        }

        fn control(&mut self, axis: Axis, cx: &mut LayoutCx<'_>) {
            let (_, own) = axis.span(cx.rect(cx.node()));
            let children: Vec<_> = cx.children().collect();
            let mut offset = 0.0;
            for child in children {
                match axis {
                    Axis::Horizontal => cx.set_child_span(child, axis, 0.0, own),
                    Axis::Vertical => {
                        let len = cx.extent(child, axis).preferred;
                        cx.set_child_span(child, axis, offset, len);
                        offset += len;
                    }
                }
            }
        }
    }

    /// Column root of 100x100 holding 10x20 and 30x40 leaves.
    fn column(tree: &mut NodeTree) -> (NodeId, NodeId, NodeId) {
        let root = tree.create_node();
        let a = tree.create_node();
        let b = tree.create_node();
        tree.add_child(root, a);
        tree.add_child(root, b);
        tree.set_size(root, Size::new(100.0, 100.0));
        tree.attach_behavior(root, Box::new(Column));
        tree.attach_behavior(a, Box::new(Fixed(Size::new(10.0, 20.0))));
        tree.attach_behavior(b, Box::new(Fixed(Size::new(30.0, 40.0))));
        (root, a, b)
    }

    #[test]
    fn immediate_rebuild_lays_out_and_is_idempotent() {
        let mut tree = NodeTree::new();
        let (root, a, b) = column(&mut tree);
        let mut rebuilder = LayoutRebuilder::default();

        let stats = rebuilder.force_rebuild_immediate(&mut tree, root);
        assert_eq!(tree.rect(a), Rect::new(0.0, 0.0, 100.0, 20.0));
        assert_eq!(tree.rect(b), Rect::new(0.0, 20.0, 100.0, 60.0));
        assert_eq!(tree.extent(root, Axis::Vertical).preferred, 60.0);
        assert_eq!(stats.calculators_run, 6);
        assert_eq!(stats.controllers_run, 2);

        let again = rebuilder.force_rebuild_immediate(&mut tree, root);
        assert_eq!(again, stats);
        assert_eq!(tree.rect(a), Rect::new(0.0, 0.0, 100.0, 20.0));
        assert_eq!(tree.rect(b), Rect::new(0.0, 20.0, 100.0, 60.0));
        assert_eq!(rebuilder.pool().in_use(), 0);
    }

    #[test]
    fn marks_coalesce_on_the_resolved_root() {
        let mut tree = NodeTree::new();
        let (root, a, b) = column(&mut tree);
        let mut rebuilder = LayoutRebuilder::default();
        let mut registry = VecRegistry::default();

        assert_eq!(
            rebuilder.mark_for_rebuild(&tree, &mut registry, a),
            MarkOutcome::Submitted(root)
        );
        assert_eq!(
            rebuilder.mark_for_rebuild(&tree, &mut registry, b),
            MarkOutcome::Coalesced(root)
        );
        assert_eq!(
            rebuilder.mark_for_rebuild(&tree, &mut registry, root),
            MarkOutcome::Coalesced(root)
        );
        assert_eq!(registry.pending.len(), 1);
        assert_eq!(rebuilder.pool().in_use(), 1);
        assert_eq!(rebuilder.pool().free(), 1, "duplicates were recycled");
    }

    #[test]
    fn rejected_and_dropped_requests_leave_nothing_acquired() {
        let mut tree = NodeTree::new();
        let (root, a, _) = column(&mut tree);
        let lone = tree.create_node();
        let mut rebuilder = LayoutRebuilder::default();
        let mut registry = VecRegistry {
            closed: true,
            ..VecRegistry::default()
        };

        assert_eq!(
            rebuilder.mark_for_rebuild(&tree, &mut registry, a),
            MarkOutcome::Rejected(root)
        );
        assert_eq!(
            rebuilder.mark_for_rebuild(&tree, &mut registry, lone),
            MarkOutcome::Dropped
        );
        tree.destroy_node(lone);
        assert_eq!(
            rebuilder.mark_for_rebuild(&tree, &mut registry, lone),
            MarkOutcome::Stale
        );
        assert_eq!(rebuilder.pool().in_use(), 0);
        assert!(registry.pending.is_empty());
    }

    #[test]
    fn rebuild_only_acts_in_layout_phase() {
        let mut tree = NodeTree::new();
        let (root, a, _) = column(&mut tree);
        let mut rebuilder = LayoutRebuilder::default();
        let mut registry = VecRegistry::default();
        assert_eq!(
            rebuilder.mark_for_rebuild(&tree, &mut registry, root),
            MarkOutcome::Submitted(root)
        );
        let unit = registry.pending.pop().unwrap();

        for phase in [
            UpdatePhase::Prelayout,
            UpdatePhase::PostLayout,
            UpdatePhase::PreRender,
            UpdatePhase::LatePreRender,
        ] {
            assert_eq!(rebuilder.rebuild(&mut tree, &unit, phase), None);
        }
        assert_eq!(tree.rect(a), Rect::ZERO);
        assert!(rebuilder.rebuild(&mut tree, &unit, UpdatePhase::Layout).is_some());
        assert_eq!(tree.rect(a).width(), 100.0);

        rebuilder.complete(&mut registry, unit);
        assert_eq!(registry.completed, vec![RebuildKey::of(root)]);
        assert_eq!(rebuilder.pool().in_use(), 0);
    }

    #[test]
    fn destroyed_target_is_a_noop() {
        let mut tree = NodeTree::new();
        let (root, a, b) = column(&mut tree);
        let mut rebuilder = LayoutRebuilder::default();
        let mut registry = VecRegistry::default();
        let _ = rebuilder.mark_for_rebuild(&tree, &mut registry, root);
        let unit = registry.pending.pop().unwrap();

        tree.destroy_node(a);
        tree.destroy_node(b);
        tree.destroy_node(root);
        assert!(unit.is_destroyed(&tree));
        assert_eq!(rebuilder.rebuild(&mut tree, &unit, UpdatePhase::Layout), None);
        assert_eq!(
            rebuilder.force_rebuild_immediate(&mut tree, root),
            RebuildStats::default()
        );
        rebuilder.complete(&mut registry, unit);
        assert_eq!(rebuilder.pool().in_use(), 0);
    }

    #[test]
    fn inactive_root_is_not_rebuilt() {
        let mut tree = NodeTree::new();
        let (root, a, _) = column(&mut tree);
        let mut rebuilder = LayoutRebuilder::default();
        let mut registry = VecRegistry::default();
        let _ = rebuilder.mark_for_rebuild(&tree, &mut registry, root);
        let unit = registry.pending.pop().unwrap();

        tree.set_active(root, false);
        assert_eq!(rebuilder.rebuild(&mut tree, &unit, UpdatePhase::Layout), None);
        assert_eq!(tree.rect(a), Rect::ZERO);

        tree.set_active(root, true);
        assert!(rebuilder.rebuild(&mut tree, &unit, UpdatePhase::Layout).is_some());
        rebuilder.complete(&mut registry, unit);
    }

    #[test]
    fn dirty_sync_submits_once_per_root() {
        let mut tree = NodeTree::new();
        let (root, a, _) = column(&mut tree);
        let mut rebuilder = LayoutRebuilder::default();
        let mut registry = VecRegistry::default();
        let mut tracer = Tracer::none();

        // Construction dirtied every node; all resolve to the column.
        assert_eq!(rebuilder.mark_dirty_nodes(&mut tree, &mut registry, &mut tracer), 1);
        assert_eq!(registry.pending[0].target(), Some(root));
        assert_eq!(rebuilder.mark_dirty_nodes(&mut tree, &mut registry, &mut tracer), 0);

        let unit = registry.pending.pop().unwrap();
        rebuilder.complete(&mut registry, unit);

        tree.set_size(a, Size::new(5.0, 5.0));
        assert_eq!(rebuilder.mark_dirty_nodes(&mut tree, &mut registry, &mut tracer), 1);
        assert_eq!(registry.pending[0].target(), Some(root));
    }

    #[test]
    fn outcome_root_accessor() {
        let mut tree = NodeTree::new();
        let n = tree.create_node();
        assert_eq!(MarkOutcome::Coalesced(n).root(), Some(n));
        assert_eq!(MarkOutcome::Dropped.root(), None);
        assert_eq!(MarkOutcome::Stale.root(), None);
    }
}
