// Copyright 2026 the Uplift Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Two-pass layout traversal.
//!
//! For each [`Axis`], in order:
//!
//! 1. **Calculation** (post-order): a node with an active calculator or an
//!    active group behavior first recurses into its children, then runs its
//!    calculators. A node with neither is skipped along with its sub-tree.
//! 2. **Control** (pre-order): a node with active controllers runs its
//!    self-controllers, then its ordinary controllers, then recurses into its
//!    children. A node without controllers is skipped along with its
//!    sub-tree; deeper controllers are roots of their own rebuilds.
//!
//! Eligible behaviors are collected into a shared scratch buffer, one segment
//! per recursion depth, so each node is filtered once per pass and a rebuild
//! allocates nothing once the buffer has grown.

use alloc::vec::Vec;

use crate::axis::Axis;
use crate::node::{Capability, INVALID, LayoutBehavior, LayoutCx, NodeId, NodeTree, Role};

/// Work done by one rebuild, summed over both axes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RebuildStats {
    /// Node visits whose calculators ran.
    pub calculated: u32,
    /// Node visits whose controllers ran.
    pub controlled: u32,
    /// Calculator invocations.
    pub calculators_run: u32,
    /// Controller invocations, self-controllers included.
    pub controllers_run: u32,
}

impl core::ops::AddAssign for RebuildStats {
    fn add_assign(&mut self, rhs: Self) {
        self.calculated += rhs.calculated;
        self.controlled += rhs.controlled;
        self.calculators_run += rhs.calculators_run;
        self.controllers_run += rhs.controllers_run;
    }
}

/// Runs calculation and control for both axes over the sub-tree at `root`.
///
/// `root` must be alive. Nothing runs if it is inactive in hierarchy.
pub(crate) fn rebuild_subtree(
    tree: &mut NodeTree,
    root: NodeId,
    scratch: &mut Vec<u32>,
) -> RebuildStats {
    scratch.clear();
    let mut stats = RebuildStats::default();
    if !tree.is_active_in_hierarchy(root) {
        return stats;
    }

    for axis in Axis::ALL {
        calculate(tree, root.idx, axis, scratch, &mut stats);
        control(tree, root.idx, axis, scratch, &mut stats);
    }
    stats
}

fn calculate(
    tree: &mut NodeTree,
    idx: u32,
    axis: Axis,
    scratch: &mut Vec<u32>,
    stats: &mut RebuildStats,
) {
    let start = scratch.len();
    collect(tree, idx, Capability::Calculator, scratch);
    let end = scratch.len();
    if start == end && !tree.has_enabled_at(idx, Capability::Group) {
        return;
    }

    let mut child = tree.links.first_child[idx as usize];
    while child != INVALID {
        if tree.flags[child as usize].active {
            calculate(tree, child, axis, scratch, stats);
        }
        child = tree.links.next_sibling[child as usize];
    }

    if start != end {
        stats.calculated += 1;
        stats.calculators_run += invoke(tree, idx, Role::Calculate, &scratch[start..end], |b, cx| {
            b.calculate(axis, cx);
        });
    }
    scratch.truncate(start);
}

fn control(
    tree: &mut NodeTree,
    idx: u32,
    axis: Axis,
    scratch: &mut Vec<u32>,
    stats: &mut RebuildStats,
) {
    let start = scratch.len();
    collect(tree, idx, Capability::Controller, scratch);
    let end = scratch.len();
    if start == end {
        return;
    }

    stats.controlled += 1;
    for role in [Role::SelfControl, Role::Control] {
        stats.controllers_run += invoke(tree, idx, role, &scratch[start..end], |b, cx| {
            b.control(axis, cx);
        });
    }
    scratch.truncate(start);

    let mut child = tree.links.first_child[idx as usize];
    while child != INVALID {
        if tree.flags[child as usize].active {
            control(tree, child, axis, scratch, stats);
        }
        child = tree.links.next_sibling[child as usize];
    }
}

/// Appends the slots of enabled behaviors on `idx` answering to `capability`.
fn collect(tree: &NodeTree, idx: u32, capability: Capability, scratch: &mut Vec<u32>) {
    for (slot, attached) in tree.behaviors[idx as usize].iter().enumerate() {
        if let Some(a) = attached
            && a.enabled
            && a.capabilities.has(capability)
        {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "per-node behavior count fits in u32"
            )]
            scratch.push(slot as u32);
        }
    }
}

/// Calls `f` on each behavior in `slots` that fits `role`, returning how many
/// ran. For control roles, only behaviors of the matching tier run.
fn invoke(
    tree: &mut NodeTree,
    idx: u32,
    role: Role,
    slots: &[u32],
    mut f: impl FnMut(&mut dyn LayoutBehavior, &mut LayoutCx<'_>),
) -> u32 {
    let NodeTree {
        links,
        flags,
        behaviors,
        geometry,
        ..
    } = tree;

    let mut ran = 0;
    for &slot in slots {
        let Some(attached) = behaviors[idx as usize][slot as usize].as_mut() else {
            continue;
        };
        let is_self = attached.capabilities.has(Capability::SelfController);
        match role {
            Role::SelfControl if !is_self => continue,
            Role::Control if is_self => continue,
            _ => {}
        }
        let mut cx = LayoutCx::new(idx, role, links, flags, geometry);
        f(attached.behavior.as_mut(), &mut cx);
        ran += 1;
    }
    ran
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::rc::Rc;
    use alloc::vec;
    use core::cell::RefCell;

    use super::*;
    use crate::node::Capabilities;

    /// `(node label, "calc" | "ctrl", axis)`.
    type Log = Rc<RefCell<Vec<(&'static str, &'static str, Axis)>>>;

    struct Probe {
        label: &'static str,
        caps: Capabilities,
        log: Log,
    }

    impl LayoutBehavior for Probe {
        fn capabilities(&self) -> Capabilities {
            self.caps
        }

        fn calculate(&mut self, axis: Axis, _cx: &mut LayoutCx<'_>) {
            self.log.borrow_mut().push((self.label, "calc", axis));
        }

        fn control(&mut self, axis: Axis, _cx: &mut LayoutCx<'_>) {
            self.log.borrow_mut().push((self.label, "ctrl", axis));
        }
    }

    fn probe(
        tree: &mut NodeTree,
        node: NodeId,
        label: &'static str,
        caps: Capabilities,
        log: &Log,
    ) -> crate::node::BehaviorId {
        tree.attach_behavior(
            node,
            Box::new(Probe {
                label,
                caps,
                log: log.clone(),
            }),
        )
    }

    #[test]
    fn calculation_is_bottom_up_and_control_top_down() {
        let log = Log::default();
        let mut tree = NodeTree::new();
        let root = tree.create_node();
        let child = tree.create_node();
        tree.add_child(root, child);
        let both = Capabilities::CALCULATOR | Capabilities::CONTROLLER;
        probe(&mut tree, root, "root", both, &log);
        probe(&mut tree, child, "child", both, &log);

        let mut scratch = Vec::new();
        let stats = rebuild_subtree(&mut tree, root, &mut scratch);

        use Axis::{Horizontal as H, Vertical as V};
        assert_eq!(
            *log.borrow(),
            vec![
                ("child", "calc", H),
                ("root", "calc", H),
                ("root", "ctrl", H),
                ("child", "ctrl", H),
                ("child", "calc", V),
                ("root", "calc", V),
                ("root", "ctrl", V),
                ("child", "ctrl", V),
            ]
        );
        assert_eq!(stats.calculators_run, 4);
        assert_eq!(stats.controllers_run, 4);
        assert!(scratch.is_empty());
    }

    #[test]
    fn self_controllers_run_first() {
        let log = Log::default();
        let mut tree = NodeTree::new();
        let n = tree.create_node();
        probe(&mut tree, n, "ordinary", Capabilities::CONTROLLER, &log);
        probe(&mut tree, n, "self", Capabilities::SELF_CONTROLLER, &log);

        rebuild_subtree(&mut tree, n, &mut Vec::new());

        let labels: Vec<_> = log.borrow().iter().map(|e| (e.0, e.2)).collect();
        assert_eq!(
            labels,
            vec![
                ("self", Axis::Horizontal),
                ("ordinary", Axis::Horizontal),
                ("self", Axis::Vertical),
                ("ordinary", Axis::Vertical),
            ]
        );
    }

    #[test]
    fn calculation_skips_subtree_without_calculator_or_group() {
        let log = Log::default();
        let mut tree = NodeTree::new();
        let root = tree.create_node();
        let middle = tree.create_node();
        let leaf = tree.create_node();
        tree.add_child(root, middle);
        tree.add_child(middle, leaf);
        probe(&mut tree, root, "root", Capabilities::GROUP, &log);
        probe(&mut tree, leaf, "leaf", Capabilities::CALCULATOR, &log);

        rebuild_subtree(&mut tree, root, &mut Vec::new());
        assert!(log.borrow().is_empty(), "middle has no participant");
    }

    #[test]
    fn group_forces_calculation_descent_but_not_control() {
        let log = Log::default();
        let mut tree = NodeTree::new();
        let root = tree.create_node();
        let child = tree.create_node();
        tree.add_child(root, child);
        probe(&mut tree, root, "root", Capabilities::GROUP, &log);
        probe(
            &mut tree,
            child,
            "child",
            Capabilities::CALCULATOR | Capabilities::CONTROLLER,
            &log,
        );

        rebuild_subtree(&mut tree, root, &mut Vec::new());
        let ops: Vec<_> = log.borrow().iter().map(|e| e.1).collect();
        assert_eq!(ops, vec!["calc", "calc"], "controls never reached");
    }

    #[test]
    fn disabled_behaviors_and_inactive_nodes_are_skipped() {
        let log = Log::default();
        let mut tree = NodeTree::new();
        let root = tree.create_node();
        let on = tree.create_node();
        let off = tree.create_node();
        tree.add_child(root, on);
        tree.add_child(root, off);
        let both = Capabilities::CALCULATOR | Capabilities::CONTROLLER | Capabilities::GROUP;
        probe(&mut tree, root, "root", both, &log);
        let muted = probe(&mut tree, root, "muted", both, &log);
        probe(&mut tree, on, "on", both, &log);
        probe(&mut tree, off, "off", both, &log);
        tree.set_behavior_enabled(muted, false);
        tree.set_active(off, false);

        rebuild_subtree(&mut tree, root, &mut Vec::new());
        let labels: Vec<_> = log.borrow().iter().map(|e| e.0).collect();
        assert!(!labels.contains(&"muted"));
        assert!(!labels.contains(&"off"));
        assert_eq!(labels.iter().filter(|l| **l == "on").count(), 4);
    }

    #[test]
    fn inactive_root_does_nothing() {
        let log = Log::default();
        let mut tree = NodeTree::new();
        let root = tree.create_node();
        probe(&mut tree, root, "root", Capabilities::CONTROLLER, &log);
        tree.set_active(root, false);

        let stats = rebuild_subtree(&mut tree, root, &mut Vec::new());
        assert_eq!(stats, RebuildStats::default());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn siblings_follow_child_order() {
        let log = Log::default();
        let mut tree = NodeTree::new();
        let root = tree.create_node();
        let a = tree.create_node();
        let b = tree.create_node();
        tree.add_child(root, b);
        tree.insert_before(a, b);
        probe(&mut tree, root, "root", Capabilities::CONTROLLER, &log);
        probe(&mut tree, a, "a", Capabilities::CONTROLLER, &log);
        probe(&mut tree, b, "b", Capabilities::CONTROLLER, &log);

        rebuild_subtree(&mut tree, root, &mut Vec::new());
        let horizontal: Vec<_> = log
            .borrow()
            .iter()
            .filter(|e| e.2 == Axis::Horizontal)
            .map(|e| e.0)
            .collect();
        assert_eq!(horizontal, vec!["root", "a", "b"]);
    }

    #[test]
    fn behaviors_see_only_active_children() {
        struct Count(Rc<RefCell<Vec<(usize, usize)>>>);

        impl LayoutBehavior for Count {
            fn capabilities(&self) -> Capabilities {
                Capabilities::CALCULATOR | Capabilities::GROUP
            }

            fn calculate(&mut self, _axis: Axis, cx: &mut LayoutCx<'_>) {
                let all = cx.children().count();
                let active = cx.active_children().count();
                self.0.borrow_mut().push((all, active));
            }
        }

        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut tree = NodeTree::new();
        let root = tree.create_node();
        let kids: Vec<_> = (0..3).map(|_| tree.create_node()).collect();
        for &k in &kids {
            tree.add_child(root, k);
        }
        tree.set_active(kids[1], false);
        tree.attach_behavior(root, Box::new(Count(seen.clone())));

        rebuild_subtree(&mut tree, root, &mut Vec::new());
        assert_eq!(*seen.borrow(), vec![(3, 2), (3, 2)]);
    }
}
