// Copyright 2026 the Uplift Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deferred layout rebuilds for retained-mode UI trees.
//!
//! `uplift_core` discovers which parts of a node tree need their layout
//! recomputed, deduplicates those requests across a frame, and runs pluggable
//! layout behaviors over each affected sub-tree in dependency order. It is
//! `no_std` compatible (with `alloc`) and stores nodes in struct-of-arrays
//! form addressed by generational handles.
//!
//! How a behavior turns child sizes into its own size, or its own size into
//! child positions, is up to the behavior; this crate decides which behaviors
//! run, in what order, and how often.
//!
//! # Architecture
//!
//! ```text
//!   NodeTree mutation ──► LAYOUT dirty channel
//!                                │
//!                                ▼
//!   LayoutRebuilder::mark_dirty_nodes ──► resolve_root ──► RebuildUnit
//!                                                              │
//!                 ┌────────────────────────────────────────────┘
//!                 ▼
//!   RebuildRegistry::submit (dedup by RebuildKey)
//!                 │
//!                 ▼
//!   RebuildQueue::perform_layout
//!       for each root, shallowest first:
//!         Horizontal: calculate (bottom-up) ► control (top-down)
//!         Vertical:   calculate (bottom-up) ► control (top-down)
//!                 │
//!                 ▼
//!   unit_completed ──► UnitPool
//! ```
//!
//! **[`node`]**: Struct-of-arrays node tree with generational handles.
//! Behaviors implementing [`LayoutBehavior`](node::LayoutBehavior) attach to
//! nodes and declare their [`Capabilities`](node::Capabilities).
//!
//! **[`dirty`]**: The LAYOUT dirty channel. Tree mutations mark it;
//! the rebuilder drains it once per update.
//!
//! **[`rebuild`]**: Rebuild units, their pool, the dirty-root resolver, the
//! two-pass walker, and the [`LayoutRebuilder`](rebuild::LayoutRebuilder)
//! that ties them together.
//!
//! **[`registry`]**: The [`RebuildRegistry`](registry::RebuildRegistry)
//! contract and the [`RebuildQueue`](registry::RebuildQueue) that runs
//! pending rebuilds once per frame.
//!
//! **[`axis`]**: Layout axes and per-axis size inputs.
//!
//! **[`phase`]**: Update phases multiplexed through the same handles.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types,
//! with a [`Tracer`](trace::Tracer) wrapper that compiles away when the
//! `trace` feature is off.
//!
//! # Example
//!
//! ```
//! use kurbo::Size;
//! use uplift_core::axis::Axis;
//! use uplift_core::node::{Capabilities, LayoutBehavior, LayoutCx, NodeTree};
//! use uplift_core::rebuild::LayoutRebuilder;
//! use uplift_core::registry::RebuildQueue;
//! use uplift_core::trace::Tracer;
//!
//! /// Gives every child the parent's full rect.
//! struct Fill;
//!
//! impl LayoutBehavior for Fill {
//!     fn capabilities(&self) -> Capabilities {
//!         Capabilities::CONTROLLER | Capabilities::GROUP
//!     }
//!
//!     fn control(&mut self, axis: Axis, cx: &mut LayoutCx<'_>) {
//!         let (_, len) = axis.span(cx.rect(cx.node()));
//!         let children: Vec<_> = cx.children().collect();
//!         for child in children {
//!             cx.set_child_span(child, axis, 0.0, len);
//!         }
//!     }
//! }
//!
//! let mut tree = NodeTree::new();
//! let window = tree.create_node();
//! let panel = tree.create_node();
//! tree.add_child(window, panel);
//! tree.attach_behavior(window, Box::new(Fill));
//! tree.set_size(window, Size::new(640.0, 480.0));
//!
//! let mut rebuilder = LayoutRebuilder::default();
//! let mut queue = RebuildQueue::new();
//! rebuilder.mark_dirty_nodes(&mut tree, &mut queue, &mut Tracer::none());
//! let report = queue.perform_layout(&mut tree, &mut rebuilder, &mut Tracer::none());
//!
//! assert_eq!(report.rebuilt, 1);
//! assert_eq!(tree.size(panel), Size::new(640.0, 480.0));
//! ```
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod axis;
pub mod dirty;
pub mod node;
pub mod phase;
pub mod rebuild;
pub mod registry;
pub mod trace;
