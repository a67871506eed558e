// Copyright 2026 the Uplift Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node tree data model.
//!
//! A *node* is an element of the scene graph. Each node has:
//!
//! - An identity ([`NodeId`]): a generational handle that becomes stale when
//!   the node is destroyed, so rebuild requests outliving their node are
//!   detected instead of touching a recycled slot.
//! - Topology: parent, first-child, and sibling links forming an ordered tree.
//! - **Local state** set by the caller: [`flags`](NodeTree::set_flags)
//!   (active, layout boundary) and attached
//!   [behaviors](NodeTree::attach_behavior).
//! - **Layout outputs** written by behaviors during a rebuild: a per-axis
//!   [`AxisExtent`](crate::axis::AxisExtent) published by calculators and a
//!   [`rect`](NodeTree::rect) assigned by controllers.
//!
//! # Behaviors and capabilities
//!
//! Behaviors implement [`LayoutBehavior`] and advertise their roles through
//! [`Capabilities`]. Queries go through
//! [`behaviors_with`](NodeTree::behaviors_with) and
//! [`has_active`](NodeTree::has_active) instead of downcasting.
//!
//! # Dirty tracking
//!
//! Mutations that change layout inputs mark the
//! [`LAYOUT`](crate::dirty::LAYOUT) channel for the affected node. Marks are
//! local; finding the node that must actually be rebuilt is the job of the
//! [dirty-root resolver](crate::rebuild::resolve_root).

mod behavior;
mod cx;
mod id;
mod store;
mod traverse;

pub use behavior::{Capabilities, Capability, LayoutBehavior};
pub use cx::LayoutCx;
pub use id::{BehaviorId, INVALID, NodeId};
pub use store::{NodeFlags, NodeTree};
pub use traverse::{Ancestors, Children};

pub(crate) use cx::Role;
