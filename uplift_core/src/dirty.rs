// Copyright 2026 the Uplift Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! [`NodeTree`](crate::node::NodeTree) records layout-relevant mutations in a
//! [`understory_dirty`] tracker. Marks are local-only: the dirty-root
//! resolver, not the tracker, decides how far up a change reaches.
//!
//! # Consumption
//!
//! [`LayoutRebuilder::mark_dirty_nodes`](crate::rebuild::LayoutRebuilder::mark_dirty_nodes)
//! drains [`LAYOUT`] once per update and turns each node into a rebuild
//! request. Geometry written by behaviors during a rebuild is never marked,
//! so a rebuild does not schedule itself again.

use understory_dirty::Channel;

/// Layout inputs of the node changed: topology, active state, behaviors, or
/// host-assigned size.
pub const LAYOUT: Channel = Channel::new(0);
