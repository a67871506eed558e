// Copyright 2026 the Uplift Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout participant capabilities and the behavior trait.

use alloc::boxed::Box;
use core::fmt;

use super::cx::LayoutCx;
use crate::axis::Axis;

/// A single layout capability a behavior may advertise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Computes the node's own preferred size, bottom-up.
    Calculator,
    /// Assigns final size/position to the node and/or its children, top-down.
    ///
    /// Self-controllers also answer to this capability.
    Controller,
    /// A controller that only ever touches its own node.
    SelfController,
    /// Arranges the node's children as a unit.
    Group,
}

/// A set of [`Capability`] values.
///
/// [`SELF_CONTROLLER`](Self::SELF_CONTROLLER) includes the controller bit, so
/// a self-controller is found by both controller queries.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Capabilities(u8);

impl Capabilities {
    /// No capabilities.
    pub const NONE: Self = Self(0);
    /// See [`Capability::Calculator`].
    pub const CALCULATOR: Self = Self(1 << 0);
    /// See [`Capability::Controller`].
    pub const CONTROLLER: Self = Self(1 << 1);
    /// See [`Capability::SelfController`].
    pub const SELF_CONTROLLER: Self = Self((1 << 1) | (1 << 2));
    /// See [`Capability::Group`].
    pub const GROUP: Self = Self(1 << 3);

    /// Returns the union of two sets.
    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Returns whether every bit of `other` is set in `self`.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns whether the set answers to `capability`.
    #[inline]
    #[must_use]
    pub const fn has(self, capability: Capability) -> bool {
        self.contains(match capability {
            Capability::Calculator => Self::CALCULATOR,
            Capability::Controller => Self::CONTROLLER,
            Capability::SelfController => Self::SELF_CONTROLLER,
            Capability::Group => Self::GROUP,
        })
    }
}

impl core::ops::BitOr for Capabilities {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();
        if self.has(Capability::Calculator) {
            set.entry(&Capability::Calculator);
        }
        if self.has(Capability::SelfController) {
            set.entry(&Capability::SelfController);
        } else if self.has(Capability::Controller) {
            set.entry(&Capability::Controller);
        }
        if self.has(Capability::Group) {
            set.entry(&Capability::Group);
        }
        set.finish()
    }
}

/// A pluggable layout policy attached to a node.
///
/// The rebuilder calls [`calculate`](Self::calculate) during the bottom-up
/// pass and [`control`](Self::control) during the top-down pass, once per
/// axis, and only when [`capabilities`](Self::capabilities) advertises the
/// matching role. The capability set is read at attach time and must not
/// change afterwards.
pub trait LayoutBehavior {
    /// The roles this behavior plays.
    fn capabilities(&self) -> Capabilities;

    /// Publishes the node's [`AxisExtent`](crate::axis::AxisExtent) along
    /// `axis`. Children have already been calculated.
    fn calculate(&mut self, axis: Axis, cx: &mut LayoutCx<'_>) {
        _ = (axis, cx);
    }

    /// Assigns final spans along `axis`. The node's parent has already been
    /// controlled.
    fn control(&mut self, axis: Axis, cx: &mut LayoutCx<'_>) {
        _ = (axis, cx);
    }
}

/// A behavior stored on a node, with its cached capabilities and enable flag.
pub(crate) struct Attached {
    pub(crate) behavior: Box<dyn LayoutBehavior>,
    pub(crate) capabilities: Capabilities,
    pub(crate) enabled: bool,
}

impl Attached {
    pub(crate) fn new(behavior: Box<dyn LayoutBehavior>) -> Self {
        Self {
            capabilities: behavior.capabilities(),
            behavior,
            enabled: true,
        }
    }
}

impl fmt::Debug for Attached {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attached")
            .field("capabilities", &self.capabilities)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_controller_is_a_controller() {
        let caps = Capabilities::SELF_CONTROLLER;
        assert!(caps.has(Capability::Controller));
        assert!(caps.has(Capability::SelfController));
        assert!(!Capabilities::CONTROLLER.has(Capability::SelfController));
    }

    #[test]
    fn union_combines_roles() {
        let caps = Capabilities::CALCULATOR | Capabilities::GROUP;
        assert!(caps.has(Capability::Calculator));
        assert!(caps.has(Capability::Group));
        assert!(!caps.has(Capability::Controller));
        assert!(!Capabilities::NONE.has(Capability::Group));
    }
}
