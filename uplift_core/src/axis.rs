// Copyright 2026 the Uplift Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout axes and per-axis size inputs.
//!
//! Layout runs each [`Axis`] independently and strictly in order: the whole
//! horizontal calculation and control passes finish before any vertical work
//! starts, so vertical sizing (text wrapping, aspect ratios) can read the
//! resolved horizontal size.

use kurbo::{Rect, Size};

/// One of the two independent layout dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Axis {
    /// The x dimension. Always processed first.
    Horizontal,
    /// The y dimension.
    Vertical,
}

impl Axis {
    /// Both axes in processing order.
    pub const ALL: [Self; 2] = [Self::Horizontal, Self::Vertical];

    /// Returns the array index of this axis (0 for horizontal, 1 for vertical).
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Horizontal => 0,
            Self::Vertical => 1,
        }
    }

    /// Returns the extent of `size` along this axis.
    #[inline]
    #[must_use]
    pub fn of_size(self, size: Size) -> f64 {
        match self {
            Self::Horizontal => size.width,
            Self::Vertical => size.height,
        }
    }

    /// Returns `(start, length)` of `rect` along this axis.
    #[inline]
    #[must_use]
    pub fn span(self, rect: Rect) -> (f64, f64) {
        match self {
            Self::Horizontal => (rect.x0, rect.width()),
            Self::Vertical => (rect.y0, rect.height()),
        }
    }

    /// Returns `rect` with its span along this axis replaced.
    #[must_use]
    pub fn with_span(self, rect: Rect, start: f64, length: f64) -> Rect {
        match self {
            Self::Horizontal => Rect::new(start, rect.y0, start + length, rect.y1),
            Self::Vertical => Rect::new(rect.x0, start, rect.x1, start + length),
        }
    }
}

/// Size inputs a calculator publishes for its node along one axis.
///
/// Controllers of the parent read these to decide how much space each child
/// receives.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AxisExtent {
    /// Smallest length the node accepts.
    pub min: f64,
    /// Length the node would like to have.
    pub preferred: f64,
    /// Relative share of leftover space; 0 means "do not grow".
    pub flexible: f64,
}

impl AxisExtent {
    /// An extent with every field zero.
    pub const ZERO: Self = Self {
        min: 0.0,
        preferred: 0.0,
        flexible: 0.0,
    };

    /// A rigid extent whose minimum and preferred lengths are both `length`.
    #[must_use]
    pub const fn fixed(length: f64) -> Self {
        Self {
            min: length,
            preferred: length,
            flexible: 0.0,
        }
    }
}
