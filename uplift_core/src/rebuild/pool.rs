// Copyright 2026 the Uplift Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Free-list pool of [`RebuildUnit`]s.

use alloc::vec::Vec;

use super::unit::RebuildUnit;
use crate::node::NodeId;

/// Configuration for a [`UnitPool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Units constructed up front.
    pub prewarm: usize,
    /// Free units retained at most; releases beyond this drop the unit.
    pub max_retained: usize,
}

impl PoolConfig {
    /// No prewarm, up to 64 retained units.
    pub const DEFAULT: Self = Self {
        prewarm: 0,
        max_retained: 64,
    };
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Recycles [`RebuildUnit`]s across rebuild requests.
///
/// Units are move-only: a unit is owned by the pool, by a registry, or by a
/// caller, never by two of them, so the pool cannot hand out a unit a
/// registry still holds.
#[derive(Debug)]
pub struct UnitPool {
    free: Vec<RebuildUnit>,
    config: PoolConfig,
    created: usize,
    in_use: usize,
}

impl Default for UnitPool {
    fn default() -> Self {
        Self::new(PoolConfig::DEFAULT)
    }
}

impl UnitPool {
    /// Creates a pool, constructing `config.prewarm` units immediately.
    #[must_use]
    pub fn new(config: PoolConfig) -> Self {
        let free: Vec<_> = (0..config.prewarm).map(|_| RebuildUnit::unbound()).collect();
        Self {
            free,
            config,
            created: config.prewarm,
            in_use: 0,
        }
    }

    /// Returns an unbound unit, recycled when one is available.
    pub fn acquire(&mut self) -> RebuildUnit {
        self.in_use += 1;
        self.free.pop().unwrap_or_else(|| {
            self.created += 1;
            RebuildUnit::unbound()
        })
    }

    /// Returns a unit bound to `node`.
    pub fn acquire_bound(&mut self, node: NodeId) -> RebuildUnit {
        let mut unit = self.acquire();
        unit.bind(node);
        unit
    }

    /// Clears a unit and returns it to the free list.
    pub fn release(&mut self, mut unit: RebuildUnit) {
        debug_assert!(self.in_use > 0, "released more units than were acquired");
        self.in_use = self.in_use.saturating_sub(1);
        unit.clear();
        if self.free.len() < self.config.max_retained {
            self.free.push(unit);
        }
    }

    /// Units constructed over the pool's lifetime.
    #[must_use]
    pub fn created(&self) -> usize {
        self.created
    }

    /// Units acquired and not yet released.
    #[must_use]
    pub fn in_use(&self) -> usize {
        self.in_use
    }

    /// Units waiting on the free list.
    #[must_use]
    pub fn free(&self) -> usize {
        self.free.len()
    }

    /// The pool's configuration.
    #[must_use]
    pub fn config(&self) -> PoolConfig {
        self.config
    }
}
