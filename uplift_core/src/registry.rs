// Copyright 2026 the Uplift Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deferred rebuild registries.
//!
//! A [`RebuildRegistry`] collects [`RebuildUnit`]s between frames and runs
//! each of them exactly once. [`RebuildQueue`] is the in-crate
//! implementation: it deduplicates by [`RebuildKey`], refuses submissions
//! while it is performing layout, discards units whose node died, and runs
//! the remaining roots shallowest first.
//!
//! ```text
//!   mark_for_rebuild ──► submit ──► pending (one unit per key)
//!                                        │
//!   perform_layout ◄─────────────────────┘
//!     ├─ discard stale units
//!     ├─ sort by root depth
//!     ├─ Prelayout / Layout / PostLayout over every unit
//!     └─ complete: unit_completed, then back to the pool
//! ```

use alloc::vec::Vec;

use hashbrown::HashSet;

use crate::node::{NodeId, NodeTree};
use crate::phase::UpdatePhase;
use crate::rebuild::{LayoutRebuilder, RebuildKey, RebuildStats, RebuildUnit};
use crate::trace::{
    LayoutSummary, LayoutSummaryBuilder, PhaseBeginEvent, PhaseEndEvent, RebuildEvent, StaleEvent,
    Tracer,
};

/// Result of [`RebuildRegistry::submit`].
///
/// A unit the registry does not keep is handed back so the caller can return
/// it to its pool.
#[derive(Debug)]
#[must_use = "a returned unit must be released to its pool"]
pub enum Submission {
    /// The registry now owns the unit.
    Accepted,
    /// A unit with the same key is already pending.
    Duplicate(RebuildUnit),
    /// The registry is not accepting work right now.
    Rejected(RebuildUnit),
}

/// Accepts rebuild units for exactly-once execution later in the frame.
pub trait RebuildRegistry {
    /// Offers a unit to the registry.
    fn submit(&mut self, unit: RebuildUnit) -> Submission;

    /// Called before a unit this registry ran goes back to its pool, so the
    /// registry can stop tracking its key.
    fn unit_completed(&mut self, unit: &RebuildUnit);

    /// Index of the frame that will run newly submitted units, used to label
    /// trace events.
    fn frame_index(&self) -> u64 {
        0
    }
}

/// Outcome of one [`RebuildQueue::perform_layout`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LayoutReport {
    /// Frame counter, starting at 1 for the first call.
    pub frame_index: u64,
    /// Roots rebuilt.
    pub rebuilt: u32,
    /// Pending units discarded because their node was destroyed.
    pub stale: u32,
    /// Work summed over every rebuilt root.
    pub stats: RebuildStats,
}

impl From<&LayoutSummary> for LayoutReport {
    fn from(s: &LayoutSummary) -> Self {
        Self {
            frame_index: s.frame_index,
            rebuilt: s.rebuilt,
            stale: s.stale,
            stats: s.stats,
        }
    }
}

/// The reference [`RebuildRegistry`]: a deduplicating pending list drained
/// once per frame by [`perform_layout`](Self::perform_layout).
#[derive(Debug, Default)]
pub struct RebuildQueue {
    pending: Vec<RebuildUnit>,
    keys: HashSet<RebuildKey>,
    performing: bool,
    frame_index: u64,
}

impl RebuildRegistry for RebuildQueue {
    fn submit(&mut self, unit: RebuildUnit) -> Submission {
        if self.performing {
            return Submission::Rejected(unit);
        }
        if !self.keys.insert(unit.key()) {
            return Submission::Duplicate(unit);
        }
        self.pending.push(unit);
        Submission::Accepted
    }

    fn unit_completed(&mut self, unit: &RebuildUnit) {
        self.keys.remove(&unit.key());
    }

    fn frame_index(&self) -> u64 {
        self.frame_index + 1
    }
}

impl RebuildQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Returns whether a rebuild rooted at `node` is pending.
    #[must_use]
    pub fn is_pending(&self, node: NodeId) -> bool {
        self.keys.contains(&RebuildKey::of(node))
    }

    /// Returns `true` while [`perform_layout`](Self::perform_layout) runs.
    #[must_use]
    pub fn is_performing(&self) -> bool {
        self.performing
    }

    /// Runs every pending unit and returns each to `rebuilder`'s pool.
    ///
    /// Units whose node was destroyed are completed without rebuilding.
    /// The rest run in order of root depth, shallowest first, with ties kept
    /// in submission order. Each unit sees the
    /// [layout phases](UpdatePhase::LAYOUT_PHASES) in order, every unit
    /// finishing one phase before any starts the next.
    ///
    /// If a behavior panics, the units of this frame are still completed and
    /// the queue accepts submissions again once the panic is caught.
    pub fn perform_layout(
        &mut self,
        tree: &mut NodeTree,
        rebuilder: &mut LayoutRebuilder,
        tracer: &mut Tracer<'_>,
    ) -> LayoutReport {
        self.frame_index += 1;
        let frame_index = self.frame_index;
        self.performing = true;

        let units = core::mem::take(&mut self.pending);
        let mut frame = InFlight {
            queue: &mut *self,
            rebuilder: &mut *rebuilder,
            units,
        };
        let mut summary = LayoutSummaryBuilder::new(frame_index);

        for unit in frame.units.extract_if(.., |u| u.is_destroyed(tree)) {
            tracer.stale(&StaleEvent {
                frame_index,
                key: unit.key(),
            });
            summary.record_stale();
            frame.rebuilder.complete(&mut *frame.queue, unit);
        }

        frame
            .units
            .sort_by_cached_key(|u| u.target().map_or(0, |n| tree.depth(n)));

        for phase in UpdatePhase::LAYOUT_PHASES {
            tracer.phase_begin(&PhaseBeginEvent { frame_index, phase });
            for unit in &frame.units {
                let Some(stats) = frame.rebuilder.rebuild(tree, unit, phase) else {
                    continue;
                };
                if let Some(root) = unit.target() {
                    tracer.rebuild(&RebuildEvent {
                        frame_index,
                        root,
                        depth: tree.depth(root),
                        stats,
                    });
                }
                summary.record_rebuild(stats);
            }
            tracer.phase_end(&PhaseEndEvent { frame_index, phase });
        }

        drop(frame);

        let summary = summary.finish(rebuilder.pool());
        tracer.layout_summary(&summary);
        LayoutReport::from(&summary)
    }
}

/// Units taken out of a [`RebuildQueue`] for one `perform_layout` call.
///
/// Dropping it completes whatever is left and reopens the queue, on the
/// normal path and while unwinding from a behavior panic alike.
struct InFlight<'a> {
    queue: &'a mut RebuildQueue,
    rebuilder: &'a mut LayoutRebuilder,
    units: Vec<RebuildUnit>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        for unit in self.units.drain(..) {
            self.rebuilder.complete(&mut *self.queue, unit);
        }
        self.queue.performing = false;
        // Keep the allocation; nothing could be submitted meanwhile.
        if self.queue.pending.is_empty() {
            self.queue.pending = core::mem::take(&mut self.units);
        }
    }
}
