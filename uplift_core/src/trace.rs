// Copyright 2026 the Uplift Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for layout updates.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! rebuild engine calls as it marks, resolves, and rebuilds. All method bodies
//! default to no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! [`LayoutSummaryBuilder`] accumulates per-root results during
//! [`perform_layout`](crate::registry::RebuildQueue::perform_layout) and
//! produces a [`LayoutSummary`] at the end.
//!
//! The engine has no clock: events carry a frame index, and ordering within a
//! frame is the order in which the sink receives them.

use crate::node::NodeId;
use crate::phase::UpdatePhase;
use crate::rebuild::{MarkOutcome, RebuildKey, RebuildStats, UnitPool};

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted for each dirty node drained by
/// [`mark_dirty_nodes`](crate::rebuild::LayoutRebuilder::mark_dirty_nodes).
#[derive(Clone, Copy, Debug)]
pub struct MarkEvent {
    /// Frame that will process the resulting unit, if any.
    pub frame_index: u64,
    /// The node whose layout inputs changed.
    pub node: NodeId,
    /// What marking it led to.
    pub outcome: MarkOutcome,
}

/// Marks the beginning of an update phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which phase is starting.
    pub phase: UpdatePhase,
}

/// Marks the end of an update phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which phase is ending.
    pub phase: UpdatePhase,
}

/// Emitted after a root's sub-tree was rebuilt.
#[derive(Clone, Copy, Debug)]
pub struct RebuildEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// The rebuilt root.
    pub root: NodeId,
    /// Depth of the root in the tree.
    pub depth: u32,
    /// Work done.
    pub stats: RebuildStats,
}

/// Emitted when a pending unit is discarded because its node was destroyed.
#[derive(Clone, Copy, Debug)]
pub struct StaleEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Key of the discarded unit.
    pub key: RebuildKey,
}

/// Per-frame layout summary produced by [`LayoutSummaryBuilder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutSummary {
    /// Frame counter.
    pub frame_index: u64,
    /// Roots rebuilt.
    pub rebuilt: u32,
    /// Pending units discarded as stale.
    pub stale: u32,
    /// Work summed over every rebuilt root.
    pub stats: RebuildStats,
    /// Units on the pool's free list after the frame.
    pub pool_free: usize,
    /// Units still acquired after the frame.
    pub pool_in_use: usize,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the rebuild engine.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called for each dirty node handed to the resolver.
    fn on_mark(&mut self, e: &MarkEvent) {
        _ = e;
    }

    /// Called at the beginning of an update phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of an update phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called after a root was rebuilt.
    fn on_rebuild(&mut self, e: &RebuildEvent) {
        _ = e;
    }

    /// Called when a stale unit is discarded.
    fn on_stale(&mut self, e: &StaleEvent) {
        _ = e;
    }

    /// Called with a per-frame summary.
    fn on_layout_summary(&mut self, s: &LayoutSummary) {
        _ = s;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`MarkEvent`].
    #[inline]
    pub fn mark(&mut self, e: &MarkEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_mark(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`RebuildEvent`].
    #[inline]
    pub fn rebuild(&mut self, e: &RebuildEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_rebuild(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`StaleEvent`].
    #[inline]
    pub fn stale(&mut self, e: &StaleEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_stale(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`LayoutSummary`].
    #[inline]
    pub fn layout_summary(&mut self, s: &LayoutSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_layout_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }
}

// ---------------------------------------------------------------------------
// LayoutSummaryBuilder
// ---------------------------------------------------------------------------

/// Accumulates per-root results during a frame and produces a
/// [`LayoutSummary`].
#[derive(Debug)]
pub struct LayoutSummaryBuilder {
    frame_index: u64,
    rebuilt: u32,
    stale: u32,
    stats: RebuildStats,
}

impl LayoutSummaryBuilder {
    /// Starts a summary for the given frame.
    #[must_use]
    pub fn new(frame_index: u64) -> Self {
        Self {
            frame_index,
            rebuilt: 0,
            stale: 0,
            stats: RebuildStats::default(),
        }
    }

    /// Records one rebuilt root.
    pub fn record_rebuild(&mut self, stats: RebuildStats) {
        self.rebuilt += 1;
        self.stats += stats;
    }

    /// Records one discarded stale unit.
    pub fn record_stale(&mut self) {
        self.stale += 1;
    }

    /// Consumes the builder, sampling the pool's state.
    #[must_use]
    pub fn finish(self, pool: &UnitPool) -> LayoutSummary {
        LayoutSummary {
            frame_index: self.frame_index,
            rebuilt: self.rebuilt,
            stale: self.stale,
            stats: self.stats,
            pool_free: pool.free(),
            pool_in_use: pool.in_use(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeTree;

    fn sample_stats(n: u32) -> RebuildStats {
        RebuildStats {
            calculated: n,
            controlled: n,
            calculators_run: n,
            controllers_run: 2 * n,
        }
    }

    #[test]
    fn noop_sink_compiles() {
        let mut tree = NodeTree::new();
        let node = tree.create_node();
        let mut sink = NoopSink;
        sink.on_mark(&MarkEvent {
            frame_index: 1,
            node,
            outcome: MarkOutcome::Dropped,
        });
        sink.on_stale(&StaleEvent {
            frame_index: 1,
            key: RebuildKey::of(node),
        });
        sink.on_layout_summary(&LayoutSummaryBuilder::new(1).finish(&UnitPool::default()));
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.phase_begin(&PhaseBeginEvent {
            frame_index: 3,
            phase: UpdatePhase::Layout,
        });
        tracer.phase_end(&PhaseEndEvent {
            frame_index: 3,
            phase: UpdatePhase::Layout,
        });
    }

    #[test]
    fn summary_builder_sums_rebuilds() {
        let mut pool = UnitPool::default();
        let held = pool.acquire();

        let mut builder = LayoutSummaryBuilder::new(9);
        builder.record_rebuild(sample_stats(1));
        builder.record_rebuild(sample_stats(2));
        builder.record_stale();
        let summary = builder.finish(&pool);

        assert_eq!(summary.frame_index, 9);
        assert_eq!(summary.rebuilt, 2);
        assert_eq!(summary.stale, 1);
        assert_eq!(summary.stats, sample_stats(3));
        assert_eq!(summary.pool_in_use, 1);
        assert_eq!(summary.pool_free, 0);
        pool.release(held);
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            phases: Vec<UpdatePhase>,
        }
        impl TraceSink for RecordingSink {
            fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
                self.phases.push(e.phase);
            }
        }

        let mut sink = RecordingSink { phases: Vec::new() };
        let mut tracer = Tracer::new(&mut sink);
        tracer.phase_begin(&PhaseBeginEvent {
            frame_index: 0,
            phase: UpdatePhase::PostLayout,
        });
        drop(tracer);
        assert_eq!(sink.phases, &[UpdatePhase::PostLayout]);
    }
}
