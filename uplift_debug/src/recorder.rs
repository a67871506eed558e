// Copyright 2026 the Uplift Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].
//!
//! Node handles are stored as `(index, generation)` pairs and keys as their
//! packed `u64`, so a recording can be decoded without the tree it came
//! from.

use uplift_core::node::{INVALID, NodeId};
use uplift_core::phase::UpdatePhase;
use uplift_core::rebuild::{MarkOutcome, RebuildKey, RebuildStats};
use uplift_core::trace::{
    LayoutSummary, MarkEvent, PhaseBeginEvent, PhaseEndEvent, RebuildEvent, StaleEvent, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_MARK: u8 = 1;
const TAG_PHASE_BEGIN: u8 = 2;
const TAG_PHASE_END: u8 = 3;
const TAG_REBUILD: u8 = 4;
const TAG_STALE: u8 = 5;
const TAG_LAYOUT_SUMMARY: u8 = 6;

const OUTCOME_SUBMITTED: u8 = 0;
const OUTCOME_COALESCED: u8 = 1;
const OUTCOME_REJECTED: u8 = 2;
const OUTCOME_DROPPED: u8 = 3;
const OUTCOME_STALE: u8 = 4;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_node(&mut self, node: NodeId) {
        self.write_u32(node.index());
        self.write_u32(node.generation());
    }

    fn write_outcome(&mut self, outcome: MarkOutcome) {
        let tag = match outcome {
            MarkOutcome::Submitted(_) => OUTCOME_SUBMITTED,
            MarkOutcome::Coalesced(_) => OUTCOME_COALESCED,
            MarkOutcome::Rejected(_) => OUTCOME_REJECTED,
            MarkOutcome::Dropped => OUTCOME_DROPPED,
            MarkOutcome::Stale => OUTCOME_STALE,
        };
        self.write_u8(tag);
        // Fixed-size record: a missing root is written as an invalid handle.
        self.write_node(
            outcome
                .root()
                .unwrap_or(NodeId::from_raw_parts(INVALID, INVALID)),
        );
    }

    fn write_phase(&mut self, p: UpdatePhase) {
        self.write_u8(match p {
            UpdatePhase::Prelayout => 0,
            UpdatePhase::Layout => 1,
            UpdatePhase::PostLayout => 2,
            UpdatePhase::PreRender => 3,
            UpdatePhase::LatePreRender => 4,
        });
    }

    fn write_stats(&mut self, s: RebuildStats) {
        self.write_u32(s.calculated);
        self.write_u32(s.controlled);
        self.write_u32(s.calculators_run);
        self.write_u32(s.controllers_run);
    }
}

impl TraceSink for RecorderSink {
    fn on_mark(&mut self, e: &MarkEvent) {
        self.write_u8(TAG_MARK);
        self.write_u64(e.frame_index);
        self.write_node(e.node);
        self.write_outcome(e.outcome);
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.write_u8(TAG_PHASE_BEGIN);
        self.write_u64(e.frame_index);
        self.write_phase(e.phase);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.write_u8(TAG_PHASE_END);
        self.write_u64(e.frame_index);
        self.write_phase(e.phase);
    }

    fn on_rebuild(&mut self, e: &RebuildEvent) {
        self.write_u8(TAG_REBUILD);
        self.write_u64(e.frame_index);
        self.write_node(e.root);
        self.write_u32(e.depth);
        self.write_stats(e.stats);
    }

    fn on_stale(&mut self, e: &StaleEvent) {
        self.write_u8(TAG_STALE);
        self.write_u64(e.frame_index);
        self.write_u64(e.key.get());
    }

    fn on_layout_summary(&mut self, s: &LayoutSummary) {
        self.write_u8(TAG_LAYOUT_SUMMARY);
        self.write_u64(s.frame_index);
        self.write_u32(s.rebuilt);
        self.write_u32(s.stale);
        self.write_stats(s.stats);
        self.write_u64(s.pool_free as u64);
        self.write_u64(s.pool_in_use as u64);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`MarkEvent`].
    Mark(MarkEvent),
    /// A [`PhaseBeginEvent`].
    PhaseBegin(PhaseBeginEvent),
    /// A [`PhaseEndEvent`].
    PhaseEnd(PhaseEndEvent),
    /// A [`RebuildEvent`].
    Rebuild(RebuildEvent),
    /// A [`StaleEvent`].
    Stale(StaleEvent),
    /// A [`LayoutSummary`].
    LayoutSummary(LayoutSummary),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
///
/// Iteration stops at the first truncated record or unknown tag.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?.try_into().ok()?;
        self.pos += N;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_usize(&mut self) -> Option<usize> {
        usize::try_from(self.read_u64()?).ok()
    }

    fn read_node(&mut self) -> Option<NodeId> {
        let index = self.read_u32()?;
        let generation = self.read_u32()?;
        Some(NodeId::from_raw_parts(index, generation))
    }

    fn read_outcome(&mut self) -> Option<MarkOutcome> {
        let tag = self.read_u8()?;
        let root = self.read_node()?;
        Some(match tag {
            OUTCOME_SUBMITTED => MarkOutcome::Submitted(root),
            OUTCOME_COALESCED => MarkOutcome::Coalesced(root),
            OUTCOME_REJECTED => MarkOutcome::Rejected(root),
            OUTCOME_DROPPED => MarkOutcome::Dropped,
            OUTCOME_STALE => MarkOutcome::Stale,
            _ => return None,
        })
    }

    fn read_phase(&mut self) -> Option<UpdatePhase> {
        Some(match self.read_u8()? {
            0 => UpdatePhase::Prelayout,
            1 => UpdatePhase::Layout,
            2 => UpdatePhase::PostLayout,
            3 => UpdatePhase::PreRender,
            4 => UpdatePhase::LatePreRender,
            _ => return None,
        })
    }

    fn read_stats(&mut self) -> Option<RebuildStats> {
        Some(RebuildStats {
            calculated: self.read_u32()?,
            controlled: self.read_u32()?,
            calculators_run: self.read_u32()?,
            controllers_run: self.read_u32()?,
        })
    }

    fn decode_mark(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Mark(MarkEvent {
            frame_index: self.read_u64()?,
            node: self.read_node()?,
            outcome: self.read_outcome()?,
        }))
    }

    fn decode_phase_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseBegin(PhaseBeginEvent {
            frame_index: self.read_u64()?,
            phase: self.read_phase()?,
        }))
    }

    fn decode_phase_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseEnd(PhaseEndEvent {
            frame_index: self.read_u64()?,
            phase: self.read_phase()?,
        }))
    }

    fn decode_rebuild(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Rebuild(RebuildEvent {
            frame_index: self.read_u64()?,
            root: self.read_node()?,
            depth: self.read_u32()?,
            stats: self.read_stats()?,
        }))
    }

    fn decode_stale(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Stale(StaleEvent {
            frame_index: self.read_u64()?,
            key: RebuildKey::from_bits(self.read_u64()?),
        }))
    }

    fn decode_layout_summary(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::LayoutSummary(LayoutSummary {
            frame_index: self.read_u64()?,
            rebuilt: self.read_u32()?,
            stale: self.read_u32()?,
            stats: self.read_stats()?,
            pool_free: self.read_usize()?,
            pool_in_use: self.read_usize()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_MARK => self.decode_mark(),
            TAG_PHASE_BEGIN => self.decode_phase_begin(),
            TAG_PHASE_END => self.decode_phase_end(),
            TAG_REBUILD => self.decode_rebuild(),
            TAG_STALE => self.decode_stale(),
            TAG_LAYOUT_SUMMARY => self.decode_layout_summary(),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use uplift_core::node::{Capabilities, LayoutBehavior, NodeTree};
    use uplift_core::rebuild::LayoutRebuilder;
    use uplift_core::registry::RebuildQueue;
    use uplift_core::trace::Tracer;

    struct Arranger;

    impl LayoutBehavior for Arranger {
        fn capabilities(&self) -> Capabilities {
            Capabilities::CONTROLLER | Capabilities::GROUP
        }
    }

    /// Records one frame: two marks coalescing on `root`, then its rebuild.
    fn record_frame() -> (RecorderSink, NodeId, NodeId) {
        let mut tree = NodeTree::new();
        let root = tree.create_node();
        let leaf = tree.create_node();
        tree.add_child(root, leaf);
        tree.attach_behavior(root, Box::new(Arranger));

        let mut rebuilder = LayoutRebuilder::default();
        let mut queue = RebuildQueue::new();
        let mut rec = RecorderSink::new();
        {
            let mut tracer = Tracer::new(&mut rec);
            rebuilder.mark_dirty_nodes(&mut tree, &mut queue, &mut tracer);
            queue.perform_layout(&mut tree, &mut rebuilder, &mut tracer);
        }
        (rec, root, leaf)
    }

    #[test]
    fn records_a_frame_in_emission_order() {
        let (rec, root, leaf) = record_frame();
        let events: Vec<_> = decode(rec.as_bytes()).collect();

        // 2 marks, 3 phase pairs, 1 rebuild, 1 summary.
        assert_eq!(events.len(), 10);
        // Drain order is the tracker's; whichever node comes first submits.
        let mut marks: Vec<_> = events[..2]
            .iter()
            .map(|e| match e {
                RecordedEvent::Mark(m) => {
                    assert_eq!(m.frame_index, 1);
                    (m.node, m.outcome)
                }
                other => panic!("expected Mark, got {other:?}"),
            })
            .collect();
        marks.sort_by_key(|(node, _)| node.index());
        let outcomes = [marks[0].1, marks[1].1];
        assert_eq!(marks[0].0, root);
        assert_eq!(marks[1].0, leaf);
        assert!(outcomes.contains(&MarkOutcome::Submitted(root)));
        assert!(outcomes.contains(&MarkOutcome::Coalesced(root)));
        match &events[2] {
            RecordedEvent::PhaseBegin(e) => assert_eq!(e.phase, UpdatePhase::Prelayout),
            other => panic!("expected PhaseBegin, got {other:?}"),
        }
        match &events[5] {
            RecordedEvent::Rebuild(e) => {
                assert_eq!(e.root, root);
                assert_eq!(e.depth, 0);
                assert_eq!(e.stats.controllers_run, 2);
            }
            other => panic!("expected Rebuild, got {other:?}"),
        }
        match &events[9] {
            RecordedEvent::LayoutSummary(s) => {
                assert_eq!(s.frame_index, 1);
                assert_eq!(s.rebuilt, 1);
                assert_eq!(s.pool_in_use, 0);
            }
            other => panic!("expected LayoutSummary, got {other:?}"),
        }
    }

    #[test]
    fn dropped_outcome_and_stale_key_survive_encoding() {
        let mut tree = NodeTree::new();
        let node = tree.create_node();
        let mut rec = RecorderSink::new();
        rec.on_mark(&MarkEvent {
            frame_index: 4,
            node,
            outcome: MarkOutcome::Dropped,
        });
        rec.on_stale(&StaleEvent {
            frame_index: 4,
            key: RebuildKey::of(node),
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 2);
        match &events[0] {
            RecordedEvent::Mark(e) => assert_eq!(e.outcome, MarkOutcome::Dropped),
            other => panic!("expected Mark, got {other:?}"),
        }
        match &events[1] {
            RecordedEvent::Stale(e) => assert_eq!(e.key, RebuildKey::of(node)),
            other => panic!("expected Stale, got {other:?}"),
        }
    }

    #[test]
    fn truncated_buffer_stops_cleanly() {
        let (rec, _, _) = record_frame();
        let bytes = rec.into_bytes();
        let truncated = &bytes[..bytes.len() - 3];
        let events: Vec<_> = decode(truncated).collect();
        assert_eq!(events.len(), 9, "partial summary is dropped");
    }

    #[test]
    fn unknown_tag_stops_iteration() {
        let bytes = [0xFF, 0, 0, 0];
        assert_eq!(decode(&bytes).count(), 0);
    }
}
