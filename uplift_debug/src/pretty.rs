// Copyright 2026 the Uplift Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use uplift_core::rebuild::{MarkOutcome, RebuildStats};
use uplift_core::trace::{
    LayoutSummary, MarkEvent, PhaseBeginEvent, PhaseEndEvent, RebuildEvent, StaleEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns its writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn outcome_str(outcome: MarkOutcome) -> &'static str {
    match outcome {
        MarkOutcome::Submitted(_) => "submitted",
        MarkOutcome::Coalesced(_) => "coalesced",
        MarkOutcome::Rejected(_) => "REJECTED",
        MarkOutcome::Dropped => "dropped",
        MarkOutcome::Stale => "stale",
    }
}

fn stats_str(s: &RebuildStats) -> String {
    format!(
        "calc={}/{} ctrl={}/{}",
        s.calculated, s.calculators_run, s.controlled, s.controllers_run
    )
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_mark(&mut self, e: &MarkEvent) {
        let root = match e.outcome.root() {
            Some(root) => format!(" root={root:?}"),
            None => String::new(),
        };
        let _ = writeln!(
            self.writer,
            "[mark] frame={} {:?} {}{root}",
            e.frame_index,
            e.node,
            outcome_str(e.outcome),
        );
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:begin] frame={} {}",
            e.frame_index,
            e.phase.as_str(),
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] frame={} {}",
            e.frame_index,
            e.phase.as_str(),
        );
    }

    fn on_rebuild(&mut self, e: &RebuildEvent) {
        let _ = writeln!(
            self.writer,
            "[rebuild] frame={} {:?} depth={} {}",
            e.frame_index,
            e.root,
            e.depth,
            stats_str(&e.stats),
        );
    }

    fn on_stale(&mut self, e: &StaleEvent) {
        let _ = writeln!(self.writer, "[stale] frame={} {:?}", e.frame_index, e.key);
    }

    fn on_layout_summary(&mut self, s: &LayoutSummary) {
        let _ = writeln!(
            self.writer,
            "[summary] frame={} rebuilt={} stale={} {} pool={}free/{}used",
            s.frame_index,
            s.rebuilt,
            s.stale,
            stats_str(&s.stats),
            s.pool_free,
            s.pool_in_use,
        );
    }
}
