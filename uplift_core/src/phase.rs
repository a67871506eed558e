// Copyright 2026 the Uplift Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Update phases multiplexed through rebuild handles.

/// A phase of the host's per-frame update.
///
/// The host loop drives several kinds of deferred work through the same
/// handle type. The layout rebuilder only acts on [`Layout`](Self::Layout);
/// every other phase is a no-op from its point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UpdatePhase {
    /// Before layout runs.
    Prelayout,
    /// Layout calculation and control.
    Layout,
    /// After layout, before clipping.
    PostLayout,
    /// Graphic and material rebuild.
    PreRender,
    /// Final work before rendering.
    LatePreRender,
}

impl UpdatePhase {
    /// The phases the layout queue steps through, in order.
    pub const LAYOUT_PHASES: [Self; 3] = [Self::Prelayout, Self::Layout, Self::PostLayout];

    /// Returns a short lowercase name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prelayout => "prelayout",
            Self::Layout => "layout",
            Self::PostLayout => "postlayout",
            Self::PreRender => "prerender",
            Self::LatePreRender => "lateprerender",
        }
    }
}
