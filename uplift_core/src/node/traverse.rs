// Copyright 2026 the Uplift Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use super::id::{INVALID, NodeId};
use super::store::Links;

/// An iterator over the direct children of a node, in sibling order.
///
/// Created by [`NodeTree::children`](super::NodeTree::children) and
/// [`LayoutCx::children`](super::LayoutCx::children).
#[derive(Debug)]
pub struct Children<'a> {
    links: &'a Links,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(links: &'a Links, first: u32) -> Self {
        Self {
            links,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.links.next_sibling[idx as usize];
        Some(self.links.id_at(idx))
    }
}

/// An iterator from a node's parent up to the root.
///
/// Created by [`NodeTree::ancestors`](super::NodeTree::ancestors). The
/// starting node itself is not yielded.
#[derive(Debug)]
pub struct Ancestors<'a> {
    links: &'a Links,
    current: u32,
}

impl<'a> Ancestors<'a> {
    pub(crate) fn new(links: &'a Links, start: u32) -> Self {
        Self {
            links,
            current: links.parent[start as usize],
        }
    }
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.links.parent[idx as usize];
        Some(self.links.id_at(idx))
    }
}
