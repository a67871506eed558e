// Copyright 2026 the Uplift Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated update loop that exercises deferred layout rebuilds and the
//! diagnostics pipeline.
//!
//! Builds a small window (a vertical stack holding a header and a row of
//! items), then runs a handful of frames that resize, toggle, and destroy
//! nodes. Every frame drains layout dirt into a [`RebuildQueue`] and performs
//! layout, tracing to both a
//! [`PrettyPrintSink`](uplift_debug::pretty::PrettyPrintSink) and a
//! [`RecorderSink`](uplift_debug::recorder::RecorderSink). The recording is
//! exported as Chrome trace JSON at the end.

use std::fs::File;
use std::io::BufWriter;

use kurbo::Size;
use uplift_core::axis::{Axis, AxisExtent};
use uplift_core::node::{Capabilities, LayoutBehavior, LayoutCx, NodeFlags, NodeId, NodeTree};
use uplift_core::rebuild::LayoutRebuilder;
use uplift_core::registry::RebuildQueue;
use uplift_core::trace::{
    LayoutSummary, MarkEvent, PhaseBeginEvent, PhaseEndEvent, RebuildEvent, StaleEvent, TraceSink,
    Tracer,
};

use uplift_debug::pretty::PrettyPrintSink;
use uplift_debug::recorder::RecorderSink;

// ---------------------------------------------------------------------------
// Behaviors
// ---------------------------------------------------------------------------

/// Lays children out one after another along `main`, stretching them across
/// the other axis. Leftover space along `main` goes to flexible children.
struct Stack {
    main: Axis,
    gap: f64,
}

impl LayoutBehavior for Stack {
    fn capabilities(&self) -> Capabilities {
        Capabilities::CALCULATOR | Capabilities::CONTROLLER | Capabilities::GROUP
    }

    fn calculate(&mut self, axis: Axis, cx: &mut LayoutCx<'_>) {
        let mut extent = AxisExtent::ZERO;
        let mut count = 0_u32;
        for child in cx.active_children() {
            let c = cx.extent(child, axis);
            if axis == self.main {
                extent.min += c.min;
                extent.preferred += c.preferred;
                extent.flexible += c.flexible;
            } else {
                extent.min = extent.min.max(c.min);
                extent.preferred = extent.preferred.max(c.preferred);
            }
            count += 1;
        }
        if axis == self.main && count > 1 {
            let gaps = self.gap * f64::from(count - 1);
            extent.min += gaps;
            extent.preferred += gaps;
        }
        cx.set_extent(axis, extent);
    }

    fn control(&mut self, axis: Axis, cx: &mut LayoutCx<'_>) {
        let (_, available) = axis.span(cx.rect(cx.node()));
        let children: Vec<NodeId> = cx.active_children().collect();
        if axis != self.main {
            for child in children {
                cx.set_child_span(child, axis, 0.0, available);
            }
            return;
        }

        let own = cx.extent(cx.node(), axis);
        let leftover = (available - own.preferred).max(0.0);
        let mut offset = 0.0;
        for child in children {
            let c = cx.extent(child, axis);
            let grow = if own.flexible > 0.0 {
                leftover * c.flexible / own.flexible
            } else {
                0.0
            };
            let len = c.preferred + grow;
            cx.set_child_span(child, axis, offset, len);
            offset += len + self.gap;
        }
    }
}

/// A leaf with a fixed preferred size.
struct Fixed {
    size: Size,
    flexible: f64,
}

impl LayoutBehavior for Fixed {
    fn capabilities(&self) -> Capabilities {
        Capabilities::CALCULATOR
    }

    fn calculate(&mut self, axis: Axis, cx: &mut LayoutCx<'_>) {
        cx.set_extent(
            axis,
            AxisExtent {
                flexible: self.flexible,
                ..AxisExtent::fixed(axis.of_size(self.size))
            },
        );
    }
}

/// Shrinks its own node to the preferred size its calculators published.
struct FitContent;

impl LayoutBehavior for FitContent {
    fn capabilities(&self) -> Capabilities {
        Capabilities::SELF_CONTROLLER
    }

    fn control(&mut self, axis: Axis, cx: &mut LayoutCx<'_>) {
        let preferred = cx.extent(cx.node(), axis).preferred;
        let (start, _) = axis.span(cx.rect(cx.node()));
        cx.set_span(axis, start, preferred);
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Forwards every event to both sinks.
#[derive(Debug)]
struct Tee<'a> {
    pretty: &'a mut PrettyPrintSink,
    recorder: &'a mut RecorderSink,
}

impl TraceSink for Tee<'_> {
    fn on_mark(&mut self, e: &MarkEvent) {
        self.pretty.on_mark(e);
        self.recorder.on_mark(e);
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.pretty.on_phase_begin(e);
        self.recorder.on_phase_begin(e);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.pretty.on_phase_end(e);
        self.recorder.on_phase_end(e);
    }

    fn on_rebuild(&mut self, e: &RebuildEvent) {
        self.pretty.on_rebuild(e);
        self.recorder.on_rebuild(e);
    }

    fn on_stale(&mut self, e: &StaleEvent) {
        self.pretty.on_stale(e);
        self.recorder.on_stale(e);
    }

    fn on_layout_summary(&mut self, s: &LayoutSummary) {
        self.pretty.on_layout_summary(s);
        self.recorder.on_layout_summary(s);
    }
}

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

struct Scene {
    window: NodeId,
    header: NodeId,
    row: NodeId,
    items: Vec<NodeId>,
    popup: NodeId,
}

fn build(tree: &mut NodeTree) -> Scene {
    let window = tree.create_node();
    tree.set_flags(
        window,
        NodeFlags {
            active: true,
            layout_boundary: true,
        },
    );
    tree.set_size(window, Size::new(320.0, 200.0));
    tree.attach_behavior(
        window,
        Box::new(Stack {
            main: Axis::Vertical,
            gap: 4.0,
        }),
    );

    let header = tree.create_node();
    tree.add_child(window, header);
    tree.attach_behavior(
        header,
        Box::new(Fixed {
            size: Size::new(120.0, 32.0),
            flexible: 0.0,
        }),
    );
    tree.attach_behavior(header, Box::new(FitContent));

    let row = tree.create_node();
    tree.add_child(window, row);
    tree.attach_behavior(
        row,
        Box::new(Stack {
            main: Axis::Horizontal,
            gap: 8.0,
        }),
    );

    let items = (0..3)
        .map(|i| {
            let item = tree.create_node();
            tree.add_child(row, item);
            tree.attach_behavior(
                item,
                Box::new(Fixed {
                    size: Size::new(40.0, 24.0),
                    flexible: if i == 1 { 1.0 } else { 0.0 },
                }),
            );
            item
        })
        .collect();

    // A detached node with its own controller: it is its own rebuild root.
    let popup = tree.create_node();
    tree.attach_behavior(popup, Box::new(FitContent));

    Scene {
        window,
        header,
        row,
        items,
        popup,
    }
}

fn print_layout(tree: &NodeTree, scene: &Scene) {
    println!("  window {:?}", tree.rect(scene.window));
    println!("  header {:?}", tree.rect(scene.header));
    println!("  row    {:?}", tree.rect(scene.row));
    for (i, &item) in scene.items.iter().enumerate() {
        if tree.is_alive(item) {
            println!("  item{i}  {:?}", tree.rect(item));
        }
    }
}

fn main() {
    let mut pretty = PrettyPrintSink::new(Box::new(std::io::stdout()));
    let mut recorder = RecorderSink::new();

    let mut tree = NodeTree::new();
    let scene = build(&mut tree);
    let mut rebuilder = LayoutRebuilder::default();
    let mut queue = RebuildQueue::new();

    for step in 0..5 {
        match step {
            0 => println!("-- initial build"),
            1 => println!("-- idle frame"),
            2 => {
                println!("-- resize window");
                tree.set_size(scene.window, Size::new(480.0, 240.0));
            }
            3 => {
                println!("-- deactivate the flexible item");
                tree.set_active(scene.items[1], false);
            }
            _ => {
                println!("-- destroy the popup while its rebuild is pending");
                let outcome = rebuilder.mark_for_rebuild(&tree, &mut queue, scene.popup);
                println!("  popup: {outcome:?}");
                tree.destroy_node(scene.popup);
            }
        }

        let mut tee = Tee {
            pretty: &mut pretty,
            recorder: &mut recorder,
        };
        let mut tracer = Tracer::new(&mut tee);
        rebuilder.mark_dirty_nodes(&mut tree, &mut queue, &mut tracer);
        let report = queue.perform_layout(&mut tree, &mut rebuilder, &mut tracer);
        println!(
            "  frame {}: rebuilt={} stale={}",
            report.frame_index, report.rebuilt, report.stale
        );
        print_layout(&tree, &scene);
    }

    // -- export Chrome trace -----------------------------------------------
    let path = "layout_trace.json";
    let file = File::create(path).expect("failed to create layout_trace.json");
    let mut writer = BufWriter::new(file);
    uplift_debug::chrome::export(recorder.as_bytes(), &mut writer)
        .expect("failed to write Chrome trace");

    println!("Wrote {path}");
}
