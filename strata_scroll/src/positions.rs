// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Moving platform layers to match scroll positions.
//!
//! [`ScrollingTree::apply_layer_positions`] drains the
//! [`POSITION`](crate::dirty::POSITION) channel and repositions each
//! affected node's layers, parents before children:
//!
//! - **Frame scrollers** move their scrolled contents by the negated scroll
//!   position and lay out the counter-scrolling, inset clip, root contents,
//!   content shadow, header and footer layers around it.
//! - **Overflow scrollers** and their proxies move the scroll container's
//!   bounds origin.
//! - **Fixed** and **sticky** nodes follow their constraining rect.
//! - **Positioned** nodes undo the scroll of their related overflow nodes
//!   since the last commit.

use std::sync::Arc;

use kurbo::{Point, Rect, Vec2};
use strata_core::id::ScrollingNodeId;
use strata_core::layer::{ForcePositionSync, PlatformLayer};
use strata_core::trace::{PhaseKind, Tracer};

use crate::dirty;
use crate::node::{NodeData, ScrollingNodeType};
use crate::thread::is_scrolling_thread;
use crate::tree::{INVALID, ScrollingTree};
use crate::viewport::related_layer_positions;

impl ScrollingTree {
    /// Repositions the layers of every node whose scroll state changed.
    ///
    /// On the scrolling thread the root contents layer then requests a
    /// composition so the new positions reach the screen without waiting for
    /// the main thread. Returns the number of nodes repositioned; a tree
    /// without a root does nothing.
    pub fn apply_layer_positions(&mut self, tracer: &mut Tracer<'_>) -> usize {
        if self.root == INVALID {
            self.pending_scroll_events.clear();
            return 0;
        }
        self.cycle += 1;
        let cycle = self.cycle;
        tracer.phase_begin(cycle, PhaseKind::ApplyLayerPositions);
        for event in self.pending_scroll_events.drain(..) {
            tracer.scroll(&event);
        }

        let dirty_nodes: Vec<u32> = self
            .dirty
            .drain(dirty::POSITION)
            .affected()
            .deterministic()
            .run()
            .collect();
        let force = self.force_position_sync();
        let mut applied = 0;
        for &idx in &dirty_nodes {
            if !self.is_live(idx) {
                continue;
            }
            self.apply_node_layer_positions(idx, force);
            applied += 1;
        }

        if is_scrolling_thread()
            && let Some(layer) = self.root_contents_layer()
        {
            layer.request_composition();
        }
        tracer.phase_end(cycle, PhaseKind::ApplyLayerPositions);
        applied
    }

    /// Moves the scrolled layer of `id` to its current scroll position.
    ///
    /// Frame scrollers offset their scrolled contents layer by the negated
    /// scroll position; overflow scrollers set their scroll container's
    /// bounds origin. Other kinds are unaffected.
    ///
    /// # Panics
    ///
    /// Panics if `id` is unknown.
    pub fn reposition_scrolling_layers(&self, id: ScrollingNodeId) {
        let idx = self.slot(id);
        self.reposition_scrolling_layers_at(idx, self.force_position_sync());
    }

    /// Lays out the layers around a frame scroller's contents.
    ///
    /// Does nothing for other kinds.
    ///
    /// # Panics
    ///
    /// Panics if `id` is unknown.
    pub fn reposition_related_layers(&self, id: ScrollingNodeId) {
        let idx = self.slot(id);
        self.reposition_related_layers_at(idx, self.force_position_sync());
    }

    /// Positions set from the scrolling thread while the main thread lags
    /// behind must reach the scene graph even if unchanged.
    fn force_position_sync(&self) -> ForcePositionSync {
        if is_scrolling_thread() && !self.synchronized_with_main_thread {
            ForcePositionSync::Yes
        } else {
            ForcePositionSync::No
        }
    }

    fn apply_node_layer_positions(&self, idx: u32, force: ForcePositionSync) {
        let i = idx as usize;
        match self.node_type[i] {
            ScrollingNodeType::MainFrame | ScrollingNodeType::Subframe => {
                self.reposition_scrolling_layers_at(idx, force);
                self.reposition_related_layers_at(idx, force);
            }
            ScrollingNodeType::Overflow => self.reposition_scrolling_layers_at(idx, force),
            ScrollingNodeType::OverflowProxy => {
                let NodeData::OverflowProxy {
                    overflow: Some(overflow),
                } = &self.data[i]
                else {
                    return;
                };
                let Some(&target) = self.slots.get(overflow) else {
                    return;
                };
                if let Some(layer) = &self.layer[i] {
                    layer.set_bounds_origin_for_scrolling(
                        self.scroll_position[target as usize],
                        force,
                    );
                }
            }
            ScrollingNodeType::Fixed => {
                let NodeData::Fixed(constraints) = &self.data[i] else {
                    return;
                };
                let frame = self.ancestor_where(idx, ScrollingNodeType::is_frame_scrolling);
                let Some(viewport) = self.constraining_rect(frame) else {
                    return;
                };
                let position = constraints.layer_position_for_viewport_rect(viewport);
                set_layer_position(self.layer[i].as_ref(), position, force);
            }
            ScrollingNodeType::Sticky => {
                let NodeData::Sticky(constraints) = &self.data[i] else {
                    return;
                };
                let scroller = self.ancestor_where(idx, ScrollingNodeType::is_scrolling);
                let Some(rect) = self.constraining_rect(scroller) else {
                    return;
                };
                let position = constraints.layer_position_for_constraining_rect(rect);
                set_layer_position(self.layer[i].as_ref(), position, force);
            }
            ScrollingNodeType::Positioned => {
                let NodeData::Positioned {
                    related_overflow,
                    layer_position_at_last_layout,
                } = &self.data[i]
                else {
                    return;
                };
                let delta: Vec2 = related_overflow
                    .iter()
                    .filter_map(|id| self.slots.get(id))
                    .map(|&o| {
                        self.scroll_position[o as usize]
                            - self.last_committed_scroll_position[o as usize]
                    })
                    .fold(Vec2::ZERO, |acc, d| acc + d);
                set_layer_position(
                    self.layer[i].as_ref(),
                    *layer_position_at_last_layout - delta,
                    force,
                );
            }
            ScrollingNodeType::FrameHosting
            | ScrollingNodeType::PluginScrolling
            | ScrollingNodeType::PluginHosting => {}
        }
    }

    /// The rect content constrained by scroller `idx` must stay within.
    ///
    /// Frame scrollers use their layout viewport, overflow scrollers their
    /// visible scroll port.
    fn constraining_rect(&self, idx: u32) -> Option<Rect> {
        if idx == INVALID {
            return None;
        }
        let i = idx as usize;
        match &self.data[i] {
            NodeData::FrameScrolling(frame) => Some(frame.layout_viewport),
            NodeData::Overflow => Some(Rect::from_origin_size(
                self.scroll_position[i],
                self.geometry[i].scrollable_area_size,
            )),
            _ => None,
        }
    }

    fn reposition_scrolling_layers_at(&self, idx: u32, force: ForcePositionSync) {
        let i = idx as usize;
        let Some(layer) = &self.layer[i] else {
            return;
        };
        let position = self.scroll_position[i];
        match self.node_type[i] {
            ScrollingNodeType::MainFrame | ScrollingNodeType::Subframe => {
                layer.set_position_for_scrolling(Point::ZERO - position.to_vec2(), force);
            }
            ScrollingNodeType::Overflow => layer.set_bounds_origin_for_scrolling(position, force),
            _ => {}
        }
    }

    fn reposition_related_layers_at(&self, idx: u32, force: ForcePositionSync) {
        let i = idx as usize;
        let NodeData::FrameScrolling(frame) = &self.data[i] else {
            return;
        };
        let positions = related_layer_positions(frame, &self.geometry[i], self.scroll_position[i]);
        let layers = &frame.layers;

        set_layer_position(layers.counter_scrolling.as_ref(), positions.counter_scrolling, force);
        if let (Some(inset_clip), Some(root_contents)) = (&layers.inset_clip, &layers.root_contents) {
            let x = inset_clip.lock().position().x;
            inset_clip.set_position_for_scrolling(Point::new(x, positions.inset_clip_y), force);
            root_contents.set_position_for_scrolling(positions.root_contents, force);
            set_layer_position(layers.content_shadow.as_ref(), positions.root_contents, force);
        }
        set_layer_position(layers.header.as_ref(), positions.header, force);
        set_layer_position(layers.footer.as_ref(), positions.footer, force);
    }
}

fn set_layer_position(layer: Option<&Arc<PlatformLayer>>, position: Point, force: ForcePositionSync) {
    if let Some(layer) = layer {
        layer.set_position_for_scrolling(position, force);
    }
}
