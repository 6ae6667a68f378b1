// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Viewport constraints for fixed and sticky content.
//!
//! Both kinds record where their layer sat at the last main-thread layout
//! and derive the current position from how far the constraining rect has
//! moved since.

use kurbo::{Point, Rect, Vec2};

bitflags::bitflags! {
    /// Edges a constrained box is anchored to.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct AnchorEdges: u8 {
        /// Left edge.
        const LEFT = 1 << 0;
        /// Right edge.
        const RIGHT = 1 << 1;
        /// Top edge.
        const TOP = 1 << 2;
        /// Bottom edge.
        const BOTTOM = 1 << 3;
    }
}

/// Constraints of a `position: fixed` layer.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FixedPositionConstraints {
    /// Anchored edges.
    pub anchor_edges: AnchorEdges,
    /// Layout viewport at the last layout.
    pub viewport_rect_at_last_layout: Rect,
    /// Layer position at the last layout.
    pub layer_position_at_last_layout: Point,
    /// Offset between the layer position and its aligned box.
    pub alignment_offset: Vec2,
}

impl FixedPositionConstraints {
    /// Layer position for the given layout viewport.
    ///
    /// Each axis follows whichever anchored edge applies; an axis with no
    /// anchored edge stays put.
    #[must_use]
    pub fn layer_position_for_viewport_rect(&self, viewport: Rect) -> Point {
        let last = self.viewport_rect_at_last_layout;
        let mut offset = Vec2::ZERO;
        if self.anchor_edges.contains(AnchorEdges::LEFT) {
            offset.x = viewport.x0 - last.x0;
        } else if self.anchor_edges.contains(AnchorEdges::RIGHT) {
            offset.x = viewport.x1 - last.x1;
        }
        if self.anchor_edges.contains(AnchorEdges::TOP) {
            offset.y = viewport.y0 - last.y0;
        } else if self.anchor_edges.contains(AnchorEdges::BOTTOM) {
            offset.y = viewport.y1 - last.y1;
        }
        self.layer_position_at_last_layout + offset - self.alignment_offset
    }
}

/// Constraints of a `position: sticky` layer.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StickyPositionConstraints {
    /// Anchored edges.
    pub anchor_edges: AnchorEdges,
    /// Inset from the left of the constraining rect.
    pub left_offset: f64,
    /// Inset from the right of the constraining rect.
    pub right_offset: f64,
    /// Inset from the top of the constraining rect.
    pub top_offset: f64,
    /// Inset from the bottom of the constraining rect.
    pub bottom_offset: f64,
    /// The box the sticky element may not leave.
    pub containing_block_rect: Rect,
    /// The sticky box at its static position.
    pub sticky_box_rect: Rect,
    /// Sticky offset applied at the last layout.
    pub sticky_offset_at_last_layout: Vec2,
    /// Layer position at the last layout.
    pub layer_position_at_last_layout: Point,
}

impl StickyPositionConstraints {
    /// Offset the sticky box needs to honour its insets within
    /// `constraining`, limited by the containing block.
    #[must_use]
    pub fn compute_sticky_offset(&self, constraining: Rect) -> Vec2 {
        let sticky = self.sticky_box_rect;
        let containing = self.containing_block_rect;
        let mut offset = Vec2::ZERO;

        if self.anchor_edges.contains(AnchorEdges::RIGHT) {
            let right_limit = constraining.x1 - self.right_offset;
            let available = (containing.x0 - sticky.x0).min(0.0);
            offset.x += (right_limit - sticky.x1).min(0.0).max(available);
        }
        if self.anchor_edges.contains(AnchorEdges::LEFT) {
            let left_limit = constraining.x0 + self.left_offset;
            let available = (containing.x1 - sticky.x1).max(0.0);
            offset.x += (left_limit - sticky.x0).max(0.0).min(available);
        }
        if self.anchor_edges.contains(AnchorEdges::BOTTOM) {
            let bottom_limit = constraining.y1 - self.bottom_offset;
            let available = (containing.y0 - sticky.y0).min(0.0);
            offset.y += (bottom_limit - sticky.y1).min(0.0).max(available);
        }
        if self.anchor_edges.contains(AnchorEdges::TOP) {
            let top_limit = constraining.y0 + self.top_offset;
            let available = (containing.y1 - sticky.y1).max(0.0);
            offset.y += (top_limit - sticky.y0).max(0.0).min(available);
        }
        offset
    }

    /// Layer position for the given constraining rect.
    #[must_use]
    pub fn layer_position_for_constraining_rect(&self, constraining: Rect) -> Point {
        self.layer_position_at_last_layout + self.compute_sticky_offset(constraining)
            - self.sticky_offset_at_last_layout
    }
}
