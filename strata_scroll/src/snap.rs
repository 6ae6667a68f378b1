// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scroll snapping.

use kurbo::{Point, Vec2};

use crate::node::ScrollGeometry;

/// Per-node scroll state machine.
///
/// ```text
///   Idle ──gesture──► ScrollInProgress ──gesture end──► SnapAnimating
///    ▲                                                      │
///    └──────────────────── destination reached ─────────────┘
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum ScrollState {
    /// Not scrolling.
    #[default]
    Idle,
    /// A gesture or momentum scroll is moving the node.
    ScrollInProgress,
    /// Animating to a snap destination.
    SnapAnimating {
        /// Scroll position the animation ends at.
        destination: Point,
    },
}

/// Snap positions along each axis, in scroll position space.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SnapOffsets {
    /// Horizontal snap positions.
    pub horizontal: Vec<f64>,
    /// Vertical snap positions.
    pub vertical: Vec<f64>,
}

impl SnapOffsets {
    /// Returns `true` if neither axis snaps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.horizontal.is_empty() && self.vertical.is_empty()
    }

    /// Snap destination nearest to `position`.
    ///
    /// An axis without offsets keeps its coordinate. The result is clamped
    /// to the scrollable range.
    #[must_use]
    pub fn destination(&self, position: Point, geometry: &ScrollGeometry) -> Point {
        let x = closest_offset(&self.horizontal, position.x).unwrap_or(position.x);
        let y = closest_offset(&self.vertical, position.y).unwrap_or(position.y);
        geometry.clamp(Point::new(x, y))
    }
}

fn closest_offset(offsets: &[f64], value: f64) -> Option<f64> {
    offsets
        .iter()
        .copied()
        .filter(|o| o.is_finite())
        .min_by(|a, b| (a - value).abs().total_cmp(&(b - value).abs()))
}

/// Moves `current` towards `destination` by at most `max_step` pixels.
///
/// Returns the new position and whether the destination was reached.
#[must_use]
pub fn step_towards(current: Point, destination: Point, max_step: f64) -> (Point, bool) {
    let remaining: Vec2 = destination - current;
    let distance = remaining.hypot();
    if distance <= max_step {
        return (destination, true);
    }
    (current + remaining * (max_step / distance), false)
}
