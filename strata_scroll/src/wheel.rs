// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wheel events as the scrolling thread sees them.

use kurbo::{Point, Vec2};

/// Phase of a trackpad gesture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WheelEventPhase {
    /// Not part of a gesture (a discrete mouse wheel click).
    #[default]
    None,
    /// Fingers touched down; no movement yet.
    MayBegin,
    /// First movement of a gesture.
    Began,
    /// Continued movement.
    Changed,
    /// Fingers lifted.
    Ended,
    /// The gesture was abandoned.
    Cancelled,
}

/// Phase of the inertial scroll following a gesture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MomentumPhase {
    /// No momentum.
    #[default]
    None,
    /// Momentum started.
    Began,
    /// Momentum continued.
    Changed,
    /// Momentum finished.
    Ended,
}

/// A platform wheel event.
///
/// A positive delta scrolls towards the start of the contents (content moves
/// right or down).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WheelEvent {
    /// Pointer position in root view coordinates.
    pub position: Point,
    /// Scroll delta in pixels.
    pub delta: Vec2,
    /// Gesture phase.
    pub phase: WheelEventPhase,
    /// Momentum phase.
    pub momentum_phase: MomentumPhase,
}

impl WheelEvent {
    /// A discrete wheel event at `position`.
    #[must_use]
    pub fn new(position: Point, delta: Vec2) -> Self {
        Self {
            position,
            delta,
            ..Self::default()
        }
    }

    /// Returns a copy with the given gesture phase.
    #[must_use]
    pub fn with_phase(mut self, phase: WheelEventPhase) -> Self {
        self.phase = phase;
        self
    }

    /// Returns a copy with the given momentum phase.
    #[must_use]
    pub fn with_momentum_phase(mut self, phase: MomentumPhase) -> Self {
        self.momentum_phase = phase;
        self
    }

    /// Returns `true` for events outside any gesture.
    #[must_use]
    pub fn is_non_gesture_event(&self) -> bool {
        self.phase == WheelEventPhase::None && self.momentum_phase == MomentumPhase::None
    }

    /// Returns `true` for the first event of a gesture.
    #[must_use]
    pub fn is_gesture_start(&self) -> bool {
        matches!(self.phase, WheelEventPhase::MayBegin | WheelEventPhase::Began)
    }

    /// Returns `true` once the gesture and any momentum after it are over.
    #[must_use]
    pub fn is_end_of_gesture(&self) -> bool {
        match self.momentum_phase {
            MomentumPhase::Ended => true,
            MomentumPhase::None => {
                matches!(self.phase, WheelEventPhase::Ended | WheelEventPhase::Cancelled)
            }
            MomentumPhase::Began | MomentumPhase::Changed => false,
        }
    }
}

/// Whether an event may propagate to ancestor scrollers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EventTargeting {
    /// Try the hit node, then its ancestors.
    #[default]
    Propagate,
    /// Only the hit node may handle the event.
    NodeOnly,
}

/// Outcome of wheel event handling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct WheelEventHandlingResult {
    /// Whether a scroller consumed the event.
    pub was_handled: bool,
}

impl WheelEventHandlingResult {
    /// The event was not consumed.
    #[must_use]
    pub const fn unhandled() -> Self {
        Self { was_handled: false }
    }

    /// The event was consumed if `handled` is set.
    #[must_use]
    pub const fn result(handled: bool) -> Self {
        Self {
            was_handled: handled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gesture_end_waits_for_momentum() {
        let lifted = WheelEvent::default().with_phase(WheelEventPhase::Ended);
        assert!(lifted.is_end_of_gesture());
        let coasting = WheelEvent::default().with_momentum_phase(MomentumPhase::Changed);
        assert!(!coasting.is_end_of_gesture());
        let stopped = WheelEvent::default().with_momentum_phase(MomentumPhase::Ended);
        assert!(stopped.is_end_of_gesture());
    }

    #[test]
    fn discrete_events_are_not_gestures() {
        let event = WheelEvent::new(Point::ZERO, Vec2::new(0.0, -10.0));
        assert!(event.is_non_gesture_event());
        assert!(!event.is_gesture_start());
        assert!(!event.is_end_of_gesture());
    }
}
