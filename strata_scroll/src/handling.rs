// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scrolling: wheel events, programmatic scrolls and snap animation.
//!
//! Every scroll position change funnels through
//! [`ScrollingTree::current_scroll_position_changed`], which queues the new
//! position for the main thread and marks the node for repositioning.

use core::time::Duration;

use kurbo::{Point, Vec2};
use strata_core::id::ScrollingNodeId;
use strata_core::trace::ScrollEvent;
use understory_dirty::EagerPolicy;

use crate::dirty;
use crate::node::{NodeData, ScrollType, ScrollingLayerPositionAction};
use crate::snap::{ScrollState, step_towards};
use crate::tree::{INVALID, ScrollUpdate, ScrollingTree};
use crate::viewport::layout_viewport_for_scroll_position;
use crate::wheel::{
    EventTargeting, MomentumPhase, WheelEvent, WheelEventHandlingResult, WheelEventPhase,
};

impl ScrollingTree {
    /// Scrolls `id` to `position`, clamped to its scrollable range.
    ///
    /// Frame scrollers move their layout viewport along. Returns the
    /// position actually reached. Non-scrolling kinds are left alone.
    ///
    /// # Panics
    ///
    /// Panics if `id` is unknown.
    pub fn scroll_to(
        &mut self,
        id: ScrollingNodeId,
        position: Point,
        scroll_type: ScrollType,
    ) -> Point {
        let idx = self.slot(id);
        self.scroll_to_slot(idx, position, scroll_type)
    }

    /// Records a scroll position change of `id`.
    ///
    /// Queues a [`ScrollUpdate`] for the main thread. A node with
    /// synchronous scrolling reasons always sends
    /// [`Set`](ScrollingLayerPositionAction::Set) and leaves its layers to
    /// the main thread; otherwise the node is marked so the next
    /// [`apply_layer_positions`](Self::apply_layer_positions) moves them.
    ///
    /// # Panics
    ///
    /// Panics if `id` is unknown.
    pub fn current_scroll_position_changed(
        &mut self,
        id: ScrollingNodeId,
        scroll_type: ScrollType,
        action: ScrollingLayerPositionAction,
    ) {
        let idx = self.slot(id);
        let i = idx as usize;
        let synchronous = !self.sync_reasons[i].is_empty();
        let action = if synchronous {
            ScrollingLayerPositionAction::Set
        } else {
            action
        };
        let layout_viewport_origin = match &self.data[i] {
            NodeData::FrameScrolling(frame) => Some(frame.layout_viewport.origin()),
            _ => None,
        };
        let scroll_position = self.scroll_position[i];

        self.pending_updates.push(ScrollUpdate {
            node: id,
            scroll_position,
            layout_viewport_origin,
            action,
            scroll_type,
        });
        self.pending_scroll_events.push(ScrollEvent {
            node: id,
            position: scroll_position,
            synchronous,
        });
        self.dirty.mark_with(idx, dirty::POSITION, &EagerPolicy);
    }

    /// Returns `true` if `id` would accept `event`.
    ///
    /// Only scrollable nodes accept events. With
    /// [`NodeOnly`](EventTargeting::NodeOnly) targeting that is enough;
    /// otherwise the first event of a gesture (or a discrete event) is only
    /// accepted if it can move the contents, so pinned scrollers let it
    /// propagate to their ancestors.
    ///
    /// # Panics
    ///
    /// Panics if `id` is unknown.
    #[must_use]
    pub fn can_handle_wheel_event(
        &self,
        id: ScrollingNodeId,
        event: &WheelEvent,
        targeting: EventTargeting,
    ) -> bool {
        let i = self.slot(id) as usize;
        if !self.node_type[i].is_scrolling() || !self.geometry[i].is_scrollable() {
            return false;
        }
        if targeting == EventTargeting::NodeOnly {
            return true;
        }
        if event.is_gesture_start() || event.is_non_gesture_event() {
            if event.delta == Vec2::ZERO {
                return true;
            }
            let current = self.scroll_position[i];
            return self.geometry[i].clamp(current - event.delta) != current;
        }
        true
    }

    /// Routes `event` to the scroller under the pointer.
    ///
    /// A gesture stays latched to the node that handled its first event.
    /// Without a latch the hit-tested node tries first; unless `targeting`
    /// is [`NodeOnly`](EventTargeting::NodeOnly), unhandled events then
    /// bubble to scrolling ancestors.
    pub fn handle_wheel_event(
        &mut self,
        event: &WheelEvent,
        targeting: EventTargeting,
    ) -> WheelEventHandlingResult {
        if self.root == INVALID {
            return WheelEventHandlingResult::unhandled();
        }
        if event.is_gesture_start() || event.is_non_gesture_event() {
            self.latched = INVALID;
        }

        if self.latched != INVALID {
            let id = self.node_id[self.latched as usize];
            if event.is_end_of_gesture() {
                self.latched = INVALID;
            }
            return self.handle_wheel_event_for_node(id, event, EventTargeting::NodeOnly);
        }

        let Some(hit) = self.scrolling_node_for_point(event.position) else {
            return WheelEventHandlingResult::unhandled();
        };
        let mut target = self.slot(hit);
        while target != INVALID {
            if self.node_type[target as usize].is_scrolling() {
                let id = self.node_id[target as usize];
                let result = self.handle_wheel_event_for_node(id, event, targeting);
                if result.was_handled {
                    if !event.is_non_gesture_event() && !event.is_end_of_gesture() {
                        self.latched = target;
                    }
                    return result;
                }
                if targeting == EventTargeting::NodeOnly {
                    return result;
                }
            }
            target = self.parent[target as usize];
        }
        WheelEventHandlingResult::unhandled()
    }

    /// Lets `id` handle `event`.
    ///
    /// The event is dropped if [`can_handle_wheel_event`] refuses it.
    /// Otherwise the delta is applied, the snap state is updated and the
    /// result reports whether the position moved.
    ///
    /// [`can_handle_wheel_event`]: Self::can_handle_wheel_event
    ///
    /// # Panics
    ///
    /// Panics if `id` is unknown.
    pub fn handle_wheel_event_for_node(
        &mut self,
        id: ScrollingNodeId,
        event: &WheelEvent,
        targeting: EventTargeting,
    ) -> WheelEventHandlingResult {
        if !self.can_handle_wheel_event(id, event, targeting) {
            return WheelEventHandlingResult::unhandled();
        }
        let idx = self.slot(id);
        let current = self.scroll_position[idx as usize];
        let handled = event.delta != Vec2::ZERO
            && self.scroll_to_slot(idx, current - event.delta, ScrollType::User) != current;
        self.update_snap_scroll_state(id, event);
        WheelEventHandlingResult::result(handled)
    }

    /// Advances the snap state machine of `id` after `event`.
    ///
    /// Gesture and momentum movement put the node in
    /// [`ScrollInProgress`](ScrollState::ScrollInProgress), cancelling a
    /// running snap. When the gesture ends (or after a discrete event) a
    /// node with snap offsets heads for the nearest one: animated when the
    /// scroll animator is enabled, immediately otherwise.
    ///
    /// # Panics
    ///
    /// Panics if `id` is unknown.
    pub fn update_snap_scroll_state(&mut self, id: ScrollingNodeId, event: &WheelEvent) {
        let idx = self.slot(id);
        let i = idx as usize;
        let moving = matches!(
            event.phase,
            WheelEventPhase::MayBegin | WheelEventPhase::Began | WheelEventPhase::Changed
        ) || matches!(
            event.momentum_phase,
            MomentumPhase::Began | MomentumPhase::Changed
        );
        if moving {
            self.scroll_state[i] = ScrollState::ScrollInProgress;
            return;
        }
        if !event.is_end_of_gesture() && !event.is_non_gesture_event() {
            return;
        }

        self.scroll_state[i] = ScrollState::Idle;
        if self.snap_offsets[i].is_empty() {
            return;
        }
        let current = self.scroll_position[i];
        let destination = self.snap_offsets[i].destination(current, &self.geometry[i]);
        if destination == current {
            return;
        }
        if self.config.scroll_animator_enabled {
            log::trace!("{id:?} snapping from {current:?} to {destination:?}");
            self.scroll_state[i] = ScrollState::SnapAnimating { destination };
        } else {
            self.scroll_to_slot(idx, destination, ScrollType::User);
        }
    }

    /// Advances every running snap animation by `elapsed`.
    ///
    /// Returns `true` while any node is still animating.
    pub fn animate_snap(&mut self, elapsed: Duration) -> bool {
        let max_step = self.config.snap_animation_speed * elapsed.as_secs_f64();
        let mut animating = false;
        for idx in 0..self.len {
            if !self.is_live(idx) {
                continue;
            }
            let i = idx as usize;
            let ScrollState::SnapAnimating { destination } = self.scroll_state[i] else {
                continue;
            };
            let (next, done) = step_towards(self.scroll_position[i], destination, max_step);
            let reached = self.scroll_to_slot(idx, next, ScrollType::User);
            if done || reached != next {
                self.scroll_state[i] = ScrollState::Idle;
            } else {
                animating = true;
            }
        }
        animating
    }

    pub(crate) fn scroll_to_slot(
        &mut self,
        idx: u32,
        position: Point,
        scroll_type: ScrollType,
    ) -> Point {
        let i = idx as usize;
        if !self.node_type[i].is_scrolling() {
            log::warn!(
                "ignoring scroll of non-scrolling node {:?}",
                self.node_id[i]
            );
            return self.scroll_position[i];
        }
        let clamped = self.geometry[i].clamp(position);
        if clamped == self.scroll_position[i] {
            return clamped;
        }
        self.scroll_position[i] = clamped;
        if let NodeData::FrameScrolling(frame) = &mut self.data[i] {
            frame.layout_viewport =
                layout_viewport_for_scroll_position(frame.layout_viewport, clamped, &self.geometry[i]);
        }
        self.current_scroll_position_changed(
            self.node_id[i],
            scroll_type,
            ScrollingLayerPositionAction::Sync,
        );
        clamped
    }
}
