// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Double-buffered scene-graph nodes.
//!
//! A [`CompositionLayer`] is the render-thread view of a platform layer. It
//! holds two [`CompositionState`] slots behind one lock:
//!
//! - **pending**, written by the owner thread through
//!   [`access_pending`](CompositionLayer::access_pending);
//! - **committed**, read by the render and scrolling threads.
//!
//! [`flush_state`](CompositionLayer::flush_state) publishes the fields marked
//! in the pending delta, and only those, into the committed slot. Because the
//! copy happens under the node's lock, readers observe either the whole flush
//! or none of it.
//!
//! Children are strong references. Mask, replica and backdrop are weak
//! references, so auxiliary edges never keep a node alive or form cycles.

use alloc::vec::Vec;
use std::sync::{Arc, Weak};

use kurbo::{Point, RoundedRect, Size};
use parking_lot::Mutex;

use crate::backing_store::BackingStoreProxy;
use crate::delta::LayerDelta;
use crate::geometry::Point3;
use crate::id::{LayerId, ScrollingNodeId};
use crate::layer::{AnimatedBackingStoreClient, ContentsBufferProxy, ImageBackingStore};
use crate::properties::{
    Animations, Color, Damage, DebugBorder, EventRegion, FilterOperations, LayerFlags,
    RepaintCounter,
};
use crate::transform::Transform3d;

/// Image presented by a layer and whether it is currently on screen.
#[derive(Clone, Debug, Default)]
pub struct ImageBacking {
    /// Shared image store, if the layer presents an image.
    pub store: Option<Arc<ImageBackingStore>>,
    /// Whether the image intersects the visible area.
    pub is_visible: bool,
}

/// One slot of a scene-graph node's state.
#[derive(Clone, Debug)]
pub struct CompositionState {
    /// Fields changed since the slot was last consumed.
    pub delta: LayerDelta,

    /// Position in the parent's coordinate space.
    pub position: Point,
    /// Transform origin as a fraction of the size (z in pixels).
    pub anchor_point: Point3,
    /// Layer size.
    pub size: Size,
    /// Origin of the layer's own coordinate space.
    pub bounds_origin: Point,
    /// Layer transform.
    pub transform: Transform3d,
    /// Transform applied to children.
    pub children_transform: Transform3d,
    /// Contents rectangle in layer coordinates.
    pub contents_rect: kurbo::Rect,
    /// Rounded clip for contents.
    pub contents_clipping_rect: RoundedRect,
    /// Size of one repetition of tiled contents.
    pub contents_tile_size: Size,
    /// Offset of the first repetition of tiled contents.
    pub contents_tile_phase: Size,
    /// Boolean flags.
    pub flags: LayerFlags,
    /// Opacity.
    pub opacity: f32,
    /// Filter chain.
    pub filters: FilterOperations,
    /// Mask layer.
    pub mask: Option<Weak<CompositionLayer>>,
    /// Replica layer.
    pub replica: Option<Weak<CompositionLayer>>,
    /// Backdrop layer.
    pub backdrop_layer: Option<Weak<CompositionLayer>>,
    /// Backdrop filter rectangle.
    pub backdrop_filters_rect: RoundedRect,
    /// Running animations.
    pub animations: Animations,
    /// Children in paint order.
    pub children: Vec<Arc<CompositionLayer>>,
    /// Tiled backing store.
    pub backing_store: Option<Arc<BackingStoreProxy>>,
    /// Coverage watcher for transform-animated layers.
    pub animated_backing_store_client: Option<Arc<AnimatedBackingStoreClient>>,
    /// Presented image.
    pub image_backing: ImageBacking,
    /// Solid contents color.
    pub solid_color: Color,
    /// External contents buffer.
    pub content_layer: Option<Arc<dyn ContentsBufferProxy>>,
    /// Region accepting pointer events.
    pub event_region: EventRegion,
    /// Scrolling node this layer scrolls for.
    pub scrolling_node_id: Option<ScrollingNodeId>,
    /// Debug border.
    pub debug_border: DebugBorder,
    /// Repaint counter overlay.
    pub repaint_counter: RepaintCounter,
    /// Damage for the next composite.
    pub damage: Damage,
}

impl Default for CompositionState {
    fn default() -> Self {
        Self {
            delta: LayerDelta::empty(),
            position: Point::ZERO,
            anchor_point: Point3::new(0.5, 0.5, 0.0),
            size: Size::ZERO,
            bounds_origin: Point::ZERO,
            transform: Transform3d::IDENTITY,
            children_transform: Transform3d::IDENTITY,
            contents_rect: kurbo::Rect::ZERO,
            contents_clipping_rect: RoundedRect::default(),
            contents_tile_size: Size::ZERO,
            contents_tile_phase: Size::ZERO,
            flags: LayerFlags::default(),
            opacity: 1.0,
            filters: FilterOperations::default(),
            mask: None,
            replica: None,
            backdrop_layer: None,
            backdrop_filters_rect: RoundedRect::default(),
            animations: Animations::default(),
            children: Vec::new(),
            backing_store: None,
            animated_backing_store_client: None,
            image_backing: ImageBacking::default(),
            solid_color: Color::TRANSPARENT,
            content_layer: None,
            event_region: EventRegion::default(),
            scrolling_node_id: None,
            debug_border: DebugBorder::default(),
            repaint_counter: RepaintCounter::default(),
            damage: Damage::default(),
        }
    }
}

impl CompositionState {
    /// Copies the fields marked in `src.delta` from `src` and ORs the bits into
    /// this slot's delta. Unmarked fields are left untouched.
    pub fn merge_from(&mut self, src: &mut Self) {
        let delta = src.delta;
        self.delta |= delta;
        if delta.contains(LayerDelta::POSITION) {
            self.position = src.position;
        }
        if delta.contains(LayerDelta::ANCHOR_POINT) {
            self.anchor_point = src.anchor_point;
        }
        if delta.contains(LayerDelta::SIZE) {
            self.size = src.size;
        }
        if delta.contains(LayerDelta::BOUNDS_ORIGIN) {
            self.bounds_origin = src.bounds_origin;
        }
        if delta.contains(LayerDelta::TRANSFORM) {
            self.transform = src.transform;
        }
        if delta.contains(LayerDelta::CHILDREN_TRANSFORM) {
            self.children_transform = src.children_transform;
        }
        if delta.contains(LayerDelta::CONTENTS_RECT) {
            self.contents_rect = src.contents_rect;
        }
        if delta.contains(LayerDelta::CONTENTS_CLIPPING_RECT) {
            self.contents_clipping_rect = src.contents_clipping_rect;
        }
        if delta.contains(LayerDelta::CONTENTS_TILING) {
            self.contents_tile_size = src.contents_tile_size;
            self.contents_tile_phase = src.contents_tile_phase;
        }
        if delta.contains(LayerDelta::FLAGS) {
            self.flags = src.flags;
        }
        if delta.contains(LayerDelta::OPACITY) {
            self.opacity = src.opacity;
        }
        if delta.contains(LayerDelta::FILTERS) {
            self.filters.clone_from(&src.filters);
        }
        if delta.contains(LayerDelta::MASK) {
            self.mask.clone_from(&src.mask);
        }
        if delta.contains(LayerDelta::REPLICA) {
            self.replica.clone_from(&src.replica);
        }
        if delta.contains(LayerDelta::BACKDROP) {
            self.backdrop_layer.clone_from(&src.backdrop_layer);
        }
        if delta.contains(LayerDelta::BACKDROP_RECT) {
            self.backdrop_filters_rect = src.backdrop_filters_rect;
        }
        if delta.contains(LayerDelta::ANIMATIONS) {
            self.animations.clone_from(&src.animations);
        }
        if delta.contains(LayerDelta::CHILDREN) {
            self.children.clone_from(&src.children);
        }
        if delta.contains(LayerDelta::BACKING_STORE) {
            self.backing_store.clone_from(&src.backing_store);
        }
        if delta.contains(LayerDelta::ANIMATED_BACKING_STORE_CLIENT) {
            self.animated_backing_store_client
                .clone_from(&src.animated_backing_store_client);
        }
        if delta.contains(LayerDelta::IMAGE_BACKING) {
            self.image_backing.clone_from(&src.image_backing);
        }
        if delta.contains(LayerDelta::SOLID_COLOR) {
            self.solid_color = src.solid_color;
        }
        if delta.contains(LayerDelta::CONTENT_LAYER) {
            self.content_layer.clone_from(&src.content_layer);
        }
        if delta.contains(LayerDelta::EVENT_REGION) {
            self.event_region.clone_from(&src.event_region);
        }
        if delta.contains(LayerDelta::SCROLLING_NODE) {
            self.scrolling_node_id = src.scrolling_node_id;
        }
        if delta.contains(LayerDelta::DEBUG_BORDER) {
            self.debug_border = src.debug_border;
        }
        if delta.contains(LayerDelta::REPAINT_COUNTER) {
            self.repaint_counter = src.repaint_counter;
        }
        if delta.contains(LayerDelta::DAMAGE) {
            // Damage is consumed once; the pending slot starts over.
            self.damage = core::mem::take(&mut src.damage);
        }
    }
}

#[derive(Debug, Default)]
struct Slots {
    pending: CompositionState,
    committed: CompositionState,
    generation: u64,
}

/// A thread-safe scene-graph node.
#[derive(Debug)]
pub struct CompositionLayer {
    id: LayerId,
    slots: Mutex<Slots>,
}

impl CompositionLayer {
    /// Creates a node with default state in both slots.
    #[must_use]
    pub fn new(id: LayerId) -> Arc<Self> {
        Arc::new(Self {
            id,
            slots: Mutex::new(Slots::default()),
        })
    }

    /// The platform layer this node mirrors.
    #[inline]
    #[must_use]
    pub fn id(&self) -> LayerId {
        self.id
    }

    /// Applies a batch of writes to the pending state under the node's lock.
    ///
    /// The mutator is responsible for marking the delta bits of the fields it
    /// writes.
    pub fn access_pending<R>(&self, f: impl FnOnce(&mut CompositionState) -> R) -> R {
        f(&mut self.slots.lock().pending)
    }

    /// Publishes the pending changes.
    ///
    /// Copies exactly the fields marked in the pending delta into the
    /// committed state, zeroes the pending delta and bumps the generation.
    /// Returns the generation after the flush; a flush with nothing pending
    /// leaves the generation unchanged.
    pub fn flush_state(&self) -> u64 {
        let mut slots = self.slots.lock();
        let Slots {
            pending,
            committed,
            generation,
        } = &mut *slots;
        if pending.delta.is_empty() {
            return *generation;
        }
        committed.merge_from(pending);
        pending.delta = LayerDelta::empty();
        *generation += 1;
        *generation
    }

    /// Reads the committed state.
    pub fn access_committed<R>(&self, f: impl FnOnce(&CompositionState) -> R) -> R {
        f(&self.slots.lock().committed)
    }

    /// Reads the committed state and marks its delta as consumed.
    ///
    /// The render thread calls this once per composite so the delta it sees
    /// next time covers only newer flushes. `f` also receives the generation
    /// of the state it reads, taken under the same lock.
    pub fn consume_committed<R>(&self, f: impl FnOnce(&CompositionState, u64) -> R) -> R {
        let mut slots = self.slots.lock();
        let result = f(&slots.committed, slots.generation);
        slots.committed.delta = LayerDelta::empty();
        result
    }

    /// Number of flushes that published changes.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.slots.lock().generation
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn flush_copies_only_marked_fields() {
        let layer = CompositionLayer::new(LayerId::generate());
        layer.access_pending(|state| {
            state.position = Point::new(5.0, 6.0);
            state.opacity = 0.25;
            // Only the position is marked; the opacity write must not leak.
            state.delta |= LayerDelta::POSITION;
        });
        assert_eq!(layer.flush_state(), 1);
        layer.access_committed(|state| {
            assert_eq!(state.position, Point::new(5.0, 6.0));
            assert_eq!(state.opacity, 1.0);
            assert_eq!(state.delta, LayerDelta::POSITION);
        });
        layer.access_pending(|state| assert!(state.delta.is_empty(), "pending delta is reset"));
    }

    #[test]
    fn empty_flush_keeps_generation() {
        let layer = CompositionLayer::new(LayerId::generate());
        assert_eq!(layer.flush_state(), 0);
        layer.access_pending(|state| state.delta |= LayerDelta::SIZE);
        assert_eq!(layer.flush_state(), 1);
        assert_eq!(layer.flush_state(), 1);
        assert_eq!(layer.generation(), 1);
    }

    #[test]
    fn committed_delta_accumulates_until_consumed() {
        let layer = CompositionLayer::new(LayerId::generate());
        layer.access_pending(|state| state.delta |= LayerDelta::SIZE);
        layer.flush_state();
        layer.access_pending(|state| state.delta |= LayerDelta::OPACITY);
        layer.flush_state();
        let seen = layer.consume_committed(|state, _| state.delta);
        assert_eq!(seen, LayerDelta::SIZE | LayerDelta::OPACITY);
        assert!(layer.access_committed(|state| state.delta.is_empty()));
    }

    #[test]
    fn consumed_generation_matches_the_state_read() {
        let layer = CompositionLayer::new(LayerId::generate());
        let writer = {
            let layer = Arc::clone(&layer);
            thread::spawn(move || {
                for i in 1..=2000 {
                    let v = f64::from(i);
                    layer.access_pending(|state| {
                        state.position = Point::new(v, v);
                        state.delta |= LayerDelta::POSITION;
                    });
                    layer.flush_state();
                }
            })
        };
        for _ in 0..2000 {
            let (x, generation) =
                layer.consume_committed(|s, generation| (s.position.x, generation));
            let expected = f64::from(u32::try_from(generation).unwrap());
            assert_eq!(x, expected, "generation belongs to the state read");
        }
        writer.join().unwrap();
        assert_eq!(layer.consume_committed(|_, generation| generation), 2000);
    }

    #[test]
    fn damage_moves_into_committed() {
        let layer = CompositionLayer::new(LayerId::generate());
        layer.access_pending(|state| {
            state.damage = Damage::Full;
            state.delta |= LayerDelta::DAMAGE;
        });
        layer.flush_state();
        assert_eq!(layer.access_committed(|s| s.damage.clone()), Damage::Full);
        layer.access_pending(|state| assert!(state.damage.is_empty()));
    }

    #[test]
    fn weak_mask_does_not_keep_node_alive() {
        let layer = CompositionLayer::new(LayerId::generate());
        let mask = CompositionLayer::new(LayerId::generate());
        layer.access_pending(|state| {
            state.mask = Some(Arc::downgrade(&mask));
            state.delta |= LayerDelta::MASK;
        });
        layer.flush_state();
        drop(mask);
        let alive = layer.access_committed(|s| s.mask.as_ref().and_then(Weak::upgrade).is_some());
        assert!(!alive, "mask edge is weak");
    }

    #[test]
    fn commits_are_never_torn() {
        let layer = CompositionLayer::new(LayerId::generate());
        let writer = {
            let layer = Arc::clone(&layer);
            thread::spawn(move || {
                for i in 1..=2000 {
                    let v = f64::from(i);
                    layer.access_pending(|state| {
                        state.position = Point::new(v, v);
                        state.size = Size::new(v, v);
                        state.delta |= LayerDelta::POSITION | LayerDelta::SIZE;
                    });
                    layer.flush_state();
                }
            })
        };
        let mut last_generation = 0;
        for _ in 0..2000 {
            let (position, size) = layer.access_committed(|s| (s.position, s.size));
            assert_eq!(position.x, size.width, "position and size flushed together");
            assert_eq!(position.y, size.height, "position and size flushed together");
            let generation = layer.generation();
            assert!(generation >= last_generation, "generations increase monotonically");
            last_generation = generation;
        }
        writer.join().unwrap();
        assert_eq!(layer.generation(), 2000);
    }
}
