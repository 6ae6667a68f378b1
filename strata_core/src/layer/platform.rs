// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Main-thread layer state and its flush into the scene graph.

use alloc::vec::Vec;
use core::fmt;
use std::sync::{Arc, Weak};

use kurbo::{Point, Rect, RoundedRect, Size};
use parking_lot::{Mutex, MutexGuard};

use super::client::LayerClient;
use super::contents::{
    AnimatedBackingStoreClient, ContentsBufferProxy, ImageBackingStore, NativeImage,
};
use crate::backing_store::{BackingStoreProxy, TilePainter, UpdateResult};
use crate::composition::{CompositionLayer, CompositionState};
use crate::config::TilingConfig;
use crate::delta::LayerDelta;
use crate::geometry::{IntPoint, IntRect, IntSize, Point3};
use crate::id::{LayerId, ScrollingNodeId};
use crate::paint::{LayerOwner, PaintingEngine};
use crate::properties::{
    AnimatedProperty, Animations, Color, Damage, EventRegion, FilterOperations, LayerFlags,
};
use crate::tile_buffer::TileBuffer;
use crate::trace::{LayerFlushEvent, Tracer};
use crate::transform::Transform3d;

/// Whether [`PlatformLayer::set_position_for_scrolling`] republishes a
/// position the layer already has.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForcePositionSync {
    /// Skip if unchanged.
    No,
    /// Publish and request composition even if unchanged.
    Yes,
}

/// Repaint count value meaning "counter hidden".
const REPAINT_COUNTER_HIDDEN: i32 = -1;

/// One compositing layer as seen by the main thread.
///
/// All state sits behind a per-layer lock; [`lock`](Self::lock) returns a
/// [`LayerGuard`] carrying every property accessor, so property access
/// without the lock does not compile. The layer's scene-graph node has its
/// own, independent lock.
pub struct PlatformLayer {
    id: LayerId,
    composition: Arc<CompositionLayer>,
    state: Mutex<LayerState>,
}

impl fmt::Debug for PlatformLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformLayer")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

struct LayerState {
    client: Option<Weak<dyn LayerClient>>,
    owner: Option<Weak<dyn LayerOwner>>,
    tiling: TilingConfig,
    delta: LayerDelta,

    position: Point,
    bounds_origin: Point,
    anchor_point: Point3,
    size: Size,
    transform: Transform3d,
    children_transform: Transform3d,
    visible_rect: Rect,
    transformed_visible_rect: IntRect,
    transformed_visible_rect_including_future: IntRect,
    scrolling_node_id: Option<ScrollingNodeId>,
    flags: LayerFlags,
    opacity: f32,
    contents_rect: Rect,
    contents_clipping_rect: RoundedRect,
    contents_scale: f32,
    contents_buffer: Option<Arc<dyn ContentsBufferProxy>>,
    contents_buffer_needs_display: bool,
    image_backing_store: Option<Arc<ImageBackingStore>>,
    image_backing_store_visible: bool,
    contents_color: Color,
    contents_tile_size: Size,
    contents_tile_phase: Size,
    dirty_region: Vec<IntRect>,
    damage: Damage,
    filters: FilterOperations,
    mask: Option<Weak<PlatformLayer>>,
    replica: Option<Weak<PlatformLayer>>,
    backdrop: Option<Weak<PlatformLayer>>,
    backdrop_rect: RoundedRect,
    animations: Animations,
    children: Vec<Arc<PlatformLayer>>,
    event_region: EventRegion,
    debug_border_color: Color,
    debug_border_width: f32,
    repaint_count: i32,

    backing_store: Option<Arc<BackingStoreProxy>>,
    animated_backing_store_client: Option<Arc<AnimatedBackingStoreClient>>,
    needs_tiles_update: bool,
    pending_tiles_creation: bool,
}

impl PlatformLayer {
    /// Creates a layer reporting to `client`.
    #[must_use]
    pub fn new(client: Option<&Arc<dyn LayerClient>>) -> Arc<Self> {
        let id = LayerId::generate();
        let tiling = client.map(|c| c.tiling_config()).unwrap_or_default();
        Arc::new(Self {
            id,
            composition: CompositionLayer::new(id),
            state: Mutex::new(LayerState {
                client: client.map(Arc::downgrade),
                owner: None,
                tiling,
                delta: LayerDelta::empty(),
                position: Point::ZERO,
                bounds_origin: Point::ZERO,
                anchor_point: Point3::new(0.5, 0.5, 0.0),
                size: Size::ZERO,
                transform: Transform3d::IDENTITY,
                children_transform: Transform3d::IDENTITY,
                visible_rect: Rect::ZERO,
                transformed_visible_rect: IntRect::ZERO,
                transformed_visible_rect_including_future: IntRect::ZERO,
                scrolling_node_id: None,
                flags: LayerFlags::default(),
                opacity: 1.0,
                contents_rect: Rect::ZERO,
                contents_clipping_rect: RoundedRect::default(),
                contents_scale: 1.0,
                contents_buffer: None,
                contents_buffer_needs_display: false,
                image_backing_store: None,
                image_backing_store_visible: false,
                contents_color: Color::TRANSPARENT,
                contents_tile_size: Size::ZERO,
                contents_tile_phase: Size::ZERO,
                dirty_region: Vec::new(),
                damage: Damage::default(),
                filters: FilterOperations::default(),
                mask: None,
                replica: None,
                backdrop: None,
                backdrop_rect: RoundedRect::default(),
                animations: Animations::default(),
                children: Vec::new(),
                event_region: EventRegion::default(),
                debug_border_color: Color::TRANSPARENT,
                debug_border_width: 0.0,
                repaint_count: REPAINT_COUNTER_HIDDEN,
                backing_store: None,
                animated_backing_store_client: None,
                needs_tiles_update: false,
                pending_tiles_creation: false,
            }),
        })
    }

    /// The layer's identity (shared with its scene-graph node).
    #[inline]
    #[must_use]
    pub fn id(&self) -> LayerId {
        self.id
    }

    /// The scene-graph node this layer flushes into.
    #[inline]
    #[must_use]
    pub fn composition_layer(&self) -> &Arc<CompositionLayer> {
        &self.composition
    }

    /// Acquires the layer lock.
    pub fn lock(&self) -> LayerGuard<'_> {
        LayerGuard {
            layer: self,
            state: self.state.lock(),
        }
    }

    /// Sets or clears the owning graphics layer.
    ///
    /// Gaining an owner attaches the layer to the client; losing it purges
    /// the backing stores and detaches.
    pub fn set_owner(self: &Arc<Self>, owner: Option<&Arc<dyn LayerOwner>>) {
        let client = {
            let mut state = self.state.lock();
            let unchanged = match (&state.owner, owner) {
                (None, None) => true,
                (Some(current), Some(new)) => {
                    Weak::ptr_eq(current, &Arc::downgrade(new))
                }
                _ => false,
            };
            if unchanged {
                return;
            }
            state.owner = owner.map(Arc::downgrade);
            state.client()
        };
        let Some(client) = client else {
            return;
        };
        if owner.is_some() {
            client.attach_layer(self);
        } else {
            self.purge_backing_stores();
            client.detach_layer(self);
        }
    }

    /// Purges backing stores and forgets the client; later callbacks are
    /// no-ops.
    pub fn invalidate_client(&self) {
        self.purge_backing_stores();
        self.state.lock().client = None;
    }

    /// Drops the tiled, animated and image backing stores.
    pub fn purge_backing_stores(&self) {
        let mut state = self.state.lock();
        state.backing_store = None;
        if let Some(client) = state.animated_backing_store_client.take() {
            client.invalidate();
        }
        state.image_backing_store = None;
    }

    /// Updates the position without marking it for flush.
    ///
    /// Used when the scene graph already holds the position (it came from
    /// the scrolling thread).
    pub fn sync_position(&self, position: Point) {
        let state = &mut *self.state.lock();
        if state.position == position {
            return;
        }
        state.position = position;
        state.notify_composition_required();
    }

    /// Updates the bounds origin without marking it for flush.
    pub fn sync_bounds_origin(&self, origin: Point) {
        let state = &mut *self.state.lock();
        if state.bounds_origin == origin {
            return;
        }
        state.bounds_origin = origin;
        state.notify_composition_required();
    }

    /// Sets the position from the scrolling thread.
    ///
    /// The position is published straight to the scene-graph node and
    /// composition is requested, so scrolling stays responsive while the
    /// main thread is busy.
    pub fn set_position_for_scrolling(&self, position: Point, force: ForcePositionSync) {
        let state = &mut *self.state.lock();
        if force == ForcePositionSync::No && state.position == position {
            return;
        }
        state.position = position;
        self.composition.access_pending(|pending| {
            pending.position = position;
            pending.delta |= LayerDelta::POSITION;
        });
        self.composition.flush_state();
        if let Some(client) = state.client() {
            client.request_composition();
        }
    }

    /// Sets the bounds origin from the scrolling thread.
    ///
    /// Overflow scrolling moves the scroll container's bounds origin instead
    /// of the contents position; otherwise this behaves like
    /// [`set_position_for_scrolling`](Self::set_position_for_scrolling).
    pub fn set_bounds_origin_for_scrolling(&self, origin: Point, force: ForcePositionSync) {
        let state = &mut *self.state.lock();
        if force == ForcePositionSync::No && state.bounds_origin == origin {
            return;
        }
        state.bounds_origin = origin;
        self.composition.access_pending(|pending| {
            pending.bounds_origin = origin;
            pending.delta |= LayerDelta::BOUNDS_ORIGIN;
        });
        self.composition.flush_state();
        if let Some(client) = state.client() {
            client.request_composition();
        }
    }

    /// Asks the client to composite without waiting for the main thread.
    pub fn request_composition(&self) {
        let client = self.state.lock().client();
        if let Some(client) = client {
            client.request_composition();
        }
    }

    /// Returns `true` while the client has a composition scheduled or running.
    ///
    /// A layer without a live client reports `false`.
    pub fn is_composition_required_or_ongoing(&self) -> bool {
        let client = self.state.lock().client();
        client.is_some_and(|client| client.is_composition_required_or_ongoing())
    }

    /// Runs one composition cycle for this layer.
    ///
    /// In order: swaps a pending external buffer; creates or destroys the
    /// tiled backing store; creates or destroys the animated backing store
    /// client; refreshes image visibility; copies changed fields into the
    /// scene-graph node; updates tiles; flushes the node; recurses into the
    /// backdrop layer.
    ///
    /// Does nothing once the owner is gone.
    pub fn update_contents(&self, affected_by_transform_animation: bool, tracer: &mut Tracer<'_>) {
        let backdrop = {
            let state = &mut *self.state.lock();
            let Some(owner) = state.owner.as_ref().and_then(Weak::upgrade) else {
                return;
            };

            if state.contents_buffer_needs_display {
                if let Some(buffer) = &state.contents_buffer {
                    buffer.swap_buffers_if_needed();
                }
                state.contents_buffer_needs_display = false;
            }

            if state.needs_backing_store() {
                if state.backing_store.is_none() {
                    state.backing_store = Some(Arc::new(BackingStoreProxy::new(
                        self.id,
                        state.contents_scale,
                        state.tiling,
                    )));
                    state.delta |= LayerDelta::BACKING_STORE;
                    state.needs_tiles_update = true;
                }
            } else if state.backing_store.take().is_some() {
                state.delta |= LayerDelta::BACKING_STORE;
            }

            if state.backing_store.is_some() && affected_by_transform_animation {
                if state.animated_backing_store_client.is_none() {
                    state.animated_backing_store_client =
                        Some(AnimatedBackingStoreClient::new(&owner));
                    state.delta |= LayerDelta::ANIMATED_BACKING_STORE_CLIENT;
                }
            } else if let Some(client) = state.animated_backing_store_client.take() {
                client.invalidate();
                state.delta |= LayerDelta::ANIMATED_BACKING_STORE_CLIENT;
            }

            if state.image_backing_store.is_some() {
                let was_visible = state.image_backing_store_visible;
                state.image_backing_store_visible = state
                    .transformed_visible_rect
                    .intersects(IntRect::enclosing(state.contents_rect));
                if was_visible != state.image_backing_store_visible {
                    state.delta |= LayerDelta::IMAGE_BACKING;
                }
            }

            let flushed = state.delta;
            if !flushed.is_empty() {
                self.composition
                    .access_pending(|pending| state.copy_into(pending));
                state.delta = LayerDelta::empty();
            }

            if state.backing_store.is_some() {
                state.update_backing_store(&owner, tracer);
            }

            if !flushed.is_empty() {
                let generation = self.composition.flush_state();
                tracer.layer_flush(&LayerFlushEvent {
                    layer: self.id,
                    delta: flushed,
                    generation,
                });
            }

            state.backdrop.as_ref().and_then(Weak::upgrade)
        };

        if let Some(backdrop) = backdrop {
            backdrop.update_contents(affected_by_transform_animation, tracer);
        }
    }
}

impl LayerState {
    fn client(&self) -> Option<Arc<dyn LayerClient>> {
        self.client.as_ref().and_then(Weak::upgrade)
    }

    fn notify_composition_required(&self) {
        if let Some(client) = self.client() {
            client.notify_composition_required();
        }
    }

    fn needs_backing_store(&self) -> bool {
        if !self.flags.contains(LayerFlags::DRAWS_CONTENT)
            || !self.flags.contains(LayerFlags::CONTENTS_VISIBLE)
            || self.size.is_zero_area()
        {
            return false;
        }
        // Fully transparent, unless an animation may bring the opacity back.
        if self.opacity == 0.0
            && !self
                .animations
                .has_active_animations_of_type(AnimatedProperty::Opacity)
        {
            return false;
        }
        !self.filters.forces_zero_opacity()
    }

    /// Copies the fields marked in the local delta into `pending`.
    fn copy_into(&mut self, pending: &mut CompositionState) {
        let delta = self.delta;
        pending.delta |= delta;
        if delta.contains(LayerDelta::POSITION) {
            pending.position = self.position;
        }
        if delta.contains(LayerDelta::ANCHOR_POINT) {
            pending.anchor_point = self.anchor_point;
        }
        if delta.contains(LayerDelta::SIZE) {
            pending.size = self.size;
        }
        if delta.contains(LayerDelta::BOUNDS_ORIGIN) {
            pending.bounds_origin = self.bounds_origin;
        }
        if delta.contains(LayerDelta::TRANSFORM) {
            pending.transform = self.transform;
        }
        if delta.contains(LayerDelta::CHILDREN_TRANSFORM) {
            pending.children_transform = self.children_transform;
        }
        if delta.contains(LayerDelta::CONTENTS_RECT) {
            pending.contents_rect = self.contents_rect;
        }
        if delta.contains(LayerDelta::CONTENTS_CLIPPING_RECT) {
            pending.contents_clipping_rect = self.contents_clipping_rect;
        }
        if delta.contains(LayerDelta::CONTENTS_TILING) {
            pending.contents_tile_size = self.contents_tile_size;
            pending.contents_tile_phase = self.contents_tile_phase;
        }
        if delta.contains(LayerDelta::FLAGS) {
            pending.flags = self.flags;
        }
        if delta.contains(LayerDelta::OPACITY) {
            pending.opacity = self.opacity;
        }
        if delta.contains(LayerDelta::FILTERS) {
            pending.filters.clone_from(&self.filters);
        }
        if delta.contains(LayerDelta::MASK) {
            pending.mask = composition_edge(self.mask.as_ref());
        }
        if delta.contains(LayerDelta::REPLICA) {
            pending.replica = composition_edge(self.replica.as_ref());
        }
        if delta.contains(LayerDelta::BACKDROP) {
            pending.backdrop_layer = composition_edge(self.backdrop.as_ref());
        }
        if delta.contains(LayerDelta::BACKDROP_RECT) {
            pending.backdrop_filters_rect = self.backdrop_rect;
        }
        if delta.contains(LayerDelta::ANIMATIONS) {
            pending.animations.clone_from(&self.animations);
        }
        if delta.contains(LayerDelta::CHILDREN) {
            pending.children = self
                .children
                .iter()
                .map(|child| Arc::clone(&child.composition))
                .collect();
        }
        if delta.contains(LayerDelta::BACKING_STORE) {
            pending.backing_store.clone_from(&self.backing_store);
        }
        if delta.contains(LayerDelta::ANIMATED_BACKING_STORE_CLIENT) {
            pending
                .animated_backing_store_client
                .clone_from(&self.animated_backing_store_client);
        }
        if delta.contains(LayerDelta::IMAGE_BACKING) {
            pending.image_backing.store.clone_from(&self.image_backing_store);
            pending.image_backing.is_visible = self.image_backing_store_visible;
        }
        if delta.contains(LayerDelta::SOLID_COLOR) {
            pending.solid_color = self.contents_color;
        }
        if delta.contains(LayerDelta::CONTENT_LAYER) {
            pending.content_layer.clone_from(&self.contents_buffer);
        }
        if delta.contains(LayerDelta::EVENT_REGION) {
            pending.event_region.clone_from(&self.event_region);
        }
        if delta.contains(LayerDelta::SCROLLING_NODE) {
            pending.scrolling_node_id = self.scrolling_node_id;
        }
        if delta.contains(LayerDelta::DEBUG_BORDER) {
            pending.debug_border.visible = self.debug_border_color.is_visible();
            pending.debug_border.color = self.debug_border_color;
            pending.debug_border.width = self.debug_border_width;
        }
        if delta.contains(LayerDelta::REPAINT_COUNTER) {
            pending.repaint_counter.visible = self.repaint_count != REPAINT_COUNTER_HIDDEN;
            pending.repaint_counter.count = self.repaint_count;
        }
        if delta.contains(LayerDelta::DAMAGE) {
            pending.damage = core::mem::take(&mut self.damage);
        }
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "layer sizes fit in i32; float-to-int casts saturate"
    )]
    fn update_backing_store(&mut self, owner: &Arc<dyn LayerOwner>, tracer: &mut Tracer<'_>) {
        let Some(client) = self.client() else {
            return;
        };
        let Some(store) = self.backing_store.clone() else {
            return;
        };
        let scale_changed = store.set_contents_scale(self.contents_scale);
        if !scale_changed
            && self.dirty_region.is_empty()
            && !self.pending_tiles_creation
            && !self.needs_tiles_update
        {
            return;
        }

        let contents_rect = IntRect::from_origin_size(
            IntPoint::ZERO,
            IntSize::new(self.size.width as i32, self.size.height as i32),
        );
        let painter = LayerTilePainter {
            engine: client.painting_engine(),
            owner: &**owner,
            contents_opaque: self.flags.contains(LayerFlags::CONTENTS_OPAQUE),
            contents_scale: self.contents_scale,
        };
        let force = self.pending_tiles_creation || self.needs_tiles_update;
        let visible = self.transformed_visible_rect_including_future;
        let result = store.update_if_needed(
            visible,
            contents_rect,
            force,
            &mut self.dirty_region,
            &painter,
            tracer,
        );
        self.needs_tiles_update = false;

        if let Some(animated) = &self.animated_backing_store_client {
            animated.update(
                self.visible_rect,
                store.cover_rect(),
                self.size,
                self.contents_scale,
            );
        }

        if result.contains(UpdateResult::TILES_CHANGED) {
            if self.repaint_count != REPAINT_COUNTER_HIDDEN
                && result.contains(UpdateResult::BUFFERS_CHANGED)
            {
                self.repaint_count = owner.increment_repaint_count();
                self.delta |= LayerDelta::REPAINT_COUNTER;
            }
            client.notify_composition_required();
        }
        self.pending_tiles_creation = result.contains(UpdateResult::TILES_PENDING);
    }
}

fn composition_edge(layer: Option<&Weak<PlatformLayer>>) -> Option<Weak<CompositionLayer>> {
    layer
        .and_then(Weak::upgrade)
        .map(|layer| Arc::downgrade(&layer.composition))
}

fn same_layer(a: Option<&Weak<PlatformLayer>>, b: Option<&Arc<PlatformLayer>>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => core::ptr::eq(a.as_ptr(), Arc::as_ptr(b)),
        _ => false,
    }
}

/// Paints tiles of one layer through the client's engine.
struct LayerTilePainter<'a> {
    engine: Arc<dyn PaintingEngine>,
    owner: &'a dyn LayerOwner,
    contents_opaque: bool,
    contents_scale: f32,
}

impl TilePainter for LayerTilePainter<'_> {
    fn paint(&self, dirty_rect: IntRect) -> Option<Arc<TileBuffer>> {
        self.engine.paint_layer(
            self.owner,
            dirty_rect,
            self.contents_opaque,
            self.contents_scale,
        )
    }
}

/// Exclusive access to a layer's properties.
///
/// Every setter compares against the current value and returns early when
/// unchanged; otherwise it stores the value, marks the field's delta bit and
/// notifies the client that composition is required.
pub struct LayerGuard<'a> {
    layer: &'a PlatformLayer,
    state: MutexGuard<'a, LayerState>,
}

impl fmt::Debug for LayerGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerGuard")
            .field("layer", &self.layer.id)
            .field("delta", &self.state.delta)
            .finish_non_exhaustive()
    }
}

impl LayerGuard<'_> {
    fn set<T: PartialEq>(
        &mut self,
        bit: LayerDelta,
        value: T,
        field: impl FnOnce(&mut LayerState) -> &mut T,
    ) {
        let slot = field(&mut *self.state);
        if *slot == value {
            return;
        }
        *slot = value;
        self.state.delta |= bit;
        self.state.notify_composition_required();
    }

    fn set_flag(&mut self, flag: LayerFlags, value: bool) {
        if self.state.flags.contains(flag) == value {
            return;
        }
        self.state.flags.set(flag, value);
        self.state.delta |= LayerDelta::FLAGS;
        self.state.notify_composition_required();
    }

    /// Fields changed since the last flush.
    #[must_use]
    pub fn delta(&self) -> LayerDelta {
        self.state.delta
    }

    /// Sets the position in the parent's coordinate space.
    pub fn set_position(&mut self, position: Point) {
        self.set(LayerDelta::POSITION, position, |s| &mut s.position);
    }

    /// Position in the parent's coordinate space.
    #[must_use]
    pub fn position(&self) -> Point {
        self.state.position
    }

    /// Sets the origin of the layer's own coordinate space.
    pub fn set_bounds_origin(&mut self, origin: Point) {
        self.set(LayerDelta::BOUNDS_ORIGIN, origin, |s| &mut s.bounds_origin);
    }

    /// Origin of the layer's own coordinate space.
    #[must_use]
    pub fn bounds_origin(&self) -> Point {
        self.state.bounds_origin
    }

    /// Sets the transform origin.
    pub fn set_anchor_point(&mut self, anchor_point: Point3) {
        self.set(LayerDelta::ANCHOR_POINT, anchor_point, |s| {
            &mut s.anchor_point
        });
    }

    /// Transform origin.
    #[must_use]
    pub fn anchor_point(&self) -> Point3 {
        self.state.anchor_point
    }

    /// Sets the layer size.
    pub fn set_size(&mut self, size: Size) {
        self.set(LayerDelta::SIZE, size, |s| &mut s.size);
    }

    /// Layer size.
    #[must_use]
    pub fn size(&self) -> Size {
        self.state.size
    }

    /// Sets the layer transform.
    pub fn set_transform(&mut self, transform: Transform3d) {
        self.set(LayerDelta::TRANSFORM, transform, |s| &mut s.transform);
    }

    /// Layer transform.
    #[must_use]
    pub fn transform(&self) -> Transform3d {
        self.state.transform
    }

    /// Sets the transform applied to children.
    pub fn set_children_transform(&mut self, transform: Transform3d) {
        self.set(LayerDelta::CHILDREN_TRANSFORM, transform, |s| {
            &mut s.children_transform
        });
    }

    /// Transform applied to children.
    #[must_use]
    pub fn children_transform(&self) -> Transform3d {
        self.state.children_transform
    }

    /// Records that an ancestor transform changed; tiles are recomputed next
    /// cycle.
    pub fn did_update_layer_transform(&mut self) {
        self.state.needs_tiles_update = true;
    }

    /// Sets the visible rect in surface coordinates. Not flushed.
    pub fn set_visible_rect(&mut self, visible_rect: Rect) {
        self.state.visible_rect = visible_rect;
    }

    /// Sets the visible rect in layer coordinates, now and including
    /// predicted movement. Not flushed; schedules a tile update.
    pub fn set_transformed_visible_rect(&mut self, rect: IntRect, including_future: IntRect) {
        if self.state.transformed_visible_rect == rect
            && self.state.transformed_visible_rect_including_future == including_future
        {
            return;
        }
        self.state.transformed_visible_rect = rect;
        self.state.transformed_visible_rect_including_future = including_future;
        self.state.needs_tiles_update = true;
    }

    /// Associates the layer with a scrolling node.
    pub fn set_scrolling_node_id(&mut self, node: Option<ScrollingNodeId>) {
        self.set(LayerDelta::SCROLLING_NODE, node, |s| &mut s.scrolling_node_id);
    }

    /// The scrolling node this layer hosts, if any.
    pub fn scrolling_node_id(&self) -> Option<ScrollingNodeId> {
        self.state.scrolling_node_id
    }

    /// Sets whether the owner paints into a backing store.
    pub fn set_draws_content(&mut self, draws_content: bool) {
        self.set_flag(LayerFlags::DRAWS_CONTENT, draws_content);
    }

    /// Sets whether descendants are clipped to the bounds.
    pub fn set_masks_to_bounds(&mut self, masks_to_bounds: bool) {
        self.set_flag(LayerFlags::MASKS_TO_BOUNDS, masks_to_bounds);
    }

    /// Sets whether children share this layer's 3D rendering context.
    pub fn set_preserves_3d(&mut self, preserves_3d: bool) {
        self.set_flag(LayerFlags::PRESERVES_3D, preserves_3d);
    }

    /// Sets whether the back face is drawn.
    pub fn set_backface_visibility(&mut self, visible: bool) {
        self.set_flag(LayerFlags::BACKFACE_VISIBLE, visible);
    }

    /// Sets whether contents are shown.
    pub fn set_contents_visible(&mut self, visible: bool) {
        self.set_flag(LayerFlags::CONTENTS_VISIBLE, visible);
    }

    /// Whether contents are shown.
    #[must_use]
    pub fn contents_visible(&self) -> bool {
        self.state.flags.contains(LayerFlags::CONTENTS_VISIBLE)
    }

    /// Sets whether contents cover every pixel.
    pub fn set_contents_opaque(&mut self, opaque: bool) {
        self.set_flag(LayerFlags::CONTENTS_OPAQUE, opaque);
    }

    /// Sets whether descendants are clipped to the contents clipping rect.
    pub fn set_contents_rect_clips_descendants(&mut self, clips: bool) {
        self.set_flag(LayerFlags::CONTENTS_RECT_CLIPS_DESCENDANTS, clips);
    }

    /// Current flags.
    #[must_use]
    pub fn flags(&self) -> LayerFlags {
        self.state.flags
    }

    /// Sets the opacity.
    pub fn set_opacity(&mut self, opacity: f32) {
        self.set(LayerDelta::OPACITY, opacity, |s| &mut s.opacity);
    }

    /// Opacity.
    #[must_use]
    pub fn opacity(&self) -> f32 {
        self.state.opacity
    }

    /// Sets the contents rectangle.
    pub fn set_contents_rect(&mut self, rect: Rect) {
        self.set(LayerDelta::CONTENTS_RECT, rect, |s| &mut s.contents_rect);
    }

    /// Sets the rounded clip for contents.
    pub fn set_contents_clipping_rect(&mut self, rect: RoundedRect) {
        self.set(LayerDelta::CONTENTS_CLIPPING_RECT, rect, |s| {
            &mut s.contents_clipping_rect
        });
    }

    /// Sets the rasterization scale.
    ///
    /// An existing backing store switches scale immediately (dropping its
    /// tiles) and is rebuilt on the next cycle.
    ///
    /// # Panics
    ///
    /// Panics if a backing store exists and `scale` is not a positive finite
    /// number.
    pub fn set_contents_scale(&mut self, scale: f32) {
        if self.state.contents_scale == scale {
            return;
        }
        self.state.contents_scale = scale;
        if let Some(store) = &self.state.backing_store {
            store.set_contents_scale(scale);
            self.state.delta |= LayerDelta::BACKING_STORE;
            self.state.needs_tiles_update = true;
        }
        self.state.notify_composition_required();
    }

    /// Rasterization scale.
    #[must_use]
    pub fn contents_scale(&self) -> f32 {
        self.state.contents_scale
    }

    /// Sets the external contents producer.
    pub fn set_contents_buffer(&mut self, buffer: Option<Arc<dyn ContentsBufferProxy>>) {
        let unchanged = match (&self.state.contents_buffer, &buffer) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        if unchanged {
            return;
        }
        if buffer.is_some() {
            self.state.contents_buffer_needs_display = true;
        }
        self.state.contents_buffer = buffer;
        self.state.delta |= LayerDelta::CONTENT_LAYER;
        self.state.notify_composition_required();
    }

    /// Requests a buffer swap on the next cycle.
    pub fn set_contents_buffer_needs_display(&mut self) {
        if self.state.contents_buffer_needs_display {
            return;
        }
        self.state.contents_buffer_needs_display = true;
        self.state.notify_composition_required();
    }

    /// Sets the presented image. The backing store comes from the client,
    /// which shares it between layers showing the same image.
    pub fn set_contents_image(&mut self, image: Option<Arc<NativeImage>>) {
        match image {
            Some(image) => {
                if let Some(store) = &self.state.image_backing_store
                    && store.is_same_native_image(&image)
                {
                    return;
                }
                let Some(client) = self.state.client() else {
                    log::debug!("{:?}: no client to store image {:?}", self.layer.id, image.id());
                    return;
                };
                self.state.image_backing_store = Some(client.image_backing_store(image));
            }
            None => {
                if self.state.image_backing_store.take().is_none() {
                    return;
                }
            }
        }
        self.state.delta |= LayerDelta::IMAGE_BACKING;
        self.state.notify_composition_required();
    }

    /// Sets the solid contents color.
    pub fn set_contents_color(&mut self, color: Color) {
        self.set(LayerDelta::SOLID_COLOR, color, |s| &mut s.contents_color);
    }

    /// Sets the size of one repetition of tiled contents.
    pub fn set_contents_tile_size(&mut self, size: Size) {
        self.set(LayerDelta::CONTENTS_TILING, size, |s| {
            &mut s.contents_tile_size
        });
    }

    /// Sets the offset of tiled contents.
    pub fn set_contents_tile_phase(&mut self, phase: Size) {
        self.set(LayerDelta::CONTENTS_TILING, phase, |s| {
            &mut s.contents_tile_phase
        });
    }

    /// Replaces the region needing repaint (layer coordinates).
    pub fn set_dirty_region(&mut self, dirty_region: Vec<IntRect>) {
        if self.state.dirty_region == dirty_region {
            return;
        }
        self.state.dirty_region = dirty_region;
        if self.state.backing_store.is_some() {
            self.state.delta |= LayerDelta::BACKING_STORE;
        }
        self.state.notify_composition_required();
    }

    /// Sets the damage for the next composite. Does not request composition
    /// by itself.
    pub fn set_damage(&mut self, damage: Damage) {
        if self.state.damage == damage {
            return;
        }
        self.state.damage = damage;
        self.state.delta |= LayerDelta::DAMAGE;
    }

    /// Sets the filter chain.
    pub fn set_filters(&mut self, filters: FilterOperations) {
        self.set(LayerDelta::FILTERS, filters, |s| &mut s.filters);
    }

    /// Sets the mask layer.
    pub fn set_mask(&mut self, mask: Option<&Arc<PlatformLayer>>) {
        if same_layer(self.state.mask.as_ref(), mask) {
            return;
        }
        self.state.mask = mask.map(Arc::downgrade);
        self.state.delta |= LayerDelta::MASK;
        self.state.notify_composition_required();
    }

    /// Sets the replica layer.
    pub fn set_replica(&mut self, replica: Option<&Arc<PlatformLayer>>) {
        if same_layer(self.state.replica.as_ref(), replica) {
            return;
        }
        self.state.replica = replica.map(Arc::downgrade);
        self.state.delta |= LayerDelta::REPLICA;
        self.state.notify_composition_required();
    }

    /// Sets the backdrop layer.
    pub fn set_backdrop(&mut self, backdrop: Option<&Arc<PlatformLayer>>) {
        if same_layer(self.state.backdrop.as_ref(), backdrop) {
            return;
        }
        self.state.backdrop = backdrop.map(Arc::downgrade);
        self.state.delta |= LayerDelta::BACKDROP;
        self.state.notify_composition_required();
    }

    /// Sets the backdrop filter rectangle.
    pub fn set_backdrop_rect(&mut self, rect: RoundedRect) {
        self.set(LayerDelta::BACKDROP_RECT, rect, |s| &mut s.backdrop_rect);
    }

    /// Sets the running animations.
    pub fn set_animations(&mut self, animations: Animations) {
        self.set(LayerDelta::ANIMATIONS, animations, |s| &mut s.animations);
    }

    /// Running animations.
    #[must_use]
    pub fn animations(&self) -> &Animations {
        &self.state.animations
    }

    /// Replaces the child list.
    ///
    /// # Panics
    ///
    /// Panics if the layer is listed as its own child.
    pub fn set_children(&mut self, children: Vec<Arc<PlatformLayer>>) {
        assert!(
            !children
                .iter()
                .any(|c| core::ptr::eq(Arc::as_ptr(c), self.layer)),
            "a layer cannot be its own child"
        );
        let unchanged = self.state.children.len() == children.len()
            && self
                .state
                .children
                .iter()
                .zip(&children)
                .all(|(a, b)| Arc::ptr_eq(a, b));
        if unchanged {
            return;
        }
        self.state.children = children;
        self.state.delta |= LayerDelta::CHILDREN;
        self.state.notify_composition_required();
    }

    /// Children in paint order.
    #[must_use]
    pub fn children(&self) -> &[Arc<PlatformLayer>] {
        &self.state.children
    }

    /// Sets the region accepting pointer events.
    pub fn set_event_region(&mut self, region: EventRegion) {
        self.set(LayerDelta::EVENT_REGION, region, |s| &mut s.event_region);
    }

    /// The region accepting pointer events.
    pub fn event_region(&self) -> &EventRegion {
        &self.state.event_region
    }

    /// Sets the debug border.
    pub fn set_debug_border(&mut self, color: Color, width: f32) {
        if self.state.debug_border_color == color && self.state.debug_border_width == width {
            return;
        }
        self.state.debug_border_color = color;
        self.state.debug_border_width = width;
        self.state.delta |= LayerDelta::DEBUG_BORDER;
        self.state.notify_composition_required();
    }

    /// Shows or hides the repaint counter.
    pub fn set_show_repaint_counter(&mut self, show: bool) {
        let shown = self.state.repaint_count != REPAINT_COUNTER_HIDDEN;
        if shown == show {
            return;
        }
        self.state.repaint_count = if show {
            self.state
                .owner
                .as_ref()
                .and_then(Weak::upgrade)
                .map_or(0, |owner| owner.repaint_count())
        } else {
            REPAINT_COUNTER_HIDDEN
        };
        self.state.delta |= LayerDelta::REPAINT_COUNTER;
        self.state.notify_composition_required();
    }

    /// Repaint count shown by the counter, or `None` when hidden.
    #[must_use]
    pub fn repaint_count(&self) -> Option<i32> {
        (self.state.repaint_count != REPAINT_COUNTER_HIDDEN).then_some(self.state.repaint_count)
    }

    /// Returns `true` if the layer needs a tiled backing store: it draws
    /// visible, non-empty contents that are not fully transparent.
    ///
    /// Zero opacity still needs a store while an opacity animation is
    /// active, since the animation may make it visible.
    #[must_use]
    pub fn needs_backing_store(&self) -> bool {
        self.state.needs_backing_store()
    }

    /// The tiled backing store, if any.
    #[must_use]
    pub fn backing_store(&self) -> Option<&Arc<BackingStoreProxy>> {
        self.state.backing_store.as_ref()
    }

    /// The animated backing store client, if any.
    #[must_use]
    pub fn animated_backing_store_client(&self) -> Option<&Arc<AnimatedBackingStoreClient>> {
        self.state.animated_backing_store_client.as_ref()
    }

    /// The image backing store, if any.
    #[must_use]
    pub fn image_backing_store(&self) -> Option<&Arc<ImageBackingStore>> {
        self.state.image_backing_store.as_ref()
    }

    /// Whether the last tile update left tiles unpainted.
    #[must_use]
    pub fn has_pending_tiles(&self) -> bool {
        self.state.pending_tiles_creation
    }
}

#[cfg(test)]
mod tests {
    use core::sync::atomic::{AtomicI32, AtomicUsize, Ordering};

    use super::*;
    use crate::paint::GraphicsContext;
    use crate::properties::{Animation, FilterOperation};
    use crate::tile_buffer::TileBufferFlags;

    #[derive(Default)]
    struct TestClient {
        notified: AtomicUsize,
        requested: AtomicUsize,
        attached: AtomicUsize,
        detached: AtomicUsize,
        engine: Arc<TestEngine>,
    }

    impl LayerClient for TestClient {
        fn notify_composition_required(&self) {
            self.notified.fetch_add(1, Ordering::Relaxed);
        }
        fn request_composition(&self) {
            self.requested.fetch_add(1, Ordering::Relaxed);
        }
        fn attach_layer(&self, _: &Arc<PlatformLayer>) {
            self.attached.fetch_add(1, Ordering::Relaxed);
        }
        fn detach_layer(&self, _: &Arc<PlatformLayer>) {
            self.detached.fetch_add(1, Ordering::Relaxed);
        }
        fn painting_engine(&self) -> Arc<dyn PaintingEngine> {
            self.engine.clone()
        }
        fn tiling_config(&self) -> TilingConfig {
            TilingConfig {
                tile_size: 64,
                coverage_margin_tiles: 0,
                keep_margin_tiles: 0,
                max_concurrent_tile_renders: 8,
            }
        }
    }

    #[derive(Default)]
    struct TestEngine {
        painted: Mutex<Vec<IntRect>>,
    }

    impl PaintingEngine for TestEngine {
        fn paint_layer(
            &self,
            owner: &dyn LayerOwner,
            dirty_rect: IntRect,
            _: bool,
            _: f32,
        ) -> Option<Arc<TileBuffer>> {
            self.painted.lock().push(dirty_rect);
            owner.increment_repaint_count();
            Some(Arc::new(TileBuffer::new(
                dirty_rect.size(),
                TileBufferFlags::SUPPORTS_ALPHA,
            )?))
        }
    }

    #[derive(Default)]
    struct TestOwner {
        repaints: AtomicI32,
    }

    impl LayerOwner for TestOwner {
        fn paint_contents(&self, _: &mut dyn GraphicsContext, _: Rect) {}
        fn repaint_count(&self) -> i32 {
            self.repaints.load(Ordering::Relaxed)
        }
        fn increment_repaint_count(&self) -> i32 {
            self.repaints.fetch_add(1, Ordering::Relaxed) + 1
        }
    }

    struct Fixture {
        client: Arc<TestClient>,
        owner: Arc<dyn LayerOwner>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                client: Arc::new(TestClient::default()),
                owner: Arc::new(TestOwner::default()),
            }
        }

        fn layer(&self) -> Arc<PlatformLayer> {
            let client: Arc<dyn LayerClient> = self.client.clone();
            let layer = PlatformLayer::new(Some(&client));
            layer.set_owner(Some(&self.owner));
            layer
        }

        fn notified(&self) -> usize {
            self.client.notified.load(Ordering::Relaxed)
        }
    }

    fn make_drawing(layer: &PlatformLayer, size: f64) {
        let mut guard = layer.lock();
        guard.set_draws_content(true);
        guard.set_size(Size::new(size, size));
        let rect = IntRect::new(0, 0, size as i32, size as i32);
        guard.set_transformed_visible_rect(rect, rect);
    }

    fn flush(layer: &PlatformLayer) {
        layer.update_contents(false, &mut Tracer::none());
    }

    #[test]
    fn unchanged_setters_do_not_notify() {
        let fixture = Fixture::new();
        let layer = fixture.layer();
        let mut guard = layer.lock();
        guard.set_position(Point::new(5.0, 5.0));
        guard.set_position(Point::new(5.0, 5.0));
        guard.set_opacity(1.0);
        guard.set_contents_visible(true);
        assert_eq!(fixture.notified(), 1, "only the first position change notifies");
        assert_eq!(guard.delta(), LayerDelta::POSITION);
    }

    #[test]
    fn flush_publishes_only_changed_fields() {
        let fixture = Fixture::new();
        let layer = fixture.layer();
        {
            let mut guard = layer.lock();
            guard.set_position(Point::new(10.0, 20.0));
            guard.set_opacity(0.5);
        }
        flush(&layer);
        assert!(layer.lock().delta().is_empty(), "local delta is cleared");
        layer.composition_layer().access_committed(|state| {
            assert_eq!(state.delta, LayerDelta::POSITION | LayerDelta::OPACITY);
            assert_eq!(state.position, Point::new(10.0, 20.0));
            assert_eq!(state.opacity, 0.5);
        });
        assert_eq!(layer.composition_layer().generation(), 1);

        // Nothing changed: no new generation.
        flush(&layer);
        assert_eq!(layer.composition_layer().generation(), 1);
    }

    #[test]
    fn backing_store_requirements() {
        let fixture = Fixture::new();
        let layer = fixture.layer();
        let mut guard = layer.lock();
        assert!(!guard.needs_backing_store(), "does not draw content");
        guard.set_draws_content(true);
        assert!(!guard.needs_backing_store(), "empty size");
        guard.set_size(Size::new(10.0, 10.0));
        assert!(guard.needs_backing_store());

        guard.set_opacity(0.0);
        assert!(!guard.needs_backing_store(), "fully transparent");
        guard.set_animations(Animations(alloc::vec![Animation::playing(
            AnimatedProperty::Opacity,
            1.0,
        )]));
        assert!(guard.needs_backing_store(), "opacity animation may reveal it");

        guard.set_opacity(1.0);
        guard.set_filters(FilterOperations(alloc::vec![FilterOperation::Opacity(0.0)]));
        assert!(!guard.needs_backing_store(), "zero opacity filter");
        guard.set_filters(FilterOperations::default());
        guard.set_contents_visible(false);
        assert!(!guard.needs_backing_store(), "contents hidden");
    }

    #[test]
    fn update_contents_creates_store_and_paints_tiles() {
        let _ = env_logger::builder().is_test(true).try_init();
        let fixture = Fixture::new();
        let layer = fixture.layer();
        make_drawing(&layer, 100.0);
        flush(&layer);

        let guard = layer.lock();
        let store = guard.backing_store().expect("drawing layer gets a store");
        assert_eq!(store.tile_count(), 4, "100x100 at 64px tiles");
        assert!(!guard.has_pending_tiles());
        drop(guard);

        assert_eq!(fixture.client.engine.painted.lock().len(), 4);
        let committed_store =
            layer.composition_layer().access_committed(|s| s.backing_store.clone());
        assert!(committed_store.is_some(), "store is published to the scene graph");
    }

    #[test]
    fn dirty_region_repaints_on_next_cycle() {
        let fixture = Fixture::new();
        let layer = fixture.layer();
        make_drawing(&layer, 100.0);
        flush(&layer);
        fixture.client.engine.painted.lock().clear();

        layer
            .lock()
            .set_dirty_region(alloc::vec![IntRect::new(0, 0, 10, 10)]);
        assert!(layer.lock().delta().contains(LayerDelta::BACKING_STORE));
        flush(&layer);
        assert_eq!(
            *fixture.client.engine.painted.lock(),
            alloc::vec![IntRect::new(0, 0, 10, 10)]
        );
    }

    #[test]
    fn transparent_layer_drops_its_store() {
        let fixture = Fixture::new();
        let layer = fixture.layer();
        make_drawing(&layer, 100.0);
        flush(&layer);
        layer.lock().set_opacity(0.0);
        flush(&layer);
        assert!(layer.lock().backing_store().is_none());
        layer
            .composition_layer()
            .access_committed(|s| assert!(s.backing_store.is_none(), "removal is published"));
    }

    #[test]
    fn transform_animation_gets_animated_client() {
        let fixture = Fixture::new();
        let layer = fixture.layer();
        make_drawing(&layer, 100.0);
        layer.update_contents(true, &mut Tracer::none());
        assert!(layer.lock().animated_backing_store_client().is_some());
        flush(&layer);
        assert!(layer.lock().animated_backing_store_client().is_none());
    }

    #[test]
    fn update_without_owner_is_a_no_op() {
        let fixture = Fixture::new();
        let client: Arc<dyn LayerClient> = fixture.client.clone();
        let layer = PlatformLayer::new(Some(&client));
        layer.lock().set_position(Point::new(1.0, 1.0));
        flush(&layer);
        assert_eq!(layer.composition_layer().generation(), 0);
        assert_eq!(layer.lock().delta(), LayerDelta::POSITION, "delta is kept");
    }

    #[test]
    fn backdrop_is_flushed_with_its_layer() {
        let fixture = Fixture::new();
        let layer = fixture.layer();
        let backdrop = fixture.layer();
        layer.lock().set_backdrop(Some(&backdrop));
        backdrop.lock().set_position(Point::new(3.0, 4.0));
        flush(&layer);
        assert_eq!(backdrop.composition_layer().generation(), 1);
        layer.composition_layer().access_committed(|s| {
            let edge = s.backdrop_layer.as_ref().and_then(Weak::upgrade);
            assert!(
                edge.is_some_and(|c| Arc::ptr_eq(&c, backdrop.composition_layer())),
                "backdrop edge points at the backdrop's node"
            );
        });
    }

    #[test]
    fn scrolling_position_is_published_immediately() {
        let fixture = Fixture::new();
        let layer = fixture.layer();
        layer.set_position_for_scrolling(Point::new(0.0, -50.0), ForcePositionSync::No);
        let position = layer.composition_layer().access_committed(|s| s.position);
        assert_eq!(position, Point::new(0.0, -50.0));
        assert_eq!(fixture.client.requested.load(Ordering::Relaxed), 1);
        assert!(layer.lock().delta().is_empty(), "no main-thread flush needed");

        layer.set_position_for_scrolling(Point::new(0.0, -50.0), ForcePositionSync::No);
        assert_eq!(fixture.client.requested.load(Ordering::Relaxed), 1);
        layer.set_position_for_scrolling(Point::new(0.0, -50.0), ForcePositionSync::Yes);
        assert_eq!(fixture.client.requested.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn sync_position_notifies_without_delta() {
        let fixture = Fixture::new();
        let layer = fixture.layer();
        layer.sync_position(Point::new(2.0, 2.0));
        assert_eq!(layer.lock().position(), Point::new(2.0, 2.0));
        assert!(layer.lock().delta().is_empty());
        assert_eq!(fixture.notified(), 1);
    }

    #[test]
    fn losing_owner_purges_and_detaches() {
        let fixture = Fixture::new();
        let layer = fixture.layer();
        assert_eq!(fixture.client.attached.load(Ordering::Relaxed), 1);
        make_drawing(&layer, 100.0);
        flush(&layer);
        layer.set_owner(None);
        assert_eq!(fixture.client.detached.load(Ordering::Relaxed), 1);
        assert!(layer.lock().backing_store().is_none());
    }

    #[test]
    fn invalidated_client_is_not_called() {
        let fixture = Fixture::new();
        let layer = fixture.layer();
        layer.invalidate_client();
        layer.lock().set_position(Point::new(9.0, 9.0));
        assert_eq!(fixture.notified(), 0);
    }

    #[test]
    fn repaint_counter_counts_painted_updates() {
        let fixture = Fixture::new();
        let layer = fixture.layer();
        make_drawing(&layer, 10.0);
        layer.lock().set_show_repaint_counter(true);
        assert_eq!(layer.lock().repaint_count(), Some(0));
        flush(&layer);
        // The engine bumped the owner once for the tile, the layer once more.
        assert_eq!(layer.lock().repaint_count(), Some(2));
        assert!(layer.lock().delta().contains(LayerDelta::REPAINT_COUNTER));

        layer.lock().set_show_repaint_counter(false);
        assert_eq!(layer.lock().repaint_count(), None);
    }

    #[test]
    fn same_image_is_not_replaced() {
        let fixture = Fixture::new();
        let layer = fixture.layer();
        let image = NativeImage::new(crate::id::ImageId(1), IntSize::new(8, 8));
        layer.lock().set_contents_image(Some(image.clone()));
        let first = layer.lock().image_backing_store().cloned();
        let notified = fixture.notified();
        layer.lock().set_contents_image(Some(image));
        let second = layer.lock().image_backing_store().cloned();
        assert!(first.zip(second).is_some_and(|(a, b)| Arc::ptr_eq(&a, &b)));
        assert_eq!(fixture.notified(), notified);
    }

    #[test]
    fn image_visibility_follows_visible_rect() {
        let fixture = Fixture::new();
        let layer = fixture.layer();
        {
            let mut guard = layer.lock();
            guard.set_contents_image(Some(NativeImage::new(
                crate::id::ImageId(2),
                IntSize::new(8, 8),
            )));
            guard.set_contents_rect(Rect::new(0.0, 0.0, 8.0, 8.0));
            let visible = IntRect::new(0, 0, 4, 4);
            guard.set_transformed_visible_rect(visible, visible);
        }
        flush(&layer);
        let visible = layer
            .composition_layer()
            .access_committed(|s| s.image_backing.is_visible);
        assert!(visible);
    }

    #[test]
    fn children_publish_their_nodes() {
        let fixture = Fixture::new();
        let parent = fixture.layer();
        let child = fixture.layer();
        parent.lock().set_children(alloc::vec![child.clone()]);
        flush(&parent);
        parent.composition_layer().access_committed(|s| {
            assert_eq!(s.children.len(), 1);
            assert_eq!(s.children[0].id(), child.id());
        });
    }

    #[test]
    #[should_panic(expected = "a layer cannot be its own child")]
    fn own_child_panics() {
        let fixture = Fixture::new();
        let layer = fixture.layer();
        layer.lock().set_children(alloc::vec![layer.clone()]);
    }
}
