// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The seams between layers, their owners and painting engines.

use std::sync::Arc;

use kurbo::Rect;

use crate::geometry::IntRect;
use crate::properties::Color;
use crate::tile_buffer::TileBuffer;

/// A 2D drawing surface.
///
/// Implemented by rasterizing contexts and by display-list recorders, so the
/// same paint code can either draw immediately or be replayed later.
pub trait GraphicsContext {
    /// Pushes the current transform and clip.
    fn save(&mut self);
    /// Pops the transform and clip pushed by the matching [`save`](Self::save).
    fn restore(&mut self);
    /// Translates subsequent drawing.
    fn translate(&mut self, dx: f64, dy: f64);
    /// Scales subsequent drawing.
    fn scale(&mut self, sx: f64, sy: f64);
    /// Intersects the clip with `rect` (in current user space).
    fn clip_rect(&mut self, rect: Rect);
    /// Fills `rect` with `color` (source-over).
    fn fill_rect(&mut self, rect: Rect, color: Color);
    /// Strokes the outline of `rect`.
    fn stroke_rect(&mut self, rect: Rect, color: Color, width: f64);
    /// Replaces the pixels of `rect` with transparent black.
    fn clear_rect(&mut self, rect: Rect);
}

/// The graphics layer that owns a platform layer and knows how to paint it.
pub trait LayerOwner: Send + Sync {
    /// Paints the layer's contents clipped to `clip` (layer coordinates).
    fn paint_contents(&self, context: &mut dyn GraphicsContext, clip: Rect);

    /// Current repaint count.
    fn repaint_count(&self) -> i32;

    /// Increments and returns the repaint count.
    fn increment_repaint_count(&self) -> i32;

    /// Asks the owner to schedule a backing store update on the main thread.
    ///
    /// Called from the render thread when a transform animation moves the
    /// visible area outside the painted coverage.
    fn request_backing_store_update(&self) {}
}

/// Rasterizes layer contents into tile buffers.
pub trait PaintingEngine: Send + Sync {
    /// Paints `dirty_rect` (scaled pixels) of `owner` into a new buffer of the
    /// same size.
    ///
    /// The returned buffer may still be painting on a worker thread; check
    /// [`TileBuffer::is_painting_complete`]. Returns `None` when no buffer
    /// could be created; the caller retries on the next cycle.
    fn paint_layer(
        &self,
        owner: &dyn LayerOwner,
        dirty_rect: IntRect,
        contents_opaque: bool,
        contents_scale: f32,
    ) -> Option<Arc<TileBuffer>>;
}

/// Maps a dirty rectangle in scaled pixels back to layer coordinates.
///
/// This is the clip handed to [`LayerOwner::paint_contents`].
#[must_use]
pub fn unscaled_clip(dirty_rect: IntRect, contents_scale: f32) -> IntRect {
    IntRect::enclosing(
        dirty_rect
            .to_rect()
            .scale_from_origin(1.0 / f64::from(contents_scale)),
    )
}

/// Prepares `context` for painting `dirty_rect` of a layer at
/// `contents_scale` into a buffer whose origin is the dirty rect's origin,
/// then calls the owner.
///
/// Opaque layers start from transparent pixels as well; the owner paints
/// every pixel.
pub fn paint_owner_into(
    context: &mut dyn GraphicsContext,
    owner: &dyn LayerOwner,
    dirty_rect: IntRect,
    contents_scale: f32,
) {
    let clip = unscaled_clip(dirty_rect, contents_scale);
    let scale = f64::from(contents_scale);
    context.save();
    context.clear_rect(Rect::new(
        0.0,
        0.0,
        f64::from(dirty_rect.width),
        f64::from(dirty_rect.height),
    ));
    context.translate(-f64::from(dirty_rect.x), -f64::from(dirty_rect.y));
    context.scale(scale, scale);
    let clip = clip.to_rect();
    context.clip_rect(clip);
    owner.paint_contents(context, clip);
    context.restore();
}
