// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Non-tiled layer contents: images, external buffers and the coverage
//! watcher of transform-animated layers.

use core::fmt;
use std::sync::{Arc, Weak};

use kurbo::{Rect, Size};
use parking_lot::Mutex;

use crate::geometry::{IntRect, IntSize};
use crate::id::ImageId;
use crate::paint::LayerOwner;
use crate::transform::Transform3d;

/// A decoded image.
#[derive(Debug)]
pub struct NativeImage {
    id: ImageId,
    size: IntSize,
}

impl NativeImage {
    /// Describes an image with the given identity and size.
    #[must_use]
    pub fn new(id: ImageId, size: IntSize) -> Arc<Self> {
        Arc::new(Self { id, size })
    }

    /// Image identity.
    #[must_use]
    pub fn id(&self) -> ImageId {
        self.id
    }

    /// Pixel size.
    #[must_use]
    pub fn size(&self) -> IntSize {
        self.size
    }
}

/// GPU-side storage for one image, shared by all layers presenting it.
#[derive(Debug)]
pub struct ImageBackingStore {
    image: Arc<NativeImage>,
}

impl ImageBackingStore {
    /// Creates a store for `image`.
    #[must_use]
    pub fn new(image: Arc<NativeImage>) -> Arc<Self> {
        Arc::new(Self { image })
    }

    /// The stored image.
    #[must_use]
    pub fn image(&self) -> &Arc<NativeImage> {
        &self.image
    }

    /// Returns `true` if this store holds `image`.
    #[must_use]
    pub fn is_same_native_image(&self, image: &NativeImage) -> bool {
        self.image.id == image.id
    }
}

/// Producer of externally rendered contents (video, canvas, WebGL).
pub trait ContentsBufferProxy: Send + Sync + fmt::Debug {
    /// Publishes the most recent frame, if a new one was produced.
    fn swap_buffers_if_needed(&self);
}

#[derive(Debug, Default)]
struct Coverage {
    visible_rect: Rect,
    cover_rect: IntRect,
    size: Size,
    contents_scale: f32,
}

/// Watches the tile coverage of a layer whose transform is animating.
///
/// The main thread records the painted coverage after each tile update; the
/// render thread, which knows the animated transform of the current frame,
/// asks for a backing store update when the visible area is about to leave
/// the coverage.
pub struct AnimatedBackingStoreClient {
    owner: Mutex<Option<Weak<dyn LayerOwner>>>,
    coverage: Mutex<Coverage>,
}

impl fmt::Debug for AnimatedBackingStoreClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimatedBackingStoreClient")
            .field("coverage", &*self.coverage.lock())
            .finish_non_exhaustive()
    }
}

impl AnimatedBackingStoreClient {
    /// Creates a watcher reporting to `owner`.
    #[must_use]
    pub fn new(owner: &Arc<dyn LayerOwner>) -> Arc<Self> {
        Arc::new(Self {
            owner: Mutex::new(Some(Arc::downgrade(owner))),
            coverage: Mutex::new(Coverage::default()),
        })
    }

    /// Records the current coverage (main thread).
    ///
    /// `visible_rect` is in surface coordinates, `cover_rect` in scaled
    /// pixels.
    pub fn update(&self, visible_rect: Rect, cover_rect: IntRect, size: Size, contents_scale: f32) {
        *self.coverage.lock() = Coverage {
            visible_rect,
            cover_rect,
            size,
            contents_scale,
        };
    }

    /// Detaches from the owner; later requests are dropped.
    pub fn invalidate(&self) {
        *self.owner.lock() = None;
    }

    /// Checks the coverage against the layer's current to-surface transform
    /// (render thread) and asks the owner for an update when tiles are
    /// missing. Returns `true` if an update was requested.
    pub fn request_backing_store_update_if_needed(&self, transform: &Transform3d) -> bool {
        let coverage = self.coverage.lock();
        let scale = f64::from(coverage.contents_scale);
        let contents_rect = Rect::from_origin_size(kurbo::Point::ZERO, coverage.size)
            .scale_from_origin(scale);
        let cover_rect = coverage.cover_rect.to_rect();
        if rect_contains(cover_rect, contents_rect) {
            return false;
        }
        // Non-invertible layers are not visible.
        let Some(inverse) = transform.inverse() else {
            return false;
        };
        let quad = inverse.map_rect_to_quad(coverage.visible_rect);
        let mut layer_rect = Rect::from_points(quad[0].to_point(), quad[1].to_point());
        for p in &quad[2..] {
            layer_rect = layer_rect.union_pt(p.to_point());
        }
        if !layer_rect.is_finite() {
            layer_rect = Rect::from_origin_size(kurbo::Point::ZERO, coverage.size);
        }
        let needed = IntRect::enclosing(layer_rect)
            .to_rect()
            .scale_from_origin(scale)
            .intersect(contents_rect);
        if needed.area() <= 0.0 || rect_contains(cover_rect, needed) {
            return false;
        }
        drop(coverage);
        let owner = self.owner.lock().as_ref().and_then(Weak::upgrade);
        match owner {
            Some(owner) => {
                owner.request_backing_store_update();
                true
            }
            None => false,
        }
    }
}

fn rect_contains(outer: Rect, inner: Rect) -> bool {
    inner.x0 >= outer.x0 && inner.y0 >= outer.y0 && inner.x1 <= outer.x1 && inner.y1 <= outer.y1
}

#[cfg(test)]
mod tests {
    use core::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::paint::GraphicsContext;

    #[derive(Default)]
    struct CountingOwner {
        requests: AtomicUsize,
    }

    impl LayerOwner for CountingOwner {
        fn paint_contents(&self, _: &mut dyn GraphicsContext, _: Rect) {}
        fn repaint_count(&self) -> i32 {
            0
        }
        fn increment_repaint_count(&self) -> i32 {
            1
        }
        fn request_backing_store_update(&self) {
            self.requests.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn same_image_identity_is_detected() {
        let a = NativeImage::new(ImageId(7), IntSize::new(4, 4));
        let b = NativeImage::new(ImageId(7), IntSize::new(4, 4));
        let store = ImageBackingStore::new(a);
        assert!(store.is_same_native_image(&b));
        assert!(!store.is_same_native_image(&NativeImage::new(ImageId(8), IntSize::new(4, 4))));
    }

    #[test]
    fn uncovered_area_requests_update() {
        let counting = Arc::new(CountingOwner::default());
        let owner: Arc<dyn LayerOwner> = counting.clone();
        let client = AnimatedBackingStoreClient::new(&owner);
        client.update(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            IntRect::new(0, 0, 100, 100),
            Size::new(1000.0, 100.0),
            1.0,
        );
        // At rest the visible area is covered.
        assert!(!client.request_backing_store_update_if_needed(&Transform3d::IDENTITY));
        // Sliding the layer left exposes uncovered contents.
        let slid = Transform3d::from_translation(-300.0, 0.0, 0.0);
        assert!(client.request_backing_store_update_if_needed(&slid));
        assert_eq!(counting.requests.load(Ordering::Relaxed), 1);

        client.invalidate();
        assert!(!client.request_backing_store_update_if_needed(&slid));
    }
}
