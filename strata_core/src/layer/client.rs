// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The host a platform layer reports to.

use std::sync::Arc;

use super::contents::{ImageBackingStore, NativeImage};
use super::platform::PlatformLayer;
use crate::config::TilingConfig;
use crate::paint::PaintingEngine;

/// The compositing host of a layer tree.
///
/// Layers hold their client weakly. Once the client is gone (or explicitly
/// [invalidated](PlatformLayer::invalidate_client)) every callback becomes a
/// no-op.
///
/// Callbacks may run while the calling layer's lock is held, so an
/// implementation must not lock that layer again.
pub trait LayerClient: Send + Sync {
    /// A layer changed; schedule a composition cycle on the main thread.
    fn notify_composition_required(&self);

    /// Wake the render thread directly (used from the scrolling thread, where
    /// the main thread may be busy).
    fn request_composition(&self) {
        self.notify_composition_required();
    }

    /// Returns `true` while a composition is scheduled or running.
    fn is_composition_required_or_ongoing(&self) -> bool {
        false
    }

    /// A layer gained an owner and joined the tree.
    fn attach_layer(&self, layer: &Arc<PlatformLayer>) {
        _ = layer;
    }

    /// A layer lost its owner and left the tree.
    fn detach_layer(&self, layer: &Arc<PlatformLayer>) {
        _ = layer;
    }

    /// Engine used to paint tiles.
    fn painting_engine(&self) -> Arc<dyn PaintingEngine>;

    /// Returns the shared backing store for `image`.
    ///
    /// Implementations keep one store per image identity so layers showing
    /// the same image share uploads.
    fn image_backing_store(&self, image: Arc<NativeImage>) -> Arc<ImageBackingStore> {
        ImageBackingStore::new(image)
    }

    /// Tiling parameters for layers created against this client.
    fn tiling_config(&self) -> TilingConfig {
        TilingConfig::default()
    }
}
