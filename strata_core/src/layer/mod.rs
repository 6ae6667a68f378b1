// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Main-thread compositing layers.
//!
//! A [`PlatformLayer`] mirrors one graphics layer. Property setters record
//! which fields changed in a [`LayerDelta`](crate::delta::LayerDelta); once
//! per composition cycle [`PlatformLayer::update_contents`] keeps the layer's
//! backing stores up to date and publishes the changed fields to its
//! [`CompositionLayer`](crate::composition::CompositionLayer).
//!
//! # Collaborators
//!
//! - [`LayerClient`]: the compositing host. Held weakly; scheduling,
//!   painting engine and image store lookups go through it.
//! - [`LayerOwner`](crate::paint::LayerOwner): the graphics layer that paints
//!   the contents. Held weakly; a layer without an owner does not flush.
//! - [`ImageBackingStore`], [`ContentsBufferProxy`] and
//!   [`AnimatedBackingStoreClient`]: non-tiled contents.
//!
//! # Locking
//!
//! Every property accessor lives on [`LayerGuard`], returned by
//! [`PlatformLayer::lock`]. The scene-graph node has its own lock, which is
//! always taken after the layer lock.

mod client;
mod contents;
mod platform;
mod tree;

pub use client::LayerClient;
pub use contents::{AnimatedBackingStoreClient, ContentsBufferProxy, ImageBackingStore, NativeImage};
pub use platform::{ForcePositionSync, LayerGuard, PlatformLayer};
pub use tree::flush_layer_tree;
