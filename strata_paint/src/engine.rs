// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Painting engines.
//!
//! [`DirectPaintingEngine`] paints on the calling thread.
//! [`ThreadedPaintingEngine`] records a display list on the calling thread and
//! rasterizes it on a worker pool, handing the buffer out while it is still
//! being painted.

use std::sync::Arc;

use rayon::{ThreadPool, ThreadPoolBuilder};
use strata_core::config::PaintingConfig;
use strata_core::geometry::{IntRect, IntSize};
use strata_core::paint::{LayerOwner, PaintingEngine, paint_owner_into};
use strata_core::tile_buffer::{TileBuffer, TileBufferFlags};

use crate::context::PaintingContext;

/// Where tile rasterization happens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderingMode {
    /// CPU rasterization.
    Unaccelerated,
    /// Rasterization on behalf of the GPU (the accelerated pool).
    Accelerated,
}

fn create_buffer(size: IntSize, contents_opaque: bool) -> Option<TileBuffer> {
    let flags = if contents_opaque {
        TileBufferFlags::empty()
    } else {
        TileBufferFlags::SUPPORTS_ALPHA
    };
    TileBuffer::new(size, flags)
}

/// Paints `dirty_rect` of `owner` into `buffer` on the current thread.
fn paint_in_place(
    buffer: &TileBuffer,
    owner: &dyn LayerOwner,
    dirty_rect: IntRect,
    contents_scale: f32,
) -> bool {
    buffer.begin_painting();
    let painted = PaintingContext::for_painting(buffer, |ctx| {
        paint_owner_into(ctx, owner, dirty_rect, contents_scale);
    })
    .is_some();
    buffer.complete_painting();
    if !painted {
        log::warn!("could not wrap a {:?} tile buffer for painting", buffer.size());
    }
    painted
}

/// Paints synchronously into a fresh buffer per call.
#[derive(Clone, Copy, Debug, Default)]
pub struct DirectPaintingEngine;

impl PaintingEngine for DirectPaintingEngine {
    fn paint_layer(
        &self,
        owner: &dyn LayerOwner,
        dirty_rect: IntRect,
        contents_opaque: bool,
        contents_scale: f32,
    ) -> Option<Arc<TileBuffer>> {
        let buffer = create_buffer(dirty_rect.size(), contents_opaque)?;
        paint_in_place(&buffer, owner, dirty_rect, contents_scale).then(|| Arc::new(buffer))
    }
}

/// Paints on worker pools when they exist, otherwise on the calling thread.
///
/// One pool per [`RenderingMode`]. Pool sizes come from
/// [`PaintingConfig::number_of_cpu_painting_threads`] and
/// [`PaintingConfig::number_of_gpu_painting_threads`]; a size of zero means
/// no pool.
pub struct ThreadedPaintingEngine {
    cpu_pool: Option<ThreadPool>,
    gpu_pool: Option<ThreadPool>,
    gpu_painting_enabled: bool,
}

impl core::fmt::Debug for ThreadedPaintingEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ThreadedPaintingEngine")
            .field(
                "cpu_threads",
                &self.cpu_pool.as_ref().map(ThreadPool::current_num_threads),
            )
            .field(
                "gpu_threads",
                &self.gpu_pool.as_ref().map(ThreadPool::current_num_threads),
            )
            .field("gpu_painting_enabled", &self.gpu_painting_enabled)
            .finish()
    }
}

fn build_pool(kind: &'static str, threads: usize) -> Option<ThreadPool> {
    if threads == 0 {
        return None;
    }
    match ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(move |i| format!("strata-{kind}-painter-{i}"))
        .build()
    {
        Ok(pool) => Some(pool),
        Err(err) => {
            log::warn!("painting falls back to the calling thread: {kind} pool failed: {err}");
            None
        }
    }
}

impl ThreadedPaintingEngine {
    /// Creates the engine and its pools.
    #[must_use]
    pub fn new(config: &PaintingConfig) -> Self {
        let cpu_threads = config.number_of_cpu_painting_threads();
        let gpu_threads = config.number_of_gpu_painting_threads();
        log::debug!("painting engine: {cpu_threads} cpu threads, {gpu_threads} gpu threads");
        Self {
            cpu_pool: build_pool("cpu", cpu_threads),
            gpu_pool: build_pool("gpu", gpu_threads),
            gpu_painting_enabled: config.gpu_painting_enabled,
        }
    }

    /// Rendering mode for new buffers.
    #[must_use]
    pub fn rendering_mode(&self) -> RenderingMode {
        if self.gpu_painting_enabled {
            RenderingMode::Accelerated
        } else {
            RenderingMode::Unaccelerated
        }
    }

    /// The mode painted off-thread, or `None` if the pool for the current
    /// mode does not exist.
    #[must_use]
    pub fn threaded_rendering_mode(&self) -> Option<RenderingMode> {
        let mode = self.rendering_mode();
        self.pool(mode).map(|_| mode)
    }

    fn pool(&self, mode: RenderingMode) -> Option<&ThreadPool> {
        match mode {
            RenderingMode::Unaccelerated => self.cpu_pool.as_ref(),
            RenderingMode::Accelerated => self.gpu_pool.as_ref(),
        }
    }

    fn post_painting_task(
        pool: &ThreadPool,
        owner: &dyn LayerOwner,
        dirty_rect: IntRect,
        contents_opaque: bool,
        contents_scale: f32,
    ) -> Option<Arc<TileBuffer>> {
        let buffer = Arc::new(create_buffer(dirty_rect.size(), contents_opaque)?);
        let list = PaintingContext::for_recording(|ctx| {
            paint_owner_into(ctx, owner, dirty_rect, contents_scale);
        });
        buffer.begin_painting();
        let task_buffer = Arc::clone(&buffer);
        pool.spawn(move || {
            let replayed = PaintingContext::for_painting(&task_buffer, |ctx| ctx.replay(&list));
            if replayed.is_none() {
                log::warn!(
                    "could not wrap a {:?} tile buffer for replay",
                    task_buffer.size()
                );
            }
            task_buffer.complete_painting();
        });
        Some(buffer)
    }
}

impl PaintingEngine for ThreadedPaintingEngine {
    fn paint_layer(
        &self,
        owner: &dyn LayerOwner,
        dirty_rect: IntRect,
        contents_opaque: bool,
        contents_scale: f32,
    ) -> Option<Arc<TileBuffer>> {
        if let Some(pool) = self
            .threaded_rendering_mode()
            .and_then(|mode| self.pool(mode))
        {
            return Self::post_painting_task(
                pool,
                owner,
                dirty_rect,
                contents_opaque,
                contents_scale,
            );
        }
        let buffer = create_buffer(dirty_rect.size(), contents_opaque)?;
        paint_in_place(&buffer, owner, dirty_rect, contents_scale).then(|| Arc::new(buffer))
    }
}
