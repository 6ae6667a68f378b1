// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pixel buffers produced by painting and consumed by compositing.
//!
//! A [`TileBuffer`] holds premultiplied RGBA8 pixels, row-major with a fixed
//! stride. Painting may finish on a worker thread after the buffer was handed
//! to the backing store, so each buffer carries a painting-in-progress flag
//! guarded by a condition variable; compositors call
//! [`wait_until_painting_complete`](TileBuffer::wait_until_painting_complete)
//! before uploading.

use alloc::vec::Vec;

use bitflags::bitflags;
use parking_lot::{Condvar, Mutex};

use crate::geometry::IntSize;

/// Largest edge length accepted for a tile buffer.
pub const MAX_TILE_BUFFER_DIMENSION: i32 = 8192;

const BYTES_PER_PIXEL: usize = 4;

bitflags! {
    /// Creation flags for a [`TileBuffer`].
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct TileBufferFlags: u8 {
        /// The buffer has a meaningful alpha channel.
        const SUPPORTS_ALPHA = 1 << 0;
    }
}

/// A rasterized tile.
pub struct TileBuffer {
    size: IntSize,
    flags: TileBufferFlags,
    data: Mutex<Vec<u8>>,
    painting: Mutex<bool>,
    painting_done: Condvar,
}

impl core::fmt::Debug for TileBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TileBuffer")
            .field("size", &self.size)
            .field("flags", &self.flags)
            .field("painting", &*self.painting.lock())
            .finish_non_exhaustive()
    }
}

impl TileBuffer {
    /// Allocates a zeroed buffer.
    ///
    /// Returns `None` for empty or oversized dimensions and when the
    /// allocation fails; callers treat that as "retry next cycle".
    #[must_use]
    pub fn new(size: IntSize, flags: TileBufferFlags) -> Option<Self> {
        if size.is_empty()
            || size.width > MAX_TILE_BUFFER_DIMENSION
            || size.height > MAX_TILE_BUFFER_DIMENSION
        {
            log::debug!("refusing tile buffer of size {size:?}");
            return None;
        }
        let len = size.width as usize * size.height as usize * BYTES_PER_PIXEL;
        let mut data = Vec::new();
        if data.try_reserve_exact(len).is_err() {
            log::warn!("tile buffer allocation of {len} bytes failed");
            return None;
        }
        data.resize(len, 0);
        Some(Self {
            size,
            flags,
            data: Mutex::new(data),
            painting: Mutex::new(false),
            painting_done: Condvar::new(),
        })
    }

    /// Buffer dimensions in pixels.
    #[inline]
    #[must_use]
    pub fn size(&self) -> IntSize {
        self.size
    }

    /// Bytes per row.
    #[inline]
    #[must_use]
    pub fn stride(&self) -> usize {
        self.size.width as usize * BYTES_PER_PIXEL
    }

    /// Whether the alpha channel is meaningful.
    #[inline]
    #[must_use]
    pub fn supports_alpha(&self) -> bool {
        self.flags.contains(TileBufferFlags::SUPPORTS_ALPHA)
    }

    /// Runs `f` with read access to the pixel data.
    pub fn with_data<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(&self.data.lock())
    }

    /// Runs `f` with write access to the pixel data.
    pub fn with_data_mut<R>(&self, f: impl FnOnce(&mut [u8]) -> R) -> R {
        f(&mut self.data.lock())
    }

    /// Marks the buffer as being painted.
    ///
    /// # Panics
    ///
    /// Panics if painting is already in progress (at most one paint task per
    /// buffer).
    pub fn begin_painting(&self) {
        let mut painting = self.painting.lock();
        assert!(!*painting, "tile buffer is already being painted");
        *painting = true;
    }

    /// Marks painting as finished and wakes waiters.
    pub fn complete_painting(&self) {
        let mut painting = self.painting.lock();
        *painting = false;
        self.painting_done.notify_all();
    }

    /// Returns `true` if no paint is in progress.
    #[must_use]
    pub fn is_painting_complete(&self) -> bool {
        !*self.painting.lock()
    }

    /// Blocks until no paint is in progress.
    pub fn wait_until_painting_complete(&self) {
        let mut painting = self.painting.lock();
        while *painting {
            self.painting_done.wait(&mut painting);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn empty_and_oversized_buffers_fail() {
        assert!(TileBuffer::new(IntSize::new(0, 10), TileBufferFlags::empty()).is_none());
        assert!(
            TileBuffer::new(
                IntSize::new(MAX_TILE_BUFFER_DIMENSION + 1, 1),
                TileBufferFlags::empty()
            )
            .is_none()
        );
    }

    #[test]
    fn stride_and_length_match_size() {
        let buffer = TileBuffer::new(IntSize::new(3, 2), TileBufferFlags::SUPPORTS_ALPHA).unwrap();
        assert_eq!(buffer.stride(), 12);
        assert!(buffer.supports_alpha());
        buffer.with_data(|d| assert_eq!(d.len(), 24));
    }

    #[test]
    fn waiters_wake_when_painting_completes() {
        let buffer = Arc::new(TileBuffer::new(IntSize::new(1, 1), TileBufferFlags::empty()).unwrap());
        buffer.begin_painting();
        assert!(!buffer.is_painting_complete());
        let worker = {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || {
                buffer.with_data_mut(|d| d.fill(0xff));
                buffer.complete_painting();
            })
        };
        buffer.wait_until_painting_complete();
        buffer.with_data(|d| assert_eq!(d, &[0xff; 4]));
        worker.join().unwrap();
    }

    #[test]
    #[should_panic(expected = "already being painted")]
    fn double_begin_panics() {
        let buffer = TileBuffer::new(IntSize::new(1, 1), TileBufferFlags::empty()).unwrap();
        buffer.begin_painting();
        buffer.begin_painting();
    }
}
