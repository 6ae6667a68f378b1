// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Painting into tile buffers, directly or through a display list.

use kurbo::Rect;
use strata_core::paint::GraphicsContext;
use strata_core::properties::Color;
use strata_core::tile_buffer::TileBuffer;

use crate::display_list::{DisplayList, DisplayListRecorder};
use crate::pixmap::PixmapContext;

enum Target<'a> {
    Surface(PixmapContext<'a>),
    Recorder(DisplayListRecorder),
}

/// A drawing surface over either a tile buffer's pixels or a display list.
///
/// Created only through [`for_painting`](Self::for_painting) and
/// [`for_recording`](Self::for_recording), which scope the context to a
/// closure. A painting context borrows the buffer's pixels, so the surface
/// cannot outlive the buffer and is released before the buffer is handed
/// on.
pub struct PaintingContext<'a> {
    target: Target<'a>,
}

impl core::fmt::Debug for PaintingContext<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let kind = match self.target {
            Target::Surface(_) => "surface",
            Target::Recorder(_) => "recorder",
        };
        f.debug_struct("PaintingContext")
            .field("target", &kind)
            .finish()
    }
}

impl PaintingContext<'_> {
    /// Runs `f` with a context drawing into `buffer`.
    ///
    /// Returns `None` if the buffer's memory could not be wrapped.
    pub fn for_painting<R>(
        buffer: &TileBuffer,
        f: impl FnOnce(&mut PaintingContext<'_>) -> R,
    ) -> Option<R> {
        let size = buffer.size();
        let width = u32::try_from(size.width).ok()?;
        let height = u32::try_from(size.height).ok()?;
        buffer.with_data_mut(|data| {
            let surface = PixmapContext::new(data, width, height)?;
            let mut context = PaintingContext {
                target: Target::Surface(surface),
            };
            let result = f(&mut context);
            if let Target::Surface(surface) = &context.target {
                debug_assert_eq!(surface.save_depth(), 0, "unbalanced save/restore");
            }
            Some(result)
        })
    }

    /// Runs `f` with a context recording into a new display list.
    pub fn for_recording(f: impl FnOnce(&mut PaintingContext<'_>)) -> DisplayList {
        let mut context = PaintingContext {
            target: Target::Recorder(DisplayListRecorder::new()),
        };
        f(&mut context);
        match context.target {
            Target::Recorder(recorder) => recorder.finish(),
            Target::Surface(_) => unreachable!("recording context lost its recorder"),
        }
    }

    /// Replays `list` into this context.
    ///
    /// # Panics
    ///
    /// Panics on a recording context; display lists replay onto pixels only.
    pub fn replay(&mut self, list: &DisplayList) {
        let Target::Surface(surface) = &mut self.target else {
            panic!("display lists can only be replayed onto a painting surface");
        };
        list.replay(surface);
    }

    /// Returns `true` if this context records instead of drawing.
    #[must_use]
    pub fn is_recording(&self) -> bool {
        matches!(self.target, Target::Recorder(_))
    }

    fn target(&mut self) -> &mut dyn GraphicsContext {
        match &mut self.target {
            Target::Surface(surface) => surface,
            Target::Recorder(recorder) => recorder,
        }
    }
}

impl GraphicsContext for PaintingContext<'_> {
    fn save(&mut self) {
        self.target().save();
    }

    fn restore(&mut self) {
        self.target().restore();
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.target().translate(dx, dy);
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        self.target().scale(sx, sy);
    }

    fn clip_rect(&mut self, rect: Rect) {
        self.target().clip_rect(rect);
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.target().fill_rect(rect, color);
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, width: f64) {
        self.target().stroke_rect(rect, color, width);
    }

    fn clear_rect(&mut self, rect: Rect) {
        self.target().clear_rect(rect);
    }
}

#[cfg(test)]
mod tests {
    use strata_core::geometry::IntSize;
    use strata_core::tile_buffer::TileBufferFlags;

    use super::*;

    #[test]
    fn recorded_list_replays_into_buffer() {
        let list = PaintingContext::for_recording(|ctx| {
            assert!(ctx.is_recording());
            ctx.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::rgba(255, 0, 0, 255));
        });
        let buffer = TileBuffer::new(IntSize::new(2, 2), TileBufferFlags::SUPPORTS_ALPHA)
            .expect("small buffer");
        PaintingContext::for_painting(&buffer, |ctx| ctx.replay(&list)).expect("wraps buffer");
        buffer.with_data(|data| {
            assert_eq!(&data[..4], &[255, 0, 0, 255]);
            assert_eq!(&data[4..8], &[0, 0, 0, 0]);
        });
    }

    #[test]
    #[should_panic(expected = "display lists can only be replayed onto a painting surface")]
    fn replay_into_recorder_panics() {
        let list = DisplayList::default();
        let _ = PaintingContext::for_recording(|ctx| ctx.replay(&list));
    }
}
