// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recorded drawing commands.
//!
//! Owners paint through [`GraphicsContext`] without knowing whether the
//! commands hit pixels now or are recorded for a worker thread. A
//! [`DisplayList`] owns plain data only, so it can cross threads freely.

use kurbo::Rect;
use strata_core::paint::GraphicsContext;
use strata_core::properties::Color;

/// One recorded drawing command.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PaintOp {
    /// [`GraphicsContext::save`].
    Save,
    /// [`GraphicsContext::restore`].
    Restore,
    /// [`GraphicsContext::translate`].
    Translate {
        /// Horizontal offset.
        dx: f64,
        /// Vertical offset.
        dy: f64,
    },
    /// [`GraphicsContext::scale`].
    Scale {
        /// Horizontal factor.
        sx: f64,
        /// Vertical factor.
        sy: f64,
    },
    /// [`GraphicsContext::clip_rect`].
    ClipRect(Rect),
    /// [`GraphicsContext::fill_rect`].
    FillRect(Rect, Color),
    /// [`GraphicsContext::stroke_rect`].
    StrokeRect {
        /// Outline.
        rect: Rect,
        /// Stroke color.
        color: Color,
        /// Stroke width.
        width: f64,
    },
    /// [`GraphicsContext::clear_rect`].
    ClearRect(Rect),
}

/// An immutable sequence of [`PaintOp`]s.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DisplayList {
    ops: Vec<PaintOp>,
}

impl DisplayList {
    /// Recorded operations in order.
    #[must_use]
    pub fn ops(&self) -> &[PaintOp] {
        &self.ops
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Executes every operation against `context`.
    pub fn replay(&self, context: &mut dyn GraphicsContext) {
        for op in &self.ops {
            match *op {
                PaintOp::Save => context.save(),
                PaintOp::Restore => context.restore(),
                PaintOp::Translate { dx, dy } => context.translate(dx, dy),
                PaintOp::Scale { sx, sy } => context.scale(sx, sy),
                PaintOp::ClipRect(rect) => context.clip_rect(rect),
                PaintOp::FillRect(rect, color) => context.fill_rect(rect, color),
                PaintOp::StrokeRect { rect, color, width } => {
                    context.stroke_rect(rect, color, width);
                }
                PaintOp::ClearRect(rect) => context.clear_rect(rect),
            }
        }
    }
}

/// A [`GraphicsContext`] that records instead of drawing.
#[derive(Debug, Default)]
pub struct DisplayListRecorder {
    ops: Vec<PaintOp>,
}

impl DisplayListRecorder {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Finishes recording.
    #[must_use]
    pub fn finish(self) -> DisplayList {
        DisplayList { ops: self.ops }
    }
}

impl GraphicsContext for DisplayListRecorder {
    fn save(&mut self) {
        self.ops.push(PaintOp::Save);
    }

    fn restore(&mut self) {
        self.ops.push(PaintOp::Restore);
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.ops.push(PaintOp::Translate { dx, dy });
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        self.ops.push(PaintOp::Scale { sx, sy });
    }

    fn clip_rect(&mut self, rect: Rect) {
        self.ops.push(PaintOp::ClipRect(rect));
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        // Invisible fills draw nothing under source-over.
        if color.is_visible() {
            self.ops.push(PaintOp::FillRect(rect, color));
        }
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, width: f64) {
        if color.is_visible() && width > 0.0 {
            self.ops.push(PaintOp::StrokeRect { rect, color, width });
        }
    }

    fn clear_rect(&mut self, rect: Rect) {
        self.ops.push(PaintOp::ClearRect(rect));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_reproduces_recording() {
        let mut recorder = DisplayListRecorder::new();
        recorder.save();
        recorder.translate(1.0, 2.0);
        recorder.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::BLACK);
        recorder.restore();
        let list = recorder.finish();

        let mut copy = DisplayListRecorder::new();
        list.replay(&mut copy);
        assert_eq!(copy.finish(), list);
    }

    #[test]
    fn invisible_fills_are_dropped() {
        let mut recorder = DisplayListRecorder::new();
        recorder.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::TRANSPARENT);
        recorder.stroke_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::BLACK, 0.0);
        assert!(recorder.finish().is_empty());
    }
}
