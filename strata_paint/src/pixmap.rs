// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A [`GraphicsContext`] rasterizing into premultiplied RGBA memory.

use kurbo::Rect;
use strata_core::paint::GraphicsContext;
use strata_core::properties::Color;
use tiny_skia::{BlendMode, FillRule, Mask, Paint, PathBuilder, PixmapMut, Stroke, Transform};

#[derive(Clone)]
struct DrawState {
    transform: Transform,
    clip: Option<Mask>,
}

/// Rasterizes drawing commands into a borrowed pixel buffer with
/// `tiny-skia`.
///
/// Keeps a stack of transform and clip states; [`save`] and [`restore`]
/// must balance, as in any 2D canvas.
///
/// [`save`]: GraphicsContext::save
/// [`restore`]: GraphicsContext::restore
pub struct PixmapContext<'a> {
    pixmap: PixmapMut<'a>,
    state: DrawState,
    stack: Vec<DrawState>,
}

impl core::fmt::Debug for PixmapContext<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PixmapContext")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .field("depth", &self.stack.len())
            .finish_non_exhaustive()
    }
}

impl<'a> PixmapContext<'a> {
    /// Wraps `data` (premultiplied RGBA8, tightly packed rows).
    ///
    /// Returns `None` if the dimensions are zero or `data` has the wrong
    /// length.
    #[must_use]
    pub fn new(data: &'a mut [u8], width: u32, height: u32) -> Option<Self> {
        let pixmap = PixmapMut::from_bytes(data, width, height)?;
        Some(Self {
            pixmap,
            state: DrawState {
                transform: Transform::identity(),
                clip: None,
            },
            stack: Vec::new(),
        })
    }

    /// Number of unbalanced [`save`](GraphicsContext::save) calls.
    #[must_use]
    pub fn save_depth(&self) -> usize {
        self.stack.len()
    }

    fn paint_for(color: Color) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color_rgba8(color.r, color.g, color.b, color.a);
        paint.anti_alias = false;
        paint
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "tiny-skia works in f32; painting coordinates are small"
)]
fn to_skia_rect(rect: Rect) -> Option<tiny_skia::Rect> {
    let rect = rect.abs();
    tiny_skia::Rect::from_ltrb(rect.x0 as f32, rect.y0 as f32, rect.x1 as f32, rect.y1 as f32)
}

impl GraphicsContext for PixmapContext<'_> {
    fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    fn restore(&mut self) {
        match self.stack.pop() {
            Some(state) => self.state = state,
            None => log::warn!("unbalanced restore on a pixmap context"),
        }
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "tiny-skia transforms are f32"
    )]
    fn translate(&mut self, dx: f64, dy: f64) {
        self.state.transform = self.state.transform.pre_translate(dx as f32, dy as f32);
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "tiny-skia transforms are f32"
    )]
    fn scale(&mut self, sx: f64, sy: f64) {
        self.state.transform = self.state.transform.pre_scale(sx as f32, sy as f32);
    }

    fn clip_rect(&mut self, rect: Rect) {
        let path = to_skia_rect(rect).map(PathBuilder::from_rect);
        let transform = self.state.transform;
        match (&mut self.state.clip, path) {
            (Some(mask), Some(path)) => {
                mask.intersect_path(&path, FillRule::Winding, false, transform);
            }
            (Some(mask), None) => mask.clear(),
            (None, path) => {
                let Some(mut mask) = Mask::new(self.pixmap.width(), self.pixmap.height()) else {
                    return;
                };
                if let Some(path) = path {
                    mask.fill_path(&path, FillRule::Winding, false, transform);
                }
                self.state.clip = Some(mask);
            }
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let Some(rect) = to_skia_rect(rect) else {
            return;
        };
        let paint = Self::paint_for(color);
        self.pixmap
            .fill_rect(rect, &paint, self.state.transform, self.state.clip.as_ref());
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "tiny-skia stroke widths are f32"
    )]
    fn stroke_rect(&mut self, rect: Rect, color: Color, width: f64) {
        let Some(rect) = to_skia_rect(rect) else {
            return;
        };
        let path = PathBuilder::from_rect(rect);
        let paint = Self::paint_for(color);
        let stroke = Stroke {
            width: width as f32,
            ..Stroke::default()
        };
        self.pixmap.stroke_path(
            &path,
            &paint,
            &stroke,
            self.state.transform,
            self.state.clip.as_ref(),
        );
    }

    fn clear_rect(&mut self, rect: Rect) {
        let Some(rect) = to_skia_rect(rect) else {
            return;
        };
        let mut paint = Self::paint_for(Color::TRANSPARENT);
        paint.blend_mode = BlendMode::Clear;
        self.pixmap
            .fill_rect(rect, &paint, self.state.transform, self.state.clip.as_ref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(data: &[u8], width: usize, x: usize, y: usize) -> [u8; 4] {
        let i = (y * width + x) * 4;
        [data[i], data[i + 1], data[i + 2], data[i + 3]]
    }

    #[test]
    fn fill_respects_transform() {
        let mut data = vec![0_u8; 8 * 8 * 4];
        {
            let mut ctx = PixmapContext::new(&mut data, 8, 8).expect("valid pixmap");
            ctx.translate(4.0, 0.0);
            ctx.fill_rect(Rect::new(0.0, 0.0, 2.0, 2.0), Color::WHITE);
        }
        assert_eq!(pixel(&data, 8, 0, 0), [0, 0, 0, 0]);
        assert_eq!(pixel(&data, 8, 4, 0), [255, 255, 255, 255]);
    }

    #[test]
    fn clip_limits_fill_until_restore() {
        let mut data = vec![0_u8; 8 * 8 * 4];
        {
            let mut ctx = PixmapContext::new(&mut data, 8, 8).expect("valid pixmap");
            ctx.save();
            ctx.clip_rect(Rect::new(0.0, 0.0, 4.0, 8.0));
            ctx.fill_rect(Rect::new(0.0, 0.0, 8.0, 1.0), Color::BLACK);
            ctx.restore();
            ctx.fill_rect(Rect::new(0.0, 2.0, 8.0, 3.0), Color::BLACK);
            assert_eq!(ctx.save_depth(), 0);
        }
        assert_eq!(pixel(&data, 8, 3, 0), [0, 0, 0, 255]);
        assert_eq!(pixel(&data, 8, 5, 0), [0, 0, 0, 0], "clipped out");
        assert_eq!(pixel(&data, 8, 7, 2), [0, 0, 0, 255], "clip restored");
    }

    #[test]
    fn clear_rect_erases_pixels() {
        let mut data = vec![255_u8; 4 * 4 * 4];
        {
            let mut ctx = PixmapContext::new(&mut data, 4, 4).expect("valid pixmap");
            ctx.clear_rect(Rect::new(0.0, 0.0, 2.0, 4.0));
        }
        assert_eq!(pixel(&data, 4, 1, 1), [0, 0, 0, 0]);
        assert_eq!(pixel(&data, 4, 3, 1), [255, 255, 255, 255]);
    }

    #[test]
    fn wrong_length_is_rejected() {
        let mut data = vec![0_u8; 10];
        assert!(PixmapContext::new(&mut data, 4, 4).is_none());
    }
}
