// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Value types carried by layers: colors, flags, filters, animations,
//! hit-test regions and damage.

use alloc::vec::Vec;

use bitflags::bitflags;

use crate::geometry::{IntPoint, IntRect};

/// An 8-bit-per-channel RGBA color (non-premultiplied).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);
    /// Opaque black.
    pub const BLACK: Self = Self::rgba(0, 0, 0, 255);
    /// Opaque white.
    pub const WHITE: Self = Self::rgba(255, 255, 255, 255);

    /// Creates a color from its channels.
    #[inline]
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Returns `true` if painting with this color has any visible effect.
    #[inline]
    #[must_use]
    pub const fn is_visible(self) -> bool {
        self.a > 0
    }
}

bitflags! {
    /// Boolean layer flags.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct LayerFlags: u16 {
        /// The owner paints content into the layer's backing store.
        const DRAWS_CONTENT = 1 << 0;
        /// Descendants are clipped to the layer bounds.
        const MASKS_TO_BOUNDS = 1 << 1;
        /// Children share the layer's 3D rendering context.
        const PRESERVES_3D = 1 << 2;
        /// The back face is drawn when the layer faces away.
        const BACKFACE_VISIBLE = 1 << 3;
        /// Layer contents are shown at all.
        const CONTENTS_VISIBLE = 1 << 4;
        /// Contents cover every pixel; tiles need no alpha channel.
        const CONTENTS_OPAQUE = 1 << 5;
        /// Descendants are clipped to the contents clipping rectangle.
        const CONTENTS_RECT_CLIPS_DESCENDANTS = 1 << 6;
    }
}

impl Default for LayerFlags {
    fn default() -> Self {
        Self::BACKFACE_VISIBLE | Self::CONTENTS_VISIBLE
    }
}

/// One step of a filter chain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FilterOperation {
    /// Multiplies alpha by the amount (0 is fully transparent).
    Opacity(f32),
    /// Gaussian blur with the given standard deviation in pixels.
    Blur(f32),
    /// Desaturates by the amount.
    Grayscale(f32),
    /// Scales color channels by the amount.
    Brightness(f32),
    /// Drop shadow behind the layer.
    DropShadow {
        /// Horizontal offset.
        dx: f32,
        /// Vertical offset.
        dy: f32,
        /// Blur radius.
        radius: f32,
        /// Shadow color.
        color: Color,
    },
}

/// An ordered filter chain.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterOperations(pub Vec<FilterOperation>);

impl FilterOperations {
    /// Returns `true` if the chain has no operations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` if some operation sets opacity to zero, which makes the
    /// layer invisible regardless of its contents.
    #[must_use]
    pub fn forces_zero_opacity(&self) -> bool {
        self.0
            .iter()
            .any(|op| matches!(op, FilterOperation::Opacity(amount) if *amount == 0.0))
    }

    /// Iterates over the operations.
    pub fn iter(&self) -> impl Iterator<Item = &FilterOperation> {
        self.0.iter()
    }
}

/// Layer property targeted by an animation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnimatedProperty {
    /// `transform` and its individual components.
    Transform,
    /// `opacity`.
    Opacity,
    /// `filter`.
    Filter,
    /// `backdrop-filter`.
    BackdropFilter,
}

/// Playback state of an animation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AnimationState {
    /// Running.
    #[default]
    Playing,
    /// Paused at its current time.
    Paused,
    /// Finished or cancelled.
    Stopped,
}

/// A property animation attached to a layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Animation {
    /// Which property the animation drives.
    pub property: AnimatedProperty,
    /// Playback state.
    pub state: AnimationState,
    /// Duration in seconds.
    pub duration: f64,
}

impl Animation {
    /// Creates a playing animation.
    #[must_use]
    pub const fn playing(property: AnimatedProperty, duration: f64) -> Self {
        Self {
            property,
            state: AnimationState::Playing,
            duration,
        }
    }
}

/// The animations attached to a layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Animations(pub Vec<Animation>);

impl Animations {
    /// Returns `true` if an animation of `property` is not stopped.
    #[must_use]
    pub fn has_active_animations_of_type(&self, property: AnimatedProperty) -> bool {
        self.0
            .iter()
            .any(|a| a.property == property && a.state != AnimationState::Stopped)
    }

    /// Returns `true` if a transform animation is playing.
    #[must_use]
    pub fn has_running_transform_animation(&self) -> bool {
        self.0.iter().any(|a| {
            a.property == AnimatedProperty::Transform && a.state == AnimationState::Playing
        })
    }

    /// Returns `true` if there are no animations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Region of a layer that accepts pointer events, in layer coordinates.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventRegion {
    rects: Vec<IntRect>,
}

impl EventRegion {
    /// Creates a region covering the given rectangles.
    #[must_use]
    pub fn from_rects(rects: impl IntoIterator<Item = IntRect>) -> Self {
        Self {
            rects: rects.into_iter().filter(|r| !r.is_empty()).collect(),
        }
    }

    /// Adds a rectangle to the region.
    pub fn unite(&mut self, rect: IntRect) {
        if !rect.is_empty() {
            self.rects.push(rect);
        }
    }

    /// Returns `true` if the region covers no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Returns `true` if `point` falls inside the region.
    #[must_use]
    pub fn contains(&self, point: IntPoint) -> bool {
        self.rects.iter().any(|r| r.contains(point))
    }

    /// Returns the rectangles making up the region.
    #[must_use]
    pub fn rects(&self) -> &[IntRect] {
        &self.rects
    }
}

/// Area of a layer whose pixels changed since the last composite.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Damage {
    /// Nothing changed.
    #[default]
    Empty,
    /// The listed rectangles changed.
    Rects(Vec<IntRect>),
    /// The whole layer must be recomposited.
    Full,
}

impl Damage {
    /// Adds a damaged rectangle. Empty rectangles are ignored.
    pub fn add(&mut self, rect: IntRect) {
        if rect.is_empty() {
            return;
        }
        match self {
            Self::Empty => *self = Self::Rects(alloc::vec![rect]),
            Self::Rects(rects) => rects.push(rect),
            Self::Full => {}
        }
    }

    /// Returns `true` if nothing is damaged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns the bounding box of the damaged rectangles, or `full_rect` for
    /// full damage.
    #[must_use]
    pub fn bounds(&self, full_rect: IntRect) -> IntRect {
        match self {
            Self::Empty => IntRect::ZERO,
            Self::Rects(rects) => rects.iter().fold(IntRect::ZERO, |acc, r| acc.union(*r)),
            Self::Full => full_rect,
        }
    }
}

/// Debug border drawn around a layer.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DebugBorder {
    /// Whether the border is drawn (the color is visible).
    pub visible: bool,
    /// Border color.
    pub color: Color,
    /// Border width in pixels.
    pub width: f32,
}

/// Repaint counter overlay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RepaintCounter {
    /// Whether the counter is shown.
    pub visible: bool,
    /// Number of repaints so far.
    pub count: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_opacity_filter_forces_zero_opacity() {
        let filters = FilterOperations(alloc::vec![
            FilterOperation::Blur(2.0),
            FilterOperation::Opacity(0.0),
        ]);
        assert!(filters.forces_zero_opacity());
        let filters = FilterOperations(alloc::vec![FilterOperation::Opacity(0.5)]);
        assert!(!filters.forces_zero_opacity());
    }

    #[test]
    fn stopped_animations_are_not_active() {
        let mut animations = Animations(alloc::vec![Animation::playing(
            AnimatedProperty::Opacity,
            1.0
        )]);
        assert!(animations.has_active_animations_of_type(AnimatedProperty::Opacity));
        assert!(!animations.has_active_animations_of_type(AnimatedProperty::Transform));
        animations.0[0].state = AnimationState::Stopped;
        assert!(!animations.has_active_animations_of_type(AnimatedProperty::Opacity));
    }

    #[test]
    fn event_region_ignores_empty_rects() {
        let region = EventRegion::from_rects([IntRect::ZERO, IntRect::new(0, 0, 4, 4)]);
        assert_eq!(region.rects().len(), 1);
        assert!(region.contains(IntPoint::new(3, 3)));
        assert!(!region.contains(IntPoint::new(4, 4)));
    }

    #[test]
    fn full_damage_absorbs_rects() {
        let mut damage = Damage::Full;
        damage.add(IntRect::new(0, 0, 1, 1));
        assert_eq!(damage, Damage::Full);
        let mut damage = Damage::default();
        damage.add(IntRect::new(0, 0, 1, 1));
        damage.add(IntRect::new(4, 4, 1, 1));
        assert_eq!(
            damage.bounds(IntRect::ZERO),
            IntRect::from_ltrb(0, 0, 5, 5)
        );
    }

    #[test]
    fn default_flags_show_contents_and_backface() {
        let flags = LayerFlags::default();
        assert!(flags.contains(LayerFlags::CONTENTS_VISIBLE | LayerFlags::BACKFACE_VISIBLE));
        assert!(!flags.contains(LayerFlags::DRAWS_CONTENT));
    }
}
