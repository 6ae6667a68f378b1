// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Surface damage for partial re-rendering.

use alloc::vec::Vec;

use strata_core::geometry::IntRect;

/// The part of the surface that changed since the previous composite.
///
/// Backends use it to limit GPU work to the areas that need redrawing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum DamageRegion {
    /// The whole surface needs redrawing.
    #[default]
    Full,
    /// Surface-space rectangles that need redrawing.
    Rects(Vec<IntRect>),
    /// Nothing changed; the previous frame can be reused.
    None,
}

impl DamageRegion {
    /// Returns `true` if no region needs redrawing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Adds a damaged rectangle. Empty rectangles are ignored.
    pub fn add_rect(&mut self, rect: IntRect) {
        if rect.is_empty() {
            return;
        }
        match self {
            Self::Full => {}
            Self::Rects(rects) => rects.push(rect),
            Self::None => *self = Self::Rects(alloc::vec![rect]),
        }
    }

    /// Merges another damage region into this one.
    pub fn merge(&mut self, other: &Self) {
        match (&mut *self, other) {
            (Self::Full, _) | (_, Self::None) => {}
            (_, Self::Full) => *self = Self::Full,
            (Self::None, _) => other.clone_into(self),
            (Self::Rects(a), Self::Rects(b)) => a.extend_from_slice(b),
        }
    }

    /// Bounding box of the damage, or `surface_rect` for full damage.
    #[must_use]
    pub fn bounds(&self, surface_rect: IntRect) -> IntRect {
        match self {
            Self::Full => surface_rect,
            Self::Rects(rects) => rects.iter().fold(IntRect::ZERO, |acc, r| acc.union(*r)),
            Self::None => IntRect::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adding_to_none_starts_a_rect_list() {
        let mut damage = DamageRegion::None;
        damage.add_rect(IntRect::ZERO);
        assert!(damage.is_empty(), "empty rectangles are ignored");
        damage.add_rect(IntRect::new(0, 0, 10, 10));
        assert_eq!(damage, DamageRegion::Rects(alloc::vec![IntRect::new(0, 0, 10, 10)]));
    }

    #[test]
    fn full_absorbs_everything() {
        let mut damage = DamageRegion::Rects(alloc::vec![IntRect::new(0, 0, 10, 10)]);
        damage.merge(&DamageRegion::Full);
        assert_eq!(damage, DamageRegion::Full);
        damage.add_rect(IntRect::new(5, 5, 5, 5));
        assert_eq!(damage, DamageRegion::Full);
    }

    #[test]
    fn merge_concatenates_rects() {
        let mut damage = DamageRegion::None;
        damage.merge(&DamageRegion::Rects(alloc::vec![IntRect::new(0, 0, 10, 10)]));
        damage.merge(&DamageRegion::None);
        damage.merge(&DamageRegion::Rects(alloc::vec![IntRect::new(20, 0, 10, 10)]));
        assert_eq!(
            damage.bounds(IntRect::new(0, 0, 100, 100)),
            IntRect::new(0, 0, 30, 10)
        );
    }
}
