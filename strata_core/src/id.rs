// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer, image and scrolling-node identity types.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

/// Process-unique identity of a platform layer and its scene-graph node.
///
/// Identifiers are never reused, so a stale id can never alias a live layer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(u64);

impl LayerId {
    /// Generates a fresh identifier.
    #[must_use]
    pub fn generate() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw value (for diagnostics and trace export).
    #[inline]
    #[must_use]
    pub const fn to_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LayerId({})", self.0)
    }
}

/// Identity of a decoded native image.
///
/// Image backing stores are shared between layers presenting the same image,
/// keyed by this id.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(pub u64);

impl fmt::Debug for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageId({})", self.0)
    }
}

/// Identity of a node in the scrolling tree.
///
/// Assigned by the main thread when the node is created; a layer that acts as
/// a scroll container records the id of its node so hit testing can map
/// layers back to nodes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScrollingNodeId(pub u64);

impl fmt::Debug for ScrollingNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScrollingNodeId({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique_and_increasing() {
        let a = LayerId::generate();
        let b = LayerId::generate();
        assert_ne!(a, b, "fresh ids never repeat");
        assert!(b > a, "ids increase monotonically");
    }
}
