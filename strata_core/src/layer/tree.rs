// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;
use std::sync::Arc;

use super::platform::PlatformLayer;
use crate::trace::{PhaseKind, Tracer};

/// Runs [`PlatformLayer::update_contents`] over the tree rooted at `root`.
///
/// Parents flush before their children. A layer counts as affected by a
/// transform animation if it or any ancestor runs one. Returns the number of
/// layers visited.
pub fn flush_layer_tree(root: &Arc<PlatformLayer>, cycle: u64, tracer: &mut Tracer<'_>) -> usize {
    tracer.phase_begin(cycle, PhaseKind::UpdateContents);
    let mut visited = 0;
    let mut stack: Vec<(Arc<PlatformLayer>, bool)> = alloc::vec![(Arc::clone(root), false)];
    while let Some((layer, parent_affected)) = stack.pop() {
        let (affected, children) = {
            let guard = layer.lock();
            let affected = parent_affected || guard.animations().has_running_transform_animation();
            (affected, guard.children().to_vec())
        };
        layer.update_contents(affected, tracer);
        visited += 1;
        // Reversed so the first child is flushed first.
        stack.extend(children.into_iter().rev().map(|child| (child, affected)));
    }
    tracer.phase_end(cycle, PhaseKind::UpdateContents);
    visited
}

#[cfg(test)]
mod tests {
    use kurbo::Point;

    use super::*;
    use crate::properties::{AnimatedProperty, Animation, Animations};

    #[test]
    fn every_layer_is_visited_once() {
        let root = PlatformLayer::new(None);
        let a = PlatformLayer::new(None);
        let b = PlatformLayer::new(None);
        let grandchild = PlatformLayer::new(None);
        a.lock().set_children(alloc::vec![grandchild]);
        root.lock().set_children(alloc::vec![a, b]);
        assert_eq!(flush_layer_tree(&root, 0, &mut Tracer::none()), 4);
    }

    #[test]
    fn animation_marks_subtree_affected() {
        // Without an owner, update_contents is inert; only the walk is checked.
        let root = PlatformLayer::new(None);
        let child = PlatformLayer::new(None);
        {
            let mut guard = root.lock();
            guard.set_animations(Animations(alloc::vec![Animation::playing(
                AnimatedProperty::Transform,
                1.0,
            )]));
            guard.set_children(alloc::vec![child.clone()]);
        }
        child.lock().set_position(Point::new(1.0, 1.0));
        assert_eq!(flush_layer_tree(&root, 1, &mut Tracer::none()), 2);
        assert_eq!(
            child.composition_layer().generation(),
            0,
            "ownerless layers do not flush"
        );
    }
}
