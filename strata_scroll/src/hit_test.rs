// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mapping points to scrolling nodes through the layer tree.

use std::sync::Arc;

use kurbo::{Point, Rect};
use strata_core::geometry::IntPoint;
use strata_core::id::ScrollingNodeId;
use strata_core::layer::PlatformLayer;
use strata_core::transform::Transform3d;

use crate::tree::ScrollingTree;

impl ScrollingTree {
    /// Returns the scrolling node under `point`.
    ///
    /// Walks the root contents layer's descendants for layers hosting a
    /// scrolling node whose bounds and event region contain the point, then
    /// picks the topmost (last painted) one that maps to a scrolling node
    /// kind. Falls back to the root node; `None` only when there is no root.
    #[must_use]
    pub fn scrolling_node_for_point(&self, point: Point) -> Option<ScrollingNodeId> {
        let root = self.root_node()?;
        let Some(root_contents) = self.root_contents_layer() else {
            return Some(root);
        };

        let mut layers_at_point = Vec::new();
        collect_descendant_layers_at_point(&mut layers_at_point, root_contents, point);

        layers_at_point
            .iter()
            .rev()
            .filter_map(|layer| layer.lock().scrolling_node_id())
            .find(|node| {
                self.slots
                    .get(node)
                    .is_some_and(|&idx| self.node_type[idx as usize].is_scrolling())
            })
            .or(Some(root))
    }
}

/// Appends to `out`, in paint order, the deepest layers under `point` that
/// host a scrolling node.
///
/// `point` is in `parent`'s coordinates. A layer is only listed when none of
/// its descendants is; returns `true` if `parent` or a descendant was hit.
pub fn collect_descendant_layers_at_point(
    out: &mut Vec<Arc<PlatformLayer>>,
    parent: &Arc<PlatformLayer>,
    point: Point,
) -> bool {
    let (exists_on_layer, children) = {
        let layer = parent.lock();
        let bounds = Rect::from_origin_size(layer.bounds_origin(), layer.size());
        let hit = layer.scrolling_node_id().is_some()
            && bounds.contains(point)
            && layer.event_region().contains(IntPoint::rounded(point));
        (hit, layer.children().to_vec())
    };

    let mut exists_on_descendant = false;
    for child in &children {
        let child_point = point_in_child_space(child, point);
        exists_on_descendant |= collect_descendant_layers_at_point(out, child, child_point);
    }

    if exists_on_layer && !exists_on_descendant {
        out.push(Arc::clone(parent));
    }
    exists_on_layer || exists_on_descendant
}

/// Maps `point` from the parent's coordinates into `child`'s.
///
/// A child with a singular transform is treated as untransformed.
fn point_in_child_space(child: &PlatformLayer, point: Point) -> Point {
    let layer = child.lock();
    let transform = layer.transform();
    if !transform.is_invertible() {
        return point;
    }
    let anchor = layer.anchor_point();
    let size = layer.size();
    let position = layer.position();
    let bounds_origin = layer.bounds_origin();
    let origin_x = anchor.x * size.width;
    let origin_y = anchor.y * size.height;

    let to_parent = Transform3d::from_translation(
        origin_x + position.x - bounds_origin.x,
        origin_y + position.y - bounds_origin.y,
        anchor.z,
    ) * transform
        * Transform3d::from_translation(-origin_x, -origin_y, -anchor.z);
    match to_parent.inverse() {
        Some(to_child) => to_child.project_point(point),
        None => point,
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Size;
    use strata_core::geometry::{IntRect, Point3};
    use strata_core::properties::EventRegion;

    use super::*;
    use crate::node::{FrameScrollingLayers, NodeCommit, ScrollingNodeType};

    fn id(n: u64) -> ScrollingNodeId {
        ScrollingNodeId(n)
    }

    fn hit_layer(
        node: Option<ScrollingNodeId>,
        position: Point,
        width: i32,
        height: i32,
    ) -> Arc<PlatformLayer> {
        let layer = PlatformLayer::new(None);
        {
            let mut guard = layer.lock();
            guard.set_position(position);
            guard.set_size(Size::new(f64::from(width), f64::from(height)));
            guard.set_scrolling_node_id(node);
            guard.set_event_region(EventRegion::from_rects([IntRect::new(0, 0, width, height)]));
        }
        layer
    }

    fn tree_with_root_contents(children: Vec<Arc<PlatformLayer>>) -> ScrollingTree {
        let root_contents = PlatformLayer::new(None);
        {
            let mut guard = root_contents.lock();
            guard.set_size(Size::new(800.0, 600.0));
            guard.set_children(children);
        }
        let mut tree = ScrollingTree::default();
        tree.create_node(ScrollingNodeType::MainFrame, id(1), None);
        tree.commit(
            id(1),
            NodeCommit {
                frame_layers: Some(FrameScrollingLayers {
                    root_contents: Some(root_contents),
                    ..FrameScrollingLayers::default()
                }),
                ..NodeCommit::default()
            },
        );
        tree
    }

    #[test]
    fn topmost_of_overlapping_scrollers_wins() {
        let layers = vec![
            hit_layer(Some(id(2)), Point::new(0.0, 0.0), 100, 100),
            hit_layer(Some(id(3)), Point::new(20.0, 20.0), 100, 100),
            hit_layer(Some(id(4)), Point::new(40.0, 40.0), 100, 100),
        ];
        let mut tree = tree_with_root_contents(layers);
        for n in 2..=4 {
            tree.create_node(ScrollingNodeType::Overflow, id(n), Some(id(1)));
        }
        assert_eq!(tree.scrolling_node_for_point(Point::new(50.0, 50.0)), Some(id(4)));
        assert_eq!(tree.scrolling_node_for_point(Point::new(30.0, 30.0)), Some(id(3)));
        assert_eq!(tree.scrolling_node_for_point(Point::new(5.0, 5.0)), Some(id(2)));
    }

    #[test]
    fn no_scrolling_layers_defaults_to_root() {
        let layers = vec![hit_layer(None, Point::ZERO, 100, 100)];
        let tree = tree_with_root_contents(layers);
        assert_eq!(tree.scrolling_node_for_point(Point::new(10.0, 10.0)), Some(id(1)));
    }

    #[test]
    fn empty_tree_has_no_node() {
        let tree = ScrollingTree::default();
        assert_eq!(tree.scrolling_node_for_point(Point::ZERO), None);
    }

    #[test]
    fn non_scrolling_node_kinds_are_skipped() {
        let layers = vec![hit_layer(Some(id(2)), Point::ZERO, 100, 100)];
        let mut tree = tree_with_root_contents(layers);
        tree.create_node(ScrollingNodeType::Fixed, id(2), Some(id(1)));
        assert_eq!(tree.scrolling_node_for_point(Point::new(10.0, 10.0)), Some(id(1)));
    }

    #[test]
    fn nested_scroller_is_preferred_over_its_parent() {
        let inner = hit_layer(Some(id(3)), Point::new(10.0, 10.0), 20, 20);
        let outer = hit_layer(Some(id(2)), Point::new(100.0, 100.0), 200, 200);
        outer.lock().set_children(vec![inner]);
        let mut tree = tree_with_root_contents(vec![outer]);
        tree.create_node(ScrollingNodeType::Overflow, id(2), Some(id(1)));
        tree.create_node(ScrollingNodeType::Overflow, id(3), Some(id(2)));

        // Inside the inner layer (offset by both positions).
        assert_eq!(tree.scrolling_node_for_point(Point::new(115.0, 115.0)), Some(id(3)));
        // Inside the outer layer only.
        assert_eq!(tree.scrolling_node_for_point(Point::new(250.0, 250.0)), Some(id(2)));
    }

    #[test]
    fn transformed_child_is_hit_in_its_own_space() {
        let layer = hit_layer(Some(id(2)), Point::ZERO, 50, 50);
        {
            let mut guard = layer.lock();
            guard.set_anchor_point(Point3::new(0.0, 0.0, 0.0));
            guard.set_transform(Transform3d::from_scale(2.0, 2.0, 1.0));
        }
        let mut tree = tree_with_root_contents(vec![layer]);
        tree.create_node(ScrollingNodeType::Overflow, id(2), Some(id(1)));
        // Scaled to 100×100 on screen.
        assert_eq!(tree.scrolling_node_for_point(Point::new(90.0, 90.0)), Some(id(2)));
        assert_eq!(tree.scrolling_node_for_point(Point::new(110.0, 90.0)), Some(id(1)));
    }
}
