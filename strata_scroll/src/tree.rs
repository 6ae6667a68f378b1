// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays scrolling node storage, topology and commits.

use std::sync::Arc;

use hashbrown::HashMap;
use kurbo::{Point, Rect};
use strata_core::config::ScrollingConfig;
use strata_core::id::ScrollingNodeId;
use strata_core::layer::PlatformLayer;
use strata_core::trace::ScrollEvent;
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use crate::dirty;
use crate::node::{
    NodeCommit, NodeData, ScrollGeometry, ScrollType, ScrollingLayerPositionAction,
    ScrollingNodeType, SynchronousScrollingReasons,
};
use crate::snap::{ScrollState, SnapOffsets};

/// Sentinel for "no slot".
pub(crate) const INVALID: u32 = u32::MAX;

/// A scroll position the main thread has not seen yet.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollUpdate {
    /// The scrolled node.
    pub node: ScrollingNodeId,
    /// Its new scroll position.
    pub scroll_position: Point,
    /// New layout viewport origin, for frame scrollers.
    pub layout_viewport_origin: Option<Point>,
    /// How the main thread should apply the position.
    pub action: ScrollingLayerPositionAction,
    /// What caused the scroll.
    pub scroll_type: ScrollType,
}

/// The scrolling tree.
///
/// Nodes are addressed by the [`ScrollingNodeId`]s the main thread assigns.
/// Internally each node occupies a slot in parallel arrays; removed slots
/// are recycled via a free list.
///
/// The tree is plain data: the scrolling thread owns it behind a mutex (see
/// [`ScrollingThread`](crate::ScrollingThread)) and the main thread commits
/// into it under the same lock.
#[derive(Debug)]
pub struct ScrollingTree {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Node properties (committed by the main thread) --
    pub(crate) node_id: Vec<ScrollingNodeId>,
    pub(crate) node_type: Vec<ScrollingNodeType>,
    pub(crate) data: Vec<NodeData>,
    pub(crate) layer: Vec<Option<Arc<PlatformLayer>>>,
    pub(crate) sync_reasons: Vec<SynchronousScrollingReasons>,
    pub(crate) geometry: Vec<ScrollGeometry>,
    pub(crate) snap_offsets: Vec<SnapOffsets>,

    // -- Scroll state (owned by the scrolling thread) --
    pub(crate) scroll_position: Vec<Point>,
    pub(crate) last_committed_scroll_position: Vec<Point>,
    pub(crate) scroll_state: Vec<ScrollState>,

    // -- Allocation --
    pub(crate) slots: HashMap<ScrollingNodeId, u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,
    pub(crate) root: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,

    // -- Event handling --
    pub(crate) config: ScrollingConfig,
    pub(crate) latched: u32,

    // -- Main-thread synchronization --
    pub(crate) synchronized_with_main_thread: bool,
    pub(crate) waiting_for_platform_rendering_update: bool,
    pub(crate) pending_updates: Vec<ScrollUpdate>,
    pub(crate) pending_scroll_events: Vec<ScrollEvent>,
    pub(crate) cycle: u64,
}

impl Default for ScrollingTree {
    fn default() -> Self {
        Self::new(ScrollingConfig::default())
    }
}

impl ScrollingTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new(config: ScrollingConfig) -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            node_id: Vec::new(),
            node_type: Vec::new(),
            data: Vec::new(),
            layer: Vec::new(),
            sync_reasons: Vec::new(),
            geometry: Vec::new(),
            snap_offsets: Vec::new(),
            scroll_position: Vec::new(),
            last_committed_scroll_position: Vec::new(),
            scroll_state: Vec::new(),
            slots: HashMap::new(),
            free_list: Vec::new(),
            len: 0,
            root: INVALID,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            config,
            latched: INVALID,
            synchronized_with_main_thread: true,
            waiting_for_platform_rendering_update: false,
            pending_updates: Vec::new(),
            pending_scroll_events: Vec::new(),
            cycle: 0,
        }
    }

    /// The tuning parameters in use.
    #[must_use]
    pub fn config(&self) -> &ScrollingConfig {
        &self.config
    }

    // -- Allocation API --

    /// Creates a node of `node_type` under `parent`.
    ///
    /// A node without a parent becomes the root.
    ///
    /// # Panics
    ///
    /// Panics for plugin node kinds, if `id` is already in use, if `parent`
    /// is unknown, or if a root is created while one exists.
    pub fn create_node(
        &mut self,
        node_type: ScrollingNodeType,
        id: ScrollingNodeId,
        parent: Option<ScrollingNodeId>,
    ) {
        let data = NodeData::for_type(node_type);
        assert!(
            !self.slots.contains_key(&id),
            "scrolling node {id:?} already exists"
        );
        let parent_idx = parent.map(|p| self.slot(p));
        if parent_idx.is_none() {
            assert!(self.root == INVALID, "scrolling tree already has a root");
        }

        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.node_id[i] = id;
            self.node_type[i] = node_type;
            self.data[i] = data;
            self.layer[i] = None;
            self.sync_reasons[i] = SynchronousScrollingReasons::empty();
            self.geometry[i] = ScrollGeometry::default();
            self.snap_offsets[i] = SnapOffsets::default();
            self.scroll_position[i] = Point::ZERO;
            self.last_committed_scroll_position[i] = Point::ZERO;
            self.scroll_state[i] = ScrollState::Idle;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.node_id.push(id);
            self.node_type.push(node_type);
            self.data.push(data);
            self.layer.push(None);
            self.sync_reasons.push(SynchronousScrollingReasons::empty());
            self.geometry.push(ScrollGeometry::default());
            self.snap_offsets.push(SnapOffsets::default());
            self.scroll_position.push(Point::ZERO);
            self.last_committed_scroll_position.push(Point::ZERO);
            self.scroll_state.push(ScrollState::Idle);
            idx
        };
        self.slots.insert(id, idx);

        match parent_idx {
            Some(p) => self.link(idx, p),
            None => self.root = idx,
        }
        self.dirty.mark_with(idx, dirty::POSITION, &EagerPolicy);
    }

    /// Removes `id` and its whole subtree.
    ///
    /// # Panics
    ///
    /// Panics if `id` is unknown.
    pub fn remove_node(&mut self, id: ScrollingNodeId) {
        let idx = self.slot(id);
        if self.parent[idx as usize] != INVALID {
            self.unlink_from_parent(idx);
        }

        let mut stack = vec![idx];
        while let Some(idx) = stack.pop() {
            let mut child = self.first_child[idx as usize];
            while child != INVALID {
                stack.push(child);
                child = self.next_sibling[child as usize];
            }
            self.free_slot(idx);
        }
    }

    /// Returns `true` if `id` is in the tree.
    #[must_use]
    pub fn contains(&self, id: ScrollingNodeId) -> bool {
        self.slots.contains_key(&id)
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the tree has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    // -- Queries --

    /// The root node, if any.
    #[must_use]
    pub fn root_node(&self) -> Option<ScrollingNodeId> {
        self.id_at(self.root)
    }

    /// The parent of `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is unknown.
    #[must_use]
    pub fn parent(&self, id: ScrollingNodeId) -> Option<ScrollingNodeId> {
        self.id_at(self.parent[self.slot(id) as usize])
    }

    /// The children of `id` in insertion order.
    ///
    /// # Panics
    ///
    /// Panics if `id` is unknown.
    #[must_use]
    pub fn children(&self, id: ScrollingNodeId) -> Vec<ScrollingNodeId> {
        let mut out = Vec::new();
        let mut child = self.first_child[self.slot(id) as usize];
        while child != INVALID {
            out.push(self.node_id[child as usize]);
            child = self.next_sibling[child as usize];
        }
        out
    }

    /// The kind of `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is unknown.
    #[must_use]
    pub fn node_type(&self, id: ScrollingNodeId) -> ScrollingNodeType {
        self.node_type[self.slot(id) as usize]
    }

    /// The kind-specific data of `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is unknown.
    #[must_use]
    pub fn node_data(&self, id: ScrollingNodeId) -> &NodeData {
        &self.data[self.slot(id) as usize]
    }

    /// Current scroll position of `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is unknown.
    #[must_use]
    pub fn scroll_position(&self, id: ScrollingNodeId) -> Point {
        self.scroll_position[self.slot(id) as usize]
    }

    /// Scroll extent of `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is unknown.
    #[must_use]
    pub fn geometry(&self, id: ScrollingNodeId) -> ScrollGeometry {
        self.geometry[self.slot(id) as usize]
    }

    /// Scroll state of `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is unknown.
    #[must_use]
    pub fn scroll_state(&self, id: ScrollingNodeId) -> ScrollState {
        self.scroll_state[self.slot(id) as usize]
    }

    /// Layout viewport of a frame scroller, `None` for other kinds.
    ///
    /// # Panics
    ///
    /// Panics if `id` is unknown.
    #[must_use]
    pub fn layout_viewport(&self, id: ScrollingNodeId) -> Option<Rect> {
        match &self.data[self.slot(id) as usize] {
            NodeData::FrameScrolling(frame) => Some(frame.layout_viewport),
            _ => None,
        }
    }

    /// Synchronous scrolling reasons of `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is unknown.
    #[must_use]
    pub fn synchronous_scrolling_reasons(&self, id: ScrollingNodeId) -> SynchronousScrollingReasons {
        self.sync_reasons[self.slot(id) as usize]
    }

    // -- Commit API --

    /// Applies a batch of main-thread changes to `id`.
    ///
    /// Fields that do not apply to the node's kind are ignored with a
    /// warning. A requested scroll position is applied last. The node is
    /// marked for repositioning and its scroll position becomes the new
    /// baseline for positioned nodes.
    ///
    /// # Panics
    ///
    /// Panics if `id` or a referenced overflow node is unknown.
    pub fn commit(&mut self, id: ScrollingNodeId, commit: NodeCommit) {
        let idx = self.slot(id);
        let i = idx as usize;

        if let Some(geometry) = commit.geometry {
            self.geometry[i] = geometry;
            self.scroll_position[i] = geometry.clamp(self.scroll_position[i]);
        }
        if let Some(layer) = commit.layer {
            self.layer[i] = layer;
        }
        if let Some(reasons) = commit.synchronous_scrolling_reasons {
            self.sync_reasons[i] = reasons;
        }
        if let Some(offsets) = commit.snap_offsets {
            self.snap_offsets[i] = offsets;
        }

        if commit.frame_layers.is_some()
            || commit.layout_viewport.is_some()
            || commit.frame_insets.is_some()
        {
            if let NodeData::FrameScrolling(frame) = &mut self.data[i] {
                if let Some(layers) = commit.frame_layers {
                    frame.layers = layers;
                }
                if let Some(viewport) = commit.layout_viewport {
                    frame.layout_viewport = viewport;
                }
                if let Some((inset, header, footer)) = commit.frame_insets {
                    frame.top_content_inset = inset;
                    frame.header_height = header;
                    frame.footer_height = footer;
                }
            } else {
                log::warn!("ignoring frame state committed to non-frame node {id:?}");
            }
        }

        if let Some(constraints) = commit.fixed_constraints {
            match &mut self.data[i] {
                NodeData::Fixed(c) => *c = constraints,
                _ => log::warn!("ignoring fixed constraints committed to {id:?}"),
            }
        }
        if let Some(constraints) = commit.sticky_constraints {
            match &mut self.data[i] {
                NodeData::Sticky(c) => *c = constraints,
                _ => log::warn!("ignoring sticky constraints committed to {id:?}"),
            }
        }
        if let Some(overflow) = commit.proxied_overflow {
            let target = self.slot(overflow);
            if let NodeData::OverflowProxy { overflow: current } = &mut self.data[i] {
                let previous = current.replace(overflow);
                if let Some(previous) = previous.and_then(|p| self.slots.get(&p).copied()) {
                    self.dirty.remove_dependency(idx, previous, dirty::POSITION);
                }
                let _ = self.dirty.add_dependency(idx, target, dirty::POSITION);
            } else {
                log::warn!("ignoring proxied overflow committed to {id:?}");
            }
        }
        if let Some((related, position)) = commit.related_overflow {
            let targets: Vec<u32> = related.iter().map(|r| self.slot(*r)).collect();
            if let NodeData::Positioned {
                related_overflow,
                layer_position_at_last_layout,
            } = &mut self.data[i]
            {
                let previous = core::mem::replace(related_overflow, related);
                *layer_position_at_last_layout = position;
                for p in previous.iter().filter_map(|p| self.slots.get(p).copied()) {
                    self.dirty.remove_dependency(idx, p, dirty::POSITION);
                }
                for t in targets {
                    let _ = self.dirty.add_dependency(idx, t, dirty::POSITION);
                }
            } else {
                log::warn!("ignoring related overflow nodes committed to {id:?}");
            }
        }

        if let Some((position, scroll_type)) = commit.requested_scroll_position {
            self.scroll_to(id, position, scroll_type);
        }

        self.last_committed_scroll_position[i] = self.scroll_position[i];
        self.dirty.mark_with(idx, dirty::POSITION, &EagerPolicy);
    }

    // -- Main-thread synchronization --

    /// Returns `true` while the main thread keeps up with scrolling.
    #[must_use]
    pub fn is_scrolling_synchronized_with_main_thread(&self) -> bool {
        self.synchronized_with_main_thread
    }

    /// Records whether the main thread keeps up with scrolling.
    ///
    /// While desynchronized, layer positions set on the scrolling thread are
    /// forced through to the scene graph even when unchanged.
    pub fn set_scrolling_synchronized_with_main_thread(&mut self, synchronized: bool) {
        self.synchronized_with_main_thread = synchronized;
    }

    /// The main thread finished a rendering update.
    ///
    /// If the root contents layer still has a composition scheduled or
    /// running, completion is deferred until
    /// [`did_complete_platform_rendering_update`](Self::did_complete_platform_rendering_update).
    pub fn did_complete_rendering_update(&mut self) {
        let busy = self
            .root_contents_layer()
            .is_some_and(|layer| layer.is_composition_required_or_ongoing());
        if busy {
            self.waiting_for_platform_rendering_update = true;
            return;
        }
        self.rendering_update_complete();
    }

    /// The compositor finished the composition of a rendering update.
    pub fn did_complete_platform_rendering_update(&mut self) {
        self.rendering_update_complete();
    }

    /// Returns `true` while a completed rendering update waits for its
    /// composition.
    #[must_use]
    pub fn is_waiting_for_platform_rendering_update(&self) -> bool {
        self.waiting_for_platform_rendering_update
    }

    /// Takes the scroll positions queued for the main thread.
    pub fn take_scroll_updates(&mut self) -> Vec<ScrollUpdate> {
        core::mem::take(&mut self.pending_updates)
    }

    fn rendering_update_complete(&mut self) {
        self.waiting_for_platform_rendering_update = false;
        self.synchronized_with_main_thread = true;
    }

    /// Root contents layer of the root frame scroller.
    pub(crate) fn root_contents_layer(&self) -> Option<&Arc<PlatformLayer>> {
        match self.data.get(self.root as usize)? {
            NodeData::FrameScrolling(frame) => frame.layers.root_contents.as_ref(),
            _ => None,
        }
    }

    // -- Internal helpers --

    /// Slot of `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is unknown.
    pub(crate) fn slot(&self, id: ScrollingNodeId) -> u32 {
        match self.slots.get(&id) {
            Some(&idx) => idx,
            None => panic!("unknown scrolling node: {id:?}"),
        }
    }

    pub(crate) fn id_at(&self, idx: u32) -> Option<ScrollingNodeId> {
        (idx != INVALID).then(|| self.node_id[idx as usize])
    }

    /// Returns `true` if slot `idx` holds a live node.
    pub(crate) fn is_live(&self, idx: u32) -> bool {
        idx < self.len && self.slots.get(&self.node_id[idx as usize]) == Some(&idx)
    }

    /// Nearest ancestor of `idx` (excluding itself) matching `pred`.
    pub(crate) fn ancestor_where(&self, idx: u32, pred: impl Fn(ScrollingNodeType) -> bool) -> u32 {
        let mut cur = self.parent[idx as usize];
        while cur != INVALID {
            if pred(self.node_type[cur as usize]) {
                return cur;
            }
            cur = self.parent[cur as usize];
        }
        INVALID
    }

    fn link(&mut self, c: u32, p: u32) {
        self.parent[c as usize] = p;
        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }
        let _ = self.dirty.add_dependency(c, p, dirty::POSITION);
    }

    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            self.first_child[p as usize] = next;
        }
        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.dirty.remove_dependency(idx, p, dirty::POSITION);
        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }

    fn free_slot(&mut self, idx: u32) {
        let i = idx as usize;
        self.slots.remove(&self.node_id[i]);
        self.dirty.remove_key(idx);
        self.layer[i] = None;
        self.data[i] = NodeData::FrameHosting;
        self.parent[i] = INVALID;
        self.first_child[i] = INVALID;
        self.next_sibling[i] = INVALID;
        self.prev_sibling[i] = INVALID;
        if self.root == idx {
            self.root = INVALID;
        }
        if self.latched == idx {
            self.latched = INVALID;
        }
        self.free_list.push(idx);
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Size;

    use super::*;

    fn id(n: u64) -> ScrollingNodeId {
        ScrollingNodeId(n)
    }

    #[test]
    fn create_and_query_topology() {
        let mut tree = ScrollingTree::default();
        tree.create_node(ScrollingNodeType::MainFrame, id(1), None);
        tree.create_node(ScrollingNodeType::Overflow, id(2), Some(id(1)));
        tree.create_node(ScrollingNodeType::Fixed, id(3), Some(id(1)));

        assert_eq!(tree.root_node(), Some(id(1)));
        assert_eq!(tree.parent(id(2)), Some(id(1)));
        assert_eq!(tree.children(id(1)), vec![id(2), id(3)]);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn remove_node_drops_subtree_and_recycles_slots() {
        let mut tree = ScrollingTree::default();
        tree.create_node(ScrollingNodeType::MainFrame, id(1), None);
        tree.create_node(ScrollingNodeType::Overflow, id(2), Some(id(1)));
        tree.create_node(ScrollingNodeType::Sticky, id(3), Some(id(2)));
        tree.create_node(ScrollingNodeType::Fixed, id(4), Some(id(1)));

        tree.remove_node(id(2));
        assert!(!tree.contains(id(2)));
        assert!(!tree.contains(id(3)));
        assert_eq!(tree.children(id(1)), vec![id(4)]);

        let before = tree.len;
        tree.create_node(ScrollingNodeType::Overflow, id(5), Some(id(4)));
        assert_eq!(tree.len, before, "freed slots are reused");
        assert_eq!(tree.node_type(id(5)), ScrollingNodeType::Overflow);
    }

    #[test]
    fn removing_root_empties_root() {
        let mut tree = ScrollingTree::default();
        tree.create_node(ScrollingNodeType::MainFrame, id(1), None);
        tree.remove_node(id(1));
        assert_eq!(tree.root_node(), None);
        assert!(tree.is_empty());
        tree.create_node(ScrollingNodeType::MainFrame, id(7), None);
        assert_eq!(tree.root_node(), Some(id(7)));
    }

    #[test]
    #[should_panic(expected = "already exists")]
    fn duplicate_id_panics() {
        let mut tree = ScrollingTree::default();
        tree.create_node(ScrollingNodeType::MainFrame, id(1), None);
        tree.create_node(ScrollingNodeType::Overflow, id(1), Some(id(1)));
    }

    #[test]
    #[should_panic(expected = "plugin scrolling nodes are not supported")]
    fn plugin_node_creation_panics() {
        let mut tree = ScrollingTree::default();
        tree.create_node(ScrollingNodeType::PluginScrolling, id(1), None);
    }

    #[test]
    #[should_panic(expected = "unknown scrolling node")]
    fn unknown_parent_panics() {
        let mut tree = ScrollingTree::default();
        tree.create_node(ScrollingNodeType::Overflow, id(2), Some(id(9)));
    }

    #[test]
    fn commit_clamps_position_and_applies_frame_state() {
        let mut tree = ScrollingTree::default();
        tree.create_node(ScrollingNodeType::MainFrame, id(1), None);
        tree.commit(
            id(1),
            NodeCommit {
                geometry: Some(ScrollGeometry {
                    scrollable_area_size: Size::new(100.0, 100.0),
                    total_contents_size: Size::new(100.0, 400.0),
                    scroll_origin: Point::ZERO,
                }),
                layout_viewport: Some(Rect::new(0.0, 0.0, 100.0, 100.0)),
                frame_insets: Some((10.0, 0.0, 0.0)),
                requested_scroll_position: Some((Point::new(0.0, 1000.0), ScrollType::Programmatic)),
                ..NodeCommit::default()
            },
        );
        assert_eq!(tree.scroll_position(id(1)), Point::new(0.0, 300.0));
        assert_eq!(
            tree.layout_viewport(id(1)),
            Some(Rect::new(0.0, 300.0, 100.0, 400.0))
        );
        match tree.node_data(id(1)) {
            NodeData::FrameScrolling(frame) => assert_eq!(frame.top_content_inset, 10.0),
            other => panic!("unexpected node data {other:?}"),
        }
    }

    #[test]
    fn platform_rendering_update_completes_deferred_update() {
        let mut tree = ScrollingTree::default();
        tree.set_scrolling_synchronized_with_main_thread(false);
        // No root contents layer: completes immediately.
        tree.did_complete_rendering_update();
        assert!(tree.is_scrolling_synchronized_with_main_thread());
        assert!(!tree.is_waiting_for_platform_rendering_update());

        tree.set_scrolling_synchronized_with_main_thread(false);
        tree.did_complete_platform_rendering_update();
        assert!(tree.is_scrolling_synchronized_with_main_thread());
    }
}
