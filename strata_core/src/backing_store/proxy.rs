// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The tile grid and its incremental update.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;
use std::sync::Arc;

use parking_lot::Mutex;

use super::tile::{Tile, TileId, TileIndex};
use super::{BackingStoreUpdate, TileContentsUpdate, TileCreation, TilePainter, UpdateResult};
use crate::config::TilingConfig;
use crate::geometry::IntRect;
use crate::id::LayerId;
use crate::tile_buffer::TileBuffer;
use crate::trace::{PaintEvent, TileUpdateEvent, Tracer};

/// The tiled backing store of one layer.
///
/// Shared between the main thread, which updates it, and the render thread,
/// which takes the accumulated [`BackingStoreUpdate`]. All state sits behind
/// one internal lock.
#[derive(Debug)]
pub struct BackingStoreProxy {
    layer: LayerId,
    config: TilingConfig,
    state: Mutex<ProxyState>,
}

#[derive(Debug)]
struct ProxyState {
    contents_scale: f32,
    /// Set when the scale changed and the grid has not been rebuilt yet.
    scale_changed: bool,
    tiles: BTreeMap<TileIndex, Tile>,
    cover_rect: IntRect,
    next_tile_id: u32,
    /// Buffers handed out while still painting.
    in_flight: Vec<Arc<TileBuffer>>,
    pending: BackingStoreUpdate,
}

#[derive(Default)]
struct UpdateCounts {
    created: u32,
    removed: u32,
    painted: u32,
    pending: u32,
}

impl BackingStoreProxy {
    /// Creates an empty backing store for `layer` at `contents_scale`.
    ///
    /// # Panics
    ///
    /// Panics if `contents_scale` is not a positive finite number.
    #[must_use]
    pub fn new(layer: LayerId, contents_scale: f32, config: TilingConfig) -> Self {
        assert_valid_scale(contents_scale);
        Self {
            layer,
            config,
            state: Mutex::new(ProxyState {
                contents_scale,
                scale_changed: true,
                tiles: BTreeMap::new(),
                cover_rect: IntRect::ZERO,
                next_tile_id: 0,
                in_flight: Vec::new(),
                pending: BackingStoreUpdate {
                    contents_scale,
                    ..BackingStoreUpdate::default()
                },
            }),
        }
    }

    /// Layer this store belongs to.
    #[must_use]
    pub fn layer(&self) -> LayerId {
        self.layer
    }

    /// Current contents scale.
    #[must_use]
    pub fn contents_scale(&self) -> f32 {
        self.state.lock().contents_scale
    }

    /// Changes the contents scale. Returns `true` if it changed.
    ///
    /// Every tile is dropped, so no tile ever mixes pixels painted at two
    /// scales; the next update rebuilds the grid.
    ///
    /// # Panics
    ///
    /// Panics if `contents_scale` is not a positive finite number.
    pub fn set_contents_scale(&self, contents_scale: f32) -> bool {
        assert_valid_scale(contents_scale);
        let mut state = self.state.lock();
        if state.contents_scale == contents_scale {
            return false;
        }
        let ids: Vec<TileId> = state.tiles.values().map(|t| t.id).collect();
        for id in ids {
            state.pending.forget_tile(id);
        }
        state.tiles.clear();
        state.cover_rect = IntRect::ZERO;
        state.contents_scale = contents_scale;
        state.pending.contents_scale = contents_scale;
        state.scale_changed = true;
        true
    }

    /// Brings the tile grid up to date and repaints dirty tiles.
    ///
    /// `visible_rect_including_future` and `contents_rect` are in layer
    /// coordinates; `dirty_region` is in layer coordinates and is always
    /// cleared. Work happens only if the scale changed, a rebuild is forced,
    /// or the dirty region is non-empty.
    pub fn update_if_needed(
        &self,
        visible_rect_including_future: IntRect,
        contents_rect: IntRect,
        force_full_rebuild: bool,
        dirty_region: &mut Vec<IntRect>,
        painter: &dyn TilePainter,
        tracer: &mut Tracer<'_>,
    ) -> UpdateResult {
        let mut state = self.state.lock();
        let needs_update = state.scale_changed || force_full_rebuild || !dirty_region.is_empty();
        let result = if needs_update {
            let counts = self.update_locked(
                &mut state,
                visible_rect_including_future,
                contents_rect,
                dirty_region,
                painter,
                tracer,
            );
            let mut result = UpdateResult::empty();
            if counts.created > 0 || counts.removed > 0 || counts.painted > 0 {
                result |= UpdateResult::TILES_CHANGED;
            }
            if counts.painted > 0 {
                result |= UpdateResult::BUFFERS_CHANGED;
            }
            if counts.pending > 0 {
                result |= UpdateResult::TILES_PENDING;
            }
            tracer.tile_update(&TileUpdateEvent {
                layer: self.layer,
                result,
                tiles_created: counts.created,
                tiles_removed: counts.removed,
                tiles_painted: counts.painted,
                tiles_pending: counts.pending,
            });
            #[cfg(feature = "trace-rich")]
            {
                let records: Vec<_> = state
                    .tiles
                    .values()
                    .map(|t| crate::trace::TileRecord {
                        rect: t.rect,
                        dirty: t.is_dirty(),
                    })
                    .collect();
                tracer.tile_records(self.layer, &records);
            }
            result
        } else {
            UpdateResult::empty()
        };
        dirty_region.clear();
        result
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "squared distances are only compared; saturation is harmless"
    )]
    fn update_locked(
        &self,
        state: &mut ProxyState,
        visible: IntRect,
        contents: IntRect,
        dirty_region: &[IntRect],
        painter: &dyn TilePainter,
        tracer: &mut Tracer<'_>,
    ) -> UpdateCounts {
        let mut counts = UpdateCounts::default();
        let scale = state.contents_scale;
        let tile_size = self.config.tile_size;
        let scaled_contents = contents.scaled_enclosing(scale);
        let scaled_visible = visible
            .scaled_enclosing(scale)
            .intersection(scaled_contents);

        let (coverage, keep) = if scaled_visible.is_empty() {
            (IntRect::ZERO, IntRect::ZERO)
        } else {
            let cover_margin = tile_size * self.config.coverage_margin_tiles;
            let keep_margin = tile_size * self.config.keep_margin_tiles;
            (
                scaled_visible
                    .inflate(cover_margin, cover_margin)
                    .intersection(scaled_contents),
                scaled_visible
                    .inflate(keep_margin, keep_margin)
                    .intersection(scaled_contents),
            )
        };
        state.cover_rect = coverage;

        // Evict tiles that left the keep area or whose clipped rect changed
        // with the contents size.
        let stale: Vec<TileIndex> = state
            .tiles
            .iter()
            .filter(|(index, tile)| {
                !tile.rect.intersects(keep)
                    || tile.rect != index.grid_rect(tile_size).intersection(scaled_contents)
            })
            .map(|(index, _)| *index)
            .collect();
        for index in stale {
            if let Some(tile) = state.tiles.remove(&index) {
                state.pending.forget_tile(tile.id);
                counts.removed += 1;
            }
        }

        // Create missing tiles over the coverage area.
        if !coverage.is_empty() {
            let first_x = coverage.x.div_euclid(tile_size);
            let first_y = coverage.y.div_euclid(tile_size);
            let last_x = (coverage.max_x() - 1).div_euclid(tile_size);
            let last_y = (coverage.max_y() - 1).div_euclid(tile_size);
            for y in first_y..=last_y {
                for x in first_x..=last_x {
                    let index = TileIndex::new(x, y);
                    if state.tiles.contains_key(&index) {
                        continue;
                    }
                    let rect = index.grid_rect(tile_size).intersection(scaled_contents);
                    if rect.is_empty() {
                        continue;
                    }
                    let id = TileId(state.next_tile_id);
                    state.next_tile_id += 1;
                    state.tiles.insert(index, Tile::new(id, rect));
                    state.pending.tiles_to_create.push(TileCreation { id, rect });
                    counts.created += 1;
                }
            }
        }
        state.scale_changed = false;

        for rect in dirty_region {
            let scaled = rect.scaled_enclosing(scale).intersection(scaled_contents);
            if scaled.is_empty() {
                continue;
            }
            for tile in state.tiles.values_mut() {
                tile.invalidate(scaled);
            }
        }

        // Paint nearest-first; the in-flight limit leaves the rest for later.
        state.in_flight.retain(|b| !b.is_painting_complete());
        let center = scaled_visible.center();
        let order: BTreeSet<(u64, TileIndex)> = state
            .tiles
            .iter()
            .filter(|(_, tile)| tile.is_dirty())
            .map(|(index, tile)| {
                let c = tile.rect.center();
                let (dx, dy) = (c.x - center.x, c.y - center.y);
                ((dx * dx + dy * dy) as u64, *index)
            })
            .collect();
        for (_, index) in order {
            if state.in_flight.len() >= self.config.max_concurrent_tile_renders {
                counts.pending += 1;
                continue;
            }
            let Some(tile) = state.tiles.get_mut(&index) else {
                continue;
            };
            let dirty_rect = tile
                .dirty_bounds()
                .intersection(tile.rect)
                .intersection(scaled_contents);
            if dirty_rect.is_empty() {
                tile.mark_clean();
                continue;
            }
            let Some(buffer) = painter.paint(dirty_rect) else {
                log::debug!(
                    "{:?}: painting {dirty_rect:?} produced no buffer, retrying next cycle",
                    self.layer
                );
                counts.pending += 1;
                continue;
            };
            tile.mark_clean();
            let update = TileContentsUpdate {
                id: tile.id,
                tile_rect: tile.rect,
                dirty_rect,
                buffer: Arc::clone(&buffer),
            };
            let threaded = !buffer.is_painting_complete();
            if threaded {
                state.in_flight.push(buffer);
            }
            state.pending.tiles_to_update.push(update);
            counts.painted += 1;
            tracer.paint(&PaintEvent {
                layer: self.layer,
                rect: dirty_rect,
                contents_scale: scale,
                threaded,
            });
        }
        counts
    }

    /// Area currently covered by tiles, in scaled pixels.
    #[must_use]
    pub fn cover_rect(&self) -> IntRect {
        self.state.lock().cover_rect
    }

    /// Number of live tiles.
    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.state.lock().tiles.len()
    }

    /// Number of tiles with unpainted dirty area.
    #[must_use]
    pub fn dirty_tile_count(&self) -> usize {
        self.state.lock().tiles.values().filter(|t| t.is_dirty()).count()
    }

    /// Takes the changes accumulated since the last call.
    #[must_use]
    pub fn take_pending_update(&self) -> BackingStoreUpdate {
        let mut state = self.state.lock();
        let contents_scale = state.contents_scale;
        core::mem::replace(
            &mut state.pending,
            BackingStoreUpdate {
                contents_scale,
                ..BackingStoreUpdate::default()
            },
        )
    }
}

fn assert_valid_scale(contents_scale: f32) {
    assert!(
        contents_scale.is_finite() && contents_scale > 0.0,
        "contents scale must be positive and finite, got {contents_scale}"
    );
}

#[cfg(test)]
mod tests {
    use core::cell::{Cell, RefCell};

    use super::*;
    use crate::tile_buffer::TileBufferFlags;

    fn config(tile_size: i32) -> TilingConfig {
        TilingConfig {
            tile_size,
            coverage_margin_tiles: 0,
            keep_margin_tiles: 0,
            max_concurrent_tile_renders: 2,
        }
    }

    #[derive(Default)]
    struct RecordingPainter {
        painted: RefCell<Vec<IntRect>>,
        fail: Cell<bool>,
        leave_painting: Cell<bool>,
    }

    impl TilePainter for RecordingPainter {
        fn paint(&self, dirty_rect: IntRect) -> Option<Arc<TileBuffer>> {
            if self.fail.get() {
                return None;
            }
            self.painted.borrow_mut().push(dirty_rect);
            let buffer = TileBuffer::new(dirty_rect.size(), TileBufferFlags::SUPPORTS_ALPHA)?;
            if self.leave_painting.get() {
                buffer.begin_painting();
            }
            Some(Arc::new(buffer))
        }
    }

    fn update(
        store: &BackingStoreProxy,
        visible: IntRect,
        contents: IntRect,
        force: bool,
        dirty: &mut Vec<IntRect>,
        painter: &RecordingPainter,
    ) -> UpdateResult {
        store.update_if_needed(visible, contents, force, dirty, painter, &mut Tracer::none())
    }

    #[test]
    fn first_update_creates_and_paints_visible_tiles() {
        let store = BackingStoreProxy::new(LayerId::generate(), 1.0, config(100));
        let painter = RecordingPainter::default();
        let contents = IntRect::new(0, 0, 250, 250);
        let result = update(&store, IntRect::new(0, 0, 150, 150), contents, true, &mut Vec::new(), &painter);
        assert!(result.contains(UpdateResult::TILES_CHANGED | UpdateResult::BUFFERS_CHANGED));
        assert!(!result.contains(UpdateResult::TILES_PENDING));
        assert_eq!(store.tile_count(), 4);
        assert_eq!(store.cover_rect(), IntRect::new(0, 0, 150, 150));
        let update = store.take_pending_update();
        assert_eq!(update.tiles_to_create.len(), 4);
        assert_eq!(update.tiles_to_update.len(), 4);
        assert!(store.take_pending_update().is_empty(), "take drains the update");
    }

    #[test]
    fn dirty_region_outside_coverage_changes_nothing() {
        let store = BackingStoreProxy::new(LayerId::generate(), 1.0, config(100));
        let painter = RecordingPainter::default();
        let contents = IntRect::new(0, 0, 1000, 1000);
        let visible = IntRect::new(0, 0, 100, 100);
        update(&store, visible, contents, true, &mut Vec::new(), &painter);
        painter.painted.borrow_mut().clear();

        let mut dirty = alloc::vec![IntRect::new(800, 800, 50, 50)];
        let result = update(&store, visible, contents, false, &mut dirty, &painter);
        assert!(!result.contains(UpdateResult::TILES_CHANGED));
        assert!(dirty.is_empty(), "input dirty region is always cleared");
        assert!(painter.painted.borrow().is_empty());
    }

    #[test]
    fn dirty_rect_is_clipped_to_tile_and_contents() {
        let store = BackingStoreProxy::new(LayerId::generate(), 1.0, config(100));
        let painter = RecordingPainter::default();
        let contents = IntRect::new(0, 0, 150, 150);
        let visible = IntRect::new(0, 0, 150, 150);
        update(&store, visible, contents, true, &mut Vec::new(), &painter);
        // Partial edge tiles are clipped to the contents.
        assert!(painter.painted.borrow().contains(&IntRect::new(100, 100, 50, 50)));
        painter.painted.borrow_mut().clear();

        let mut dirty = alloc::vec![IntRect::new(90, 0, 100, 10)];
        update(&store, visible, contents, false, &mut dirty, &painter);
        let mut painted = painter.painted.borrow().clone();
        painted.sort_by_key(|r| r.x);
        assert_eq!(
            painted,
            alloc::vec![IntRect::new(90, 0, 10, 10), IntRect::new(100, 0, 50, 10)]
        );
    }

    #[test]
    fn failed_paint_keeps_tile_dirty_and_reports_pending() {
        let store = BackingStoreProxy::new(LayerId::generate(), 1.0, config(100));
        let painter = RecordingPainter::default();
        painter.fail.set(true);
        let contents = IntRect::new(0, 0, 100, 100);
        let result = update(&store, contents, contents, true, &mut Vec::new(), &painter);
        assert!(result.contains(UpdateResult::TILES_PENDING));
        assert!(!result.contains(UpdateResult::BUFFERS_CHANGED));
        assert_eq!(store.dirty_tile_count(), 1);

        painter.fail.set(false);
        let result = update(&store, contents, contents, true, &mut Vec::new(), &painter);
        assert!(result.contains(UpdateResult::BUFFERS_CHANGED));
        assert_eq!(store.dirty_tile_count(), 0);
    }

    #[test]
    fn in_flight_limit_defers_remaining_tiles() {
        let store = BackingStoreProxy::new(LayerId::generate(), 1.0, config(10));
        let painter = RecordingPainter::default();
        painter.leave_painting.set(true);
        let contents = IntRect::new(0, 0, 30, 10);
        let result = update(&store, contents, contents, true, &mut Vec::new(), &painter);
        assert!(result.contains(UpdateResult::TILES_PENDING));
        assert_eq!(painter.painted.borrow().len(), 2, "limit is two in-flight buffers");
        assert_eq!(store.dirty_tile_count(), 1);

        // Finish the in-flight paints so slots free up.
        for update in store.take_pending_update().tiles_to_update {
            update.buffer.complete_painting();
        }
        let result = update(&store, contents, contents, true, &mut Vec::new(), &painter);
        assert!(!result.contains(UpdateResult::TILES_PENDING));
        assert_eq!(store.dirty_tile_count(), 0);
    }

    #[test]
    fn nearest_tiles_paint_first() {
        let mut config = config(10);
        config.coverage_margin_tiles = 4;
        config.keep_margin_tiles = 4;
        config.max_concurrent_tile_renders = 8;
        let store = BackingStoreProxy::new(LayerId::generate(), 1.0, config);
        let painter = RecordingPainter::default();
        let contents = IntRect::new(0, 0, 50, 10);
        update(&store, IntRect::new(40, 0, 10, 10), contents, true, &mut Vec::new(), &painter);
        let painted = painter.painted.borrow();
        assert_eq!(painted[0], IntRect::new(40, 0, 10, 10));
        assert_eq!(painted[1], IntRect::new(30, 0, 10, 10));
    }

    #[test]
    fn scale_change_drops_tiles_and_rebuilds() {
        let store = BackingStoreProxy::new(LayerId::generate(), 1.0, config(100));
        let painter = RecordingPainter::default();
        let contents = IntRect::new(0, 0, 100, 100);
        update(&store, contents, contents, true, &mut Vec::new(), &painter);
        let _ = store.take_pending_update();

        assert!(store.set_contents_scale(2.0));
        assert!(!store.set_contents_scale(2.0), "unchanged scale is a no-op");
        assert_eq!(store.tile_count(), 0);
        let result = update(&store, contents, contents, false, &mut Vec::new(), &painter);
        assert!(result.contains(UpdateResult::TILES_CHANGED));
        assert_eq!(store.tile_count(), 4, "200x200 scaled pixels need four tiles");
        let update = store.take_pending_update();
        assert_eq!(update.contents_scale, 2.0);
        assert_eq!(update.tiles_to_remove.len(), 1);
    }

    #[test]
    fn scrolling_away_evicts_tiles() {
        let store = BackingStoreProxy::new(LayerId::generate(), 1.0, config(100));
        let painter = RecordingPainter::default();
        let contents = IntRect::new(0, 0, 1000, 100);
        update(&store, IntRect::new(0, 0, 100, 100), contents, true, &mut Vec::new(), &painter);
        let _ = store.take_pending_update();
        let result = update(&store, IntRect::new(500, 0, 100, 100), contents, true, &mut Vec::new(), &painter);
        assert!(result.contains(UpdateResult::TILES_CHANGED));
        let update = store.take_pending_update();
        assert_eq!(update.tiles_to_remove.len(), 1);
        assert_eq!(update.tiles_to_create.len(), 1);
        assert_eq!(update.tiles_to_create[0].rect, IntRect::new(500, 0, 100, 100));
    }

    #[test]
    fn forced_rebuild_paints_only_tiles_that_need_it() {
        let store = BackingStoreProxy::new(LayerId::generate(), 1.0, config(100));
        let painter = RecordingPainter::default();
        let contents = IntRect::new(0, 0, 300, 200);
        let visible = IntRect::new(0, 0, 200, 200);
        update(&store, visible, contents, true, &mut Vec::new(), &painter);
        let _ = store.take_pending_update();
        painter.painted.borrow_mut().clear();

        let result = update(&store, visible, contents, true, &mut Vec::new(), &painter);
        assert_eq!(result, UpdateResult::empty(), "clean tiles are kept as painted");
        assert!(painter.painted.borrow().is_empty(), "nothing was repainted");

        let grown = IntRect::new(0, 0, 300, 200);
        let result = update(&store, grown, contents, true, &mut Vec::new(), &painter);
        assert!(result.contains(UpdateResult::TILES_CHANGED | UpdateResult::BUFFERS_CHANGED));
        assert_eq!(
            *painter.painted.borrow(),
            alloc::vec![IntRect::new(200, 0, 100, 100), IntRect::new(200, 100, 100, 100)],
            "only the newly covered column is painted"
        );
        let update = store.take_pending_update();
        assert_eq!(update.tiles_to_create.len(), 2);
        assert!(update.tiles_to_remove.is_empty(), "existing tiles survive the rebuild");
    }

    #[test]
    fn nothing_to_do_returns_empty_result() {
        let store = BackingStoreProxy::new(LayerId::generate(), 1.0, config(100));
        let painter = RecordingPainter::default();
        let contents = IntRect::new(0, 0, 100, 100);
        update(&store, contents, contents, true, &mut Vec::new(), &painter);
        let result = update(&store, contents, contents, false, &mut Vec::new(), &painter);
        assert_eq!(result, UpdateResult::empty());
    }

    #[test]
    #[should_panic(expected = "contents scale must be positive")]
    fn zero_scale_panics() {
        let _ = BackingStoreProxy::new(LayerId::generate(), 0.0, config(100));
    }
}
