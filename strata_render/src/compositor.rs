// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render-thread consumer of the committed scene graph.
//!
//! [`SceneCompositor::composite`] walks the committed state of a
//! [`CompositionLayer`] tree once per frame. It applies pending backing store
//! updates to its tile cache, computes each layer's to-surface transform,
//! routes `preserves_3d` subtrees through a [`Layer3dRenderingContext`] and
//! emits the resulting draw items into a [`RenderPlan`]. Comparing each
//! layer's generation and surface bounds with the previous frame yields the
//! frame's [`DamageRegion`].

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use std::sync::Arc;

use hashbrown::HashMap;
use kurbo::{Point, Rect, Size};
use strata_core::backing_store::{BackingStoreProxy, BackingStoreUpdate, TileId};
use strata_core::composition::{CompositionLayer, CompositionState};
use strata_core::delta::LayerDelta;
use strata_core::geometry::{IntRect, Point3};
use strata_core::id::LayerId;
use strata_core::layer::{AnimatedBackingStoreClient, ContentsBufferProxy, NativeImage};
use strata_core::properties::{Color, Damage, DebugBorder, LayerFlags};
use strata_core::tile_buffer::TileBuffer;
use strata_core::trace::{PhaseKind, Tracer};
use strata_core::transform::Transform3d;

use crate::bsp::{ClipVertexBuffer, Layer3dRenderingContext, LayerQuad, Polygon3d};
use crate::damage::DamageRegion;
use crate::plan::{ItemContent, RenderItem, RenderPlan, TileQuad};

#[derive(Debug)]
struct CachedTile {
    rect: IntRect,
    /// Painted parts in upload order; later fragments cover earlier ones.
    fragments: Vec<(IntRect, Arc<TileBuffer>)>,
}

/// Render-side copy of one backing store.
#[derive(Debug, Default)]
struct TileCache {
    contents_scale: f32,
    tiles: BTreeMap<TileId, CachedTile>,
}

impl TileCache {
    /// Applies `update`, returning the changed areas in scaled pixels.
    fn apply(&mut self, update: BackingStoreUpdate) -> Vec<IntRect> {
        let mut changed = Vec::new();
        self.contents_scale = update.contents_scale;
        for id in update.tiles_to_remove {
            if let Some(tile) = self.tiles.remove(&id) {
                changed.push(tile.rect);
            }
        }
        for creation in update.tiles_to_create {
            self.tiles.insert(
                creation.id,
                CachedTile {
                    rect: creation.rect,
                    fragments: Vec::new(),
                },
            );
        }
        for contents in update.tiles_to_update {
            let Some(tile) = self.tiles.get_mut(&contents.id) else {
                log::warn!("contents update for unknown tile {:?}", contents.id);
                continue;
            };
            contents.buffer.wait_until_painting_complete();
            tile.fragments
                .retain(|(rect, _)| !contents.dirty_rect.contains_rect(*rect));
            tile.fragments.push((contents.dirty_rect, contents.buffer));
            changed.push(contents.dirty_rect);
        }
        changed
    }

    fn quads(&self) -> Vec<TileQuad> {
        let inverse_scale = 1.0 / f64::from(self.contents_scale);
        self.tiles
            .iter()
            .flat_map(|(&id, tile)| {
                tile.fragments.iter().map(move |(rect, buffer)| TileQuad {
                    tile: id,
                    rect: rect.to_rect().scale_from_origin(inverse_scale),
                    buffer: Arc::clone(buffer),
                })
            })
            .collect()
    }
}

/// What the compositor remembers about a layer between frames.
#[derive(Debug)]
struct NodeRecord {
    generation: u64,
    surface_bounds: IntRect,
    last_frame: u64,
    tiles: Option<TileCache>,
}

/// The fields of one committed state the compositor reads.
struct Snapshot {
    delta: LayerDelta,
    position: Point,
    anchor_point: Point3,
    size: Size,
    bounds_origin: Point,
    transform: Transform3d,
    children_transform: Transform3d,
    contents_rect: Rect,
    flags: LayerFlags,
    opacity: f32,
    children: Vec<Arc<CompositionLayer>>,
    backing_store: Option<Arc<BackingStoreProxy>>,
    animated_backing_store_client: Option<Arc<AnimatedBackingStoreClient>>,
    transform_animating: bool,
    image: Option<Arc<NativeImage>>,
    solid_color: Color,
    content_layer: Option<Arc<dyn ContentsBufferProxy>>,
    debug_border: DebugBorder,
    damage: Damage,
}

impl Snapshot {
    fn read(state: &CompositionState) -> Self {
        let image = state
            .image_backing
            .store
            .as_ref()
            .filter(|_| state.image_backing.is_visible)
            .map(|store| Arc::clone(store.image()));
        Self {
            delta: state.delta,
            position: state.position,
            anchor_point: state.anchor_point,
            size: state.size,
            bounds_origin: state.bounds_origin,
            transform: state.transform,
            children_transform: state.children_transform,
            contents_rect: state.contents_rect,
            flags: state.flags,
            opacity: state.opacity,
            children: state.children.clone(),
            backing_store: state.backing_store.clone(),
            animated_backing_store_client: state.animated_backing_store_client.clone(),
            transform_animating: state.animations.has_running_transform_animation(),
            image,
            solid_color: state.solid_color,
            content_layer: state.content_layer.clone(),
            debug_border: state.debug_border,
            damage: if state.delta.contains(LayerDelta::DAMAGE) {
                state.damage.clone()
            } else {
                Damage::Empty
            },
        }
    }
}

/// State a layer passes down to its children.
#[derive(Clone, Copy, Debug)]
struct Inherited {
    /// The children's coordinate space to surface space.
    to_surface: Transform3d,
    opacity: f32,
}

/// A layer prepared for painting.
struct Prepared {
    id: LayerId,
    bounds: Rect,
    to_surface: Transform3d,
    own_items: Vec<RenderItem>,
    children: Vec<Arc<CompositionLayer>>,
    for_children: Inherited,
    preserves_3d: bool,
}

/// A member of a 3D rendering context.
struct Member {
    bounds: Rect,
    to_surface: Transform3d,
    own_items: Vec<RenderItem>,
    /// Items of a flattened subtree, painted with the member.
    flattened: Vec<RenderItem>,
}

struct Frame<'a> {
    number: u64,
    damage: DamageRegion,
    clip_vertices: &'a mut ClipVertexBuffer,
}

/// Turns committed scene-graph state into render plans.
#[derive(Debug, Default)]
pub struct SceneCompositor {
    frames: u64,
    nodes: HashMap<LayerId, NodeRecord>,
    context_3d: Layer3dRenderingContext,
}

impl SceneCompositor {
    /// Creates a compositor that has not produced a frame yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames composited so far.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Generation of `layer` when the last frame read it.
    #[must_use]
    pub fn last_seen_generation(&self, layer: LayerId) -> Option<u64> {
        self.nodes.get(&layer).map(|record| record.generation)
    }

    /// Composites the tree under `root` into `plan` and returns the damage.
    ///
    /// `plan` is cleared first. The first frame is fully damaged; later
    /// frames damage the old and new surface bounds of moved layers, the
    /// bounds of changed layers, repainted tile areas and the bounds of
    /// layers that left the tree.
    pub fn composite(
        &mut self,
        root: &Arc<CompositionLayer>,
        plan: &mut RenderPlan,
        tracer: &mut Tracer<'_>,
    ) -> DamageRegion {
        self.frames += 1;
        tracer.phase_begin(self.frames, PhaseKind::Composite);
        plan.clear();
        let RenderPlan {
            items,
            clip_vertices,
        } = plan;
        let mut frame = Frame {
            number: self.frames,
            damage: if self.frames == 1 {
                DamageRegion::Full
            } else {
                DamageRegion::None
            },
            clip_vertices,
        };
        let top = Inherited {
            to_surface: Transform3d::IDENTITY,
            opacity: 1.0,
        };
        self.visit(root, &top, items, None, &mut frame);

        let number = frame.number;
        let damage = &mut frame.damage;
        self.nodes.retain(|_, record| {
            let alive = record.last_frame == number;
            if !alive {
                damage.add_rect(record.surface_bounds);
            }
            alive
        });
        tracer.phase_end(self.frames, PhaseKind::Composite);
        frame.damage
    }

    fn visit(
        &mut self,
        node: &Arc<CompositionLayer>,
        inherited: &Inherited,
        items: &mut Vec<RenderItem>,
        members: Option<&mut Vec<Member>>,
        frame: &mut Frame<'_>,
    ) {
        let layer = self.prepare(node, inherited, frame);
        match members {
            Some(members) => {
                let mut member = Member {
                    bounds: layer.bounds,
                    to_surface: layer.to_surface,
                    own_items: layer.own_items,
                    flattened: Vec::new(),
                };
                if layer.preserves_3d {
                    members.push(member);
                    for child in &layer.children {
                        self.visit(child, &layer.for_children, items, Some(&mut *members), frame);
                    }
                } else {
                    for child in &layer.children {
                        self.visit(child, &layer.for_children, &mut member.flattened, None, frame);
                    }
                    members.push(member);
                }
            }
            None if layer.preserves_3d => {
                let mut context = alloc::vec![Member {
                    bounds: layer.bounds,
                    to_surface: layer.to_surface,
                    own_items: layer.own_items,
                    flattened: Vec::new(),
                }];
                for child in &layer.children {
                    self.visit(child, &layer.for_children, items, Some(&mut context), frame);
                }
                log::trace!("3D context of {:?} has {} members", layer.id, context.len());
                self.paint_3d_context(&context, items, frame);
            }
            None => {
                items.extend(layer.own_items);
                for child in &layer.children {
                    self.visit(child, &layer.for_children, items, None, frame);
                }
            }
        }
    }

    /// Reads a node's committed state, updates its record and damage, and
    /// builds its own draw items.
    fn prepare(
        &mut self,
        node: &Arc<CompositionLayer>,
        inherited: &Inherited,
        frame: &mut Frame<'_>,
    ) -> Prepared {
        let id = node.id();
        let (s, generation) =
            node.consume_committed(|state, generation| (Snapshot::read(state), generation));

        let origin = Point::new(
            s.anchor_point.x * s.size.width,
            s.anchor_point.y * s.size.height,
        );
        let local = Transform3d::from_translation(
            origin.x + s.position.x,
            origin.y + s.position.y,
            s.anchor_point.z,
        ) * s.transform
            * Transform3d::from_translation(-origin.x, -origin.y, -s.anchor_point.z);
        let to_surface = inherited.to_surface * local;
        let mut children_to_surface = to_surface
            * Transform3d::from_translation(origin.x, origin.y, s.anchor_point.z)
            * s.children_transform
            * Transform3d::from_translation(
                -origin.x - s.bounds_origin.x,
                -origin.y - s.bounds_origin.y,
                -s.anchor_point.z,
            );
        let preserves_3d = s.flags.contains(LayerFlags::PRESERVES_3D);
        if !preserves_3d {
            children_to_surface = flatten(children_to_surface);
        }
        let opacity = inherited.opacity * s.opacity;
        let bounds = Rect::from_origin_size(Point::ZERO, s.size);
        let surface_bounds = enclosing_surface_rect(bounds, &to_surface);

        if s.transform_animating
            && let Some(client) = &s.animated_backing_store_client
        {
            client.request_backing_store_update_if_needed(&to_surface);
        }

        let (record, is_new) = match self.nodes.entry(id) {
            hashbrown::hash_map::Entry::Occupied(entry) => (entry.into_mut(), false),
            hashbrown::hash_map::Entry::Vacant(entry) => (
                entry.insert(NodeRecord {
                    generation,
                    surface_bounds,
                    last_frame: frame.number,
                    tiles: None,
                }),
                true,
            ),
        };
        if is_new {
            frame.damage.add_rect(surface_bounds);
        } else if record.surface_bounds != surface_bounds {
            frame.damage.add_rect(record.surface_bounds);
            frame.damage.add_rect(surface_bounds);
        } else if record.generation != generation {
            if s.delta.difference(LayerDelta::DAMAGE).is_empty() {
                let full = IntRect::enclosing(bounds);
                frame
                    .damage
                    .add_rect(enclosing_surface_rect(s.damage.bounds(full).to_rect(), &to_surface));
            } else {
                frame.damage.add_rect(surface_bounds);
            }
        }
        record.generation = generation;
        record.surface_bounds = surface_bounds;
        record.last_frame = frame.number;

        match &s.backing_store {
            Some(store) => {
                let cache = record.tiles.get_or_insert_with(TileCache::default);
                let changed = cache.apply(store.take_pending_update());
                let inverse_scale = 1.0 / f64::from(cache.contents_scale);
                for rect in changed {
                    let layer_rect = rect.to_rect().scale_from_origin(inverse_scale);
                    frame.damage.add_rect(enclosing_surface_rect(layer_rect, &to_surface));
                }
            }
            None => record.tiles = None,
        }

        let mut own_items = Vec::new();
        let facing_away = !s.flags.contains(LayerFlags::BACKFACE_VISIBLE)
            && Polygon3d::from_rect(bounds, &to_surface).normal().z < 0.0;
        if opacity > 0.0 && !facing_away {
            let mut push = |content, rect| {
                own_items.push(RenderItem {
                    layer_id: id,
                    content,
                    rect,
                    to_surface,
                    opacity,
                    clip: None,
                });
            };
            if s.flags.contains(LayerFlags::CONTENTS_VISIBLE) {
                if s.solid_color.is_visible() {
                    push(ItemContent::SolidColor(s.solid_color), s.contents_rect);
                }
                if let Some(cache) = &record.tiles {
                    let quads = cache.quads();
                    if !quads.is_empty() {
                        push(ItemContent::Tiles(quads), bounds);
                    }
                }
                if let Some(image) = s.image {
                    push(ItemContent::Image(image), s.contents_rect);
                }
                if let Some(content_layer) = s.content_layer {
                    content_layer.swap_buffers_if_needed();
                    push(ItemContent::External(content_layer), s.contents_rect);
                }
            }
            if s.debug_border.visible {
                push(
                    ItemContent::DebugBorder {
                        color: s.debug_border.color,
                        width: s.debug_border.width,
                    },
                    bounds,
                );
            }
        }

        Prepared {
            id,
            bounds,
            to_surface,
            own_items,
            children: s.children,
            for_children: Inherited {
                to_surface: children_to_surface,
                opacity,
            },
            preserves_3d,
        }
    }

    /// Paints a 3D rendering context in depth order. A member split into
    /// pieces repeats its own items once per piece, clipped; its flattened
    /// subtree follows the first piece.
    fn paint_3d_context(
        &mut self,
        members: &[Member],
        items: &mut Vec<RenderItem>,
        frame: &mut Frame<'_>,
    ) {
        let quads: Vec<LayerQuad<usize>> = members
            .iter()
            .enumerate()
            .map(|(i, member)| LayerQuad {
                layer: i,
                rect: member.bounds,
                to_surface: member.to_surface,
            })
            .collect();
        let mut subtree_painted = alloc::vec![false; members.len()];
        self.context_3d
            .paint(&quads, frame.clip_vertices, |&i, clip| {
                let member = &members[i];
                items.extend(member.own_items.iter().map(|item| RenderItem {
                    clip: (!clip.is_empty()).then(|| clip.clone()),
                    ..item.clone()
                }));
                if !subtree_painted[i] {
                    subtree_painted[i] = true;
                    items.extend(member.flattened.iter().cloned());
                }
            });
    }
}

/// Projects a transform onto the z = 0 plane, as for layers that do not
/// preserve 3D.
fn flatten(mut transform: Transform3d) -> Transform3d {
    transform.cols[0][2] = 0.0;
    transform.cols[1][2] = 0.0;
    transform.cols[2] = [0.0, 0.0, 1.0, 0.0];
    transform.cols[3][2] = 0.0;
    transform
}

/// Smallest integral surface rectangle enclosing `rect` mapped by
/// `to_surface`; empty if the mapping is not finite.
fn enclosing_surface_rect(rect: Rect, to_surface: &Transform3d) -> IntRect {
    if rect.area() <= 0.0 {
        return IntRect::ZERO;
    }
    let quad = to_surface.map_rect_to_quad(rect);
    let mut mapped = Rect::from_points(quad[0].to_point(), quad[1].to_point());
    for p in &quad[2..] {
        mapped = mapped.union_pt(p.to_point());
    }
    if !mapped.is_finite() {
        return IntRect::ZERO;
    }
    IntRect::enclosing(mapped)
}
