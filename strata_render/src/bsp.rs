// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Back-to-front ordering of layers that share a 3D rendering context.
//!
//! Layers preserving 3D may intersect each other, so no per-layer z order
//! paints them correctly. [`Layer3dRenderingContext`] partitions their quads
//! against each other's planes into a binary space partitioning tree and walks
//! it back to front relative to the viewer. Quads cut by a plane are painted in
//! pieces, each clipped to its sub-polygon.
//!
//! Both the build and the walk use explicit worklists, so deep stacks of
//! layers cannot exhaust the call stack.

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use kurbo::{Point, Rect};
use strata_core::geometry::{Point3, Vec3};
use strata_core::transform::Transform3d;

/// Distance from a plane within which a vertex counts as lying on it.
pub const COPLANAR_EPSILON: f64 = 0.05;

/// A plane in surface space, given by a unit normal and a point on it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane3d {
    normal: Vec3,
    point: Point3,
}

impl Plane3d {
    /// Creates the plane through `point` perpendicular to `normal`.
    ///
    /// The normal is normalized; a zero normal yields a plane every point
    /// lies on.
    #[must_use]
    pub fn new(normal: Vec3, point: Point3) -> Self {
        Self {
            normal: normal.normalize(),
            point,
        }
    }

    /// Unit normal.
    #[inline]
    #[must_use]
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Signed distance of `p`; positive on the side the normal points to.
    #[inline]
    #[must_use]
    pub fn distance_to_point(&self, p: Point3) -> f64 {
        self.normal.dot(p - self.point)
    }
}

/// A planar convex polygon in surface space.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Polygon3d {
    vertices: Vec<Point3>,
    normal: Vec3,
}

impl Polygon3d {
    /// Creates a polygon, deriving its normal from the winding of `vertices`.
    #[must_use]
    pub fn new(vertices: Vec<Point3>) -> Self {
        let normal = newell_normal(&vertices);
        Self { vertices, normal }
    }

    /// The quad `rect` maps to under `transform`.
    #[must_use]
    pub fn from_rect(rect: Rect, transform: &Transform3d) -> Self {
        Self::new(transform.map_rect_to_quad(rect).to_vec())
    }

    /// Vertices in winding order.
    #[must_use]
    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Unit normal; zero for degenerate polygons.
    #[must_use]
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// The plane the polygon lies in.
    #[must_use]
    pub fn plane(&self) -> Plane3d {
        let point = self.vertices.first().copied().unwrap_or(Point3::ZERO);
        Plane3d::new(self.normal, point)
    }

    /// Cuts the polygon along `plane` into `(back, front)` pieces.
    ///
    /// Vertices on the plane belong to both pieces. A side the polygon does not
    /// reach comes back with fewer than three vertices. Both pieces keep this
    /// polygon's normal.
    #[must_use]
    pub fn split(&self, plane: &Plane3d) -> (Self, Self) {
        let mut back = Vec::with_capacity(self.vertices.len() + 1);
        let mut front = Vec::with_capacity(self.vertices.len() + 1);
        let count = self.vertices.len();
        for (i, &a) in self.vertices.iter().enumerate() {
            let b = self.vertices[(i + 1) % count];
            let da = plane.distance_to_point(a);
            let db = plane.distance_to_point(b);
            if da >= 0.0 {
                front.push(a);
            }
            if da <= 0.0 {
                back.push(a);
            }
            if (da > 0.0 && db < 0.0) || (da < 0.0 && db > 0.0) {
                let crossing = a.lerp(b, da / (da - db));
                front.push(crossing);
                back.push(crossing);
            }
        }
        (
            Self {
                vertices: back,
                normal: self.normal,
            },
            Self {
                vertices: front,
                normal: self.normal,
            },
        )
    }
}

fn newell_normal(vertices: &[Point3]) -> Vec3 {
    let mut normal = Vec3::ZERO;
    for (i, a) in vertices.iter().enumerate() {
        let b = vertices[(i + 1) % vertices.len()];
        normal.x += (a.y - b.y) * (a.z + b.z);
        normal.y += (a.z - b.z) * (a.x + b.x);
        normal.z += (a.x - b.x) * (a.y + b.y);
    }
    normal.normalize()
}

/// Where a polygon lies relative to a plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolygonPosition {
    /// Every vertex is within [`COPLANAR_EPSILON`] of the plane.
    Coplanar,
    /// On the side the normal points to.
    InFront,
    /// On the other side.
    Behind,
    /// Vertices on both sides.
    Intersecting,
}

/// Classifies `polygon` against `plane`.
///
/// Vertices within [`COPLANAR_EPSILON`] of the plane do not count towards
/// either side, so floating-point noise never turns a touching polygon into an
/// intersecting one.
#[must_use]
pub fn classify_polygon(polygon: &Polygon3d, plane: &Plane3d) -> PolygonPosition {
    let mut in_front = 0_usize;
    let mut behind = 0_usize;
    for &vertex in polygon.vertices() {
        let distance = plane.distance_to_point(vertex);
        if distance > COPLANAR_EPSILON {
            in_front += 1;
        } else if distance < -COPLANAR_EPSILON {
            behind += 1;
        }
    }
    match (in_front > 0, behind > 0) {
        (true, true) => PolygonPosition::Intersecting,
        (true, false) => PolygonPosition::InFront,
        (false, true) => PolygonPosition::Behind,
        (false, false) => PolygonPosition::Coplanar,
    }
}

/// One clip vertex in a layer's local space, laid out for GPU upload.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ClipVertex {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

/// Clip vertices of every split polygon of a frame, packed back to back.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClipVertexBuffer {
    vertices: Vec<ClipVertex>,
}

impl ClipVertexBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Returns `true` if no vertex was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Appends a vertex.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "clip vertices are uploaded as f32"
    )]
    pub fn push(&mut self, point: Point) {
        self.vertices.push(ClipVertex {
            x: point.x as f32,
            y: point.y as f32,
        });
    }

    /// The recorded vertices.
    #[must_use]
    pub fn vertices(&self) -> &[ClipVertex] {
        &self.vertices
    }

    /// The buffer contents as bytes, ready for upload.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Byte offset of the vertex at `index`.
    #[must_use]
    pub const fn byte_offset(index: usize) -> usize {
        index * size_of::<ClipVertex>()
    }

    /// Empties the buffer for reuse.
    pub fn clear(&mut self) {
        self.vertices.clear();
    }
}

/// Clip outline for one painted piece of a layer.
///
/// Empty when the layer is painted whole.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClipPath {
    /// Outline in the layer's local space.
    pub points: Vec<Point>,
    /// Byte offset of the first vertex in the frame's [`ClipVertexBuffer`].
    pub buffer_offset: usize,
}

impl ClipPath {
    /// Returns `true` if the piece is not clipped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// A layer taking part in a 3D rendering context.
#[derive(Clone, Debug)]
pub struct LayerQuad<T> {
    /// Caller's handle to the layer, passed back when painting.
    pub layer: T,
    /// The layer's rectangle in its local space.
    pub rect: Rect,
    /// Local space to surface space.
    pub to_surface: Transform3d,
}

#[derive(Clone, Debug)]
struct LayerPolygon {
    geometry: Polygon3d,
    layer: usize,
    is_split: bool,
    clip_start: Option<usize>,
}

impl LayerPolygon {
    fn new(geometry: Polygon3d, layer: usize, is_split: bool) -> Self {
        Self {
            geometry,
            layer,
            is_split,
            clip_start: None,
        }
    }
}

#[derive(Debug)]
struct BspNode {
    /// Coplanar polygons; the first one defines the splitting plane.
    polygons: Vec<LayerPolygon>,
    front: Option<usize>,
    back: Option<usize>,
}

enum Visit {
    Node(usize),
    Emit(usize),
}

/// Paints the layers of one 3D rendering context in depth order.
///
/// The node arena is kept between calls.
#[derive(Debug, Default)]
pub struct Layer3dRenderingContext {
    nodes: Vec<BspNode>,
}

impl Layer3dRenderingContext {
    /// Creates a context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls `paint_layer` for each layer piece, back to front.
    ///
    /// The first layer's plane splits the rest, recursively. Split pieces get
    /// their outline, mapped into the layer's local space, appended to
    /// `clip_vertices`; pieces of layers whose transform cannot be inverted
    /// are painted unclipped.
    pub fn paint<T>(
        &mut self,
        layers: &[LayerQuad<T>],
        clip_vertices: &mut ClipVertexBuffer,
        mut paint_layer: impl FnMut(&T, &ClipPath),
    ) {
        self.nodes.clear();
        let mut polygons: VecDeque<LayerPolygon> = layers
            .iter()
            .enumerate()
            .map(|(i, quad)| {
                LayerPolygon::new(Polygon3d::from_rect(quad.rect, &quad.to_surface), i, false)
            })
            .collect();
        let Some(root) = polygons.pop_front() else {
            return;
        };
        self.build_tree(root, polygons);
        let order = self.back_to_front();

        for &node in &order {
            for polygon in &mut self.nodes[node].polygons {
                if !polygon.is_split {
                    continue;
                }
                let Some(to_layer) = layers[polygon.layer].to_surface.inverse() else {
                    continue;
                };
                polygon.clip_start = Some(clip_vertices.len());
                for &vertex in polygon.geometry.vertices() {
                    clip_vertices.push(to_layer.map_point3(vertex).to_point());
                }
            }
        }

        for &node in &order {
            for polygon in &self.nodes[node].polygons {
                let clip = match polygon.clip_start {
                    Some(start) => ClipPath {
                        points: clip_vertices.vertices()
                            [start..start + polygon.geometry.vertex_count()]
                            .iter()
                            .map(|v| Point::new(f64::from(v.x), f64::from(v.y)))
                            .collect(),
                        buffer_offset: ClipVertexBuffer::byte_offset(start),
                    },
                    None => ClipPath::default(),
                };
                paint_layer(&layers[polygon.layer].layer, &clip);
            }
        }
    }

    fn push_node(&mut self, polygon: LayerPolygon) -> usize {
        self.nodes.push(BspNode {
            polygons: alloc::vec![polygon],
            front: None,
            back: None,
        });
        self.nodes.len() - 1
    }

    fn build_tree(&mut self, root: LayerPolygon, rest: VecDeque<LayerPolygon>) {
        let root = self.push_node(root);
        let mut worklist = alloc::vec![(root, rest)];
        while let Some((node, polygons)) = worklist.pop() {
            if polygons.is_empty() {
                continue;
            }
            let plane = self.nodes[node].polygons[0].geometry.plane();
            let mut front = VecDeque::new();
            let mut back = VecDeque::new();
            for polygon in polygons {
                match classify_polygon(&polygon.geometry, &plane) {
                    PolygonPosition::InFront => front.push_back(polygon),
                    PolygonPosition::Behind => back.push_back(polygon),
                    PolygonPosition::Coplanar => self.nodes[node].polygons.push(polygon),
                    PolygonPosition::Intersecting => {
                        let (back_piece, front_piece) = polygon.geometry.split(&plane);
                        if back_piece.vertex_count() > 2 {
                            back.push_back(LayerPolygon::new(back_piece, polygon.layer, true));
                        }
                        if front_piece.vertex_count() > 2 {
                            front.push_back(LayerPolygon::new(front_piece, polygon.layer, true));
                        }
                    }
                }
            }
            if let Some(first) = front.pop_front() {
                let child = self.push_node(first);
                self.nodes[node].front = Some(child);
                worklist.push((child, front));
            }
            if let Some(first) = back.pop_front() {
                let child = self.push_node(first);
                self.nodes[node].back = Some(child);
                worklist.push((child, back));
            }
        }
    }

    /// Node indices in paint order. A node whose plane faces away from the
    /// viewer has its front subtree painted first.
    fn back_to_front(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = alloc::vec![Visit::Node(0)];
        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Emit(node) => order.push(node),
                Visit::Node(node) => {
                    let BspNode {
                        polygons,
                        front,
                        back,
                    } = &self.nodes[node];
                    let (first, last) = if polygons[0].geometry.normal().z < 0.0 {
                        (*front, *back)
                    } else {
                        (*back, *front)
                    };
                    if let Some(last) = last {
                        stack.push(Visit::Node(last));
                    }
                    stack.push(Visit::Emit(node));
                    if let Some(first) = first {
                        stack.push(Visit::Node(first));
                    }
                }
            }
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use core::f64::consts::{FRAC_PI_2, PI};

    use super::*;

    fn square(size: f64) -> Rect {
        Rect::new(0.0, 0.0, size, size)
    }

    #[test]
    fn near_plane_polygon_is_coplanar() {
        let plane = Plane3d::new(Vec3::new(0.0, 0.0, 1.0), Point3::ZERO);
        let polygon = Polygon3d::new(alloc::vec![
            Point3::new(0.0, 0.0, 0.04),
            Point3::new(10.0, 0.0, -0.04),
            Point3::new(10.0, 10.0, 0.01),
            Point3::new(0.0, 10.0, -0.02),
        ]);
        assert_eq!(classify_polygon(&polygon, &plane), PolygonPosition::Coplanar);
    }

    #[test]
    fn degenerate_polygon_is_coplanar() {
        let plane = Plane3d::new(Vec3::new(0.0, 0.0, 1.0), Point3::ZERO);
        let point = Point3::new(3.0, 3.0, 0.0);
        let polygon = Polygon3d::new(alloc::vec![point, point, point]);
        assert_eq!(polygon.normal(), Vec3::ZERO);
        assert_eq!(classify_polygon(&polygon, &plane), PolygonPosition::Coplanar);
    }

    #[test]
    fn classification_by_side() {
        let plane = Plane3d::new(Vec3::new(0.0, 0.0, 1.0), Point3::ZERO);
        let at = |z| Polygon3d::from_rect(square(10.0), &Transform3d::from_translation(0.0, 0.0, z));
        assert_eq!(classify_polygon(&at(5.0), &plane), PolygonPosition::InFront);
        assert_eq!(classify_polygon(&at(-5.0), &plane), PolygonPosition::Behind);

        let tilted = Polygon3d::new(alloc::vec![
            Point3::new(0.0, 0.0, -5.0),
            Point3::new(10.0, 0.0, 5.0),
            Point3::new(10.0, 10.0, 5.0),
            Point3::new(0.0, 10.0, -5.0),
        ]);
        assert_eq!(classify_polygon(&tilted, &plane), PolygonPosition::Intersecting);
    }

    #[test]
    fn rect_normal_faces_viewer() {
        let polygon = Polygon3d::from_rect(square(10.0), &Transform3d::IDENTITY);
        assert_eq!(polygon.normal(), Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn split_quad_down_the_middle() {
        let polygon = Polygon3d::from_rect(square(10.0), &Transform3d::IDENTITY);
        let plane = Plane3d::new(Vec3::new(1.0, 0.0, 0.0), Point3::new(4.0, 0.0, 0.0));
        let (back, front) = polygon.split(&plane);
        assert_eq!(back.vertex_count(), 4, "back piece: {back:?}");
        assert_eq!(front.vertex_count(), 4, "front piece: {front:?}");
        assert!(back.vertices().iter().all(|v| v.x <= 4.0 + 1e-9), "back piece: {back:?}");
        assert!(front.vertices().iter().all(|v| v.x >= 4.0 - 1e-9), "front piece: {front:?}");
        assert_eq!(back.normal(), polygon.normal());
    }

    #[test]
    fn split_off_a_corner() {
        let polygon = Polygon3d::from_rect(square(10.0), &Transform3d::IDENTITY);
        let plane = Plane3d::new(Vec3::new(1.0, 1.0, 0.0), Point3::new(8.0, 8.0, 0.0));
        let (back, front) = polygon.split(&plane);
        assert_eq!(front.vertex_count(), 3, "corner triangle: {front:?}");
        assert_eq!(back.vertex_count(), 5, "remaining pentagon: {back:?}");
    }

    fn paint_order(layers: &[LayerQuad<&'static str>]) -> (Vec<(&'static str, ClipPath)>, ClipVertexBuffer) {
        let mut context = Layer3dRenderingContext::new();
        let mut clip_vertices = ClipVertexBuffer::new();
        let mut painted = Vec::new();
        context.paint(layers, &mut clip_vertices, |name, clip| {
            painted.push((*name, clip.clone()));
        });
        (painted, clip_vertices)
    }

    #[test]
    fn empty_context_paints_nothing() {
        let (painted, clip_vertices) = paint_order(&[]);
        assert!(painted.is_empty(), "no layers, no paints");
        assert!(clip_vertices.is_empty(), "no layers, no clip vertices");
    }

    #[test]
    fn parallel_layers_paint_far_to_near() {
        let layers = [
            LayerQuad {
                layer: "near",
                rect: square(100.0),
                to_surface: Transform3d::from_translation(0.0, 0.0, 10.0),
            },
            LayerQuad {
                layer: "far",
                rect: square(100.0),
                to_surface: Transform3d::IDENTITY,
            },
        ];
        let (painted, clip_vertices) = paint_order(&layers);
        let names: Vec<_> = painted.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, ["far", "near"]);
        assert!(painted.iter().all(|(_, clip)| clip.is_empty()), "nothing was split");
        assert!(clip_vertices.is_empty(), "no clip vertices without splits");
    }

    #[test]
    fn back_facing_layers_still_paint_far_to_near() {
        let flipped = |z| Transform3d::from_translation(100.0, 0.0, z) * Transform3d::from_rotation_y(PI);
        let layers = [
            LayerQuad {
                layer: "near",
                rect: square(100.0),
                to_surface: flipped(10.0),
            },
            LayerQuad {
                layer: "far",
                rect: square(100.0),
                to_surface: flipped(0.0),
            },
        ];
        assert!(
            Polygon3d::from_rect(square(100.0), &flipped(0.0)).normal().z < 0.0,
            "flipped layers face away"
        );
        let (painted, _) = paint_order(&layers);
        let names: Vec<_> = painted.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, ["far", "near"]);
    }

    #[test]
    fn intersecting_layer_is_painted_in_clipped_pieces() {
        // "cut" stands on edge and pierces the z = 0 plane along x = 50.
        let standing =
            Transform3d::from_translation(50.0, 0.0, 50.0) * Transform3d::from_rotation_y(FRAC_PI_2);
        let layers = [
            LayerQuad {
                layer: "flat",
                rect: square(100.0),
                to_surface: Transform3d::IDENTITY,
            },
            LayerQuad {
                layer: "cut",
                rect: square(100.0),
                to_surface: standing,
            },
        ];
        let (painted, clip_vertices) = paint_order(&layers);
        let names: Vec<_> = painted.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, ["cut", "flat", "cut"]);

        assert_eq!(clip_vertices.len(), 8, "two quads of clip vertices");
        assert_eq!(clip_vertices.as_bytes().len(), 8 * size_of::<ClipVertex>());

        let (_, behind) = &painted[0];
        let (_, whole) = &painted[1];
        let (_, in_front) = &painted[2];
        assert!(whole.is_empty(), "the splitting layer is painted whole");
        assert_eq!(behind.points.len(), 4);
        assert_eq!(behind.buffer_offset, 0);
        assert_eq!(in_front.buffer_offset, 4 * size_of::<ClipVertex>());
        // Behind z = 0 is the half with local x > 50.
        assert!(
            behind.points.iter().all(|p| p.x >= 50.0 - 1e-3),
            "behind piece in local space: {:?}",
            behind.points
        );
        assert!(
            in_front.points.iter().all(|p| p.x <= 50.0 + 1e-3),
            "front piece in local space: {:?}",
            in_front.points
        );
    }

    #[test]
    fn deep_stack_of_parallel_layers() {
        let layers: Vec<_> = (0..2000_i32)
            .map(|i| LayerQuad {
                layer: i,
                rect: square(10.0),
                to_surface: Transform3d::from_translation(0.0, 0.0, f64::from(i)),
            })
            .collect();
        let mut context = Layer3dRenderingContext::new();
        let mut clip_vertices = ClipVertexBuffer::new();
        let mut painted = Vec::new();
        context.paint(&layers, &mut clip_vertices, |i, _| painted.push(*i));
        let expected: Vec<i32> = (0..2000).collect();
        assert_eq!(painted, expected);
    }
}
