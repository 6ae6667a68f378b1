// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render plans, damage tracking and 3D ordering for strata.
//!
//! This crate sits between [`strata_core`]'s committed scene graph and a
//! backend that draws. It provides:
//!
//! - [`SceneCompositor`]: walks committed layer state once per frame
//! - [`RenderPlan`] / [`RenderItem`]: the ordered draw commands of a frame
//! - [`DamageRegion`]: what changed on the surface since the last frame
//! - [`Layer3dRenderingContext`]: BSP painter's ordering for layers that
//!   preserve 3D, with [`classify_polygon`] and [`Polygon3d::split`]

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

mod bsp;
mod compositor;
mod damage;
mod plan;

pub use bsp::{
    COPLANAR_EPSILON, ClipPath, ClipVertex, ClipVertexBuffer, Layer3dRenderingContext, LayerQuad,
    Plane3d, Polygon3d, PolygonPosition, classify_polygon,
};
pub use compositor::SceneCompositor;
pub use damage::DamageRegion;
pub use plan::{ItemContent, RenderItem, RenderPlan, TileQuad};
