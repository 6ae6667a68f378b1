// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Threaded scrolling for strata.
//!
//! The main thread describes the page's scrollers as a tree of nodes and
//! commits their geometry, layers and constraints. The scrolling thread
//! answers wheel events against that tree without waiting for the main
//! thread, animates scroll snapping, and moves the affected platform layers
//! straight into the scene graph.
//!
//! ```text
//!   main thread ──commit──► ScrollingTree ◄──wheel / tick── ScrollingThread
//!        ▲                       │ apply_layer_positions()
//!        │                       ▼
//!   take_scroll_updates   PlatformLayer::set_position_for_scrolling
//! ```
//!
//! **[`ScrollingTree`]**: Struct-of-arrays node storage. Scroll changes mark
//! the [`dirty::POSITION`] channel; dependents (descendants, overflow proxies,
//! positioned nodes) are marked with them, and
//! [`apply_layer_positions`](ScrollingTree::apply_layer_positions)
//! repositions everything affected in dependency order.
//!
//! **[`ScrollingThread`]**: The thread owning the event loop.
//!
//! **[`viewport`]**: Pure frame layer geometry: inset clip, root contents,
//! header and footer positions.
//!
//! **[`constraints`]**: Fixed and sticky positioning.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod constraints;
pub mod dirty;
mod handling;
mod hit_test;
pub mod node;
mod positions;
pub mod snap;
mod thread;
mod tree;
pub mod viewport;
pub mod wheel;

pub use hit_test::collect_descendant_layers_at_point;
pub use node::{
    NodeCommit, ScrollGeometry, ScrollType, ScrollingLayerPositionAction, ScrollingNodeType,
    SynchronousScrollingReasons,
};
pub use snap::{ScrollState, SnapOffsets};
pub use strata_core::id::ScrollingNodeId;
pub use thread::{ScrollingThread, is_scrolling_thread};
pub use tree::{ScrollUpdate, ScrollingTree};
pub use wheel::{EventTargeting, WheelEvent, WheelEventHandlingResult};
