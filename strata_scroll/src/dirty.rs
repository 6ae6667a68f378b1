// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channels of the scrolling tree.
//!
//! [`POSITION`] uses [`EagerPolicy`](understory_dirty::EagerPolicy) with
//! dependency edges from each node to its parent, and from proxy and
//! positioned nodes to the overflow nodes they follow. Scrolling a node
//! therefore marks every node whose layers derive from its scroll position.
//! [`ScrollingTree::apply_layer_positions`](crate::ScrollingTree::apply_layer_positions)
//! drains the channel in dependency order, so parents are repositioned
//! before their children.

use understory_dirty::Channel;

/// Scroll position, geometry or constraints changed; layers must be
/// repositioned.
pub const POSITION: Channel = Channel::new(0);
