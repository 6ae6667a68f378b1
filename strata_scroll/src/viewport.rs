// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame scroller layer geometry.
//!
//! Everything here is a pure function of the scroll position, scroll origin,
//! top content inset and banner sizes.

use kurbo::{Point, Rect};

use crate::node::{FrameScrollingData, ScrollGeometry};

/// Y position of the inset clip layer.
///
/// The clip shrinks away as the page scrolls under the inset and does not
/// move for negative (rubber-band) scroll positions.
#[must_use]
pub fn y_position_for_inset_clip_layer(scroll_position: Point, top_content_inset: f64) -> f64 {
    if top_content_inset == 0.0 {
        return 0.0;
    }
    let scroll_y = scroll_position.y.max(0.0);
    if scroll_y >= top_content_inset {
        return 0.0;
    }
    top_content_inset - scroll_y
}

/// Position of the root contents layer.
#[must_use]
pub fn position_for_root_content_layer(
    scroll_position: Point,
    scroll_origin: Point,
    top_content_inset: f64,
    header_height: f64,
) -> Point {
    Point::new(
        0.0,
        y_position_for_inset_clip_layer(scroll_position, top_content_inset) + header_height,
    ) - scroll_origin.to_vec2()
}

/// Y position of the header banner.
#[must_use]
pub fn y_position_for_header_layer(scroll_position: Point, top_content_inset: f64) -> f64 {
    if top_content_inset == 0.0 {
        return 0.0;
    }
    scroll_position.y.max(0.0).min(top_content_inset)
}

/// Y position of the footer banner.
#[must_use]
pub fn y_position_for_footer_layer(
    scroll_position: Point,
    top_content_inset: f64,
    total_contents_height: f64,
    footer_height: f64,
) -> f64 {
    y_position_for_header_layer(scroll_position, top_content_inset) + total_contents_height
        - footer_height
}

/// Layout viewport after scrolling to `scroll_position`.
///
/// The viewport keeps its size and follows the scroll position, clamped so
/// it never leaves the contents.
#[must_use]
pub fn layout_viewport_for_scroll_position(
    layout_viewport: Rect,
    scroll_position: Point,
    geometry: &ScrollGeometry,
) -> Rect {
    let size = layout_viewport.size();
    let min = geometry.minimum_scroll_position();
    let max_x = (geometry.total_contents_size.width - size.width - geometry.scroll_origin.x).max(min.x);
    let max_y =
        (geometry.total_contents_size.height - size.height - geometry.scroll_origin.y).max(min.y);
    let origin = Point::new(
        scroll_position.x.clamp(min.x, max_x),
        scroll_position.y.clamp(min.y, max_y),
    );
    Rect::from_origin_size(origin, size)
}

/// Positions of the layers placed around a frame's scrolled contents.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RelatedLayerPositions {
    /// Counter-scrolling layer: the layout viewport origin.
    pub counter_scrolling: Point,
    /// Y of the inset clip layer; its x is left as is.
    pub inset_clip_y: f64,
    /// Root contents and content shadow.
    pub root_contents: Point,
    /// Header banner.
    pub header: Point,
    /// Footer banner.
    pub footer: Point,
}

/// Computes where a frame's related layers go for `scroll_position`.
#[must_use]
pub fn related_layer_positions(
    frame: &FrameScrollingData,
    geometry: &ScrollGeometry,
    scroll_position: Point,
) -> RelatedLayerPositions {
    let viewport = frame.layout_viewport;
    let inset = frame.top_content_inset;
    RelatedLayerPositions {
        counter_scrolling: viewport.origin(),
        inset_clip_y: y_position_for_inset_clip_layer(scroll_position, inset),
        root_contents: position_for_root_content_layer(
            scroll_position,
            geometry.scroll_origin,
            inset,
            frame.header_height,
        ),
        header: Point::new(viewport.x0, y_position_for_header_layer(scroll_position, inset)),
        footer: Point::new(
            viewport.x0,
            y_position_for_footer_layer(
                scroll_position,
                inset,
                geometry.total_contents_size.height,
                frame.footer_height,
            ),
        ),
    }
}
