//! Screen-space geometry of the insertion overlay.
//!
//! Coordinates are editor-relative pixels: `x` grows to the right from the editor's left edge,
//! `y` grows downwards from the top of the visible area (i.e. after vertical scrolling).

use crate::config::OverlayConfig;
use crate::insertion::NormalizedInsertion;
use crate::layout::LineCoordinates;

/// A point in editor-relative pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point {
    /// Create a point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The point moved horizontally by `dx`.
    pub fn delta_x(self, dx: f64) -> Self {
        Self::new(self.x + dx, self.y)
    }

    /// The point moved vertically by `dy`.
    pub fn delta_y(self, dy: f64) -> Self {
        Self::new(self.x, self.y + dy)
    }
}

/// Horizontal layout of the editor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EditorLayoutInfo {
    /// Offset where line content begins (after gutter, line numbers, folding margin).
    pub content_left: f64,
    /// Total editor width.
    pub width: f64,
    /// Total editor height.
    pub height: f64,
}

impl EditorLayoutInfo {
    /// Layout with the given content-left offset and size.
    pub fn new(content_left: f64, width: f64, height: f64) -> Self {
        Self {
            content_left,
            width,
            height,
        }
    }
}

/// Scroll offsets of the editor viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollPosition {
    /// Horizontal scroll offset.
    pub scroll_left: f64,
    /// Vertical scroll offset.
    pub scroll_top: f64,
}

impl ScrollPosition {
    /// Create a scroll position.
    pub fn new(scroll_left: f64, scroll_top: f64) -> Self {
        Self {
            scroll_left,
            scroll_top,
        }
    }
}

/// Corner points and decoration metrics of the overlay box.
///
/// *Inner* points lie on the content-left edge, *outer* points on the right end of the widest
/// resulting line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutGeometry {
    /// `(content_left, top)`.
    pub top_inner: Point,
    /// `(left, top)`.
    pub top_outer: Point,
    /// `(content_left, bottom)`.
    pub bottom_inner: Point,
    /// `(left, bottom)`.
    pub bottom_outer: Point,
    /// `bottom - top`.
    pub height: f64,
    /// Horizontal scroll offset the geometry was computed with.
    pub horizontal_scroll_offset: f64,
    /// Padding around the box.
    pub padding: f64,
    /// Corner radius.
    pub border_radius: f64,
}

impl LayoutGeometry {
    /// Width of the box before padding.
    pub fn width(&self) -> f64 {
        self.top_outer.x - self.top_inner.x
    }
}

/// Compute the overlay geometry, or `None` when the box would have no positive width
/// (e.g. scrolled horizontally past its right end).
///
/// The box spans the insertion line. When the inserted text starts with a newline its content
/// begins on the following row, so the box starts at the bottom of the line instead of its top.
pub fn compute_layout_geometry(
    insertion: &NormalizedInsertion,
    max_width: f64,
    layout: &EditorLayoutInfo,
    scroll: ScrollPosition,
    coordinates: &dyn LineCoordinates,
    config: &OverlayConfig,
) -> Option<LayoutGeometry> {
    let left = layout.content_left + max_width - scroll.scroll_left;
    let code_left = layout.content_left;

    if left <= code_left {
        tracing::debug!(
            left,
            code_left,
            scroll_left = scroll.scroll_left,
            "overlay_suppressed_non_positive_width"
        );
        return None;
    }

    let line = insertion.line_number;
    let anchor = if insertion.starts_with_newline() {
        coordinates.bottom_for_line_number(line)
    } else {
        coordinates.top_for_line_number(line)
    };
    let top = anchor - scroll.scroll_top;
    let bottom = coordinates.top_for_line_number(line + 1) - scroll.scroll_top;

    Some(LayoutGeometry {
        top_inner: Point::new(code_left, top),
        top_outer: Point::new(left, top),
        bottom_inner: Point::new(code_left, bottom),
        bottom_outer: Point::new(left, bottom),
        height: bottom - top,
        horizontal_scroll_offset: scroll.scroll_left,
        padding: config.padding_px,
        border_radius: config.border_radius_px,
    })
}

/// Width hint for the hosting overlay container: the box width, or `0` without geometry.
pub fn min_content_width(geometry: Option<&LayoutGeometry>) -> f64 {
    geometry.map_or(0.0, |geometry| geometry.width().max(0.0))
}
