//! Outline path of the overlay box.
//!
//! The outline is a padded, rounded rectangle around the area the insertion will occupy. Edges
//! can be hidden individually; when the editor is scrolled horizontally the left edge lies under
//! the gutter and is left open. A corner is only rounded when both of its edges are drawn.

use crate::config::OverlayStyle;
use crate::geometry::{LayoutGeometry, Point};
use std::fmt::Write as _;

/// A single outline drawing command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    /// Lift the pen and move to a point.
    MoveTo(Point),
    /// Straight line to a point.
    LineTo(Point),
    /// Quadratic curve through `control` ending at `to`.
    QuadTo {
        /// Control point (the sharp corner).
        control: Point,
        /// End point.
        to: Point,
    },
    /// Close the current subpath.
    Close,
}

/// Which edges of a rectangle are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeVisibility {
    /// Top edge.
    pub top: bool,
    /// Right edge.
    pub right: bool,
    /// Bottom edge.
    pub bottom: bool,
    /// Left edge.
    pub left: bool,
}

impl EdgeVisibility {
    /// All four edges.
    pub const ALL: Self = Self {
        top: true,
        right: true,
        bottom: true,
        left: true,
    };

    /// All edges except the left one when `hide_left` is set.
    pub fn with_left_hidden(hide_left: bool) -> Self {
        Self {
            left: !hide_left,
            ..Self::ALL
        }
    }

    fn all(self) -> bool {
        self.top && self.right && self.bottom && self.left
    }
}

/// Build the outline of a rectangle.
///
/// `top_left`, `width` and `height` describe the inner box; the outline is pushed outwards by
/// `padding` on every side. `radius` is clamped to half the shorter side of the padded box.
pub fn rounded_rectangle(
    top_left: Point,
    width: f64,
    height: f64,
    padding: f64,
    radius: f64,
    edges: EdgeVisibility,
) -> Vec<PathCommand> {
    let left = top_left.x - padding;
    let top = top_left.y - padding;
    let right = top_left.x + width + padding;
    let bottom = top_left.y + height + padding;

    let max_radius = ((right - left).min(bottom - top) / 2.0).max(0.0);
    let r = radius.clamp(0.0, max_radius);
    let corner = |a: bool, b: bool| if a && b { r } else { 0.0 };
    let r_tl = corner(edges.top, edges.left);
    let r_tr = corner(edges.top, edges.right);
    let r_br = corner(edges.bottom, edges.right);
    let r_bl = corner(edges.bottom, edges.left);

    let tl = Point::new(left, top);
    let tr = Point::new(right, top);
    let br = Point::new(right, bottom);
    let bl = Point::new(left, bottom);

    let mut builder = PathBuilder::default();
    if edges.top {
        builder.line(tl.delta_x(r_tl), tr.delta_x(-r_tr));
        if edges.right {
            builder.curve(tr, tr.delta_y(r_tr));
        }
    }
    if edges.right {
        builder.line(tr.delta_y(r_tr), br.delta_y(-r_br));
        if edges.bottom {
            builder.curve(br, br.delta_x(-r_br));
        }
    }
    if edges.bottom {
        builder.line(br.delta_x(-r_br), bl.delta_x(r_bl));
        if edges.left {
            builder.curve(bl, bl.delta_y(-r_bl));
        }
    }
    if edges.left {
        builder.line(bl.delta_y(-r_bl), tl.delta_y(r_tl));
        if edges.top {
            builder.curve(tl, tl.delta_x(r_tl));
        }
    }
    if edges.all() {
        builder.commands.push(PathCommand::Close);
    }
    builder.commands
}

#[derive(Default)]
struct PathBuilder {
    commands: Vec<PathCommand>,
    pen: Option<Point>,
}

impl PathBuilder {
    fn line(&mut self, from: Point, to: Point) {
        if self.pen != Some(from) {
            self.commands.push(PathCommand::MoveTo(from));
        }
        self.commands.push(PathCommand::LineTo(to));
        self.pen = Some(to);
    }

    fn curve(&mut self, control: Point, to: Point) {
        self.commands.push(PathCommand::QuadTo { control, to });
        self.pen = Some(to);
    }
}

/// Serialize commands as SVG path data (`d` attribute).
pub fn to_svg_path_data(commands: &[PathCommand]) -> String {
    let mut out = String::new();
    for command in commands {
        if !out.is_empty() {
            out.push(' ');
        }
        // Writing to a String cannot fail.
        let _ = match command {
            PathCommand::MoveTo(p) => write!(out, "M {} {}", p.x, p.y),
            PathCommand::LineTo(p) => write!(out, "L {} {}", p.x, p.y),
            PathCommand::QuadTo { control, to } => {
                write!(out, "Q {} {} {} {}", control.x, control.y, to.x, to.y)
            }
            PathCommand::Close => write!(out, "Z"),
        };
    }
    out
}

/// The outline handed to the overlay host.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayPath {
    /// Drawing commands.
    pub commands: Vec<PathCommand>,
    /// Whether the left edge was left open because of horizontal scrolling.
    pub hide_left: bool,
    /// Translation applied to the whole outline so that 1px strokes land on pixel centers.
    pub translate: Point,
    /// Visual style.
    pub style: OverlayStyle,
}

impl OverlayPath {
    /// Half-pixel alignment offset.
    pub const HALF_PIXEL_TRANSLATE: Point = Point::new(-0.5, -0.5);

    /// Outline for `geometry`.
    pub fn from_geometry(geometry: &LayoutGeometry, style: &OverlayStyle) -> Self {
        let hide_left = geometry.horizontal_scroll_offset != 0.0;
        let commands = rounded_rectangle(
            geometry.top_inner,
            geometry.width(),
            geometry.bottom_inner.y - geometry.top_inner.y,
            geometry.padding,
            geometry.border_radius,
            EdgeVisibility::with_left_hidden(hide_left),
        );
        Self {
            commands,
            hide_left,
            translate: Self::HALF_PIXEL_TRANSLATE,
            style: style.clone(),
        }
    }

    /// SVG `d` attribute of the outline.
    pub fn to_svg_path_data(&self) -> String {
        to_svg_path_data(&self.commands)
    }

    /// SVG `transform` attribute of the outline.
    pub fn transform(&self) -> String {
        format!("translate({} {})", self.translate.x, self.translate.y)
    }
}
