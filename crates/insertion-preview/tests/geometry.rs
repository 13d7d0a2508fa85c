use insertion_preview::{
    EditorLayoutInfo, LineCoordinates, NormalizedInsertion, OverlayConfig, OverlayPath,
    PathCommand, Point, ScrollPosition, UniformLineHeights, compute_layout_geometry,
    min_content_width,
};

/// Uniform rows plus a block of ghost rows rendered below `after_line`.
struct WithGhostRows {
    inner: UniformLineHeights,
    after_line: usize,
    rows: usize,
}

impl LineCoordinates for WithGhostRows {
    fn top_for_line_number(&self, line_number: usize) -> f64 {
        let extra = if line_number > self.after_line {
            self.rows as f64 * self.inner.line_height()
        } else {
            0.0
        };
        self.inner.top_for_line_number(line_number) + extra
    }

    fn bottom_for_line_number(&self, line_number: usize) -> f64 {
        self.top_for_line_number(line_number) + self.inner.line_height()
    }
}

fn insertion(line_number: usize, text: &str) -> NormalizedInsertion {
    NormalizedInsertion {
        line_number,
        column: 5,
        text: text.to_string(),
    }
}

fn layout() -> EditorLayoutInfo {
    EditorLayoutInfo::new(30.0, 800.0, 600.0)
}

#[test]
fn test_box_is_suppressed_once_scrolled_past_its_right_end() {
    let heights = UniformLineHeights::new(20.0);
    let config = OverlayConfig::default();
    let ins = insertion(2, "abc");

    for scroll_left in [50.0, 50.5, 120.0] {
        let geometry = compute_layout_geometry(
            &ins,
            50.0,
            &layout(),
            ScrollPosition::new(scroll_left, 0.0),
            &heights,
            &config,
        );
        assert_eq!(geometry, None, "scroll_left = {scroll_left}");
        assert_eq!(min_content_width(geometry.as_ref()), 0.0);
    }

    let geometry = compute_layout_geometry(
        &ins,
        50.0,
        &layout(),
        ScrollPosition::new(49.5, 0.0),
        &heights,
        &config,
    )
    .unwrap();
    assert_eq!(geometry.top_outer.x, 30.5);
    assert_eq!(geometry.top_inner.x, 30.0);
}

#[test]
fn test_zero_width_is_suppressed_without_scrolling() {
    let geometry = compute_layout_geometry(
        &insertion(1, ""),
        0.0,
        &layout(),
        ScrollPosition::default(),
        &UniformLineHeights::new(20.0),
        &OverlayConfig::default(),
    );
    assert_eq!(geometry, None);
}

#[test]
fn test_left_edge_hidden_iff_scrolled() {
    let heights = UniformLineHeights::new(20.0);
    let config = OverlayConfig::default();
    let ins = insertion(3, "abc");

    for (scroll_left, hidden) in [(0.0, false), (1.0, true), (25.0, true)] {
        let geometry = compute_layout_geometry(
            &ins,
            80.0,
            &layout(),
            ScrollPosition::new(scroll_left, 0.0),
            &heights,
            &config,
        )
        .unwrap();
        let path = OverlayPath::from_geometry(&geometry, &config.style);
        assert_eq!(path.hide_left, hidden, "scroll_left = {scroll_left}");
        assert_eq!(
            path.commands.last() == Some(&PathCommand::Close),
            !hidden,
            "scroll_left = {scroll_left}"
        );
    }
}

#[test]
fn test_leading_newline_anchors_box_below_the_line() {
    let coordinates = WithGhostRows {
        inner: UniformLineHeights::new(20.0),
        after_line: 4,
        rows: 2,
    };
    let config = OverlayConfig::default();
    let scroll = ScrollPosition::new(0.0, 15.0);

    let inline = compute_layout_geometry(
        &insertion(4, "abc"),
        40.0,
        &layout(),
        scroll,
        &coordinates,
        &config,
    )
    .unwrap();
    // Top of line 4 to top of line 5 (which sits below two ghost rows).
    assert_eq!(inline.top_inner, Point::new(30.0, 60.0 - 15.0));
    assert_eq!(inline.bottom_inner, Point::new(30.0, 120.0 - 15.0));

    let below = compute_layout_geometry(
        &insertion(4, "\nabc\ndef"),
        40.0,
        &layout(),
        scroll,
        &coordinates,
        &config,
    )
    .unwrap();
    // Bottom of line 4: only the ghost rows are covered.
    assert_eq!(below.top_inner, Point::new(30.0, 80.0 - 15.0));
    assert_eq!(below.bottom_outer, Point::new(70.0, 120.0 - 15.0));
    assert_eq!(below.height, 40.0);
}
