use insertion_preview::{
    EditorLayoutInfo, EditorSignals, GhostText, GhostTextPart, GhostTextViewOptions,
    InsertionOverlay, InsertionRequest, LineCoordinates, LineRenderer, LineTokens,
    MonospaceRenderer, NoTokenizer, OverlayConfig, OverlayPath, OverlayServices, OverlaySink,
    Point, Runtime, ScrollPosition, Signal, TextDocument, UniformLineHeights,
};
use pretty_assertions::assert_eq;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
enum SinkCall {
    Visible(bool),
    MinContentWidth(f64),
    Path(Option<OverlayPath>),
    GhostText(Option<GhostText>),
}

#[derive(Clone, Default)]
struct RecordingSink {
    calls: Rc<RefCell<Vec<SinkCall>>>,
}

impl RecordingSink {
    fn take(&self) -> Vec<SinkCall> {
        std::mem::take(&mut *self.calls.borrow_mut())
    }
}

impl OverlaySink for RecordingSink {
    fn set_visible(&mut self, visible: bool) {
        self.calls.borrow_mut().push(SinkCall::Visible(visible));
    }

    fn set_min_content_width(&mut self, width: f64) {
        self.calls.borrow_mut().push(SinkCall::MinContentWidth(width));
    }

    fn set_overlay_path(&mut self, path: Option<&OverlayPath>) {
        self.calls.borrow_mut().push(SinkCall::Path(path.cloned()));
    }

    fn set_ghost_text(&mut self, ghost_text: Option<&GhostText>, options: &GhostTextViewOptions) {
        assert_eq!(*options, GhostTextViewOptions::inline_edit());
        self.calls
            .borrow_mut()
            .push(SinkCall::GhostText(ghost_text.cloned()));
    }
}

/// Counts how often lines are rendered.
struct CountingRenderer {
    inner: MonospaceRenderer,
    renders: Rc<Cell<usize>>,
}

impl LineRenderer for CountingRenderer {
    fn render_width(&self, tokens: &LineTokens) -> f64 {
        self.renders.set(self.renders.get() + 1);
        self.inner.render_width(tokens)
    }
}

/// Counts how often line positions are queried.
struct CountingCoordinates {
    inner: UniformLineHeights,
    queries: Rc<Cell<usize>>,
}

impl LineCoordinates for CountingCoordinates {
    fn top_for_line_number(&self, line_number: usize) -> f64 {
        self.queries.set(self.queries.get() + 1);
        self.inner.top_for_line_number(line_number)
    }

    fn bottom_for_line_number(&self, line_number: usize) -> f64 {
        self.queries.set(self.queries.get() + 1);
        self.inner.bottom_for_line_number(line_number)
    }
}

struct Fixture {
    runtime: Runtime,
    editor: EditorSignals,
    doc: Rc<TextDocument>,
    input: Signal<Option<InsertionRequest>>,
    sink: RecordingSink,
    renders: Rc<Cell<usize>>,
    queries: Rc<Cell<usize>>,
    overlay: InsertionOverlay,
}

const CELL_PX: f64 = 8.0;
const LINE_HEIGHT: f64 = 18.0;

fn fixture(text: &str, request: Option<InsertionRequest>) -> Fixture {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let runtime = Runtime::new();
    let queries = Rc::new(Cell::new(0));
    let editor = EditorSignals::new(
        &runtime,
        EditorLayoutInfo::new(30.0, 800.0, 600.0),
        Rc::new(CountingCoordinates {
            inner: UniformLineHeights::new(LINE_HEIGHT),
            queries: Rc::clone(&queries),
        }),
    );
    let doc = Rc::new(TextDocument::new(text));
    editor.attach_model(doc.clone()).unwrap();

    let input = runtime.signal(request);
    let renders = Rc::new(Cell::new(0));
    let services = OverlayServices::new(
        Rc::new(NoTokenizer),
        Rc::new(CountingRenderer {
            inner: MonospaceRenderer::new(CELL_PX),
            renders: Rc::clone(&renders),
        }),
    );
    let sink = RecordingSink::default();
    let overlay = InsertionOverlay::new(
        &runtime,
        &editor,
        input,
        services,
        OverlayConfig::default(),
        Box::new(sink.clone()),
    );

    Fixture {
        runtime,
        editor,
        doc,
        input,
        sink,
        renders,
        queries,
        overlay,
    }
}

const FIVE_LINES: &str = "one\ntwo\nthree\nfour\nabc";

#[test]
fn test_end_to_end_inline_insertion() {
    let f = fixture(FIVE_LINES, Some(InsertionRequest::new(5, 4, "def")));
    f.runtime.flush_effects().unwrap();

    let width = 6.0 * CELL_PX;
    let geometry = f.overlay.layout_geometry().unwrap();
    assert_eq!(geometry.top_inner, Point::new(30.0, 4.0 * LINE_HEIGHT));
    assert_eq!(geometry.top_outer, Point::new(30.0 + width, 4.0 * LINE_HEIGHT));
    assert_eq!(geometry.bottom_inner, Point::new(30.0, 5.0 * LINE_HEIGHT));
    assert_eq!(geometry.bottom_outer, Point::new(30.0 + width, 5.0 * LINE_HEIGHT));
    assert_eq!(geometry.padding, 2.0);
    assert_eq!(geometry.border_radius, 4.0);

    let ghost = GhostText::new(5, vec![GhostTextPart::new(4, "def", false)]);
    let path = OverlayPath::from_geometry(&geometry, &OverlayConfig::default().style);
    assert!(!path.hide_left);

    assert!(f.overlay.is_visible());
    assert_eq!(f.overlay.max_width(), Some(width));
    assert_eq!(f.overlay.min_content_width(), Some(width));
    assert_eq!(f.overlay.ghost_text(), Some(ghost.clone()));
    assert_eq!(f.overlay.overlay_path(), Some(path.clone()));
    assert_eq!(
        f.sink.take(),
        vec![
            SinkCall::Visible(true),
            SinkCall::MinContentWidth(width),
            SinkCall::Path(Some(path)),
            SinkCall::GhostText(Some(ghost)),
        ]
    );

    // Nothing changed, nothing is pushed.
    assert_eq!(f.runtime.flush_effects().unwrap(), 0);
    assert!(f.sink.take().is_empty());
}

#[test]
fn test_absent_request_propagates_absence() {
    let f = fixture(FIVE_LINES, None);
    f.runtime.flush_effects().unwrap();

    assert!(!f.overlay.is_visible());
    assert_eq!(f.overlay.state(), None);
    assert_eq!(f.overlay.ghost_text(), None);
    assert_eq!(f.overlay.max_width(), Some(0.0));
    assert_eq!(f.overlay.layout_geometry(), None);
    assert_eq!(f.overlay.overlay_path(), None);
    assert_eq!(f.overlay.min_content_width(), Some(0.0));
    assert_eq!(f.renders.get(), 0);
    assert_eq!(
        f.sink.take(),
        vec![
            SinkCall::Visible(false),
            SinkCall::MinContentWidth(0.0),
            SinkCall::Path(None),
            SinkCall::GhostText(None),
        ]
    );
}

#[test]
fn test_detaching_the_model_clears_the_overlay() {
    let f = fixture(FIVE_LINES, Some(InsertionRequest::new(5, 4, "def")));
    f.runtime.flush_effects().unwrap();
    f.sink.take();

    f.editor.detach_model().unwrap();
    f.runtime.flush_effects().unwrap();

    assert!(!f.overlay.is_visible());
    assert_eq!(f.overlay.layout_geometry(), None);
    assert_eq!(
        f.sink.take(),
        vec![
            SinkCall::Visible(false),
            SinkCall::MinContentWidth(0.0),
            SinkCall::Path(None),
            SinkCall::GhostText(None),
        ]
    );
}

#[test]
fn test_scrolling_recomputes_geometry_once_without_remeasuring() {
    let f = fixture(FIVE_LINES, Some(InsertionRequest::new(5, 4, "def")));
    f.runtime.flush_effects().unwrap();
    f.sink.take();
    let renders = f.renders.get();
    let queries = f.queries.get();

    f.editor
        .set_scroll(ScrollPosition::new(10.0, 18.0))
        .unwrap();
    f.runtime.flush_effects().unwrap();

    assert_eq!(f.renders.get(), renders);
    // One geometry computation queries two line positions.
    assert_eq!(f.queries.get(), queries + 2);

    let geometry = f.overlay.layout_geometry().unwrap();
    assert_eq!(geometry.top_inner, Point::new(30.0, 3.0 * LINE_HEIGHT));
    assert_eq!(geometry.top_outer.x, 30.0 + 6.0 * CELL_PX - 10.0);
    assert!(f.overlay.overlay_path().unwrap().hide_left);

    let calls = f.sink.take();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], SinkCall::MinContentWidth(6.0 * CELL_PX - 10.0));
    assert!(matches!(&calls[1], SinkCall::Path(Some(path)) if path.hide_left));
}

#[test]
fn test_scrolled_out_box_stays_visible_without_path() {
    let f = fixture(FIVE_LINES, Some(InsertionRequest::new(5, 4, "def")));
    f.runtime.flush_effects().unwrap();
    f.sink.take();

    f.editor
        .set_scroll(ScrollPosition::new(6.0 * CELL_PX, 0.0))
        .unwrap();
    f.runtime.flush_effects().unwrap();

    assert!(f.overlay.is_visible());
    assert_eq!(f.overlay.layout_geometry(), None);
    assert_eq!(
        f.sink.take(),
        vec![SinkCall::MinContentWidth(0.0), SinkCall::Path(None)]
    );
}

#[test]
fn test_content_edit_remeasures() {
    let f = fixture(FIVE_LINES, Some(InsertionRequest::new(5, 4, "def")));
    f.runtime.flush_effects().unwrap();

    f.doc.insert(5, 1, "XYZ");
    f.editor.content_changed().unwrap();
    f.runtime.flush_effects().unwrap();

    // "XYZ" + "def" + "abc"
    assert_eq!(f.overlay.max_width(), Some(9.0 * CELL_PX));
    assert_eq!(f.overlay.min_content_width(), Some(9.0 * CELL_PX));
}

#[test]
fn test_subscribed_document_edits_remeasure() {
    let f = fixture(FIVE_LINES, Some(InsertionRequest::new(5, 4, "def")));
    f.runtime.flush_effects().unwrap();
    let editor = f.editor.clone();
    f.doc.subscribe(move |_| editor.content_changed().unwrap());

    f.doc.insert(5, 1, "XYZ");
    f.runtime.flush_effects().unwrap();
    assert_eq!(f.overlay.max_width(), Some(9.0 * CELL_PX));

    f.doc.delete(insertion_preview::TextRange::on_line(5, 1, 4));
    f.runtime.flush_effects().unwrap();
    assert_eq!(f.overlay.max_width(), Some(6.0 * CELL_PX));
}

#[test]
fn test_request_change_is_normalized() {
    let f = fixture(FIVE_LINES, None);
    f.runtime.flush_effects().unwrap();

    f.runtime
        .set(&f.input, Some(InsertionRequest::new(5, 1, "xy\n")))
        .unwrap();
    f.runtime.flush_effects().unwrap();

    let state = f.overlay.state().unwrap();
    assert_eq!(
        (state.line_number, state.column, state.text.as_str()),
        (4, 5, "\nxy")
    );
    let geometry = f.overlay.layout_geometry().unwrap();
    // Anchored at the bottom of line 4.
    assert_eq!(geometry.top_inner.y, 4.0 * LINE_HEIGHT);
}

#[test]
fn test_no_sink_calls_after_dispose() {
    let mut f = fixture(FIVE_LINES, Some(InsertionRequest::new(5, 4, "def")));
    f.runtime.flush_effects().unwrap();
    f.sink.take();
    // Editor signals plus the request signal.
    let sources = 7;
    assert!(f.runtime.node_count() > sources);

    f.overlay.dispose();
    assert!(f.overlay.is_disposed());
    assert_eq!(f.runtime.node_count(), sources);

    f.runtime.set(&f.input, None).unwrap();
    f.editor
        .set_scroll(ScrollPosition::new(3.0, 3.0))
        .unwrap();
    assert_eq!(f.runtime.flush_effects().unwrap(), 0);
    assert!(f.sink.take().is_empty());

    assert!(!f.overlay.is_visible());
    assert_eq!(f.overlay.ghost_text(), None);
    assert_eq!(f.overlay.layout_geometry(), None);
    assert_eq!(f.overlay.min_content_width(), None);

    // Second dispose is a no-op.
    f.overlay.dispose();
}

#[test]
fn test_dropping_the_overlay_releases_its_nodes() {
    let f = fixture(FIVE_LINES, Some(InsertionRequest::new(5, 4, "def")));
    f.runtime.flush_effects().unwrap();
    let Fixture {
        runtime, overlay, ..
    } = f;
    drop(overlay);
    assert_eq!(runtime.node_count(), 7);
}

/// Re-lays out the editor when told how wide the overlay wants to be.
struct RelayoutSink {
    editor: EditorSignals,
    widths: Rc<RefCell<Vec<f64>>>,
}

impl OverlaySink for RelayoutSink {
    fn set_visible(&mut self, _visible: bool) {}

    fn set_min_content_width(&mut self, width: f64) {
        self.widths.borrow_mut().push(width);
        self.editor
            .set_layout_info(EditorLayoutInfo::new(40.0, 800.0, 600.0))
            .unwrap();
    }

    fn set_overlay_path(&mut self, _path: Option<&OverlayPath>) {}

    fn set_ghost_text(&mut self, _: Option<&GhostText>, _: &GhostTextViewOptions) {}
}

#[test]
fn test_sink_relayout_keeps_later_updates_flowing() {
    let runtime = Runtime::new();
    let editor = EditorSignals::new(
        &runtime,
        EditorLayoutInfo::new(30.0, 800.0, 600.0),
        Rc::new(UniformLineHeights::new(LINE_HEIGHT)),
    );
    editor
        .attach_model(Rc::new(TextDocument::new(FIVE_LINES)))
        .unwrap();
    let input = runtime.signal(Some(InsertionRequest::new(5, 4, "def")));
    let widths = Rc::new(RefCell::new(Vec::new()));
    let overlay = InsertionOverlay::new(
        &runtime,
        &editor,
        input,
        OverlayServices::new(Rc::new(NoTokenizer), Rc::new(MonospaceRenderer::new(CELL_PX))),
        OverlayConfig::default(),
        Box::new(RelayoutSink {
            editor: editor.clone(),
            widths: Rc::clone(&widths),
        }),
    );
    runtime.flush_effects().unwrap();
    // The relayout written from inside the sink is picked up.
    assert_eq!(overlay.layout_geometry().unwrap().top_inner.x, 40.0);

    for scroll_left in [10.0, 20.0] {
        editor
            .set_scroll(ScrollPosition::new(scroll_left, 0.0))
            .unwrap();
        runtime.flush_effects().unwrap();
    }

    let full = 6.0 * CELL_PX;
    assert_eq!(*widths.borrow(), vec![full, full - 10.0, full - 20.0]);
    assert_eq!(overlay.min_content_width(), Some(full - 20.0));
}
