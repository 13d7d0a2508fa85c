//! The insertion preview overlay: the full derivation pipeline wired as reactive nodes.
//!
//! ```text
//! input ──┐
//! model ──┼─> state ──┬─> ghost_text ──────────────┐
//! version ┘           ├─> visible                  │
//!                     └─> max_width ──┐            │
//! layout, scroll, line coordinates ───┴─> layout_geometry ─┬─> overlay_path
//!                                                          └─> min_content_width
//! ```
//!
//! Effects push `visible`, `min_content_width`, the outline and the ghost text to an
//! [`OverlaySink`] on [`Runtime::flush_effects`], and only when the pushed value changed.

use crate::config::OverlayConfig;
use crate::editor::EditorSignals;
use crate::geometry::{LayoutGeometry, ScrollPosition, compute_layout_geometry, min_content_width};
use crate::ghost_text::{GhostText, GhostTextViewOptions};
use crate::insertion::{InsertionRequest, NormalizedInsertion, normalize_insertion};
use crate::measure::{LineRenderer, max_content_width};
use crate::path::OverlayPath;
use crate::reactive::{DisposableStore, Effect, Memo, ReactiveError, Reader, Runtime, Signal};
use crate::tokens::Tokenizer;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Host-side receiver of the overlay's render state.
pub trait OverlaySink {
    /// Show or hide the overlay container.
    fn set_visible(&mut self, visible: bool);

    /// Minimum width the hosting container must reserve.
    fn set_min_content_width(&mut self, width: f64);

    /// Outline to draw, or `None` to draw nothing.
    fn set_overlay_path(&mut self, path: Option<&OverlayPath>);

    /// Ghost text to render, or `None` to clear it.
    fn set_ghost_text(&mut self, ghost_text: Option<&GhostText>, options: &GhostTextViewOptions);
}

/// Rendering services used by width measurement.
#[derive(Clone)]
pub struct OverlayServices {
    /// Syntax tokenizer for hypothetical lines.
    pub tokenizer: Rc<dyn Tokenizer>,
    /// Off-screen line renderer.
    pub renderer: Rc<dyn LineRenderer>,
}

impl OverlayServices {
    /// Bundle a tokenizer and a renderer.
    pub fn new(tokenizer: Rc<dyn Tokenizer>, renderer: Rc<dyn LineRenderer>) -> Self {
        Self {
            tokenizer,
            renderer,
        }
    }
}

impl fmt::Debug for OverlayServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayServices").finish_non_exhaustive()
    }
}

type SharedSink = Rc<RefCell<Box<dyn OverlaySink>>>;

/// Previews a pending insertion as ghost text plus a highlighted box.
///
/// The overlay owns its nodes; dropping it (or calling [`dispose`](Self::dispose)) releases all
/// of them and silences the sink.
pub struct InsertionOverlay {
    runtime: Runtime,
    store: DisposableStore,
    alive: Rc<Cell<bool>>,
    options: GhostTextViewOptions,
    state: Memo<Option<NormalizedInsertion>>,
    ghost_text: Memo<Option<GhostText>>,
    visible: Memo<bool>,
    max_width: Memo<f64>,
    layout_geometry: Memo<Option<LayoutGeometry>>,
    overlay_path: Memo<Option<OverlayPath>>,
    min_content_width: Memo<f64>,
}

impl InsertionOverlay {
    /// Build the pipeline over `editor` and `input`. Nothing is computed until the first read
    /// or [`Runtime::flush_effects`].
    pub fn new(
        runtime: &Runtime,
        editor: &EditorSignals,
        input: Signal<Option<InsertionRequest>>,
        services: OverlayServices,
        config: OverlayConfig,
        sink: Box<dyn OverlaySink>,
    ) -> Self {
        let mut store = DisposableStore::new(runtime);
        let alive = Rc::new(Cell::new(true));
        let sink: SharedSink = Rc::new(RefCell::new(sink));
        let options = GhostTextViewOptions::inline_edit();

        let model = editor.model;
        let version_id = editor.version_id;
        let state = store.add(runtime.memo(move |r| {
            let request = r.read(&input)?;
            let Some(text_model) = r.read(&model)? else {
                return Ok(None);
            };
            // Re-run normalization when the attached model is edited.
            r.read(&version_id)?;
            Ok(normalize_insertion(request.as_ref(), &*text_model))
        }));

        let ghost_text = store.add(runtime.memo(move |r| {
            Ok(r.read(&state)?.as_ref().map(GhostText::from_insertion))
        }));

        let visible = store.add(runtime.memo(move |r| Ok(r.read(&state)?.is_some())));

        let measurement_padding = config.measurement_padding_px;
        let max_width = store.add(runtime.memo(move |r| {
            let insertion = r.read(&state)?;
            let Some(text_model) = r.read(&model)? else {
                return Ok(0.0);
            };
            // An edit can leave the insertion unchanged but change the text around it.
            r.read(&version_id)?;
            Ok(max_content_width(
                insertion.as_ref(),
                &*text_model,
                &*services.tokenizer,
                &*services.renderer,
                measurement_padding,
            ))
        }));

        let layout_info = editor.layout_info;
        let scroll_left = editor.scroll_left;
        let scroll_top = editor.scroll_top;
        let line_coordinates = editor.line_coordinates;
        let geometry_config = config.clone();
        let layout_geometry = store.add(runtime.memo(move |r| {
            // The ghost text shifts the rows below the insertion; track it so that the box
            // follows once the widget re-lays out.
            r.read(&ghost_text)?;
            let Some(insertion) = r.read(&state)? else {
                return Ok(None);
            };
            let max_width = r.read(&max_width)?;
            let layout = r.read(&layout_info)?;
            let scroll = ScrollPosition::new(r.read(&scroll_left)?, r.read(&scroll_top)?);
            let coordinates = r.read(&line_coordinates)?;
            Ok(compute_layout_geometry(
                &insertion,
                max_width,
                &layout,
                scroll,
                &*coordinates,
                &geometry_config,
            ))
        }));

        let style = config.style;
        let overlay_path = store.add(runtime.memo(move |r| {
            Ok(r
                .read(&layout_geometry)?
                .map(|geometry| OverlayPath::from_geometry(&geometry, &style)))
        }));

        let min_width = store.add(runtime.memo(move |r| {
            Ok(min_content_width(r.read(&layout_geometry)?.as_ref()))
        }));

        store.add(sink_effect(runtime, &alive, &sink, move |r, sink| {
            sink.set_visible(r.read(&visible)?);
            Ok(())
        }));
        store.add(sink_effect(runtime, &alive, &sink, move |r, sink| {
            sink.set_min_content_width(r.read(&min_width)?);
            Ok(())
        }));
        store.add(sink_effect(runtime, &alive, &sink, move |r, sink| {
            sink.set_overlay_path(r.read(&overlay_path)?.as_ref());
            Ok(())
        }));
        let effect_options = options.clone();
        store.add(sink_effect(runtime, &alive, &sink, move |r, sink| {
            sink.set_ghost_text(r.read(&ghost_text)?.as_ref(), &effect_options);
            Ok(())
        }));

        tracing::debug!(nodes = store.len(), "insertion_overlay_created");

        Self {
            runtime: runtime.clone(),
            store,
            alive,
            options,
            state,
            ghost_text,
            visible,
            max_width,
            layout_geometry,
            overlay_path,
            min_content_width: min_width,
        }
    }

    /// The normalized insertion being previewed.
    pub fn state(&self) -> Option<NormalizedInsertion> {
        self.read(&self.state).flatten()
    }

    /// Ghost text for the insertion.
    pub fn ghost_text(&self) -> Option<GhostText> {
        self.read(&self.ghost_text).flatten()
    }

    /// Options the ghost text is rendered with.
    pub fn ghost_text_options(&self) -> &GhostTextViewOptions {
        &self.options
    }

    /// Whether an insertion is being previewed. Independent of whether the box fits on screen.
    pub fn is_visible(&self) -> bool {
        self.read(&self.visible).unwrap_or(false)
    }

    /// Widest resulting line in pixels.
    pub fn max_width(&self) -> Option<f64> {
        self.read(&self.max_width)
    }

    /// Current box geometry.
    pub fn layout_geometry(&self) -> Option<LayoutGeometry> {
        self.read(&self.layout_geometry).flatten()
    }

    /// Current outline.
    pub fn overlay_path(&self) -> Option<OverlayPath> {
        self.read(&self.overlay_path).flatten()
    }

    /// Width hint for the hosting container.
    pub fn min_content_width(&self) -> Option<f64> {
        self.read(&self.min_content_width)
    }

    /// The preview never reacts to the pointer.
    pub fn is_hovered(&self) -> bool {
        false
    }

    /// Whether [`dispose`](Self::dispose) already ran.
    pub fn is_disposed(&self) -> bool {
        !self.alive.get()
    }

    /// Release every node and effect of the overlay. Calling it again is a no-op.
    pub fn dispose(&mut self) {
        if !self.alive.replace(false) {
            return;
        }
        let nodes = self.store.len();
        if let Err(err) = self.store.dispose() {
            tracing::debug!(%err, "insertion_overlay_dispose_failed");
        }
        tracing::debug!(nodes, "insertion_overlay_disposed");
    }

    fn read<T: Clone + 'static>(&self, memo: &Memo<T>) -> Option<T> {
        if !self.alive.get() {
            return None;
        }
        match self.runtime.get(memo) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::debug!(%err, "insertion_overlay_read_failed");
                None
            }
        }
    }
}

impl Drop for InsertionOverlay {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for InsertionOverlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InsertionOverlay")
            .field("alive", &self.alive.get())
            .field("nodes", &self.store.len())
            .finish_non_exhaustive()
    }
}

/// An effect that forwards to the sink while the overlay is alive.
fn sink_effect<F>(
    runtime: &Runtime,
    alive: &Rc<Cell<bool>>,
    sink: &SharedSink,
    mut push: F,
) -> Effect
where
    F: FnMut(&mut Reader<'_>, &mut dyn OverlaySink) -> Result<(), ReactiveError> + 'static,
{
    let alive = Rc::clone(alive);
    let sink = Rc::clone(sink);
    runtime.effect(move |r| {
        if !alive.get() {
            return Ok(());
        }
        let mut sink = sink.try_borrow_mut().map_err(|_| ReactiveError::Busy)?;
        push(r, &mut **sink)
    })
}
