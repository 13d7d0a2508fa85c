//! Live editor inputs exposed as source signals.

use crate::geometry::{EditorLayoutInfo, ScrollPosition};
use crate::layout::LineCoordinates;
use crate::model::TextModel;
use crate::reactive::{ReactiveError, Runtime, Shared, Signal};
use std::rc::Rc;

/// The editor state an overlay observes.
///
/// The host owns this bundle and writes to it from its event handlers (model attached, content
/// edited, scrolled, resized). Any number of writes may happen between two frames; the overlay
/// observes them together on the next [`Runtime::flush_effects`].
#[derive(Debug, Clone)]
pub struct EditorSignals {
    runtime: Runtime,
    /// Attached text model, if any.
    pub model: Signal<Option<Shared<dyn TextModel>>>,
    /// Version of the attached model's content.
    pub version_id: Signal<u64>,
    /// Horizontal layout of the editor.
    pub layout_info: Signal<EditorLayoutInfo>,
    /// Horizontal scroll offset.
    pub scroll_left: Signal<f64>,
    /// Vertical scroll offset.
    pub scroll_top: Signal<f64>,
    /// Vertical positions of lines.
    pub line_coordinates: Signal<Shared<dyn LineCoordinates>>,
}

impl EditorSignals {
    /// Create the signals with no model attached and no scrolling.
    pub fn new(
        runtime: &Runtime,
        layout_info: EditorLayoutInfo,
        line_coordinates: Rc<dyn LineCoordinates>,
    ) -> Self {
        Self {
            runtime: runtime.clone(),
            model: runtime.signal(None),
            version_id: runtime.signal(0),
            layout_info: runtime.signal(layout_info),
            scroll_left: runtime.signal(0.0),
            scroll_top: runtime.signal(0.0),
            line_coordinates: runtime.signal(Shared::new(line_coordinates)),
        }
    }

    /// The runtime the signals live in.
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Attach `model`, replacing any previously attached one.
    pub fn attach_model(&self, model: Rc<dyn TextModel>) -> Result<(), ReactiveError> {
        let version_id = model.version_id();
        self.runtime.set(&self.model, Some(Shared::new(model)))?;
        self.runtime.set(&self.version_id, version_id)?;
        Ok(())
    }

    /// Detach the current model.
    pub fn detach_model(&self) -> Result<(), ReactiveError> {
        self.runtime.set(&self.model, None)?;
        Ok(())
    }

    /// Notify that the attached model's content changed.
    ///
    /// Model edits are not observed until this runs. With a [`TextDocument`](crate::TextDocument)
    /// it can be forwarded from [`TextDocument::subscribe`](crate::TextDocument::subscribe).
    pub fn content_changed(&self) -> Result<(), ReactiveError> {
        let model = self.runtime.get(&self.model)?;
        if let Some(model) = model {
            self.runtime.set(&self.version_id, model.version_id())?;
        }
        Ok(())
    }

    /// Current scroll position.
    pub fn scroll(&self) -> Result<ScrollPosition, ReactiveError> {
        Ok(ScrollPosition::new(
            self.runtime.get(&self.scroll_left)?,
            self.runtime.get(&self.scroll_top)?,
        ))
    }

    /// Update both scroll offsets.
    pub fn set_scroll(&self, scroll: ScrollPosition) -> Result<(), ReactiveError> {
        self.runtime.set(&self.scroll_left, scroll.scroll_left)?;
        self.runtime.set(&self.scroll_top, scroll.scroll_top)?;
        Ok(())
    }

    /// Update the horizontal layout.
    pub fn set_layout_info(&self, layout_info: EditorLayoutInfo) -> Result<(), ReactiveError> {
        self.runtime.set(&self.layout_info, layout_info)?;
        Ok(())
    }

    /// Replace the line-coordinate provider (e.g. after a font or wrapping change).
    pub fn set_line_coordinates(
        &self,
        line_coordinates: Rc<dyn LineCoordinates>,
    ) -> Result<(), ReactiveError> {
        self.runtime
            .set(&self.line_coordinates, Shared::new(line_coordinates))?;
        Ok(())
    }
}
