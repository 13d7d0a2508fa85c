//! Text model access.
//!
//! The overlay only ever *reads* the document. [`TextModel`] is the narrow query surface it
//! needs; [`TextDocument`] is a rope-backed implementation for hosts without their own buffer
//! (and for tests).
//!
//! All positions are 1-based: line 1 is the first line, column 1 is before the first character.
//! Columns count Unicode scalar values (`char`).

use crate::line_ending::normalize_to_lf;
use ropey::Rope;
use std::cell::{Cell, RefCell};
use std::fmt;

/// A range of text between two 1-based positions (end exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRange {
    /// Start line (1-based).
    pub start_line: usize,
    /// Start column (1-based).
    pub start_column: usize,
    /// End line (1-based).
    pub end_line: usize,
    /// End column (1-based, exclusive).
    pub end_column: usize,
}

impl TextRange {
    /// Create a range.
    pub fn new(start_line: usize, start_column: usize, end_line: usize, end_column: usize) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// A range within a single line.
    pub fn on_line(line: usize, start_column: usize, end_column: usize) -> Self {
        Self::new(line, start_column, line, end_column)
    }
}

/// Read-only document queries used by the overlay pipeline.
pub trait TextModel {
    /// Number of lines (N newlines => N+1 lines).
    fn line_count(&self) -> usize;

    /// Length of a line in chars, excluding the newline. `0` for lines outside the document.
    fn line_length(&self, line_number: usize) -> usize;

    /// Text between two positions. Positions are clamped to the document.
    fn value_in_range(&self, range: TextRange) -> String;

    /// Edit-version counter; increases on every mutation.
    fn version_id(&self) -> u64;

    /// Content of a whole line, without the newline.
    fn line_content(&self, line_number: usize) -> String {
        self.value_in_range(TextRange::on_line(
            line_number,
            1,
            self.line_length(line_number) + 1,
        ))
    }
}

/// Callback invoked with the new version after each edit of a [`TextDocument`].
pub type VersionCallback = Box<dyn FnMut(u64)>;

/// Rope-backed [`TextModel`] with interior mutability, so that a host can keep editing a
/// document that the overlay holds through an `Rc`.
///
/// Editing bumps [`version_id`](TextModel::version_id), but the overlay only observes the new
/// version once [`EditorSignals::content_changed`](crate::EditorSignals::content_changed) runs.
/// Hosts either call it after their edits or forward it from [`subscribe`](Self::subscribe):
///
/// ```rust
/// use insertion_preview::{EditorLayoutInfo, EditorSignals, Runtime, TextDocument, UniformLineHeights};
/// use std::rc::Rc;
///
/// let runtime = Runtime::new();
/// let editor = EditorSignals::new(
///     &runtime,
///     EditorLayoutInfo::default(),
///     Rc::new(UniformLineHeights::new(18.0)),
/// );
/// let doc = Rc::new(TextDocument::new("abc"));
/// editor.attach_model(doc.clone()).unwrap();
///
/// let notify = editor.clone();
/// doc.subscribe(move |_version| {
///     let _ = notify.content_changed();
/// });
/// doc.insert(1, 4, "def");
/// assert_eq!(runtime.get(&editor.version_id).unwrap(), doc.version());
/// ```
#[derive(Default)]
pub struct TextDocument {
    rope: RefCell<Rope>,
    version: Cell<u64>,
    callbacks: RefCell<Vec<VersionCallback>>,
}

impl fmt::Debug for TextDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextDocument")
            .field("len_chars", &self.rope.borrow().len_chars())
            .field("version", &self.version.get())
            .finish_non_exhaustive()
    }
}

impl TextDocument {
    /// Create a document. CRLF and CR line endings are normalized to LF.
    pub fn new(text: &str) -> Self {
        Self {
            rope: RefCell::new(Rope::from_str(&normalize_to_lf(text))),
            version: Cell::new(1),
            callbacks: RefCell::new(Vec::new()),
        }
    }

    /// Whole document text (LF newlines).
    pub fn text(&self) -> String {
        self.rope.borrow().to_string()
    }

    /// Current edit version (same as [`TextModel::version_id`]).
    pub fn version(&self) -> u64 {
        self.version.get()
    }

    /// Call `callback` with the new version after every edit.
    pub fn subscribe<F>(&self, callback: F)
    where
        F: FnMut(u64) + 'static,
    {
        self.callbacks.borrow_mut().push(Box::new(callback));
    }

    /// Replace the whole content. Notifies subscribers.
    pub fn set_value(&self, text: &str) {
        *self.rope.borrow_mut() = Rope::from_str(&normalize_to_lf(text));
        self.bump_version();
    }

    /// Insert `text` before the given 1-based position. Notifies subscribers.
    pub fn insert(&self, line_number: usize, column: usize, text: &str) {
        let offset = self.char_offset(line_number, column);
        self.rope
            .borrow_mut()
            .insert(offset, &normalize_to_lf(text));
        self.bump_version();
    }

    /// Delete the text covered by `range`. Notifies subscribers unless the range is empty.
    pub fn delete(&self, range: TextRange) {
        let (start, end) = self.char_span(range);
        if start < end {
            self.rope.borrow_mut().remove(start..end);
            self.bump_version();
        }
    }

    fn bump_version(&self) {
        let version = self.version.get() + 1;
        self.version.set(version);

        // A subscriber editing the document again does not re-notify.
        let Ok(mut callbacks) = self.callbacks.try_borrow_mut() else {
            tracing::debug!(version, "text_document_nested_edit_not_notified");
            return;
        };
        for callback in callbacks.iter_mut() {
            callback(version);
        }
    }

    /// Char offset of a 1-based position, clamped to the document.
    fn char_offset(&self, line_number: usize, column: usize) -> usize {
        let rope = self.rope.borrow();
        let line_count = rope.len_lines();
        if line_number == 0 {
            return 0;
        }
        if line_number > line_count {
            return rope.len_chars();
        }
        let line_start = rope.line_to_char(line_number - 1);
        let column = column.max(1) - 1;
        line_start + column.min(line_len_chars(&rope, line_number - 1))
    }

    fn char_span(&self, range: TextRange) -> (usize, usize) {
        let start = self.char_offset(range.start_line, range.start_column);
        let end = self.char_offset(range.end_line, range.end_column);
        (start, end.max(start))
    }
}

fn line_len_chars(rope: &Rope, line_index: usize) -> usize {
    let line = rope.line(line_index);
    let len = line.len_chars();
    if len > 0 && line.char(len - 1) == '\n' {
        len - 1
    } else {
        len
    }
}

impl TextModel for TextDocument {
    fn line_count(&self) -> usize {
        self.rope.borrow().len_lines()
    }

    fn line_length(&self, line_number: usize) -> usize {
        let rope = self.rope.borrow();
        if line_number == 0 || line_number > rope.len_lines() {
            return 0;
        }
        line_len_chars(&rope, line_number - 1)
    }

    fn value_in_range(&self, range: TextRange) -> String {
        let (start, end) = self.char_span(range);
        self.rope.borrow().slice(start..end).to_string()
    }

    fn version_id(&self) -> u64 {
        self.version.get()
    }
}
