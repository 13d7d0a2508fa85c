//! Ghost text model handed to the ghost-text rendering widget.
//!
//! Ghost text is non-committed text drawn at a document position with a distinguishing style.
//! The overlay describes *what* to draw; the host widget draws it.

use crate::insertion::NormalizedInsertion;

/// A run of ghost text anchored at a column of [`GhostText::line_number`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GhostTextPart {
    /// Anchor column (1-based).
    pub column: usize,
    /// Text to render; may contain newlines.
    pub text: String,
    /// Whether the part is rendered inline between existing characters (as opposed to
    /// flowing from the anchor to the following rows).
    pub is_inline: bool,
}

impl GhostTextPart {
    /// Create a part.
    pub fn new(column: usize, text: impl Into<String>, is_inline: bool) -> Self {
        Self {
            column,
            text: text.into(),
            is_inline,
        }
    }

    /// Lines of the part's text.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n')
    }
}

/// Ghost text for one document line, as an ordered list of parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GhostText {
    /// Anchor line (1-based).
    pub line_number: usize,
    /// Parts ordered by column.
    pub parts: Vec<GhostTextPart>,
}

impl GhostText {
    /// Create ghost text.
    pub fn new(line_number: usize, parts: Vec<GhostTextPart>) -> Self {
        Self { line_number, parts }
    }

    /// The single-part ghost text previewing `insertion`.
    pub fn from_insertion(insertion: &NormalizedInsertion) -> Self {
        Self::new(
            insertion.line_number,
            vec![GhostTextPart::new(
                insertion.column,
                insertion.text.clone(),
                false,
            )],
        )
    }

    /// Whether there is nothing to render.
    pub fn is_empty(&self) -> bool {
        self.parts.iter().all(|part| part.text.is_empty())
    }

    /// Number of additional rows the ghost text introduces below its anchor line.
    pub fn additional_line_count(&self) -> usize {
        self.parts
            .iter()
            .map(|part| part.text.matches('\n').count())
            .sum()
    }
}

/// Rendering options for the ghost-text widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GhostTextViewOptions {
    /// Render ghost text with the document's syntax highlighting.
    pub syntax_highlighting_enabled: bool,
    /// Extra style classes identifying the origin of the ghost text.
    pub extra_classes: Vec<String>,
    /// Rows the widget always reserves, even for shorter ghost text.
    pub min_reserved_line_count: usize,
}

impl GhostTextViewOptions {
    /// Options used for inline-edit insertion previews.
    pub fn inline_edit() -> Self {
        Self {
            syntax_highlighting_enabled: true,
            extra_classes: vec!["inline-edit".to_string()],
            min_reserved_line_count: 0,
        }
    }
}

impl Default for GhostTextViewOptions {
    fn default() -> Self {
        Self::inline_edit()
    }
}
