//! Insertion requests and their canonical form.
//!
//! A suggestion that inserts whole lines *before* line `n` (column 1, text ending with a
//! newline) is ambiguous: the same edit can be expressed as appending a newline plus the text
//! at the end of line `n - 1`. The preview anchors such edits to the end of the previous line
//! so that the overlay reads as a trailing addition rather than a detached empty-looking line.

use crate::model::TextModel;

/// A proposed insertion, as supplied by the suggestion provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertionRequest {
    /// Target line (1-based).
    pub line_number: usize,
    /// Column before which `text` is inserted (1-based).
    pub start_column: usize,
    /// Inserted text, possibly spanning several lines.
    pub text: String,
}

impl InsertionRequest {
    /// Create a request.
    pub fn new(line_number: usize, start_column: usize, text: impl Into<String>) -> Self {
        Self {
            line_number,
            start_column,
            text: text.into(),
        }
    }
}

/// An insertion in canonical form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedInsertion {
    /// Target line (1-based).
    pub line_number: usize,
    /// Column before which `text` is inserted (1-based).
    pub column: usize,
    /// Inserted text.
    pub text: String,
}

impl NormalizedInsertion {
    /// Whether the inserted content begins on the row after `line_number`.
    pub fn starts_with_newline(&self) -> bool {
        self.text.starts_with('\n')
    }
}

impl From<NormalizedInsertion> for InsertionRequest {
    fn from(insertion: NormalizedInsertion) -> Self {
        Self {
            line_number: insertion.line_number,
            start_column: insertion.column,
            text: insertion.text,
        }
    }
}

/// Bring `request` into canonical form.
///
/// A request is re-anchored to the end of the previous line when all of the following hold:
/// it starts at column 1 of a line other than the first, the target line and the previous line
/// are both non-empty, and its text ends with `'\n'` without starting with one. The rewritten
/// text starts with `'\n'`, so normalizing twice is the same as normalizing once.
pub fn normalize_insertion(
    request: Option<&InsertionRequest>,
    model: &dyn TextModel,
) -> Option<NormalizedInsertion> {
    let request = request?;

    let reanchor = request.start_column == 1
        && request.line_number > 1
        && model.line_length(request.line_number) != 0
        && model.line_length(request.line_number - 1) != 0
        && request.text.ends_with('\n')
        && !request.text.starts_with('\n');

    if reanchor {
        let previous_line = request.line_number - 1;
        let body = &request.text[..request.text.len() - 1];
        return Some(NormalizedInsertion {
            line_number: previous_line,
            column: model.line_length(previous_line) + 1,
            text: format!("\n{body}"),
        });
    }

    Some(NormalizedInsertion {
        line_number: request.line_number,
        column: request.start_column,
        text: request.text.clone(),
    })
}
