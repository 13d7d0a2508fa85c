//! Width measurement of the text an insertion would produce.
//!
//! The overlay box must reach as far right as the widest line of the *resulting* text: the
//! target line's prefix, the inserted text and the target line's suffix, spliced together and
//! split into lines. Each resulting line is tokenized (so that style-dependent glyph widths are
//! respected) and rendered off-screen through a [`LineRenderer`].
//!
//! Renderers report a line's natural width including their own horizontal padding. The
//! measurement padding subtracted from every sample corrects for it; it is an empirically tuned
//! value, not an exact pixel contract.

use crate::insertion::NormalizedInsertion;
use crate::layout::{DEFAULT_TAB_WIDTH, cell_width_at};
use crate::line_ending::normalize_to_lf;
use crate::model::{TextModel, TextRange};
use crate::text::split_lines_preserve_trailing;
use crate::tokens::{LineTokens, StyleId, Tokenizer};

/// Default correction subtracted from each rendered line width, in pixels.
pub const DEFAULT_MEASUREMENT_PADDING_PX: f64 = 20.0;

/// Off-screen line rendering.
pub trait LineRenderer {
    /// Natural width of the rendered line in pixels, including renderer padding.
    fn render_width(&self, tokens: &LineTokens) -> f64;
}

/// Renders lines in a fixed-advance font.
///
/// Every cell is `cell_width_px` wide (wide characters take two cells, tabs advance to the next
/// stop). Styles can scale the advance, e.g. for a bold face that is slightly wider.
#[derive(Debug, Clone, PartialEq)]
pub struct MonospaceRenderer {
    cell_width_px: f64,
    tab_width: usize,
    line_padding_px: f64,
    style_scales: Vec<(StyleId, f64)>,
}

impl MonospaceRenderer {
    /// A renderer with `cell_width_px` per cell, default tab width and a line padding equal to
    /// [`DEFAULT_MEASUREMENT_PADDING_PX`].
    pub fn new(cell_width_px: f64) -> Self {
        Self {
            cell_width_px,
            tab_width: DEFAULT_TAB_WIDTH,
            line_padding_px: DEFAULT_MEASUREMENT_PADDING_PX,
            style_scales: Vec::new(),
        }
    }

    /// Set the tab width in cells.
    pub fn with_tab_width(mut self, tab_width: usize) -> Self {
        self.tab_width = tab_width.max(1);
        self
    }

    /// Set the horizontal padding added to every rendered line.
    pub fn with_line_padding(mut self, line_padding_px: f64) -> Self {
        self.line_padding_px = line_padding_px;
        self
    }

    /// Scale the advance of runs with `style_id`.
    pub fn with_style_scale(mut self, style_id: StyleId, scale: f64) -> Self {
        self.style_scales.retain(|(id, _)| *id != style_id);
        self.style_scales.push((style_id, scale));
        self
    }

    /// Pixels per cell.
    pub fn cell_width_px(&self) -> f64 {
        self.cell_width_px
    }

    fn scale_for(&self, style_id: StyleId) -> f64 {
        self.style_scales
            .iter()
            .find(|(id, _)| *id == style_id)
            .map(|(_, scale)| *scale)
            .unwrap_or(1.0)
    }
}

impl LineRenderer for MonospaceRenderer {
    fn render_width(&self, tokens: &LineTokens) -> f64 {
        let mut x_cells = 0usize;
        let mut width = 0.0;
        for (run, style_id) in tokens.runs() {
            let scale = self.scale_for(style_id);
            for ch in run.chars() {
                let cells = cell_width_at(ch, x_cells, self.tab_width);
                x_cells += cells;
                width += cells as f64 * self.cell_width_px * scale;
            }
        }
        width + self.line_padding_px
    }
}

/// The lines of text that inserting `insertion` into its target line would produce.
pub fn resulting_lines(insertion: &NormalizedInsertion, model: &dyn TextModel) -> Vec<String> {
    let clean_text = normalize_to_lf(&insertion.text);
    let line = insertion.line_number;

    let text_before = if clean_text.starts_with('\n') {
        String::new()
    } else {
        model.value_in_range(TextRange::on_line(line, 1, insertion.column))
    };
    let text_after = model.value_in_range(TextRange::on_line(
        line,
        insertion.column,
        model.line_length(line) + 1,
    ));

    let text = format!("{text_before}{clean_text}{text_after}");
    split_lines_preserve_trailing(&text)
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Maximum rendered width, in pixels, over the lines produced by `insertion`.
///
/// Returns `0.0` when there is no insertion. Lines the tokenizer cannot handle are measured as
/// plain text.
pub fn max_content_width(
    insertion: Option<&NormalizedInsertion>,
    model: &dyn TextModel,
    tokenizer: &dyn Tokenizer,
    renderer: &dyn LineRenderer,
    measurement_padding_px: f64,
) -> f64 {
    let Some(insertion) = insertion else {
        return 0.0;
    };

    resulting_lines(insertion, model)
        .into_iter()
        .map(|line| {
            let tokens = match tokenizer.tokenize_line_at(insertion.line_number, &line) {
                Some(tokens) => tokens,
                None => {
                    tracing::trace!(
                        line_number = insertion.line_number,
                        "tokenization_unavailable_plain_fallback"
                    );
                    LineTokens::plain(line)
                }
            };
            renderer.render_width(&tokens) - measurement_padding_px
        })
        .fold(f64::NEG_INFINITY, f64::max)
}
