//! Cell widths, soft wrapping and vertical line coordinates.
//!
//! Character widths follow UAX #11 (via `unicode-width`), with tabs advancing to the next tab
//! stop. The same cell arithmetic drives both the monospace renderer used for width
//! measurement and the soft-wrap computation behind [`WrappedLineHeights`].

use crate::model::TextModel;
use unicode_width::UnicodeWidthChar;

/// Default tab width (in cells) used when a caller does not specify a tab width.
pub const DEFAULT_TAB_WIDTH: usize = 4;

/// Calculate visual width of a character (based on UAX #11)
///
/// Return value:
/// - 1: Narrow character (ASCII, etc.)
/// - 2: Wide character (CJK, fullwidth, etc.)
/// - 0: Zero-width character (combining characters, etc.)
pub fn char_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(1)
}

/// Visual width (in cells) of `ch` when it starts at `cell_offset_in_line`.
///
/// `'\t'` advances to the next multiple of `tab_width`.
pub fn cell_width_at(ch: char, cell_offset_in_line: usize, tab_width: usize) -> usize {
    if ch == '\t' {
        let tab_width = tab_width.max(1);
        let rem = cell_offset_in_line % tab_width;
        tab_width - rem
    } else {
        char_width(ch)
    }
}

/// Calculate total visual width of a string, interpreting `'\t'` using `tab_width`.
pub fn str_width_with_tab_width(s: &str, tab_width: usize) -> usize {
    let mut x = 0usize;
    for ch in s.chars() {
        x = x.saturating_add(cell_width_at(ch, x, tab_width));
    }
    x
}

/// Soft wrapping mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    /// No soft wrapping (each logical line is a single visual line).
    #[default]
    None,
    /// Wrap at character boundaries.
    Char,
    /// Prefer wrapping at word boundaries (whitespace), falling back to character wrap.
    Word,
}

/// Number of visual rows `text` occupies in a viewport `viewport_width` cells wide.
pub fn visual_row_count(
    text: &str,
    viewport_width: usize,
    tab_width: usize,
    wrap_mode: WrapMode,
) -> usize {
    if viewport_width == 0 {
        return 1;
    }
    let wraps = match wrap_mode {
        WrapMode::None => 0,
        WrapMode::Char => count_char_wraps(text, viewport_width, tab_width),
        WrapMode::Word => count_word_wraps(text, viewport_width, tab_width),
    };
    wraps + 1
}

fn count_char_wraps(text: &str, viewport_width: usize, tab_width: usize) -> usize {
    let mut wraps = 0usize;
    let mut x_in_segment = 0usize;
    let mut x_in_line = 0usize;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        let ch_width = cell_width_at(ch, x_in_line, tab_width);

        // Double-width characters cannot be split.
        if x_in_segment + ch_width > viewport_width {
            wraps += 1;
            x_in_segment = 0;
        }

        x_in_segment = x_in_segment.saturating_add(ch_width);
        x_in_line = x_in_line.saturating_add(ch_width);

        if x_in_segment == viewport_width && chars.peek().is_some() {
            wraps += 1;
            x_in_segment = 0;
        }
    }

    wraps
}

fn count_word_wraps(text: &str, viewport_width: usize, tab_width: usize) -> usize {
    let mut wraps = 0usize;
    let mut segment_start_char = 0usize;
    let mut segment_start_x = 0usize;
    // (char_index, x_in_line) just after the last whitespace.
    let mut last_break: Option<(usize, usize)> = None;
    let mut x_in_line = 0usize;

    for (char_index, ch) in text.chars().enumerate() {
        let ch_width = cell_width_at(ch, x_in_line, tab_width);

        loop {
            let x_in_segment = x_in_line.saturating_sub(segment_start_x);
            if x_in_segment.saturating_add(ch_width) <= viewport_width {
                break;
            }

            if let Some((break_char, break_x)) = last_break
                && break_char > segment_start_char
            {
                wraps += 1;
                segment_start_char = break_char;
                segment_start_x = break_x;
                last_break = None;
                continue;
            }

            wraps += 1;
            segment_start_char = char_index;
            segment_start_x = x_in_line;
            last_break = None;
            break;
        }

        x_in_line = x_in_line.saturating_add(ch_width);

        if ch.is_whitespace() {
            last_break = Some((char_index + 1, x_in_line));
        }
    }

    wraps
}

/// Vertical pixel coordinates of lines, in content space (before vertical scrolling).
pub trait LineCoordinates {
    /// Top edge of the first visual row of `line_number` (1-based).
    fn top_for_line_number(&self, line_number: usize) -> f64;

    /// Bottom edge of the last visual row of `line_number` (1-based).
    fn bottom_for_line_number(&self, line_number: usize) -> f64;
}

/// Every line is exactly one row of `line_height` pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformLineHeights {
    line_height: f64,
    padding_top: f64,
}

impl UniformLineHeights {
    /// Create a provider with the given row height.
    pub fn new(line_height: f64) -> Self {
        Self {
            line_height,
            padding_top: 0.0,
        }
    }

    /// Offset every line by a fixed top padding.
    pub fn with_padding_top(mut self, padding_top: f64) -> Self {
        self.padding_top = padding_top;
        self
    }

    /// Row height in pixels.
    pub fn line_height(&self) -> f64 {
        self.line_height
    }
}

impl LineCoordinates for UniformLineHeights {
    fn top_for_line_number(&self, line_number: usize) -> f64 {
        self.padding_top + line_number.saturating_sub(1) as f64 * self.line_height
    }

    fn bottom_for_line_number(&self, line_number: usize) -> f64 {
        self.top_for_line_number(line_number) + self.line_height
    }
}

/// Line coordinates of a soft-wrapped document: a line spans as many rows as it wraps into.
///
/// The provider is a snapshot; hosts rebuild it after edits or viewport resizes and publish the
/// new instance through the editor's line-coordinates signal. Lines past the end of the
/// snapshot count as one row each.
#[derive(Debug, Clone, PartialEq)]
pub struct WrappedLineHeights {
    line_height: f64,
    padding_top: f64,
    /// `row_starts[i]` = number of rows before line `i + 1`; one extra entry holds the total.
    row_starts: Vec<usize>,
}

impl WrappedLineHeights {
    /// Lay out every line of `model`.
    pub fn from_model(
        model: &dyn TextModel,
        viewport_width: usize,
        tab_width: usize,
        wrap_mode: WrapMode,
        line_height: f64,
    ) -> Self {
        let lines: Vec<String> = (1..=model.line_count())
            .map(|line| model.line_content(line))
            .collect();
        Self::from_lines(
            lines.iter().map(String::as_str),
            viewport_width,
            tab_width,
            wrap_mode,
            line_height,
        )
    }

    /// Lay out the given lines.
    pub fn from_lines<'a>(
        lines: impl IntoIterator<Item = &'a str>,
        viewport_width: usize,
        tab_width: usize,
        wrap_mode: WrapMode,
        line_height: f64,
    ) -> Self {
        let mut row_starts = vec![0usize];
        let mut total = 0usize;
        for line in lines {
            total += visual_row_count(line, viewport_width, tab_width, wrap_mode);
            row_starts.push(total);
        }
        Self {
            line_height,
            padding_top: 0.0,
            row_starts,
        }
    }

    /// Offset every line by a fixed top padding.
    pub fn with_padding_top(mut self, padding_top: f64) -> Self {
        self.padding_top = padding_top;
        self
    }

    /// Number of rows covered by `line_number`.
    pub fn rows_for_line(&self, line_number: usize) -> usize {
        let index = line_number.saturating_sub(1);
        match (self.row_starts.get(index), self.row_starts.get(index + 1)) {
            (Some(start), Some(end)) => end - start,
            _ => 1,
        }
    }

    /// Total number of rows of the laid out lines.
    pub fn total_rows(&self) -> usize {
        self.row_starts.last().copied().unwrap_or(0)
    }

    fn rows_before(&self, line_number: usize) -> usize {
        let index = line_number.saturating_sub(1);
        let laid_out = self.row_starts.len() - 1;
        match self.row_starts.get(index) {
            Some(rows) => *rows,
            None => self.total_rows() + (index - laid_out),
        }
    }
}

impl LineCoordinates for WrappedLineHeights {
    fn top_for_line_number(&self, line_number: usize) -> f64 {
        self.padding_top + self.rows_before(line_number) as f64 * self.line_height
    }

    fn bottom_for_line_number(&self, line_number: usize) -> f64 {
        self.top_for_line_number(line_number)
            + self.rows_for_line(line_number) as f64 * self.line_height
    }
}
