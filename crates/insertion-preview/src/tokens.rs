//! Per-line syntax tokens.
//!
//! A [`Tokenizer`] classifies the text of one line into styled runs. The width measurer asks
//! for tokens of *hypothetical* lines (the line as it would look after the insertion), so the
//! tokenizer receives the text explicitly together with the line number it would live at.

/// Style ID type. The UI/theme layer maps ids to fonts and colors.
pub type StyleId = u32;

/// Style id of untokenized text.
pub const PLAIN_STYLE_ID: StyleId = 0;

/// A styled run ending at `end` (byte offset into the line, exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// Exclusive end byte offset of the run.
    pub end: usize,
    /// Style of the run.
    pub style_id: StyleId,
}

impl Token {
    /// Create a token.
    pub fn new(end: usize, style_id: StyleId) -> Self {
        Self { end, style_id }
    }
}

/// The tokens of one line. Runs are contiguous and cover the whole text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineTokens {
    text: String,
    tokens: Vec<Token>,
}

impl LineTokens {
    /// Build line tokens, repairing the token list so that runs are strictly increasing, end on
    /// char boundaries and cover the whole text (a trailing gap becomes a plain run).
    pub fn new(text: impl Into<String>, tokens: Vec<Token>) -> Self {
        let text = text.into();
        let mut repaired: Vec<Token> = Vec::with_capacity(tokens.len() + 1);
        let mut last_end = 0usize;

        for token in tokens {
            let mut end = token.end.min(text.len());
            while !text.is_char_boundary(end) {
                end += 1;
            }
            if end <= last_end {
                continue;
            }
            repaired.push(Token::new(end, token.style_id));
            last_end = end;
        }
        if last_end < text.len() {
            repaired.push(Token::new(text.len(), PLAIN_STYLE_ID));
        }

        Self {
            text,
            tokens: repaired,
        }
    }

    /// A single plain run covering `text`.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Vec::new())
    }

    /// The line text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The runs (empty for an empty line).
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Iterate `(run_text, style_id)` pairs in order.
    pub fn runs(&self) -> impl Iterator<Item = (&str, StyleId)> + '_ {
        let mut start = 0usize;
        self.tokens.iter().map(move |token| {
            let run = &self.text[start..token.end];
            start = token.end;
            (run, token.style_id)
        })
    }
}

/// Syntax tokenization of a single line.
pub trait Tokenizer {
    /// Tokenize `text` as if it were the content of line `line_number`.
    ///
    /// Returns `None` when tokenization is unavailable (no grammar, state not ready, ...);
    /// callers fall back to [`LineTokens::plain`].
    fn tokenize_line_at(&self, line_number: usize, text: &str) -> Option<LineTokens>;
}

/// A tokenizer that never has tokens available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTokenizer;

impl Tokenizer for NoTokenizer {
    fn tokenize_line_at(&self, _line_number: usize, _text: &str) -> Option<LineTokens> {
        None
    }
}
