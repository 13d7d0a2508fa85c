//! `insertion-preview-highlight-simple` - Simple (regex-based) tokenizer for `insertion-preview`.
//!
//! This crate is intended for lightweight formats (JSON/INI/etc.) where a full grammar is
//! unnecessary but measured widths should still reflect styled runs (e.g. a bold key face).

use insertion_preview::tokens::{LineTokens, PLAIN_STYLE_ID, StyleId, Token, Tokenizer};
use regex::Regex;

/// A single regex tokenizing rule.
#[derive(Debug, Clone)]
pub struct RegexRule {
    regex: Regex,
    style_id: StyleId,
    capture_group: Option<usize>,
}

impl RegexRule {
    pub fn new(pattern: &str, style_id: StyleId) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            style_id,
            capture_group: None,
        })
    }

    /// Style only a capture group of each match.
    ///
    /// Example (INI key):
    /// - pattern: `^\\s*([^=\\s]+)\\s*=`
    /// - capture_group: `1` (the key)
    pub fn with_capture_group(mut self, group: usize) -> Self {
        self.capture_group = Some(group);
        self
    }

    pub fn style_id(&self) -> StyleId {
        self.style_id
    }

    /// Byte spans matched by this rule in `text`.
    fn spans(&self, text: &str) -> Vec<(usize, usize)> {
        match self.capture_group {
            Some(group) => self
                .regex
                .captures_iter(text)
                .filter_map(|caps| caps.get(group))
                .map(|m| (m.start(), m.end()))
                .collect(),
            None => self
                .regex
                .find_iter(text)
                .map(|m| (m.start(), m.end()))
                .collect(),
        }
    }
}

/// A simple regex-based tokenizer.
///
/// Rules are applied in order; where matches overlap, the earlier rule wins. Unmatched text is
/// [`PLAIN_STYLE_ID`]. It is *not* intended to be a full parser.
#[derive(Debug, Clone, Default)]
pub struct RegexTokenizer {
    rules: Vec<RegexRule>,
}

impl RegexTokenizer {
    pub fn new(rules: Vec<RegexRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[RegexRule] {
        &self.rules
    }

    /// Tokenize one line of text.
    pub fn tokenize(&self, text: &str) -> LineTokens {
        let mut spans: Vec<(usize, usize, StyleId)> = Vec::new();
        for rule in &self.rules {
            for (start, end) in rule.spans(text) {
                if start >= end {
                    continue;
                }
                let overlaps = spans.iter().any(|(s, e, _)| start < *e && *s < end);
                if !overlaps {
                    spans.push((start, end, rule.style_id));
                }
            }
        }
        spans.sort_by_key(|(start, _, _)| *start);

        let mut tokens = Vec::with_capacity(spans.len() * 2);
        let mut cursor = 0usize;
        for (start, end, style_id) in spans {
            if start > cursor {
                tokens.push(Token::new(start, PLAIN_STYLE_ID));
            }
            tokens.push(Token::new(end, style_id));
            cursor = end;
        }
        LineTokens::new(text, tokens)
    }

    /// A small default JSON grammar (strings, numbers, booleans, null).
    pub fn json_default(styles: SimpleJsonStyles) -> Result<Self, regex::Error> {
        Ok(Self::new(vec![
            // JSON string (single-line, handles escapes)
            RegexRule::new(r#""(?:\\.|[^"\\])*""#, styles.string)?,
            // JSON number
            RegexRule::new(
                r#"-?(?:0|[1-9]\d*)(?:\.\d+)?(?:[eE][+-]?\d+)?"#,
                styles.number,
            )?,
            // JSON boolean / null
            RegexRule::new(r#"\b(?:true|false)\b"#, styles.boolean)?,
            RegexRule::new(r#"\bnull\b"#, styles.null)?,
        ]))
    }

    /// A small default INI grammar (section, key, comment).
    pub fn ini_default(styles: SimpleIniStyles) -> Result<Self, regex::Error> {
        Ok(Self::new(vec![
            // Section header: [section]
            RegexRule::new(r#"^\s*\[([^\]]+)\]\s*$"#, styles.section)?.with_capture_group(1),
            // Key: key = value
            RegexRule::new(r#"^\s*([^=\s]+)\s*="#, styles.key)?.with_capture_group(1),
            // Comment: ;... or #...
            RegexRule::new(r#"^\s*[;#].*$"#, styles.comment)?,
        ]))
    }
}

impl Tokenizer for RegexTokenizer {
    /// Without rules there is nothing to contribute, so the caller measures plain text.
    fn tokenize_line_at(&self, _line_number: usize, text: &str) -> Option<LineTokens> {
        if self.rules.is_empty() {
            return None;
        }
        Some(self.tokenize(text))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SimpleJsonStyles {
    pub string: StyleId,
    pub number: StyleId,
    pub boolean: StyleId,
    pub null: StyleId,
}

impl Default for SimpleJsonStyles {
    fn default() -> Self {
        Self {
            string: SIMPLE_STYLE_STRING,
            number: SIMPLE_STYLE_NUMBER,
            boolean: SIMPLE_STYLE_BOOLEAN,
            null: SIMPLE_STYLE_NULL,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SimpleIniStyles {
    pub section: StyleId,
    pub key: StyleId,
    pub comment: StyleId,
}

impl Default for SimpleIniStyles {
    fn default() -> Self {
        Self {
            section: SIMPLE_STYLE_SECTION,
            key: SIMPLE_STYLE_KEY,
            comment: SIMPLE_STYLE_COMMENT,
        }
    }
}

/// Default `StyleId` constants for `RegexTokenizer`-based grammars.
///
/// These are only identifiers. The renderer maps them to faces.
pub const SIMPLE_STYLE_STRING: StyleId = 0x0200_0001;
pub const SIMPLE_STYLE_NUMBER: StyleId = 0x0200_0002;
pub const SIMPLE_STYLE_BOOLEAN: StyleId = 0x0200_0003;
pub const SIMPLE_STYLE_NULL: StyleId = 0x0200_0004;
pub const SIMPLE_STYLE_SECTION: StyleId = 0x0200_0010;
pub const SIMPLE_STYLE_KEY: StyleId = 0x0200_0011;
pub const SIMPLE_STYLE_COMMENT: StyleId = 0x0200_0012;
