//! Line ending helpers.
//!
//! Documents and insertion texts are handled with LF (`'\n'`) newlines internally. CRLF
//! (`"\r\n"`) and lone CR (`'\r'`) input is normalized before it reaches line splitting, so a
//! suggestion produced on a Windows host measures the same as its LF equivalent.

use std::borrow::Cow;

/// Normalize every CRLF and lone CR in `text` to LF.
///
/// Borrows when the text is already LF-only.
pub fn normalize_to_lf(text: &str) -> Cow<'_, str> {
    if !text.contains('\r') {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_replaces_every_crlf() {
        assert_eq!(normalize_to_lf("a\r\nb\r\nc"), "a\nb\nc");
        assert_eq!(normalize_to_lf("a\rb"), "a\nb");
        assert!(matches!(normalize_to_lf("a\nb"), Cow::Borrowed(_)));
    }
}
