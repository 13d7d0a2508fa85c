use insertion_preview::{InsertionRequest, NormalizedInsertion, TextDocument, normalize_insertion};
use pretty_assertions::assert_eq;

fn five_line_doc() -> TextDocument {
    // Line 4 is 10 chars long.
    TextDocument::new("fn main() {\n    let a = 1;\n    let b = 2;\n    foo();\n}")
}

#[test]
fn test_line_insertion_is_anchored_to_previous_line_end() {
    let doc = five_line_doc();
    let request = InsertionRequest::new(5, 1, "baz\n");

    assert_eq!(
        normalize_insertion(Some(&request), &doc),
        Some(NormalizedInsertion {
            line_number: 4,
            column: 11,
            text: "\nbaz".to_string(),
        })
    );
}

#[test]
fn test_multi_line_insertion_keeps_inner_newlines() {
    let doc = five_line_doc();
    let request = InsertionRequest::new(3, 1, "    x();\n    y();\n");
    let normalized = normalize_insertion(Some(&request), &doc).unwrap();

    assert_eq!(normalized.line_number, 2);
    assert_eq!(normalized.column, 15);
    assert_eq!(normalized.text, "\n    x();\n    y();");
}

#[test]
fn test_requests_that_are_not_rewritten() {
    let doc = TextDocument::new("alpha\n\nbeta\ngamma");
    let cases = [
        // Not at column 1.
        InsertionRequest::new(4, 2, "x\n"),
        // First line has no previous line.
        InsertionRequest::new(1, 1, "x\n"),
        // Does not end with a newline.
        InsertionRequest::new(4, 1, "x"),
        // Already starts with a newline.
        InsertionRequest::new(4, 1, "\nx\n"),
        // Target line is empty.
        InsertionRequest::new(2, 1, "x\n"),
        // Previous line is empty.
        InsertionRequest::new(3, 1, "x\n"),
    ];

    for request in cases {
        let normalized = normalize_insertion(Some(&request), &doc).unwrap();
        assert_eq!(
            normalized,
            NormalizedInsertion {
                line_number: request.line_number,
                column: request.start_column,
                text: request.text.clone(),
            },
            "request {request:?} should pass through"
        );
    }
}

#[test]
fn test_normalization_is_idempotent() {
    let doc = five_line_doc();
    let requests = [
        InsertionRequest::new(5, 1, "baz\n"),
        InsertionRequest::new(2, 1, "a\nb\n"),
        InsertionRequest::new(4, 5, "xyz"),
        InsertionRequest::new(1, 1, "// header\n"),
        InsertionRequest::new(3, 1, "\n"),
    ];

    for request in requests {
        let once = normalize_insertion(Some(&request), &doc).unwrap();
        let again: InsertionRequest = once.clone().into();
        let twice = normalize_insertion(Some(&again), &doc).unwrap();
        assert_eq!(once, twice, "request {request:?}");
    }
}

#[test]
fn test_absent_request() {
    let doc = five_line_doc();
    assert_eq!(normalize_insertion(None, &doc), None);
}
