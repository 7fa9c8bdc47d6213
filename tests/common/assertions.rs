//! Inspection helpers and assertions over written documents.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object};

/// Asserts two floats agree within `1e-3`.
#[track_caller]
pub fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-3,
        "expected {} but got {}",
        expected,
        actual
    );
}

/// Decoded operators of a page (0-based) after all its content streams
/// are concatenated.
pub fn page_operations(bytes: &[u8], page: usize) -> Vec<Operation> {
    let doc = Document::load_mem(bytes).expect("Output should be a readable PDF");
    let page_id = *doc
        .get_pages()
        .values()
        .nth(page)
        .expect("Page should exist");
    let data = doc
        .get_page_content(page_id)
        .expect("Page content should be readable");
    Content::decode(&data)
        .expect("Page content should decode")
        .operations
}

/// Operators of a page rendered as `operands operator` lines, for
/// comparing pages.
pub fn page_listing(bytes: &[u8], page: usize) -> Vec<String> {
    page_operations(bytes, page)
        .iter()
        .map(|op| format!("{:?} {}", op.operands, op.operator))
        .collect()
}

/// Numeric operands of every operator named `operator` on a page.
pub fn operands_of(bytes: &[u8], page: usize, operator: &str) -> Vec<Vec<f32>> {
    page_operations(bytes, page)
        .into_iter()
        .filter(|op| op.operator == operator)
        .map(|op| op.operands.iter().filter_map(as_number).collect())
        .collect()
}

/// Asserts that graphics state pushes and pops balance on a page.
pub fn assert_balanced_state(bytes: &[u8], page: usize) {
    let mut depth: i32 = 0;
    for op in page_operations(bytes, page) {
        match op.operator.as_str() {
            "q" => depth += 1,
            "Q" => {
                depth -= 1;
                assert!(depth >= 0, "Q without matching q on page {}", page);
            }
            _ => {}
        }
    }
    assert_eq!(depth, 0, "unbalanced q/Q on page {}", page);
}

fn as_number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}
