//! Page offset correction.
//!
//! Printed TOC page numbers rarely match physical page indices: front
//! matter usually shifts everything by a constant. The resolver adds that
//! constant to every bookmark and checks the result against the document.

use crate::error::{Error, Result};
use crate::model::BookmarkTree;

/// Parse a user-supplied page offset.
///
/// An empty string means no offset. A leading `+` or `-` is accepted.
///
/// # Example
///
/// ```
/// use tocmark::resolve::parse_offset;
///
/// assert_eq!(parse_offset("").unwrap(), 0);
/// assert_eq!(parse_offset("-12").unwrap(), -12);
/// assert!(parse_offset("3a").is_err());
/// ```
pub fn parse_offset(text: &str) -> Result<i64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed
        .parse::<i64>()
        .map_err(|_| Error::InvalidOffset(text.to_string()))
}

/// Add `offset` to every bookmark page.
///
/// Pages that would overflow saturate, which always fails validation.
pub fn apply_offset(tree: &mut BookmarkTree, offset: i64) {
    if offset == 0 {
        return;
    }
    tree.for_each_mut(|node| node.page = node.page.saturating_add(offset));
}

/// Check that every page lies in `[1, total_pages]`.
///
/// Fails with the first offending bookmark in depth-first order.
pub fn validate_pages(tree: &BookmarkTree, total_pages: u32) -> Result<()> {
    let total = i64::from(total_pages);
    match tree.iter().find(|node| node.page < 1 || node.page > total) {
        Some(node) => Err(Error::PageOutOfRange {
            title: node.title.clone(),
            page: node.page,
            total: total_pages,
        }),
        None => Ok(()),
    }
}

/// Apply the offset and validate the result.
pub fn resolve(tree: &mut BookmarkTree, offset: i64, total_pages: u32) -> Result<()> {
    apply_offset(tree, offset);
    validate_pages(tree, total_pages)
}
