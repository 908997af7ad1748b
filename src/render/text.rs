//! Plain text rendering for bookmark trees and outlines.

use crate::model::{BookmarkTree, Outline};

/// Indentation per nesting level.
const INDENT: &str = "  ";

/// Render a bookmark tree as indented `title  page` lines.
///
/// The output parses back into the same tree.
pub fn to_text(tree: &BookmarkTree) -> String {
    tree.iter()
        .map(|node| {
            let indent = INDENT.repeat(node.depth);
            format!("{}{}  {}", indent, node.title, node.page)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render an outline read from a PDF; unresolved targets show as `-`.
pub fn outline_to_text(outline: &Outline) -> String {
    outline
        .flatten()
        .into_iter()
        .map(|(level, title, page)| {
            let page = page.map_or_else(|| "-".to_string(), |p| p.to_string());
            format!("{}{}  {}", INDENT.repeat(level as usize), title, page)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
