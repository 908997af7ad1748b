//! TOC text parsing.
//!
//! Parsing runs in two stages: [`tokenize`] splits the text into
//! [`ParsedLine`](crate::model::ParsedLine)s, then [`HierarchyEngine`] nests
//! them into a [`BookmarkTree`].

mod hierarchy;
mod options;
mod tokenizer;

pub use hierarchy::{build_tree, BuiltTree, HierarchyEngine, MAX_DEPTH};
pub use options::{DepthStrategy, TocOptions, DEFAULT_TAB_WIDTH};
pub use tokenizer::{tokenize, Tokenized};

use crate::error::Warning;
use crate::model::BookmarkTree;

/// Result of parsing TOC text.
#[derive(Debug, Clone, Default)]
pub struct ParsedToc {
    /// Bookmark tree with printed (not yet offset) page numbers
    pub tree: BookmarkTree,

    /// Dropped lines and headings, ordered by line number
    pub warnings: Vec<Warning>,
}

/// Parse raw TOC text into a bookmark tree.
///
/// # Example
///
/// ```
/// use tocmark::parser::{parse_toc, TocOptions};
///
/// let toc = parse_toc("Chapter 1 ......... 5\n  Section 1.1 ..... 6", &TocOptions::default());
/// assert_eq!(toc.tree.items[0].children[0].page, 6);
/// ```
pub fn parse_toc(text: &str, options: &TocOptions) -> ParsedToc {
    let tokenized = tokenize(text, options);
    let built = build_tree(&tokenized.lines, options);

    log::debug!(
        "Parsed {} TOC lines into {} bookmarks",
        tokenized.lines.len(),
        built.tree.len()
    );

    let mut warnings = tokenized.warnings;
    warnings.extend(built.warnings);
    warnings.sort_by_key(Warning::line);

    ParsedToc {
        tree: built.tree,
        warnings,
    }
}
