//! Hierarchy inference: assigns depths to parsed lines and assembles the tree.

use regex::Regex;

use crate::error::Warning;
use crate::model::{BookmarkNode, BookmarkTree, ParsedLine};

use super::options::{DepthStrategy, TocOptions};

/// Deepest nesting level a bookmark can get. Lines nested deeper become
/// siblings at this level.
pub const MAX_DEPTH: usize = 32;

/// Digits written in chapter markers such as `第十二章`.
const MARKER_NUMERAL: &str = "[0-9０-９一二三四五六七八九十百千零〇两]+";

/// Tree assembled from parsed lines, plus the headings that had to be dropped.
#[derive(Debug, Clone, Default)]
pub struct BuiltTree {
    /// Bookmark tree with every page resolved
    pub tree: BookmarkTree,

    /// Dropped headings
    pub warnings: Vec<Warning>,
}

/// Infers nesting depth from indentation or numbering and builds a [`BookmarkTree`].
pub struct HierarchyEngine {
    strategy: DepthStrategy,
    numbering_regex: Regex,
    chapter_regex: Regex,
    section_regex: Regex,
}

impl HierarchyEngine {
    /// Create an engine for the given options.
    pub fn new(options: &TocOptions) -> Self {
        Self {
            strategy: options.strategy,
            numbering_regex: Regex::new(r"^(\d+(?:[.．]\d+)*)[.．]?(?:[^\d.．]|$)").unwrap(),
            chapter_regex: Regex::new(&format!(
                r"^(?:第\s*{}\s*[章篇部卷]|(?i:chapter|part)\s+\S)",
                MARKER_NUMERAL
            ))
            .unwrap(),
            section_regex: Regex::new(&format!(
                r"^(?:第\s*{}\s*节|(?i:section)\s+\S)",
                MARKER_NUMERAL
            ))
            .unwrap(),
        }
    }

    /// Pick the concrete strategy for `Auto`.
    pub fn effective_strategy(&self, lines: &[ParsedLine]) -> DepthStrategy {
        match self.strategy {
            DepthStrategy::Auto => {
                if lines.iter().any(|l| l.raw_indent > 0) {
                    DepthStrategy::Indent
                } else if lines.iter().any(|l| self.numbering_depth(&l.title).is_some()) {
                    DepthStrategy::Numbering
                } else {
                    DepthStrategy::Flat
                }
            }
            other => other,
        }
    }

    /// Depth hint for every line, before the clamp applied during assembly.
    pub fn infer_depths(&self, lines: &[ParsedLine]) -> Vec<usize> {
        match self.effective_strategy(lines) {
            DepthStrategy::Indent => indent_depths(lines),
            DepthStrategy::Numbering => lines
                .iter()
                .map(|l| self.numbering_depth(&l.title).unwrap_or(0))
                .collect(),
            DepthStrategy::Flat | DepthStrategy::Auto => vec![0; lines.len()],
        }
    }

    /// Depth implied by a leading numbering token or chapter marker.
    pub fn numbering_depth(&self, title: &str) -> Option<usize> {
        if let Some(caps) = self.numbering_regex.captures(title) {
            let segments = caps[1].split(['.', '．']).count();
            return Some(segments - 1);
        }
        if self.chapter_regex.is_match(title) {
            return Some(0);
        }
        if self.section_regex.is_match(title) {
            return Some(1);
        }
        None
    }

    /// Build the bookmark tree.
    ///
    /// Depth jumps of more than one level are clamped to one below the
    /// current parent, and no depth exceeds [`MAX_DEPTH`]. Headings without
    /// a page take the smallest page of their descendants, or are dropped
    /// when there is none.
    pub fn build(&self, lines: &[ParsedLine]) -> BuiltTree {
        let depths = self.infer_depths(lines);

        let mut roots: Vec<PendingNode> = Vec::new();
        let mut stack: Vec<(usize, PendingNode)> = Vec::new();

        for (line, hint) in lines.iter().zip(depths) {
            let limit = stack.last().map_or(0, |(d, _)| d + 1);
            let depth = hint.min(limit).min(MAX_DEPTH);
            if depth < hint {
                log::debug!(
                    "Line {}: depth {} clamped to {}",
                    line.line_number,
                    hint,
                    depth
                );
            }

            while stack.last().is_some_and(|(d, _)| *d >= depth) {
                close_top(&mut stack, &mut roots);
            }
            stack.push((depth, PendingNode::from(line)));
        }
        while !stack.is_empty() {
            close_top(&mut stack, &mut roots);
        }

        let mut warnings = Vec::new();
        let mut items = backfill(roots, &mut warnings);
        assign_depths(&mut items, 0);
        warnings.sort_by_key(Warning::line);

        BuiltTree {
            tree: BookmarkTree { items },
            warnings,
        }
    }
}

/// Build a bookmark tree with the given options.
pub fn build_tree(lines: &[ParsedLine], options: &TocOptions) -> BuiltTree {
    HierarchyEngine::new(options).build(lines)
}

/// A tree node whose page may still be missing.
struct PendingNode {
    line: usize,
    title: String,
    page: Option<i64>,
    children: Vec<PendingNode>,
}

impl From<&ParsedLine> for PendingNode {
    fn from(line: &ParsedLine) -> Self {
        Self {
            line: line.line_number,
            title: line.title.clone(),
            page: line.page,
            children: Vec::new(),
        }
    }
}

/// Pop the innermost open node and attach it to its parent.
fn close_top(stack: &mut Vec<(usize, PendingNode)>, roots: &mut Vec<PendingNode>) {
    if let Some((_, node)) = stack.pop() {
        match stack.last_mut() {
            Some((_, parent)) => parent.children.push(node),
            None => roots.push(node),
        }
    }
}

/// Indentation widths to depths: a wider line opens a level, a narrower one
/// closes levels until the open width is not wider than the line.
fn indent_depths(lines: &[ParsedLine]) -> Vec<usize> {
    let mut open: Vec<usize> = Vec::new();
    lines
        .iter()
        .map(|line| {
            let width = line.raw_indent;
            while open.last().is_some_and(|&w| w > width) {
                open.pop();
            }
            if open.last() != Some(&width) {
                open.push(width);
            }
            open.len() - 1
        })
        .collect()
}

fn backfill(nodes: Vec<PendingNode>, warnings: &mut Vec<Warning>) -> Vec<BookmarkNode> {
    let mut resolved = Vec::with_capacity(nodes.len());
    for node in nodes {
        let children = backfill(node.children, warnings);
        match node.page.or_else(|| min_page(&children)) {
            Some(page) => resolved.push(BookmarkNode {
                title: node.title,
                page,
                depth: 0,
                children,
            }),
            None => {
                log::warn!("Dropping heading {:?}: no page found", node.title);
                warnings.push(Warning::UnresolvedHeading {
                    line: node.line,
                    title: node.title,
                });
                resolved.extend(children);
            }
        }
    }
    resolved
}

fn min_page(nodes: &[BookmarkNode]) -> Option<i64> {
    nodes
        .iter()
        .flat_map(|n| std::iter::once(n.page).chain(min_page(&n.children)))
        .min()
}

fn assign_depths(nodes: &mut [BookmarkNode], depth: usize) {
    for node in nodes {
        node.depth = depth;
        assign_depths(&mut node.children, depth + 1);
    }
}
