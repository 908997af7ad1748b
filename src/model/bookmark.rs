//! Bookmark tree types.

use serde::{Deserialize, Serialize};

/// A single bookmark built from one TOC line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkNode {
    /// Display title (never empty)
    pub title: String,

    /// Target page, 1-indexed once the offset has been applied
    pub page: i64,

    /// Nesting level (0 = top level)
    pub depth: usize,

    /// Child bookmarks in document order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<BookmarkNode>,
}

impl BookmarkNode {
    /// Create a new bookmark without children.
    pub fn new(title: impl Into<String>, page: i64, depth: usize) -> Self {
        Self {
            title: title.into(),
            page,
            depth,
            children: Vec::new(),
        }
    }

    /// Add a child bookmark.
    pub fn add_child(&mut self, child: BookmarkNode) {
        self.children.push(child);
    }

    /// Builder-style variant of [`add_child`](Self::add_child).
    pub fn with_child(mut self, child: BookmarkNode) -> Self {
        self.children.push(child);
        self
    }

    fn visit_mut(&mut self, f: &mut impl FnMut(&mut BookmarkNode)) {
        f(self);
        for child in &mut self.children {
            child.visit_mut(f);
        }
    }
}

/// A bookmark tree rooted at a virtual, never-emitted root.
///
/// The root's children are the top-level (depth 0) bookmarks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkTree {
    /// Top-level bookmarks
    pub items: Vec<BookmarkNode>,
}

impl BookmarkTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Append a top-level bookmark.
    pub fn add_item(&mut self, item: BookmarkNode) {
        self.items.push(item);
    }

    /// Check if the tree has no bookmarks.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of bookmarks, including nested ones.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Deepest nesting level, or `None` for an empty tree.
    pub fn max_depth(&self) -> Option<usize> {
        self.iter().map(|node| node.depth).max()
    }

    /// Depth-first, parent-before-children iteration.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            stack: self.items.iter().rev().collect(),
        }
    }

    /// Visit every bookmark mutably in depth-first order.
    pub fn for_each_mut(&mut self, mut f: impl FnMut(&mut BookmarkNode)) {
        for item in &mut self.items {
            item.visit_mut(&mut f);
        }
    }

    /// Pages in depth-first order.
    pub fn pages(&self) -> Vec<i64> {
        self.iter().map(|node| node.page).collect()
    }

    /// Flattened `(depth, title, page)` view in depth-first order.
    pub fn flatten(&self) -> Vec<(usize, &str, i64)> {
        self.iter()
            .map(|node| (node.depth, node.title.as_str(), node.page))
            .collect()
    }
}

impl<'a> IntoIterator for &'a BookmarkTree {
    type Item = &'a BookmarkNode;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Depth-first iterator over a [`BookmarkTree`].
pub struct Iter<'a> {
    stack: Vec<&'a BookmarkNode>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a BookmarkNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> BookmarkTree {
        let mut tree = BookmarkTree::new();
        tree.add_item(
            BookmarkNode::new("Chapter 1", 1, 0)
                .with_child(BookmarkNode::new("Section 1.1", 2, 1))
                .with_child(
                    BookmarkNode::new("Section 1.2", 5, 1)
                        .with_child(BookmarkNode::new("1.2.1", 6, 2)),
                ),
        );
        tree.add_item(BookmarkNode::new("Chapter 2", 9, 0));
        tree
    }

    #[test]
    fn test_depth_first_order() {
        let tree = sample_tree();
        let titles: Vec<_> = tree.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Chapter 1", "Section 1.1", "Section 1.2", "1.2.1", "Chapter 2"]
        );
        assert_eq!(tree.pages(), vec![1, 2, 5, 6, 9]);
    }

    #[test]
    fn test_counts() {
        let tree = sample_tree();
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.max_depth(), Some(2));
        assert!(BookmarkTree::new().max_depth().is_none());
    }

    #[test]
    fn test_for_each_mut() {
        let mut tree = sample_tree();
        tree.for_each_mut(|node| node.page += 10);
        assert_eq!(tree.pages(), vec![11, 12, 15, 16, 19]);
    }
}
