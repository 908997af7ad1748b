//! Outline entries read back from an existing PDF.

use serde::{Deserialize, Serialize};

/// Document outline (bookmarks) as stored in a PDF.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Outline {
    /// Top-level outline items
    pub items: Vec<OutlineItem>,
}

impl Outline {
    /// Create a new empty outline.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Add an item to the outline.
    pub fn add_item(&mut self, item: OutlineItem) {
        self.items.push(item);
    }

    /// Check if the outline is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the total number of items (including nested).
    pub fn total_items(&self) -> usize {
        fn count_items(items: &[OutlineItem]) -> usize {
            items
                .iter()
                .map(|item| 1 + count_items(&item.children))
                .sum()
        }
        count_items(&self.items)
    }

    /// Flattened `(level, title, page)` view in depth-first order.
    pub fn flatten(&self) -> Vec<(u8, String, Option<u32>)> {
        fn walk(items: &[OutlineItem], out: &mut Vec<(u8, String, Option<u32>)>) {
            for item in items {
                out.push((item.level, item.title.clone(), item.page));
                walk(&item.children, out);
            }
        }
        let mut out = Vec::new();
        walk(&self.items, &mut out);
        out
    }
}

/// A single outline item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineItem {
    /// Item title
    pub title: String,

    /// Target page number (1-indexed), if it resolves to a page
    pub page: Option<u32>,

    /// Nesting level (0 = top level)
    pub level: u8,

    /// Child items
    pub children: Vec<OutlineItem>,
}

impl OutlineItem {
    /// Create a new outline item.
    pub fn new(title: impl Into<String>, page: Option<u32>, level: u8) -> Self {
        Self {
            title: title.into(),
            page,
            level,
            children: Vec::new(),
        }
    }

    /// Add a child item.
    pub fn add_child(&mut self, child: OutlineItem) {
        self.children.push(child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outline() {
        let mut outline = Outline::new();
        let mut chapter1 = OutlineItem::new("Chapter 1", Some(1), 0);
        chapter1.add_child(OutlineItem::new("Section 1.1", Some(2), 1));
        chapter1.add_child(OutlineItem::new("Section 1.2", Some(5), 1));
        outline.add_item(chapter1);

        assert_eq!(outline.total_items(), 3);
        assert_eq!(
            outline.flatten()[2],
            (1, "Section 1.2".to_string(), Some(5))
        );
    }
}
