//! Tokenized TOC lines.

use serde::Serialize;

/// One non-blank TOC line split into indentation, title and page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedLine {
    /// 1-based line number in the source text
    pub line_number: usize,

    /// Leading indentation width (tabs already expanded)
    pub raw_indent: usize,

    /// Title text, trimmed and stripped of dot leaders
    pub title: String,

    /// Printed page number, if the line ends with one
    pub page: Option<i64>,
}

impl ParsedLine {
    /// Create a new parsed line.
    pub fn new(
        line_number: usize,
        raw_indent: usize,
        title: impl Into<String>,
        page: Option<i64>,
    ) -> Self {
        Self {
            line_number,
            raw_indent,
            title: title.into(),
            page,
        }
    }

    /// Check if the line is a heading without its own page target.
    pub fn is_heading_only(&self) -> bool {
        self.page.is_none()
    }
}
