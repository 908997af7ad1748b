//! # tocmark
//!
//! Add a bookmark outline to a PDF from plain-text table of contents.
//!
//! The TOC text is one entry per line, with a title and a trailing printed
//! page number. Nesting comes from indentation or from numbering such as
//! `1.2.3` or `第一章`. Printed page numbers are shifted by a page offset to
//! reach physical pages, then written as the document's outline.
//!
//! ## Quick Start
//!
//! ```no_run
//! use tocmark::generate_bookmarks;
//!
//! fn main() -> tocmark::Result<()> {
//!     let toc = "Chapter 1 Getting Started ........ 1\n  1.1 Installation ..... 3";
//!
//!     // Front matter takes 12 pages, so printed page 1 is physical page 13.
//!     let result = generate_bookmarks(toc, "book.pdf", None, 12)?;
//!     println!("Wrote {} bookmarks to {}", result.entries, result.destination.display());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Forgiving TOC parsing**: dot leaders, full-width digits, CJK numbering
//! - **Hierarchy inference**: indentation or numbering, with page back-fill for headings
//! - **Page offsets**: signed, validated against the document's page count
//! - **Atomic output**: the destination is only written once the outline is complete
//! - **TOC fetching** (`fetch` feature): pull TOC text from a book page URL

pub mod error;
pub mod fetch;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod render;
pub mod resolve;
pub mod writer;

// Re-export commonly used types
pub use error::{Error, Result, Warning};
pub use model::{BookmarkNode, BookmarkTree, Outline, OutlineItem, ParsedLine};
pub use parser::{parse_toc, DepthStrategy, ParsedToc, TocOptions};
pub use pipeline::{
    default_destination, GenerateOptions, Generated, Pipeline, PipelineState, DESTINATION_SUFFIX,
};
pub use render::JsonFormat;
pub use resolve::{parse_offset, resolve};
pub use writer::{read_outline, DocumentHandle, DocumentLibrary, LopdfLibrary};

use std::path::{Path, PathBuf};

/// Add bookmarks described by `toc_text` to the PDF at `source`.
///
/// The result is written to `destination`, or next to the source as
/// `<stem>_含目录.pdf` when `None`. The source file is never modified.
///
/// # Arguments
///
/// * `toc_text` - TOC text, one entry per line
/// * `source` - Path to the source PDF
/// * `destination` - Output path
/// * `offset` - Added to every printed page number
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use tocmark::generate_bookmarks;
///
/// let dest = Path::new("out.pdf");
/// let result = generate_bookmarks("Intro 1\nUsage 4", "manual.pdf", Some(dest), 2)?;
/// assert_eq!(result.entries, 2);
/// # Ok::<(), tocmark::Error>(())
/// ```
pub fn generate_bookmarks<P: AsRef<Path>>(
    toc_text: &str,
    source: P,
    destination: Option<&Path>,
    offset: i64,
) -> Result<Generated> {
    let mut options = GenerateOptions::new().with_offset(offset);
    options.destination = destination.map(Path::to_path_buf);
    generate_bookmarks_with_options(toc_text, source, &options)
}

/// Add bookmarks with custom options, using the lopdf backend.
pub fn generate_bookmarks_with_options<P: AsRef<Path>>(
    toc_text: &str,
    source: P,
    options: &GenerateOptions,
) -> Result<Generated> {
    let library = LopdfLibrary::new().with_open_items(options.open_items);
    generate_bookmarks_with(&library, toc_text, source, options)
}

/// Add bookmarks through a caller-supplied document library.
///
/// `options.open_items` is left to the library; see
/// [`LopdfLibrary::with_open_items`].
pub fn generate_bookmarks_with<L: DocumentLibrary, P: AsRef<Path>>(
    library: &L,
    toc_text: &str,
    source: P,
    options: &GenerateOptions,
) -> Result<Generated> {
    Pipeline::new(library, options.clone()).run(toc_text, source.as_ref())
}

/// Builder for parsing TOC text and generating bookmarks.
///
/// # Example
///
/// ```no_run
/// use tocmark::{DepthStrategy, Tocmark};
///
/// let result = Tocmark::new()
///     .with_offset_str("-2")?
///     .with_strategy(DepthStrategy::Numbering)
///     .with_destination("book_with_toc.pdf")
///     .generate("1 Intro 3\n1.1 Scope 4", "book.pdf")?;
/// println!("{} bookmarks", result.entries);
/// # Ok::<(), tocmark::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Tocmark {
    options: GenerateOptions,
}

impl Tocmark {
    /// Create a new Tocmark builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page offset.
    pub fn with_offset(mut self, offset: i64) -> Self {
        self.options = self.options.with_offset(offset);
        self
    }

    /// Set the page offset from user input; empty input means 0.
    pub fn with_offset_str(self, offset: &str) -> Result<Self> {
        Ok(self.with_offset(parse_offset(offset)?))
    }

    /// Set the tab width used to measure indentation.
    pub fn with_tab_width(mut self, width: usize) -> Self {
        self.options.toc = self.options.toc.with_tab_width(width);
        self
    }

    /// Set how nesting depth is inferred.
    pub fn with_strategy(mut self, strategy: DepthStrategy) -> Self {
        self.options.toc = self.options.toc.with_strategy(strategy);
        self
    }

    /// Set the output path.
    pub fn with_destination(mut self, path: impl Into<PathBuf>) -> Self {
        self.options = self.options.with_destination(path);
        self
    }

    /// Write outline entries expanded.
    pub fn with_open_items(mut self, open: bool) -> Self {
        self.options = self.options.with_open_items(open);
        self
    }

    /// The options collected so far.
    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    /// Parse TOC text without touching any PDF.
    pub fn parse(&self, toc_text: &str) -> ParsedToc {
        parse_toc(toc_text, &self.options.toc)
    }

    /// Parse TOC text and apply the offset, as it would be written.
    ///
    /// With `total_pages` the corrected pages are also range checked.
    pub fn preview(&self, toc_text: &str, total_pages: Option<u32>) -> Result<ParsedToc> {
        if toc_text.trim().is_empty() {
            return Err(Error::EmptyContent);
        }
        let mut parsed = self.parse(toc_text);
        if parsed.tree.is_empty() {
            return Err(Error::EmptyContent);
        }
        match total_pages {
            Some(total) => resolve(&mut parsed.tree, self.options.offset, total)?,
            None => resolve::apply_offset(&mut parsed.tree, self.options.offset),
        }
        Ok(parsed)
    }

    /// Add the bookmarks to `source` and write the result.
    pub fn generate<P: AsRef<Path>>(&self, toc_text: &str, source: P) -> Result<Generated> {
        generate_bookmarks_with_options(toc_text, source, &self.options)
    }
}
