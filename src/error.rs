//! Error and warning types for tocmark.

use std::io;
use thiserror::Error;

/// Result type alias for tocmark operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a bookmark generation run.
#[derive(Error, Debug)]
pub enum Error {
    /// The source PDF path is empty or the file does not exist.
    #[error("Source PDF not found: {0}")]
    EmptySource(String),

    /// The TOC text is empty after trimming, or yields no usable entries.
    #[error("Table of contents is empty")]
    EmptyContent,

    /// The page offset is not an integer.
    #[error("Invalid page offset: {0:?} is not an integer")]
    InvalidOffset(String),

    /// The source document is encrypted.
    #[error("PDF is encrypted and cannot be modified")]
    PasswordProtected,

    /// The source file is not a PDF that can be loaded.
    #[error("Cannot read PDF: {0}")]
    Unreadable(String),

    /// An offset-corrected page falls outside the document.
    #[error("Bookmark {title:?} points to page {page}, but the document has {total} pages")]
    PageOutOfRange {
        /// Title of the first offending bookmark.
        title: String,
        /// Offset-corrected page number.
        page: i64,
        /// Page count of the document.
        total: u32,
    },

    /// Saving the destination document failed.
    #[error("Failed to write PDF: {0}")]
    DocumentWriteFailure(String),

    /// Downloading or scraping a TOC failed.
    #[error("Failed to fetch table of contents: {0}")]
    Fetch(String),

    /// Error during rendering (text, JSON).
    #[error("Rendering error: {0}")]
    Render(String),

    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Any other error reported by the PDF library.
    #[error("PDF error: {0}")]
    Pdf(String),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::PasswordProtected,
            _ => Error::Pdf(err.to_string()),
        }
    }
}

#[cfg(feature = "fetch")]
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Fetch(err.to_string())
    }
}

/// Non-fatal diagnostics collected while building a bookmark tree.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// A line produced no usable title or page number and was dropped.
    MalformedTocLine {
        /// 1-based line number in the TOC text.
        line: usize,
        /// The offending line, trimmed.
        text: String,
    },

    /// A heading without a page had no page-bearing descendant and was dropped.
    UnresolvedHeading {
        /// 1-based line number in the TOC text.
        line: usize,
        /// Title of the dropped heading.
        title: String,
    },
}

impl Warning {
    /// Line number the warning refers to.
    pub fn line(&self) -> usize {
        match self {
            Warning::MalformedTocLine { line, .. } | Warning::UnresolvedHeading { line, .. } => {
                *line
            }
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::MalformedTocLine { line, text } => {
                write!(f, "line {}: ignored malformed entry {:?}", line, text)
            }
            Warning::UnresolvedHeading { line, title } => {
                write!(f, "line {}: heading {:?} has no page, dropped", line, title)
            }
        }
    }
}
