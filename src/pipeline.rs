//! Bookmark generation pipeline.
//!
//! One run goes `Idle → SourceOpened → TreeBuilt → OffsetApplied →
//! OutlineWritten → Saved`. Any failure moves the pipeline to `Failed` and
//! ends the run; nothing is retried and no partial destination is left.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Error, Result, Warning};
use crate::model::BookmarkTree;
use crate::parser::{parse_toc, TocOptions};
use crate::resolve::resolve;
use crate::writer::{write_outline, DocumentHandle, DocumentLibrary};

/// Suffix appended to the source file stem when no destination is given.
pub const DESTINATION_SUFFIX: &str = "_含目录";

/// Options for a bookmark generation run.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// TOC parsing options
    pub toc: TocOptions,

    /// Added to every printed page number
    pub offset: i64,

    /// Output path (derived from the source when `None`)
    pub destination: Option<PathBuf>,

    /// Write outline entries expanded
    pub open_items: bool,
}

impl GenerateOptions {
    /// Create new generate options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set TOC parsing options.
    pub fn with_toc_options(mut self, toc: TocOptions) -> Self {
        self.toc = toc;
        self
    }

    /// Set the page offset.
    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    /// Set the output path.
    pub fn with_destination(mut self, path: impl Into<PathBuf>) -> Self {
        self.destination = Some(path.into());
        self
    }

    /// Write outline entries expanded.
    pub fn with_open_items(mut self, open: bool) -> Self {
        self.open_items = open;
        self
    }
}

/// Successful pipeline result.
#[derive(Debug, Clone, Serialize)]
pub struct Generated {
    /// Path of the written PDF
    pub destination: PathBuf,

    /// Number of outline entries written
    pub entries: usize,

    /// Page count of the document
    pub page_count: u32,

    /// Lines and headings that were dropped
    pub warnings: Vec<Warning>,

    /// The bookmark tree as written, with corrected pages
    pub tree: BookmarkTree,
}

/// Pipeline progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    /// Nothing done yet
    #[default]
    Idle,
    /// Source document loaded
    SourceOpened,
    /// TOC parsed into a bookmark tree
    TreeBuilt,
    /// Offset applied and pages validated
    OffsetApplied,
    /// Outline entries added to the document
    OutlineWritten,
    /// Destination written
    Saved,
    /// A step failed
    Failed,
}

/// Runs TOC text through parsing, offset correction and outline writing.
pub struct Pipeline<'a, L: DocumentLibrary> {
    library: &'a L,
    options: GenerateOptions,
    state: PipelineState,
}

impl<'a, L: DocumentLibrary> Pipeline<'a, L> {
    /// Create a pipeline over a document library.
    pub fn new(library: &'a L, options: GenerateOptions) -> Self {
        Self {
            library,
            options,
            state: PipelineState::Idle,
        }
    }

    /// Current state (the final state once [`run`](Self::run) returned).
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Add the bookmarks described by `toc_text` to `source`.
    ///
    /// Each call is an independent run starting from `Idle`.
    pub fn run(&mut self, toc_text: &str, source: &Path) -> Result<Generated> {
        self.state = PipelineState::Idle;
        let result = self.execute(toc_text, source);
        if let Err(ref e) = result {
            log::warn!("Bookmark generation failed after {:?}: {}", self.state, e);
            self.state = PipelineState::Failed;
        }
        result
    }

    fn advance(&mut self, next: PipelineState) {
        log::debug!("Pipeline {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn execute(&mut self, toc_text: &str, source: &Path) -> Result<Generated> {
        if toc_text.trim().is_empty() {
            return Err(Error::EmptyContent);
        }
        if source.as_os_str().is_empty() || !source.is_file() {
            return Err(Error::EmptySource(source.display().to_string()));
        }

        let destination = self
            .options
            .destination
            .clone()
            .unwrap_or_else(|| default_destination(source));

        let mut handle = self.library.open(source)?;
        let page_count = handle.page_count();
        self.advance(PipelineState::SourceOpened);

        let parsed = parse_toc(toc_text, &self.options.toc);
        if parsed.tree.is_empty() {
            return Err(Error::EmptyContent);
        }
        let mut tree = parsed.tree;
        self.advance(PipelineState::TreeBuilt);

        resolve(&mut tree, self.options.offset, page_count)?;
        self.advance(PipelineState::OffsetApplied);

        let entries = write_outline(&tree, &mut handle)?;
        self.advance(PipelineState::OutlineWritten);

        save_without_leftovers(&mut handle, &destination)?;
        self.advance(PipelineState::Saved);

        log::debug!(
            "Wrote {} bookmarks to {} ({} warnings)",
            entries,
            destination.display(),
            parsed.warnings.len()
        );

        Ok(Generated {
            destination,
            entries,
            page_count,
            warnings: parsed.warnings,
            tree,
        })
    }
}

/// Save, removing the destination again if the save created it and then failed.
fn save_without_leftovers<H: DocumentHandle>(handle: &mut H, destination: &Path) -> Result<()> {
    let existed = destination.exists();
    handle.save(destination).map_err(|e| {
        if !existed && destination.exists() {
            let _ = fs::remove_file(destination);
        }
        match e {
            Error::DocumentWriteFailure(_) => e,
            other => Error::DocumentWriteFailure(other.to_string()),
        }
    })
}

/// Derive the output path `<stem>_含目录<.ext>` next to the source.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use tocmark::default_destination;
///
/// assert_eq!(
///     default_destination("books/rust.pdf"),
///     Path::new("books/rust_含目录.pdf")
/// );
/// ```
pub fn default_destination<P: AsRef<Path>>(source: P) -> PathBuf {
    let source = source.as_ref();
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match source.extension() {
        Some(ext) => format!("{}{}.{}", stem, DESTINATION_SUFFIX, ext.to_string_lossy()),
        None => format!("{}{}", stem, DESTINATION_SUFFIX),
    };
    source.with_file_name(name)
}
