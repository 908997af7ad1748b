//! PDF backend abstraction layer.
//!
//! The pipeline only talks to [`DocumentLibrary`] and [`DocumentHandle`],
//! so the concrete PDF library (lopdf) stays out of the outline logic and
//! tests can substitute an in-memory document.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use lopdf::{dictionary, Dictionary, Document as LopdfDocument, Object, ObjectId, StringFormat};
use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::model::{Outline, OutlineItem};
use crate::parser::MAX_DEPTH;

/// Handle to an outline entry created through [`DocumentHandle::add_outline_entry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryRef(pub usize);

/// Opens documents.
pub trait DocumentLibrary {
    /// Open document type.
    type Handle: DocumentHandle;

    /// Open a document for modification.
    ///
    /// Encrypted documents fail with [`Error::PasswordProtected`], files that
    /// cannot be loaded with [`Error::Unreadable`].
    fn open(&self, path: &Path) -> Result<Self::Handle>;
}

/// An open document that outline entries can be added to.
pub trait DocumentHandle {
    /// Number of pages in the document.
    fn page_count(&self) -> u32;

    /// Add an outline entry pointing at the top of `page` (1-indexed),
    /// nested under `parent` or at the top level.
    fn add_outline_entry(
        &mut self,
        parent: Option<EntryRef>,
        title: &str,
        page: u32,
    ) -> Result<EntryRef>;

    /// Write the document to `dest`.
    fn save(&mut self, dest: &Path) -> Result<()>;
}

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";

/// Page height used when a page has no usable MediaBox (US Letter).
const DEFAULT_PAGE_TOP: f32 = 792.0;

/// [`DocumentLibrary`] backed by `lopdf`.
#[derive(Debug, Clone, Default)]
pub struct LopdfLibrary {
    open_items: bool,
}

impl LopdfLibrary {
    /// Create a library writing collapsed outline entries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write outline entries expanded instead of collapsed.
    pub fn with_open_items(mut self, open: bool) -> Self {
        self.open_items = open;
        self
    }
}

impl DocumentLibrary for LopdfLibrary {
    type Handle = LopdfHandle;

    fn open(&self, path: &Path) -> Result<LopdfHandle> {
        let mut handle = LopdfHandle::load(path)?;
        handle.open_items = self.open_items;
        Ok(handle)
    }
}

/// Outline entry waiting to be written on save.
#[derive(Debug, Clone)]
struct PendingEntry {
    title: String,
    page_id: ObjectId,
    children: Vec<usize>,
}

/// An open `lopdf::Document`.
///
/// Outline entries are collected in memory and turned into the outline
/// dictionary chain on [`save`](DocumentHandle::save). Any outline already in
/// the document is replaced.
pub struct LopdfHandle {
    doc: LopdfDocument,
    pages: BTreeMap<u32, ObjectId>,
    entries: Vec<PendingEntry>,
    top_level: Vec<usize>,
    open_items: bool,
}

impl LopdfHandle {
    /// Load a PDF file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        check_pdf_header(path)?;

        let doc = LopdfDocument::load(path).map_err(|e| match e {
            lopdf::Error::Decryption(_) => Error::PasswordProtected,
            other => Error::Unreadable(other.to_string()),
        })?;
        Self::from_document(doc)
    }

    /// Load a PDF from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        if !data.starts_with(PDF_MAGIC) {
            return Err(Error::Unreadable("not a PDF file".to_string()));
        }
        let doc = LopdfDocument::load_mem(data).map_err(|e| match e {
            lopdf::Error::Decryption(_) => Error::PasswordProtected,
            other => Error::Unreadable(other.to_string()),
        })?;
        Self::from_document(doc)
    }

    /// Wrap an already loaded document.
    pub fn from_document(doc: LopdfDocument) -> Result<Self> {
        if doc.is_encrypted() {
            return Err(Error::PasswordProtected);
        }
        let pages = doc.get_pages();
        Ok(Self {
            doc,
            pages,
            entries: Vec::new(),
            top_level: Vec::new(),
            open_items: false,
        })
    }

    /// Read the outline currently stored in the document.
    ///
    /// Entries added through [`DocumentHandle::add_outline_entry`] only show
    /// up after a save and reload.
    pub fn outline(&self) -> Outline {
        let mut outline = Outline::new();
        let first = self
            .doc
            .catalog()
            .ok()
            .and_then(|catalog| catalog.get(b"Outlines").ok())
            .and_then(|o| o.as_reference().ok())
            .and_then(|id| self.doc.get_dictionary(id).ok())
            .and_then(|outlines| outlines.get(b"First").ok())
            .and_then(|o| o.as_reference().ok());

        if let Some(first) = first {
            let mut visited = Vec::new();
            self.read_outline_items(first, 0, &mut outline.items, &mut visited);
        }
        outline
    }

    /// Read a sibling chain starting at `first`, recursing into children.
    fn read_outline_items(
        &self,
        first: ObjectId,
        level: u8,
        items: &mut Vec<OutlineItem>,
        visited: &mut Vec<ObjectId>,
    ) {
        let mut current = Some(first);
        while let Some(id) = current {
            // Malformed files can link items in a cycle.
            if visited.contains(&id) {
                log::warn!("Outline item {:?} visited twice, stopping", id);
                return;
            }
            visited.push(id);

            let Ok(dict) = self.doc.get_dictionary(id) else {
                return;
            };

            let title = dict
                .get(b"Title")
                .ok()
                .and_then(decode_pdf_string)
                .unwrap_or_default();
            let mut item = OutlineItem::new(title, self.destination_page(dict), level);

            if let Ok(child) = dict.get(b"First").and_then(Object::as_reference) {
                if usize::from(level) < MAX_DEPTH {
                    self.read_outline_items(child, level + 1, &mut item.children, visited);
                } else {
                    log::warn!(
                        "Outline nested deeper than {} levels, skipping children",
                        MAX_DEPTH
                    );
                }
            }
            items.push(item);

            current = dict.get(b"Next").and_then(Object::as_reference).ok();
        }
    }

    /// Page number targeted by an outline item's `/Dest` or `/A` `/D`.
    fn destination_page(&self, item: &Dictionary) -> Option<u32> {
        let dest = match item.get(b"Dest") {
            Ok(dest) => dest,
            Err(_) => {
                let action = match item.get(b"A").ok()? {
                    Object::Reference(id) => self.doc.get_dictionary(*id).ok()?,
                    Object::Dictionary(dict) => dict,
                    _ => return None,
                };
                action.get(b"D").ok()?
            }
        };

        let dest = match dest {
            Object::Reference(id) => self.doc.get_object(*id).ok()?,
            other => other,
        };
        let page_ref = dest.as_array().ok()?.first()?.as_reference().ok()?;
        self.pages
            .iter()
            .find(|(_, id)| **id == page_ref)
            .map(|(num, _)| *num)
    }

    /// Top edge of a page, following inherited `/MediaBox` entries.
    fn page_top(&self, page_id: ObjectId) -> f32 {
        let mut current = Some(page_id);
        // The page tree is shallow; the bound guards against parent cycles.
        for _ in 0..16 {
            let Some(id) = current else { break };
            let Ok(dict) = self.doc.get_dictionary(id) else {
                break;
            };
            if let Ok(media_box) = dict.get(b"MediaBox") {
                let media_box = match media_box {
                    Object::Reference(r) => self.doc.get_object(*r).ok(),
                    other => Some(other),
                };
                if let Some(Ok(array)) = media_box.map(Object::as_array) {
                    if array.len() >= 4 {
                        if let Ok(top) = array[3].as_float() {
                            return top;
                        }
                    }
                }
            }
            current = dict.get(b"Parent").and_then(Object::as_reference).ok();
        }
        DEFAULT_PAGE_TOP
    }

    /// Number of outline items visible under entry `idx`.
    fn visible_descendants(&self, idx: usize) -> i64 {
        self.entries[idx]
            .children
            .iter()
            .map(|&child| {
                1 + if self.open_items {
                    self.visible_descendants(child)
                } else {
                    0
                }
            })
            .sum()
    }

    /// Turn the pending entries into outline dictionaries and hook them into
    /// the catalog.
    fn build_outline_objects(&mut self) -> Result<()> {
        if self.entries.is_empty() {
            return Ok(());
        }

        let outlines_id = self.doc.new_object_id();
        let ids: Vec<ObjectId> = (0..self.entries.len())
            .map(|_| self.doc.new_object_id())
            .collect();

        let top_level = self.top_level.clone();
        self.link_siblings(&top_level, outlines_id, &ids);

        let top_count: i64 = self
            .top_level
            .iter()
            .map(|&idx| {
                1 + if self.open_items {
                    self.visible_descendants(idx)
                } else {
                    0
                }
            })
            .sum();

        let mut outlines = dictionary! {
            "Type" => "Outlines",
            "Count" => top_count,
        };
        if let (Some(&first), Some(&last)) = (self.top_level.first(), self.top_level.last()) {
            outlines.set("First", ids[first]);
            outlines.set("Last", ids[last]);
        }
        self.doc
            .objects
            .insert(outlines_id, Object::Dictionary(outlines));

        let root_id = self.doc.trailer.get(b"Root")?.as_reference()?;
        let catalog = self.doc.get_object_mut(root_id)?.as_dict_mut()?;
        catalog.set("Outlines", outlines_id);
        catalog.set("PageMode", "UseOutlines");

        // Drops the outline objects that were replaced.
        let pruned = self.doc.prune_objects();
        log::debug!(
            "Built {} outline objects, pruned {} unreferenced objects",
            ids.len(),
            pruned.len()
        );
        Ok(())
    }

    /// Write the dictionaries for one sibling chain and recurse into children.
    fn link_siblings(&mut self, siblings: &[usize], parent_id: ObjectId, ids: &[ObjectId]) {
        for (pos, &idx) in siblings.iter().enumerate() {
            let entry = self.entries[idx].clone();
            let top = self.page_top(entry.page_id);

            let mut dict = dictionary! {
                "Title" => encode_title(&entry.title),
                "Parent" => parent_id,
                "Dest" => vec![
                    Object::Reference(entry.page_id),
                    Object::Name(b"XYZ".to_vec()),
                    Object::Null,
                    Object::Real(top),
                    Object::Null,
                ],
            };
            if pos > 0 {
                dict.set("Prev", ids[siblings[pos - 1]]);
            }
            if let Some(&next) = siblings.get(pos + 1) {
                dict.set("Next", ids[next]);
            }
            if let (Some(&first), Some(&last)) = (entry.children.first(), entry.children.last()) {
                dict.set("First", ids[first]);
                dict.set("Last", ids[last]);
                let visible = self.visible_descendants(idx);
                dict.set("Count", if self.open_items { visible } else { -visible });
            }

            self.doc.objects.insert(ids[idx], Object::Dictionary(dict));
            self.link_siblings(&entry.children, ids[idx], ids);
        }
    }

    /// Set `/ModDate` in the document info dictionary, if there is one.
    fn stamp_modification_date(&mut self) {
        let Ok(info_id) = self.doc.trailer.get(b"Info").and_then(Object::as_reference) else {
            return;
        };
        if let Ok(info) = self
            .doc
            .get_object_mut(info_id)
            .and_then(Object::as_dict_mut)
        {
            let date = format_pdf_date(chrono::Local::now().naive_local());
            info.set("ModDate", Object::string_literal(date));
        }
    }
}

impl DocumentHandle for LopdfHandle {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn add_outline_entry(
        &mut self,
        parent: Option<EntryRef>,
        title: &str,
        page: u32,
    ) -> Result<EntryRef> {
        let page_id = *self.pages.get(&page).ok_or_else(|| Error::PageOutOfRange {
            title: title.to_string(),
            page: i64::from(page),
            total: self.page_count(),
        })?;

        let idx = self.entries.len();
        match parent {
            Some(EntryRef(parent_idx)) => self
                .entries
                .get_mut(parent_idx)
                .ok_or_else(|| Error::Pdf(format!("unknown outline parent {}", parent_idx)))?
                .children
                .push(idx),
            None => self.top_level.push(idx),
        }
        self.entries.push(PendingEntry {
            title: title.to_string(),
            page_id,
            children: Vec::new(),
        });

        Ok(EntryRef(idx))
    }

    fn save(&mut self, dest: &Path) -> Result<()> {
        self.build_outline_objects()?;
        self.stamp_modification_date();

        // Serialize fully before touching the destination.
        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| Error::DocumentWriteFailure(e.to_string()))?;

        // Written beside the destination, then renamed over it. An existing
        // destination is either fully replaced or left untouched.
        let dir = match dest.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let failed = |e: std::io::Error| write_failure(dest, e);
        let mut temp = NamedTempFile::new_in(dir).map_err(failed)?;
        temp.write_all(&buffer).map_err(failed)?;
        temp.as_file().sync_all().map_err(failed)?;
        temp.persist(dest).map_err(|e| failed(e.error))?;

        log::debug!("Wrote {} bytes to {}", buffer.len(), dest.display());
        Ok(())
    }
}

/// Read the outline of a PDF file.
pub fn read_outline<P: AsRef<Path>>(path: P) -> Result<Outline> {
    Ok(LopdfHandle::load(path)?.outline())
}

/// Reject files that do not start with the PDF header.
fn check_pdf_header(path: &Path) -> Result<()> {
    let mut header = [0u8; 5];
    let unreadable = |e: std::io::Error| Error::Unreadable(format!("{}: {}", path.display(), e));
    let mut file = File::open(path).map_err(unreadable)?;
    let read = file.read(&mut header).map_err(unreadable)?;
    if read < PDF_MAGIC.len() || header != PDF_MAGIC {
        return Err(Error::Unreadable(format!("{} is not a PDF file", path.display())));
    }
    Ok(())
}

fn write_failure(dest: &Path, e: std::io::Error) -> Error {
    Error::DocumentWriteFailure(format!("{}: {}", dest.display(), e))
}

/// Encode an outline title: plain literal for ASCII, UTF-16BE with BOM otherwise.
fn encode_title(title: &str) -> Object {
    if title.is_ascii() {
        return Object::string_literal(title);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in title.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Decode a PDF text string (UTF-16BE with BOM, else UTF-8, else Latin-1).
fn decode_pdf_string(obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => {
            if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
                let utf16: Vec<u16> = bytes[2..]
                    .chunks_exact(2)
                    .map(|c| u16::from_be_bytes([c[0], c[1]]))
                    .collect();
                String::from_utf16(&utf16).ok()
            } else {
                String::from_utf8(bytes.clone())
                    .ok()
                    .or_else(|| Some(bytes.iter().map(|&b| b as char).collect()))
            }
        }
        Object::Name(bytes) => String::from_utf8(bytes.clone()).ok(),
        _ => None,
    }
}

/// Format a PDF date string (D:YYYYMMDDHHmmSS).
fn format_pdf_date(date: chrono::NaiveDateTime) -> String {
    date.format("D:%Y%m%d%H%M%S").to_string()
}
