//! Outline writer: emits a bookmark tree through a [`DocumentHandle`].

use crate::error::{Error, Result};
use crate::model::{BookmarkNode, BookmarkTree};

use super::backend::{DocumentHandle, EntryRef};

/// Add one outline entry per bookmark, parents before children.
///
/// Pages must already be offset-corrected and validated; the only errors
/// are those reported by the handle. Returns the number of entries added.
pub fn write_outline<H: DocumentHandle + ?Sized>(
    tree: &BookmarkTree,
    handle: &mut H,
) -> Result<usize> {
    let mut written = 0;
    for item in &tree.items {
        write_node(item, None, handle, &mut written)?;
    }
    log::debug!("Added {} outline entries", written);
    Ok(written)
}

fn write_node<H: DocumentHandle + ?Sized>(
    node: &BookmarkNode,
    parent: Option<EntryRef>,
    handle: &mut H,
    written: &mut usize,
) -> Result<()> {
    let page = u32::try_from(node.page).map_err(|_| Error::PageOutOfRange {
        title: node.title.clone(),
        page: node.page,
        total: handle.page_count(),
    })?;

    let entry = handle.add_outline_entry(parent, &node.title, page)?;
    *written += 1;

    for child in &node.children {
        write_node(child, Some(entry), handle, written)?;
    }
    Ok(())
}
