//! Writing bookmark trees into PDF documents.

mod backend;
mod outline;

pub use backend::{
    read_outline, DocumentHandle, DocumentLibrary, EntryRef, LopdfHandle, LopdfLibrary,
};
pub use outline::write_outline;
