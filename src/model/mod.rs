//! Data model shared by the parser, resolver and writer.
//!
//! [`ParsedLine`] is the tokenizer's output, [`BookmarkTree`] the assembled
//! hierarchy that gets written, and [`Outline`] what a PDF already contains.

mod bookmark;
mod line;
mod outline;

pub use bookmark::{BookmarkNode, BookmarkTree, Iter};
pub use line::ParsedLine;
pub use outline::{Outline, OutlineItem};
