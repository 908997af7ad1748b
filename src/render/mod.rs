//! Rendering bookmark trees and outlines for previews.

mod json;
mod text;

pub use json::{to_json, JsonFormat};
pub use text::{outline_to_text, to_text};
