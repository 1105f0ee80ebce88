//! Text rendering for message bodies.
//!
//! - [`render_markdown`] - Assistant markdown to styled, wrapped lines
//! - [`wrap_text`] - Width-aware wrapping for plain text
//! - [`truncate_to_width`] - Single-line truncation for bars

mod markdown;
mod styles;
mod wrap;

pub use markdown::render_markdown;
pub use wrap::{truncate_to_width, wrap_text};
