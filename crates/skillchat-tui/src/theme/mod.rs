//! Theme for the chat widget.
//!
//! - [`Theme`] - Color palette (Catppuccin Mocha or High Contrast)

mod colors;

pub use colors::Theme;
