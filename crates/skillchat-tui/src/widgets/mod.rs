//! UI widgets for the TUI.
//!
//! This module provides:
//! - [`StatusBar`] - Top status bar with state, backend and activity
//! - [`FooterHints`] - Bottom keybinding hints and notices
//! - [`InputBar`] - Draft editor

mod footer_hints;
mod input_bar;
mod status_bar;

pub use footer_hints::{hints_for_focus, FooterHints};
pub use input_bar::{InputBar, TextInputState};
pub use status_bar::{StatusBar, StatusBarContent};
