//! Message list of the chat widget.
//!
//! - [`ConversationLayout`] lays messages out as wrapped terminal lines
//! - [`ConversationView`] draws a scrolled window onto that layout
//! - [`input_placeholder`] picks the input box hint

mod layout;
mod placeholder;
mod widget;

pub use layout::{ConversationLayout, ROW_HEIGHT_PX};
pub use placeholder::input_placeholder;
pub use widget::{ConversationView, NEW_MESSAGES_INDICATOR};
