//! Custom widgets

pub mod conversation;

pub use conversation::{ConversationState, ConversationView};
