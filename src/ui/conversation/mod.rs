//! Conversation UI components for the chatbot widget

pub mod composer;
pub mod history;
pub mod manager;

pub use composer::{ComposerResult, ConversationComposer};
pub use history::ConversationHistory;
pub use manager::{ConversationAction, ConversationManager};
