pub mod store;
pub mod types;

pub use store::MessageStore;
pub use types::{ConversationSummary, Manifest, Message, Platform};
