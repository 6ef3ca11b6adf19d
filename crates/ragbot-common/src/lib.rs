pub mod errors;
pub mod id;

pub use errors::{ConfigError, RagbotError};
pub use id::{new_id, ConversationKey};
