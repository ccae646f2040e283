//! AI adapters - ConversationProvider implementations.

mod mock_provider;
mod openai_provider;

pub use mock_provider::{MockConversationProvider, MockConverseError};
pub use openai_provider::{OpenAIConfig, OpenAIProvider};
