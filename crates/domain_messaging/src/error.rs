//! Messaging domain errors

use thiserror::Error;
use core_kernel::PortError;

#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("Message not found: {0}")]
    MessageNotFound(String),

    #[error("User {user} is not a participant in conversation {conversation}")]
    NotParticipant { conversation: String, user: String },

    #[error("Message must have text or at least one attachment")]
    EmptyMessage,

    #[error("Storage error: {0}")]
    Storage(#[from] PortError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MessagingError {
    pub fn not_participant(conversation: impl std::fmt::Display, user: impl std::fmt::Display) -> Self {
        MessagingError::NotParticipant {
            conversation: conversation.to_string(),
            user: user.to_string(),
        }
    }
}
