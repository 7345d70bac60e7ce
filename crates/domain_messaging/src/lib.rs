//! Messaging Domain
//!
//! One conversation per claim between the body shop, the adjuster and the
//! customer. Messages move from sent to delivered to read; each participant
//! has an unread counter that resets when they read the thread.

pub mod conversation;
pub mod service;
pub mod error;

pub use conversation::{Attachment, AttachmentKind, Conversation, Message, MessageStatus};
pub use service::{MessagingService, CONVERSATIONS_KEY};
pub use error::MessagingError;
