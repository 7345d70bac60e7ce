//! Messaging DTOs

use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{ClaimId, UserId};
use domain_messaging::Attachment;

#[derive(Debug, Deserialize)]
pub struct CreateConversationRequest {
    pub claim_id: ClaimId,
    /// Other participants; the caller is always added
    #[serde(default)]
    pub participants: Vec<UserId>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[serde(default)]
    #[validate(length(max = 4000))]
    pub text: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Serialize)]
pub struct MarkedResponse {
    pub updated: usize,
}

#[derive(Debug, Serialize)]
pub struct UnreadResponse {
    pub unread: u32,
}
