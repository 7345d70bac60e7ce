//! Conversations and messages

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ClaimId, ConversationId, MessageId, UserId};

/// Delivery state of a message; only ever moves forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Sent,
    Delivered,
    Read,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Image,
    Document,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub uri: String,
    pub kind: AttachmentKind,
    pub name: Option<String>,
}

impl Attachment {
    pub fn image(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            kind: AttachmentKind::Image,
            name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub text: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub status: MessageStatus,
    pub sent_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
}

impl Message {
    pub fn new(
        conversation_id: ConversationId,
        sender_id: UserId,
        text: impl Into<String>,
        attachments: Vec<Attachment>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MessageId::new_v7(),
            conversation_id,
            sender_id,
            text: text.into(),
            attachments,
            status: MessageStatus::Sent,
            sent_at: now,
            delivered_at: None,
            read_at: None,
        }
    }

    /// Advances to `status`; returns false if the message is already there or beyond
    pub fn advance(&mut self, status: MessageStatus, now: DateTime<Utc>) -> bool {
        if status <= self.status {
            return false;
        }
        if self.delivered_at.is_none() {
            self.delivered_at = Some(now);
        }
        if status == MessageStatus::Read {
            self.read_at = Some(now);
        }
        self.status = status;
        true
    }

    /// Short preview for conversation lists
    pub fn preview(&self) -> String {
        const MAX: usize = 80;
        if self.text.trim().is_empty() && !self.attachments.is_empty() {
            return format!("{} attachment(s)", self.attachments.len());
        }
        if self.text.chars().count() <= MAX {
            self.text.clone()
        } else {
            let cut: String = self.text.chars().take(MAX - 3).collect();
            format!("{}...", cut)
        }
    }
}

/// One thread per claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub claim_id: ClaimId,
    pub participants: Vec<UserId>,
    /// Unread messages per participant
    pub unread_count: HashMap<UserId, u32>,
    pub last_message_preview: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(claim_id: ClaimId, participants: Vec<UserId>, now: DateTime<Utc>) -> Self {
        let mut conversation = Self {
            id: ConversationId::new_v7(),
            claim_id,
            participants: Vec::new(),
            unread_count: HashMap::new(),
            last_message_preview: None,
            last_message_at: None,
            created_at: now,
            updated_at: now,
        };
        for user in participants {
            conversation.add_participant(user);
        }
        conversation
    }

    /// Adds a participant; returns false if already present
    pub fn add_participant(&mut self, user: UserId) -> bool {
        if self.is_participant(user) {
            return false;
        }
        self.participants.push(user);
        self.unread_count.insert(user, 0);
        true
    }

    pub fn is_participant(&self, user: UserId) -> bool {
        self.participants.contains(&user)
    }

    pub fn unread_for(&self, user: UserId) -> u32 {
        self.unread_count.get(&user).copied().unwrap_or(0)
    }

    /// Other participants, in join order
    pub fn recipients_of(&self, sender: UserId) -> impl Iterator<Item = UserId> + '_ {
        self.participants.iter().copied().filter(move |u| *u != sender)
    }

    /// Bumps unread counts for everyone but the sender
    pub fn record_message(&mut self, message: &Message) {
        let recipients: Vec<UserId> = self.recipients_of(message.sender_id).collect();
        for user in recipients {
            *self.unread_count.entry(user).or_insert(0) += 1;
        }
        self.last_message_preview = Some(message.preview());
        self.last_message_at = Some(message.sent_at);
        self.updated_at = message.sent_at;
    }

    pub fn clear_unread(&mut self, user: UserId) {
        self.unread_count.insert(user, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unread_counts_skip_sender() {
        let now = Utc::now();
        let (shop, adjuster, customer) = (UserId::new(), UserId::new(), UserId::new());
        let mut conversation = Conversation::new(ClaimId::new(), vec![shop, adjuster, customer], now);

        let message = Message::new(conversation.id, shop, "Photos uploaded", vec![], now);
        conversation.record_message(&message);
        conversation.record_message(&message);

        assert_eq!(conversation.unread_for(shop), 0);
        assert_eq!(conversation.unread_for(adjuster), 2);
        assert_eq!(conversation.unread_for(customer), 2);

        conversation.clear_unread(adjuster);
        assert_eq!(conversation.unread_for(adjuster), 0);
        assert_eq!(conversation.last_message_preview.as_deref(), Some("Photos uploaded"));
    }

    #[test]
    fn test_duplicate_participants_ignored() {
        let user = UserId::new();
        let conversation = Conversation::new(ClaimId::new(), vec![user, user], Utc::now());
        assert_eq!(conversation.participants.len(), 1);
    }

    #[test]
    fn test_status_only_moves_forward() {
        let now = Utc::now();
        let mut message = Message::new(ConversationId::new(), UserId::new(), "hi", vec![], now);

        assert!(message.advance(MessageStatus::Read, now));
        assert!(message.delivered_at.is_some());
        assert!(!message.advance(MessageStatus::Delivered, now));
        assert_eq!(message.status, MessageStatus::Read);
    }

    #[test]
    fn test_preview() {
        let now = Utc::now();
        let id = ConversationId::new();
        let long = Message::new(id, UserId::new(), "x".repeat(200), vec![], now);
        assert_eq!(long.preview().chars().count(), 80);
        assert!(long.preview().ends_with("..."));

        let photo = Message::new(id, UserId::new(), "", vec![Attachment::image("file:///a.jpg")], now);
        assert_eq!(photo.preview(), "1 attachment(s)");
    }

    #[test]
    fn test_unread_map_round_trips_through_json() {
        let user = UserId::new();
        let mut conversation = Conversation::new(ClaimId::new(), vec![user, UserId::new()], Utc::now());
        conversation.unread_count.insert(user, 3);

        let json = serde_json::to_string(&conversation).unwrap();
        let back: Conversation = serde_json::from_str(&json).unwrap();
        assert_eq!(back.unread_for(user), 3);
    }
}
