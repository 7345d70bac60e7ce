//! Messaging service
//!
//! Conversations and their messages are stored together under one key and
//! written through on every change. A change is made on a copy of the
//! conversation record and replaces the cached one only once it is stored.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::RwLock;

use core_kernel::{
    ClaimId, ConversationId, KeyValueStore, Notification, NotificationChannel, NotificationPort,
    UserId,
};

use crate::conversation::{Attachment, Conversation, Message, MessageStatus};
use crate::error::MessagingError;

pub const CONVERSATIONS_KEY: &str = "conversations";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConversationRecord {
    conversation: Conversation,
    messages: Vec<Message>,
}

#[derive(Debug, Default)]
struct MessagingState {
    loaded: bool,
    records: HashMap<ConversationId, ConversationRecord>,
}

impl MessagingState {
    fn record(&self, id: ConversationId) -> Result<&ConversationRecord, MessagingError> {
        self.records
            .get(&id)
            .ok_or_else(|| MessagingError::ConversationNotFound(id.to_string()))
    }
}

pub struct MessagingService {
    storage: Arc<dyn KeyValueStore>,
    notifier: Option<Arc<dyn NotificationPort>>,
    state: RwLock<MessagingState>,
}

impl MessagingService {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            notifier: None,
            state: RwLock::new(MessagingState::default()),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationPort>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    async fn ensure_loaded(&self, state: &mut MessagingState) {
        if state.loaded {
            return;
        }
        match self.read_records().await {
            Ok(records) => {
                tracing::debug!(count = records.len(), "Conversations loaded");
                state.records = records.into_iter().map(|r| (r.conversation.id, r)).collect();
            }
            Err(e) => tracing::error!(error = %e, "Failed to load conversations"),
        }
        state.loaded = true;
    }

    async fn read_records(&self) -> Result<Vec<ConversationRecord>, MessagingError> {
        match self.storage.get(CONVERSATIONS_KEY).await? {
            Some(bytes) if !bytes.is_empty() => Ok(serde_json::from_slice(&bytes)?),
            _ => Ok(Vec::new()),
        }
    }

    /// Stores every conversation with `staged` in place of its cached
    /// version, then swaps it into the cache
    async fn commit(&self, state: &mut MessagingState, staged: ConversationRecord) -> Result<(), MessagingError> {
        let id = staged.conversation.id;
        let bytes = {
            let mut records: Vec<&ConversationRecord> = state
                .records
                .values()
                .filter(|r| r.conversation.id != id)
                .chain(std::iter::once(&staged))
                .collect();
            records.sort_by_key(|r| r.conversation.created_at);
            serde_json::to_vec(&records)?
        };
        self.storage.set(CONVERSATIONS_KEY, bytes).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to save conversations");
            MessagingError::from(e)
        })?;
        state.records.insert(id, staged);
        Ok(())
    }

    /// Returns the claim's conversation, creating it on first use
    ///
    /// Participants missing from an existing conversation are added.
    pub async fn create_conversation(
        &self,
        claim_id: ClaimId,
        participants: Vec<UserId>,
        now: DateTime<Utc>,
    ) -> Result<Conversation, MessagingError> {
        let mut state = self.state.write().await;
        self.ensure_loaded(&mut state).await;

        let existing = state
            .records
            .values()
            .find(|r| r.conversation.claim_id == claim_id)
            .cloned();

        let staged = match existing {
            Some(mut record) => {
                let mut changed = false;
                for user in participants {
                    changed |= record.conversation.add_participant(user);
                }
                if !changed {
                    return Ok(record.conversation);
                }
                record.conversation.updated_at = now;
                record
            }
            None => ConversationRecord {
                conversation: Conversation::new(claim_id, participants, now),
                messages: Vec::new(),
            },
        };

        let conversation = staged.conversation.clone();
        let created = !state.records.contains_key(&conversation.id);
        self.commit(&mut state, staged).await?;
        if created {
            tracing::info!(conversation_id = %conversation.id, claim_id = %claim_id, "Conversation created");
        }
        Ok(conversation)
    }

    pub async fn conversation_for_claim(&self, claim_id: ClaimId) -> Option<Conversation> {
        let mut state = self.state.write().await;
        self.ensure_loaded(&mut state).await;
        state
            .records
            .values()
            .find(|r| r.conversation.claim_id == claim_id)
            .map(|r| r.conversation.clone())
    }

    /// Conversations `user` takes part in, most recently active first
    pub async fn conversations_for_user(&self, user: UserId) -> Vec<Conversation> {
        let mut state = self.state.write().await;
        self.ensure_loaded(&mut state).await;
        let mut conversations: Vec<Conversation> = state
            .records
            .values()
            .filter(|r| r.conversation.is_participant(user))
            .map(|r| r.conversation.clone())
            .collect();
        conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        conversations
    }

    /// Posts a message and notifies the other participants
    ///
    /// # Errors
    ///
    /// * `NotParticipant` - `sender` is not in the conversation
    /// * `EmptyMessage` - neither text nor attachments
    pub async fn send_message(
        &self,
        conversation_id: ConversationId,
        sender: UserId,
        text: impl Into<String>,
        attachments: Vec<Attachment>,
        now: DateTime<Utc>,
    ) -> Result<Message, MessagingError> {
        let text = text.into();
        if text.trim().is_empty() && attachments.is_empty() {
            return Err(MessagingError::EmptyMessage);
        }

        let mut state = self.state.write().await;
        self.ensure_loaded(&mut state).await;

        let mut record = state.record(conversation_id)?.clone();
        if !record.conversation.is_participant(sender) {
            tracing::warn!(conversation_id = %conversation_id, sender = %sender, "Message from non-participant rejected");
            return Err(MessagingError::not_participant(conversation_id, sender));
        }

        let message = Message::new(conversation_id, sender, text, attachments, now);
        record.conversation.record_message(&message);
        record.messages.push(message.clone());
        let recipients: Vec<UserId> = record.conversation.recipients_of(sender).collect();
        let claim_id = record.conversation.claim_id;

        self.commit(&mut state, record).await?;
        drop(state);

        tracing::info!(conversation_id = %conversation_id, message_id = %message.id, "Message sent");
        self.notify_recipients(&message, claim_id, &recipients).await;
        Ok(message)
    }

    async fn notify_recipients(&self, message: &Message, claim_id: ClaimId, recipients: &[UserId]) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        for recipient in recipients {
            let notification = Notification::new(NotificationChannel::Messages, "New Message", message.preview())
                .to(*recipient)
                .with_data(json!({
                    "conversation_id": message.conversation_id,
                    "message_id": message.id,
                    "claim_id": claim_id,
                }));
            if let Err(e) = notifier.dispatch(notification).await {
                tracing::warn!(message_id = %message.id, error = %e, "Failed to dispatch message notification");
            }
        }
    }

    /// Messages in send order
    pub async fn messages(&self, conversation_id: ConversationId) -> Result<Vec<Message>, MessagingError> {
        let mut state = self.state.write().await;
        self.ensure_loaded(&mut state).await;
        Ok(state.record(conversation_id)?.messages.clone())
    }

    async fn advance_for(
        &self,
        conversation_id: ConversationId,
        user: UserId,
        status: MessageStatus,
        now: DateTime<Utc>,
    ) -> Result<usize, MessagingError> {
        let mut state = self.state.write().await;
        self.ensure_loaded(&mut state).await;

        let mut record = state.record(conversation_id)?.clone();
        if !record.conversation.is_participant(user) {
            return Err(MessagingError::not_participant(conversation_id, user));
        }
        let changed = record
            .messages
            .iter_mut()
            .filter(|m| m.sender_id != user)
            .map(|m| m.advance(status, now))
            .filter(|advanced| *advanced)
            .count();
        if status == MessageStatus::Read {
            record.conversation.clear_unread(user);
        }

        self.commit(&mut state, record).await?;
        tracing::debug!(conversation_id = %conversation_id, user = %user, changed, "Message status updated");
        Ok(changed)
    }

    /// Marks messages from others as delivered to `recipient`; returns how many changed
    pub async fn mark_delivered(
        &self,
        conversation_id: ConversationId,
        recipient: UserId,
        now: DateTime<Utc>,
    ) -> Result<usize, MessagingError> {
        self.advance_for(conversation_id, recipient, MessageStatus::Delivered, now).await
    }

    /// Marks messages from others as read and clears `reader`'s unread count
    pub async fn mark_read(
        &self,
        conversation_id: ConversationId,
        reader: UserId,
        now: DateTime<Utc>,
    ) -> Result<usize, MessagingError> {
        self.advance_for(conversation_id, reader, MessageStatus::Read, now).await
    }

    /// Unread messages for `user` across all conversations
    pub async fn total_unread(&self, user: UserId) -> u32 {
        let mut state = self.state.write().await;
        self.ensure_loaded(&mut state).await;
        state
            .records
            .values()
            .map(|r| r.conversation.unread_for(user))
            .sum()
    }
}
