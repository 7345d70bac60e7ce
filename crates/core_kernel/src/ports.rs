//! Ports and Adapters Infrastructure
//!
//! The domain crates never touch storage or delivery mechanisms directly.
//! They talk to the two ports defined here:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │     ClaimStore / AppointmentBook / MessagingService      │
//! └──────────────────────────────────────────────────────────┘
//!                │                              │
//!                ▼                              ▼
//!        ┌───────────────┐             ┌──────────────────┐
//!        │ KeyValueStore │             │ NotificationPort │
//!        └───────────────┘             └──────────────────┘
//!         ▲      ▲      ▲                 ▲            ▲
//!   memory   file   postgres           logging     recording
//! ```
//!
//! The in-memory and notification adapters live here so every crate can use
//! them in tests; the file and PostgreSQL stores live in `infra_db`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::identifiers::UserId;

/// Error type for port operations
///
/// Provides a unified error type that all port implementations must use,
/// ensuring consistent error handling across adapters.
#[derive(Debug, Error)]
pub enum PortError {
    /// The requested entity was not found
    #[error("Not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: String,
        id: String,
    },

    /// A validation error occurred
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// Connection to the underlying system failed
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The operation timed out
    #[error("Timeout after {duration_ms}ms: {operation}")]
    Timeout {
        operation: String,
        duration_ms: u64,
    },

    /// A data transformation error occurred
    #[error("Transformation error: {message}")]
    Transformation {
        message: String,
    },

    /// An internal error occurred
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PortError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Creates a Connection error
    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a Connection error that keeps the underlying cause
    pub fn connection_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        PortError::Connection {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a Transformation error
    pub fn transformation(message: impl Into<String>) -> Self {
        PortError::Transformation {
            message: message.into(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true if this error indicates a transient failure that may succeed on retry
    pub fn is_transient(&self) -> bool {
        matches!(self, PortError::Connection { .. } | PortError::Timeout { .. })
    }

    /// Returns true if this error indicates the entity was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }
}

/// Marker trait for all domain ports
///
/// All port traits should extend this marker to ensure they are
/// thread-safe and can be used in async contexts.
pub trait DomainPort: Send + Sync + 'static {}

/// Byte-oriented key-value persistence
///
/// Writes replace the stored value wholesale. Reading an absent key yields
/// `Ok(None)`, never an error.
#[async_trait]
pub trait KeyValueStore: DomainPort {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PortError>;

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), PortError>;

    async fn remove(&self, key: &str) -> Result<(), PortError>;
}

/// In-memory [`KeyValueStore`] used by tests and the `memory` storage backend
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    entries: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl DomainPort for MemoryKeyValueStore {}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PortError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), PortError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), PortError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// Delivery channel a notification is posted on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    ClaimUpdates,
    Messages,
    Appointments,
}

impl NotificationChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationChannel::ClaimUpdates => "claim_updates",
            NotificationChannel::Messages => "messages",
            NotificationChannel::Appointments => "appointments",
        }
    }
}

/// A notification ready for dispatch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Target user; `None` broadcasts to whoever is listening on the channel
    pub recipient: Option<UserId>,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub data: serde_json::Value,
    pub channel: NotificationChannel,
}

impl Notification {
    pub fn new(channel: NotificationChannel, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            recipient: None,
            title: title.into(),
            body: body.into(),
            data: serde_json::Value::Null,
            channel,
        }
    }

    pub fn to(mut self, recipient: UserId) -> Self {
        self.recipient = Some(recipient);
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}

/// Outbound notification delivery
///
/// Callers decide when to notify; how delivery happens is up to the adapter.
#[async_trait]
pub trait NotificationPort: DomainPort {
    async fn dispatch(&self, notification: Notification) -> Result<(), PortError>;
}

/// Writes notifications to the tracing log
#[derive(Debug, Clone, Default)]
pub struct LoggingNotifier;

impl DomainPort for LoggingNotifier {}

#[async_trait]
impl NotificationPort for LoggingNotifier {
    async fn dispatch(&self, notification: Notification) -> Result<(), PortError> {
        tracing::info!(
            channel = notification.channel.as_str(),
            recipient = ?notification.recipient,
            title = %notification.title,
            "Notification dispatched"
        );
        Ok(())
    }
}

/// Keeps every dispatched notification in memory
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<RwLock<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.read().await.clone()
    }

    pub async fn clear(&self) {
        self.sent.write().await.clear();
    }
}

impl DomainPort for RecordingNotifier {}

#[async_trait]
impl NotificationPort for RecordingNotifier {
    async fn dispatch(&self, notification: Notification) -> Result<(), PortError> {
        self.sent.write().await.push(notification);
        Ok(())
    }
}
