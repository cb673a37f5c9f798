//! Message store trait definition.
//!
//! This module defines the [`MessageStore`] trait the agent uses to list,
//! fetch and relabel messages and to manage labels. The classification core
//! never talks to a mailbox directly; it only produces plans that a store
//! executes.

use async_trait::async_trait;

use crate::domain::{EmailId, Label, LabelVisibility, MessageRef, MutationPlan, RemoteMessage};

/// Result type alias for message store operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Errors that can occur during message store operations.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Authentication failed or credentials expired.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Network or connection error.
    #[error("connection error: {0}")]
    Connection(String),

    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs:?} seconds")]
    RateLimited {
        /// Seconds to wait before retrying, if known.
        retry_after_secs: Option<u64>,
    },

    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid request or parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// How much of a message to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageFormat {
    /// Headers and decoded body.
    Full,
    /// Only the named headers, plus labels and date.
    Metadata(Vec<String>),
}

impl MessageFormat {
    /// Metadata format restricted to the given header names.
    pub fn metadata<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Metadata(headers.into_iter().map(Into::into).collect())
    }
}

/// A remote mailbox the agent can read from and apply plans to.
///
/// Query strings (`is:unread`, `before:2024/01/31 -in:inbox -is:starred`,
/// `after:2024/01/30 is:important`, ...) are passed through unchanged; their
/// grammar belongs to the store.
///
/// # Example
///
/// ```ignore
/// use inbox_agent::providers::email::{MessageStore, MessageFormat};
///
/// async fn print_unread(store: &impl MessageStore) -> Result<()> {
///     for message_ref in store.list_messages("is:unread").await? {
///         let msg = store.get_message(&message_ref.id, MessageFormat::Full).await?;
///         println!("{:?}", msg.subject);
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Lists messages matching `query`.
    async fn list_messages(&self, query: &str) -> Result<Vec<MessageRef>>;

    /// Fetches one message.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NotFound`] if the message does not exist.
    async fn get_message(&self, id: &EmailId, format: MessageFormat) -> Result<RemoteMessage>;

    /// Adds and removes labels on a message as described by `plan`.
    async fn apply_mutation(&self, id: &EmailId, plan: &MutationPlan) -> Result<()>;

    /// Lists all labels, built-in and user-created.
    async fn list_labels(&self) -> Result<Vec<Label>>;

    /// Creates a user label.
    async fn create_label(&self, name: &str, visibility: &LabelVisibility) -> Result<Label>;
}
