//! Message store implementations.
//!
//! This module contains the [`MessageStore`] trait and its Gmail API
//! implementation, [`GmailProvider`].
//!
//! # Architecture
//!
//! The agent never calls a mailbox API directly. Classification and planning
//! produce [`MutationPlan`](crate::domain::MutationPlan)s; a store lists and
//! fetches messages, applies plans, and manages labels.

mod gmail;
mod traits;

pub use gmail::{GmailCredentials, GmailProvider};
pub use traits::{MessageFormat, MessageStore, ProviderError, Result};
