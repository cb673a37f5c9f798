//! Decision and orchestration services.
//!
//! # Architecture
//!
//! ```text
//!   CLI (main.rs)
//!        |
//!        v
//!   InboxAgent  --- Classifier (classifier)
//!        |
//!        +-- LabelRegistry + action planner  -> MutationPlan
//!        +-- DailyDigest -> NotificationSink
//!        |
//!        v
//!   MessageStore (providers::email)
//! ```
//!
//! # Services Overview
//!
//! - [`LabelRegistry`]: resolves category names to mailbox labels, creating them once
//! - [`plan_for`], [`ArchivePolicy`], [`KeyContacts`]: pure mutation-plan decisions
//! - [`NotificationSink`], [`SlackNotifier`], [`DailyDigest`]: digest rendering and delivery
//! - [`InboxAgent`]: runs one processing pass and reports a [`PassReport`]

mod action_planner;
mod agent;
mod label_registry;
mod notifier;

pub use action_planner::{plan_for, ArchivePolicy, KeyContacts};
pub use agent::{InboxAgent, PassReport, UNREAD_QUERY};
pub use label_registry::LabelRegistry;
pub use notifier::{
    DailyDigest, DigestEntry, NotificationError, NotificationResult, NotificationSink,
    SlackNotifier,
};
