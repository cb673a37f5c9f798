//! inbox-agent - A batch inbox-automation agent
//!
//! This crate classifies unread mail into a fixed set of categories, turns
//! each decision into a mailbox mutation plan, and runs passes that file,
//! archive and star messages before posting a daily digest.

pub mod classifier;
pub mod config;
pub mod domain;
pub mod providers;
pub mod services;

pub use services::{InboxAgent, PassReport};
