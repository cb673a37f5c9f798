//! Domain layer types for the inbox agent.
//!
//! This module contains the core domain types shared by the classifiers,
//! the planner and the message store: identifiers, categories, email views,
//! labels, remote messages and mutation plans.

mod category;
mod email;
mod label;
mod message;
mod plan;
mod types;

pub use category::{Category, UnknownCategory};
pub use email::EmailView;
pub use label::{system_labels, Label, LabelVisibility};
pub use message::{MessageRef, RemoteMessage};
pub use plan::MutationPlan;
pub use types::{AccountId, EmailId, LabelId};
