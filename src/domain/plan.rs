//! Mutation plans.
//!
//! A [`MutationPlan`] is the complete set of label changes to apply to one
//! message. Plans are built by the action planner and executed by the
//! message store.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::LabelId;

/// Labels to add to and remove from a single message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationPlan {
    /// Labels to add.
    pub add_label_ids: BTreeSet<LabelId>,
    /// Labels to remove.
    pub remove_label_ids: BTreeSet<LabelId>,
}

impl MutationPlan {
    /// Creates an empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a label to the add set.
    pub fn add(mut self, label: LabelId) -> Self {
        self.add_label_ids.insert(label);
        self
    }

    /// Adds a label to the remove set.
    pub fn remove(mut self, label: LabelId) -> Self {
        self.remove_label_ids.insert(label);
        self
    }

    /// Returns whether the plan changes nothing.
    pub fn is_empty(&self) -> bool {
        self.add_label_ids.is_empty() && self.remove_label_ids.is_empty()
    }
}
