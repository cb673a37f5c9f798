//! Label domain types.
//!
//! Represents mailbox labels and the built-in label IDs the agent applies.

use serde::{Deserialize, Serialize};

use super::LabelId;

/// A mailbox label as reported by the message store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Store-assigned identifier.
    pub id: LabelId,
    /// Display name of the label.
    pub name: String,
    /// Whether this is a built-in label (INBOX, SPAM, ...).
    pub is_system: bool,
}

/// Visibility flags sent when creating a label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelVisibility {
    /// Visibility in the label list.
    pub label_list_visibility: String,
    /// Visibility of the label on messages in the message list.
    pub message_list_visibility: String,
}

impl LabelVisibility {
    /// Label listed in the sidebar and shown on messages.
    pub fn shown() -> Self {
        Self {
            label_list_visibility: "labelShow".to_string(),
            message_list_visibility: "show".to_string(),
        }
    }
}

impl Default for LabelVisibility {
    fn default() -> Self {
        Self::shown()
    }
}

/// Well-known built-in label IDs.
pub mod system_labels {
    use super::LabelId;

    /// Returns the inbox label ID.
    pub fn inbox() -> LabelId {
        LabelId::from("INBOX")
    }

    /// Returns the spam label ID.
    pub fn spam() -> LabelId {
        LabelId::from("SPAM")
    }

    /// Returns the starred label ID.
    pub fn starred() -> LabelId {
        LabelId::from("STARRED")
    }

    /// Returns the important label ID.
    pub fn important() -> LabelId {
        LabelId::from("IMPORTANT")
    }

    /// Returns the unread label ID.
    pub fn unread() -> LabelId {
        LabelId::from("UNREAD")
    }

    /// Returns the "Personal" inbox tab label ID.
    pub fn category_personal() -> LabelId {
        LabelId::from("CATEGORY_PERSONAL")
    }

    /// Returns the "Updates" inbox tab label ID.
    pub fn category_updates() -> LabelId {
        LabelId::from("CATEGORY_UPDATES")
    }

    /// Returns the "Promotions" inbox tab label ID.
    pub fn category_promotions() -> LabelId {
        LabelId::from("CATEGORY_PROMOTIONS")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_serialization() {
        let label = Label {
            id: LabelId::from("Label_123"),
            name: "Work".to_string(),
            is_system: false,
        };

        let json = serde_json::to_string(&label).unwrap();
        let deserialized: Label = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized, label);
    }

    #[test]
    fn visibility_uses_store_field_names() {
        let json = serde_json::to_value(LabelVisibility::shown()).unwrap();
        assert_eq!(json["labelListVisibility"], "labelShow");
        assert_eq!(json["messageListVisibility"], "show");
    }

    #[test]
    fn system_label_ids() {
        assert_eq!(system_labels::inbox().0, "INBOX");
        assert_eq!(system_labels::spam().0, "SPAM");
        assert_eq!(system_labels::starred().0, "STARRED");
        assert_eq!(system_labels::important().0, "IMPORTANT");
        assert_eq!(system_labels::category_personal().0, "CATEGORY_PERSONAL");
        assert_eq!(system_labels::category_updates().0, "CATEGORY_UPDATES");
        assert_eq!(system_labels::category_promotions().0, "CATEGORY_PROMOTIONS");
    }
}
