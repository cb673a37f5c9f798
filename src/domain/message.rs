//! Messages as returned by the message store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{system_labels, EmailId, EmailView, LabelId};

/// Reference to a message returned by a list query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    /// Store-assigned message identifier.
    pub id: EmailId,
}

/// A message fetched from the store.
///
/// Fields the fetch format did not request are left empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteMessage {
    /// Store-assigned message identifier.
    pub id: EmailId,
    /// `Subject` header, if present.
    pub subject: Option<String>,
    /// `From` header, if present.
    pub from: Option<String>,
    /// Plain-text body, if fetched and present.
    pub body_text: Option<String>,
    /// Labels currently on the message.
    pub label_ids: Vec<LabelId>,
    /// When the store received the message.
    pub date: DateTime<Utc>,
}

impl RemoteMessage {
    /// Builds the classification view. Missing fields become empty strings.
    pub fn view(&self) -> EmailView {
        EmailView::new(
            self.subject.clone().unwrap_or_default(),
            self.body_text.clone().unwrap_or_default(),
            self.from.clone().unwrap_or_default(),
        )
    }

    /// Returns whether the message carries the given label.
    pub fn has_label(&self, label: &LabelId) -> bool {
        self.label_ids.contains(label)
    }

    /// Returns whether the message is unread.
    pub fn is_unread(&self) -> bool {
        self.has_label(&system_labels::unread())
    }

    /// Returns whether the message is starred.
    pub fn is_starred(&self) -> bool {
        self.has_label(&system_labels::starred())
    }

    /// Returns whether the message is in the inbox.
    pub fn in_inbox(&self) -> bool {
        self.has_label(&system_labels::inbox())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(labels: &[&str]) -> RemoteMessage {
        RemoteMessage {
            id: EmailId::from("msg-1"),
            subject: Some("Meeting Agenda".to_string()),
            from: None,
            body_text: None,
            label_ids: labels.iter().map(|l| LabelId::from(*l)).collect(),
            date: Utc::now(),
        }
    }

    #[test]
    fn label_state_helpers() {
        let msg = message(&["INBOX", "UNREAD"]);
        assert!(msg.in_inbox());
        assert!(msg.is_unread());
        assert!(!msg.is_starred());
    }

    #[test]
    fn view_fills_missing_fields_with_empty_text() {
        let view = message(&[]).view();
        assert_eq!(view.subject(), "meeting agenda");
        assert_eq!(view.body(), "");
        assert_eq!(view.sender(), "");
    }
}
