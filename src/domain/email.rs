//! Email views used for classification.
//!
//! An [`EmailView`] is the normalized, read-only snapshot of a message that
//! classifiers consume. It is built once per message and never mutated.

use serde::{Deserialize, Serialize};

/// Normalized view over the text of one email.
///
/// The accessors [`subject`](Self::subject), [`body`](Self::body) and
/// [`sender`](Self::sender) return case-folded text for keyword matching.
/// The `original_*` accessors return the text as received, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailView {
    original_subject: String,
    original_body: String,
    original_sender: String,
    subject: String,
    body: String,
    sender: String,
}

impl EmailView {
    /// Builds a view from raw subject, body and sender text.
    ///
    /// Empty strings are valid; the view is simply empty in those fields.
    pub fn new(
        subject: impl Into<String>,
        body: impl Into<String>,
        sender: impl Into<String>,
    ) -> Self {
        let original_subject = subject.into();
        let original_body = body.into();
        let original_sender = sender.into();

        Self {
            subject: original_subject.to_lowercase(),
            body: original_body.to_lowercase(),
            sender: original_sender.to_lowercase(),
            original_subject,
            original_body,
            original_sender,
        }
    }

    /// Lowercased subject.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Lowercased body.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Lowercased sender header value.
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Subject as received.
    pub fn original_subject(&self) -> &str {
        &self.original_subject
    }

    /// Body as received.
    pub fn original_body(&self) -> &str {
        &self.original_body
    }

    /// Sender as received.
    pub fn original_sender(&self) -> &str {
        &self.original_sender
    }

    /// Text fed to the learned classifier: subject, body and sender joined
    /// by single spaces, in that order.
    ///
    /// Training examples derived from views use the same string, so the
    /// feature space matches between training and inference.
    pub fn feature_text(&self) -> String {
        format!(
            "{} {} {}",
            self.original_subject, self.original_body, self.original_sender
        )
    }
}
