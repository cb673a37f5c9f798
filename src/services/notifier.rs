//! Digest rendering and delivery.
//!
//! Provides:
//! - [`NotificationSink`], the fire-and-forget channel the agent reports to
//! - [`SlackNotifier`], a sink posting to a Slack channel
//! - [`DailyDigest`], the daily summary of important mail

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::NotificationSettings;

const SLACK_POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

/// Errors that can occur while delivering a notification.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// Token or channel missing.
    #[error("notification sink not configured: {0}")]
    NotConfigured(String),

    /// Network failure or unreadable response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The channel rejected the message.
    #[error("notification API error: {0}")]
    Api(String),
}

/// Result type for notification operations.
pub type NotificationResult<T> = Result<T, NotificationError>;

/// A channel that accepts plain-text reports.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Delivers `text`.
    async fn send(&self, text: &str) -> NotificationResult<()>;
}

#[derive(Debug, Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    ts: Option<String>,
    error: Option<String>,
}

/// Posts messages to a Slack channel with a bot token.
pub struct SlackNotifier {
    client: reqwest::Client,
    token: String,
    channel: String,
}

impl SlackNotifier {
    /// Creates a notifier posting to `channel` with a bot `token`.
    pub fn new(token: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: token.into(),
            channel: channel.into(),
        }
    }

    /// Builds a notifier from the environment variables named in `settings`.
    ///
    /// The channel falls back to `settings.slack_channel_id`. Returns `None`
    /// if either the token or the channel is missing or blank.
    pub fn from_settings(settings: &NotificationSettings) -> Option<Self> {
        let env_value = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let token = env_value(&settings.slack_token_env)?;
        let channel = env_value(&settings.slack_channel_env).or_else(|| {
            settings
                .slack_channel_id
                .clone()
                .filter(|c| !c.trim().is_empty())
        })?;

        Some(Self::new(token, channel))
    }

    /// Channel ID messages are posted to.
    pub fn channel(&self) -> &str {
        &self.channel
    }
}

#[async_trait]
impl NotificationSink for SlackNotifier {
    async fn send(&self, text: &str) -> NotificationResult<()> {
        let body = PostMessageRequest {
            channel: &self.channel,
            text,
        };

        let response: PostMessageResponse = self
            .client
            .post(SLACK_POST_MESSAGE_URL)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?
            .json()
            .await
            .map_err(|e| NotificationError::Transport(format!("parse response: {}", e)))?;

        if !response.ok {
            return Err(NotificationError::Api(
                response.error.unwrap_or_else(|| "unknown_error".to_string()),
            ));
        }

        tracing::info!(channel = %self.channel, ts = ?response.ts, "digest posted to Slack");
        Ok(())
    }
}

/// One important message in the digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestEntry {
    /// `Subject` header, empty if missing.
    pub subject: String,
    /// `From` header, empty if missing.
    pub sender: String,
}

/// Daily summary of important mail from the last 24 hours.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use inbox_agent::services::DailyDigest;
///
/// let mut digest = DailyDigest::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
/// digest.record_listing(1);
/// digest.push("Quarterly review", "boss@company.com");
///
/// assert_eq!(
///     digest.render(),
///     "Daily Email Summary - 2024-03-01\n\n\
///      Important Emails (last 24 hours):\n\
///      - Subject: Quarterly review, From: boss@company.com\n"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyDigest {
    date: NaiveDate,
    listed: Option<usize>,
    entries: Vec<DigestEntry>,
    error: Option<String>,
}

impl DailyDigest {
    /// Store query for important mail received since yesterday.
    pub fn query(today: NaiveDate) -> String {
        format!(
            "after:{} is:important",
            (today - Duration::days(1)).format("%Y/%m/%d")
        )
    }

    /// Creates an empty digest for `date`. Until a listing is recorded,
    /// only the header renders.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            listed: None,
            entries: Vec::new(),
            error: None,
        }
    }

    /// Records how many important messages the query returned.
    pub fn record_listing(&mut self, count: usize) {
        self.listed = Some(count);
    }

    /// Adds one important message.
    pub fn push(&mut self, subject: impl Into<String>, sender: impl Into<String>) {
        self.entries.push(DigestEntry {
            subject: subject.into(),
            sender: sender.into(),
        });
    }

    /// Records a retrieval failure. Entries gathered so far are kept.
    pub fn record_error(&mut self, error: impl std::fmt::Display) {
        self.error = Some(error.to_string());
    }

    /// Messages collected so far.
    pub fn entries(&self) -> &[DigestEntry] {
        &self.entries
    }

    /// Renders the digest as plain text.
    pub fn render(&self) -> String {
        let mut text = format!("Daily Email Summary - {}\n\n", self.date.format("%Y-%m-%d"));

        match self.listed {
            Some(0) => text.push_str("No important emails in the last 24 hours.\n"),
            Some(_) => {
                text.push_str("Important Emails (last 24 hours):\n");
                for entry in &self.entries {
                    text.push_str(&format!(
                        "- Subject: {}, From: {}\n",
                        entry.subject, entry.sender
                    ));
                }
            }
            None => {}
        }

        if let Some(error) = &self.error {
            text.push_str(&format!("Error retrieving important emails: {}\n", error));
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn digest_query_uses_yesterday() {
        assert_eq!(DailyDigest::query(day()), "after:2024/02/29 is:important");
    }

    #[test]
    fn empty_digest() {
        let mut digest = DailyDigest::new(day());
        digest.record_listing(0);

        assert_eq!(
            digest.render(),
            "Daily Email Summary - 2024-03-01\n\nNo important emails in the last 24 hours.\n"
        );
    }

    #[test]
    fn digest_with_entries() {
        let mut digest = DailyDigest::new(day());
        digest.record_listing(2);
        digest.push("Server down", "ops@company.com");
        digest.push("Review", "Boss <boss@company.com>");

        assert_eq!(
            digest.render(),
            "Daily Email Summary - 2024-03-01\n\n\
             Important Emails (last 24 hours):\n\
             - Subject: Server down, From: ops@company.com\n\
             - Subject: Review, From: Boss <boss@company.com>\n"
        );
    }

    #[test]
    fn listing_failure() {
        let mut digest = DailyDigest::new(day());
        digest.record_error("connection error: timed out");

        assert_eq!(
            digest.render(),
            "Daily Email Summary - 2024-03-01\n\n\
             Error retrieving important emails: connection error: timed out\n"
        );
    }

    #[test]
    fn failure_after_partial_listing_keeps_entries() {
        let mut digest = DailyDigest::new(day());
        digest.record_listing(2);
        digest.push("Server down", "ops@company.com");
        digest.record_error("not found: msg-2");

        let text = digest.render();
        assert!(text.contains("- Subject: Server down, From: ops@company.com\n"));
        assert!(text.ends_with("Error retrieving important emails: not found: msg-2\n"));
    }

    #[test]
    fn slack_notifier_requires_token_and_channel() {
        let settings = NotificationSettings {
            slack_token_env: "INBOX_AGENT_TEST_MISSING_TOKEN".to_string(),
            slack_channel_env: "INBOX_AGENT_TEST_MISSING_CHANNEL".to_string(),
            slack_channel_id: Some("C123".to_string()),
            ..NotificationSettings::default()
        };

        assert!(SlackNotifier::from_settings(&settings).is_none());
    }

    #[test]
    fn slack_channel_falls_back_to_settings() {
        std::env::set_var("INBOX_AGENT_TEST_TOKEN_PRESENT", "xoxb-test");
        let settings = NotificationSettings {
            slack_token_env: "INBOX_AGENT_TEST_TOKEN_PRESENT".to_string(),
            slack_channel_env: "INBOX_AGENT_TEST_CHANNEL_UNSET".to_string(),
            slack_channel_id: Some("C123".to_string()),
            ..NotificationSettings::default()
        };

        let notifier = SlackNotifier::from_settings(&settings).unwrap();
        assert_eq!(notifier.channel(), "C123");

        let without_channel = NotificationSettings {
            slack_channel_id: None,
            ..settings
        };
        assert!(SlackNotifier::from_settings(&without_channel).is_none());
    }

    #[test]
    fn post_message_request_shape() {
        let json = serde_json::to_value(PostMessageRequest {
            channel: "C123",
            text: "hello",
        })
        .unwrap();

        assert_eq!(json, serde_json::json!({"channel": "C123", "text": "hello"}));
    }

    #[test]
    fn slack_error_response_parses() {
        let response: PostMessageResponse =
            serde_json::from_str(r#"{"ok": false, "error": "channel_not_found"}"#).unwrap();

        assert!(!response.ok);
        assert_eq!(response.error.as_deref(), Some("channel_not_found"));
    }

    #[tokio::test]
    async fn mock_sink_receives_text() {
        let mut sink = MockNotificationSink::new();
        sink.expect_send()
            .withf(|text| text.starts_with("Daily Email Summary"))
            .times(1)
            .returning(|_| Ok(()));

        let mut digest = DailyDigest::new(day());
        digest.record_listing(0);
        sink.send(&digest.render()).await.unwrap();
    }
}
