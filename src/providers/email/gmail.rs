//! Gmail API message store.
//!
//! This module provides a [`MessageStore`] implementation on top of the
//! Gmail REST API.
//!
//! # Authentication
//!
//! OAuth credentials (client ID, client secret and a refresh token obtained
//! out of band) are stored as JSON in the system keychain, referenced by
//! account ID. [`GmailProvider::authenticate`] exchanges the refresh token
//! for an access token; there is no interactive consent flow here.
//!
//! # API Usage
//!
//! This provider uses the Gmail API v1:
//! - `users.messages.list` for queries
//! - `users.messages.get` for full and metadata fetches
//! - `users.messages.modify` for applying mutation plans
//! - `users.labels.list` / `users.labels.create` for label management

use async_trait::async_trait;
use base64::prelude::*;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};

use super::{MessageFormat, MessageStore, ProviderError, Result};
use crate::domain::{
    AccountId, EmailId, Label, LabelId, LabelVisibility, MessageRef, MutationPlan, RemoteMessage,
};

const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const KEYRING_SERVICE: &str = "inbox-agent";

/// Gmail API message list response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageListResponse {
    messages: Option<Vec<GmailMessageRef>>,
    next_page_token: Option<String>,
}

/// Gmail API message reference.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailMessageRef {
    id: String,
}

/// Gmail API message.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailMessage {
    id: String,
    label_ids: Option<Vec<String>>,
    payload: Option<GmailMessagePayload>,
    internal_date: Option<String>,
}

/// Gmail message payload (headers and body parts).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailMessagePayload {
    headers: Option<Vec<GmailHeader>>,
    parts: Option<Vec<GmailPart>>,
    body: Option<GmailBody>,
}

/// Gmail message header.
#[derive(Debug, Deserialize)]
struct GmailHeader {
    name: String,
    value: String,
}

/// Gmail message part (for multipart messages).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailPart {
    mime_type: Option<String>,
    body: Option<GmailBody>,
    parts: Option<Vec<GmailPart>>,
}

/// Gmail message body.
#[derive(Debug, Deserialize)]
struct GmailBody {
    data: Option<String>,
}

/// Gmail API label.
#[derive(Debug, Deserialize)]
struct GmailLabel {
    id: String,
    name: String,
    #[serde(rename = "type")]
    label_type: Option<String>,
}

/// Gmail labels list response.
#[derive(Debug, Deserialize)]
struct LabelsListResponse {
    labels: Option<Vec<GmailLabel>>,
}

/// Gmail label create request body.
#[derive(Debug, Serialize)]
struct CreateLabelRequest<'a> {
    name: &'a str,
    #[serde(flatten)]
    visibility: &'a LabelVisibility,
}

/// Gmail modify request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ModifyRequest {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    add_label_ids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    remove_label_ids: Vec<String>,
}

impl From<&MutationPlan> for ModifyRequest {
    fn from(plan: &MutationPlan) -> Self {
        Self {
            add_label_ids: plan.add_label_ids.iter().map(|l| l.0.clone()).collect(),
            remove_label_ids: plan.remove_label_ids.iter().map(|l| l.0.clone()).collect(),
        }
    }
}

/// OAuth token response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// OAuth credentials stored in keychain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GmailCredentials {
    /// OAuth refresh token.
    pub refresh_token: String,
    /// OAuth client ID.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
}

/// Gmail API message store.
///
/// # Example
///
/// ```ignore
/// use inbox_agent::providers::email::{GmailProvider, MessageStore};
///
/// let mut provider = GmailProvider::new(account_id);
/// provider.authenticate().await?;
///
/// let unread = provider.list_messages("is:unread").await?;
/// ```
pub struct GmailProvider {
    /// Account ID for keychain credential lookup.
    account_id: AccountId,
    /// HTTP client for API requests.
    client: reqwest::Client,
    /// OAuth credentials.
    credentials: Option<GmailCredentials>,
    /// Current OAuth access token.
    access_token: Option<String>,
}

impl GmailProvider {
    /// Creates a new provider for the specified account.
    ///
    /// The provider is not authenticated until [`authenticate`](Self::authenticate) is called.
    pub fn new(account_id: AccountId) -> Self {
        Self {
            account_id,
            client: reqwest::Client::new(),
            credentials: None,
            access_token: None,
        }
    }

    /// Creates a provider with explicit credentials instead of keychain lookup.
    pub fn with_credentials(account_id: AccountId, credentials: GmailCredentials) -> Self {
        Self {
            credentials: Some(credentials),
            ..Self::new(account_id)
        }
    }

    /// Returns whether an access token is available.
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// Returns the account ID for this provider.
    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    fn keyring_entry(&self) -> Result<keyring::Entry> {
        keyring::Entry::new(KEYRING_SERVICE, &format!("gmail-{}", self.account_id.0))
            .map_err(|e| ProviderError::Authentication(format!("keyring error: {}", e)))
    }

    /// Loads credentials from the system keychain.
    fn load_credentials_from_keychain(&self) -> Result<GmailCredentials> {
        let creds_json = self
            .keyring_entry()?
            .get_password()
            .map_err(|e| ProviderError::Authentication(format!("no credentials found: {}", e)))?;

        serde_json::from_str(&creds_json)
            .map_err(|e| ProviderError::Authentication(format!("invalid credentials: {}", e)))
    }

    /// Saves credentials to the system keychain.
    pub fn save_credentials_to_keychain(&self, credentials: &GmailCredentials) -> Result<()> {
        let creds_json = serde_json::to_string(credentials)
            .map_err(|e| ProviderError::Authentication(format!("serialize error: {}", e)))?;

        self.keyring_entry()?
            .set_password(&creds_json)
            .map_err(|e| ProviderError::Authentication(format!("keyring error: {}", e)))
    }

    /// Loads credentials if needed and exchanges the refresh token for an
    /// access token.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Authentication`] if no credentials are stored
    /// or the token endpoint rejects them.
    pub async fn authenticate(&mut self) -> Result<()> {
        if self.credentials.is_none() {
            self.credentials = Some(self.load_credentials_from_keychain()?);
        }

        self.refresh_access_token().await?;

        tracing::info!(account_id = %self.account_id, "Gmail provider authenticated");
        Ok(())
    }

    /// Refreshes the OAuth access token using the refresh token.
    async fn refresh_access_token(&mut self) -> Result<String> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| ProviderError::Authentication("no credentials available".to_string()))?;

        let params = [
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("refresh_token", credentials.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .client
            .post(GOOGLE_TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Authentication(format!(
                "token refresh failed ({}): {}",
                status, body
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Internal(format!("parse token response: {}", e)))?;

        self.access_token = Some(token_response.access_token.clone());
        Ok(token_response.access_token)
    }

    /// Builds authorization headers for API requests.
    fn auth_headers(&self) -> Result<HeaderMap> {
        let token = self
            .access_token
            .as_ref()
            .ok_or_else(|| ProviderError::Authentication("not authenticated".to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ProviderError::Internal(format!("invalid header: {}", e)))?,
        );
        Ok(headers)
    }

    /// Makes an authenticated GET request to the Gmail API.
    async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", GMAIL_API_BASE, endpoint);
        let headers = self.auth_headers()?;

        let response = self
            .client
            .get(&url)
            .headers(headers)
            .query(query)
            .send()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        self.handle_response(response).await
    }

    /// Makes an authenticated POST request to the Gmail API.
    async fn post<T: for<'de> Deserialize<'de>, B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T> {
        let url = format!("{}{}", GMAIL_API_BASE, endpoint);
        let headers = self.auth_headers()?;

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        self.handle_response(response).await
    }

    /// Handles API response, checking for errors.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        if !response.status().is_success() {
            return Err(self.handle_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::Internal(format!("parse response: {}", e)))
    }

    /// Handles API error responses.
    async fn handle_error(&self, response: reqwest::Response) -> ProviderError {
        let status = response.status();
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            400 => ProviderError::InvalidRequest(body),
            401 | 403 => ProviderError::Authentication(format!("unauthorized: {}", body)),
            404 => ProviderError::NotFound(body),
            429 => ProviderError::RateLimited { retry_after_secs },
            _ => ProviderError::Internal(format!("API error ({}): {}", status, body)),
        }
    }

    /// Decodes a base64url body, tolerating trailing padding.
    fn decode_body_data(data: &str) -> Option<String> {
        BASE64_URL_SAFE_NO_PAD
            .decode(data.trim_end_matches('='))
            .ok()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Extracts the plain-text body from a Gmail message payload.
    ///
    /// The first `text/plain` part wins; a single-part message uses its
    /// direct body.
    fn extract_body(payload: &GmailMessagePayload) -> Option<String> {
        if let Some(parts) = &payload.parts {
            if let Some(text) = Self::extract_text_from_parts(parts) {
                return Some(text);
            }
        }

        payload
            .body
            .as_ref()
            .and_then(|b| b.data.as_deref())
            .and_then(Self::decode_body_data)
    }

    /// Recursively finds the first `text/plain` part.
    fn extract_text_from_parts(parts: &[GmailPart]) -> Option<String> {
        for part in parts {
            if part.mime_type.as_deref() == Some("text/plain") {
                if let Some(text) = part
                    .body
                    .as_ref()
                    .and_then(|b| b.data.as_deref())
                    .and_then(Self::decode_body_data)
                {
                    return Some(text);
                }
            }

            if let Some(nested) = &part.parts {
                if let Some(text) = Self::extract_text_from_parts(nested) {
                    return Some(text);
                }
            }
        }
        None
    }

    /// Converts a Gmail message to a [`RemoteMessage`].
    fn to_remote_message(msg: GmailMessage) -> RemoteMessage {
        let payload = msg.payload.as_ref();
        let get_header = |name: &str| -> Option<String> {
            payload
                .and_then(|p| p.headers.as_ref())
                .and_then(|h| {
                    h.iter()
                        .find(|hdr| hdr.name.eq_ignore_ascii_case(name))
                        .map(|hdr| hdr.value.clone())
                })
        };

        let date = msg
            .internal_date
            .as_ref()
            .and_then(|d| d.parse::<i64>().ok())
            .and_then(DateTime::from_timestamp_millis)
            .unwrap_or_else(Utc::now);

        RemoteMessage {
            subject: get_header("Subject"),
            from: get_header("From"),
            body_text: payload.and_then(Self::extract_body),
            label_ids: msg
                .label_ids
                .unwrap_or_default()
                .into_iter()
                .map(LabelId::from)
                .collect(),
            date,
            id: EmailId::from(msg.id),
        }
    }
}

#[async_trait]
impl MessageStore for GmailProvider {
    async fn list_messages(&self, query: &str) -> Result<Vec<MessageRef>> {
        let mut refs = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![("q", query.to_string())];
            if let Some(token) = page_token.take() {
                params.push(("pageToken", token));
            }

            let response: MessageListResponse = self.get("/messages", &params).await?;
            refs.extend(
                response
                    .messages
                    .unwrap_or_default()
                    .into_iter()
                    .map(|m| MessageRef {
                        id: EmailId::from(m.id),
                    }),
            );

            match response.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!(query, count = refs.len(), "listed messages");
        Ok(refs)
    }

    async fn get_message(&self, id: &EmailId, format: MessageFormat) -> Result<RemoteMessage> {
        let params: Vec<(&str, String)> = match format {
            MessageFormat::Full => vec![("format", "full".to_string())],
            MessageFormat::Metadata(headers) => std::iter::once(("format", "metadata".to_string()))
                .chain(headers.into_iter().map(|h| ("metadataHeaders", h)))
                .collect(),
        };

        let message: GmailMessage = self.get(&format!("/messages/{}", id), &params).await?;
        Ok(Self::to_remote_message(message))
    }

    async fn apply_mutation(&self, id: &EmailId, plan: &MutationPlan) -> Result<()> {
        let body = ModifyRequest::from(plan);
        let _: serde_json::Value = self
            .post(&format!("/messages/{}/modify", id), &body)
            .await?;
        Ok(())
    }

    async fn list_labels(&self) -> Result<Vec<Label>> {
        let response: LabelsListResponse = self.get("/labels", &[]).await?;

        Ok(response
            .labels
            .unwrap_or_default()
            .into_iter()
            .map(|l| Label {
                is_system: l.label_type.as_deref() == Some("system"),
                id: LabelId::from(l.id),
                name: l.name,
            })
            .collect())
    }

    async fn create_label(&self, name: &str, visibility: &LabelVisibility) -> Result<Label> {
        let body = CreateLabelRequest { name, visibility };
        let created: GmailLabel = self.post("/labels", &body).await?;

        tracing::info!(label = %created.name, id = %created.id, "created label");
        Ok(Label {
            is_system: false,
            id: LabelId::from(created.id),
            name: created.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(text: &str) -> String {
        BASE64_URL_SAFE_NO_PAD.encode(text)
    }

    #[test]
    fn gmail_provider_creation() {
        let provider = GmailProvider::new(AccountId::from("me"));
        assert_eq!(provider.account_id().0, "me");
        assert!(!provider.is_authenticated());
    }

    #[tokio::test]
    async fn gmail_provider_requires_auth() {
        let provider = GmailProvider::new(AccountId::from("me"));

        let result = provider.list_messages("is:unread").await;
        assert!(matches!(result, Err(ProviderError::Authentication(_))));

        let result = provider.list_labels().await;
        assert!(matches!(result, Err(ProviderError::Authentication(_))));
    }

    fn credentials() -> GmailCredentials {
        GmailCredentials {
            refresh_token: "1//refresh".to_string(),
            client_id: "client.apps.googleusercontent.com".to_string(),
            client_secret: "secret".to_string(),
        }
    }

    #[tokio::test]
    async fn explicit_credentials_still_need_a_token() {
        let provider = GmailProvider::with_credentials(AccountId::from("work"), credentials());

        assert_eq!(provider.account_id().0, "work");
        assert!(!provider.is_authenticated());

        let result = provider.list_messages("is:unread").await;
        assert!(matches!(result, Err(ProviderError::Authentication(_))));
    }

    #[test]
    fn stored_credentials_json_shape() {
        let json = serde_json::to_value(credentials()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "refresh_token": "1//refresh",
                "client_id": "client.apps.googleusercontent.com",
                "client_secret": "secret",
            })
        );

        let parsed: GmailCredentials = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.refresh_token, "1//refresh");
    }

    #[test]
    fn modify_request_from_plan() {
        let plan = MutationPlan::new()
            .add(LabelId::from("Label_1"))
            .add(LabelId::from("SPAM"))
            .remove(LabelId::from("INBOX"));

        let json = serde_json::to_value(ModifyRequest::from(&plan)).unwrap();
        assert_eq!(json["addLabelIds"], serde_json::json!(["Label_1", "SPAM"]));
        assert_eq!(json["removeLabelIds"], serde_json::json!(["INBOX"]));
    }

    #[test]
    fn modify_request_skips_empty_sets() {
        let plan = MutationPlan::new().remove(LabelId::from("INBOX"));
        let json = serde_json::to_value(ModifyRequest::from(&plan)).unwrap();
        assert!(json.get("addLabelIds").is_none());
    }

    #[test]
    fn create_label_request_flattens_visibility() {
        let visibility = LabelVisibility::shown();
        let body = CreateLabelRequest {
            name: "Work",
            visibility: &visibility,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["name"], "Work");
        assert_eq!(json["labelListVisibility"], "labelShow");
        assert_eq!(json["messageListVisibility"], "show");
    }

    #[test]
    fn converts_multipart_message() {
        let raw = serde_json::json!({
            "id": "msg-1",
            "threadId": "thread-1",
            "labelIds": ["INBOX", "UNREAD"],
            "internalDate": "1700000000000",
            "payload": {
                "mimeType": "multipart/alternative",
                "headers": [
                    {"name": "Subject", "value": "Meeting Agenda"},
                    {"name": "from", "value": "Lead <lead@company.com>"}
                ],
                "parts": [
                    {"mimeType": "text/html", "body": {"data": encode("<p>html</p>")}},
                    {"mimeType": "text/plain", "body": {"data": encode("plain body")}}
                ]
            }
        });

        let message: GmailMessage = serde_json::from_value(raw).unwrap();
        let remote = GmailProvider::to_remote_message(message);

        assert_eq!(remote.id, EmailId::from("msg-1"));
        assert_eq!(remote.subject.as_deref(), Some("Meeting Agenda"));
        assert_eq!(remote.from.as_deref(), Some("Lead <lead@company.com>"));
        assert_eq!(remote.body_text.as_deref(), Some("plain body"));
        assert!(remote.in_inbox());
        assert!(remote.is_unread());
        assert_eq!(remote.date.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn converts_single_part_message_with_padding() {
        let padded = BASE64_URL_SAFE.encode("hi");
        let raw = serde_json::json!({
            "id": "msg-2",
            "payload": {
                "headers": [],
                "body": {"data": padded}
            }
        });

        let message: GmailMessage = serde_json::from_value(raw).unwrap();
        let remote = GmailProvider::to_remote_message(message);

        assert_eq!(remote.body_text.as_deref(), Some("hi"));
        assert!(remote.subject.is_none());
        assert!(remote.label_ids.is_empty());
    }

    #[test]
    fn nested_parts_are_searched() {
        let raw = serde_json::json!({
            "id": "msg-3",
            "payload": {
                "parts": [
                    {
                        "mimeType": "multipart/alternative",
                        "parts": [
                            {"mimeType": "text/plain", "body": {"data": encode("nested")}}
                        ]
                    }
                ]
            }
        });

        let message: GmailMessage = serde_json::from_value(raw).unwrap();
        assert_eq!(
            GmailProvider::to_remote_message(message).body_text.as_deref(),
            Some("nested")
        );
    }
}
