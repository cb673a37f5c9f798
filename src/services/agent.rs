//! Batch driver.
//!
//! [`InboxAgent`] runs one processing pass over a mailbox: classify and file
//! unread mail, archive old mail, star mail from key contacts, then send the
//! daily digest.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::action_planner::{plan_for, ArchivePolicy, KeyContacts};
use super::label_registry::LabelRegistry;
use super::notifier::{DailyDigest, NotificationSink};
use crate::classifier::Classifier;
use crate::config::ActionSettings;
use crate::domain::{Category, EmailId};
use crate::providers::email::{MessageFormat, MessageStore, ProviderError};

/// Query selecting unread mail.
pub const UNREAD_QUERY: &str = "is:unread";

/// Outcome of one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Unread messages classified and filed.
    pub processed: usize,
    /// Messages that could not be fetched or updated.
    pub failed: usize,
    /// Filed messages per category.
    pub by_category: BTreeMap<Category, usize>,
    /// Old messages archived.
    pub archived: usize,
    /// Messages starred for key contacts.
    pub flagged: usize,
    /// Whether the digest reached the notification sink.
    pub digest_sent: bool,
}

/// Runs processing passes against a message store.
///
/// # Example
///
/// ```ignore
/// let agent = InboxAgent::new(store, Box::new(RuleClassifier::default()))
///     .with_actions(&settings.actions)
///     .with_notifier(Box::new(slack));
///
/// let report = agent.run_pass().await;
/// ```
pub struct InboxAgent<S: MessageStore + ?Sized> {
    store: Arc<S>,
    classifier: Box<dyn Classifier>,
    registry: LabelRegistry<S>,
    archive: Option<ArchivePolicy>,
    key_contacts: KeyContacts,
    notifier: Option<Box<dyn NotificationSink>>,
}

impl<S: MessageStore + ?Sized> InboxAgent<S> {
    /// Creates an agent that only classifies and files unread mail.
    pub fn new(store: Arc<S>, classifier: Box<dyn Classifier>) -> Self {
        Self {
            registry: LabelRegistry::new(store.clone()),
            store,
            classifier,
            archive: None,
            key_contacts: KeyContacts::default(),
            notifier: None,
        }
    }

    /// Enables archiving and key-contact flagging as configured.
    pub fn with_actions(mut self, actions: &ActionSettings) -> Self {
        self.archive = actions
            .archive_old
            .then(|| ArchivePolicy::new(actions.archive_after_days));
        self.key_contacts = if actions.flag_key_contacts {
            KeyContacts::new(&actions.key_contacts)
        } else {
            KeyContacts::default()
        };
        self
    }

    /// Archives old mail with `policy`.
    pub fn with_archive_policy(mut self, policy: ArchivePolicy) -> Self {
        self.archive = Some(policy);
        self
    }

    /// Stars unread mail from `contacts`. An empty list disables flagging.
    pub fn with_key_contacts(mut self, contacts: KeyContacts) -> Self {
        self.key_contacts = contacts;
        self
    }

    /// Sends the digest to `notifier` at the end of each pass.
    pub fn with_notifier(mut self, notifier: Box<dyn NotificationSink>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Runs one pass at the current time.
    pub async fn run_pass(&self) -> PassReport {
        self.run_pass_at(Utc::now()).await
    }

    /// Runs one pass as if the current time were `now`.
    ///
    /// Per-message failures are logged and counted; they never stop the pass.
    pub async fn run_pass_at(&self, now: DateTime<Utc>) -> PassReport {
        tracing::info!(classifier = self.classifier.name(), "starting inbox pass");
        let mut report = PassReport::default();

        self.process_unread(&mut report).await;

        if let Some(policy) = &self.archive {
            self.archive_old(policy, now, &mut report).await;
        }

        if !self.key_contacts.is_empty() {
            self.flag_key_contacts(&mut report).await;
        }

        report.digest_sent = self.send_digest(now).await;

        tracing::info!(
            processed = report.processed,
            failed = report.failed,
            archived = report.archived,
            flagged = report.flagged,
            digest_sent = report.digest_sent,
            "inbox pass finished"
        );
        report
    }

    async fn process_unread(&self, report: &mut PassReport) {
        let refs = match self.store.list_messages(UNREAD_QUERY).await {
            Ok(refs) => refs,
            Err(e) => {
                tracing::error!(error = %e, "failed to list unread messages");
                return;
            }
        };

        tracing::info!(count = refs.len(), "processing unread messages");
        for message_ref in refs {
            match self.process_message(&message_ref.id).await {
                Ok(category) => {
                    report.processed += 1;
                    *report.by_category.entry(category).or_default() += 1;
                }
                Err(e) => {
                    tracing::warn!(message_id = %message_ref.id, error = %e, "failed to process message");
                    report.failed += 1;
                }
            }
        }
    }

    /// Classifies one message and applies its plan.
    async fn process_message(&self, id: &EmailId) -> Result<Category, ProviderError> {
        let message = self.store.get_message(id, MessageFormat::Full).await?;
        let category = self.classifier.classify(&message.view());

        let label = self.registry.resolve_category(category).await;
        let plan = plan_for(category, label);
        self.store.apply_mutation(id, &plan).await?;

        tracing::debug!(
            message_id = %id,
            category = %category,
            subject = message.subject.as_deref().unwrap_or_default(),
            "message filed"
        );
        Ok(category)
    }

    async fn archive_old(&self, policy: &ArchivePolicy, now: DateTime<Utc>, report: &mut PassReport) {
        let query = policy.query(now.date_naive());
        let refs = match self.store.list_messages(&query).await {
            Ok(refs) => refs,
            Err(e) => {
                tracing::error!(error = %e, query = %query, "failed to list archive candidates");
                return;
            }
        };

        for message_ref in refs {
            match self.archive_one(policy, &message_ref.id, now).await {
                Ok(true) => report.archived += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(message_id = %message_ref.id, error = %e, "failed to archive message");
                    report.failed += 1;
                }
            }
        }

        tracing::info!(archived = report.archived, "archived old messages");
    }

    async fn flag_key_contacts(&self, report: &mut PassReport) {
        let refs = match self.store.list_messages(UNREAD_QUERY).await {
            Ok(refs) => refs,
            Err(e) => {
                tracing::error!(error = %e, "failed to list unread messages for flagging");
                return;
            }
        };

        for message_ref in refs {
            match self.flag_one(&message_ref.id).await {
                Ok(true) => report.flagged += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(message_id = %message_ref.id, error = %e, "failed to flag message");
                    report.failed += 1;
                }
            }
        }

        tracing::info!(flagged = report.flagged, "flagged key-contact messages");
    }

    /// Archives `id` if it is eligible. Returns whether it was archived.
    async fn archive_one(
        &self,
        policy: &ArchivePolicy,
        id: &EmailId,
        now: DateTime<Utc>,
    ) -> Result<bool, ProviderError> {
        let message = self
            .store
            .get_message(id, MessageFormat::metadata(Vec::<String>::new()))
            .await?;
        if !policy.is_eligible(&message, now) {
            return Ok(false);
        }

        self.store.apply_mutation(id, &policy.plan()).await?;
        Ok(true)
    }

    /// Stars `id` if it is unread mail from a key contact. Returns whether it
    /// was starred.
    async fn flag_one(&self, id: &EmailId) -> Result<bool, ProviderError> {
        let message = self
            .store
            .get_message(id, MessageFormat::metadata(["From"]))
            .await?;
        let sender = message.from.as_deref().unwrap_or_default();
        if !self.key_contacts.should_flag(message.is_unread(), sender) {
            return Ok(false);
        }

        self.store
            .apply_mutation(id, &self.key_contacts.flag_plan())
            .await?;
        Ok(true)
    }

    /// Collects important mail from the last day into a digest.
    pub async fn build_digest(&self, now: DateTime<Utc>) -> DailyDigest {
        let today = now.date_naive();
        let mut digest = DailyDigest::new(today);

        let refs = match self.store.list_messages(&DailyDigest::query(today)).await {
            Ok(refs) => refs,
            Err(e) => {
                tracing::error!(error = %e, "failed to list important messages");
                digest.record_error(e);
                return digest;
            }
        };

        digest.record_listing(refs.len());
        for message_ref in refs {
            match self
                .store
                .get_message(&message_ref.id, MessageFormat::metadata(["From", "Subject"]))
                .await
            {
                Ok(message) => digest.push(
                    message.subject.unwrap_or_default(),
                    message.from.unwrap_or_default(),
                ),
                Err(e) => {
                    tracing::error!(message_id = %message_ref.id, error = %e, "failed to fetch important message");
                    digest.record_error(e);
                    break;
                }
            }
        }
        digest
    }

    async fn send_digest(&self, now: DateTime<Utc>) -> bool {
        let Some(notifier) = &self.notifier else {
            tracing::warn!("no notification sink configured, skipping digest");
            return false;
        };

        let digest = self.build_digest(now).await;
        match notifier.send(&digest.render()).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "failed to send digest");
                false
            }
        }
    }
}
