//! Mailbox action decisions.
//!
//! Pure functions from classification results and message metadata to
//! [`MutationPlan`]s. Nothing here touches the store or can fail.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::domain::{system_labels, Category, LabelId, MutationPlan, RemoteMessage};

/// Date format used in store search queries.
const QUERY_DATE_FORMAT: &str = "%Y/%m/%d";

/// Builds the mutation plan for a classified message.
///
/// The plan always removes the message from the inbox and adds the built-in
/// tag for `category`, plus `custom_label` when one was resolved.
///
/// Work mail is tagged `CATEGORY_PERSONAL`, the same as Personal mail.
pub fn plan_for(category: Category, custom_label: Option<LabelId>) -> MutationPlan {
    let mut plan = MutationPlan::new()
        .add(builtin_label(category))
        .remove(system_labels::inbox());

    if let Some(label) = custom_label {
        plan = plan.add(label);
    }
    plan
}

fn builtin_label(category: Category) -> LabelId {
    match category {
        Category::Work | Category::Personal => system_labels::category_personal(),
        Category::Newsletters => system_labels::category_updates(),
        Category::Promotions => system_labels::category_promotions(),
        Category::Urgent => system_labels::important(),
        Category::Spam => system_labels::spam(),
    }
}

/// Archival of old mail that already left the inbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchivePolicy {
    /// Minimum age in days.
    pub threshold_days: u32,
}

impl Default for ArchivePolicy {
    fn default() -> Self {
        Self { threshold_days: 30 }
    }
}

impl ArchivePolicy {
    /// Creates a policy with the given age threshold.
    pub fn new(threshold_days: u32) -> Self {
        Self { threshold_days }
    }

    fn threshold(&self) -> Duration {
        Duration::days(i64::from(self.threshold_days))
    }

    /// Last day (exclusive) a message may be dated to qualify. Saturates at
    /// [`NaiveDate::MIN`] for thresholds reaching past the calendar range.
    pub fn cutoff(&self, today: NaiveDate) -> NaiveDate {
        today
            .checked_sub_signed(self.threshold())
            .unwrap_or(NaiveDate::MIN)
    }

    /// Store query selecting candidates, e.g.
    /// `before:2024/01/01 -in:inbox -is:starred`.
    pub fn query(&self, today: NaiveDate) -> String {
        format!(
            "before:{} -in:inbox -is:starred",
            self.cutoff(today).format(QUERY_DATE_FORMAT)
        )
    }

    /// Whether `message` is older than the threshold, not starred and not in
    /// the inbox.
    pub fn is_eligible(&self, message: &RemoteMessage, now: DateTime<Utc>) -> bool {
        // Nothing predates a cutoff outside the representable range.
        let older = now
            .checked_sub_signed(self.threshold())
            .is_some_and(|cutoff| message.date < cutoff);
        older && !message.is_starred() && !message.in_inbox()
    }

    /// Plan applied to an eligible message.
    pub fn plan(&self) -> MutationPlan {
        MutationPlan::new().remove(system_labels::inbox())
    }
}

/// Senders whose unread mail gets starred.
///
/// Matching is a case-insensitive substring test, so `company.com` matches
/// `boss@company.com` and also `notcompany.com.evil.net`. Entries are used
/// verbatim apart from case: surrounding whitespace is significant and an
/// empty entry matches every sender.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyContacts {
    entries: Vec<String>,
}

impl KeyContacts {
    /// Builds the contact list.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|e| e.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Whether the list has no entries, in which case nothing is flagged.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `sender` contains any contact entry.
    pub fn matches(&self, sender: &str) -> bool {
        let sender = sender.to_lowercase();
        self.entries.iter().any(|entry| sender.contains(entry.as_str()))
    }

    /// Whether a message should be starred.
    pub fn should_flag(&self, is_unread: bool, sender: &str) -> bool {
        is_unread && self.matches(sender)
    }

    /// Plan applied to a flagged message.
    pub fn flag_plan(&self) -> MutationPlan {
        MutationPlan::new().add(system_labels::starred())
    }
}
