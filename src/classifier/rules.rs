//! Keyword rule classifier.
//!
//! Evaluates an ordered list of keyword rules against the normalized
//! subject, body and sender of an email. The first rule that matches
//! decides the category; if none match, the email is [`Category::Personal`].

use crate::domain::{Category, EmailView};

use super::Classifier;

/// A single keyword rule.
///
/// The rule matches when any keyword in `subject` occurs in the subject, or
/// any keyword in `body` occurs in the body, or any keyword in `sender`
/// occurs in the sender. Keywords must be lowercase.
#[derive(Debug, Clone, Copy)]
pub struct KeywordRule {
    /// Category produced when the rule matches.
    pub category: Category,
    /// Keywords searched in the subject.
    pub subject: &'static [&'static str],
    /// Keywords searched in the body.
    pub body: &'static [&'static str],
    /// Keywords searched in the sender.
    pub sender: &'static [&'static str],
}

impl KeywordRule {
    /// Returns whether this rule matches the view.
    pub fn matches(&self, view: &EmailView) -> bool {
        contains_any(view.subject(), self.subject)
            || contains_any(view.body(), self.body)
            || contains_any(view.sender(), self.sender)
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

/// Built-in rule table. Order is significant: first match wins.
pub const DEFAULT_RULES: &[KeywordRule] = &[
    KeywordRule {
        category: Category::Urgent,
        subject: &["urgent", "action required"],
        body: &[],
        sender: &[],
    },
    KeywordRule {
        category: Category::Newsletters,
        subject: &["newsletter"],
        body: &["unsubscribe"],
        sender: &[],
    },
    KeywordRule {
        category: Category::Promotions,
        subject: &["promotion", "discount", "sale"],
        body: &[],
        sender: &[],
    },
    KeywordRule {
        category: Category::Spam,
        subject: &["spam"],
        body: &["viagra", "lottery"],
        sender: &[],
    },
    KeywordRule {
        category: Category::Work,
        subject: &["work", "meeting", "project"],
        body: &[],
        sender: &["company.com"],
    },
];

/// Ordered keyword-rule classifier.
#[derive(Debug, Clone, Copy)]
pub struct RuleClassifier {
    rules: &'static [KeywordRule],
    fallback: Category,
}

impl RuleClassifier {
    /// Creates a classifier with the built-in rule table.
    pub fn new() -> Self {
        Self {
            rules: DEFAULT_RULES,
            fallback: Category::Personal,
        }
    }

    /// Returns the rules in evaluation order.
    pub fn rules(&self) -> &[KeywordRule] {
        self.rules
    }
}

impl Default for RuleClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for RuleClassifier {
    fn classify(&self, view: &EmailView) -> Category {
        self.rules
            .iter()
            .find(|rule| rule.matches(view))
            .map_or(self.fallback, |rule| rule.category)
    }

    fn name(&self) -> &str {
        "rules"
    }
}

/// Normalizes the raw fields and classifies them with the built-in rules.
pub fn classify_rule_based(subject: &str, body: &str, sender: &str) -> Category {
    RuleClassifier::new().classify(&EmailView::new(subject, body, sender))
}
