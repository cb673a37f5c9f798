//! Bundled fallback training corpus.

use crate::domain::Category;

use super::TrainingExample;

const FALLBACK_CORPUS: &[(&str, Category)] = &[
    ("Urgent: Project Deadline", Category::Urgent),
    ("Weekly Tech Newsletter", Category::Newsletters),
    ("Great Discount on Shoes!", Category::Promotions),
    ("Hello from your friend", Category::Personal),
    ("You won a lottery!", Category::Spam),
    ("Meeting Agenda", Category::Work),
    ("Important: Review Document", Category::Urgent),
    ("Daily News Digest", Category::Newsletters),
    ("Save big on your next purchase", Category::Promotions),
    ("Family vacation photos", Category::Personal),
    ("Unsubscribe from this list", Category::Newsletters),
    ("Your order has shipped", Category::Promotions),
    ("Action Required: Account Security", Category::Urgent),
    ("Team Sync Meeting", Category::Work),
    ("Regarding your recent inquiry", Category::Work),
    ("FW: Important Update", Category::Work),
    ("Your bill is due", Category::Urgent),
    ("Friendship request", Category::Personal),
    ("Exclusive offer for you", Category::Promotions),
    ("Click here to win", Category::Spam),
];

/// Labeled subject lines used when no persisted model exists.
pub fn fallback_corpus() -> Vec<TrainingExample> {
    FALLBACK_CORPUS
        .iter()
        .map(|(text, label)| TrainingExample::new(*text, *label))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn corpus_covers_every_category() {
        let corpus = fallback_corpus();
        assert_eq!(corpus.len(), 20);

        let labels: BTreeSet<Category> = corpus.iter().map(|e| e.label).collect();
        assert_eq!(labels.len(), Category::ALL.len());
    }
}
