//! Email categories.
//!
//! The closed set of outcomes a classifier can produce. Every message lands
//! in exactly one category per classification call.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A category assigned to an email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Work correspondence.
    Work,
    /// Personal correspondence. Also the fallback when no rule matches.
    Personal,
    /// Newsletters and mailing lists.
    Newsletters,
    /// Marketing and promotional offers.
    Promotions,
    /// Mail that needs attention soon.
    Urgent,
    /// Unsolicited junk.
    Spam,
}

/// Error returned when parsing a name outside the category set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl Category {
    /// All categories, in declaration order.
    pub const ALL: [Category; 6] = [
        Category::Work,
        Category::Personal,
        Category::Newsletters,
        Category::Promotions,
        Category::Urgent,
        Category::Spam,
    ];

    /// The category name, which doubles as the custom mailbox label name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Work => "Work",
            Self::Personal => "Personal",
            Self::Newsletters => "Newsletters",
            Self::Promotions => "Promotions",
            Self::Urgent => "Urgent",
            Self::Spam => "Spam",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownCategory;

    /// Parses a category name, ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}
