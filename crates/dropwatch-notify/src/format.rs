//! Message text for each [`Change`].
//!
//! Length is measured the way X counts a post: every link costs
//! [`LINK_WIDTH`] characters whatever its real length. Only the product title
//! is ever shortened; the prefix, size, price, link and timestamp are kept
//! whole, which configuration guarantees fit within the ceiling.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use dropwatch_core::{Change, LockStatus, SizeLabel, Variant};
use regex::Regex;

/// Default post ceiling.
pub const DEFAULT_MAX_CHARS: usize = 280;

/// Width charged for any `http(s)://` link.
pub const LINK_WIDTH: usize = 23;

/// Timestamp suffix format. Keeps otherwise identical posts distinct.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

const ELLIPSIS: &str = "...";

static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("valid link regex"));

/// Length of `text` with every link counted as [`LINK_WIDTH`].
#[must_use]
pub fn weighted_len(text: &str) -> usize {
    let mut len = text.chars().count();
    for link in LINK.find_iter(text) {
        len = len - link.as_str().chars().count() + LINK_WIDTH;
    }
    len
}

/// Shortens `title` to at most `budget` characters, ending in `"..."` when cut.
#[must_use]
pub fn truncate_title(title: &str, budget: usize) -> String {
    if title.chars().count() <= budget {
        return title.to_owned();
    }
    if budget <= ELLIPSIS.len() {
        return ELLIPSIS.chars().take(budget).collect();
    }
    let kept: String = title.chars().take(budget - ELLIPSIS.len()).collect();
    format!("{}{ELLIPSIS}", kept.trim_end())
}

/// Formats changes into post text.
#[derive(Debug, Clone)]
pub struct MessageFormatter {
    store_url: String,
    max_chars: usize,
}

impl MessageFormatter {
    /// `store_url` is the link used in lock-state messages.
    #[must_use]
    pub fn new(store_url: impl Into<String>, max_chars: usize) -> Self {
        Self {
            store_url: store_url.into(),
            max_chars,
        }
    }

    #[must_use]
    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Builds the post for `change`, stamped with `at`.
    #[must_use]
    pub fn format(&self, change: &Change, at: DateTime<Utc>) -> String {
        let stamp = format!("\n{}", at.format(TIMESTAMP_FORMAT));
        match change {
            Change::NewVariant(v) => self.variant_message("NEW: ", v, true, &stamp),
            Change::SoldOut(v) => self.variant_message("SOLD OUT: ", v, false, &stamp),
            Change::Restocked(v) => self.variant_message("RESTOCKED: ", v, true, &stamp),
            Change::LockStateChanged { to, .. } => {
                let headline = match to {
                    LockStatus::Locked => "STORE LOCKED: password page is up",
                    LockStatus::Unlocked => "STORE UNLOCKED: storefront is open",
                    LockStatus::Unknown => "STORE STATUS UNKNOWN:",
                };
                format!("{headline} {}{stamp}", self.store_url)
            }
        }
    }

    fn variant_message(&self, prefix: &str, v: &Variant, with_price: bool, stamp: &str) -> String {
        let mut details = String::new();
        if v.size_label != SizeLabel::Unrecognized {
            details.push_str(&format!(" [{}]", v.size_label));
        }
        if with_price && !v.price.is_empty() {
            details.push_str(&format!(" ${}", v.price));
        }
        let tail = format!("{details} {}{stamp}", v.url);

        let fixed = weighted_len(prefix) + weighted_len(&tail);
        if fixed >= self.max_chars {
            tracing::warn!(
                fixed,
                max_chars = self.max_chars,
                variant_id = %v.variant_id,
                "message ceiling leaves no room for the product title"
            );
        }
        let budget = self.max_chars.saturating_sub(fixed);
        let title = truncate_title(&v.product_title, budget);
        format!("{prefix}{title}{tail}")
    }
}
