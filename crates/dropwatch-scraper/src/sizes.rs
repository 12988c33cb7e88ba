//! Size normalization for apparel variant titles.
//!
//! Storefronts label sizes inconsistently (`"Small"`, `"2X-Large / Black"`,
//! `"XL"`, `"Extra Large"`). Everything is folded into a [`SizeLabel`].

use std::sync::LazyLock;

use dropwatch_core::SizeLabel;
use regex::Regex;

static TOKEN_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid token split regex"));

/// Substrings that mark a size as extra-large. Each one names the size in
/// full, so a bare `"extra"` (`"Extra Long"`) never counts.
const EXTRA_MARKERS: [&str; 5] = ["x-large", "x large", "xlarge", "extra large", "extra-large"];

/// Substrings that mark a size as double-extra-large. Checked before the
/// single-extra markers, which they contain (`"XX-Large"`).
const DOUBLE_MARKERS: [&str; 6] = [
    "xx-large",
    "xx large",
    "xxlarge",
    "2x",
    "extra extra",
    "extra-extra",
];

/// Maps a free-text variant label to a canonical size.
///
/// Word forms are matched first (case-insensitive substring, first match
/// wins): small, medium, large, extra-large, double-extra-large. When none
/// match, whole abbreviation tokens (`S`, `M`, `L`, `XL`, `XXL`, `2XL`) are
/// tried. Anything else is [`SizeLabel::Unrecognized`].
#[must_use]
pub fn normalize_size(label: &str) -> SizeLabel {
    let lower = label.to_lowercase();

    if lower.contains("small") {
        return SizeLabel::Small;
    }
    if lower.contains("medium") {
        return SizeLabel::Medium;
    }

    let double = DOUBLE_MARKERS.iter().any(|m| lower.contains(m));
    let extra = EXTRA_MARKERS.iter().any(|m| lower.contains(m));

    if lower.contains("large") && !extra && !double {
        return SizeLabel::Large;
    }
    if extra && !double {
        return SizeLabel::ExtraLarge;
    }
    if double {
        return SizeLabel::DoubleExtraLarge;
    }

    normalize_size_token(&lower)
}

/// Abbreviation fallback: the first whole token that is a known size.
fn normalize_size_token(lower: &str) -> SizeLabel {
    TOKEN_SPLIT
        .split(lower)
        .find_map(|token| match token {
            "s" => Some(SizeLabel::Small),
            "m" => Some(SizeLabel::Medium),
            "l" => Some(SizeLabel::Large),
            "xl" => Some(SizeLabel::ExtraLarge),
            "xxl" | "2xl" => Some(SizeLabel::DoubleExtraLarge),
            _ => None,
        })
        .unwrap_or(SizeLabel::Unrecognized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_x_large_is_double_extra_not_extra() {
        assert_eq!(normalize_size("2X-Large"), SizeLabel::DoubleExtraLarge);
        assert_eq!(normalize_size("XX-Large"), SizeLabel::DoubleExtraLarge);
        assert_eq!(normalize_size("Extra Extra Large"), SizeLabel::DoubleExtraLarge);
    }

    #[test]
    fn word_forms() {
        assert_eq!(normalize_size("Small / Red"), SizeLabel::Small);
        assert_eq!(normalize_size("MEDIUM"), SizeLabel::Medium);
        assert_eq!(normalize_size("Large"), SizeLabel::Large);
        assert_eq!(normalize_size("X-Large"), SizeLabel::ExtraLarge);
        assert_eq!(normalize_size("Extra Large"), SizeLabel::ExtraLarge);
        assert_eq!(normalize_size("x large / black"), SizeLabel::ExtraLarge);
    }

    #[test]
    fn abbreviation_fallback() {
        assert_eq!(normalize_size("S"), SizeLabel::Small);
        assert_eq!(normalize_size("L / Black"), SizeLabel::Large);
        assert_eq!(normalize_size("XL"), SizeLabel::ExtraLarge);
        assert_eq!(normalize_size("Black / 2XL"), SizeLabel::DoubleExtraLarge);
        assert_eq!(normalize_size("XXL"), SizeLabel::DoubleExtraLarge);
    }

    #[test]
    fn unrecognized_labels_are_empty() {
        assert_eq!(normalize_size("One Size"), SizeLabel::Unrecognized);
        assert_eq!(normalize_size("Default Title"), SizeLabel::Unrecognized);
        assert_eq!(normalize_size(""), SizeLabel::Unrecognized);
        assert_eq!(normalize_size("One Size").as_str(), "");
    }

    #[test]
    fn extra_without_large_is_not_a_size() {
        assert_eq!(normalize_size("Tall / Extra Long"), SizeLabel::Unrecognized);
        assert_eq!(normalize_size("Large / Extra Long"), SizeLabel::Large);
        assert_eq!(normalize_size("Extra-Large / Tall"), SizeLabel::ExtraLarge);
    }

    #[test]
    fn xxs_is_not_double_extra_large() {
        assert_eq!(normalize_size("XXS"), SizeLabel::Unrecognized);
        assert_eq!(normalize_size("XX Large"), SizeLabel::DoubleExtraLarge);
        assert_eq!(normalize_size("2XL / Navy"), SizeLabel::DoubleExtraLarge);
    }

    #[test]
    fn abbreviations_inside_words_do_not_match() {
        assert_eq!(normalize_size("Slim Fit"), SizeLabel::Unrecognized);
        assert_eq!(normalize_size("Mug"), SizeLabel::Unrecognized);
    }
}
