use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical size token derived from a free-text variant title.
///
/// Serialized as the bare token (`"S"`, `"XL"`, ...); an unrecognized label
/// serializes as the empty string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SizeLabel {
    #[serde(rename = "S")]
    Small,
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "L")]
    Large,
    #[serde(rename = "XL")]
    ExtraLarge,
    #[serde(rename = "XXL")]
    DoubleExtraLarge,
    #[default]
    #[serde(rename = "")]
    Unrecognized,
}

impl SizeLabel {
    /// The canonical token, `""` for [`SizeLabel::Unrecognized`].
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Small => "S",
            Self::Medium => "M",
            Self::Large => "L",
            Self::ExtraLarge => "XL",
            Self::DoubleExtraLarge => "XXL",
            Self::Unrecognized => "",
        }
    }

    #[must_use]
    pub fn is_recognized(self) -> bool {
        self != Self::Unrecognized
    }

    /// Parses a stored token back into a label. Unknown tokens map to
    /// [`SizeLabel::Unrecognized`].
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        match token {
            "S" => Self::Small,
            "M" => Self::Medium,
            "L" => Self::Large,
            "XL" => Self::ExtraLarge,
            "XXL" => Self::DoubleExtraLarge,
            _ => Self::Unrecognized,
        }
    }
}

impl fmt::Display for SizeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One purchasable unit of a storefront product, flattened with the
/// descriptive fields of its parent product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    /// Storefront numeric variant ID, carried as a string. Sole diff key.
    pub variant_id: String,
    pub product_title: String,
    /// Product category string; may be empty.
    pub product_type: String,
    pub size_label: SizeLabel,
    /// In-stock flag at fetch time.
    pub available: bool,
    /// Price as a decimal string exactly as the storefront returns it, e.g. `"45.00"`.
    /// Display only; never compared.
    pub price: String,
    /// Deep link to the variant, e.g. `"https://shop.example/products/tee?variant=42"`.
    pub url: String,
}

/// Last-observed catalog, keyed by `variant_id`.
///
/// Ordered by id so serialized snapshots and iteration are reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    variants: BTreeMap<String, Variant>,
}

impl Snapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a snapshot from a variant sequence. Later duplicates of the
    /// same `variant_id` replace earlier ones.
    #[must_use]
    pub fn from_variants<I>(variants: I) -> Self
    where
        I: IntoIterator<Item = Variant>,
    {
        let variants = variants
            .into_iter()
            .map(|v| (v.variant_id.clone(), v))
            .collect();
        Self { variants }
    }

    /// `true` when nothing has ever been persisted; reconciliation treats
    /// this as the first run and stays silent.
    #[must_use]
    pub fn is_first_run(&self) -> bool {
        self.variants.is_empty()
    }

    #[must_use]
    pub fn get(&self, variant_id: &str) -> Option<&Variant> {
        self.variants.get(variant_id)
    }

    #[must_use]
    pub fn contains(&self, variant_id: &str) -> bool {
        self.variants.contains_key(variant_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Number of variants currently flagged available.
    #[must_use]
    pub fn available_count(&self) -> usize {
        self.variants.values().filter(|v| v.available).count()
    }

    pub fn variants(&self) -> impl Iterator<Item = &Variant> {
        self.variants.values()
    }

    #[must_use]
    pub fn into_variants(self) -> Vec<Variant> {
        self.variants.into_values().collect()
    }
}
