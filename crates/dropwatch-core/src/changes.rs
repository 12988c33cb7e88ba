use serde::Serialize;

use crate::lock::LockStatus;
use crate::variants::Variant;

/// A detected state transition, consumed by the notifier and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Change {
    /// A variant id not present in the previous snapshot.
    NewVariant(Variant),
    /// `available` went from `true` to `false`.
    SoldOut(Variant),
    /// `available` went from `false` to `true`.
    Restocked(Variant),
    /// A confirmed store-wide lock transition.
    LockStateChanged { from: LockStatus, to: LockStatus },
}

impl Change {
    /// Short machine-readable kind, used as a structured log field.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NewVariant(_) => "new_variant",
            Self::SoldOut(_) => "sold_out",
            Self::Restocked(_) => "restocked",
            Self::LockStateChanged { .. } => "lock_state_changed",
        }
    }

    /// The variant this change concerns, if any.
    #[must_use]
    pub fn variant(&self) -> Option<&Variant> {
        match self {
            Self::NewVariant(v) | Self::SoldOut(v) | Self::Restocked(v) => Some(v),
            Self::LockStateChanged { .. } => None,
        }
    }
}
