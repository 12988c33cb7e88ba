//! Diffs a fresh catalog fetch against the persisted snapshot.

use crate::changes::Change;
use crate::variants::{Snapshot, Variant};

/// Output of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Transitions in fresh-fetch order.
    pub changes: Vec<Change>,
    /// Full replacement for the persisted snapshot.
    pub snapshot: Snapshot,
    /// `true` when the previous snapshot was empty and changes were suppressed.
    pub first_run: bool,
}

/// Computes the changes between `fresh` and `previous` and the snapshot to
/// persist next.
///
/// - First run (empty `previous`): no changes, snapshot = `fresh`.
/// - Unknown id: [`Change::NewVariant`].
/// - `available` true→false: [`Change::SoldOut`]; false→true: [`Change::Restocked`].
/// - Ids missing from `fresh` drop out of the new snapshot without an event.
///
/// Duplicate ids in `fresh` are each compared against `previous`; the last
/// occurrence wins in the new snapshot.
///
/// Callers must not pass an empty `fresh` for a non-empty store: an empty
/// fetch is a fetch failure, not a store with every variant removed.
#[must_use]
pub fn reconcile(fresh: Vec<Variant>, previous: &Snapshot) -> Reconciliation {
    let first_run = previous.is_first_run();
    let mut changes = Vec::new();

    if !first_run {
        for variant in &fresh {
            match previous.get(&variant.variant_id) {
                None => changes.push(Change::NewVariant(variant.clone())),
                Some(old) if old.available && !variant.available => {
                    changes.push(Change::SoldOut(variant.clone()));
                }
                Some(old) if !old.available && variant.available => {
                    changes.push(Change::Restocked(variant.clone()));
                }
                Some(_) => {}
            }
        }
    }

    Reconciliation {
        changes,
        snapshot: Snapshot::from_variants(fresh),
        first_run,
    }
}
