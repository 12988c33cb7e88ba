//! Store-wide lock (password page) state machine.
//!
//! A probe that disagrees with the persisted state is never committed on its
//! own. [`evaluate`] returns [`LockStep::Tentative`]; the caller waits the
//! confirmation delay, probes again and hands the second result to
//! [`PendingLockChange::confirm`]. Only a second probe that still disagrees
//! with the original persisted state commits the transition.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::changes::Change;

/// Persisted lock state. `Unknown` means nothing has been recorded yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockStatus {
    Locked,
    Unlocked,
    #[default]
    Unknown,
}

impl LockStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Unlocked => "unlocked",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for LockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LockStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "locked" => Ok(Self::Locked),
            "unlocked" => Ok(Self::Unlocked),
            "unknown" => Ok(Self::Unknown),
            other => Err(format!("unrecognized lock status \"{other}\"")),
        }
    }
}

/// Result of a single storefront probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LockProbe {
    Locked,
    Unlocked,
    /// The probe itself failed (network error, 5xx). Never commits anything.
    Unknown,
}

impl LockProbe {
    /// The definite status this probe observed, `None` for a failed probe.
    #[must_use]
    pub fn observed(self) -> Option<LockStatus> {
        match self {
            Self::Locked => Some(LockStatus::Locked),
            Self::Unlocked => Some(LockStatus::Unlocked),
            Self::Unknown => None,
        }
    }
}

impl From<bool> for LockProbe {
    fn from(locked: bool) -> Self {
        if locked {
            Self::Locked
        } else {
            Self::Unlocked
        }
    }
}

/// Outcome of a settled evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LockDecision {
    /// `true` only for a confirmed transition between two definite states.
    pub changed: bool,
    /// Persisted state before the evaluation.
    pub previous: LockStatus,
    /// State observed by the deciding probe (`previous` when nothing definite was seen).
    pub current: LockStatus,
    /// State to persist. Equal to `previous` unless a transition or a baseline was committed.
    pub persisted: LockStatus,
}

impl LockDecision {
    fn unchanged(previous: LockStatus, current: LockStatus) -> Self {
        Self {
            changed: false,
            previous,
            current,
            persisted: previous,
        }
    }

    /// `true` when the persisted record must be written.
    #[must_use]
    pub fn needs_persist(&self) -> bool {
        self.persisted != self.previous
    }

    /// The change event to notify, present only for confirmed transitions.
    #[must_use]
    pub fn change(&self) -> Option<Change> {
        self.changed.then_some(Change::LockStateChanged {
            from: self.previous,
            to: self.current,
        })
    }
}

/// A probe disagreed with the persisted state and awaits confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PendingLockChange {
    pub previous: LockStatus,
    pub observed: LockStatus,
}

impl PendingLockChange {
    /// Settles a confirmation whose baseline has moved since it was scheduled.
    ///
    /// Returns `None` while `persisted` still equals the state this change was
    /// measured against. Otherwise another confirmation already committed (or
    /// rewrote) the state, and this one settles unchanged without an event.
    #[must_use]
    pub fn superseded_by(&self, persisted: LockStatus) -> Option<LockDecision> {
        (persisted != self.previous).then(|| LockDecision::unchanged(persisted, persisted))
    }

    /// Applies the confirmation probe.
    ///
    /// Commits only when the second probe is definite and still disagrees
    /// with the original persisted state. A reverted or failed probe leaves
    /// the persisted state untouched and emits nothing.
    #[must_use]
    pub fn confirm(self, second: LockProbe) -> LockDecision {
        match second.observed() {
            Some(current) if current != self.previous => LockDecision {
                changed: true,
                previous: self.previous,
                current,
                persisted: current,
            },
            Some(current) => LockDecision::unchanged(self.previous, current),
            None => LockDecision::unchanged(self.previous, self.previous),
        }
    }
}

/// Result of the first probe evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStep {
    Settled(LockDecision),
    Tentative(PendingLockChange),
}

/// Evaluates a fresh probe against the persisted lock state.
///
/// With nothing persisted yet, a definite probe becomes the baseline: it is
/// persisted without a change event, mirroring first-run suppression for the
/// catalog.
#[must_use]
pub fn evaluate(probe: LockProbe, persisted: LockStatus) -> LockStep {
    let Some(observed) = probe.observed() else {
        return LockStep::Settled(LockDecision::unchanged(persisted, persisted));
    };

    if persisted == LockStatus::Unknown {
        return LockStep::Settled(LockDecision {
            changed: false,
            previous: persisted,
            current: observed,
            persisted: observed,
        });
    }

    if observed == persisted {
        return LockStep::Settled(LockDecision::unchanged(persisted, observed));
    }

    LockStep::Tentative(PendingLockChange {
        previous: persisted,
        observed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(step: LockStep) -> PendingLockChange {
        match step {
            LockStep::Tentative(p) => p,
            LockStep::Settled(d) => panic!("expected tentative step, got settled: {d:?}"),
        }
    }

    fn settled(step: LockStep) -> LockDecision {
        match step {
            LockStep::Settled(d) => d,
            LockStep::Tentative(p) => panic!("expected settled step, got tentative: {p:?}"),
        }
    }

    #[test]
    fn confirmed_lock_commits_and_emits_one_change() {
        let p = pending(evaluate(LockProbe::Locked, LockStatus::Unlocked));
        let decision = p.confirm(LockProbe::Locked);

        assert!(decision.changed);
        assert_eq!(decision.persisted, LockStatus::Locked);
        assert!(decision.needs_persist());
        assert_eq!(
            decision.change(),
            Some(Change::LockStateChanged {
                from: LockStatus::Unlocked,
                to: LockStatus::Locked,
            })
        );
    }

    #[test]
    fn reverted_probe_is_debounced() {
        let p = pending(evaluate(LockProbe::Locked, LockStatus::Unlocked));
        let decision = p.confirm(LockProbe::Unlocked);

        assert!(!decision.changed);
        assert_eq!(decision.persisted, LockStatus::Unlocked);
        assert!(!decision.needs_persist());
        assert!(decision.change().is_none());
    }

    #[test]
    fn unlock_transition_is_confirmed_the_same_way() {
        let p = pending(evaluate(LockProbe::Unlocked, LockStatus::Locked));
        let decision = p.confirm(LockProbe::Unlocked);
        assert!(decision.changed);
        assert_eq!(decision.previous, LockStatus::Locked);
        assert_eq!(decision.current, LockStatus::Unlocked);
    }

    #[test]
    fn failed_confirmation_probe_does_not_commit() {
        let p = pending(evaluate(LockProbe::Locked, LockStatus::Unlocked));
        let decision = p.confirm(LockProbe::Unknown);
        assert!(!decision.changed);
        assert_eq!(decision.persisted, LockStatus::Unlocked);
    }

    #[test]
    fn unknown_probe_never_transitions_or_overwrites() {
        for persisted in [LockStatus::Locked, LockStatus::Unlocked, LockStatus::Unknown] {
            let decision = settled(evaluate(LockProbe::Unknown, persisted));
            assert!(!decision.changed);
            assert_eq!(decision.persisted, persisted);
            assert!(!decision.needs_persist());
        }
    }

    #[test]
    fn confirmation_is_superseded_once_the_state_moved() {
        let p = pending(evaluate(LockProbe::Locked, LockStatus::Unlocked));
        assert!(p.superseded_by(LockStatus::Unlocked).is_none());

        let decision = p
            .superseded_by(LockStatus::Locked)
            .expect("state already committed by an earlier confirmation");
        assert!(!decision.changed);
        assert_eq!(decision.persisted, LockStatus::Locked);
        assert!(!decision.needs_persist());
        assert!(decision.change().is_none());
    }

    #[test]
    fn matching_probe_is_steady() {
        let decision = settled(evaluate(LockProbe::Locked, LockStatus::Locked));
        assert!(!decision.changed);
        assert!(!decision.needs_persist());
    }

    #[test]
    fn first_definite_probe_becomes_silent_baseline() {
        let decision = settled(evaluate(LockProbe::Locked, LockStatus::Unknown));
        assert!(!decision.changed);
        assert_eq!(decision.persisted, LockStatus::Locked);
        assert!(decision.needs_persist());
        assert!(decision.change().is_none());
    }

    #[test]
    fn lock_status_parses_stored_text() {
        assert_eq!("locked".parse::<LockStatus>().unwrap(), LockStatus::Locked);
        assert_eq!(
            "unlocked".parse::<LockStatus>().unwrap(),
            LockStatus::Unlocked
        );
        assert!("True".parse::<LockStatus>().is_err());
    }
}
