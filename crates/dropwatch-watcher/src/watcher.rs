//! One watch job: a catalog pass and a lock check against a single storefront.
//!
//! Catalog pass: fetch → parse → load snapshot → reconcile → replace snapshot
//! → notify. The snapshot is committed before any notification is sent, so a
//! crash mid-delivery loses messages rather than repeating them.
//!
//! Lock check: probe → evaluate. A probe that disagrees with the persisted
//! state comes back as [`LockCheck::Pending`]; the caller re-checks after
//! [`WatcherSettings::lock_confirm_delay`] with [`Watcher::confirm_lock_check`].

use std::time::Duration;

use chrono::Utc;
use dropwatch_core::{
    evaluate, reconcile, AppConfig, Change, LockDecision, LockStep, PendingLockChange,
};
use dropwatch_db::{LockStateStore, SnapshotStore};
use dropwatch_notify::{MessageFormatter, Notifier};
use dropwatch_scraper::{parse_catalog, LockProber, ScraperError, ShopifyClient};
use serde::Serialize;

use crate::error::WatchError;

/// Job parameters, derived from [`AppConfig`] once at start-up.
#[derive(Debug, Clone)]
pub struct WatcherSettings {
    pub store_url: String,
    pub page_limit: u32,
    pub max_pages: u32,
    pub inter_request_delay_ms: u64,
    pub lock_confirm_delay: Duration,
    pub notify_max_chars: usize,
    /// Skip every store write. Pair with a log-only notifier.
    pub dry_run: bool,
}

impl WatcherSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            store_url: config.store_url.clone(),
            page_limit: config.scraper_page_limit,
            max_pages: config.scraper_max_pages,
            inter_request_delay_ms: config.scraper_inter_request_delay_ms,
            lock_confirm_delay: Duration::from_secs(config.lock_confirm_delay_secs),
            notify_max_chars: config.notify_max_chars,
            dry_run: false,
        }
    }
}

/// Delivery tally for one batch of changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryTally {
    pub sent: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogOutcome {
    Reconciled,
    /// The fetch produced no variants; nothing was compared or written.
    SkippedEmpty,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogReport {
    pub outcome: CatalogOutcome,
    pub pages_fetched: u32,
    pub variants_seen: usize,
    /// `true` when a later page failed or the page cap was hit.
    pub truncated: bool,
    pub first_run: bool,
    pub changes: Vec<Change>,
    pub delivery: DeliveryTally,
}

#[derive(Debug, Clone, Serialize)]
pub struct LockReport {
    pub decision: LockDecision,
    pub delivery: DeliveryTally,
}

/// Result of the first lock probe.
#[derive(Debug, Clone)]
pub enum LockCheck {
    Settled(LockReport),
    Pending(PendingLockChange),
}

pub struct Watcher<S, N> {
    catalog: ShopifyClient,
    prober: LockProber,
    store: S,
    notifier: N,
    formatter: MessageFormatter,
    settings: WatcherSettings,
}

impl<S, N> Watcher<S, N>
where
    S: SnapshotStore + LockStateStore,
    N: Notifier,
{
    #[must_use]
    pub fn new(
        catalog: ShopifyClient,
        prober: LockProber,
        store: S,
        notifier: N,
        settings: WatcherSettings,
    ) -> Self {
        let formatter = MessageFormatter::new(settings.store_url.clone(), settings.notify_max_chars);
        Self {
            catalog,
            prober,
            store,
            notifier,
            formatter,
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &WatcherSettings {
        &self.settings
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Fetches the catalog, reconciles it against the snapshot, commits the
    /// new snapshot and announces the changes.
    ///
    /// # Errors
    ///
    /// - [`WatchError::Fetch`] — the first page failed; nothing was written.
    /// - [`WatchError::Store`] — the snapshot could not be read or replaced;
    ///   no notification was sent.
    pub async fn run_catalog_pass(&self) -> Result<CatalogReport, WatchError> {
        let store_url = self.settings.store_url.as_str();
        let fetch = self
            .catalog
            .fetch_catalog(
                store_url,
                self.settings.page_limit,
                self.settings.max_pages,
                self.settings.inter_request_delay_ms,
            )
            .await?;

        let truncated = !fetch.is_complete();
        if let Some(e) = &fetch.truncated_by {
            tracing::warn!(
                store_url,
                pages_fetched = fetch.pages_fetched,
                error = %e,
                "catalog truncated — reconciling the pages that were fetched"
            );
        }

        let fresh = parse_catalog(&fetch.products, store_url);
        if fresh.is_empty() {
            tracing::warn!(store_url, "catalog fetch returned no variants — skipping reconciliation");
            return Ok(CatalogReport {
                outcome: CatalogOutcome::SkippedEmpty,
                pages_fetched: fetch.pages_fetched,
                variants_seen: 0,
                truncated,
                first_run: false,
                changes: Vec::new(),
                delivery: DeliveryTally::default(),
            });
        }

        let variants_seen = fresh.len();
        let previous = self.store.load().await?;
        let reconciliation = reconcile(fresh, &previous);

        if self.settings.dry_run {
            tracing::info!(
                variants = reconciliation.snapshot.len(),
                "dry run — snapshot not persisted"
            );
        } else {
            self.store.replace(&reconciliation.snapshot).await?;
        }

        if reconciliation.first_run {
            tracing::info!(
                variants = variants_seen,
                "first run — baseline snapshot recorded, notifications suppressed"
            );
        }

        let delivery = self.deliver(&reconciliation.changes).await;
        tracing::info!(
            store_url,
            pages = fetch.pages_fetched,
            variants = variants_seen,
            changes = reconciliation.changes.len(),
            sent = delivery.sent,
            failed = delivery.failed,
            "catalog pass complete"
        );

        Ok(CatalogReport {
            outcome: CatalogOutcome::Reconciled,
            pages_fetched: fetch.pages_fetched,
            variants_seen,
            truncated,
            first_run: reconciliation.first_run,
            changes: reconciliation.changes,
            delivery,
        })
    }

    /// Probes the storefront once and evaluates the result.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Store`] if the lock state cannot be read or written.
    pub async fn begin_lock_check(&self) -> Result<LockCheck, WatchError> {
        let persisted = self.store.load_lock_status().await?;
        let probe = self.prober.probe(&self.settings.store_url).await;

        match evaluate(probe, persisted) {
            LockStep::Settled(decision) => Ok(LockCheck::Settled(self.settle(decision).await?)),
            LockStep::Tentative(pending) => {
                tracing::info!(
                    previous = %pending.previous,
                    observed = %pending.observed,
                    confirm_after_secs = self.settings.lock_confirm_delay.as_secs(),
                    "lock state change detected — awaiting confirmation"
                );
                Ok(LockCheck::Pending(pending))
            }
        }
    }

    /// Re-probes after the confirmation delay and settles `pending`.
    ///
    /// The persisted state is read again first: when an earlier confirmation
    /// already committed the transition, this one settles without an event.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Store`] if the lock state cannot be read or written.
    pub async fn confirm_lock_check(
        &self,
        pending: PendingLockChange,
    ) -> Result<LockReport, WatchError> {
        let persisted = self.store.load_lock_status().await?;
        if let Some(decision) = pending.superseded_by(persisted) {
            tracing::info!(
                scheduled_against = %pending.previous,
                persisted = %persisted,
                "lock confirmation superseded — state already moved"
            );
            return self.settle(decision).await;
        }

        let probe = self.prober.probe(&self.settings.store_url).await;
        let decision = pending.confirm(probe);
        if !decision.changed {
            tracing::info!(
                previous = %decision.previous,
                second_probe = ?probe,
                "lock state change not confirmed — keeping persisted state"
            );
        }
        self.settle(decision).await
    }

    /// Persists (unless dry run), then announces a confirmed transition.
    async fn settle(&self, decision: LockDecision) -> Result<LockReport, WatchError> {
        if decision.needs_persist() {
            if self.settings.dry_run {
                tracing::info!(status = %decision.persisted, "dry run — lock state not persisted");
            } else {
                self.store.save_lock_status(decision.persisted).await?;
            }
        }

        let changes: Vec<Change> = decision.change().into_iter().collect();
        if let Some(Change::LockStateChanged { from, to }) = changes.first() {
            tracing::info!(%from, %to, "lock state change confirmed");
        }
        let delivery = self.deliver(&changes).await;
        Ok(LockReport { decision, delivery })
    }

    /// Formats and sends each change. Failures are logged and counted.
    async fn deliver(&self, changes: &[Change]) -> DeliveryTally {
        let mut tally = DeliveryTally::default();
        for change in changes {
            let message = self.formatter.format(change, Utc::now());
            match self.notifier.notify(&message).await {
                Ok(id) => {
                    tally.sent += 1;
                    tracing::info!(kind = change.kind(), message_id = %id, "notification sent");
                }
                Err(e) => {
                    tally.failed += 1;
                    tracing::warn!(
                        kind = change.kind(),
                        error = %e,
                        "notification failed — continuing with remaining changes"
                    );
                }
            }
        }
        tally
    }
}

/// Short class name for a job-level error log field.
pub(crate) fn error_class(e: &WatchError) -> &'static str {
    match e {
        WatchError::Fetch(ScraperError::RateLimited { .. }) => "rate limited",
        WatchError::Fetch(_) => "fetch failed",
        WatchError::Store(_) => "store unavailable",
    }
}
