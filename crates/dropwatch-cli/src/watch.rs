//! Watch command handlers: one job, a lock probe, and the snapshot summary.

use std::collections::BTreeMap;

use dropwatch_core::{AppConfig, LockProbe, LockStatus, Snapshot};
use dropwatch_db::{ConfiguredStore, LockStateStore, SnapshotStore};
use dropwatch_watcher::{CatalogOutcome, JobReport, JobRunner, LockOutcome, LockReport};
use serde::Serialize;

/// Runs one job. A tentative lock change is confirmed in-process after the
/// configured delay before returning.
///
/// # Errors
///
/// Returns an error if the watcher cannot be built, the lock confirmation
/// cannot be persisted, or either half of the job failed.
pub(crate) async fn run_watch(config: &AppConfig, dry_run: bool) -> anyhow::Result<()> {
    let watcher = dropwatch_watcher::build_watcher(config, dry_run).await?;
    let runner = JobRunner::new(watcher);

    let report = runner.run_job().await?;
    for line in report_lines(&report) {
        println!("{line}");
    }

    if let Some(pending) = report.pending_lock_change() {
        let delay = runner.watcher().settings().lock_confirm_delay;
        println!(
            "lock: {} -> {} observed; confirming in {}s",
            pending.previous,
            pending.observed,
            delay.as_secs()
        );
        tokio::time::sleep(delay).await;
        let confirmed = runner.run_confirmation(pending).await?;
        println!("{}", lock_line(&confirmed));
    }

    if let Some(summary) = report.failure_summary() {
        anyhow::bail!("job finished with errors: {summary}");
    }
    Ok(())
}

/// Probes the lock state once and prints it next to the persisted state.
///
/// # Errors
///
/// Returns an error if the prober or the store cannot be built.
pub(crate) async fn run_lock_probe(config: &AppConfig) -> anyhow::Result<()> {
    let prober = dropwatch_scraper::LockProber::new(
        config.scraper_request_timeout_secs,
        &config.scraper_user_agent,
    )
    .map_err(|e| anyhow::anyhow!("failed to build lock prober: {e}"))?;

    let observed = match prober.probe_status(&config.store_url).await {
        Ok(probe) => probe_label(probe).to_owned(),
        Err(e) => format!("unknown ({e})"),
    };

    let store = ConfiguredStore::from_app_config(config).await?;
    let persisted = store.load_lock_status().await?;
    println!("{}: {observed} (persisted: {persisted})", config.store_url);
    Ok(())
}

/// Prints the persisted snapshot summary.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or read.
pub(crate) async fn run_snapshot_summary(config: &AppConfig, json: bool) -> anyhow::Result<()> {
    let store = ConfiguredStore::from_app_config(config).await?;
    let snapshot = store.load().await?;
    let lock = store.load_lock_status().await?;
    let summary = SnapshotSummary::new(&snapshot, lock);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for line in summary.lines(store.backend_name()) {
            println!("{line}");
        }
    }
    Ok(())
}

fn probe_label(probe: LockProbe) -> &'static str {
    match probe {
        LockProbe::Locked => "locked",
        LockProbe::Unlocked => "unlocked",
        LockProbe::Unknown => "unknown",
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub(crate) struct SnapshotSummary {
    pub variants: usize,
    pub available: usize,
    pub sold_out: usize,
    pub products: usize,
    /// Available / total per size label (`""` for unrecognized sizes).
    pub by_size: BTreeMap<String, SizeCount>,
    pub lock_status: LockStatus,
}

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub(crate) struct SizeCount {
    pub available: usize,
    pub total: usize,
}

impl SnapshotSummary {
    pub(crate) fn new(snapshot: &Snapshot, lock_status: LockStatus) -> Self {
        let mut by_size: BTreeMap<String, SizeCount> = BTreeMap::new();
        let mut products = std::collections::BTreeSet::new();
        for variant in snapshot.variants() {
            let entry = by_size
                .entry(variant.size_label.as_str().to_owned())
                .or_default();
            entry.total += 1;
            if variant.available {
                entry.available += 1;
            }
            products.insert(variant.product_title.as_str());
        }

        let available = snapshot.available_count();
        Self {
            variants: snapshot.len(),
            available,
            sold_out: snapshot.len() - available,
            products: products.len(),
            by_size,
            lock_status,
        }
    }

    pub(crate) fn lines(&self, backend: &str) -> Vec<String> {
        if self.variants == 0 {
            return vec![
                format!("snapshot ({backend}): empty — the next run records a baseline"),
                format!("lock: {}", self.lock_status),
            ];
        }

        let mut lines = vec![format!(
            "snapshot ({backend}): {} variants across {} products, {} available, {} sold out",
            self.variants, self.products, self.available, self.sold_out
        )];
        for (size, count) in &self.by_size {
            let size = if size.is_empty() { "other" } else { size };
            lines.push(format!("  {size:<5} {}/{}", count.available, count.total));
        }
        lines.push(format!("lock: {}", self.lock_status));
        lines
    }
}

pub(crate) fn report_lines(report: &JobReport) -> Vec<String> {
    let mut lines = Vec::new();

    match (&report.catalog, &report.catalog_error) {
        (Some(catalog), _) if catalog.outcome == CatalogOutcome::SkippedEmpty => {
            lines.push("catalog: fetch returned no variants; skipped".to_owned());
        }
        (Some(catalog), _) if catalog.first_run => lines.push(format!(
            "catalog: baseline recorded ({} variants, {} pages)",
            catalog.variants_seen, catalog.pages_fetched
        )),
        (Some(catalog), _) => {
            lines.push(format!(
                "catalog: {} variants, {} pages, {} changes ({} sent, {} failed){}",
                catalog.variants_seen,
                catalog.pages_fetched,
                catalog.changes.len(),
                catalog.delivery.sent,
                catalog.delivery.failed,
                if catalog.truncated { " [truncated]" } else { "" }
            ));
            for change in &catalog.changes {
                if let Some(v) = change.variant() {
                    lines.push(format!(
                        "  {:<11} {} [{}] {}",
                        change.kind(),
                        v.product_title,
                        v.size_label,
                        v.variant_id
                    ));
                }
            }
        }
        (None, Some(e)) => lines.push(format!("catalog: failed: {e}")),
        (None, None) => {}
    }

    match &report.lock {
        LockOutcome::Settled(lock) => lines.push(lock_line(lock)),
        LockOutcome::PendingConfirmation { .. } => {}
        LockOutcome::Failed { error } => lines.push(format!("lock: failed: {error}")),
    }
    lines
}

fn lock_line(report: &LockReport) -> String {
    let d = &report.decision;
    if d.changed {
        format!("lock: {} -> {} (confirmed)", d.previous, d.current)
    } else if d.needs_persist() {
        format!("lock: baseline {}", d.persisted)
    } else {
        format!("lock: {} (no change)", d.persisted)
    }
}
