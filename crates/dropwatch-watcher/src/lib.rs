pub mod error;
pub mod runner;
pub mod watcher;

use dropwatch_core::AppConfig;
use dropwatch_db::ConfiguredStore;
use dropwatch_notify::ConfiguredNotifier;
use dropwatch_scraper::{LockProber, ShopifyClient};

pub use error::{RunError, SetupError, WatchError};
pub use runner::{JobReport, JobRunner, LockOutcome};
pub use watcher::{
    CatalogOutcome, CatalogReport, DeliveryTally, LockCheck, LockReport, Watcher, WatcherSettings,
};

/// A watcher over the configured store and notifier backends.
pub type ConfiguredWatcher = Watcher<ConfiguredStore, ConfiguredNotifier>;

/// Builds HTTP clients, opens the configured store and picks the notifier.
///
/// `dry_run` forces the log notifier and disables every store write.
///
/// # Errors
///
/// Returns [`SetupError`] if a client cannot be built, the store cannot be
/// opened, or the notifier is misconfigured.
pub async fn build_watcher(config: &AppConfig, dry_run: bool) -> Result<ConfiguredWatcher, SetupError> {
    let catalog = ShopifyClient::new(
        config.scraper_request_timeout_secs,
        &config.scraper_user_agent,
        config.scraper_max_retries,
        config.scraper_retry_backoff_base_secs,
    )?;
    let prober = LockProber::new(
        config.scraper_request_timeout_secs,
        &config.scraper_user_agent,
    )?;
    let store = ConfiguredStore::from_app_config(config).await?;
    let notifier = if dry_run {
        ConfiguredNotifier::log_only()
    } else {
        ConfiguredNotifier::from_app_config(config)?
    };

    let mut settings = WatcherSettings::from_app_config(config);
    settings.dry_run = dry_run;

    tracing::info!(
        store_url = %config.store_url,
        store = store.backend_name(),
        notifier = notifier.kind_name(),
        dry_run,
        "watcher configured"
    );
    Ok(Watcher::new(catalog, prober, store, notifier, settings))
}
