use dropwatch_db::StoreError;
use dropwatch_scraper::ScraperError;
use thiserror::Error;

/// Failure of one part of a job. Notification failures never surface here.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The first catalog page could not be fetched; the snapshot is untouched.
    #[error("catalog fetch failed: {0}")]
    Fetch(#[from] ScraperError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("a job is already running")]
    AlreadyRunning,

    #[error(transparent)]
    Watch(#[from] WatchError),
}

/// Failure while wiring a [`crate::Watcher`] from configuration.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("cannot build HTTP client: {0}")]
    Http(#[from] ScraperError),

    #[error("cannot open store: {0}")]
    Store(#[from] StoreError),

    #[error("cannot build notifier: {0}")]
    Notify(#[from] dropwatch_notify::NotifyError),
}
