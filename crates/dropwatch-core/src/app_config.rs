use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Where snapshots and lock state are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// JSON documents under `data_dir`.
    File,
    /// Postgres tables; requires `DATABASE_URL`.
    Postgres,
}

/// How change notifications are delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierKind {
    /// Log the formatted message only.
    Log,
    /// Post to the X API; requires `DROPWATCH_X_ACCESS_TOKEN`.
    X,
}

#[derive(Clone)]
pub struct AppConfig {
    pub store_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub store_backend: StoreBackend,
    pub data_dir: PathBuf,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub scraper_request_timeout_secs: u64,
    pub scraper_user_agent: String,
    pub scraper_page_limit: u32,
    pub scraper_max_pages: u32,
    pub scraper_inter_request_delay_ms: u64,
    pub scraper_max_retries: u32,
    pub scraper_retry_backoff_base_secs: u64,
    pub lock_confirm_delay_secs: u64,
    pub schedule_cron: String,
    pub notifier: NotifierKind,
    pub x_api_base_url: String,
    pub x_access_token: Option<String>,
    pub notify_max_retries: u32,
    pub notify_max_chars: usize,
    /// Bearer tokens accepted by the trigger API. Empty leaves it open.
    pub api_keys: Vec<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("store_url", &self.store_url)
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("store_backend", &self.store_backend)
            .field("data_dir", &self.data_dir)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[redacted]"),
            )
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "scraper_request_timeout_secs",
                &self.scraper_request_timeout_secs,
            )
            .field("scraper_user_agent", &self.scraper_user_agent)
            .field("scraper_page_limit", &self.scraper_page_limit)
            .field("scraper_max_pages", &self.scraper_max_pages)
            .field(
                "scraper_inter_request_delay_ms",
                &self.scraper_inter_request_delay_ms,
            )
            .field("scraper_max_retries", &self.scraper_max_retries)
            .field(
                "scraper_retry_backoff_base_secs",
                &self.scraper_retry_backoff_base_secs,
            )
            .field("lock_confirm_delay_secs", &self.lock_confirm_delay_secs)
            .field("schedule_cron", &self.schedule_cron)
            .field("notifier", &self.notifier)
            .field("x_api_base_url", &self.x_api_base_url)
            .field(
                "x_access_token",
                &self.x_access_token.as_ref().map(|_| "[redacted]"),
            )
            .field("notify_max_retries", &self.notify_max_retries)
            .field("notify_max_chars", &self.notify_max_chars)
            .field(
                "api_keys",
                &format_args!("[{} redacted]", self.api_keys.len()),
            )
            .finish()
    }
}
