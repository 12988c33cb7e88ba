use crate::app_config::{AppConfig, Environment, NotifierKind, StoreBackend};
use crate::ConfigError;

/// Smallest accepted post ceiling. Below it the prefix, size, price, link and
/// timestamp alone can fill a post and leave no room for the product title.
pub const MIN_NOTIFY_MAX_CHARS: usize = 140;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let store_url = require("DROPWATCH_STORE_URL")?;
    if !(store_url.starts_with("http://") || store_url.starts_with("https://")) {
        return Err(invalid(
            "DROPWATCH_STORE_URL",
            format!("\"{store_url}\" must start with http:// or https://"),
        ));
    }

    let env = parse_environment(&or_default("DROPWATCH_ENV", "development"))?;

    let bind_addr = or_default("DROPWATCH_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("DROPWATCH_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("DROPWATCH_LOG_LEVEL", "info");

    let store_backend = parse_store_backend(&or_default("DROPWATCH_STORE_BACKEND", "file"))?;
    let data_dir = PathBuf::from(or_default("DROPWATCH_DATA_DIR", "./data"));
    let database_url = match store_backend {
        StoreBackend::Postgres => Some(require("DATABASE_URL")?),
        StoreBackend::File => lookup("DATABASE_URL").ok(),
    };

    let db_max_connections = parse_u32("DROPWATCH_DB_MAX_CONNECTIONS", "5")?;
    let db_min_connections = parse_u32("DROPWATCH_DB_MIN_CONNECTIONS", "1")?;
    if db_min_connections > db_max_connections {
        return Err(invalid(
            "DROPWATCH_DB_MIN_CONNECTIONS",
            format!("{db_min_connections} exceeds DROPWATCH_DB_MAX_CONNECTIONS ({db_max_connections})"),
        ));
    }
    let db_acquire_timeout_secs = parse_u64("DROPWATCH_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let scraper_request_timeout_secs = parse_u64("DROPWATCH_SCRAPER_REQUEST_TIMEOUT_SECS", "30")?;
    let scraper_user_agent = or_default(
        "DROPWATCH_SCRAPER_USER_AGENT",
        "dropwatch/0.1 (catalog-watch)",
    );
    let scraper_page_limit = parse_u32("DROPWATCH_SCRAPER_PAGE_LIMIT", "250")?;
    let scraper_max_pages = parse_u32("DROPWATCH_SCRAPER_MAX_PAGES", "20")?;
    if scraper_max_pages == 0 {
        return Err(invalid(
            "DROPWATCH_SCRAPER_MAX_PAGES",
            "must be at least 1".to_string(),
        ));
    }
    let scraper_inter_request_delay_ms =
        parse_u64("DROPWATCH_SCRAPER_INTER_REQUEST_DELAY_MS", "250")?;
    let scraper_max_retries = parse_u32("DROPWATCH_SCRAPER_MAX_RETRIES", "3")?;
    let scraper_retry_backoff_base_secs =
        parse_u64("DROPWATCH_SCRAPER_RETRY_BACKOFF_BASE_SECS", "5")?;

    let lock_confirm_delay_secs = parse_u64("DROPWATCH_LOCK_CONFIRM_DELAY_SECS", "60")?;
    let schedule_cron = or_default("DROPWATCH_SCHEDULE_CRON", "0 */10 * * * *");

    let notifier = parse_notifier(&or_default("DROPWATCH_NOTIFIER", "log"))?;
    let x_api_base_url = or_default("DROPWATCH_X_API_BASE_URL", "https://api.twitter.com");
    let x_access_token = match notifier {
        NotifierKind::X => Some(require("DROPWATCH_X_ACCESS_TOKEN")?),
        NotifierKind::Log => lookup("DROPWATCH_X_ACCESS_TOKEN").ok(),
    };
    let notify_max_retries = parse_u32("DROPWATCH_NOTIFY_MAX_RETRIES", "2")?;
    let notify_max_chars = parse_usize("DROPWATCH_NOTIFY_MAX_CHARS", "280")?;
    if notify_max_chars < MIN_NOTIFY_MAX_CHARS {
        return Err(invalid(
            "DROPWATCH_NOTIFY_MAX_CHARS",
            format!("must be at least {MIN_NOTIFY_MAX_CHARS}"),
        ));
    }

    let mut api_keys: Vec<String> = or_default("DROPWATCH_API_KEYS", "")
        .split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(ToOwned::to_owned)
        .collect();
    api_keys.sort_unstable();
    api_keys.dedup();

    Ok(AppConfig {
        store_url,
        env,
        bind_addr,
        log_level,
        store_backend,
        data_dir,
        database_url,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        scraper_request_timeout_secs,
        scraper_user_agent,
        scraper_page_limit,
        scraper_max_pages,
        scraper_inter_request_delay_ms,
        scraper_max_retries,
        scraper_retry_backoff_base_secs,
        lock_confirm_delay_secs,
        schedule_cron,
        notifier,
        x_api_base_url,
        x_access_token,
        notify_max_retries,
        notify_max_chars,
        api_keys,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "DROPWATCH_ENV".to_string(),
            reason: format!(
                "unrecognized value \"{other}\"; expected development, test, or production"
            ),
        }),
    }
}

fn parse_store_backend(s: &str) -> Result<StoreBackend, ConfigError> {
    match s {
        "file" => Ok(StoreBackend::File),
        "postgres" => Ok(StoreBackend::Postgres),
        other => Err(ConfigError::InvalidEnvVar {
            var: "DROPWATCH_STORE_BACKEND".to_string(),
            reason: format!("unrecognized value \"{other}\"; expected file or postgres"),
        }),
    }
}

fn parse_notifier(s: &str) -> Result<NotifierKind, ConfigError> {
    match s {
        "log" => Ok(NotifierKind::Log),
        "x" => Ok(NotifierKind::X),
        other => Err(ConfigError::InvalidEnvVar {
            var: "DROPWATCH_NOTIFIER".to_string(),
            reason: format!("unrecognized value \"{other}\"; expected log or x"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
