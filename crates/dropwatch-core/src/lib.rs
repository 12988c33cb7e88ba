pub mod app_config;
pub mod changes;
pub mod config;
pub mod lock;
pub mod reconcile;
pub mod variants;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, NotifierKind, StoreBackend};
pub use changes::Change;
pub use config::{load_app_config, load_app_config_from_env};
pub use lock::{evaluate, LockDecision, LockProbe, LockStatus, LockStep, PendingLockChange};
pub use reconcile::{reconcile, Reconciliation};
pub use variants::{SizeLabel, Snapshot, Variant};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
