//! Persistence seams for the catalog snapshot and the lock state.

use std::future::Future;

use dropwatch_core::{AppConfig, LockStatus, Snapshot, StoreBackend};

use crate::{connect_pool_from_config, FileStore, PgStore, StoreError};

/// Last-observed catalog storage. Reads and replacements are whole-snapshot.
pub trait SnapshotStore: Send + Sync {
    /// Reads the persisted snapshot. Nothing persisted yet is an empty snapshot.
    fn load(&self) -> impl Future<Output = Result<Snapshot, StoreError>> + Send;

    /// Replaces the persisted snapshot with `snapshot`, all or nothing.
    fn replace(&self, snapshot: &Snapshot) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Confirmed lock status storage (a single record).
pub trait LockStateStore: Send + Sync {
    /// Reads the persisted status. Nothing persisted yet is [`LockStatus::Unknown`].
    fn load_lock_status(&self) -> impl Future<Output = Result<LockStatus, StoreError>> + Send;

    fn save_lock_status(
        &self,
        status: LockStatus,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// The backend chosen by `DROPWATCH_STORE_BACKEND`.
#[derive(Debug, Clone)]
pub enum ConfiguredStore {
    File(FileStore),
    Postgres(PgStore),
}

impl ConfiguredStore {
    /// Builds the configured backend. For Postgres this connects the pool
    /// but does not run migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingDatabaseUrl`] or [`StoreError::Sqlx`] when
    /// the Postgres backend is selected and cannot connect.
    pub async fn from_app_config(config: &AppConfig) -> Result<Self, StoreError> {
        match config.store_backend {
            StoreBackend::File => Ok(Self::File(FileStore::new(&config.data_dir))),
            StoreBackend::Postgres => {
                let pool = connect_pool_from_config(config).await?;
                Ok(Self::Postgres(PgStore::new(pool)))
            }
        }
    }

    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Postgres(_) => "postgres",
        }
    }
}

impl SnapshotStore for ConfiguredStore {
    async fn load(&self) -> Result<Snapshot, StoreError> {
        match self {
            Self::File(store) => store.load().await,
            Self::Postgres(store) => store.load().await,
        }
    }

    async fn replace(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        match self {
            Self::File(store) => store.replace(snapshot).await,
            Self::Postgres(store) => store.replace(snapshot).await,
        }
    }
}

impl LockStateStore for ConfiguredStore {
    async fn load_lock_status(&self) -> Result<LockStatus, StoreError> {
        match self {
            Self::File(store) => store.load_lock_status().await,
            Self::Postgres(store) => store.load_lock_status().await,
        }
    }

    async fn save_lock_status(&self, status: LockStatus) -> Result<(), StoreError> {
        match self {
            Self::File(store) => store.save_lock_status(status).await,
            Self::Postgres(store) => store.save_lock_status(status).await,
        }
    }
}
