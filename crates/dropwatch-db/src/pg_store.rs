//! Postgres backend: `variant_snapshots` and `store_lock_state`.

use chrono::{DateTime, Utc};
use dropwatch_core::{LockStatus, SizeLabel, Snapshot, Variant};
use sqlx::PgPool;

use crate::store::{LockStateStore, SnapshotStore};
use crate::StoreError;

/// A row from the `variant_snapshots` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VariantSnapshotRow {
    pub variant_id: String,
    pub product_title: String,
    pub product_type: String,
    pub size_label: String,
    pub available: bool,
    pub price: String,
    pub url: String,
    pub recorded_at: DateTime<Utc>,
}

impl From<VariantSnapshotRow> for Variant {
    fn from(row: VariantSnapshotRow) -> Self {
        Self {
            variant_id: row.variant_id,
            product_title: row.product_title,
            product_type: row.product_type,
            size_label: SizeLabel::from_token(&row.size_label),
            available: row.available,
            price: row.price,
            url: row.url,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl SnapshotStore for PgStore {
    async fn load(&self) -> Result<Snapshot, StoreError> {
        let rows = sqlx::query_as::<_, VariantSnapshotRow>(
            "SELECT variant_id, product_title, product_type, size_label, \
                    available, price, url, recorded_at \
             FROM variant_snapshots \
             ORDER BY variant_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(Snapshot::from_variants(rows.into_iter().map(Variant::from)))
    }

    /// Deletes every row and inserts the new snapshot in one transaction.
    async fn replace(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let mut ids = Vec::with_capacity(snapshot.len());
        let mut titles = Vec::with_capacity(snapshot.len());
        let mut types = Vec::with_capacity(snapshot.len());
        let mut sizes = Vec::with_capacity(snapshot.len());
        let mut available = Vec::with_capacity(snapshot.len());
        let mut prices = Vec::with_capacity(snapshot.len());
        let mut urls = Vec::with_capacity(snapshot.len());

        for v in snapshot.variants() {
            ids.push(v.variant_id.clone());
            titles.push(v.product_title.clone());
            types.push(v.product_type.clone());
            sizes.push(v.size_label.as_str().to_owned());
            available.push(v.available);
            prices.push(v.price.clone());
            urls.push(v.url.clone());
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM variant_snapshots")
            .execute(&mut *tx)
            .await?;

        if !ids.is_empty() {
            sqlx::query(
                "INSERT INTO variant_snapshots \
                     (variant_id, product_title, product_type, size_label, available, price, url) \
                 SELECT * FROM UNNEST($1::text[], $2::text[], $3::text[], $4::text[], \
                                      $5::bool[], $6::text[], $7::text[])",
            )
            .bind(&ids)
            .bind(&titles)
            .bind(&types)
            .bind(&sizes)
            .bind(&available)
            .bind(&prices)
            .bind(&urls)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

impl LockStateStore for PgStore {
    async fn load_lock_status(&self) -> Result<LockStatus, StoreError> {
        let status = sqlx::query_scalar::<_, String>(
            "SELECT status FROM store_lock_state WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        match status {
            None => Ok(LockStatus::Unknown),
            Some(s) => s.parse().map_err(StoreError::InvalidRecord),
        }
    }

    async fn save_lock_status(&self, status: LockStatus) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO store_lock_state (id, status, updated_at) \
             VALUES (1, $1, NOW()) \
             ON CONFLICT (id) DO UPDATE SET status = EXCLUDED.status, updated_at = NOW()",
        )
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
