use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use std::time::Duration;

use crate::db::format_timestamp;
use crate::entities::{cache_entries, prelude::*};
use crate::models::{CacheDataType, LocationKey};

pub struct CacheRepository {
    conn: DatabaseConnection,
}

impl CacheRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Returns the payload only while `expires_at > now`. Stale rows are
    /// left in place and read as a miss.
    pub async fn get_fresh(
        &self,
        key: &LocationKey,
        data_type: CacheDataType,
        now: DateTime<Utc>,
    ) -> Result<Option<String>> {
        let now = format_timestamp(now);

        let entry = CacheEntries::find()
            .filter(cache_entries::Column::LocationKey.eq(key.as_str()))
            .filter(cache_entries::Column::DataType.eq(data_type.as_str()))
            .filter(cache_entries::Column::ExpiresAt.gt(now))
            .one(&self.conn)
            .await
            .context("Failed to query weather cache")?;

        Ok(entry.map(|e| e.payload))
    }

    pub async fn find_entry(
        &self,
        key: &LocationKey,
        data_type: CacheDataType,
    ) -> Result<Option<cache_entries::Model>> {
        let entry = CacheEntries::find()
            .filter(cache_entries::Column::LocationKey.eq(key.as_str()))
            .filter(cache_entries::Column::DataType.eq(data_type.as_str()))
            .one(&self.conn)
            .await?;

        Ok(entry)
    }

    /// Insert or replace the row for `(key, data_type)`; last writer wins.
    pub async fn upsert(
        &self,
        key: &LocationKey,
        data_type: CacheDataType,
        payload: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let ttl = chrono::Duration::from_std(ttl).context("Cache TTL out of range")?;
        let expires_at = now
            .checked_add_signed(ttl)
            .context("Cache expiry overflows")?;

        let active_model = cache_entries::ActiveModel {
            location_key: Set(key.as_str().to_string()),
            data_type: Set(data_type.as_str().to_string()),
            payload: Set(payload.to_string()),
            created_at: Set(format_timestamp(now)),
            expires_at: Set(format_timestamp(expires_at)),
            ..Default::default()
        };

        CacheEntries::insert(active_model)
            .on_conflict(
                OnConflict::columns([
                    cache_entries::Column::LocationKey,
                    cache_entries::Column::DataType,
                ])
                .update_columns([
                    cache_entries::Column::Payload,
                    cache_entries::Column::CreatedAt,
                    cache_entries::Column::ExpiresAt,
                ])
                .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await
            .context("Failed to write weather cache")?;

        Ok(())
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(CacheEntries::find().count(&self.conn).await?)
    }

    pub async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = CacheEntries::delete_many()
            .filter(cache_entries::Column::ExpiresAt.lte(format_timestamp(now)))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected)
    }

    /// Evicts the rows closest to expiry until at most `max_entries` remain.
    pub async fn trim_to(&self, max_entries: u64) -> Result<u64> {
        let total = self.count().await?;
        if total <= max_entries {
            return Ok(0);
        }

        let victims: Vec<i32> = CacheEntries::find()
            .select_only()
            .column(cache_entries::Column::Id)
            .order_by_asc(cache_entries::Column::ExpiresAt)
            .order_by_asc(cache_entries::Column::Id)
            .limit(total - max_entries)
            .into_tuple()
            .all(&self.conn)
            .await?;

        let result = CacheEntries::delete_many()
            .filter(cache_entries::Column::Id.is_in(victims))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected)
    }
}
