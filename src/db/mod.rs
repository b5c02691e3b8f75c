use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::models::{CacheDataType, LocationKey};

pub mod migrator;
pub mod repositories;

pub use crate::entities::cache_entries::Model as CacheEntry;
pub use crate::entities::weather_alerts::Model as StoredAlert;
pub use repositories::alerts::NewWeatherAlert;
pub use repositories::user::User;

/// Every timestamp column is written in this one format so that lexical
/// comparison in SQL matches chronological order.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");

        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent()
                && !parent.as_os_str().is_empty()
            {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        if in_memory {
            // Each SQLite connection owns a private in-memory database.
            opt.max_connections(1).min_connections(1);
        } else {
            opt.max_connections(max_connections)
                .min_connections(min_connections)
                .idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600));
        }
        opt.connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn cache_repo(&self) -> repositories::cache::CacheRepository {
        repositories::cache::CacheRepository::new(self.conn.clone())
    }

    fn alert_repo(&self) -> repositories::alerts::AlertRepository {
        repositories::alerts::AlertRepository::new(self.conn.clone())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    // ------------------------------------------------------------------
    // Weather cache
    // ------------------------------------------------------------------

    pub async fn get_cached_payload(
        &self,
        key: &LocationKey,
        data_type: CacheDataType,
        now: DateTime<Utc>,
    ) -> Result<Option<String>> {
        self.cache_repo().get_fresh(key, data_type, now).await
    }

    pub async fn put_cached_payload(
        &self,
        key: &LocationKey,
        data_type: CacheDataType,
        payload: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.cache_repo()
            .upsert(key, data_type, payload, ttl, now)
            .await
    }

    pub async fn get_cache_entry(
        &self,
        key: &LocationKey,
        data_type: CacheDataType,
    ) -> Result<Option<CacheEntry>> {
        self.cache_repo().find_entry(key, data_type).await
    }

    pub async fn count_cache_entries(&self) -> Result<u64> {
        self.cache_repo().count().await
    }

    pub async fn delete_expired_cache_entries(&self, now: DateTime<Utc>) -> Result<u64> {
        self.cache_repo().delete_expired(now).await
    }

    pub async fn trim_cache_entries(&self, max_entries: u64) -> Result<u64> {
        self.cache_repo().trim_to(max_entries).await
    }

    // ------------------------------------------------------------------
    // Weather alerts
    // ------------------------------------------------------------------

    pub async fn upsert_weather_alert(
        &self,
        alert: &NewWeatherAlert<'_>,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.alert_repo().upsert(alert, ttl, now).await
    }

    pub async fn list_active_alerts(
        &self,
        location_key: &LocationKey,
        now: DateTime<Utc>,
    ) -> Result<Vec<StoredAlert>> {
        self.alert_repo().list_active(location_key, now).await
    }

    pub async fn delete_expired_alerts(&self, now: DateTime<Utc>) -> Result<u64> {
        self.alert_repo().delete_expired(now).await
    }

    // ------------------------------------------------------------------
    // Users / API keys
    // ------------------------------------------------------------------

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn verify_api_key(&self, api_key: &str) -> Result<Option<User>> {
        self.user_repo().verify_api_key(api_key).await
    }

    pub async fn issue_user_api_key(&self, username: &str) -> Result<String> {
        self.user_repo().issue_api_key(username).await
    }
}
