use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::time::Duration;

use crate::db::format_timestamp;
use crate::entities::{prelude::*, weather_alerts};
use crate::models::LocationKey;

/// Alert as produced by the rule engine, before it is persisted.
#[derive(Debug, Clone, Copy)]
pub struct NewWeatherAlert<'a> {
    pub location_key: &'a LocationKey,
    pub alert_type: &'a str,
    pub title: &'a str,
    pub message: &'a str,
    pub severity: &'a str,
}

pub struct AlertRepository {
    conn: DatabaseConnection,
}

impl AlertRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Re-triggering an alert with the same `(location_key, title)` refreshes
    /// the existing row; `id` and `created_at` survive the refresh.
    pub async fn upsert(
        &self,
        alert: &NewWeatherAlert<'_>,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let ttl = chrono::Duration::from_std(ttl).context("Alert TTL out of range")?;
        let expires_at = now
            .checked_add_signed(ttl)
            .context("Alert expiry overflows")?;

        let active_model = weather_alerts::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            location_key: Set(alert.location_key.as_str().to_string()),
            alert_type: Set(alert.alert_type.to_string()),
            title: Set(alert.title.to_string()),
            message: Set(alert.message.to_string()),
            severity: Set(alert.severity.to_string()),
            is_active: Set(true),
            created_at: Set(format_timestamp(now)),
            expires_at: Set(Some(format_timestamp(expires_at))),
        };

        WeatherAlerts::insert(active_model)
            .on_conflict(
                OnConflict::columns([
                    weather_alerts::Column::LocationKey,
                    weather_alerts::Column::Title,
                ])
                .update_columns([
                    weather_alerts::Column::AlertType,
                    weather_alerts::Column::Message,
                    weather_alerts::Column::Severity,
                    weather_alerts::Column::IsActive,
                    weather_alerts::Column::ExpiresAt,
                ])
                .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await
            .context("Failed to upsert weather alert")?;

        Ok(())
    }

    /// Active alerts for a location that have not expired, newest first.
    pub async fn list_active(
        &self,
        location_key: &LocationKey,
        now: DateTime<Utc>,
    ) -> Result<Vec<weather_alerts::Model>> {
        let now = format_timestamp(now);

        let alerts = WeatherAlerts::find()
            .filter(weather_alerts::Column::LocationKey.eq(location_key.as_str()))
            .filter(weather_alerts::Column::IsActive.eq(true))
            .filter(
                Condition::any()
                    .add(weather_alerts::Column::ExpiresAt.is_null())
                    .add(weather_alerts::Column::ExpiresAt.gt(now)),
            )
            .order_by_desc(weather_alerts::Column::CreatedAt)
            .order_by_asc(weather_alerts::Column::Title)
            .all(&self.conn)
            .await
            .context("Failed to query weather alerts")?;

        Ok(alerts)
    }

    pub async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = WeatherAlerts::delete_many()
            .filter(weather_alerts::Column::ExpiresAt.lte(format_timestamp(now)))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected)
    }
}
