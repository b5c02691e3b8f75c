use chrono::{DateTime, Utc};
use std::sync::Arc;

pub mod advisory;
pub mod aggregator;
pub mod disease;
pub mod language;
pub mod maintenance;
pub mod market;

pub mod weather_service;
pub mod weather_service_impl;
pub use weather_service::{CachedPayload, WeatherError, WeatherService};
pub use weather_service_impl::{CacheTtls, SeaOrmWeatherService};

pub mod soil_service;
pub mod soil_service_impl;
pub use soil_service::{SoilError, SoilReport, SoilService};
pub use soil_service_impl::DefaultSoilService;

pub mod notification_service;
pub mod notification_service_impl;
pub use notification_service::{
    AlertReceipt, AlertRequest, NotificationError, NotificationService,
};
pub use notification_service_impl::TwilioNotificationService;

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, Principal};
pub use auth_service_impl::SeaOrmAuthService;

pub use language::{Language, ResponseCatalog, Topic, detect_language};
pub use maintenance::{CacheSweeper, SweepReport};

/// Source of "now" for TTL arithmetic.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[must_use]
pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}
