pub use super::cache_entries::Entity as CacheEntries;
pub use super::users::Entity as Users;
pub use super::weather_alerts::Entity as WeatherAlerts;
