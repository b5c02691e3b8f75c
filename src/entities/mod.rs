pub mod prelude;

pub mod cache_entries;
pub mod users;
pub mod weather_alerts;
