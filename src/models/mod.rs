pub mod location;
pub mod weather;

pub use location::{CacheDataType, LocationKey};
pub use weather::{
    AdvisoryReport, AlertView, Coordinates, CurrentReport, CurrentWeather, DailyForecast,
    FarmingTips, Forecast, ForecastReport, ForecastSample, GeocodedPlace, LocationDetails, Place,
    WeatherAlertsReport, round_half_up,
};
