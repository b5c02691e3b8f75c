use std::sync::Arc;
use std::time::Duration;

use crate::clients::openai::OpenAiClient;
use crate::clients::openweather::{OpenWeatherClient, WeatherProvider};
use crate::clients::twilio::TwilioClient;
use crate::clients::vision::VisionClient;
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, CacheSweeper, CacheTtls, Clock, DefaultSoilService, NotificationService,
    ResponseCatalog, SeaOrmAuthService, SeaOrmWeatherService, SoilService,
    TwilioNotificationService, WeatherService, system_clock,
};

/// One client for every vendor API so connections are pooled.
fn build_shared_http_client(config: &Config) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(u64::from(config.http.request_timeout_seconds)))
        .user_agent(config.http.user_agent.clone())
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

fn credential(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub clock: Clock,

    pub weather_service: Arc<dyn WeatherService>,

    pub soil_service: Arc<dyn SoilService>,

    pub notification_service: Arc<dyn NotificationService>,

    pub auth_service: Arc<dyn AuthService>,

    pub catalog: Arc<ResponseCatalog>,

    pub sweeper: CacheSweeper,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::with_clock(config, system_clock()).await
    }

    /// Builds state on a caller-supplied clock; tests use this to move time.
    pub async fn with_clock(config: Config, clock: Clock) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let http_client = build_shared_http_client(&config)?;

        let weather_provider = credential(config.weather.api_key.as_ref()).map(|key| {
            Arc::new(OpenWeatherClient::new(http_client.clone(), &config.weather, key))
                as Arc<dyn WeatherProvider>
        });

        let vision = credential(config.ocr.api_key.as_ref())
            .map(|key| VisionClient::new(http_client.clone(), &config.ocr, key));
        let llm = credential(config.llm.api_key.as_ref())
            .map(|key| OpenAiClient::new(http_client.clone(), &config.llm, key));

        let twilio = match (
            credential(config.sms.account_sid.as_ref()),
            credential(config.sms.auth_token.as_ref()),
        ) {
            (Some(sid), Some(token)) => Some(TwilioClient::new(
                http_client.clone(),
                &config.sms,
                sid,
                token,
            )),
            _ => None,
        };

        let weather_service = Arc::new(SeaOrmWeatherService::new(
            store.clone(),
            weather_provider,
            CacheTtls::from(&config.cache),
            clock.clone(),
        )) as Arc<dyn WeatherService>;

        let soil_service = Arc::new(DefaultSoilService::new(vision, llm)) as Arc<dyn SoilService>;

        let notification_service = Arc::new(TwilioNotificationService::new(
            twilio,
            &config.sms,
            config.server.public_base_url.clone(),
        )) as Arc<dyn NotificationService>;

        let auth_service = Arc::new(SeaOrmAuthService::new(store.clone())) as Arc<dyn AuthService>;

        let sweeper = CacheSweeper::new(store.clone(), config.cache.clone(), clock.clone());

        Ok(Self {
            config: Arc::new(config),
            store,
            clock,
            weather_service,
            soil_service,
            notification_service,
            auth_service,
            catalog: Arc::new(ResponseCatalog::builtin()),
            sweeper,
        })
    }
}
