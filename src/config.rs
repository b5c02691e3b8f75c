use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub http: HttpConfig,

    pub weather: WeatherConfig,

    pub cache: CacheConfig,

    pub ocr: OcrConfig,

    pub llm: LlmConfig,

    pub sms: SmsConfig,

    pub observability: ObservabilityConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            http: HttpConfig::default(),
            weather: WeatherConfig::default(),
            cache: CacheConfig::default(),
            ocr: OcrConfig::default(),
            llm: LlmConfig::default(),
            sms: SmsConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// "text" or "json"
    pub log_format: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    pub max_db_connections: u32,

    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/krishimarg.db".to_string(),
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    /// Externally reachable base URL, used for provider status callbacks.
    pub public_base_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 8787,
            cors_allowed_origins: vec!["*".to_string()],
            public_base_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds for every outbound vendor call (default: 30)
    pub request_timeout_seconds: u32,

    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: 30,
            user_agent: format!("KrishiMarg/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub api_key: Option<String>,

    pub base_url: String,

    pub geo_base_url: String,

    pub units: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openweathermap.org/data/2.5".to_string(),
            geo_base_url: "https://api.openweathermap.org/geo/1.0".to_string(),
            units: "metric".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub current_ttl_seconds: u64,

    pub forecast_ttl_seconds: u64,

    pub location_ttl_seconds: u64,

    /// Lifetime of a generated weather alert (default: 6 hours)
    pub alert_ttl_seconds: u64,

    /// Sweep expired rows every N minutes. 0 disables the interval sweep.
    pub sweep_interval_minutes: u32,

    /// Cron expression; takes precedence over the interval when set.
    pub sweep_cron: Option<String>,

    /// Upper bound on cache rows kept after a sweep. 0 means unbounded.
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            current_ttl_seconds: 10 * 60,
            forecast_ttl_seconds: 30 * 60,
            location_ttl_seconds: 7 * 24 * 60 * 60,
            alert_ttl_seconds: 6 * 60 * 60,
            sweep_interval_minutes: 60,
            sweep_cron: None,
            max_entries: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub api_key: Option<String>,

    pub base_url: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://vision.googleapis.com/v1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: Option<String>,

    pub base_url: String,

    pub model: String,

    pub max_completion_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-5-mini-2025-08-07".to_string(),
            max_completion_tokens: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmsConfig {
    pub account_sid: Option<String>,

    pub auth_token: Option<String>,

    pub base_url: String,

    pub sms_from: String,

    pub whatsapp_from: String,

    /// Prefix for phone numbers given without a leading '+'
    pub default_country_code: String,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            account_sid: None,
            auth_token: None,
            base_url: "https://api.twilio.com/2010-04-01".to_string(),
            sms_from: "+1234567890".to_string(),
            whatsapp_from: "whatsapp:+14155238886".to_string(),
            default_country_code: "+91".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,

    pub loki_labels: std::collections::HashMap<String, String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let mut labels = std::collections::HashMap::new();
        labels.insert("app".to_string(), "krishimarg".to_string());

        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
            loki_labels: labels,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        // A missing .env is the common case outside development.
        let _ = dotenvy::dotenv();

        let paths = Self::config_paths();

        let mut config = None;
        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                config = Some(Self::load_from_path(path)?);
                break;
            }
        }

        let mut config = config.unwrap_or_else(|| {
            info!("No config file found, using defaults");
            Self::default()
        });
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Credentials are usually injected through the environment rather than
    /// written to `config.toml`. Non-empty variables win over file values.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("OPENWEATHER_API_KEY") {
            self.weather.api_key = Some(v);
        }
        if let Some(v) = get("GOOGLE_VISION_API_KEY") {
            self.ocr.api_key = Some(v);
        }
        if let Some(v) = get("OPENAI_API_KEY") {
            self.llm.api_key = Some(v);
        }
        if let Some(v) = get("TWILIO_ACCOUNT_SID") {
            self.sms.account_sid = Some(v);
        }
        if let Some(v) = get("TWILIO_AUTH_TOKEN") {
            self.sms.auth_token = Some(v);
        }
        if let Some(v) = get("KRISHIMARG_DATABASE_URL") {
            self.general.database_path = v;
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("krishimarg").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".krishimarg").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            Self::default().save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.enabled && self.server.port == 0 {
            anyhow::bail!("Server port must be > 0 when the server is enabled");
        }

        if self.http.request_timeout_seconds == 0 {
            anyhow::bail!("HTTP request timeout must be > 0");
        }

        if self.weather.base_url.is_empty() || self.weather.geo_base_url.is_empty() {
            anyhow::bail!("Weather provider URLs cannot be empty");
        }

        if let Some(expr) = &self.cache.sweep_cron
            && expr.trim().is_empty()
        {
            anyhow::bail!("Cache sweep cron expression cannot be blank");
        }

        if !matches!(self.general.log_format.as_str(), "text" | "json") {
            anyhow::bail!(
                "Unknown log format '{}', expected 'text' or 'json'",
                self.general.log_format
            );
        }

        Ok(())
    }
}
