use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Duration, TimeZone, Utc};
use http_body_util::BodyExt;
use krishimarg::config::Config;
use krishimarg::db::migrator::DEFAULT_API_KEY;
use krishimarg::models::{CacheDataType, LocationKey};
use krishimarg::services::soil_service_impl::SAMPLE_REPORT_TEXT;
use krishimarg::state::SharedState;
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BOUNDARY: &str = "krishimarg-test-boundary";

/// A clock the test can move forward between requests.
#[derive(Clone)]
struct TestClock(Arc<Mutex<DateTime<Utc>>>);

impl TestClock {
    fn new() -> Self {
        Self(Arc::new(Mutex::new(
            Utc.with_ymd_and_hms(2026, 3, 2, 6, 0, 0).unwrap(),
        )))
    }

    fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap();
        *now += by;
    }

    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

fn test_config(vendor: Option<&MockServer>) -> Config {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.observability.metrics_enabled = false;

    if let Some(server) = vendor {
        config.weather.api_key = Some("test-key".to_string());
        config.weather.base_url = server.uri();
        config.weather.geo_base_url = format!("{}/geo", server.uri());
    }

    config
}

async fn spawn_app(config: Config, clock: &TestClock) -> (Router, Arc<SharedState>) {
    let handle = clock.clone();
    let shared = SharedState::with_clock(config, Arc::new(move || handle.now()))
        .await
        .expect("Failed to create shared state");
    let shared = Arc::new(shared);

    let state = krishimarg::api::create_app_state(shared.clone(), None);
    (krishimarg::api::router(state), shared)
}

fn current_body(temp: f64) -> Value {
    json!({
        "name": "Ludhiana",
        "coord": { "lat": 30.9, "lon": 75.85 },
        "main": { "temp": temp, "feels_like": temp + 2.0, "humidity": 42, "pressure": 1008 },
        "wind": { "speed": 2.1 },
        "visibility": 10000,
        "weather": [{ "main": "Clear", "description": "clear sky", "icon": "01d" }]
    })
}

fn forecast_body(temp: f64) -> Value {
    let start = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap().timestamp();
    let samples: Vec<Value> = (0..16)
        .map(|i| {
            json!({
                "dt": start + i * 10_800,
                "main": { "temp": temp },
                "weather": [{ "main": "Clouds", "description": "few clouds", "icon": "02d" }],
                "pop": 0.0
            })
        })
        .collect();

    json!({
        "list": samples,
        "city": { "name": "Ludhiana", "coord": { "lat": 30.9, "lon": 75.85 } }
    })
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {DEFAULT_API_KEY}"))
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {DEFAULT_API_KEY}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_upload(uri: &str, image: Option<&[u8]>, language: Option<&str>) -> Request<Body> {
    let mut body = Vec::new();
    if let Some(bytes) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"photo.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    if let Some(language) = language {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"language\"\r\n\r\n{language}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {DEFAULT_API_KEY}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn cache_header(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get("x-cache")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_health_probes_need_no_token() {
    let clock = TestClock::new();
    let (app, _) = spawn_app(test_config(None), &clock).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/system/health/live")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "alive");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/system/health/ready")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ready"], true);
    assert_eq!(body["checks"]["database"], true);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let clock = TestClock::new();
    let (app, _) = spawn_app(test_config(None), &clock).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/system/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "No authorization header");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/system/status")
                .header(header::AUTHORIZATION, "Bearer wrong-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Invalid or expired token");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/system/status")
                .header("X-Api-Key", DEFAULT_API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/api/system/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["weather_configured"], false);
    assert_eq!(body["cache_entries"], 0);
}

#[tokio::test]
async fn test_cors_preflight_is_answered() {
    let clock = TestClock::new();
    let (app, _) = spawn_app(test_config(None), &clock).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/weather/current")
                .header(header::ORIGIN, "http://localhost:5173")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_current_weather_is_served_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("appid", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body(31.5)))
        .expect(1)
        .mount(&server)
        .await;

    let clock = TestClock::new();
    let (app, _) = spawn_app(test_config(Some(&server)), &clock).await;

    let first = app
        .clone()
        .oneshot(get("/api/weather/current?lat=30.9&lon=75.85"))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(cache_header(&first), "MISS");
    let first_body = body_bytes(first).await;

    clock.advance(Duration::seconds(30));

    let second = app
        .oneshot(get("/api/weather/current?lat=30.9&lon=75.85"))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(cache_header(&second), "HIT");
    assert_eq!(
        second.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    assert_eq!(body_bytes(second).await, first_body);

    let report: Value = serde_json::from_slice(&first_body).unwrap();
    assert_eq!(report["location"]["name"], "Ludhiana");
    assert_eq!(report["current"]["temperature"], 32);
}

#[tokio::test]
async fn test_zero_ttl_refetches_and_moves_expiry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body(28.0)))
        .expect(2)
        .mount(&server)
        .await;

    let mut config = test_config(Some(&server));
    config.cache.current_ttl_seconds = 0;

    let clock = TestClock::new();
    let (app, shared) = spawn_app(config, &clock).await;
    let key = LocationKey::raw(30.9, 75.85);

    let response = app
        .clone()
        .oneshot(get("/api/weather/current?lat=30.9&lon=75.85"))
        .await
        .unwrap();
    assert_eq!(cache_header(&response), "MISS");
    let first_expiry = shared
        .store
        .get_cache_entry(&key, CacheDataType::Current)
        .await
        .unwrap()
        .unwrap()
        .expires_at;

    clock.advance(Duration::seconds(5));

    let response = app
        .oneshot(get("/api/weather/current?lat=30.9&lon=75.85"))
        .await
        .unwrap();
    assert_eq!(cache_header(&response), "MISS");
    let second_expiry = shared
        .store
        .get_cache_entry(&key, CacheDataType::Current)
        .await
        .unwrap()
        .unwrap()
        .expires_at;

    assert!(second_expiry > first_expiry);
    assert_eq!(shared.store.count_cache_entries().await.unwrap(), 1);
}

#[tokio::test]
async fn test_invalid_coordinates_are_rejected() {
    let clock = TestClock::new();
    let (app, _) = spawn_app(test_config(None), &clock).await;

    for uri in [
        "/api/weather/current?lat=30.9",
        "/api/weather/forecast?lat=abc&lon=75.85",
        "/api/weather/current?lat=95&lon=75.85",
        "/api/weather/advisory?lat=30.9&lon=-181",
    ] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
    }

    let response = app
        .oneshot(get("/api/weather/current?lat=30.9"))
        .await
        .unwrap();
    assert_eq!(
        body_json(response).await["error"],
        "Latitude and longitude are required"
    );
}

#[tokio::test]
async fn test_missing_weather_key_is_a_configuration_error() {
    let clock = TestClock::new();
    let (app, _) = spawn_app(test_config(None), &clock).await;

    let response = app
        .oneshot(get("/api/weather/current?lat=30.9&lon=75.85"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await["error"],
        "OpenWeather API key not configured"
    );
}

#[tokio::test]
async fn test_vendor_failure_maps_to_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let clock = TestClock::new();
    let (app, shared) = spawn_app(test_config(Some(&server)), &clock).await;

    let response = app
        .oneshot(get("/api/weather/forecast?lat=30.9&lon=75.85"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(shared.store.count_cache_entries().await.unwrap(), 0);
}

#[tokio::test]
async fn test_repeated_alert_requests_keep_one_row_per_alert() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body(38.0)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(38.0)))
        .mount(&server)
        .await;

    let clock = TestClock::new();
    let (app, shared) = spawn_app(test_config(Some(&server)), &clock).await;
    let request = json!({ "lat": 30.9, "lon": "75.85" });

    let first = app
        .clone()
        .oneshot(post_json("/api/weather/alerts", &request))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let first = body_json(first).await;

    clock.advance(Duration::minutes(10));

    let second = app
        .oneshot(get("/api/weather/alerts?lat=30.9&lon=75.85"))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    let second = body_json(second).await;

    let titles: Vec<&str> = first["alerts"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|a| a["title"].as_str())
        .collect();
    assert!(titles.contains(&"High Temperature Alert"));
    assert_eq!(first["alerts"], second["alerts"]);
    assert!(first["farmingTips"]["irrigation"].is_string());

    let stored = shared
        .store
        .list_active_alerts(&LocationKey::raw(30.9, 75.85), clock.now())
        .await
        .unwrap();
    assert_eq!(stored.len(), titles.len());
}

#[tokio::test]
async fn test_reverse_geocoding_is_cached_per_area() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geo/reverse"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "name": "Ludhiana",
            "country": "IN",
            "state": "Punjab",
            "local_names": { "en": "Ludhiana" }
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let clock = TestClock::new();
    let (app, _) = spawn_app(test_config(Some(&server)), &clock).await;

    let first = app
        .clone()
        .oneshot(post_json(
            "/api/geocoding",
            &json!({ "lat": 30.9, "lon": 75.85 }),
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(cache_header(&first), "MISS");
    let body = body_json(first).await;
    assert_eq!(body["city"], "Ludhiana");
    assert_eq!(body["formatted_name"], "Ludhiana, Punjab, Punjab, IN");

    let second = app
        .oneshot(post_json(
            "/api/geocoding",
            &json!({ "lat": 30.90001, "lon": 75.85004 }),
        ))
        .await
        .unwrap();
    assert_eq!(cache_header(&second), "HIT");
}

#[tokio::test]
async fn test_chat_detects_language_and_topic() {
    let clock = TestClock::new();
    let (app, _) = spawn_app(test_config(None), &clock).await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/chat",
            &json!({ "message": "ਸਤ ਸ੍ਰੀ ਅਕਾਲ", "topic": "Weather Update" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["language"], "pa");
    assert_eq!(body["topic"], "weather");
    assert!(!body["reply"].as_str().unwrap().is_empty());

    let response = app
        .oneshot(post_json(
            "/api/chat",
            &json!({ "message": "hello", "language": "xx" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_soil_analysis_falls_back_without_vendor_keys() {
    let clock = TestClock::new();
    let (app, _) = spawn_app(test_config(None), &clock).await;

    let response = app
        .clone()
        .oneshot(post_upload(
            "/api/soil/analyze",
            Some(b"fake-jpeg-bytes"),
            Some("Hindi"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ocrText"], SAMPLE_REPORT_TEXT);
    assert_eq!(body["analysis"]["status"], "Needs Improvement");
    assert_eq!(body["analysis"]["parameters"]["pH"], 6.8);
    assert_eq!(body["analysis"]["language"], "Hindi");

    let response = app
        .oneshot(post_upload("/api/soil/analyze", None, Some("English")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "No image file provided");
}

#[tokio::test]
async fn test_disease_detection_returns_a_known_profile() {
    let clock = TestClock::new();
    let (app, _) = spawn_app(test_config(None), &clock).await;

    let response = app
        .clone()
        .oneshot(post_upload("/api/disease/detect", Some(b"leaf"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["disease"].is_string());
    assert!(body["treatment"]["immediate_actions"].is_array());

    let response = app
        .oneshot(post_upload("/api/disease/detect", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_market_prices_require_crop() {
    let clock = TestClock::new();
    let (app, _) = spawn_app(test_config(None), &clock).await;

    let response = app
        .clone()
        .oneshot(get("/api/market/prices?crop=wheat"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["crop"], "wheat");
    assert_eq!(body["market"], "Ludhiana");
    assert_eq!(body["state"], "Punjab");

    let response = app.oneshot(get("/api/market/prices")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Crop parameter is required");
}

#[tokio::test]
async fn test_sms_without_credentials_is_a_configuration_error() {
    let clock = TestClock::new();
    let (app, _) = spawn_app(test_config(None), &clock).await;

    let response = app
        .oneshot(post_json(
            "/api/alerts/send",
            &json!({ "phone": "9876543210", "message": "Rain expected" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await["error"],
        "Twilio credentials not configured"
    );
}

/// Points OCR, LLM and SMS at the mock server; weather stays unconfigured.
fn vendor_config(server: &MockServer) -> Config {
    let mut config = test_config(None);
    config.ocr.api_key = Some("vision-key".to_string());
    config.ocr.base_url = format!("{}/vision", server.uri());
    config.llm.api_key = Some("llm-key".to_string());
    config.llm.base_url = format!("{}/llm", server.uri());
    config.sms.account_sid = Some("AC123".to_string());
    config.sms.auth_token = Some("twilio-token".to_string());
    config.sms.base_url = format!("{}/twilio", server.uri());
    config
}

async fn mount_ocr_text(server: &MockServer, text: &str) {
    Mock::given(method("POST"))
        .and(path("/vision/images:annotate"))
        .and(query_param("key", "vision-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "responses": [{ "textAnnotations": [{ "description": text }] }]
        })))
        .expect(1)
        .mount(server)
        .await;
}

async fn requests_to(server: &MockServer, route: &str) -> Vec<wiremock::Request> {
    server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() == route)
        .collect()
}

#[tokio::test]
async fn test_soil_analysis_falls_back_when_llm_reply_is_not_json() {
    let server = MockServer::start().await;
    mount_ocr_text(&server, "pH 5.1").await;
    Mock::given(method("POST"))
        .and(path("/llm/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "Your soil looks fine to me!" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let clock = TestClock::new();
    let (app, _) = spawn_app(vendor_config(&server), &clock).await;

    let response = app
        .oneshot(post_upload(
            "/api/soil/analyze",
            Some(b"soil-report"),
            Some("Hindi"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ocrText"], "pH 5.1");
    assert_eq!(body["analysis"]["status"], "Needs Improvement");
    assert_eq!(body["analysis"]["language"], "Hindi");
    assert!(!body["analysis"]["issues"].as_array().unwrap().is_empty());

    let ocr = requests_to(&server, "/vision/images:annotate").await;
    let sent: Value = serde_json::from_slice(&ocr[0].body).unwrap();
    assert_eq!(
        sent["requests"][0]["image"]["content"],
        STANDARD.encode(b"soil-report")
    );
    assert_eq!(sent["requests"][0]["features"][0]["type"], "TEXT_DETECTION");

    let llm = requests_to(&server, "/llm/chat/completions").await;
    assert_eq!(
        llm[0].headers.get("authorization").unwrap().to_str().unwrap(),
        "Bearer llm-key"
    );
    let sent: Value = serde_json::from_slice(&llm[0].body).unwrap();
    assert!(sent["messages"][1]["content"].as_str().unwrap().contains("pH 5.1"));
}

#[tokio::test]
async fn test_soil_analysis_falls_back_when_llm_reply_is_empty() {
    let server = MockServer::start().await;
    mount_ocr_text(&server, "Nitrogen: 90 ppm").await;
    Mock::given(method("POST"))
        .and(path("/llm/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": null } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let clock = TestClock::new();
    let (app, _) = spawn_app(vendor_config(&server), &clock).await;

    let response = app
        .oneshot(post_upload(
            "/api/soil/analyze",
            Some(b"soil-report"),
            Some("English"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ocrText"], "Nitrogen: 90 ppm");
    assert_eq!(body["analysis"]["status"], "Needs Improvement");
    assert_eq!(body["analysis"]["parameters"]["pH"], 6.8);
    assert_eq!(body["analysis"]["language"], "English");
}

#[tokio::test]
async fn test_soil_analysis_uses_well_formed_llm_reply() {
    let server = MockServer::start().await;
    mount_ocr_text(&server, "pH 7.2").await;
    let analysis = json!({
        "status": "Good",
        "parameters": { "pH": 7.2, "nitrogen": 300, "phosphorus": 40, "potassium": 310, "organic_carbon": 0.9 },
        "issues": [],
        "advice": ["Keep current practices"]
    });
    Mock::given(method("POST"))
        .and(path("/llm/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": analysis.to_string() } }]
        })))
        .mount(&server)
        .await;

    let clock = TestClock::new();
    let (app, _) = spawn_app(vendor_config(&server), &clock).await;

    let response = app
        .oneshot(post_upload("/api/soil/analyze", Some(b"soil-report"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["analysis"]["status"], "Good");
    assert_eq!(body["analysis"]["parameters"]["pH"], 7.2);
    assert_eq!(body["analysis"]["advice"][0], "Keep current practices");
}

#[tokio::test]
async fn test_ocr_failure_maps_to_bad_gateway_with_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/vision/images:annotate"))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend error"))
        .mount(&server)
        .await;

    let clock = TestClock::new();
    let (app, _) = spawn_app(vendor_config(&server), &clock).await;

    let response = app
        .oneshot(post_upload("/api/soil/analyze", Some(b"soil-report"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(
        body_json(response).await["error"],
        "Google Vision API error: 500"
    );
    assert!(requests_to(&server, "/llm/chat/completions").await.is_empty());
}

#[tokio::test]
async fn test_llm_failure_maps_to_bad_gateway_with_status() {
    let server = MockServer::start().await;
    mount_ocr_text(&server, "pH 5.1").await;
    Mock::given(method("POST"))
        .and(path("/llm/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let clock = TestClock::new();
    let (app, _) = spawn_app(vendor_config(&server), &clock).await;

    let response = app
        .oneshot(post_upload("/api/soil/analyze", Some(b"soil-report"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["error"], "OpenAI API error: 429");
}

#[tokio::test]
async fn test_high_priority_sms_form_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/twilio/Accounts/AC123/Messages.json"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "sid": "SM42",
            "status": "queued",
            "price": "-0.0075"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let clock = TestClock::new();
    let (app, _) = spawn_app(vendor_config(&server), &clock).await;

    let response = app
        .oneshot(post_json(
            "/api/alerts/send",
            &json!({ "phone": "9876543210", "message": "hi", "type": "sms", "priority": "high" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message_id"], "SM42");
    assert_eq!(body["delivery_status"], "queued");
    assert_eq!(body["cost"], -0.0075);

    let sent = requests_to(&server, "/twilio/Accounts/AC123/Messages.json").await;
    assert!(
        sent[0]
            .headers
            .get("authorization")
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("Basic ")
    );
    let form: HashMap<String, String> = url::form_urlencoded::parse(&sent[0].body)
        .into_owned()
        .collect();
    assert_eq!(form["To"], "+919876543210");
    assert_eq!(form["Body"], "KrishiMarg Alert: hi");
    assert_eq!(form["ValidityPeriod"], "14400");
    assert!(!form.contains_key("StatusCallback"));
}

#[tokio::test]
async fn test_twilio_rejection_surfaces_provider_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/twilio/Accounts/AC123/Messages.json"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": 21211,
            "message": "The 'To' number +91123 is not a valid phone number.",
            "status": 400
        })))
        .mount(&server)
        .await;

    let clock = TestClock::new();
    let (app, _) = spawn_app(vendor_config(&server), &clock).await;

    let response = app
        .oneshot(post_json(
            "/api/alerts/send",
            &json!({ "phone": "123", "message": "hi", "type": "whatsapp" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(
        body_json(response).await["error"],
        "Twilio API error: The 'To' number +91123 is not a valid phone number."
    );

    let sent = requests_to(&server, "/twilio/Accounts/AC123/Messages.json").await;
    let form: HashMap<String, String> = url::form_urlencoded::parse(&sent[0].body)
        .into_owned()
        .collect();
    assert_eq!(form["To"], "whatsapp:+91123");
    assert!(!form.contains_key("ValidityPeriod"));
}

#[tokio::test]
async fn test_empty_forecast_list_is_a_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "list": [],
            "city": { "name": "Ludhiana", "coord": { "lat": 30.9, "lon": 75.85 } }
        })))
        .mount(&server)
        .await;

    let clock = TestClock::new();
    let (app, shared) = spawn_app(test_config(Some(&server)), &clock).await;

    let response = app
        .oneshot(get("/api/weather/forecast?lat=30.9&lon=75.85"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(
        body_json(response).await["error"],
        "Forecast contains no samples"
    );
    assert_eq!(shared.store.count_cache_entries().await.unwrap(), 0);
}
