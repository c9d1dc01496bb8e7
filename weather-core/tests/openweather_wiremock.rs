//! OpenWeather client against a mock HTTP server.

use serde_json::json;
use weather_core::{
    Config, Coordinates, CurrentConditions, DeploymentMode, Query, WeatherApi, WeatherError,
    provider::openweather::{Endpoint, OpenWeatherClient},
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param, query_param_is_missing},
};

fn config_for(server: &MockServer) -> Config {
    Config {
        base_url: format!("{}/data/2.5", server.uri()),
        geo_base_url: format!("{}/geo/1.0", server.uri()),
        timeout_ms: 2_000,
        ..Config::default()
    }
}

fn direct_client(server: &MockServer) -> OpenWeatherClient {
    OpenWeatherClient::direct("TEST_KEY", &config_for(server)).expect("client builds")
}

fn current_body() -> serde_json::Value {
    json!({
        "coord": {"lat": 41.01, "lon": 28.97},
        "weather": [{"main": "Clear", "description": "clear sky"}],
        "main": {"temp": 22.5, "feels_like": 22.1, "humidity": 48, "pressure": 1014},
        "wind": {"speed": 2.6},
        "sys": {"country": "TR", "sunrise": 1760412000, "sunset": 1760452800},
        "name": "Istanbul",
        "dt": 1760430000
    })
}

#[tokio::test]
async fn current_weather_sends_units_language_and_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", "Istanbul"))
        .and(query_param("units", "metric"))
        .and(query_param("lang", "en"))
        .and(query_param("appid", "TEST_KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
        .expect(1)
        .mount(&server)
        .await;

    let payload = direct_client(&server)
        .current_weather(&Query::City("Istanbul".into()))
        .await
        .expect("success");

    let current = CurrentConditions::try_from(&payload).expect("complete payload");
    assert_eq!(current.location_name, "Istanbul");
    assert_eq!(current.temperature_c, 22.5);
    assert_eq!(current.coordinates, Some(Coordinates { lat: 41.01, lon: 28.97 }));
}

#[tokio::test]
async fn coordinates_are_sent_as_lat_lon() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .and(query_param("lat", "41.01"))
        .and(query_param("lon", "28.97"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "list": [
                {"dt": 1760443200, "main": {"temp": 19.0}, "weather": [{"main": "Rain", "description": "light rain"}], "pop": 0.6},
                {"dt": 1760432400, "main": {"temp": 21.0}, "weather": [{"main": "Clouds", "description": "few clouds"}]}
            ],
            "city": {"name": "Istanbul", "country": "TR"}
        })))
        .mount(&server)
        .await;

    let payload = direct_client(&server)
        .forecast(&Query::Coords(Coordinates { lat: 41.01, lon: 28.97 }))
        .await
        .expect("success");

    let entries = payload.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].condition, "Clouds");
    assert_eq!(entries[1].precipitation_probability, 0.6);
}

#[tokio::test]
async fn non_success_status_is_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"cod": "404", "message": "city not found"})),
        )
        .mount(&server)
        .await;

    let err = direct_client(&server)
        .current_weather(&Query::City("Atlantis".into()))
        .await
        .unwrap_err();

    assert_eq!(err, WeatherError::Upstream { status_code: 404, status_text: "Not Found".into() });
}

#[tokio::test]
async fn malformed_json_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/air_pollution"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = direct_client(&server)
        .air_quality(Coordinates { lat: 1.0, lon: 2.0 })
        .await
        .unwrap_err();

    assert!(matches!(err, WeatherError::Parse(_)), "{err:?}");
}

#[tokio::test]
async fn unreachable_host_is_transport_error_without_key() {
    let config = Config {
        // nothing listens on port 9 locally
        base_url: "http://127.0.0.1:9/data/2.5".into(),
        timeout_ms: 500,
        ..Config::default()
    };
    let client = OpenWeatherClient::direct("SECRET_KEY", &config).expect("client builds");

    let err = client.current_weather(&Query::City("Paris".into())).await.unwrap_err();
    match err {
        WeatherError::Transport(reason) => assert!(!reason.contains("SECRET_KEY"), "{reason}"),
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn slow_upstream_times_out_as_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(current_body())
                .set_delay(std::time::Duration::from_millis(800)),
        )
        .mount(&server)
        .await;

    let config = Config { timeout_ms: 100, ..config_for(&server) };
    let client = OpenWeatherClient::direct("KEY", &config).expect("client builds");

    let err = client.current_weather(&Query::City("Paris".into())).await.unwrap_err();
    assert!(matches!(err, WeatherError::Transport(_)), "{err:?}");
}

#[tokio::test]
async fn geocoding_returns_first_match_or_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .and(query_param("q", "Istanbul"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "Istanbul", "lat": 41.01, "lon": 28.97, "country": "TR", "state": "Istanbul"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .and(query_param("q", "Atlantis"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = direct_client(&server);

    let hit = client.resolve_city("Istanbul").await.expect("success").expect("one match");
    assert_eq!(hit.country, "TR");
    assert_eq!(hit.coordinates(), Coordinates { lat: 41.01, lon: 28.97 });

    assert_eq!(client.resolve_city("Atlantis").await, Ok(None));
}

#[tokio::test]
async fn proxy_mode_hits_proxy_routes_without_credential() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/weather/weather"))
        .and(query_param("q", "Berlin"))
        .and(query_param("units", "metric"))
        .and(query_param_is_missing("appid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/air-quality"))
        .and(query_param_is_missing("appid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "list": [{"main": {"aqi": 3}, "components": {"pm10": 11.0}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenWeatherClient::via_proxy(&server.uri(), &Config::default()).expect("client builds");
    assert_eq!(client.mode(), DeploymentMode::Proxy);

    client.current_weather(&Query::City("Berlin".into())).await.expect("success");
    let air = client.air_quality(Coordinates { lat: 52.5, lon: 13.4 }).await.expect("success");
    assert_eq!(air.list[0].main.aqi, 3);
}

#[tokio::test]
async fn forward_passes_status_and_body_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"cod":401,"message":"Invalid API key"}"#))
        .mount(&server)
        .await;

    let raw = direct_client(&server)
        .forward(Endpoint::Forecast, &[("q", "Paris".to_string())])
        .await
        .expect("transport succeeded");

    assert_eq!(raw.status.as_u16(), 401);
    assert!(raw.body.contains("Invalid API key"));
    assert_eq!(raw.content_type.as_deref(), Some("text/plain"));
}

#[tokio::test]
async fn retries_apply_to_transport_failures_only() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let config = Config { retry_attempts: 3, ..config_for(&server) };
    let client = OpenWeatherClient::direct("KEY", &config).expect("client builds");

    let err = client.current_weather(&Query::City("Paris".into())).await.unwrap_err();
    assert!(matches!(err, WeatherError::Upstream { status_code: 503, .. }));
}
