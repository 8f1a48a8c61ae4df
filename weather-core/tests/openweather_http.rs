//! OpenWeather client against a mock server.

use std::time::Duration;

use weather_core::{
    ChosenLocation, ClientError, GeoSuggest, Units, WeatherSource,
    provider::{http_client, openweather::OpenWeatherClient},
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> OpenWeatherClient {
    let http = http_client(Duration::from_secs(5)).unwrap();
    OpenWeatherClient::new("test_key".into(), http).with_base_url(server.uri())
}

fn auckland() -> ChosenLocation {
    ChosenLocation {
        name: "Auckland".into(),
        country: "NZ".into(),
        lat: -36.85,
        lon: 174.76,
    }
}

#[tokio::test]
async fn suggest_maps_results_in_server_order() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .and(query_param("q", "Lon"))
        .and(query_param("limit", "3"))
        .and(query_param("appid", "test_key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"name": "London", "country": "GB", "lat": 51.5073, "lon": -0.1276, "state": "England"},
            {"name": "London", "country": "CA", "lat": 42.9832, "lon": -81.2434, "local_names": {"en": "London"}}
        ])))
        .mount(&server)
        .await;

    let suggestions = client(&server).with_limit(3).suggest("Lon").await.unwrap();

    assert_eq!(suggestions.len(), 2);
    assert_eq!(suggestions[0].label(), "London, GB");
    assert_eq!(suggestions[1].country, "CA");
    assert_eq!(suggestions[1].lat, 42.9832);
}

#[tokio::test]
async fn suggest_with_no_hits_is_empty_result() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let err = client(&server).suggest("Qqzx").await.unwrap_err();
    assert!(matches!(err, ClientError::EmptyResult(_)));
}

#[tokio::test]
async fn current_weather_is_mapped_with_units() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("lat", "-36.85"))
        .and(query_param("lon", "174.76"))
        .and(query_param("units", "imperial"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "Auckland",
            "dt": 1_704_067_200,
            "main": {"temp": 68.2, "feels_like": 67.5, "humidity": 72, "pressure": 1015},
            "weather": [{"id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d"}],
            "wind": {"speed": 11.5, "deg": 220}
        })))
        .mount(&server)
        .await;

    let snapshot = client(&server)
        .with_units(Units::Imperial)
        .current(&auckland())
        .await
        .unwrap();

    assert_eq!(snapshot.location_name, "Auckland");
    assert_eq!(snapshot.temperature, 68.2);
    assert_eq!(snapshot.humidity, 72);
    assert_eq!(snapshot.wind_speed, 11.5);
    assert_eq!(snapshot.condition, "Clouds");
    assert_eq!(snapshot.units, Units::Imperial);
    assert_eq!(snapshot.observed_at.timestamp(), 1_704_067_200);
}

#[tokio::test]
async fn current_weather_with_wrong_shape_is_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "Auckland",
            "main": {"temp": "warm"}
        })))
        .mount(&server)
        .await;

    let err = client(&server).current(&auckland()).await.unwrap_err();
    assert!(matches!(err, ClientError::Parse(_)));
}

#[tokio::test]
async fn unauthorized_is_network_error_with_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_string(r#"{"cod":401,"message":"Invalid API key"}"#),
        )
        .mount(&server)
        .await;

    let err = client(&server).current(&auckland()).await.unwrap_err();
    match err {
        ClientError::Network(msg) => {
            assert!(msg.contains("401"));
            assert!(msg.contains("Invalid API key"));
        }
        other => panic!("expected network error, got {other:?}"),
    }
}

#[tokio::test]
async fn forecast_steps_are_labelled_in_city_time() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "city": {"name": "Auckland", "country": "NZ", "timezone": 46800},
            "list": [
                {
                    "dt": 1_704_067_200,
                    "main": {"temp": 20.6, "feels_like": 20.0, "humidity": 65},
                    "weather": [{"main": "Rain", "description": "light rain", "icon": "10d"}]
                },
                {
                    "dt": 1_704_078_000,
                    "main": {"temp": 19.4, "feels_like": 19.0, "humidity": 70},
                    "weather": [{"main": "Clouds", "description": "overcast clouds", "icon": "04n"}]
                }
            ]
        })))
        .mount(&server)
        .await;

    let forecast = client(&server).forecast(&auckland()).await.unwrap();

    assert_eq!(forecast.len(), 2);
    assert_eq!(forecast[0].day, "Mon");
    assert_eq!(forecast[0].hour, "1 PM");
    assert_eq!(forecast[0].temperature, 21);
    assert_eq!(forecast[0].description, "light rain");
    assert_eq!(forecast[1].hour, "4 PM");
    assert_eq!(forecast[1].temperature, 19);
}

#[tokio::test]
async fn forecast_without_steps_is_empty_result() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "city": {"timezone": 0},
            "list": []
        })))
        .mount(&server)
        .await;

    let err = client(&server).forecast(&auckland()).await.unwrap_err();
    assert!(matches!(err, ClientError::EmptyResult(_)));
}

#[tokio::test]
async fn slow_server_times_out_as_network_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([]))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let http = http_client(Duration::from_millis(200)).unwrap();
    let client = OpenWeatherClient::new("test_key".into(), http).with_base_url(server.uri());

    let err = client.suggest("Lon").await.unwrap_err();
    match err {
        ClientError::Network(msg) => assert!(msg.contains("timed out")),
        other => panic!("expected timeout, got {other:?}"),
    }
}
