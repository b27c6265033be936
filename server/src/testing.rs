//! Helpers shared by the test modules.

use std::collections::HashMap;

use chrono::Utc;
use serde_json::json;
use shared::models::Reading;
use warp::http::StatusCode;
use warp::Filter;

/// Serve fake flow and weather APIs on an ephemeral local port and return
/// their base URL.
///
/// Flow answers depend on the requested point:
/// - `19,72`: 20 km/h against a free flow of 40 km/h
/// - `19.1,72.1`: 403
/// - `19.2,72.2`: `{}`
/// - `19.3,72.3`: zero free-flow speed
/// - anything else: 500
///
/// Any key other than `test-key` gets a 403.
///
/// Weather answers 31.5°C and "haze" for the `weather-key` app id, 401 otherwise.
pub fn spawn_fake_api() -> String {
    let flow = warp::path!("traffic" / "services" / "4" / "flowSegmentData" / "absolute" / u8 / "json")
        .and(warp::query::<HashMap<String, String>>())
        .map(|_zoom: u8, query: HashMap<String, String>| {
            let authorized = query.get("key").map(String::as_str) == Some("test-key");
            let point = query.get("point").map(String::as_str).unwrap_or_default();

            let (status, body) = match point {
                _ if !authorized => (StatusCode::FORBIDDEN, json!({"error": "Invalid key"})),
                "19,72" => (
                    StatusCode::OK,
                    json!({"flowSegmentData": {"currentSpeed": 20, "freeFlowSpeed": 40}}),
                ),
                "19.1,72.1" => (StatusCode::FORBIDDEN, json!({"error": "Forbidden"})),
                "19.2,72.2" => (StatusCode::OK, json!({})),
                "19.3,72.3" => (
                    StatusCode::OK,
                    json!({"flowSegmentData": {"currentSpeed": 10, "freeFlowSpeed": 0}}),
                ),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, json!({"error": "Unknown point"})),
            };
            warp::reply::with_status(warp::reply::json(&body), status)
        });

    let weather = warp::path!("data" / "2.5" / "weather")
        .and(warp::query::<HashMap<String, String>>())
        .map(|query: HashMap<String, String>| {
            let (status, body) = match query.get("appid").map(String::as_str) {
                Some("weather-key") => (
                    StatusCode::OK,
                    json!({
                        "weather": [{"main": "Haze", "description": "haze"}],
                        "main": {"temp": 31.5, "humidity": 70}
                    }),
                ),
                _ => (StatusCode::UNAUTHORIZED, json!({"cod": 401, "message": "Invalid API key"})),
            };
            warp::reply::with_status(warp::reply::json(&body), status)
        });

    let (address, server) = warp::serve(flow.or(weather)).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    format!("http://{}", address)
}

pub fn reading(location: &str, congestion_level: u8, avg_speed: f64) -> Reading {
    Reading {
        location: location.to_string(),
        congestion_level,
        avg_speed,
        free_flow_speed: 40.0,
        latitude: 19.0,
        longitude: 72.0,
        temperature: None,
        weather_description: None,
        timestamp: Utc::now(),
    }
}
