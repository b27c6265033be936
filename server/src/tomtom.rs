//! TomTom Flow Segment Data source.
//!
//! One request per coordinate; the answer's `flowSegmentData` object carries
//! the current and free-flow speeds of the road segment closest to the point.

use std::time::Duration;

use serde::Deserialize;
use shared::models::Coordinate;

use crate::error::FetchFailure;

/// Public TomTom API host.
pub const TOMTOM_BASE_URL: &str = "https://api.tomtom.com";

/// Zoom level of the flow tiles the segment is matched against.
pub const FLOW_ZOOM: u8 = 10;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlowSample {
    pub current_speed: f64,
    pub free_flow_speed: f64,
}

/// Anything able to report traffic speeds for a coordinate.
pub trait FlowSource {
    async fn fetch(&self, coordinate: &Coordinate) -> Result<FlowSample, FetchFailure>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlowResponse {
    flow_segment_data: Option<FlowSegmentData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlowSegmentData {
    current_speed: f64,
    free_flow_speed: f64,
}

pub struct TomTomClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TomTomClient {
    /// `timeout` bounds each request, so one slow point cannot stall a cycle.
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// URL format: `{BASE}/traffic/services/4/flowSegmentData/absolute/{zoom}/json?point={lat}%2C{lon}&key={key}`
    pub fn build_url(base_url: &str, api_key: &str, latitude: f64, longitude: f64) -> String {
        format!(
            "{}/traffic/services/4/flowSegmentData/absolute/{}/json?point={}%2C{}&key={}",
            base_url, FLOW_ZOOM, latitude, longitude, api_key
        )
    }
}

impl FlowSource for TomTomClient {
    async fn fetch(&self, coordinate: &Coordinate) -> Result<FlowSample, FetchFailure> {
        let url = Self::build_url(
            &self.base_url,
            &self.api_key,
            coordinate.latitude,
            coordinate.longitude,
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchFailure::Network(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchFailure::Network(e.without_url().to_string()))?;

        parse_flow(&body)
    }
}

/// Extract speeds from a flow answer. Any other shape is a failed point.
pub fn parse_flow(body: &[u8]) -> Result<FlowSample, FetchFailure> {
    let response: FlowResponse =
        serde_json::from_slice(body).map_err(|e| FetchFailure::Malformed(e.to_string()))?;

    let data = response
        .flow_segment_data
        .ok_or_else(|| FetchFailure::Malformed("missing flowSegmentData".to_string()))?;

    Ok(FlowSample {
        current_speed: data.current_speed,
        free_flow_speed: data.free_flow_speed,
    })
}
