//! OSRM routing engine client.
//!
//! OSRM takes waypoints as `lon,lat` pairs joined by `;` in the URL path and
//! returns GeoJSON geometry, also `[lon, lat]`. Everything else in this crate
//! uses `lat, lon`, so the order is swapped on the way in and out.

use std::time::Duration;

use serde::Deserialize;

use crate::solution::LatLon;

use super::error::GeometryError;
use super::resolver::RoutingEngine;

/// Public OSRM demo server.
const DEFAULT_BASE_URL: &str = "https://router.project-osrm.org";

const DEFAULT_PROFILE: &str = "driving";

/// Configuration for the OSRM client.
#[derive(Debug, Clone)]
pub struct OsrmConfig {
    /// Base URL of the OSRM server
    pub base_url: String,
    /// Routing profile (`driving`, `cycling`, `foot`)
    pub profile: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl OsrmConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the routing profile.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            profile: DEFAULT_PROFILE.to_string(),
            timeout_secs: 10,
        }
    }
}

/// `route` service response. Only the fields used here.
#[derive(Debug, Deserialize)]
struct RouteResponse {
    code: String,
    #[serde(default)]
    routes: Vec<RouteDto>,
}

#[derive(Debug, Deserialize)]
struct RouteDto {
    geometry: GeometryDto,
}

#[derive(Debug, Deserialize)]
struct GeometryDto {
    coordinates: Vec<[f64; 2]>,
}

/// HTTP client for an OSRM server.
#[derive(Debug, Clone)]
pub struct OsrmClient {
    http: reqwest::Client,
    base_url: String,
    profile: String,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, GeometryError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            profile: config.profile,
        })
    }

    /// Route URL for the given waypoints.
    pub fn route_url(&self, waypoints: &[LatLon]) -> String {
        format!(
            "{}/route/v1/{}/{}",
            self.base_url,
            self.profile,
            coordinates_path(waypoints)
        )
    }
}

impl RoutingEngine for OsrmClient {
    async fn route(&self, waypoints: &[LatLon]) -> Result<Vec<LatLon>, GeometryError> {
        let response = self
            .http
            .get(self.route_url(waypoints))
            .query(&[("overview", "full"), ("geometries", "geojson")])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        // OSRM reports "no route" as 400 with a JSON code, so try the body first.
        match parse_route_response(&body) {
            Err(GeometryError::Json { .. }) if !status.is_success() => {
                Err(GeometryError::Status {
                    status: status.as_u16(),
                })
            }
            other => other,
        }
    }
}

/// `lon,lat;lon,lat;...`
fn coordinates_path(waypoints: &[LatLon]) -> String {
    waypoints
        .iter()
        .map(|p| format!("{},{}", p.lon, p.lat))
        .collect::<Vec<_>>()
        .join(";")
}

/// Extract the first route's geometry as `lat, lon` points.
fn parse_route_response(body: &str) -> Result<Vec<LatLon>, GeometryError> {
    let response: RouteResponse = serde_json::from_str(body).map_err(|e| GeometryError::Json {
        message: e.to_string(),
    })?;

    if response.code != "Ok" {
        return Err(GeometryError::NoRoute {
            code: response.code,
        });
    }

    let route = response
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| GeometryError::NoRoute {
            code: "Ok (empty routes)".to_string(),
        })?;

    Ok(route
        .geometry
        .coordinates
        .into_iter()
        .map(|[lon, lat]| LatLon::new(lat, lon))
        .collect())
}
