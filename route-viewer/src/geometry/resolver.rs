//! Road geometry with straight-line fallback.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::solution::LatLon;

use super::error::GeometryError;

/// Default bound on one geometry fetch.
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// External engine that turns waypoints into a road-following path.
pub trait RoutingEngine: Send + Sync + 'static {
    fn route(
        &self,
        waypoints: &[LatLon],
    ) -> impl Future<Output = Result<Vec<LatLon>, GeometryError>> + Send;
}

/// Configuration for the geometry resolver.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Fetches running longer than this fall back to straight lines.
    pub timeout: Duration,
}

impl ResolverConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

/// Path to draw for a route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedPath {
    pub points: Vec<LatLon>,
    /// True when the engine could not be used and `points` are the stops.
    pub fallback: bool,
}

impl ResolvedPath {
    fn straight(stops: &[LatLon]) -> Self {
        Self {
            points: stops.to_vec(),
            fallback: true,
        }
    }
}

/// Resolves stop sequences to road paths through a [`RoutingEngine`].
pub struct GeometryResolver<E> {
    engine: E,
    timeout: Duration,
}

impl<E: RoutingEngine> GeometryResolver<E> {
    pub fn new(engine: E, config: ResolverConfig) -> Self {
        Self {
            engine,
            timeout: config.timeout,
        }
    }

    #[cfg(test)]
    pub(crate) fn engine(&self) -> &E {
        &self.engine
    }

    /// Road-following path through `stops`, in one engine call.
    ///
    /// Never fails: on any engine error, an empty answer or timeout the
    /// stops themselves are returned, unchanged. Fewer than two stops have
    /// no path to fetch and are returned as-is.
    pub async fn resolve(&self, stops: &[LatLon]) -> ResolvedPath {
        if stops.len() < 2 {
            return ResolvedPath {
                points: stops.to_vec(),
                fallback: false,
            };
        }

        let outcome = match tokio::time::timeout(self.timeout, self.engine.route(stops)).await {
            Ok(result) => result,
            Err(_) => Err(GeometryError::Timeout {
                after: self.timeout,
            }),
        };

        match outcome {
            Ok(points) if !points.is_empty() => {
                debug!(stops = stops.len(), points = points.len(), "resolved road geometry");
                ResolvedPath {
                    points,
                    fallback: false,
                }
            }
            Ok(_) => {
                warn!(stops = stops.len(), "routing engine returned an empty path, using straight lines");
                ResolvedPath::straight(stops)
            }
            Err(e) => {
                warn!(stops = stops.len(), error = %e, "road geometry unavailable, using straight lines");
                ResolvedPath::straight(stops)
            }
        }
    }
}
