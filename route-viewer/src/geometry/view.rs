//! Map view for a single route.
//!
//! Opening a view starts one geometry fetch in the background. Each open
//! takes a fresh token; a fetch only lands if its token is still current
//! when it finishes, so closing or reopening the view makes any fetch in
//! flight harmless. Nothing is cached: every open fetches again.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::solution::{LatLon, Route};

use super::badges::{Badge, place_badges};
use super::markers::{Connector, StopMarker, connectors, stop_markers};
use super::resolver::{GeometryResolver, ResolvedPath, RoutingEngine};

/// Everything needed to draw one route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteGeometry {
    pub vehicle_id: u64,
    pub stops: Vec<LatLon>,
    pub path: Vec<LatLon>,
    pub badges: Vec<Badge>,
    pub markers: Vec<StopMarker>,
    pub connectors: Vec<Connector>,
}

impl RouteGeometry {
    pub fn build(route: &Route, resolved: ResolvedPath) -> Self {
        let stops = route.positions();
        let badges = place_badges(&stops, &resolved.points);
        let connectors = if resolved.fallback {
            Vec::new()
        } else {
            connectors(&stops, &resolved.points)
        };

        Self {
            vehicle_id: route.vehicle_id,
            badges,
            markers: stop_markers(route),
            connectors,
            path: resolved.points,
            stops,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "geometry", rename_all = "snake_case")]
pub enum MapViewState {
    Idle,
    Loading,
    /// No stop of the route has a usable position; there is nothing to draw.
    NoData,
    /// Road geometry from the routing engine.
    Ready(Arc<RouteGeometry>),
    /// Straight lines between stops.
    Fallback(Arc<RouteGeometry>),
}

#[derive(Debug)]
struct Slot {
    token: u64,
    state: MapViewState,
}

/// Open/close state machine for one route's map.
pub struct RouteMapView<E> {
    resolver: Arc<GeometryResolver<E>>,
    slot: Arc<RwLock<Slot>>,
}

impl<E: RoutingEngine> RouteMapView<E> {
    pub fn new(resolver: Arc<GeometryResolver<E>>) -> Self {
        Self {
            resolver,
            slot: Arc::new(RwLock::new(Slot {
                token: 0,
                state: MapViewState::Idle,
            })),
        }
    }

    /// Move to `Loading` and fetch geometry for `route`. Returns the token
    /// of this open.
    ///
    /// A route without any positioned stop goes straight to `NoData` and
    /// the routing engine is not called.
    pub async fn open(&self, route: &Route) -> u64 {
        let stops = route.positions();
        let token = {
            let mut slot = self.slot.write().await;
            slot.token += 1;
            if stops.is_empty() {
                debug!(vehicle_id = route.vehicle_id, "route has no positioned stops");
                slot.state = MapViewState::NoData;
                return slot.token;
            }
            slot.state = MapViewState::Loading;
            slot.token
        };

        let resolver = Arc::clone(&self.resolver);
        let slot = Arc::clone(&self.slot);
        let route = route.clone();

        tokio::spawn(async move {
            let resolved = resolver.resolve(&stops).await;
            let fallback = resolved.fallback;
            let geometry = Arc::new(RouteGeometry::build(&route, resolved));

            let mut slot = slot.write().await;
            if slot.token != token || slot.state != MapViewState::Loading {
                debug!(
                    vehicle_id = route.vehicle_id,
                    token,
                    current = slot.token,
                    "dropping stale geometry result"
                );
                return;
            }
            slot.state = if fallback {
                MapViewState::Fallback(geometry)
            } else {
                MapViewState::Ready(geometry)
            };
        });

        token
    }

    /// Return to `Idle`. Any fetch in flight is discarded when it lands.
    pub async fn close(&self) {
        let mut slot = self.slot.write().await;
        slot.token += 1;
        slot.state = MapViewState::Idle;
    }

    pub async fn state(&self) -> MapViewState {
        self.slot.read().await.state.clone()
    }

    pub async fn token(&self) -> u64 {
        self.slot.read().await.token
    }
}
