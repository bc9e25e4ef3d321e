//! Stop markers and path connectors for a route map.

use serde::Serialize;

use crate::solution::{LatLon, Route};

/// Return depots closer than this to the start are considered coincident.
const COINCIDENT_DEGREES: f64 = 0.0001;

/// Offset applied to a coincident return depot so both markers stay visible.
const RETURN_DEPOT_OFFSET: f64 = 0.002;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    Depot,
    ReturnDepot,
    Customer,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopMarker {
    /// Index of the stop within the route.
    pub stop_index: usize,
    pub position: LatLon,
    pub kind: MarkerKind,
    pub label: String,
}

/// Markers for every stop with a valid position.
pub fn stop_markers(route: &Route) -> Vec<StopMarker> {
    let last = route.stops.len().saturating_sub(1);
    let start = route.stops.first().and_then(|s| s.position);

    route
        .stops
        .iter()
        .enumerate()
        .filter_map(|(i, stop)| {
            let mut position = stop.position?;
            let kind = match (stop.is_depot(), i) {
                (true, i) if i > 0 && i == last => MarkerKind::ReturnDepot,
                (true, _) => MarkerKind::Depot,
                (false, _) => MarkerKind::Customer,
            };

            if kind == MarkerKind::ReturnDepot
                && let Some(start) = start
                && (position.lat - start.lat).abs() < COINCIDENT_DEGREES
                && (position.lon - start.lon).abs() < COINCIDENT_DEGREES
            {
                position = LatLon::new(
                    position.lat + RETURN_DEPOT_OFFSET,
                    position.lon + RETURN_DEPOT_OFFSET,
                );
            }

            Some(StopMarker {
                stop_index: i,
                position,
                kind,
                label: stop.label(),
            })
        })
        .collect()
}

/// Dashed line joining a stop to the road path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Connector {
    pub from: LatLon,
    pub to: LatLon,
}

/// Connectors from the first stop to the path start and from the path end
/// to the last stop. Road paths snap to the network, so their ends rarely
/// coincide with the stops.
pub fn connectors(stops: &[LatLon], path: &[LatLon]) -> Vec<Connector> {
    if path.len() <= 1 {
        return Vec::new();
    }
    let (Some(first_stop), Some(last_stop)) = (stops.first(), stops.last()) else {
        return Vec::new();
    };
    let (Some(path_start), Some(path_end)) = (path.first(), path.last()) else {
        return Vec::new();
    };

    vec![
        Connector {
            from: *first_stop,
            to: *path_start,
        },
        Connector {
            from: *path_end,
            to: *last_stop,
        },
    ]
}
