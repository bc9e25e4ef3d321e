//! Route geometry for map display.
//!
//! Stops are resolved to a road-following path through a routing engine
//! (OSRM over HTTP). When that fails the stops are joined by straight
//! lines instead; a map view always ends up drawable.

mod badges;
mod error;
mod markers;
mod osrm;
mod resolver;
mod view;

pub use badges::{Badge, nearest_index, place_badges};
pub use error::GeometryError;
pub use markers::{Connector, MarkerKind, StopMarker, connectors, stop_markers};
pub use osrm::{OsrmClient, OsrmConfig};
pub use resolver::{GeometryResolver, ResolvedPath, ResolverConfig, RoutingEngine};
pub use view::{MapViewState, RouteGeometry, RouteMapView};

#[cfg(test)]
pub(crate) use resolver::testing;
