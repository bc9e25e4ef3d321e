//! Application state for the web layer.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::geometry::{GeometryResolver, RouteMapView, RoutingEngine};
use crate::schedule::ServiceTimeModel;
use crate::session::{SolveSession, SolveTransport};

/// Shared application state.
///
/// Generic over the solve transport and routing engine so handlers can be
/// exercised without a network.
pub struct AppState<T, E> {
    /// The one solve session this server drives
    pub session: Arc<Mutex<SolveSession<T>>>,

    /// Open map views, keyed by route index in the current solution
    pub maps: Arc<Mutex<HashMap<usize, RouteMapView<E>>>>,

    pub resolver: Arc<GeometryResolver<E>>,

    pub service_model: ServiceTimeModel,
}

impl<T: SolveTransport, E: RoutingEngine> AppState<T, E> {
    /// Create a new app state.
    pub fn new(
        transport: T,
        resolver: GeometryResolver<E>,
        service_model: ServiceTimeModel,
    ) -> Self {
        Self {
            session: Arc::new(Mutex::new(SolveSession::new(transport))),
            maps: Arc::new(Mutex::new(HashMap::new())),
            resolver: Arc::new(resolver),
            service_model,
        }
    }
}

// Derived Clone would require T: Clone and E: Clone.
impl<T, E> Clone for AppState<T, E> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
            maps: Arc::clone(&self.maps),
            resolver: Arc::clone(&self.resolver),
            service_model: self.service_model,
        }
    }
}
