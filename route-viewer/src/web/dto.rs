//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::geometry::MapViewState;
use crate::problem::{ProblemCounts, ProblemSelection, SelectionError};
use crate::schedule::ServiceTimeModel;
use crate::session::{LogEntry, SessionFailure, SessionState, SessionStatus, SolveOptions, SolverKind};
use crate::solution::{Route, Solution};

/// Query parameters for starting a solve.
#[derive(Debug, Default, Deserialize)]
pub struct SolveQuery {
    /// Solver time limit in seconds
    pub time_limit: Option<u32>,

    /// `ortools` or `gurobi`
    pub solver: Option<SolverKind>,

    /// Omitted to use the solver's own default
    pub vehicle_penalty_weight: Option<f64>,

    pub distance_weight: Option<f64>,

    /// Gurobi only
    pub mip_gap: Option<f64>,

    /// Comma-separated vehicle indices to keep (e.g., "0,2")
    pub vehicles: Option<String>,

    /// Comma-separated customer indices to keep
    pub customers: Option<String>,
}

impl SolveQuery {
    /// Solve options with defaults for anything not given.
    pub fn options(&self) -> SolveOptions {
        let mut options = SolveOptions::new(self.solver.unwrap_or_default());
        if let Some(secs) = self.time_limit {
            options = options.with_time_limit(secs);
        }
        if let Some(weight) = self.vehicle_penalty_weight {
            options = options.with_vehicle_penalty(weight);
        }
        if let Some(weight) = self.distance_weight {
            options = options.with_distance_weight(weight);
        }
        if let Some(gap) = self.mip_gap {
            options = options.with_mip_gap(gap);
        }
        options
    }

    pub fn selection(&self) -> Result<ProblemSelection, SelectionError> {
        ProblemSelection::parse(self.vehicles.as_deref(), self.customers.as_deref())
    }
}

/// Response to a successfully started solve.
#[derive(Debug, Serialize)]
pub struct SolveStartedResponse {
    pub session_id: u64,

    /// Sizes of the problem actually sent
    pub problem: ProblemCounts,

    /// Penalty the solver applies per vehicle, after solver defaults
    pub vehicle_penalty_weight: f64,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    /// Whether a running session was cancelled
    pub cancelled: bool,
}

/// Current session state.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: u64,
    pub status: SessionStatus,
    pub logs: Vec<LogEntry>,
    pub error: Option<SessionFailure>,
    pub has_solution: bool,
}

impl SessionResponse {
    pub fn from_state(state: SessionState) -> Self {
        Self {
            session_id: state.session_id,
            status: state.status,
            has_solution: state.solution.is_some(),
            logs: state.logs,
            error: state.error,
        }
    }
}

/// A route in the solution summary.
#[derive(Debug, Serialize)]
pub struct RouteSummary {
    /// Index to use with `/routes/{index}/map`
    pub index: usize,

    pub vehicle_id: u64,
    pub num_customers: u64,
    pub num_stops: usize,
    pub capacity: Option<f64>,
    pub saturation_pct: Option<f64>,
    pub distance_formatted: Option<String>,
    pub duration_formatted: Option<String>,
    pub load_formatted: Option<String>,
    pub travel_time_formatted: Option<String>,
    pub service_time_formatted: Option<String>,

    /// Minutes spent unloading under the local service-time model
    pub service_minutes: f64,
}

impl RouteSummary {
    pub fn from_route(index: usize, route: &Route, model: &ServiceTimeModel) -> Self {
        Self {
            index,
            vehicle_id: route.vehicle_id,
            num_customers: route.customer_count(),
            num_stops: route.stops.len(),
            capacity: route.capacity,
            saturation_pct: route.saturation_pct,
            distance_formatted: route.distance_formatted.clone(),
            duration_formatted: route.duration_formatted.clone(),
            load_formatted: route.load_formatted.clone(),
            travel_time_formatted: route.travel_time_formatted.clone(),
            service_time_formatted: route.service_time_formatted.clone(),
            service_minutes: route.stops.iter().map(|s| model.service_minutes(s)).sum(),
        }
    }
}

/// Solution summary.
#[derive(Debug, Serialize)]
pub struct SolutionResponse {
    pub status: Option<String>,
    /// Whether the solver reported `"success"`
    pub success: bool,
    pub num_vehicles_used: Option<u64>,
    pub total_vehicles_available: Option<u64>,
    pub total_trips: Option<u64>,
    pub average_saturation_pct: Option<f64>,
    pub total_distance_formatted: Option<String>,
    pub avg_distance_per_vehicle_formatted: Option<String>,
    pub total_duration_formatted: Option<String>,
    pub avg_travel_time_per_vehicle_formatted: Option<String>,
    pub avg_service_time_per_vehicle_formatted: Option<String>,
    pub routes: Vec<RouteSummary>,
}

impl SolutionResponse {
    pub fn from_solution(solution: &Solution, model: &ServiceTimeModel) -> Self {
        Self {
            status: solution.status.clone(),
            success: solution.is_success(),
            num_vehicles_used: solution.num_vehicles_used,
            total_vehicles_available: solution.total_vehicles_available,
            total_trips: solution.total_trips,
            average_saturation_pct: solution.average_saturation_pct,
            total_distance_formatted: solution.total_distance_formatted.clone(),
            avg_distance_per_vehicle_formatted: solution.avg_distance_per_vehicle_formatted.clone(),
            total_duration_formatted: solution.total_duration_formatted.clone(),
            avg_travel_time_per_vehicle_formatted: solution
                .avg_travel_time_per_vehicle_formatted
                .clone(),
            avg_service_time_per_vehicle_formatted: solution
                .avg_service_time_per_vehicle_formatted
                .clone(),
            routes: solution
                .routes
                .iter()
                .enumerate()
                .map(|(i, r)| RouteSummary::from_route(i, r, model))
                .collect(),
        }
    }
}

/// Map view state for one route.
#[derive(Debug, Serialize)]
pub struct MapResponse {
    pub index: usize,

    /// Token of the latest open
    pub token: u64,

    #[serde(flatten)]
    pub view: MapViewState,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}
