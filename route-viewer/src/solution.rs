//! Solver solution types.
//!
//! These map the `data` payload of a `result` stream event. The solver has
//! two backends that disagree on how a stop reports its delivery:
//! OR-Tools sends `load_before`/`load_after`, Gurobi sends `demand`. Both
//! shapes are collapsed into [`Delivery`] at parse time so nothing
//! downstream needs to check for optional fields.
//!
//! Display strings (`*_formatted`) are passed through untouched; only
//! stop-level timing and geometry are derived locally.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Planar distance in coordinate space (degrees, not metres).
    pub fn planar_distance(&self, other: &LatLon) -> f64 {
        (self.lat - other.lat).hypot(self.lon - other.lon)
    }

    /// Parse a `[lat, lon]` JSON array. Anything else yields `None`.
    fn from_json(value: &Value) -> Option<Self> {
        match value.as_array()?.as_slice() {
            [lat, lon] => Some(Self::new(lat.as_f64()?, lon.as_f64()?)),
            _ => None,
        }
    }
}

/// Whether a stop is the depot or a customer visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopKind {
    Depot,
    Customer,
}

/// Units delivered at a stop, in whichever shape the solver reported it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Delivery {
    /// Gurobi shape: units delivered at this stop.
    Demand(f64),
    /// OR-Tools shape: vehicle load before and after the stop.
    LoadChange { before: f64, after: f64 },
    /// Neither shape present.
    Unreported,
}

impl Delivery {
    /// Units delivered at the stop.
    pub fn units(&self) -> f64 {
        match self {
            Delivery::Demand(units) => *units,
            Delivery::LoadChange { before, after } => before - after,
            Delivery::Unreported => 0.0,
        }
    }

    pub fn is_reported(&self) -> bool {
        !matches!(self, Delivery::Unreported)
    }
}

/// One visit in a vehicle's route.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawStop")]
pub struct StopRecord {
    pub position: Option<LatLon>,
    pub kind: StopKind,
    /// Customer name, or the customer id when no name was given.
    pub customer_ref: Option<String>,
    /// Solver node index of the stop's location.
    pub node: Option<u64>,
    pub arrival_minute: f64,
    pub delivery: Delivery,
    /// Distance from the previous stop.
    pub segment_distance_km: f64,
    pub time_formatted: Option<String>,
    pub time_window_formatted: Option<String>,
}

impl StopRecord {
    pub fn is_depot(&self) -> bool {
        self.kind == StopKind::Depot
    }

    /// Human-readable name for labels.
    pub fn label(&self) -> String {
        if self.is_depot() {
            return "Depot".to_string();
        }
        match (&self.customer_ref, self.node) {
            (Some(name), _) => name.clone(),
            (None, Some(node)) => format!("Customer {node}"),
            (None, None) => "Customer".to_string(),
        }
    }
}

/// Wire shape of a stop, covering both solver backends.
#[derive(Debug, Deserialize)]
struct RawStop {
    #[serde(default)]
    location_info: Option<RawLocationInfo>,
    #[serde(default)]
    location: Option<Value>,
    #[serde(default)]
    arrival_time: Option<f64>,
    #[serde(default)]
    time: Option<f64>,
    #[serde(default)]
    demand: Option<f64>,
    #[serde(default)]
    load_before: Option<f64>,
    #[serde(default)]
    load_after: Option<f64>,
    #[serde(default)]
    segment_distance: Option<f64>,
    #[serde(default)]
    time_formatted: Option<String>,
    #[serde(default)]
    time_window_formatted: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawLocationInfo {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    location: Option<Value>,
    #[serde(default)]
    customer_id: Option<Value>,
    #[serde(default)]
    customer_name: Option<String>,
}

impl From<RawStop> for StopRecord {
    fn from(raw: RawStop) -> Self {
        let delivery = match (raw.demand, raw.load_before, raw.load_after) {
            (Some(demand), _, _) => Delivery::Demand(demand),
            (None, Some(before), Some(after)) => Delivery::LoadChange { before, after },
            _ => Delivery::Unreported,
        };

        let node = raw.location.as_ref().and_then(Value::as_u64);

        let info = raw.location_info.as_ref();
        let kind = match info.and_then(|i| i.kind.as_deref()) {
            Some("depot") => StopKind::Depot,
            Some("customer") => StopKind::Customer,
            // No explicit type: node 0 is the depot, and so is a zero-demand stop.
            _ if node == Some(0) || delivery == Delivery::Demand(0.0) => StopKind::Depot,
            _ => StopKind::Customer,
        };

        let position = info
            .and_then(|i| i.location.as_ref())
            .and_then(LatLon::from_json);

        let customer_ref = info.and_then(|i| {
            i.customer_name
                .clone()
                .filter(|name| !name.is_empty())
                .or_else(|| i.customer_id.as_ref().and_then(value_as_text))
        });

        // A zero `arrival_time` defers to `time`, matching producers that
        // send both with only one populated.
        let arrival_minute = raw
            .arrival_time
            .filter(|t| *t != 0.0)
            .or(raw.time)
            .unwrap_or(0.0);

        Self {
            position,
            kind,
            customer_ref,
            node,
            arrival_minute,
            delivery,
            segment_distance_km: raw.segment_distance.unwrap_or(0.0),
            time_formatted: raw.time_formatted,
            time_window_formatted: raw.time_window_formatted,
        }
    }
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// One vehicle's route.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Route {
    #[serde(default)]
    pub vehicle_id: u64,
    #[serde(default)]
    pub capacity: Option<f64>,
    #[serde(rename = "route", default)]
    pub stops: Vec<StopRecord>,
    #[serde(default)]
    pub num_customers: Option<u64>,
    #[serde(default)]
    pub saturation_pct: Option<f64>,
    #[serde(default)]
    pub distance_formatted: Option<String>,
    #[serde(default)]
    pub duration_formatted: Option<String>,
    #[serde(default)]
    pub load_formatted: Option<String>,
    #[serde(default)]
    pub travel_time_formatted: Option<String>,
    #[serde(default)]
    pub service_time_formatted: Option<String>,
}

impl Route {
    /// Positions of the stops that carry a valid coordinate, in route order.
    pub fn positions(&self) -> Vec<LatLon> {
        self.stops.iter().filter_map(|s| s.position).collect()
    }

    /// Number of customer stops, preferring the solver's own count.
    pub fn customer_count(&self) -> u64 {
        self.num_customers
            .unwrap_or_else(|| self.stops.iter().filter(|s| !s.is_depot()).count() as u64)
    }
}

/// The solver's result payload.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Solution {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default)]
    pub num_vehicles_used: Option<u64>,
    #[serde(default)]
    pub total_vehicles_available: Option<u64>,
    #[serde(default)]
    pub total_trips: Option<u64>,
    #[serde(default)]
    pub average_saturation_pct: Option<f64>,
    #[serde(default)]
    pub total_distance_formatted: Option<String>,
    #[serde(default)]
    pub avg_distance_per_vehicle_formatted: Option<String>,
    #[serde(default)]
    pub total_duration_formatted: Option<String>,
    #[serde(default)]
    pub avg_travel_time_per_vehicle_formatted: Option<String>,
    #[serde(default)]
    pub avg_service_time_per_vehicle_formatted: Option<String>,
}

impl Solution {
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some("success")
    }
}
