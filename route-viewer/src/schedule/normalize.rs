//! Per-stop timing in one canonical shape.

use serde::Serialize;

use crate::solution::StopRecord;

/// Service duration as a function of delivered units.
///
/// This is a visualisation model, not something the solver reports. The
/// default `10 + 2 * units` must be kept identical across solver backends
/// so their timelines are comparable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServiceTimeModel {
    /// Fixed minutes per customer visit.
    pub base_minutes: f64,
    /// Additional minutes per unit delivered.
    pub minutes_per_unit: f64,
}

impl ServiceTimeModel {
    pub fn new(base_minutes: f64, minutes_per_unit: f64) -> Self {
        Self {
            base_minutes,
            minutes_per_unit,
        }
    }

    /// Minutes spent unloading at `stop`. Depots and stops without delivery
    /// data take no service time.
    pub fn service_minutes(&self, stop: &StopRecord) -> f64 {
        if stop.is_depot() || !stop.delivery.is_reported() {
            return 0.0;
        }
        self.base_minutes + self.minutes_per_unit * stop.delivery.units()
    }

    /// Normalise one stop given the departure minute of the stop before it.
    pub fn normalize(
        &self,
        stop: &StopRecord,
        previous_departure_minute: Option<f64>,
    ) -> NormalizedStop {
        let service_minutes = self.service_minutes(stop);
        let arrival_minute = stop.arrival_minute;

        NormalizedStop {
            arrival_minute,
            service_minutes,
            departure_minute: arrival_minute + service_minutes,
            is_depot: stop.is_depot(),
            travel_minutes: previous_departure_minute.map(|dep| arrival_minute - dep),
            segment_distance_km: stop.segment_distance_km,
            label: stop.label(),
        }
    }

    /// Normalise a whole route, threading each departure into the next stop.
    pub fn normalize_route(&self, stops: &[StopRecord]) -> Vec<NormalizedStop> {
        let mut previous_departure = None;
        stops
            .iter()
            .map(|stop| {
                let normalized = self.normalize(stop, previous_departure);
                previous_departure = Some(normalized.departure_minute);
                normalized
            })
            .collect()
    }
}

impl Default for ServiceTimeModel {
    fn default() -> Self {
        Self {
            base_minutes: 10.0,
            minutes_per_unit: 2.0,
        }
    }
}

/// Timing of one stop, independent of which solver produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedStop {
    pub arrival_minute: f64,
    pub service_minutes: f64,
    pub departure_minute: f64,
    pub is_depot: bool,
    /// Minutes from the previous departure to this arrival. `None` for the
    /// first stop of a route.
    pub travel_minutes: Option<f64>,
    pub segment_distance_km: f64,
    pub label: String,
}
