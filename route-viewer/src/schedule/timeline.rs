//! Proportional timeline layout.
//!
//! All routes of a solution share one [`TimelineWindow`] so their bars line
//! up. Segment positions are fractions of the window, independent of how
//! they end up being drawn.

use serde::Serialize;

use crate::solution::Solution;

use super::normalize::{NormalizedStop, ServiceTimeModel};

/// Minutes per window bucket; the window snaps outward to whole hours.
const BUCKET_MINUTES: f64 = 60.0;

/// Number of axis intervals in a default timeline.
pub const DEFAULT_AXIS_INTERVALS: usize = 8;

/// Timeline cannot be laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TimelineError {
    /// No routes, only empty routes, or a zero-length window.
    #[error("no timeline data")]
    NoData,
}

/// Global time span covering every route of a solution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimelineWindow {
    pub min_minute: f64,
    pub max_minute: f64,
}

impl TimelineWindow {
    /// Window from the earliest arrival to the latest departure across
    /// `routes`, floored and ceiled to whole hours.
    pub fn for_routes<'a, I>(routes: I) -> Result<Self, TimelineError>
    where
        I: IntoIterator<Item = &'a [NormalizedStop]>,
    {
        let mut earliest = f64::INFINITY;
        let mut latest = f64::NEG_INFINITY;

        for stop in routes.into_iter().flatten() {
            if stop.arrival_minute.is_finite() {
                earliest = earliest.min(stop.arrival_minute);
            }
            if stop.departure_minute.is_finite() {
                latest = latest.max(stop.departure_minute);
            }
        }

        if !earliest.is_finite() || !latest.is_finite() {
            return Err(TimelineError::NoData);
        }

        let window = Self {
            min_minute: (earliest / BUCKET_MINUTES).floor() * BUCKET_MINUTES,
            max_minute: (latest / BUCKET_MINUTES).ceil() * BUCKET_MINUTES,
        };

        if window.duration() <= 0.0 {
            return Err(TimelineError::NoData);
        }
        Ok(window)
    }

    pub fn duration(&self) -> f64 {
        self.max_minute - self.min_minute
    }

    /// Position of `minute` as a fraction of the window, clamped to `[0, 1]`.
    pub fn fraction(&self, minute: f64) -> f64 {
        let duration = self.duration();
        if duration <= 0.0 || !minute.is_finite() {
            return 0.0;
        }
        ((minute - self.min_minute) / duration).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    Travel,
    Service,
}

/// One bar on a vehicle's timeline row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineSegment {
    pub kind: SegmentKind,
    pub start_fraction: f64,
    pub width_fraction: f64,
    pub label: String,
}

impl TimelineSegment {
    fn spanning(
        window: &TimelineWindow,
        kind: SegmentKind,
        start_minute: f64,
        end_minute: f64,
        label: String,
    ) -> Self {
        let start = window.fraction(start_minute);
        let end = window.fraction(end_minute);
        Self {
            kind,
            start_fraction: start,
            width_fraction: (end - start).max(0.0),
            label,
        }
    }
}

/// Lay out one route's stops as travel and service segments.
///
/// The first stop is the starting point and draws nothing if it is a depot.
/// Depot stops elsewhere (a return to depot) draw travel only. Segments of
/// zero length are omitted.
pub fn layout(window: &TimelineWindow, stops: &[NormalizedStop]) -> Vec<TimelineSegment> {
    let mut segments = Vec::new();

    for (idx, stop) in stops.iter().enumerate() {
        if idx == 0 && stop.is_depot {
            continue;
        }

        if let Some(travel) = stop.travel_minutes.filter(|t| *t > 0.0) {
            segments.push(TimelineSegment::spanning(
                window,
                SegmentKind::Travel,
                stop.arrival_minute - travel,
                stop.arrival_minute,
                travel_label(stop, travel),
            ));
        }

        if !stop.is_depot && stop.service_minutes > 0.0 {
            segments.push(TimelineSegment::spanning(
                window,
                SegmentKind::Service,
                stop.arrival_minute,
                stop.departure_minute,
                format!("{} min unloading · {}", stop.service_minutes.round(), stop.label),
            ));
        }
    }

    segments
}

fn travel_label(stop: &NormalizedStop, travel_minutes: f64) -> String {
    format!(
        "{:.1} km · {} min → {}",
        stop.segment_distance_km,
        travel_minutes.round(),
        stop.label
    )
}

/// A labelled tick on the time axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisMarker {
    pub fraction: f64,
    /// `HH:MM`, with hours counting past 24 for multi-day windows.
    pub label: String,
}

/// `intervals + 1` evenly spaced markers from window start to end.
pub fn axis_markers(window: &TimelineWindow, intervals: usize) -> Vec<AxisMarker> {
    let intervals = intervals.max(1);
    (0..=intervals)
        .map(|i| {
            let fraction = i as f64 / intervals as f64;
            let minute = window.min_minute + window.duration() * fraction;
            let hours = (minute / 60.0).floor() as i64;
            let minutes = (minute % 60.0).floor() as i64;
            AxisMarker {
                fraction,
                label: format!("{hours:02}:{minutes:02}"),
            }
        })
        .collect()
}

/// Timeline row for one vehicle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineRow {
    pub vehicle_id: u64,
    pub num_customers: u64,
    pub distance_formatted: Option<String>,
    pub segments: Vec<TimelineSegment>,
}

/// Everything the schedule view renders for a solution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timeline {
    pub window: TimelineWindow,
    pub markers: Vec<AxisMarker>,
    pub rows: Vec<TimelineRow>,
}

/// Normalise every route of `solution` and lay out its timeline.
pub fn build_timeline(
    solution: &Solution,
    model: &ServiceTimeModel,
) -> Result<Timeline, TimelineError> {
    let normalized: Vec<Vec<NormalizedStop>> = solution
        .routes
        .iter()
        .map(|route| model.normalize_route(&route.stops))
        .collect();

    let window = TimelineWindow::for_routes(normalized.iter().map(Vec::as_slice))?;

    let rows = solution
        .routes
        .iter()
        .zip(&normalized)
        .map(|(route, stops)| TimelineRow {
            vehicle_id: route.vehicle_id,
            num_customers: route.customer_count(),
            distance_formatted: route.distance_formatted.clone(),
            segments: layout(&window, stops),
        })
        .collect();

    Ok(Timeline {
        window,
        markers: axis_markers(&window, DEFAULT_AXIS_INTERVALS),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalized(arrival: f64, service: f64, is_depot: bool, travel: Option<f64>) -> NormalizedStop {
        NormalizedStop {
            arrival_minute: arrival,
            service_minutes: service,
            departure_minute: arrival + service,
            is_depot,
            travel_minutes: travel,
            segment_distance_km: 3.0,
            label: if is_depot { "Depot".into() } else { "Customer 1".into() },
        }
    }

    fn solution(json: &str) -> Solution {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn window_snaps_to_hours() {
        let stops = vec![
            normalized(125.0, 0.0, true, None),
            normalized(610.0, 0.0, true, Some(485.0)),
        ];
        let window = TimelineWindow::for_routes([stops.as_slice()]).unwrap();

        assert_eq!(window.min_minute, 120.0);
        assert_eq!(window.max_minute, 660.0);
        assert_eq!(window.duration(), 540.0);
    }

    #[test]
    fn window_spans_all_routes() {
        let a = vec![normalized(300.0, 0.0, true, None), normalized(320.0, 20.0, false, Some(20.0))];
        let b = vec![normalized(200.0, 0.0, true, None), normalized(700.0, 10.0, false, Some(500.0))];
        let window = TimelineWindow::for_routes([a.as_slice(), b.as_slice()]).unwrap();

        assert_eq!(window.min_minute, 180.0);
        assert_eq!(window.max_minute, 720.0);
    }

    #[test]
    fn window_uses_departure_for_the_upper_bound() {
        let stops = vec![
            normalized(0.0, 0.0, true, None),
            normalized(55.0, 10.0, false, Some(55.0)),
        ];
        let window = TimelineWindow::for_routes([stops.as_slice()]).unwrap();
        assert_eq!(window.max_minute, 120.0);
    }

    #[test]
    fn empty_input_is_no_data() {
        let none: [&[NormalizedStop]; 0] = [];
        assert_eq!(TimelineWindow::for_routes(none), Err(TimelineError::NoData));

        let empty: Vec<NormalizedStop> = Vec::new();
        assert_eq!(
            TimelineWindow::for_routes([empty.as_slice(), empty.as_slice()]),
            Err(TimelineError::NoData)
        );
    }

    #[test]
    fn zero_duration_window_is_no_data() {
        let stops = vec![normalized(120.0, 0.0, true, None)];
        assert_eq!(
            TimelineWindow::for_routes([stops.as_slice()]),
            Err(TimelineError::NoData)
        );
    }

    #[test]
    fn build_timeline_reports_no_data_for_empty_solution() {
        let model = ServiceTimeModel::default();
        assert_eq!(
            build_timeline(&solution(r#"{"routes":[]}"#), &model),
            Err(TimelineError::NoData)
        );
        assert_eq!(
            build_timeline(&solution(r#"{"routes":[{"route":[]}]}"#), &model),
            Err(TimelineError::NoData)
        );
        assert_eq!(TimelineError::NoData.to_string(), "no timeline data");
    }

    #[test]
    fn first_depot_draws_nothing_and_return_depot_is_travel_only() {
        let window = TimelineWindow {
            min_minute: 0.0,
            max_minute: 120.0,
        };
        let stops = vec![
            normalized(0.0, 0.0, true, None),
            normalized(30.0, 30.0, false, Some(30.0)),
            normalized(90.0, 0.0, true, Some(30.0)),
        ];
        let segments = layout(&window, &stops);
        let kinds: Vec<_> = segments.iter().map(|s| s.kind).collect();

        assert_eq!(
            kinds,
            [SegmentKind::Travel, SegmentKind::Service, SegmentKind::Travel]
        );
        assert_eq!(segments[0].start_fraction, 0.0);
        assert_eq!(segments[0].width_fraction, 0.25);
        assert_eq!(segments[1].start_fraction, 0.25);
        assert_eq!(segments[1].width_fraction, 0.25);
        assert_eq!(segments[2].start_fraction, 0.5);
        assert_eq!(segments[2].width_fraction, 0.25);
        assert!(segments[2].label.ends_with("→ Depot"));
    }

    #[test]
    fn zero_and_negative_travel_are_omitted() {
        let window = TimelineWindow {
            min_minute: 0.0,
            max_minute: 60.0,
        };
        let stops = vec![
            normalized(0.0, 0.0, true, None),
            normalized(0.0, 12.0, false, Some(0.0)),
            normalized(5.0, 12.0, false, Some(-7.0)),
        ];
        let segments = layout(&window, &stops);

        assert!(segments.iter().all(|s| s.kind == SegmentKind::Service));
        assert_eq!(segments.len(), 2);
    }

    #[test]
    fn segments_outside_window_are_clamped() {
        let window = TimelineWindow {
            min_minute: 60.0,
            max_minute: 120.0,
        };
        let stops = vec![
            normalized(0.0, 0.0, true, None),
            normalized(100.0, 40.0, false, Some(70.0)),
        ];
        for segment in layout(&window, &stops) {
            assert!((0.0..=1.0).contains(&segment.start_fraction));
            assert!(segment.width_fraction >= 0.0);
            assert!(segment.start_fraction + segment.width_fraction <= 1.0);
        }
    }

    #[test]
    fn segment_labels() {
        let window = TimelineWindow {
            min_minute: 0.0,
            max_minute: 120.0,
        };
        let stops = vec![
            normalized(0.0, 0.0, true, None),
            normalized(25.0, 16.0, false, Some(25.0)),
        ];
        let segments = layout(&window, &stops);

        assert_eq!(segments[0].label, "3.0 km · 25 min → Customer 1");
        assert_eq!(segments[1].label, "16 min unloading · Customer 1");
    }

    #[test]
    fn axis_markers_are_evenly_spaced() {
        let window = TimelineWindow {
            min_minute: 480.0,
            max_minute: 960.0,
        };
        let markers = axis_markers(&window, 8);

        assert_eq!(markers.len(), 9);
        assert_eq!(markers[0].label, "08:00");
        assert_eq!(markers[1].label, "09:00");
        assert_eq!(markers[8].label, "16:00");
        assert_eq!(markers[4].fraction, 0.5);
    }

    #[test]
    fn axis_hours_run_past_midnight() {
        let window = TimelineWindow {
            min_minute: 1320.0,
            max_minute: 1560.0,
        };
        let markers = axis_markers(&window, 4);
        assert_eq!(markers.last().unwrap().label, "26:00");
        assert_eq!(markers[1].label, "23:00");
    }

    #[test]
    fn build_timeline_for_mixed_solver_shapes() {
        let solution = solution(
            r#"{"routes":[
                {"vehicle_id":0,"distance_formatted":"12.0 km","route":[
                    {"location_info":{"type":"depot"},"time":480,"load_before":10,"load_after":10},
                    {"location_info":{"type":"customer","customer_name":"Forno"},"time":500,"load_before":10,"load_after":6,"segment_distance":5.0},
                    {"location_info":{"type":"depot"},"time":560,"load_before":6,"load_after":6,"segment_distance":7.0}
                ]},
                {"vehicle_id":1,"route":[
                    {"location":0,"arrival_time":450},
                    {"location":5,"arrival_time":470,"demand":2},
                    {"location":0,"arrival_time":520}
                ]}
            ]}"#,
        );
        let timeline = build_timeline(&solution, &ServiceTimeModel::default()).unwrap();

        assert_eq!(timeline.window.min_minute, 420.0);
        assert_eq!(timeline.window.max_minute, 600.0);
        assert_eq!(timeline.markers.len(), DEFAULT_AXIS_INTERVALS + 1);
        assert_eq!(timeline.rows.len(), 2);

        let row0 = &timeline.rows[0];
        assert_eq!(row0.vehicle_id, 0);
        assert_eq!(row0.num_customers, 1);
        assert_eq!(row0.distance_formatted.as_deref(), Some("12.0 km"));
        assert_eq!(row0.segments.len(), 3);
        assert!(row0.segments[1].label.contains("18 min unloading · Forno"));

        let row1 = &timeline.rows[1];
        assert_eq!(row1.segments.len(), 3);
        assert!(row1.segments[1].label.contains("14 min unloading · Customer 5"));
    }
}
