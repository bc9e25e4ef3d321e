//! Schedule view: stop timing and timeline layout.
//!
//! Stops from either solver backend are first normalised into
//! [`NormalizedStop`], then laid out against a window shared by every route
//! of the solution.

mod normalize;
mod timeline;

pub use normalize::{NormalizedStop, ServiceTimeModel};
pub use timeline::{
    AxisMarker, DEFAULT_AXIS_INTERVALS, SegmentKind, Timeline, TimelineError, TimelineRow,
    TimelineSegment, TimelineWindow, axis_markers, build_timeline, layout,
};
