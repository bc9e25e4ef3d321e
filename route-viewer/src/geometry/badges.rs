//! Sequence badges along a drawn route.

use serde::Serialize;

use crate::solution::LatLon;

/// Numbered marker for the leg that ends at `stop_index`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Badge {
    pub stop_index: usize,
    pub anchor: LatLon,
    /// Index into the path the anchor was taken from. `None` when the path
    /// was too short and the anchor is the stop itself.
    pub path_index: Option<usize>,
}

/// Index of the path point nearest to `target`. Ties go to the earliest
/// point. `None` for an empty path.
pub fn nearest_index(path: &[LatLon], target: &LatLon) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, point) in path.iter().enumerate() {
        let d = point.planar_distance(target);
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((i, d)),
        }
    }
    best.map(|(i, _)| i)
}

/// One badge per stop after the first, anchored on the path midway between
/// the points nearest to the previous stop and to this one.
pub fn place_badges(stops: &[LatLon], path: &[LatLon]) -> Vec<Badge> {
    (1..stops.len())
        .map(|i| {
            if path.len() <= 1 {
                return Badge {
                    stop_index: i,
                    anchor: stops[i],
                    path_index: None,
                };
            }

            match (
                nearest_index(path, &stops[i - 1]),
                nearest_index(path, &stops[i]),
            ) {
                (Some(a), Some(b)) => {
                    let mid = (a + b) / 2;
                    Badge {
                        stop_index: i,
                        anchor: path[mid],
                        path_index: Some(mid),
                    }
                }
                _ => Badge {
                    stop_index: i,
                    anchor: stops[i],
                    path_index: None,
                },
            }
        })
        .collect()
}
