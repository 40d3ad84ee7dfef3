//! Stoppage detection over route segments.
//!
//! A route segment joins two consecutive (usually simplified) points and
//! carries the distance travelled between them. A window of segments is a
//! stoppage when the vehicle took longer than cruising would need, or when
//! it barely moved but the window lasted longer than the time threshold.
//!
//! Segment distances normally come from a routing service and are read with
//! [`read_segments`](crate::geojson::read_segments). Without them,
//! [`segments_from_points`] uses straight-line haversine distance.

use serde::{Deserialize, Serialize};

use crate::geo_utils::haversine_distance;
use crate::kinematics::millis_to_secs;
use crate::GpsPoint;

/// Configuration for stoppage detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoppageConfig {
    /// Expected moving speed in m/s. Default: 20 km/h
    pub cruise_speed_mps: f64,
    /// Windows shorter than this (meters) are judged on time alone. Default: 10.0
    pub distance_threshold_m: f64,
    /// Maximum lingering time (seconds) for short windows. Default: 60.0
    pub time_threshold_s: f64,
}

impl Default for StoppageConfig {
    fn default() -> Self {
        Self {
            cruise_speed_mps: 20.0 * 1000.0 / 3600.0,
            distance_threshold_m: 10.0,
            time_threshold_s: 60.0,
        }
    }
}

impl StoppageConfig {
    /// Build a config from a cruise speed in km/h and default thresholds.
    pub fn with_cruise_speed_kmh(kmh: f64) -> Self {
        Self {
            cruise_speed_mps: kmh * 1000.0 / 3600.0,
            ..Self::default()
        }
    }
}

/// A travelled segment between two points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSegment {
    pub index: usize,
    pub start: GpsPoint,
    pub end: GpsPoint,
    pub route_distance_m: f64,
    pub start_time_ms: i64,
    pub end_time_ms: i64,
}

impl RouteSegment {
    /// Straight-line segment between two fixes.
    pub fn between(index: usize, start: GpsPoint, end: GpsPoint) -> Self {
        Self {
            index,
            route_distance_m: haversine_distance(&start, &end),
            start_time_ms: start.timestamp,
            end_time_ms: end.timestamp,
            start,
            end,
        }
    }
}

/// A detected stop, located at the start of the window that triggered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stoppage {
    pub segment_index: usize,
    pub location: GpsPoint,
    pub start_time_ms: i64,
    pub end_time_ms: i64,
    pub route_distance_m: f64,
}

impl Stoppage {
    fn from_segment(segment: &RouteSegment) -> Self {
        Self {
            segment_index: segment.index,
            location: segment.start,
            start_time_ms: segment.start_time_ms,
            end_time_ms: segment.end_time_ms,
            route_distance_m: segment.route_distance_m,
        }
    }
}

/// Straight-line segments between consecutive points.
pub fn segments_from_points(points: &[GpsPoint]) -> Vec<RouteSegment> {
    points
        .windows(2)
        .enumerate()
        .map(|(i, w)| RouteSegment::between(i, w[0], w[1]))
        .collect()
}

/// Detect stoppages with a two-pointer window over `segments`.
///
/// The window `[start, end]` covers the summed segment distance and the time
/// from the start of `start` to the end of `end`. Long windows are compared
/// against the time cruising would need; short windows against the fixed
/// time threshold. The window start only moves past a short window once a
/// stoppage is recorded, so lingering accumulates across segments.
///
/// # Example
/// ```
/// use trajectory_simplifier::{GpsPoint, StoppageConfig};
/// use trajectory_simplifier::stoppage::{detect_stoppages, segments_from_points};
///
/// // Standing still for two minutes, then moving on
/// let points = vec![
///     GpsPoint::new(0.0, 0.0, 0),
///     GpsPoint::new(0.0, 0.0, 60_000),
///     GpsPoint::new(0.0, 0.0, 120_000),
///     GpsPoint::new(0.0, 0.01, 300_000),
/// ];
/// let stops = detect_stoppages(&segments_from_points(&points), &StoppageConfig::default());
/// assert_eq!(stops[0].segment_index, 0);
/// ```
pub fn detect_stoppages(segments: &[RouteSegment], config: &StoppageConfig) -> Vec<Stoppage> {
    let mut stoppages = Vec::new();
    let mut start = 0;
    let mut end = 1;

    while end < segments.len() {
        let distance: f64 = segments[start..=end]
            .iter()
            .map(|s| s.route_distance_m)
            .sum();
        let elapsed_s = millis_to_secs(segments[start].start_time_ms, segments[end].end_time_ms);

        if distance > config.distance_threshold_m {
            let expected_s = distance / config.cruise_speed_mps;
            if elapsed_s > expected_s {
                stoppages.push(Stoppage::from_segment(&segments[start]));
            }
            start = end;
        } else if elapsed_s > config.time_threshold_s {
            stoppages.push(Stoppage::from_segment(&segments[start]));
            start = end;
        }
        end += 1;
    }

    log::debug!(
        "[Stoppage] {} stoppages over {} segments",
        stoppages.len(),
        segments.len()
    );

    stoppages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo_utils::METERS_PER_DEGREE_LAT;

    /// Segments along the equator from (meters, seconds) steps.
    fn segments(steps: &[(f64, i64)]) -> Vec<RouteSegment> {
        let mut points = vec![GpsPoint::new(0.0, 0.0, 0)];
        for &(meters, secs) in steps {
            let last = *points.last().unwrap();
            points.push(GpsPoint::new(
                0.0,
                last.longitude + meters / METERS_PER_DEGREE_LAT,
                last.timestamp + secs * 1000,
            ));
        }
        segments_from_points(&points)
    }

    #[test]
    fn test_default_config() {
        let config = StoppageConfig::default();
        assert!((config.cruise_speed_mps - 5.5556).abs() < 1e-4);
        assert_eq!(config.distance_threshold_m, 10.0);
        assert_eq!(config.time_threshold_s, 60.0);
        assert_eq!(
            StoppageConfig::with_cruise_speed_kmh(36.0).cruise_speed_mps,
            10.0
        );
    }

    #[test]
    fn test_segments_from_points() {
        let segs = segments(&[(100.0, 10), (50.0, 5)]);
        assert_eq!(segs.len(), 2);
        assert!((segs[0].route_distance_m - 100.0).abs() < 1e-6);
        assert_eq!(segs[1].start_time_ms, 10_000);
        assert_eq!(segs[1].end_time_ms, 15_000);
        assert!(segments_from_points(&[GpsPoint::new(0.0, 0.0, 0)]).is_empty());
    }

    #[test]
    fn test_moving_at_cruise_speed_no_stops() {
        // 100 m every 10 s = 10 m/s, faster than 5.56 m/s
        let segs = segments(&[(100.0, 10); 6]);
        assert!(detect_stoppages(&segs, &StoppageConfig::default()).is_empty());
    }

    #[test]
    fn test_slow_window_is_stoppage() {
        // Second window: 200 m in 100 s, slower than cruise
        let segs = segments(&[(100.0, 10), (100.0, 90), (100.0, 10)]);
        let stops = detect_stoppages(&segs, &StoppageConfig::default());
        assert_eq!(stops.len(), 2);
        assert_eq!(stops[0].segment_index, 0);
        assert_eq!(stops[1].segment_index, 1);
    }

    #[test]
    fn test_lingering_accumulates() {
        // Tiny moves, 40 s each: window 0..=1 is 80 s > 60 s
        let segs = segments(&[(1.0, 40), (1.0, 40), (1.0, 40), (1.0, 40)]);
        let stops = detect_stoppages(&segs, &StoppageConfig::default());
        assert_eq!(stops[0].segment_index, 0);
        assert!((stops[0].route_distance_m - 1.0).abs() < 1e-6);
        // Window restarts at 1 and 1..=2 lingers 80 s as well
        assert_eq!(stops[1].segment_index, 1);
    }

    #[test]
    fn test_short_quick_window_not_stoppage() {
        let segs = segments(&[(1.0, 5), (1.0, 5), (1.0, 5)]);
        assert!(detect_stoppages(&segs, &StoppageConfig::default()).is_empty());
    }

    #[test]
    fn test_extreme_segment_times() {
        let mut segs = segments(&[(1.0, 1), (1.0, 1)]);
        segs[0].start_time_ms = i64::MIN;
        segs[1].end_time_ms = i64::MAX;
        let stops = detect_stoppages(&segs, &StoppageConfig::default());
        assert_eq!(stops.len(), 1);
        assert_eq!(stops[0].start_time_ms, i64::MIN);
    }

    #[test]
    fn test_too_few_segments() {
        assert!(detect_stoppages(&[], &StoppageConfig::default()).is_empty());
        let segs = segments(&[(1.0, 500)]);
        assert!(detect_stoppages(&segs, &StoppageConfig::default()).is_empty());
    }
}
