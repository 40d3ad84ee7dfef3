//! Kinematic profiling: per-point instantaneous speed.
//!
//! Each speed depends only on the point and its immediate predecessor.
//! Duplicate or out-of-order timestamps produce a speed of 0 rather than an
//! error; [`count_degenerate_timestamps`] reports how often that happened so
//! data-quality issues stay visible.

use crate::geo_utils::haversine_distance;
use crate::{GpsPoint, SpeedSample};

/// Seconds elapsed between two points (may be zero or negative).
///
/// Computed in `f64` so any pair of `i64` timestamps is representable.
pub fn time_diff_secs(from: &GpsPoint, to: &GpsPoint) -> f64 {
    millis_to_secs(from.timestamp, to.timestamp)
}

/// Seconds between two millisecond timestamps without `i64` overflow.
pub fn millis_to_secs(from_ms: i64, to_ms: i64) -> f64 {
    (to_ms as f64 - from_ms as f64) / 1000.0
}

/// Compute instantaneous speed (m/s) for every point.
///
/// The first point has speed 0. Steps whose time difference is not positive
/// also get speed 0.
///
/// # Example
/// ```
/// use trajectory_simplifier::GpsPoint;
/// use trajectory_simplifier::kinematics::compute_speeds;
///
/// let points = vec![
///     GpsPoint::new(0.0, 0.0, 0),
///     GpsPoint::new(0.001, 0.0, 1000),
/// ];
/// let speeds = compute_speeds(&points);
/// assert_eq!(speeds[0], 0.0);
/// assert!((speeds[1] - 111.19).abs() < 0.01);
/// ```
pub fn compute_speeds(points: &[GpsPoint]) -> Vec<f64> {
    if points.is_empty() {
        return Vec::new();
    }

    let mut speeds = Vec::with_capacity(points.len());
    speeds.push(0.0);

    for w in points.windows(2) {
        let dt = time_diff_secs(&w[0], &w[1]);
        let speed = if dt > 0.0 {
            haversine_distance(&w[0], &w[1]) / dt
        } else {
            0.0
        };
        speeds.push(speed);
    }

    speeds
}

/// Pair every point with its derived speed.
pub fn speed_profile(points: &[GpsPoint]) -> Vec<SpeedSample> {
    points
        .iter()
        .zip(compute_speeds(points))
        .map(|(&point, speed_mps)| SpeedSample { point, speed_mps })
        .collect()
}

/// Number of consecutive steps whose timestamp does not strictly increase.
pub fn count_degenerate_timestamps(points: &[GpsPoint]) -> usize {
    points
        .windows(2)
        .filter(|w| w[1].timestamp <= w[0].timestamp)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn equator_line() -> Vec<GpsPoint> {
        vec![
            GpsPoint::new(0.0, 0.0, 0),
            GpsPoint::new(0.001, 0.0, 1000),
            GpsPoint::new(0.002, 0.0, 2000),
        ]
    }

    #[test]
    fn test_speed_determinism() {
        let speeds = compute_speeds(&equator_line());
        assert_eq!(speeds.len(), 3);
        assert_eq!(speeds[0], 0.0);
        assert!((speeds[1] - 111.194_926_6).abs() < 1e-3);
        assert!((speeds[2] - 111.194_926_6).abs() < 1e-3);
    }

    #[test]
    fn test_empty_and_single() {
        assert!(compute_speeds(&[]).is_empty());
        assert_eq!(compute_speeds(&[GpsPoint::new(1.0, 1.0, 5)]), vec![0.0]);
    }

    #[test]
    fn test_duplicate_and_backwards_timestamps() {
        let points = vec![
            GpsPoint::new(0.0, 0.0, 1000),
            GpsPoint::new(0.001, 0.0, 1000),
            GpsPoint::new(0.002, 0.0, 500),
            GpsPoint::new(0.003, 0.0, 1500),
        ];
        let speeds = compute_speeds(&points);
        assert_eq!(speeds[1], 0.0);
        assert_eq!(speeds[2], 0.0);
        assert!(speeds[3] > 0.0);
        assert_eq!(count_degenerate_timestamps(&points), 2);
    }

    #[test]
    fn test_extreme_timestamps_do_not_overflow() {
        let points = vec![
            GpsPoint::new(0.0, 0.0, i64::MIN),
            GpsPoint::new(0.001, 0.0, i64::MAX),
            GpsPoint::new(0.002, 0.0, i64::MIN),
        ];
        let speeds = compute_speeds(&points);
        assert_eq!(speeds.len(), 3);
        assert!(speeds[1] >= 0.0 && speeds[1].is_finite());
        assert_eq!(speeds[2], 0.0);
        assert!(time_diff_secs(&points[0], &points[1]) > 0.0);
        assert!(time_diff_secs(&points[1], &points[2]) < 0.0);
        assert_eq!(count_degenerate_timestamps(&points), 1);
    }

    #[test]
    fn test_speed_profile_carries_points() {
        let points = equator_line();
        let profile = speed_profile(&points);
        assert_eq!(profile.len(), 3);
        assert_eq!(profile[2].point, points[2]);
        assert!(profile.iter().all(|s| s.speed_mps >= 0.0));
    }
}
