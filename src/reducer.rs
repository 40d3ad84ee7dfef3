//! Geometric reduction: enhanced Douglas-Peucker over index ranges.
//!
//! For a range `[start, end]` the interior point farthest from the line
//! through the two range endpoints is retained if its distance exceeds the
//! threshold, and both halves are processed again. Ranges are kept on an
//! explicit work-list, so arbitrarily long tracks cannot overflow the stack.
//!
//! The reducer returns its own set of positions. It never sees the criteria
//! selection; the orchestrator merges the two.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::geo_utils::{perpendicular_distance, perpendicular_distance_meters};
use crate::GpsPoint;

/// Default geometric deviation threshold.
pub const DEFAULT_DP_THRESHOLD: f64 = 10.0;

/// Ranges shorter than this are reduced sequentially by [`reduce_parallel`].
#[cfg(feature = "parallel")]
const PARALLEL_MIN_RANGE: usize = 4096;

#[cfg(feature = "parallel")]
const MAX_FORK_DEPTH: usize = 24;

/// How the perpendicular distance to a chord is measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChordMetric {
    /// Cross-product formula in raw (longitude, latitude) degree space.
    #[default]
    Degrees,
    /// Same formula on a local equirectangular projection, in meters.
    Meters,
}

impl ChordMetric {
    /// Perpendicular distance from `point` to the line through `start` and `end`.
    pub fn distance(self, point: &GpsPoint, start: &GpsPoint, end: &GpsPoint) -> f64 {
        match self {
            ChordMetric::Degrees => perpendicular_distance(point, start, end),
            ChordMetric::Meters => perpendicular_distance_meters(point, start, end),
        }
    }
}

impl std::str::FromStr for ChordMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "degrees" | "deg" => Ok(ChordMetric::Degrees),
            "meters" | "m" => Ok(ChordMetric::Meters),
            other => Err(format!("unknown chord metric '{}'", other)),
        }
    }
}

/// Interior position of `[start, end]` farthest from the chord, if any is
/// strictly farther than `threshold`. Ties keep the earliest position.
fn farthest_beyond(
    points: &[GpsPoint],
    start: usize,
    end: usize,
    threshold: f64,
    metric: ChordMetric,
) -> Option<usize> {
    let (a, b) = (&points[start], &points[end]);
    let mut max_dist = 0.0;
    let mut max_pos = None;

    for (offset, p) in points[start + 1..end].iter().enumerate() {
        let dist = metric.distance(p, a, b);
        if dist > max_dist {
            max_dist = dist;
            max_pos = Some(start + 1 + offset);
        }
    }

    max_pos.filter(|_| max_dist > threshold)
}

fn valid_range(points: &[GpsPoint], start: usize, end: usize) -> bool {
    start < end && end < points.len()
}

/// Reduce `points[start..=end]`, adding retained interior positions to `retained`.
///
/// Range endpoints are never added here; the caller decides about them.
pub fn reduce_into(
    points: &[GpsPoint],
    start: usize,
    end: usize,
    threshold: f64,
    metric: ChordMetric,
    retained: &mut BTreeSet<usize>,
) {
    if !valid_range(points, start, end) {
        return;
    }

    let mut work = vec![(start, end)];
    while let Some((s, e)) = work.pop() {
        if e - s <= 1 {
            continue;
        }
        if let Some(pos) = farthest_beyond(points, s, e, threshold, metric) {
            retained.insert(pos);
            work.push((pos, e));
            work.push((s, pos));
        }
    }
}

/// Reduce `points[start..=end]` and return the retained interior positions.
///
/// # Example
/// ```
/// use trajectory_simplifier::GpsPoint;
/// use trajectory_simplifier::reducer::{reduce, ChordMetric};
///
/// let points = vec![
///     GpsPoint::new(0.0, 0.0, 0),
///     GpsPoint::new(1.0, 1.0, 1000),
///     GpsPoint::new(0.0, 2.0, 2000),
/// ];
/// let kept = reduce(&points, 0, 2, 0.5, ChordMetric::Degrees);
/// assert!(kept.contains(&1));
/// ```
pub fn reduce(
    points: &[GpsPoint],
    start: usize,
    end: usize,
    threshold: f64,
    metric: ChordMetric,
) -> BTreeSet<usize> {
    let mut retained = BTreeSet::new();
    reduce_into(points, start, end, threshold, metric, &mut retained);
    retained
}

/// Fork-join variant of [`reduce`].
///
/// Both halves of every split run through `rayon::join` and their sets are
/// merged on the way back, so no shared mutable state is involved. The result
/// is identical to [`reduce`].
#[cfg(feature = "parallel")]
pub fn reduce_parallel(
    points: &[GpsPoint],
    start: usize,
    end: usize,
    threshold: f64,
    metric: ChordMetric,
) -> BTreeSet<usize> {
    if !valid_range(points, start, end) {
        return BTreeSet::new();
    }
    fork_join(points, start, end, threshold, metric, 0)
}

#[cfg(feature = "parallel")]
fn fork_join(
    points: &[GpsPoint],
    start: usize,
    end: usize,
    threshold: f64,
    metric: ChordMetric,
    depth: usize,
) -> BTreeSet<usize> {
    // Unbalanced splits would otherwise nest one join per retained point
    if end - start < PARALLEL_MIN_RANGE || depth >= MAX_FORK_DEPTH {
        return reduce(points, start, end, threshold, metric);
    }

    match farthest_beyond(points, start, end, threshold, metric) {
        None => BTreeSet::new(),
        Some(pos) => {
            let (mut left, mut right) = rayon::join(
                || fork_join(points, start, pos, threshold, metric, depth + 1),
                || fork_join(points, pos, end, threshold, metric, depth + 1),
            );
            if left.len() < right.len() {
                std::mem::swap(&mut left, &mut right);
            }
            left.append(&mut right);
            left.insert(pos);
            left
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(f64, f64)]) -> Vec<GpsPoint> {
        coords
            .iter()
            .enumerate()
            .map(|(i, &(lat, lon))| GpsPoint::new(lat, lon, i as i64 * 1000))
            .collect()
    }

    /// Zig-zag with decreasing amplitude so every vertex matters at small thresholds.
    fn zigzag(n: usize) -> Vec<GpsPoint> {
        (0..n)
            .map(|i| {
                let amp = 0.01 / (1.0 + (i % 7) as f64);
                let lat = if i % 2 == 0 { amp } else { -amp };
                GpsPoint::new(lat, i as f64 * 0.001, i as i64 * 1000)
            })
            .collect()
    }

    #[test]
    fn test_no_interior_points() {
        let points = pts(&[(0.0, 0.0), (1.0, 1.0)]);
        assert!(reduce(&points, 0, 1, 0.0, ChordMetric::Degrees).is_empty());
    }

    #[test]
    fn test_collinear_reduces_to_nothing() {
        let points = pts(&[(0.0, 0.0), (0.0, 1.0), (0.0, 2.0), (0.0, 3.0)]);
        assert!(reduce(&points, 0, 3, 1e-9, ChordMetric::Degrees).is_empty());
        assert!(reduce(&points, 0, 3, 1e-9, ChordMetric::Meters).is_empty());
    }

    #[test]
    fn test_recursive_split() {
        // Peak at 2, smaller bump at 4 relative to chord 2->6
        let points = pts(&[
            (0.0, 0.0),
            (1.0, 1.0),
            (3.0, 2.0),
            (1.5, 3.0),
            (1.0, 4.0),
            (0.5, 5.0),
            (0.0, 6.0),
        ]);
        let kept = reduce(&points, 0, 6, 0.4, ChordMetric::Degrees);
        assert!(kept.contains(&2));
        assert!(!kept.contains(&0) && !kept.contains(&6));
    }

    #[test]
    fn test_threshold_is_strict() {
        let points = pts(&[(0.0, 0.0), (1.0, 1.0), (0.0, 2.0)]);
        assert!(reduce(&points, 0, 2, 1.0, ChordMetric::Degrees).is_empty());
        assert_eq!(
            reduce(&points, 0, 2, 0.999, ChordMetric::Degrees),
            BTreeSet::from([1])
        );
    }

    #[test]
    fn test_coincident_chord_keeps_nothing() {
        // Closed loop: start == end, every distance is defined as 0
        let points = pts(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]);
        assert!(reduce(&points, 0, 3, 0.0, ChordMetric::Degrees).is_empty());
    }

    #[test]
    fn test_sub_range() {
        let points = zigzag(20);
        let kept = reduce(&points, 5, 12, 0.0, ChordMetric::Degrees);
        assert!(kept.iter().all(|&i| i > 5 && i < 12));
    }

    #[test]
    fn test_invalid_range() {
        let points = zigzag(5);
        assert!(reduce(&points, 3, 1, 0.0, ChordMetric::Degrees).is_empty());
        assert!(reduce(&points, 0, 10, 0.0, ChordMetric::Degrees).is_empty());
    }

    #[test]
    fn test_monotonic_in_threshold() {
        let points = zigzag(200);
        let mut previous = usize::MAX;
        for threshold in [0.0, 0.001, 0.002, 0.004, 0.008, 0.02] {
            let count = reduce(&points, 0, 199, threshold, ChordMetric::Degrees).len();
            assert!(count <= previous, "threshold {} kept {}", threshold, count);
            previous = count;
        }
    }

    #[test]
    fn test_meters_metric() {
        // ~11 m bump on a ~1.1 km chord
        let points = pts(&[(0.0, 0.0), (0.0001, 0.005), (0.0, 0.01)]);
        assert_eq!(
            reduce(&points, 0, 2, 10.0, ChordMetric::Meters),
            BTreeSet::from([1])
        );
        assert!(reduce(&points, 0, 2, 12.0, ChordMetric::Meters).is_empty());
        // The same threshold in degree space keeps nothing
        assert!(reduce(&points, 0, 2, 10.0, ChordMetric::Degrees).is_empty());
    }

    #[test]
    fn test_metric_from_str() {
        assert_eq!("meters".parse::<ChordMetric>(), Ok(ChordMetric::Meters));
        assert_eq!("Degrees".parse::<ChordMetric>(), Ok(ChordMetric::Degrees));
        assert!("furlongs".parse::<ChordMetric>().is_err());
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let points: Vec<GpsPoint> = (0..20_000)
            .map(|i| {
                let t = i as f64 / 20_000.0;
                let lat = 0.05 * (t * 40.0 * std::f64::consts::PI).sin() + 0.001 * (i % 3) as f64;
                GpsPoint::new(lat, t * 2.0, i as i64 * 1000)
            })
            .collect();
        let end = points.len() - 1;
        for threshold in [0.0, 0.003] {
            assert_eq!(
                reduce_parallel(&points, 0, end, threshold, ChordMetric::Degrees),
                reduce(&points, 0, end, threshold, ChordMetric::Degrees)
            );
        }
    }
}
