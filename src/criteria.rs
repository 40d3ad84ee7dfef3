//! Criteria-based point selection.
//!
//! Scans the interior of a trajectory (positions `1..=n-2`) and marks points
//! that carry motion information a straight chord would erase:
//!
//! - **Speed extremum**: strict local maximum or minimum of the speed profile
//! - **Speed change**: jump to either neighbour larger than a threshold
//! - **Stay point**: time gap to either neighbour longer than a threshold
//!
//! The rules are independent; each one returns its own set and the caller
//! takes the union. All comparisons are strict and epsilon-free.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::kinematics::time_diff_secs;
use crate::GpsPoint;

/// Default abrupt speed change threshold (m/s).
pub const DEFAULT_SPEED_CHANGE_THRESHOLD: f64 = 2.0;

/// Default stay-point time gap threshold (seconds).
pub const DEFAULT_TIME_GAP_THRESHOLD: f64 = 90.0;

/// Positions selected by each criterion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriteriaSelection {
    pub speed_extrema: BTreeSet<usize>,
    pub speed_changes: BTreeSet<usize>,
    pub stay_points: BTreeSet<usize>,
}

impl CriteriaSelection {
    /// Union of all criteria.
    pub fn positions(&self) -> BTreeSet<usize> {
        self.speed_extrema
            .iter()
            .chain(&self.speed_changes)
            .chain(&self.stay_points)
            .copied()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.speed_extrema.is_empty() && self.speed_changes.is_empty() && self.stay_points.is_empty()
    }
}

/// Strict local maxima and minima of the speed profile.
pub fn speed_extrema(speeds: &[f64]) -> BTreeSet<usize> {
    speeds
        .windows(3)
        .enumerate()
        .filter(|(_, w)| {
            let (prev, curr, next) = (w[0], w[1], w[2]);
            (curr > prev && curr > next) || (curr < prev && curr < next)
        })
        .map(|(i, _)| i + 1)
        .collect()
}

/// Interior positions whose speed differs from either neighbour by more than `threshold`.
pub fn speed_changes(speeds: &[f64], threshold: f64) -> BTreeSet<usize> {
    speeds
        .windows(3)
        .enumerate()
        .filter(|(_, w)| (w[1] - w[0]).abs() > threshold || (w[2] - w[1]).abs() > threshold)
        .map(|(i, _)| i + 1)
        .collect()
}

/// Interior positions with a time gap to either neighbour longer than `gap_secs`.
pub fn stay_points(points: &[GpsPoint], gap_secs: f64) -> BTreeSet<usize> {
    points
        .windows(3)
        .enumerate()
        .filter(|(_, w)| time_diff_secs(&w[0], &w[1]) > gap_secs || time_diff_secs(&w[1], &w[2]) > gap_secs)
        .map(|(i, _)| i + 1)
        .collect()
}

/// Run all three criteria over the interior of a trajectory.
///
/// `speeds` must be the kinematic profile of `points`. Mismatched lengths
/// select nothing.
///
/// # Example
/// ```
/// use trajectory_simplifier::GpsPoint;
/// use trajectory_simplifier::criteria::select_by_criteria;
/// use trajectory_simplifier::kinematics::compute_speeds;
///
/// let points = vec![
///     GpsPoint::new(0.0, 0.0, 0),
///     GpsPoint::new(0.0, 0.0, 100_000),
///     GpsPoint::new(0.0, 0.0, 101_000),
/// ];
/// let speeds = compute_speeds(&points);
/// let selection = select_by_criteria(&points, &speeds, 2.0, 90.0);
/// assert!(selection.stay_points.contains(&1));
/// ```
pub fn select_by_criteria(
    points: &[GpsPoint],
    speeds: &[f64],
    speed_change_threshold: f64,
    time_gap_threshold: f64,
) -> CriteriaSelection {
    if points.len() < 3 || speeds.len() != points.len() {
        return CriteriaSelection::default();
    }

    let selection = CriteriaSelection {
        speed_extrema: speed_extrema(speeds),
        speed_changes: speed_changes(speeds, speed_change_threshold),
        stay_points: stay_points(points, time_gap_threshold),
    };

    log::debug!(
        "[Criteria] {} extrema, {} speed changes, {} stay points over {} points",
        selection.speed_extrema.len(),
        selection.speed_changes.len(),
        selection.stay_points.len(),
        points.len()
    );

    selection
}
