//! # Simplification Orchestrator
//!
//! Runs the kinematic profiler, the criteria selector and the geometric
//! reducer over one trajectory and merges their selections.
//!
//! ## Algorithm
//! 1. Validate thresholds and coordinates (fail fast, before any work)
//! 2. Profile speeds once over the full input
//! 3. Retain positions `0` and `n-1`
//! 4. Union the criteria selection (extrema, speed changes, stay points)
//! 5. Union the reducer's selection over `[0, n-1]`
//! 6. Materialize retained points in ascending position order
//!
//! Selectors only ever add positions, so the merge order does not matter.

use std::collections::BTreeMap;
use std::time::Instant;

use log::{debug, info, warn};

use crate::criteria::select_by_criteria;
use crate::kinematics::{compute_speeds, count_degenerate_timestamps};
use crate::{
    ChordMetric, GpsPoint, Result, RetentionReason, SimplificationStats, SimplifiedPoint,
    SimplifiedTrajectory, SimplifyConfig, SimplifyError,
};

/// Stateful front-end holding a validated configuration.
///
/// # Example
/// ```
/// use trajectory_simplifier::{GpsPoint, Simplifier, SimplifyConfig};
///
/// let simplifier = Simplifier::new(SimplifyConfig::default()).unwrap();
/// let out = simplifier.simplify(&[GpsPoint::new(0.0, 0.0, 0)]).unwrap();
/// assert_eq!(out.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Simplifier {
    config: SimplifyConfig,
}

impl Simplifier {
    /// Create a simplifier, rejecting invalid thresholds.
    pub fn new(config: SimplifyConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SimplifyConfig {
        &self.config
    }

    pub fn simplify(&self, points: &[GpsPoint]) -> Result<SimplifiedTrajectory> {
        simplify(points, &self.config)
    }
}

/// Fail on the first point with non-finite or out-of-range coordinates.
fn validate_points(points: &[GpsPoint]) -> Result<()> {
    match points.iter().position(|p| !p.is_valid()) {
        None => Ok(()),
        Some(position) => {
            let p = &points[position];
            Err(SimplifyError::InvalidCoordinates {
                position,
                message: format!("lat={}, lon={}", p.latitude, p.longitude),
            })
        }
    }
}

fn add_reason(
    retained: &mut BTreeMap<usize, Vec<RetentionReason>>,
    positions: impl IntoIterator<Item = usize>,
    reason: RetentionReason,
) {
    for pos in positions {
        let reasons = retained.entry(pos).or_default();
        if !reasons.contains(&reason) {
            reasons.push(reason);
        }
    }
}

/// Simplify a trajectory.
///
/// Returns an order-preserving subsequence of `points` that always contains
/// the first and last point. Empty input gives an empty result; inputs of
/// one or two points are returned unchanged.
///
/// # Errors
/// [`SimplifyError::Config`] for invalid thresholds and
/// [`SimplifyError::InvalidCoordinates`] for non-finite or out-of-range
/// coordinates. Degenerate timestamps and geometry are never errors.
pub fn simplify(points: &[GpsPoint], config: &SimplifyConfig) -> Result<SimplifiedTrajectory> {
    let started = Instant::now();
    config.validate()?;
    validate_points(points)?;

    let n = points.len();
    if n == 0 {
        return Ok(SimplifiedTrajectory::default());
    }

    let speeds = compute_speeds(points);
    let degenerate = count_degenerate_timestamps(points);
    if degenerate > 0 {
        warn!(
            "[Simplify] {} of {} steps have non-increasing timestamps; their speed is set to 0",
            degenerate,
            n - 1
        );
    }

    let mut retained: BTreeMap<usize, Vec<RetentionReason>> = BTreeMap::new();
    add_reason(&mut retained, [0, n - 1], RetentionReason::Endpoint);

    let criteria = select_by_criteria(
        points,
        &speeds,
        config.speed_change_threshold,
        config.time_gap_threshold,
    );
    let criteria_retained = criteria.positions().len();
    add_reason(
        &mut retained,
        criteria.speed_extrema,
        RetentionReason::SpeedExtremum,
    );
    add_reason(
        &mut retained,
        criteria.speed_changes,
        RetentionReason::SpeedChange,
    );
    add_reason(&mut retained, criteria.stay_points, RetentionReason::StayPoint);

    let geometry = reduce_full_range(points, config.dp_threshold, config.chord_metric);
    let geometry_retained = geometry.len();
    add_reason(&mut retained, geometry, RetentionReason::Geometry);

    debug!(
        "[Simplify] criteria kept {}, geometry kept {}, merged {}",
        criteria_retained,
        geometry_retained,
        retained.len()
    );

    let output: Vec<SimplifiedPoint> = retained
        .into_iter()
        .map(|(pos, reasons)| SimplifiedPoint {
            point: points[pos],
            speed_mps: speeds[pos],
            source_position: pos,
            reasons,
        })
        .collect();

    let stats = SimplificationStats {
        input_points: n as u32,
        output_points: output.len() as u32,
        criteria_retained: criteria_retained as u32,
        geometry_retained: geometry_retained as u32,
        degenerate_timestamps: degenerate as u32,
        elapsed_ms: started.elapsed().as_millis() as u64,
    };

    info!(
        "[Simplify] {} -> {} points ({:.1}% kept) in {}ms",
        stats.input_points,
        stats.output_points,
        100.0 * stats.output_points as f64 / stats.input_points as f64,
        stats.elapsed_ms
    );

    Ok(SimplifiedTrajectory {
        points: output,
        stats,
    })
}

#[cfg(not(feature = "parallel"))]
fn reduce_full_range(
    points: &[GpsPoint],
    threshold: f64,
    metric: ChordMetric,
) -> std::collections::BTreeSet<usize> {
    crate::reducer::reduce(points, 0, points.len() - 1, threshold, metric)
}

#[cfg(feature = "parallel")]
fn reduce_full_range(
    points: &[GpsPoint],
    threshold: f64,
    metric: ChordMetric,
) -> std::collections::BTreeSet<usize> {
    crate::reducer::reduce_parallel(points, 0, points.len() - 1, threshold, metric)
}

/// Simplify with explicit thresholds and the default chord metric.
///
/// # Example
/// ```
/// use trajectory_simplifier::{simplify_with_thresholds, GpsPoint};
///
/// let points = vec![
///     GpsPoint::new(0.0, 0.0, 0),
///     GpsPoint::new(0.0, 0.0, 100_000),
///     GpsPoint::new(0.0, 0.0, 101_000),
/// ];
/// let out = simplify_with_thresholds(&points, 10.0, 2.0, 90.0).unwrap();
/// assert_eq!(out.len(), 3);
/// ```
pub fn simplify_with_thresholds(
    points: &[GpsPoint],
    dp_threshold: f64,
    speed_change_threshold: f64,
    time_gap_threshold: f64,
) -> Result<SimplifiedTrajectory> {
    let config = SimplifyConfig {
        dp_threshold,
        speed_change_threshold,
        time_gap_threshold,
        ..SimplifyConfig::default()
    };
    simplify(points, &config)
}
