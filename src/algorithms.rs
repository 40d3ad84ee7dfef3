//! # Algorithm Toolbox
//!
//! This module provides direct access to every algorithm in the crate.
//! Use these to plug a single stage into your own pipeline without going
//! through the orchestrator.
//!
//! ## Core Algorithms
//!
//! - **Kinematic profiling**: per-point speed from consecutive fixes
//! - **Criteria selection**: speed extrema, speed changes, stay points
//! - **Geometric reduction**: enhanced Douglas-Peucker over index ranges
//! - **Stoppage detection**: two-pointer window over route segments
//!
//! ## Geographic Utilities
//!
//! - **Haversine Distance**: Great-circle distance between GPS points
//! - **Perpendicular Distance**: Degree-space and meter-space chord distance
//! - **Polyline Length**: Total distance along a path
//! - **Classic Douglas-Peucker**: `geo`-backed segment-distance baseline
//!
//! # Example
//!
//! ```rust
//! use trajectory_simplifier::algorithms::{compute_speeds, haversine_distance, GpsPoint};
//!
//! let a = GpsPoint::new(51.5074, -0.1278, 0);
//! let b = GpsPoint::new(51.5080, -0.1290, 10_000);
//! let distance = haversine_distance(&a, &b);
//! let speeds = compute_speeds(&[a, b]);
//! assert!((speeds[1] - distance / 10.0).abs() < 1e-9);
//! ```

// =============================================================================
// Core Types (re-exported from lib)
// =============================================================================

pub use crate::{
    GpsPoint,
    SpeedSample,
    SimplifyConfig,
    SimplifiedTrajectory,
    SimplifiedPoint,
    RetentionReason,
};

// =============================================================================
// Geographic Utilities
// =============================================================================

pub use crate::geo_utils::{
    haversine,
    haversine_distance,
    perpendicular_distance,
    perpendicular_distance_meters,
    polyline_length,
    meters_per_degree_lon,
};

// =============================================================================
// Kinematics and Criteria
// =============================================================================

/// Per-point speed in m/s; first point and non-increasing timestamps give 0.
pub use crate::kinematics::compute_speeds;
/// Points paired with their speed.
pub use crate::kinematics::speed_profile;

/// All three criteria at once.
pub use crate::criteria::select_by_criteria;
/// Strict local speed maxima and minima.
pub use crate::criteria::speed_extrema;
/// Speed jumps above a threshold.
pub use crate::criteria::speed_changes;
/// Time gaps above a threshold.
pub use crate::criteria::stay_points;

// =============================================================================
// Geometric Reduction
// =============================================================================

/// Enhanced Douglas-Peucker over an index range (line distance, explicit work-list).
pub use crate::reducer::reduce;
/// Same, accumulating into a caller-owned set.
pub use crate::reducer::reduce_into;
/// Fork-join reduction with rayon.
#[cfg(feature = "parallel")]
pub use crate::reducer::reduce_parallel;
pub use crate::reducer::ChordMetric;

// =============================================================================
// Stoppage Detection
// =============================================================================

pub use crate::stoppage::{detect_stoppages, segments_from_points};

/// Classic Douglas-Peucker line simplification.
///
/// Uses the geo crate's implementation, which measures distance to the chord
/// *segment* rather than the infinite line. Useful as a baseline against
/// [`reduce`].
///
/// # Arguments
/// * `points` - Input polyline
/// * `tolerance` - Maximum deviation in degrees
///
/// # Returns
/// Indices of the retained points, ascending, endpoints included
///
/// # Example
/// ```rust
/// use trajectory_simplifier::algorithms::{classic_douglas_peucker_indices, GpsPoint};
///
/// let track = vec![
///     GpsPoint::new(51.5074, -0.1278, 0),
///     GpsPoint::new(51.5080, -0.1280, 1000),
///     GpsPoint::new(51.5090, -0.1300, 2000),
/// ];
/// let kept = classic_douglas_peucker_indices(&track, 0.0001);
/// assert_eq!(kept.first(), Some(&0));
/// assert_eq!(kept.last(), Some(&2));
/// ```
pub fn classic_douglas_peucker_indices(points: &[GpsPoint], tolerance: f64) -> Vec<usize> {
    use geo::{Coord, LineString, SimplifyIdx};

    if points.len() < 2 {
        return (0..points.len()).collect();
    }

    let coords: Vec<Coord<f64>> = points
        .iter()
        .map(|p| Coord { x: p.longitude, y: p.latitude })
        .collect();

    LineString::new(coords).simplify_idx(&tolerance)
}

/// Classic Douglas-Peucker returning the retained points themselves.
pub fn classic_douglas_peucker(points: &[GpsPoint], tolerance: f64) -> Vec<GpsPoint> {
    classic_douglas_peucker_indices(points, tolerance)
        .into_iter()
        .map(|i| points[i])
        .collect()
}
