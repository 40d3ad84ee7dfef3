//! # Trajectory Simplifier
//!
//! Speed-, stay-point- and geometry-aware simplification of GPS trajectories.
//!
//! This library provides:
//! - Kinematic profiling (instantaneous speed per fix)
//! - Criteria selection (speed extrema, abrupt speed changes, stay points)
//! - Enhanced Douglas-Peucker reduction over index ranges
//! - GeoJSON ingestion/persistence, CSV export and stoppage detection around the core
//!
//! ## Features
//!
//! - **`parallel`** - Fork-join geometric reduction with rayon
//! - **`cli`** - Build the `simplify-track` command-line tool
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use trajectory_simplifier::{simplify, GpsPoint, SimplifyConfig};
//!
//! let track = vec![
//!     GpsPoint::with_index(0, 51.5074, -0.1278, 0),
//!     GpsPoint::with_index(1, 51.5075, -0.1279, 1_000),
//!     GpsPoint::with_index(2, 51.5076, -0.1280, 2_000),
//!     GpsPoint::with_index(3, 51.5090, -0.1300, 200_000),
//! ];
//!
//! let simplified = simplify(&track, &SimplifyConfig::default()).unwrap();
//! assert_eq!(simplified.points.first().unwrap().point.original_index, 0);
//! assert_eq!(simplified.points.last().unwrap().point.original_index, 3);
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{OptionExt, Result, SimplifyError};

// Geographic utilities (haversine, chord distances)
pub mod geo_utils;

// Per-point speed derivation
pub mod kinematics;
pub use kinematics::{compute_speeds, speed_profile};

// Speed extrema, speed changes, stay points
pub mod criteria;
pub use criteria::{select_by_criteria, CriteriaSelection};

// Enhanced Douglas-Peucker over index ranges
pub mod reducer;
#[cfg(feature = "parallel")]
pub use reducer::reduce_parallel;
pub use reducer::{reduce, ChordMetric};

// Orchestration of all selectors
pub mod simplify;
pub use simplify::{simplify, simplify_with_thresholds, Simplifier};

// GeoJSON ingestion and persistence
pub mod geojson;

// CSV companions to the GeoJSON outputs
pub mod csv_output;

// Stoppage detection over route segments
pub mod stoppage;
pub use stoppage::{detect_stoppages, RouteSegment, Stoppage, StoppageConfig};

// Algorithm toolbox - flat access to all algorithms
pub mod algorithms;

// ============================================================================
// Core Types
// ============================================================================

/// A single GPS fix.
///
/// `original_index` is the identity assigned by the input source and is
/// carried through simplification unchanged (-1 when unknown).
///
/// # Example
/// ```
/// use trajectory_simplifier::GpsPoint;
/// let point = GpsPoint::new(51.5074, -0.1278, 1_700_000_000_000);
/// assert_eq!(point.original_index, -1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub original_index: i64,
    pub latitude: f64,
    pub longitude: f64,
    /// Milliseconds since epoch
    pub timestamp: i64,
}

impl GpsPoint {
    /// Create a point with unknown original index.
    pub fn new(latitude: f64, longitude: f64, timestamp: i64) -> Self {
        Self::with_index(-1, latitude, longitude, timestamp)
    }

    /// Create a point carrying its index in the input source.
    pub fn with_index(original_index: i64, latitude: f64, longitude: f64, timestamp: i64) -> Self {
        Self {
            original_index,
            latitude,
            longitude,
            timestamp,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// A point with its derived instantaneous speed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedSample {
    pub point: GpsPoint,
    /// Speed in m/s (0 for the first point and for non-increasing timestamps)
    pub speed_mps: f64,
}

/// Configuration for trajectory simplification.
///
/// Missing fields fall back to their defaults when deserialized, so a
/// partial JSON file is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplifyConfig {
    /// Perpendicular deviation above which the reducer keeps a point.
    /// Units follow `chord_metric`. Default: 10.0
    pub dp_threshold: f64,

    /// Speed jump (m/s) to either neighbour that marks a point.
    /// Default: 2.0
    pub speed_change_threshold: f64,

    /// Time gap (seconds) to either neighbour that marks a stay point.
    /// Default: 90.0
    pub time_gap_threshold: f64,

    /// How chord deviation is measured. Default: degrees
    pub chord_metric: ChordMetric,
}

impl Default for SimplifyConfig {
    fn default() -> Self {
        Self {
            dp_threshold: reducer::DEFAULT_DP_THRESHOLD,
            speed_change_threshold: criteria::DEFAULT_SPEED_CHANGE_THRESHOLD,
            time_gap_threshold: criteria::DEFAULT_TIME_GAP_THRESHOLD,
            chord_metric: ChordMetric::Degrees,
        }
    }
}

impl SimplifyConfig {
    /// Parse a configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| SimplifyError::Io {
            message: format!("{}: {}", path.display(), e),
        })?;
        Self::from_json_str(&json)
    }

    /// Replace every field that `overrides` sets, then validate the result.
    ///
    /// # Example
    /// ```
    /// use trajectory_simplifier::{ConfigOverrides, SimplifyConfig};
    ///
    /// let config = SimplifyConfig::default()
    ///     .with_overrides(&ConfigOverrides {
    ///         dp_threshold: Some(3.0),
    ///         ..ConfigOverrides::default()
    ///     })
    ///     .unwrap();
    /// assert_eq!(config.dp_threshold, 3.0);
    /// assert_eq!(config.time_gap_threshold, 90.0);
    /// ```
    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Result<Self> {
        if let Some(v) = overrides.dp_threshold {
            self.dp_threshold = v;
        }
        if let Some(v) = overrides.speed_change_threshold {
            self.speed_change_threshold = v;
        }
        if let Some(v) = overrides.time_gap_threshold {
            self.time_gap_threshold = v;
        }
        if let Some(m) = overrides.chord_metric {
            self.chord_metric = m;
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject negative or non-finite thresholds.
    ///
    /// A negative threshold would make its rule select every candidate, so
    /// it is treated as a configuration mistake.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("dp_threshold", self.dp_threshold),
            ("speed_change_threshold", self.speed_change_threshold),
            ("time_gap_threshold", self.time_gap_threshold),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(SimplifyError::Config {
                    message: format!("{} must be a finite non-negative number, got {}", name, value),
                });
            }
        }
        Ok(())
    }
}

/// Explicitly supplied thresholds that take precedence over a loaded config.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConfigOverrides {
    pub dp_threshold: Option<f64>,
    pub speed_change_threshold: Option<f64>,
    pub time_gap_threshold: Option<f64>,
    pub chord_metric: Option<ChordMetric>,
}

/// Why a position was retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionReason {
    /// First or last point of the trajectory
    Endpoint,
    /// Local maximum or minimum of speed
    SpeedExtremum,
    /// Speed jump to a neighbour above threshold
    SpeedChange,
    /// Time gap to a neighbour above threshold
    StayPoint,
    /// Perpendicular deviation above threshold
    Geometry,
}

/// A retained point in the simplified output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplifiedPoint {
    pub point: GpsPoint,
    /// Speed derived from the full input sequence (m/s)
    pub speed_mps: f64,
    /// 0-based position of this point in the input sequence
    pub source_position: usize,
    /// Every rule that selected this point, in declaration order
    pub reasons: Vec<RetentionReason>,
}

/// Counters describing one simplification run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimplificationStats {
    pub input_points: u32,
    pub output_points: u32,
    /// Positions selected by any speed or time criterion
    pub criteria_retained: u32,
    /// Positions selected by the geometric reducer
    pub geometry_retained: u32,
    /// Consecutive steps with non-increasing timestamps
    pub degenerate_timestamps: u32,
    pub elapsed_ms: u64,
}

/// Result of simplification: an order-preserving subsequence of the input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimplifiedTrajectory {
    pub points: Vec<SimplifiedPoint>,
    pub stats: SimplificationStats,
}

impl SimplifiedTrajectory {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The retained points without speed or reasons.
    pub fn gps_points(&self) -> Vec<GpsPoint> {
        self.points.iter().map(|p| p.point).collect()
    }

    /// Input positions of the retained points, ascending.
    pub fn source_positions(&self) -> Vec<usize> {
        self.points.iter().map(|p| p.source_position).collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
