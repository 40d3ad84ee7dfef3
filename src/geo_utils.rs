//! Geographic utilities: great-circle distance and chord distances.
//!
//! All distances along the ground use the haversine formula on a sphere of
//! radius [`EARTH_RADIUS_M`]. Chord (perpendicular) distances are planar and
//! come in two flavours: raw (longitude, latitude) degree space, and meters on
//! a local equirectangular projection.

use crate::GpsPoint;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Length of one degree of latitude in meters.
pub const METERS_PER_DEGREE_LAT: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

/// Great-circle distance in meters between two latitude/longitude pairs (degrees).
pub fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1 = lat1.to_radians();
    let lat2 = lat2.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (lon2 - lon1).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Clamp guards against a > 1 from rounding on antipodal points
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_M * c
}

/// Great-circle distance in meters between two GPS points.
///
/// # Example
/// ```
/// use trajectory_simplifier::GpsPoint;
/// use trajectory_simplifier::geo_utils::haversine_distance;
///
/// let a = GpsPoint::new(0.0, 0.0, 0);
/// let b = GpsPoint::new(0.001, 0.0, 1000);
/// let d = haversine_distance(&a, &b);
/// assert!((d - 111.19).abs() < 0.01);
/// ```
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    haversine(p1.latitude, p1.longitude, p2.latitude, p2.longitude)
}

/// Length of one degree of longitude in meters at the given latitude.
pub fn meters_per_degree_lon(latitude: f64) -> f64 {
    METERS_PER_DEGREE_LAT * latitude.to_radians().cos()
}

/// Total length of a polyline in meters.
pub fn polyline_length(points: &[GpsPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}

/// Distance from `(x0, y0)` to the infinite line through `(x1, y1)` and `(x2, y2)`.
///
/// Coincident line endpoints give 0.
fn line_distance(x0: f64, y0: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    let num = ((y2 - y1) * x0 - (x2 - x1) * y0 + x2 * y1 - y2 * x1).abs();
    let den = ((y2 - y1).powi(2) + (x2 - x1).powi(2)).sqrt();
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

/// Perpendicular distance from `point` to the line through `start` and `end`,
/// measured in raw (longitude, latitude) degree space.
pub fn perpendicular_distance(point: &GpsPoint, start: &GpsPoint, end: &GpsPoint) -> f64 {
    line_distance(
        point.longitude,
        point.latitude,
        start.longitude,
        start.latitude,
        end.longitude,
        end.latitude,
    )
}

/// Perpendicular distance in meters from `point` to the line through `start`
/// and `end`, on an equirectangular projection centred on `start`.
///
/// Accurate for chords up to a few tens of kilometres.
pub fn perpendicular_distance_meters(point: &GpsPoint, start: &GpsPoint, end: &GpsPoint) -> f64 {
    let kx = meters_per_degree_lon(start.latitude);
    let project = |p: &GpsPoint| {
        (
            (p.longitude - start.longitude) * kx,
            (p.latitude - start.latitude) * METERS_PER_DEGREE_LAT,
        )
    };

    let (x0, y0) = project(point);
    let (x2, y2) = project(end);
    line_distance(x0, y0, 0.0, 0.0, x2, y2)
}
