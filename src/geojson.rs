//! GeoJSON ingestion and persistence.
//!
//! Raw fixes arrive as a FeatureCollection of `Point` features:
//!
//! ```json
//! { "type": "FeatureCollection", "features": [
//!   { "type": "Feature",
//!     "geometry": { "type": "Point", "coordinates": [lon, lat] },
//!     "properties": { "locationTime": 1700000000000, "input_index": 0 } }
//! ] }
//! ```
//!
//! `input_index` is optional and defaults to -1. Missing required fields fail
//! the whole parse before any simplification runs.
//!
//! Route segments travel as `LineString` features whose properties carry
//! `from_index`, `to_index`, `route_distance_meters`, `start_time` and
//! `end_time`. This is how road distances computed elsewhere reach
//! [`detect_stoppages`](crate::stoppage::detect_stoppages).

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::OptionExt;
use crate::{GpsPoint, Result, RouteSegment, SimplifiedTrajectory, SimplifyError, Stoppage};

const FEATURE_COLLECTION: &str = "FeatureCollection";
const FEATURE: &str = "Feature";
const POINT: &str = "Point";
const LINE_STRING: &str = "LineString";

/// `[lon, lat, ...]` of a Point.
pub type PointCoordinates = Vec<f64>;
/// `[[lon, lat, ...], ...]` of a LineString.
pub type LineCoordinates = Vec<Vec<f64>>;

/// A GeoJSON FeatureCollection with typed properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection<P, C = PointCoordinates> {
    #[serde(rename = "type")]
    pub kind: String,
    pub features: Vec<Feature<P, C>>,
}

impl<P, C> FeatureCollection<P, C> {
    pub fn new(features: Vec<Feature<P, C>>) -> Self {
        Self {
            kind: FEATURE_COLLECTION.to_string(),
            features,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature<P, C = PointCoordinates> {
    #[serde(rename = "type")]
    pub kind: String,
    pub geometry: Geometry<C>,
    pub properties: P,
}

impl<P> Feature<P> {
    pub fn point(latitude: f64, longitude: f64, properties: P) -> Self {
        Self {
            kind: FEATURE.to_string(),
            geometry: Geometry {
                kind: POINT.to_string(),
                coordinates: vec![longitude, latitude],
            },
            properties,
        }
    }
}

impl<P> Feature<P, LineCoordinates> {
    pub fn line(vertices: &[GpsPoint], properties: P) -> Self {
        Self {
            kind: FEATURE.to_string(),
            geometry: Geometry {
                kind: LINE_STRING.to_string(),
                coordinates: vertices
                    .iter()
                    .map(|p| vec![p.longitude, p.latitude])
                    .collect(),
            },
            properties,
        }
    }
}

/// Typed geometry. Point input must be `Point`; segment input must be `LineString`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry<C = PointCoordinates> {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: C,
}

fn unknown_index() -> i64 {
    -1
}

/// Properties of a raw input fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixProperties {
    #[serde(rename = "locationTime")]
    pub location_time: i64,
    #[serde(default = "unknown_index")]
    pub input_index: i64,
}

/// Properties written for each simplified point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplifiedProperties {
    #[serde(rename = "locationTime")]
    pub location_time: i64,
    pub input_index: i64,
    pub speed_mps: f64,
}

/// Properties written for each detected stoppage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoppageProperties {
    pub input_index: usize,
    pub start_time: i64,
    pub end_time: i64,
    pub route_distance_meters: f64,
}

/// Properties of a route segment feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentProperties {
    #[serde(default = "unknown_index")]
    pub from_index: i64,
    #[serde(default = "unknown_index")]
    pub to_index: i64,
    pub route_distance_meters: f64,
    pub start_time: i64,
    pub end_time: i64,
}

fn round_cm(meters: f64) -> f64 {
    (meters * 100.0).round() / 100.0
}

/// `[lon, lat, ...]` to `(lat, lon)`, naming the feature on failure.
fn lat_lon(coordinates: &[f64], feature: usize) -> Result<(f64, f64)> {
    match coordinates {
        [lon, lat, ..] => Ok((*lat, *lon)),
        _ => Err(SimplifyError::InvalidInput {
            message: format!("feature {} has fewer than 2 coordinates", feature),
        }),
    }
}

fn collection_to_points(collection: FeatureCollection<FixProperties>) -> Result<Vec<GpsPoint>> {
    collection
        .features
        .into_iter()
        .enumerate()
        .map(|(i, feature)| {
            let geometry = &feature.geometry;
            if geometry.kind != POINT {
                return Err(SimplifyError::InvalidInput {
                    message: format!("feature {} has geometry type '{}', expected Point", i, geometry.kind),
                });
            }
            let (lat, lon) = lat_lon(&geometry.coordinates, i)?;
            Ok(GpsPoint::with_index(
                feature.properties.input_index,
                lat,
                lon,
                feature.properties.location_time,
            ))
        })
        .collect()
}

fn collection_to_segments(
    collection: FeatureCollection<SegmentProperties, LineCoordinates>,
) -> Result<Vec<RouteSegment>> {
    collection
        .features
        .into_iter()
        .enumerate()
        .map(|(i, feature)| {
            let geometry = &feature.geometry;
            if geometry.kind != LINE_STRING {
                return Err(SimplifyError::InvalidInput {
                    message: format!(
                        "feature {} has geometry type '{}', expected LineString",
                        i, geometry.kind
                    ),
                });
            }
            let first = geometry
                .coordinates
                .first()
                .ok_or_invalid_input(&format!("feature {} has no vertices", i))?;
            let last = geometry.coordinates.last().unwrap_or(first);
            let (start_lat, start_lon) = lat_lon(first, i)?;
            let (end_lat, end_lon) = lat_lon(last, i)?;

            let props = &feature.properties;
            Ok(RouteSegment {
                index: i,
                start: GpsPoint::with_index(props.from_index, start_lat, start_lon, props.start_time),
                end: GpsPoint::with_index(props.to_index, end_lat, end_lon, props.end_time),
                route_distance_m: props.route_distance_meters,
                start_time_ms: props.start_time,
                end_time_ms: props.end_time,
            })
        })
        .collect()
}

/// Parse raw fixes from a GeoJSON string.
///
/// # Example
/// ```
/// use trajectory_simplifier::geojson::parse_points;
///
/// let json = r#"{ "type": "FeatureCollection", "features": [
///   { "type": "Feature",
///     "geometry": { "type": "Point", "coordinates": [-0.1278, 51.5074] },
///     "properties": { "locationTime": 1000 } } ] }"#;
/// let points = parse_points(json).unwrap();
/// assert_eq!(points[0].latitude, 51.5074);
/// assert_eq!(points[0].original_index, -1);
/// ```
pub fn parse_points(json: &str) -> Result<Vec<GpsPoint>> {
    let collection: FeatureCollection<FixProperties> = serde_json::from_str(json)?;
    collection_to_points(collection)
}

/// Read raw fixes from any reader.
pub fn read_points<R: Read>(reader: R) -> Result<Vec<GpsPoint>> {
    let collection: FeatureCollection<FixProperties> = serde_json::from_reader(reader)?;
    collection_to_points(collection)
}

/// Read raw fixes from a GeoJSON file.
pub fn read_points_from_path(path: impl AsRef<Path>) -> Result<Vec<GpsPoint>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| SimplifyError::Io {
        message: format!("{}: {}", path.display(), e),
    })?;
    let points = read_points(BufReader::new(file))?;
    log::debug!("[GeoJSON] Read {} points from {}", points.len(), path.display());
    Ok(points)
}

/// Parse route segments from a GeoJSON string of LineString features.
///
/// Segment `index` is the feature's position in the collection. The segment
/// spans the first and last vertex of its line.
pub fn parse_segments(json: &str) -> Result<Vec<RouteSegment>> {
    let collection: FeatureCollection<SegmentProperties, LineCoordinates> =
        serde_json::from_str(json)?;
    collection_to_segments(collection)
}

/// Read route segments from any reader.
pub fn read_segments<R: Read>(reader: R) -> Result<Vec<RouteSegment>> {
    let collection: FeatureCollection<SegmentProperties, LineCoordinates> =
        serde_json::from_reader(reader)?;
    collection_to_segments(collection)
}

/// Read route segments from a GeoJSON file.
pub fn read_segments_from_path(path: impl AsRef<Path>) -> Result<Vec<RouteSegment>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| SimplifyError::Io {
        message: format!("{}: {}", path.display(), e),
    })?;
    let segments = read_segments(BufReader::new(file))?;
    log::debug!("[GeoJSON] Read {} segments from {}", segments.len(), path.display());
    Ok(segments)
}

/// Build a LineString collection for route segments.
pub fn segments_to_feature_collection(
    segments: &[RouteSegment],
) -> FeatureCollection<SegmentProperties, LineCoordinates> {
    FeatureCollection::new(
        segments
            .iter()
            .map(|s| {
                Feature::line(
                    &[s.start, s.end],
                    SegmentProperties {
                        from_index: s.start.original_index,
                        to_index: s.end.original_index,
                        route_distance_meters: round_cm(s.route_distance_m),
                        start_time: s.start_time_ms,
                        end_time: s.end_time_ms,
                    },
                )
            })
            .collect(),
    )
}

/// Build the output collection for a simplified trajectory.
pub fn to_feature_collection(
    trajectory: &SimplifiedTrajectory,
) -> FeatureCollection<SimplifiedProperties> {
    FeatureCollection::new(
        trajectory
            .points
            .iter()
            .map(|p| {
                Feature::point(
                    p.point.latitude,
                    p.point.longitude,
                    SimplifiedProperties {
                        location_time: p.point.timestamp,
                        input_index: p.point.original_index,
                        speed_mps: p.speed_mps,
                    },
                )
            })
            .collect(),
    )
}

/// Build the output collection for detected stoppages.
pub fn stoppages_to_feature_collection(
    stoppages: &[Stoppage],
) -> FeatureCollection<StoppageProperties> {
    FeatureCollection::new(
        stoppages
            .iter()
            .map(|s| {
                Feature::point(
                    s.location.latitude,
                    s.location.longitude,
                    StoppageProperties {
                        input_index: s.segment_index,
                        start_time: s.start_time_ms,
                        end_time: s.end_time_ms,
                        route_distance_meters: round_cm(s.route_distance_m),
                    },
                )
            })
            .collect(),
    )
}

/// Serialize a collection as pretty-printed JSON.
pub fn write_feature_collection<P: Serialize, C: Serialize, W: Write>(
    collection: &FeatureCollection<P, C>,
    writer: W,
) -> Result<()> {
    serde_json::to_writer_pretty(writer, collection)?;
    Ok(())
}

/// Write a collection to a file, replacing any existing content.
pub fn write_feature_collection_to_path<P: Serialize, C: Serialize>(
    collection: &FeatureCollection<P, C>,
    path: impl AsRef<Path>,
) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| SimplifyError::Io {
        message: format!("{}: {}", path.display(), e),
    })?;
    let mut writer = BufWriter::new(file);
    write_feature_collection(collection, &mut writer)?;
    writer.flush()?;
    log::debug!(
        "[GeoJSON] Wrote {} features to {}",
        collection.features.len(),
        path.display()
    );
    Ok(())
}
