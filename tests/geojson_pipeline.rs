//! End-to-end pipeline: raw GeoJSON file -> simplify -> GeoJSON -> stoppages.

use std::fs;

use serde_json::{json, Value};
use tempfile::TempDir;
use trajectory_simplifier::geojson::{
    read_points_from_path, read_segments_from_path, segments_to_feature_collection,
    stoppages_to_feature_collection, to_feature_collection, write_feature_collection_to_path,
};
use trajectory_simplifier::stoppage::{detect_stoppages, segments_from_points};
use trajectory_simplifier::{Simplifier, SimplifyConfig, SimplifyError, StoppageConfig};

/// Ride east along the equator at ~13.6 m/s, park for three minutes, ride on.
/// The step is a power of two so every moving segment has the same speed.
fn raw_track() -> Value {
    let mut features = Vec::new();
    let mut t = 1_700_000_000_000i64;
    let mut lon = 0.0;
    for i in 0..40 {
        features.push(json!({
            "type": "Feature",
            "geometry": { "type": "Point", "coordinates": [lon, 0.0] },
            "properties": { "locationTime": t, "input_index": i }
        }));
        if i == 19 {
            t += 180_000;
        } else {
            lon += 1.0 / 8192.0;
            t += 1000;
        }
    }
    json!({ "type": "FeatureCollection", "features": features })
}

fn setup() -> TempDir {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = TempDir::new().expect("failed to create temp dir");
    fs::write(dir.path().join("raw.geojson"), raw_track().to_string()).unwrap();
    dir
}

#[test]
fn simplify_file_to_file() {
    let dir = setup();
    let points = read_points_from_path(dir.path().join("raw.geojson")).unwrap();
    assert_eq!(points.len(), 40);

    let simplifier = Simplifier::new(SimplifyConfig::default()).unwrap();
    let simplified = simplifier.simplify(&points).unwrap();
    let out_path = dir.path().join("gpsdata.geojson");
    write_feature_collection_to_path(&to_feature_collection(&simplified), &out_path).unwrap();

    let written: Value = serde_json::from_str(&fs::read_to_string(&out_path).unwrap()).unwrap();
    let features = written["features"].as_array().unwrap();
    assert_eq!(features.len(), simplified.len());
    assert!(features.len() < 40);

    let indices: Vec<i64> = features
        .iter()
        .map(|f| f["properties"]["input_index"].as_i64().unwrap())
        .collect();
    assert_eq!(indices.first(), Some(&0));
    assert_eq!(indices.last(), Some(&39));
    // Both sides of the parking gap are stay points
    assert!(indices.contains(&19));
    assert!(indices.contains(&20));
}

#[test]
fn stoppage_found_at_parking_spot() {
    let dir = setup();
    let points = read_points_from_path(dir.path().join("raw.geojson")).unwrap();
    let simplified = simplify_default(&points);

    let segments = segments_from_points(&simplified.gps_points());
    let stoppages = detect_stoppages(&segments, &StoppageConfig::default());
    assert!(!stoppages.is_empty());
    assert!(stoppages
        .iter()
        .any(|s| s.start_time_ms <= points[19].timestamp && s.end_time_ms >= points[20].timestamp));

    let out_path = dir.path().join("stoppages.geojson");
    write_feature_collection_to_path(&stoppages_to_feature_collection(&stoppages), &out_path)
        .unwrap();
    let written: Value = serde_json::from_str(&fs::read_to_string(&out_path).unwrap()).unwrap();
    assert_eq!(written["features"].as_array().unwrap().len(), stoppages.len());
}

#[test]
fn road_distances_drive_stoppages() {
    let dir = setup();
    let points = read_points_from_path(dir.path().join("raw.geojson")).unwrap();
    let simplified = simplify_default(&points);
    let mut segments = segments_from_points(&simplified.gps_points());

    // A detour: the road is ten times longer than the straight line
    for s in segments.iter_mut() {
        s.route_distance_m *= 10.0;
    }
    let path = dir.path().join("output.geojson");
    write_feature_collection_to_path(&segments_to_feature_collection(&segments), &path).unwrap();

    let reread = read_segments_from_path(&path).unwrap();
    assert_eq!(reread.len(), segments.len());
    for (a, b) in reread.iter().zip(&segments) {
        assert!((a.route_distance_m - b.route_distance_m).abs() < 0.006);
        assert_eq!(a.start.original_index, b.start.original_index);
    }

    // Covering the longer road in the same time is not a stop
    let config = StoppageConfig::default();
    let straight = detect_stoppages(&segments_from_points(&simplified.gps_points()), &config);
    let routed = detect_stoppages(&reread, &config);
    assert!(routed.len() <= straight.len());
    assert!(routed
        .iter()
        .any(|s| s.start_time_ms <= points[19].timestamp && s.end_time_ms >= points[20].timestamp));
}

#[test]
fn malformed_file_fails_before_simplification() {
    let dir = setup();
    let path = dir.path().join("broken.geojson");
    fs::write(
        &path,
        r#"{ "type": "FeatureCollection", "features": [
            { "type": "Feature", "geometry": { "type": "Point" }, "properties": { "locationTime": 0 } }
        ] }"#,
    )
    .unwrap();

    let err = read_points_from_path(&path).unwrap_err();
    assert!(matches!(err, SimplifyError::Parse { .. }));
    assert!(err.to_string().contains("coordinates"));
}

fn simplify_default(
    points: &[trajectory_simplifier::GpsPoint],
) -> trajectory_simplifier::SimplifiedTrajectory {
    trajectory_simplifier::simplify(points, &SimplifyConfig::default()).unwrap()
}
