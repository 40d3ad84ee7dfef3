//! CSV companions to the GeoJSON outputs.
//!
//! One row per simplified point or stoppage, with a header line. Columns
//! mirror the GeoJSON property names so both files can be joined on
//! `input_index`.

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::{Result, SimplifiedTrajectory, SimplifyError, Stoppage};

#[derive(Debug, Serialize)]
struct SimplifiedRow {
    input_index: i64,
    latitude: f64,
    longitude: f64,
    #[serde(rename = "locationTime")]
    location_time: i64,
    speed_mps: f64,
}

#[derive(Debug, Serialize)]
struct StoppageRow {
    input_index: usize,
    start_lat: f64,
    start_lon: f64,
    route_distance_meters: f64,
    start_time: i64,
    end_time: i64,
}

fn write_rows<T: Serialize, W: Write>(rows: impl Iterator<Item = T>, writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn create(path: &Path) -> Result<std::fs::File> {
    std::fs::File::create(path).map_err(|e| SimplifyError::Io {
        message: format!("{}: {}", path.display(), e),
    })
}

/// Write a simplified trajectory as CSV.
pub fn write_simplified_csv<W: Write>(trajectory: &SimplifiedTrajectory, writer: W) -> Result<()> {
    let rows = trajectory.points.iter().map(|p| SimplifiedRow {
        input_index: p.point.original_index,
        latitude: p.point.latitude,
        longitude: p.point.longitude,
        location_time: p.point.timestamp,
        speed_mps: p.speed_mps,
    });
    write_rows(rows, writer)
}

/// Write detected stoppages as CSV.
pub fn write_stoppages_csv<W: Write>(stoppages: &[Stoppage], writer: W) -> Result<()> {
    let rows = stoppages.iter().map(|s| StoppageRow {
        input_index: s.segment_index,
        start_lat: s.location.latitude,
        start_lon: s.location.longitude,
        route_distance_meters: s.route_distance_m,
        start_time: s.start_time_ms,
        end_time: s.end_time_ms,
    });
    write_rows(rows, writer)
}

pub fn write_simplified_csv_to_path(
    trajectory: &SimplifiedTrajectory,
    path: impl AsRef<Path>,
) -> Result<()> {
    let path = path.as_ref();
    write_simplified_csv(trajectory, create(path)?)?;
    log::debug!("[CSV] Wrote {} rows to {}", trajectory.len(), path.display());
    Ok(())
}

pub fn write_stoppages_csv_to_path(stoppages: &[Stoppage], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    write_stoppages_csv(stoppages, create(path)?)?;
    log::debug!("[CSV] Wrote {} rows to {}", stoppages.len(), path.display());
    Ok(())
}
