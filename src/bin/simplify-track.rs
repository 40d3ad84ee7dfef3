//! Command-line front-end: simplify a GeoJSON track or detect stoppages in one.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{error, info};

use trajectory_simplifier::csv_output::{write_simplified_csv_to_path, write_stoppages_csv_to_path};
use trajectory_simplifier::geojson::{
    read_points_from_path, read_segments_from_path, segments_to_feature_collection,
    stoppages_to_feature_collection, to_feature_collection, write_feature_collection_to_path,
};
use trajectory_simplifier::stoppage::{detect_stoppages, segments_from_points};
use trajectory_simplifier::{
    ChordMetric, ConfigOverrides, Result, Simplifier, SimplifyConfig, StoppageConfig,
};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
/// Simplify GPS trajectories while keeping speed events, stay points and shape
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reduce a raw GeoJSON point track
    Simplify {
        /// Raw FeatureCollection of Point features
        #[clap(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Where to write the simplified FeatureCollection
        #[clap(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Also write the simplified points as CSV
        #[clap(long, value_name = "FILE")]
        csv: Option<PathBuf>,

        /// JSON file with SimplifyConfig fields; flags below take precedence
        #[clap(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Perpendicular deviation threshold (units follow --metric)
        #[clap(long)]
        dp_threshold: Option<f64>,

        /// Speed jump threshold in m/s
        #[clap(long)]
        speed_change_threshold: Option<f64>,

        /// Stay-point time gap threshold in seconds
        #[clap(long)]
        time_gap_threshold: Option<f64>,

        /// Chord distance metric: degrees or meters
        #[clap(long)]
        metric: Option<ChordMetric>,
    },
    /// Detect stoppages along a (simplified) GeoJSON point track
    Stoppages {
        /// Point track; segments get straight-line distances
        #[clap(short, long, value_name = "FILE", required_unless_present = "segments")]
        input: Option<PathBuf>,

        /// LineString route segments carrying route_distance_meters
        #[clap(long, value_name = "FILE", conflicts_with = "input")]
        segments: Option<PathBuf>,

        #[clap(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Also write the stoppages as CSV
        #[clap(long, value_name = "FILE")]
        csv: Option<PathBuf>,

        /// Write the segments that were scanned as LineString GeoJSON
        #[clap(long, value_name = "FILE")]
        segments_output: Option<PathBuf>,

        /// Expected cruising speed in km/h
        #[clap(long, default_value = "20.0")]
        cruise_speed_kmh: f64,

        /// Windows shorter than this many meters are judged on time alone
        #[clap(long, default_value = "10.0")]
        distance_threshold: f64,

        /// Maximum lingering time in seconds for short windows
        #[clap(long, default_value = "60.0")]
        time_threshold: f64,
    },
}

fn load_config(path: Option<&PathBuf>, overrides: &ConfigOverrides) -> Result<SimplifyConfig> {
    let base = match path {
        None => SimplifyConfig::default(),
        Some(path) => SimplifyConfig::from_json_path(path)?,
    };
    base.with_overrides(overrides)
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Simplify {
            input,
            output,
            csv,
            config,
            dp_threshold,
            speed_change_threshold,
            time_gap_threshold,
            metric,
        } => {
            let overrides = ConfigOverrides {
                dp_threshold,
                speed_change_threshold,
                time_gap_threshold,
                chord_metric: metric,
            };
            let simplifier = Simplifier::new(load_config(config.as_ref(), &overrides)?)?;
            let points = read_points_from_path(&input)?;
            let simplified = simplifier.simplify(&points)?;
            write_feature_collection_to_path(&to_feature_collection(&simplified), &output)?;
            if let Some(csv) = csv {
                write_simplified_csv_to_path(&simplified, csv)?;
            }

            info!(
                "[CLI] Saved {} of {} points to {}",
                simplified.stats.output_points,
                simplified.stats.input_points,
                output.display()
            );
        }
        Command::Stoppages {
            input,
            segments,
            output,
            csv,
            segments_output,
            cruise_speed_kmh,
            distance_threshold,
            time_threshold,
        } => {
            let config = StoppageConfig {
                distance_threshold_m: distance_threshold,
                time_threshold_s: time_threshold,
                ..StoppageConfig::with_cruise_speed_kmh(cruise_speed_kmh)
            };
            let segments = match (segments, input) {
                (Some(path), _) => read_segments_from_path(path)?,
                (None, Some(path)) => segments_from_points(&read_points_from_path(path)?),
                (None, None) => Vec::new(),
            };
            let stoppages = detect_stoppages(&segments, &config);
            write_feature_collection_to_path(&stoppages_to_feature_collection(&stoppages), &output)?;
            if let Some(csv) = csv {
                write_stoppages_csv_to_path(&stoppages, csv)?;
            }
            if let Some(path) = segments_output {
                write_feature_collection_to_path(&segments_to_feature_collection(&segments), path)?;
            }

            info!(
                "[CLI] Saved {} stoppages to {}",
                stoppages.len(),
                output.display()
            );
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
