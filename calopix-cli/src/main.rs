//! calopix CLI
//!
//! Clusters calorimeter hits from a JSON event file and evaluates fiducial
//! rectangles.
#![allow(clippy::uninlined_format_args)]

mod input;

use std::path::PathBuf;
use std::time::Instant;

use calopix_algorithms::{
    summarize, total_statistics, CentroidWeighting, ClusterSummary, ClusteringStatistics,
    EventClusterer,
};
use calopix_core::{ClusteringConfig, ExpandMetric, FinderMode};
use calopix_geom::{Rectangle, Surface, DEFAULT_TOLERANCE};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{debug, info};
use nalgebra::Vector3;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Clustering error: {0}")]
    Core(#[from] calopix_core::Error),

    #[error("Geometry error: {0}")]
    Geom(#[from] calopix_geom::Error),

    #[error("Invalid input: {0}")]
    Input(String),
}

/// Expansion metric selection.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Metric {
    /// Graph hops through the neighbor relation
    Hops,
    /// Euclidean distance between crystal centers (mm)
    Distance,
}

impl From<Metric> for ExpandMetric {
    fn from(metric: Metric) -> Self {
        match metric {
            Metric::Hops => ExpandMetric::Hops,
            Metric::Distance => ExpandMetric::Distance,
        }
    }
}

/// Calorimeter crystal clustering.
#[derive(Parser)]
#[command(name = "calopix")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose logging (debug level unless RUST_LOG is set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cluster the hits of a JSON event file
    Cluster(ClusterArgs),

    /// Test points against a rectangular fiducial region
    Fiducial(FiducialArgs),
}

#[derive(Args)]
struct ClusterArgs {
    /// Input event file
    input: PathBuf,

    /// JSON clustering configuration; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Time-coincidence half window (ns)
    #[arg(long)]
    delta_time: Option<f64>,

    /// Maximum distance from the seed, in hops or mm
    #[arg(long)]
    expand_cut: Option<f64>,

    /// How the expansion cut is measured
    #[arg(long, value_enum)]
    metric: Option<Metric>,

    /// Walk the reduced online neighbor relation
    #[arg(long)]
    online: bool,

    /// Seed threshold (MeV)
    #[arg(long)]
    min_seed_energy: Option<f64>,

    /// Members below this energy (MeV) are not expanded further
    #[arg(long)]
    min_expand_energy: Option<f64>,

    /// Minimum reported cluster size
    #[arg(long)]
    min_cluster_size: Option<usize>,

    /// Logarithmic centroid weighting with this cutoff (linear if absent)
    #[arg(long)]
    log_weight: Option<f64>,
}

#[derive(Args)]
struct FiducialArgs {
    /// Plane normal, as x,y,z
    #[arg(long, value_parser = parse_vector)]
    normal: Vector3<f64>,

    /// Rectangle center, as x,y,z
    #[arg(long, value_parser = parse_vector)]
    center: Vector3<f64>,

    /// U axis hint, as x,y,z (derived from global Z if absent)
    #[arg(long, value_parser = parse_vector)]
    u_axis: Option<Vector3<f64>>,

    /// Half length along U
    #[arg(long)]
    u_half: f64,

    /// Half length along V
    #[arg(long)]
    v_half: f64,

    /// Point(s) to test, as x,y,z
    #[arg(long = "point", required = true, value_parser = parse_vector)]
    points: Vec<Vector3<f64>>,

    /// Allowed distance from the plane
    #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
    tolerance: f64,
}

fn parse_vector(s: &str) -> std::result::Result<Vector3<f64>, String> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<f64>().map_err(|e| format!("'{p}': {e}")))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    match parts.as_slice() {
        [x, y, z] => Ok(Vector3::new(*x, *y, *z)),
        _ => Err(format!("expected x,y,z, got {} components", parts.len())),
    }
}

#[derive(Debug, Serialize)]
struct EventReport {
    clusters: Vec<ClusterSummary>,
    statistics: ClusteringStatistics,
}

#[derive(Debug, Serialize)]
struct ClusterReport {
    events: Vec<EventReport>,
    total: ClusteringStatistics,
}

fn clustering_config(args: &ClusterArgs) -> Result<ClusteringConfig> {
    let mut config = match &args.config {
        Some(path) => input::load_config(path)?,
        None => ClusteringConfig::default(),
    };
    let finder = &mut config.finder;
    if let Some(delta_time) = args.delta_time {
        finder.delta_time = delta_time;
    }
    if let Some(expand_cut) = args.expand_cut {
        finder.expand_cut = expand_cut;
    }
    if let Some(metric) = args.metric {
        finder.metric = metric.into();
    }
    if args.online {
        finder.mode = FinderMode::Online;
    }
    if let Some(energy) = args.min_expand_energy {
        finder.min_expand_energy = energy;
    }
    if let Some(energy) = args.min_seed_energy {
        config.min_seed_energy = energy;
    }
    if let Some(size) = args.min_cluster_size {
        config.min_cluster_size = size;
    }
    config.validate()?;
    Ok(config)
}

fn run_cluster(args: &ClusterArgs) -> Result<ClusterReport> {
    let config = clustering_config(args)?;
    debug!("clustering configuration: {:?}", config);
    let loaded = input::load_events(&args.input)?;
    let weighting = args
        .log_weight
        .map_or(CentroidWeighting::Linear, |w0| CentroidWeighting::Logarithmic { w0 });

    let start = Instant::now();
    let results = EventClusterer::new(config)?.cluster_events(&loaded.geometry, &loaded.events)?;
    let total = total_statistics(&results);
    info!(
        "clustered {} events in {:.3}s: {} hits, {} clusters",
        results.len(),
        start.elapsed().as_secs_f64(),
        total.hits_processed,
        total.clusters_found
    );

    let events = results
        .into_iter()
        .zip(&loaded.events)
        .map(|(result, hits)| EventReport {
            clusters: result
                .clusters
                .iter()
                .filter_map(|cluster| summarize(cluster, &loaded.geometry, hits, weighting))
                .collect(),
            statistics: result.statistics,
        })
        .collect();
    Ok(ClusterReport { events, total })
}

fn run_fiducial(args: &FiducialArgs) -> Result<serde_json::Value> {
    if args.tolerance.is_nan() || args.tolerance < 0.0 {
        return Err(CliError::Input(format!(
            "tolerance must be non-negative, got {}",
            args.tolerance
        )));
    }
    let rectangle = match args.u_axis {
        Some(u_axis) => Rectangle::new(args.normal, args.center, u_axis, args.u_half, args.v_half)?,
        None => Rectangle::with_default_axes(args.normal, args.center, args.u_half, args.v_half)?,
    };
    debug!("{}", rectangle);

    let points: Vec<serde_json::Value> = args
        .points
        .iter()
        .map(|point| {
            let (u, v) = rectangle.local_coordinates(point);
            json!({
                "point": point,
                "inside": rectangle.in_bounds(point, args.tolerance),
                "distance": rectangle.distance(point),
                "u": u,
                "v": v,
            })
        })
        .collect();
    Ok(json!({
        "rectangle": {
            "u_direction": rectangle.u_direction().into_inner(),
            "v_direction": rectangle.v_direction().into_inner(),
        },
        "points": points,
    }))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let output = match cli.command {
        Commands::Cluster(args) => serde_json::to_string_pretty(&run_cluster(&args)?)?,
        Commands::Fiducial(args) => serde_json::to_string_pretty(&run_fiducial(&args)?)?,
    };
    println!("{}", output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;

    const EVENT: &str = r#"{
        "crystals": [
            { "position": [0.0, 0.0, 0.0] },
            { "position": [34.3, 0.0, 0.0] },
            { "position": [68.6, 0.0, 0.0] },
            { "position": [102.9, 0.0, 0.0] },
            { "position": [137.2, 0.0, 0.0] }
        ],
        "neighbor_radius": 40.0,
        "hits": [
            { "crystal": 0, "time": 0.0, "energy": 10.0 },
            { "crystal": 1, "time": 1.0, "energy": 9.0 },
            { "crystal": 2, "time": 2.0, "energy": 8.0 },
            { "crystal": 3, "time": 100.0, "energy": 7.0 },
            { "crystal": 4, "time": 0.0, "energy": 6.0 }
        ]
    }"#;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("calopix").chain(args.iter().copied())).unwrap()
    }

    fn cluster_args(cli: Cli) -> ClusterArgs {
        match cli.command {
            Commands::Cluster(args) => args,
            Commands::Fiducial(_) => panic!("expected cluster subcommand"),
        }
    }

    fn fiducial_args(cli: Cli) -> FiducialArgs {
        match cli.command {
            Commands::Fiducial(args) => args,
            Commands::Cluster(_) => panic!("expected fiducial subcommand"),
        }
    }

    #[test]
    fn test_parse_vector() {
        assert_eq!(parse_vector("1, 2.5,-3").unwrap(), Vector3::new(1.0, 2.5, -3.0));
        assert!(parse_vector("1,2").is_err());
        assert!(parse_vector("1,b,3").is_err());
    }

    #[test]
    fn test_cluster_command() {
        let file = write_temp(EVENT);
        let path = file.path().to_str().unwrap();
        let args = cluster_args(parse(&["cluster", path, "--delta-time", "5"]));
        let report = run_cluster(&args).unwrap();

        assert_eq!(report.events.len(), 1);
        let clusters = &report.events[0].clusters;
        assert_eq!(clusters.len(), 3);
        assert_eq!(clusters[0].seed, 0);
        assert_eq!(clusters[0].size, 3);
        assert_relative_eq!(clusters[0].energy, 27.0);
        assert_eq!(report.total.hits_processed, 5);
        assert_eq!(report.total.hits_clustered, 5);
    }

    #[test]
    fn test_flags_override_config_file() {
        let config = write_temp(r#"{ "finder": { "delta_time": 500.0 }, "min_cluster_size": 2 }"#);
        let event = write_temp(EVENT);
        let args = cluster_args(parse(&[
            "cluster",
            event.path().to_str().unwrap(),
            "--config",
            config.path().to_str().unwrap(),
            "--delta-time",
            "5",
            "--metric",
            "distance",
        ]));
        let resolved = clustering_config(&args).unwrap();
        assert_relative_eq!(resolved.finder.delta_time, 5.0);
        assert_eq!(resolved.finder.metric, ExpandMetric::Distance);
        assert_eq!(resolved.min_cluster_size, 2);

        let report = run_cluster(&args).unwrap();
        assert_eq!(report.events[0].clusters.len(), 1);
        assert_eq!(report.events[0].statistics.clusters_rejected, 2);
    }

    #[test]
    fn test_invalid_flag_value_rejected() {
        let event = write_temp(EVENT);
        let args = cluster_args(parse(&[
            "cluster",
            event.path().to_str().unwrap(),
            "--delta-time=-1",
        ]));
        assert!(matches!(run_cluster(&args), Err(CliError::Core(_))));
    }

    #[test]
    fn test_fiducial_command() {
        let args = fiducial_args(parse(&[
            "fiducial",
            "--normal",
            "0,0,1",
            "--center",
            "0,0,0",
            "--u-axis",
            "1,0,0",
            "--u-half",
            "2",
            "--v-half",
            "1",
            "--point",
            "1.5,0.5,0",
            "--point",
            "2,0,0",
        ]));
        let report = run_fiducial(&args).unwrap();
        let points = report["points"].as_array().unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0]["inside"], json!(true));
        assert_eq!(points[1]["inside"], json!(false));
        assert_relative_eq!(points[0]["u"].as_f64().unwrap(), 1.5);
    }

    #[test]
    fn test_fiducial_rejects_zero_normal() {
        let args = fiducial_args(parse(&[
            "fiducial", "--normal", "0,0,0", "--center", "0,0,0", "--u-half", "1", "--v-half",
            "1", "--point", "0,0,0",
        ]));
        assert!(matches!(run_fiducial(&args), Err(CliError::Geom(_))));
    }
}
