use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// geoworker - Background geospatial and tabular computation
#[derive(Parser, Debug)]
#[command(name = "geoworker")]
#[command(about = "Run clustering, scoring and data tasks on a pool of named workers", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Comma-separated worker names, overriding the configured pool
    #[arg(long, global = true, value_name = "NAMES")]
    pub workers: Option<String>,

    /// Per-task timeout in milliseconds
    #[arg(long, global = true, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Seed for k-means initialisation
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one task through the dispatcher
    Run(RunArgs),

    /// Show the worker pool
    Workers,

    /// Show the resolved configuration and where each value came from
    Config,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Task type (e.g. CLUSTER_POINTS, SCORE_SITES, VALIDATE_DATA)
    #[arg(long, short = 't')]
    pub task: String,

    /// JSON file holding the task payload
    #[arg(long, short = 'p', value_name = "FILE")]
    pub payload: PathBuf,

    /// Worker to run on (defaults to the worker conventionally serving the task)
    #[arg(long, short = 'w')]
    pub worker: Option<String>,

    /// Write clustering results as a GeoJSON FeatureCollection
    #[arg(long, value_name = "FILE")]
    pub geojson: Option<PathBuf>,
}
