use clap::{Parser, Subcommand, ValueEnum};
use geogate_core::models::{Crs, GeographicMetric};
use std::path::PathBuf;

/// geogate - data-quality gate for geospatial ML datasets
#[derive(Parser, Debug)]
#[command(name = "geogate")]
#[command(
    about = "Check geospatial ML splits for CRS, stratification and spatial leakage problems",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file (defaults to ./geogate.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect test samples that lie within the buffer distance of a training sample
    Leakage(LeakageArgs),

    /// Compare class-label shares across train, validation and test splits
    Distribution(DistributionArgs),

    /// Check that every dataset declares the same CRS
    Integrity(IntegrityArgs),

    /// Show the resolved configuration and where each value comes from
    Config,
}

/// Distance used when the shared CRS is geographic
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MetricArg {
    /// Raw longitude/latitude separation in degrees
    Degrees,
    /// Great-circle distance in metres
    Haversine,
}

impl From<MetricArg> for GeographicMetric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Degrees => GeographicMetric::Degrees,
            MetricArg::Haversine => GeographicMetric::Haversine,
        }
    }
}

#[derive(Parser, Debug)]
pub struct LeakageArgs {
    /// Training split (GeoJSON or Shapefile)
    #[arg(long)]
    pub train: PathBuf,

    /// Test split (GeoJSON or Shapefile)
    #[arg(long)]
    pub test: PathBuf,

    /// Minimum separation in CRS units; distances at or below it are violations
    #[arg(long, visible_alias = "threshold", value_name = "DISTANCE")]
    pub buffer: Option<f64>,

    /// k-d tree leaf capacity
    #[arg(long)]
    pub leaf_size: Option<usize>,

    /// Distance for geographic CRSs
    #[arg(long, value_enum)]
    pub metric: Option<MetricArg>,

    /// Query sequentially instead of on the thread pool
    #[arg(long)]
    pub no_parallel: bool,

    /// CRS for inputs that declare none (e.g. EPSG:32649)
    #[arg(long, value_name = "CRS", value_parser = parse_crs)]
    pub assume_crs: Option<Crs>,

    /// List every violating test sample
    #[arg(long)]
    pub show_violations: bool,
}

#[derive(Parser, Debug)]
pub struct DistributionArgs {
    /// Training split
    #[arg(long)]
    pub train: PathBuf,

    /// Validation split
    #[arg(long)]
    pub val: PathBuf,

    /// Test split
    #[arg(long)]
    pub test: PathBuf,

    /// Label column
    #[arg(long, value_name = "COLUMN")]
    pub col: String,

    /// Allowed share difference in percentage points
    #[arg(long, value_name = "PCT")]
    pub tolerance: Option<f64>,
}

#[derive(Parser, Debug)]
pub struct IntegrityArgs {
    /// Dataset files or directories to scan
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Expected CRS; defaults to the first dataset's CRS
    #[arg(long, value_name = "CRS", value_parser = parse_crs)]
    pub crs: Option<Crs>,
}

fn parse_crs(value: &str) -> Result<Crs, String> {
    value.parse::<Crs>().map_err(|e| e.to_string())
}
