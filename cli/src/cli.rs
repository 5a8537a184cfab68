use std::path::PathBuf;

/// Areal-weighted redistribution CLI
#[derive(clap::Parser, Debug)]
#[command(name = "reapportion", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Build and cache the mapping between two regions
    Mapping(MappingArgs),

    /// Redistribute a CSV table from one region to another
    Redistribute(RedistributeArgs),
}

/// Where mapping tables are cached.
#[derive(clap::Args, Debug)]
pub struct StoreArgs {
    /// Mapping cache directory
    #[arg(long, value_hint = clap::ValueHint::DirPath)]
    pub cache: Option<PathBuf>,

    /// JSON store config ({"root": ..., "template": ...}); --cache overrides its root
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct MappingArgs {
    /// First region as ID=GEOJSON
    pub from: String,

    /// Second region as ID=GEOJSON
    pub to: String,

    #[command(flatten)]
    pub store: StoreArgs,

    /// Mapping method
    #[arg(long, default_value = "intersection_area")]
    pub method: String,

    /// Build from simplified polygons instead of full precision (implies --no-save)
    #[arg(long)]
    pub simplified: bool,

    /// Do not write the mapping to the cache
    #[arg(long)]
    pub no_save: bool,

    /// Also write the mapping to this CSV file
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct RedistributeArgs {
    /// Input CSV keyed by the from region id column
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub data: PathBuf,

    /// Source region as ID=GEOJSON
    #[arg(long)]
    pub from: String,

    /// Target region as ID=GEOJSON
    #[arg(long)]
    pub to: String,

    /// Intermediate region as ID=GEOJSON
    #[arg(long)]
    pub via: Option<String>,

    /// Index column to keep (repeatable)
    #[arg(long = "index")]
    pub index_columns: Vec<String>,

    #[command(flatten)]
    pub store: StoreArgs,

    /// Mapping method
    #[arg(long, default_value = "intersection_area")]
    pub method: String,

    /// Literal mapping CSV with the from id, to id and "mapping" columns
    #[arg(long, value_hint = clap::ValueHint::FilePath, conflicts_with = "method")]
    pub mapping_table: Option<PathBuf>,

    /// Aggregation applied within each target unit
    #[arg(long, default_value = "sum")]
    pub aggregation: String,

    /// External weighting signal, e.g. "population"
    #[arg(long)]
    pub weights: Option<String>,

    /// cache-only, simplified, or full
    #[arg(long, default_value = "cache-only")]
    pub precision: String,

    /// Save newly built mappings (requires --precision full)
    #[arg(long)]
    pub save: bool,

    /// Warn instead of failing when totals are not conserved
    #[arg(long)]
    pub warn: bool,

    /// Relative tolerance on column totals
    #[arg(long, default_value_t = reapportion::DEFAULT_TOLERANCE)]
    pub tolerance: f64,

    /// Output CSV, defaults to "./redistributed.csv"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}
