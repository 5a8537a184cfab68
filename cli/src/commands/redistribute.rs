use std::path::PathBuf;

use anyhow::{Context, Result};
use reapportion::{
    io::{read_csv_file, write_csv_file},
    Mapping, OnConservationError, RedistributeOptions, Redistributor,
};
use tracing::debug;

use crate::commands::{open_store, parse_region};

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::RedistributeArgs) -> Result<()> {
    let from = parse_region(&args.from)?;
    let to = parse_region(&args.to)?;
    let out_path = args.output.clone().unwrap_or_else(|| PathBuf::from("./redistributed.csv"));

    let mut options = RedistributeOptions::default()
        .with_index_columns(args.index_columns.iter().cloned())
        .with_aggregation(args.aggregation.parse()?)
        .with_precision(args.precision.parse()?)
        .with_save(args.save)
        .with_tolerance(args.tolerance);
    if args.warn {
        options = options.with_on_conservation_error(OnConservationError::Warn);
    }
    if let Some(weights) = &args.weights {
        options = options.with_weights(weights.parse()?);
    }
    if let Some(via) = &args.via {
        options = options.with_via(parse_region(via)?);
    }
    options.mapping = match &args.mapping_table {
        Some(path) => Mapping::Table(
            read_csv_file(path, &[from.id(), to.id()])
                .with_context(|| format!("reading mapping table {}", path.display()))?
        ),
        None => Mapping::Method(args.method.parse()?),
    };

    debug!(?options, "redistribute options");

    let data = read_csv_file(&args.data, &[from.id()])
        .with_context(|| format!("reading {}", args.data.display()))?;
    eprintln!("[redistribute] {} rows keyed by {}", data.height(), from.id());

    let redistributor = Redistributor::new(open_store(&args.store)?);
    let result = redistributor.redistribute(&data, from.as_ref(), to.as_ref(), &options)
        .with_context(|| format!("redistributing {} -> {}", from.id(), to.id()))?;

    write_csv_file(&out_path, &result)
        .with_context(|| format!("writing {}", out_path.display()))?;
    eprintln!("[redistribute] wrote {} rows keyed by {} to {}", result.height(), to.id(), out_path.display());

    Ok(())
}
