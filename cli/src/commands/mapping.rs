use anyhow::{Context, Result};
use reapportion::{io::write_csv_file, MappingMethod, Precision};

use crate::commands::{open_store, parse_region};

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::MappingArgs) -> Result<()> {
    let from = parse_region(&args.from)?;
    let to = parse_region(&args.to)?;
    let method: MappingMethod = args.method.parse()?;
    let store = open_store(&args.store)?;

    let precision = if args.simplified { Precision::Simplified } else { Precision::Full };
    let save = !args.no_save && !args.simplified;

    let table = store.create(from.as_ref(), to.as_ref(), method, precision, save)
        .with_context(|| format!("building {method} mapping {} -> {}", from.id(), to.id()))?;

    eprintln!("[mapping] {} -> {}: {} entries", from.id(), to.id(), table.len());
    if save {
        eprintln!("[mapping] cached at {}", store.path(from.id(), to.id(), method).display());
    }
    if let Some(output) = &args.output {
        write_csv_file(output, &table.to_frame()?)
            .with_context(|| format!("writing {}", output.display()))?;
        eprintln!("[mapping] wrote {}", output.display());
    }

    Ok(())
}
