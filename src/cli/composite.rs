use anyhow::{Context, Result};
use log::info;
use std::path::{Path, PathBuf};

use specstack::binning::{BinnedComposite, Binning, CompositeRun};
use specstack::catalog::{Catalog, Quasar};
use specstack::output::write_binned_composites;
use specstack::store::{ReaderConfig, SpectrumStoreReader};

use super::config::Config;
use super::ByArg;

const DEFAULT_OUTPUT_DIR: &str = "composites";

/// Arguments of the composite command
pub struct Args {
    pub catalog: PathBuf,
    pub store: PathBuf,
    pub by: ByArg,
    pub config: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub include_bal: bool,
    pub parallel: bool,
}

/// Build composite spectra and write one CSV per bin
pub fn run(args: Args) -> Result<()> {
    let config = Config::load(args.config.as_deref())?;

    let output_dir = args
        .output
        .or_else(|| config.composite.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
    let include_bal = args.include_bal || config.composite.include_bal.unwrap_or(false);

    let catalog = Catalog::from_csv_path(&args.catalog)
        .with_context(|| format!("Failed to load catalog: {}", args.catalog.display()))?;
    let quasars = catalog.select(include_bal);
    info!(
        "Selected {} of {} quasars{}",
        quasars.len(),
        catalog.len(),
        if include_bal { " (BAL quasars kept)" } else { "" }
    );

    let mut binnings = Vec::new();
    if matches!(args.by, ByArg::Luminosity | ByArg::Both) {
        let mut b = Binning::luminosity();
        if let Some(size) = config.composite.luminosity_bin {
            b = b.with_size(size);
        }
        binnings.push(b);
    }
    if matches!(args.by, ByArg::Redshift | ByArg::Both) {
        let mut b = Binning::redshift();
        if let Some(size) = config.composite.redshift_bin {
            b = b.with_size(size);
        }
        binnings.push(b);
    }

    let reader_config = config.reader_config();
    for binning in &binnings {
        let composites = build(&args.store, &reader_config, binning, &quasars, args.parallel)?;
        let paths = write_binned_composites(&output_dir, &composites)
            .with_context(|| format!("Failed to write composites to {}", output_dir.display()))?;

        println!("Composites by {} (bin width {}):", binning.quantity, binning.size);
        for c in &composites {
            println!("  {}", c);
        }
        println!("  {} files written to {}", paths.len(), output_dir.display());
    }

    Ok(())
}

fn build(
    store: &Path,
    reader_config: &ReaderConfig,
    binning: &Binning,
    quasars: &[Quasar],
    parallel: bool,
) -> Result<Vec<BinnedComposite>> {
    if parallel {
        #[cfg(feature = "parallel")]
        {
            return specstack::binning::run_parallel(binning, quasars, || {
                SpectrumStoreReader::open_with_config(store, reader_config.clone())
            })
            .context("Composite run failed");
        }

        #[cfg(not(feature = "parallel"))]
        log::warn!("Built without the parallel feature, processing bins sequentially");
    }

    let reader = SpectrumStoreReader::open_with_config(store, reader_config.clone())
        .with_context(|| format!("Failed to open spectrum store: {}", store.display()))?;

    let mut run = CompositeRun::new(reader, *binning);
    let composites = run.run(quasars).context("Composite run failed")?;
    info!("Store reads: {}", run.into_source().stats());
    Ok(composites)
}
