use anyhow::{Context, Result};
use log::info;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use specstack::average_flux::window_averages;
use specstack::catalog::Catalog;
use specstack::output::write_window_averages;
use specstack::store::SpectrumStoreReader;

use super::config::Config;

/// Write the mean flux of every catalog quasar in each normalisation window
pub fn run(catalog: PathBuf, store: PathBuf, output: PathBuf, config: Option<PathBuf>) -> Result<()> {
    let config = Config::load(config.as_deref())?;

    let catalog = Catalog::from_csv_path(&catalog)
        .with_context(|| format!("Failed to load catalog: {}", catalog.display()))?;
    let quasars = catalog.select(config.composite.include_bal.unwrap_or(false));

    let mut reader = SpectrumStoreReader::open_with_config(&store, config.reader_config())
        .with_context(|| format!("Failed to open spectrum store: {}", store.display()))?;

    let averages = window_averages(&mut reader, &quasars).context("Window averaging failed")?;

    let file = File::create(&output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    write_window_averages(BufWriter::new(file), &averages)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!("Store reads: {}", reader.stats());
    println!(
        "Window averages for {} quasars written to {}",
        averages.len(),
        output.display()
    );
    Ok(())
}
