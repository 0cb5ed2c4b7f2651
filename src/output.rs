//! CSV output of composites and window averages.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;

use crate::average_flux::WindowAverages;
use crate::binning::BinnedComposite;
use crate::composite::CompositeSpectrum;
use crate::normalisation::NormalisationRange;

/// Header of a composite CSV file
pub const COMPOSITE_HEADER: [&str; 7] = ["WL", "count", "mean", "gmean", "median", "umean", "umedian"];

/// Errors that can occur while writing output files
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV writing error
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

/// Write one composite as CSV, one row per wavelength bin
pub fn write_composite<W: Write>(writer: W, composite: &CompositeSpectrum) -> Result<(), OutputError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    // Written explicitly so empty composites still get a header
    csv_writer.write_record(COMPOSITE_HEADER)?;
    for pixel in composite {
        csv_writer.serialize(pixel)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write a binned composite to `{dir}/{prefix}{bin}.csv`
pub fn write_composite_file<P: AsRef<Path>>(
    dir: P,
    binned: &BinnedComposite,
) -> Result<PathBuf, OutputError> {
    let path = dir.as_ref().join(format!("{}.csv", binned.file_stem()));
    let file = File::create(&path)?;
    write_composite(BufWriter::new(file), &binned.composite)?;
    Ok(path)
}

/// Write every binned composite into `dir`, creating it if needed
pub fn write_binned_composites<P: AsRef<Path>>(
    dir: P,
    composites: &[BinnedComposite],
) -> Result<Vec<PathBuf>, OutputError> {
    std::fs::create_dir_all(dir.as_ref())?;
    let paths = composites
        .iter()
        .map(|c| write_composite_file(dir.as_ref(), c))
        .collect::<Result<Vec<_>, _>>()?;
    info!(
        "Wrote {} composite files to {}",
        paths.len(),
        dir.as_ref().display()
    );
    Ok(paths)
}

/// Write window averages as CSV: `obj_id,z` then one column per window.
/// Windows a spectrum does not cover are left empty.
pub fn write_window_averages<W: Write>(
    writer: W,
    averages: &[WindowAverages],
) -> Result<(), OutputError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header = vec!["obj_id".to_string(), "z".to_string()];
    header.extend(NormalisationRange::all().iter().map(|r| r.label()));
    csv_writer.write_record(&header)?;

    for w in averages {
        let mut record = vec![w.quasar().obj_id.to_string(), w.quasar().redshift.to_string()];
        record.extend(
            w.averages()
                .iter()
                .map(|a| a.map(|v| v.to_string()).unwrap_or_default()),
        );
        csv_writer.write_record(&record)?;
    }
    csv_writer.flush()?;
    Ok(())
}
