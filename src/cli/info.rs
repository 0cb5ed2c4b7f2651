use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;

use specstack::store::{SpectrumStoreReader, StoreMode, HEADER_SIZE};

/// Header and index summary of a store
#[derive(Debug, Serialize)]
struct StoreInfo {
    path: String,
    mode: StoreMode,
    file_size_bytes: u64,
    index_offset: u64,
    spectra: usize,
    first_obj_id: Option<i64>,
    last_obj_id: Option<i64>,
    record_bytes: u64,
    mean_record_bytes: Option<f64>,
}

/// Display information about a spectrum store
pub fn run(store: PathBuf, json: bool) -> Result<()> {
    if !store.exists() {
        anyhow::bail!("File does not exist: {}", store.display());
    }

    let reader = SpectrumStoreReader::open(&store)
        .with_context(|| format!("Failed to open spectrum store: {}", store.display()))?;

    let header = reader.header();
    let record_bytes = header.index_offset - HEADER_SIZE;
    let info = StoreInfo {
        path: store.display().to_string(),
        mode: reader.mode(),
        file_size_bytes: reader.file_size(),
        index_offset: header.index_offset,
        spectra: reader.len(),
        first_obj_id: reader.ids().next(),
        last_obj_id: reader.ids().last(),
        record_bytes,
        mean_record_bytes: (!reader.is_empty()).then(|| record_bytes as f64 / reader.len() as f64),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("Spectrum Store Information");
    println!("==========================");
    println!("File: {}", info.path);
    println!();
    println!("  Mode:          {}", info.mode);
    println!("  File size:     {} bytes", info.file_size_bytes);
    println!("  Index offset:  {}", info.index_offset);
    println!("  Spectra:       {}", info.spectra);
    if let (Some(first), Some(last)) = (info.first_obj_id, info.last_obj_id) {
        println!("  Object ids:    {} .. {}", first, last);
    }
    if let Some(mean) = info.mean_record_bytes {
        println!("  Record bytes:  {} ({:.0} per spectrum)", info.record_bytes, mean);
    }

    Ok(())
}
