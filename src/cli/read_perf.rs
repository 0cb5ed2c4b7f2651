use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use specstack::store::{ReaderConfig, SpectrumStoreReader};

fn rate(count: usize, elapsed: Duration) -> f64 {
    count as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
}

/// Read every spectrum in ascending then descending id order and report the
/// time and reader statistics of each pass
pub fn run(store: PathBuf, unbuffered: bool, buffer_size: Option<usize>) -> Result<()> {
    let config = match (unbuffered, buffer_size) {
        (true, _) => ReaderConfig::unbuffered(),
        (false, Some(size)) => ReaderConfig::with_buffer_size(size),
        (false, None) => ReaderConfig::default(),
    };

    let ids: Vec<i64> = SpectrumStoreReader::open(&store)
        .with_context(|| format!("Failed to open spectrum store: {}", store.display()))?
        .ids()
        .collect();

    println!("Store: {} ({} spectra)", store.display(), ids.len());
    println!(
        "Reader: {}",
        if config.buffered {
            format!("buffered, {} byte pages", config.buffer_size)
        } else {
            "unbuffered".to_string()
        }
    );

    let passes: [(&str, Box<dyn Iterator<Item = &i64> + '_>); 2] = [
        ("forward", Box::new(ids.iter())),
        ("backward", Box::new(ids.iter().rev())),
    ];

    for (name, order) in passes {
        // Fresh reader per pass so statistics do not mix
        let mut reader = SpectrumStoreReader::open_with_config(&store, config.clone())?;
        let mut pixels = 0usize;

        let start = Instant::now();
        for &id in order {
            let spectrum = reader
                .get(id)
                .with_context(|| format!("Failed to read object {}", id))?;
            pixels += spectrum.map_or(0, |s| s.num_pixels());
        }
        let elapsed = start.elapsed();

        println!(
            "  {:<8} {:>10.3} s  {:>10.0} spectra/s  {} pixels",
            name,
            elapsed.as_secs_f64(),
            rate(ids.len(), elapsed),
            pixels
        );
        println!("           {}", reader.stats());
    }

    Ok(())
}
