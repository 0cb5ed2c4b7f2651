//! # Spectrum Store
//!
//! A compact single-file store of observed spectra keyed by object id,
//! built once from the SDSS COADD files and read many times by the
//! composite pipeline.
//!
//! ## Design
//!
//! 1. **Append-only records**: spectra are written in arrival order as
//!    length-prefixed big-endian records.
//!
//! 2. **Trailing index**: the `(object id, offset)` index is written after
//!    the last record, and its offset is patched into the header, since the
//!    total size is not known in advance.
//!
//! 3. **Lite or full**: one flag in the header selects the record encoding
//!    for the whole file. Lite records keep only flux and log wavelength.
//!
//! 4. **Page-buffered reads**: the reader serves records from one large
//!    buffer window, which makes reading in ascending id order far cheaper
//!    than seeking for every record.
//!
//! ## Example
//!
//! ```rust,no_run
//! use specstack::spectrum::Spectrum;
//! use specstack::store::{SpectrumStoreReader, SpectrumStoreWriter, StoreMode};
//!
//! let mut writer = SpectrumStoreWriter::create("quasars.spdb", StoreMode::Lite)?;
//! writer.add(&Spectrum::lite(42, vec![(1.5, 3.5800), (1.7, 3.5801)]))?;
//! writer.finish()?;
//!
//! let mut reader = SpectrumStoreReader::open("quasars.spdb")?;
//! let ids: Vec<i64> = reader.ids().collect();
//! for id in ids {
//!     if let Some(spectrum) = reader.get(id)? {
//!         println!("{}: {} pixels", id, spectrum.num_pixels());
//!     }
//! }
//! # Ok::<(), specstack::store::StoreError>(())
//! ```

mod config;
mod error;
mod format;
mod reader;
mod stats;
mod writer;

#[cfg(test)]
mod tests;

pub use config::{ReaderConfig, DEFAULT_BUFFER_SIZE};
pub use error::StoreError;
pub use format::{Header, IndexEntry, StoreMode, HEADER_SIZE, INDEX_ENTRY_SIZE};
pub use reader::{SpectrumIter, SpectrumStoreReader};
pub use stats::{ReaderStats, StoreStats};
pub use writer::SpectrumStoreWriter;
