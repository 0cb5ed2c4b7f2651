//! # specstack - Composite Quasar Spectra
//!
//! `specstack` stores SDSS quasar spectra in a compact random-access file and
//! stacks them into rest-frame composite spectra binned by redshift or
//! luminosity.
//!
//! ## Key Features
//!
//! - **Spectrum Store**: a single append-only file of big-endian records with
//!   a trailing sorted index, read through one large page buffer so that
//!   walking hundreds of thousands of spectra in id order stays sequential.
//!
//! - **Flux-conserving rest-frame rebinning**: observed spectra on the
//!   logarithmic SDSS grid are divided by `1 + z` and redistributed onto
//!   1 Å bins in proportion to overlap.
//!
//! - **Chained normalisation**: five quiet continuum windows, each tied to
//!   the next redder one by a fixed ratio, put every spectrum on one flux
//!   scale whatever its redshift.
//!
//! - **Robust statistics**: every composite bin reports the arithmetic,
//!   geometric and median flux with uncertainties for the mean and the
//!   median.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use specstack::binning::{Binning, CompositeRun};
//! use specstack::catalog::Catalog;
//! use specstack::output::write_binned_composites;
//! use specstack::store::SpectrumStoreReader;
//!
//! let catalog = Catalog::from_csv_path("catalog.csv")?;
//! let reader = SpectrumStoreReader::open("quasars.spdb")?;
//!
//! let mut run = CompositeRun::new(reader, Binning::luminosity());
//! let composites = run.run(&catalog.good())?;
//! write_binned_composites("composites", &composites)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - [`spectrum`]: observed spectra, lite or full
//! - [`store`]: the spectrum store writer and reader
//! - [`normalisation`]: the continuum window table
//! - [`composite`]: rest-frame resampling, accumulation and composite statistics
//! - [`catalog`]: quasar catalog loading and selection
//! - [`binning`]: grouping quasars into bins and building one composite per bin
//! - [`average_flux`]: per-quasar mean flux in every normalisation window
//! - [`output`]: CSV writers
//! - [`validator`]: store integrity checks

#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![allow(clippy::too_many_arguments)]

pub mod average_flux;
pub mod binning;
pub mod catalog;
pub mod composite;
pub mod normalisation;
pub mod output;
pub mod spectrum;
pub mod store;
pub mod validator;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::average_flux::{window_averages, WindowAverages};
    pub use crate::binning::{
        BinKey, BinQuantity, BinnedComposite, Binning, CompositeRun, PipelineError, SpectrumSource,
    };
    pub use crate::catalog::{Catalog, CatalogError, Quasar};
    pub use crate::composite::{
        Accumulator, AccumulatorError, CompositePixel, CompositeSpectrum, RestFrameError,
        RestFrameSpectrum,
    };
    pub use crate::normalisation::NormalisationRange;
    pub use crate::output::{write_binned_composites, write_composite, OutputError};
    pub use crate::spectrum::{Observation, Spectrum, SpectrumDetail};
    pub use crate::store::{
        ReaderConfig, SpectrumStoreReader, SpectrumStoreWriter, StoreError, StoreMode,
    };
    pub use crate::validator::{validate_store, ValidationReport};
}
