//! # Composite spectra
//!
//! Building a composite takes three steps per input spectrum:
//!
//! 1. [`RestFrameSpectrum::shift_and_rebin`] divides the observed wavelengths
//!    by `1 + z` and redistributes the flux of each logarithmic pixel over
//!    1 Å rest-frame bins in proportion to overlap.
//! 2. [`RestFrameSpectrum::normalise`] scales the result to the common level
//!    of the continuum window chosen for its redshift.
//! 3. [`Accumulator::combine`] adds every non-NaN bin to a per-wavelength
//!    sample collection.
//!
//! [`Accumulator::composite`] then reduces each bin to a [`CompositePixel`]
//! with the sample count, arithmetic, geometric and median fluxes, and the
//! uncertainties of the mean and the median.
//!
//! ## Example
//!
//! ```rust
//! use specstack::composite::{Accumulator, RestFrameSpectrum};
//!
//! let a = RestFrameSpectrum::from_bins(16, &[1.0, 10.0, 1.0])?;
//! let b = RestFrameSpectrum::from_bins(16, &[1.0, 20.0, 1.0])?;
//!
//! let mut acc = Accumulator::new();
//! acc.combine(&a)?.combine(&b)?;
//!
//! let composite = acc.composite();
//! assert_eq!(composite.get(17).map(|p| p.mean()), Some(15.0));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod accumulator;
mod error;
mod rest_frame;
mod spectrum;

pub use accumulator::{Accumulator, AccumulatorPixel, MAX_SAMPLES_PER_PIXEL, PIXEL_BLOCK_SIZE};
pub use error::{AccumulatorError, RestFrameError};
pub use rest_frame::RestFrameSpectrum;
pub use spectrum::{CompositePixel, CompositeSpectrum};
