use crate::spectrum::MAX_WAVELENGTH;

/// Errors raised while shifting a spectrum to its rest frame
#[derive(Debug, thiserror::Error)]
pub enum RestFrameError {
    /// The redshift cannot be mapped onto the rest-frame grid
    #[error("Redshift {0} is outside the range the rest-frame grid can hold")]
    RedshiftOutOfRange(f64),

    /// Pixel wavelengths are not increasing
    #[error("Object {obj_id}: wavelength decreases at pixel {pixel}")]
    UnorderedWavelengths {
        /// Object id of the spectrum
        obj_id: i64,
        /// Index of the offending pixel
        pixel: usize,
    },

    /// Explicit bins run past the end of the grid
    #[error("{len} bins starting at {start} exceed the rest-frame grid of {} bins", MAX_WAVELENGTH)]
    BeyondGrid {
        /// First bin
        start: usize,
        /// Number of bins
        len: usize,
    },
}

/// Errors raised while accumulating spectra
#[derive(Debug, thiserror::Error)]
pub enum AccumulatorError {
    /// A wavelength bin received more samples than it may hold
    #[error("Wavelength bin {wavelength} already holds the maximum of {cap} samples")]
    SampleCapExceeded {
        /// Rest-frame wavelength of the bin
        wavelength: usize,
        /// Per-bin sample cap
        cap: usize,
    },
}
