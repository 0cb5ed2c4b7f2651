use crate::normalisation::NormalisationRange;
use crate::spectrum::{Spectrum, MAX_USEFUL_WAVELENGTH, MAX_WAVELENGTH, MIN_USEFUL_WAVELENGTH};

use super::error::RestFrameError;

/// One spectrum shifted to rest-frame wavelengths on a 1 Å grid.
///
/// The grid always starts at 0 Å because the redshift of the input is not
/// known in advance. Bins outside [`wavelength_range`](Self::wavelength_range)
/// are zero. After a normalisation with a zero window mean every bin is NaN,
/// which downstream consumers treat as "no data".
#[derive(Debug, Clone, PartialEq)]
pub struct RestFrameSpectrum {
    pixels: Vec<f64>,
    range: Option<(usize, usize)>,
}

impl Default for RestFrameSpectrum {
    fn default() -> Self {
        Self::new()
    }
}

impl RestFrameSpectrum {
    /// An empty grid
    pub fn new() -> Self {
        Self {
            pixels: vec![0.0; MAX_WAVELENGTH],
            range: None,
        }
    }

    /// Build a grid from explicit bin values starting at `wavelength_lo`
    pub fn from_bins(wavelength_lo: usize, values: &[f64]) -> Result<Self, RestFrameError> {
        if wavelength_lo + values.len() > MAX_WAVELENGTH {
            return Err(RestFrameError::BeyondGrid {
                start: wavelength_lo,
                len: values.len(),
            });
        }

        let mut spectrum = Self::new();
        spectrum.pixels[wavelength_lo..wavelength_lo + values.len()].copy_from_slice(values);
        if !values.is_empty() {
            spectrum.range = Some((wavelength_lo, wavelength_lo + values.len() - 1));
        }
        Ok(spectrum)
    }

    /// Shift an observed spectrum at redshift `z` to its rest frame and rebin
    /// it from the logarithmic grid to 1 Å bins.
    ///
    /// Each pair of adjacent pixels defines a wavelength interval carrying the
    /// flux of the first pixel. Intervals with an endpoint outside the useful
    /// observed range are skipped. The flux of an interval is spread over the
    /// output bins it overlaps in proportion to the overlap, so the total flux
    /// is conserved.
    pub fn shift_and_rebin(spectrum: &Spectrum, z: f64) -> Result<Self, RestFrameError> {
        if !z.is_finite() || z <= -1.0 || MAX_USEFUL_WAVELENGTH / (1.0 + z) >= MAX_WAVELENGTH as f64
        {
            return Err(RestFrameError::RedshiftOutOfRange(z));
        }

        let mut out = Self::new();
        let flux = spectrum.flux();
        let loglam = spectrum.loglam();

        for i in 1..spectrum.num_pixels() {
            let input_lo = 10f64.powf(loglam[i - 1] as f64);
            let input_hi = 10f64.powf(loglam[i] as f64);
            // Written so that NaN wavelengths are skipped too
            if !(input_lo >= MIN_USEFUL_WAVELENGTH && input_hi <= MAX_USEFUL_WAVELENGTH) {
                continue;
            }

            let input_lo = input_lo / (z + 1.0);
            let input_hi = input_hi / (z + 1.0);
            let input_range = input_hi - input_lo;

            let bin_lo = input_lo.floor() as usize;
            let bin_hi = input_hi.floor() as usize;
            if bin_hi < bin_lo {
                return Err(RestFrameError::UnorderedWavelengths {
                    obj_id: spectrum.obj_id(),
                    pixel: i,
                });
            }

            let pixel_flux = flux[i - 1] as f64;
            if bin_lo == bin_hi {
                out.pixels[bin_lo] += pixel_flux;
            } else {
                for bin in bin_lo..=bin_hi {
                    // Ångströms of the input interval inside this bin
                    let overlap = if bin == bin_lo {
                        1.0 - (input_lo - bin_lo as f64)
                    } else if bin == bin_hi {
                        input_hi - bin_hi as f64
                    } else {
                        1.0
                    };
                    out.pixels[bin] += pixel_flux * (overlap / input_range);
                }
            }

            out.range = Some(match out.range {
                None => (bin_lo, bin_hi),
                Some((lo, hi)) => (lo.min(bin_lo), hi.max(bin_hi)),
            });
        }

        Ok(out)
    }

    /// Scale the spectrum so that its mean flux in the normalisation window
    /// for `z` equals the window's target level.
    ///
    /// Returns false, leaving the spectrum untouched, when no window is
    /// observable at `z`. A zero mean in the window turns every bin into NaN.
    pub fn normalise(&mut self, z: f64) -> bool {
        let Some(range) = NormalisationRange::for_redshift(z) else {
            return false;
        };

        let window = &self.pixels[range.start_wl()..=range.end_wl()];
        let mean = window.iter().sum::<f64>() / window.len() as f64;

        let scale = range.norm_factor() / mean;
        let scale = if scale.is_finite() { scale } else { f64::NAN };

        for p in &mut self.pixels {
            *p *= scale;
        }
        true
    }

    /// Mean flux over `[start, end]`, or `None` if the populated range does
    /// not cover the whole interval
    pub fn range_average(&self, start: usize, end: usize) -> Option<f64> {
        let (lo, hi) = self.range?;
        if lo > start || hi < end || end < start {
            return None;
        }
        let window = &self.pixels[start..=end];
        Some(window.iter().sum::<f64>() / window.len() as f64)
    }

    /// Flux in the bin starting at `wavelength`, 0 outside the grid
    pub fn pixel(&self, wavelength: usize) -> f64 {
        self.pixels.get(wavelength).copied().unwrap_or(0.0)
    }

    /// The whole grid
    pub fn pixels(&self) -> &[f64] {
        &self.pixels
    }

    /// Lowest and highest populated bins
    pub fn wavelength_range(&self) -> Option<(usize, usize)> {
        self.range
    }

    /// Lowest populated bin
    pub fn wavelength_lo(&self) -> Option<usize> {
        self.range.map(|(lo, _)| lo)
    }

    /// Highest populated bin
    pub fn wavelength_hi(&self) -> Option<usize> {
        self.range.map(|(_, hi)| hi)
    }
}
