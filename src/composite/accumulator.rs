use crate::spectrum::MAX_WAVELENGTH;

use super::error::AccumulatorError;
use super::rest_frame::RestFrameSpectrum;
use super::spectrum::{CompositePixel, CompositeSpectrum};

/// Wavelength bins are allocated in blocks of this many
pub const PIXEL_BLOCK_SIZE: usize = 100;

/// Most samples a single wavelength bin may hold
pub const MAX_SAMPLES_PER_PIXEL: usize = 40_000;

/// Flux samples contributed to one wavelength bin
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccumulatorPixel {
    fluxes: Vec<f32>,
}

impl AccumulatorPixel {
    /// Record a sample. NaN samples carry no data and are dropped.
    fn add(&mut self, flux: f32) {
        if !flux.is_nan() {
            self.fluxes.push(flux);
        }
    }

    /// Number of samples held
    pub fn count(&self) -> usize {
        self.fluxes.len()
    }

    /// Returns true if the bin has no samples
    pub fn is_empty(&self) -> bool {
        self.fluxes.is_empty()
    }

    /// Returns true if the bin cannot take another sample
    pub fn is_full(&self) -> bool {
        self.fluxes.len() >= MAX_SAMPLES_PER_PIXEL
    }

    /// Samples in the order they were added
    pub fn fluxes(&self) -> &[f32] {
        &self.fluxes
    }

    /// Summary statistics of this bin
    pub fn composite(&self, wavelength: usize) -> CompositePixel {
        let n = self.fluxes.len();
        if n == 0 {
            return CompositePixel::empty(wavelength);
        }

        let mut sorted = self.fluxes.clone();
        sorted.sort_unstable_by(f32::total_cmp);

        let mean = sorted.iter().map(|&f| f as f64).sum::<f64>() / n as f64;
        let median = median(&sorted);
        let gmean = geometric_mean(&sorted);

        let (umean, umedian) = if n == 1 {
            (mean, median)
        } else {
            (mean_uncertainty(&sorted, mean), median_uncertainty(&sorted))
        };

        CompositePixel::new(wavelength, n, mean, gmean, median, umean, umedian)
    }
}

/// Median of a sorted, non-empty slice
fn median(sorted: &[f32]) -> f64 {
    let n = sorted.len();
    let mid = n / 2;
    if n % 2 == 1 {
        sorted[mid] as f64
    } else {
        (sorted[mid] as f64 + sorted[mid - 1] as f64) / 2.0
    }
}

/// Geometric mean of the strictly positive samples, 0 if there are none
fn geometric_mean(sorted: &[f32]) -> f64 {
    let (log_sum, positive) = sorted
        .iter()
        .filter(|&&f| f > 0.0)
        .fold((0.0f64, 0usize), |(sum, n), &f| (sum + (f as f64).ln(), n + 1));
    if positive == 0 {
        0.0
    } else {
        (log_sum / positive as f64).exp()
    }
}

/// Standard error of the mean from the sample standard deviation
fn mean_uncertainty(samples: &[f32], mean: f64) -> f64 {
    let n = samples.len() as f64;
    let sum_sq: f64 = samples.iter().map(|&f| (f as f64 - mean).powi(2)).sum();
    (sum_sq / (n - 1.0)).sqrt() / n.sqrt()
}

/// Uncertainty of the median from the semi-interquartile range
fn median_uncertainty(sorted: &[f32]) -> f64 {
    let n = sorted.len();
    let mid = n / 2;
    let q1 = median(&sorted[..mid + n % 2]);
    let q3 = median(&sorted[mid..]);
    0.68 * ((q3 - q1) / 2.0) / (n as f64).sqrt()
}

/// Running collection of rest-frame spectra for one composite.
///
/// Only the blocks of wavelength bins that receive samples are allocated.
#[derive(Debug, Clone)]
pub struct Accumulator {
    blocks: Vec<Option<Box<[AccumulatorPixel]>>>,
    range: Option<(usize, usize)>,
    contributors: usize,
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Accumulator {
    /// An accumulator with no samples
    pub fn new() -> Self {
        Self {
            blocks: vec![None; (MAX_WAVELENGTH + PIXEL_BLOCK_SIZE - 1) / PIXEL_BLOCK_SIZE],
            range: None,
            contributors: 0,
        }
    }

    /// Add every non-NaN bin of `spectrum`.
    ///
    /// The outermost populated bin on each side is excluded because it is
    /// usually only partly covered. Spectra spanning fewer than three bins
    /// contribute nothing. Exceeding the per-bin sample cap is an error.
    pub fn combine(&mut self, spectrum: &RestFrameSpectrum) -> Result<&mut Self, AccumulatorError> {
        self.contributors += 1;

        let Some((lo, hi)) = spectrum.wavelength_range() else {
            return Ok(self);
        };
        if hi < lo + 2 {
            return Ok(self);
        }
        let (lo, hi) = (lo + 1, hi - 1);

        for wavelength in lo..=hi {
            let flux = spectrum.pixel(wavelength) as f32;
            if flux.is_nan() {
                continue;
            }
            let pixel = self.pixel_mut(wavelength);
            if pixel.is_full() {
                return Err(AccumulatorError::SampleCapExceeded {
                    wavelength,
                    cap: MAX_SAMPLES_PER_PIXEL,
                });
            }
            pixel.add(flux);
        }

        self.range = Some(match self.range {
            None => (lo, hi),
            Some((a, b)) => (a.min(lo), b.max(hi)),
        });
        Ok(self)
    }

    fn pixel_mut(&mut self, wavelength: usize) -> &mut AccumulatorPixel {
        let block = self.blocks[wavelength / PIXEL_BLOCK_SIZE]
            .get_or_insert_with(|| vec![AccumulatorPixel::default(); PIXEL_BLOCK_SIZE].into());
        &mut block[wavelength % PIXEL_BLOCK_SIZE]
    }

    /// Samples held for the bin at `wavelength`, if its block was ever touched
    pub fn pixel(&self, wavelength: usize) -> Option<&AccumulatorPixel> {
        self.blocks
            .get(wavelength / PIXEL_BLOCK_SIZE)?
            .as_ref()
            .map(|block| &block[wavelength % PIXEL_BLOCK_SIZE])
    }

    /// Number of spectra passed to [`combine`](Self::combine)
    pub fn contributors(&self) -> usize {
        self.contributors
    }

    /// Lowest and highest bins that have received samples
    pub fn wavelength_range(&self) -> Option<(usize, usize)> {
        self.range
    }

    /// Returns true if no bin was ever touched
    pub fn is_empty(&self) -> bool {
        self.range.is_none()
    }

    /// Statistics for every bin in the accumulated range
    pub fn composite(&self) -> CompositeSpectrum {
        let Some((lo, hi)) = self.range else {
            return CompositeSpectrum::default();
        };

        let pixels = (lo..=hi)
            .map(|wl| match self.pixel(wl) {
                Some(p) => p.composite(wl),
                None => CompositePixel::empty(wl),
            })
            .collect();
        CompositeSpectrum::new(pixels)
    }
}
