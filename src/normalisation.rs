//! Continuum normalisation windows.
//!
//! Quasar spectra at different redshifts show different rest-frame
//! wavelength windows. To bring them to a common flux scale, each spectrum is
//! normalised against one of five quiet continuum windows that avoid the
//! prominent emission lines. The target level of each window is chained from
//! the reddest window (level 15.0) through published continuum ratios, so
//! spectra normalised in different windows stay mutually consistent.

use std::sync::OnceLock;

use serde::Serialize;

use crate::spectrum::{MAX_USEFUL_WAVELENGTH, MIN_USEFUL_WAVELENGTH};

/// Flux level of the reddest window
pub const ANCHOR_NORM_FACTOR: f64 = 15.0;

/// A rest-frame continuum window used for normalisation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalisationRange {
    start_wl: usize,
    end_wl: usize,
    norm_ratio: f64,
    norm_factor: f64,
}

static RANGES: OnceLock<[NormalisationRange; 5]> = OnceLock::new();

impl NormalisationRange {
    fn anchor(start_wl: usize, end_wl: usize, norm_factor: f64) -> Self {
        Self {
            start_wl,
            end_wl,
            norm_ratio: 1.0,
            norm_factor,
        }
    }

    fn chained(start_wl: usize, end_wl: usize, norm_ratio: f64, redder: &Self) -> Self {
        Self {
            start_wl,
            end_wl,
            norm_ratio,
            norm_factor: norm_ratio * redder.norm_factor,
        }
    }

    /// All five windows, reddest first
    pub fn all() -> &'static [NormalisationRange] {
        RANGES.get_or_init(|| {
            let r1 = Self::anchor(5400, 5500, ANCHOR_NORM_FACTOR);
            let r2 = Self::chained(3500, 3650, 3.0, &r1);
            let r3 = Self::chained(3000, 3150, 1.5, &r2);
            let r4 = Self::chained(2450, 2600, 1.7, &r3);
            let r5 = Self::chained(1950, 2100, 1.6, &r4);
            [r1, r2, r3, r4, r5]
        })
    }

    /// The window to normalise a spectrum at redshift `z` against.
    ///
    /// Among the windows observable at `z`, picks the one whose redshift
    /// interval midpoint is closest to `z`. Returns `None` when no window is
    /// observable.
    pub fn for_redshift(z: f64) -> Option<&'static NormalisationRange> {
        Self::all()
            .iter()
            .filter(|r| z >= r.start_z() && z <= r.end_z())
            .min_by(|a, b| {
                let da = (z - a.mid_z()).abs();
                let db = (z - b.mid_z()).abs();
                da.total_cmp(&db)
            })
    }

    /// First rest-frame wavelength of the window in Ångströms
    pub fn start_wl(&self) -> usize {
        self.start_wl
    }

    /// Last rest-frame wavelength of the window in Ångströms (inclusive)
    pub fn end_wl(&self) -> usize {
        self.end_wl
    }

    /// Central wavelength
    pub fn mid_wl(&self) -> usize {
        (self.start_wl + self.end_wl) / 2
    }

    /// Continuum ratio to the next redder window
    pub fn norm_ratio(&self) -> f64 {
        self.norm_ratio
    }

    /// Flux level spectra are scaled to in this window
    pub fn norm_factor(&self) -> f64 {
        self.norm_factor
    }

    /// Lowest redshift at which the whole window is observable
    pub fn start_z(&self) -> f64 {
        MIN_USEFUL_WAVELENGTH / self.start_wl as f64 - 1.0
    }

    /// Highest redshift at which the whole window is observable
    pub fn end_z(&self) -> f64 {
        MAX_USEFUL_WAVELENGTH / self.end_wl as f64 - 1.0
    }

    /// Midpoint of the redshift interval
    pub fn mid_z(&self) -> f64 {
        (self.start_z() + self.end_z()) / 2.0
    }

    /// Column label such as `1950-2100`
    pub fn label(&self) -> String {
        format!("{}-{}", self.start_wl, self.end_wl)
    }
}
