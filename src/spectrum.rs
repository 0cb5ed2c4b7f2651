//! Observed SDSS spectra.
//!
//! A [`Spectrum`] holds one object's coadded pixels on the spectrograph's
//! logarithmic wavelength grid. Two variants exist:
//!
//! - **Lite**: object id, flux and log10 wavelength only.
//! - **Full**: additionally plate/MJD/fiber and the per-pixel inverse
//!   variance, AND/OR masks, dispersion, sky and model arrays from the SDSS
//!   COADD table.
//!
//! Ancillary fields live in [`FullDetail`], so code holding a lite spectrum
//! simply has nothing to call.

/// Upper wavelength bound of the BOSS spectrograph in Ångströms.
///
/// Also the length of the rest-frame grid, since the rest-frame wavelength of
/// a pixel is never larger than its observed wavelength for `z >= 0`.
pub const MAX_WAVELENGTH: usize = 10500;

/// Maximum useful observed wavelength in Ångströms.
pub const MAX_USEFUL_WAVELENGTH: f64 = 10000.0;

/// Minimum useful observed wavelength in Ångströms.
pub const MIN_USEFUL_WAVELENGTH: f64 = 3700.0;

/// Plate, MJD and fiber of the exposure a spectrum was taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Observation {
    /// Plate ID
    pub plate: i32,
    /// Modified Julian date
    pub mjd: i32,
    /// Fiber ID
    pub fiber: i32,
}

impl Observation {
    /// Create a new observation triple
    pub fn new(plate: i32, mjd: i32, fiber: i32) -> Self {
        Self { plate, mjd, fiber }
    }
}

/// One pixel of a full spectrum, used to build [`Spectrum::full`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FullPixel {
    /// Calibrated flux
    pub flux: f32,
    /// log10 of the wavelength in Ångströms
    pub loglam: f32,
    /// Inverse variance of the flux
    pub ivar: f32,
    /// AND mask
    pub and_mask: i32,
    /// OR mask
    pub or_mask: i32,
    /// Wavelength dispersion
    pub wdisp: f32,
    /// Subtracted sky flux
    pub sky: f32,
    /// Pipeline best-fit model
    pub model: f32,
}

/// Flux and wavelength of one pixel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpecPixel {
    /// Calibrated flux
    pub flux: f32,
    /// log10 of the wavelength in Ångströms
    pub loglam: f32,
}

impl SpecPixel {
    /// Linear wavelength in Ångströms
    #[inline]
    pub fn wavelength(&self) -> f64 {
        10f64.powf(self.loglam as f64)
    }
}

/// Ancillary data carried only by full spectra
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FullDetail {
    observation: Observation,
    ivar: Vec<f32>,
    and_mask: Vec<i32>,
    or_mask: Vec<i32>,
    wdisp: Vec<f32>,
    sky: Vec<f32>,
    model: Vec<f32>,
}

impl FullDetail {
    fn with_capacity(observation: Observation, n: usize) -> Self {
        Self {
            observation,
            ivar: Vec::with_capacity(n),
            and_mask: Vec::with_capacity(n),
            or_mask: Vec::with_capacity(n),
            wdisp: Vec::with_capacity(n),
            sky: Vec::with_capacity(n),
            model: Vec::with_capacity(n),
        }
    }

    /// Plate, MJD and fiber
    pub fn observation(&self) -> Observation {
        self.observation
    }

    /// Inverse variance per pixel
    pub fn ivar(&self) -> &[f32] {
        &self.ivar
    }

    /// AND mask per pixel
    pub fn and_mask(&self) -> &[i32] {
        &self.and_mask
    }

    /// OR mask per pixel
    pub fn or_mask(&self) -> &[i32] {
        &self.or_mask
    }

    /// Wavelength dispersion per pixel
    pub fn wdisp(&self) -> &[f32] {
        &self.wdisp
    }

    /// Sky flux per pixel
    pub fn sky(&self) -> &[f32] {
        &self.sky
    }

    /// Model flux per pixel
    pub fn model(&self) -> &[f32] {
        &self.model
    }
}

/// Lite/full distinction of a spectrum
#[derive(Debug, Clone, PartialEq)]
pub enum SpectrumDetail {
    /// Identifier, flux and wavelength only
    Lite,
    /// All COADD columns
    Full(FullDetail),
}

/// An observed spectrum, pixels ordered by increasing wavelength
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    obj_id: i64,
    flux: Vec<f32>,
    loglam: Vec<f32>,
    detail: SpectrumDetail,
}

impl Spectrum {
    /// Build a lite spectrum from `(flux, loglam)` pairs
    pub fn lite<I>(obj_id: i64, pixels: I) -> Self
    where
        I: IntoIterator<Item = (f32, f32)>,
    {
        let (flux, loglam) = pixels.into_iter().unzip();
        Self {
            obj_id,
            flux,
            loglam,
            detail: SpectrumDetail::Lite,
        }
    }

    /// Build a full spectrum from complete pixels
    pub fn full<I>(obj_id: i64, observation: Observation, pixels: I) -> Self
    where
        I: IntoIterator<Item = FullPixel>,
    {
        let pixels = pixels.into_iter();
        let n = pixels.size_hint().0;
        let mut flux = Vec::with_capacity(n);
        let mut loglam = Vec::with_capacity(n);
        let mut detail = FullDetail::with_capacity(observation, n);

        for p in pixels {
            flux.push(p.flux);
            loglam.push(p.loglam);
            detail.ivar.push(p.ivar);
            detail.and_mask.push(p.and_mask);
            detail.or_mask.push(p.or_mask);
            detail.wdisp.push(p.wdisp);
            detail.sky.push(p.sky);
            detail.model.push(p.model);
        }

        Self {
            obj_id,
            flux,
            loglam,
            detail: SpectrumDetail::Full(detail),
        }
    }

    /// Unique object id
    pub fn obj_id(&self) -> i64 {
        self.obj_id
    }

    /// Number of pixels
    pub fn num_pixels(&self) -> usize {
        self.flux.len()
    }

    /// Flux per pixel
    pub fn flux(&self) -> &[f32] {
        &self.flux
    }

    /// log10 wavelength per pixel
    pub fn loglam(&self) -> &[f32] {
        &self.loglam
    }

    /// Lite/full detail
    pub fn detail(&self) -> &SpectrumDetail {
        &self.detail
    }

    /// Ancillary data, if this is a full spectrum
    pub fn full_detail(&self) -> Option<&FullDetail> {
        match &self.detail {
            SpectrumDetail::Lite => None,
            SpectrumDetail::Full(d) => Some(d),
        }
    }

    /// Returns true for lite spectra
    pub fn is_lite(&self) -> bool {
        matches!(self.detail, SpectrumDetail::Lite)
    }

    /// Drop all ancillary data
    pub fn to_lite(&self) -> Self {
        Self {
            obj_id: self.obj_id,
            flux: self.flux.clone(),
            loglam: self.loglam.clone(),
            detail: SpectrumDetail::Lite,
        }
    }

    /// Iterate over `(flux, loglam)` pixels in wavelength order
    pub fn pixels(&self) -> impl ExactSizeIterator<Item = SpecPixel> + '_ {
        self.flux
            .iter()
            .zip(self.loglam.iter())
            .map(|(&flux, &loglam)| SpecPixel { flux, loglam })
    }

    /// Full pixel `i`, if this is a full spectrum and `i` is in range
    pub fn full_pixel(&self, i: usize) -> Option<FullPixel> {
        let d = self.full_detail()?;
        Some(FullPixel {
            flux: *self.flux.get(i)?,
            loglam: self.loglam[i],
            ivar: d.ivar[i],
            and_mask: d.and_mask[i],
            or_mask: d.or_mask[i],
            wdisp: d.wdisp[i],
            sky: d.sky[i],
            model: d.model[i],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lite_spectrum() {
        let s = Spectrum::lite(7, vec![(1.0, 3.6), (2.0, 3.6001)]);
        assert_eq!(s.obj_id(), 7);
        assert_eq!(s.num_pixels(), 2);
        assert!(s.is_lite());
        assert!(s.full_detail().is_none());
        assert!(s.full_pixel(0).is_none());

        let px: Vec<_> = s.pixels().collect();
        assert_eq!(px[1].flux, 2.0);
        assert!((px[0].wavelength() - 10f64.powf(3.6f32 as f64)).abs() < 1e-9);
    }

    #[test]
    fn test_full_spectrum_and_downgrade() {
        let pixels = (0..3).map(|i| FullPixel {
            flux: i as f32,
            loglam: 3.6 + i as f32 * 1e-4,
            ivar: 0.5,
            and_mask: i,
            or_mask: -i,
            wdisp: 1.1,
            sky: 2.2,
            model: 3.3,
        });
        let s = Spectrum::full(9, Observation::new(4000, 55000, 12), pixels);
        assert!(!s.is_lite());

        let detail = s.full_detail().unwrap();
        assert_eq!(detail.observation().fiber, 12);
        assert_eq!(detail.or_mask(), &[0, -1, -2]);
        assert_eq!(s.full_pixel(2).unwrap().and_mask, 2);
        assert!(s.full_pixel(3).is_none());

        let lite = s.to_lite();
        assert!(lite.is_lite());
        assert_eq!(lite.flux(), s.flux());
        assert_eq!(lite.loglam(), s.loglam());
    }
}
