use serde::Serialize;

/// Summary statistics of one wavelength bin of a composite
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompositePixel {
    #[serde(rename = "WL")]
    wavelength: usize,
    count: usize,
    mean: f64,
    gmean: f64,
    median: f64,
    #[serde(rename = "umean")]
    mean_uncertainty: f64,
    #[serde(rename = "umedian")]
    median_uncertainty: f64,
}

impl CompositePixel {
    pub(crate) fn new(
        wavelength: usize,
        count: usize,
        mean: f64,
        gmean: f64,
        median: f64,
        mean_uncertainty: f64,
        median_uncertainty: f64,
    ) -> Self {
        Self {
            wavelength,
            count,
            mean,
            gmean,
            median,
            mean_uncertainty,
            median_uncertainty,
        }
    }

    /// A bin without samples: every statistic is zero
    pub(crate) fn empty(wavelength: usize) -> Self {
        Self::new(wavelength, 0, 0.0, 0.0, 0.0, 0.0, 0.0)
    }

    /// Rest-frame wavelength of the bin in Ångströms
    pub fn wavelength(&self) -> usize {
        self.wavelength
    }

    /// Number of samples
    pub fn count(&self) -> usize {
        self.count
    }

    /// Arithmetic mean
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Geometric mean of the positive samples
    pub fn gmean(&self) -> f64 {
        self.gmean
    }

    /// Median
    pub fn median(&self) -> f64 {
        self.median
    }

    /// Standard error of the mean
    pub fn mean_uncertainty(&self) -> f64 {
        self.mean_uncertainty
    }

    /// Uncertainty of the median
    pub fn median_uncertainty(&self) -> f64 {
        self.median_uncertainty
    }
}

/// A composite spectrum: one [`CompositePixel`] per bin over a contiguous
/// wavelength range
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompositeSpectrum {
    pixels: Vec<CompositePixel>,
}

impl CompositeSpectrum {
    pub(crate) fn new(pixels: Vec<CompositePixel>) -> Self {
        Self { pixels }
    }

    /// Bins in ascending wavelength order
    pub fn pixels(&self) -> &[CompositePixel] {
        &self.pixels
    }

    /// Iterate over the bins
    pub fn iter(&self) -> std::slice::Iter<'_, CompositePixel> {
        self.pixels.iter()
    }

    /// Number of bins
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    /// Returns true if the composite has no bins
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// First wavelength covered
    pub fn wavelength_lo(&self) -> Option<usize> {
        self.pixels.first().map(CompositePixel::wavelength)
    }

    /// Last wavelength covered
    pub fn wavelength_hi(&self) -> Option<usize> {
        self.pixels.last().map(CompositePixel::wavelength)
    }

    /// The bin at `wavelength`, if covered
    pub fn get(&self, wavelength: usize) -> Option<&CompositePixel> {
        let lo = self.wavelength_lo()?;
        self.pixels.get(wavelength.checked_sub(lo)?)
    }
}

impl<'a> IntoIterator for &'a CompositeSpectrum {
    type Item = &'a CompositePixel;
    type IntoIter = std::slice::Iter<'a, CompositePixel>;

    fn into_iter(self) -> Self::IntoIter {
        self.pixels.iter()
    }
}
