//! Binning quasars and building one composite per bin.
//!
//! Quasars are grouped by redshift or absolute magnitude into fixed-width
//! bins. For each bin, every member's spectrum is fetched from a
//! [`SpectrumSource`], shifted to the rest frame, normalised and added to an
//! [`Accumulator`]. Members are visited in ascending object id order, which
//! for a store written in id order is also file order and keeps the reader's
//! page buffer warm.
//!
//! ```rust,no_run
//! use specstack::binning::{Binning, CompositeRun};
//! use specstack::catalog::Catalog;
//! use specstack::store::SpectrumStoreReader;
//!
//! let catalog = Catalog::from_csv_path("catalog.csv")?;
//! let reader = SpectrumStoreReader::open("quasars.spdb")?;
//!
//! let mut run = CompositeRun::new(reader, Binning::redshift());
//! for bin in run.run(&catalog.good())? {
//!     println!("{}: {} spectra", bin.file_stem(), bin.contributors);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::io::{Read, Seek};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::catalog::Quasar;
use crate::composite::{
    Accumulator, AccumulatorError, CompositeSpectrum, RestFrameError, RestFrameSpectrum,
};
use crate::spectrum::Spectrum;
use crate::store::{SpectrumStoreReader, StoreError};

/// Members processed between progress messages
const PROGRESS_INTERVAL: usize = 100;

/// Errors that abort a composite run
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Spectrum store error
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    /// Rest-frame resampling error
    #[error("Rest-frame error: {0}")]
    RestFrameError(#[from] RestFrameError),

    /// Accumulation error
    #[error("Accumulator error: {0}")]
    AccumulatorError(#[from] AccumulatorError),
}

/// Supplier of observed spectra keyed by object id
pub trait SpectrumSource {
    /// Fetch the spectrum of `obj_id`, `Ok(None)` if there is none
    fn spectrum(&mut self, obj_id: i64) -> Result<Option<Spectrum>, StoreError>;
}

impl<R: Read + Seek> SpectrumSource for SpectrumStoreReader<R> {
    fn spectrum(&mut self, obj_id: i64) -> Result<Option<Spectrum>, StoreError> {
        self.get(obj_id)
    }
}

impl SpectrumSource for BTreeMap<i64, Spectrum> {
    fn spectrum(&mut self, obj_id: i64) -> Result<Option<Spectrum>, StoreError> {
        Ok(self.get(&obj_id).cloned())
    }
}

impl<S: SpectrumSource + ?Sized> SpectrumSource for &mut S {
    fn spectrum(&mut self, obj_id: i64) -> Result<Option<Spectrum>, StoreError> {
        (**self).spectrum(obj_id)
    }
}

/// Catalog quantity quasars are binned by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinQuantity {
    /// Redshift
    Redshift,
    /// Absolute i-band magnitude
    AbsoluteMagnitude,
}

impl BinQuantity {
    /// Value of this quantity for `quasar`
    pub fn value(&self, quasar: &Quasar) -> f64 {
        match self {
            BinQuantity::Redshift => quasar.redshift,
            BinQuantity::AbsoluteMagnitude => quasar.abs_magnitude,
        }
    }

    /// Prefix of composite file names
    pub fn prefix(&self) -> &'static str {
        match self {
            BinQuantity::Redshift => "z",
            BinQuantity::AbsoluteMagnitude => "M",
        }
    }
}

impl fmt::Display for BinQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinQuantity::Redshift => write!(f, "redshift"),
            BinQuantity::AbsoluteMagnitude => write!(f, "absolute magnitude"),
        }
    }
}

/// How quasars are assigned to bins
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Binning {
    /// Quantity to bin by
    pub quantity: BinQuantity,
    /// Bin width
    pub size: f64,
    /// Centre bins on multiples of `size` instead of starting them there
    pub centred: bool,
}

impl Binning {
    /// Redshift bins of width 0.2
    pub fn redshift() -> Self {
        Self {
            quantity: BinQuantity::Redshift,
            size: 0.2,
            centred: false,
        }
    }

    /// Absolute magnitude bins of width 0.5
    pub fn luminosity() -> Self {
        Self {
            quantity: BinQuantity::AbsoluteMagnitude,
            size: 0.5,
            centred: false,
        }
    }

    /// Same quantity with a different bin width
    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    /// Bin of `quasar`, `None` if its value is not finite
    pub fn key(&self, quasar: &Quasar) -> Option<BinKey> {
        let value = self.quantity.value(quasar);
        if !value.is_finite() {
            return None;
        }
        let scaled = value / self.size;
        let index = if self.centred {
            scaled.round()
        } else {
            scaled.floor()
        };
        Some(BinKey {
            index: index as i64,
            size: self.size,
            centred: self.centred,
        })
    }

    /// Group quasars into bins, members of each bin sorted by object id
    pub fn group(&self, quasars: &[Quasar]) -> BTreeMap<BinKey, Vec<Quasar>> {
        let mut bins: BTreeMap<BinKey, Vec<Quasar>> = BTreeMap::new();
        for q in quasars {
            match self.key(q) {
                Some(key) => bins.entry(key).or_default().push(q.clone()),
                None => warn!(
                    "Object {} has no usable {}, not binned",
                    q.obj_id, self.quantity
                ),
            }
        }
        for members in bins.values_mut() {
            members.sort_by_key(|q| q.obj_id);
        }
        bins
    }
}

/// Identifies one bin of a [`Binning`]
#[derive(Debug, Clone, Copy)]
pub struct BinKey {
    index: i64,
    size: f64,
    centred: bool,
}

impl BinKey {
    /// Bin number: the bin's value divided by the bin width
    pub fn index(&self) -> i64 {
        self.index
    }

    /// Bin width
    pub fn size(&self) -> f64 {
        self.size
    }

    /// Value naming the bin: its lower edge, or its centre for centred bins
    pub fn value(&self) -> f64 {
        self.index as f64 * self.size
    }

    /// Lower edge of the bin
    pub fn lower(&self) -> f64 {
        if self.centred {
            (self.index as f64 - 0.5) * self.size
        } else {
            self.value()
        }
    }

    /// Upper edge of the bin (exclusive)
    pub fn upper(&self) -> f64 {
        self.lower() + self.size
    }

    /// [`value`](Self::value) printed with as many decimals as the bin
    /// width needs, e.g. `2.2` or `-26.5`
    pub fn label(&self) -> String {
        format!("{:.*}", decimals(self.size), self.value())
    }
}

/// Decimals needed to print multiples of `size` exactly
fn decimals(size: f64) -> usize {
    let mut scaled = size;
    for d in 0..6 {
        if (scaled - scaled.round()).abs() < 1e-9 * scaled.abs().max(1.0) {
            return d;
        }
        scaled *= 10.0;
    }
    6
}

impl PartialEq for BinKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for BinKey {}

impl PartialOrd for BinKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BinKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index
            .cmp(&other.index)
            .then_with(|| self.size.total_cmp(&other.size))
            .then_with(|| self.centred.cmp(&other.centred))
    }
}

impl fmt::Display for BinKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Composite of one bin together with what happened to its members
#[derive(Debug, Clone)]
pub struct BinnedComposite {
    /// Quantity the bin is defined on
    pub quantity: BinQuantity,
    /// The bin
    pub key: BinKey,
    /// Catalog entries in the bin
    pub members: usize,
    /// Spectra added to the composite
    pub contributors: usize,
    /// Members without a spectrum in the source
    pub missing: usize,
    /// Members whose spectrum could not be normalised
    pub unnormalisable: usize,
    /// The composite spectrum
    pub composite: CompositeSpectrum,
}

impl BinnedComposite {
    /// File name without extension, e.g. `z2.2` or `M-26.5`
    pub fn file_stem(&self) -> String {
        format!("{}{}", self.quantity.prefix(), self.key.label())
    }
}

impl fmt::Display for BinnedComposite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} members, {} combined, {} missing, {} not normalisable, {} wavelength bins",
            self.file_stem(),
            self.members,
            self.contributors,
            self.missing,
            self.unnormalisable,
            self.composite.len()
        )
    }
}

/// Resample, normalise and accumulate every member of one bin
pub fn composite_bin<S: SpectrumSource>(
    source: &mut S,
    quantity: BinQuantity,
    key: BinKey,
    members: &[Quasar],
) -> Result<BinnedComposite, PipelineError> {
    info!(
        "{} = {}, size = {}",
        quantity.prefix(),
        key.label(),
        members.len()
    );

    let mut acc = Accumulator::new();
    let mut missing = 0;
    let mut unnormalisable = 0;

    for (n, q) in members.iter().enumerate() {
        if (n + 1) % PROGRESS_INTERVAL == 0 {
            info!("{}", n + 1);
        }

        let Some(spectrum) = source.spectrum(q.obj_id)? else {
            debug!("No spectrum for object {}", q.obj_id);
            missing += 1;
            continue;
        };

        let mut rest = match RestFrameSpectrum::shift_and_rebin(&spectrum, q.redshift) {
            Ok(rest) => rest,
            Err(RestFrameError::RedshiftOutOfRange(z)) => {
                warn!("Object {} has unusable redshift {}", q.obj_id, z);
                unnormalisable += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if rest.normalise(q.redshift) {
            acc.combine(&rest)?;
        } else {
            debug!(
                "Object {} at z = {} has no normalisation window",
                q.obj_id, q.redshift
            );
            unnormalisable += 1;
        }
    }

    Ok(BinnedComposite {
        quantity,
        key,
        members: members.len(),
        contributors: acc.contributors(),
        missing,
        unnormalisable,
        composite: acc.composite(),
    })
}

fn log_bins(binning: &Binning, bins: &BTreeMap<BinKey, Vec<Quasar>>) {
    info!(
        "Begin composites by {}: {} bins of width {}",
        binning.quantity,
        bins.len(),
        binning.size
    );
    for (key, members) in bins {
        info!("{} = {}: {}", binning.quantity.prefix(), key.label(), members.len());
    }
}

/// Builds the composites of every bin of one [`Binning`] from a single
/// spectrum source, bin after bin
pub struct CompositeRun<S: SpectrumSource> {
    source: S,
    binning: Binning,
}

impl<S: SpectrumSource> CompositeRun<S> {
    /// Create a run over `source`
    pub fn new(source: S, binning: Binning) -> Self {
        Self { source, binning }
    }

    /// Binning of this run
    pub fn binning(&self) -> &Binning {
        &self.binning
    }

    /// Give back the spectrum source
    pub fn into_source(self) -> S {
        self.source
    }

    /// Build one composite per bin, in ascending bin order
    pub fn run(&mut self, quasars: &[Quasar]) -> Result<Vec<BinnedComposite>, PipelineError> {
        let bins = self.binning.group(quasars);
        log_bins(&self.binning, &bins);

        let mut results = Vec::with_capacity(bins.len());
        for (key, members) in &bins {
            let result = composite_bin(&mut self.source, self.binning.quantity, *key, members)?;
            info!("{}", result);
            results.push(result);
        }

        info!("End composites by {}", self.binning.quantity);
        Ok(results)
    }
}

/// Build one composite per bin with bins processed in parallel.
///
/// Every bin gets its own spectrum source from `open_source`, so sources
/// never need to be shared between threads. Results are in ascending bin
/// order.
#[cfg(feature = "parallel")]
pub fn run_parallel<S, F>(
    binning: &Binning,
    quasars: &[Quasar],
    open_source: F,
) -> Result<Vec<BinnedComposite>, PipelineError>
where
    S: SpectrumSource,
    F: Fn() -> Result<S, StoreError> + Sync,
{
    use rayon::prelude::*;

    let bins: Vec<(BinKey, Vec<Quasar>)> = binning.group(quasars).into_iter().collect();
    info!(
        "Begin composites by {}: {} bins of width {} (parallel)",
        binning.quantity,
        bins.len(),
        binning.size
    );

    let results = bins
        .into_par_iter()
        .map(|(key, members)| {
            let mut source = open_source()?;
            composite_bin(&mut source, binning.quantity, key, &members)
        })
        .collect::<Result<Vec<_>, _>>()?;

    info!("End composites by {}", binning.quantity);
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quasar(obj_id: i64, redshift: f64, abs_magnitude: f64) -> Quasar {
        Quasar {
            obj_id,
            ra: 0.0,
            dec: 0.0,
            redshift,
            abs_magnitude,
            bal: false,
        }
    }

    /// Constant flux over the whole observed range
    fn flat_spectrum(obj_id: i64) -> Spectrum {
        Spectrum::lite(obj_id, (0..4000).map(|i| (2.0, 3.5700 + i as f32 * 1e-4)))
    }

    #[test]
    fn test_floor_and_centred_keys() {
        let q = quasar(1, 2.31, -26.2);

        let key = Binning::redshift().key(&q).unwrap();
        assert_eq!(key.index(), 11);
        assert_eq!(key.label(), "2.2");

        let key = Binning::luminosity().key(&q).unwrap();
        assert_eq!(key.index(), -53);
        assert_eq!(key.label(), "-26.5");
        assert!((key.upper() - -26.0).abs() < 1e-12);

        let centred = Binning {
            centred: true,
            ..Binning::redshift()
        };
        let key = centred.key(&q).unwrap();
        assert_eq!(key.label(), "2.4");
        assert!((key.lower() - 2.3).abs() < 1e-12);

        assert!(Binning::redshift().key(&quasar(2, f64::NAN, 0.0)).is_none());
    }

    #[test]
    fn test_group_sorts_members_by_id() {
        let quasars = vec![
            quasar(30, 1.05, -25.0),
            quasar(10, 1.15, -25.0),
            quasar(20, 2.50, -25.0),
            quasar(5, 1.01, -25.0),
            quasar(7, f64::NAN, -25.0),
        ];
        let bins = Binning::redshift().group(&quasars);
        assert_eq!(bins.len(), 2);

        let labels: Vec<_> = bins.keys().map(BinKey::label).collect();
        assert_eq!(labels, vec!["1.0", "2.4"]);

        let first: Vec<_> = bins.values().next().unwrap().iter().map(|q| q.obj_id).collect();
        assert_eq!(first, vec![5, 10, 30]);
    }

    #[test]
    fn test_decimals() {
        assert_eq!(decimals(0.2), 1);
        assert_eq!(decimals(0.5), 1);
        assert_eq!(decimals(0.25), 2);
        assert_eq!(decimals(1.0), 0);
    }

    #[test]
    fn test_run_counts_skipped_members() {
        let mut source: BTreeMap<i64, Spectrum> = BTreeMap::new();
        for id in [1, 2, 3] {
            source.insert(id, flat_spectrum(id));
        }

        let quasars = vec![
            quasar(1, 1.02, -25.2),
            quasar(2, 1.11, -25.4),
            quasar(3, 4.90, -27.0), // no normalisation window at this redshift
            quasar(4, 1.05, -25.1), // not in the source
        ];

        let mut run = CompositeRun::new(&mut source, Binning::redshift());
        let results = run.run(&quasars).unwrap();
        assert_eq!(results.len(), 2);

        let low = &results[0];
        assert_eq!(low.file_stem(), "z1.0");
        assert_eq!(low.members, 3);
        assert_eq!(low.contributors, 2);
        assert_eq!(low.missing, 1);
        assert_eq!(low.unnormalisable, 0);
        assert!(!low.composite.is_empty());

        let high = &results[1];
        assert_eq!(high.file_stem(), "z4.8");
        assert_eq!(high.contributors, 0);
        assert_eq!(high.unnormalisable, 1);
        assert!(high.composite.is_empty());
    }

    #[test]
    fn test_flat_spectra_composite_to_window_level() {
        let mut source: BTreeMap<i64, Spectrum> =
            (1..=3).map(|id| (id, flat_spectrum(id))).collect();
        let quasars: Vec<_> = (1..=3).map(|id| quasar(id, 1.0, -25.0)).collect();

        let results = CompositeRun::new(&mut source, Binning::redshift())
            .run(&quasars)
            .unwrap();
        let composite = &results[0].composite;

        // Away from the edges every spectrum contributes the same level
        let p = composite.get(2000).unwrap();
        assert_eq!(p.count(), 3);
        assert!((p.mean() - p.median()).abs() < 1e-9);
        assert!(p.mean_uncertainty() < 1e-9);
    }
}
