//! Mean rest-frame flux of each quasar in every normalisation window.
//!
//! These averages are the raw material for the chained window ratios used by
//! [`NormalisationRange`]: for quasars that cover two adjacent windows, the
//! ratio of their averages estimates the continuum slope between them.

use std::collections::HashMap;
use std::io::{Read, Seek};

use log::{info, warn};

use crate::binning::PipelineError;
use crate::catalog::Quasar;
use crate::composite::{RestFrameError, RestFrameSpectrum};
use crate::normalisation::NormalisationRange;
use crate::store::SpectrumStoreReader;

/// Objects processed between progress messages
const PROGRESS_INTERVAL: usize = 1000;

/// Window averages of one quasar
#[derive(Debug, Clone, PartialEq)]
pub struct WindowAverages {
    quasar: Quasar,
    averages: Vec<Option<f64>>,
}

impl WindowAverages {
    /// Average `spectrum` over every window of [`NormalisationRange::all`]
    pub fn compute(quasar: Quasar, spectrum: &RestFrameSpectrum) -> Self {
        let averages = NormalisationRange::all()
            .iter()
            .map(|r| spectrum.range_average(r.start_wl(), r.end_wl()))
            .collect();
        Self { quasar, averages }
    }

    /// The quasar
    pub fn quasar(&self) -> &Quasar {
        &self.quasar
    }

    /// One average per window in table order, `None` where the spectrum
    /// does not cover the whole window
    pub fn averages(&self) -> &[Option<f64>] {
        &self.averages
    }
}

/// Compute window averages for every quasar of `quasars` that has a
/// spectrum in the store.
///
/// The store is walked in ascending object id order. Quasars whose redshift
/// cannot be mapped to the rest frame are skipped with a warning.
pub fn window_averages<R: Read + Seek>(
    reader: &mut SpectrumStoreReader<R>,
    quasars: &[Quasar],
) -> Result<Vec<WindowAverages>, PipelineError> {
    let by_id: HashMap<i64, &Quasar> = quasars.iter().map(|q| (q.obj_id, q)).collect();
    let ids: Vec<i64> = reader.ids().collect();

    info!(
        "Begin window averages: {} catalog objects, {} spectra",
        by_id.len(),
        ids.len()
    );

    let mut results = Vec::with_capacity(by_id.len().min(ids.len()));
    for (n, obj_id) in ids.into_iter().enumerate() {
        if (n + 1) % PROGRESS_INTERVAL == 0 {
            info!("{}", n + 1);
        }

        let Some(&q) = by_id.get(&obj_id) else {
            continue;
        };
        let Some(spectrum) = reader.get(obj_id)? else {
            continue;
        };

        match RestFrameSpectrum::shift_and_rebin(&spectrum, q.redshift) {
            Ok(rest) => results.push(WindowAverages::compute(q.clone(), &rest)),
            Err(RestFrameError::RedshiftOutOfRange(z)) => {
                warn!("Object {} has unusable redshift {}", obj_id, z);
            }
            Err(e) => return Err(e.into()),
        }
    }

    info!("End window averages: {} objects", results.len());
    Ok(results)
}
