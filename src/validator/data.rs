use std::io::{Read, Seek};

use crate::spectrum::{Spectrum, MAX_USEFUL_WAVELENGTH, MIN_USEFUL_WAVELENGTH};
use crate::store::{SpectrumStoreReader, StoreError};

use super::{ValidationCheck, ValidationError, ValidationReport};

/// Offending spectra of one kind
#[derive(Default)]
struct Tally {
    count: usize,
    first: Option<i64>,
}

impl Tally {
    fn add(&mut self, obj_id: i64) {
        self.count += 1;
        self.first.get_or_insert(obj_id);
    }

    fn check(&self, name: &str, total: usize, fatal: bool) -> ValidationCheck {
        ValidationCheck::from_count(name, self.count, total, self.first, fatal)
    }
}

#[derive(Default)]
struct RecordTallies {
    unreadable: Tally,
    bad_wavelengths: Tally,
    empty: Tally,
    nan_flux: Tally,
    outside_useful: Tally,
}

impl RecordTallies {
    fn inspect(&mut self, s: &Spectrum) {
        let id = s.obj_id();
        if s.num_pixels() == 0 {
            self.empty.add(id);
            return;
        }

        let loglam = s.loglam();
        let ascending = loglam.iter().all(|l| l.is_finite())
            && loglam.windows(2).all(|w| w[0] < w[1]);
        if !ascending {
            self.bad_wavelengths.add(id);
        }

        if s.flux().iter().any(|f| f.is_nan()) {
            self.nan_flux.add(id);
        }

        let useful = s.pixels().any(|p| {
            let wl = p.wavelength();
            (MIN_USEFUL_WAVELENGTH..=MAX_USEFUL_WAVELENGTH).contains(&wl)
        });
        if !useful {
            self.outside_useful.add(id);
        }
    }
}

/// Step 2: decode and inspect every record in id order
pub(crate) fn check_records<R: Read + Seek>(
    reader: &mut SpectrumStoreReader<R>,
    report: &mut ValidationReport,
) -> Result<(), ValidationError> {
    let ids: Vec<i64> = reader.ids().collect();
    let total = ids.len();
    let mut tallies = RecordTallies::default();

    for id in ids {
        match reader.get(id) {
            Ok(Some(s)) => {
                report.pixels += s.num_pixels() as u64;
                tallies.inspect(&s);
            }
            Ok(None) => tallies.unreadable.add(id),
            Err(StoreError::IoError(e)) if e.kind() != std::io::ErrorKind::UnexpectedEof => {
                return Err(ValidationError::IoError(e));
            }
            Err(e) => {
                log::debug!("Object {}: {}", id, e);
                tallies.unreadable.add(id);
            }
        }
    }

    report.add_check(tallies.unreadable.check("Records decode", total, true));
    report.add_check(tallies.bad_wavelengths.check("Wavelengths increasing", total, true));
    report.add_check(tallies.empty.check("Non-empty spectra", total, false));
    report.add_check(tallies.nan_flux.check("Finite flux", total, false));
    report.add_check(tallies.outside_useful.check("Useful wavelength coverage", total, false));

    let stats = reader.stats();
    log::debug!("Record scan: {}", stats);
    Ok(())
}
