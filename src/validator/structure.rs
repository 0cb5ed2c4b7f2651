use std::fs::File;
use std::path::Path;

use crate::store::{ReaderConfig, SpectrumStoreReader, HEADER_SIZE};

use super::{ValidationCheck, ValidationError, ValidationReport};

/// Step 1: file, header and index.
///
/// Returns the opened reader, or `None` if the store cannot be opened, in
/// which case the report says why.
pub(crate) fn check_structure(
    path: &Path,
    report: &mut ValidationReport,
) -> Result<Option<SpectrumStoreReader<File>>, ValidationError> {
    if !path.exists() {
        report.add_check(ValidationCheck::failed(
            "Path exists",
            format!("Path does not exist: {}", path.display()),
        ));
        return Err(ValidationError::StructureError(format!(
            "{} does not exist",
            path.display()
        )));
    }
    if !path.is_file() {
        report.add_check(ValidationCheck::failed(
            "Regular file",
            "Path is not a regular file",
        ));
        return Err(ValidationError::StructureError(format!(
            "{} is not a regular file",
            path.display()
        )));
    }
    report.add_check(ValidationCheck::ok("Path exists"));

    let size = std::fs::metadata(path)?.len();
    if size < HEADER_SIZE {
        report.add_check(ValidationCheck::failed(
            "File size",
            format!("{} bytes, the header alone needs {}", size, HEADER_SIZE),
        ));
        return Ok(None);
    }
    report.add_check(ValidationCheck::ok("File size"));

    let reader = match SpectrumStoreReader::open_with_config(path, ReaderConfig::default()) {
        Ok(reader) => reader,
        Err(e) => {
            report.add_check(ValidationCheck::failed("Header and index", e.to_string()));
            return Ok(None);
        }
    };

    report.mode = Some(reader.mode());
    report.spectra = reader.len();
    report.add_check(ValidationCheck::ok(format!("Header ({} store)", reader.mode())));

    if reader.is_empty() {
        report.add_check(ValidationCheck::warning("Index", "store holds no spectra"));
    } else {
        report.add_check(ValidationCheck::ok(format!("Index ({} entries)", reader.len())));
    }

    // Records out of id order still read correctly, just slower
    let out_of_order = reader
        .index()
        .windows(2)
        .filter(|w| w[1].offset < w[0].offset)
        .count();
    if out_of_order == 0 {
        report.add_check(ValidationCheck::ok("Records in id order"));
    } else {
        report.add_check(ValidationCheck::warning(
            "Records in id order",
            format!(
                "{} records precede a smaller object id in the file; id-ordered reads will seek",
                out_of_order
            ),
        ));
    }

    Ok(Some(reader))
}
