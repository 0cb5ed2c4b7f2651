//! # Spectrum Store Validation
//!
//! Deep integrity check of a spectrum store file, reported check by check
//! instead of stopping at the first problem.
//!
//! ## Checks
//!
//! 1. **Structure**: the file exists, is long enough for a header, and its
//!    header and index decode with consistent offsets and unique ids.
//! 2. **Records**: every indexed record decodes and belongs to the object
//!    the index says, with finite and increasing wavelengths. Records that
//!    are empty, hold NaN flux, or miss the useful wavelength range are
//!    reported as warnings.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use specstack::validator::validate_store;
//! use std::path::Path;
//!
//! match validate_store(Path::new("quasars.spdb")) {
//!     Ok(report) => println!("{}", report),
//!     Err(e) => eprintln!("Validation failed: {}", e),
//! }
//! ```

use std::path::Path;

pub use report::{CheckStatus, ValidationCheck, ValidationReport};

mod data;
mod report;
mod structure;


/// Errors that stop validation before any check could run
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// Path missing or not a regular file
    #[error("Structure error: {0}")]
    StructureError(String),

    /// I/O error during file operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Validate the spectrum store at `path`
pub fn validate_store(path: &Path) -> Result<ValidationReport, ValidationError> {
    let mut report = ValidationReport::new(path.display().to_string());

    // 1. Structure
    let Some(mut reader) = structure::check_structure(path, &mut report)? else {
        return Ok(report);
    };

    // 2. Records
    data::check_records(&mut reader, &mut report)?;

    log::debug!(
        "Validated {}: {} passed, {} warnings, {} failed",
        path.display(),
        report.success_count(),
        report.warning_count(),
        report.failure_count()
    );
    Ok(report)
}
