/// Errors that can occur while writing or reading a spectrum store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error during file operations, including truncated reads
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The file does not follow the store layout
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// An object id was added to the store twice
    #[error("Duplicate object id: {0}")]
    DuplicateObjectId(i64),

    /// A lite spectrum was added to a full store
    #[error("Spectrum {0} carries no ancillary data but the store is in full mode")]
    MissingDetail(i64),

    /// A spectrum has more pixels than a record can describe
    #[error("Spectrum {obj_id} has {pixels} pixels, more than a record can hold")]
    TooManyPixels {
        /// Object id of the offending spectrum
        obj_id: i64,
        /// Its pixel count
        pixels: usize,
    },
}
