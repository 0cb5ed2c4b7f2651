use std::fmt;

use serde::Serialize;

use super::format::StoreMode;

/// Statistics from a completed store write
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    /// Record encoding of the store
    pub mode: StoreMode,
    /// Number of spectra written
    pub spectra_written: usize,
    /// Total number of pixels written
    pub pixels_written: usize,
    /// Byte offset of the index
    pub index_offset: u64,
    /// Total file size in bytes
    pub file_size_bytes: u64,
}

impl fmt::Display for StoreStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Wrote {} {} spectra ({} pixels), {} bytes",
            self.spectra_written, self.mode, self.pixels_written, self.file_size_bytes
        )
    }
}

/// Access counters of a store reader
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ReaderStats {
    /// Records served from the current page buffer
    pub buffer_hits: usize,
    /// Times the page buffer was refilled from the file
    pub buffer_refills: usize,
    /// Records read directly, bypassing the page buffer
    pub direct_reads: usize,
    /// Bytes read from the file for records
    pub bytes_read: u64,
}

impl fmt::Display for ReaderStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} buffer hits, {} refills, {} direct reads, {} bytes read",
            self.buffer_hits, self.buffer_refills, self.direct_reads, self.bytes_read
        )
    }
}
