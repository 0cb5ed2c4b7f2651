/// Default size of the reader's page buffer (8 MiB)
pub const DEFAULT_BUFFER_SIZE: usize = 1 << 23;

/// Configuration for reading spectrum stores
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Size of the page buffer in bytes
    pub buffer_size: usize,

    /// Serve records from the page buffer. When false every record is read
    /// from the file with its own seek.
    pub buffered: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            buffered: true,
        }
    }
}

impl ReaderConfig {
    /// Read every record directly from the file
    pub fn unbuffered() -> Self {
        Self {
            buffered: false,
            ..Self::default()
        }
    }

    /// Use a page buffer of `buffer_size` bytes
    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self {
            buffer_size,
            buffered: true,
        }
    }
}
