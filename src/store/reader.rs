use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::ops::Range;
use std::path::Path;

use byteorder::{BigEndian, ByteOrder, ReadBytesExt};
use log::debug;

use crate::spectrum::Spectrum;

use super::config::ReaderConfig;
use super::error::StoreError;
use super::format::{
    decode_index, decode_payload, read_header, Header, IndexEntry, StoreMode, HEADER_SIZE,
    LENGTH_PREFIX_SIZE,
};
use super::stats::ReaderStats;

/// Random-access reader for spectrum stores.
///
/// The index is loaded and sorted by object id when the store is opened.
/// Records are served from a single page buffer that is refilled from the
/// file whenever a requested record is not entirely inside it, so reading in
/// ascending id order (which is usually file order) touches the file once
/// per buffer rather than once per record. Records that do not fit in the
/// buffer are read directly.
pub struct SpectrumStoreReader<R: Read + Seek> {
    reader: R,
    config: ReaderConfig,
    header: Header,
    index: Vec<IndexEntry>,
    file_size: u64,
    window: Vec<u8>,
    window_start: u64,
    window_len: usize,
    stats: ReaderStats,
}

impl SpectrumStoreReader<File> {
    /// Open a store file with the default configuration
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::open_with_config(path, ReaderConfig::default())
    }

    /// Open a store file with a custom configuration
    pub fn open_with_config<P: AsRef<Path>>(
        path: P,
        config: ReaderConfig,
    ) -> Result<Self, StoreError> {
        let file = File::open(path.as_ref())?;
        debug!("Opening spectrum store: {}", path.as_ref().display());
        Self::new(file, config)
    }
}

impl<R: Read + Seek> SpectrumStoreReader<R> {
    /// Load the header and index from any seekable reader
    pub fn new(mut reader: R, config: ReaderConfig) -> Result<Self, StoreError> {
        let file_size = reader.seek(SeekFrom::End(0))?;
        if file_size < HEADER_SIZE {
            return Err(StoreError::InvalidFormat(format!(
                "file is {} bytes, shorter than the header",
                file_size
            )));
        }

        reader.seek(SeekFrom::Start(0))?;
        let header = read_header(&mut reader)?;
        if header.index_offset + LENGTH_PREFIX_SIZE > file_size {
            return Err(StoreError::InvalidFormat(format!(
                "index offset {} is beyond the end of the file ({} bytes)",
                header.index_offset, file_size
            )));
        }

        reader.seek(SeekFrom::Start(header.index_offset))?;
        let index_len = reader.read_i64::<BigEndian>()?;
        let index_end = header.index_offset + LENGTH_PREFIX_SIZE;
        if index_len < 4 || index_end + index_len as u64 > file_size {
            return Err(StoreError::InvalidFormat(format!(
                "index length {} does not fit in the file",
                index_len
            )));
        }

        let mut index_bytes = vec![0u8; index_len as usize];
        reader.read_exact(&mut index_bytes)?;
        let mut index = decode_index(&index_bytes)?;

        if let Some(e) = index
            .iter()
            .find(|e| e.offset + LENGTH_PREFIX_SIZE > header.index_offset)
        {
            return Err(StoreError::InvalidFormat(format!(
                "object {} has record offset {} inside the index",
                e.obj_id, e.offset
            )));
        }

        index.sort_unstable();
        if let Some(w) = index.windows(2).find(|w| w[0].obj_id == w[1].obj_id) {
            return Err(StoreError::InvalidFormat(format!(
                "object id {} appears more than once in the index",
                w[0].obj_id
            )));
        }

        debug!(
            "Loaded {} store index with {} entries",
            header.mode,
            index.len()
        );

        let window = if config.buffered && config.buffer_size >= LENGTH_PREFIX_SIZE as usize {
            vec![0u8; config.buffer_size]
        } else {
            Vec::new()
        };

        Ok(Self {
            reader,
            config,
            header,
            index,
            file_size,
            window,
            window_start: 0,
            window_len: 0,
            stats: ReaderStats::default(),
        })
    }

    /// Record encoding of the store
    pub fn mode(&self) -> StoreMode {
        self.header.mode
    }

    /// Returns true if the store holds lite records
    pub fn is_lite(&self) -> bool {
        self.header.mode == StoreMode::Lite
    }

    /// Header fields
    pub fn header(&self) -> Header {
        self.header
    }

    /// Reader configuration
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Total size of the store in bytes
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Number of spectra in the store
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns true if the store holds no spectra
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Index entries in ascending object id order
    pub fn index(&self) -> &[IndexEntry] {
        &self.index
    }

    /// All object ids in ascending order
    pub fn ids(&self) -> impl ExactSizeIterator<Item = i64> + '_ {
        self.index.iter().map(|e| e.obj_id)
    }

    /// Returns true if the store holds a spectrum for `obj_id`
    pub fn contains(&self, obj_id: i64) -> bool {
        self.find(obj_id).is_some()
    }

    /// Access counters since the store was opened
    pub fn stats(&self) -> ReaderStats {
        self.stats
    }

    fn find(&self, obj_id: i64) -> Option<IndexEntry> {
        self.index
            .binary_search_by_key(&obj_id, |e| e.obj_id)
            .ok()
            .map(|i| self.index[i])
    }

    /// Get a spectrum by object id.
    ///
    /// Returns `Ok(None)` if the store has no spectrum for `obj_id`.
    pub fn get(&mut self, obj_id: i64) -> Result<Option<Spectrum>, StoreError> {
        match self.find(obj_id) {
            Some(entry) => self.read_record(entry).map(Some),
            None => Ok(None),
        }
    }

    /// Iterate over every spectrum in ascending object id order
    pub fn spectra(&mut self) -> SpectrumIter<'_, R> {
        SpectrumIter {
            reader: self,
            position: 0,
        }
    }

    fn read_record(&mut self, entry: IndexEntry) -> Result<Spectrum, StoreError> {
        let spectrum = if self.window.is_empty() {
            self.read_direct(entry)?
        } else {
            self.read_buffered(entry)?
        };

        if spectrum.obj_id() != entry.obj_id {
            return Err(StoreError::InvalidFormat(format!(
                "record at offset {} holds object {}, index says {}",
                entry.offset,
                spectrum.obj_id(),
                entry.obj_id
            )));
        }
        Ok(spectrum)
    }

    fn check_record_len(&self, entry: IndexEntry, len: i64) -> Result<u64, StoreError> {
        if len < 0 || entry.offset + LENGTH_PREFIX_SIZE + len as u64 > self.header.index_offset {
            return Err(StoreError::InvalidFormat(format!(
                "record of object {} at offset {} has invalid length {}",
                entry.obj_id, entry.offset, len
            )));
        }
        Ok(len as u64)
    }

    /// Payload range of the record inside the page buffer, if the whole
    /// record is buffered
    fn buffered_payload(&self, entry: IndexEntry) -> Result<Option<Range<usize>>, StoreError> {
        if entry.offset < self.window_start {
            return Ok(None);
        }
        let rel = entry.offset - self.window_start;
        if rel + LENGTH_PREFIX_SIZE > self.window_len as u64 {
            return Ok(None);
        }

        let start = rel as usize;
        let len = BigEndian::read_i64(&self.window[start..start + LENGTH_PREFIX_SIZE as usize]);
        let len = self.check_record_len(entry, len)?;

        let payload_start = start + LENGTH_PREFIX_SIZE as usize;
        if payload_start as u64 + len > self.window_len as u64 {
            return Ok(None);
        }
        Ok(Some(payload_start..payload_start + len as usize))
    }

    fn refill(&mut self, offset: u64) -> Result<(), StoreError> {
        self.reader.seek(SeekFrom::Start(offset))?;

        let available = (self.file_size - offset).min(self.window.len() as u64) as usize;
        let mut filled = 0;
        while filled < available {
            match self.reader.read(&mut self.window[filled..available])? {
                0 => break,
                n => filled += n,
            }
        }

        self.window_start = offset;
        self.window_len = filled;
        self.stats.buffer_refills += 1;
        self.stats.bytes_read += filled as u64;
        Ok(())
    }

    fn read_buffered(&mut self, entry: IndexEntry) -> Result<Spectrum, StoreError> {
        if let Some(range) = self.buffered_payload(entry)? {
            self.stats.buffer_hits += 1;
            return decode_payload(&self.window[range], self.header.mode);
        }

        self.refill(entry.offset)?;
        if let Some(range) = self.buffered_payload(entry)? {
            return decode_payload(&self.window[range], self.header.mode);
        }

        // Record is larger than the page buffer
        self.read_direct(entry)
    }

    fn read_direct(&mut self, entry: IndexEntry) -> Result<Spectrum, StoreError> {
        self.reader.seek(SeekFrom::Start(entry.offset))?;
        let len = self.reader.read_i64::<BigEndian>()?;
        let len = self.check_record_len(entry, len)?;

        let mut payload = vec![0u8; len as usize];
        self.reader.read_exact(&mut payload)?;

        self.stats.direct_reads += 1;
        self.stats.bytes_read += LENGTH_PREFIX_SIZE + len;
        decode_payload(&payload, self.header.mode)
    }
}

/// Iterator over the spectra of a store in ascending object id order
pub struct SpectrumIter<'a, R: Read + Seek> {
    reader: &'a mut SpectrumStoreReader<R>,
    position: usize,
}

impl<R: Read + Seek> Iterator for SpectrumIter<'_, R> {
    type Item = Result<Spectrum, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = *self.reader.index.get(self.position)?;
        self.position += 1;
        Some(self.reader.read_record(entry))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.reader.index.len() - self.position;
        (remaining, Some(remaining))
    }
}
