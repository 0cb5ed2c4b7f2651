use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use byteorder::{BigEndian, WriteBytesExt};
use log::{debug, info};

use crate::spectrum::Spectrum;

use super::error::StoreError;
use super::format::{encode_index, encode_payload, write_header, IndexEntry, StoreMode, HEADER_SIZE};
use super::stats::StoreStats;

/// Append-only writer for spectrum stores.
///
/// Records are appended in the order they are added. The index can only be
/// written once every record is known, so [`finish`](Self::finish) appends
/// it and then patches its offset into the header. A store whose writer was
/// dropped without finishing is not readable.
pub struct SpectrumStoreWriter<W: Write + Seek> {
    writer: W,
    mode: StoreMode,
    index: Vec<IndexEntry>,
    seen: HashSet<i64>,
    position: u64,
    pixels_written: usize,
    scratch: Vec<u8>,
}

impl SpectrumStoreWriter<BufWriter<File>> {
    /// Create a new store file. Fails if `path` already exists.
    pub fn create<P: AsRef<Path>>(path: P, mode: StoreMode) -> Result<Self, StoreError> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path.as_ref())?;
        info!("Creating {} spectrum store: {}", mode, path.as_ref().display());
        Self::new(BufWriter::new(file), mode)
    }
}

impl<W: Write + Seek> SpectrumStoreWriter<W> {
    /// Start a store on any seekable writer, positioned at its start
    pub fn new(mut writer: W, mode: StoreMode) -> Result<Self, StoreError> {
        // Index offset is a placeholder until finish()
        write_header(&mut writer, 0, mode)?;

        Ok(Self {
            writer,
            mode,
            index: Vec::new(),
            seen: HashSet::new(),
            position: HEADER_SIZE,
            pixels_written: 0,
            scratch: Vec::new(),
        })
    }

    /// Record encoding of this store
    pub fn mode(&self) -> StoreMode {
        self.mode
    }

    /// Number of spectra added so far
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns true if no spectra have been added
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Append a spectrum.
    ///
    /// Full spectra added to a lite store are stored without their ancillary
    /// data. Lite spectra cannot be added to a full store.
    pub fn add(&mut self, spectrum: &Spectrum) -> Result<(), StoreError> {
        let obj_id = spectrum.obj_id();
        if self.seen.contains(&obj_id) {
            return Err(StoreError::DuplicateObjectId(obj_id));
        }

        encode_payload(spectrum, self.mode, &mut self.scratch)?;

        let offset = self.position;
        self.writer.write_i64::<BigEndian>(self.scratch.len() as i64)?;
        self.writer.write_all(&self.scratch)?;
        self.position += 8 + self.scratch.len() as u64;

        self.seen.insert(obj_id);
        self.index.push(IndexEntry { obj_id, offset });
        self.pixels_written += spectrum.num_pixels();

        if self.index.len() % 1000 == 0 {
            debug!("Written {} spectra...", self.index.len());
        }
        Ok(())
    }

    /// Append every spectrum from an iterator
    pub fn add_all<'a, I>(&mut self, spectra: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = &'a Spectrum>,
    {
        for s in spectra {
            self.add(s)?;
        }
        Ok(())
    }

    fn write_index(&mut self) -> Result<u64, StoreError> {
        let index_offset = self.position;

        let mut buf = Vec::new();
        encode_index(&self.index, &mut buf)?;
        self.writer.write_all(&buf)?;
        self.position += buf.len() as u64;

        // Backpatch the header now that the index location is known
        self.writer.seek(SeekFrom::Start(0))?;
        write_header(&mut self.writer, index_offset, self.mode)?;
        self.writer.seek(SeekFrom::Start(self.position))?;
        self.writer.flush()?;

        Ok(index_offset)
    }

    fn stats(&self, index_offset: u64) -> StoreStats {
        StoreStats {
            mode: self.mode,
            spectra_written: self.index.len(),
            pixels_written: self.pixels_written,
            index_offset,
            file_size_bytes: self.position,
        }
    }

    /// Write the index and patch the header
    pub fn finish(mut self) -> Result<StoreStats, StoreError> {
        let index_offset = self.write_index()?;
        let stats = self.stats(index_offset);
        info!("{}", stats);
        Ok(stats)
    }

    /// Finish the store and return the underlying writer with the stats
    pub fn finish_into_inner(mut self) -> Result<(W, StoreStats), StoreError> {
        let index_offset = self.write_index()?;
        let stats = self.stats(index_offset);
        Ok((self.writer, stats))
    }
}
