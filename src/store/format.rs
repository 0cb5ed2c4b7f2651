//! Binary layout of the spectrum store.
//!
//! All integers and floats are big-endian.
//!
//! ```text
//! offset 0    i64  index offset (0 until the writer finishes)
//! offset 8    i64  mode flag: -1 lite, 1 full
//! offset 16   records, each [i64 payload length][payload]
//! index       i64  index length (4 + 16 * count)
//!             i32  count
//!             count x (i64 object id, i64 record offset)
//! ```
//!
//! Full payload: `i64 obj_id, i32 plate, i32 mjd, i32 fiber, i32 n`, then per
//! pixel `f32 flux, f32 loglam, f32 ivar, i32 and_mask, i32 or_mask,
//! f32 wdisp, f32 sky, f32 model`.
//!
//! Lite payload: `i64 obj_id, i32 n`, then per pixel `f32 flux, f32 loglam`.

use std::fmt;
use std::io::{Cursor, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;

use crate::spectrum::{FullPixel, Observation, Spectrum, SpectrumDetail};

use super::error::StoreError;

/// Size of the file header in bytes
pub const HEADER_SIZE: u64 = 16;

/// Size of one index entry in bytes
pub const INDEX_ENTRY_SIZE: u64 = 16;

/// Size of the length prefix in front of every record and of the index
pub const LENGTH_PREFIX_SIZE: u64 = 8;

const LITE_FLAG: i64 = -1;
const FULL_FLAG: i64 = 1;

/// Record encoding used uniformly for a whole store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreMode {
    /// Object id, flux and log wavelength only
    Lite,
    /// All COADD columns
    Full,
}

impl StoreMode {
    /// Header flag value
    pub fn flag(self) -> i64 {
        match self {
            StoreMode::Lite => LITE_FLAG,
            StoreMode::Full => FULL_FLAG,
        }
    }

    /// Parse a header flag value
    pub fn from_flag(flag: i64) -> Option<Self> {
        match flag {
            LITE_FLAG => Some(StoreMode::Lite),
            FULL_FLAG => Some(StoreMode::Full),
            _ => None,
        }
    }

    /// Bytes per pixel in a record
    pub fn pixel_size(self) -> usize {
        match self {
            StoreMode::Lite => 8,
            StoreMode::Full => 32,
        }
    }

    /// Bytes in a record payload before the first pixel
    pub fn fixed_size(self) -> usize {
        match self {
            StoreMode::Lite => 8 + 4,
            StoreMode::Full => 8 + 4 * 3 + 4,
        }
    }

    /// Payload length of a record with `pixels` pixels
    pub fn payload_len(self, pixels: usize) -> usize {
        self.fixed_size() + pixels * self.pixel_size()
    }
}

impl fmt::Display for StoreMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreMode::Lite => write!(f, "lite"),
            StoreMode::Full => write!(f, "full"),
        }
    }
}

/// One `(object id, record offset)` pair of the store index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct IndexEntry {
    /// Object id
    pub obj_id: i64,
    /// Offset of the record's length prefix from the start of the file
    pub offset: u64,
}

/// Header fields at the start of a store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Offset of the index
    pub index_offset: u64,
    /// Record encoding
    pub mode: StoreMode,
}

pub(crate) fn write_header<W: Write>(
    w: &mut W,
    index_offset: u64,
    mode: StoreMode,
) -> Result<(), StoreError> {
    w.write_i64::<BigEndian>(index_offset as i64)?;
    w.write_i64::<BigEndian>(mode.flag())?;
    Ok(())
}

pub(crate) fn read_header<R: Read>(r: &mut R) -> Result<Header, StoreError> {
    let index_offset = r.read_i64::<BigEndian>()?;
    let flag = r.read_i64::<BigEndian>()?;

    let mode = StoreMode::from_flag(flag)
        .ok_or_else(|| StoreError::InvalidFormat(format!("unknown mode flag {}", flag)))?;

    if index_offset < HEADER_SIZE as i64 {
        return Err(StoreError::InvalidFormat(format!(
            "index offset {} points into the header (store not finished?)",
            index_offset
        )));
    }

    Ok(Header {
        index_offset: index_offset as u64,
        mode,
    })
}

/// Serialize the index, including its length prefix
pub(crate) fn encode_index(entries: &[IndexEntry], buf: &mut Vec<u8>) -> Result<(), StoreError> {
    let count = i32::try_from(entries.len()).map_err(|_| {
        StoreError::InvalidFormat(format!("{} index entries do not fit in i32", entries.len()))
    })?;
    let index_len = 4 + entries.len() as u64 * INDEX_ENTRY_SIZE;

    buf.clear();
    buf.reserve(LENGTH_PREFIX_SIZE as usize + index_len as usize);
    buf.write_i64::<BigEndian>(index_len as i64)?;
    buf.write_i32::<BigEndian>(count)?;
    for e in entries {
        buf.write_i64::<BigEndian>(e.obj_id)?;
        buf.write_i64::<BigEndian>(e.offset as i64)?;
    }
    Ok(())
}

/// Read the index body that follows the length prefix
pub(crate) fn decode_index(bytes: &[u8]) -> Result<Vec<IndexEntry>, StoreError> {
    let mut cur = Cursor::new(bytes);
    let count = cur.read_i32::<BigEndian>()?;
    if count < 0 {
        return Err(StoreError::InvalidFormat(format!(
            "negative index entry count {}",
            count
        )));
    }

    let expected = 4 + count as u64 * INDEX_ENTRY_SIZE;
    if expected != bytes.len() as u64 {
        return Err(StoreError::InvalidFormat(format!(
            "index length mismatch: {} entries need {} bytes, index holds {}",
            count,
            expected,
            bytes.len()
        )));
    }

    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let obj_id = cur.read_i64::<BigEndian>()?;
        let offset = cur.read_i64::<BigEndian>()?;
        if offset < HEADER_SIZE as i64 {
            return Err(StoreError::InvalidFormat(format!(
                "object {} has invalid record offset {}",
                obj_id, offset
            )));
        }
        entries.push(IndexEntry {
            obj_id,
            offset: offset as u64,
        });
    }
    Ok(entries)
}

/// Serialize a spectrum payload (without its length prefix) into `buf`
pub(crate) fn encode_payload(
    spectrum: &Spectrum,
    mode: StoreMode,
    buf: &mut Vec<u8>,
) -> Result<(), StoreError> {
    let n = i32::try_from(spectrum.num_pixels()).map_err(|_| StoreError::TooManyPixels {
        obj_id: spectrum.obj_id(),
        pixels: spectrum.num_pixels(),
    })?;

    buf.clear();
    buf.reserve(mode.payload_len(spectrum.num_pixels()));
    buf.write_i64::<BigEndian>(spectrum.obj_id())?;

    match (mode, spectrum.detail()) {
        (StoreMode::Lite, _) => {
            buf.write_i32::<BigEndian>(n)?;
            for px in spectrum.pixels() {
                buf.write_f32::<BigEndian>(px.flux)?;
                buf.write_f32::<BigEndian>(px.loglam)?;
            }
        }
        (StoreMode::Full, SpectrumDetail::Full(detail)) => {
            let obs = detail.observation();
            buf.write_i32::<BigEndian>(obs.plate)?;
            buf.write_i32::<BigEndian>(obs.mjd)?;
            buf.write_i32::<BigEndian>(obs.fiber)?;
            buf.write_i32::<BigEndian>(n)?;
            for i in 0..spectrum.num_pixels() {
                buf.write_f32::<BigEndian>(spectrum.flux()[i])?;
                buf.write_f32::<BigEndian>(spectrum.loglam()[i])?;
                buf.write_f32::<BigEndian>(detail.ivar()[i])?;
                buf.write_i32::<BigEndian>(detail.and_mask()[i])?;
                buf.write_i32::<BigEndian>(detail.or_mask()[i])?;
                buf.write_f32::<BigEndian>(detail.wdisp()[i])?;
                buf.write_f32::<BigEndian>(detail.sky()[i])?;
                buf.write_f32::<BigEndian>(detail.model()[i])?;
            }
        }
        (StoreMode::Full, SpectrumDetail::Lite) => {
            return Err(StoreError::MissingDetail(spectrum.obj_id()));
        }
    }
    Ok(())
}

/// Deserialize a record payload (without its length prefix)
pub(crate) fn decode_payload(bytes: &[u8], mode: StoreMode) -> Result<Spectrum, StoreError> {
    let mut cur = Cursor::new(bytes);
    let obj_id = cur.read_i64::<BigEndian>()?;

    let observation = match mode {
        StoreMode::Lite => None,
        StoreMode::Full => Some(Observation::new(
            cur.read_i32::<BigEndian>()?,
            cur.read_i32::<BigEndian>()?,
            cur.read_i32::<BigEndian>()?,
        )),
    };

    let n = cur.read_i32::<BigEndian>()?;
    if n < 0 {
        return Err(StoreError::InvalidFormat(format!(
            "object {} has negative pixel count {}",
            obj_id, n
        )));
    }
    let n = n as usize;
    if mode.payload_len(n) != bytes.len() {
        return Err(StoreError::InvalidFormat(format!(
            "object {}: {} {} pixels need {} bytes, record holds {}",
            obj_id,
            n,
            mode,
            mode.payload_len(n),
            bytes.len()
        )));
    }

    match observation {
        None => {
            let mut pixels = Vec::with_capacity(n);
            for _ in 0..n {
                let flux = cur.read_f32::<BigEndian>()?;
                let loglam = cur.read_f32::<BigEndian>()?;
                pixels.push((flux, loglam));
            }
            Ok(Spectrum::lite(obj_id, pixels))
        }
        Some(observation) => {
            let mut pixels = Vec::with_capacity(n);
            for _ in 0..n {
                pixels.push(FullPixel {
                    flux: cur.read_f32::<BigEndian>()?,
                    loglam: cur.read_f32::<BigEndian>()?,
                    ivar: cur.read_f32::<BigEndian>()?,
                    and_mask: cur.read_i32::<BigEndian>()?,
                    or_mask: cur.read_i32::<BigEndian>()?,
                    wdisp: cur.read_f32::<BigEndian>()?,
                    sky: cur.read_f32::<BigEndian>()?,
                    model: cur.read_f32::<BigEndian>()?,
                });
            }
            Ok(Spectrum::full(obj_id, observation, pixels))
        }
    }
}
