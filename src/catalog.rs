//! Quasar catalog.
//!
//! The catalog supplies the redshift and absolute magnitude of every object
//! whose spectrum is in the store. It is read from a CSV file with the
//! columns `obj_id,ra,dec,z,mi,bal`, where `bal` marks broad absorption line
//! quasars as `1`/`0` or `true`/`false`.

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

/// Object that must never enter a composite because its spectrum is broken
pub const BAD_OBJ_ID: i64 = 1237651801769836969;

/// Errors that can occur while reading or writing a catalog
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// I/O error
    #[error("Failed to read catalog: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV parsing or writing error
    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),
}

/// One catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quasar {
    /// SDSS object id, the key of the spectrum store
    pub obj_id: i64,
    /// Right ascension in degrees
    pub ra: f64,
    /// Declination in degrees
    pub dec: f64,
    /// Redshift
    #[serde(rename = "z")]
    pub redshift: f64,
    /// Absolute i-band magnitude
    #[serde(rename = "mi")]
    pub abs_magnitude: f64,
    /// Broad absorption line quasar
    #[serde(deserialize_with = "flag")]
    pub bal: bool,
}

fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let s = String::deserialize(deserializer)?;
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" => Ok(true),
        "0" | "false" | "f" | "no" | "" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "invalid BAL flag '{}'",
            other
        ))),
    }
}

impl Quasar {
    /// Returns true if the quasar may be used for composites
    pub fn is_good(&self) -> bool {
        !self.bal && self.obj_id != BAD_OBJ_ID
    }
}

/// All quasars of a catalog in file order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    quasars: Vec<Quasar>,
}

impl From<Vec<Quasar>> for Catalog {
    fn from(quasars: Vec<Quasar>) -> Self {
        Self { quasars }
    }
}

impl Catalog {
    /// Read a catalog CSV file
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let file = File::open(path.as_ref())?;
        let catalog = Self::from_reader(BufReader::new(file))?;
        log::info!(
            "Loaded {} quasars from {}",
            catalog.len(),
            path.as_ref().display()
        );
        Ok(catalog)
    }

    /// Read a catalog from CSV text
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let quasars = csv_reader
            .deserialize()
            .collect::<Result<Vec<Quasar>, _>>()?;
        Ok(Self { quasars })
    }

    /// Write the catalog as CSV
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), CatalogError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for q in &self.quasars {
            csv_writer.serialize(q)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Every quasar
    pub fn quasars(&self) -> &[Quasar] {
        &self.quasars
    }

    /// Number of quasars
    pub fn len(&self) -> usize {
        self.quasars.len()
    }

    /// Returns true if the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.quasars.is_empty()
    }

    /// Quasars usable for composites: no BAL quasars, no known-bad objects
    pub fn good(&self) -> Vec<Quasar> {
        self.select(false)
    }

    /// Quasars usable for composites, optionally keeping BAL quasars
    pub fn select(&self, include_bal: bool) -> Vec<Quasar> {
        self.quasars
            .iter()
            .filter(|q| q.obj_id != BAD_OBJ_ID && (include_bal || !q.bal))
            .cloned()
            .collect()
    }

    /// Look up a quasar by object id
    pub fn find(&self, obj_id: i64) -> Option<&Quasar> {
        self.quasars.iter().find(|q| q.obj_id == obj_id)
    }
}
