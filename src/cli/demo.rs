use anyhow::{Context, Result};
use log::info;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use specstack::catalog::{Catalog, Quasar, BAD_OBJ_ID};
use specstack::spectrum::{FullPixel, Observation, Spectrum};
use specstack::store::{SpectrumStoreWriter, StoreMode};

/// First log wavelength of the synthetic grid
const LOGLAM_START: f64 = 3.5523;
/// Log wavelength step, the SDSS coadd sampling
const LOGLAM_STEP: f64 = 1e-4;
/// Pixels per synthetic spectrum
const NUM_PIXELS: usize = 4600;

const OBJ_ID_BASE: i64 = 1_237_650_000_000_000_000;

/// Rest wavelength, peak flux and width (Å) of the emission lines
const EMISSION_LINES: [(f64, f64, f64); 5] = [
    (1216.0, 60.0, 12.0), // Lyα
    (1549.0, 25.0, 14.0), // C IV
    (1909.0, 12.0, 15.0), // C III]
    (2798.0, 10.0, 18.0), // Mg II
    (4861.0, 6.0, 20.0),  // Hβ
];

const GOLDEN: f64 = 0.618_033_988_749_895;

/// Low discrepancy sequence in [0, 1)
fn sequence(i: usize, offset: f64) -> f64 {
    (offset + i as f64 * GOLDEN).fract()
}

/// Deterministic noise in [-0.5, 0.5)
fn noise(a: f64, b: f64) -> f64 {
    ((a * 12.9898 + b * 78.233).sin() * 43_758.545_3).fract().abs() - 0.5
}

fn synthetic_quasar(i: usize) -> Quasar {
    let mut obj_id = OBJ_ID_BASE + i as i64 * 7919;
    if obj_id == BAD_OBJ_ID {
        obj_id += 1;
    }
    Quasar {
        obj_id,
        ra: 360.0 * sequence(i, 0.11),
        dec: -10.0 + 70.0 * sequence(i, 0.37),
        redshift: 0.2 + 3.0 * sequence(i, 0.5),
        abs_magnitude: -29.0 + 7.0 * sequence(i, 0.73),
        bal: i % 10 == 9,
    }
}

/// Observed flux of `quasar` at `wavelength`
fn model_flux(quasar: &Quasar, wavelength: f64) -> f64 {
    let rest = wavelength / (1.0 + quasar.redshift);
    let brightness = 10f64.powf(-0.4 * (quasar.abs_magnitude + 26.0));

    let mut flux = 10.0 * (rest / 3000.0).powf(-1.5);
    for (center, peak, width) in EMISSION_LINES {
        let d = (rest - center) / width;
        flux += peak * (-0.5 * d * d).exp();
    }
    if quasar.bal {
        // Broad trough blueward of C IV
        let d = (rest - 1480.0) / 30.0;
        flux *= 1.0 - 0.7 * (-0.5 * d * d).exp();
    }
    flux * brightness
}

fn synthetic_spectrum(index: usize, quasar: &Quasar, mode: StoreMode) -> Spectrum {
    let pixels = (0..NUM_PIXELS).map(|p| {
        let loglam = LOGLAM_START + p as f64 * LOGLAM_STEP;
        let model = model_flux(quasar, 10f64.powf(loglam));
        let flux = model * (1.0 + 0.1 * noise(index as f64, p as f64));
        (flux, loglam, model)
    });

    match mode {
        StoreMode::Lite => Spectrum::lite(
            quasar.obj_id,
            pixels.map(|(flux, loglam, _)| (flux as f32, loglam as f32)),
        ),
        StoreMode::Full => {
            let observation = Observation::new(
                3586 + (index / 640) as i32,
                55181 + (index / 640) as i32,
                1 + (index % 640) as i32,
            );
            let pixels = pixels.map(|(flux, loglam, model)| FullPixel {
                flux: flux as f32,
                loglam: loglam as f32,
                ivar: (100.0 / model.max(1e-3)) as f32,
                wdisp: 1.0,
                sky: 2.0,
                model: model as f32,
                ..Default::default()
            });
            Spectrum::full(quasar.obj_id, observation, pixels)
        }
    }
}

fn write_catalog(path: &Path, quasars: Vec<Quasar>) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    Catalog::from(quasars)
        .write_csv(BufWriter::new(file))
        .with_context(|| format!("Failed to write catalog: {}", path.display()))
}

/// Generate a synthetic quasar catalog and matching spectrum store
pub fn run(output_dir: PathBuf, count: usize, lite: bool) -> Result<()> {
    let mode = if lite { StoreMode::Lite } else { StoreMode::Full };

    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    let catalog_path = output_dir.join("catalog.csv");
    let store_path = output_dir.join("quasars.spdb");

    info!("Generating {} synthetic quasars ({} store)", count, mode);
    let quasars: Vec<Quasar> = (0..count).map(synthetic_quasar).collect();

    let mut writer = SpectrumStoreWriter::create(&store_path, mode)
        .with_context(|| format!("Failed to create store: {}", store_path.display()))?;

    // Written in catalog order; the index sorts them
    for (i, quasar) in quasars.iter().enumerate() {
        writer
            .add(&synthetic_spectrum(i, quasar, mode))
            .with_context(|| format!("Failed to write object {}", quasar.obj_id))?;
        if (i + 1) % 100 == 0 {
            info!("  Written {} spectra...", i + 1);
        }
    }
    let stats = writer.finish().context("Failed to finalize spectrum store")?;

    write_catalog(&catalog_path, quasars)?;

    println!("Catalog: {}", catalog_path.display());
    println!("Store:   {}", store_path.display());
    println!("  {}", stats);
    Ok(())
}
