//! End to end tests: catalog and store on disk through to composite CSV files.

use specstack::average_flux::window_averages;
use specstack::binning::{Binning, CompositeRun};
use specstack::catalog::{Catalog, Quasar};
use specstack::output::{write_binned_composites, write_window_averages};
use specstack::spectrum::Spectrum;
use specstack::store::{ReaderConfig, SpectrumStoreReader, SpectrumStoreWriter, StoreMode};
use specstack::validator::validate_store;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

/// Flat spectrum on the SDSS log grid, 3715 to about 9330 Å
fn flat_spectrum(obj_id: i64, level: f32) -> Spectrum {
    Spectrum::lite(obj_id, (0..4000).map(|i| (level, 3.5700 + i as f32 * 1e-4)))
}

fn quasar(obj_id: i64, redshift: f64, abs_magnitude: f64, bal: bool) -> Quasar {
    Quasar {
        obj_id,
        ra: 150.0,
        dec: 2.0,
        redshift,
        abs_magnitude,
        bal,
    }
}

fn catalog() -> Catalog {
    Catalog::from(vec![
        quasar(1, 1.05, -25.2, false),
        quasar(2, 1.05, -25.2, false),
        quasar(3, 1.05, -26.2, false),
        quasar(4, 1.05, -26.2, false),
        quasar(5, 1.50, -25.3, false),
        quasar(6, 1.50, -25.3, false),
        quasar(7, 1.05, -25.2, true),
        quasar(8, 1.05, -25.2, false), // no spectrum
    ])
}

/// Writes catalog.csv and a lite store holding objects 1 to 7
fn write_inputs(dir: &Path) {
    let file = fs::File::create(dir.join("catalog.csv")).unwrap();
    catalog().write_csv(file).unwrap();

    let mut writer =
        SpectrumStoreWriter::create(dir.join("quasars.spdb"), StoreMode::Lite).unwrap();
    // Out of id order, with different flux levels
    for id in [7, 3, 1, 5, 2, 6, 4] {
        writer.add(&flat_spectrum(id, id as f32)).unwrap();
    }
    writer.finish().unwrap();
}

fn read_rows(path: &Path) -> Vec<csv::StringRecord> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    assert_eq!(
        reader.headers().unwrap(),
        vec!["WL", "count", "mean", "gmean", "median", "umean", "umedian"]
    );
    reader.records().collect::<Result<_, _>>().unwrap()
}

fn row_at(rows: &[csv::StringRecord], wavelength: usize) -> &csv::StringRecord {
    rows.iter()
        .find(|r| r[0].parse::<usize>().unwrap() == wavelength)
        .unwrap()
}

#[test]
fn test_composites_from_disk() {
    let dir = tempdir().unwrap();
    write_inputs(dir.path());
    let out = dir.path().join("composites");

    let catalog = Catalog::from_csv_path(dir.path().join("catalog.csv")).unwrap();
    assert_eq!(catalog.len(), 8);
    let quasars = catalog.select(false);
    assert_eq!(quasars.len(), 7);

    let reader = SpectrumStoreReader::open(dir.path().join("quasars.spdb")).unwrap();
    let mut run = CompositeRun::new(reader, Binning::redshift());
    let by_redshift = run.run(&quasars).unwrap();

    let stems: Vec<_> = by_redshift.iter().map(|c| c.file_stem()).collect();
    assert_eq!(stems, vec!["z1.0", "z1.4"]);
    assert_eq!(by_redshift[0].members, 5);
    assert_eq!(by_redshift[0].contributors, 4);
    assert_eq!(by_redshift[0].missing, 1);
    assert_eq!(by_redshift[1].contributors, 2);

    let mut run = CompositeRun::new(run.into_source(), Binning::luminosity());
    let by_luminosity = run.run(&quasars).unwrap();
    let stems: Vec<_> = by_luminosity.iter().map(|c| c.file_stem()).collect();
    assert_eq!(stems, vec!["M-26.5", "M-25.5"]);

    let mut paths = write_binned_composites(&out, &by_redshift).unwrap();
    paths.extend(write_binned_composites(&out, &by_luminosity).unwrap());
    assert_eq!(paths.len(), 4);
    for name in ["z1.0.csv", "z1.4.csv", "M-26.5.csv", "M-25.5.csv"] {
        assert!(out.join(name).is_file(), "{} missing", name);
    }

    // Same redshift and shape: normalisation makes every member identical
    let rows = read_rows(&out.join("z1.0.csv"));
    assert!(!rows.is_empty());
    let row = row_at(&rows, 3000);
    assert_eq!(&row[1], "4");
    let mean: f64 = row[2].parse().unwrap();
    let median: f64 = row[4].parse().unwrap();
    let umean: f64 = row[5].parse().unwrap();
    // Fluxes are accumulated as f32
    assert!((mean - median).abs() < 1e-4 * mean.abs());
    assert!(umean < 1e-4 * mean.abs());

    // Wavelengths are consecutive and ascending
    let wls: Vec<usize> = rows.iter().map(|r| r[0].parse().unwrap()).collect();
    assert!(wls.windows(2).all(|w| w[1] == w[0] + 1));
}

#[test]
fn test_store_passes_validation() {
    let dir = tempdir().unwrap();
    write_inputs(dir.path());

    let report = validate_store(&dir.path().join("quasars.spdb")).unwrap();
    assert!(!report.has_failures(), "{}", report);
    assert_eq!(report.spectra, 7);
    assert_eq!(report.pixels, 7 * 4000);
}

#[test]
fn test_window_averages_csv_from_disk() {
    let dir = tempdir().unwrap();
    write_inputs(dir.path());

    let catalog = Catalog::from_csv_path(dir.path().join("catalog.csv")).unwrap();
    let mut reader = SpectrumStoreReader::open_with_config(
        dir.path().join("quasars.spdb"),
        ReaderConfig::with_buffer_size(4096),
    )
    .unwrap();
    let averages = window_averages(&mut reader, catalog.quasars()).unwrap();
    assert_eq!(averages.len(), 7);

    let path = dir.path().join("averages.csv");
    write_window_averages(fs::File::create(&path).unwrap(), &averages).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 8);
    assert!(lines[1].starts_with("1,1.05,"));

    // At z = 1.05 the 3500-3650 window is covered, 5400-5500 is not
    let cells: Vec<_> = lines[1].split(',').collect();
    assert_eq!(cells[2], "");
    assert!(!cells[3].is_empty());
}
