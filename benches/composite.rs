use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use specstack::composite::{Accumulator, RestFrameSpectrum};
use specstack::spectrum::Spectrum;

const NUM_PIXELS: usize = 4600;

/// Power law with a little structure on the SDSS log grid
fn observed_spectrum(obj_id: i64) -> Spectrum {
    Spectrum::lite(
        obj_id,
        (0..NUM_PIXELS).map(|i| {
            let loglam = 3.5523 + i as f32 * 1e-4;
            let wl = 10f32.powf(loglam);
            let flux = 20.0 * (wl / 4000.0).powf(-1.5) + (i as f32 * 0.37).sin();
            (flux, loglam)
        }),
    )
}

/// Benchmark shifting and rebinning one spectrum at several redshifts
fn bench_shift_and_rebin(c: &mut Criterion) {
    let mut group = c.benchmark_group("shift_and_rebin");
    group.throughput(Throughput::Elements(NUM_PIXELS as u64));
    let spectrum = observed_spectrum(1);

    for z in [0.5, 1.5, 3.0] {
        group.bench_with_input(BenchmarkId::from_parameter(z), &z, |b, &z| {
            b.iter(|| {
                let rest = RestFrameSpectrum::shift_and_rebin(black_box(&spectrum), z).unwrap();
                black_box(rest);
            });
        });
    }

    group.finish();
}

/// Benchmark normalising a rebinned spectrum
fn bench_normalise(c: &mut Criterion) {
    let rest = RestFrameSpectrum::shift_and_rebin(&observed_spectrum(1), 1.5).unwrap();

    c.bench_function("normalise", |b| {
        b.iter(|| {
            let mut s = rest.clone();
            black_box(s.normalise(1.5));
        });
    });
}

/// Benchmark accumulating spectra and computing the composite statistics
fn bench_accumulate(c: &mut Criterion) {
    let mut group = c.benchmark_group("accumulate");

    for count in [10, 100, 500] {
        let spectra: Vec<RestFrameSpectrum> = (0..count)
            .map(|i| {
                let z = 0.8 + (i % 50) as f64 * 0.02;
                let mut rest = RestFrameSpectrum::shift_and_rebin(&observed_spectrum(i as i64), z).unwrap();
                rest.normalise(z);
                rest
            })
            .collect();

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("combine", count), &spectra, |b, spectra| {
            b.iter(|| {
                let mut acc = Accumulator::new();
                for s in spectra {
                    acc.combine(s).unwrap();
                }
                black_box(acc);
            });
        });

        let mut acc = Accumulator::new();
        for s in &spectra {
            acc.combine(s).unwrap();
        }
        group.bench_with_input(BenchmarkId::new("statistics", count), &acc, |b, acc| {
            b.iter(|| black_box(acc.composite()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_shift_and_rebin, bench_normalise, bench_accumulate);
criterion_main!(benches);
