use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use specstack::spectrum::Spectrum;
use specstack::store::{ReaderConfig, SpectrumStoreReader, SpectrumStoreWriter, StoreMode};
use tempfile::TempDir;

const NUM_SPECTRA: usize = 2000;
const NUM_PIXELS: usize = 3800;

/// Create a lite store with ids written in a scrambled order
fn create_test_store(path: &std::path::Path) -> Vec<i64> {
    let mut writer = SpectrumStoreWriter::create(path, StoreMode::Lite).unwrap();
    let mut ids = Vec::with_capacity(NUM_SPECTRA);
    for i in 0..NUM_SPECTRA {
        let id = ((i * 7919) % NUM_SPECTRA) as i64;
        let spectrum = Spectrum::lite(
            id,
            (0..NUM_PIXELS).map(|p| (id as f32 + p as f32 * 0.01, 3.58 + p as f32 * 1e-4)),
        );
        writer.add(&spectrum).unwrap();
        ids.push(id);
    }
    writer.finish().unwrap();
    ids.sort_unstable();
    ids
}

/// Fixed permutation of `ids`
fn shuffled(ids: &[i64]) -> Vec<i64> {
    let mut out = ids.to_vec();
    for i in 0..out.len() {
        let j = (i * 104_729 + 13) % out.len();
        out.swap(i, j);
    }
    out
}

/// Benchmark reading every spectrum in ascending and shuffled id order,
/// with and without the page buffer
fn bench_read_order(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bench.spdb");
    let ascending = create_test_store(&path);
    let random = shuffled(&ascending);

    let mut group = c.benchmark_group("read_all");
    group.throughput(Throughput::Elements(NUM_SPECTRA as u64));
    group.sample_size(20);

    let configs = [
        ("buffered", ReaderConfig::default()),
        ("unbuffered", ReaderConfig::unbuffered()),
    ];
    let orders = [("ascending", &ascending), ("shuffled", &random)];

    for (config_name, config) in &configs {
        for (order_name, order) in &orders {
            group.bench_with_input(
                BenchmarkId::new(*config_name, *order_name),
                order,
                |b, order| {
                    b.iter(|| {
                        let mut reader =
                            SpectrumStoreReader::open_with_config(&path, config.clone()).unwrap();
                        for &id in order.iter() {
                            black_box(reader.get(id).unwrap());
                        }
                    });
                },
            );
        }
    }

    group.finish();
}

/// Benchmark the buffer size for an ascending scan
fn bench_buffer_size(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bench.spdb");
    create_test_store(&path);

    let mut group = c.benchmark_group("buffer_size");
    group.sample_size(20);

    for size in [1 << 16, 1 << 20, 1 << 23] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let mut reader =
                    SpectrumStoreReader::open_with_config(&path, ReaderConfig::with_buffer_size(size))
                        .unwrap();
                for s in reader.spectra() {
                    black_box(s.unwrap());
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_read_order, bench_buffer_size);
criterion_main!(benches);
