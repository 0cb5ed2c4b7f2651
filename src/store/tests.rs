use super::*;
use crate::spectrum::{FullPixel, Observation, Spectrum};
use byteorder::{BigEndian, ByteOrder};
use std::io::Cursor;

fn lite_spectrum(obj_id: i64, n: usize) -> Spectrum {
    Spectrum::lite(
        obj_id,
        (0..n).map(|i| (obj_id as f32 + i as f32 * 0.25, 3.5800 + i as f32 * 1e-4)),
    )
}

fn full_spectrum(obj_id: i64, n: usize) -> Spectrum {
    let pixels = (0..n).map(|i| FullPixel {
        flux: i as f32 * 1.5,
        loglam: 3.5800 + i as f32 * 1e-4,
        ivar: 0.1 * i as f32,
        and_mask: i as i32,
        or_mask: (i * 2) as i32,
        wdisp: 1.0,
        sky: -0.5 * i as f32,
        model: 2.0 + i as f32,
    });
    Spectrum::full(obj_id, Observation::new(3586, 55181, obj_id as i32 % 1000), pixels)
}

fn write_store(mode: StoreMode, spectra: &[Spectrum]) -> Vec<u8> {
    let mut writer = SpectrumStoreWriter::new(Cursor::new(Vec::new()), mode).unwrap();
    writer.add_all(spectra).unwrap();
    let (cursor, stats) = writer.finish_into_inner().unwrap();
    assert_eq!(stats.spectra_written, spectra.len());
    cursor.into_inner()
}

fn open(bytes: Vec<u8>, config: ReaderConfig) -> SpectrumStoreReader<Cursor<Vec<u8>>> {
    SpectrumStoreReader::new(Cursor::new(bytes), config).unwrap()
}

#[test]
fn test_lite_roundtrip_and_missing_id() {
    let spectra: Vec<_> = [30, 10, 20].iter().map(|&id| lite_spectrum(id, 50)).collect();
    let bytes = write_store(StoreMode::Lite, &spectra);

    let mut reader = open(bytes, ReaderConfig::default());
    assert_eq!(reader.mode(), StoreMode::Lite);
    assert_eq!(reader.len(), 3);
    assert_eq!(reader.ids().collect::<Vec<_>>(), vec![10, 20, 30]);

    for s in &spectra {
        let read = reader.get(s.obj_id()).unwrap().unwrap();
        assert_eq!(&read, s);
    }

    assert!(reader.get(99).unwrap().is_none());
    assert!(!reader.contains(99));
}

#[test]
fn test_full_roundtrip_keeps_ancillary_fields() {
    let spectra: Vec<_> = (1..=4).map(|id| full_spectrum(id, 20)).collect();
    let bytes = write_store(StoreMode::Full, &spectra);

    let mut reader = open(bytes, ReaderConfig::default());
    assert_eq!(reader.mode(), StoreMode::Full);

    let read = reader.get(3).unwrap().unwrap();
    assert_eq!(read, spectra[2]);
    let detail = read.full_detail().unwrap();
    assert_eq!(detail.observation(), Observation::new(3586, 55181, 3));
    assert_eq!(detail.and_mask()[7], 7);
    assert_eq!(detail.sky()[2], -1.0);
}

#[test]
fn test_lite_store_drops_ancillary_fields() {
    let full = full_spectrum(5, 10);
    let bytes = write_store(StoreMode::Lite, std::slice::from_ref(&full));

    let mut reader = open(bytes, ReaderConfig::default());
    let read = reader.get(5).unwrap().unwrap();
    assert!(read.is_lite());
    assert_eq!(read, full.to_lite());
}

#[test]
fn test_full_store_rejects_lite_spectrum() {
    let mut writer = SpectrumStoreWriter::new(Cursor::new(Vec::new()), StoreMode::Full).unwrap();
    let err = writer.add(&lite_spectrum(1, 3)).unwrap_err();
    assert!(matches!(err, StoreError::MissingDetail(1)));
}

#[test]
fn test_duplicate_id_rejected() {
    let mut writer = SpectrumStoreWriter::new(Cursor::new(Vec::new()), StoreMode::Lite).unwrap();
    writer.add(&lite_spectrum(1, 3)).unwrap();
    let err = writer.add(&lite_spectrum(1, 4)).unwrap_err();
    assert!(matches!(err, StoreError::DuplicateObjectId(1)));
    assert_eq!(writer.len(), 1);
}

#[test]
fn test_on_disk_layout() {
    let bytes = write_store(StoreMode::Lite, &[lite_spectrum(7, 2)]);

    // header: index offset then lite flag
    let index_offset = BigEndian::read_i64(&bytes[0..8]) as usize;
    assert_eq!(BigEndian::read_i64(&bytes[8..16]), -1);

    // record: length, obj id, pixel count, 2 x (flux, loglam)
    assert_eq!(BigEndian::read_i64(&bytes[16..24]), 8 + 4 + 2 * 8);
    assert_eq!(BigEndian::read_i64(&bytes[24..32]), 7);
    assert_eq!(BigEndian::read_i32(&bytes[32..36]), 2);
    assert_eq!(BigEndian::read_f32(&bytes[36..40]), 7.0);
    assert_eq!(index_offset, 16 + 8 + 28);

    // index: length, count, (id, offset)
    assert_eq!(BigEndian::read_i64(&bytes[index_offset..index_offset + 8]), 4 + 16);
    assert_eq!(BigEndian::read_i32(&bytes[index_offset + 8..index_offset + 12]), 1);
    assert_eq!(BigEndian::read_i64(&bytes[index_offset + 12..index_offset + 20]), 7);
    assert_eq!(BigEndian::read_i64(&bytes[index_offset + 20..index_offset + 28]), 16);
    assert_eq!(bytes.len(), index_offset + 28);
}

#[test]
fn test_empty_store() {
    let bytes = write_store(StoreMode::Full, &[]);
    let mut reader = open(bytes, ReaderConfig::default());
    assert!(reader.is_empty());
    assert!(reader.get(1).unwrap().is_none());
    assert_eq!(reader.spectra().count(), 0);
}

#[test]
fn test_unfinished_store_is_unreadable() {
    // Header as written before finish(): placeholder index offset
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&0i64.to_be_bytes());
    bytes.extend_from_slice(&(-1i64).to_be_bytes());

    let err = SpectrumStoreReader::new(Cursor::new(bytes), ReaderConfig::default())
        .err()
        .unwrap();
    assert!(matches!(err, StoreError::InvalidFormat(_)));
}

#[test]
fn test_index_length_mismatch_is_fatal() {
    let mut bytes = write_store(StoreMode::Lite, &[lite_spectrum(1, 3), lite_spectrum(2, 3)]);
    let index_offset = BigEndian::read_i64(&bytes[0..8]) as usize;

    // Claim three entries while only two are present
    BigEndian::write_i32(&mut bytes[index_offset + 8..index_offset + 12], 3);

    let err = SpectrumStoreReader::new(Cursor::new(bytes), ReaderConfig::default())
        .err()
        .unwrap();
    assert!(matches!(err, StoreError::InvalidFormat(_)));
}

#[test]
fn test_unknown_mode_flag_is_fatal() {
    let mut bytes = write_store(StoreMode::Lite, &[lite_spectrum(1, 3)]);
    BigEndian::write_i64(&mut bytes[8..16], 7);

    let err = SpectrumStoreReader::new(Cursor::new(bytes), ReaderConfig::default())
        .err()
        .unwrap();
    assert!(matches!(err, StoreError::InvalidFormat(_)));
}

#[test]
fn test_truncated_file_is_fatal() {
    let bytes = write_store(StoreMode::Lite, &[lite_spectrum(1, 3)]);
    let truncated = bytes[..bytes.len() - 5].to_vec();
    assert!(SpectrumStoreReader::new(Cursor::new(truncated), ReaderConfig::default()).is_err());
}

#[test]
fn test_access_order_and_buffering_do_not_change_results() {
    let spectra: Vec<_> = (0..40).map(|id| lite_spectrum(id * 3, 30 + id as usize)).collect();
    let bytes = write_store(StoreMode::Lite, &spectra);

    let configs = [
        ReaderConfig::default(),
        ReaderConfig::unbuffered(),
        // Smaller than most records: exercises the direct-read fallback
        ReaderConfig::with_buffer_size(200),
        ReaderConfig::with_buffer_size(1024),
    ];

    // A fixed shuffle of the ids
    let mut shuffled: Vec<i64> = spectra.iter().map(|s| s.obj_id()).collect();
    for i in 0..shuffled.len() {
        let j = (i * 17 + 5) % shuffled.len();
        shuffled.swap(i, j);
    }

    for config in configs {
        let mut reader = open(bytes.clone(), config);

        let in_order: Vec<Spectrum> = reader.spectra().collect::<Result<_, _>>().unwrap();
        assert_eq!(in_order.len(), spectra.len());
        for s in &in_order {
            assert_eq!(s, &spectra[(s.obj_id() / 3) as usize]);
        }

        for &id in &shuffled {
            let s = reader.get(id).unwrap().unwrap();
            assert_eq!(s, spectra[(id / 3) as usize]);
        }
    }
}

#[test]
fn test_sequential_reads_hit_the_buffer() {
    let spectra: Vec<_> = (0..100).map(|id| lite_spectrum(id, 20)).collect();
    let bytes = write_store(StoreMode::Lite, &spectra);

    let mut reader = open(bytes.clone(), ReaderConfig::default());
    assert_eq!(reader.spectra().count(), 100);
    let stats = reader.stats();
    assert_eq!(stats.buffer_refills, 1);
    assert_eq!(stats.buffer_hits, 99);
    assert_eq!(stats.direct_reads, 0);

    let mut reader = open(bytes, ReaderConfig::unbuffered());
    assert_eq!(reader.spectra().count(), 100);
    let stats = reader.stats();
    assert_eq!(stats.direct_reads, 100);
    assert_eq!(stats.buffer_refills, 0);
}

#[test]
fn test_file_backed_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quasars.spdb");

    let mut writer = SpectrumStoreWriter::create(&path, StoreMode::Full).unwrap();
    writer.add(&full_spectrum(11, 5)).unwrap();
    let stats = writer.finish().unwrap();
    assert_eq!(stats.file_size_bytes, std::fs::metadata(&path).unwrap().len());

    // create() refuses to overwrite an existing store
    assert!(SpectrumStoreWriter::create(&path, StoreMode::Full).is_err());

    let mut reader = SpectrumStoreReader::open(&path).unwrap();
    assert_eq!(reader.get(11).unwrap().unwrap(), full_spectrum(11, 5));
}
