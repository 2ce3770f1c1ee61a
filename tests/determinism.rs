//! Whole-file end-to-end scenarios that need a real multi-shard seal pass over an actual
//! filesystem, rather than the single in-memory `Cursor` the lighter unit tests use.

use cdbx::{BuilderConfig, HashFileBuilder, Reader};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::tempdir;

fn random_records(seed: u64, n: usize) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let key_len = rng.random_range(1..32);
            let value_len = rng.random_range(0..64);
            let key: Vec<u8> = (0..key_len).map(|_| rng.random()).collect();
            let value: Vec<u8> = (0..value_len).map(|_| rng.random()).collect();
            (key, value)
        })
        .collect()
}

#[test]
fn ten_thousand_random_records_seal_byte_identically() {
    let dir = tempdir().expect("tempdir");
    let records = random_records(0xC0FFEE, 10_000);

    let mut outputs = Vec::new();
    for name in ["left.cdbx", "right.cdbx"] {
        let path = dir.path().join(name);
        let mut builder =
            HashFileBuilder::new(&path, records.len() as u64).expect("construct builder");
        for (key, value) in &records {
            builder.add(key, value).expect("add record");
        }
        builder.finish().expect("seal file");
        outputs.push(std::fs::read(&path).expect("read sealed file"));
    }
    assert_eq!(outputs[0], outputs[1], "identical input must seal to identical bytes");
}

#[test]
fn every_inserted_record_is_recoverable_through_the_reader() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("db.cdbx");
    let records = random_records(42, 2_000);

    let mut builder = HashFileBuilder::new(&path, records.len() as u64).expect("construct builder");
    for (key, value) in &records {
        builder.add(key, value).expect("add record");
    }
    builder.finish().expect("seal file");

    let reader = Reader::open(&path).expect("open sealed file");
    assert_eq!(reader.count(), records.len() as u64);
    for (key, value) in &records {
        assert_eq!(reader.get(key).as_deref(), Some(value.as_slice()));
    }
}

#[test]
fn bucket_power_28_builds_and_rejects_the_next_step_up() {
    let dir = tempdir().expect("tempdir");
    let threshold_28 = ((1u64 << 27) as f64 * cdbx::calculations::DEFAULT_LOAD_FACTOR) as u64 + 1;
    let mut builder =
        HashFileBuilder::new(dir.path().join("p28.cdbx"), threshold_28).expect("P=28 is in range");
    assert_eq!(builder.bucket_power(), 28);
    builder.abort().expect("abort before any add");

    let threshold_29 = ((1u64 << 28) as f64 * cdbx::calculations::DEFAULT_LOAD_FACTOR) as u64 + 1;
    let config = BuilderConfig::new(dir.path().join("p29.cdbx"), threshold_29);
    assert!(HashFileBuilder::with_config(config).is_err());
}
