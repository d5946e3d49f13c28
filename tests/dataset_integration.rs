//! Integration tests for the sparse dataset writer
//!
//! These tests run complete table → encode → dataset file pipelines over
//! gzip-compressed metadata tables.

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use kmerfeat::io::{DataSink, DataSource};
use kmerfeat::{DatasetConfig, DatasetSummary, DatasetWriter, FeatureError};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_table(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    let file = std::fs::File::create(&path).unwrap();
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(content.as_bytes()).unwrap();
    encoder.finish().unwrap();
    path
}

fn read_gzip(path: &Path) -> String {
    let mut out = String::new();
    MultiGzDecoder::new(std::fs::File::open(path).unwrap())
        .read_to_string(&mut out)
        .unwrap();
    out
}

/// Train and test splits written by one writer share feature indices
#[test]
fn test_train_and_test_splits() {
    let temp_dir = TempDir::new().unwrap();
    let train = write_table(
        temp_dir.path(),
        "train.tsv.gz",
        "genome_id\tsequence\tlabel\ng1\tACGTA\t0\ng2\tTTNAC\t1\n",
    );
    let test = write_table(
        temp_dir.path(),
        "test.tsv.gz",
        "genome_id\tsequence\tlabel\ng3\tCGTT\t1\n",
    );
    let train_out = temp_dir.path().join("train.2r3r1.vw.gz");
    let test_out = temp_dir.path().join("test.2r3r1.vw.gz");

    let config = DatasetConfig::new("2r3r1".parse().unwrap()).with_feature_prefix("k");
    let mut writer = DatasetWriter::new(config);

    let summary = writer
        .write_split(DataSource::from_path(&train), DataSink::from_path(&train_out))
        .unwrap();
    // g1: ac=0 cg=1 gt=2 ta=3 acg=4 cgt=5 gta=6
    // g2: tt=7 ac=0 (t*, *a, tt*, t*a, *ac skipped)
    assert_eq!(summary, DatasetSummary { records: 2, vocabulary_size: 8 });
    assert_eq!(
        read_gzip(&train_out),
        "1 | k0:1 k1:1 k2:1 k3:1 k4:1 k5:1 k6:1\n2 | k0:1 k7:1\n"
    );

    let summary = writer
        .write_split(DataSource::from_path(&test), DataSink::from_path(&test_out))
        .unwrap();
    // g3: cg=1 gt=2 tt=7 cgt=5 gtt=8
    assert_eq!(summary.vocabulary_size, 9);
    assert_eq!(read_gzip(&test_out), "2 | k1:1 k2:1 k5:1 k7:1 k8:1\n");
}

#[test]
fn test_plain_output_file() {
    let temp_dir = TempDir::new().unwrap();
    let table = write_table(temp_dir.path(), "train.tsv.gz", "sequence\tlabel\nAAAA\t3\n");
    let out = temp_dir.path().join("train.vw");

    let mut writer = DatasetWriter::new(DatasetConfig::new("3".parse().unwrap()));
    writer
        .write_split(DataSource::from_path(&table), DataSink::from_path(&out))
        .unwrap();

    assert_eq!(std::fs::read_to_string(&out).unwrap(), "4 | 0:2\n");
}

#[test]
fn test_failing_record_aborts_split() {
    let temp_dir = TempDir::new().unwrap();
    let table = write_table(
        temp_dir.path(),
        "train.tsv.gz",
        "sequence\tlabel\nACGT\t0\nACGU\t1\n",
    );
    let out = temp_dir.path().join("train.vw.gz");

    let mut writer = DatasetWriter::new(DatasetConfig::new("2".parse().unwrap()));
    let result = writer.write_split(DataSource::from_path(&table), DataSink::from_path(&out));

    match result {
        Err(FeatureError::Record { line, source }) => {
            assert_eq!(line, 3);
            assert!(matches!(*source, FeatureError::Validation { position: 3, .. }));
        }
        other => panic!("expected record error, got {:?}", other),
    }
}

#[test]
fn test_missing_table() {
    let temp_dir = TempDir::new().unwrap();
    let mut writer = DatasetWriter::new(DatasetConfig::new("2".parse().unwrap()));

    let result = writer.write_split(
        DataSource::from_path(temp_dir.path().join("missing.tsv.gz")),
        DataSink::from_path(temp_dir.path().join("out.vw")),
    );
    assert!(matches!(result, Err(FeatureError::Io(_))));
}
