//! Sparse dataset writer
//!
//! Streams labeled sequences from tab-separated metadata tables through one
//! [`VocabularyEncoder`] and writes one sparse line per row:
//!
//! ```text
//! <label+1> | <prefix><index>:<count> <prefix><index>:<count> ...
//! ```
//!
//! Splits written by the same [`DatasetWriter`] share one vocabulary, so a
//! training split and its test split agree on every feature index. Any failing
//! row aborts the split with [`FeatureError::Record`] naming the table line.
//!
//! # Example
//!
//! ```no_run
//! use kmerfeat::dataset::{DatasetConfig, DatasetWriter};
//! use kmerfeat::io::{DataSink, DataSource};
//!
//! # fn main() -> kmerfeat::Result<()> {
//! let config = DatasetConfig::new("3r5r1".parse()?).with_feature_prefix("k");
//! let mut writer = DatasetWriter::new(config);
//!
//! writer.write_split(
//!     DataSource::from_path("train.tsv.gz"),
//!     DataSink::from_path("train.3r5r1.vw.gz"),
//! )?;
//! writer.write_split(
//!     DataSource::from_path("test.tsv.gz"),
//!     DataSink::from_path("test.3r5r1.vw.gz"),
//! )?;
//! # Ok(())
//! # }
//! ```

use crate::error::{FeatureError, Result};
use crate::io::table::{DEFAULT_LABEL_COLUMN, DEFAULT_SEQUENCE_COLUMN};
use crate::io::{CompressedWriter, DataSink, DataSource, MetadataTable};
use crate::operations::{KmerLengths, Vocabulary, VocabularyEncoder};
use std::io::{BufRead, Write};
use tracing::{error, info};

/// Characters of a failing sequence shown in error logs
const PREVIEW_LEN: usize = 40;

/// Dataset job configuration
#[derive(Debug, Clone)]
pub struct DatasetConfig {
    /// K-mer lengths shared by every split
    pub kmer_lengths: KmerLengths,
    /// Name of the metadata column holding sequences
    pub sequence_column: String,
    /// Name of the metadata column holding integer labels
    pub label_column: String,
    /// Text written before each feature index (`"k"` gives `k12:3`)
    pub feature_prefix: String,
}

impl DatasetConfig {
    /// Configuration with default column names and no feature prefix
    pub fn new(kmer_lengths: KmerLengths) -> Self {
        Self {
            kmer_lengths,
            sequence_column: DEFAULT_SEQUENCE_COLUMN.to_string(),
            label_column: DEFAULT_LABEL_COLUMN.to_string(),
            feature_prefix: String::new(),
        }
    }

    /// Set the sequence column name
    pub fn with_sequence_column(mut self, column: impl Into<String>) -> Self {
        self.sequence_column = column.into();
        self
    }

    /// Set the label column name
    pub fn with_label_column(mut self, column: impl Into<String>) -> Self {
        self.label_column = column.into();
        self
    }

    /// Set the feature-name prefix
    pub fn with_feature_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.feature_prefix = prefix.into();
        self
    }
}

/// Outcome of one written split
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetSummary {
    /// Lines written for this split
    pub records: usize,
    /// Vocabulary size after the split
    pub vocabulary_size: usize,
}

/// Writer owning the run-scoped vocabulary
pub struct DatasetWriter {
    config: DatasetConfig,
    encoder: VocabularyEncoder,
}

impl DatasetWriter {
    /// Create a writer with an empty vocabulary
    pub fn new(config: DatasetConfig) -> Self {
        let encoder = VocabularyEncoder::new(config.kmer_lengths.clone());
        Self { config, encoder }
    }

    /// Job configuration
    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// Vocabulary built by the splits written so far
    pub fn vocabulary(&self) -> &Vocabulary {
        self.encoder.vocabulary()
    }

    /// Encode a metadata table file into a dataset file
    ///
    /// The output is gzip compressed when the sink path ends in `.gz`.
    pub fn write_split(&mut self, source: DataSource, sink: DataSink) -> Result<DatasetSummary> {
        info!(
            source = %source.path().display(),
            kmer_lengths = %self.config.kmer_lengths,
            "writing dataset split"
        );

        let table = MetadataTable::new(
            source,
            &self.config.sequence_column,
            &self.config.label_column,
        )?;
        let mut writer = CompressedWriter::new(sink)?;
        let summary = self.write_table(table, &mut writer)?;
        writer.finish()?;
        Ok(summary)
    }

    /// Encode a metadata table from `reader` into `writer`
    pub fn write_records<R: BufRead, W: Write>(
        &mut self,
        reader: R,
        writer: &mut W,
    ) -> Result<DatasetSummary> {
        let table = MetadataTable::from_reader(
            reader,
            &self.config.sequence_column,
            &self.config.label_column,
        )?;
        let summary = self.write_table(table, writer)?;
        writer.flush()?;
        Ok(summary)
    }

    fn write_table<R: BufRead, W: Write>(
        &mut self,
        mut table: MetadataTable<R>,
        writer: &mut W,
    ) -> Result<DatasetSummary> {
        let mut records = 0;

        while let Some(row) = table.next() {
            let row = row.map_err(|e| record_failure(table.line_number(), &[], e))?;
            let record = self
                .encoder
                .encode(&row.sequence, row.label)
                .map_err(|e| record_failure(row.line, &row.sequence, e))?;

            writeln!(writer, "{}", record.to_line(&self.config.feature_prefix))?;
            records += 1;
        }

        let summary = DatasetSummary {
            records,
            vocabulary_size: self.encoder.vocabulary().len(),
        };
        info!(
            records = summary.records,
            vocabulary_size = summary.vocabulary_size,
            "dataset split complete"
        );
        Ok(summary)
    }
}

fn record_failure(line: usize, sequence: &[u8], source: FeatureError) -> FeatureError {
    let preview = String::from_utf8_lossy(&sequence[..sequence.len().min(PREVIEW_LEN)]);
    error!(line, sequence = %preview, error = %source, "failed to encode record");
    FeatureError::Record {
        line,
        source: Box::new(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn writer(spec: &str) -> DatasetWriter {
        DatasetWriter::new(DatasetConfig::new(spec.parse().unwrap()))
    }

    fn write(writer: &mut DatasetWriter, table: &str) -> Result<(DatasetSummary, String)> {
        let mut out = Vec::new();
        let summary = writer.write_records(Cursor::new(table.as_bytes()), &mut out)?;
        Ok((summary, String::from_utf8(out).unwrap()))
    }

    #[test]
    fn test_write_records() {
        let mut writer = writer("2");
        let (summary, out) = write(&mut writer, "sequence\tlabel\nACAC\t0\nCACG\t2\n").unwrap();

        // ac=0 ca=1 cg=2
        assert_eq!(out, "1 | 0:2 1:1\n3 | 0:1 1:1 2:1\n");
        assert_eq!(summary, DatasetSummary { records: 2, vocabulary_size: 3 });
    }

    #[test]
    fn test_feature_prefix_and_custom_columns() {
        let config = DatasetConfig::new("2".parse().unwrap())
            .with_sequence_column("seq")
            .with_label_column("class")
            .with_feature_prefix("k");
        let mut writer = DatasetWriter::new(config);

        let (_, out) = write(&mut writer, "class\tseq\n4\tAAA\n").unwrap();
        assert_eq!(out, "5 | k0:2\n");
    }

    #[test]
    fn test_splits_share_vocabulary() {
        let mut writer = writer("2");
        write(&mut writer, "sequence\tlabel\nACGT\t0\n").unwrap();

        let (summary, out) = write(&mut writer, "sequence\tlabel\nGTAC\t1\n").unwrap();
        // gt=2 ta=3 ac=0
        assert_eq!(out, "2 | 0:1 2:1 3:1\n");
        assert_eq!(summary.vocabulary_size, 4);
        assert_eq!(writer.vocabulary().get(b"ta"), Some(3));
    }

    #[test]
    fn test_empty_feature_set_names_line() {
        let mut writer = writer("3");
        let result = write(&mut writer, "sequence\tlabel\nACGT\t0\nNNNN\t1\n");

        match result {
            Err(FeatureError::Record { line, source }) => {
                assert_eq!(line, 3);
                assert!(matches!(*source, FeatureError::EmptyFeatureSet { sequence_len: 4 }));
            }
            other => panic!("expected record error, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_label_names_line() {
        let mut writer = writer("2");
        let result = write(&mut writer, "sequence\tlabel\nACGT\tone\n");
        assert!(matches!(result, Err(FeatureError::Record { line: 2, .. })));
    }

    #[test]
    fn test_largest_label_is_written() {
        let mut writer = writer("2");
        let (summary, out) =
            write(&mut writer, "sequence\tlabel\nACGT\t9223372036854775807\n").unwrap();

        assert_eq!(summary.records, 1);
        assert_eq!(out, "9223372036854775808 | 0:1 1:1 2:1\n");
    }

    #[test]
    fn test_missing_column_is_table_error() {
        let mut writer = writer("2");
        let result = write(&mut writer, "sequence\tclass\nACGT\t0\n");
        assert!(matches!(result, Err(FeatureError::Table { line: 1, .. })));
    }
}
