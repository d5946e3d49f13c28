//! Tab-separated metadata tables of labeled sequences
//!
//! A metadata table starts with a header row naming its columns; every later
//! row holds one sequence and its integer label. Columns are located by name,
//! so tables may carry any number of extra columns in any order.
//!
//! ```text
//! genome_id	sequence	label
//! GCF_0001	ACGTNNACGT	0
//! GCF_0002	TTGACA	3
//! ```
//!
//! Empty lines and lines starting with `#` are skipped. Input may be gzip
//! compressed (see [`CompressedReader`]).

use crate::error::{FeatureError, Result};
use crate::io::compression::{CompressedReader, DataSource};
use std::io::BufRead;

/// Default name of the sequence column
pub const DEFAULT_SEQUENCE_COLUMN: &str = "sequence";

/// Default name of the label column
pub const DEFAULT_LABEL_COLUMN: &str = "label";

/// One data row of a metadata table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledSequence {
    /// 1-based line number in the table
    pub line: usize,
    /// Raw sequence text as stored in the table
    pub sequence: Vec<u8>,
    /// Integer class label
    pub label: i64,
}

/// Streaming reader over the rows of a metadata table
///
/// # Example
///
/// ```
/// use kmerfeat::io::MetadataTable;
///
/// let data = "id\tsequence\tlabel\ng1\tACGT\t0\ng2\tTTGA\t1\n";
/// let table = MetadataTable::from_reader(data.as_bytes(), "sequence", "label")?;
///
/// let rows: Vec<_> = table.collect::<kmerfeat::Result<_>>()?;
/// assert_eq!(rows.len(), 2);
/// assert_eq!(rows[1].label, 1);
/// # Ok::<(), kmerfeat::FeatureError>(())
/// ```
pub struct MetadataTable<R: BufRead> {
    reader: R,
    line_buf: String,
    line_number: usize,
    sequence_index: usize,
    label_index: usize,
    finished: bool,
}

impl MetadataTable<CompressedReader> {
    /// Open a table file, optionally gzip compressed
    pub fn new(source: DataSource, sequence_column: &str, label_column: &str) -> Result<Self> {
        let reader = CompressedReader::new(source)?;
        Self::from_reader(reader, sequence_column, label_column)
    }
}

impl<R: BufRead> MetadataTable<R> {
    /// Read the header row and locate the sequence and label columns
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::Table`] if the table has no header row or the
    /// header lacks one of the named columns.
    pub fn from_reader(reader: R, sequence_column: &str, label_column: &str) -> Result<Self> {
        let mut table = Self {
            reader,
            line_buf: String::with_capacity(1024),
            line_number: 0,
            sequence_index: 0,
            label_index: 0,
            finished: false,
        };

        if !table.next_line()? {
            return Err(FeatureError::Table {
                line: table.line_number,
                msg: "missing header row".to_string(),
            });
        }

        let header: Vec<&str> = table.line_buf.trim_end().split('\t').map(str::trim).collect();
        let locate = |name: &str| {
            header
                .iter()
                .position(|&column| column == name)
                .ok_or_else(|| FeatureError::Table {
                    line: table.line_number,
                    msg: format!("header has no '{}' column", name),
                })
        };
        let sequence_index = locate(sequence_column)?;
        let label_index = locate(label_column)?;

        table.sequence_index = sequence_index;
        table.label_index = label_index;
        Ok(table)
    }

    /// Returns the current line number (1-based)
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Advance to the next non-empty, non-comment line; `false` at EOF
    fn next_line(&mut self) -> Result<bool> {
        loop {
            self.line_buf.clear();
            if self.reader.read_line(&mut self.line_buf)? == 0 {
                return Ok(false);
            }
            self.line_number += 1;

            let line = self.line_buf.trim_end();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            return Ok(true);
        }
    }

    fn parse_row(&self) -> Result<LabeledSequence> {
        let fields: Vec<&str> = self.line_buf.trim_end_matches(['\n', '\r']).split('\t').collect();
        let field = |index: usize, name: &str| {
            fields.get(index).map(|f| f.trim()).ok_or_else(|| FeatureError::Table {
                line: self.line_number,
                msg: format!(
                    "row has {} fields, '{}' column is field {}",
                    fields.len(),
                    name,
                    index + 1
                ),
            })
        };

        let sequence = field(self.sequence_index, "sequence")?;
        let label_text = field(self.label_index, "label")?;
        let label = label_text.parse::<i64>().map_err(|e| FeatureError::Table {
            line: self.line_number,
            msg: format!("invalid label '{}': {}", label_text, e),
        })?;

        Ok(LabeledSequence {
            line: self.line_number,
            sequence: sequence.as_bytes().to_vec(),
            label,
        })
    }
}

impl<R: BufRead> Iterator for MetadataTable<R> {
    type Item = Result<LabeledSequence>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let result = match self.next_line() {
            Ok(true) => self.parse_row(),
            Ok(false) => {
                self.finished = true;
                return None;
            }
            Err(e) => Err(e),
        };

        if result.is_err() {
            self.finished = true;
        }
        Some(result)
    }
}
