//! Error types for kmerfeat

use thiserror::Error;

/// Result type alias for kmerfeat operations
pub type Result<T> = std::result::Result<T, FeatureError>;

/// Error types that can occur while decoding or encoding sequences
#[derive(Debug, Error)]
pub enum FeatureError {
    /// I/O error (including truncated or corrupt gzip streams)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Character outside the nucleotide alphabet where validation is required
    #[error("Invalid sequence at position {position}: {msg}")]
    Validation {
        /// Zero-based offset of the offending symbol
        position: usize,
        /// Error message
        msg: String,
    },

    /// Ambiguity code where only standard bases are accepted
    #[error("Non-standard nucleotide '{symbol}' at position {position}")]
    NonStandardSequence {
        /// Zero-based offset of the offending symbol
        position: usize,
        /// The ambiguity or gap symbol found
        symbol: char,
    },

    /// Malformed or empty contig in a FASTA stream
    #[error("Invalid FASTA format at line {line}: {msg}")]
    Parse {
        /// Line number where error occurred
        line: usize,
        /// Error message
        msg: String,
    },

    /// Malformed configuration (k-length specification, bins, columns)
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A record produced no valid k-mer for any configured length
    #[error("No valid k-mers in sequence of length {sequence_len}")]
    EmptyFeatureSet {
        /// Length of the sequence that yielded nothing
        sequence_len: usize,
    },

    /// Malformed metadata table row
    #[error("Invalid metadata table at line {line}: {msg}")]
    Table {
        /// Line number where error occurred
        line: usize,
        /// Error message
        msg: String,
    },

    /// Failure while encoding one record of a dataset
    #[error("Record at line {line} failed: {source}")]
    Record {
        /// Table line of the failing record
        line: usize,
        /// Underlying failure
        #[source]
        source: Box<FeatureError>,
    },

    /// Failure of one item of a batch encoding call
    #[error("Batch item {index} failed: {source}")]
    BatchItem {
        /// Zero-based position of the failing item in the batch
        index: usize,
        /// Underlying failure
        #[source]
        source: Box<FeatureError>,
    },
}

impl FeatureError {
    /// Attach the batch position of the failing item, logging the failure
    pub(crate) fn in_batch(self, index: usize) -> Self {
        tracing::error!(index, error = %self, "batch item failed");
        FeatureError::BatchItem {
            index,
            source: Box::new(self),
        }
    }
}
