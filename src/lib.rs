//! kmerfeat: streaming DNA sequence codec and k-mer feature encoders
//!
//! # Overview
//!
//! kmerfeat turns nucleotide sequences into numeric features for sequence
//! classifiers. Compressed FASTA files stream in one contig at a time, and
//! every sequence can be encoded two ways:
//!
//! - **Dense**: a fixed-length bin vector of (optionally weighted) k-mer
//!   counts, exact when the bins cover every k-mer and hashed otherwise
//! - **Sparse**: labeled `index:count` records over several k-mer lengths that
//!   share one vocabulary, written as Vowpal-Wabbit style dataset lines
//!
//! ## Quick Start
//!
//! ```no_run
//! use kmerfeat::{ContigStream, HashEncoder};
//!
//! # fn main() -> kmerfeat::Result<()> {
//! let encoder = HashEncoder::new(4, 256)?;
//!
//! for contig in ContigStream::from_path("genome.fna.gz")? {
//!     let contig = contig?;
//!     let features = encoder.encode(&contig.sequence, None);
//!     # let _ = features;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`io`]: streaming FASTA and metadata-table readers, gzip in and out
//! - [`operations`]: sequence codec, k-mer iteration, hashing and vocabulary encoders
//! - [`dataset`]: sparse dataset writer over metadata tables
//! - [`types`]: contigs and encoded feature records
//!
//! ## Logging
//!
//! Diagnostics go through [`tracing`]. The library never installs a
//! subscriber.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod dataset;
pub mod error;
pub mod io;
pub mod operations;
pub mod types;

// Re-export commonly used types
pub use dataset::{DatasetConfig, DatasetSummary, DatasetWriter};
pub use error::{FeatureError, Result};
pub use io::{read_contigs, read_contigs_with_headers, ContigStream};
pub use operations::{HashEncoder, KmerLengths, Vocabulary, VocabularyEncoder};
pub use types::{Contig, HashedFeatures, SparseRecord};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
