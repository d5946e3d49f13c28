//! I/O module: streaming parsers and compression
//!
//! Every reader streams with memory bounded by one record (one contig for
//! FASTA, one row for metadata tables), regardless of file size.

pub mod compression;
pub mod fasta;
pub mod output;
pub mod table;

pub use compression::{CompressedReader, DataSource, MMAP_THRESHOLD};
pub use fasta::{
    find_genome_files, read_contigs, read_contigs_with_headers, ContigStream,
    DEFAULT_GENOME_EXTENSION,
};
pub use output::{CompressedWriter, DataSink};
pub use table::{LabeledSequence, MetadataTable, DEFAULT_LABEL_COLUMN, DEFAULT_SEQUENCE_COLUMN};
