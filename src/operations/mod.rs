//! Sequence codec and k-mer feature encoders
//!
//! This module provides:
//! - `sequence`: validation, normalization, one-hot encoding, reverse complement
//! - `kmer`: window iteration, exact ordinals and FNV-1a hashing
//! - `hashing`: dense fixed-length bin vectors
//! - `vocabulary`: sparse multi-k records over a run-scoped vocabulary
//!
//! All operations are synchronous and perform no I/O.

pub mod hashing;
pub mod kmer;
pub mod sequence;
pub mod vocabulary;

pub use hashing::{hash_encode, BinStrategy, HashEncoder, KmerWeights};
pub use sequence::{
    contains_non_standard, filter_by_length, is_valid, normalize, one_hot, reverse_complement,
    validate, NON_STANDARD_MARKER, NON_STANDARD_NUCLEOTIDES, STANDARD_NUCLEOTIDES,
};
pub use vocabulary::{KmerLengths, Vocabulary, VocabularyEncoder};
