//! Hashed k-mer feature extraction into a fixed number of bins
//!
//! Every valid k-mer of a sequence adds its weight (default 1.0) to one bin of
//! a dense vector of length `bins`. Memory is bounded by `bins` regardless of k.
//!
//! # Bin Assignment
//!
//! | Condition    | Strategy                                      | Collisions |
//! |--------------|-----------------------------------------------|------------|
//! | bins ≥ 4^k   | [`BinStrategy::Exact`]: lexicographic ordinal | none       |
//! | bins < 4^k   | [`BinStrategy::Hashed`]: \|FNV-1a\| mod bins   | accepted   |
//!
//! In the hashed regime distinct k-mers that share a bin merge their counts
//! silently; no collision is reported.
//!
//! # Input Contract
//!
//! Hashing does not normalize ambiguity away. The sequence must be valid
//! ([`FeatureError::Validation`] otherwise) and must not contain ambiguity or
//! gap symbols ([`FeatureError::NonStandardSequence`] otherwise). The marker
//! is tolerated and simply excludes the windows it touches.
//!
//! # Examples
//!
//! ```
//! use kmerfeat::operations::hash_encode;
//!
//! let features = hash_encode(b"ACGTACGT", 4, 256, None)?;
//! assert_eq!(features.n_valid_kmers, 5);
//! assert_eq!(features.bins.iter().sum::<f64>(), 5.0);
//! # Ok::<(), kmerfeat::FeatureError>(())
//! ```

use crate::error::{FeatureError, Result};
use crate::operations::kmer::{fnv1a_hash, kmer_iter, kmer_ordinal, kmer_space_size};
use crate::operations::sequence::{first_non_standard, validate};
use crate::types::HashedFeatures;
use std::collections::HashMap;

/// Caller-owned per-k-mer weights (lowercase k-mer bytes → weight)
///
/// K-mers absent from the table weigh 1.0.
pub type KmerWeights = HashMap<Vec<u8>, f64>;

/// How k-mers are mapped to bins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinStrategy {
    /// Bijection over all 4^k k-mers (requires bins ≥ 4^k)
    Exact,
    /// General-purpose string hash reduced modulo bins
    Hashed,
}

impl BinStrategy {
    /// Pick the exact bijection whenever every k-mer can own a bin
    pub fn select(k: usize, bins: usize) -> Self {
        match kmer_space_size(k) {
            Some(space) if (bins as u64) >= space => BinStrategy::Exact,
            _ => BinStrategy::Hashed,
        }
    }

    /// Bin of one window; `None` if an exact ordinal is requested for a
    /// window that is not a lowercase a/c/g/t string
    #[inline]
    fn bin_of(self, kmer: &[u8], bins: usize) -> Option<usize> {
        match self {
            BinStrategy::Exact => kmer_ordinal(kmer).map(|ordinal| ordinal as usize),
            BinStrategy::Hashed => {
                let signed = fnv1a_hash(kmer) as i64;
                Some((signed.unsigned_abs() % bins as u64) as usize)
            }
        }
    }
}

/// Hash the k-mers of one sequence into `bins` bins
///
/// Returns the accumulated bin vector and the number of valid k-mers counted.
/// Input is case-insensitive.
///
/// # Errors
///
/// - [`FeatureError::Config`] if `k == 0` or `bins == 0`
/// - [`FeatureError::Validation`] if the sequence has out-of-alphabet symbols
/// - [`FeatureError::NonStandardSequence`] if it has ambiguity/gap symbols
///
/// # Examples
///
/// ```
/// use kmerfeat::operations::{hash_encode, KmerWeights};
///
/// let mut weights = KmerWeights::new();
/// weights.insert(b"aa".to_vec(), 0.5);
///
/// let features = hash_encode(b"AAA", 2, 16, Some(&weights))?;
/// assert_eq!(features.bins[0], 1.0); // "aa" twice at weight 0.5
/// assert_eq!(features.n_valid_kmers, 2);
///
/// assert!(hash_encode(b"AANA", 2, 16, None).is_err());
/// # Ok::<(), kmerfeat::FeatureError>(())
/// ```
pub fn hash_encode(
    sequence: &[u8],
    k: usize,
    bins: usize,
    weights: Option<&KmerWeights>,
) -> Result<HashedFeatures> {
    HashEncoder::new(k, bins)?.encode(sequence, weights)
}

/// Configurable hashing extractor with optional batch parallelism
///
/// Encoding is stateless, so sequences can be hashed concurrently without
/// coordination. Parallelism is opt-in and only engages for batches of at
/// least [`HashEncoder::PARALLEL_THRESHOLD`] sequences.
///
/// # Examples
///
/// ```
/// use kmerfeat::operations::{BinStrategy, HashEncoder};
///
/// let encoder = HashEncoder::new(3, 64)?;
/// assert_eq!(encoder.strategy(), BinStrategy::Exact);
///
/// let sequences = vec![b"ACGTAC".as_ref(), b"GGGTTT".as_ref()];
/// let features = encoder.encode_batch(&sequences, None)?;
/// assert_eq!(features.len(), 2);
/// assert_eq!(features[0].n_valid_kmers, 4);
/// # Ok::<(), kmerfeat::FeatureError>(())
/// ```
#[derive(Debug, Clone)]
pub struct HashEncoder {
    k: usize,
    bins: usize,
    strategy: BinStrategy,
    parallel: bool,
    threads: usize,
}

impl HashEncoder {
    /// Minimum batch size before parallel encoding is used
    pub const PARALLEL_THRESHOLD: usize = 1000;

    /// Maximum worker threads for batch encoding
    pub const MAX_THREADS: usize = 4;

    /// Create a scalar encoder for k-mers of length `k` over `bins` bins
    pub fn new(k: usize, bins: usize) -> Result<Self> {
        if k == 0 {
            return Err(FeatureError::Config("k-mer length must be at least 1".to_string()));
        }
        if bins == 0 {
            return Err(FeatureError::Config("number of bins must be at least 1".to_string()));
        }

        Ok(Self {
            k,
            bins,
            strategy: BinStrategy::select(k, bins),
            parallel: false,
            threads: 1,
        })
    }

    /// Opt in to parallel batch encoding
    ///
    /// Encoders are single-threaded unless this is called. With it, batches
    /// of at least [`Self::PARALLEL_THRESHOLD`] sequences are split over up to
    /// [`Self::MAX_THREADS`] threads; results and errors are identical to the
    /// single-threaded path.
    pub fn with_parallel(mut self, threads: usize) -> Self {
        self.parallel = true;
        self.threads = threads.clamp(1, Self::MAX_THREADS);
        self
    }

    /// K-mer length
    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of bins in every output vector
    pub fn bins(&self) -> usize {
        self.bins
    }

    /// Bin assignment strategy chosen for this (k, bins) pair
    pub fn strategy(&self) -> BinStrategy {
        self.strategy
    }

    /// Returns true if a batch of `num_sequences` will be encoded in parallel
    pub fn will_use_parallel(&self, num_sequences: usize) -> bool {
        self.parallel && num_sequences >= Self::PARALLEL_THRESHOLD
    }

    /// Hash one sequence
    pub fn encode(&self, sequence: &[u8], weights: Option<&KmerWeights>) -> Result<HashedFeatures> {
        validate(sequence)?;
        if let Some(position) = first_non_standard(sequence) {
            return Err(FeatureError::NonStandardSequence {
                position,
                symbol: sequence[position] as char,
            });
        }

        let lowered = sequence.to_ascii_lowercase();
        let mut bins = vec![0.0; self.bins];
        let mut n_valid_kmers = 0;

        for kmer in kmer_iter(&lowered, self.k) {
            let bin = self
                .strategy
                .bin_of(kmer, self.bins)
                .ok_or_else(|| unbinnable_kmer(&lowered, kmer))?;
            let weight = weights.and_then(|w| w.get(kmer)).copied().unwrap_or(1.0);
            bins[bin] += weight;
            n_valid_kmers += 1;
        }

        Ok(HashedFeatures { bins, n_valid_kmers })
    }

    /// Hash many sequences, preserving input order
    ///
    /// Stops at the first failing sequence (lowest index, also in parallel
    /// mode) and reports it as [`FeatureError::BatchItem`].
    pub fn encode_batch(
        &self,
        sequences: &[&[u8]],
        weights: Option<&KmerWeights>,
    ) -> Result<Vec<HashedFeatures>> {
        if self.will_use_parallel(sequences.len()) {
            self.encode_parallel(sequences, weights)
                .into_iter()
                .enumerate()
                .map(|(index, result)| result.map_err(|e| e.in_batch(index)))
                .collect()
        } else {
            sequences
                .iter()
                .enumerate()
                .map(|(index, seq)| self.encode(seq, weights).map_err(|e| e.in_batch(index)))
                .collect()
        }
    }

    fn encode_parallel(
        &self,
        sequences: &[&[u8]],
        weights: Option<&KmerWeights>,
    ) -> Vec<Result<HashedFeatures>> {
        use rayon::prelude::*;

        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .build()
        {
            Ok(p) => p,
            Err(_) => {
                // Fall back to scalar if the pool cannot be created
                return sequences.iter().map(|seq| self.encode(seq, weights)).collect();
            }
        };

        pool.install(|| {
            sequences
                .par_iter()
                .map(|seq| self.encode(seq, weights))
                .collect()
        })
    }
}

/// Error for a window with no exact bin, located at its first occurrence
#[cold]
fn unbinnable_kmer(sequence: &[u8], kmer: &[u8]) -> FeatureError {
    let position = sequence
        .windows(kmer.len())
        .position(|window| window == kmer)
        .unwrap_or(0);
    FeatureError::Validation {
        position,
        msg: format!(
            "k-mer '{}' has no exact bin",
            String::from_utf8_lossy(kmer)
        ),
    }
}
