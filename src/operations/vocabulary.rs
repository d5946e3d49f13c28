//! Sparse multi-k vocabulary encoding
//!
//! Builds labeled sparse records whose features are k-mers of several
//! lengths, each k-mer mapped to a global index assigned on first encounter.
//!
//! # K-length Specification
//!
//! The configured lengths come from a single token:
//!
//! | Form          | Example  | Lengths   |
//! |---------------|----------|-----------|
//! | range         | `3r5r1`  | 3, 4, 5   |
//! | enumeration   | `3e5e7`  | 3, 5, 7   |
//! | single        | `4`      | 4         |
//!
//! # Vocabulary Lifecycle
//!
//! A [`Vocabulary`] is created empty for one run and grows monotonically: a
//! previously unseen k-mer receives `len()` as its index, and indices are
//! never reassigned. Assignment requires `&mut self`, so a single writer is
//! enforced by the borrow checker; [`VocabularyEncoder::encode_batch`] keeps
//! that discipline by parallelising only sequence normalization.
//!
//! # Examples
//!
//! ```
//! use kmerfeat::operations::{KmerLengths, VocabularyEncoder};
//!
//! let lengths: KmerLengths = "2".parse()?;
//! let mut encoder = VocabularyEncoder::new(lengths);
//!
//! let record = encoder.encode(b"ACAC", 0)?;
//! assert_eq!(record.to_string(), "1 | 0:2 1:1");
//! # Ok::<(), kmerfeat::FeatureError>(())
//! ```

use crate::error::{FeatureError, Result};
use crate::operations::kmer::kmer_iter;
use crate::operations::sequence::normalize;
use crate::types::SparseRecord;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

const RANGE_SEPARATOR: char = 'r';
const ENUMERATION_SEPARATOR: char = 'e';

/// Ordered, non-empty list of k-mer lengths parsed from a specification token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KmerLengths {
    lengths: Vec<usize>,
    spec: String,
}

impl KmerLengths {
    /// Build from an explicit list of lengths
    ///
    /// # Errors
    ///
    /// [`FeatureError::Config`] if the list is empty or holds a zero length.
    pub fn from_lengths(lengths: Vec<usize>) -> Result<Self> {
        let spec = lengths
            .iter()
            .map(|k| k.to_string())
            .collect::<Vec<_>>()
            .join(&ENUMERATION_SEPARATOR.to_string());
        Self::checked(lengths, spec)
    }

    fn checked(lengths: Vec<usize>, spec: String) -> Result<Self> {
        if lengths.is_empty() {
            return Err(FeatureError::Config(format!(
                "k-length specification '{}' yields no lengths",
                spec
            )));
        }
        if lengths.contains(&0) {
            return Err(FeatureError::Config(format!(
                "k-length specification '{}' contains a zero length",
                spec
            )));
        }
        Ok(Self { lengths, spec })
    }

    /// Lengths in configured order
    pub fn as_slice(&self) -> &[usize] {
        &self.lengths
    }

    /// Iterate over lengths in configured order
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.lengths.iter().copied()
    }

    /// Shortest configured length
    pub fn min(&self) -> usize {
        self.lengths.iter().copied().min().unwrap_or(0)
    }

    /// The specification token these lengths were parsed from
    pub fn spec(&self) -> &str {
        &self.spec
    }
}

fn parse_length(part: &str, spec: &str) -> Result<usize> {
    part.trim().parse::<usize>().map_err(|_| {
        FeatureError::Config(format!(
            "invalid k-mer length '{}' in specification '{}'",
            part, spec
        ))
    })
}

impl FromStr for KmerLengths {
    type Err = FeatureError;

    /// Parse the range (`start r stop r step`), enumeration (`n1 e n2 ...`)
    /// or single (`n`) form
    fn from_str(s: &str) -> Result<Self> {
        let spec = s.trim();

        let lengths = if spec.contains(RANGE_SEPARATOR) {
            let parts: Vec<usize> = spec
                .split(RANGE_SEPARATOR)
                .map(|p| parse_length(p, spec))
                .collect::<Result<_>>()?;
            let &[start, stop, step] = parts.as_slice() else {
                return Err(FeatureError::Config(format!(
                    "range specification '{}' must be start{r}stop{r}step",
                    spec,
                    r = RANGE_SEPARATOR
                )));
            };
            if step == 0 {
                return Err(FeatureError::Config(format!(
                    "range specification '{}' has a zero step",
                    spec
                )));
            }
            (start..=stop).step_by(step).collect()
        } else if spec.contains(ENUMERATION_SEPARATOR) {
            spec.split(ENUMERATION_SEPARATOR)
                .map(|p| parse_length(p, spec))
                .collect::<Result<Vec<_>>>()?
        } else {
            vec![parse_length(spec, spec)?]
        };

        Self::checked(lengths, spec.to_string())
    }
}

impl fmt::Display for KmerLengths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.spec)
    }
}

/// Run-scoped mapping from k-mer to feature index
///
/// Indices are dense, start at 0 and follow first-encounter order.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    table: HashMap<Vec<u8>, usize>,
}

impl Vocabulary {
    /// Create an empty vocabulary
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `kmer`, assigning `len()` if it has not been seen before
    pub fn index_of(&mut self, kmer: &[u8]) -> usize {
        if let Some(&index) = self.table.get(kmer) {
            return index;
        }
        let index = self.table.len();
        self.table.insert(kmer.to_vec(), index);
        index
    }

    /// Index of `kmer` without assigning one
    pub fn get(&self, kmer: &[u8]) -> Option<usize> {
        self.table.get(kmer).copied()
    }

    /// Number of distinct k-mers seen so far (also the next index)
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` before the first assignment
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// K-mers in index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[u8])> {
        let mut entries: Vec<(usize, &[u8])> = self
            .table
            .iter()
            .map(|(kmer, &index)| (index, kmer.as_slice()))
            .collect();
        entries.sort_unstable_by_key(|&(index, _)| index);
        entries.into_iter()
    }
}

/// Labeled sparse encoder over several k-mer lengths sharing one vocabulary
#[derive(Debug, Clone)]
pub struct VocabularyEncoder {
    lengths: KmerLengths,
    vocabulary: Vocabulary,
    parallel: bool,
    threads: usize,
}

impl VocabularyEncoder {
    /// Minimum batch size before parallel normalization is used
    pub const PARALLEL_THRESHOLD: usize = 1000;

    /// Maximum worker threads for batch normalization
    pub const MAX_THREADS: usize = 4;

    /// Create an encoder with an empty vocabulary
    pub fn new(lengths: KmerLengths) -> Self {
        Self {
            lengths,
            vocabulary: Vocabulary::new(),
            parallel: false,
            threads: 1,
        }
    }

    /// Opt in to parallel normalization in [`Self::encode_batch`]
    ///
    /// Encoders are single-threaded unless this is called. With it, batches
    /// of at least [`Self::PARALLEL_THRESHOLD`] records are normalized on up
    /// to [`Self::MAX_THREADS`] threads; index assignment stays sequential, so
    /// records, vocabulary and errors match the single-threaded path.
    pub fn with_parallel(mut self, threads: usize) -> Self {
        self.parallel = true;
        self.threads = threads.clamp(1, Self::MAX_THREADS);
        self
    }

    /// Configured k-mer lengths
    pub fn lengths(&self) -> &KmerLengths {
        &self.lengths
    }

    /// Vocabulary built so far
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Consume the encoder, keeping its vocabulary
    pub fn into_vocabulary(self) -> Vocabulary {
        self.vocabulary
    }

    /// Encode one raw sequence with its label
    ///
    /// The sequence is normalized, then every valid k-mer of every configured
    /// length is looked up (or assigned) in the vocabulary. Occurrences of the
    /// same index across lengths add up.
    ///
    /// # Errors
    ///
    /// - [`FeatureError::Validation`] if the sequence has out-of-alphabet symbols
    /// - [`FeatureError::EmptyFeatureSet`] if no valid k-mer exists for any length
    pub fn encode(&mut self, sequence: &[u8], label: i64) -> Result<SparseRecord> {
        let normalized = normalize(sequence)?;
        let kmers = collect_kmers(&normalized, &self.lengths);
        self.assign(kmers, normalized.len(), label)
    }

    /// Encode a batch of `(sequence, label)` pairs, preserving order
    ///
    /// Normalization may run in parallel; index
    /// assignment always runs sequentially in record order, so the result is
    /// identical to calling [`Self::encode`] on each pair in turn. The first
    /// failing record is reported as [`FeatureError::BatchItem`] with its index;
    /// the vocabulary keeps the assignments of the records before it.
    pub fn encode_batch(&mut self, records: &[(&[u8], i64)]) -> Result<Vec<SparseRecord>> {
        let normalized: Vec<Result<Vec<u8>>> = if self.will_use_parallel(records.len()) {
            self.normalize_parallel(records)
        } else {
            records.iter().map(|(seq, _)| normalize(seq)).collect()
        };

        let mut output = Vec::with_capacity(records.len());
        for (index, (normalized, &(_, label))) in normalized.into_iter().zip(records).enumerate() {
            let normalized = normalized.map_err(|e| e.in_batch(index))?;
            let kmers = collect_kmers(&normalized, &self.lengths);
            let record = self
                .assign(kmers, normalized.len(), label)
                .map_err(|e| e.in_batch(index))?;
            output.push(record);
        }
        Ok(output)
    }

    /// Returns true if a batch of `num_records` will be normalized in parallel
    pub fn will_use_parallel(&self, num_records: usize) -> bool {
        self.parallel && num_records >= Self::PARALLEL_THRESHOLD
    }

    fn normalize_parallel(&self, records: &[(&[u8], i64)]) -> Vec<Result<Vec<u8>>> {
        use rayon::prelude::*;

        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .build()
        {
            Ok(pool) => pool.install(|| {
                records
                    .par_iter()
                    .map(|(seq, _)| normalize(seq))
                    .collect()
            }),
            Err(_) => records.iter().map(|(seq, _)| normalize(seq)).collect(),
        }
    }

    /// Single writer: assign indices for one record's k-mers and count them
    fn assign(&mut self, kmers: Vec<&[u8]>, sequence_len: usize, label: i64) -> Result<SparseRecord> {
        if kmers.is_empty() {
            return Err(FeatureError::EmptyFeatureSet { sequence_len });
        }

        let mut counts: BTreeMap<usize, u32> = BTreeMap::new();
        for kmer in kmers {
            *counts.entry(self.vocabulary.index_of(kmer)).or_insert(0) += 1;
        }

        Ok(SparseRecord {
            label,
            features: counts.into_iter().collect(),
        })
    }
}

/// Valid k-mers of every configured length, lengths in configured order
fn collect_kmers<'a>(normalized: &'a [u8], lengths: &KmerLengths) -> Vec<&'a [u8]> {
    lengths
        .iter()
        .flat_map(|k| kmer_iter(normalized, k))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===== Specification Parsing Tests =====

    #[test]
    fn test_parse_range() {
        let lengths: KmerLengths = "3r5r1".parse().unwrap();
        assert_eq!(lengths.as_slice(), &[3, 4, 5]);

        let lengths: KmerLengths = "2r9r3".parse().unwrap();
        assert_eq!(lengths.as_slice(), &[2, 5, 8]);
    }

    #[test]
    fn test_parse_enumeration() {
        let lengths: KmerLengths = "3e5e7".parse().unwrap();
        assert_eq!(lengths.as_slice(), &[3, 5, 7]);
        assert_eq!(lengths.to_string(), "3e5e7");
    }

    #[test]
    fn test_parse_single() {
        let lengths: KmerLengths = "4".parse().unwrap();
        assert_eq!(lengths.as_slice(), &[4]);
        assert_eq!(lengths.min(), 4);
    }

    #[test]
    fn test_parse_errors() {
        for spec in ["", "x", "3r5", "3r5r1r2", "3r5r0", "5r3r1", "3e", "0", "3e0", "3r5e1", "-3"] {
            assert!(
                matches!(spec.parse::<KmerLengths>(), Err(FeatureError::Config(_))),
                "'{}' should be rejected",
                spec
            );
        }
    }

    #[test]
    fn test_from_lengths() {
        let lengths = KmerLengths::from_lengths(vec![2, 6]).unwrap();
        assert_eq!(lengths.spec(), "2e6");
        assert!(KmerLengths::from_lengths(vec![]).is_err());
    }

    // ===== Vocabulary Tests =====

    #[test]
    fn test_vocabulary_first_seen_order() {
        let mut vocabulary = Vocabulary::new();
        assert!(vocabulary.is_empty());

        assert_eq!(vocabulary.index_of(b"tt"), 0);
        assert_eq!(vocabulary.index_of(b"aa"), 1);
        assert_eq!(vocabulary.index_of(b"tt"), 0);
        assert_eq!(vocabulary.len(), 2);
        assert_eq!(vocabulary.get(b"aa"), Some(1));
        assert_eq!(vocabulary.get(b"cc"), None);

        let ordered: Vec<_> = vocabulary.iter().collect();
        assert_eq!(ordered, vec![(0, b"tt".as_ref()), (1, b"aa".as_ref())]);
    }

    // ===== Encoder Tests =====

    #[test]
    fn test_encode_counts_and_label() {
        let mut encoder = VocabularyEncoder::new("3".parse().unwrap());
        let record = encoder.encode(b"ACGACG", 2).unwrap();

        // acg, cga, gac, acg
        assert_eq!(record.label, 2);
        assert_eq!(record.features, vec![(0, 2), (1, 1), (2, 1)]);
        assert_eq!(record.to_string(), "3 | 0:2 1:1 2:1");
    }

    #[test]
    fn test_encode_multiple_lengths_share_vocabulary() {
        let mut encoder = VocabularyEncoder::new("1e2".parse().unwrap());
        let record = encoder.encode(b"AAT", 0).unwrap();

        // k=1: a, a, t   k=2: aa, at
        assert_eq!(record.features, vec![(0, 2), (1, 1), (2, 1), (3, 1)]);
        assert_eq!(encoder.vocabulary().get(b"at"), Some(3));
    }

    #[test]
    fn test_encode_is_stable_within_run() {
        let mut encoder = VocabularyEncoder::new("2r3r1".parse().unwrap());
        let first = encoder.encode(b"ACGTTGCA", 1).unwrap();
        let size = encoder.vocabulary().len();

        let second = encoder.encode(b"ACGTTGCA", 1).unwrap();
        assert_eq!(first, second);
        assert_eq!(encoder.vocabulary().len(), size);
    }

    #[test]
    fn test_new_kmer_gets_next_index() {
        let mut encoder = VocabularyEncoder::new("2".parse().unwrap());
        encoder.encode(b"AAAA", 0).unwrap();
        assert_eq!(encoder.vocabulary().len(), 1);

        let record = encoder.encode(b"AAC", 0).unwrap();
        assert_eq!(record.features, vec![(0, 1), (1, 1)]);
    }

    #[test]
    fn test_encode_skips_ambiguity() {
        let mut encoder = VocabularyEncoder::new("2".parse().unwrap());
        let record = encoder.encode(b"ACNGT", 0).unwrap();

        // ac, gt (c*, *g skipped)
        assert_eq!(record.features, vec![(0, 1), (1, 1)]);
        assert_eq!(encoder.vocabulary().get(b"ac"), Some(0));
    }

    #[test]
    fn test_all_ambiguity_is_empty_feature_set() {
        let mut encoder = VocabularyEncoder::new("3".parse().unwrap());
        assert!(matches!(
            encoder.encode(b"NNNN", 0),
            Err(FeatureError::EmptyFeatureSet { sequence_len: 4 })
        ));
        assert!(encoder.vocabulary().is_empty());
    }

    #[test]
    fn test_too_short_is_empty_feature_set() {
        let mut encoder = VocabularyEncoder::new("5e7".parse().unwrap());
        assert!(matches!(
            encoder.encode(b"ACGT", 0),
            Err(FeatureError::EmptyFeatureSet { .. })
        ));
    }

    #[test]
    fn test_encode_invalid_sequence() {
        let mut encoder = VocabularyEncoder::new("2".parse().unwrap());
        assert!(matches!(
            encoder.encode(b"AC GT", 0),
            Err(FeatureError::Validation { position: 2, .. })
        ));
    }

    #[test]
    fn test_encode_batch_matches_sequential() {
        let sequences: Vec<Vec<u8>> = (0..1100)
            .map(|i| format!("ACGT{}TTGCA", "G".repeat(i % 7)).into_bytes())
            .collect();
        let records: Vec<(&[u8], i64)> = sequences
            .iter()
            .enumerate()
            .map(|(i, s)| (s.as_slice(), (i % 3) as i64))
            .collect();

        let lengths: KmerLengths = "3e4".parse().unwrap();
        let mut sequential = VocabularyEncoder::new(lengths.clone());
        let expected: Vec<_> = records
            .iter()
            .map(|&(seq, label)| sequential.encode(seq, label).unwrap())
            .collect();

        let mut batched = VocabularyEncoder::new(lengths).with_parallel(4);
        assert!(batched.will_use_parallel(records.len()));
        let actual = batched.encode_batch(&records).unwrap();

        assert_eq!(actual, expected);
        assert_eq!(batched.vocabulary().len(), sequential.vocabulary().len());
    }

    #[test]
    fn test_encode_batch_stops_at_failure() {
        let mut encoder = VocabularyEncoder::new("2".parse().unwrap());
        let records = vec![(b"ACGT".as_ref(), 0), (b"NN".as_ref(), 1), (b"TTTT".as_ref(), 0)];

        match encoder.encode_batch(&records) {
            Err(FeatureError::BatchItem { index, source }) => {
                assert_eq!(index, 1);
                assert!(matches!(*source, FeatureError::EmptyFeatureSet { sequence_len: 2 }));
            }
            other => panic!("expected batch item error, got {other:?}"),
        }
        assert_eq!(encoder.vocabulary().len(), 3);
        assert_eq!(encoder.vocabulary().get(b"tt"), None);
    }

    #[test]
    fn test_parallel_batch_reports_invalid_record_index() {
        let mut encoder = VocabularyEncoder::new("2".parse().unwrap()).with_parallel(4);
        let mut records: Vec<(&[u8], i64)> = vec![(&b"ACGT"[..], 0); 1200];
        records[900] = (&b"ACZT"[..], 1);
        records[1100] = (&b"NN"[..], 1);
        assert!(encoder.will_use_parallel(records.len()));

        match encoder.encode_batch(&records) {
            Err(FeatureError::BatchItem { index, source }) => {
                assert_eq!(index, 900);
                assert!(matches!(*source, FeatureError::Validation { position: 2, .. }));
            }
            other => panic!("expected batch item error, got {other:?}"),
        }
        assert_eq!(encoder.vocabulary().len(), 3);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: counts add up to the number of valid windows
            #[test]
            fn prop_counts_sum_to_windows(seq in "[ACGT]{8,200}", k in 1usize..8) {
                let mut encoder = VocabularyEncoder::new(KmerLengths::from_lengths(vec![k]).unwrap());
                let record = encoder.encode(seq.as_bytes(), 0).unwrap();
                prop_assert_eq!(record.total_count(), (seq.len() - k + 1) as u64);
            }

            /// Property: features are sorted, distinct and below the vocabulary size
            #[test]
            fn prop_features_sorted_and_bounded(seq in "[ACGTN]{0,100}[ACGT]{6}") {
                let mut encoder = VocabularyEncoder::new("2r6r2".parse().unwrap());
                let record = encoder.encode(seq.as_bytes(), 0).unwrap();
                let size = encoder.vocabulary().len();
                for pair in record.features.windows(2) {
                    prop_assert!(pair[0].0 < pair[1].0);
                }
                prop_assert!(record.features.iter().all(|&(idx, c)| idx < size && c > 0));
            }
        }
    }
}
