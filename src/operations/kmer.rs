//! K-mer windows, exact ordinals and string hashing
//!
//! # Window Semantics
//!
//! A window of length `k` is taken at every offset of a *normalized* sequence.
//! Windows that run off the end of the sequence, or that contain the
//! non-standard marker, are skipped. Both feature encoders share this rule:
//!
//! ```text
//! sequence:  a c * g t a
//! k = 3:     a c *          skipped (marker)
//!              c * g        skipped (marker)
//!                * g t      skipped (marker)
//!                  g t a    kept
//! ```
//!
//! # Bin Assignment
//!
//! - [`kmer_ordinal`]: exact position of a k-mer in the lexicographic
//!   enumeration of all `4^k` k-mers over `a < c < g < t`.
//! - [`fnv1a_hash`]: 64-bit FNV-1a, deterministic across runs and platforms.
//!
//! # Examples
//!
//! ```
//! use kmerfeat::operations::kmer::{kmer_iter, kmer_ordinal};
//!
//! let kmers: Vec<_> = kmer_iter(b"ac*gta", 3).collect();
//! assert_eq!(kmers, vec![b"gta".as_ref()]);
//!
//! assert_eq!(kmer_ordinal(b"aaa"), Some(0));
//! assert_eq!(kmer_ordinal(b"ttt"), Some(63));
//! ```

use crate::operations::sequence::NON_STANDARD_MARKER;

/// Streaming k-mer iterator over a normalized sequence (zero-copy)
///
/// Yields borrowed windows of length `k`, skipping windows that contain the
/// marker. `k == 0` or `k > len` yields nothing.
///
/// # Examples
///
/// ```
/// use kmerfeat::operations::kmer::kmer_iter;
///
/// let kmers: Vec<_> = kmer_iter(b"acgtacgt", 4).collect();
/// assert_eq!(kmers.len(), 5);
/// assert_eq!(kmers[0], b"acgt");
/// ```
pub fn kmer_iter(sequence: &[u8], k: usize) -> impl Iterator<Item = &[u8]> {
    if k == 0 || k > sequence.len() {
        return KmerIterator { sequence, k, position: sequence.len() + 1 };
    }

    KmerIterator { sequence, k, position: 0 }
}

/// Internal iterator implementation for k-mers
struct KmerIterator<'a> {
    sequence: &'a [u8],
    k: usize,
    position: usize,
}

impl<'a> Iterator for KmerIterator<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        while self.position + self.k <= self.sequence.len() {
            let kmer = &self.sequence[self.position..self.position + self.k];
            self.position += 1;

            if is_valid_kmer(kmer) {
                return Some(kmer);
            }
        }

        None
    }
}

/// A window is countable unless it contains the non-standard marker
#[inline]
pub fn is_valid_kmer(kmer: &[u8]) -> bool {
    !kmer.contains(&NON_STANDARD_MARKER)
}

/// Number of distinct k-mers over the four standard bases, if it fits in `u64`
#[inline]
pub fn kmer_space_size(k: usize) -> Option<u64> {
    let k = u32::try_from(k).ok()?;
    4u64.checked_pow(k)
}

/// Lexicographic ordinal of a k-mer over `a < c < g < t`
///
/// Equivalent to enumerating every k-mer of the same length in lexicographic
/// order and returning the k-mer's position, without building the table.
/// Returns `None` if the k-mer holds anything other than lowercase
/// `a`, `c`, `g`, `t` or the ordinal would overflow `u64`.
///
/// # Examples
///
/// ```
/// use kmerfeat::operations::kmer::kmer_ordinal;
///
/// assert_eq!(kmer_ordinal(b"ac"), Some(1));
/// assert_eq!(kmer_ordinal(b"ca"), Some(4));
/// assert_eq!(kmer_ordinal(b"an"), None);
/// ```
pub fn kmer_ordinal(kmer: &[u8]) -> Option<u64> {
    kmer.iter().try_fold(0u64, |acc, &base| {
        let digit = match base {
            b'a' => 0,
            b'c' => 1,
            b'g' => 2,
            b't' => 3,
            _ => return None,
        };
        acc.checked_mul(4)?.checked_add(digit)
    })
}

/// FNV-1a hash function (64-bit)
///
/// Fast, non-cryptographic string hash used for bin assignment when the
/// exact ordinal does not fit in the configured number of bins.
///
/// # Algorithm
///
/// ```text
/// hash = FNV_OFFSET_BASIS (14695981039346656037)
/// for each byte:
///     hash = hash XOR byte
///     hash = hash × FNV_PRIME (1099511628211)
/// ```
#[inline]
pub fn fnv1a_hash(kmer: &[u8]) -> u64 {
    const FNV_OFFSET_BASIS: u64 = 14695981039346656037;
    const FNV_PRIME: u64 = 1099511628211;

    let mut hash = FNV_OFFSET_BASIS;
    for &byte in kmer {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}
