//! Sequence codec: validation, normalization, one-hot encoding and reverse complement
//!
//! # Alphabet
//!
//! The accepted alphabet is the four standard bases `a c g t` plus fourteen
//! ambiguity/gap symbols (`k m r y s w b v h d x n . -`), case-insensitive.
//! A sequence is either *raw* (may contain ambiguity symbols) or *normalized*
//! (every ambiguity symbol replaced by [`NON_STANDARD_MARKER`]). The marker
//! itself is accepted by validation so that normalized sequences validate too.
//!
//! | Operation              | Accepts raw | Accepts normalized |
//! |------------------------|-------------|--------------------|
//! | [`is_valid`]           | yes         | yes                |
//! | [`normalize`]          | yes         | yes (idempotent)   |
//! | [`one_hot`]            | yes         | no (marker rejected) |
//! | [`reverse_complement`] | yes         | yes                |
//!
//! All lookup tables are `const` arrays indexed by byte value.
//!
//! # Examples
//!
//! ```
//! use kmerfeat::operations::{normalize, reverse_complement};
//!
//! let normalized = normalize(b"ACNNGT")?;
//! assert_eq!(normalized, b"ac**gt");
//!
//! let rc = reverse_complement(b"AACG")?;
//! assert_eq!(rc, b"cgtt");
//! # Ok::<(), kmerfeat::FeatureError>(())
//! ```

use crate::error::{FeatureError, Result};
use std::ops::RangeBounds;

/// Symbol substituted for every ambiguity/gap code during normalization
pub const NON_STANDARD_MARKER: u8 = b'*';

/// The four standard bases, in canonical (lowercase) form
pub const STANDARD_NUCLEOTIDES: [u8; 4] = *b"acgt";

/// Ambiguity and gap symbols, in canonical (lowercase) form
pub const NON_STANDARD_NUCLEOTIDES: [u8; 14] = *b"kmrysbwvhdxn.-";

/// Symbol classes stored in [`SYMBOL_CLASS`]
const INVALID: u8 = 0;
const STANDARD: u8 = 1;
const NON_STANDARD: u8 = 2;
const MARKER: u8 = 3;

/// Class of every byte value (both cases of each letter share a class)
const SYMBOL_CLASS: [u8; 256] = {
    let mut table = [INVALID; 256];

    let mut i = 0;
    while i < STANDARD_NUCLEOTIDES.len() {
        let base = STANDARD_NUCLEOTIDES[i];
        table[base as usize] = STANDARD;
        table[base.to_ascii_uppercase() as usize] = STANDARD;
        i += 1;
    }

    let mut i = 0;
    while i < NON_STANDARD_NUCLEOTIDES.len() {
        let base = NON_STANDARD_NUCLEOTIDES[i];
        table[base as usize] = NON_STANDARD;
        table[base.to_ascii_uppercase() as usize] = NON_STANDARD;
        i += 1;
    }

    table[NON_STANDARD_MARKER as usize] = MARKER;
    table
};

const HALF: f64 = 0.5;
const THIRD: f64 = 1.0 / 3.0;
const QUARTER: f64 = 0.25;

/// One-hot rows over the axes (A, T, C, G)
///
/// Two-way codes split 1/2, three-way codes split 1/3, `n`/`x` split 1/4 and
/// the gap symbols `.`/`-` map to the zero row. Bytes outside the alphabet
/// also hold the zero row but are rejected before lookup.
const ONE_HOT_TABLE: [[f64; 4]; 256] = {
    let mut table = [[0.0; 4]; 256];

    let rows: [(u8, [f64; 4]); 16] = [
        (b'a', [1.0, 0.0, 0.0, 0.0]),
        (b't', [0.0, 1.0, 0.0, 0.0]),
        (b'c', [0.0, 0.0, 1.0, 0.0]),
        (b'g', [0.0, 0.0, 0.0, 1.0]),
        (b'k', [0.0, HALF, 0.0, HALF]),    // G or T
        (b'm', [HALF, 0.0, HALF, 0.0]),    // A or C
        (b'r', [HALF, 0.0, 0.0, HALF]),    // A or G
        (b'y', [0.0, HALF, HALF, 0.0]),    // C or T
        (b's', [0.0, 0.0, HALF, HALF]),    // C or G
        (b'w', [HALF, HALF, 0.0, 0.0]),    // A or T
        (b'b', [0.0, THIRD, THIRD, THIRD]), // not A
        (b'v', [THIRD, 0.0, THIRD, THIRD]), // not T
        (b'h', [THIRD, THIRD, THIRD, 0.0]), // not G
        (b'd', [THIRD, THIRD, 0.0, THIRD]), // not C
        (b'x', [QUARTER, QUARTER, QUARTER, QUARTER]),
        (b'n', [QUARTER, QUARTER, QUARTER, QUARTER]),
    ];

    let mut i = 0;
    while i < rows.len() {
        let (base, row) = rows[i];
        table[base as usize] = row;
        table[base.to_ascii_uppercase() as usize] = row;
        i += 1;
    }
    table
};

/// Complement of every alphabet symbol, lowercase output
///
/// - Standard: a↔t, c↔g
/// - Two-way: k↔m, r↔y, s and w are self-complementary
/// - Three-way: b↔v, h↔d
/// - Unknown: n→n, x→n
/// - Gaps and the marker map to themselves
///
/// Bytes outside the alphabet map to 0 and are rejected before lookup.
const COMPLEMENT_TABLE: [u8; 256] = {
    let mut table = [0u8; 256];

    let pairs: [(u8, u8); 19] = [
        (b'a', b't'),
        (b'c', b'g'),
        (b'g', b'c'),
        (b't', b'a'),
        (b'k', b'm'),
        (b'm', b'k'),
        (b'r', b'y'),
        (b'y', b'r'),
        (b's', b's'),
        (b'w', b'w'),
        (b'b', b'v'),
        (b'v', b'b'),
        (b'h', b'd'),
        (b'd', b'h'),
        (b'x', b'n'),
        (b'n', b'n'),
        (b'.', b'.'),
        (b'-', b'-'),
        (NON_STANDARD_MARKER, NON_STANDARD_MARKER),
    ];

    let mut i = 0;
    while i < pairs.len() {
        let (base, comp) = pairs[i];
        table[base as usize] = comp;
        table[base.to_ascii_uppercase() as usize] = comp;
        i += 1;
    }
    table
};

#[inline]
fn class_of(base: u8) -> u8 {
    SYMBOL_CLASS[base as usize]
}

/// Returns the offset of the first byte outside the alphabet ∪ {marker}
#[inline]
fn first_invalid(seq: &[u8]) -> Option<usize> {
    seq.iter().position(|&b| class_of(b) == INVALID)
}

fn invalid_symbol_error(seq: &[u8], position: usize) -> FeatureError {
    FeatureError::Validation {
        position,
        msg: format!(
            "'{}' is not a nucleotide symbol",
            (seq[position] as char).escape_default()
        ),
    }
}

/// Check that every symbol belongs to the alphabet or is the marker
///
/// # Examples
///
/// ```
/// use kmerfeat::operations::is_valid;
///
/// assert!(is_valid(b"ACGTNnrY-.*"));
/// assert!(!is_valid(b"ACGU"));
/// assert!(is_valid(b""));
/// ```
pub fn is_valid(seq: &[u8]) -> bool {
    first_invalid(seq).is_none()
}

/// Check whether a sequence contains any ambiguity or gap symbol
///
/// The marker is not an ambiguity symbol: a normalized sequence answers `false`.
pub fn contains_non_standard(seq: &[u8]) -> bool {
    seq.iter().any(|&b| class_of(b) == NON_STANDARD)
}

/// Locate the first ambiguity or gap symbol
pub(crate) fn first_non_standard(seq: &[u8]) -> Option<usize> {
    seq.iter().position(|&b| class_of(b) == NON_STANDARD)
}

/// Ensure the sequence is valid, reporting the first offending symbol
pub fn validate(seq: &[u8]) -> Result<()> {
    match first_invalid(seq) {
        Some(position) => Err(invalid_symbol_error(seq, position)),
        None => Ok(()),
    }
}

/// Lowercase a sequence and replace every ambiguity/gap symbol by the marker
///
/// Standard bases are only lowercased, and the marker is preserved, so the
/// operation is idempotent.
///
/// # Errors
///
/// Returns [`FeatureError::Validation`] if the input contains a symbol
/// outside the alphabet.
///
/// # Examples
///
/// ```
/// use kmerfeat::operations::normalize;
///
/// assert_eq!(normalize(b"NNNAC")?, b"***ac");
/// assert_eq!(normalize(b"acgt")?, b"acgt");
/// assert!(normalize(b"ACGZ").is_err());
/// # Ok::<(), kmerfeat::FeatureError>(())
/// ```
pub fn normalize(seq: &[u8]) -> Result<Vec<u8>> {
    validate(seq)?;
    Ok(seq
        .iter()
        .map(|&b| match class_of(b) {
            NON_STANDARD => NON_STANDARD_MARKER,
            _ => b.to_ascii_lowercase(),
        })
        .collect())
}

/// One-hot encode a raw sequence into `len × 4` rows over (A, T, C, G)
///
/// Standard bases map to a unit vector, ambiguity codes to a uniform average
/// over the bases they stand for, and the gap symbols to the zero row.
///
/// # Errors
///
/// Returns [`FeatureError::Validation`] if the sequence contains the marker
/// (one-hot is defined on raw sequences only) or a symbol outside the alphabet.
///
/// # Examples
///
/// ```
/// use kmerfeat::operations::one_hot;
///
/// let rows = one_hot(b"AR-")?;
/// assert_eq!(rows[0], [1.0, 0.0, 0.0, 0.0]);
/// assert_eq!(rows[1], [0.5, 0.0, 0.0, 0.5]);
/// assert_eq!(rows[2], [0.0, 0.0, 0.0, 0.0]);
///
/// assert!(one_hot(b"")?.is_empty());
/// # Ok::<(), kmerfeat::FeatureError>(())
/// ```
pub fn one_hot(seq: &[u8]) -> Result<Vec<[f64; 4]>> {
    validate(seq)?;
    if let Some(position) = seq.iter().position(|&b| b == NON_STANDARD_MARKER) {
        return Err(FeatureError::Validation {
            position,
            msg: "one-hot encoding requires a raw sequence, found the non-standard marker"
                .to_string(),
        });
    }

    Ok(seq.iter().map(|&b| ONE_HOT_TABLE[b as usize]).collect())
}

/// Lowercase, reverse and complement a sequence
///
/// Gap symbols and the marker complement to themselves, so normalized
/// sequences are accepted. `x` complements to `n`, which makes the operation
/// an involution on every symbol except `x`.
///
/// # Errors
///
/// Returns [`FeatureError::Validation`] on any symbol outside the alphabet.
///
/// # Examples
///
/// ```
/// use kmerfeat::operations::reverse_complement;
///
/// assert_eq!(reverse_complement(b"ATGC")?, b"gcat");
/// assert_eq!(reverse_complement(b"AKB*")?, b"*vmt");
///
/// // Involutive property: RC(RC(x)) = lowercase(x)
/// let rc = reverse_complement(b"ATGCNRY")?;
/// assert_eq!(reverse_complement(&rc)?, b"atgcnry");
/// # Ok::<(), kmerfeat::FeatureError>(())
/// ```
pub fn reverse_complement(seq: &[u8]) -> Result<Vec<u8>> {
    validate(seq)?;
    Ok(seq
        .iter()
        .rev()
        .map(|&base| COMPLEMENT_TABLE[base as usize])
        .collect())
}

/// Keep the contigs whose length falls within `range`
///
/// # Examples
///
/// ```
/// use kmerfeat::operations::filter_by_length;
///
/// let contigs = vec![b"ac".to_vec(), b"acgt".to_vec(), b"acgtacgt".to_vec()];
/// let kept = filter_by_length(contigs, 3..=4);
/// assert_eq!(kept, vec![b"acgt".to_vec()]);
/// ```
pub fn filter_by_length<T, I, B>(contigs: I, range: B) -> Vec<T>
where
    T: AsRef<[u8]>,
    I: IntoIterator<Item = T>,
    B: RangeBounds<usize>,
{
    contigs
        .into_iter()
        .filter(|c| range.contains(&c.as_ref().len()))
        .collect()
}
