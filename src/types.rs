//! Common types used throughout kmerfeat

use std::fmt;

/// A contig parsed from one FASTA record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contig {
    /// Full header text after '>', lowercased and trimmed
    pub header: String,
    /// Lowercased raw sequence body (never empty)
    pub sequence: Vec<u8>,
}

impl Contig {
    /// Create a new contig
    pub fn new(header: String, sequence: Vec<u8>) -> Self {
        Self { header, sequence }
    }

    /// Sequence length in bases
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Always `false` for contigs produced by the parser
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// Dense bin vector produced by the hashing extractor
#[derive(Debug, Clone, PartialEq)]
pub struct HashedFeatures {
    /// Accumulated weight per bin
    pub bins: Vec<f64>,
    /// Number of valid k-mers that contributed to `bins`
    pub n_valid_kmers: usize,
}

impl HashedFeatures {
    /// Bin vector divided by the number of valid k-mers
    ///
    /// Returns the zero vector when no k-mer was counted.
    pub fn normalized(&self) -> Vec<f64> {
        if self.n_valid_kmers == 0 {
            return vec![0.0; self.bins.len()];
        }
        let n = self.n_valid_kmers as f64;
        self.bins.iter().map(|&v| v / n).collect()
    }
}

/// Sparse labeled record produced by the vocabulary encoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparseRecord {
    /// Label as supplied by the caller (written as `label + 1`)
    pub label: i64,
    /// `(vocabulary index, count)` pairs in ascending index order
    pub features: Vec<(usize, u32)>,
}

impl SparseRecord {
    /// Label as written to the dataset line
    ///
    /// Shifted by one so that label 0 is distinguishable from "no label".
    /// Widened to `i128` so every `i64` label has a successor.
    pub fn output_label(&self) -> i128 {
        i128::from(self.label) + 1
    }

    /// Total number of k-mer occurrences in the record
    pub fn total_count(&self) -> u64 {
        self.features.iter().map(|&(_, c)| c as u64).sum()
    }

    /// Render the record as `"<label+1> | <prefix>idx:count ..."`
    ///
    /// # Examples
    ///
    /// ```
    /// use kmerfeat::SparseRecord;
    ///
    /// let record = SparseRecord { label: 0, features: vec![(0, 2), (3, 1)] };
    /// assert_eq!(record.to_line(""), "1 | 0:2 3:1");
    /// assert_eq!(record.to_line("k"), "1 | k0:2 k3:1");
    /// ```
    pub fn to_line(&self, feature_prefix: &str) -> String {
        let features: Vec<String> = self
            .features
            .iter()
            .map(|(idx, count)| format!("{}{}:{}", feature_prefix, idx, count))
            .collect();
        format!("{} | {}", self.output_label(), features.join(" "))
    }
}

impl fmt::Display for SparseRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contig_len() {
        let contig = Contig::new("h1".to_string(), b"acgt".to_vec());
        assert_eq!(contig.len(), 4);
        assert!(!contig.is_empty());
    }

    #[test]
    fn test_hashed_features_normalized() {
        let features = HashedFeatures { bins: vec![2.0, 0.0, 2.0], n_valid_kmers: 4 };
        assert_eq!(features.normalized(), vec![0.5, 0.0, 0.5]);

        let empty = HashedFeatures { bins: vec![0.0; 3], n_valid_kmers: 0 };
        assert_eq!(empty.normalized(), vec![0.0; 3]);
    }

    #[test]
    fn test_sparse_record_display() {
        let record = SparseRecord { label: 4, features: vec![(1, 3), (7, 1)] };
        assert_eq!(record.output_label(), 5);
        assert_eq!(record.total_count(), 4);
        assert_eq!(record.to_string(), "5 | 1:3 7:1");
    }

    #[test]
    fn test_sparse_record_extreme_labels() {
        let max = SparseRecord { label: i64::MAX, features: vec![(0, 1)] };
        assert_eq!(max.to_line(""), "9223372036854775808 | 0:1");

        let min = SparseRecord { label: i64::MIN, features: vec![(0, 1)] };
        assert_eq!(min.output_label(), -9223372036854775807);
    }
}
