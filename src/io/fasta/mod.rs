//! FASTA support: streaming contig parser and genome file discovery
//!
//! # Basic Usage
//!
//! ```no_run
//! use kmerfeat::io::fasta::{find_genome_files, read_contigs_with_headers};
//!
//! for path in find_genome_files("genomes/", ".fna.gz")? {
//!     let (contigs, headers) = read_contigs_with_headers(&path)?;
//!     println!("{}: {} contigs", path.display(), headers.len());
//! #   let _ = contigs;
//! }
//! # Ok::<(), kmerfeat::FeatureError>(())
//! ```

mod parser;

pub use parser::{read_contigs, read_contigs_with_headers, ContigStream};

use crate::error::Result;
use std::path::{Path, PathBuf};

/// Default suffix of genome assembly files
pub const DEFAULT_GENOME_EXTENSION: &str = ".fna.gz";

/// List the files directly inside `dir` whose names end with `extension`
///
/// Subdirectories are not descended into. The result is sorted so repeated
/// runs visit genomes in the same order.
pub fn find_genome_files<P: AsRef<Path>>(dir: P, extension: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let matches = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.ends_with(extension));
        if matches {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}
