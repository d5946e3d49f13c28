//! FASTA streaming contig parser
//!
//! # Format
//!
//! ```text
//! >NZ_CP009072.1 Escherichia coli ATCC 25922
//! AGCTTTTCATTCTGACTGCA
//! ACGGGCAATATGTC
//! >plasmid_1
//! ACGTNNNACGT
//! ```
//!
//! # State Machine
//!
//! | State            | Header line (`>`)                          | Other line           |
//! |------------------|--------------------------------------------|----------------------|
//! | `AwaitingHeader` | emit headerless buffer if any → `Accumulating` | append to buffer |
//! | `Accumulating`   | emit pending contig if non-empty, new header | append to buffer   |
//!
//! At end of stream the pending contig is emitted if its buffer is non-empty.
//! A header with no sequence lines is skipped. Sequence lines are trimmed,
//! lowercased and validated against the nucleotide alphabet as they are
//! appended; headers are trimmed and lowercased. Memory is bounded by one contig buffer.

use crate::error::{FeatureError, Result};
use crate::io::compression::{CompressedReader, DataSource};
use crate::operations::sequence::validate;
use crate::types::Contig;
use std::io::BufRead;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    AwaitingHeader,
    Accumulating,
}

/// Streaming parser yielding one [`Contig`] per FASTA record
///
/// Each call to [`ContigStream::from_path`] re-reads the file from the start;
/// streams are independent, not shared iterators.
///
/// # Example
///
/// ```no_run
/// use kmerfeat::io::ContigStream;
///
/// let stream = ContigStream::from_path("genome.fna.gz")?;
/// for contig in stream {
///     let contig = contig?;
///     println!("{}: {} bp", contig.header, contig.len());
/// }
/// # Ok::<(), kmerfeat::FeatureError>(())
/// ```
pub struct ContigStream<R: BufRead> {
    reader: R,
    line_buffer: Vec<u8>,
    line_number: usize,
    state: ParserState,
    header: String,
    header_line: usize,
    sequence: Vec<u8>,
    finished: bool,
}

impl ContigStream<CompressedReader> {
    /// Create a contig stream from a data source
    pub fn new(source: DataSource) -> Result<Self> {
        let compressed_reader = CompressedReader::new(source)?;
        Ok(Self::from_reader(compressed_reader))
    }

    /// Create a contig stream from a local, optionally gzipped, file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(DataSource::from_path(path))
    }
}

impl<R: BufRead> ContigStream<R> {
    /// Create a contig stream from any buffered reader
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader,
            line_buffer: Vec::with_capacity(256),
            line_number: 0,
            state: ParserState::AwaitingHeader,
            header: String::new(),
            header_line: 0,
            sequence: Vec::new(),
            finished: false,
        }
    }

    fn read_contig(&mut self) -> Result<Option<Contig>> {
        if self.finished {
            return Ok(None);
        }

        loop {
            self.line_buffer.clear();
            if self.reader.read_until(b'\n', &mut self.line_buffer)? == 0 {
                self.finished = true;
                return self.finish_stream();
            }
            self.line_number += 1;

            if self.line_buffer.first() == Some(&b'>') {
                let header = String::from_utf8_lossy(&self.line_buffer[1..])
                    .trim()
                    .to_lowercase();

                let emitted = if self.sequence.is_empty() {
                    if self.state == ParserState::Accumulating {
                        debug!(header = %self.header, line = self.header_line, "skipped empty contig");
                    }
                    None
                } else {
                    Some(self.take_contig()?)
                };

                self.header = header;
                self.header_line = self.line_number;
                self.state = ParserState::Accumulating;

                if emitted.is_some() {
                    return Ok(emitted);
                }
            } else {
                self.append_line()?;
            }
        }
    }

    /// Append the current (non-header) line to the sequence buffer
    fn append_line(&mut self) -> Result<()> {
        let line = self.line_buffer.trim_ascii();
        if let Err(FeatureError::Validation { position, msg }) = validate(line) {
            return Err(FeatureError::Parse {
                line: self.line_number,
                msg: format!("column {}: {}", position + 1, msg),
            });
        }
        self.sequence.extend(line.iter().map(u8::to_ascii_lowercase));
        Ok(())
    }

    /// Move the buffered sequence out as a contig, refusing empty bodies
    fn take_contig(&mut self) -> Result<Contig> {
        if self.sequence.is_empty() {
            return Err(FeatureError::Parse {
                line: self.header_line,
                msg: format!("contig '{}' has no sequence", self.header),
            });
        }

        let contig = Contig::new(
            std::mem::take(&mut self.header),
            std::mem::take(&mut self.sequence),
        );
        debug!(header = %contig.header, length = contig.len(), "parsed contig");
        Ok(contig)
    }

    fn finish_stream(&mut self) -> Result<Option<Contig>> {
        if self.sequence.is_empty() {
            if self.state == ParserState::Accumulating {
                debug!(header = %self.header, line = self.header_line, "skipped empty contig");
            }
            return Ok(None);
        }
        self.take_contig().map(Some)
    }
}

impl<R: BufRead> Iterator for ContigStream<R> {
    type Item = Result<Contig>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_contig() {
            Ok(Some(contig)) => Some(Ok(contig)),
            Ok(None) => None,
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Read every contig body of a FASTA file
///
/// # Example
///
/// ```no_run
/// use kmerfeat::io::read_contigs;
///
/// let contigs = read_contigs("genome.fna.gz")?;
/// # Ok::<(), kmerfeat::FeatureError>(())
/// ```
pub fn read_contigs<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<u8>>> {
    ContigStream::from_path(path)?
        .map(|contig| contig.map(|c| c.sequence))
        .collect()
}

/// Read every contig of a FASTA file as parallel body and header lists
pub fn read_contigs_with_headers<P: AsRef<Path>>(path: P) -> Result<(Vec<Vec<u8>>, Vec<String>)> {
    let mut contigs = Vec::new();
    let mut headers = Vec::new();
    for contig in ContigStream::from_path(path)? {
        let contig = contig?;
        contigs.push(contig.sequence);
        headers.push(contig.header);
    }
    Ok((contigs, headers))
}
