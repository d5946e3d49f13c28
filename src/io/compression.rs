//! Compressed input streams
//!
//! [`DataSource`] opens a local file, switching to memory-mapped I/O above
//! [`MMAP_THRESHOLD`]. [`CompressedReader`] sniffs the gzip magic bytes and
//! transparently decompresses every gzip member (plain gzip and bgzip alike);
//! uncompressed text passes through untouched. A truncated gzip stream is an
//! I/O error, never a silently shortened file.

use crate::error::Result;
use flate2::read::MultiGzDecoder;
use memmap2::Mmap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

/// Memory-mapped file threshold (50 MB)
///
/// Below this size buffered reads are cheaper than setting up the mapping.
pub const MMAP_THRESHOLD: u64 = 50 * 1024 * 1024; // 50 MB

/// Gzip magic bytes
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Data source abstraction for streaming input
#[derive(Debug, Clone)]
pub enum DataSource {
    /// Local file path
    Local(PathBuf),
}

impl DataSource {
    /// Create a local file data source
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        DataSource::Local(path.as_ref().to_path_buf())
    }

    /// Path of the underlying file
    pub fn path(&self) -> &Path {
        match self {
            DataSource::Local(path) => path,
        }
    }

    /// Open the file as a raw (still compressed) buffered reader
    ///
    /// Files of at least [`MMAP_THRESHOLD`] bytes are memory mapped.
    pub fn open(&self) -> Result<Box<dyn BufRead + Send>> {
        let DataSource::Local(path) = self;
        match std::fs::metadata(path)?.len() {
            len if len >= MMAP_THRESHOLD => open_mmap_file(path),
            _ => Ok(Box::new(BufReader::new(File::open(path)?))),
        }
    }
}

/// Open file with memory mapping and sequential-access hints
#[cfg(target_os = "macos")]
fn open_mmap_file(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    use libc::{madvise, MADV_SEQUENTIAL, MADV_WILLNEED};

    let file = File::open(path)?;
    // SAFETY: the mapping is read-only and owned by the returned cursor.
    let mmap = unsafe { Mmap::map(&file)? };

    unsafe {
        madvise(
            mmap.as_ptr() as *mut _,
            mmap.len(),
            MADV_SEQUENTIAL | MADV_WILLNEED,
        );
    }

    Ok(Box::new(io::Cursor::new(mmap)))
}

#[cfg(not(target_os = "macos"))]
fn open_mmap_file(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    let file = File::open(path)?;
    // SAFETY: the mapping is read-only and owned by the returned cursor.
    let mmap = unsafe { Mmap::map(&file)? };
    Ok(Box::new(io::Cursor::new(mmap)))
}

/// Buffered reader that decompresses gzip input on the fly
///
/// # Example
///
/// ```no_run
/// use kmerfeat::io::compression::{CompressedReader, DataSource};
/// use std::io::BufRead;
///
/// # fn main() -> kmerfeat::Result<()> {
/// let source = DataSource::from_path("genome.fna.gz");
/// let reader = CompressedReader::new(source)?;
/// for line in reader.lines() {
///     let _line = line?;
/// }
/// # Ok(())
/// # }
/// ```
pub struct CompressedReader {
    inner: Box<dyn BufRead + Send>,
    compressed: bool,
}

impl CompressedReader {
    /// Open a data source, decompressing it if it starts with the gzip magic
    pub fn new(source: DataSource) -> Result<Self> {
        let reader = source.open()?;
        Self::from_reader(reader)
    }

    /// Wrap an already opened reader, decompressing it if needed
    pub fn from_reader(mut reader: Box<dyn BufRead + Send>) -> Result<Self> {
        let compressed = reader.fill_buf()?.starts_with(&GZIP_MAGIC);
        let inner: Box<dyn BufRead + Send> = if compressed {
            Box::new(BufReader::new(MultiGzDecoder::new(reader)))
        } else {
            reader
        };
        Ok(Self { inner, compressed })
    }

    /// Whether the input was gzip compressed
    pub fn is_compressed(&self) -> bool {
        self.compressed
    }
}

impl Read for CompressedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl BufRead for CompressedReader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.inner.consume(amt)
    }
}
