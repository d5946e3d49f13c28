//! Dataset output: plain or gzip text to a file or stdout
//!
//! A [`DataSink`] names where lines go; a [`CompressedWriter`] owns the open
//! stream. Paths ending in `.gz` or `.gzip` are gzip compressed, everything
//! else (stdout included) is written as plain text.
//!
//! ```no_run
//! use kmerfeat::io::{CompressedWriter, DataSink};
//! use std::io::Write;
//!
//! # fn main() -> std::io::Result<()> {
//! let mut writer = CompressedWriter::new(DataSink::from_path("train.3r5r1.vw.gz"))?;
//! writer.write_all(b"1 | 0:2 1:1\n")?;
//! writer.finish()?;
//! # Ok(())
//! # }
//! ```

use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Where dataset lines are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSink {
    /// Local file, created or truncated on open
    Local(PathBuf),
    /// Standard output, never compressed
    Stdout,
}

impl DataSink {
    /// Sink writing to `path`
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        DataSink::Local(path.as_ref().to_path_buf())
    }

    /// Sink writing to standard output
    pub fn stdout() -> Self {
        DataSink::Stdout
    }

    /// `true` for local paths with a `.gz` or `.gzip` extension
    pub fn is_compressed(&self) -> bool {
        match self {
            DataSink::Local(path) => path
                .extension()
                .is_some_and(|ext| ext == "gz" || ext == "gzip"),
            DataSink::Stdout => false,
        }
    }

    fn open(&self) -> io::Result<Box<dyn Write>> {
        match self {
            DataSink::Local(path) => Ok(Box::new(File::create(path)?)),
            DataSink::Stdout => Ok(Box::new(io::stdout())),
        }
    }
}

enum Encoding {
    Plain(BufWriter<Box<dyn Write>>),
    Gzip(GzEncoder<BufWriter<Box<dyn Write>>>),
}

/// Buffered output stream, gzip compressed when the sink asks for it
///
/// Call [`CompressedWriter::finish`] to write the gzip trailer and surface
/// the final flush error. Dropping an unfinished writer only flushes.
pub struct CompressedWriter {
    encoding: Option<Encoding>,
}

impl CompressedWriter {
    /// Open `sink`, picking compression from its extension
    pub fn new(sink: DataSink) -> io::Result<Self> {
        let writer = sink.open()?;
        Ok(if sink.is_compressed() {
            Self::gzip(writer)
        } else {
            Self::plain(writer)
        })
    }

    /// Uncompressed writer over any output
    pub fn plain(writer: Box<dyn Write>) -> Self {
        Self {
            encoding: Some(Encoding::Plain(BufWriter::new(writer))),
        }
    }

    /// Gzip writer (default level 6) over any output
    pub fn gzip(writer: Box<dyn Write>) -> Self {
        let encoder = GzEncoder::new(BufWriter::new(writer), Compression::default());
        Self {
            encoding: Some(Encoding::Gzip(encoder)),
        }
    }

    /// Whether output is gzip compressed
    pub fn is_compressed(&self) -> bool {
        matches!(self.encoding, Some(Encoding::Gzip(_)))
    }

    /// Flush everything and close the compressed stream
    pub fn finish(mut self) -> io::Result<()> {
        match self.encoding.take() {
            Some(Encoding::Plain(mut writer)) => writer.flush(),
            Some(Encoding::Gzip(encoder)) => encoder.finish()?.flush(),
            None => Ok(()),
        }
    }

    fn active(&mut self) -> io::Result<&mut dyn Write> {
        match &mut self.encoding {
            Some(Encoding::Plain(writer)) => Ok(writer as &mut dyn Write),
            Some(Encoding::Gzip(encoder)) => Ok(encoder as &mut dyn Write),
            None => Err(io::Error::other("write after finish")),
        }
    }
}

impl Write for CompressedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.active()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.encoding {
            Some(_) => self.active()?.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for CompressedWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::MultiGzDecoder;
    use std::fs;
    use std::io::Read;
    use tempfile::TempDir;

    #[test]
    fn test_sink_compression_by_extension() {
        assert!(DataSink::from_path("train.vw.gz").is_compressed());
        assert!(DataSink::from_path("train.vw.gzip").is_compressed());
        assert!(!DataSink::from_path("train.vw").is_compressed());
        assert!(!DataSink::from_path("gz").is_compressed());
        assert!(!DataSink::stdout().is_compressed());
    }

    #[test]
    fn test_plain_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("train.vw");

        let mut writer = CompressedWriter::new(DataSink::from_path(&path)).unwrap();
        assert!(!writer.is_compressed());
        writer.write_all(b"1 | 0:1\n").unwrap();
        writer.finish().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "1 | 0:1\n");
    }

    #[test]
    fn test_gzip_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("train.vw.gz");
        let lines = "2 | 0:3 5:1\n".repeat(1000);

        let mut writer = CompressedWriter::new(DataSink::from_path(&path)).unwrap();
        assert!(writer.is_compressed());
        writer.write_all(lines.as_bytes()).unwrap();
        writer.finish().unwrap();

        let mut decoded = String::new();
        MultiGzDecoder::new(fs::File::open(&path).unwrap())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, lines);
    }

    #[test]
    fn test_drop_flushes_plain_output() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.vw");
        {
            let mut writer = CompressedWriter::new(DataSink::from_path(&path)).unwrap();
            writer.write_all(b"1 | 0:1\n").unwrap();
        }
        assert_eq!(fs::read_to_string(&path).unwrap(), "1 | 0:1\n");
    }

    #[test]
    fn test_unwritable_path() {
        let sink = DataSink::from_path("/nonexistent/dir/train.vw");
        assert!(CompressedWriter::new(sink).is_err());
    }
}
