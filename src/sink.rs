use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// A byte-consuming capability the raw writer streams GIF bytes into.
///
/// A blanket impl covers any [`std::io::Write`], so callers can hand in a
/// `File`, a `Vec<u8>`, a `BufWriter`, or a socket without an adapter.
pub trait WriteSink {
    fn write_bytes(&mut self, data: &[u8]) -> io::Result<()>;

    /// Flush and release any OS-level resource. Default no-op for in-memory sinks.
    fn close_sink(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<T: Write> WriteSink for T {
    fn write_bytes(&mut self, data: &[u8]) -> io::Result<()> {
        self.write_all(data)
    }

    fn close_sink(&mut self) -> io::Result<()> {
        self.flush()
    }
}

/// Opens `path` for writing, wrapped in a `BufWriter` since the raw writer
/// emits many small chunks (sub-blocks are at most 255 bytes).
pub fn file_sink(path: impl AsRef<Path>) -> io::Result<BufWriter<File>> {
    Ok(BufWriter::new(File::create(path)?))
}
