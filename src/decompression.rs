use anyhow::{anyhow, Context, Result};
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Read};
use std::path::Path;

/// Read buffer used for every decoded stream
pub const READ_BUFFER_SIZE: usize = 256 * 1024;

/// Stream encoding recognised from its leading bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Gzip,
    Zstd,
    Plain,
}

/// Detect gzip (1F 8B 08) or zstd (28 B5 2F FD) from the first bytes of a stream
pub fn detect_compression(head: &[u8]) -> Compression {
    if head.len() >= 3 && head[..3] == [0x1F, 0x8B, 0x08] {
        Compression::Gzip
    } else if head.len() >= 4 && head[..4] == [0x28, 0xB5, 0x2F, 0xFD] {
        Compression::Zstd
    } else {
        Compression::Plain
    }
}

enum State<R> {
    /// Nothing read yet
    Pending(R),
    Ready(Box<dyn BufRead + Send>),
    /// Setting up the decoder failed; the error was already returned once
    Failed,
}

/// Buffered reader that transparently decodes gzip and zstd input.
///
/// The format is sniffed on the first read rather than at construction, so
/// wrapping a pipe or stdin never blocks the caller. That first read happens
/// on whichever thread consumes the stream.
pub struct DecompressionReader<R> {
    state: State<R>,
}

impl<R: Read + Send + 'static> DecompressionReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            state: State::Pending(reader),
        }
    }

    fn ready(&mut self) -> io::Result<&mut (dyn BufRead + Send)> {
        if matches!(self.state, State::Pending(_)) {
            if let State::Pending(reader) = std::mem::replace(&mut self.state, State::Failed) {
                self.state = State::Ready(open_stream(reader)?);
            }
        }
        match &mut self.state {
            State::Ready(reader) => Ok(reader.as_mut()),
            _ => Err(io::Error::new(
                io::ErrorKind::Other,
                "input could not be decoded",
            )),
        }
    }
}

impl DecompressionReader<File> {
    /// Open a file for reading. ZIP archives are rejected by extension since
    /// they cannot be decoded as a single stream.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        if let Some(extension) = path_ref.extension().and_then(|ext| ext.to_str()) {
            if extension.eq_ignore_ascii_case("zip") {
                return Err(anyhow!(
                    "ZIP file decompression is not supported. Only gzip and zstd files are supported for streaming decompression. Extract the ZIP file first: unzip {}",
                    path_ref.display()
                ));
            }
        }

        let file = File::open(path_ref)
            .with_context(|| format!("Failed to open input file '{}'", path_ref.display()))?;
        Ok(Self::new(file))
    }
}

/// Sniff the first bytes and build the matching decoder
fn open_stream<R: Read + Send + 'static>(mut reader: R) -> io::Result<Box<dyn BufRead + Send>> {
    let mut head = [0u8; 4];
    let mut filled = 0;
    // Pipes may hand over the magic bytes in pieces
    while filled < head.len() {
        match reader.read(&mut head[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    // Put the sniffed bytes back in front of the rest of the stream
    let chained = Cursor::new(head[..filled].to_vec()).chain(reader);

    Ok(match detect_compression(&head[..filled]) {
        Compression::Gzip => Box::new(BufReader::with_capacity(
            READ_BUFFER_SIZE,
            MultiGzDecoder::new(chained),
        )),
        Compression::Zstd => Box::new(BufReader::with_capacity(
            READ_BUFFER_SIZE,
            zstd::Decoder::new(chained)?,
        )),
        Compression::Plain => Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, chained)),
    })
}

impl<R> std::fmt::Debug for DecompressionReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            State::Pending(_) => "Pending",
            State::Ready(_) => "Ready",
            State::Failed => "Failed",
        };
        write!(f, "DecompressionReader::{}", state)
    }
}

impl<R: Read + Send + 'static> Read for DecompressionReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.ready()?.read(buf)
    }
}

impl<R: Read + Send + 'static> BufRead for DecompressionReader<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.ready()?.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        if let State::Ready(reader) = &mut self.state {
            reader.consume(amt);
        }
    }
}
