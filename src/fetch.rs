use std::io::{Cursor, Read, Seek, SeekFrom};

use futures::StreamExt;
use log::debug;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use zip::ZipArchive;

use crate::error::Result;
use crate::http::HttpClient;

/// Bodies are regrouped into pieces of this size before they reach the buffer.
pub const CHUNK_SIZE: usize = 1024 * 1024 * 10;

/// Where the downloaded bytes are kept until the caller consumes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchTarget {
    #[default]
    Memory,
    /// An anonymous temporary file, removed as soon as it is dropped.
    Spool,
}

enum Sink {
    Memory(Vec<u8>),
    Spool(File),
}

impl Sink {
    fn new(target: FetchTarget) -> Result<Self> {
        Ok(match target {
            FetchTarget::Memory => Self::Memory(Vec::new()),
            FetchTarget::Spool => Self::Spool(File::from_std(tempfile::tempfile()?)),
        })
    }

    async fn write(&mut self, chunk: &[u8]) -> Result<u64> {
        match self {
            Self::Memory(buffer) => buffer.extend_from_slice(chunk),
            Self::Spool(file) => file.write_all(chunk).await?,
        }
        Ok(chunk.len() as u64)
    }

    async fn finish(self) -> Result<Buffer> {
        Ok(match self {
            Self::Memory(buffer) => Buffer::Memory(buffer),
            Self::Spool(mut file) => {
                file.flush().await?;
                let mut file = file.into_std().await;
                file.seek(SeekFrom::Start(0))?;
                Buffer::Spooled(file)
            }
        })
    }
}

enum Buffer {
    Memory(Vec<u8>),
    Spooled(std::fs::File),
}

/// A completely downloaded body.
pub struct Fetched {
    buffer: Buffer,
    len: u64,
}

/// The first file stored in an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub data: Vec<u8>,
}

impl Fetched {
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_spooled(&self) -> bool {
        matches!(self.buffer, Buffer::Spooled(_))
    }

    /// The raw body, e.g. for direct CSV parsing.
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        match self.buffer {
            Buffer::Memory(bytes) => Ok(bytes),
            Buffer::Spooled(mut file) => {
                let mut bytes = Vec::with_capacity(self.len as usize);
                file.read_to_end(&mut bytes)?;
                Ok(bytes)
            }
        }
    }

    /// Opens the body as a zip archive and reads its first entry.
    pub fn first_entry(self) -> Result<ArchiveEntry> {
        match self.buffer {
            Buffer::Memory(bytes) => read_first_entry(Cursor::new(bytes)),
            Buffer::Spooled(file) => read_first_entry(file),
        }
    }
}

fn read_first_entry<R: Read + Seek>(reader: R) -> Result<ArchiveEntry> {
    let mut archive = ZipArchive::new(reader)?;
    let mut entry = archive.by_index(0)?;

    let mut data = Vec::new();
    entry.read_to_end(&mut data)?;

    Ok(ArchiveEntry {
        name: entry.name().to_string(),
        data,
    })
}

/// Streams `url` into `target` in [`CHUNK_SIZE`] pieces, reporting the running total after
/// each one. A failure anywhere in the stream fails the whole fetch.
pub(crate) async fn fetch(
    http: &dyn HttpClient,
    url: &str,
    target: FetchTarget,
    progress: &(dyn Fn(u64) + Sync),
) -> Result<Fetched> {
    let mut stream = http.get_stream(url).await?;
    let mut sink = Sink::new(target)?;
    let mut chunk: Vec<u8> = Vec::with_capacity(CHUNK_SIZE);
    let mut total = 0_u64;

    while let Some(piece) = stream.next().await {
        let piece = piece?;
        let mut rest = piece.as_slice();

        while !rest.is_empty() {
            let take = (CHUNK_SIZE - chunk.len()).min(rest.len());
            chunk.extend_from_slice(&rest[..take]);
            rest = &rest[take..];

            if chunk.len() == CHUNK_SIZE {
                total += sink.write(&chunk).await?;
                chunk.clear();
                debug!("{url}: {total} bytes");
                progress(total);
            }
        }
    }

    if !chunk.is_empty() {
        total += sink.write(&chunk).await?;
        progress(total);
    }

    debug!("{url}: finished with {total} bytes");
    Ok(Fetched {
        buffer: sink.finish().await?,
        len: total,
    })
}
