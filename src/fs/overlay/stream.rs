//! Read-only content streams returned by `open`

use bytes::Bytes;
use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom};

enum StreamSource {
    /// Embedded resource content shared with its bundle
    Embedded(Cursor<Bytes>),
    /// File opened by the base provider
    File { file: File, len: u64 },
}

/// A read-only, seekable stream over one file's content
///
/// Each call to `open` produces an independent stream; dropping it releases
/// the underlying handle.
pub struct ResourceStream {
    source: StreamSource,
}

impl ResourceStream {
    /// Stream over embedded bytes
    pub fn embedded(content: Bytes) -> Self {
        Self {
            source: StreamSource::Embedded(Cursor::new(content)),
        }
    }

    /// Stream over an open file
    pub fn file(file: File) -> io::Result<Self> {
        let len = file.metadata()?.len();
        Ok(Self {
            source: StreamSource::File { file, len },
        })
    }

    /// Total length of the content in bytes
    pub fn len(&self) -> u64 {
        match &self.source {
            StreamSource::Embedded(cursor) => cursor.get_ref().len() as u64,
            StreamSource::File { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when the content comes from a source bundle
    pub fn is_embedded(&self) -> bool {
        matches!(self.source, StreamSource::Embedded(_))
    }

    /// Read the remaining content into a buffer
    pub fn read_all(&mut self) -> io::Result<Vec<u8>> {
        let mut buffer = Vec::with_capacity(self.len() as usize);
        self.read_to_end(&mut buffer)?;
        Ok(buffer)
    }
}

impl Read for ResourceStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.source {
            StreamSource::Embedded(cursor) => cursor.read(buf),
            StreamSource::File { file, .. } => file.read(buf),
        }
    }
}

impl Seek for ResourceStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match &mut self.source {
            StreamSource::Embedded(cursor) => cursor.seek(pos),
            StreamSource::File { file, .. } => file.seek(pos),
        }
    }
}

impl std::fmt::Debug for ResourceStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceStream")
            .field("embedded", &self.is_embedded())
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_embedded_stream() {
        let mut stream = ResourceStream::embedded(Bytes::from_static(b"hello world"));
        assert!(stream.is_embedded());
        assert_eq!(stream.len(), 11);

        stream.seek(SeekFrom::Start(6)).unwrap();
        assert_eq!(stream.read_all().unwrap(), b"world");
    }

    #[test]
    fn test_streams_are_independent() {
        let content = Bytes::from_static(b"abcdef");
        let mut first = ResourceStream::embedded(content.clone());
        let mut second = ResourceStream::embedded(content);

        let mut buf = [0u8; 3];
        first.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"abc");
        assert_eq!(second.read_all().unwrap(), b"abcdef");
    }

    #[test]
    fn test_file_stream() {
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(b"on disk").unwrap();
        file.seek(SeekFrom::Start(0)).unwrap();

        let mut stream = ResourceStream::file(file).unwrap();
        assert!(!stream.is_embedded());
        assert_eq!(stream.len(), 7);
        assert_eq!(stream.read_all().unwrap(), b"on disk");
    }
}
