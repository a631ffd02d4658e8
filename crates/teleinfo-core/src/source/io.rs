use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use super::{ByteSource, SourceError};
use crate::protocol::layout;

/// Buffered [`ByteSource`] over any [`Read`] implementation.
pub struct IoSource<R> {
    inner: R,
    buffer: Box<[u8]>,
    pos: usize,
    filled: usize,
    closed: bool,
}

impl IoSource<File> {
    /// Open a raw capture file (bytes exactly as sent on the serial line).
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        Ok(Self::new(file))
    }
}

impl<R: Read> IoSource<R> {
    pub fn new(inner: R) -> Self {
        Self::with_capacity(layout::SOURCE_BUFFER_SIZE, inner)
    }

    pub fn with_capacity(capacity: usize, inner: R) -> Self {
        Self {
            inner,
            buffer: vec![0u8; capacity.max(1)].into_boxed_slice(),
            pos: 0,
            filled: 0,
            closed: false,
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn refill(&mut self) -> Result<(), SourceError> {
        loop {
            match self.inner.read(&mut self.buffer) {
                Ok(0) => {
                    self.closed = true;
                    return Ok(());
                }
                Ok(count) => {
                    self.pos = 0;
                    self.filled = count;
                    return Ok(());
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(SourceError::Io(err)),
            }
        }
    }
}

impl<R: Read> ByteSource for IoSource<R> {
    fn next_byte(&mut self) -> Result<Option<u8>, SourceError> {
        if self.pos == self.filled {
            if self.closed {
                return Ok(None);
            }
            self.refill()?;
            if self.closed {
                return Ok(None);
            }
        }
        let byte = self.buffer[self.pos];
        self.pos += 1;
        Ok(Some(byte))
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor, Read};

    use super::IoSource;
    use crate::source::{ByteSource, SourceError};

    fn drain<S: ByteSource>(source: &mut S) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(byte) = source.next_byte().unwrap() {
            out.push(byte);
        }
        out
    }

    #[test]
    fn reads_across_buffer_boundaries() {
        let data: Vec<u8> = (0..=255).collect();
        let mut source = IoSource::with_capacity(7, Cursor::new(data.clone()));
        assert_eq!(drain(&mut source), data);
        assert!(source.next_byte().unwrap().is_none());
    }

    struct Flaky {
        interrupted: bool,
        data: Cursor<Vec<u8>>,
    }

    impl Read for Flaky {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::Error::new(io::ErrorKind::Interrupted, "signal"));
            }
            self.data.read(buf)
        }
    }

    #[test]
    fn retries_interrupted_reads() {
        let mut source = IoSource::new(Flaky {
            interrupted: false,
            data: Cursor::new(b"abc".to_vec()),
        });
        assert_eq!(drain(&mut source), b"abc");
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"))
        }
    }

    #[test]
    fn surfaces_io_failures() {
        let mut source = IoSource::new(Broken);
        let err = source.next_byte().unwrap_err();
        assert!(matches!(err, SourceError::Io(_)));
    }
}
