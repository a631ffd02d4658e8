//! Byte sources feeding the frame reader.
//!
//! The transport (serial port, capture file, socket) is owned by the caller;
//! the reader only pulls bytes one at a time through [`ByteSource`].

mod io;

pub use io::IoSource;

use thiserror::Error;

pub trait ByteSource {
    /// Next byte of the stream, or `None` once the source is closed.
    fn next_byte(&mut self) -> Result<Option<u8>, SourceError>;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn next_byte(&mut self) -> Result<Option<u8>, SourceError> {
        (**self).next_byte()
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
