//! Frame stream reader: byte cursor, frame boundaries and per-line decoding.
//!
//! States: `SeekingStart -> ReadingLines -> FrameComplete -> SeekingStart`,
//! plus `Faulted` once the byte source fails. Line and field errors are
//! recovered here and only show up in [`ReaderStats`]; frame errors are
//! emitted as [`FrameEvent::Error`] and decoding carries on with the next
//! frame.

mod stream;

pub use stream::FrameReader;

use serde::{Deserialize, Serialize};

use crate::frame::{Frame, FrameError};
use crate::protocol::AdpsRepair;

/// Per-reader configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderOptions {
    /// Tolerate the known ADPS firmware checksum defect.
    #[serde(default)]
    pub auto_repair_adps: bool,
}

impl ReaderOptions {
    pub fn with_auto_repair_adps(mut self, enabled: bool) -> Self {
        self.auto_repair_adps = enabled;
        self
    }

    pub fn adps_repair(&self) -> AdpsRepair {
        AdpsRepair::from(self.auto_repair_adps)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    SeekingStart,
    ReadingLines,
    FrameComplete,
    Faulted,
}

/// One outcome of [`FrameReader::next_event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEvent {
    Frame(Frame),
    Error(FrameError),
}

impl FrameEvent {
    pub fn sequence(&self) -> u64 {
        match self {
            FrameEvent::Frame(frame) => frame.sequence(),
            FrameEvent::Error(err) => err.sequence(),
        }
    }

    pub fn frame(&self) -> Option<&Frame> {
        match self {
            FrameEvent::Frame(frame) => Some(frame),
            FrameEvent::Error(_) => None,
        }
    }

    pub fn into_result(self) -> Result<Frame, FrameError> {
        match self {
            FrameEvent::Frame(frame) => Ok(frame),
            FrameEvent::Error(err) => Err(err),
        }
    }
}

/// Counters kept by one reader instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderStats {
    pub bytes_read: u64,
    /// Bytes skipped while looking for a frame start.
    pub noise_bytes: u64,
    pub lines_total: u64,
    pub lines_unreadable: u64,
    pub checksum_mismatches: u64,
    pub adps_repairs: u64,
    pub unknown_labels: u64,
    pub conversion_failures: u64,
    pub duplicate_labels: u64,
    pub frames_decoded: u64,
    pub frames_rejected: u64,
    pub frames_interrupted: u64,
    /// Partial frames dropped because the source closed.
    pub frames_truncated: u64,
}
