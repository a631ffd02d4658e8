use std::path::Path;

use log::{info, warn};
use thiserror::Error;

use crate::reader::{FrameEvent, FrameReader, ReaderOptions};
use crate::source::{ByteSource, IoSource, SourceError};
use crate::{FrameErrorSummary, FrameSummary, Report, make_stub_report};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

/// Decode a raw capture file into a report.
pub fn decode_capture_file(path: &Path, options: ReaderOptions) -> Result<Report, AnalysisError> {
    let source = IoSource::open(path)?;
    decode_source(path, source, options)
}

/// Drain `source` into a report attributed to `path`.
///
/// A source failure aborts the report; frame errors are collected.
pub fn decode_source<S: ByteSource>(
    path: &Path,
    source: S,
    options: ReaderOptions,
) -> Result<Report, AnalysisError> {
    let mut reader = FrameReader::new(source, options);
    let mut frames = Vec::new();
    let mut errors = Vec::new();

    while let Some(event) = reader.next_event()? {
        match event {
            FrameEvent::Frame(frame) => {
                if !frame.discarded_labels().is_empty() {
                    warn!(
                        "frame #{} carries labels of another variant: {:?}",
                        frame.sequence(),
                        frame.discarded_labels()
                    );
                }
                frames.push(FrameSummary::from(&frame));
            }
            FrameEvent::Error(err) => errors.push(FrameErrorSummary::from(&err)),
        }
    }

    let stats = *reader.stats();
    info!(
        "{}: {} frames decoded, {} rejected, {} interrupted",
        path.display(),
        stats.frames_decoded,
        stats.frames_rejected,
        stats.frames_interrupted
    );

    let mut report = make_stub_report(&path.display().to_string(), stats.bytes_read, options);
    report.summary = stats;
    report.frames = frames;
    report.errors = errors;
    Ok(report)
}
