use std::io::Read;
use std::path::Path;

use log::{debug, trace, warn};

use super::{FrameEvent, ReaderOptions, ReaderState, ReaderStats};
use crate::fields::{Label, convert};
use crate::frame::assembler::FrameAssembler;
use crate::frame::{ByteSpan, FrameError};
use crate::protocol::error::LineError;
use crate::protocol::layout;
use crate::protocol::line::tokenize;
use crate::protocol::{ChecksumVerdict, verify_checksum};
use crate::source::{ByteSource, IoSource, SourceError};

/// Decodes a Teleinfo byte stream into frames, one event per call.
///
/// # Examples
/// ```
/// use std::io::Cursor;
///
/// use teleinfo_core::{FrameEvent, FrameReader, ReaderOptions, encode_frame};
///
/// let bytes = encode_frame([
///     ("ADCO", "031762120162"),
///     ("ISOUSC", "30"),
///     ("BASE", "190575"),
///     ("PTEC", "TH.."),
///     ("IINST", "001"),
///     ("IMAX", "090"),
///     ("PAPP", "00270"),
/// ]);
/// let mut reader = FrameReader::from_reader(Cursor::new(bytes), ReaderOptions::default());
/// let event = reader.next_event()?.expect("one frame");
/// assert!(matches!(event, FrameEvent::Frame(_)));
/// assert!(reader.next_event()?.is_none());
/// # Ok::<(), teleinfo_core::SourceError>(())
/// ```
pub struct FrameReader<S> {
    source: S,
    options: ReaderOptions,
    state: ReaderState,
    position: u64,
    frame_start: u64,
    sequence: u64,
    line_start: u64,
    line: Vec<u8>,
    assembler: FrameAssembler,
    stats: ReaderStats,
}

impl FrameReader<IoSource<std::fs::File>> {
    /// Read frames from a raw capture file.
    pub fn open(path: &Path, options: ReaderOptions) -> Result<Self, SourceError> {
        Ok(Self::new(IoSource::open(path)?, options))
    }
}

impl<R: Read> FrameReader<IoSource<R>> {
    pub fn from_reader(reader: R, options: ReaderOptions) -> Self {
        Self::new(IoSource::new(reader), options)
    }
}

impl<S: ByteSource> FrameReader<S> {
    pub fn new(source: S, options: ReaderOptions) -> Self {
        Self {
            source,
            options,
            state: ReaderState::SeekingStart,
            position: 0,
            frame_start: 0,
            sequence: 0,
            line_start: 0,
            line: Vec::with_capacity(layout::MAX_LINE_LEN + 1),
            assembler: FrameAssembler::new(),
            stats: ReaderStats::default(),
        }
    }

    pub fn options(&self) -> ReaderOptions {
        self.options
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    pub fn stats(&self) -> &ReaderStats {
        &self.stats
    }

    /// Offset of the next byte to be read.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Read until the next frame or frame error.
    ///
    /// Returns `Ok(None)` at end of stream; a partially received frame is
    /// dropped. A source failure faults the reader: the error is returned
    /// once and every later call reports end of stream.
    pub fn next_event(&mut self) -> Result<Option<FrameEvent>, SourceError> {
        match self.state {
            ReaderState::Faulted => return Ok(None),
            ReaderState::FrameComplete => self.state = ReaderState::SeekingStart,
            ReaderState::SeekingStart | ReaderState::ReadingLines => {}
        }

        loop {
            let byte = match self.source.next_byte() {
                Ok(Some(byte)) => byte,
                Ok(None) => {
                    self.end_of_stream();
                    return Ok(None);
                }
                Err(err) => {
                    self.fault(&err);
                    return Err(err);
                }
            };
            let offset = self.position;
            self.position += 1;
            self.stats.bytes_read += 1;

            if let Some(event) = self.on_byte(byte, offset) {
                return Ok(Some(event));
            }
        }
    }

    fn on_byte(&mut self, byte: u8, offset: u64) -> Option<FrameEvent> {
        match self.state {
            ReaderState::SeekingStart => {
                if byte == layout::STX {
                    self.begin_frame(offset);
                } else {
                    self.stats.noise_bytes += 1;
                }
                None
            }
            ReaderState::ReadingLines => match byte {
                layout::STX => {
                    let event = self.interrupt(offset);
                    self.begin_frame(offset);
                    Some(event)
                }
                layout::EOT => {
                    let event = self.interrupt(offset + 1);
                    self.state = ReaderState::SeekingStart;
                    Some(event)
                }
                layout::ETX => {
                    self.flush_line();
                    self.state = ReaderState::FrameComplete;
                    Some(self.complete_frame(offset + 1))
                }
                layout::LF | layout::CR => {
                    self.flush_line();
                    None
                }
                _ => {
                    // One byte past the limit is enough for the tokenizer to
                    // reject the line.
                    if self.line.is_empty() {
                        self.line_start = offset;
                    }
                    if self.line.len() <= layout::MAX_LINE_LEN {
                        self.line.push(byte);
                    }
                    None
                }
            },
            ReaderState::FrameComplete | ReaderState::Faulted => None,
        }
    }

    fn begin_frame(&mut self, offset: u64) {
        trace!("frame start at byte {offset}");
        self.reset_frame();
        self.frame_start = offset;
        self.state = ReaderState::ReadingLines;
    }

    fn reset_frame(&mut self) {
        self.line.clear();
        self.assembler.clear();
    }

    fn next_sequence(&mut self) -> u64 {
        let sequence = self.sequence;
        self.sequence += 1;
        sequence
    }

    fn complete_frame(&mut self, end: u64) -> FrameEvent {
        let span = ByteSpan {
            start: self.frame_start,
            end,
        };
        let sequence = self.next_sequence();
        match self.assembler.finish(span, sequence) {
            Ok(frame) => {
                self.stats.frames_decoded += 1;
                debug!("frame #{sequence} decoded as {}", frame.variant());
                FrameEvent::Frame(frame)
            }
            Err(err) => {
                self.stats.frames_rejected += 1;
                warn!("{err}");
                FrameEvent::Error(err)
            }
        }
    }

    fn interrupt(&mut self, end: u64) -> FrameEvent {
        let span = ByteSpan {
            start: self.frame_start,
            end,
        };
        let sequence = self.next_sequence();
        self.reset_frame();
        self.stats.frames_interrupted += 1;
        let err = FrameError::Interrupted { sequence, span };
        warn!("{err}");
        FrameEvent::Error(err)
    }

    fn end_of_stream(&mut self) {
        if self.state == ReaderState::ReadingLines {
            debug!(
                "source closed mid-frame; dropping {} fields of the frame started at byte {}",
                self.assembler.len(),
                self.frame_start
            );
            self.stats.frames_truncated += 1;
        }
        self.reset_frame();
        self.state = ReaderState::SeekingStart;
    }

    fn fault(&mut self, err: &SourceError) {
        warn!("byte source failed at byte {}: {err}", self.position);
        self.reset_frame();
        self.state = ReaderState::Faulted;
    }

    fn flush_line(&mut self) {
        if self.line.is_empty() {
            return;
        }
        let line = std::mem::take(&mut self.line);
        self.stats.lines_total += 1;
        self.decode_line(&line);
        self.line = line;
        self.line.clear();
    }

    fn decode_line(&mut self, raw: &[u8]) {
        let group = match tokenize(raw, self.line_start) {
            Ok(group) => group,
            Err(err) => {
                self.stats.lines_unreadable += 1;
                debug!(
                    "skipping line {:?} at byte {}: {err}",
                    String::from_utf8_lossy(raw),
                    self.line_start
                );
                return;
            }
        };

        match verify_checksum(
            group.label,
            group.value,
            group.checksum,
            self.options.adps_repair(),
        ) {
            ChecksumVerdict::Valid => {}
            ChecksumVerdict::Repaired => {
                self.stats.adps_repairs += 1;
                warn!(
                    "accepted {} line at byte {} with the known firmware checksum defect",
                    group.label, group.position
                );
            }
            ChecksumVerdict::Mismatch { expected } => {
                self.stats.checksum_mismatches += 1;
                let err = LineError::ChecksumMismatch {
                    label: group.label.to_string(),
                    expected: char::from(expected),
                    actual: char::from(group.checksum),
                };
                debug!("skipping line at byte {}: {err}", group.position);
                return;
            }
        }

        let label: Label = match group.label.parse() {
            Ok(label) => label,
            Err(err) => {
                self.stats.unknown_labels += 1;
                debug!("skipping line at byte {}: {err}", group.position);
                return;
            }
        };
        match convert(label, group.value) {
            Ok(Some(value)) => {
                if self.assembler.push(label, value) {
                    self.stats.duplicate_labels += 1;
                    debug!("{label} repeated within one frame; keeping the latest value");
                }
            }
            Ok(None) => trace!("{label} not applicable"),
            Err(err) => {
                self.stats.conversion_failures += 1;
                debug!("dropping field at byte {}: {err}", group.position);
            }
        }
    }
}

impl<S: ByteSource> Iterator for FrameReader<S> {
    type Item = Result<FrameEvent, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event().transpose()
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor, Read};

    use super::FrameReader;
    use crate::fields::{FieldValue, Label};
    use crate::frame::{BillingOption, FrameError, FrameVariant};
    use crate::protocol::{encode_frame, encode_group_line, layout};
    use crate::reader::{FrameEvent, ReaderOptions, ReaderState};
    use crate::source::{IoSource, SourceError};

    const BASE_LINES: [(&str, &str); 7] = [
        ("ADCO", "031762120162"),
        ("ISOUSC", "30"),
        ("BASE", "190575"),
        ("PTEC", "TH.."),
        ("IINST", "001"),
        ("IMAX", "090"),
        ("PAPP", "00270"),
    ];

    fn reader(bytes: Vec<u8>) -> FrameReader<IoSource<Cursor<Vec<u8>>>> {
        FrameReader::from_reader(Cursor::new(bytes), ReaderOptions::default())
    }

    /// Serves its bytes, then fails like a serial port that went away.
    struct Unplugged {
        data: Cursor<Vec<u8>>,
    }

    impl Read for Unplugged {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.data.read(buf)? {
                0 => Err(io::Error::new(io::ErrorKind::BrokenPipe, "serial port closed")),
                count => Ok(count),
            }
        }
    }

    #[test]
    fn skips_noise_before_start() {
        let mut bytes = b"\x00garbage\r\n".to_vec();
        bytes.extend(encode_frame(BASE_LINES));
        let mut reader = reader(bytes);
        let frame = reader.next_event().unwrap().unwrap().into_result().unwrap();
        assert_eq!(frame.span().start, 10);
        assert_eq!(reader.stats().noise_bytes, 10);
        assert_eq!(reader.state(), ReaderState::FrameComplete);
        assert!(reader.next_event().unwrap().is_none());
        assert_eq!(reader.state(), ReaderState::SeekingStart);
    }

    #[test]
    fn unreadable_line_does_not_break_frame() {
        let mut bytes = vec![layout::STX];
        for (label, value) in BASE_LINES {
            bytes.extend(encode_group_line(label, value));
        }
        bytes.extend(b"\nNOSEPARATOR\r");
        bytes.push(layout::ETX);
        let mut reader = reader(bytes);
        let frame = reader.next_event().unwrap().unwrap().into_result().unwrap();
        assert_eq!(frame.fields().len(), 7);
        assert_eq!(reader.stats().lines_unreadable, 1);
        assert_eq!(reader.stats().lines_total, 8);
    }

    #[test]
    fn unknown_labels_are_skipped() {
        let mut lines = BASE_LINES.to_vec();
        lines.push(("GAZ", "001"));
        let mut reader = reader(encode_frame(lines));
        let frame = reader.next_event().unwrap().unwrap().into_result().unwrap();
        assert_eq!(frame.fields().len(), 7);
        assert_eq!(reader.stats().unknown_labels, 1);
    }

    #[test]
    fn eot_interrupts_frame() {
        let mut bytes = vec![layout::STX];
        bytes.extend(encode_group_line("ADCO", "031762120162"));
        bytes.push(layout::EOT);
        bytes.extend(encode_frame(BASE_LINES));
        let eot_end = 1 + encode_group_line("ADCO", "031762120162").len() as u64 + 1;

        let mut reader = reader(bytes);
        let first = reader.next_event().unwrap().unwrap();
        match first {
            FrameEvent::Error(FrameError::Interrupted { sequence, span }) => {
                assert_eq!(sequence, 0);
                assert_eq!(span.start, 0);
                assert_eq!(span.end, eot_end);
            }
            other => panic!("expected interruption, got {other:?}"),
        }
        let second = reader.next_event().unwrap().unwrap();
        assert_eq!(second.sequence(), 1);
        assert_eq!(
            second.frame().map(|frame| frame.variant()),
            Some(FrameVariant::CbemmEvolutionIcc(BillingOption::Base))
        );
    }

    #[test]
    fn new_start_marker_restarts_frame() {
        let mut bytes = vec![layout::STX];
        bytes.extend(encode_group_line("ADCO", "031762120162"));
        let restart = bytes.len() as u64;
        bytes.extend(encode_frame(BASE_LINES));

        let mut reader = reader(bytes);
        let first = reader.next_event().unwrap().unwrap();
        assert!(matches!(first, FrameEvent::Error(FrameError::Interrupted { .. })));
        let frame = reader.next_event().unwrap().unwrap().into_result().unwrap();
        assert_eq!(frame.span().start, restart);
        assert_eq!(reader.stats().frames_interrupted, 1);
    }

    #[test]
    fn iterator_yields_events_in_order() {
        let mut bytes = encode_frame(BASE_LINES);
        bytes.extend(encode_frame([("ADCO", "031762120162")]));
        bytes.extend(encode_frame(BASE_LINES));
        let events: Vec<_> = reader(bytes).map(Result::unwrap).collect();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[1], FrameEvent::Error(FrameError::Unclassifiable { .. })));
        let sequences: Vec<u64> = events.iter().map(FrameEvent::sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2]);
    }

    #[test]
    fn integer_fields_are_typed() {
        let mut reader = reader(encode_frame(BASE_LINES));
        let frame = reader.next_event().unwrap().unwrap().into_result().unwrap();
        assert_eq!(frame.get(Label::Imax), Some(&FieldValue::Integer(90)));
        assert_eq!(frame.integer(Label::Isousc), Some(30));
    }

    #[test]
    fn source_failure_faults_the_reader() {
        let mut bytes = vec![layout::STX];
        for (label, value) in &BASE_LINES[..3] {
            bytes.extend(encode_group_line(label, value));
        }
        let mut reader = FrameReader::from_reader(
            Unplugged {
                data: Cursor::new(bytes),
            },
            ReaderOptions::default(),
        );

        assert!(matches!(reader.next_event(), Err(SourceError::Io(_))));
        assert_eq!(reader.state(), ReaderState::Faulted);
        assert!(reader.next_event().unwrap().is_none());
        assert!(reader.next_event().unwrap().is_none());
        assert!(reader.next().is_none());
        assert_eq!(reader.state(), ReaderState::Faulted);

        let stats = reader.stats();
        assert_eq!(stats.lines_total, 3);
        assert_eq!(stats.frames_decoded, 0);
        assert_eq!(stats.frames_rejected, 0);
        assert_eq!(stats.frames_interrupted, 0);
        assert_eq!(stats.frames_truncated, 0);
    }

    #[test]
    fn line_start_tracks_first_byte_of_line() {
        let first = encode_group_line("ADCO", "031762120162");
        let mut bytes = vec![layout::STX];
        bytes.extend(&first);
        bytes.extend(encode_group_line("ISOUSC", "30"));

        let mut reader = reader(bytes);
        assert!(reader.next_event().unwrap().is_none());
        // STX, then the first line, then the LF opening the second one.
        assert_eq!(reader.line_start, 1 + first.len() as u64 + 1);
    }
}
