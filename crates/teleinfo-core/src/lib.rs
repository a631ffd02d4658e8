//! Teleinfo core library: decodes the historic "téléinformation client"
//! serial output of French electricity meters into typed frames.
//!
//! Bytes flow strictly upward: a [`ByteSource`] feeds the [`FrameReader`],
//! which finds frame boundaries, tokenizes group lines, validates their
//! checksums, converts values through the label registry and hands the
//! decoded fields to the assembler. The assembler classifies each frame
//! against the fixed variant table (meter family x billing option).
//! Everything below the reader is pure; I/O stays in `source`.
//!
//! Invariants:
//! - A field is either present with a value valid for its label or absent.
//! - Line and field errors never escape the reader; frame errors are
//!   emitted as values and never stop decoding.
//! - Readers share no state; each owns its cursor and partial frame.
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! use teleinfo_core::{ReaderOptions, decode_capture_file};
//!
//! let report = decode_capture_file(Path::new("capture.raw"), ReaderOptions::default())?;
//! println!("frames decoded: {}", report.summary.frames_decoded);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

mod analysis;
pub mod fields;
pub mod frame;
pub mod protocol;
mod reader;
mod source;

pub use analysis::{AnalysisError, decode_capture_file, decode_source};
pub use fields::{
    DecodeRule, Demain, FieldValue, Hhphc, Label, Optarif, ProgrammeCircuit1, ProgrammeCircuit2,
    Ptec, TempoProgramme, convert, convert_field, encode, rule_for,
};
pub use frame::{BillingOption, ByteSpan, Frame, FrameError, FrameVariant, MeterFamily};
pub use protocol::{
    AdpsRepair, ChecksumVerdict, ConversionError, LineError, compute_checksum, encode_frame,
    encode_group_line, validate_checksum, verify_checksum,
};
pub use reader::{FrameEvent, FrameReader, ReaderOptions, ReaderState, ReaderStats};
pub use source::{ByteSource, IoSource, SourceError};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;
/// Default timestamp used when the caller does not stamp the report.
pub const DEFAULT_GENERATED_AT: &str = "1970-01-01T00:00:00Z";

/// Decoding report for one capture, in stream order.
///
/// # Examples
/// ```
/// use teleinfo_core::{ReaderOptions, make_stub_report};
///
/// let report = make_stub_report("capture.raw", 123, ReaderOptions::default());
/// assert_eq!(report.report_version, teleinfo_core::REPORT_VERSION);
/// assert!(report.frames.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    pub tool: ToolInfo,
    /// RFC3339 timestamp representing the report generation time.
    pub generated_at: String,
    pub input: InputInfo,
    /// Options the reader ran with.
    pub options: ReaderOptions,
    /// Reader counters after the whole input was consumed.
    pub summary: ReaderStats,
    pub frames: Vec<FrameSummary>,
    pub errors: Vec<FrameErrorSummary>,
}

/// Tool metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

/// Input metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    /// Input path as provided to the decoder.
    pub path: String,
    /// Bytes consumed from the input.
    pub bytes: u64,
}

/// One decoded frame, with typed fields rendered as JSON.
///
/// Integer fields become JSON numbers; every other field becomes its display
/// string (`PTEC` -> `"TH"`, `DATE` -> `"2024-03-05T14:30:00"`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameSummary {
    pub sequence: u64,
    pub span: ByteSpan,
    pub family: MeterFamily,
    /// Billing option; absent for three-phase short frames.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option: Option<BillingOption>,
    pub fields: BTreeMap<String, serde_json::Value>,
    /// Labels dropped because they belong to another variant.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discarded_labels: Vec<String>,
}

/// One rejected frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameErrorSummary {
    pub sequence: u64,
    pub span: ByteSpan,
    /// Stable kind identifier (`unclassifiable`, `interrupted`).
    pub kind: String,
    pub message: String,
    /// Labels decoded before the frame was rejected.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

impl From<&Frame> for FrameSummary {
    fn from(frame: &Frame) -> Self {
        let variant = frame.variant();
        Self {
            sequence: frame.sequence(),
            span: frame.span(),
            family: variant.family(),
            option: variant.option(),
            fields: frame
                .fields()
                .iter()
                .map(|(label, value)| (label.to_string(), field_json(value)))
                .collect(),
            discarded_labels: frame
                .discarded_labels()
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

impl From<&FrameError> for FrameErrorSummary {
    fn from(err: &FrameError) -> Self {
        Self {
            sequence: err.sequence(),
            span: err.span(),
            kind: err.kind().to_string(),
            message: err.to_string(),
            labels: err.labels().iter().map(ToString::to_string).collect(),
        }
    }
}

fn field_json(value: &FieldValue) -> serde_json::Value {
    match value {
        FieldValue::Integer(number) => serde_json::Value::from(*number),
        other => serde_json::Value::String(other.to_string()),
    }
}

/// Build a report with base fields filled and empty results.
pub fn make_stub_report(input_path: &str, input_bytes: u64, options: ReaderOptions) -> Report {
    Report {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: "teleinfo".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        generated_at: DEFAULT_GENERATED_AT.to_string(),
        input: InputInfo {
            path: input_path.to_string(),
            bytes: input_bytes,
        },
        options,
        summary: ReaderStats::default(),
        frames: vec![],
        errors: vec![],
    }
}
