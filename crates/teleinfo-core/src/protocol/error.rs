use thiserror::Error;

/// Line-level failures. The reader recovers from these locally by skipping
/// the line; they never escape a frame.
///
/// # Examples
/// ```
/// use teleinfo_core::LineError;
///
/// let err = LineError::MissingSeparator;
/// assert!(err.to_string().contains("separator"));
/// assert!(err.is_unreadable());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    #[error("line is empty")]
    Empty,
    #[error("line too long: {length} bytes (max {max})")]
    TooLong { length: usize, max: usize },
    #[error("line contains non-ASCII byte 0x{byte:02X}")]
    NonAscii { byte: u8 },
    #[error("line has no trailing checksum character")]
    MissingChecksum,
    #[error("line has no separator between label and value")]
    MissingSeparator,
    #[error("line has an empty label")]
    EmptyLabel,
    #[error("checksum mismatch on {label}: expected '{expected}', got '{actual}'")]
    ChecksumMismatch {
        label: String,
        expected: char,
        actual: char,
    },
}

impl LineError {
    /// Whether the line was structurally unreadable (as opposed to corrupted).
    pub fn is_unreadable(&self) -> bool {
        !matches!(self, LineError::ChecksumMismatch { .. })
    }
}

/// Field-level failures raised by the converter registry. A failing field is
/// dropped from its frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("unknown label: {label}")]
    UnknownLabel { label: String },
    #[error("{label}: '{value}' is not a decimal number")]
    NotNumeric { label: &'static str, value: String },
    #[error("{label}: '{value}' is not a known code")]
    UnknownCode { label: &'static str, value: String },
    #[error("{label}: '{value}' must be {min}..={max} characters")]
    InvalidLength {
        label: &'static str,
        value: String,
        min: usize,
        max: usize,
    },
    #[error("{label}: '{value}' is not a valid timestamp")]
    InvalidDate { label: &'static str, value: String },
}
