use super::checksum::compute_checksum;
use super::error::LineError;
use super::layout;

/// One tokenized group line, alive only while its frame is assembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GroupLine<'a> {
    /// Stream offset of the line's first byte.
    pub position: u64,
    pub label: &'a str,
    pub value: &'a str,
    pub checksum: u8,
}

/// Split a raw line (delimiters already stripped) into label, value and
/// checksum character.
///
/// The checksum is the last byte. A single separator before it is optional;
/// label and value are split on the first separator. `position` is only
/// carried along for diagnostics.
pub(crate) fn tokenize(line: &[u8], position: u64) -> Result<GroupLine<'_>, LineError> {
    if line.is_empty() {
        return Err(LineError::Empty);
    }
    if line.len() > layout::MAX_LINE_LEN {
        return Err(LineError::TooLong {
            length: line.len(),
            max: layout::MAX_LINE_LEN,
        });
    }
    if let Some(&byte) = line.iter().find(|byte| !byte.is_ascii()) {
        return Err(LineError::NonAscii { byte });
    }

    let (&checksum, body) = line.split_last().ok_or(LineError::MissingChecksum)?;
    if body.is_empty() {
        return Err(LineError::MissingChecksum);
    }
    let separator = body
        .iter()
        .position(|&byte| byte == layout::SP)
        .ok_or(LineError::MissingSeparator)?;
    let body = body.strip_suffix(&[layout::SP]).unwrap_or(body);
    if separator == 0 {
        return Err(LineError::EmptyLabel);
    }

    let label = ascii_str(&body[..separator]);
    let value = body.get(separator + 1..).map(ascii_str).unwrap_or("");
    Ok(GroupLine {
        position,
        label,
        value,
        checksum,
    })
}

fn ascii_str(bytes: &[u8]) -> &str {
    // Callers only pass slices already checked to be ASCII.
    std::str::from_utf8(bytes).unwrap_or_default()
}

/// Encode one group line as `LF label SP value SP checksum CR`.
///
/// # Examples
/// ```
/// use teleinfo_core::encode_group_line;
///
/// assert_eq!(encode_group_line("ISOUSC", "30"), b"\nISOUSC 30 9\r".to_vec());
/// ```
pub fn encode_group_line(label: &str, value: &str) -> Vec<u8> {
    let mut line = Vec::with_capacity(label.len() + value.len() + 5);
    line.push(layout::LF);
    line.extend_from_slice(label.as_bytes());
    line.push(layout::SP);
    line.extend_from_slice(value.as_bytes());
    line.push(layout::SP);
    line.push(compute_checksum(label, value));
    line.push(layout::CR);
    line
}

/// Encode a whole frame: the given lines wrapped in `STX` / `ETX`.
pub fn encode_frame<'a, I>(lines: I) -> Vec<u8>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut frame = vec![layout::STX];
    for (label, value) in lines {
        frame.extend(encode_group_line(label, value));
    }
    frame.push(layout::ETX);
    frame
}
