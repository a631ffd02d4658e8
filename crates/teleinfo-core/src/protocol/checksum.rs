use serde::{Deserialize, Serialize};

use super::layout;

/// Whether the known ADPS firmware checksum defect is tolerated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdpsRepair {
    #[default]
    Disabled,
    Enabled,
}

impl From<bool> for AdpsRepair {
    fn from(enabled: bool) -> Self {
        if enabled {
            AdpsRepair::Enabled
        } else {
            AdpsRepair::Disabled
        }
    }
}

/// Outcome of checking one group line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumVerdict {
    Valid,
    /// Accepted only because the ADPS defect is tolerated.
    Repaired,
    Mismatch { expected: u8 },
}

/// Compute the checksum character of `label SP value`.
///
/// # Examples
/// ```
/// use teleinfo_core::compute_checksum;
///
/// assert_eq!(compute_checksum("ISOUSC", "30"), b'9');
/// ```
pub fn compute_checksum(label: &str, value: &str) -> u8 {
    masked(byte_sum(label, value))
}

/// Validate a received checksum character against `label SP value`.
///
/// Returns `false` on mismatch. With [`AdpsRepair::Enabled`], an `ADPS` line
/// carrying the checksum produced by the defective firmware is accepted too.
///
/// # Examples
/// ```
/// use teleinfo_core::{AdpsRepair, validate_checksum};
///
/// assert!(validate_checksum("ISOUSC", "30", b'9', AdpsRepair::Disabled));
/// assert!(!validate_checksum("ISOUSC", "31", b'9', AdpsRepair::Disabled));
/// ```
pub fn validate_checksum(label: &str, value: &str, received: u8, repair: AdpsRepair) -> bool {
    !matches!(
        verify_checksum(label, value, received, repair),
        ChecksumVerdict::Mismatch { .. }
    )
}

/// Same check as [`validate_checksum`], reporting how the line was accepted.
pub fn verify_checksum(
    label: &str,
    value: &str,
    received: u8,
    repair: AdpsRepair,
) -> ChecksumVerdict {
    let sum = byte_sum(label, value);
    let expected = masked(sum);
    if received == expected {
        return ChecksumVerdict::Valid;
    }
    if repair == AdpsRepair::Enabled
        && label == layout::ADPS_LABEL
        && received == adps_firmware_checksum(sum)
    {
        return ChecksumVerdict::Repaired;
    }
    ChecksumVerdict::Mismatch { expected }
}

/// Checksum sent by the defective firmware: one is added to the byte sum
/// before masking.
///
/// Still to be checked against a captured frame whose ADPS group line carries
/// the defective checksum (`invalid-adps-groupline`).
fn adps_firmware_checksum(sum: u32) -> u8 {
    masked(sum.wrapping_add(1))
}

fn byte_sum(label: &str, value: &str) -> u32 {
    label
        .bytes()
        .chain(std::iter::once(layout::SP))
        .chain(value.bytes())
        .fold(0u32, |acc, byte| acc.wrapping_add(u32::from(byte)))
}

fn masked(sum: u32) -> u8 {
    (sum & layout::CHECKSUM_MASK) as u8 + layout::CHECKSUM_OFFSET
}
