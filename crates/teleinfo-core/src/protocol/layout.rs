//! Control bytes and limits of the historic Teleinfo serial format.

pub const STX: u8 = 0x02;
pub const ETX: u8 = 0x03;
pub const EOT: u8 = 0x04;

pub const LF: u8 = 0x0A;
pub const CR: u8 = 0x0D;
pub const SP: u8 = 0x20;

/// Low bits of the byte sum kept by the checksum.
pub const CHECKSUM_MASK: u32 = 0x3F;
/// Offset added to the masked sum so the checksum stays printable.
pub const CHECKSUM_OFFSET: u8 = 0x20;

/// Label of the overcurrent alarm line affected by the firmware checksum defect.
pub const ADPS_LABEL: &str = "ADPS";

/// Longest group line (label, value and checksum, delimiters excluded).
pub const MAX_LINE_LEN: usize = 64;

/// Chunk size used when pulling bytes from an I/O source.
pub const SOURCE_BUFFER_SIZE: usize = 8 * 1024;
