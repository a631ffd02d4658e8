//! Group-line level of the Teleinfo protocol.
//!
//! - `layout`: control bytes and limits (source of truth)
//! - `line`: tokenizer and encoder for single group lines
//! - `checksum`: checksum computation and the ADPS repair rule
//! - `error`: line and field errors
//!
//! Everything here is pure and byte-oriented; stream handling lives in the
//! reader.

pub mod checksum;
pub mod error;
pub mod layout;
pub(crate) mod line;

pub use checksum::{
    AdpsRepair, ChecksumVerdict, compute_checksum, validate_checksum, verify_checksum,
};
pub use error::{ConversionError, LineError};
pub use line::{encode_frame, encode_group_line};
