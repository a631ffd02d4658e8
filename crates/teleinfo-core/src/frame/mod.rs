//! Decoded frames and their classification.
//!
//! A frame is built atomically by the assembler once a frame span ends and a
//! variant has been selected. It is immutable afterwards and handed to the
//! caller by value; the reader keeps no copy.

pub(crate) mod assembler;
pub mod variant;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fields::{Demain, FieldValue, Hhphc, Label, Optarif, Ptec, TempoProgramme};

pub use variant::{BillingOption, FrameVariant, MeterFamily};

/// Byte range `[start, end)` of a frame in the input stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteSpan {
    pub start: u64,
    pub end: u64,
}

impl ByteSpan {
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One classified meter transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    variant: FrameVariant,
    fields: BTreeMap<Label, FieldValue>,
    span: ByteSpan,
    sequence: u64,
    discarded: Vec<Label>,
}

impl Frame {
    pub(crate) fn new(
        variant: FrameVariant,
        fields: BTreeMap<Label, FieldValue>,
        span: ByteSpan,
        sequence: u64,
        discarded: Vec<Label>,
    ) -> Self {
        Self {
            variant,
            fields,
            span,
            sequence,
            discarded,
        }
    }

    pub fn variant(&self) -> FrameVariant {
        self.variant
    }

    pub fn fields(&self) -> &BTreeMap<Label, FieldValue> {
        &self.fields
    }

    pub fn into_fields(self) -> BTreeMap<Label, FieldValue> {
        self.fields
    }

    pub fn span(&self) -> ByteSpan {
        self.span
    }

    /// Position of this frame among the events emitted by its reader.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Labels that were decoded but belong to another variant.
    ///
    /// They cannot coexist with the selected variant on a healthy line, so a
    /// non-empty list usually points at stream corruption.
    pub fn discarded_labels(&self) -> &[Label] {
        &self.discarded
    }

    pub fn get(&self, label: Label) -> Option<&FieldValue> {
        self.fields.get(&label)
    }

    pub fn contains(&self, label: Label) -> bool {
        self.fields.contains_key(&label)
    }

    pub fn integer(&self, label: Label) -> Option<u32> {
        self.get(label).and_then(FieldValue::as_integer)
    }

    pub fn text(&self, label: Label) -> Option<&str> {
        self.get(label).and_then(FieldValue::as_text)
    }

    /// Subscriber identifier (`ADCO`), present on every variant.
    pub fn adco(&self) -> Option<&str> {
        self.text(Label::Adco)
    }

    pub fn ptec(&self) -> Option<Ptec> {
        match self.get(Label::Ptec)? {
            FieldValue::Ptec(ptec) => Some(*ptec),
            _ => None,
        }
    }

    pub fn hhphc(&self) -> Option<Hhphc> {
        match self.get(Label::Hhphc)? {
            FieldValue::Hhphc(hhphc) => Some(*hhphc),
            _ => None,
        }
    }

    pub fn demain(&self) -> Option<Demain> {
        match self.get(Label::Demain)? {
            FieldValue::Demain(demain) => Some(*demain),
            _ => None,
        }
    }

    pub fn optarif(&self) -> Option<Optarif> {
        match self.get(Label::Optarif)? {
            FieldValue::Optarif(optarif) => Some(*optarif),
            _ => None,
        }
    }

    /// Tempo programme announced through `OPTARIF BBRx`.
    pub fn tempo_programme(&self) -> Option<TempoProgramme> {
        match self.optarif()? {
            Optarif::Tempo(programme) => Some(programme),
            _ => None,
        }
    }
}

/// Frame-level failures, surfaced to the caller instead of ending the stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame #{sequence} at byte {} matches no known variant ({} labels decoded)", .span.start, .labels.len())]
    Unclassifiable {
        sequence: u64,
        span: ByteSpan,
        labels: Vec<Label>,
    },
    #[error("frame #{sequence} at byte {} was interrupted before its end marker", .span.start)]
    Interrupted { sequence: u64, span: ByteSpan },
}

impl FrameError {
    pub fn sequence(&self) -> u64 {
        match self {
            FrameError::Unclassifiable { sequence, .. }
            | FrameError::Interrupted { sequence, .. } => *sequence,
        }
    }

    pub fn span(&self) -> ByteSpan {
        match self {
            FrameError::Unclassifiable { span, .. } | FrameError::Interrupted { span, .. } => *span,
        }
    }

    /// Stable identifier used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            FrameError::Unclassifiable { .. } => "unclassifiable",
            FrameError::Interrupted { .. } => "interrupted",
        }
    }

    /// Labels successfully decoded before the frame was rejected.
    pub fn labels(&self) -> &[Label] {
        match self {
            FrameError::Unclassifiable { labels, .. } => labels,
            FrameError::Interrupted { .. } => &[],
        }
    }
}
