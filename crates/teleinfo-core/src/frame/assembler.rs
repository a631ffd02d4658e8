use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use super::variant::FrameVariant;
use super::{ByteSpan, Frame, FrameError};
use crate::fields::{FieldValue, Label};

/// Accumulates the fields decoded within one frame span.
#[derive(Debug, Default)]
pub(crate) struct FrameAssembler {
    fields: BTreeMap<Label, FieldValue>,
}

impl FrameAssembler {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record a decoded field. A repeated label keeps the latest value and
    /// returns `true`.
    pub(crate) fn push(&mut self, label: Label, value: FieldValue) -> bool {
        self.fields.insert(label, value).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.fields.len()
    }

    pub(crate) fn clear(&mut self) {
        self.fields.clear();
    }

    /// Classify the accumulated fields and build the frame, leaving the
    /// assembler empty either way.
    pub(crate) fn finish(&mut self, span: ByteSpan, sequence: u64) -> Result<Frame, FrameError> {
        let fields = std::mem::take(&mut self.fields);
        let observed: BTreeSet<Label> = fields.keys().copied().collect();

        let Some(variant) = FrameVariant::classify(&observed) else {
            return Err(FrameError::Unclassifiable {
                sequence,
                span,
                labels: observed.into_iter().collect(),
            });
        };

        let (kept, foreign): (BTreeMap<_, _>, BTreeMap<_, _>) = fields
            .into_iter()
            .partition(|(label, _)| variant.accepts(*label));
        let discarded: Vec<Label> = foreign.into_keys().collect();
        if !discarded.is_empty() {
            debug!("frame #{sequence} classified as {variant}; dropping {discarded:?}");
        }

        Ok(Frame::new(variant, kept, span, sequence, discarded))
    }
}
