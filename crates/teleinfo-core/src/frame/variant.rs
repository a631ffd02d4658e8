//! Frame variants: meter family crossed with billing option.
//!
//! Each variant owns a mandatory and an optional label set. Classification
//! tries variants from the largest mandatory set to the smallest, so a frame
//! matching several variants lands on the most specific one.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::fields::Label;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeterFamily {
    /// Single-phase electronic meter.
    Cbemm,
    /// Single-phase, later generation reporting apparent power.
    CbemmEvolutionIcc,
    /// Three-phase meter, regular frame.
    CbetmLong,
    /// Three-phase meter, short frame sent on per-phase overcurrent.
    CbetmShort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingOption {
    /// Flat rate.
    Base,
    /// Two-rate (peak / off-peak).
    Hc,
    /// Peak-erasure days.
    Ejp,
    /// Seasonal colour days.
    Tempo,
}

/// Closed set of frame layouts the assembler can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameVariant {
    Cbemm(BillingOption),
    CbemmEvolutionIcc(BillingOption),
    CbetmLong(BillingOption),
    CbetmShort,
}

const OPTIONS: [BillingOption; 4] = [
    BillingOption::Base,
    BillingOption::Hc,
    BillingOption::Ejp,
    BillingOption::Tempo,
];

const CBEMM_MANDATORY: &[Label] = &[
    Label::Adco,
    Label::Isousc,
    Label::Ptec,
    Label::Iinst,
    Label::Imax,
];
const CBEMM_EVOLUTION_ICC_MANDATORY: &[Label] = &[Label::Papp];
const SINGLE_PHASE_OPTIONAL: &[Label] = &[
    Label::Optarif,
    Label::Adps,
    Label::Hhphc,
    Label::Motdetat,
];

const CBETM_LONG_MANDATORY: &[Label] = &[
    Label::Adco,
    Label::Isousc,
    Label::Ptec,
    Label::Iinst1,
    Label::Iinst2,
    Label::Iinst3,
    Label::Imax1,
    Label::Imax2,
    Label::Imax3,
    Label::Pmax,
    Label::Papp,
    Label::Ppot,
];
const CBETM_LONG_OPTIONAL: &[Label] = &[Label::Optarif, Label::Hhphc, Label::Motdetat];

const CBETM_SHORT_MANDATORY: &[Label] = &[
    Label::Adco,
    Label::Iinst1,
    Label::Iinst2,
    Label::Iinst3,
    Label::Adir1,
    Label::Adir2,
    Label::Adir3,
];

const BASE_MANDATORY: &[Label] = &[Label::Base];
const HC_MANDATORY: &[Label] = &[Label::Hchc, Label::Hchp];
const EJP_MANDATORY: &[Label] = &[Label::Ejphn, Label::Ejphpm];
const EJP_OPTIONAL: &[Label] = &[Label::Pejp];
const TEMPO_MANDATORY: &[Label] = &[
    Label::Bbrhcjb,
    Label::Bbrhpjb,
    Label::Bbrhcjw,
    Label::Bbrhpjw,
    Label::Bbrhcjr,
    Label::Bbrhpjr,
];
const TEMPO_OPTIONAL: &[Label] = &[Label::Demain];

/// Labels accepted on every variant.
const ANY_VARIANT_OPTIONAL: &[Label] = &[Label::Date];

impl BillingOption {
    fn mandatory(self) -> &'static [Label] {
        match self {
            BillingOption::Base => BASE_MANDATORY,
            BillingOption::Hc => HC_MANDATORY,
            BillingOption::Ejp => EJP_MANDATORY,
            BillingOption::Tempo => TEMPO_MANDATORY,
        }
    }

    fn optional(self) -> &'static [Label] {
        match self {
            BillingOption::Base | BillingOption::Hc => &[],
            BillingOption::Ejp => EJP_OPTIONAL,
            BillingOption::Tempo => TEMPO_OPTIONAL,
        }
    }
}

impl FrameVariant {
    /// Every variant, in table order (ties in specificity keep this order).
    pub fn all() -> Vec<FrameVariant> {
        let mut variants = Vec::with_capacity(3 * OPTIONS.len() + 1);
        variants.extend(OPTIONS.iter().copied().map(FrameVariant::Cbemm));
        variants.extend(OPTIONS.iter().copied().map(FrameVariant::CbemmEvolutionIcc));
        variants.extend(OPTIONS.iter().copied().map(FrameVariant::CbetmLong));
        variants.push(FrameVariant::CbetmShort);
        variants
    }

    /// Variants ordered from most to least mandatory labels.
    pub fn by_specificity() -> &'static [FrameVariant] {
        &BY_SPECIFICITY
    }

    pub fn family(self) -> MeterFamily {
        match self {
            FrameVariant::Cbemm(_) => MeterFamily::Cbemm,
            FrameVariant::CbemmEvolutionIcc(_) => MeterFamily::CbemmEvolutionIcc,
            FrameVariant::CbetmLong(_) => MeterFamily::CbetmLong,
            FrameVariant::CbetmShort => MeterFamily::CbetmShort,
        }
    }

    pub fn option(self) -> Option<BillingOption> {
        match self {
            FrameVariant::Cbemm(option)
            | FrameVariant::CbemmEvolutionIcc(option)
            | FrameVariant::CbetmLong(option) => Some(option),
            FrameVariant::CbetmShort => None,
        }
    }

    fn mandatory_tables(self) -> [&'static [Label]; 3] {
        let option = self.option().map(BillingOption::mandatory).unwrap_or_default();
        match self {
            FrameVariant::Cbemm(_) => [CBEMM_MANDATORY, &[], option],
            FrameVariant::CbemmEvolutionIcc(_) => {
                [CBEMM_MANDATORY, CBEMM_EVOLUTION_ICC_MANDATORY, option]
            }
            FrameVariant::CbetmLong(_) => [CBETM_LONG_MANDATORY, &[], option],
            FrameVariant::CbetmShort => [CBETM_SHORT_MANDATORY, &[], &[]],
        }
    }

    fn optional_tables(self) -> [&'static [Label]; 3] {
        let family: &'static [Label] = match self {
            FrameVariant::Cbemm(_) | FrameVariant::CbemmEvolutionIcc(_) => SINGLE_PHASE_OPTIONAL,
            FrameVariant::CbetmLong(_) => CBETM_LONG_OPTIONAL,
            FrameVariant::CbetmShort => &[],
        };
        let option = self.option().map(BillingOption::optional).unwrap_or_default();
        [family, option, ANY_VARIANT_OPTIONAL]
    }

    pub fn mandatory_labels(self) -> BTreeSet<Label> {
        self.mandatory_tables().into_iter().flatten().copied().collect()
    }

    pub fn optional_labels(self) -> BTreeSet<Label> {
        self.optional_tables().into_iter().flatten().copied().collect()
    }

    /// Whether `label` may appear in a frame of this variant.
    pub fn accepts(self, label: Label) -> bool {
        self.mandatory_tables()
            .into_iter()
            .chain(self.optional_tables())
            .any(|table| table.contains(&label))
    }

    /// Pick the most specific variant whose mandatory labels are all observed.
    pub fn classify(observed: &BTreeSet<Label>) -> Option<FrameVariant> {
        BY_SPECIFICITY.iter().copied().find(|variant| {
            variant
                .mandatory_tables()
                .into_iter()
                .flatten()
                .all(|label| observed.contains(label))
        })
    }
}

// Mandatory set size descending, table order within a tie.
const BY_SPECIFICITY: [FrameVariant; 13] = [
    FrameVariant::CbetmLong(BillingOption::Tempo),
    FrameVariant::CbetmLong(BillingOption::Hc),
    FrameVariant::CbetmLong(BillingOption::Ejp),
    FrameVariant::CbetmLong(BillingOption::Base),
    FrameVariant::CbemmEvolutionIcc(BillingOption::Tempo),
    FrameVariant::Cbemm(BillingOption::Tempo),
    FrameVariant::CbemmEvolutionIcc(BillingOption::Hc),
    FrameVariant::CbemmEvolutionIcc(BillingOption::Ejp),
    FrameVariant::Cbemm(BillingOption::Hc),
    FrameVariant::Cbemm(BillingOption::Ejp),
    FrameVariant::CbemmEvolutionIcc(BillingOption::Base),
    FrameVariant::CbetmShort,
    FrameVariant::Cbemm(BillingOption::Base),
];

impl fmt::Display for MeterFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MeterFamily::Cbemm => "CBEMM",
            MeterFamily::CbemmEvolutionIcc => "CBEMM Evolution ICC",
            MeterFamily::CbetmLong => "CBETM (long frame)",
            MeterFamily::CbetmShort => "CBETM (short frame)",
        })
    }
}

impl fmt::Display for BillingOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BillingOption::Base => "BASE",
            BillingOption::Hc => "HC",
            BillingOption::Ejp => "EJP",
            BillingOption::Tempo => "TEMPO",
        })
    }
}

impl fmt::Display for FrameVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.option() {
            Some(option) => write!(f, "{} / {}", self.family(), option),
            None => write!(f, "{}", self.family()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::{BillingOption, FrameVariant, MeterFamily};
    use crate::fields::Label;

    fn labels(list: &[Label]) -> BTreeSet<Label> {
        list.iter().copied().collect()
    }

    #[test]
    fn table_has_thirteen_variants() {
        let all = FrameVariant::all();
        assert_eq!(all.len(), 13);
        let unique: std::collections::HashSet<_> = all.iter().collect();
        assert_eq!(unique.len(), 13);
    }

    #[test]
    fn specificity_order_is_non_increasing() {
        let ordered = FrameVariant::by_specificity();
        for pair in ordered.windows(2) {
            assert!(pair[0].mandatory_labels().len() >= pair[1].mandatory_labels().len());
        }
        assert_eq!(ordered[0], FrameVariant::CbetmLong(BillingOption::Tempo));
    }

    #[test]
    fn specificity_order_matches_stable_sort_of_table() {
        let mut sorted = FrameVariant::all();
        sorted.sort_by_key(|variant| std::cmp::Reverse(variant.mandatory_labels().len()));
        assert_eq!(FrameVariant::by_specificity(), sorted.as_slice());
    }

    #[test]
    fn hhphc_is_accepted_by_every_long_frame() {
        for variant in FrameVariant::all() {
            let expected = variant != FrameVariant::CbetmShort;
            assert_eq!(variant.accepts(Label::Hhphc), expected, "{variant}");
        }
    }

    #[test]
    fn accepts_agrees_with_label_sets() {
        for variant in FrameVariant::all() {
            let known = variant.mandatory_labels();
            let optional = variant.optional_labels();
            for label in [Label::Adco, Label::Papp, Label::Pejp, Label::Demain, Label::Date] {
                let expected = known.contains(&label) || optional.contains(&label);
                assert_eq!(variant.accepts(label), expected, "{variant} {label}");
            }
        }
    }

    #[test]
    fn mandatory_and_optional_sets_are_disjoint() {
        for variant in FrameVariant::all() {
            let mandatory = variant.mandatory_labels();
            let optional = variant.optional_labels();
            assert!(mandatory.is_disjoint(&optional), "{variant}");
        }
    }

    #[test]
    fn evolution_icc_wins_over_plain_cbemm() {
        let observed = labels(&[
            Label::Adco,
            Label::Isousc,
            Label::Base,
            Label::Ptec,
            Label::Iinst,
            Label::Imax,
            Label::Papp,
        ]);
        assert_eq!(
            FrameVariant::classify(&observed),
            Some(FrameVariant::CbemmEvolutionIcc(BillingOption::Base))
        );

        let mut without_papp = observed.clone();
        without_papp.remove(&Label::Papp);
        assert_eq!(
            FrameVariant::classify(&without_papp),
            Some(FrameVariant::Cbemm(BillingOption::Base))
        );
    }

    #[test]
    fn two_options_select_the_larger_mandatory_set() {
        let mut observed = FrameVariant::CbemmEvolutionIcc(BillingOption::Base).mandatory_labels();
        observed.extend(FrameVariant::CbemmEvolutionIcc(BillingOption::Hc).mandatory_labels());
        assert_eq!(
            FrameVariant::classify(&observed),
            Some(FrameVariant::CbemmEvolutionIcc(BillingOption::Hc))
        );
    }

    #[test]
    fn every_variant_classifies_its_own_mandatory_set() {
        for variant in FrameVariant::all() {
            assert_eq!(FrameVariant::classify(&variant.mandatory_labels()), Some(variant));
        }
    }

    #[test]
    fn incomplete_set_is_unclassifiable() {
        let observed = labels(&[Label::Adco, Label::Ptec, Label::Papp]);
        assert_eq!(FrameVariant::classify(&observed), None);
    }

    #[test]
    fn short_frame_has_no_option() {
        assert_eq!(FrameVariant::CbetmShort.option(), None);
        assert_eq!(FrameVariant::CbetmShort.family(), MeterFamily::CbetmShort);
        assert!(FrameVariant::CbetmShort.accepts(Label::Adir2));
        assert!(!FrameVariant::CbetmShort.accepts(Label::Papp));
    }
}
