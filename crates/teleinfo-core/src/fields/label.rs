use std::fmt;
use std::str::FromStr;

use crate::protocol::error::ConversionError;

macro_rules! labels {
    ($($variant:ident => $text:literal,)+) => {
        /// Group-line labels of the historic Teleinfo vocabulary.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum Label {
            $($variant,)+
        }

        impl Label {
            pub const ALL: &'static [Label] = &[$(Label::$variant,)+];

            /// Wire text of the label.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Label::$variant => $text,)+
                }
            }
        }

        impl FromStr for Label {
            type Err = ConversionError;

            fn from_str(text: &str) -> Result<Self, Self::Err> {
                match text {
                    $($text => Ok(Label::$variant),)+
                    _ => Err(ConversionError::UnknownLabel {
                        label: text.to_string(),
                    }),
                }
            }
        }
    };
}

labels! {
    Adco => "ADCO",
    Optarif => "OPTARIF",
    Isousc => "ISOUSC",
    Base => "BASE",
    Hchc => "HCHC",
    Hchp => "HCHP",
    Ejphn => "EJPHN",
    Ejphpm => "EJPHPM",
    Bbrhcjb => "BBRHCJB",
    Bbrhpjb => "BBRHPJB",
    Bbrhcjw => "BBRHCJW",
    Bbrhpjw => "BBRHPJW",
    Bbrhcjr => "BBRHCJR",
    Bbrhpjr => "BBRHPJR",
    Pejp => "PEJP",
    Ptec => "PTEC",
    Demain => "DEMAIN",
    Iinst => "IINST",
    Iinst1 => "IINST1",
    Iinst2 => "IINST2",
    Iinst3 => "IINST3",
    Adps => "ADPS",
    Imax => "IMAX",
    Imax1 => "IMAX1",
    Imax2 => "IMAX2",
    Imax3 => "IMAX3",
    Adir1 => "ADIR1",
    Adir2 => "ADIR2",
    Adir3 => "ADIR3",
    Pmax => "PMAX",
    Papp => "PAPP",
    Hhphc => "HHPHC",
    Motdetat => "MOTDETAT",
    Ppot => "PPOT",
    Date => "DATE",
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
