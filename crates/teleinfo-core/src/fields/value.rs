use std::fmt;

use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

/// Closed code tables: one enum per label family, each with its wire code.
macro_rules! code_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $code:literal,)+ }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            pub fn from_code(code: &str) -> Option<Self> {
                match code {
                    $($code => Some($name::$variant),)+
                    _ => None,
                }
            }

            pub fn code(self) -> &'static str {
                match self {
                    $($name::$variant => $code,)+
                }
            }
        }
    };
}

code_enum! {
    /// Current tariff period.
    Ptec {
        Th => "TH..",
        Hc => "HC..",
        Hp => "HP..",
        Hn => "HN..",
        Pm => "PM..",
        Hcjb => "HCJB",
        Hcjw => "HCJW",
        Hcjr => "HCJR",
        Hpjb => "HPJB",
        Hpjw => "HPJW",
        Hpjr => "HPJR",
    }
}

code_enum! {
    /// Day-ahead colour of the seasonal-colour option.
    Demain {
        Bleu => "BLEU",
        Blanc => "BLAN",
        Rouge => "ROUG",
    }
}

code_enum! {
    /// Peak/off-peak schedule group.
    Hhphc {
        A => "A",
        C => "C",
        D => "D",
        E => "E",
        Y => "Y",
    }
}

impl Ptec {
    /// Short name with the padding dots removed (`TH..` -> `TH`).
    pub fn name(self) -> &'static str {
        self.code().trim_end_matches('.')
    }
}

/// Programme of the first controlled circuit (Tempo option).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProgrammeCircuit1 {
    A,
    B,
    C,
}

/// Programme of the second controlled circuit (Tempo option).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProgrammeCircuit2 {
    P0,
    P1,
    P2,
    P3,
    P4,
    P5,
    P6,
    P7,
}

impl ProgrammeCircuit2 {
    const ALL: [ProgrammeCircuit2; 8] = [
        ProgrammeCircuit2::P0,
        ProgrammeCircuit2::P1,
        ProgrammeCircuit2::P2,
        ProgrammeCircuit2::P3,
        ProgrammeCircuit2::P4,
        ProgrammeCircuit2::P5,
        ProgrammeCircuit2::P6,
        ProgrammeCircuit2::P7,
    ];
}

/// Tempo programme byte carried by `OPTARIF BBRx`.
///
/// Only `0x40..=0x5F` is valid: bits 0-1 select circuit 1 (`00` is
/// invalid), bits 2-4 select circuit 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TempoProgramme {
    pub circuit1: ProgrammeCircuit1,
    pub circuit2: ProgrammeCircuit2,
}

impl TempoProgramme {
    const BASE: u8 = 0x40;

    pub fn from_byte(byte: u8) -> Option<Self> {
        if !(Self::BASE..=Self::BASE | 0x1F).contains(&byte) {
            return None;
        }
        let circuit1 = match byte & 0x03 {
            0b01 => ProgrammeCircuit1::A,
            0b10 => ProgrammeCircuit1::B,
            0b11 => ProgrammeCircuit1::C,
            _ => return None,
        };
        let circuit2 = ProgrammeCircuit2::ALL[usize::from((byte >> 2) & 0x07)];
        Some(Self { circuit1, circuit2 })
    }

    pub fn to_byte(self) -> u8 {
        let circuit1 = match self.circuit1 {
            ProgrammeCircuit1::A => 0b01,
            ProgrammeCircuit1::B => 0b10,
            ProgrammeCircuit1::C => 0b11,
        };
        let circuit2 = self.circuit2 as u8;
        Self::BASE | (circuit2 << 2) | circuit1
    }
}

/// Subscribed billing option as announced by `OPTARIF`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Optarif {
    Base,
    Hc,
    Ejp,
    Tempo(TempoProgramme),
}

impl Optarif {
    const TEMPO_PREFIX: &'static str = "BBR";

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "BASE" => Some(Optarif::Base),
            "HC.." => Some(Optarif::Hc),
            "EJP." => Some(Optarif::Ejp),
            _ => match code.strip_prefix(Self::TEMPO_PREFIX)?.as_bytes() {
                [byte] => TempoProgramme::from_byte(*byte).map(Optarif::Tempo),
                _ => None,
            },
        }
    }

    pub fn code(self) -> String {
        match self {
            Optarif::Base => "BASE".to_string(),
            Optarif::Hc => "HC..".to_string(),
            Optarif::Ejp => "EJP.".to_string(),
            Optarif::Tempo(programme) => {
                format!("{}{}", Self::TEMPO_PREFIX, programme.to_byte() as char)
            }
        }
    }
}

/// A successfully decoded field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Integer(u32),
    Ptec(Ptec),
    Demain(Demain),
    Hhphc(Hhphc),
    Optarif(Optarif),
    Date(PrimitiveDateTime),
    Text(String),
}

impl FieldValue {
    pub fn as_integer(&self) -> Option<u32> {
        match self {
            FieldValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(value) => write!(f, "{value}"),
            FieldValue::Ptec(ptec) => f.write_str(ptec.name()),
            FieldValue::Demain(demain) => f.write_str(demain.code()),
            FieldValue::Hhphc(hhphc) => f.write_str(hhphc.code()),
            FieldValue::Optarif(Optarif::Base) => f.write_str("BASE"),
            FieldValue::Optarif(Optarif::Hc) => f.write_str("HC"),
            FieldValue::Optarif(Optarif::Ejp) => f.write_str("EJP"),
            FieldValue::Optarif(Optarif::Tempo(programme)) => {
                write!(f, "TEMPO-{:?}-{:?}", programme.circuit1, programme.circuit2)
            }
            FieldValue::Date(date) => write!(
                f,
                "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
                date.year(),
                u8::from(date.month()),
                date.day(),
                date.hour(),
                date.minute(),
                date.second()
            ),
            FieldValue::Text(value) => f.write_str(value),
        }
    }
}
