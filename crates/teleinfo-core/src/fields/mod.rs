//! Label vocabulary, typed field values and the converter registry.

pub mod converter;
pub mod label;
pub mod value;

pub use converter::{DecodeRule, convert, convert_field, encode, rule_for};
pub use label::Label;
pub use value::{
    Demain, FieldValue, Hhphc, Optarif, ProgrammeCircuit1, ProgrammeCircuit2, Ptec,
    TempoProgramme,
};
