//! Label -> decode rule registry.
//!
//! Every label of the vocabulary maps to exactly one rule. The table is an
//! exhaustive `match`, so adding a label without a rule does not compile.

use time::{Date, Month, PrimitiveDateTime, Time};

use super::label::Label;
use super::value::{Demain, FieldValue, Hhphc, Optarif, Ptec};
use crate::protocol::error::ConversionError;

/// How the raw value text of a label is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeRule {
    /// Decimal digits only; `width` is the zero-padded wire width.
    Integer { width: usize },
    Ptec,
    Demain,
    Hhphc,
    Optarif,
    /// Printable code string with a bounded length.
    Code { min: usize, max: usize },
    /// `[S]YYMMDDhhmmss`, with an optional season letter.
    Date,
}

/// Text meaning "not applicable" for labels that may legitimately be void.
const DEMAIN_UNKNOWN: &str = "----";

const DATE_DIGITS: usize = 12;
const DATE_CENTURY: i32 = 2000;

pub fn rule_for(label: Label) -> DecodeRule {
    match label {
        Label::Adco => DecodeRule::Code { min: 1, max: 12 },
        Label::Optarif => DecodeRule::Optarif,
        Label::Isousc | Label::Pejp => DecodeRule::Integer { width: 2 },
        Label::Base
        | Label::Hchc
        | Label::Hchp
        | Label::Ejphn
        | Label::Ejphpm
        | Label::Bbrhcjb
        | Label::Bbrhpjb
        | Label::Bbrhcjw
        | Label::Bbrhpjw
        | Label::Bbrhcjr
        | Label::Bbrhpjr => DecodeRule::Integer { width: 9 },
        Label::Ptec => DecodeRule::Ptec,
        Label::Demain => DecodeRule::Demain,
        Label::Iinst
        | Label::Iinst1
        | Label::Iinst2
        | Label::Iinst3
        | Label::Adps
        | Label::Imax
        | Label::Imax1
        | Label::Imax2
        | Label::Imax3
        | Label::Adir1
        | Label::Adir2
        | Label::Adir3 => DecodeRule::Integer { width: 3 },
        Label::Pmax | Label::Papp => DecodeRule::Integer { width: 5 },
        Label::Hhphc => DecodeRule::Hhphc,
        Label::Motdetat => DecodeRule::Code { min: 6, max: 6 },
        Label::Ppot => DecodeRule::Code { min: 2, max: 2 },
        Label::Date => DecodeRule::Date,
    }
}

fn absent_marker(label: Label) -> Option<&'static str> {
    match label {
        Label::Demain => Some(DEMAIN_UNKNOWN),
        _ => None,
    }
}

/// Decode the raw value text of a known label.
///
/// `Ok(None)` means the value is explicitly "not applicable": the field is
/// left out of the frame without counting as a failure.
pub fn convert(label: Label, value: &str) -> Result<Option<FieldValue>, ConversionError> {
    if absent_marker(label) == Some(value) {
        return Ok(None);
    }
    let name = label.as_str();
    let unknown_code = || ConversionError::UnknownCode {
        label: name,
        value: value.to_string(),
    };

    let decoded = match rule_for(label) {
        DecodeRule::Integer { .. } => FieldValue::Integer(parse_integer(name, value)?),
        DecodeRule::Ptec => FieldValue::Ptec(Ptec::from_code(value).ok_or_else(unknown_code)?),
        DecodeRule::Demain => {
            FieldValue::Demain(Demain::from_code(value).ok_or_else(unknown_code)?)
        }
        DecodeRule::Hhphc => FieldValue::Hhphc(Hhphc::from_code(value).ok_or_else(unknown_code)?),
        DecodeRule::Optarif => {
            FieldValue::Optarif(Optarif::from_code(value).ok_or_else(unknown_code)?)
        }
        DecodeRule::Code { min, max } => FieldValue::Text(parse_code(name, value, min, max)?),
        DecodeRule::Date => FieldValue::Date(parse_date(name, value)?),
    };
    Ok(Some(decoded))
}

/// Decode a label given as raw text.
///
/// # Examples
/// ```
/// use teleinfo_core::{FieldValue, Label, convert_field};
///
/// let (label, value) = convert_field("IMAX", "090").unwrap().unwrap();
/// assert_eq!(label, Label::Imax);
/// assert_eq!(value, FieldValue::Integer(90));
/// assert!(convert_field("IMAX", "09O").is_err());
/// ```
pub fn convert_field(
    label: &str,
    value: &str,
) -> Result<Option<(Label, FieldValue)>, ConversionError> {
    let label: Label = label.parse()?;
    Ok(convert(label, value)?.map(|decoded| (label, decoded)))
}

/// Encode a decoded value back to its wire text.
///
/// Returns `None` when the value does not belong to the label's rule.
pub fn encode(label: Label, value: &FieldValue) -> Option<String> {
    match (rule_for(label), value) {
        (DecodeRule::Integer { width }, FieldValue::Integer(number)) => {
            Some(format!("{number:0width$}"))
        }
        (DecodeRule::Ptec, FieldValue::Ptec(ptec)) => Some(ptec.code().to_string()),
        (DecodeRule::Demain, FieldValue::Demain(demain)) => Some(demain.code().to_string()),
        (DecodeRule::Hhphc, FieldValue::Hhphc(hhphc)) => Some(hhphc.code().to_string()),
        (DecodeRule::Optarif, FieldValue::Optarif(optarif)) => Some(optarif.code()),
        (DecodeRule::Code { .. }, FieldValue::Text(text)) => Some(text.clone()),
        (DecodeRule::Date, FieldValue::Date(date)) => Some(format!(
            "{:02}{:02}{:02}{:02}{:02}{:02}",
            date.year().rem_euclid(100),
            u8::from(date.month()),
            date.day(),
            date.hour(),
            date.minute(),
            date.second()
        )),
        _ => None,
    }
}

fn parse_integer(label: &'static str, value: &str) -> Result<u32, ConversionError> {
    let not_numeric = || ConversionError::NotNumeric {
        label,
        value: value.to_string(),
    };
    if value.is_empty() || !value.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(not_numeric());
    }
    value.parse().map_err(|_| not_numeric())
}

fn parse_code(
    label: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<String, ConversionError> {
    if !(min..=max).contains(&value.len()) {
        return Err(ConversionError::InvalidLength {
            label,
            value: value.to_string(),
            min,
            max,
        });
    }
    if !value.bytes().all(|byte| byte.is_ascii_graphic()) {
        return Err(ConversionError::UnknownCode {
            label,
            value: value.to_string(),
        });
    }
    Ok(value.to_string())
}

fn parse_date(label: &'static str, value: &str) -> Result<PrimitiveDateTime, ConversionError> {
    let invalid = || ConversionError::InvalidDate {
        label,
        value: value.to_string(),
    };
    let digits = match value.len() {
        DATE_DIGITS => value,
        len if len == DATE_DIGITS + 1 => value
            .strip_prefix(['E', 'e', 'H', 'h'])
            .ok_or_else(invalid)?,
        _ => return Err(invalid()),
    };
    if !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(invalid());
    }

    let field = |idx: usize| digits[idx * 2..idx * 2 + 2].parse::<u8>().map_err(|_| invalid());
    let year = DATE_CENTURY + i32::from(field(0)?);
    let month = Month::try_from(field(1)?).map_err(|_| invalid())?;
    let date = Date::from_calendar_date(year, month, field(2)?).map_err(|_| invalid())?;
    let time = Time::from_hms(field(3)?, field(4)?, field(5)?).map_err(|_| invalid())?;
    Ok(PrimitiveDateTime::new(date, time))
}

#[cfg(test)]
mod tests {
    use super::{convert, convert_field, encode};
    use crate::fields::label::Label;
    use crate::fields::value::{Demain, FieldValue, Hhphc, Ptec};
    use crate::protocol::error::ConversionError;

    #[test]
    fn integers_accept_digits_only() {
        assert_eq!(
            convert(Label::Papp, "00270").unwrap(),
            Some(FieldValue::Integer(270))
        );
        assert!(matches!(
            convert(Label::Papp, "0027O"),
            Err(ConversionError::NotNumeric { .. })
        ));
        assert!(convert(Label::Papp, "").is_err());
        assert!(convert(Label::Papp, "-0027").is_err());
        assert!(convert(Label::Base, "99999999999").is_err());
    }

    #[test]
    fn enums_fail_closed() {
        assert_eq!(
            convert(Label::Ptec, "HP..").unwrap(),
            Some(FieldValue::Ptec(Ptec::Hp))
        );
        assert_eq!(
            convert(Label::Hhphc, "Y").unwrap(),
            Some(FieldValue::Hhphc(Hhphc::Y))
        );
        assert!(matches!(
            convert(Label::Ptec, "XX.."),
            Err(ConversionError::UnknownCode { .. })
        ));
        assert!(convert(Label::Hhphc, "B").is_err());
    }

    #[test]
    fn demain_placeholder_is_absent() {
        assert_eq!(convert(Label::Demain, "----").unwrap(), None);
        assert_eq!(
            convert(Label::Demain, "ROUG").unwrap(),
            Some(FieldValue::Demain(Demain::Rouge))
        );
        assert!(convert(Label::Demain, "VERT").is_err());
    }

    #[test]
    fn code_strings_check_length() {
        assert_eq!(
            convert(Label::Ppot, "00").unwrap(),
            Some(FieldValue::Text("00".to_string()))
        );
        assert!(matches!(
            convert(Label::Ppot, "000"),
            Err(ConversionError::InvalidLength { .. })
        ));
        assert!(convert(Label::Motdetat, "000000").is_ok());
        assert!(convert(Label::Adco, "").is_err());
        assert!(convert(Label::Adco, "0317621201620").is_err());
    }

    #[test]
    fn dates_with_and_without_season() {
        let summer = convert(Label::Date, "E240305143000").unwrap().unwrap();
        assert_eq!(summer.to_string(), "2024-03-05T14:30:00");
        let plain = convert(Label::Date, "240305143000").unwrap().unwrap();
        assert_eq!(plain, summer);
        assert!(convert(Label::Date, "X240305143000").is_err());
        assert!(convert(Label::Date, "241305143000").is_err());
        assert!(convert(Label::Date, "240305256000").is_err());
    }

    #[test]
    fn unknown_label_text() {
        assert!(matches!(
            convert_field("GAZ", "001"),
            Err(ConversionError::UnknownLabel { .. })
        ));
    }

    #[test]
    fn encode_reverses_convert() {
        let cases = [
            (Label::Isousc, "30"),
            (Label::Base, "001181243"),
            (Label::Ptec, "HPJR"),
            (Label::Optarif, "BBRJ"),
            (Label::Adco, "031762120162"),
            (Label::Date, "240305143000"),
        ];
        for (label, text) in cases {
            let value = convert(label, text).unwrap().unwrap();
            assert_eq!(encode(label, &value).as_deref(), Some(text));
        }
        assert_eq!(encode(Label::Papp, &FieldValue::Ptec(Ptec::Th)), None);
    }
}
