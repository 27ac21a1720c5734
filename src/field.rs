//! AFI field definitions.
//!
//! Every value written to an AFI file is a [`Field`]: a tagged variant that
//! carries its raw value. The rules for each kind (length, allowed values,
//! character class) are data on [`FieldKind`] and are applied when the field
//! is encoded.

use crate::error::ValidationError;
use chrono::{Months, NaiveDate};
use std::fmt;

/// Date layout shared by process and creation dates.
pub const DATE_FORMAT: &str = "%y%m%d";

/// Width of the hash total; longer sums keep their rightmost digits.
pub const HASH_TOTAL_WIDTH: usize = 11;

/// Returns true for characters permitted in AFI free-text fields.
pub fn is_allowed_text_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, ' ' | '/' | '-' | '?' | ':' | '(' | ')' | '+' | '.')
}

/// Format a date as YYMMDD.
pub fn yymmdd(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Rightmost hash total digits of `sum`, left zero padded.
pub fn hash_total_digits(sum: u128) -> String {
    let digits = sum.to_string();
    let tail = &digits[digits.len().saturating_sub(HASH_TOTAL_WIDTH)..];
    format!("{:0>width$}", tail, width = HASH_TOTAL_WIDTH)
}

/// Accepted encoded lengths for a field kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthRule {
    Exact(usize),
    OneOf(&'static [usize]),
    Between(usize, usize),
}

impl LengthRule {
    pub fn accepts(&self, length: usize) -> bool {
        match *self {
            LengthRule::Exact(expected) => length == expected,
            LengthRule::OneOf(lengths) => lengths.contains(&length),
            LengthRule::Between(min, max) => (min..=max).contains(&length),
        }
    }
}

impl fmt::Display for LengthRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            LengthRule::Exact(expected) => write!(f, "{}", expected),
            LengthRule::OneOf(lengths) => {
                let lengths: Vec<String> = lengths.iter().map(|l| l.to_string()).collect();
                write!(f, "{}", lengths.join(" or "))
            }
            LengthRule::Between(min, max) => write!(f, "{} to {}", min, max),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Charset {
    Digits,
    Text,
}

/// The kinds of AFI field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    RecordType,
    Account,
    FileType,
    Spare,
    ProcessDate,
    CreationDate,
    TransactionCode,
    Amount,
    Name,
    ReferenceOrCode,
    TransactionCount,
    HashTotal,
}

impl FieldKind {
    /// Length rule for the encoded value.
    pub fn length(&self) -> LengthRule {
        match self {
            FieldKind::RecordType | FieldKind::FileType => LengthRule::Exact(1),
            FieldKind::Account => LengthRule::OneOf(&[15, 16]),
            FieldKind::Spare => LengthRule::Exact(0),
            FieldKind::ProcessDate | FieldKind::CreationDate => LengthRule::Exact(6),
            FieldKind::TransactionCode => LengthRule::Exact(2),
            FieldKind::Amount => LengthRule::Exact(12),
            FieldKind::Name => LengthRule::Between(1, 20),
            FieldKind::ReferenceOrCode => LengthRule::Between(0, 12),
            FieldKind::TransactionCount => LengthRule::Exact(6),
            FieldKind::HashTotal => LengthRule::Exact(HASH_TOTAL_WIDTH),
        }
    }

    /// Permitted values; empty means unconstrained.
    pub fn allowed_values(&self) -> &'static [&'static str] {
        match self {
            FieldKind::RecordType => &["1", "2", "3"],
            FieldKind::FileType => &["7"],
            FieldKind::Spare => &[""],
            // 50 and 61 are standard credits, 52 is payroll.
            FieldKind::TransactionCode => &["50", "52", "61"],
            _ => &[],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::RecordType => "RecordType",
            FieldKind::Account => "Account",
            FieldKind::FileType => "FileType",
            FieldKind::Spare => "Spare",
            FieldKind::ProcessDate => "ProcessDate",
            FieldKind::CreationDate => "CreationDate",
            FieldKind::TransactionCode => "TransactionCode",
            FieldKind::Amount => "Amount",
            FieldKind::Name => "Name",
            FieldKind::ReferenceOrCode => "ReferenceOrCode",
            FieldKind::TransactionCount => "TransactionCount",
            FieldKind::HashTotal => "HashTotal",
        }
    }

    fn charset(&self) -> Charset {
        match self {
            FieldKind::Name | FieldKind::ReferenceOrCode => Charset::Text,
            _ => Charset::Digits,
        }
    }

    /// Check an encoded value against the length, value and character rules.
    fn check(&self, value: &str) -> Result<(), ValidationError> {
        let actual = value.chars().count();
        let expected = self.length();
        if !expected.accepts(actual) {
            return Err(ValidationError::Length {
                field: *self,
                actual,
                expected,
            });
        }

        let allowed = self.allowed_values();
        if !allowed.is_empty() && !allowed.contains(&value) {
            return Err(ValidationError::Value {
                field: *self,
                value: value.to_string(),
            });
        }

        let bad_char = match self.charset() {
            Charset::Digits => value.chars().find(|c| !c.is_ascii_digit()),
            Charset::Text => value.chars().find(|c| !is_allowed_text_char(*c)),
        };
        match bad_char {
            Some(character) => Err(ValidationError::Character {
                field: *self,
                character,
                value: value.to_string(),
            }),
            None => Ok(()),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single AFI field with its raw value.
///
/// Numeric variants hold integers and are zero padded on the left when
/// encoded; text variants are encoded as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    RecordType(String),
    Account(String),
    FileType(String),
    Spare(String),
    /// Date the bank processes the file. Must fall within a year from `today`.
    ProcessDate { date: String, today: NaiveDate },
    /// Date the file was produced. Must equal `today`.
    CreationDate { date: String, today: NaiveDate },
    TransactionCode(String),
    /// Amount in cents.
    Amount(u64),
    Name(String),
    ReferenceOrCode(String),
    TransactionCount(u64),
    /// Untruncated sum of account hash digits.
    HashTotal(u128),
}

impl Field {
    pub fn kind(&self) -> FieldKind {
        match self {
            Field::RecordType(_) => FieldKind::RecordType,
            Field::Account(_) => FieldKind::Account,
            Field::FileType(_) => FieldKind::FileType,
            Field::Spare(_) => FieldKind::Spare,
            Field::ProcessDate { .. } => FieldKind::ProcessDate,
            Field::CreationDate { .. } => FieldKind::CreationDate,
            Field::TransactionCode(_) => FieldKind::TransactionCode,
            Field::Amount(_) => FieldKind::Amount,
            Field::Name(_) => FieldKind::Name,
            Field::ReferenceOrCode(_) => FieldKind::ReferenceOrCode,
            Field::TransactionCount(_) => FieldKind::TransactionCount,
            Field::HashTotal(_) => FieldKind::HashTotal,
        }
    }

    /// Encode the field, validating it against the rules of its kind.
    pub fn encode(&self) -> Result<String, ValidationError> {
        let kind = self.kind();
        let value = self.render();
        kind.check(&value)?;

        match self {
            Field::Amount(0) => return Err(ValidationError::NotPositive { field: kind }),
            Field::ProcessDate { date, today } => {
                let latest = today
                    .checked_add_months(Months::new(12))
                    .unwrap_or(NaiveDate::MAX);
                check_date_range(kind, date, *today, latest)?;
            }
            Field::CreationDate { date, today } => check_date_range(kind, date, *today, *today)?,
            _ => {}
        }

        Ok(value)
    }

    fn render(&self) -> String {
        match self {
            Field::RecordType(value)
            | Field::Account(value)
            | Field::FileType(value)
            | Field::Spare(value)
            | Field::TransactionCode(value)
            | Field::Name(value)
            | Field::ReferenceOrCode(value) => value.clone(),
            Field::ProcessDate { date, .. } | Field::CreationDate { date, .. } => date.clone(),
            Field::Amount(cents) => format!("{:012}", cents),
            Field::TransactionCount(count) => format!("{:06}", count),
            Field::HashTotal(sum) => hash_total_digits(*sum),
        }
    }
}

/// Check that a YYMMDD value is a real date within `earliest..=latest`.
///
/// The bounds are compared as YYMMDD integers.
fn check_date_range(
    field: FieldKind,
    value: &str,
    earliest: NaiveDate,
    latest: NaiveDate,
) -> Result<(), ValidationError> {
    if NaiveDate::parse_from_str(value, DATE_FORMAT).is_err() {
        return Err(ValidationError::NotADate {
            field,
            value: value.to_string(),
        });
    }

    let earliest = yymmdd(earliest);
    let latest = yymmdd(latest);
    let as_number = |s: &str| s.parse::<u32>().ok();

    match (as_number(value), as_number(&earliest), as_number(&latest)) {
        (Some(v), Some(lo), Some(hi)) if lo <= v && v <= hi => Ok(()),
        _ => Err(ValidationError::DateOutOfRange {
            field,
            value: value.to_string(),
            earliest,
            latest,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    #[test]
    fn test_numeric_fields_are_zero_padded() {
        assert_eq!(Field::Amount(12345).encode().unwrap(), "000000012345");
        assert_eq!(Field::TransactionCount(3).encode().unwrap(), "000003");
        assert_eq!(Field::HashTotal(5).encode().unwrap(), "00000000005");
    }

    #[test]
    fn test_hash_total_keeps_rightmost_digits() {
        assert_eq!(Field::HashTotal(234_567_890_123).encode().unwrap(), "34567890123");
        assert_eq!(
            Field::HashTotal(9_876_543_210_987_654).encode().unwrap(),
            "43210987654"
        );
        assert_eq!(hash_total_digits(u128::MAX), "31768211455");
        assert_eq!(hash_total_digits(0), "00000000000");
    }

    #[test]
    fn test_amount_must_be_positive_and_fit() {
        assert_eq!(
            Field::Amount(0).encode(),
            Err(ValidationError::NotPositive {
                field: FieldKind::Amount
            })
        );
        assert!(matches!(
            Field::Amount(1_000_000_000_000).encode(),
            Err(ValidationError::Length { actual: 13, .. })
        ));
    }

    #[test]
    fn test_count_overflowing_width_fails() {
        assert!(Field::TransactionCount(999_999).encode().is_ok());
        assert!(Field::TransactionCount(1_000_000).encode().is_err());
    }

    #[test]
    fn test_account_lengths() {
        assert!(Field::Account("012345123456789".into()).encode().is_ok());
        assert!(Field::Account("0123451234567890".into()).encode().is_ok());
        assert!(matches!(
            Field::Account("01234512345678".into()).encode(),
            Err(ValidationError::Length { actual: 14, .. })
        ));
        assert!(matches!(
            Field::Account("012345 12345678".into()).encode(),
            Err(ValidationError::Character { character: ' ', .. })
        ));
    }

    #[test]
    fn test_allowed_values() {
        assert!(Field::RecordType("2".into()).encode().is_ok());
        assert!(matches!(
            Field::RecordType("0".into()).encode(),
            Err(ValidationError::Value { .. })
        ));
        assert!(Field::FileType("7".into()).encode().is_ok());
        assert!(Field::FileType("8".into()).encode().is_err());
        assert!(Field::TransactionCode("52".into()).encode().is_ok());
        assert!(Field::TransactionCode("60".into()).encode().is_err());
        assert_eq!(Field::Spare(String::new()).encode().unwrap(), "");
        assert!(Field::Spare("x".into()).encode().is_err());
    }

    #[test]
    fn test_text_fields() {
        assert!(Field::Name("OBrien  Co".into()).encode().is_ok());
        assert!(Field::Name(String::new()).encode().is_err());
        assert!(Field::Name("A".repeat(21)).encode().is_err());
        assert!(Field::ReferenceOrCode(String::new()).encode().is_ok());
        assert!(Field::ReferenceOrCode("INV-2026/001".into()).encode().is_ok());
        assert!(Field::ReferenceOrCode("INV-2026/0012".into()).encode().is_err());
        assert!(matches!(
            Field::Name("A&B".into()).encode(),
            Err(ValidationError::Character { character: '&', .. })
        ));
    }

    #[test]
    fn test_process_date_range() {
        let date = |d: &str| Field::ProcessDate {
            date: d.into(),
            today: today(),
        };
        assert!(date("261016").encode().is_ok());
        assert!(date("271016").encode().is_ok());
        assert!(matches!(
            date("261015").encode(),
            Err(ValidationError::DateOutOfRange { .. })
        ));
        assert!(matches!(
            date("271017").encode(),
            Err(ValidationError::DateOutOfRange { .. })
        ));
        assert!(matches!(
            date("261341").encode(),
            Err(ValidationError::NotADate { .. })
        ));
        assert!(matches!(
            date("26101").encode(),
            Err(ValidationError::Length { .. })
        ));
    }

    #[test]
    fn test_process_date_from_leap_day() {
        let today = NaiveDate::from_ymd_opt(2028, 2, 29).unwrap();
        let field = Field::ProcessDate {
            date: "290228".into(),
            today,
        };
        assert!(field.encode().is_ok());
    }

    #[test]
    fn test_creation_date_must_be_today() {
        let created = |d: &str| Field::CreationDate {
            date: d.into(),
            today: today(),
        };
        assert_eq!(created("261016").encode().unwrap(), "261016");
        assert!(created("261017").encode().is_err());
    }

    #[test]
    fn test_allowed_text_chars() {
        for c in "aZ09 /-?:()+.".chars() {
            assert!(is_allowed_text_char(c), "{:?} should be allowed", c);
        }
        for c in "'&!,_#;<=>".chars() {
            assert!(!is_allowed_text_char(c), "{:?} should be rejected", c);
        }
    }
}
