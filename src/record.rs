//! AFI records.
//!
//! A record is one line of an AFI file. There are exactly three shapes,
//! each owning a fixed, ordered list of [`Field`]s:
//!
//! | Record      | Fields                                                                 |
//! |-------------|------------------------------------------------------------------------|
//! | Header      | type `1`, account, file type `7`, spare, process date, creation date  |
//! | Transaction | type `2`, account, code, amount, name, reference, name, reference      |
//! | Control     | type `3`, total amount, transaction count, hash total                  |
//!
//! Fields are comma delimited. Header and transaction lines keep a trailing
//! comma; control lines do not.

use crate::error::ValidationError;
use crate::field::{yymmdd, Field};
use chrono::NaiveDate;
use std::fmt;

/// Field delimiter in AFI files.
pub const DELIMITER: &str = ",";

/// AFI file type for direct credits.
pub const DIRECT_CREDIT: &str = "7";

/// AFI transaction code for a standard credit.
pub const STANDARD_CREDIT: &str = "50";

pub(crate) const TRANSACTION_ACCOUNT: usize = 1;
pub(crate) const TRANSACTION_AMOUNT: usize = 3;
pub(crate) const CONTROL_TOTAL: usize = 1;
pub(crate) const CONTROL_COUNT: usize = 2;
pub(crate) const CONTROL_HASH: usize = 3;

/// Structural role of a record.
///
/// ABA and AFI number the roles differently; both codes are kept here
/// side by side and never mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Header,
    Transaction,
    Control,
}

impl RecordKind {
    /// Leading character of an ABA line.
    pub fn aba_marker(&self) -> char {
        match self {
            RecordKind::Header => '0',
            RecordKind::Transaction => '1',
            RecordKind::Control => '7',
        }
    }

    pub fn from_aba_marker(marker: char) -> Option<Self> {
        match marker {
            '0' => Some(RecordKind::Header),
            '1' => Some(RecordKind::Transaction),
            '7' => Some(RecordKind::Control),
            _ => None,
        }
    }

    /// Record type code in the first AFI field.
    pub fn afi_code(&self) -> &'static str {
        match self {
            RecordKind::Header => "1",
            RecordKind::Transaction => "2",
            RecordKind::Control => "3",
        }
    }

    pub fn from_afi_code(code: &str) -> Option<Self> {
        match code {
            "1" => Some(RecordKind::Header),
            "2" => Some(RecordKind::Transaction),
            "3" => Some(RecordKind::Control),
            _ => None,
        }
    }

    /// Number of fields in an AFI record of this kind.
    pub fn field_count(&self) -> usize {
        match self {
            RecordKind::Header => 6,
            RecordKind::Transaction => 8,
            RecordKind::Control => 4,
        }
    }

    pub fn keeps_trailing_delimiter(&self) -> bool {
        !matches!(self, RecordKind::Control)
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Header => write!(f, "header record"),
            RecordKind::Transaction => write!(f, "transaction record"),
            RecordKind::Control => write!(f, "control record"),
        }
    }
}

/// AFI header record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRecord {
    fields: [Field; 6],
}

impl HeaderRecord {
    /// Build a header for the sender's account, dated `today`.
    pub fn new(account: impl Into<String>, process_date: impl Into<String>, today: NaiveDate) -> Self {
        Self {
            fields: [
                Field::RecordType(RecordKind::Header.afi_code().to_string()),
                Field::Account(account.into()),
                Field::FileType(DIRECT_CREDIT.to_string()),
                Field::Spare(String::new()),
                Field::ProcessDate {
                    date: process_date.into(),
                    today,
                },
                Field::CreationDate {
                    date: yymmdd(today),
                    today,
                },
            ],
        }
    }
}

/// Values extracted from one ABA transaction line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDetails {
    pub receiver_account: String,
    pub amount_cents: u64,
    pub receiver_name: String,
    pub receiver_reference: String,
    pub sender_name: String,
    pub sender_reference: String,
}

/// AFI transaction record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    fields: [Field; 8],
}

impl TransactionRecord {
    pub fn new(details: TransactionDetails) -> Self {
        Self {
            fields: [
                Field::RecordType(RecordKind::Transaction.afi_code().to_string()),
                Field::Account(details.receiver_account),
                Field::TransactionCode(STANDARD_CREDIT.to_string()),
                Field::Amount(details.amount_cents),
                Field::Name(details.receiver_name),
                Field::ReferenceOrCode(details.receiver_reference),
                Field::Name(details.sender_name),
                Field::ReferenceOrCode(details.sender_reference),
            ],
        }
    }
}

/// AFI control record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlRecord {
    fields: [Field; 4],
}

impl ControlRecord {
    pub fn new(total_cents: u64, transaction_count: u64, hash_sum: u128) -> Self {
        Self {
            fields: [
                Field::RecordType(RecordKind::Control.afi_code().to_string()),
                Field::Amount(total_cents),
                Field::TransactionCount(transaction_count),
                Field::HashTotal(hash_sum),
            ],
        }
    }
}

/// One AFI record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Header(HeaderRecord),
    Transaction(TransactionRecord),
    Control(ControlRecord),
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Header(_) => RecordKind::Header,
            Record::Transaction(_) => RecordKind::Transaction,
            Record::Control(_) => RecordKind::Control,
        }
    }

    pub fn fields(&self) -> &[Field] {
        match self {
            Record::Header(header) => &header.fields,
            Record::Transaction(transaction) => &transaction.fields,
            Record::Control(control) => &control.fields,
        }
    }

    /// Encode every field, stopping at the first validation failure.
    pub fn encode_record(&self) -> Result<EncodedRecord, ValidationError> {
        let fields = self
            .fields()
            .iter()
            .map(Field::encode)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(EncodedRecord {
            kind: self.kind(),
            fields,
        })
    }

    /// Encode the record as one AFI line, without a line terminator.
    pub fn encode(&self) -> Result<String, ValidationError> {
        self.encode_record().map(|record| record.to_line())
    }
}

/// A record whose fields have been encoded and validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedRecord {
    pub kind: RecordKind,
    pub fields: Vec<String>,
}

impl EncodedRecord {
    pub fn to_line(&self) -> String {
        let mut line = self.fields.join(DELIMITER);
        if self.kind.keeps_trailing_delimiter() {
            line.push_str(DELIMITER);
        }
        line
    }
}

impl fmt::Display for EncodedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line())
    }
}
