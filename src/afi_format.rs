//! AFI comma-delimited payment file reader and writer.
//!
//! AFI files are written with the `csv` crate configured for the bank's
//! layout: no header row, records of differing width, no quoting and CRLF
//! line endings.

use crate::conversion::hash_sum;
use crate::error::{Error, FormatError, Result, ValidationError};
use crate::field::{hash_total_digits, Field, FieldKind};
use crate::record::{
    EncodedRecord, RecordKind, CONTROL_COUNT, CONTROL_HASH, CONTROL_TOTAL, TRANSACTION_ACCOUNT,
    TRANSACTION_AMOUNT,
};
use csv::{QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};
use rust_decimal::Decimal;
use std::io::{Read, Write};

/// Aggregates carried by a control record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlTotals {
    pub total_cents: u64,
    pub transaction_count: u64,
    /// Encoded 11 digit hash total.
    pub hash_total: String,
}

impl ControlTotals {
    pub fn new(total_cents: u64, transaction_count: u64, hash_sum: u128) -> Self {
        Self {
            total_cents,
            transaction_count,
            hash_total: hash_total_digits(hash_sum),
        }
    }

    /// Total as a currency amount with two decimal places.
    pub fn total_amount(&self) -> Decimal {
        Decimal::from_i128_with_scale(i128::from(self.total_cents), 2)
    }
}

/// An AFI file: encoded records in output order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AfiFile {
    records: Vec<EncodedRecord>,
}

impl AfiFile {
    pub fn new(records: Vec<EncodedRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[EncodedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Encoded lines without terminators.
    pub fn to_lines(&self) -> Vec<String> {
        self.records.iter().map(EncodedRecord::to_line).collect()
    }

    /// Parse an AFI file from any source implementing `Read`.
    ///
    /// Only the record shape is checked; field contents are taken as they are.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::fs::File;
    /// use aba_afi::afi_format::AfiFile;
    ///
    /// let mut file = File::open("payments.afi")?;
    /// let afi = AfiFile::from_read(&mut file)?;
    /// let totals = afi.verify_totals()?;
    /// println!("{} transactions", totals.transaction_count);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(reader);
        let mut records = Vec::new();

        for (index, result) in csv_reader.records().enumerate() {
            let row = result?;
            let line = index + 1;
            let mut fields: Vec<String> = row.iter().map(str::to_string).collect();

            let code = fields.first().map(String::as_str).unwrap_or("");
            let kind = RecordKind::from_afi_code(code).ok_or_else(|| {
                FormatError::UnknownRecordType {
                    line,
                    marker: code.to_string(),
                }
            })?;

            let expected = kind.field_count();
            if kind.keeps_trailing_delimiter()
                && fields.len() == expected + 1
                && fields.last().is_some_and(|f| f.is_empty())
            {
                fields.pop();
            }
            if fields.len() != expected {
                return Err(FormatError::FieldCount {
                    line,
                    found: fields.len(),
                    expected,
                }
                .into());
            }

            records.push(EncodedRecord { kind, fields });
        }

        Ok(AfiFile { records })
    }

    /// Write the file to any destination implementing `Write`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::fs::File;
    /// use aba_afi::aba_format::AbaFile;
    /// use aba_afi::conversion::Converter;
    ///
    /// let mut input = File::open("payments.aba")?;
    /// let aba = AbaFile::from_read(&mut input)?;
    /// let (afi, _) = Converter::new(chrono::Local::now().date_naive()).convert(&aba)?;
    /// let mut file = File::create("payments.afi")?;
    /// afi.write_to(&mut file)?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut csv_writer = WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .quote_style(QuoteStyle::Never)
            .terminator(Terminator::CRLF)
            .from_writer(writer);

        for record in &self.records {
            let fields = record.fields.iter().map(String::as_str);
            if record.kind.keeps_trailing_delimiter() {
                csv_writer.write_record(fields.chain(std::iter::once("")))?;
            } else {
                csv_writer.write_record(fields)?;
            }
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Recompute total, count and hash from the transaction records and
    /// compare them with the control record.
    pub fn verify_totals(&self) -> Result<ControlTotals> {
        let control_line = self
            .records
            .iter()
            .position(|r| r.kind == RecordKind::Control)
            .ok_or(FormatError::MissingRecord(RecordKind::Control))?;
        let control = &self.records[control_line];

        let mut total_cents: u64 = 0;
        let mut accounts = Vec::new();
        for (index, record) in self.records.iter().enumerate() {
            if record.kind != RecordKind::Transaction {
                continue;
            }
            let amount = field_at(record, index, TRANSACTION_AMOUNT)?;
            let invalid = || ValidationError::Value {
                field: FieldKind::Amount,
                value: amount.to_string(),
            };
            let cents = amount.parse::<u64>().map_err(|_| invalid())?;
            total_cents = total_cents.checked_add(cents).ok_or_else(invalid)?;
            accounts.push(field_at(record, index, TRANSACTION_ACCOUNT)?);
        }

        let transaction_count = accounts.len() as u64;
        let computed = ControlTotals::new(total_cents, transaction_count, hash_sum(accounts)?);

        let checks = [
            (FieldKind::Amount, CONTROL_TOTAL, Field::Amount(total_cents)),
            (
                FieldKind::TransactionCount,
                CONTROL_COUNT,
                Field::TransactionCount(transaction_count),
            ),
        ];
        for (field, index, expected) in checks {
            let expected = expected.encode()?;
            let recorded = field_at(control, control_line, index)?;
            if recorded != expected {
                return Err(Error::TotalsMismatch {
                    field,
                    recorded: recorded.to_string(),
                    computed: expected,
                });
            }
        }
        let recorded = field_at(control, control_line, CONTROL_HASH)?;
        if recorded != computed.hash_total {
            return Err(Error::TotalsMismatch {
                field: FieldKind::HashTotal,
                recorded: recorded.to_string(),
                computed: computed.hash_total,
            });
        }

        Ok(computed)
    }
}

/// Field `index` of the record at 0-based `position` in the file.
fn field_at(record: &EncodedRecord, position: usize, index: usize) -> Result<&str> {
    record.fields.get(index).map(String::as_str).ok_or_else(|| {
        FormatError::FieldCount {
            line: position + 1,
            found: record.fields.len(),
            expected: record.kind.field_count(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "1,012345987654321,7,,261023,261016,\r\n\
        2,012345123456789,50,000000012345,JOHN SMITH,INV001,ACME PTY LTD,PAYROLL OCT,\r\n\
        2,098765432109876,50,000000000655,OBrien  Co,,ACME PTY LTD,,\r\n\
        3,000000013000,000002,11105555665\r\n";

    #[test]
    fn test_read_then_write_preserves_bytes() {
        let afi = AfiFile::from_read(&mut SAMPLE.as_bytes()).unwrap();
        assert_eq!(afi.len(), 4);
        assert_eq!(afi.records()[0].fields.len(), 6);
        assert_eq!(afi.records()[2].fields[5], "");

        let mut output = Vec::new();
        afi.write_to(&mut output).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), SAMPLE);
    }

    #[test]
    fn test_verify_totals() {
        let afi = AfiFile::from_read(&mut SAMPLE.as_bytes()).unwrap();
        let totals = afi.verify_totals().unwrap();
        assert_eq!(totals.total_cents, 13000);
        assert_eq!(totals.transaction_count, 2);
        assert_eq!(totals.hash_total, "11105555665");
        assert_eq!(totals.total_amount().to_string(), "130.00");
    }

    #[test]
    fn test_verify_totals_detects_tampering() {
        let tampered = SAMPLE.replace("000000000655", "000000000656");
        let afi = AfiFile::from_read(&mut tampered.as_bytes()).unwrap();
        assert!(matches!(
            afi.verify_totals(),
            Err(Error::TotalsMismatch {
                field: FieldKind::Amount,
                ..
            })
        ));
    }

    #[test]
    fn test_verify_totals_rejects_overflowing_total() {
        let text = "1,012345987654321,7,,261023,261016,\r\n\
            2,012345123456789,50,18446744073709551615,JOHN SMITH,,ACME PTY LTD,,\r\n\
            2,098765432109876,50,18446744073709551615,JANE SMITH,,ACME PTY LTD,,\r\n\
            3,000000000000,000002,11105555665\r\n";
        let afi = AfiFile::from_read(&mut text.as_bytes()).unwrap();
        assert!(matches!(
            afi.verify_totals(),
            Err(Error::Validation(ValidationError::Value {
                field: FieldKind::Amount,
                ref value,
            })) if value == "18446744073709551615"
        ));
    }

    #[test]
    fn test_unknown_record_code() {
        let text = "9,abc\r\n";
        assert!(matches!(
            AfiFile::from_read(&mut text.as_bytes()),
            Err(Error::Format(FormatError::UnknownRecordType { line: 1, .. }))
        ));
    }

    #[test]
    fn test_wrong_field_count() {
        let text = "3,000000013000,000002\r\n";
        assert!(matches!(
            AfiFile::from_read(&mut text.as_bytes()),
            Err(Error::Format(FormatError::FieldCount {
                line: 1,
                found: 3,
                expected: 4
            }))
        ));
    }

    #[test]
    fn test_hash_total_width() {
        assert_eq!(ControlTotals::new(1, 1, 42).hash_total, "00000000042");
    }
}
