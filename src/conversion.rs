//! ABA to AFI conversion.
//!
//! The converter walks a parsed [`AbaFile`] once, in source order, turning
//! each line into an AFI [`Record`]. Transaction lines feed the running
//! totals that end up in the control record.

use crate::aba_format::{AbaFile, AbaLine};
use crate::afi_format::{AfiFile, ControlTotals};
use crate::error::{Error, FormatError, Result, ValidationError};
use crate::field::{is_allowed_text_char, FieldKind};
use crate::record::{
    ControlRecord, HeaderRecord, Record, RecordKind, TransactionDetails, TransactionRecord,
};
use chrono::NaiveDate;
use log::{debug, info, warn};
use std::ops::Range;

/// Digits of a receiver account that contribute to the hash total.
pub const HASH_DIGITS: Range<usize> = 1..13;

/// Maximum length of an AFI name.
const NAME_LENGTH: usize = 20;

/// Drop every character not permitted in AFI free text.
pub fn sanitize(text: &str) -> String {
    text.chars().filter(|c| is_allowed_text_char(*c)).collect()
}

/// Sum the hash digits of each account, in order.
pub fn hash_sum<'a, I>(accounts: I) -> std::result::Result<u128, ValidationError>
where
    I: IntoIterator<Item = &'a str>,
{
    accounts.into_iter().try_fold(0u128, |sum, account| {
        let digits = account
            .get(HASH_DIGITS)
            .ok_or_else(|| ValidationError::Length {
                field: FieldKind::Account,
                actual: account.len(),
                expected: FieldKind::Account.length(),
            })?;
        let value = digits
            .parse::<u128>()
            .map_err(|_| ValidationError::Value {
                field: FieldKind::Account,
                value: account.to_string(),
            })?;
        Ok(sum + value)
    })
}

/// Parse a cent amount from its ABA text.
pub fn parse_cents(raw: &str) -> std::result::Result<u64, ValidationError> {
    let trimmed = raw.trim();
    let invalid = || ValidationError::Value {
        field: FieldKind::Amount,
        value: raw.to_string(),
    };
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    trimmed.parse::<u64>().map_err(|_| invalid())
}

/// Running totals over the transaction lines seen so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateState {
    pub transaction_total_cents: u64,
    pub transaction_count: u64,
    /// Receiver accounts in source order.
    pub account_hash_accumulator: Vec<String>,
}

impl AggregateState {
    pub fn record(&mut self, receiver_account: &str, amount_cents: u64) {
        self.transaction_count += 1;
        self.transaction_total_cents += amount_cents;
        self.account_hash_accumulator
            .push(receiver_account.to_string());
    }

    pub fn hash_sum(&self) -> std::result::Result<u128, ValidationError> {
        hash_sum(self.account_hash_accumulator.iter().map(String::as_str))
    }
}

/// What a conversion produced, for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionSummary {
    /// AFI records written, header and control included.
    pub records: usize,
    /// Totals carried by the control record.
    pub totals: ControlTotals,
}

/// Converts ABA files into AFI files as of a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Converter {
    today: NaiveDate,
}

impl Converter {
    /// `today` dates the AFI header and bounds the process date.
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    /// Convert a parsed ABA file, stopping at the first invalid field.
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
    /// let today = chrono::Local::now().date_naive();
    /// let (afi, summary) = Converter::new(today).convert(&aba)?;
    ///
    /// let mut output = File::create("payments.afi")?;
    /// afi.write_to(&mut output)?;
    /// println!("Total: {}", summary.totals.total_amount());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn convert(&self, aba: &AbaFile) -> Result<(AfiFile, ConversionSummary)> {
        // The AFI header carries the account of the first transaction,
        // not the account on the ABA header line.
        let sender_account = aba
            .transactions()
            .next()
            .map(AbaLine::sender_account)
            .ok_or(FormatError::MissingRecord(RecordKind::Transaction))?;
        let sender_name = sender_name(aba.header());

        let mut state = AggregateState::default();
        let mut totals = None;
        let mut records = Vec::with_capacity(aba.len());

        for line in aba.lines() {
            let at_line = |source| Error::Record {
                line: line.number,
                source,
            };

            let (record, accumulate) = match line.kind {
                RecordKind::Header => {
                    let header =
                        HeaderRecord::new(sender_account.clone(), line.process_date(), self.today);
                    (Record::Header(header), None)
                }
                RecordKind::Transaction => {
                    let details = transaction_details(line, &sender_name).map_err(at_line)?;
                    let accumulate = (details.receiver_account.clone(), details.amount_cents);
                    (
                        Record::Transaction(TransactionRecord::new(details)),
                        Some(accumulate),
                    )
                }
                RecordKind::Control => {
                    let hash = state.hash_sum().map_err(at_line)?;
                    let total_cents = state.transaction_total_cents;
                    let count = state.transaction_count;
                    totals = Some(ControlTotals::new(total_cents, count, hash));
                    (
                        Record::Control(ControlRecord::new(total_cents, count, hash)),
                        None,
                    )
                }
            };

            let encoded = record.encode_record().map_err(at_line)?;
            debug!("line {} -> {}", line.number, encoded);

            if let Some((account, cents)) = accumulate {
                state.record(&account, cents);
            }
            records.push(encoded);
        }

        let totals = totals.ok_or(FormatError::MissingRecord(RecordKind::Control))?;
        info!(
            "Converted {} transactions totalling {} (hash {})",
            totals.transaction_count,
            totals.total_amount(),
            totals.hash_total
        );
        let summary = ConversionSummary {
            records: records.len(),
            totals,
        };
        Ok((AfiFile::new(records), summary))
    }
}

/// Sender account name from the header line, cut to the AFI name width.
fn sender_name(header: &AbaLine) -> String {
    let name = clean_text(header.sender_account_name());
    if name.len() > NAME_LENGTH {
        warn!(
            "Sender account name {:?} truncated to {} characters",
            name, NAME_LENGTH
        );
        return name[..NAME_LENGTH].trim_end().to_string();
    }
    name
}

fn clean_text(text: &str) -> String {
    sanitize(text).trim().to_string()
}

fn transaction_details(
    line: &AbaLine,
    sender_name: &str,
) -> std::result::Result<TransactionDetails, ValidationError> {
    Ok(TransactionDetails {
        receiver_account: line.receiver_account(),
        amount_cents: parse_cents(line.amount())?,
        receiver_name: clean_text(line.receiver_name()),
        receiver_reference: clean_text(line.receiver_reference()),
        sender_name: sender_name.to_string(),
        sender_reference: clean_text(line.sender_business_reference()),
    })
}
