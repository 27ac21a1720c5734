//! ABA fixed-width payment file parser.
//!
//! An ABA file is a sequence of 120 character lines. The first character
//! of each line marks its role: `0` for the header, `1` for a transaction
//! and `7` for the control line. Values sit at fixed byte offsets.

use crate::error::{FormatError, Result};
use crate::record::RecordKind;
use log::debug;
use std::io::{BufRead, BufReader, Read};
use std::ops::Range;

/// Length of every ABA line, without its terminator.
pub const RECORD_LENGTH: usize = 120;

/// Maximum length of an extracted reference.
pub const REFERENCE_LENGTH: usize = 12;

const RECEIVER_ACCOUNT: Range<usize> = 1..17;
const AMOUNT: Range<usize> = 21..30;
const RECEIVER_NAME: Range<usize> = 30..50;
const SENDER_ACCOUNT_NAME: Range<usize> = 30..56;
const RECEIVER_REFERENCE: Range<usize> = 62..80;
const PROCESS_DATE: Range<usize> = 74..80;
const SENDER_ACCOUNT: Range<usize> = 80..96;
const SENDER_BUSINESS_REFERENCE: Range<usize> = 96..112;

/// A classified ABA line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbaLine {
    /// Role of the line, from its leading marker.
    pub kind: RecordKind,
    /// 1-based line number in the source file.
    pub number: usize,
    content: String,
}

impl AbaLine {
    pub fn content(&self) -> &str {
        &self.content
    }

    fn slice(&self, range: Range<usize>) -> &str {
        self.content.get(range).unwrap_or("")
    }

    /// Receiver BSB and account number, without hyphens.
    pub fn receiver_account(&self) -> String {
        strip_account(self.slice(RECEIVER_ACCOUNT))
    }

    /// Amount in cents, as written in the file.
    pub fn amount(&self) -> &str {
        self.slice(AMOUNT)
    }

    pub fn receiver_name(&self) -> &str {
        self.slice(RECEIVER_NAME).trim()
    }

    /// Sender account name, read from the header line.
    pub fn sender_account_name(&self) -> &str {
        self.slice(SENDER_ACCOUNT_NAME).trim()
    }

    pub fn receiver_reference(&self) -> &str {
        truncate(self.slice(RECEIVER_REFERENCE).trim(), REFERENCE_LENGTH)
    }

    /// Process date reordered from the header's DDMMYY into YYMMDD.
    pub fn process_date(&self) -> String {
        let date = self.slice(PROCESS_DATE);
        if date.len() < 4 {
            return date.to_string();
        }
        let end = date.len() - 2;
        format!("{}{}{}", &date[end..], &date[2..end], &date[..2])
    }

    /// Sender BSB and account number, without hyphens.
    pub fn sender_account(&self) -> String {
        strip_account(self.slice(SENDER_ACCOUNT))
    }

    pub fn sender_business_reference(&self) -> &str {
        truncate(self.slice(SENDER_BUSINESS_REFERENCE).trim(), REFERENCE_LENGTH)
    }
}

fn strip_account(raw: &str) -> String {
    raw.replace('-', "").trim().to_string()
}

fn truncate(value: &str, max: usize) -> &str {
    value.get(..max).unwrap_or(value)
}

/// A structurally valid ABA file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbaFile {
    lines: Vec<AbaLine>,
}

impl AbaFile {
    /// Parse an ABA file from any source implementing `Read`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::fs::File;
    /// use aba_afi::aba_format::AbaFile;
    ///
    /// let mut file = File::open("payments.aba")?;
    /// let aba = AbaFile::from_read(&mut file)?;
    /// println!("{} transactions", aba.transactions().count());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_read<R: Read>(reader: &mut R) -> Result<Self> {
        let buf_reader = BufReader::new(reader);
        let mut lines: Vec<String> = Vec::new();

        // Invalid UTF-8 becomes U+FFFD so the parser reports it as a
        // structural error on the right line.
        for line in buf_reader.split(b'\n') {
            let mut bytes = line?;
            if bytes.last() == Some(&b'\r') {
                bytes.pop();
            }
            lines.push(String::from_utf8_lossy(&bytes).into_owned());
        }

        Ok(Self::parse_lines(lines)?)
    }

    /// Classify newline-stripped lines and check the file structure.
    ///
    /// Every line must be 120 ASCII characters; that is checked for the
    /// whole file before any marker is looked at. Each line then needs a
    /// known marker, and the file exactly one header, as its first line,
    /// and exactly one control, as its last line.
    pub fn parse_lines<I, S>(raw_lines: I) -> std::result::Result<Self, FormatError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let raw_lines: Vec<S> = raw_lines.into_iter().collect();
        for (index, raw) in raw_lines.iter().enumerate() {
            let number = index + 1;
            let content = raw.as_ref();

            let length = content.chars().count();
            if length != RECORD_LENGTH {
                return Err(FormatError::WrongLineLength {
                    line: number,
                    length,
                    expected: RECORD_LENGTH,
                });
            }
            if !content.is_ascii() {
                return Err(FormatError::NonAscii { line: number });
            }
        }

        let mut lines = Vec::with_capacity(raw_lines.len());
        let mut header_line = None;
        let mut control_line = None;

        for (index, raw) in raw_lines.iter().enumerate() {
            let number = index + 1;
            let content = raw.as_ref();

            let marker = content.chars().next().unwrap_or_default();
            let kind = RecordKind::from_aba_marker(marker).ok_or_else(|| {
                FormatError::UnknownRecordType {
                    line: number,
                    marker: marker.to_string(),
                }
            })?;

            let seen = match kind {
                RecordKind::Header => Some(&mut header_line),
                RecordKind::Control => Some(&mut control_line),
                RecordKind::Transaction => None,
            };
            if let Some(seen) = seen {
                if seen.is_some() {
                    return Err(FormatError::DuplicateRecord { kind, line: number });
                }
                *seen = Some(number);
            }

            debug!("ABA line {}: {}", number, kind);
            lines.push(AbaLine {
                kind,
                number,
                content: content.to_string(),
            });
        }

        let header_line = header_line.ok_or(FormatError::MissingRecord(RecordKind::Header))?;
        let control_line = control_line.ok_or(FormatError::MissingRecord(RecordKind::Control))?;

        if header_line != 1 {
            return Err(FormatError::OutOfOrder {
                kind: RecordKind::Header,
                line: header_line,
            });
        }
        if control_line != lines.len() {
            return Err(FormatError::OutOfOrder {
                kind: RecordKind::Control,
                line: control_line,
            });
        }

        Ok(AbaFile { lines })
    }

    /// All lines in source order.
    pub fn lines(&self) -> &[AbaLine] {
        &self.lines
    }

    /// The header line; always the first line of a parsed file.
    pub fn header(&self) -> &AbaLine {
        &self.lines[0]
    }

    pub fn transactions(&self) -> impl Iterator<Item = &AbaLine> {
        self.lines
            .iter()
            .filter(|line| line.kind == RecordKind::Transaction)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Builds 120 character ABA lines for tests.
#[cfg(test)]
pub(crate) mod fixtures {
    use super::RECORD_LENGTH;

    /// Place `parts` at their offsets in a blank line starting with `marker`.
    pub fn line(marker: char, parts: &[(usize, &str)]) -> String {
        let mut bytes = vec![b' '; RECORD_LENGTH];
        bytes[0] = marker as u8;
        for (offset, text) in parts {
            bytes[*offset..*offset + text.len()].copy_from_slice(text.as_bytes());
        }
        String::from_utf8(bytes).unwrap()
    }

    /// Header with sender name and a DDMMYY process date.
    pub fn header(sender_name: &str, ddmmyy: &str) -> String {
        line('0', &[(30, sender_name), (74, ddmmyy)])
    }

    pub fn transaction(account: &str, cents: &str, name: &str, reference: &str) -> String {
        line(
            '1',
            &[
                (1, account),
                (21, cents),
                (30, name),
                (62, reference),
                (80, "012-345987654321"),
                (96, "PAYROLL OCT"),
            ],
        )
    }

    pub fn control() -> String {
        line('7', &[])
    }
}
