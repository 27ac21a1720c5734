//! Error types for the aba_afi library.

use crate::record::RecordKind;
use crate::field::{FieldKind, LengthRule};
use std::io;
use thiserror::Error;

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while reading, converting or writing files.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error occurred during read or write operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error reading or writing comma-delimited AFI data.
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Structural problem with an input file.
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    /// A field failed its encoding rules.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A field failed its encoding rules while converting a given input line.
    #[error("Validation error at line {line}: {source}")]
    Record {
        line: usize,
        #[source]
        source: ValidationError,
    },

    /// Invalid or unsupported file format.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// A control record disagrees with the transactions it closes.
    #[error("Control record {field} is {recorded}, transactions give {computed}")]
    TotalsMismatch {
        field: FieldKind,
        recorded: String,
        computed: String,
    },
}

/// Structural errors in ABA or AFI files. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("wrong line length at line {line}: {length} characters, expected {expected}")]
    WrongLineLength {
        line: usize,
        length: usize,
        expected: usize,
    },

    #[error("line {line} contains non-ASCII characters")]
    NonAscii { line: usize },

    #[error("unknown record type {marker:?} at line {line}")]
    UnknownRecordType { line: usize, marker: String },

    #[error("missing required record: {0}")]
    MissingRecord(RecordKind),

    #[error("duplicate record: {kind} at line {line}")]
    DuplicateRecord { kind: RecordKind, line: usize },

    #[error("record out of order: {kind} at line {line}")]
    OutOfOrder { kind: RecordKind, line: usize },

    #[error("AFI record at line {line} has {found} fields, expected {expected}")]
    FieldCount {
        line: usize,
        found: usize,
        expected: usize,
    },
}

/// Field-level encoding failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("length mismatch in {field}: {actual} characters, expected {expected}")]
    Length {
        field: FieldKind,
        actual: usize,
        expected: LengthRule,
    },

    #[error("invalid value in {field}: {value:?}")]
    Value { field: FieldKind, value: String },

    #[error("invalid character {character:?} in {field}: {value:?}")]
    Character {
        field: FieldKind,
        character: char,
        value: String,
    },

    #[error("{field} {value} is not a calendar date (YYMMDD)")]
    NotADate { field: FieldKind, value: String },

    #[error("{field} {value} must be between {earliest} and {latest} (YYMMDD)")]
    DateOutOfRange {
        field: FieldKind,
        value: String,
        earliest: String,
        latest: String,
    },

    #[error("{field} must be greater than zero")]
    NotPositive { field: FieldKind },
}
