//! ABA to AFI Converter Library
//!
//! A library for turning fixed-width ABA bank payment files into
//! comma-delimited AFI payment files.
//!
//! # Supported Formats
//!
//! - **ABA**: 120 character fixed-width lines (header `0`, transactions `1`,
//!   control `7`)
//! - **AFI**: comma-delimited records (header `1`, transactions `2`, control `3`)
//!
//! # Features
//!
//! - Validate the structure of ABA files
//! - Convert ABA payments into AFI records with per-field validation
//! - Recompute control totals: amount sum, transaction count and hash total
//! - Read AFI files back and check their control totals
//!
//! # Examples
//!
//! ## Converting an ABA file
//!
//! ```no_run
//! use std::fs::File;
//! use aba_afi::aba_format::AbaFile;
//! use aba_afi::conversion::Converter;
//!
//! let mut input = File::open("payments.aba")?;
//! let aba = AbaFile::from_read(&mut input)?;
//!
//! let today = chrono::Local::now().date_naive();
//! let (afi, summary) = Converter::new(today).convert(&aba)?;
//!
//! let mut output = File::create("payments.afi")?;
//! afi.write_to(&mut output)?;
//! println!("{} records written", summary.records);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Checking an AFI file
//!
//! ```no_run
//! use std::fs::File;
//! use aba_afi::afi_format::AfiFile;
//!
//! let mut input = File::open("payments.afi")?;
//! let totals = AfiFile::from_read(&mut input)?.verify_totals()?;
//! println!("{} payments, {} total", totals.transaction_count, totals.total_amount());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod aba_format;
pub mod afi_format;
pub mod conversion;
pub mod error;
pub mod field;
pub mod record;

use std::path::{Path, PathBuf};
use std::str::FromStr;

// Re-export commonly used types
pub use aba_format::AbaFile;
pub use afi_format::{AfiFile, ControlTotals};
pub use conversion::{ConversionSummary, Converter};
pub use error::{Error, FormatError, Result, ValidationError};
pub use field::{Field, FieldKind};
pub use record::{Record, RecordKind};

/// Supported payment file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Fixed-width ABA input
    Aba,
    /// Comma-delimited AFI output
    Afi,
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "aba" => Ok(Format::Aba),
            "afi" => Ok(Format::Afi),
            _ => Err(Error::InvalidFormat(s.to_string())),
        }
    }
}

impl Format {
    /// Detect the format from a file extension, ignoring ASCII case.
    pub fn from_path(path: &Path) -> Result<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| Error::InvalidFormat(path.display().to_string()))?
            .parse()
    }

    /// Get file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Aba => "aba",
            Format::Afi => "afi",
        }
    }
}

/// Path of the AFI file written next to an ABA input.
pub fn afi_path_for(input: &Path) -> PathBuf {
    input.with_extension(Format::Afi.extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_str() {
        assert_eq!("aba".parse::<Format>().unwrap(), Format::Aba);
        assert_eq!("ABA".parse::<Format>().unwrap(), Format::Aba);
        assert_eq!("afi".parse::<Format>().unwrap(), Format::Afi);
        assert!("csv".parse::<Format>().is_err());
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(Format::from_path(Path::new("in/pay.ABA")).unwrap(), Format::Aba);
        assert_eq!(Format::from_path(Path::new("pay.aba")).unwrap(), Format::Aba);
        assert!(Format::from_path(Path::new("pay.txt")).is_err());
        assert!(Format::from_path(Path::new("pay")).is_err());
    }

    #[test]
    fn test_afi_path_for() {
        assert_eq!(
            afi_path_for(Path::new("/data/October.ABA")),
            PathBuf::from("/data/October.afi")
        );
        assert_eq!(afi_path_for(Path::new("run.1.aba")), PathBuf::from("run.1.afi"));
    }
}
