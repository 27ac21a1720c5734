//! ABA Converter - CLI tool for converting ABA payment files into AFI files.
//!
//! The output is written next to the input, with an `.afi` extension.
//! Set `RUST_LOG=info` (or `debug`) to see progress.

use aba_afi::{afi_path_for, AbaFile, Converter, Error, Format, Result};
use clap::Parser;
use log::info;
use std::fs::{self, File};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "aba_converter")]
#[command(about = "Convert an ABA payment file into an AFI payment file", long_about = None)]
struct Cli {
    /// Input ABA file path (.aba)
    input: PathBuf,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if Format::from_path(&cli.input)? != Format::Aba {
        return Err(Error::InvalidFormat(format!(
            "{} is not an ABA file",
            cli.input.display()
        )));
    }

    let mut file = File::open(&cli.input)?;
    let aba = AbaFile::from_read(&mut file)?;
    info!("Read {} ABA lines from {}", aba.len(), cli.input.display());

    let today = chrono::Local::now().date_naive();
    let (afi, summary) = Converter::new(today).convert(&aba)?;

    // Encode fully before touching the output path.
    let mut buffer = Vec::new();
    afi.write_to(&mut buffer)?;

    let output = afi_path_for(&cli.input);
    fs::write(&output, buffer)?;
    info!("Wrote {} AFI records to {}", afi.len(), output.display());

    println!("Output: {}", output.display());
    println!("Records: {}", summary.records);
    println!("Transactions: {}", summary.totals.transaction_count);
    println!("Total: {}", summary.totals.total_amount());
    println!("Hash total: {}", summary.totals.hash_total);

    Ok(())
}
