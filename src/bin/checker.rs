//! AFI Check - CLI tool for checking the control totals of an AFI file.

use aba_afi::{AfiFile, Result};
use clap::Parser;
use std::fs::File;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "afi_check")]
#[command(about = "Recompute and check the control totals of an AFI payment file", long_about = None)]
struct Cli {
    /// AFI file path
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

    let mut file = File::open(&cli.input)?;
    let afi = AfiFile::from_read(&mut file)?;
    let totals = afi.verify_totals()?;

    println!("File: {}", cli.input.display());
    println!("Records: {}", afi.len());
    println!("Transactions: {}", totals.transaction_count);
    println!("Total: {}", totals.total_amount());
    println!("Hash total: {}", totals.hash_total);
    println!("Control totals match");

    Ok(())
}
