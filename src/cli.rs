use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{AmbiguityPolicy, UniquenessCheck};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Reconcile a course schedule workbook against an authoritative tally",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Overwrite target cells that disagree with the tally and report what did not match
    Reconcile(ReconcileArgs),
    /// Show how tally and target column headers line up
    Columns(ColumnsArgs),
    /// List duplicate rows (whole-row and identity-key) in one table
    Duplicates(DuplicatesArgs),
    /// Preview the first few rows of an anchored table
    Preview(PreviewArgs),
    /// Write the default configuration to a YAML file
    InitConfig(InitConfigArgs),
}

#[derive(Debug, Args)]
pub struct ReconcileArgs {
    /// Authoritative tally (workbook, CSV or TSV)
    #[arg(short = 't', long = "tally")]
    pub tally: PathBuf,
    /// Workbook to correct in place
    #[arg(short = 'T', long = "target")]
    pub target: PathBuf,
    /// Worksheet holding the tally (defaults to the first sheet)
    #[arg(long = "tally-sheet")]
    pub tally_sheet: Option<String>,
    /// Worksheet holding the target table (defaults to the first sheet)
    #[arg(long = "target-sheet")]
    pub target_sheet: Option<String>,
    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Header text marking the top-left cell of each table (overrides config)
    #[arg(long)]
    pub anchor: Option<String>,
    /// How to treat a tally row that matches several target rows (overrides config)
    #[arg(long, value_enum)]
    pub ambiguity: Option<AmbiguityPolicy>,
    /// Compute and report changes without saving the target
    #[arg(long = "dry-run")]
    pub dry_run: bool,
    /// CSV delimiter character for a delimited tally (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of a delimited tally (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct ColumnsArgs {
    /// Authoritative tally (workbook, CSV or TSV)
    #[arg(short = 't', long = "tally")]
    pub tally: PathBuf,
    /// Target workbook or delimited file
    #[arg(short = 'T', long = "target")]
    pub target: PathBuf,
    /// Worksheet holding the tally
    #[arg(long = "tally-sheet")]
    pub tally_sheet: Option<String>,
    /// Worksheet holding the target table
    #[arg(long = "target-sheet")]
    pub target_sheet: Option<String>,
    /// Header text marking the top-left cell of each table
    #[arg(long, default_value = crate::config::DEFAULT_ANCHOR)]
    pub anchor: String,
    /// CSV delimiter character for delimited inputs
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of delimited inputs (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct DuplicatesArgs {
    /// Workbook, CSV or TSV file to inspect
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Worksheet to read (defaults to the first sheet)
    #[arg(long)]
    pub sheet: Option<String>,
    /// YAML configuration file supplying anchor and key columns
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Header text marking the top-left cell of the table (overrides config)
    #[arg(long)]
    pub anchor: Option<String>,
    /// Columns that must be unique across rows (overrides config)
    #[arg(long, value_enum)]
    pub uniqueness: Option<UniquenessCheck>,
    /// CSV delimiter character
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding for delimited input (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Workbook, CSV or TSV file to preview
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Worksheet to read (defaults to the first sheet)
    #[arg(long)]
    pub sheet: Option<String>,
    /// Header text marking the top-left cell of the table
    #[arg(long, default_value = crate::config::DEFAULT_ANCHOR)]
    pub anchor: String,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
    /// CSV delimiter character
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding for delimited input (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct InitConfigArgs {
    /// Destination YAML file
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
    /// Replace the file if it already exists
    #[arg(long)]
    pub force: bool,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
