use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Map columns between tabular files and transfer their data", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// YAML configuration file with history/statistics paths and sample sizes
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Mapping history log (overrides the configuration file)
    #[arg(long = "history", global = true)]
    pub history: Option<PathBuf>,
    /// JSON file holding usage statistics (overrides the configuration file)
    #[arg(long = "stats-file", global = true)]
    pub stats_file: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List source columns with sample values and the destination columns
    Columns(ColumnsArgs),
    /// Copy mapped source columns into a copy of the destination file
    Transfer(TransferArgs),
    /// List recorded mapping sessions
    History(HistoryArgs),
    /// Show usage statistics
    Stats,
}

#[derive(Debug, Args)]
pub struct TableArgs {
    /// Source file supplying values (CSV, TSV, or spreadsheet)
    #[arg(short = 's', long = "source")]
    pub source: PathBuf,
    /// Destination file providing the output layout (CSV, TSV, or spreadsheet)
    #[arg(short = 'd', long = "destination")]
    pub destination: PathBuf,
    /// Delimiter for delimited-text files (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of delimited-text input (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct ColumnsArgs {
    #[command(flatten)]
    pub tables: TableArgs,
    /// Distinct values to show per source column
    #[arg(long)]
    pub samples: Option<usize>,
}

#[derive(Debug, Args)]
pub struct TransferArgs {
    #[command(flatten)]
    pub tables: TableArgs,
    /// Output file; the extension picks CSV/TSV or xlsx (defaults to <destination>_updated.xlsx)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Mapping of the form `destination=source`; unmatched case is resolved case-insensitively
    #[arg(short = 'm', long = "map", value_parser = parse_mapping, action = clap::ArgAction::Append)]
    pub mappings: Vec<(String, String)>,
    /// Replay the mappings of history session N (as numbered by `history`)
    #[arg(long, conflicts_with = "mappings")]
    pub session: Option<usize>,
    /// Show the mapping preview and the first output rows without writing anything
    #[arg(long = "dry-run")]
    pub dry_run: bool,
    /// Rows shown by --dry-run
    #[arg(long = "preview-rows", default_value_t = 10)]
    pub preview_rows: usize,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Print the column pairs of each session
    #[arg(long)]
    pub details: bool,
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

pub fn parse_mapping(value: &str) -> Result<(String, String), String> {
    let (destination, source) = value
        .split_once('=')
        .ok_or_else(|| format!("Mapping '{value}' must look like destination=source"))?;
    let destination = destination.trim();
    let source = source.trim();
    if destination.is_empty() || source.is_empty() {
        return Err(format!(
            "Mapping '{value}' needs both a destination and a source column"
        ));
    }
    Ok((destination.to_string(), source.to_string()))
}
