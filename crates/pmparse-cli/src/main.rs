//! pmparse - extract PubMed XML archives into JSONL records

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use indicatif::MultiProgress;

use pmparse::{Config, init_logging, run};

#[derive(Parser)]
#[command(name = "pmparse")]
#[command(about = "Extracts gzip-compressed PubMed XML archives into JSONL records")]
#[command(version)]
struct Cli {
    /// Directory containing .xml.gz archives
    input_dir: PathBuf,

    /// Output directory, one .jsonl file per archive (must be empty or absent)
    #[arg(short, long, default_value = "parsed_xml")]
    output_dir: PathBuf,

    /// Number of parallel workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Maximum archives to process
    #[arg(long)]
    max_files: Option<usize>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let multi = MultiProgress::new();

    // TTY runs stay quiet (warn) unless --debug, since the progress bars
    // show activity. Non-TTY runs log at info so there is some progress
    // indication in captured output.
    let is_tty = std::io::stderr().is_terminal();
    let quiet = is_tty && !cli.debug;
    init_logging(quiet, cli.debug, is_tty.then_some(&multi));

    let mut config = Config {
        input_dir: cli.input_dir,
        output_dir: cli.output_dir,
        max_files: cli.max_files,
        ..Default::default()
    };
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }

    let summary = run(&config, &multi)?;

    if summary.failed_files > 0 {
        log::error!(
            "{} of {} archives failed",
            summary.failed_files,
            summary.total_files
        );
        std::process::exit(1);
    }
    Ok(())
}
