//! Export the embedded images of a PDF and print a JSON report.
//!
//! Images smaller than 100 px on a side are ignored. Each exported PNG gets
//! a 150 px JPEG thumbnail and a quality score; the best-scoring image is
//! reported as the cover.

use anyhow::{Context, Result};
use clap::Parser;
use formpaper::export_images;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "extract-images",
    version,
    about = "Extract embedded images from a PDF as PNG files with thumbnails"
)]
struct Cli {
    /// PDF file.
    pdf: PathBuf,

    /// Destination folder. Default: `images/` next to the PDF.
    output_dir: Option<PathBuf>,

    /// Enable DEBUG-level logs on stderr.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "warn" })),
        )
        .with_writer(io::stderr)
        .init();

    if !cli.pdf.is_file() {
        eprintln!("File not found: {}", cli.pdf.display());
        return ExitCode::FAILURE;
    }

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let report = export_images(&cli.pdf, cli.output_dir.as_deref())
        .await
        .context("Image extraction failed")?;
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("Failed to serialize report")?
    );
    Ok(())
}
