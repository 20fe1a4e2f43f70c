//! Find the DOI of a paper and print its CrossRef record as JSON.
//!
//! When CrossRef cannot be reached the record still carries the DOI and its
//! `https://doi.org/` URL, with the other fields empty.

use anyhow::{Context, Result};
use clap::Parser;
use formpaper::doi::crossref::DEFAULT_MAILTO;
use formpaper::{doi_from_pdf, CrossRefClient, PaperError};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "extract-doi",
    version,
    about = "Extract a DOI from a PDF and fetch its metadata from CrossRef"
)]
struct Cli {
    /// PDF file.
    pdf: PathBuf,

    /// Contact address sent to CrossRef in the User-Agent.
    #[arg(long, env = "CROSSREF_MAILTO", default_value = DEFAULT_MAILTO)]
    mailto: String,

    /// CrossRef request timeout in seconds.
    #[arg(long, default_value_t = 10)]
    timeout: u64,

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
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let doi = match doi_from_pdf(&cli.pdf).await {
        Ok(doi) => doi,
        Err(PaperError::NoText { .. }) => anyhow::bail!("Could not extract text from the PDF"),
        Err(PaperError::DoiNotFound { .. }) => anyhow::bail!("No DOI found in the PDF"),
        Err(e) => return Err(e).context("Text extraction failed"),
    };

    let client = CrossRefClient::new(&cli.mailto, cli.timeout).context("Failed to build HTTP client")?;
    let metadata = client.lookup_or_fallback(&doi).await;
    println!(
        "{}",
        serde_json::to_string_pretty(&metadata).context("Failed to serialize metadata")?
    );
    Ok(())
}
