//! Decide whether an image (typically a candidate paper cover) is blank.
//!
//! Prints one status line on stdout and exits 0 when the image is blank,
//! 1 otherwise. Unreadable images print `ERROR:...` and count as not blank.

use clap::Parser;
use formpaper::{check_blank, BlankThresholds};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "check-blank-image",
    version,
    about = "Detect blank, near-white or logo-sized images"
)]
struct Cli {
    /// Image to check (PNG or JPEG).
    image: Option<PathBuf>,

    /// Fraction of near-white pixels above which the image is blank.
    #[arg(long, env = "BLANK_WHITE_THRESHOLD", default_value_t = 0.95)]
    threshold: f64,

    /// Images narrower than this are treated as logos.
    #[arg(long, default_value_t = 400)]
    min_width: u32,

    /// Images shorter than this are treated as logos.
    #[arg(long, default_value_t = 300)]
    min_height: u32,

    /// Enable DEBUG-level logs on stderr.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "warn" })),
        )
        .with_writer(io::stderr)
        .init();

    let Some(path) = cli.image else {
        println!("ERROR:No image path provided");
        return ExitCode::FAILURE;
    };

    let thresholds = BlankThresholds {
        white_ratio: cli.threshold,
        min_width: cli.min_width,
        min_height: cli.min_height,
    };
    let verdict = check_blank(&path, &thresholds);
    println!("{verdict}");

    if verdict.is_blank() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
