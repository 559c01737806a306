//! Rossby - container file inspector.

use anyhow::Result;
use clap::Parser;
use rossby::format::{FormatFamily, SignatureDetector};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "rossby")]
#[command(about = "Classify scientific container files by signature", long_about = None)]
struct Args {
    /// Container files to classify
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Enable logging to specified file
    #[arg(long)]
    log: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging if --log option is provided
    if let Some(log_path) = &args.log {
        let log_path = log_path.clone();
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_writer(move || {
                std::fs::OpenOptions::new()
                    .create(true)
                    .write(true)
                    .truncate(true)
                    .open(&log_path)
                    .expect("Failed to open log file")
            })
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
        tracing::info!("Starting Rossby");
    }

    let mut unrecognized = false;
    for path in &args.files {
        if !path.exists() {
            eprintln!("Error: Path not found: {}", path.display());
            std::process::exit(1);
        }

        let family = SignatureDetector::classify(path);
        println!("{}: {}", path.display(), family);
        if family == FormatFamily::Unknown {
            unrecognized = true;
        }
    }

    if args.log.is_some() {
        tracing::info!("Rossby exited");
    }

    if unrecognized {
        std::process::exit(2);
    }
    Ok(())
}
