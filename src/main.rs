// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use medicard_scanner::TargetContext;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "medicard-scanner")]
#[command(about = "Scan and resolve MediCard patient and prescription QR codes")]
#[command(version = medicard_scanner::constants::app_info::version())]
struct Cli {
    /// Configuration file (default: <config dir>/medicard-scanner/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List cameras found in an image source directory
    List {
        /// Directory of images (or of per-camera subdirectories)
        #[arg(short, long)]
        source: PathBuf,
    },

    /// Open the scanner on a virtual camera and resolve the first code seen
    Scan {
        /// Directory of images (or of per-camera subdirectories)
        #[arg(short, long)]
        source: PathBuf,

        /// Flow the scan is for: search, prescription, verify, dispense
        #[arg(long, default_value = "search")]
        context: TargetContext,

        /// Camera id to switch to once scanning (default: rear-facing or first)
        #[arg(long)]
        camera: Option<String>,

        /// Record tables as JSON (default: bundled demo records)
        #[arg(long)]
        records: Option<PathBuf>,

        /// Modal title override
        #[arg(long)]
        title: Option<String>,

        /// Modal subtitle override
        #[arg(long)]
        subtitle: Option<String>,

        /// Give up after this many seconds without a code
        #[arg(long, default_value = "10")]
        timeout: u64,
    },

    /// Resolve decoded QR text without a camera
    Resolve {
        /// Flow the scan is for: search, prescription, verify, dispense
        #[arg(long, default_value = "search")]
        context: TargetContext,

        /// Record tables as JSON (default: bundled demo records)
        #[arg(long)]
        records: Option<PathBuf>,

        /// The decoded text
        text: String,
    },

    /// Print the QR payload text for a patient or prescription
    Payload {
        /// Patient MediCard id
        #[arg(long, conflicts_with = "rx", required_unless_present = "rx")]
        patient: Option<String>,

        /// Patient name to embed (patient payloads only)
        #[arg(long, requires = "patient")]
        name: Option<String>,

        /// Prescription id
        #[arg(long)]
        rx: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG to control log level, e.g. RUST_LOG=medicard_scanner=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List { source } => cli::list_cameras(cli.config.as_deref(), &source).await,
        Commands::Scan {
            source,
            context,
            camera,
            records,
            title,
            subtitle,
            timeout,
        } => {
            cli::scan(
                cli.config.as_deref(),
                cli::ScanArgs {
                    source,
                    context,
                    camera,
                    records,
                    title,
                    subtitle,
                    timeout,
                },
            )
            .await
        }
        Commands::Resolve {
            context,
            records,
            text,
        } => cli::resolve(context, records.as_deref(), &text),
        Commands::Payload { patient, name, rx } => cli::payload(patient, name, rx),
    }
}
