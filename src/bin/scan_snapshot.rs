//! Scan a saved page snapshot and print the detected artifacts as JSON.
//!
//! Reads the snapshot from a file, or from stdin when no path (or `-`) is
//! given. With `--save` every artifact is also sent to the persistence
//! service and the resulting events are printed alongside.

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use artifact_sync::sync::SyncClient;
use artifact_sync::{Detector, Event, Options, Page, Settings, DEFAULT_SERVER_URL};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scan_snapshot", about = "Detect artifacts in an HTML snapshot")]
struct Cli {
    /// Snapshot file; stdin when omitted or `-`
    input: Option<PathBuf>,

    /// URL the snapshot was taken at, used for frame origin checks
    #[arg(long)]
    url: Option<String>,

    /// Print the diagnostic report instead of the artifacts
    #[arg(long)]
    debug: bool,

    /// Save the artifacts through the persistence service
    #[arg(long, requires = "project_path")]
    save: bool,

    /// Directory the service writes into
    #[arg(long)]
    project_path: Option<String>,

    /// Persistence service base URL
    #[arg(long, default_value = DEFAULT_SERVER_URL)]
    server_url: String,

    /// Apply reveal and pacing delays as a live page would
    #[arg(long)]
    live_timing: bool,
}

#[derive(Serialize)]
struct Output {
    artifacts: Vec<artifact_sync::Artifact>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    events: Vec<Event>,
}

fn read_input(path: Option<&PathBuf>) -> io::Result<Vec<u8>> {
    match path {
        Some(p) if p.as_os_str() != "-" => std::fs::read(p),
        _ => {
            let mut bytes = Vec::new();
            io::stdin().read_to_end(&mut bytes)?;
            Ok(bytes)
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("artifact_sync=warn")),
        )
        .init();

    let cli = Cli::parse();
    let bytes = match read_input(cli.input.as_ref()) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Failed to read snapshot: {e}");
            return ExitCode::FAILURE;
        }
    };

    let options = if cli.live_timing { Options::default() } else { Options::immediate() };
    let page = Page::from_bytes(&bytes, cli.url.as_deref());
    let settings = Settings {
        is_enabled: false,
        project_path: cli.project_path.clone().unwrap_or_default(),
        server_url: cli.server_url.clone(),
    };
    let detector = Detector::with_settings(options.clone(), settings);

    let json = if cli.debug {
        let report = detector.debug_report(&page).await;
        serde_json::to_string_pretty(&report)
    } else {
        let artifacts = detector.detect(&page).await.artifacts;
        let mut events = Vec::new();
        if cli.save {
            let client = match SyncClient::new(&cli.server_url, &options) {
                Ok(client) => client,
                Err(e) => {
                    eprintln!("Failed to create client: {e}");
                    return ExitCode::FAILURE;
                }
            };
            let project_path = cli.project_path.as_deref().unwrap_or_default();
            events = client.save_all(&artifacts, project_path).await;
        }
        serde_json::to_string_pretty(&Output { artifacts, events })
    };

    match json {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to encode output: {e}");
            ExitCode::FAILURE
        }
    }
}
