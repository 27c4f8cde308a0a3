use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;
use tracks_core::Real;
use tracks_session::{MeasurementSession, SaveFormat, Settings, ViewLayout, event_permutation};

/// Tools for saved particle-track measurement sessions.
#[derive(Debug, Parser)]
#[command(author, version, about = "Bubble-chamber decay measurement tools")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Convert a saved session (.json or .csv) into a TABLE export.
    Export {
        /// Saved session to read.
        #[arg(long)]
        input: PathBuf,
        /// Destination table (.csv).
        #[arg(long)]
        output: PathBuf,
    },
    /// Print the calibrated values of every record as JSON.
    Summary {
        #[arg(long)]
        input: PathBuf,
    },
    /// Print the shared event permutation for `count` events.
    Shuffle {
        #[arg(long)]
        count: usize,
        /// Overrides SHUFFLING_SEED.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Validate a data folder and print the shuffled event order.
    Layout {
        #[arg(long)]
        dir: PathBuf,
        /// Overrides SHUFFLING_SEED.
        #[arg(long)]
        seed: Option<u64>,
    },
}

/// Calibrated view of one record.
#[derive(Debug, Serialize)]
struct RecordSummary {
    index: usize,
    name: String,
    kind_index: u8,
    event: Option<u32>,
    view: Option<u32>,
    radius_px: Option<Real>,
    radius_cm: Option<Real>,
    decay_length_px: Option<Real>,
    decay_length_cm: Option<Real>,
    magnification: Option<Real>,
    origin_vertex_depth_cm: Option<Real>,
    decay_vertex_depth_cm: Option<Real>,
    phi_proton: Option<Real>,
    phi_pion: Option<Real>,
}

#[derive(Debug, Serialize)]
struct EventFiles {
    event: usize,
    files: [PathBuf; 3],
}

fn load_session(path: &Path) -> Result<MeasurementSession> {
    MeasurementSession::load(path).with_context(|| format!("loading {}", path.display()))
}

fn export_table(input: &Path, output: &Path) -> Result<String> {
    if SaveFormat::from_path(output)? != SaveFormat::Table {
        bail!("export destination {} must be a .csv file", output.display());
    }
    let session = load_session(input)?;
    session.save(output, SaveFormat::Table)?;
    Ok(format!(
        "wrote {} records to {}",
        session.len(),
        output.display()
    ))
}

fn summarize(input: &Path) -> Result<String> {
    let session = load_session(input)?;
    let summary: Vec<RecordSummary> = session
        .records()
        .iter()
        .enumerate()
        .map(|(index, r)| RecordSummary {
            index,
            name: r.name().to_string(),
            kind_index: r.kind().index(),
            event: r.slice().map(|s| s.event),
            view: r.slice().map(|s| s.view),
            radius_px: r.radius_px(),
            radius_cm: r.radius_cm(),
            decay_length_px: r.decay_length_px(),
            decay_length_cm: r.decay_length_cm(),
            magnification: r.magnification(),
            origin_vertex_depth_cm: r.origin_vertex_depth_cm(),
            decay_vertex_depth_cm: r.decay_vertex_depth_cm(),
            phi_proton: r.opening_angles().map(|a| a.phi_proton),
            phi_pion: r.opening_angles().map(|a| a.phi_pion),
        })
        .collect();
    Ok(serde_json::to_string_pretty(&summary)?)
}

fn shuffle(count: usize, seed: u64) -> Result<String> {
    Ok(serde_json::to_string(&event_permutation(count, seed))?)
}

fn layout(dir: &Path, seed: u64) -> Result<String> {
    let layout = ViewLayout::discover(dir)
        .with_context(|| format!("checking data folder {}", dir.display()))?;
    let events: Vec<EventFiles> = layout
        .shuffled_events(seed)
        .into_iter()
        .enumerate()
        .map(|(event, files)| EventFiles {
            event,
            files: files.map(Path::to_path_buf),
        })
        .collect();
    info!("{} events, seed {seed}", events.len());
    Ok(serde_json::to_string_pretty(&events)?)
}

fn main() {
    env_logger::init();
    if let Err(err) = try_main() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::from_env();
    let output = match args.command {
        Command::Export { input, output } => export_table(&input, &output)?,
        Command::Summary { input } => summarize(&input)?,
        Command::Shuffle { count, seed } => {
            shuffle(count, seed.unwrap_or(settings.shuffling_seed))?
        }
        Command::Layout { dir, seed } => layout(&dir, seed.unwrap_or(settings.shuffling_seed))?,
    };
    println!("{output}");
    Ok(())
}
