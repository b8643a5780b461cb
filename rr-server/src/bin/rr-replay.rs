//! Headless replay script
//!
//! Loads one session, runs the viewer loop without a window and writes
//! NDJSON snapshots (or draw commands with `--render`) to stdout or a file.

use anyhow::{Context, Result};
use clap::Parser;
use rr_core::provider::{SessionKind, SessionSelection, TelemetryProvider};
use rr_core::{ReplayConfig, ReplaySession};
use rr_provider::{DemoProvider, FileProvider};
use rr_server::config::read_replay_config;
use rr_server::sinks::{NdjsonSink, Sink};
use rr_server::viewer::{self, OutputMode, ScriptedInput, ViewerOptions};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long)]
    year: i32,

    #[arg(short, long)]
    round: u32,

    /// R, S, Q or SQ
    #[arg(short, long, default_value = "R")]
    session: SessionKind,

    /// Cycles to run (default: until the last frame)
    #[arg(short, long)]
    ticks: Option<usize>,

    /// Emit every n-th cycle
    #[arg(short, long, default_value_t = 1)]
    every: usize,

    /// Directory holding session files
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Use the synthetic demo provider
    #[arg(long)]
    demo: bool,

    /// Emit draw commands instead of snapshots
    #[arg(long)]
    render: bool,

    /// Scripted key presses, e.g. "0:4,120:space,150:space"
    #[arg(short, long)]
    input: Option<ScriptedInput>,

    /// Replay config JSON
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays NDJSON
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let provider: Box<dyn TelemetryProvider> = if args.demo {
        Box::new(DemoProvider::new())
    } else {
        Box::new(FileProvider::new(
            args.data_dir.clone().unwrap_or_else(FileProvider::default_root),
        ))
    };

    let replay_config = match &args.config {
        Some(path) => read_replay_config(path)?,
        None => ReplayConfig::default(),
    };

    let selection = SessionSelection::new(args.year, args.round, args.session);
    info!(session = %selection, provider = provider.name(), "Loading session");
    let data = provider
        .load_session(&selection)
        .with_context(|| format!("Failed to load session {selection}"))?;
    let mut session = ReplaySession::new(data, &replay_config)?;

    let options = ViewerOptions {
        ticks: args.ticks,
        every: args.every,
        output: if args.render {
            OutputMode::DrawCommands
        } else {
            OutputMode::Snapshots
        },
    };
    let mut input = args.input.unwrap_or_default();

    let mut sink: Box<dyn Sink> = match &args.output {
        Some(path) => Box::new(NdjsonSink::create(path)?),
        None => Box::new(NdjsonSink::stdout()),
    };

    let emitted = viewer::run(&mut session, options, &mut input, sink.as_mut())?;
    info!(emitted, final_frame = session.playback().frame_index, "Replay finished");

    Ok(())
}
