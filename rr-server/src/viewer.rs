//! Headless viewer loop
//!
//! Drives a [`ReplaySession`] the way an interactive window would: each
//! cycle drains queued key presses, advances playback once and then emits
//! the current frame, either as a snapshot or as recorded draw commands.

use crate::sinks::{Record, Sink};
use anyhow::{bail, Context, Result};
use rr_core::playback::PlaybackCommand;
use rr_core::render::CommandRecorder;
use rr_core::session::ReplaySession;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::debug;

/// Source of input commands, polled once per cycle
pub trait InputSource {
    fn poll(&mut self, tick: usize) -> Vec<PlaybackCommand>;

    /// True once no further commands can arrive
    fn is_exhausted(&self) -> bool {
        false
    }
}

/// Key presses scheduled for given ticks, e.g. `10:space` or `40:right`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptedInput {
    schedule: BTreeMap<usize, Vec<PlaybackCommand>>,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tick: usize, command: PlaybackCommand) {
        self.schedule.entry(tick).or_default().push(command);
    }

    pub fn is_empty(&self) -> bool {
        self.schedule.is_empty()
    }
}

impl FromStr for ScriptedInput {
    type Err = anyhow::Error;

    /// Comma-separated `TICK:KEY` pairs
    fn from_str(s: &str) -> Result<Self> {
        let mut input = Self::new();
        for item in s.split(',').map(str::trim).filter(|i| !i.is_empty()) {
            let Some((tick, key)) = item.split_once(':') else {
                bail!("Expected TICK:KEY, got {item:?}");
            };
            let tick = tick
                .trim()
                .parse()
                .with_context(|| format!("Invalid tick in {item:?}"))?;
            let command = key.trim().parse::<PlaybackCommand>()?;
            input.push(tick, command);
        }
        Ok(input)
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self, tick: usize) -> Vec<PlaybackCommand> {
        self.schedule.remove(&tick).unwrap_or_default()
    }

    fn is_exhausted(&self) -> bool {
        self.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Snapshots,
    DrawCommands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewerOptions {
    /// Cycles to run; `None` runs until playback reaches the last frame, or
    /// until it is paused with no input left to resume it
    pub ticks: Option<usize>,
    /// Emit every n-th cycle
    pub every: usize,
    pub output: OutputMode,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            ticks: None,
            every: 1,
            output: OutputMode::Snapshots,
        }
    }
}

/// Run the cooperative loop, returning the number of records emitted
pub fn run(
    session: &mut ReplaySession,
    options: ViewerOptions,
    input: &mut dyn InputSource,
    sink: &mut dyn Sink,
) -> Result<usize> {
    let every = options.every.max(1);
    let mut recorder = CommandRecorder::new();
    let mut emitted = 0;
    let mut tick = 0;

    loop {
        if options.ticks.is_some_and(|limit| tick >= limit) {
            break;
        }

        for command in input.poll(tick) {
            debug!(tick, %command, "Input");
            session.apply(command);
        }
        session.update();

        if tick % every == 0 {
            let record = match options.output {
                OutputMode::Snapshots => Record::Snapshot {
                    tick,
                    snapshot: session.snapshot(),
                },
                OutputMode::DrawCommands => {
                    session.render(&mut recorder);
                    Record::Draw {
                        tick,
                        frame_index: session.playback().frame_index,
                        commands: recorder.drain(),
                    }
                }
            };
            sink.send(&record)?;
            emitted += 1;
        }
        tick += 1;

        if options.ticks.is_none() {
            let playback = session.playback();
            if playback.frame_index + 1 >= playback.n_frames {
                break;
            }
            if playback.paused && input.is_exhausted() {
                debug!(tick, frame = playback.frame_index, "Paused with no input left");
                break;
            }
        }
    }

    sink.flush()?;
    Ok(emitted)
}
