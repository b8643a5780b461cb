//! Output sink implementations
//!
//! Sinks write replay records as NDJSON, one record per line.

use anyhow::{Context, Result};
use rr_core::render::DrawCommand;
use rr_core::session::FrameSnapshot;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// One line of replay output
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    Snapshot {
        tick: usize,
        #[serde(flatten)]
        snapshot: FrameSnapshot,
    },
    Draw {
        tick: usize,
        frame_index: usize,
        commands: Vec<DrawCommand>,
    },
}

/// Trait for output sinks
pub trait Sink {
    fn send(&mut self, record: &Record) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// NDJSON writer over any `Write`
pub struct NdjsonSink<W: Write> {
    out: W,
    written: usize,
}

impl<W: Write> NdjsonSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, written: 0 }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl NdjsonSink<BufWriter<File>> {
    /// File sink (NDJSON), truncating any previous output
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file {}", path.display()))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl NdjsonSink<io::StdoutLock<'static>> {
    pub fn stdout() -> Self {
        Self::new(io::stdout().lock())
    }
}

impl<W: Write> Sink for NdjsonSink<W> {
    fn send(&mut self, record: &Record) -> Result<()> {
        serde_json::to_writer(&mut self.out, record)?;
        self.out.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
