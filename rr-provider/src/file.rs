//! File provider reading pre-extracted sessions from a data directory
//!
//! Layout:
//!
//! ```text
//! <root>/events-2024.json          season index (optional)
//! <root>/2024-01-R.json            one session per file
//! <root>/2024-02-S.json.zst        zstd-compressed variant
//! ```
//!
//! Without a season index, events are derived from the session file names.

use anyhow::{Context, Result};
use rr_core::provider::{
    EventSummary, ProviderError, SessionData, SessionKind, SessionSelection, TelemetryProvider,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const ZSTD_LEVEL: i32 = 3;

pub struct FileProvider {
    root: PathBuf,
}

impl FileProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<platform data dir>/race-replay`, falling back to the working directory
    pub fn default_root() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("race-replay")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn session_path(&self, selection: &SessionSelection, compressed: bool) -> PathBuf {
        let ext = if compressed { "json.zst" } else { "json" };
        self.root.join(format!("{selection}.{ext}"))
    }

    fn index_path(&self, year: i32) -> PathBuf {
        self.root.join(format!("events-{year}.json"))
    }

    /// Write a session, optionally zstd-compressed, creating the root if needed
    pub fn save_session(
        &self,
        selection: &SessionSelection,
        data: &SessionData,
        compress: bool,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create data dir {}", self.root.display()))?;

        let json = serde_json::to_vec(data).context("Failed to encode session")?;
        let bytes = if compress {
            zstd::encode_all(json.as_slice(), ZSTD_LEVEL).context("Failed to compress session")?
        } else {
            json
        };

        let path = self.session_path(selection, compress);
        fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "Saved session");
        Ok(path)
    }

    pub fn save_events(&self, year: i32, events: &[EventSummary]) -> Result<PathBuf> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create data dir {}", self.root.display()))?;
        let path = self.index_path(year);
        let json = serde_json::to_vec_pretty(events).context("Failed to encode events")?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Session files present in the root, keyed by (year, round)
    fn scan_sessions(&self) -> BTreeMap<(i32, u32), Vec<SessionKind>> {
        let mut found: BTreeMap<(i32, u32), Vec<SessionKind>> = BTreeMap::new();
        let Ok(entries) = fs::read_dir(&self.root) else {
            return found;
        };

        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(selection) = name.to_str().and_then(parse_session_file_name) else {
                continue;
            };
            let kinds = found.entry((selection.year, selection.round)).or_default();
            if !kinds.contains(&selection.session) {
                kinds.push(selection.session);
            }
        }
        for kinds in found.values_mut() {
            kinds.sort_by_key(|k| SessionKind::ALL.iter().position(|a| a == k));
        }
        found
    }

    fn indexed_years(&self) -> Vec<i32> {
        let Ok(entries) = fs::read_dir(&self.root) else {
            return Vec::new();
        };
        entries
            .flatten()
            .filter_map(|e| {
                let name = e.file_name();
                let name = name.to_str()?;
                name.strip_prefix("events-")?
                    .strip_suffix(".json")?
                    .parse()
                    .ok()
            })
            .collect()
    }
}

impl Default for FileProvider {
    fn default() -> Self {
        Self::new(Self::default_root())
    }
}

/// Parse `2024-01-R.json` / `2024-01-R.json.zst`
fn parse_session_file_name(name: &str) -> Option<SessionSelection> {
    let stem = name
        .strip_suffix(".json.zst")
        .or_else(|| name.strip_suffix(".json"))?;
    let mut parts = stem.splitn(3, '-');
    let year = parts.next()?.parse().ok()?;
    let round = parts.next()?.parse().ok()?;
    let session = parts.next()?.parse().ok()?;
    Some(SessionSelection::new(year, round, session))
}

fn read_session_bytes(path: &Path) -> Result<Vec<u8>> {
    let raw = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    if path.extension().is_some_and(|e| e == "zst") {
        zstd::decode_all(raw.as_slice())
            .with_context(|| format!("Failed to decompress {}", path.display()))
    } else {
        Ok(raw)
    }
}

impl TelemetryProvider for FileProvider {
    fn name(&self) -> &str {
        "File"
    }

    fn available_years(&self) -> Vec<i32> {
        let mut years = self.indexed_years();
        years.extend(self.scan_sessions().keys().map(|(year, _)| *year));
        years.sort_unstable();
        years.dedup();
        years
    }

    fn list_events(&self, year: i32) -> Result<Vec<EventSummary>, ProviderError> {
        let index = self.index_path(year);
        if index.exists() {
            let data = fs::read(&index)?;
            let mut events: Vec<EventSummary> = serde_json::from_slice(&data)?;
            events.sort_by_key(|e| e.round);
            return Ok(events);
        }

        let events: Vec<EventSummary> = self
            .scan_sessions()
            .into_iter()
            .filter(|((y, _), _)| *y == year)
            .map(|((_, round), sessions)| EventSummary {
                round,
                event_name: format!("Round {round}"),
                country: String::new(),
                date: None,
                sessions,
            })
            .collect();

        if events.is_empty() {
            return Err(ProviderError::UnknownSeason(year));
        }
        Ok(events)
    }

    fn load_session(&self, selection: &SessionSelection) -> Result<SessionData, ProviderError> {
        let path = [true, false]
            .into_iter()
            .map(|compressed| self.session_path(selection, compressed))
            .find(|p| p.exists())
            .ok_or(ProviderError::NotFound(*selection))?;

        debug!(path = %path.display(), "Loading session file");
        let bytes = read_session_bytes(&path).map_err(|e| ProviderError::Backend(format!("{e:#}")))?;
        let data: SessionData = serde_json::from_slice(&bytes)?;

        if let Err(e) = data.validate() {
            warn!(session = %selection, error = %e, "Rejected session file");
            return Err(e);
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_session_file_name() {
        assert_eq!(
            parse_session_file_name("2024-01-R.json"),
            Some(SessionSelection::new(2024, 1, SessionKind::Race))
        );
        assert_eq!(
            parse_session_file_name("2023-12-SQ.json.zst"),
            Some(SessionSelection::new(2023, 12, SessionKind::SprintQualifying))
        );
        assert_eq!(parse_session_file_name("events-2024.json"), None);
        assert_eq!(parse_session_file_name("2024-01-FP1.json"), None);
        assert_eq!(parse_session_file_name("notes.txt"), None);
    }

    #[test]
    fn test_default_root_name() {
        assert!(FileProvider::default_root().ends_with("race-replay"));
    }
}
