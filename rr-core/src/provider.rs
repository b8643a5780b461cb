//! Telemetry provider trait definition

use crate::geometry::{drs_zones_from_indicator, DrsZone};
use crate::model::{Color, Frame, SessionAggregates, SessionMetadata};
use crate::point::Point2;
use crate::qualifying::QualifyingData;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Kind of session within a race weekend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionKind {
    #[serde(rename = "R")]
    Race,
    #[serde(rename = "S")]
    Sprint,
    #[serde(rename = "Q")]
    Qualifying,
    #[serde(rename = "SQ")]
    SprintQualifying,
}

impl SessionKind {
    pub const ALL: [SessionKind; 4] = [
        SessionKind::Race,
        SessionKind::Sprint,
        SessionKind::Qualifying,
        SessionKind::SprintQualifying,
    ];

    pub fn code(self) -> &'static str {
        match self {
            SessionKind::Race => "R",
            SessionKind::Sprint => "S",
            SessionKind::Qualifying => "Q",
            SessionKind::SprintQualifying => "SQ",
        }
    }

    /// Sessions that produce a multi-driver race replay
    pub fn has_race_frames(self) -> bool {
        matches!(self, SessionKind::Race | SessionKind::Sprint)
    }

    /// Sessions that carry knockout results and per-segment laps
    pub fn is_qualifying(self) -> bool {
        matches!(self, SessionKind::Qualifying | SessionKind::SprintQualifying)
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for SessionKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ProviderError::InvalidSession(s.to_string()))
    }
}

/// Which session to load: (year, round, session kind)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionSelection {
    pub year: i32,
    pub round: u32,
    pub session: SessionKind,
}

impl SessionSelection {
    pub fn new(year: i32, round: u32, session: SessionKind) -> Self {
        Self {
            year,
            round,
            session,
        }
    }
}

impl fmt::Display for SessionSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}-{}", self.year, self.round, self.session)
    }
}

/// Position trace of the lap used to reconstruct the track
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReferenceLap {
    pub points: Vec<Point2>,
    /// DRS open indicator per sample, when the lap carries the channel
    #[serde(default)]
    pub drs: Option<Vec<bool>>,
}

impl ReferenceLap {
    pub fn drs_zones(&self) -> Vec<DrsZone> {
        self.drs
            .as_deref()
            .map(drs_zones_from_indicator)
            .unwrap_or_default()
    }
}

/// Everything a replay needs for one session
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default)]
    pub metadata: SessionMetadata,
    /// `None` when no lap had usable telemetry
    #[serde(default)]
    pub reference_lap: Option<ReferenceLap>,
    pub frames: Vec<Frame>,
    #[serde(default)]
    pub driver_colors: HashMap<String, Color>,
    #[serde(default)]
    pub aggregates: SessionAggregates,
    /// Results and flying laps, only for Q and SQ sessions
    #[serde(default, skip_serializing_if = "QualifyingData::is_empty")]
    pub qualifying: QualifyingData,
}

impl SessionData {
    /// Check frame and reference-lap shape once, at the provider boundary
    pub fn validate(&self) -> Result<(), ProviderError> {
        let mut last_t = f64::NEG_INFINITY;
        for (i, frame) in self.frames.iter().enumerate() {
            if !frame.t.is_finite() || frame.t < last_t {
                return Err(ProviderError::InvalidData(format!(
                    "frame {i}: time {} is not monotonic",
                    frame.t
                )));
            }
            last_t = frame.t;

            for (code, state) in &frame.drivers {
                if !(state.x.is_finite() && state.y.is_finite()) {
                    return Err(ProviderError::InvalidData(format!(
                        "frame {i}: driver {code} has a non-finite position"
                    )));
                }
                if state.lap == 0 || state.position == 0 {
                    return Err(ProviderError::InvalidData(format!(
                        "frame {i}: driver {code} lap and position are 1-based"
                    )));
                }
                if !(state.dist >= 0.0) || !(0.0..=1.0).contains(&state.rel_dist) {
                    return Err(ProviderError::InvalidData(format!(
                        "frame {i}: driver {code} has dist {} / rel_dist {} out of range",
                        state.dist, state.rel_dist
                    )));
                }
            }
        }

        if let Some(lap) = &self.reference_lap {
            if let Some(drs) = &lap.drs {
                if drs.len() != lap.points.len() {
                    return Err(ProviderError::InvalidData(format!(
                        "reference lap has {} points but {} DRS samples",
                        lap.points.len(),
                        drs.len()
                    )));
                }
            }
        }

        for lap in &self.qualifying.laps {
            let mut last_t = f64::NEG_INFINITY;
            for frame in &lap.frames {
                if !frame.t.is_finite() || frame.t < last_t {
                    return Err(ProviderError::InvalidData(format!(
                        "{} {} lap: time {} is not monotonic",
                        lap.driver, lap.segment, frame.t
                    )));
                }
                last_t = frame.t;
                if !(0.0..=1.0).contains(&frame.telemetry.rel_dist) {
                    return Err(ProviderError::InvalidData(format!(
                        "{} {} lap: rel_dist {} out of range",
                        lap.driver, lap.segment, frame.telemetry.rel_dist
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Round of a season, for event listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    pub round: u32,
    pub event_name: String,
    pub country: String,
    pub date: Option<NaiveDate>,
    pub sessions: Vec<SessionKind>,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("invalid session type {0:?}, expected one of R, S, Q, SQ")]
    InvalidSession(String),

    #[error("invalid qualifying segment {0:?}, expected Q1, Q2 or Q3")]
    InvalidSegment(String),

    #[error("session {0} not found")]
    NotFound(SessionSelection),

    #[error("no events for season {0}")]
    UnknownSeason(i32),

    #[error("invalid session data: {0}")]
    InvalidData(String),

    #[error("failed to read session data: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode session data: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("provider failure: {0}")]
    Backend(String),
}

/// Source of session telemetry
///
/// A provider handle is constructed once per process and shared by every
/// adapter that loads sessions. Any caching or retrying belongs inside the
/// provider; callers treat each call as a plain read.
pub trait TelemetryProvider: Send + Sync {
    /// Human-readable provider name (e.g. "Demo", "File")
    fn name(&self) -> &str;

    /// Seasons this provider can serve
    fn available_years(&self) -> Vec<i32>;

    /// Events of one season, ordered by round
    fn list_events(&self, year: i32) -> Result<Vec<EventSummary>, ProviderError>;

    /// Session kinds held for an event
    fn available_sessions(&self, year: i32, round: u32) -> Result<Vec<SessionKind>, ProviderError> {
        self.list_events(year)?
            .into_iter()
            .find(|e| e.round == round)
            .map(|e| e.sessions)
            .ok_or(ProviderError::NotFound(SessionSelection::new(
                year,
                round,
                SessionKind::Race,
            )))
    }

    /// Load frames, reference lap, colours and metadata for a session
    fn load_session(&self, selection: &SessionSelection) -> Result<SessionData, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DriverState;

    #[test]
    fn test_session_kind_parse() {
        assert_eq!("R".parse::<SessionKind>().unwrap(), SessionKind::Race);
        assert_eq!("sq".parse::<SessionKind>().unwrap(), SessionKind::SprintQualifying);
        assert!(matches!(
            "FP1".parse::<SessionKind>(),
            Err(ProviderError::InvalidSession(_))
        ));
        assert!(SessionKind::Sprint.has_race_frames());
        assert!(!SessionKind::Qualifying.has_race_frames());
        assert!(SessionKind::SprintQualifying.is_qualifying());
        assert!(!SessionKind::Sprint.is_qualifying());
    }

    #[test]
    fn test_selection_display() {
        let sel = SessionSelection::new(2025, 7, SessionKind::Sprint);
        assert_eq!(sel.to_string(), "2025-07-S");
    }

    #[test]
    fn test_reference_lap_drs_zones() {
        let lap = ReferenceLap {
            points: vec![Point2::default(); 4],
            drs: Some(vec![false, true, true, false]),
        };
        assert_eq!(lap.drs_zones().len(), 1);
        assert!(ReferenceLap::default().drs_zones().is_empty());
    }

    #[test]
    fn test_validate_rejects_time_going_backwards() {
        let data = SessionData {
            frames: vec![Frame::new(1.0), Frame::new(0.5)],
            ..Default::default()
        };
        assert!(matches!(data.validate(), Err(ProviderError::InvalidData(_))));
    }

    #[test]
    fn test_validate_rejects_bad_driver_state() {
        let bad_rel = SessionData {
            frames: vec![Frame::new(0.0).with_driver("A", DriverState::new(0.0, 0.0, 1, 5.0, 1.5))],
            ..Default::default()
        };
        assert!(bad_rel.validate().is_err());

        let zero_lap = SessionData {
            frames: vec![Frame::new(0.0).with_driver("A", DriverState::new(0.0, 0.0, 0, 5.0, 0.5))],
            ..Default::default()
        };
        assert!(zero_lap.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_mismatched_drs_channel() {
        let data = SessionData {
            reference_lap: Some(ReferenceLap {
                points: vec![Point2::default(); 3],
                drs: Some(vec![true]),
            }),
            ..Default::default()
        };
        assert!(data.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_qualifying_lap_running_backwards() {
        use crate::qualifying::{QualifyingLap, QualifyingSegment, TelemetryFrame, TelemetrySample};

        let sample = TelemetrySample {
            x: 0.0,
            y: 0.0,
            dist: 0.0,
            rel_dist: 0.0,
            speed: 100.0,
            gear: 3,
            throttle: 50.0,
            brake: 0.0,
            drs: 0.0,
        };
        let data = SessionData {
            qualifying: QualifyingData {
                results: Vec::new(),
                laps: vec![QualifyingLap {
                    driver: "ALO".to_string(),
                    segment: QualifyingSegment::Q1,
                    lap_time: 80.0,
                    compound: 1,
                    sector_times: Default::default(),
                    frames: vec![
                        TelemetryFrame { t: 0.5, telemetry: sample },
                        TelemetryFrame { t: 0.1, telemetry: sample },
                    ],
                }],
            },
            ..Default::default()
        };
        assert!(matches!(data.validate(), Err(ProviderError::InvalidData(_))));
    }

    #[test]
    fn test_validate_accepts_equal_timestamps() {
        let data = SessionData {
            frames: vec![
                Frame::new(0.0).with_driver("A", DriverState::new(0.0, 0.0, 1, 0.0, 0.0)),
                Frame::new(0.0),
                Frame::new(0.04),
            ],
            ..Default::default()
        };
        assert!(data.validate().is_ok());
    }
}
