//! Qualifying results and per-segment telemetry
//!
//! Qualifying has no race order to replay. Each driver instead keeps one
//! flying lap per knockout segment they took part in, as a single-car
//! telemetry trace.

use crate::geometry::{drs_indicator_from_channel, drs_zones_from_indicator, DrsZone};
use crate::model::{Color, SectorTimes};
use crate::provider::ProviderError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Knockout segment of a qualifying session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QualifyingSegment {
    Q1,
    Q2,
    Q3,
}

impl QualifyingSegment {
    pub const ALL: [QualifyingSegment; 3] = [
        QualifyingSegment::Q1,
        QualifyingSegment::Q2,
        QualifyingSegment::Q3,
    ];

    pub fn code(self) -> &'static str {
        match self {
            QualifyingSegment::Q1 => "Q1",
            QualifyingSegment::Q2 => "Q2",
            QualifyingSegment::Q3 => "Q3",
        }
    }
}

impl fmt::Display for QualifyingSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for QualifyingSegment {
    type Err = ProviderError;

    /// Exact codes only: `Q1`, `Q2` or `Q3`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|seg| seg.code() == s)
            .ok_or_else(|| ProviderError::InvalidSegment(s.to_string()))
    }
}

/// One row of the qualifying classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualifyingResult {
    pub code: String,
    pub full_name: String,
    pub position: u32,
    pub color: Color,
    /// Best lap per segment as `M:SS.mmm`, `None` when not run
    #[serde(rename = "Q1")]
    pub q1: Option<String>,
    #[serde(rename = "Q2")]
    pub q2: Option<String>,
    #[serde(rename = "Q3")]
    pub q3: Option<String>,
}

impl QualifyingResult {
    pub fn time(&self, segment: QualifyingSegment) -> Option<&str> {
        match segment {
            QualifyingSegment::Q1 => self.q1.as_deref(),
            QualifyingSegment::Q2 => self.q2.as_deref(),
            QualifyingSegment::Q3 => self.q3.as_deref(),
        }
    }
}

/// Car state at one telemetry sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub x: f64,
    pub y: f64,
    /// Metres into the lap
    pub dist: f64,
    pub rel_dist: f64,
    /// km/h
    pub speed: f64,
    pub gear: i32,
    /// Percent
    pub throttle: f64,
    pub brake: f64,
    /// Raw DRS channel value
    pub drs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetryFrame {
    /// Seconds since the start of the lap
    pub t: f64,
    pub telemetry: TelemetrySample,
}

/// A driver's flying lap in one segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualifyingLap {
    pub driver: String,
    pub segment: QualifyingSegment,
    /// Seconds
    pub lap_time: f64,
    pub compound: u8,
    #[serde(default)]
    pub sector_times: SectorTimes,
    pub frames: Vec<TelemetryFrame>,
}

impl QualifyingLap {
    /// `(min, max)` speed over the lap
    pub fn speed_range(&self) -> Option<(f64, f64)> {
        self.frames.iter().map(|f| f.telemetry.speed).fold(None, |range, v| {
            Some(match range {
                None => (v, v),
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
            })
        })
    }

    /// DRS zones as inclusive ranges of frame indices
    pub fn drs_zones(&self) -> Vec<DrsZone> {
        let channel: Vec<f64> = self.frames.iter().map(|f| f.telemetry.drs).collect();
        drs_zones_from_indicator(&drs_indicator_from_channel(&channel))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualifyingData {
    /// Ordered by classification
    #[serde(default)]
    pub results: Vec<QualifyingResult>,
    #[serde(default)]
    pub laps: Vec<QualifyingLap>,
}

impl QualifyingData {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty() && self.laps.is_empty()
    }

    pub fn lap(&self, driver: &str, segment: QualifyingSegment) -> Option<&QualifyingLap> {
        self.laps
            .iter()
            .find(|lap| lap.segment == segment && lap.driver == driver)
    }
}
