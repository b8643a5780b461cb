//! Replay data model
//!
//! Strongly typed frames, driver states, colours and the pass-through
//! session aggregates. Shapes are validated once at the provider boundary
//! (see [`crate::provider::SessionData::validate`]), never per access.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// `rel_dist` value marking a driver as retired / out of classification
pub const RETIRED_REL_DIST: f64 = 1.0;

/// One replay tick: elapsed race time plus the state of every driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Seconds since the start of the session (non-decreasing)
    pub t: f64,

    /// Leader lap as computed upstream, passed through for clients
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lap: Option<u32>,

    /// Driver code -> state, ordered by code
    pub drivers: BTreeMap<String, DriverState>,
}

impl Frame {
    pub fn new(t: f64) -> Self {
        Self {
            t,
            lap: None,
            drivers: BTreeMap::new(),
        }
    }

    pub fn with_driver(mut self, code: &str, state: DriverState) -> Self {
        self.drivers.insert(code.to_string(), state);
        self
    }
}

/// Position and progress of a single driver within a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverState {
    /// World X
    pub x: f64,
    /// World Y
    pub y: f64,
    /// Current lap, starting at 1
    #[serde(default = "default_lap")]
    pub lap: u32,
    /// Cumulative race distance
    #[serde(default)]
    pub dist: f64,
    /// Fractional progress; exactly 1.0 means retired / out
    #[serde(default)]
    pub rel_dist: f64,
    /// Upstream classification, 1-based
    #[serde(default = "default_position")]
    pub position: u32,

    // === Pass-through telemetry ===
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tyre: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gear: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throttle: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brake: Option<f64>,
}

fn default_lap() -> u32 {
    1
}

fn default_position() -> u32 {
    1
}

impl DriverState {
    /// Minimal state with only the fields ranking and rendering need
    pub fn new(x: f64, y: f64, lap: u32, dist: f64, rel_dist: f64) -> Self {
        Self {
            x,
            y,
            lap,
            dist,
            rel_dist,
            position: 1,
            tyre: None,
            speed: None,
            gear: None,
            drs: None,
            throttle: None,
            brake: None,
        }
    }

    /// Retired or otherwise out of classification
    pub fn is_out(&self) -> bool {
        self.rel_dist == RETIRED_REL_DIST
    }
}

/// RGB display colour, `#rrggbb` on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const LIGHT_GRAY: Color = Color::rgb(211, 211, 211);
    pub const TRACK_GRAY: Color = Color::rgb(150, 150, 150);
    pub const DRS_GREEN: Color = Color::rgb(0, 200, 80);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid colour {0:?}, expected #rrggbb")]
pub struct ParseColorError(String);

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(ParseColorError(s.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| ParseColorError(s.to_string()))
        };
        Ok(Color::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Event and session details, passed through unmodified
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionMetadata {
    #[serde(default)]
    pub event_name: String,
    #[serde(default)]
    pub circuit_name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub year: i32,
    #[serde(default)]
    pub round: u32,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub total_laps: Option<u32>,
    /// Degrees to rotate the circuit for display
    #[serde(default)]
    pub circuit_rotation: f64,
}

impl SessionMetadata {
    /// Long-form date for display banners, e.g. "July 06, 2025"
    pub fn display_date(&self) -> String {
        self.date
            .map(|d| d.format("%B %d, %Y").to_string())
            .unwrap_or_default()
    }
}

/// Track status period (green, yellow, safety car, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackStatus {
    pub status: String,
    pub start_time: f64,
    pub end_time: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitStop {
    pub driver: String,
    pub lap: u32,
    pub duration: f64,
    pub compound_from: u8,
    pub compound_to: u8,
    pub pit_in_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TyreStint {
    pub compound: u8,
    pub compound_name: String,
    pub start_lap: u32,
    pub end_lap: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SectorTimes {
    pub s1: Option<f64>,
    pub s2: Option<f64>,
    pub s3: Option<f64>,
}

/// Per-session aggregates sourced unchanged from the provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionAggregates {
    #[serde(default)]
    pub track_statuses: Vec<TrackStatus>,
    #[serde(default)]
    pub pit_stops: Vec<PitStop>,
    /// Driver -> lap number -> lap time in seconds
    #[serde(default)]
    pub lap_times: HashMap<String, BTreeMap<u32, f64>>,
    #[serde(default)]
    pub sector_times: HashMap<String, BTreeMap<u32, SectorTimes>>,
    #[serde(default)]
    pub tyre_stints: HashMap<String, Vec<TyreStint>>,
}
