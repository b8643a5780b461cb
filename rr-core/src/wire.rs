//! Wire contract for decoupled clients
//!
//! JSON shapes served to remote viewers. Boundary point lists are in world
//! space with one point per reference-lap sample, the same index space as
//! the DRS zones. Clients densify for drawing.

use crate::geometry::{offset_curves, DrsZone, GeometryError};
use crate::model::{
    Color, Frame, PitStop, SectorTimes, SessionAggregates, SessionMetadata, TrackStatus, TyreStint,
};
use crate::point::{Bounds, Point2};
use crate::provider::{ReferenceLap, SessionData};
use crate::qualifying::{QualifyingLap, TelemetryFrame};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPayload {
    pub inner_points: Vec<Point2>,
    pub outer_points: Vec<Point2>,
    pub drs_zones: Vec<DrsZone>,
    pub bounds: Bounds,
    /// Reference-lap sample count, the index space of `drs_zones`
    pub sample_count: usize,
}

impl TrackPayload {
    /// Per-sample boundaries of `lap`, undensified
    pub fn from_reference_lap(lap: &ReferenceLap, track_width: f64) -> Result<Self, GeometryError> {
        let curves = offset_curves(&lap.points, track_width)?;
        Ok(Self {
            inner_points: curves.inner,
            outer_points: curves.outer,
            drs_zones: lap.drs_zones(),
            bounds: curves.bounds,
            sample_count: lap.points.len(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FramesPayload {
    pub frames: Vec<Frame>,
    pub driver_colors: HashMap<String, Color>,
    pub track_statuses: Vec<TrackStatus>,
    pub total_laps: u32,
    pub total_frames: usize,
    pub pit_stops: Vec<PitStop>,
    pub lap_times: HashMap<String, BTreeMap<u32, f64>>,
    pub sector_times: HashMap<String, BTreeMap<u32, SectorTimes>>,
    pub tyre_stints: HashMap<String, Vec<TyreStint>>,
}

impl From<SessionData> for FramesPayload {
    fn from(data: SessionData) -> Self {
        let SessionAggregates {
            track_statuses,
            pit_stops,
            lap_times,
            sector_times,
            tyre_stints,
        } = data.aggregates;

        Self {
            total_frames: data.frames.len(),
            total_laps: data.metadata.total_laps.unwrap_or(0),
            frames: data.frames,
            driver_colors: data.driver_colors,
            track_statuses,
            pit_stops,
            lap_times,
            sector_times,
            tyre_stints,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataPayload {
    pub event_name: String,
    pub circuit_name: String,
    pub country: String,
    pub year: i32,
    pub round: u32,
    pub date: Option<NaiveDate>,
    pub drivers: Vec<String>,
    pub driver_colors: HashMap<String, Color>,
    pub circuit_rotation: f64,
    pub total_laps: Option<u32>,
}

impl MetadataPayload {
    pub fn new(data: &SessionData) -> Self {
        let SessionMetadata {
            event_name,
            circuit_name,
            country,
            year,
            round,
            date,
            total_laps,
            circuit_rotation,
        } = data.metadata.clone();

        // every code seen in any frame or classification, in code order
        let mut drivers: Vec<String> = data
            .frames
            .iter()
            .flat_map(|f| f.drivers.keys())
            .chain(data.qualifying.results.iter().map(|r| &r.code))
            .cloned()
            .collect();
        drivers.sort();
        drivers.dedup();

        Self {
            event_name,
            circuit_name,
            country,
            year,
            round,
            date,
            drivers,
            driver_colors: data.driver_colors.clone(),
            circuit_rotation,
            total_laps,
        }
    }
}

/// DRS zone as inclusive frame indices of a qualifying lap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualifyingDrsZone {
    pub zone_start: usize,
    pub zone_end: usize,
}

impl From<DrsZone> for QualifyingDrsZone {
    fn from(zone: DrsZone) -> Self {
        Self {
            zone_start: zone.start_index,
            zone_end: zone.end_index,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QualifyingSectorTimes {
    pub sector1: Option<f64>,
    pub sector2: Option<f64>,
    pub sector3: Option<f64>,
}

impl From<SectorTimes> for QualifyingSectorTimes {
    fn from(s: SectorTimes) -> Self {
        Self {
            sector1: s.s1,
            sector2: s.s2,
            sector3: s.s3,
        }
    }
}

/// One driver's flying lap in one segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualifyingTelemetryPayload {
    pub frames: Vec<TelemetryFrame>,
    pub drs_zones: Vec<QualifyingDrsZone>,
    /// km/h, 0 for a lap without frames
    pub max_speed: f64,
    pub min_speed: f64,
    pub sector_times: QualifyingSectorTimes,
    pub compound: u8,
    pub lap_time: f64,
}

impl From<&QualifyingLap> for QualifyingTelemetryPayload {
    fn from(lap: &QualifyingLap) -> Self {
        let (min_speed, max_speed) = lap.speed_range().unwrap_or((0.0, 0.0));
        Self {
            frames: lap.frames.clone(),
            drs_zones: lap.drs_zones().into_iter().map(Into::into).collect(),
            max_speed,
            min_speed,
            sector_times: lap.sector_times.into(),
            compound: lap.compound,
            lap_time: lap.lap_time,
        }
    }
}

/// Error body returned by the HTTP layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DriverState;

    #[test]
    fn test_track_payload_shape() {
        let lap = ReferenceLap {
            points: vec![
                Point2::new(0.0, 0.0),
                Point2::new(10.0, 0.0),
                Point2::new(10.0, 10.0),
            ],
            drs: Some(vec![true, true, false]),
        };

        let json = serde_json::to_value(TrackPayload::from_reference_lap(&lap, 2.0).unwrap()).unwrap();
        assert_eq!(json["inner_points"].as_array().unwrap().len(), 3);
        assert_eq!(json["outer_points"][0].as_array().unwrap().len(), 2);
        assert_eq!(json["drs_zones"][0]["start_index"], 0);
        assert_eq!(json["drs_zones"][0]["end_index"], 1);
        assert_eq!(json["sample_count"], 3);
        for key in ["x_min", "x_max", "y_min", "y_max"] {
            assert!(json["bounds"][key].is_f64(), "{key} missing");
        }
    }

    #[test]
    fn test_track_payload_points_share_drs_index_space() {
        // straight line, DRS on the last ten samples
        let points: Vec<Point2> = (0..50).map(|i| Point2::new(i as f64 * 10.0, 0.0)).collect();
        let mut drs = vec![false; 50];
        drs[40..].fill(true);
        let lap = ReferenceLap {
            points: points.clone(),
            drs: Some(drs),
        };

        let payload = TrackPayload::from_reference_lap(&lap, 20.0).unwrap();
        assert_eq!(payload.outer_points.len(), payload.sample_count);
        assert_eq!(payload.inner_points.len(), payload.sample_count);
        assert_eq!(
            payload.drs_zones,
            vec![DrsZone {
                start_index: 40,
                end_index: 49
            }]
        );

        let zone = payload.drs_zones[0];
        for i in [zone.start_index, zone.end_index] {
            assert_eq!(payload.outer_points[i].x, points[i].x);
            assert_eq!(payload.outer_points[i].y, 10.0);
            assert_eq!(payload.inner_points[i].y, -10.0);
        }
    }

    #[test]
    fn test_track_payload_rejects_short_lap() {
        let lap = ReferenceLap {
            points: vec![Point2::new(1.0, 1.0)],
            drs: None,
        };
        assert_eq!(
            TrackPayload::from_reference_lap(&lap, 2.0),
            Err(GeometryError::InsufficientSamples(1))
        );
    }

    #[test]
    fn test_frames_payload_passes_aggregates_through() {
        let mut data = SessionData::default();
        data.frames = vec![Frame::new(0.0), Frame::new(0.04)];
        data.metadata.total_laps = Some(44);
        data.driver_colors
            .insert("HAM".to_string(), Color::rgb(220, 0, 0));
        data.aggregates.pit_stops.push(PitStop {
            driver: "HAM".to_string(),
            lap: 18,
            duration: 2.4,
            compound_from: 2,
            compound_to: 3,
            pit_in_time: 1650.0,
        });

        let payload = FramesPayload::from(data);
        assert_eq!(payload.total_frames, 2);
        assert_eq!(payload.total_laps, 44);
        assert_eq!(payload.pit_stops.len(), 1);

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["driver_colors"]["HAM"], "#dc0000");
    }

    #[test]
    fn test_qualifying_payload_shape() {
        use crate::qualifying::{QualifyingSegment, TelemetrySample};

        let frames = [(250.0, 12.0), (300.0, 12.0), (95.0, 0.0)]
            .iter()
            .enumerate()
            .map(|(i, &(speed, drs))| TelemetryFrame {
                t: i as f64 * 0.04,
                telemetry: TelemetrySample {
                    x: i as f64,
                    y: 0.0,
                    dist: i as f64,
                    rel_dist: i as f64 / 2.0,
                    speed,
                    gear: 6,
                    throttle: 100.0,
                    brake: 0.0,
                    drs,
                },
            })
            .collect();
        let lap = QualifyingLap {
            driver: "PIA".to_string(),
            segment: QualifyingSegment::Q2,
            lap_time: 77.412,
            compound: 1,
            sector_times: SectorTimes {
                s1: Some(25.1),
                s2: Some(27.3),
                s3: None,
            },
            frames,
        };

        let json = serde_json::to_value(QualifyingTelemetryPayload::from(&lap)).unwrap();
        assert_eq!(json["frames"].as_array().unwrap().len(), 3);
        assert_eq!(json["frames"][1]["telemetry"]["speed"], 300.0);
        assert_eq!(json["drs_zones"], serde_json::json!([{"zone_start": 0, "zone_end": 1}]));
        assert_eq!(json["max_speed"], 300.0);
        assert_eq!(json["min_speed"], 95.0);
        assert_eq!(json["sector_times"]["sector1"], 25.1);
        assert!(json["sector_times"]["sector3"].is_null());
        assert_eq!(json["compound"], 1);
    }

    #[test]
    fn test_metadata_lists_drivers_once() {
        let mut data = SessionData::default();
        let state = DriverState::new(0.0, 0.0, 1, 0.0, 0.0);
        data.frames = vec![
            Frame::new(0.0)
                .with_driver("VER", state.clone())
                .with_driver("ALB", state.clone()),
            Frame::new(1.0).with_driver("VER", state),
        ];
        let meta = MetadataPayload::new(&data);
        assert_eq!(meta.drivers, vec!["ALB".to_string(), "VER".to_string()]);
    }
}
