//! Demo provider that generates synthetic race sessions
//!
//! Builds a closed circuit from straights, braking zones, corners and
//! acceleration phases, then simulates a small field racing around it at
//! 25Hz. Output is deterministic, so the same selection always yields the
//! same session.

use chrono::NaiveDate;
use rr_core::geometry::drs_indicator_from_channel;
use rr_core::hud::format_lap_time;
use rr_core::model::{
    Color, DriverState, Frame, SectorTimes, SessionAggregates, SessionMetadata, TrackStatus,
    TyreStint, RETIRED_REL_DIST,
};
use rr_core::point::Point2;
use rr_core::provider::{
    EventSummary, ProviderError, ReferenceLap, SessionData, SessionKind, SessionSelection,
    TelemetryProvider,
};
use rr_core::qualifying::{
    QualifyingData, QualifyingLap, QualifyingResult, QualifyingSegment, TelemetryFrame,
    TelemetrySample,
};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

pub const DEMO_YEAR: i32 = 2024;
pub const DEFAULT_LAPS: u32 = 5;
pub const DEFAULT_FPS: f64 = 25.0;

/// World units per metre, matching the 1/10 m positions of live timing data
const UNITS_PER_METER: f64 = 10.0;
/// Spacing of reference-lap samples in metres
const SAMPLE_SPACING: f64 = 10.0;

const SOFT: u8 = 1;
const MEDIUM: u8 = 2;
/// Cars still running after Q1 and after Q2
const QUALIFYING_CUTS: [usize; 2] = [6, 4];

// =============================================================================
// Circuit definition: a sequence of segments that form a lap
// =============================================================================

#[derive(Clone, Copy, PartialEq)]
enum SegmentKind {
    Straight, // Full throttle, top speed
    Braking,  // Heavy braking into a corner
    Corner,   // Constant-ish speed cornering
    Accel,    // Accelerating out of a corner
}

#[derive(Clone, Copy)]
struct TrackSegment {
    kind: SegmentKind,
    length: f64,       // metres
    target_speed: f64, // m/s at end of segment
    turn: f64,         // heading change in degrees (signed: + = left)
    drs: bool,
}

const fn seg(kind: SegmentKind, length: f64, target_speed: f64, turn: f64, drs: bool) -> TrackSegment {
    TrackSegment {
        kind,
        length,
        target_speed,
        turn,
        drs,
    }
}

/// A ~4.7km circuit with two DRS straights
fn demo_circuit() -> Vec<TrackSegment> {
    use SegmentKind::*;
    vec![
        // Start/finish straight
        seg(Straight, 800.0, 86.0, 0.0, true),
        // T1: heavy braking into a right-angle left-hander
        seg(Braking, 100.0, 32.0, 0.0, false),
        seg(Corner, 150.0, 30.0, 90.0, false),
        seg(Accel, 150.0, 60.0, 0.0, false),
        seg(Straight, 400.0, 74.0, 0.0, false),
        // T2-T3: quick left-right
        seg(Braking, 60.0, 48.0, 0.0, false),
        seg(Corner, 120.0, 45.0, 75.0, false),
        seg(Corner, 100.0, 42.0, -45.0, false),
        seg(Accel, 120.0, 62.0, 0.0, false),
        // Back straight
        seg(Straight, 900.0, 88.0, 0.0, true),
        // T4: long sweeping left
        seg(Braking, 100.0, 50.0, 0.0, false),
        seg(Corner, 220.0, 48.0, 120.0, false),
        seg(Accel, 150.0, 66.0, 0.0, false),
        seg(Straight, 500.0, 78.0, 0.0, false),
        // T5: hairpin
        seg(Braking, 80.0, 24.0, 0.0, false),
        seg(Corner, 160.0, 22.0, 120.0, false),
        seg(Accel, 180.0, 58.0, 0.0, false),
        // Run to start/finish
        seg(Straight, 410.0, 80.0, 0.0, false),
    ]
}

struct Circuit {
    segments: Vec<TrackSegment>,
    /// Start distance of each segment along the lap
    starts: Vec<f64>,
    length: f64,
    /// Centerline in world units, one sample per `SAMPLE_SPACING` metres
    centerline: Vec<Point2>,
    drs_channel: Vec<f64>,
}

impl Circuit {
    fn new(segments: Vec<TrackSegment>) -> Self {
        let mut starts = Vec::with_capacity(segments.len());
        let mut length = 0.0;
        for s in &segments {
            starts.push(length);
            length += s.length;
        }

        let mut circuit = Self {
            segments,
            starts,
            length,
            centerline: Vec::new(),
            drs_channel: Vec::new(),
        };
        circuit.trace();
        circuit
    }

    fn segment_at(&self, on_lap: f64) -> (usize, f64) {
        let d = on_lap.rem_euclid(self.length);
        let idx = self
            .starts
            .iter()
            .rposition(|&start| start <= d)
            .unwrap_or(0);
        let seg = &self.segments[idx];
        (idx, ((d - self.starts[idx]) / seg.length).clamp(0.0, 1.0))
    }

    /// Heading in radians at a distance along the lap
    fn heading_at(&self, on_lap: f64) -> f64 {
        let (idx, seg_t) = self.segment_at(on_lap);
        let done: f64 = self.segments[..idx].iter().map(|s| s.turn).sum();
        (done + self.segments[idx].turn * seg_t).to_radians()
    }

    /// Walk the lap by heading, then spread the closure error so the trace
    /// ends where it started
    fn trace(&mut self) {
        let n = (self.length / SAMPLE_SPACING).round() as usize;
        let mut points = Vec::with_capacity(n + 1);
        let mut p = Point2::new(0.0, 0.0);
        points.push(p);
        for i in 0..n {
            let h = self.heading_at((i as f64 + 0.5) * SAMPLE_SPACING);
            p = Point2::new(
                p.x + SAMPLE_SPACING * h.cos(),
                p.y + SAMPLE_SPACING * h.sin(),
            );
            points.push(p);
        }

        let gap = points[n];
        self.centerline = points[..n]
            .iter()
            .enumerate()
            .map(|(i, q)| {
                let f = i as f64 / n as f64;
                Point2::new(
                    (q.x - gap.x * f) * UNITS_PER_METER,
                    (q.y - gap.y * f) * UNITS_PER_METER,
                )
            })
            .collect();

        // raw channel as reported by cars: 12 open, 0 closed
        self.drs_channel = (0..n)
            .map(|i| {
                let (idx, _) = self.segment_at(i as f64 * SAMPLE_SPACING);
                if self.segments[idx].drs { 12.0 } else { 0.0 }
            })
            .collect();
    }

    fn position_at(&self, on_lap: f64) -> Point2 {
        let n = self.centerline.len();
        let s = on_lap.rem_euclid(self.length) / SAMPLE_SPACING;
        let i = (s.floor() as usize).min(n - 1);
        let a = self.centerline[i];
        let b = self.centerline[(i + 1) % n];
        a.lerp(b, s - i as f64)
    }

    fn speed_at(&self, on_lap: f64) -> f64 {
        let (idx, seg_t) = self.segment_at(on_lap);
        let prev = if idx > 0 {
            self.segments[idx - 1].target_speed
        } else {
            self.segments[self.segments.len() - 1].target_speed
        };
        lerp(prev, self.segments[idx].target_speed, smoothstep(seg_t))
    }

    fn inputs_at(&self, on_lap: f64) -> (f64, f64) {
        let (idx, seg_t) = self.segment_at(on_lap);
        match self.segments[idx].kind {
            SegmentKind::Straight => (1.0, 0.0),
            SegmentKind::Braking => (0.0, (1.0 - smoothstep(seg_t) * 0.3).clamp(0.0, 1.0)),
            SegmentKind::Corner => (0.2 + 0.3 * seg_t, 0.0),
            SegmentKind::Accel => (0.5 + 0.5 * smoothstep(seg_t), 0.0),
        }
    }

    fn drs_at(&self, on_lap: f64) -> f64 {
        let i = (on_lap.rem_euclid(self.length) / SAMPLE_SPACING) as usize;
        self.drs_channel.get(i).copied().unwrap_or(0.0)
    }
}

/// Sectors completed so far, three per lap
fn sector_index(dist: f64, lap_len: f64) -> u32 {
    (dist / lap_len * 3.0).floor() as u32
}

fn smoothstep(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn speed_to_gear(speed_ms: f64) -> i32 {
    let kph = speed_ms * 3.6;
    match kph {
        x if x < 90.0 => 2,
        x if x < 130.0 => 3,
        x if x < 170.0 => 4,
        x if x < 210.0 => 5,
        x if x < 250.0 => 6,
        x if x < 290.0 => 7,
        _ => 8,
    }
}

/// Simple deterministic noise from a seed
fn noise(seed: f64) -> f64 {
    let x = (seed * 12.9898 + 78.233).sin() * 43_758.547;
    x - x.floor()
}

/// Small jitter centered around 0
fn jitter(seed: f64, amplitude: f64) -> f64 {
    (noise(seed) - 0.5) * 2.0 * amplitude
}

// =============================================================================
// Field and calendar
// =============================================================================

struct DemoDriver {
    code: &'static str,
    name: &'static str,
    color: Color,
    pace: f64,
    /// Lap on which the car stops for good
    retires_on: Option<u32>,
}

fn demo_field() -> Vec<DemoDriver> {
    let d = |code, name, color, pace, retires_on| DemoDriver {
        code,
        name,
        color,
        pace,
        retires_on,
    };
    vec![
        d("VER", "Max Verstappen", Color::rgb(54, 113, 198), 1.000, None),
        d("NOR", "Lando Norris", Color::rgb(255, 128, 0), 0.998, None),
        d("LEC", "Charles Leclerc", Color::rgb(232, 0, 45), 0.996, None),
        d("PIA", "Oscar Piastri", Color::rgb(255, 135, 0), 0.994, None),
        d("HAM", "Lewis Hamilton", Color::rgb(39, 244, 210), 0.991, None),
        d("ALO", "Fernando Alonso", Color::rgb(34, 153, 113), 0.987, None),
        d("GAS", "Pierre Gasly", Color::rgb(0, 147, 204), 0.983, None),
        d("SAR", "Logan Sargeant", Color::rgb(100, 196, 255), 0.978, Some(2)),
    ]
}

struct DemoEvent {
    round: u32,
    event_name: &'static str,
    circuit_name: &'static str,
    country: &'static str,
    date: (i32, u32, u32),
    sprint: bool,
    rotation: f64,
}

fn demo_calendar() -> Vec<DemoEvent> {
    vec![
        DemoEvent {
            round: 1,
            event_name: "Demo Grand Prix",
            circuit_name: "Demo Circuit",
            country: "Demoland",
            date: (DEMO_YEAR, 3, 2),
            sprint: false,
            rotation: 0.0,
        },
        DemoEvent {
            round: 2,
            event_name: "Harbour Grand Prix",
            circuit_name: "Harbour Street Circuit",
            country: "Portia",
            date: (DEMO_YEAR, 3, 23),
            sprint: true,
            rotation: 90.0,
        },
        DemoEvent {
            round: 3,
            event_name: "Valley Grand Prix",
            circuit_name: "Valley Ring",
            country: "Vallonia",
            date: (DEMO_YEAR, 4, 14),
            sprint: false,
            rotation: -35.0,
        },
    ]
}

impl DemoEvent {
    fn sessions(&self) -> Vec<SessionKind> {
        if self.sprint {
            SessionKind::ALL.to_vec()
        } else {
            vec![SessionKind::Race, SessionKind::Qualifying]
        }
    }

    fn date(&self) -> Option<NaiveDate> {
        let (y, m, d) = self.date;
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn summary(&self) -> EventSummary {
        EventSummary {
            round: self.round,
            event_name: self.event_name.to_string(),
            country: self.country.to_string(),
            date: self.date(),
            sessions: self.sessions(),
        }
    }
}

// =============================================================================
// DemoProvider
// =============================================================================

pub struct DemoProvider {
    laps: u32,
    fps: f64,
    circuit: Circuit,
}

impl DemoProvider {
    pub fn new() -> Self {
        Self {
            laps: DEFAULT_LAPS,
            fps: DEFAULT_FPS,
            circuit: Circuit::new(demo_circuit()),
        }
    }

    /// Race distance in laps (sprints run half, rounded up)
    pub fn with_laps(mut self, laps: u32) -> Self {
        self.laps = laps.max(1);
        self
    }

    pub fn with_fps(mut self, fps: f64) -> Self {
        if fps.is_finite() && fps > 0.0 {
            self.fps = fps;
        }
        self
    }

    /// Lap length in metres
    pub fn lap_length(&self) -> f64 {
        self.circuit.length
    }

    fn reference_lap(&self) -> ReferenceLap {
        ReferenceLap {
            points: self.circuit.centerline.clone(),
            drs: Some(drs_indicator_from_channel(&self.circuit.drs_channel)),
        }
    }

    /// Simulate the field until the leader completes `laps`
    fn simulate(&self, laps: u32, seed: f64) -> (Vec<Frame>, SessionAggregates) {
        let field = demo_field();
        let lap_len = self.circuit.length;
        let race_len = lap_len * laps as f64;
        let dt = 1.0 / self.fps;

        let mut dist = vec![0.0_f64; field.len()];
        let mut retired = vec![false; field.len()];
        let mut lap_start = vec![0.0_f64; field.len()];
        let mut sector_start = vec![0.0_f64; field.len()];
        let mut current_sectors = vec![SectorTimes::default(); field.len()];
        let mut aggregates = SessionAggregates {
            track_statuses: vec![TrackStatus {
                status: "1".to_string(),
                start_time: 0.0,
                end_time: None,
            }],
            ..Default::default()
        };

        let mut frames = Vec::new();
        let mut t = 0.0;
        loop {
            // rank: running cars by distance, then retired cars
            let mut order: Vec<usize> = (0..field.len()).collect();
            order.sort_by(|&a, &b| {
                retired[a]
                    .cmp(&retired[b])
                    .then(dist[b].total_cmp(&dist[a]))
            });

            let mut frame = Frame::new(t);
            for (pos, &i) in order.iter().enumerate() {
                let on_lap = dist[i] % lap_len;
                let p = self.circuit.position_at(on_lap);
                let lap = ((dist[i] / lap_len) as u32 + 1).min(laps);
                let mut state = DriverState::new(
                    p.x,
                    p.y,
                    lap,
                    dist[i],
                    if retired[i] {
                        RETIRED_REL_DIST
                    } else {
                        on_lap / lap_len
                    },
                );
                state.position = pos as u32 + 1;
                state.tyre = Some(2.0);
                if !retired[i] {
                    let speed = self.circuit.speed_at(on_lap) * field[i].pace;
                    let (throttle, brake) = self.circuit.inputs_at(on_lap);
                    state.speed = Some(speed * 3.6);
                    state.gear = Some(speed_to_gear(speed));
                    state.drs = Some(self.circuit.drs_at(on_lap));
                    state.throttle = Some(throttle * 100.0);
                    state.brake = Some(brake);
                }
                frame = frame.with_driver(field[i].code, state);
            }
            frame.lap = frame
                .drivers
                .get(field[order[0]].code)
                .map(|s| s.lap);
            frames.push(frame);

            if dist[order[0]] >= race_len {
                break;
            }

            t += dt;
            for (i, driver) in field.iter().enumerate() {
                if retired[i] {
                    continue;
                }
                let before = dist[i];
                let speed = self.circuit.speed_at(before % lap_len)
                    * (driver.pace + jitter(seed + t * 0.37 + i as f64, 0.004));
                dist[i] = (before + speed * dt).min(race_len);

                // sector and lap crossings
                let sector_now = sector_index(dist[i], lap_len);
                if sector_now > sector_index(before, lap_len) {
                    let sector = sector_now % 3;
                    let sector_time = Some(t - sector_start[i]);
                    sector_start[i] = t;
                    match sector {
                        1 => current_sectors[i].s1 = sector_time,
                        2 => current_sectors[i].s2 = sector_time,
                        _ => {
                            current_sectors[i].s3 = sector_time;
                            let completed = sector_now / 3;
                            aggregates
                                .lap_times
                                .entry(driver.code.to_string())
                                .or_default()
                                .insert(completed, t - lap_start[i]);
                            aggregates
                                .sector_times
                                .entry(driver.code.to_string())
                                .or_insert_with(BTreeMap::new)
                                .insert(completed, std::mem::take(&mut current_sectors[i]));
                            lap_start[i] = t;
                        }
                    }
                }

                if let Some(stop_lap) = driver.retires_on {
                    if dist[i] >= lap_len * (stop_lap as f64 - 0.5) {
                        debug!(driver = driver.code, t, "Demo car retired");
                        retired[i] = true;
                    }
                }
            }
        }

        for driver in &field {
            let end_lap = match driver.retires_on {
                Some(stop_lap) => stop_lap.min(laps),
                None => laps,
            };
            aggregates.tyre_stints.insert(
                driver.code.to_string(),
                vec![TyreStint {
                    compound: MEDIUM,
                    compound_name: "MEDIUM".to_string(),
                    start_lap: 1,
                    end_lap,
                }],
            );
        }

        (frames, aggregates)
    }

    /// Knockout qualifying: the whole field runs Q1, the quickest six Q2 and
    /// the quickest four Q3, one flying lap each
    fn qualify(&self, seed: f64) -> QualifyingData {
        let field = demo_field();
        let mut best: Vec<[Option<f64>; 3]> = vec![[None; 3]; field.len()];
        let mut laps = Vec::new();
        let mut running: Vec<usize> = (0..field.len()).collect();

        for (s, segment) in QualifyingSegment::ALL.into_iter().enumerate() {
            for &i in &running {
                // track evolution makes later segments a touch quicker
                let pace = field[i].pace * (1.0 + 0.002 * s as f64)
                    + jitter(seed * 7.0 + s as f64 * 3.1 + i as f64, 0.003);
                let lap = self.flying_lap(field[i].code, segment, pace);
                best[i][s] = Some(lap.lap_time);
                laps.push(lap);
            }
            running.sort_by(|&a, &b| {
                best[a][s]
                    .unwrap_or(f64::INFINITY)
                    .total_cmp(&best[b][s].unwrap_or(f64::INFINITY))
            });
            if let Some(&cut) = QUALIFYING_CUTS.get(s) {
                running.truncate(cut);
            }
        }

        // furthest segment reached first, then time within it
        let reached = |i: usize| best[i].iter().rposition(Option::is_some).unwrap_or(0);
        let mut order: Vec<usize> = (0..field.len()).collect();
        order.sort_by(|&a, &b| {
            reached(b).cmp(&reached(a)).then(
                best[a][reached(a)]
                    .unwrap_or(f64::INFINITY)
                    .total_cmp(&best[b][reached(b)].unwrap_or(f64::INFINITY)),
            )
        });

        let results = order
            .iter()
            .enumerate()
            .map(|(pos, &i)| {
                let [q1, q2, q3] = best[i].map(|t| t.map(format_lap_time));
                QualifyingResult {
                    code: field[i].code.to_string(),
                    full_name: field[i].name.to_string(),
                    position: pos as u32 + 1,
                    color: field[i].color,
                    q1,
                    q2,
                    q3,
                }
            })
            .collect();

        QualifyingData { results, laps }
    }

    /// One lap from the line back to the line at a constant pace factor
    fn flying_lap(&self, code: &str, segment: QualifyingSegment, pace: f64) -> QualifyingLap {
        let lap_len = self.circuit.length;
        let dt = 1.0 / self.fps;

        let mut frames = Vec::new();
        let mut sectors = SectorTimes::default();
        let mut sector_start = 0.0;
        let (mut t, mut dist) = (0.0, 0.0);
        let mut lap_time = 0.0;

        loop {
            frames.push(TelemetryFrame {
                t,
                telemetry: self.telemetry_at(dist, pace),
            });
            if dist >= lap_len {
                break;
            }

            t += dt;
            let before = dist;
            let step = self.circuit.speed_at(before) * pace;
            dist = (before + step * dt).min(lap_len);

            let sector_now = sector_index(dist, lap_len);
            if sector_now > sector_index(before, lap_len) {
                // interpolate the crossing inside the step
                let line = lap_len * sector_now as f64 / 3.0;
                let crossing = t - dt + (line - before) / step;
                let time = Some(crossing - sector_start);
                sector_start = crossing;
                match sector_now {
                    1 => sectors.s1 = time,
                    2 => sectors.s2 = time,
                    _ => {
                        sectors.s3 = time;
                        lap_time = crossing;
                    }
                }
            }
        }

        QualifyingLap {
            driver: code.to_string(),
            segment,
            lap_time,
            compound: SOFT,
            sector_times: sectors,
            frames,
        }
    }

    fn telemetry_at(&self, dist: f64, pace: f64) -> TelemetrySample {
        let lap_len = self.circuit.length;
        let p = self.circuit.position_at(dist);
        let speed = self.circuit.speed_at(dist) * pace;
        let (throttle, brake) = self.circuit.inputs_at(dist);
        TelemetrySample {
            x: p.x,
            y: p.y,
            dist,
            rel_dist: (dist / lap_len).clamp(0.0, 1.0),
            speed: speed * 3.6,
            gear: speed_to_gear(speed),
            throttle: throttle * 100.0,
            brake,
            drs: self.circuit.drs_at(dist),
        }
    }
}

impl Default for DemoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryProvider for DemoProvider {
    fn name(&self) -> &str {
        "Demo"
    }

    fn available_years(&self) -> Vec<i32> {
        vec![DEMO_YEAR]
    }

    fn list_events(&self, year: i32) -> Result<Vec<EventSummary>, ProviderError> {
        if year != DEMO_YEAR {
            return Err(ProviderError::UnknownSeason(year));
        }
        Ok(demo_calendar().iter().map(DemoEvent::summary).collect())
    }

    fn load_session(&self, selection: &SessionSelection) -> Result<SessionData, ProviderError> {
        if selection.year != DEMO_YEAR {
            return Err(ProviderError::UnknownSeason(selection.year));
        }
        let event = demo_calendar()
            .into_iter()
            .find(|e| e.round == selection.round && e.sessions().contains(&selection.session))
            .ok_or(ProviderError::NotFound(*selection))?;

        let laps = match selection.session {
            SessionKind::Sprint => self.laps.div_ceil(2),
            _ => self.laps,
        };

        // qualifying has no race order to replay, only flying laps
        let (frames, aggregates) = if selection.session.has_race_frames() {
            self.simulate(laps, event.round as f64)
        } else {
            (Vec::new(), SessionAggregates::default())
        };
        let qualifying = match selection.session {
            SessionKind::Qualifying => self.qualify(event.round as f64),
            SessionKind::SprintQualifying => self.qualify(event.round as f64 + 0.5),
            _ => QualifyingData::default(),
        };

        debug!(
            session = %selection,
            frames = frames.len(),
            qualifying_laps = qualifying.laps.len(),
            samples = self.circuit.centerline.len(),
            "Generated demo session"
        );

        let driver_colors: HashMap<String, Color> = demo_field()
            .into_iter()
            .map(|d| (d.code.to_string(), d.color))
            .collect();

        Ok(SessionData {
            metadata: SessionMetadata {
                event_name: event.event_name.to_string(),
                circuit_name: event.circuit_name.to_string(),
                country: event.country.to_string(),
                year: selection.year,
                round: event.round,
                date: event.date(),
                total_laps: selection.session.has_race_frames().then_some(laps),
                circuit_rotation: event.rotation,
            },
            reference_lap: Some(self.reference_lap()),
            frames,
            driver_colors,
            aggregates,
            qualifying,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circuit_closes() {
        let circuit = Circuit::new(demo_circuit());
        assert_eq!(circuit.length, 4700.0);
        assert_eq!(circuit.centerline.len(), 470);

        let first = circuit.centerline[0];
        let last = circuit.centerline[469];
        // adjacent samples are about SAMPLE_SPACING metres apart
        let gap = first.distance(last) / UNITS_PER_METER;
        assert!(gap < 3.0 * SAMPLE_SPACING, "gap {gap}");
    }

    #[test]
    fn test_position_wraps_lap() {
        let circuit = Circuit::new(demo_circuit());
        assert_eq!(circuit.position_at(0.0), circuit.centerline[0]);
        assert_eq!(circuit.position_at(circuit.length), circuit.centerline[0]);
    }

    #[test]
    fn test_speed_profile_brakes_for_corners() {
        let circuit = Circuit::new(demo_circuit());
        let straight_end = circuit.speed_at(790.0);
        let t1 = circuit.speed_at(950.0);
        assert!(straight_end > 80.0, "{straight_end}");
        assert!(t1 < 40.0, "{t1}");
    }

    #[test]
    fn test_gears() {
        assert_eq!(speed_to_gear(20.0), 2);
        assert_eq!(speed_to_gear(88.0), 8);
    }

    #[test]
    fn test_flying_lap_covers_one_lap() {
        let provider = DemoProvider::new();
        let lap = provider.flying_lap("VER", QualifyingSegment::Q1, 1.0);

        let first = lap.frames[0].telemetry;
        let last = lap.frames[lap.frames.len() - 1].telemetry;
        assert_eq!(first.rel_dist, 0.0);
        assert_eq!(last.rel_dist, 1.0);
        assert_eq!(lap.compound, SOFT);

        let SectorTimes { s1, s2, s3 } = lap.sector_times;
        let total = s1.unwrap() + s2.unwrap() + s3.unwrap();
        assert!((total - lap.lap_time).abs() < 1e-9, "{total} vs {}", lap.lap_time);
        // the last frame is within one tick of the line
        let end = lap.frames[lap.frames.len() - 1].t;
        assert!(end >= lap.lap_time && end - lap.lap_time <= 1.0 / DEFAULT_FPS + 1e-9);
    }

    #[test]
    fn test_faster_pace_sets_faster_lap() {
        let provider = DemoProvider::new();
        let slow = provider.flying_lap("SAR", QualifyingSegment::Q1, 0.97);
        let fast = provider.flying_lap("SAR", QualifyingSegment::Q1, 1.01);
        assert!(fast.lap_time < slow.lap_time);
    }

    #[test]
    fn test_knockout_field_sizes() {
        let data = DemoProvider::new().with_fps(5.0).qualify(1.0);
        let count = |segment| data.laps.iter().filter(|l| l.segment == segment).count();
        assert_eq!(count(QualifyingSegment::Q1), 8);
        assert_eq!(count(QualifyingSegment::Q2), 6);
        assert_eq!(count(QualifyingSegment::Q3), 4);

        let positions: Vec<u32> = data.results.iter().map(|r| r.position).collect();
        assert_eq!(positions, (1..=8).collect::<Vec<_>>());
        for (i, result) in data.results.iter().enumerate() {
            assert!(result.q1.is_some());
            assert_eq!(result.q2.is_some(), i < 6, "{}", result.code);
            assert_eq!(result.q3.is_some(), i < 4, "{}", result.code);
        }
    }

    #[test]
    fn test_noise_is_deterministic() {
        assert_eq!(noise(1.5), noise(1.5));
        assert!((0.0..1.0).contains(&noise(42.0)));
        assert!(jitter(3.0, 0.1).abs() <= 0.1);
    }
}
