//! Replay session
//!
//! Owns the immutable track geometry and frame sequence of one loaded
//! session together with its playback controller. Each cycle applies any
//! pending input commands, calls [`ReplaySession::update`] once and then
//! renders or snapshots the current frame.

use crate::config::{ConfigError, ReplayConfig};
use crate::geometry::{GeometryError, TrackGeometry};
use crate::hud;
use crate::leaderboard::{self, Leader, Leaderboard, Standing};
use crate::model::{Color, Frame, SessionAggregates, SessionMetadata};
use crate::playback::{PlaybackCommand, PlaybackController, PlaybackState};
use crate::point::Point2;
use crate::provider::SessionData;
use crate::render::{render_frame, RenderSurface, Scene};
use crate::viewport::CoordinateMapper;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("session has no frames to replay")]
    NoFrames,
}

/// A driver's screen position in one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarPosition {
    pub code: String,
    pub position: Point2,
    pub color: Color,
}

/// Presentation-ready view of the current frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub playback: PlaybackState,
    pub t: f64,
    pub race_time: String,
    pub lap_label: String,
    pub leader: Option<Leader>,
    pub standings: Vec<Standing>,
    pub cars: Vec<CarPosition>,
}

pub struct ReplaySession {
    geometry: TrackGeometry,
    frames: Vec<Frame>,
    metadata: SessionMetadata,
    aggregates: SessionAggregates,
    scene: Scene,
    controller: PlaybackController,
}

impl ReplaySession {
    /// Build geometry, fit the viewport and start playback from frame 0
    pub fn new(data: SessionData, config: &ReplayConfig) -> Result<Self, SessionError> {
        config.validate()?;
        if data.frames.is_empty() {
            return Err(SessionError::NoFrames);
        }
        let lap = data.reference_lap.ok_or(GeometryError::NoValidLap)?;

        let geometry =
            TrackGeometry::build_with_density(&lap.points, config.track_width, config.densified_points)?
                .with_drs_zones(lap.drs_zones());

        let mapper = CoordinateMapper::fit_rotated(
            &geometry.bounds,
            config.viewport,
            data.metadata.circuit_rotation,
        );
        let scene = Scene::new(
            &geometry,
            mapper,
            data.driver_colors,
            data.metadata.total_laps,
        );

        let controller = PlaybackController::new(data.frames.len())
            .with_speed(config.initial_speed)
            .with_scrub_step(config.scrub_step);

        info!(
            event = %data.metadata.event_name,
            frames = data.frames.len(),
            samples = geometry.centerline.len(),
            drs_zones = geometry.drs_zones.len(),
            "Replay session ready"
        );

        Ok(Self {
            geometry,
            frames: data.frames,
            metadata: data.metadata,
            aggregates: data.aggregates,
            scene,
            controller,
        })
    }

    pub fn geometry(&self) -> &TrackGeometry {
        &self.geometry
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn metadata(&self) -> &SessionMetadata {
        &self.metadata
    }

    pub fn aggregates(&self) -> &SessionAggregates {
        &self.aggregates
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.scene.mapper
    }

    pub fn playback(&self) -> PlaybackState {
        self.controller.state()
    }

    pub fn controller_mut(&mut self) -> &mut PlaybackController {
        &mut self.controller
    }

    pub fn apply(&mut self, command: PlaybackCommand) {
        self.controller.apply(command);
    }

    /// Advance playback by one tick
    pub fn update(&mut self) {
        self.controller.tick();
    }

    pub fn current_frame(&self) -> &Frame {
        // the controller keeps the index below frames.len(), which is non-zero
        &self.frames[self.controller.frame_index()]
    }

    pub fn leaderboard(&self) -> Leaderboard {
        leaderboard::rank(self.current_frame())
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        let frame = self.current_frame();
        let board = leaderboard::rank(frame);
        let cars = self
            .scene
            .car_positions(frame)
            .into_iter()
            .map(|(code, position)| CarPosition {
                color: self.scene.color_of(&code),
                code,
                position,
            })
            .collect();

        FrameSnapshot {
            playback: self.playback(),
            t: frame.t,
            race_time: hud::format_race_time(frame.t),
            lap_label: hud::lap_label(board.leader_lap(), self.metadata.total_laps),
            leader: board.leader,
            standings: board.standings,
            cars,
        }
    }

    pub fn render(&self, surface: &mut dyn RenderSurface) {
        let frame = self.current_frame();
        let board = leaderboard::rank(frame);
        render_frame(&self.scene, frame, &board, &self.playback(), surface);
    }
}
