//! Rendering capability and frame emitter
//!
//! The core never draws. It hands screen-space primitives to a
//! [`RenderSurface`] supplied by the presentation layer. Screen coordinates
//! have the origin at the bottom-left with y pointing up.

use crate::geometry::TrackGeometry;
use crate::hud;
use crate::leaderboard::{self, Leaderboard};
use crate::model::{Color, Frame};
use crate::playback::PlaybackState;
use crate::point::Point2;
use crate::viewport::CoordinateMapper;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const TRACK_LINE_WIDTH: f64 = 4.0;
pub const DRS_LINE_WIDTH: f64 = 6.0;
pub const CAR_RADIUS: f64 = 6.0;

const LEADERBOARD_WIDTH: f64 = 350.0;
const LEADERBOARD_TOP_OFFSET: f64 = 80.0;
const ROW_HEIGHT: f64 = 32.0;
const HUD_LEFT: f64 = 30.0;
const LEGEND_TOP: f64 = 180.0;
const LEGEND_LINE_HEIGHT: f64 = 28.0;

/// Drawing operations a presentation backend must provide
pub trait RenderSurface {
    fn draw_line_strip(&mut self, points: &[Point2], color: Color, width: f64);

    fn draw_filled_circle(&mut self, center: Point2, radius: f64, color: Color);

    fn draw_text(&mut self, text: &str, position: Point2, color: Color, size: f64);
}

/// A recorded draw call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    LineStrip {
        points: Vec<Point2>,
        color: Color,
        width: f64,
    },
    FilledCircle {
        center: Point2,
        radius: f64,
        color: Color,
    },
    Text {
        text: String,
        position: Point2,
        color: Color,
        size: f64,
    },
}

/// Surface that records draw calls instead of drawing them
#[derive(Debug, Default)]
pub struct CommandRecorder {
    commands: Vec<DrawCommand>,
}

impl CommandRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Take the recorded commands, leaving the recorder empty
    pub fn drain(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl RenderSurface for CommandRecorder {
    fn draw_line_strip(&mut self, points: &[Point2], color: Color, width: f64) {
        self.commands.push(DrawCommand::LineStrip {
            points: points.to_vec(),
            color,
            width,
        });
    }

    fn draw_filled_circle(&mut self, center: Point2, radius: f64, color: Color) {
        self.commands.push(DrawCommand::FilledCircle {
            center,
            radius,
            color,
        });
    }

    fn draw_text(&mut self, text: &str, position: Point2, color: Color, size: f64) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            position,
            color,
            size,
        });
    }
}

/// Per-session screen-space data, computed once
#[derive(Debug, Clone)]
pub struct Scene {
    pub mapper: CoordinateMapper,
    pub inner_points: Vec<Point2>,
    pub outer_points: Vec<Point2>,
    /// Outer-boundary stretches covered by DRS zones
    pub drs_strips: Vec<Vec<Point2>>,
    pub driver_colors: HashMap<String, Color>,
    pub total_laps: Option<u32>,
}

impl Scene {
    pub fn new(
        geometry: &TrackGeometry,
        mapper: CoordinateMapper,
        driver_colors: HashMap<String, Color>,
        total_laps: Option<u32>,
    ) -> Self {
        let inner_points = mapper.project_polyline(&geometry.inner_boundary);
        let outer_points = mapper.project_polyline(&geometry.outer_boundary);

        let drs_strips = geometry
            .drs_zones
            .iter()
            .filter_map(|zone| {
                let start = geometry.densified_index(zone.start_index);
                let end = geometry.densified_index(zone.end_index);
                let strip = outer_points.get(start..=end)?;
                (strip.len() >= 2).then(|| strip.to_vec())
            })
            .collect();

        Self {
            mapper,
            inner_points,
            outer_points,
            drs_strips,
            driver_colors,
            total_laps,
        }
    }

    pub fn color_of(&self, code: &str) -> Color {
        self.driver_colors.get(code).copied().unwrap_or(Color::WHITE)
    }

    /// Screen positions of every driver still on track
    pub fn car_positions(&self, frame: &Frame) -> Vec<(String, Point2)> {
        leaderboard::visible_drivers(frame)
            .map(|(code, state)| (code.clone(), self.mapper.project(state.x, state.y)))
            .collect()
    }
}

/// Emit one frame's draw calls onto `surface`
pub fn render_frame(
    scene: &Scene,
    frame: &Frame,
    board: &Leaderboard,
    playback: &PlaybackState,
    surface: &mut dyn RenderSurface,
) {
    let viewport = scene.mapper.viewport();
    let (width, height) = (viewport.width, viewport.height);

    surface.draw_line_strip(&scene.inner_points, Color::TRACK_GRAY, TRACK_LINE_WIDTH);
    surface.draw_line_strip(&scene.outer_points, Color::TRACK_GRAY, TRACK_LINE_WIDTH);
    for strip in &scene.drs_strips {
        surface.draw_line_strip(strip, Color::DRS_GREEN, DRS_LINE_WIDTH);
    }

    for (code, position) in scene.car_positions(frame) {
        surface.draw_filled_circle(position, CAR_RADIUS, scene.color_of(&code));
    }

    surface.draw_text(
        &hud::lap_label(board.leader_lap(), scene.total_laps),
        Point2::new(HUD_LEFT, height - 40.0),
        Color::WHITE,
        28.0,
    );
    surface.draw_text(
        &hud::race_time_label(frame.t),
        Point2::new(HUD_LEFT, height - 80.0),
        Color::WHITE,
        22.0,
    );
    surface.draw_text(
        &hud::speed_label(playback.playback_speed, playback.paused),
        Point2::new(HUD_LEFT, height - 115.0),
        Color::LIGHT_GRAY,
        18.0,
    );

    let board_x = width - LEADERBOARD_WIDTH;
    let board_y = height - LEADERBOARD_TOP_OFFSET;
    surface.draw_text(
        hud::LEADERBOARD_TITLE,
        Point2::new(board_x + 10.0, board_y + 10.0),
        Color::WHITE,
        22.0,
    );
    for (i, standing) in board.standings.iter().enumerate() {
        surface.draw_text(
            &hud::standing_label(standing),
            Point2::new(board_x + 20.0, board_y - ROW_HEIGHT * (i + 1) as f64),
            scene.color_of(&standing.code),
            18.0,
        );
    }

    for (i, line) in hud::CONTROLS_LEGEND.iter().enumerate() {
        let (color, size) = if i == 0 {
            (Color::WHITE, 22.0)
        } else {
            (Color::LIGHT_GRAY, 20.0)
        };
        surface.draw_text(
            line,
            Point2::new(HUD_LEFT, LEGEND_TOP - i as f64 * LEGEND_LINE_HEIGHT),
            color,
            size,
        );
    }
}
