//! Race Replay Core Library
//!
//! Pure, I/O-free building blocks for replaying a race over a reconstructed
//! track: boundary geometry, curve densification, viewport mapping, playback
//! control and per-frame leaderboards. Rendering goes through the
//! [`render::RenderSurface`] capability; the core never touches a display.

pub mod config;
pub mod densify;
pub mod geometry;
pub mod hud;
pub mod leaderboard;
pub mod model;
pub mod playback;
pub mod point;
pub mod provider;
pub mod qualifying;
pub mod render;
pub mod session;
pub mod viewport;
pub mod wire;

pub use config::ReplayConfig;
pub use geometry::{GeometryError, TrackGeometry};
pub use leaderboard::{rank, Leaderboard};
pub use model::{DriverState, Frame};
pub use playback::{PlaybackCommand, PlaybackController, PlaybackState};
pub use point::{Bounds, Point2};
pub use provider::TelemetryProvider;
pub use session::ReplaySession;
pub use viewport::CoordinateMapper;
