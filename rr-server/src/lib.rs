//! Race Replay Server Library
//!
//! Exposes server components for integration testing and the replay CLI.

pub mod api;
pub mod config;
pub mod error;
pub mod replay;
pub mod sinks;
pub mod state;
pub mod viewer;
