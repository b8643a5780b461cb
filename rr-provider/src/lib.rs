//! Telemetry providers for Race Replay

pub mod demo;
pub mod file;

pub use demo::DemoProvider;
pub use file::FileProvider;
