//! Playback state machine
//!
//! Owns the frame cursor of a replay. Two states, `Playing` and `Paused`,
//! starting in `Playing` with no terminal state. Every input is clamped, so
//! nothing here can fail: the cursor stays in `[0, n_frames - 1]` and the
//! speed never drops below [`MIN_SPEED`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lowest allowed playback speed
pub const MIN_SPEED: f64 = 0.1;

/// Frames moved by a single step forward/back command
pub const DEFAULT_SCRUB_STEP: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackMode {
    Playing,
    Paused,
}

/// Snapshot of the playback cursor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub frame_index: usize,
    pub n_frames: usize,
    pub playback_speed: f64,
    pub paused: bool,
}

/// Fixed speeds selectable directly (number keys 1-4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeedPreset {
    #[serde(rename = "0.5")]
    Half,
    #[serde(rename = "1")]
    Normal,
    #[serde(rename = "2")]
    Double,
    #[serde(rename = "4")]
    Quadruple,
}

impl SpeedPreset {
    pub const ALL: [SpeedPreset; 4] = [
        SpeedPreset::Half,
        SpeedPreset::Normal,
        SpeedPreset::Double,
        SpeedPreset::Quadruple,
    ];

    pub fn value(self) -> f64 {
        match self {
            SpeedPreset::Half => 0.5,
            SpeedPreset::Normal => 1.0,
            SpeedPreset::Double => 2.0,
            SpeedPreset::Quadruple => 4.0,
        }
    }

    /// Preset whose value is exactly `speed`
    pub fn from_value(speed: f64) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.value() == speed)
    }

    /// Preset bound to number key `n` (1-based)
    pub fn from_key(n: u8) -> Option<Self> {
        Self::ALL.get(usize::from(n).checked_sub(1)?).copied()
    }
}

/// User-level controls, one per key binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackCommand {
    TogglePause,
    StepForward,
    StepBack,
    SpeedUp,
    SlowDown,
    Preset(SpeedPreset),
    Restart,
}

impl PlaybackCommand {
    /// Short key names accepted on the command line and over HTTP
    pub const KEYS: [&'static str; 10] = [
        "space", "right", "left", "up", "down", "1", "2", "3", "4", "r",
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown playback command {0:?}")]
pub struct ParseCommandError(String);

impl FromStr for PlaybackCommand {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        let command = match key.as_str() {
            "space" | "toggle_pause" => PlaybackCommand::TogglePause,
            "right" | "step_forward" => PlaybackCommand::StepForward,
            "left" | "step_back" => PlaybackCommand::StepBack,
            "up" | "speed_up" => PlaybackCommand::SpeedUp,
            "down" | "slow_down" => PlaybackCommand::SlowDown,
            "r" | "restart" => PlaybackCommand::Restart,
            digit => digit
                .parse::<u8>()
                .ok()
                .and_then(SpeedPreset::from_key)
                .map(PlaybackCommand::Preset)
                .ok_or_else(|| ParseCommandError(s.to_string()))?,
        };
        Ok(command)
    }
}

impl fmt::Display for PlaybackCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackCommand::TogglePause => f.write_str("toggle_pause"),
            PlaybackCommand::StepForward => f.write_str("step_forward"),
            PlaybackCommand::StepBack => f.write_str("step_back"),
            PlaybackCommand::SpeedUp => f.write_str("speed_up"),
            PlaybackCommand::SlowDown => f.write_str("slow_down"),
            PlaybackCommand::Preset(p) => write!(f, "preset_{}", p.value()),
            PlaybackCommand::Restart => f.write_str("restart"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlaybackController {
    frame_index: usize,
    n_frames: usize,
    playback_speed: f64,
    mode: PlaybackMode,
    scrub_step: i64,
}

impl PlaybackController {
    /// Controller over `n_frames` frames (treated as at least 1)
    pub fn new(n_frames: usize) -> Self {
        Self {
            frame_index: 0,
            n_frames: n_frames.max(1),
            playback_speed: 1.0,
            mode: PlaybackMode::Playing,
            scrub_step: DEFAULT_SCRUB_STEP,
        }
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        if speed.is_finite() {
            self.playback_speed = speed.max(MIN_SPEED);
        }
        self
    }

    pub fn with_scrub_step(mut self, step: i64) -> Self {
        self.scrub_step = step.max(1);
        self
    }

    pub fn state(&self) -> PlaybackState {
        PlaybackState {
            frame_index: self.frame_index,
            n_frames: self.n_frames,
            playback_speed: self.playback_speed,
            paused: self.is_paused(),
        }
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn n_frames(&self) -> usize {
        self.n_frames
    }

    pub fn playback_speed(&self) -> f64 {
        self.playback_speed
    }

    pub fn is_paused(&self) -> bool {
        self.mode == PlaybackMode::Paused
    }

    fn last_index(&self) -> usize {
        self.n_frames - 1
    }

    pub fn is_at_end(&self) -> bool {
        self.frame_index == self.last_index()
    }

    /// Fraction of the sequence played, in `[0, 1]`
    pub fn progress(&self) -> f64 {
        if self.n_frames <= 1 {
            return 1.0;
        }
        self.frame_index as f64 / self.last_index() as f64
    }

    pub fn toggle_pause(&mut self) {
        self.mode = match self.mode {
            PlaybackMode::Playing => PlaybackMode::Paused,
            PlaybackMode::Paused => PlaybackMode::Playing,
        };
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.mode = if paused {
            PlaybackMode::Paused
        } else {
            PlaybackMode::Playing
        };
    }

    /// Advance by the speed-scaled step, holding on the last frame
    pub fn tick(&mut self) {
        if self.is_paused() {
            return;
        }
        let step = (self.playback_speed.round() as usize).max(1);
        self.frame_index = self.frame_index.saturating_add(step).min(self.last_index());
    }

    /// Move by `delta` frames in either direction, clamped to the sequence
    pub fn scrub(&mut self, delta: i64) {
        let target = (self.frame_index as i64).saturating_add(delta);
        self.frame_index = target.clamp(0, self.last_index() as i64) as usize;
    }

    /// Jump to an absolute frame, clamped to the sequence
    pub fn seek(&mut self, frame: usize) {
        self.frame_index = frame.min(self.last_index());
    }

    pub fn set_speed_multiplier(&mut self, factor: f64) {
        let next = self.playback_speed * factor;
        if !next.is_finite() || factor <= 0.0 {
            return;
        }
        self.playback_speed = next.max(MIN_SPEED);
    }

    pub fn set_speed_preset(&mut self, preset: SpeedPreset) {
        self.playback_speed = preset.value();
    }

    /// Back to the first frame at normal speed, playing
    pub fn restart(&mut self) {
        self.frame_index = 0;
        self.playback_speed = 1.0;
        self.mode = PlaybackMode::Playing;
    }

    pub fn apply(&mut self, command: PlaybackCommand) {
        match command {
            PlaybackCommand::TogglePause => self.toggle_pause(),
            PlaybackCommand::StepForward => self.scrub(self.scrub_step),
            PlaybackCommand::StepBack => self.scrub(-self.scrub_step),
            PlaybackCommand::SpeedUp => self.set_speed_multiplier(2.0),
            PlaybackCommand::SlowDown => self.set_speed_multiplier(0.5),
            PlaybackCommand::Preset(preset) => self.set_speed_preset(preset),
            PlaybackCommand::Restart => self.restart(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_initial_state() {
        let c = PlaybackController::new(100);
        assert_eq!(c.mode(), PlaybackMode::Playing);
        assert_eq!(
            c.state(),
            PlaybackState {
                frame_index: 0,
                n_frames: 100,
                playback_speed: 1.0,
                paused: false,
            }
        );
    }

    #[test]
    fn test_empty_sequence_treated_as_single_frame() {
        let mut c = PlaybackController::new(0);
        assert_eq!(c.n_frames(), 1);
        c.tick();
        c.scrub(10);
        assert_eq!(c.frame_index(), 0);
        assert_eq!(c.progress(), 1.0);
    }

    #[test]
    fn test_tick_steps_by_rounded_speed() {
        let mut c = PlaybackController::new(100);
        c.tick();
        assert_eq!(c.frame_index(), 1);

        c.set_speed_preset(SpeedPreset::Quadruple);
        c.tick();
        assert_eq!(c.frame_index(), 5);

        // 2.6 rounds to 3
        let mut c = PlaybackController::new(100).with_speed(2.6);
        c.tick();
        assert_eq!(c.frame_index(), 3);

        // below one still advances a frame
        let mut c = PlaybackController::new(100).with_speed(0.5);
        c.tick();
        assert_eq!(c.frame_index(), 1);
    }

    #[test]
    fn test_tick_is_noop_when_paused() {
        let mut c = PlaybackController::new(10);
        c.toggle_pause();
        assert!(c.is_paused());
        c.tick();
        assert_eq!(c.frame_index(), 0);
        c.toggle_pause();
        c.tick();
        assert_eq!(c.frame_index(), 1);
    }

    #[test]
    fn test_tick_holds_on_last_frame() {
        let mut c = PlaybackController::new(10).with_speed(4.0);
        for _ in 0..10 {
            c.tick();
        }
        assert_eq!(c.frame_index(), 9);
        assert!(c.is_at_end());
        assert!(!c.is_paused());
        c.tick();
        assert_eq!(c.frame_index(), 9);
    }

    #[test]
    fn test_scrub_clamps_both_ends() {
        let mut c = PlaybackController::new(20);
        c.scrub(-5);
        assert_eq!(c.frame_index(), 0);
        c.scrub(12);
        assert_eq!(c.frame_index(), 12);
        c.scrub(100);
        assert_eq!(c.frame_index(), 19);
        c.scrub(i64::MIN);
        assert_eq!(c.frame_index(), 0);
    }

    #[test]
    fn test_scrub_works_while_paused() {
        let mut c = PlaybackController::new(20);
        c.set_paused(true);
        c.apply(PlaybackCommand::StepForward);
        assert_eq!(c.frame_index(), 5);
        c.apply(PlaybackCommand::StepBack);
        assert_eq!(c.frame_index(), 0);
        assert!(c.is_paused());
    }

    #[test]
    fn test_speed_multiplier_floor() {
        let mut c = PlaybackController::new(10);
        for _ in 0..10 {
            c.apply(PlaybackCommand::SlowDown);
        }
        assert_eq!(c.playback_speed(), MIN_SPEED);

        c.set_speed_multiplier(0.0);
        c.set_speed_multiplier(-3.0);
        c.set_speed_multiplier(f64::NAN);
        assert_eq!(c.playback_speed(), MIN_SPEED);

        c.apply(PlaybackCommand::SpeedUp);
        assert!((c.playback_speed() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_presets_set_exact_values() {
        let mut c = PlaybackController::new(10).with_speed(7.3);
        for (key, expected) in [(1, 0.5), (2, 1.0), (3, 2.0), (4, 4.0)] {
            c.apply(PlaybackCommand::Preset(SpeedPreset::from_key(key).unwrap()));
            assert_eq!(c.playback_speed(), expected);
        }
        assert_eq!(SpeedPreset::from_key(0), None);
        assert_eq!(SpeedPreset::from_key(5), None);
        assert_eq!(SpeedPreset::from_value(2.0), Some(SpeedPreset::Double));
        assert_eq!(SpeedPreset::from_value(3.0), None);
    }

    #[test]
    fn test_restart() {
        let mut c = PlaybackController::new(50).with_speed(4.0);
        c.seek(40);
        c.toggle_pause();
        c.apply(PlaybackCommand::Restart);
        assert_eq!(c.frame_index(), 0);
        assert_eq!(c.playback_speed(), 1.0);
        assert!(!c.is_paused());
    }

    #[test]
    fn test_seek_clamps() {
        let mut c = PlaybackController::new(50);
        c.seek(30);
        assert_eq!(c.frame_index(), 30);
        c.seek(usize::MAX);
        assert_eq!(c.frame_index(), 49);
        assert_eq!(c.progress(), 1.0);
    }

    #[test]
    fn test_command_parsing() {
        assert_eq!("space".parse(), Ok(PlaybackCommand::TogglePause));
        assert_eq!(" Right ".parse(), Ok(PlaybackCommand::StepForward));
        assert_eq!("left".parse(), Ok(PlaybackCommand::StepBack));
        assert_eq!("up".parse(), Ok(PlaybackCommand::SpeedUp));
        assert_eq!("down".parse(), Ok(PlaybackCommand::SlowDown));
        assert_eq!("R".parse(), Ok(PlaybackCommand::Restart));
        assert_eq!(
            "3".parse(),
            Ok(PlaybackCommand::Preset(SpeedPreset::Double))
        );
        assert!("9".parse::<PlaybackCommand>().is_err());
        assert!("jump".parse::<PlaybackCommand>().is_err());

        for key in PlaybackCommand::KEYS {
            assert!(key.parse::<PlaybackCommand>().is_ok(), "{key} should parse");
        }
    }

    #[derive(Debug, Clone)]
    enum Op {
        Tick,
        Toggle,
        Scrub(i64),
        Multiply(f64),
        Preset(u8),
        Seek(usize),
        Restart,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Tick),
            Just(Op::Toggle),
            any::<i64>().prop_map(Op::Scrub),
            prop_oneof![any::<f64>(), -10.0..10.0f64].prop_map(Op::Multiply),
            (1u8..=4).prop_map(Op::Preset),
            any::<usize>().prop_map(Op::Seek),
            Just(Op::Restart),
        ]
    }

    proptest! {
        #[test]
        fn prop_cursor_and_speed_stay_valid(n in 0usize..500, ops in prop::collection::vec(op(), 0..200)) {
            let mut c = PlaybackController::new(n);
            for op in ops {
                match op {
                    Op::Tick => c.tick(),
                    Op::Toggle => c.toggle_pause(),
                    Op::Scrub(d) => c.scrub(d),
                    Op::Multiply(f) => c.set_speed_multiplier(f),
                    Op::Preset(k) => c.set_speed_preset(SpeedPreset::from_key(k).unwrap()),
                    Op::Seek(f) => c.seek(f),
                    Op::Restart => c.restart(),
                }
                prop_assert!(c.frame_index() < c.n_frames());
                prop_assert!(c.playback_speed() >= MIN_SPEED);
                prop_assert!(c.playback_speed().is_finite());
            }
        }

        #[test]
        fn prop_tick_idempotent_at_end(n in 1usize..300, speed in 0.1f64..64.0, extra in 1usize..20) {
            let mut c = PlaybackController::new(n).with_speed(speed);
            c.seek(n - 1);
            for _ in 0..extra {
                c.tick();
                prop_assert_eq!(c.frame_index(), n - 1);
            }
        }
    }
}
