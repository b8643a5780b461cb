//! Heads-up display strings

use crate::leaderboard::Standing;

pub const LEADERBOARD_TITLE: &str = "Leaderboard";

pub const CONTROLS_LEGEND: [&str; 6] = [
    "Controls:",
    "[SPACE]  Pause/Resume",
    "[←/→]    Rewind / Fast Forward",
    "[↑/↓]    Increase / Decrease Speed",
    "[1-4]    Set Speed (0.5x, 1x, 2x, 4x)",
    "[R]      Restart",
];

/// Race clock as `HH:MM:SS`, truncating fractional seconds
pub fn format_race_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// Lap time as `M:SS.mmm`, rounded to the millisecond
pub fn format_lap_time(seconds: f64) -> String {
    let ms = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    };
    format!("{}:{:02}.{:03}", ms / 60_000, (ms % 60_000) / 1000, ms % 1000)
}

pub fn race_time_label(seconds: f64) -> String {
    format!("Race Time: {}", format_race_time(seconds))
}

pub fn lap_label(lap: u32, total_laps: Option<u32>) -> String {
    match total_laps {
        Some(total) => format!("Lap: {lap}/{total}"),
        None => format!("Lap: {lap}"),
    }
}

pub fn standing_label(standing: &Standing) -> String {
    if standing.out {
        format!("{}. {}   OUT", standing.rank, standing.code)
    } else {
        format!("{}. {}", standing.rank, standing.code)
    }
}

pub fn speed_label(speed: f64, paused: bool) -> String {
    if paused {
        "PAUSED".to_string()
    } else {
        format!("Speed: {speed}x")
    }
}
