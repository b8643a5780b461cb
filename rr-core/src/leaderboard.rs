//! Per-frame race leader and standings
//!
//! Pure functions of a single [`Frame`]; nothing is cached between frames.

use crate::model::{DriverState, Frame};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Driver shown as leading the race, used for the lap counter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leader {
    pub code: String,
    pub lap: u32,
}

/// One row of the standings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub code: String,
    /// 1-based slot by descending race distance
    pub rank: usize,
    /// Retired / out of classification
    pub out: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Leaderboard {
    pub leader: Option<Leader>,
    pub standings: Vec<Standing>,
}

impl Leaderboard {
    /// Lap shown on the HUD, 1 when the frame has no drivers
    pub fn leader_lap(&self) -> u32 {
        self.leader.as_ref().map(|l| l.lap).unwrap_or(1)
    }
}

pub fn rank(frame: &Frame) -> Leaderboard {
    Leaderboard {
        leader: leader(frame),
        standings: standings(frame),
    }
}

/// Driver with the greatest `(lap, dist)`; the first one wins a tie
pub fn leader(frame: &Frame) -> Option<Leader> {
    let mut best: Option<(&String, &DriverState)> = None;
    for (code, state) in &frame.drivers {
        let ahead = match best {
            None => true,
            Some((_, b)) => {
                state.lap > b.lap || (state.lap == b.lap && state.dist.total_cmp(&b.dist).is_gt())
            }
        };
        if ahead {
            best = Some((code, state));
        }
    }
    best.map(|(code, state)| Leader {
        code: code.clone(),
        lap: state.lap,
    })
}

/// Every driver ordered by descending distance, retired drivers included
pub fn standings(frame: &Frame) -> Vec<Standing> {
    let mut rows: Vec<(&String, &DriverState)> = frame.drivers.iter().collect();
    rows.sort_by(|a, b| by_distance_desc(a.1, b.1));

    rows.into_iter()
        .enumerate()
        .map(|(i, (code, state))| Standing {
            code: code.clone(),
            rank: i + 1,
            out: state.is_out(),
        })
        .collect()
}

fn by_distance_desc(a: &DriverState, b: &DriverState) -> Ordering {
    b.dist.total_cmp(&a.dist)
}

/// Drivers to draw on track; retired drivers are skipped
pub fn visible_drivers(frame: &Frame) -> impl Iterator<Item = (&String, &DriverState)> {
    frame.drivers.iter().filter(|(_, state)| !state.is_out())
}
