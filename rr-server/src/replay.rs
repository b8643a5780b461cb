//! Server-side replay control and playback engine
//!
//! Runs the same cooperative cycle as a local viewer: apply pending
//! commands, advance one tick, publish the resulting snapshot. Control
//! requests mutate the session directly under the write lock; the playback
//! task only ever calls `update`.

use crate::error::ApiError;
use crate::state::AppState;
use rr_core::playback::{PlaybackCommand, SpeedPreset};
use rr_core::session::ReplaySession;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Base replay rate, frames per second at 1x
pub const REPLAY_FPS: f64 = 25.0;

const PAUSED_POLL: Duration = Duration::from_millis(50);

pub fn tick_interval() -> Duration {
    Duration::from_secs_f64(1.0 / REPLAY_FPS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAction {
    TogglePause,
    Pause,
    Play,
    Scrub,
    Seek,
    SpeedMultiplier,
    SpeedPreset,
    Restart,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlRequest {
    pub action: ControlAction,
    pub value: Option<f64>,
}

impl ControlRequest {
    fn value(&self) -> Result<f64, ApiError> {
        self.value
            .filter(|v| v.is_finite())
            .ok_or_else(|| ApiError::BadRequest(format!("Missing 'value' for {:?}", self.action)))
    }
}

/// Apply one control request to a live session
pub fn apply_control(session: &mut ReplaySession, request: &ControlRequest) -> Result<(), ApiError> {
    match request.action {
        ControlAction::TogglePause => session.apply(PlaybackCommand::TogglePause),
        ControlAction::Pause => session.controller_mut().set_paused(true),
        ControlAction::Play => session.controller_mut().set_paused(false),
        ControlAction::Scrub => {
            let delta = request.value()?.round() as i64;
            session.controller_mut().scrub(delta);
        }
        ControlAction::Seek => {
            let index = request.value()?.max(0.0) as usize;
            session.controller_mut().seek(index);
        }
        ControlAction::SpeedMultiplier => {
            let factor = request.value()?;
            session.controller_mut().set_speed_multiplier(factor);
        }
        ControlAction::SpeedPreset => {
            let value = request.value()?;
            let preset = SpeedPreset::from_value(value).ok_or_else(|| {
                ApiError::BadRequest(format!("Unknown speed preset {value}, expected 0.5, 1, 2 or 4"))
            })?;
            session.controller_mut().set_speed_preset(preset);
        }
        ControlAction::Restart => session.apply(PlaybackCommand::Restart),
    }
    debug!(action = ?request.action, state = ?session.playback(), "Replay control applied");
    Ok(())
}

/// Start the playback background task that pushes snapshots through the broadcast channel
pub async fn start_playback_task(state: AppState) {
    let cancel_token = CancellationToken::new();
    {
        let mut cancel = state.replay_cancel.write().await;
        if let Some(token) = cancel.replace(cancel_token.clone()) {
            token.cancel();
        }
    }

    tokio::spawn(async move {
        info!("Playback task started");

        loop {
            if cancel_token.is_cancelled() {
                break;
            }

            let snapshot = {
                let mut replay = state.replay.write().await;
                match replay.as_mut() {
                    Some(session) if session.playback().paused => None,
                    Some(session) => {
                        session.update();
                        Some(session.snapshot())
                    }
                    None => break,
                }
            };

            let wait = match snapshot {
                Some(snapshot) => {
                    state.publish(snapshot);
                    tick_interval()
                }
                None => PAUSED_POLL,
            };

            tokio::select! {
                _ = cancel_token.cancelled() => break,
                _ = tokio::time::sleep(wait) => {},
            }
        }

        info!("Playback task ended");
    });
}

/// Cancel the playback task, if one is running
pub async fn stop_playback_task(state: &AppState) {
    let mut cancel = state.replay_cancel.write().await;
    if let Some(token) = cancel.take() {
        token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rr_core::provider::{SessionKind, SessionSelection, TelemetryProvider};
    use rr_core::ReplayConfig;
    use rr_provider::demo::DEMO_YEAR;
    use rr_provider::DemoProvider;

    fn session() -> ReplaySession {
        let data = DemoProvider::new()
            .with_laps(1)
            .with_fps(5.0)
            .load_session(&SessionSelection::new(DEMO_YEAR, 1, SessionKind::Race))
            .unwrap();
        let config = ReplayConfig {
            densified_points: 200,
            ..Default::default()
        };
        ReplaySession::new(data, &config).unwrap()
    }

    fn request(action: ControlAction, value: Option<f64>) -> ControlRequest {
        ControlRequest { action, value }
    }

    #[test]
    fn test_control_request_json() {
        let req: ControlRequest =
            serde_json::from_str(r#"{"action": "speed_preset", "value": 2}"#).unwrap();
        assert_eq!(req, request(ControlAction::SpeedPreset, Some(2.0)));

        let req: ControlRequest = serde_json::from_str(r#"{"action": "toggle_pause"}"#).unwrap();
        assert_eq!(req.value, None);

        assert!(serde_json::from_str::<ControlRequest>(r#"{"action": "eject"}"#).is_err());
    }

    #[test]
    fn test_apply_controls() {
        let mut session = session();

        apply_control(&mut session, &request(ControlAction::Pause, None)).unwrap();
        assert!(session.playback().paused);
        apply_control(&mut session, &request(ControlAction::Play, None)).unwrap();
        assert!(!session.playback().paused);
        apply_control(&mut session, &request(ControlAction::TogglePause, None)).unwrap();
        assert!(session.playback().paused);

        apply_control(&mut session, &request(ControlAction::Seek, Some(40.0))).unwrap();
        assert_eq!(session.playback().frame_index, 40);
        apply_control(&mut session, &request(ControlAction::Scrub, Some(-5.0))).unwrap();
        assert_eq!(session.playback().frame_index, 35);
        apply_control(&mut session, &request(ControlAction::Seek, Some(-3.0))).unwrap();
        assert_eq!(session.playback().frame_index, 0);

        apply_control(&mut session, &request(ControlAction::SpeedMultiplier, Some(2.0))).unwrap();
        assert_eq!(session.playback().playback_speed, 2.0);
        apply_control(&mut session, &request(ControlAction::SpeedPreset, Some(0.5))).unwrap();
        assert_eq!(session.playback().playback_speed, 0.5);

        apply_control(&mut session, &request(ControlAction::Seek, Some(10.0))).unwrap();
        apply_control(&mut session, &request(ControlAction::Restart, None)).unwrap();
        assert_eq!(session.playback().frame_index, 0);
    }

    #[test]
    fn test_apply_control_rejects_bad_values() {
        let mut session = session();
        for req in [
            request(ControlAction::Seek, None),
            request(ControlAction::Scrub, Some(f64::NAN)),
            request(ControlAction::SpeedPreset, Some(3.0)),
        ] {
            let err = apply_control(&mut session, &req).unwrap_err();
            assert!(matches!(err, ApiError::BadRequest(_)), "{req:?}");
        }
    }

    #[test]
    fn test_tick_interval() {
        assert_eq!(tick_interval(), Duration::from_millis(40));
    }
}
