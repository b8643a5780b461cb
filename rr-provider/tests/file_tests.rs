//! Integration tests for the FileProvider

use rr_core::model::{DriverState, Frame};
use rr_core::provider::{
    EventSummary, ProviderError, SessionData, SessionKind, SessionSelection, TelemetryProvider,
};
use rr_provider::demo::DEMO_YEAR;
use rr_provider::{DemoProvider, FileProvider};

fn demo_race() -> (SessionSelection, SessionData) {
    let selection = SessionSelection::new(DEMO_YEAR, 1, SessionKind::Race);
    let data = DemoProvider::new()
        .with_laps(1)
        .with_fps(2.0)
        .load_session(&selection)
        .expect("demo session should load");
    (selection, data)
}

#[test]
fn test_file_provider_round_trips_plain_json() {
    let dir = tempfile::tempdir().expect("tempdir");
    let provider = FileProvider::new(dir.path());
    let (selection, data) = demo_race();

    let path = provider
        .save_session(&selection, &data, false)
        .expect("save should succeed");
    assert!(path.ends_with("2024-01-R.json"));

    let loaded = provider.load_session(&selection).expect("load should succeed");
    assert_eq!(loaded.frames.len(), data.frames.len());
    assert_eq!(loaded.driver_colors, data.driver_colors);
    assert_eq!(loaded.metadata, data.metadata);
}

#[test]
fn test_file_provider_reads_zstd() {
    let dir = tempfile::tempdir().expect("tempdir");
    let provider = FileProvider::new(dir.path());
    let (selection, data) = demo_race();

    let path = provider
        .save_session(&selection, &data, true)
        .expect("save should succeed");
    assert!(path.to_string_lossy().ends_with(".json.zst"));

    let raw = std::fs::read(&path).expect("read");
    assert_eq!(&raw[..4], &[0x28, 0xb5, 0x2f, 0xfd], "zstd magic");

    let loaded = provider.load_session(&selection).expect("load should succeed");
    assert_eq!(
        loaded.reference_lap.map(|l| l.points.len()),
        data.reference_lap.map(|l| l.points.len())
    );
}

#[test]
fn test_file_provider_missing_session() {
    let dir = tempfile::tempdir().expect("tempdir");
    let provider = FileProvider::new(dir.path());
    let selection = SessionSelection::new(2021, 4, SessionKind::Sprint);
    assert!(matches!(
        provider.load_session(&selection),
        Err(ProviderError::NotFound(_))
    ));
}

#[test]
fn test_file_provider_rejects_invalid_frames() {
    let dir = tempfile::tempdir().expect("tempdir");
    let provider = FileProvider::new(dir.path());
    let selection = SessionSelection::new(2022, 3, SessionKind::Race);

    // time goes backwards
    let data = SessionData {
        frames: vec![
            Frame::new(1.0).with_driver("ALB", DriverState::new(0.0, 0.0, 1, 0.0, 0.0)),
            Frame::new(0.5).with_driver("ALB", DriverState::new(1.0, 0.0, 1, 1.0, 0.0)),
        ],
        ..Default::default()
    };
    provider
        .save_session(&selection, &data, false)
        .expect("save should succeed");

    assert!(matches!(
        provider.load_session(&selection),
        Err(ProviderError::InvalidData(_))
    ));
}

#[test]
fn test_file_provider_rejects_garbage() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("2022-03-R.json"), b"not json").expect("write");
    std::fs::write(dir.path().join("2022-04-R.json.zst"), b"not zstd").expect("write");
    let provider = FileProvider::new(dir.path());

    assert!(matches!(
        provider.load_session(&SessionSelection::new(2022, 3, SessionKind::Race)),
        Err(ProviderError::Decode(_))
    ));
    assert!(matches!(
        provider.load_session(&SessionSelection::new(2022, 4, SessionKind::Race)),
        Err(ProviderError::Backend(_))
    ));
}

#[test]
fn test_file_provider_derives_events_from_file_names() {
    let dir = tempfile::tempdir().expect("tempdir");
    for name in ["2023-02-Q.json", "2023-02-R.json", "2023-05-R.json.zst", "2024-01-R.json"] {
        std::fs::write(dir.path().join(name), b"{}").expect("write");
    }
    let provider = FileProvider::new(dir.path());

    assert_eq!(provider.available_years(), vec![2023, 2024]);

    let events = provider.list_events(2023).expect("events");
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].round, 2);
    assert_eq!(events[0].event_name, "Round 2");
    assert_eq!(events[0].sessions, vec![SessionKind::Race, SessionKind::Qualifying]);
    assert_eq!(events[1].sessions, vec![SessionKind::Race]);

    assert!(matches!(
        provider.list_events(1999),
        Err(ProviderError::UnknownSeason(1999))
    ));
}

#[test]
fn test_file_provider_prefers_season_index() {
    let dir = tempfile::tempdir().expect("tempdir");
    let provider = FileProvider::new(dir.path());
    let events = vec![
        EventSummary {
            round: 2,
            event_name: "Second".to_string(),
            country: "B".to_string(),
            date: None,
            sessions: vec![SessionKind::Race],
        },
        EventSummary {
            round: 1,
            event_name: "First".to_string(),
            country: "A".to_string(),
            date: chrono::NaiveDate::from_ymd_opt(2020, 7, 5),
            sessions: vec![SessionKind::Race, SessionKind::Qualifying],
        },
    ];
    provider.save_events(2020, &events).expect("save events");

    assert_eq!(provider.available_years(), vec![2020]);
    let listed = provider.list_events(2020).expect("events");
    assert_eq!(listed[0].event_name, "First");
    assert_eq!(listed[1].event_name, "Second");
    assert_eq!(
        provider.available_sessions(2020, 1).expect("sessions"),
        vec![SessionKind::Race, SessionKind::Qualifying]
    );
}

#[test]
fn test_file_provider_missing_root() {
    let provider = FileProvider::new("/nonexistent/race-replay");
    assert!(provider.available_years().is_empty());
    assert_eq!(provider.name(), "File");
}
