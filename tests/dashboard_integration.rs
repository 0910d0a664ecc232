// Integration tests for the full dashboard flow on an offline session:
// 1. Build a race session and serve it through the snapshot provider
// 2. Record it to a snapshot file and replay it
// 3. Load it through the session loader and render every view

use std::time::Duration;

use paddock::{
    DataProvider, DisplayToggles, RenderRequest, Session, SessionKey, SessionKind, SessionLoader,
    SnapshotProvider,
    provider::snapshot::record_snapshot,
    session::{Driver, Lap, ResultRow, TelemetrySample},
    views::{self, Notice},
};
use tempfile::TempDir;

const DRIVERS: [(&str, &str, &str); 3] = [
    ("1", "VER", "3671C6"),
    ("16", "LEC", "E8002D"),
    ("44", "HAM", "27F4D2"),
];

/// Ten lap race: everybody pits after lap 4, drivers keep their grid order
/// except for one overtake on lap 6.
fn race_session() -> Session {
    let key = SessionKey::new(2024, "Monaco", SessionKind::Race);
    let mut session = Session::empty(key);
    session.event_name = "Monaco Grand Prix".to_string();

    for (idx, (id, abbreviation, colour)) in DRIVERS.iter().enumerate() {
        session.drivers.push(Driver {
            id: id.to_string(),
            abbreviation: Some(abbreviation.to_string()),
            team_colour: Some(colour.to_string()),
            ..Default::default()
        });
        session.results.push(ResultRow {
            position: Some(idx as u32 + 1),
            driver: id.to_string(),
            abbreviation: abbreviation.to_string(),
            team_name: format!("Team {}", abbreviation),
            points: Some([25., 18., 15.][idx]),
        });
        for lap_number in 1..=10u32 {
            let mut position = idx as u32 + 1;
            if lap_number >= 6 && idx < 2 {
                position = 2 - idx as u32;
            }
            let (stint, compound) = if lap_number <= 4 {
                (1, "MEDIUM")
            } else {
                (2, "HARD")
            };
            session.laps.push(Lap {
                driver: id.to_string(),
                lap_number,
                lap_time: Some(Duration::from_millis(
                    75_000 + idx as u64 * 300 + lap_number as u64 * 50,
                )),
                position: Some(position),
                compound: Some(compound.to_string()),
                stint: Some(stint),
                start_time: None,
            });
        }
    }
    session
}

fn lap_trace(top_speed: f64) -> Vec<TelemetrySample> {
    (0..50)
        .map(|i| TelemetrySample {
            distance_m: i as f64 * 66.,
            speed_kph: top_speed - (i % 10) as f64 * 12.,
            throttle_pct: if i % 10 < 7 { 100. } else { 0. },
            brake: i % 10 >= 7,
        })
        .collect()
}

fn provider_with_telemetry() -> SnapshotProvider {
    SnapshotProvider::new(race_session())
        .with_telemetry("1", 1, lap_trace(290.))
        .with_telemetry("16", 1, lap_trace(285.))
        .with_telemetry("44", 1, lap_trace(280.))
}

#[test]
fn test_record_replay_and_render_all_views() {
    let dir = TempDir::new().unwrap();
    let snapshot_path = dir.path().join("monaco.jsonl");
    let key = SessionKey::new(2024, "monaco", SessionKind::Race);

    let recorded = record_snapshot(&provider_with_telemetry(), &key, &snapshot_path).unwrap();
    assert_eq!(recorded, 3);

    let replay = SnapshotProvider::from_file(&snapshot_path).unwrap();
    let session = SessionLoader::new(&replay).load(&key).unwrap();
    assert_eq!(session, race_session());

    let request = RenderRequest::for_session(&session, DisplayToggles::default());
    assert_eq!(request.lap_time_drivers, vec!["1", "16", "44"]);
    let rendered = views::render_all(&session, &replay, &request);

    let lap_times = rendered.lap_times.unwrap();
    assert!(lap_times.notices.is_empty());
    assert_eq!(lap_times.charts[0].series.len(), 3);
    assert_eq!(lap_times.tables[0].rows[0][0], "VER");

    let telemetry = rendered.telemetry.unwrap();
    assert!(telemetry.notices.is_empty(), "{:?}", telemetry.notices);
    assert_eq!(telemetry.charts.len(), 3);
    for chart in &telemetry.charts {
        assert_eq!(chart.series.len(), 2);
        assert_eq!(chart.series[0].points.len(), 50);
    }

    let positions = rendered.position_changes.unwrap();
    let ver = &positions.charts[0].series[0];
    assert_eq!(ver.points[0].y, 1.);
    assert_eq!(ver.points[9].y, 2.);

    let tires = rendered.tire_strategy.unwrap();
    assert_eq!(tires.tables[0].rows.len(), 6);
    assert_eq!(
        tires.tables[0].rows[0],
        vec!["VER", "1", "1", "4", "4", "MEDIUM"]
    );
}

#[test]
fn test_rendering_is_stable_for_identical_requests() {
    let provider = provider_with_telemetry();
    let session = race_session();
    let request = RenderRequest::for_session(&session, DisplayToggles::default());
    assert_eq!(
        views::render_all(&session, &provider, &request),
        views::render_all(&session, &provider, &request)
    );
}

#[test]
fn test_missing_telemetry_is_scoped_to_its_view() {
    let session = race_session();
    let provider = SnapshotProvider::new(session.clone());
    let request = RenderRequest::for_session(&session, DisplayToggles::default());
    let rendered = views::render_all(&session, &provider, &request);

    let telemetry = rendered.telemetry.unwrap();
    assert!(telemetry.charts.is_empty());
    assert!(matches!(
        telemetry.notices.as_slice(),
        [Notice::Error(message)] if message.starts_with("Error loading telemetry data")
    ));
    assert!(rendered.lap_times.is_some_and(|v| !v.has_error()));
    assert!(rendered.position_changes.is_some_and(|v| !v.has_error()));
    assert!(rendered.tire_strategy.is_some_and(|v| !v.has_error()));
}

#[test]
fn test_snapshot_serves_only_the_recorded_session() {
    let provider = provider_with_telemetry();
    assert!(
        provider
            .load_session(&SessionKey::new(2024, "Monaco", SessionKind::Qualifying))
            .is_err()
    );
    assert!(
        provider
            .load_session(&SessionKey::new(2023, "Monaco", SessionKind::Race))
            .is_err()
    );
    assert_eq!(provider.event_schedule(2024).unwrap().len(), 1);
    assert!(provider.event_schedule(2023).unwrap().is_empty());
}

#[test]
fn test_overview_of_recorded_race() {
    let overview = views::overview(&race_session());
    assert_eq!(
        overview.metrics.last(),
        Some(&("Total Laps".to_string(), "10".to_string()))
    );
    assert_eq!(overview.results.unwrap().rows.len(), 3);
}
