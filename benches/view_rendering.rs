use criterion::{Criterion, black_box, criterion_group, criterion_main};
use paddock::session::{Driver, Lap};
use paddock::views::{self, lap_times, positions, tire_strategy};
use paddock::{
    DisplayToggles, RenderRequest, Session, SessionKey, SessionKind, SnapshotProvider,
    session::TelemetrySample,
};
use std::time::Duration;

const DRIVER_COUNT: u32 = 20;
const RACE_LAPS: u32 = 70;

fn create_race_session() -> Session {
    let mut session = Session::empty(SessionKey::new(2024, "Monaco", SessionKind::Race));
    for car in 0..DRIVER_COUNT {
        let id = (car + 1).to_string();
        session.drivers.push(Driver {
            id: id.clone(),
            abbreviation: Some(format!("D{:02}", car + 1)),
            team_colour: Some("3671C6".to_string()),
            ..Default::default()
        });
        for lap_number in 1..=RACE_LAPS {
            let stint = 1 + lap_number / 25;
            session.laps.push(Lap {
                driver: id.clone(),
                lap_number,
                lap_time: Some(Duration::from_millis(
                    74_000 + (car as u64 * 137 + lap_number as u64 * 61) % 2_000,
                )),
                position: Some((car + lap_number) % DRIVER_COUNT + 1),
                compound: Some(["SOFT", "MEDIUM", "HARD"][(stint % 3) as usize].to_string()),
                stint: Some(stint),
                start_time: None,
            });
        }
    }
    session
}

fn create_trace() -> Vec<TelemetrySample> {
    (0..800)
        .map(|i| TelemetrySample {
            distance_m: i as f64 * 4.2,
            speed_kph: 120. + (i % 100) as f64 * 1.8,
            throttle_pct: if i % 100 < 80 { 100. } else { 0. },
            brake: i % 100 >= 85,
        })
        .collect()
}

fn bench_individual_views(c: &mut Criterion) {
    let mut group = c.benchmark_group("views");
    let session = create_race_session();
    let drivers = lap_times::default_drivers(&session);

    group.bench_function("lap_times", |b| {
        b.iter(|| black_box(lap_times::render(&session, &drivers)));
    });

    group.bench_function("positions", |b| {
        b.iter(|| black_box(positions::render(&session)));
    });

    group.bench_function("tire_strategy", |b| {
        b.iter(|| black_box(tire_strategy::render(&session)));
    });

    group.finish();
}

fn bench_render_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("dashboard");
    let session = create_race_session();
    let fastest = |driver: &str| {
        session
            .fastest_lap(driver)
            .map(|l| l.lap_number)
            .unwrap_or_default()
    };
    let provider = SnapshotProvider::new(session.clone())
        .with_telemetry("1", fastest("1"), create_trace())
        .with_telemetry("2", fastest("2"), create_trace());
    let request = RenderRequest::for_session(&session, DisplayToggles::default());

    group.bench_function("render_all", |b| {
        b.iter(|| black_box(views::render_all(&session, &provider, &request)));
    });

    group.bench_function("overview", |b| {
        b.iter(|| black_box(views::overview(&session)));
    });

    group.finish();
}

criterion_group!(benches, bench_individual_views, bench_render_all);
criterion_main!(benches);
