// Session snapshots: a loaded session plus lap telemetry written as JSON lines,
// replayed later without network access.

use std::{collections::HashMap, path::Path};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    DashboardError,
    session::{
        DriverId, EventInfo, Lap, Session, SessionKey, SessionLoader, TelemetrySample,
        catalog::resolve_event,
    },
};

use super::DataProvider;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum SnapshotRecord {
    Session(Box<Session>),
    Telemetry {
        driver: DriverId,
        lap_number: u32,
        samples: Vec<TelemetrySample>,
    },
}

pub struct SnapshotProvider {
    session: Session,
    telemetry: HashMap<(DriverId, u32), Vec<TelemetrySample>>,
}

impl SnapshotProvider {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            telemetry: HashMap::new(),
        }
    }

    pub fn with_telemetry(
        mut self,
        driver: impl Into<DriverId>,
        lap_number: u32,
        samples: Vec<TelemetrySample>,
    ) -> Self {
        self.telemetry.insert((driver.into(), lap_number), samples);
        self
    }

    pub fn from_file(source_file: &Path) -> Result<Self, DashboardError> {
        let records = serde_jsonlines::json_lines(source_file)
            .map_err(|e| DashboardError::SnapshotReadError { source: e })?
            .collect::<Result<Vec<SnapshotRecord>, std::io::Error>>()
            .map_err(|e| DashboardError::SnapshotReadError { source: e })?;

        let mut session = None;
        let mut telemetry = HashMap::new();
        for record in records {
            match record {
                SnapshotRecord::Session(s) => {
                    if session.is_some() {
                        warn!("Snapshot {:?} holds more than one session, keeping the first", source_file);
                        continue;
                    }
                    session = Some(*s);
                }
                SnapshotRecord::Telemetry {
                    driver,
                    lap_number,
                    samples,
                } => {
                    telemetry.insert((driver, lap_number), samples);
                }
            }
        }

        let session = session.ok_or_else(|| DashboardError::InvalidSnapshot {
            path: format!("{:?}", source_file),
        })?;
        info!(
            "Loaded snapshot {:?}: {} {} {} with telemetry for {} laps",
            source_file,
            session.key.year,
            session.event_name,
            session.key.kind,
            telemetry.len()
        );
        Ok(Self { session, telemetry })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn event(&self) -> EventInfo {
        EventInfo {
            name: self.session.event_name.clone(),
            ..EventInfo::default()
        }
    }
}

impl DataProvider for SnapshotProvider {
    fn event_schedule(&self, year: i32) -> Result<Vec<EventInfo>, DashboardError> {
        if year == self.session.key.year {
            Ok(vec![self.event()])
        } else {
            Ok(Vec::new())
        }
    }

    fn load_session(&self, key: &SessionKey) -> Result<Session, DashboardError> {
        let events = [self.event()];
        if key.year == self.session.key.year
            && key.kind == self.session.key.kind
            && resolve_event(&events, &key.event).is_some()
        {
            Ok(self.session.clone())
        } else {
            Err(DashboardError::SessionNotFound {
                year: key.year,
                event: key.event.clone(),
                kind: key.kind.label().to_string(),
            })
        }
    }

    fn lap_telemetry(
        &self,
        _session: &Session,
        lap: &Lap,
    ) -> Result<Vec<TelemetrySample>, DashboardError> {
        self.telemetry
            .get(&(lap.driver.clone(), lap.lap_number))
            .cloned()
            .ok_or_else(|| DashboardError::TelemetryUnavailable {
                driver: lap.driver.clone(),
                lap_number: lap.lap_number,
            })
    }
}

/// Loads a session and the telemetry of every driver's fastest lap, then
/// writes both to `output`. Laps whose telemetry can't be fetched are left out.
pub fn record_snapshot(
    provider: &dyn DataProvider,
    key: &SessionKey,
    output: &Path,
) -> Result<usize, DashboardError> {
    let session = SessionLoader::new(provider).load(key)?;

    let mut records = Vec::new();
    for driver in session.driver_ids() {
        let Some(lap) = session.fastest_lap(&driver) else {
            continue;
        };
        match provider.lap_telemetry(&session, lap) {
            Ok(samples) => records.push(SnapshotRecord::Telemetry {
                driver: driver.clone(),
                lap_number: lap.lap_number,
                samples,
            }),
            Err(e) => warn!("Skipping telemetry for driver {}: {}", driver, e),
        }
    }
    let telemetry_laps = records.len();

    records.insert(0, SnapshotRecord::Session(Box::new(session)));
    serde_jsonlines::write_json_lines(output, &records)
        .map_err(|e| DashboardError::SnapshotWriteError { source: e })?;
    info!(
        "Wrote snapshot {:?} with telemetry for {} laps",
        output, telemetry_laps
    );
    Ok(telemetry_laps)
}
