// OpenF1 (https://openf1.org) backed data provider

use std::{collections::HashMap, time::Duration};

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeDelta};
use itertools::Itertools;
use log::{debug, info};
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    DashboardError,
    session::{
        Driver, EventInfo, Lap, ResultRow, Session, SessionKey, TelemetrySample,
        catalog::{assign_rounds, resolve_event},
    },
};

use super::DataProvider;

pub const DEFAULT_API_URL: &str = "https://api.openf1.org/v1";
pub const DEFAULT_REQUEST_TIMEOUT_S: u64 = 30;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ApiMeeting {
    pub(crate) meeting_key: Option<u64>,
    pub(crate) meeting_name: Option<String>,
    pub(crate) location: Option<String>,
    pub(crate) country_name: Option<String>,
    pub(crate) date_start: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ApiSession {
    pub(crate) session_key: Option<u64>,
    pub(crate) session_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ApiDriver {
    pub(crate) driver_number: Option<u32>,
    pub(crate) name_acronym: Option<String>,
    pub(crate) team_name: Option<String>,
    pub(crate) team_colour: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ApiLap {
    pub(crate) driver_number: Option<u32>,
    pub(crate) lap_number: Option<u32>,
    pub(crate) lap_duration: Option<f64>,
    pub(crate) date_start: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ApiStint {
    pub(crate) driver_number: Option<u32>,
    pub(crate) stint_number: Option<u32>,
    pub(crate) lap_start: Option<u32>,
    pub(crate) lap_end: Option<u32>,
    pub(crate) compound: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ApiPosition {
    pub(crate) driver_number: Option<u32>,
    pub(crate) position: Option<u32>,
    pub(crate) date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ApiSessionResult {
    pub(crate) driver_number: Option<u32>,
    pub(crate) position: Option<u32>,
    pub(crate) points: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ApiCarData {
    pub(crate) date: Option<String>,
    pub(crate) speed: Option<f64>,
    pub(crate) throttle: Option<f64>,
    pub(crate) brake: Option<f64>,
}

/// Raw per-session tables as returned by the API
#[derive(Debug, Default)]
pub(crate) struct SessionTables {
    pub(crate) drivers: Vec<ApiDriver>,
    pub(crate) laps: Vec<ApiLap>,
    pub(crate) stints: Vec<ApiStint>,
    pub(crate) positions: Vec<ApiPosition>,
    pub(crate) results: Vec<ApiSessionResult>,
}

pub struct OpenF1Provider {
    base_url: String,
    timeout: Duration,
}

impl Default for OpenF1Provider {
    fn default() -> Self {
        Self::new(
            DEFAULT_API_URL,
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_S),
        )
    }
}

impl OpenF1Provider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn endpoint_url(&self, endpoint: &str, params: &[(&str, String)]) -> String {
        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .join("&");
        if query.is_empty() {
            format!("{}/{}", self.base_url, endpoint)
        } else {
            format!("{}/{}?{}", self.base_url, endpoint, query)
        }
    }

    fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<T>, DashboardError> {
        let url = self.endpoint_url(endpoint, params);
        debug!("GET {}", url);

        let response = match ureq::get(&url).timeout(self.timeout).call() {
            Ok(response) => response,
            // the API answers 404 when a filter matches nothing
            Err(ureq::Error::Status(404, _)) => return Ok(Vec::new()),
            Err(e) => {
                return Err(DashboardError::HttpRequestError {
                    url,
                    source: Box::new(e),
                });
            }
        };

        response
            .into_json::<Vec<T>>()
            .map_err(|e| DashboardError::ResponseDecodeError { url, source: e })
    }

    fn find_session_id(
        &self,
        key: &SessionKey,
        event: &EventInfo,
    ) -> Result<u64, DashboardError> {
        let not_found = || DashboardError::SessionNotFound {
            year: key.year,
            event: event.name.clone(),
            kind: key.kind.label().to_string(),
        };
        let meeting_key = event.provider_id.ok_or_else(not_found)?;
        let sessions: Vec<ApiSession> =
            self.get("sessions", &[("meeting_key", meeting_key.to_string())])?;
        sessions
            .iter()
            .find(|s| {
                s.session_name
                    .as_deref()
                    .is_some_and(|name| key.kind.provider_names().contains(&name))
            })
            .and_then(|s| s.session_key)
            .ok_or_else(not_found)
    }
}

impl DataProvider for OpenF1Provider {
    fn event_schedule(&self, year: i32) -> Result<Vec<EventInfo>, DashboardError> {
        let meetings: Vec<ApiMeeting> = self.get("meetings", &[("year", year.to_string())])?;
        let events = schedule_from_meetings(meetings);
        debug!("Found {} events for {}", events.len(), year);
        Ok(events)
    }

    fn load_session(&self, key: &SessionKey) -> Result<Session, DashboardError> {
        let schedule = self.event_schedule(key.year)?;
        let event = resolve_event(&schedule, &key.event).ok_or_else(|| {
            DashboardError::EventNotFound {
                year: key.year,
                query: key.event.clone(),
            }
        })?;
        let session_id = self.find_session_id(key, event)?;
        info!(
            "Resolved '{}' {} {} to session {}",
            key.event, key.year, key.kind, session_id
        );

        let filter = [("session_key", session_id.to_string())];
        let tables = SessionTables {
            drivers: self.get("drivers", &filter)?,
            laps: self.get("laps", &filter)?,
            stints: self.get("stints", &filter)?,
            positions: self.get("position", &filter)?,
            results: self.get("session_result", &filter)?,
        };
        assemble_session(key.clone(), event.name.clone(), session_id, tables)
    }

    fn lap_telemetry(
        &self,
        session: &Session,
        lap: &Lap,
    ) -> Result<Vec<TelemetrySample>, DashboardError> {
        let unavailable = || DashboardError::TelemetryUnavailable {
            driver: lap.driver.clone(),
            lap_number: lap.lap_number,
        };
        let session_id = session.provider_session_id.ok_or_else(unavailable)?;
        let start = lap.start_time.ok_or_else(unavailable)?;
        let duration = lap
            .lap_time
            .and_then(|t| TimeDelta::from_std(t).ok())
            .ok_or_else(unavailable)?;
        let end = start + duration;

        let car_data: Vec<ApiCarData> = self.get(
            "car_data",
            &[
                ("session_key", session_id.to_string()),
                ("driver_number", lap.driver.clone()),
                ("date>", start.to_rfc3339()),
                ("date<", end.to_rfc3339()),
            ],
        )?;
        let samples = samples_with_distance(car_data)?;
        if samples.is_empty() {
            return Err(unavailable());
        }
        Ok(samples)
    }
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>, DashboardError> {
    DateTime::parse_from_rfc3339(value).or_else(|_| {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc().fixed_offset())
            .map_err(|e| DashboardError::InvalidTimestamp {
                value: value.to_string(),
                source: e,
            })
    })
}

fn optional_timestamp(
    value: Option<&str>,
) -> Result<Option<DateTime<FixedOffset>>, DashboardError> {
    value.map(parse_timestamp).transpose()
}

pub(crate) fn schedule_from_meetings(meetings: Vec<ApiMeeting>) -> Vec<EventInfo> {
    let mut events = meetings
        .into_iter()
        .filter(|m| m.meeting_name.is_some())
        .sorted_by(|a, b| a.date_start.cmp(&b.date_start))
        .map(|m| EventInfo {
            name: m.meeting_name.unwrap_or_default(),
            location: m.location,
            country: m.country_name,
            round: None,
            provider_id: m.meeting_key,
        })
        .collect_vec();
    assign_rounds(&mut events);
    events
}

/// Joins the raw API tables into a session: laps pick up their stint and
/// compound from the stint ranges and their position from the last position
/// update recorded before the lap ended.
pub(crate) fn assemble_session(
    key: SessionKey,
    event_name: String,
    session_id: u64,
    tables: SessionTables,
) -> Result<Session, DashboardError> {
    let listed_drivers = tables
        .drivers
        .iter()
        .filter_map(|d| {
            d.driver_number.map(|number| Driver {
                id: number.to_string(),
                abbreviation: d.name_acronym.clone(),
                team_name: d.team_name.clone(),
                team_colour: d.team_colour.clone(),
            })
        })
        .unique_by(|d| d.id.clone())
        .collect_vec();

    let results = tables
        .results
        .iter()
        .filter(|r| r.driver_number.is_some())
        .sorted_by_key(|r| r.position.unwrap_or(u32::MAX))
        .map(|r| {
            let id = r.driver_number.unwrap_or_default().to_string();
            let driver = listed_drivers.iter().find(|d| d.id == id);
            ResultRow {
                position: r.position,
                abbreviation: driver
                    .and_then(|d| d.abbreviation.clone())
                    .unwrap_or_else(|| id.clone()),
                team_name: driver
                    .and_then(|d| d.team_name.clone())
                    .unwrap_or_default(),
                points: r.points,
                driver: id,
            }
        })
        .collect_vec();

    // finishing order first, then whoever else the provider listed or saw on track
    let driver_order = results
        .iter()
        .map(|r| r.driver.clone())
        .chain(listed_drivers.iter().map(|d| d.id.clone()))
        .chain(
            tables
                .laps
                .iter()
                .filter_map(|l| l.driver_number.map(|n| n.to_string())),
        )
        .unique()
        .collect_vec();
    let drivers = driver_order
        .iter()
        .map(|id| {
            listed_drivers
                .iter()
                .find(|d| &d.id == id)
                .cloned()
                .unwrap_or_else(|| Driver {
                    id: id.clone(),
                    ..Driver::default()
                })
        })
        .collect_vec();

    let mut positions: HashMap<u32, Vec<(DateTime<FixedOffset>, u32)>> = HashMap::new();
    for p in &tables.positions {
        if let (Some(driver), Some(position), Some(date)) =
            (p.driver_number, p.position, p.date.as_deref())
        {
            positions
                .entry(driver)
                .or_default()
                .push((parse_timestamp(date)?, position));
        }
    }
    for updates in positions.values_mut() {
        updates.sort_by_key(|(date, _)| *date);
    }

    let stints = tables
        .stints
        .iter()
        .filter(|s| s.driver_number.is_some())
        .into_group_map_by(|s| s.driver_number.unwrap_or_default());

    let laps_by_driver = tables
        .laps
        .iter()
        .filter(|l| l.driver_number.is_some() && l.lap_number.is_some())
        .into_group_map_by(|l| l.driver_number.unwrap_or_default());

    let mut laps = Vec::with_capacity(tables.laps.len());
    for id in &driver_order {
        let Ok(number) = id.parse::<u32>() else {
            continue;
        };
        let Some(driver_laps) = laps_by_driver.get(&number) else {
            continue;
        };
        let driver_laps = driver_laps
            .iter()
            .sorted_by_key(|l| l.lap_number)
            .collect_vec();
        let starts = driver_laps
            .iter()
            .map(|l| optional_timestamp(l.date_start.as_deref()))
            .collect::<Result<Vec<_>, _>>()?;

        for (idx, api_lap) in driver_laps.iter().enumerate() {
            let lap_number = api_lap.lap_number.unwrap_or_default();
            let lap_time = api_lap
                .lap_duration
                .filter(|d| *d > 0.)
                .and_then(|d| Duration::try_from_secs_f64(d).ok());
            let start_time = starts[idx];
            let end_time = starts.get(idx + 1).copied().flatten().or_else(|| {
                start_time.zip(lap_time.and_then(|t| TimeDelta::from_std(t).ok()))
                    .map(|(start, duration)| start + duration)
            });
            let position = end_time.and_then(|end| {
                positions.get(&number).and_then(|updates| {
                    updates
                        .iter()
                        .take_while(|(date, _)| *date <= end)
                        .last()
                        .map(|(_, position)| *position)
                })
            });
            let stint = stints.get(&number).and_then(|driver_stints| {
                driver_stints.iter().find(|s| {
                    s.lap_start.unwrap_or(1) <= lap_number
                        && lap_number <= s.lap_end.unwrap_or(u32::MAX)
                })
            });

            laps.push(Lap {
                driver: id.clone(),
                lap_number,
                lap_time,
                position,
                compound: stint.and_then(|s| s.compound.clone()),
                stint: stint.and_then(|s| s.stint_number),
                start_time,
            });
        }
    }

    Ok(Session {
        key,
        event_name,
        provider_session_id: Some(session_id),
        drivers,
        laps,
        results,
    })
}

/// Orders car data samples in time and derives the distance covered from the
/// speed trace.
pub(crate) fn samples_with_distance(
    car_data: Vec<ApiCarData>,
) -> Result<Vec<TelemetrySample>, DashboardError> {
    let mut timed = Vec::with_capacity(car_data.len());
    for point in car_data {
        if let Some(date) = point.date.as_deref() {
            timed.push((parse_timestamp(date)?, point));
        }
    }
    timed.sort_by_key(|(date, _)| *date);

    let mut samples = Vec::with_capacity(timed.len());
    let mut distance_m = 0.;
    let mut prev_date: Option<DateTime<FixedOffset>> = None;
    for (date, point) in timed {
        let speed_kph = point.speed.unwrap_or(0.);
        if let Some(prev) = prev_date {
            let dt_s = (date - prev).num_milliseconds() as f64 / 1000.;
            distance_m += speed_kph / 3.6 * dt_s;
        }
        prev_date = Some(date);
        samples.push(TelemetrySample {
            distance_m,
            speed_kph,
            throttle_pct: point.throttle.unwrap_or(0.).clamp(0., 100.),
            brake: point.brake.unwrap_or(0.) > 0.,
        });
    }
    Ok(samples)
}
