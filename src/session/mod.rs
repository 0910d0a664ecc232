pub mod catalog;
pub mod loader;

use std::{fmt, str::FromStr, time::Duration};

use chrono::{DateTime, FixedOffset};
use egui::Color32;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::DashboardError;

pub use catalog::{EventCatalog, EventInfo, season_choices};
pub use loader::SessionLoader;

/// Driver identifier as used by the provider (the car number).
pub type DriverId = String;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionKind {
    Race,
    Qualifying,
    Practice1,
    Practice2,
    Practice3,
    Sprint,
    SprintQualifying,
}

impl SessionKind {
    pub const ALL: [SessionKind; 7] = [
        SessionKind::Race,
        SessionKind::Qualifying,
        SessionKind::Practice1,
        SessionKind::Practice2,
        SessionKind::Practice3,
        SessionKind::Sprint,
        SessionKind::SprintQualifying,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SessionKind::Race => "Race",
            SessionKind::Qualifying => "Qualifying",
            SessionKind::Practice1 => "Practice 1",
            SessionKind::Practice2 => "Practice 2",
            SessionKind::Practice3 => "Practice 3",
            SessionKind::Sprint => "Sprint",
            SessionKind::SprintQualifying => "Sprint Qualifying",
        }
    }

    /// Session names the provider may use for this kind. The sprint qualifying
    /// session ran as "Sprint Shootout" in 2023.
    pub fn provider_names(&self) -> &'static [&'static str] {
        match self {
            SessionKind::SprintQualifying => &["Sprint Qualifying", "Sprint Shootout"],
            SessionKind::Race => &["Race"],
            SessionKind::Qualifying => &["Qualifying"],
            SessionKind::Practice1 => &["Practice 1"],
            SessionKind::Practice2 => &["Practice 2"],
            SessionKind::Practice3 => &["Practice 3"],
            SessionKind::Sprint => &["Sprint"],
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SessionKind {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', '_'], " ");
        let kind = match normalized.as_str() {
            "race" | "r" => SessionKind::Race,
            "qualifying" | "q" => SessionKind::Qualifying,
            "practice 1" | "fp1" => SessionKind::Practice1,
            "practice 2" | "fp2" => SessionKind::Practice2,
            "practice 3" | "fp3" => SessionKind::Practice3,
            "sprint" | "s" => SessionKind::Sprint,
            "sprint qualifying" | "sprint shootout" | "sq" => SessionKind::SprintQualifying,
            _ => {
                return Err(DashboardError::UnknownSessionKind {
                    value: s.to_string(),
                });
            }
        };
        Ok(kind)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub year: i32,
    /// Event name, fuzzy name or round number as typed by the user
    pub event: String,
    pub kind: SessionKind,
}

impl SessionKey {
    pub fn new(year: i32, event: impl Into<String>, kind: SessionKind) -> Self {
        Self {
            year,
            event: event.into(),
            kind,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub id: DriverId,
    pub abbreviation: Option<String>,
    pub team_name: Option<String>,
    /// Hex colour as delivered by the provider, with or without a leading '#'
    pub team_colour: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Lap {
    pub driver: DriverId,
    pub lap_number: u32,
    pub lap_time: Option<Duration>,
    pub position: Option<u32>,
    pub compound: Option<String>,
    pub stint: Option<u32>,
    pub start_time: Option<DateTime<FixedOffset>>,
}

impl Lap {
    pub fn lap_time_s(&self) -> Option<f64> {
        self.lap_time.map(|t| t.as_secs_f64())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub position: Option<u32>,
    pub driver: DriverId,
    pub abbreviation: String,
    pub team_name: String,
    pub points: Option<f64>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// Meters from the start of the lap
    pub distance_m: f64,
    pub speed_kph: f64,
    /// Throttle use. 0=off throttle to 100=full throttle
    pub throttle_pct: f64,
    pub brake: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub key: SessionKey,
    /// Event name as resolved against the catalog
    pub event_name: String,
    /// Provider specific session identifier, used to fetch telemetry
    pub provider_session_id: Option<u64>,
    pub drivers: Vec<Driver>,
    pub laps: Vec<Lap>,
    pub results: Vec<ResultRow>,
}

impl Session {
    pub fn empty(key: SessionKey) -> Self {
        Self {
            event_name: key.event.clone(),
            key,
            provider_session_id: None,
            drivers: Vec::new(),
            laps: Vec::new(),
            results: Vec::new(),
        }
    }

    pub fn has_laps(&self) -> bool {
        !self.laps.is_empty()
    }

    pub fn driver_ids(&self) -> Vec<DriverId> {
        self.drivers.iter().map(|d| d.id.clone()).collect()
    }

    pub fn driver(&self, id: &str) -> Option<&Driver> {
        self.drivers.iter().find(|d| d.id == id)
    }

    pub fn laps_for<'s, 'd>(&'s self, driver: &'d str) -> impl Iterator<Item = &'s Lap> {
        self.laps.iter().filter(move |l| l.driver == driver)
    }

    /// Quickest timed lap for the driver. Laps without a time never qualify.
    pub fn fastest_lap(&self, driver: &str) -> Option<&Lap> {
        self.laps_for(driver)
            .filter(|l| l.lap_time.is_some())
            .min_by_key(|l| l.lap_time)
    }

    /// Number of distinct lap numbers in the session
    pub fn total_laps(&self) -> usize {
        self.laps.iter().map(|l| l.lap_number).unique().count()
    }

    /// Abbreviation for the driver, or the raw identifier when it is unknown.
    pub fn display_name(&self, id: &str) -> String {
        self.driver(id)
            .and_then(|d| d.abbreviation.clone())
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn driver_color(&self, id: &str) -> Option<Color32> {
        self.driver(id)
            .and_then(|d| d.team_colour.as_deref())
            .and_then(parse_hex_color)
    }
}

pub fn parse_hex_color(value: &str) -> Option<Color32> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some(Color32::from_rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}
