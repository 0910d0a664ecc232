use chrono::Datelike;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::provider::DataProvider;

/// First season offered in the season selector
pub const FIRST_SEASON: i32 = 2018;
/// Event entered when the catalog can't be fetched
pub const DEFAULT_EVENT: &str = "Monaco";

const IGNORED_TOKENS: [&str; 3] = ["grand", "prix", "gp"];

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EventInfo {
    pub name: String,
    pub location: Option<String>,
    pub country: Option<String>,
    /// Championship round, testing events have none
    pub round: Option<u32>,
    pub provider_id: Option<u64>,
}

impl EventInfo {
    pub fn is_testing(&self) -> bool {
        self.name.to_lowercase().contains("testing")
    }

    fn searchable_fields(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str())
            .chain(self.location.as_deref())
            .chain(self.country.as_deref())
    }
}

/// Seasons offered to the user, most recent first.
pub fn season_choices(current_year: i32) -> Vec<i32> {
    (FIRST_SEASON..=current_year).rev().collect()
}

pub fn current_season() -> i32 {
    chrono::Local::now().year()
}

/// Numbers the championship rounds of a schedule ordered by date.
pub fn assign_rounds(events: &mut [EventInfo]) {
    let mut round = 0;
    for event in events.iter_mut() {
        if event.is_testing() {
            event.round = None;
        } else {
            round += 1;
            event.round = Some(round);
        }
    }
}

/// Looks up the event a user typed: round number, then exact name, location or
/// country, then substring, then the best token overlap.
pub fn resolve_event<'e>(events: &'e [EventInfo], query: &str) -> Option<&'e EventInfo> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }

    if let Ok(round) = query.parse::<u32>() {
        return events.iter().find(|e| e.round == Some(round));
    }

    let normalized_query = normalize(query);
    if let Some(event) = events
        .iter()
        .find(|e| e.searchable_fields().any(|f| normalize(f) == normalized_query))
    {
        return Some(event);
    }

    if let Some(event) = events.iter().find(|e| {
        e.searchable_fields()
            .any(|f| normalize(f).contains(&normalized_query))
    }) {
        return Some(event);
    }

    let query_tokens = tokens(&normalized_query);
    let mut best: Option<(&EventInfo, usize)> = None;
    for event in events {
        let event_tokens: Vec<String> = event
            .searchable_fields()
            .flat_map(|f| tokens(&normalize(f)))
            .collect();
        let score = query_tokens
            .iter()
            .filter(|t| event_tokens.contains(t))
            .count();
        if score > 0 && best.is_none_or(|(_, s)| score > s) {
            best = Some((event, score));
        }
    }
    debug!("Fuzzy event match for '{}': {:?}", query, best.map(|b| &b.0.name));
    best.map(|(event, _)| event)
}

fn normalize(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn tokens(normalized: &str) -> Vec<String> {
    normalized
        .split_whitespace()
        .filter(|t| !IGNORED_TOKENS.contains(t))
        .map(str::to_string)
        .collect()
}

/// Lists the events of a season. Provider failures are not surfaced: the
/// catalog comes back empty and the UI falls back to free text entry.
pub struct EventCatalog<'p> {
    provider: &'p dyn DataProvider,
}

impl<'p> EventCatalog<'p> {
    pub fn new(provider: &'p dyn DataProvider) -> Self {
        Self { provider }
    }

    pub fn events(&self, year: i32) -> Vec<EventInfo> {
        match self.provider.event_schedule(year) {
            Ok(events) => events,
            Err(e) => {
                warn!("Could not fetch event schedule for {}: {}", year, e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        DashboardError,
        session::{Lap, Session, SessionKey, TelemetrySample},
    };
    use proptest::prelude::*;

    fn event(name: &str, location: &str, country: &str) -> EventInfo {
        EventInfo {
            name: name.to_string(),
            location: Some(location.to_string()),
            country: Some(country.to_string()),
            ..EventInfo::default()
        }
    }

    fn schedule() -> Vec<EventInfo> {
        let mut events = vec![
            event("Pre-Season Testing", "Sakhir", "Bahrain"),
            event("Bahrain Grand Prix", "Sakhir", "Bahrain"),
            event("Monaco Grand Prix", "Monaco", "Monaco"),
            event("British Grand Prix", "Silverstone", "United Kingdom"),
            event("Abu Dhabi Grand Prix", "Yas Marina", "United Arab Emirates"),
        ];
        assign_rounds(&mut events);
        events
    }

    #[test]
    fn test_season_choices_are_descending() {
        assert_eq!(season_choices(2020), vec![2020, 2019, 2018]);
        assert!(season_choices(2017).is_empty());
    }

    #[test]
    fn test_assign_rounds_skips_testing() {
        let events = schedule();
        assert_eq!(events[0].round, None);
        assert_eq!(events[1].round, Some(1));
        assert_eq!(events[4].round, Some(4));
    }

    #[test]
    fn test_resolve_by_round() {
        let events = schedule();
        assert_eq!(resolve_event(&events, "2").unwrap().name, "Monaco Grand Prix");
        assert!(resolve_event(&events, "12").is_none());
    }

    #[test]
    fn test_resolve_exact_and_substring() {
        let events = schedule();
        assert_eq!(
            resolve_event(&events, "monaco").unwrap().name,
            "Monaco Grand Prix"
        );
        assert_eq!(
            resolve_event(&events, "Silverstone").unwrap().name,
            "British Grand Prix"
        );
        assert_eq!(resolve_event(&events, "Abu").unwrap().name, "Abu Dhabi Grand Prix");
    }

    #[test]
    fn test_resolve_fuzzy_tokens() {
        let events = schedule();
        assert_eq!(
            resolve_event(&events, "Grand Prix of Britain British").unwrap().name,
            "British Grand Prix"
        );
        assert!(resolve_event(&events, "Grand Prix").is_some());
        assert!(resolve_event(&events, "Nordschleife").is_none());
        assert!(resolve_event(&events, "  ").is_none());
    }

    struct OfflineProvider;

    impl DataProvider for OfflineProvider {
        fn event_schedule(&self, year: i32) -> Result<Vec<EventInfo>, DashboardError> {
            Err(DashboardError::EventNotFound {
                year,
                query: "schedule".to_string(),
            })
        }

        fn load_session(&self, key: &SessionKey) -> Result<Session, DashboardError> {
            Err(DashboardError::EventNotFound {
                year: key.year,
                query: key.event.clone(),
            })
        }

        fn lap_telemetry(
            &self,
            _session: &Session,
            lap: &Lap,
        ) -> Result<Vec<TelemetrySample>, DashboardError> {
            Err(DashboardError::TelemetryUnavailable {
                driver: lap.driver.clone(),
                lap_number: lap.lap_number,
            })
        }
    }

    #[test]
    fn test_failed_schedule_yields_empty_catalog() {
        let provider = OfflineProvider;
        let catalog = EventCatalog::new(&provider);
        assert!(catalog.events(2024).is_empty());
        assert!(catalog.events(2018).is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_season_choices_within_supported_range(current in 2000i32..2100, year in 1900i32..2200) {
            let choices = season_choices(current);
            let supported = (FIRST_SEASON..=current).contains(&year);
            prop_assert_eq!(choices.contains(&year), supported);
        }
    }
}
