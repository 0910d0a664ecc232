use log::{error, info};

use crate::{DashboardError, provider::DataProvider};

use super::{Session, SessionKey};

/// Loads a session with a single provider attempt. A failed load never yields
/// a partial session; the user has to trigger a new load.
pub struct SessionLoader<'p> {
    provider: &'p dyn DataProvider,
}

impl<'p> SessionLoader<'p> {
    pub fn new(provider: &'p dyn DataProvider) -> Self {
        Self { provider }
    }

    pub fn load(&self, key: &SessionKey) -> Result<Session, DashboardError> {
        info!(
            "Loading {} data for {} {}",
            key.kind.label(),
            key.event,
            key.year
        );
        match self.provider.load_session(key) {
            Ok(session) => {
                info!(
                    "Loaded {} {}: {} drivers, {} laps, {} results",
                    session.event_name,
                    key.kind,
                    session.drivers.len(),
                    session.laps.len(),
                    session.results.len()
                );
                Ok(session)
            }
            Err(e) => {
                error!("Error loading session data: {}", e);
                Err(e)
            }
        }
    }
}
