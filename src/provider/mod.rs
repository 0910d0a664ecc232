pub mod openf1;
pub mod snapshot;

use crate::{
    DashboardError,
    session::{EventInfo, Lap, Session, SessionKey, TelemetrySample},
};

pub use openf1::OpenF1Provider;
pub use snapshot::SnapshotProvider;

/// A source of timing data. Every call may be slow and may fail; callers
/// decide whether a failure is surfaced or degraded.
pub trait DataProvider {
    /// Events of a season ordered by date
    fn event_schedule(&self, year: i32) -> Result<Vec<EventInfo>, DashboardError>;

    /// Resolve the session and materialize its drivers, laps and results
    fn load_session(&self, key: &SessionKey) -> Result<Session, DashboardError>;

    /// High frequency samples for a single lap
    fn lap_telemetry(
        &self,
        session: &Session,
        lap: &Lap,
    ) -> Result<Vec<TelemetrySample>, DashboardError>;
}
