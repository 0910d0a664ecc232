// Library interface for paddock
// This allows integration tests and benches to access internal modules

pub mod config;
pub mod errors;
pub mod provider;
pub mod session;
pub mod ui;
pub mod views;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::DashboardError;
pub use provider::{DataProvider, OpenF1Provider, SnapshotProvider};
pub use session::{EventCatalog, Session, SessionKey, SessionKind, SessionLoader};
pub use views::{DisplayToggles, RenderRequest, ViewOutput};
