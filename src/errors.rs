// Error types for paddock

use snafu::Snafu;
use std::io;

#[derive(Debug, Snafu)]
pub enum DashboardError {
    // Errors talking to the data provider
    #[snafu(display("Request to {url} failed: {source}"))]
    HttpRequestError {
        url: String,
        source: Box<ureq::Error>,
    },
    #[snafu(display("Could not decode response from {url}: {source}"))]
    ResponseDecodeError { url: String, source: io::Error },
    #[snafu(display("Invalid timestamp '{value}' in provider data"))]
    InvalidTimestamp {
        value: String,
        source: chrono::ParseError,
    },

    // Session lookup errors
    #[snafu(display("No event matching '{query}' in the {year} season"))]
    EventNotFound { year: i32, query: String },
    #[snafu(display("No {kind} session found for {event} {year}"))]
    SessionNotFound {
        year: i32,
        event: String,
        kind: String,
    },
    #[snafu(display("Unknown session type: {value}"))]
    UnknownSessionKind { value: String },

    // Telemetry errors
    #[snafu(display("Driver {driver} has no timed lap in this session"))]
    NoTimedLap { driver: String },
    #[snafu(display("No telemetry available for driver {driver} on lap {lap_number}"))]
    TelemetryUnavailable { driver: String, lap_number: u32 },

    // Config management errors
    #[snafu(display("Error writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },

    // Snapshot errors
    #[snafu(display("Error writing snapshot file"))]
    SnapshotWriteError { source: io::Error },
    #[snafu(display("Error loading snapshot file: {source}"))]
    SnapshotReadError { source: io::Error },
    #[snafu(display("Invalid snapshot file: {path}"))]
    InvalidSnapshot { path: String },

    // UI errors
    #[snafu(display("Could not start the dashboard window: {source}"))]
    WindowError { source: eframe::Error },
}
