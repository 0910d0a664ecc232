//! Chart and table specifications built from a loaded session.
//!
//! Views never draw anything themselves. Each one turns a [`Session`] and the
//! user's selections into a [`ViewOutput`] that the UI hands to egui_plot. The
//! same inputs always produce the same output.

pub mod lap_times;
pub mod positions;
pub mod telemetry;
pub mod tire_strategy;

use egui::Color32;

use crate::{
    provider::DataProvider,
    session::{DriverId, Session, SessionKey},
};

/// Colour for drivers whose team colour can't be resolved
pub const FALLBACK_DRIVER_COLOR: Color32 = Color32::from_rgb(0x80, 0x80, 0x80);

/// Colours handed out to series that have no identity colour
pub const SERIES_PALETTE: [Color32; 10] = [
    Color32::from_rgb(0x63, 0x6E, 0xFA),
    Color32::from_rgb(0xEF, 0x55, 0x3B),
    Color32::from_rgb(0x00, 0xCC, 0x96),
    Color32::from_rgb(0xAB, 0x63, 0xFA),
    Color32::from_rgb(0xFF, 0xA1, 0x5A),
    Color32::from_rgb(0x19, 0xD3, 0xF3),
    Color32::from_rgb(0xFF, 0x66, 0x92),
    Color32::from_rgb(0xB6, 0xE8, 0x80),
    Color32::from_rgb(0xFF, 0x97, 0xFF),
    Color32::from_rgb(0xFE, 0xCB, 0x52),
];

pub fn palette_color(idx: usize) -> Color32 {
    SERIES_PALETTE[idx % SERIES_PALETTE.len()]
}

pub fn compound_color(compound: &str) -> Color32 {
    match compound.to_uppercase().as_str() {
        "SOFT" => Color32::from_rgb(0xDA, 0x29, 0x1C),
        "MEDIUM" => Color32::from_rgb(0xFF, 0xD1, 0x2E),
        "HARD" => Color32::from_rgb(0xF0, 0xF0, 0xEC),
        "INTERMEDIATE" => Color32::from_rgb(0x43, 0xB0, 0x2A),
        "WET" => Color32::from_rgb(0x00, 0x67, 0xAD),
        _ => FALLBACK_DRIVER_COLOR,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeriesStyle {
    Line,
    LineWithMarkers,
    SquareMarkers,
    Bars,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChartPoint {
    pub x: f64,
    pub y: f64,
    pub hover: Option<String>,
}

impl ChartPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, hover: None }
    }

    pub fn with_hover(mut self, hover: String) -> Self {
        self.hover = Some(hover);
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    pub name: String,
    pub color: Color32,
    pub style: SeriesStyle,
    pub points: Vec<ChartPoint>,
    pub show_in_legend: bool,
}

impl Series {
    pub fn new(name: impl Into<String>, color: Color32, style: SeriesStyle) -> Self {
        Self {
            name: name.into(),
            color,
            style,
            points: Vec::new(),
            show_in_legend: true,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Axis {
    pub label: String,
    /// Fixed display range, lower value first
    pub range: Option<(f64, f64)>,
    /// Draw the lowest value at the top
    pub inverted: bool,
    pub ticks: Vec<f64>,
    /// Category labels for a categorical axis, indexed by value
    pub categories: Vec<String>,
}

impl Axis {
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn category_label(&self, value: f64) -> Option<&str> {
        let rounded = value.round();
        if (value - rounded).abs() > 1e-6 || rounded < 0. {
            return None;
        }
        self.categories.get(rounded as usize).map(String::as_str)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Chart {
    pub id: String,
    pub title: String,
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub series: Vec<Series>,
    pub height: f32,
    /// Charts in the same group share their x axis
    pub link_group: Option<String>,
}

impl Chart {
    pub fn new(id: impl Into<String>, title: impl Into<String>, x_axis: Axis, y_axis: Axis) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            x_axis,
            y_axis,
            series: Vec::new(),
            height: 500.,
            link_group: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Notice {
    Warning(String),
    Error(String),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewOutput {
    pub title: String,
    pub notices: Vec<Notice>,
    pub charts: Vec<Chart>,
    pub tables: Vec<Table>,
}

impl ViewOutput {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn warn(mut self, message: impl Into<String>) -> Self {
        self.notices.push(Notice::Warning(message.into()));
        self
    }

    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.notices.push(Notice::Error(message.into()));
        self
    }

    pub fn has_warning(&self) -> bool {
        self.notices.iter().any(|n| matches!(n, Notice::Warning(_)))
    }

    pub fn has_error(&self) -> bool {
        self.notices.iter().any(|n| matches!(n, Notice::Error(_)))
    }
}

pub(crate) fn format_number(value: f64) -> String {
    if value.fract() == 0. {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}

pub(crate) fn format_lap_time(seconds: f64) -> String {
    let minutes = (seconds / 60.).floor();
    format!("{}:{:06.3}", minutes, seconds - minutes * 60.)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayToggles {
    pub lap_times: bool,
    pub telemetry: bool,
    pub position_changes: bool,
    pub tire_strategy: bool,
}

impl Default for DisplayToggles {
    fn default() -> Self {
        Self {
            lap_times: true,
            telemetry: true,
            position_changes: true,
            tire_strategy: true,
        }
    }
}

/// Everything a render pass depends on besides the session itself. Built
/// fresh from the widget state on every interaction.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderRequest {
    pub key: SessionKey,
    pub toggles: DisplayToggles,
    pub lap_time_drivers: Vec<DriverId>,
    pub telemetry_pair: Option<(DriverId, DriverId)>,
}

impl RenderRequest {
    /// Request with the default driver selections for the session
    pub fn for_session(session: &Session, toggles: DisplayToggles) -> Self {
        Self {
            key: session.key.clone(),
            toggles,
            lap_time_drivers: lap_times::default_drivers(session),
            telemetry_pair: telemetry::default_pair(session),
        }
    }
}

/// Output of every enabled view. Disabled views are `None`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DashboardViews {
    pub lap_times: Option<ViewOutput>,
    pub telemetry: Option<ViewOutput>,
    pub position_changes: Option<ViewOutput>,
    pub tire_strategy: Option<ViewOutput>,
}

pub fn render_all(
    session: &Session,
    provider: &dyn DataProvider,
    request: &RenderRequest,
) -> DashboardViews {
    let toggles = request.toggles;
    DashboardViews {
        lap_times: toggles
            .lap_times
            .then(|| lap_times::render(session, &request.lap_time_drivers)),
        telemetry: toggles
            .telemetry
            .then(|| telemetry::render(session, provider, request.telemetry_pair.as_ref())),
        position_changes: toggles
            .position_changes
            .then(|| positions::render(session)),
        tire_strategy: toggles
            .tire_strategy
            .then(|| tire_strategy::render(session)),
    }
}

/// Headline figures and the results table shown above the tabs
#[derive(Clone, Debug, PartialEq)]
pub struct SessionOverview {
    pub metrics: Vec<(String, String)>,
    pub results: Option<Table>,
}

pub fn overview(session: &Session) -> SessionOverview {
    let mut metrics = vec![
        ("Season".to_string(), session.key.year.to_string()),
        ("Event".to_string(), session.event_name.clone()),
        ("Session".to_string(), session.key.kind.label().to_string()),
    ];
    if session.has_laps() {
        metrics.push(("Total Laps".to_string(), session.total_laps().to_string()));
    }

    let results = (!session.results.is_empty()).then(|| Table {
        title: "Session Results".to_string(),
        columns: ["Position", "Abbreviation", "TeamName", "Points"]
            .map(String::from)
            .to_vec(),
        rows: session
            .results
            .iter()
            .map(|r| {
                vec![
                    r.position.map(|p| p.to_string()).unwrap_or_default(),
                    r.abbreviation.clone(),
                    r.team_name.clone(),
                    r.points.map(format_number).unwrap_or_default(),
                ]
            })
            .collect(),
    });

    SessionOverview { metrics, results }
}
