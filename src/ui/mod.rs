mod charts;

use std::path::{Path, PathBuf};

use egui::{
    Color32, ComboBox, Frame, Margin, RichText, ScrollArea, Ui, Visuals, containers::CentralPanel,
    style::Widgets,
};
use egui_dropdown::DropDownBox;
use log::{debug, error, info, warn};

use crate::{
    config::AppConfig,
    provider::{DataProvider, SnapshotProvider},
    session::{
        DriverId, EventCatalog, Session, SessionKey, SessionKind, SessionLoader,
        catalog::{current_season, resolve_event, season_choices},
    },
    views::{
        self, DashboardViews, DisplayToggles, RenderRequest, SessionOverview, ViewOutput,
        lap_times, telemetry,
    },
};

pub(crate) const PALETTE_BLACK: Color32 = Color32::from_rgb(12, 12, 12);
pub(crate) const PALETTE_GRAPHITE: Color32 = Color32::from_rgb(38, 38, 46);
pub(crate) const PALETTE_ACCENT: Color32 = Color32::from_rgb(255, 24, 1);

const LOAD_FAILED_MESSAGE: &str =
    "Failed to load session data. Please check your inputs and try again.";
const SIDEBAR_WIDTH: f32 = 240.;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Tab {
    #[default]
    LapAnalysis,
    Telemetry,
    RaceProgress,
    TireStrategy,
}

impl Tab {
    const ALL: [Tab; 4] = [
        Tab::LapAnalysis,
        Tab::Telemetry,
        Tab::RaceProgress,
        Tab::TireStrategy,
    ];

    fn label(&self) -> &'static str {
        match self {
            Tab::LapAnalysis => "Lap Analysis",
            Tab::Telemetry => "Telemetry",
            Tab::RaceProgress => "Race Progress",
            Tab::TireStrategy => "Tire Strategy",
        }
    }
}

enum UiState {
    Welcome,
    Error {
        message: String,
    },
    Display {
        session: Box<Session>,
        overview: SessionOverview,
    },
}

#[derive(Clone, Debug, PartialEq)]
struct Selection {
    year: i32,
    event: String,
    kind: SessionKind,
    toggles: DisplayToggles,
}

enum SidebarAction {
    Load,
    OpenSnapshot(PathBuf),
}

/// Dashboard window. Owns the data provider and the loaded session; every view
/// is re-rendered only when the inputs of the render pass change.
pub struct DashboardApp {
    provider: Box<dyn DataProvider>,
    app_config: AppConfig,
    config_path: Option<PathBuf>,
    seasons: Vec<i32>,
    selection: Selection,
    catalog_year: Option<i32>,
    catalog_events: Vec<String>,
    ui_state: UiState,
    active_tab: Tab,
    lap_time_drivers: Vec<DriverId>,
    telemetry_pair: Option<(DriverId, DriverId)>,
    rendered: Option<(RenderRequest, DashboardViews)>,
}

impl DashboardApp {
    pub fn new(provider: Box<dyn DataProvider>, app_config: AppConfig) -> Self {
        let seasons = season_choices(current_season());
        let year = app_config
            .last_year
            .filter(|y| seasons.contains(y))
            .or_else(|| seasons.first().copied())
            .unwrap_or_else(current_season);
        let selection = Selection {
            year,
            event: app_config.last_event.clone(),
            kind: app_config.last_session_kind,
            toggles: app_config.toggles(),
        };

        Self {
            provider,
            app_config,
            config_path: AppConfig::default_path(),
            seasons,
            selection,
            catalog_year: None,
            catalog_events: Vec::new(),
            ui_state: UiState::Welcome,
            active_tab: Tab::default(),
            lap_time_drivers: Vec::new(),
            telemetry_pair: None,
            rendered: None,
        }
    }

    /// Where selections are saved after each load. `None` keeps them in memory.
    pub fn with_config_path(mut self, config_path: Option<PathBuf>) -> Self {
        self.config_path = config_path;
        self
    }

    pub fn apply_visuals(ctx: &egui::Context) {
        let default_visuals = Visuals {
            dark_mode: true,
            hyperlink_color: PALETTE_ACCENT,
            faint_bg_color: PALETTE_GRAPHITE,
            extreme_bg_color: PALETTE_GRAPHITE,
            panel_fill: PALETTE_BLACK,
            button_frame: true,
            widgets: Widgets::dark(),
            striped: true,
            ..Default::default()
        };
        ctx.set_visuals(default_visuals);
    }

    /// Points the selectors at `key` so the next load fetches that session.
    pub fn select(&mut self, key: &SessionKey) {
        self.selection.year = key.year;
        self.selection.event = key.event.clone();
        self.selection.kind = key.kind;
        if !self.seasons.contains(&key.year) {
            self.seasons.push(key.year);
            self.seasons.sort_unstable_by(|a, b| b.cmp(a));
        }
        self.catalog_year = None;
    }

    pub fn selected_key(&self) -> SessionKey {
        SessionKey::new(
            self.selection.year,
            self.selection.event.trim(),
            self.selection.kind,
        )
    }

    pub fn loaded_session(&self) -> Option<&Session> {
        match &self.ui_state {
            UiState::Display { session, .. } => Some(session),
            _ => None,
        }
    }

    pub fn load_error(&self) -> Option<&str> {
        match &self.ui_state {
            UiState::Error { message } => Some(message),
            _ => None,
        }
    }

    /// Loads the selected session, replacing whatever was shown before.
    pub fn load_selected(&mut self) {
        let key = self.selected_key();
        self.rendered = None;
        match SessionLoader::new(self.provider.as_ref()).load(&key) {
            Ok(session) => {
                self.lap_time_drivers = lap_times::default_drivers(&session);
                self.telemetry_pair = telemetry::default_pair(&session);
                let overview = views::overview(&session);
                self.ui_state = UiState::Display {
                    session: Box::new(session),
                    overview,
                };
            }
            Err(e) => {
                self.lap_time_drivers.clear();
                self.telemetry_pair = None;
                self.ui_state = UiState::Error {
                    message: format!("Error loading session data: {}", e),
                };
            }
        }
        // a failed schedule fetch is retried on the next user action
        if self.catalog_events.is_empty() {
            self.catalog_year = None;
        }
        self.remember_selection();
    }

    pub fn open_snapshot(&mut self, path: &Path) {
        match SnapshotProvider::from_file(path) {
            Ok(snapshot) => {
                info!("Opened snapshot {:?}", path);
                let key = snapshot.session().key.clone();
                self.provider = Box::new(snapshot);
                self.select(&key);
                self.load_selected();
            }
            Err(e) => {
                error!("Could not open snapshot {:?}: {}", path, e);
                self.rendered = None;
                self.ui_state = UiState::Error {
                    message: format!("Error loading session data: {}", e),
                };
            }
        }
    }

    /// Produces the render request for the current widget state and
    /// re-renders the views if it differs from the last one.
    pub fn views(&mut self) -> Option<&DashboardViews> {
        let UiState::Display { session, .. } = &self.ui_state else {
            return None;
        };
        let request = RenderRequest {
            key: session.key.clone(),
            toggles: self.selection.toggles,
            lap_time_drivers: self.lap_time_drivers.clone(),
            telemetry_pair: self.telemetry_pair.clone(),
        };
        if self
            .rendered
            .as_ref()
            .is_none_or(|(last, _)| *last != request)
        {
            debug!("Rendering views for {:?}", request);
            let views = views::render_all(session, self.provider.as_ref(), &request);
            self.rendered = Some((request, views));
        }
        self.rendered.as_ref().map(|(_, views)| views)
    }

    fn remember_selection(&mut self) {
        self.app_config.last_year = Some(self.selection.year);
        self.app_config.last_event = self.selection.event.trim().to_string();
        self.app_config.last_session_kind = self.selection.kind;
        self.app_config.set_toggles(self.selection.toggles);
        let Some(config_path) = &self.config_path else {
            debug!("No config path, selections are not saved");
            return;
        };
        if let Err(e) = self.app_config.save_to(config_path) {
            warn!("Could not save config: {}", e);
        }
    }

    /// Without a catalog the Grand Prix is typed in as free text.
    fn uses_free_text_event(&self) -> bool {
        self.catalog_events.is_empty()
    }

    /// Fetches the season's events once per season change. When the typed
    /// event matches a catalog entry the selector switches to that entry.
    fn refresh_catalog(&mut self) {
        if self.catalog_year == Some(self.selection.year) {
            return;
        }
        let events = EventCatalog::new(self.provider.as_ref()).events(self.selection.year);
        self.catalog_year = Some(self.selection.year);
        if let Some(event) = resolve_event(&events, &self.selection.event)
            .or_else(|| events.iter().find(|e| !e.is_testing()))
            .or_else(|| events.first())
        {
            self.selection.event = event.name.clone();
        }
        self.catalog_events = events.into_iter().map(|e| e.name).collect();
    }

    fn show_sidebar(&mut self, ui: &mut Ui) -> Option<SidebarAction> {
        let mut action = None;
        ui.heading(
            RichText::new("Session Configuration")
                .color(Color32::WHITE)
                .strong(),
        );
        ui.add_space(4.);

        ComboBox::from_label("Season")
            .selected_text(self.selection.year.to_string())
            .show_ui(ui, |ui| {
                for year in &self.seasons {
                    ui.selectable_value(&mut self.selection.year, *year, year.to_string());
                }
            });
        self.refresh_catalog();

        ui.label(RichText::new("Grand Prix").color(Color32::WHITE));
        if self.uses_free_text_event() {
            ui.text_edit_singleline(&mut self.selection.event);
        } else {
            ui.add(
                DropDownBox::from_iter(
                    &self.catalog_events,
                    "grand_prix_dropbox",
                    &mut self.selection.event,
                    |ui, text| ui.selectable_label(false, text),
                )
                .filter_by_input(true),
            );
        }

        ComboBox::from_label("Session Type")
            .selected_text(self.selection.kind.label())
            .show_ui(ui, |ui| {
                for kind in SessionKind::ALL {
                    ui.selectable_value(&mut self.selection.kind, kind, kind.label());
                }
            });

        ui.separator();
        ui.heading(
            RichText::new("Visualization Options")
                .color(Color32::WHITE)
                .strong(),
        );
        let toggles = &mut self.selection.toggles;
        ui.checkbox(&mut toggles.lap_times, "Show Lap Times");
        ui.checkbox(&mut toggles.telemetry, "Show Telemetry");
        ui.checkbox(&mut toggles.position_changes, "Show Position Changes");
        ui.checkbox(&mut toggles.tire_strategy, "Show Tire Strategy");

        ui.separator();
        if ui.button("Load Session Data").clicked() {
            action = Some(SidebarAction::Load);
        }
        if ui.button("📂 Open Snapshot").clicked()
            && let Some(path) = rfd::FileDialog::new()
                .add_filter("Session snapshot", &["jsonl"])
                .pick_file()
        {
            action = Some(SidebarAction::OpenSnapshot(path));
        }
        action
    }

    fn show_dashboard(&mut self, ui: &mut Ui) {
        if self.views().is_none() {
            match &self.ui_state {
                UiState::Error { message } => {
                    ui.label(RichText::new(message).color(PALETTE_ACCENT).strong());
                    ui.label(RichText::new(LOAD_FAILED_MESSAGE).color(PALETTE_ACCENT));
                }
                _ => show_welcome(ui),
            }
            return;
        }

        let Self {
            ui_state,
            active_tab,
            lap_time_drivers,
            telemetry_pair,
            rendered,
            ..
        } = self;
        let (UiState::Display { session, overview }, Some((_, views))) = (&*ui_state, &*rendered)
        else {
            return;
        };

        show_overview(ui, overview);
        ui.separator();
        ui.horizontal(|ui| {
            for tab in Tab::ALL {
                ui.selectable_value(&mut *active_tab, tab, tab.label());
            }
        });
        ui.separator();

        match active_tab {
            Tab::LapAnalysis => {
                if let Some(view) = &views.lap_times {
                    if session.has_laps() {
                        lap_driver_picker(ui, session, lap_time_drivers);
                    }
                    charts::show_view(ui, view);
                }
            }
            Tab::Telemetry => {
                if let Some(view) = &views.telemetry {
                    telemetry_pair_picker(ui, session, telemetry_pair);
                    charts::show_view(ui, view);
                }
            }
            Tab::RaceProgress => show_optional_view(ui, views.position_changes.as_ref()),
            Tab::TireStrategy => show_optional_view(ui, views.tire_strategy.as_ref()),
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("dashboard_header")
            .frame(Frame::default().inner_margin(Margin::same(8)))
            .show(ctx, |ui| {
                ui.heading(
                    RichText::new("🏎 F1 Analytics Dashboard")
                        .color(PALETTE_ACCENT)
                        .size(28.)
                        .strong(),
                );
            });

        let action = egui::SidePanel::left("session_configuration")
            .frame(
                Frame::default()
                    .fill(PALETTE_GRAPHITE)
                    .inner_margin(Margin::same(8)),
            )
            .resizable(false)
            .exact_width(SIDEBAR_WIDTH)
            .show(ctx, |ui| self.show_sidebar(ui))
            .inner;
        match action {
            Some(SidebarAction::Load) => self.load_selected(),
            Some(SidebarAction::OpenSnapshot(path)) => self.open_snapshot(&path),
            None => {}
        }

        CentralPanel::default()
            .frame(Frame::default().inner_margin(Margin::same(8)))
            .show(ctx, |ui| {
                ScrollArea::vertical().show(ui, |ui| self.show_dashboard(ui));
            });
    }
}

fn show_optional_view(ui: &mut Ui, view: Option<&ViewOutput>) {
    if let Some(view) = view {
        charts::show_view(ui, view);
    }
}

fn show_overview(ui: &mut Ui, overview: &SessionOverview) {
    ui.columns(4, |columns| {
        for (column, (label, value)) in columns.iter_mut().zip(&overview.metrics) {
            column.label(RichText::new(label).small());
            column.label(
                RichText::new(value)
                    .size(22.)
                    .color(Color32::WHITE)
                    .strong(),
            );
        }
    });
    if let Some(results) = &overview.results {
        ui.separator();
        charts::show_table(ui, results);
    }
}

fn lap_driver_picker(ui: &mut Ui, session: &Session, selected: &mut Vec<DriverId>) {
    ui.label(RichText::new("Select drivers to compare:").color(Color32::WHITE));
    ui.horizontal_wrapped(|ui| {
        for driver in session.driver_ids() {
            let mut checked = selected.contains(&driver);
            if ui
                .checkbox(&mut checked, session.display_name(&driver))
                .changed()
            {
                if checked {
                    selected.push(driver);
                } else {
                    selected.retain(|d| *d != driver);
                }
            }
        }
    });
}

fn telemetry_pair_picker(
    ui: &mut Ui,
    session: &Session,
    pair: &mut Option<(DriverId, DriverId)>,
) {
    let Some((first, second)) = pair.as_mut() else {
        return;
    };
    let drivers = session.driver_ids();
    ui.horizontal(|ui| {
        driver_combo(ui, "telemetry_driver_1", "Driver 1", session, &drivers, first);
        ui.separator();
        driver_combo(ui, "telemetry_driver_2", "Driver 2", session, &drivers, second);
    });
}

fn driver_combo(
    ui: &mut Ui,
    id_salt: &str,
    label: &str,
    session: &Session,
    drivers: &[DriverId],
    selected: &mut DriverId,
) {
    ui.label(RichText::new(label).color(Color32::WHITE));
    ComboBox::from_id_salt(id_salt)
        .selected_text(session.display_name(selected))
        .show_ui(ui, |ui| {
            for driver in drivers {
                ui.selectable_value(selected, driver.clone(), session.display_name(driver));
            }
        });
}

fn show_welcome(ui: &mut Ui) {
    ui.heading(
        RichText::new("Welcome to the F1 Analytics Dashboard!")
            .color(Color32::WHITE)
            .strong(),
    );
    ui.label("This dashboard analyses Formula 1 session data:");
    for (feature, description) in [
        ("Lap Time Analysis", "compare lap times between drivers"),
        ("Telemetry Data", "speed, throttle and brake comparison"),
        ("Position Changes", "how positions changed during the race"),
        ("Tire Strategies", "compound usage and stint lengths"),
    ] {
        ui.horizontal(|ui| {
            ui.label(RichText::new(format!("• {}:", feature)).strong());
            ui.label(description);
        });
    }
    ui.add_space(8.);
    ui.label(RichText::new("How to use").color(Color32::WHITE).strong());
    ui.label("1. Select the season, grand prix and session type in the sidebar");
    ui.label("2. Choose which visualizations to display");
    ui.label("3. Click 'Load Session Data' to build the dashboard");
    ui.add_space(8.);
    ui.label(
        RichText::new("Data availability depends on the session and year selected.").italics(),
    );
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::{
        DashboardError,
        session::{
            EventInfo, Lap, TelemetrySample,
            tests::{driver, lap, session_with},
        },
    };

    /// Fails the first `failures` schedule requests, then serves one event.
    struct FlakyScheduleProvider {
        failures: Cell<usize>,
    }

    impl FlakyScheduleProvider {
        fn failing(failures: usize) -> Self {
            Self {
                failures: Cell::new(failures),
            }
        }
    }

    impl DataProvider for FlakyScheduleProvider {
        fn event_schedule(&self, year: i32) -> Result<Vec<EventInfo>, DashboardError> {
            if self.failures.get() > 0 {
                self.failures.set(self.failures.get() - 1);
                return Err(DashboardError::EventNotFound {
                    year,
                    query: "schedule".to_string(),
                });
            }
            Ok(vec![EventInfo {
                name: "Monaco Grand Prix".to_string(),
                ..EventInfo::default()
            }])
        }

        fn load_session(&self, key: &SessionKey) -> Result<Session, DashboardError> {
            Err(DashboardError::SessionNotFound {
                year: key.year,
                event: key.event.clone(),
                kind: key.kind.label().to_string(),
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

    fn app_with_snapshot() -> DashboardApp {
        let session = session_with(
            vec![
                driver("1", "VER", None),
                driver("16", "LEC", None),
                driver("44", "HAM", None),
                driver("4", "NOR", None),
            ],
            vec![lap("1", 1, Some(80.)), lap("16", 1, Some(81.))],
        );
        DashboardApp::new(
            Box::new(SnapshotProvider::new(session)),
            AppConfig::default(),
        )
        .with_config_path(None)
    }

    #[test]
    fn test_starts_on_welcome_screen() {
        let app = app_with_snapshot();
        assert!(app.loaded_session().is_none());
        assert!(app.load_error().is_none());
        assert_eq!(app.selection.year, current_season());
    }

    #[test]
    fn test_catalog_resolves_typed_event() {
        let mut app = app_with_snapshot();
        app.select(&SessionKey::new(2024, "monaco", SessionKind::Race));
        app.refresh_catalog();
        assert_eq!(app.catalog_events, vec!["Monaco"]);
        assert_eq!(app.selection.event, "Monaco");
    }

    #[test]
    fn test_failed_catalog_falls_back_to_free_text() {
        let mut app = DashboardApp::new(
            Box::new(FlakyScheduleProvider::failing(usize::MAX)),
            AppConfig::default(),
        )
        .with_config_path(None);
        app.select(&SessionKey::new(2024, "Monaco", SessionKind::Race));
        app.refresh_catalog();
        assert!(app.uses_free_text_event());
        assert_eq!(app.selection.event, "Monaco");
    }

    #[test]
    fn test_failed_catalog_is_refetched_on_next_action() {
        let mut app = DashboardApp::new(
            Box::new(FlakyScheduleProvider::failing(1)),
            AppConfig::default(),
        )
        .with_config_path(None);
        app.select(&SessionKey::new(2024, "Monaco", SessionKind::Race));
        app.refresh_catalog();
        assert!(app.uses_free_text_event());

        // idle frames don't hit the provider again
        app.refresh_catalog();
        assert!(app.uses_free_text_event());

        app.load_selected();
        assert!(app.load_error().is_some());
        app.refresh_catalog();
        assert!(!app.uses_free_text_event());
        assert_eq!(app.catalog_events, vec!["Monaco Grand Prix"]);
        assert_eq!(app.selection.event, "Monaco Grand Prix");
    }

    #[test]
    fn test_load_sets_default_selections() {
        let mut app = app_with_snapshot();
        app.select(&SessionKey::new(2024, "Monaco", SessionKind::Race));
        app.load_selected();
        assert_eq!(app.loaded_session().map(|s| s.drivers.len()), Some(4));
        assert_eq!(app.app_config.last_year, Some(2024));
        assert_eq!(app.lap_time_drivers, vec!["1", "16", "44"]);
        assert_eq!(
            app.telemetry_pair,
            Some(("1".to_string(), "16".to_string()))
        );
    }

    #[test]
    fn test_failed_load_shows_error() {
        let mut app = app_with_snapshot();
        app.select(&SessionKey::new(2024, "Monaco", SessionKind::Qualifying));
        app.load_selected();
        assert!(app.loaded_session().is_none());
        assert!(
            app.load_error()
                .is_some_and(|m| m.starts_with("Error loading session data"))
        );
    }

    #[test]
    fn test_load_saves_selection_to_config_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let mut app = app_with_snapshot().with_config_path(Some(path.clone()));
        app.select(&SessionKey::new(2024, "Monaco", SessionKind::Race));
        app.selection.toggles.telemetry = false;
        app.load_selected();

        let saved = AppConfig::from_file(&path).unwrap();
        assert_eq!(saved.last_year, Some(2024));
        assert_eq!(saved.last_event, "Monaco");
        assert!(!saved.show_telemetry);
    }

    #[test]
    fn test_views_rerender_only_on_change() {
        let mut app = app_with_snapshot();
        app.select(&SessionKey::new(2024, "Monaco", SessionKind::Race));
        app.load_selected();

        let first = app.views().cloned();
        assert!(first.is_some());
        let cached = app.rendered.as_ref().map(|(r, _)| r.clone());
        assert_eq!(app.views().cloned(), first);
        assert_eq!(app.rendered.as_ref().map(|(r, _)| r.clone()), cached);

        app.selection.toggles.lap_times = false;
        let views = app.views().cloned();
        assert!(views.is_some_and(|v| v.lap_times.is_none()));
    }
}
