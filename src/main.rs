use std::{path::PathBuf, time::Duration};

use clap::{Parser, Subcommand, arg};
use egui::Vec2;
use log::info;

use paddock::{
    AppConfig, DashboardError, DataProvider, OpenF1Provider, SessionKey, SessionKind,
    SnapshotProvider, provider::snapshot::record_snapshot, ui::DashboardApp,
};

const WINDOW_SIZE: Vec2 = Vec2::new(1400., 900.);

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open the dashboard against the live data provider
    Ui {
        #[arg(short, long)]
        api_url: Option<String>,
    },
    /// Open the dashboard on a recorded session snapshot
    Replay {
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Record a session and its fastest-lap telemetry to a snapshot file
    Record {
        #[arg(short, long)]
        year: i32,

        #[arg(short, long)]
        event: String,

        #[arg(short, long, default_value = "Race")]
        session: String,

        #[arg(short, long)]
        output: PathBuf,

        #[arg(short, long)]
        api_url: Option<String>,
    },
}

fn live_provider(app_config: &AppConfig, api_url: Option<&String>) -> OpenF1Provider {
    OpenF1Provider::new(
        api_url.unwrap_or(&app_config.api_base_url).as_str(),
        Duration::from_secs(app_config.request_timeout_s),
    )
}

fn run_dashboard(
    provider: Box<dyn DataProvider>,
    app_config: AppConfig,
    initial_session: Option<SessionKey>,
) -> Result<(), DashboardError> {
    let mut native_options = eframe::NativeOptions::default();
    native_options.viewport = native_options.viewport.with_inner_size(WINDOW_SIZE);

    eframe::run_native(
        "F1 Analytics Dashboard",
        native_options,
        Box::new(move |cc| {
            DashboardApp::apply_visuals(&cc.egui_ctx);
            let mut app = DashboardApp::new(provider, app_config);
            if let Some(key) = initial_session {
                app.select(&key);
                app.load_selected();
            }
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| DashboardError::WindowError { source: e })
}

fn ui(app_config: AppConfig, api_url: Option<&String>) -> Result<(), DashboardError> {
    let provider = live_provider(&app_config, api_url);
    info!("Using data provider at {}", provider.base_url());
    run_dashboard(Box::new(provider), app_config, None)
}

fn replay(app_config: AppConfig, input: &PathBuf) -> Result<(), DashboardError> {
    if !input.exists() {
        return Err(DashboardError::InvalidSnapshot {
            path: format!("{:?}", input),
        });
    }
    let snapshot = SnapshotProvider::from_file(input)?;
    let key = snapshot.session().key.clone();
    run_dashboard(Box::new(snapshot), app_config, Some(key))
}

fn record(
    app_config: &AppConfig,
    key: &SessionKey,
    output: &PathBuf,
    api_url: Option<&String>,
) -> Result<(), DashboardError> {
    let provider = live_provider(app_config, api_url);
    let telemetry_laps = record_snapshot(&provider, key, output)?;
    println!(
        "Recorded {} {} {} with telemetry for {} laps to {:?}",
        key.year, key.event, key.kind, telemetry_laps, output
    );
    Ok(())
}

fn run(command: &Commands) -> Result<(), DashboardError> {
    let app_config = AppConfig::from_local_file().unwrap_or_default();
    match command {
        Commands::Ui { api_url } => ui(app_config, api_url.as_ref()),
        Commands::Replay { input } => replay(app_config, input),
        Commands::Record {
            year,
            event,
            session,
            output,
            api_url,
        } => {
            let kind = session.parse::<SessionKind>()?;
            let key = SessionKey::new(*year, event.as_str(), kind);
            record(&app_config, &key, output, api_url.as_ref())
        }
    }
}

fn main() {
    #[cfg(debug_assertions)]
    colog::init();

    let cli = Args::parse();
    ctrlc::set_handler(move || {
        println!("Exiting...");
        std::process::exit(0);
    })
    .expect("Could not set Ctrl-C handler");

    if let Err(e) = run(&cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
