use egui::Color32;
use log::error;

use crate::{
    DashboardError,
    provider::DataProvider,
    session::{DriverId, Session, TelemetrySample},
};

use super::{Axis, Chart, ChartPoint, Series, SeriesStyle, ViewOutput};

/// Line colours by selection slot. Colouring follows the slot, not the driver.
pub const SLOT_COLORS: [Color32; 2] = [Color32::RED, Color32::BLUE];

const LINK_GROUP: &str = "telemetry_distance";
const CHART_HEIGHT: f32 = 240.;

/// First and second drivers of the session, if there are two
pub fn default_pair(session: &Session) -> Option<(DriverId, DriverId)> {
    let drivers = session.driver_ids();
    match drivers.as_slice() {
        [first, second, ..] => Some((first.clone(), second.clone())),
        _ => None,
    }
}

fn fastest_lap_telemetry(
    session: &Session,
    provider: &dyn DataProvider,
    driver: &str,
) -> Result<Vec<TelemetrySample>, DashboardError> {
    let lap = session
        .fastest_lap(driver)
        .ok_or_else(|| DashboardError::NoTimedLap {
            driver: session.display_name(driver),
        })?;
    provider.lap_telemetry(session, lap)
}

fn trace_chart(
    id: &str,
    title: &str,
    trace_label: &str,
    traces: &[(String, Vec<TelemetrySample>)],
    value: fn(&TelemetrySample) -> f64,
    show_legend: bool,
) -> Chart {
    let mut chart = Chart::new(id, title, Axis::labeled("Distance (m)"), Axis::labeled(title));
    chart.height = CHART_HEIGHT;
    chart.link_group = Some(LINK_GROUP.to_string());
    for (slot, (name, samples)) in traces.iter().enumerate() {
        let mut series = Series::new(
            format!("{} {}", name, trace_label),
            SLOT_COLORS[slot % SLOT_COLORS.len()],
            SeriesStyle::Line,
        );
        series.show_in_legend = show_legend;
        series.points = samples
            .iter()
            .map(|s| ChartPoint::new(s.distance_m, value(s)))
            .collect();
        chart.series.push(series);
    }
    chart
}

/// Speed, throttle and brake traces of both drivers' fastest laps on a shared
/// distance axis. Nothing is drawn unless both laps load.
pub fn render(
    session: &Session,
    provider: &dyn DataProvider,
    pair: Option<&(DriverId, DriverId)>,
) -> ViewOutput {
    let output = ViewOutput::titled("Telemetry Comparison");
    if !session.has_laps() {
        return output.warn("No telemetry data available for this session.");
    }
    let (first, second) = match (session.drivers.len(), pair) {
        (count, _) if count < 2 => {
            return output.warn("Need at least 2 drivers for telemetry comparison.");
        }
        (_, Some(pair)) => pair.clone(),
        (_, None) => match default_pair(session) {
            Some(pair) => pair,
            None => return output.warn("Need at least 2 drivers for telemetry comparison."),
        },
    };

    let traces = [&first, &second]
        .into_iter()
        .map(|driver| {
            fastest_lap_telemetry(session, provider, driver)
                .map(|samples| (session.display_name(driver), samples))
        })
        .collect::<Result<Vec<_>, _>>();
    let traces = match traces {
        Ok(traces) => traces,
        Err(e) => {
            error!("Error loading telemetry data: {}", e);
            return output.error(format!("Error loading telemetry data: {}", e));
        }
    };

    let mut output = output;
    output.charts.push(trace_chart(
        "telemetry_speed",
        "Speed (km/h)",
        "Speed",
        &traces,
        |s| s.speed_kph,
        true,
    ));
    output.charts.push(trace_chart(
        "telemetry_throttle",
        "Throttle (%)",
        "Throttle",
        &traces,
        |s| s.throttle_pct,
        false,
    ));
    let mut brake_chart = trace_chart(
        "telemetry_brake",
        "Brake",
        "Brake",
        &traces,
        |s| if s.brake { 1. } else { 0. },
        false,
    );
    brake_chart.y_axis.range = Some((-0.05, 1.05));
    output.charts.push(brake_chart);
    output
}
