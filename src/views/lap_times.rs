use itertools::Itertools;

use crate::session::{DriverId, Session};

use super::{
    Axis, Chart, ChartPoint, Series, SeriesStyle, Table, ViewOutput, compound_color,
    format_lap_time, palette_color,
};

const DEFAULT_SELECTED_DRIVERS: usize = 3;
const UNKNOWN_COMPOUND: &str = "UNKNOWN";

#[derive(Clone, Debug, PartialEq)]
pub struct FastestLap {
    pub driver: String,
    pub lap_time_s: f64,
    pub lap_number: u32,
    pub compound: Option<String>,
}

/// First three drivers of the session
pub fn default_drivers(session: &Session) -> Vec<DriverId> {
    session
        .driver_ids()
        .into_iter()
        .take(DEFAULT_SELECTED_DRIVERS)
        .collect()
}

/// Fastest lap of each selected driver, quickest first. Drivers without a timed
/// lap are left out.
pub fn fastest_laps(session: &Session, drivers: &[DriverId]) -> Vec<FastestLap> {
    drivers
        .iter()
        .filter_map(|driver| {
            session.fastest_lap(driver).and_then(|lap| {
                lap.lap_time_s().map(|lap_time_s| FastestLap {
                    driver: session.display_name(driver),
                    lap_time_s,
                    lap_number: lap.lap_number,
                    compound: lap.compound.clone(),
                })
            })
        })
        .sorted_by(|a, b| a.lap_time_s.total_cmp(&b.lap_time_s))
        .collect()
}

pub fn render(session: &Session, drivers: &[DriverId]) -> ViewOutput {
    let output = ViewOutput::titled("Lap Time Analysis");
    if !session.has_laps() {
        return output.warn("No lap data available for this session.");
    }
    if drivers.is_empty() {
        return output.warn("Please select at least one driver.");
    }

    let mut output = output;
    let mut lap_chart = Chart::new(
        "lap_times",
        "Lap Times Comparison",
        Axis::labeled("Lap Number"),
        Axis::labeled("Lap Time (seconds)"),
    );
    for (idx, driver) in drivers.iter().enumerate() {
        let laps = session.laps_for(driver).collect_vec();
        if laps.is_empty() {
            continue;
        }
        let name = session.display_name(driver);
        let mut series = Series::new(name.clone(), palette_color(idx), SeriesStyle::LineWithMarkers);
        series.points = laps
            .iter()
            .filter_map(|lap| {
                lap.lap_time_s().map(|t| {
                    ChartPoint::new(lap.lap_number as f64, t).with_hover(format!(
                        "{}\nLap: {}\nLap time: {}",
                        name,
                        lap.lap_number,
                        format_lap_time(t)
                    ))
                })
            })
            .collect();
        if !series.points.is_empty() {
            lap_chart.series.push(series);
        }
    }
    output.charts.push(lap_chart);

    let fastest = fastest_laps(session, drivers);
    if fastest.is_empty() {
        return output;
    }

    let categories = fastest.iter().map(|f| f.driver.clone()).collect_vec();
    let mut bar_chart = Chart::new(
        "fastest_laps",
        "Fastest Lap Times by Driver",
        Axis {
            categories,
            ..Axis::labeled("Driver")
        },
        Axis::labeled("LapTime"),
    );
    let compound_name = |f: &FastestLap| {
        f.compound
            .clone()
            .unwrap_or_else(|| UNKNOWN_COMPOUND.to_string())
    };
    for compound in fastest.iter().map(compound_name).unique() {
        let mut series = Series::new(compound.clone(), compound_color(&compound), SeriesStyle::Bars);
        series.points = fastest
            .iter()
            .enumerate()
            .filter(|(_, f)| compound_name(*f) == compound)
            .map(|(idx, f)| {
                ChartPoint::new(idx as f64, f.lap_time_s).with_hover(format!(
                    "{}\nLap {}: {}\nCompound: {}",
                    f.driver,
                    f.lap_number,
                    format_lap_time(f.lap_time_s),
                    compound
                ))
            })
            .collect();
        bar_chart.series.push(series);
    }
    output.charts.push(bar_chart);

    output.tables.push(Table {
        title: "Fastest Laps Comparison".to_string(),
        columns: ["Driver", "LapTime", "LapNumber", "Compound"]
            .map(String::from)
            .to_vec(),
        rows: fastest
            .iter()
            .map(|f| {
                vec![
                    f.driver.clone(),
                    format!("{:.3}", f.lap_time_s),
                    f.lap_number.to_string(),
                    compound_name(f),
                ]
            })
            .collect(),
    });
    output
}
