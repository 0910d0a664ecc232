use itertools::Itertools;

use crate::session::Session;

use super::{Axis, Chart, ChartPoint, FALLBACK_DRIVER_COLOR, Series, SeriesStyle, ViewOutput};

pub const POSITION_RANGE: (f64, f64) = (0.5, 20.5);
const POSITION_TICKS: [f64; 5] = [1., 5., 10., 15., 20.];
const NOT_AVAILABLE: &str = "N/A";

/// Running position of every driver, one line per driver coloured by team.
pub fn render(session: &Session) -> ViewOutput {
    let output = ViewOutput::titled("Position Changes");
    if !session.has_laps() {
        return output.warn("No position data available for this session.");
    }

    let mut chart = Chart::new(
        "position_changes",
        "Position Changes During Race",
        Axis::labeled("Lap"),
        Axis {
            range: Some(POSITION_RANGE),
            inverted: true,
            ticks: POSITION_TICKS.to_vec(),
            ..Axis::labeled("Position")
        },
    );

    for driver in session.driver_ids() {
        let laps = session.laps_for(&driver).collect_vec();
        if laps.is_empty() {
            continue;
        }
        let name = session.display_name(&driver);
        let color = session
            .driver_color(&driver)
            .unwrap_or(FALLBACK_DRIVER_COLOR);

        let mut series = Series::new(name.clone(), color, SeriesStyle::Line);
        series.points = laps
            .iter()
            .filter_map(|lap| {
                lap.position.map(|position| {
                    ChartPoint::new(lap.lap_number as f64, position as f64).with_hover(format!(
                        "Driver: {}\nLap: {}\nPosition: {}\nCompound: {}\nStint: {}",
                        name,
                        lap.lap_number,
                        position,
                        lap.compound.as_deref().unwrap_or(NOT_AVAILABLE),
                        lap.stint
                            .map(|s| s.to_string())
                            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                    ))
                })
            })
            .collect();
        chart.series.push(series);
    }

    let mut output = output;
    output.charts.push(chart);
    output
}
