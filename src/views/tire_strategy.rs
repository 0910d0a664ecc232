use itertools::Itertools;
use log::debug;

use crate::session::Session;

use super::{Axis, Chart, ChartPoint, Series, SeriesStyle, Table, ViewOutput, compound_color};

const UNKNOWN_COMPOUND: &str = "UNKNOWN";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StintSummary {
    pub driver: String,
    pub stint: u32,
    pub start_lap: u32,
    pub end_lap: u32,
    pub lap_count: usize,
    pub compound: Option<String>,
}

impl StintSummary {
    fn compound_name(&self) -> &str {
        self.compound.as_deref().unwrap_or(UNKNOWN_COMPOUND)
    }
}

/// Stints of every driver in driver order, then stint order. Laps without a
/// stint id don't belong to any stint.
pub fn stints(session: &Session) -> Vec<StintSummary> {
    let mut summaries = Vec::new();
    for driver in session.driver_ids() {
        let by_stint = session
            .laps_for(&driver)
            .filter(|l| l.stint.is_some())
            .into_group_map_by(|l| l.stint.unwrap_or_default());

        for (stint, laps) in by_stint.into_iter().sorted_by_key(|(stint, _)| *stint) {
            let (Some(start_lap), Some(end_lap)) = (
                laps.iter().map(|l| l.lap_number).min(),
                laps.iter().map(|l| l.lap_number).max(),
            ) else {
                continue;
            };
            summaries.push(StintSummary {
                driver: session.display_name(&driver),
                stint,
                start_lap,
                end_lap,
                lap_count: laps.len(),
                compound: laps.iter().find_map(|l| l.compound.clone()),
            });
        }
    }
    summaries
}

pub fn render(session: &Session) -> ViewOutput {
    let output = ViewOutput::titled("Tire Strategy");
    if !session.has_laps() {
        return output.warn("No tire data available for this session.");
    }

    let stints = stints(session);
    if stints.is_empty() {
        debug!("No stint data in session, skipping tire strategy");
        return output;
    }

    let categories = stints.iter().map(|s| s.driver.clone()).unique().collect_vec();
    let mut chart = Chart::new(
        "tire_strategy",
        "Tire Strategy",
        Axis::labeled("Lap Number"),
        Axis {
            categories: categories.clone(),
            ..Axis::labeled("Driver")
        },
    );
    for compound in stints.iter().map(StintSummary::compound_name).unique() {
        let mut series = Series::new(compound, compound_color(compound), SeriesStyle::SquareMarkers);
        series.points = stints
            .iter()
            .filter(|s| s.compound_name() == compound)
            .filter_map(|s| {
                let row = categories.iter().position(|c| *c == s.driver)?;
                Some(
                    ChartPoint::new(s.start_lap as f64, row as f64).with_hover(format!(
                        "Driver: {}\nStart Lap: {}\nCompound: {}",
                        s.driver, s.start_lap, compound
                    )),
                )
            })
            .collect();
        chart.series.push(series);
    }

    let mut output = output;
    output.charts.push(chart);
    output.tables.push(Table {
        title: "Stint Summary".to_string(),
        columns: ["Driver", "Stint", "StartLap", "EndLap", "LapCount", "Compound"]
            .map(String::from)
            .to_vec(),
        rows: stints
            .iter()
            .map(|s| {
                vec![
                    s.driver.clone(),
                    s.stint.to_string(),
                    s.start_lap.to_string(),
                    s.end_lap.to_string(),
                    s.lap_count.to_string(),
                    s.compound_name().to_string(),
                ]
            })
            .collect(),
    });
    output
}
