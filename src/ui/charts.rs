use egui::{Color32, Id, RichText, Ui, Vec2b};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, Legend, Line, MarkerShape, Plot, PlotPoints, Points};

use crate::views::{Axis, Chart, Notice, Series, SeriesStyle, Table, ViewOutput};

use super::PALETTE_ACCENT;

const BAR_WIDTH: f64 = 0.6;
const MARKER_RADIUS: f32 = 7.;
const LINE_WIDTH: f32 = 2.;

pub(crate) fn show_view(ui: &mut Ui, view: &ViewOutput) {
    ui.heading(RichText::new(&view.title).color(Color32::WHITE).strong());
    for notice in &view.notices {
        show_notice(ui, notice);
    }
    for chart in &view.charts {
        show_chart(ui, chart);
        ui.add_space(8.);
    }
    for table in &view.tables {
        show_table(ui, table);
        ui.add_space(8.);
    }
}

pub(crate) fn show_notice(ui: &mut Ui, notice: &Notice) {
    match notice {
        Notice::Warning(message) => {
            ui.label(RichText::new(format!("⚠ {}", message)).color(Color32::YELLOW));
        }
        Notice::Error(message) => {
            ui.label(RichText::new(format!("✖ {}", message)).color(PALETTE_ACCENT).strong());
        }
    }
}

/// Maps a plotted value back to the value it represents. Inverted axes are
/// drawn negated so that the lowest value ends up on top.
fn axis_sign(axis: &Axis) -> f64 {
    if axis.inverted { -1. } else { 1. }
}

fn tick_label(axis: &Axis, plotted: f64) -> String {
    let value = plotted * axis_sign(axis);
    if !axis.categories.is_empty() {
        return axis.category_label(value).unwrap_or_default().to_string();
    }
    if !axis.ticks.is_empty() && !axis.ticks.iter().any(|t| (t - value).abs() < 1e-6) {
        return String::new();
    }
    if value.fract().abs() < 1e-9 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

fn hover_label(series: &[Series], y_sign: f64, name: &str, x: f64, y: f64) -> String {
    let nearest = series
        .iter()
        .filter(|s| s.name == name)
        .flat_map(|s| s.points.iter())
        .min_by(|a, b| {
            let da = (a.x - x).powi(2) + (a.y * y_sign - y).powi(2);
            let db = (b.x - x).powi(2) + (b.y * y_sign - y).powi(2);
            da.total_cmp(&db)
        });
    match nearest.and_then(|p| p.hover.clone()) {
        Some(hover) => hover,
        None if name.is_empty() => format!("x = {:.1}\ny = {:.1}", x, y * y_sign),
        None => format!("{}\nx = {:.1}\ny = {:.1}", name, x, y * y_sign),
    }
}

pub(crate) fn show_chart(ui: &mut Ui, chart: &Chart) {
    ui.label(RichText::new(&chart.title).color(Color32::WHITE).strong());

    let x_sign = axis_sign(&chart.x_axis);
    let y_sign = axis_sign(&chart.y_axis);
    let x_axis = chart.x_axis.clone();
    let y_axis = chart.y_axis.clone();
    let hover_series = chart.series.clone();

    let mut plot = Plot::new(chart.id.as_str())
        .legend(Legend::default())
        .height(chart.height)
        .allow_scroll(false)
        .x_axis_label(chart.x_axis.label.as_str())
        .y_axis_label(chart.y_axis.label.as_str())
        .x_axis_formatter(move |mark, _range| tick_label(&x_axis, mark.value))
        .y_axis_formatter(move |mark, _range| tick_label(&y_axis, mark.value))
        .label_formatter(move |name, value| {
            hover_label(&hover_series, y_sign, name, value.x * x_sign, value.y)
        });

    if let Some((low, high)) = chart.y_axis.range {
        plot = plot
            .include_y(low * y_sign)
            .include_y(high * y_sign)
            .auto_bounds(Vec2b::new(true, false));
    }
    if !chart.y_axis.categories.is_empty() {
        plot = plot
            .include_y(-0.5)
            .include_y(chart.y_axis.categories.len() as f64 - 0.5);
    }
    if let Some(group) = &chart.link_group {
        let group_id = Id::new(group);
        plot = plot
            .link_axis(group_id, Vec2b::new(true, false))
            .link_cursor(group_id, Vec2b::new(true, false));
    }

    plot.show(ui, |plot_ui| {
        for series in &chart.series {
            let name = if series.show_in_legend {
                series.name.clone()
            } else {
                String::new()
            };
            let points = || {
                PlotPoints::new(
                    series
                        .points
                        .iter()
                        .map(|p| [p.x * x_sign, p.y * y_sign])
                        .collect(),
                )
            };
            match series.style {
                SeriesStyle::Line => {
                    plot_ui.line(Line::new(name, points()).color(series.color).width(LINE_WIDTH));
                }
                SeriesStyle::LineWithMarkers => {
                    plot_ui.line(
                        Line::new(name.clone(), points())
                            .color(series.color)
                            .width(LINE_WIDTH),
                    );
                    plot_ui.points(
                        Points::new(name, points())
                            .color(series.color)
                            .radius(MARKER_RADIUS / 2.),
                    );
                }
                SeriesStyle::SquareMarkers => {
                    plot_ui.points(
                        Points::new(name, points())
                            .color(series.color)
                            .shape(MarkerShape::Square)
                            .filled(true)
                            .radius(MARKER_RADIUS),
                    );
                }
                SeriesStyle::Bars => {
                    let bars = series
                        .points
                        .iter()
                        .map(|p| Bar::new(p.x * x_sign, p.y * y_sign).width(BAR_WIDTH))
                        .collect();
                    plot_ui.bar_chart(BarChart::new(name, bars).color(series.color));
                }
            }
        }
    });
}

pub(crate) fn show_table(ui: &mut Ui, table: &Table) {
    if !table.title.is_empty() {
        ui.label(RichText::new(&table.title).color(Color32::WHITE).strong());
    }
    ui.push_id(table.title.as_str(), |ui| {
        TableBuilder::new(ui)
            .striped(true)
            .vscroll(false)
            .columns(Column::auto().at_least(70.), table.columns.len())
            .header(20., |mut header| {
                for column in &table.columns {
                    header.col(|ui| {
                        ui.strong(column);
                    });
                }
            })
            .body(|mut body| {
                for row in &table.rows {
                    body.row(18., |mut table_row| {
                        for cell in row {
                            table_row.col(|ui| {
                                ui.label(cell);
                            });
                        }
                    });
                }
            });
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_label_inverted_axis_with_ticks() {
        let axis = Axis {
            inverted: true,
            ticks: vec![1., 5., 10.],
            ..Axis::default()
        };
        assert_eq!(tick_label(&axis, -5.), "5");
        assert_eq!(tick_label(&axis, -4.), "");
    }

    #[test]
    fn test_tick_label_categories() {
        let axis = Axis {
            categories: vec!["VER".to_string(), "LEC".to_string()],
            ..Axis::default()
        };
        assert_eq!(tick_label(&axis, 1.), "LEC");
        assert_eq!(tick_label(&axis, 0.5), "");
    }

    #[test]
    fn test_hover_label_picks_nearest_point() {
        let mut series = Series::new("VER", Color32::RED, SeriesStyle::Line);
        series.points = vec![
            crate::views::ChartPoint::new(1., 2.).with_hover("lap one".to_string()),
            crate::views::ChartPoint::new(2., 1.).with_hover("lap two".to_string()),
        ];
        let series = vec![series];
        // inverted axis: plotted y is negated
        assert_eq!(hover_label(&series, -1., "VER", 1.9, -1.1), "lap two");
        assert_eq!(hover_label(&series, -1., "LEC", 1., -2.), "LEC\nx = 1.0\ny = 2.0");
    }
}
