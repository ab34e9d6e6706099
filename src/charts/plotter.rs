//! Chart Plotter Module
//! Interactive views of the pipeline results using egui_plot.

use crate::analysis::{
    CityRanking, InjuryCategory, JunctionCounts, MapPoint, MapProjection, MonthlyOverview,
    MonthlySeries, Rgb,
};
use egui::{Color32, RichText};
use egui_plot::{
    Bar, BarChart, Legend, Line, Plot, PlotPoint, PlotPoints, Points, Polygon, Text,
};
use polars::prelude::{AnyValue, Column, DataFrame};
use std::f64::consts::TAU;

/// Slice colors for the distribution pie
pub const PALETTE: [Color32; 10] = [
    Color32::from_rgb(31, 119, 180),  // Blue
    Color32::from_rgb(255, 127, 14),  // Orange
    Color32::from_rgb(44, 160, 44),   // Green
    Color32::from_rgb(214, 39, 40),   // Red
    Color32::from_rgb(148, 103, 189), // Purple
    Color32::from_rgb(140, 86, 75),   // Brown
    Color32::from_rgb(227, 119, 194), // Pink
    Color32::from_rgb(127, 127, 127), // Gray
    Color32::from_rgb(188, 189, 34),  // Olive
    Color32::from_rgb(23, 190, 207),  // Cyan
];

pub const NONFATAL_COLOR: Color32 = Color32::from_rgb(0, 0, 255);
pub const FATAL_COLOR: Color32 = Color32::from_rgb(255, 0, 0);
pub const BAR_COLOR: Color32 = Color32::from_rgb(135, 206, 235); // Sky blue

/// Radial offset of the largest slice
const EXPLODE: f64 = 0.1;

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub fn rgb_color([r, g, b]: Rgb) -> Color32 {
    Color32::from_rgb(r, g, b)
}

pub fn slice_color(index: usize) -> Color32 {
    PALETTE[index % PALETTE.len()]
}

/// Short month name for 1-12.
pub fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|i| MONTHS.get(i as usize))
        .copied()
        .unwrap_or("")
}

/// Creates the dashboard visualizations using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Wedge outline from `start` to `end` radians, as a closed polygon.
    pub fn wedge(center: [f64; 2], radius: f64, start: f64, end: f64) -> Vec<[f64; 2]> {
        let steps = (((end - start) / TAU) * 120.0).ceil().max(2.0) as usize;
        let mut points = Vec::with_capacity(steps + 2);
        points.push(center);
        for i in 0..=steps {
            let angle = start + (end - start) * i as f64 / steps as f64;
            points.push([
                center[0] + radius * angle.cos(),
                center[1] + radius * angle.sin(),
            ]);
        }
        points
    }

    /// Pie chart of the ranked municipalities; the leading slice is pulled out.
    pub fn draw_city_pie(ui: &mut egui::Ui, ranking: &CityRanking) {
        let shares = ranking.percentages();

        Plot::new("city_pie")
            .height(380.0)
            .data_aspect(1.0)
            .show_axes(false)
            .show_grid(false)
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .show_x(false)
            .show_y(false)
            .include_x(-1.5)
            .include_x(1.5)
            .include_y(-1.3)
            .include_y(1.3)
            .legend(Legend::default())
            .show(ui, |plot_ui| {
                let mut start = 0.0;
                for (i, (entry, share)) in ranking.entries.iter().zip(&shares).enumerate() {
                    let sweep = share / 100.0 * TAU;
                    if sweep <= 0.0 {
                        continue;
                    }
                    let mid = start + sweep / 2.0;
                    let offset = if i == 0 { EXPLODE } else { 0.0 };
                    let center = [offset * mid.cos(), offset * mid.sin()];
                    let color = slice_color(i);

                    let outline = Self::wedge(center, 1.0, start, start + sweep);
                    plot_ui.polygon(
                        Polygon::new(PlotPoints::from(outline))
                            .fill_color(color.gamma_multiply(0.85))
                            .stroke(egui::Stroke::new(1.0, Color32::WHITE))
                            .name(&entry.municipality),
                    );

                    plot_ui.text(Text::new(
                        PlotPoint::new(center[0] + 0.6 * mid.cos(), center[1] + 0.6 * mid.sin()),
                        RichText::new(format!("{:.1}%", share))
                            .size(11.0)
                            .color(Color32::WHITE),
                    ));
                    plot_ui.text(Text::new(
                        PlotPoint::new(center[0] + 1.18 * mid.cos(), center[1] + 1.18 * mid.sin()),
                        RichText::new(&entry.municipality).size(11.0),
                    ));

                    start += sweep;
                }
            });
    }

    /// Ranked table under the pie.
    pub fn draw_city_table(ui: &mut egui::Ui, ranking: &CityRanking) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                egui::Grid::new("city_table")
                    .striped(true)
                    .min_col_width(60.0)
                    .spacing([12.0, 4.0])
                    .show(ui, |ui| {
                        ui.label(RichText::new("#").strong());
                        ui.label(RichText::new("City / Town").strong());
                        ui.label(RichText::new("Crashes").strong());
                        ui.label(RichText::new("Share").strong());
                        ui.end_row();

                        for (i, (entry, share)) in
                            ranking.entries.iter().zip(ranking.percentages()).enumerate()
                        {
                            ui.label((i + 1).to_string());
                            ui.label(RichText::new(&entry.municipality).color(slice_color(i)));
                            ui.label(entry.crashes.to_string());
                            ui.label(format!("{:.1}%", share));
                            ui.end_row();
                        }
                    });
            });
    }

    /// Crash locations; hovering shows the nearest crash's location and roadway.
    pub fn draw_crash_map(ui: &mut egui::Ui, projection: &MapProjection, radius: f32) {
        let hover_points: Vec<MapPoint> = projection.points.clone();
        // Degrees of longitude shrink with latitude.
        let aspect = projection.center_latitude.to_radians().cos().max(0.1) as f32;
        let span = 0.5 / (projection.zoom / 10.0).max(0.1);

        Plot::new("crash_map")
            .height(480.0)
            .data_aspect(1.0 / aspect)
            .x_axis_label("Longitude")
            .y_axis_label("Latitude")
            .include_x(projection.center_longitude - span)
            .include_x(projection.center_longitude + span)
            .include_y(projection.center_latitude - span * aspect as f64)
            .include_y(projection.center_latitude + span * aspect as f64)
            .legend(Legend::default())
            .label_formatter(move |_name, value| {
                Self::nearest_point(&hover_points, value)
                    .map(|p| p.tooltip())
                    .unwrap_or_default()
            })
            .show(ui, |plot_ui| {
                for (city, rgb) in &projection.legend {
                    let coords: PlotPoints = projection
                        .points
                        .iter()
                        .filter(|p| &p.municipality == city)
                        .map(|p| [p.longitude, p.latitude])
                        .collect();
                    plot_ui.points(
                        Points::new(coords)
                            .radius(radius)
                            .color(rgb_color(*rgb))
                            .name(city),
                    );
                }
            });
    }

    fn nearest_point<'a>(points: &'a [MapPoint], value: &PlotPoint) -> Option<&'a MapPoint> {
        points.iter().min_by(|a, b| {
            let da = (a.longitude - value.x).powi(2) + (a.latitude - value.y).powi(2);
            let db = (b.longitude - value.x).powi(2) + (b.latitude - value.y).powi(2);
            da.total_cmp(&db)
        })
    }

    /// Monthly lines; the combined view annotates each series' maximum.
    pub fn draw_monthly_chart(ui: &mut egui::Ui, overview: &MonthlyOverview) {
        let top = overview
            .nonfatal
            .counts
            .values()
            .chain(overview.fatal.counts.values())
            .copied()
            .max()
            .unwrap_or(0) as f64;
        let annotate = overview.category == InjuryCategory::Both;

        Plot::new("monthly_chart")
            .height(360.0)
            .x_axis_label("Month")
            .y_axis_label("Number of Crashes")
            .include_x(1.0)
            .include_x(12.0)
            .include_y(0.0)
            .include_y(top * 1.15)
            .allow_scroll(false)
            .legend(Legend::default())
            .x_axis_formatter(|mark, _range| {
                let v = mark.value;
                if v.fract() == 0.0 && (1.0..=12.0).contains(&v) {
                    month_name(v as u32).to_string()
                } else {
                    String::new()
                }
            })
            .show(ui, |plot_ui| {
                let series: [(&MonthlySeries, Color32, &str); 2] = [
                    (&overview.nonfatal, NONFATAL_COLOR, "Nonfatal Injuries"),
                    (&overview.fatal, FATAL_COLOR, "Fatal Injuries"),
                ];

                for (data, color, name) in series {
                    if data.is_empty() {
                        continue;
                    }
                    let coords: Vec<[f64; 2]> =
                        data.points().map(|(m, c)| [m as f64, c as f64]).collect();

                    plot_ui.line(
                        Line::new(PlotPoints::from(coords.clone()))
                            .color(color)
                            .width(2.0)
                            .name(name),
                    );
                    plot_ui.points(
                        Points::new(PlotPoints::from(coords))
                            .radius(4.0)
                            .color(color),
                    );

                    if annotate {
                        if let Some((month, peak)) = data.peak() {
                            plot_ui.text(Text::new(
                                PlotPoint::new(month as f64, peak as f64 + top * 0.07),
                                RichText::new(format!("Max: {}", peak)).color(color),
                            ));
                        }
                    }
                }
            });
    }

    /// Bar chart of junction types for the selected cause.
    pub fn draw_junction_chart(ui: &mut egui::Ui, counts: &JunctionCounts) {
        let labels: Vec<String> = counts
            .entries
            .iter()
            .map(|e| e.junction_type.clone())
            .collect();

        let bars: Vec<Bar> = counts
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| {
                Bar::new(i as f64, e.crashes as f64)
                    .name(&e.junction_type)
                    .fill(BAR_COLOR)
                    .width(0.7)
            })
            .collect();

        Plot::new("junction_chart")
            .height(360.0)
            .x_axis_label("Roadway Junction Type")
            .y_axis_label("Number of Crashes")
            .include_y(0.0)
            .allow_scroll(false)
            .x_axis_formatter(move |mark, _range| {
                let v = mark.value;
                if v.fract() == 0.0 && v >= 0.0 {
                    labels.get(v as usize).cloned().unwrap_or_default()
                } else {
                    String::new()
                }
            })
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).color(BAR_COLOR).name(&counts.cause));
            });
    }

    /// First `max_rows` rows of the raw frame in a scrollable grid.
    pub fn draw_raw_table(ui: &mut egui::Ui, frame: &DataFrame, max_rows: usize) {
        let rows = frame.height().min(max_rows);
        ui.label(
            RichText::new(format!(
                "Showing {} of {} rows, {} columns",
                rows,
                frame.height(),
                frame.width()
            ))
            .size(11.0)
            .color(Color32::GRAY),
        );

        egui::ScrollArea::both()
            .id_salt("raw_data")
            .max_height(320.0)
            .show(ui, |ui| {
                egui::Grid::new("raw_data_grid")
                    .striped(true)
                    .spacing([10.0, 2.0])
                    .show(ui, |ui| {
                        for column in frame.get_columns() {
                            ui.label(RichText::new(column.name().as_str()).strong().size(11.0));
                        }
                        ui.end_row();

                        for i in 0..rows {
                            for column in frame.get_columns() {
                                ui.label(RichText::new(Self::cell_text(column, i)).size(11.0));
                            }
                            ui.end_row();
                        }
                    });
            });
    }

    fn cell_text(column: &Column, row: usize) -> String {
        match column.get(row) {
            Ok(AnyValue::Null) | Err(_) => String::new(),
            Ok(value) => value.to_string().trim_matches('"').to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wedge_starts_at_center_and_spans_arc() {
        let points = ChartPlotter::wedge([0.0, 0.0], 1.0, 0.0, TAU / 4.0);
        assert_eq!(points[0], [0.0, 0.0]);
        let first = points[1];
        let last = *points.last().unwrap();
        assert!((first[0] - 1.0).abs() < 1e-9 && first[1].abs() < 1e-9);
        assert!(last[0].abs() < 1e-9 && (last[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn month_names_cover_calendar() {
        assert_eq!(month_name(1), "Jan");
        assert_eq!(month_name(12), "Dec");
        assert_eq!(month_name(0), "");
        assert_eq!(month_name(13), "");
    }
}
