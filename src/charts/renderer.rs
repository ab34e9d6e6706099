//! Static Chart Renderer
//! Writes PNG versions of the dashboard charts with plotters.
//!
//! Layouts:
//! 1. City distribution: pie with the leading slice pulled out, percentage labels
//! 2. Monthly overview: one line per injury series, peak annotations for the combined view
//! 3. Junction analysis: vertical bars, rotated junction labels

use crate::analysis::{CityRanking, InjuryCategory, JunctionCounts, MonthlyOverview};
use plotters::prelude::*;
use plotters::style::FontTransform;
use std::f64::consts::TAU;
use std::path::Path;
use thiserror::Error;
use tracing::info;

const NONFATAL: RGBColor = RGBColor(0, 0, 255);
const FATAL: RGBColor = RGBColor(255, 0, 0);
const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);

const SLICES: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Chart rendering failed: {0}")]
    Draw(String),
    #[error("Nothing to render: {0}")]
    Empty(&'static str),
}

fn draw_err<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Draw(e.to_string())
}

/// Pixel outline of a pie slice, counter-clockwise from `start`.
fn slice_outline(center: (f64, f64), radius: f64, start: f64, sweep: f64) -> Vec<(i32, i32)> {
    let steps = ((sweep / TAU) * 120.0).ceil().max(2.0) as usize;
    let mut outline = vec![(center.0 as i32, center.1 as i32)];
    for s in 0..=steps {
        let angle = start + sweep * s as f64 / steps as f64;
        // Pixel y grows downward.
        outline.push((
            (center.0 + radius * angle.cos()).round() as i32,
            (center.1 - radius * angle.sin()).round() as i32,
        ));
    }
    outline
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// City distribution pie.
    pub fn render_city_pie(
        ranking: &CityRanking,
        path: &Path,
        size: (u32, u32),
    ) -> Result<(), RenderError> {
        if ranking.entries.is_empty() {
            return Err(RenderError::Empty("no municipalities ranked"));
        }

        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;
        let root = root
            .titled(
                &format!("Top {} cities with the most car crashes", ranking.n),
                ("sans-serif", 26),
            )
            .map_err(draw_err)?;

        let (w, h) = root.dim_in_pixel();
        let center = (w as f64 / 2.0, h as f64 / 2.0);
        let radius = w.min(h) as f64 * 0.36;
        let label_font = ("sans-serif", 15).into_font();

        let mut start = 0.0;
        for (i, (entry, share)) in ranking
            .entries
            .iter()
            .zip(ranking.percentages())
            .enumerate()
        {
            let sweep = share / 100.0 * TAU;
            if sweep <= 0.0 {
                continue;
            }
            let mid = start + sweep / 2.0;
            let offset = if i == 0 { radius * 0.1 } else { 0.0 };
            let cx = center.0 + offset * mid.cos();
            let cy = center.1 - offset * mid.sin();

            let outline = slice_outline((cx, cy), radius, start, sweep);
            root.draw(&Polygon::new(outline, SLICES[i % SLICES.len()].filled()))
                .map_err(draw_err)?;

            let inner = (
                (cx + radius * 0.6 * mid.cos()) as i32 - 18,
                (cy - radius * 0.6 * mid.sin()) as i32 - 8,
            );
            root.draw(&Text::new(
                format!("{:.1}%", share),
                inner,
                label_font.clone().color(&WHITE),
            ))
            .map_err(draw_err)?;

            let outer = (
                (cx + radius * 1.12 * mid.cos()) as i32 - 30,
                (cy - radius * 1.12 * mid.sin()) as i32 - 8,
            );
            root.draw(&Text::new(
                entry.municipality.clone(),
                outer,
                label_font.clone().color(&BLACK),
            ))
            .map_err(draw_err)?;

            start += sweep;
        }

        root.present().map_err(draw_err)?;
        info!(path = %path.display(), "Rendered city distribution chart");
        Ok(())
    }

    /// Monthly injury lines.
    pub fn render_monthly_chart(
        overview: &MonthlyOverview,
        path: &Path,
        size: (u32, u32),
    ) -> Result<(), RenderError> {
        if overview.nonfatal.is_empty() && overview.fatal.is_empty() {
            return Err(RenderError::Empty("no qualifying crashes"));
        }

        let top = overview
            .nonfatal
            .counts
            .values()
            .chain(overview.fatal.counts.values())
            .copied()
            .max()
            .unwrap_or(0);

        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!("Monthly Distribution of Crashes based on {}", overview.category),
                ("sans-serif", 24),
            )
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(1u32..12u32, 0u64..(top + top / 5 + 1))
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .x_labels(12)
            .x_desc("Month")
            .y_desc("Number of Crashes")
            .draw()
            .map_err(draw_err)?;

        let annotate = overview.category == InjuryCategory::Both;
        for (series, color, label) in [
            (&overview.nonfatal, NONFATAL, "Nonfatal Injuries"),
            (&overview.fatal, FATAL, "Fatal Injuries"),
        ] {
            if series.is_empty() {
                continue;
            }

            chart
                .draw_series(LineSeries::new(series.points(), color.stroke_width(2)))
                .map_err(draw_err)?
                .label(label)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
            chart
                .draw_series(series.points().map(|p| Circle::new(p, 4, color.filled())))
                .map_err(draw_err)?;

            if annotate {
                if let Some((month, peak)) = series.peak() {
                    chart
                        .draw_series(std::iter::once(Text::new(
                            format!("Max: {}", peak),
                            (month, peak + top / 10),
                            ("sans-serif", 16).into_font().color(&color),
                        )))
                        .map_err(draw_err)?;
                }
            }
        }

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(draw_err)?;

        root.present().map_err(draw_err)?;
        info!(path = %path.display(), "Rendered monthly overview chart");
        Ok(())
    }

    /// Junction type bars for one cause.
    pub fn render_junction_chart(
        counts: &JunctionCounts,
        path: &Path,
        size: (u32, u32),
    ) -> Result<(), RenderError> {
        if counts.entries.is_empty() {
            return Err(RenderError::Empty("no junction counts"));
        }

        let labels: Vec<String> = counts
            .entries
            .iter()
            .map(|e| e.junction_type.clone())
            .collect();
        let top = counts.entries.iter().map(|e| e.crashes).max().unwrap_or(0);

        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Roadway Junction Type and Crash Cause", ("sans-serif", 24))
            .margin(20)
            .x_label_area_size(160)
            .y_label_area_size(60)
            .build_cartesian_2d(
                (0u32..labels.len() as u32).into_segmented(),
                0i64..(top + top / 10 + 1),
            )
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(labels.len())
            .x_desc("Roadway Junction Type")
            .y_desc("Number of Crashes")
            .x_label_style(
                ("sans-serif", 13)
                    .into_font()
                    .transform(FontTransform::Rotate90),
            )
            .x_label_formatter(&|v| match v {
                SegmentValue::CenterOf(i) => labels.get(*i as usize).cloned().unwrap_or_default(),
                _ => String::new(),
            })
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(
                Histogram::vertical(&chart)
                    .style(SKY_BLUE.filled())
                    .margin(12)
                    .data(
                        counts
                            .entries
                            .iter()
                            .enumerate()
                            .map(|(i, e)| (i as u32, e.crashes)),
                    ),
            )
            .map_err(draw_err)?;

        root.present().map_err(draw_err)?;
        info!(path = %path.display(), cause = %counts.cause, "Rendered junction chart");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_results_are_not_rendered() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.png");

        let ranking = CityRanking {
            entries: Vec::new(),
            n: 10,
        };
        assert!(matches!(
            StaticChartRenderer::render_city_pie(&ranking, &path, (800, 600)),
            Err(RenderError::Empty(_))
        ));

        let overview = MonthlyOverview {
            category: InjuryCategory::Fatal,
            nonfatal: Default::default(),
            fatal: Default::default(),
            total: 0,
            skipped_timestamps: 0,
        };
        assert!(matches!(
            StaticChartRenderer::render_monthly_chart(&overview, &path, (800, 600)),
            Err(RenderError::Empty(_))
        ));

        let counts = JunctionCounts {
            cause: "x".to_string(),
            entries: Vec::new(),
        };
        assert!(matches!(
            StaticChartRenderer::render_junction_chart(&counts, &path, (800, 600)),
            Err(RenderError::Empty(_))
        ));
        assert!(!path.exists());
    }

    #[test]
    fn slice_outline_spans_the_sweep() {
        let outline = slice_outline((100.0, 100.0), 50.0, 0.0, TAU / 4.0);
        assert_eq!(outline[0], (100, 100));
        assert_eq!(outline[1], (150, 100));
        // Quarter turn ends straight above the center in pixel space.
        assert_eq!(*outline.last().unwrap(), (100, 50));
        assert!(outline.len() >= 4);
    }
}
