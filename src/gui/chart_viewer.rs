//! Chart Viewer Widget
//! Right side scrollable panel with one card per selected dashboard page.

use crate::analysis::{
    self, AnalysisError, CityRanking, JunctionCounts, MapProjection, MonthlyOverview,
};
use crate::charts::ChartPlotter;
use crate::data::CrashTable;
use crate::gui::control_panel::{Page, UserSettings};
use egui::{Color32, RichText, ScrollArea};

const CARD_SPACING: f32 = 15.0;
const ACCENT: Color32 = Color32::from_rgb(100, 149, 237);
const ERROR_COLOR: Color32 = Color32::from_rgb(220, 53, 69);

/// Chart the user asked to save as PNG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportRequest {
    CityPie,
    Monthly,
    Junctions,
}

impl ExportRequest {
    pub fn file_name(self) -> &'static str {
        match self {
            Self::CityPie => "crash_distribution.png",
            Self::Monthly => "road_incidents.png",
            Self::Junctions => "crash_causes.png",
        }
    }
}

/// Pipeline results for the pages currently shown.
///
/// `None` means the page is hidden or has nothing to show yet.
#[derive(Debug, Default, Clone)]
pub struct DashboardViews {
    pub cities: Option<CityRanking>,
    pub map: Option<Result<MapProjection, AnalysisError>>,
    pub monthly: Option<MonthlyOverview>,
    pub junctions: Option<Result<JunctionCounts, AnalysisError>>,
}

impl DashboardViews {
    /// Run the pipeline for every selected page.
    pub fn compute(table: &CrashTable, settings: &UserSettings) -> Self {
        let shows = |page: Page| settings.pages.contains(&page);

        Self {
            cities: shows(Page::CityDistribution)
                .then(|| analysis::top_cities(table, settings.top_n)),
            // No map until at least one city is picked.
            map: (shows(Page::CrashMap) && !settings.map_cities.is_empty())
                .then(|| analysis::project(table, &settings.map_cities)),
            monthly: shows(Page::IncidentOverview)
                .then(|| analysis::monthly(table, settings.category)),
            junctions: shows(Page::CauseAnalysis)
                .then_some(settings.cause.as_deref())
                .flatten()
                .map(|cause| analysis::by_junction(table, cause)),
        }
    }
}

/// Scrollable dashboard area.
#[derive(Default)]
pub struct ChartViewer {
    pub views: DashboardViews,
    pub map_point_radius: f32,
    pub raw_preview_rows: usize,
}

impl ChartViewer {
    pub fn new(map_point_radius: f32, raw_preview_rows: usize) -> Self {
        Self {
            views: DashboardViews::default(),
            map_point_radius,
            raw_preview_rows,
        }
    }

    pub fn clear(&mut self) {
        self.views = DashboardViews::default();
    }

    /// Draw the selected pages; returns the chart whose export button was clicked.
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        table: Option<&CrashTable>,
        settings: &UserSettings,
    ) -> Option<ExportRequest> {
        let Some(table) = table else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return None;
        };

        let mut export = None;

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                if settings.show_raw {
                    Self::card(ui, "Raw Data", |ui| {
                        ChartPlotter::draw_raw_table(ui, table.frame(), self.raw_preview_rows);
                    });
                }

                if settings.pages.is_empty() {
                    ui.add_space(20.0);
                    ui.label(
                        RichText::new("Select pages in the side panel to start exploring.")
                            .color(Color32::GRAY),
                    );
                }

                for page in &settings.pages {
                    match page {
                        Page::CityDistribution => self.show_cities(ui, &mut export),
                        Page::CrashMap => self.show_map(ui),
                        Page::IncidentOverview => self.show_monthly(ui, &mut export),
                        Page::CauseAnalysis => self.show_junctions(ui, &mut export),
                    }
                }
            });

        export
    }

    fn card(ui: &mut egui::Ui, title: &str, add_contents: impl FnOnce(&mut egui::Ui)) {
        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(2.0, ACCENT))
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.label(RichText::new(title).size(18.0).strong().color(ACCENT));
                ui.add_space(8.0);
                add_contents(ui);
            });
        ui.add_space(CARD_SPACING);
    }

    fn export_button(ui: &mut egui::Ui, request: ExportRequest, export: &mut Option<ExportRequest>) {
        if ui.small_button("💾 Export PNG").clicked() {
            *export = Some(request);
        }
    }

    fn error_label(ui: &mut egui::Ui, err: &AnalysisError) {
        ui.label(RichText::new(format!("⚠ {}", err)).color(ERROR_COLOR));
    }

    fn show_cities(&self, ui: &mut egui::Ui, export: &mut Option<ExportRequest>) {
        let Some(ranking) = &self.views.cities else {
            return;
        };

        Self::card(ui, "Where are the most car crashes in MA?", |ui| {
            if ranking.entries.is_empty() {
                ui.label(RichText::new("No crashes with a municipality").color(Color32::GRAY));
                return;
            }
            Self::export_button(ui, ExportRequest::CityPie, export);
            ui.label(
                RichText::new(format!("Top {} cities with the most car crashes", ranking.n))
                    .size(14.0)
                    .strong(),
            );
            ChartPlotter::draw_city_pie(ui, ranking);
            ui.add_space(8.0);
            ChartPlotter::draw_city_table(ui, ranking);
        });
    }

    fn show_map(&self, ui: &mut egui::Ui) {
        Self::card(ui, "Map Showing Car Crashes in Selected Cities", |ui| {
            match &self.views.map {
                None => {
                    ui.label(
                        RichText::new("Select cities in the side panel to display on the map.")
                            .color(Color32::GRAY),
                    );
                }
                Some(Err(e)) => Self::error_label(ui, e),
                Some(Ok(projection)) => {
                    ui.label(
                        RichText::new(format!("{} crashes plotted", projection.points.len()))
                            .size(11.0)
                            .color(Color32::GRAY),
                    );
                    ChartPlotter::draw_crash_map(ui, projection, self.map_point_radius);
                }
            }
        });
    }

    fn show_monthly(&self, ui: &mut egui::Ui, export: &mut Option<ExportRequest>) {
        let Some(overview) = &self.views.monthly else {
            return;
        };

        Self::card(ui, "Overview of Road Incidents", |ui| {
            ui.label(
                RichText::new(format!(
                    "Monthly Distribution of Crashes based on {}",
                    overview.category
                ))
                .size(14.0)
                .strong(),
            );
            if overview.nonfatal.is_empty() && overview.fatal.is_empty() {
                ui.label(RichText::new("No qualifying crashes").color(Color32::GRAY));
            } else {
                Self::export_button(ui, ExportRequest::Monthly, export);
                ChartPlotter::draw_monthly_chart(ui, overview);
            }
            ui.add_space(6.0);
            ui.label(
                RichText::new(format!(
                    "Total number of {}: {}",
                    overview.category, overview.total
                ))
                .size(14.0),
            );
            if overview.skipped_timestamps > 0 {
                ui.label(
                    RichText::new(format!(
                        "{} crashes with unreadable timestamps were left out of the chart",
                        overview.skipped_timestamps
                    ))
                    .size(11.0)
                    .color(Color32::GRAY),
                );
            }
        });
    }

    fn show_junctions(&self, ui: &mut egui::Ui, export: &mut Option<ExportRequest>) {
        Self::card(ui, "Analysis of Crash Causes", |ui| match &self.views.junctions {
            None => {
                ui.label(RichText::new("No crash causes in the data").color(Color32::GRAY));
            }
            Some(Err(e)) => Self::error_label(ui, e),
            Some(Ok(counts)) => {
                Self::export_button(ui, ExportRequest::Junctions, export);
                ChartPlotter::draw_junction_chart(ui, counts);

                ui.add_space(8.0);
                ui.label(RichText::new("Analytical Insights:").size(15.0).strong());
                ui.label(format!(
                    "From the selected crash cause {}, the most common types of roadway \
                     junctions associated with this crash cause are:",
                    counts.cause
                ));
                for line in counts.insights() {
                    ui.label(format!("  - {}", line));
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{fixtures, CrashRecord};

    fn table() -> CrashTable {
        let mut a = fixtures::in_city(1, "BOSTON", 2);
        a.cause = Some("Rear-end".to_string());
        a.junction_type = Some("T-intersection".to_string());
        a.latitude = Some(42.36);
        a.longitude = Some(-71.06);
        a.crash_datetime = Some("2017-03-04 10:00:00".to_string());
        a.nonfatal_injuries = Some(1);

        let mut b: CrashRecord = fixtures::in_city(2, "SALEM", 1);
        b.cause = Some("Angle".to_string());

        CrashTable::from_records(vec![a, b]).unwrap()
    }

    #[test]
    fn hidden_pages_are_not_computed() {
        let views = DashboardViews::compute(&table(), &UserSettings::default());
        assert!(views.cities.is_none());
        assert!(views.map.is_none());
        assert!(views.monthly.is_none());
        assert!(views.junctions.is_none());
    }

    #[test]
    fn selected_pages_run_the_pipeline() {
        let mut settings = UserSettings::default();
        settings.pages = Page::ALL.into_iter().collect();
        settings.top_n = 1;
        settings.cause = Some("Rear-end".to_string());

        let views = DashboardViews::compute(&table(), &settings);

        let cities = views.cities.unwrap();
        assert_eq!(cities.entries.len(), 1);
        assert_eq!(cities.entries[0].municipality, "BOSTON");
        // Map waits for a city selection.
        assert!(views.map.is_none());
        assert_eq!(views.monthly.unwrap().total, 1);
        assert_eq!(views.junctions.unwrap().unwrap().total(), 1);
    }

    #[test]
    fn map_selection_errors_are_kept_for_display() {
        let mut settings = UserSettings::default();
        settings.pages.insert(Page::CrashMap);
        settings.map_cities.insert("SALEM".to_string());

        let views = DashboardViews::compute(&table(), &settings);
        assert_eq!(views.map, Some(Err(AnalysisError::EmptySelection)));
    }

    #[test]
    fn export_file_names() {
        assert_eq!(ExportRequest::CityPie.file_name(), "crash_distribution.png");
        assert_eq!(ExportRequest::Junctions.file_name(), "crash_causes.png");
    }
}
