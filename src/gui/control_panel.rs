//! Control Panel Widget
//! Left side panel with the data source, page selection and per-view inputs.

use crate::analysis::{self, InjuryCategory, MAX_TOP_CITIES, MIN_TOP_CITIES};
use crate::data::CrashTable;
use egui::{Color32, ComboBox, RichText, ScrollArea};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Dashboard pages, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Page {
    CityDistribution,
    CrashMap,
    IncidentOverview,
    CauseAnalysis,
}

impl Page {
    pub const ALL: [Page; 4] = [
        Self::CityDistribution,
        Self::CrashMap,
        Self::IncidentOverview,
        Self::CauseAnalysis,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Self::CityDistribution => "Car Crash Distribution",
            Self::CrashMap => "Car Crash Map",
            Self::IncidentOverview => "Road Incidents Overview",
            Self::CauseAnalysis => "Crash Causes Analysis",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Everything the user has chosen; the app recomputes views from this.
#[derive(Debug, Clone, PartialEq)]
pub struct UserSettings {
    pub csv_path: Option<PathBuf>,
    pub show_raw: bool,
    pub pages: BTreeSet<Page>,
    pub top_n: usize,
    pub map_cities: BTreeSet<String>,
    pub category: InjuryCategory,
    pub cause: Option<String>,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            csv_path: None,
            show_raw: false,
            pages: BTreeSet::new(),
            top_n: 10,
            map_cities: BTreeSet::new(),
            category: InjuryCategory::default(),
            cause: None,
        }
    }
}

/// Left side control panel.
pub struct ControlPanel {
    pub settings: UserSettings,
    pub municipalities: Vec<String>,
    pub causes: Vec<String>,
    pub city_filter: String,
    pub progress: f32,
    pub status: String,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            settings: UserSettings::default(),
            municipalities: Vec::new(),
            causes: Vec::new(),
            city_filter: String::new(),
            progress: 0.0,
            status: "Ready".to_string(),
        }
    }
}

impl ControlPanel {
    pub fn new(settings: UserSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Refresh the choice lists after a CSV load.
    ///
    /// Selections that no longer exist in the data are dropped; an unset
    /// cause defaults to the first one.
    pub fn update_choices(&mut self, municipalities: Vec<String>, causes: Vec<String>) {
        self.settings
            .map_cities
            .retain(|c| municipalities.binary_search(c).is_ok());
        if !self
            .settings
            .cause
            .as_ref()
            .is_some_and(|c| causes.contains(c))
        {
            self.settings.cause = causes.first().cloned();
        }
        self.municipalities = municipalities;
        self.causes = causes;
    }

    /// A load finished: the panel now describes `table`, read from `path`.
    pub fn load_succeeded(&mut self, path: Option<PathBuf>, table: &CrashTable) {
        if path.is_some() {
            self.settings.csv_path = path;
        }
        self.update_choices(table.municipalities(), analysis::causes(table));
        self.set_progress(
            100.0,
            &format!(
                "Loaded {} crashes, {} columns",
                table.len(),
                table.frame().width()
            ),
        );
    }

    /// A load failed: the previous file and its choices stay in place.
    pub fn load_failed(&mut self, path: &Path, error: &str) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        self.set_progress(0.0, &format!("Error loading {}: {}", name, error));
    }

    pub fn has_data(&self) -> bool {
        !self.municipalities.is_empty() || !self.causes.is_empty()
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let before = self.settings.clone();
        let mut action = ControlPanelAction::None;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🚗 Crash Explorer")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("Massachusetts crash data")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let path_text = self
                        .settings
                        .csv_path
                        .as_ref()
                        .and_then(|p| p.file_name())
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| "No file selected".to_string());

                    ui.label(RichText::new(&path_text).size(12.0).color(
                        if self.settings.csv_path.is_some() {
                            Color32::WHITE
                        } else {
                            Color32::GRAY
                        },
                    ));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("📂 Browse").clicked() {
                            action = ControlPanelAction::BrowseCsv;
                        }
                    });
                });
            });

        ui.add_space(5.0);
        ui.checkbox(&mut self.settings.show_raw, "Show Raw Data");

        ui.add_space(10.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Pages =====
        ui.label(RichText::new("📑 Pages").size(14.0).strong());
        ui.add_space(5.0);
        for page in Page::ALL {
            let mut on = self.settings.pages.contains(&page);
            if ui.checkbox(&mut on, page.title()).changed() {
                if on {
                    self.settings.pages.insert(page);
                } else {
                    self.settings.pages.remove(&page);
                }
            }
        }

        ui.add_enabled_ui(self.has_data(), |ui| {
            if self.settings.pages.contains(&Page::CityDistribution) {
                self.show_city_controls(ui);
            }
            if self.settings.pages.contains(&Page::CrashMap) {
                self.show_map_controls(ui);
            }
            if self.settings.pages.contains(&Page::IncidentOverview) {
                self.show_category_controls(ui);
            }
            if self.settings.pages.contains(&Page::CauseAnalysis) {
                self.show_cause_controls(ui);
            }
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Progress =====
        ui.label(RichText::new("📊 Progress").size(14.0).strong());
        ui.add_space(5.0);

        ui.add(
            egui::ProgressBar::new(self.progress / 100.0)
                .show_percentage()
                .animate(self.progress > 0.0 && self.progress < 100.0),
        );

        ui.add_space(5.0);

        let status_color = if self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.contains("Loaded") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        if action == ControlPanelAction::None && self.settings != before {
            action = ControlPanelAction::SelectionChanged;
        }
        action
    }

    fn section_header(ui: &mut egui::Ui, text: &str) {
        ui.add_space(12.0);
        ui.separator();
        ui.add_space(6.0);
        ui.label(RichText::new(text).size(14.0).strong());
        ui.add_space(5.0);
    }

    fn show_city_controls(&mut self, ui: &mut egui::Ui) {
        Self::section_header(ui, "🏙 Top Cities");
        ui.add(
            egui::Slider::new(&mut self.settings.top_n, MIN_TOP_CITIES..=MAX_TOP_CITIES)
                .text("Number of cities"),
        );
    }

    fn show_map_controls(&mut self, ui: &mut egui::Ui) {
        Self::section_header(ui, "🗺 Cities on the Map");

        ui.horizontal(|ui| {
            ui.label("Filter:");
            ui.text_edit_singleline(&mut self.city_filter);
        });
        ui.label(
            RichText::new(format!("{} selected", self.settings.map_cities.len()))
                .size(11.0)
                .color(Color32::GRAY),
        );

        let needle = self.city_filter.to_lowercase();
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(5.0)
            .show(ui, |ui| {
                ScrollArea::vertical()
                    .id_salt("map_cities")
                    .max_height(160.0)
                    .show(ui, |ui| {
                        for city in &self.municipalities {
                            if !needle.is_empty() && !city.to_lowercase().contains(&needle) {
                                continue;
                            }
                            let mut on = self.settings.map_cities.contains(city);
                            if ui.checkbox(&mut on, city).changed() {
                                if on {
                                    self.settings.map_cities.insert(city.clone());
                                } else {
                                    self.settings.map_cities.remove(city);
                                }
                            }
                        }
                    });
            });

        ui.add_space(5.0);
        ui.horizontal(|ui| {
            if ui.small_button("Select All").clicked() {
                self.settings
                    .map_cities
                    .extend(self.municipalities.iter().cloned());
            }
            if ui.small_button("Clear All").clicked() {
                self.settings.map_cities.clear();
            }
        });
    }

    fn show_category_controls(&mut self, ui: &mut egui::Ui) {
        Self::section_header(ui, "🩹 Injury Category");
        for category in InjuryCategory::ALL {
            ui.radio_value(&mut self.settings.category, category, category.label());
        }
    }

    fn show_cause_controls(&mut self, ui: &mut egui::Ui) {
        Self::section_header(ui, "⚠ Crash Cause");
        let selected = self.settings.cause.clone().unwrap_or_default();
        ComboBox::from_id_salt("crash_cause")
            .width(ui.available_width() - 10.0)
            .selected_text(&selected)
            .show_ui(ui, |ui| {
                for cause in &self.causes {
                    if ui.selectable_label(selected == *cause, cause).clicked() {
                        self.settings.cause = Some(cause.clone());
                    }
                }
            });
    }

    /// Set progress and status
    pub fn set_progress(&mut self, progress: f32, status: &str) {
        self.progress = progress;
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseCsv,
    SelectionChanged,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_choices_drops_stale_selections() {
        let mut panel = ControlPanel::default();
        panel.settings.map_cities = ["BOSTON", "GONE"].iter().map(|s| s.to_string()).collect();
        panel.settings.cause = Some("Old cause".to_string());

        panel.update_choices(
            vec!["BOSTON".to_string(), "SALEM".to_string()],
            vec!["Single vehicle crash".to_string(), "Rear-end".to_string()],
        );

        assert_eq!(
            panel.settings.map_cities.iter().collect::<Vec<_>>(),
            vec!["BOSTON"]
        );
        assert_eq!(panel.settings.cause.as_deref(), Some("Single vehicle crash"));
        assert!(panel.has_data());
    }

    fn loaded_table() -> CrashTable {
        let mut record = crate::data::fixtures::in_city(1, "BOSTON", 1);
        record.cause = Some("Rear-end".to_string());
        CrashTable::from_records(vec![record]).unwrap()
    }

    #[test]
    fn failed_load_keeps_previous_file() {
        let mut panel = ControlPanel::default();
        panel.load_succeeded(Some(PathBuf::from("data/crashes.csv")), &loaded_table());

        panel.load_failed(Path::new("data/broken.csv"), "Required column 'lat' is missing");

        assert_eq!(
            panel.settings.csv_path.as_deref(),
            Some(Path::new("data/crashes.csv"))
        );
        assert_eq!(panel.municipalities, vec!["BOSTON"]);
        assert!(panel.status.starts_with("Error loading broken.csv"));
    }

    #[test]
    fn successful_load_switches_file() {
        let mut panel = ControlPanel::default();
        panel.settings.csv_path = Some(PathBuf::from("old.csv"));
        panel.load_succeeded(Some(PathBuf::from("new.csv")), &loaded_table());

        assert_eq!(panel.settings.csv_path.as_deref(), Some(Path::new("new.csv")));
        assert_eq!(panel.settings.cause.as_deref(), Some("Rear-end"));
        assert_eq!(panel.status, "Loaded 1 crashes, 11 columns");
    }

    #[test]
    fn valid_cause_is_kept() {
        let mut panel = ControlPanel::default();
        panel.settings.cause = Some("Rear-end".to_string());
        panel.update_choices(Vec::new(), vec!["Angle".to_string(), "Rear-end".to_string()]);
        assert_eq!(panel.settings.cause.as_deref(), Some("Rear-end"));
    }

    #[test]
    fn pages_sort_in_display_order() {
        let pages: BTreeSet<Page> = [Page::CauseAnalysis, Page::CityDistribution]
            .into_iter()
            .collect();
        assert_eq!(
            pages.into_iter().map(Page::title).collect::<Vec<_>>(),
            vec!["Car Crash Distribution", "Crash Causes Analysis"]
        );
    }
}
