//! Crash Explorer Main Application
//! Main window with control panel and dashboard viewer.

use crate::charts::{RenderError, StaticChartRenderer};
use crate::config::Config;
use crate::data::{CrashLoader, CrashTable};
use crate::gui::{
    ChartViewer, ControlPanel, ControlPanelAction, DashboardViews, ExportRequest, UserSettings,
};
use egui::load::SizedTexture;
use egui::{RichText, SidePanel, TextureHandle};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::thread;
use tracing::{error, info, warn};

const BANNER_WIDTH: u32 = 600;
const EXPORT_SIZE: (u32, u32) = (1200, 800);

/// CSV loading result from background thread
enum LoadResult {
    Progress(String),
    Complete { path: PathBuf, table: CrashTable },
    Error { path: PathBuf, message: String },
}

/// Main application window.
pub struct CrashExplorerApp {
    loader: CrashLoader,
    table: Option<CrashTable>,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,
    banner: Option<TextureHandle>,

    // Async CSV loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl CrashExplorerApp {
    /// `table` is the crash file already loaded at startup, if one was configured.
    pub fn new(cc: &eframe::CreationContext<'_>, config: &Config, table: Option<CrashTable>) -> Self {
        let settings = UserSettings {
            csv_path: config.data.csv_path.clone(),
            top_n: config.display.top_cities(),
            category: config.display.category(),
            ..UserSettings::default()
        };

        let banner = config
            .display
            .banner_image
            .as_deref()
            .and_then(|path| match load_banner(&cc.egui_ctx, path) {
                Ok(texture) => Some(texture),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Banner image not shown");
                    None
                }
            });

        let mut app = Self {
            loader: CrashLoader::new(config.data.infer_schema_rows),
            table: None,
            control_panel: ControlPanel::new(settings),
            chart_viewer: ChartViewer::new(
                config.display.map_point_radius,
                config.display.raw_preview_rows,
            ),
            banner,
            load_rx: None,
            is_loading: false,
        };
        if let Some(table) = table {
            app.install_table(None, table);
        }
        app
    }

    /// Handle CSV file selection
    fn handle_browse_csv(&mut self) {
        if self.is_loading {
            return;
        }

        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        {
            self.start_loading(path);
        }
    }

    /// Load the crash file in a background thread.
    fn start_loading(&mut self, path: PathBuf) {
        self.control_panel.set_progress(0.0, "Loading CSV file...");
        self.is_loading = true;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);
        let loader = self.loader.clone();

        thread::spawn(move || {
            let _ = tx.send(LoadResult::Progress("Reading crash records...".to_string()));

            match loader.load(&path) {
                Ok(table) => {
                    let _ = tx.send(LoadResult::Complete { path, table });
                }
                Err(e) => {
                    error!(path = %path.display(), error = %e, "Failed to load crash data");
                    let _ = tx.send(LoadResult::Error {
                        path,
                        message: e.to_string(),
                    });
                }
            }
        });
    }

    /// Check for CSV loading results
    fn check_load_results(&mut self) {
        let rx = self.load_rx.take();
        if let Some(rx) = rx {
            let mut should_keep_receiver = true;

            while let Ok(result) = rx.try_recv() {
                match result {
                    LoadResult::Progress(status) => {
                        self.control_panel.set_progress(0.0, &status);
                    }
                    LoadResult::Complete { path, table } => {
                        self.install_table(Some(path), table);
                        self.is_loading = false;
                        should_keep_receiver = false;
                    }
                    LoadResult::Error { path, message } => {
                        // The previous table, file name and views stay as they were.
                        self.control_panel.load_failed(&path, &message);
                        self.is_loading = false;
                        should_keep_receiver = false;
                    }
                }
            }

            if should_keep_receiver {
                self.load_rx = Some(rx);
            }
        }
    }

    /// `path` is `None` for the startup load, whose path is already in the settings.
    fn install_table(&mut self, path: Option<PathBuf>, table: CrashTable) {
        self.control_panel.load_succeeded(path, &table);
        self.table = Some(table);
        self.refresh_views();
    }

    /// Recompute every visible page from the current selection.
    fn refresh_views(&mut self) {
        match &self.table {
            Some(table) => {
                self.chart_viewer.views =
                    DashboardViews::compute(table, &self.control_panel.settings);
            }
            None => self.chart_viewer.clear(),
        }
    }

    /// Save one chart as PNG and open it with the system viewer.
    fn handle_export(&mut self, request: ExportRequest) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG Image", &["png"])
            .set_file_name(request.file_name())
            .save_file()
        else {
            return;
        };

        match self.render_export(request, &path) {
            Ok(()) => {
                self.control_panel
                    .set_progress(100.0, &format!("Exported {}", path.display()));
                if let Err(e) = open::that(&path) {
                    warn!(path = %path.display(), error = %e, "Could not open exported chart");
                }
            }
            Err(e) => {
                error!(error = %e, "Chart export failed");
                self.control_panel
                    .set_progress(0.0, &format!("Error: {}", e));
            }
        }
    }

    fn render_export(&self, request: ExportRequest, path: &Path) -> Result<(), RenderError> {
        let views = &self.chart_viewer.views;
        match request {
            ExportRequest::CityPie => match &views.cities {
                Some(ranking) => StaticChartRenderer::render_city_pie(ranking, path, EXPORT_SIZE),
                None => Err(RenderError::Empty("city distribution page is hidden")),
            },
            ExportRequest::Monthly => match &views.monthly {
                Some(overview) => {
                    StaticChartRenderer::render_monthly_chart(overview, path, EXPORT_SIZE)
                }
                None => Err(RenderError::Empty("road incidents page is hidden")),
            },
            ExportRequest::Junctions => match &views.junctions {
                Some(Ok(counts)) => {
                    StaticChartRenderer::render_junction_chart(counts, path, EXPORT_SIZE)
                }
                _ => Err(RenderError::Empty("no junction counts for the selected cause")),
            },
        }
    }
}

/// Decode the banner and scale it to a fixed width, keeping its aspect ratio.
fn load_banner(ctx: &egui::Context, path: &Path) -> Result<TextureHandle, image::ImageError> {
    let img = image::open(path)?;
    let height = (img.height() as f64 * BANNER_WIDTH as f64 / img.width().max(1) as f64)
        .round()
        .max(1.0) as u32;
    let rgba = img
        .resize_exact(BANNER_WIDTH, height, image::imageops::FilterType::Lanczos3)
        .to_rgba8();

    let color_image = egui::ColorImage::from_rgba_unmultiplied(
        [rgba.width() as usize, rgba.height() as usize],
        rgba.as_raw(),
    );
    info!(path = %path.display(), "Loaded banner image");
    Ok(ctx.load_texture("banner", color_image, egui::TextureOptions::LINEAR))
}

impl eframe::App for CrashExplorerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_results();

        if self.is_loading {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(300.0)
            .max_width(350.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    match self.control_panel.show(ui) {
                        ControlPanelAction::BrowseCsv => self.handle_browse_csv(),
                        ControlPanelAction::SelectionChanged => self.refresh_views(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Dashboard
        let mut export = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.label(
                    RichText::new("Motor Vehicle Crash Detection")
                        .size(26.0)
                        .strong()
                        .color(egui::Color32::from_rgb(173, 216, 230)),
                );
                if let Some(banner) = &self.banner {
                    ui.add(egui::Image::new(SizedTexture::from_handle(banner)));
                }
            });
            ui.add_space(10.0);

            export = self.chart_viewer.show(
                ui,
                self.table.as_ref(),
                &self.control_panel.settings,
            );
        });

        if let Some(request) = export {
            self.handle_export(request);
        }
    }
}
