//! Dashboard entry point.

use anyhow::Context;
use crash_explorer::config::Config;
use crash_explorer::data::CrashLoader;
use crash_explorer::gui::CrashExplorerApp;
use crash_explorer::logging;
use eframe::egui;
use tracing::info;

fn main() -> anyhow::Result<()> {
    logging::init_logging();

    let config = Config::load()?;

    // A configured crash file must load; without one the user browses for it.
    let table = match &config.data.csv_path {
        Some(path) => {
            let table = CrashLoader::new(config.data.infer_schema_rows)
                .load(path)
                .with_context(|| format!("Failed to load crash data from {}", path.display()))?;
            Some(table)
        }
        None => None,
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1100.0, 700.0])
            .with_title("Crash Explorer"),
        ..Default::default()
    };

    info!("Starting dashboard");
    eframe::run_native(
        "Crash Explorer",
        options,
        Box::new(move |cc| Ok(Box::new(CrashExplorerApp::new(cc, &config, table)))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
