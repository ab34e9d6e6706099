//! GUI module - User interface components

mod app;
mod chart_viewer;
mod control_panel;

pub use app::CrashExplorerApp;
pub use chart_viewer::{ChartViewer, DashboardViews, ExportRequest};
pub use control_panel::{ControlPanel, ControlPanelAction, Page, UserSettings};
