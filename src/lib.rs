//! Crash Explorer - Massachusetts Motor Vehicle Crash Dashboard
//!
//! Loads a crash CSV and shows crash distribution, locations, monthly
//! injuries and crash causes in an interactive window. The aggregation
//! pipeline in [`analysis`] is independent of the GUI.

pub mod analysis;
pub mod charts;
pub mod config;
pub mod data;
pub mod gui;
pub mod logging;
