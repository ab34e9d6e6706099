//! Data module - crash CSV loading and the in-memory crash table

mod loader;
mod table;

pub use loader::{CrashLoader, LoadError, DEFAULT_INFER_SCHEMA_ROWS};
pub use table::{columns, CrashRecord, CrashTable};

#[cfg(test)]
pub(crate) use table::fixtures;
