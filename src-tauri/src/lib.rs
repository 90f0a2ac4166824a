//! CSV reader screen: pick a delimited text file, filter its rows with free
//! text and choose which columns to show.
//!
//! The pipeline is plain library code driven through [`CsvScreen`]. The
//! `desktop` feature adds the Tauri shell that hosts it behind a webview.

pub mod config;
mod csv_cache;
pub mod csv_handler;
mod csv_mmap;
pub mod csv_ops;
pub mod error;
pub mod file_source;
pub mod logging;
pub mod state;
pub mod table;

#[cfg(feature = "desktop")]
mod commands;

#[cfg(feature = "desktop")]
pub use commands::run;

pub use config::ViewerConfig;
pub use csv_handler::{parse_csv, ParseSettings, ParseWarning};
pub use csv_ops::{filter_records, project_headers, project_row, TableView};
pub use error::{Result, ViewerError};
pub use file_source::{FileFilter, FilePicker, FileRef, PathPicker, PickOutcome};
pub use state::{CsvScreen, LoadOutcome};
pub use table::{FieldCatalog, ParsedTable, Record, SelectionSet};
