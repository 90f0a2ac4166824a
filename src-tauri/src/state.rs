//! State of the CSV reader screen and its transitions.
//!
//! [`CsvScreen`] owns everything the screen shows: the loaded records, the
//! field catalog, which columns are selected, the filter text and the
//! filtered view derived from them. Each user action maps to one method.

use serde::Serialize;
use std::sync::{Mutex, MutexGuard};

use crate::config::ViewerConfig;
use crate::csv_cache::FilterCache;
use crate::csv_handler::{parse_csv, ParseWarning};
use crate::csv_ops::{filter_records, project_headers, project_rows, TableView};
use crate::error::{Result, ViewerError};
use crate::file_source::{FileFilter, FilePicker, PickOutcome};
use crate::table::{FieldCatalog, ParsedTable, Record, SelectionSet};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum LoadOutcome {
    Loaded { rows: usize, columns: usize },
    Cancelled,
    /// Another load was still in flight, nothing happened.
    Busy,
}

/// Locks a shared screen. A panic in an earlier holder does not lock the
/// screen out for good: the guard is recovered so an in-flight load can still
/// be finished or cancelled.
pub fn lock_screen(screen: &Mutex<CsvScreen>) -> MutexGuard<'_, CsvScreen> {
    screen.lock().unwrap_or_else(|poisoned| {
        tracing::warn!("csv screen lock was poisoned, recovering");
        poisoned.into_inner()
    })
}

pub struct CsvScreen {
    config: ViewerConfig,
    catalog: FieldCatalog,
    records: Vec<Record>,
    selection: SelectionSet,
    query: String,
    matches: Vec<usize>,
    cache: FilterCache,
    warnings: Vec<ParseWarning>,
    error_message: Option<String>,
    loading: bool,
}

impl Default for CsvScreen {
    fn default() -> Self {
        Self::new(ViewerConfig::default())
    }
}

impl CsvScreen {
    pub fn new(config: ViewerConfig) -> Self {
        let cache = FilterCache::new(config.filter_cache_capacity);
        Self {
            config,
            catalog: FieldCatalog::default(),
            records: Vec::new(),
            selection: SelectionSet::default(),
            query: String::new(),
            matches: Vec::new(),
            cache,
            warnings: Vec::new(),
            error_message: None,
            loading: false,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<ParseWarning> {
        std::mem::take(&mut self.warnings)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn row_count(&self) -> usize {
        self.records.len()
    }

    pub fn matched_count(&self) -> usize {
        self.matches.len()
    }

    /// Indices into [`Self::records`] of the rows that pass the filter.
    pub fn matches(&self) -> &[usize] {
        &self.matches
    }

    fn refilter(&mut self) {
        if let Some(cached) = self.cache.get(&self.query) {
            self.matches = cached;
            return;
        }
        self.matches = filter_records(&self.records, &self.query);
        self.cache.put(&self.query, self.matches.clone());
    }

    /// Sets the filter text and recomputes the filtered view. The selection
    /// is left alone.
    pub fn apply_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.refilter();
        tracing::debug!(
            query = %self.query,
            matched = self.matches.len(),
            total = self.records.len(),
            "applied filter"
        );
    }

    /// Flips whether `name` is displayed and returns its new membership.
    pub fn toggle_field(&mut self, name: &str) -> Result<bool> {
        let selected = self
            .catalog
            .position(name)
            .and_then(|idx| self.selection.toggle(idx))
            .ok_or_else(|| ViewerError::UnknownField {
                name: name.to_string(),
            })?;
        tracing::debug!(field = name, selected, "toggled column");
        Ok(selected)
    }

    /// Replaces the table wholesale with a freshly parsed one.
    pub fn load_table(&mut self, parsed: ParsedTable) {
        let ParsedTable {
            catalog,
            records,
            warnings,
        } = parsed;
        self.selection = SelectionSet::full(&catalog);
        self.catalog = catalog;
        self.records = records;
        self.warnings = warnings;
        self.error_message = None;
        self.cache.clear();
        if self.config.reset_query_on_load {
            self.query.clear();
        }
        self.refilter();
        tracing::info!(
            rows = self.records.len(),
            columns = self.catalog.len(),
            "loaded table"
        );
    }

    /// A parse failure leaves nothing behind.
    pub fn fail_parse(&mut self, err: &ViewerError) {
        tracing::warn!(error = %err, "parse failed, clearing table");
        self.catalog = FieldCatalog::default();
        self.records.clear();
        self.selection = SelectionSet::default();
        self.matches.clear();
        self.warnings.clear();
        self.cache.clear();
        self.error_message = Some(err.user_message());
    }

    /// A read failure keeps whatever was loaded before.
    pub fn fail_access(&mut self, err: &ViewerError) {
        tracing::warn!(error = %err, "file read failed");
        self.error_message = Some(err.user_message());
    }

    /// Parses `text` and loads it, or records the failure.
    pub fn load_text(&mut self, text: &str) -> Result<()> {
        match parse_csv(text, &self.config.parse) {
            Ok(parsed) => {
                self.load_table(parsed);
                Ok(())
            }
            Err(err) => {
                self.fail_parse(&err);
                Err(err)
            }
        }
    }

    /// Marks a load as started. Returns false when one is already running.
    pub fn begin_load(&mut self) -> bool {
        if self.loading {
            tracing::warn!("file pick ignored, a load is already in flight");
            return false;
        }
        self.loading = true;
        true
    }

    pub fn cancel_load(&mut self) {
        self.loading = false;
    }

    /// Completes a load started with [`Self::begin_load`] with the text that
    /// was read, or the read error.
    pub fn finish_load(&mut self, read: Result<String>) -> Result<LoadOutcome> {
        if !self.loading {
            return Err(ViewerError::NoLoadInProgress);
        }
        self.loading = false;
        let text = match read {
            Ok(text) => text,
            Err(err) => {
                self.fail_access(&err);
                return Err(err);
            }
        };
        self.load_text(&text)?;
        Ok(LoadOutcome::Loaded {
            rows: self.records.len(),
            columns: self.catalog.len(),
        })
    }

    /// Runs the whole pick → read → parse flow through `picker`.
    pub fn load_with(&mut self, picker: &dyn FilePicker) -> Result<LoadOutcome> {
        if !self.begin_load() {
            return Ok(LoadOutcome::Busy);
        }
        let file = match picker.choose_file(&FileFilter::csv()) {
            Ok(PickOutcome::Chosen(file)) => file,
            Ok(PickOutcome::Cancelled) => {
                self.cancel_load();
                return Ok(LoadOutcome::Cancelled);
            }
            Err(err) => {
                self.cancel_load();
                self.fail_access(&err);
                return Err(err);
            }
        };
        tracing::info!(file = %file.path.display(), "loading csv");
        let read = picker.read_file(&file);
        self.finish_load(read)
    }

    pub fn headers(&self) -> Vec<String> {
        project_headers(&self.catalog, &self.selection)
    }

    pub fn view(&self) -> TableView {
        self.view_chunk(0, self.matches.len())
    }

    /// A window of the projected, filtered rows, for virtual scrolling.
    pub fn view_chunk(&self, start: usize, count: usize) -> TableView {
        let start = start.min(self.matches.len());
        let end = start.saturating_add(count).min(self.matches.len());
        TableView {
            headers: self.headers(),
            rows: project_rows(&self.records, &self.matches[start..end], &self.selection),
            total_rows: self.records.len(),
            matched_rows: self.matches.len(),
        }
    }
}
