//! The engine surface a front end drives.
//!
//! [`MappingSession`] owns the two loaded tables, the [`MappingStore`], the
//! [`HistoryLedger`] and the usage counters. It is single-threaded: each call
//! runs to completion before the next user action, and no partially loaded
//! table or partially written history is ever visible.

use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::{
    config::AppConfig,
    error::{MapperError, MapperResult},
    export,
    frame::Table,
    history::{HistoryLedger, Session},
    loader::{self, LoadOptions},
    mapping::{Mapping, MappingEvent, MappingStore, SourceSelection},
    profile, replay,
    transfer::{self, TransferOutcome},
    usage::UsageStatistics,
};

#[derive(Debug, Clone)]
struct LoadedTable {
    path: PathBuf,
    table: Table,
}

/// Result of a successful commit. The output file is always written; a
/// failure to record history afterwards is reported here instead of failing.
#[derive(Debug)]
pub struct CommitOutcome {
    pub output_path: PathBuf,
    pub copied: Vec<Mapping>,
    pub skipped: Vec<Mapping>,
    pub row_count: usize,
    pub history_warning: Option<MapperError>,
}

#[derive(Debug)]
pub struct MappingSession {
    config: AppConfig,
    load_options: LoadOptions,
    source: Option<LoadedTable>,
    destination: Option<LoadedTable>,
    mappings: MappingStore,
    ledger: HistoryLedger,
    usage: UsageStatistics,
}

impl MappingSession {
    pub fn new(config: AppConfig) -> Self {
        Self::with_load_options(config, LoadOptions::default())
    }

    pub fn with_load_options(config: AppConfig, load_options: LoadOptions) -> Self {
        let ledger = HistoryLedger::new(config.history_file.clone());
        let usage = UsageStatistics::load(config.stats_file.clone());
        Self {
            config,
            load_options,
            source: None,
            destination: None,
            mappings: MappingStore::default(),
            ledger,
            usage,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn mappings(&self) -> &MappingStore {
        &self.mappings
    }

    pub fn ledger(&self) -> &HistoryLedger {
        &self.ledger
    }

    pub fn usage(&self) -> &UsageStatistics {
        &self.usage
    }

    pub fn source_table(&self) -> Option<&Table> {
        self.source.as_ref().map(|loaded| &loaded.table)
    }

    pub fn destination_table(&self) -> Option<&Table> {
        self.destination.as_ref().map(|loaded| &loaded.table)
    }

    /// Loads both files, replacing any previous pair only when both succeed.
    /// Existing mappings are discarded.
    pub fn load_tables(
        &mut self,
        source_path: &Path,
        destination_path: &Path,
    ) -> MapperResult<(Vec<String>, Vec<String>)> {
        let source = loader::load_table(source_path, &self.load_options)?;
        let destination = loader::load_table(destination_path, &self.load_options)?;

        let source_columns = source.columns().to_vec();
        let destination_columns = destination.columns().to_vec();
        self.mappings
            .reset(source_columns.clone(), destination_columns.clone());
        self.source = Some(LoadedTable {
            path: source_path.to_path_buf(),
            table: source,
        });
        self.destination = Some(LoadedTable {
            path: destination_path.to_path_buf(),
            table: destination,
        });
        info!(
            "Files loaded - Source: {} columns, Destination: {} columns",
            source_columns.len(),
            destination_columns.len()
        );
        Ok((source_columns, destination_columns))
    }

    /// Sample text for a source column.
    pub fn preview(&self, column: &str) -> String {
        self.preview_with(column, self.config.sample_values)
    }

    pub fn preview_with(&self, column: &str, max_samples: usize) -> String {
        match self.source_table() {
            Some(table) => profile::sample_column(table, column, max_samples),
            None => profile::NO_DATA.to_string(),
        }
    }

    pub fn set_mapping(
        &mut self,
        destination: &str,
        source: impl Into<SourceSelection>,
    ) -> MapperResult<()> {
        self.ensure_loaded()?;
        let selection = source.into();
        let creates = matches!(selection, SourceSelection::Column(_));
        self.mappings.set(destination, selection)?;
        if creates {
            self.usage.record_mapping_created();
        }
        Ok(())
    }

    pub fn unset_mapping(&mut self, destination: &str) {
        self.mappings.unset(destination);
    }

    pub fn clear_mappings(&mut self) {
        self.mappings.clear();
        info!("All mappings cleared");
    }

    /// Exact match first, then the first case-insensitive match in source column order.
    pub fn resolve_source_input(&self, typed: &str) -> Option<String> {
        let columns = self.mappings.source_columns();
        if let Some(exact) = columns.iter().find(|column| column.as_str() == typed) {
            return Some(exact.clone());
        }
        let lowered = typed.to_lowercase();
        columns
            .iter()
            .find(|column| column.to_lowercase() == lowered)
            .cloned()
    }

    /// Single dispatch for a changed selection widget. Typed text that names no
    /// source column resets the destination to unselected. Returns the source
    /// now mapped, if any.
    pub fn on_mapping_changed(
        &mut self,
        destination: &str,
        input: &str,
    ) -> MapperResult<Option<String>> {
        let resolved = match SourceSelection::from(input) {
            SourceSelection::Unselected => None,
            SourceSelection::Column(typed) => self.resolve_source_input(&typed),
        };
        self.set_mapping(destination, resolved.clone())?;
        info!("Column mappings configured: {}", self.mappings.len());
        Ok(resolved)
    }

    pub fn drain_events(&mut self) -> Vec<MappingEvent> {
        self.mappings.drain_events()
    }

    pub fn mapping_preview(&self) -> String {
        if self.mappings.is_empty() {
            return "No column mappings configured yet.\n\nConfigure mappings to see preview."
                .to_string();
        }
        let mut text = format!("Current Column Mappings:\n{}\n\n", "=".repeat(50));
        for mapping in self.mappings.snapshot() {
            text.push_str(&format!("Destination: {}\n", mapping.destination));
            text.push_str(&format!("Source: {}\n", mapping.source));
            if self
                .source_table()
                .is_some_and(|table| table.has_column(&mapping.source))
            {
                let sample = self.preview_with(&mapping.source, self.config.preview_samples);
                text.push_str(&format!("Sample Data: {sample}\n"));
            }
            text.push('\n');
        }
        text
    }

    /// Runs the transfer without writing anything.
    pub fn transfer(&self) -> MapperResult<TransferOutcome> {
        let (source, destination) = self.loaded_pair()?;
        transfer::run_transfer(&self.mappings, &source.table, &destination.table)
    }

    /// `<destination stem>_updated.xlsx` beside the destination file.
    pub fn default_output_path(&self) -> Option<PathBuf> {
        let destination = self.destination.as_ref()?;
        let stem = destination
            .path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        Some(destination.path.with_file_name(format!("{stem}_updated.xlsx")))
    }

    pub fn commit(&mut self, output_path: &Path) -> MapperResult<CommitOutcome> {
        let outcome = self.transfer()?;
        export::save_table(&outcome.table, output_path, self.load_options.delimiter)?;

        let (source, destination) = self.loaded_pair()?;
        let history_warning = match self.ledger.append(
            &self.mappings.snapshot(),
            &source.path,
            &destination.path,
            output_path,
        ) {
            Ok(_) => None,
            Err(err) => {
                warn!("Could not save mapping history: {err}");
                Some(err)
            }
        };
        self.usage.record_transfer(self.mappings.len());

        info!(
            "Data copied successfully to {:?} ({} column(s))",
            output_path,
            outcome.copied.len()
        );
        Ok(CommitOutcome {
            output_path: output_path.to_path_buf(),
            row_count: outcome.table.row_count(),
            copied: outcome.copied,
            skipped: outcome.skipped,
            history_warning,
        })
    }

    pub fn list_history_sessions(&self) -> MapperResult<Vec<Session>> {
        self.ledger.load_history()
    }

    /// Replaces every mapping with the session's pairs, or changes nothing when
    /// the session references columns the loaded tables lack. Returns the
    /// number of mappings now held; a destination repeated in the session
    /// keeps its last pair.
    pub fn apply_session(&mut self, session: &Session) -> MapperResult<usize> {
        self.ensure_loaded()?;
        let batch = replay::check_session(
            session,
            self.mappings.source_columns(),
            self.mappings.destination_columns(),
        )?;
        self.mappings.replace_all(batch)?;
        let count = self.mappings.len();
        info!("Loaded {count} column mappings from history");
        Ok(count)
    }

    fn ensure_loaded(&self) -> MapperResult<()> {
        self.loaded_pair().map(|_| ())
    }

    fn loaded_pair(&self) -> MapperResult<(&LoadedTable, &LoadedTable)> {
        match (&self.source, &self.destination) {
            (Some(source), Some(destination)) => Ok((source, destination)),
            _ => Err(MapperError::TablesNotLoaded),
        }
    }
}
