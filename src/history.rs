//! Durable log of completed transfers and the sessions they form.
//!
//! The log is a single CSV file with the header
//! `Timestamp,Source_File,Destination_File,Output_File,Source_Column,Destination_Column`
//! and one row per mapped column per transfer. Sessions are not stored
//! explicitly: every row sharing the same timestamp and three file names
//! belongs to one session, so two transfers finishing in the same second
//! against identically named files read back as a single session.
//!
//! Appending rewrites the whole file (read, concatenate, write to a sibling
//! temp file, rename). The ledger assumes a single writer.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    error::{MapperError, MapperResult},
    io_utils,
    mapping::Mapping,
};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "Source_File")]
    pub source_file: String,
    #[serde(rename = "Destination_File")]
    pub destination_file: String,
    #[serde(rename = "Output_File")]
    pub output_file: String,
    #[serde(rename = "Source_Column")]
    pub source_column: String,
    #[serde(rename = "Destination_Column")]
    pub destination_column: String,
}

impl HistoryRecord {
    pub fn session_key(&self) -> SessionKey {
        SessionKey {
            timestamp: self.timestamp.clone(),
            source_file: self.source_file.clone(),
            destination_file: self.destination_file.clone(),
            output_file: self.output_file.clone(),
        }
    }

    pub fn mapping(&self) -> Mapping {
        Mapping::new(self.destination_column.clone(), self.source_column.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionKey {
    pub timestamp: String,
    pub source_file: String,
    pub destination_file: String,
    pub output_file: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    key: SessionKey,
    mappings: Vec<Mapping>,
}

impl Session {
    pub fn new(key: SessionKey, mappings: Vec<Mapping>) -> Self {
        Self { key, mappings }
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    pub fn count(&self) -> usize {
        self.mappings.len()
    }

    /// One `destination ← source` line per mapping.
    pub fn describe(&self) -> String {
        self.mappings
            .iter()
            .map(|m| format!("• {} ← {}", m.destination, m.source))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone)]
pub struct HistoryLedger {
    path: PathBuf,
}

impl HistoryLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All records in file order; a missing log reads as empty.
    pub fn records(&self) -> MapperResult<Vec<HistoryRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        read_records(&self.path).map_err(|err| MapperError::HistoryRead {
            path: self.path.clone(),
            source: err.into(),
        })
    }

    pub fn append(
        &self,
        mappings: &[Mapping],
        source_file: &Path,
        destination_file: &Path,
        output_file: &Path,
    ) -> MapperResult<usize> {
        let now = Local::now().naive_local();
        self.append_at(mappings, source_file, destination_file, output_file, now)
    }

    /// Appends one record per mapping, all stamped with `timestamp` (second precision).
    pub fn append_at(
        &self,
        mappings: &[Mapping],
        source_file: &Path,
        destination_file: &Path,
        output_file: &Path,
        timestamp: NaiveDateTime,
    ) -> MapperResult<usize> {
        if mappings.is_empty() {
            debug!("No mappings to record in {:?}", self.path);
            return Ok(0);
        }
        let stamp = timestamp.format(TIMESTAMP_FORMAT).to_string();
        let source_file = io_utils::display_name(source_file);
        let destination_file = io_utils::display_name(destination_file);
        let output_file = io_utils::display_name(output_file);
        let batch = mappings.iter().map(|mapping| HistoryRecord {
            timestamp: stamp.clone(),
            source_file: source_file.clone(),
            destination_file: destination_file.clone(),
            output_file: output_file.clone(),
            source_column: mapping.source.clone(),
            destination_column: mapping.destination.clone(),
        });

        let mut records = self.records().map_err(|err| MapperError::HistoryWrite {
            path: self.path.clone(),
            source: err.into(),
        })?;
        records.extend(batch);

        write_records(&self.path, &records).map_err(|err| MapperError::HistoryWrite {
            path: self.path.clone(),
            source: err.into(),
        })?;
        info!(
            "Recorded {} mapping(s) at {stamp} in {:?}",
            mappings.len(),
            self.path
        );
        Ok(mappings.len())
    }

    /// Sessions ordered by key (timestamp first); pairs keep log order.
    pub fn sessions(&self) -> MapperResult<Vec<Session>> {
        Ok(group_sessions(&self.records()?))
    }

    /// Like [`sessions`](Self::sessions) but a missing or empty log is [`MapperError::NoHistory`].
    pub fn load_history(&self) -> MapperResult<Vec<Session>> {
        if !self.path.exists() {
            return Err(MapperError::NoHistory);
        }
        let sessions = self.sessions()?;
        if sessions.is_empty() {
            return Err(MapperError::NoHistory);
        }
        Ok(sessions)
    }
}

pub fn group_sessions(records: &[HistoryRecord]) -> Vec<Session> {
    let mut grouped: BTreeMap<SessionKey, Vec<Mapping>> = BTreeMap::new();
    for record in records {
        grouped
            .entry(record.session_key())
            .or_default()
            .push(record.mapping());
    }
    grouped
        .into_iter()
        .map(|(key, mappings)| Session::new(key, mappings))
        .collect()
}

fn read_records(path: &Path) -> Result<Vec<HistoryRecord>> {
    let mut reader = io_utils::open_csv_reader_from_path(path, io_utils::DEFAULT_CSV_DELIMITER)?;
    let mut records = Vec::new();
    for (idx, record) in reader.deserialize::<HistoryRecord>().enumerate() {
        let record = record.with_context(|| format!("Reading history row {}", idx + 2))?;
        records.push(record);
    }
    Ok(records)
}

fn write_records(path: &Path, records: &[HistoryRecord]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Creating history directory {parent:?}"))?;
    }
    let staging = staging_path(path);
    let written = write_staging(&staging, records).and_then(|()| {
        fs::rename(&staging, path).with_context(|| format!("Replacing history file {path:?}"))
    });
    if written.is_err() && staging.exists() {
        let _ = fs::remove_file(&staging);
    }
    written
}

fn write_staging(staging: &Path, records: &[HistoryRecord]) -> Result<()> {
    let mut writer = io_utils::create_csv_writer(staging, io_utils::DEFAULT_CSV_DELIMITER)?;
    for record in records {
        writer
            .serialize(record)
            .with_context(|| format!("Writing history to {staging:?}"))?;
    }
    writer
        .flush()
        .with_context(|| format!("Flushing history to {staging:?}"))?;
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
