//! Running usage counters persisted in the JSON settings file.
//!
//! The counters live under a `statistics` key next to a `last_updated`
//! stamp; other keys in the file are left untouched. Persistence problems
//! are logged and never interrupt the caller.

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

const STATISTICS_KEY: &str = "statistics";
const LAST_UPDATED_KEY: &str = "last_updated";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Counters {
    pub mappings_created: u64,
    pub files_processed: u64,
    pub total_columns_mapped: u64,
    pub sessions_completed: u64,
    pub last_activity: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UsageStatistics {
    path: PathBuf,
    counters: Counters,
}

impl UsageStatistics {
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let counters = match read_document(&path) {
            Ok(document) => document
                .get(STATISTICS_KEY)
                .cloned()
                .map(serde_json::from_value::<Counters>)
                .transpose()
                .unwrap_or_else(|err| {
                    warn!("Could not parse statistics in {path:?}: {err}");
                    None
                })
                .unwrap_or_default(),
            Err(err) => {
                warn!("Could not load statistics: {err:#}");
                Counters::default()
            }
        };
        Self { path, counters }
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn record_mapping_created(&mut self) {
        self.counters.mappings_created += 1;
        self.touch();
        self.persist();
    }

    pub fn record_transfer(&mut self, columns: usize) {
        self.counters.files_processed += 1;
        self.counters.total_columns_mapped += columns as u64;
        self.counters.sessions_completed += 1;
        self.touch();
        self.persist();
    }

    fn touch(&mut self) {
        self.counters.last_activity = Some(Local::now().naive_local().to_string());
    }

    fn persist(&self) {
        if let Err(err) = self.save() {
            warn!("Could not save statistics: {err:#}");
        }
    }

    fn save(&self) -> Result<()> {
        let mut document = read_document(&self.path).unwrap_or_default();
        document.insert(
            STATISTICS_KEY.to_string(),
            serde_json::to_value(&self.counters)?,
        );
        document.insert(
            LAST_UPDATED_KEY.to_string(),
            JsonValue::String(Local::now().naive_local().to_string()),
        );
        let rendered = serde_json::to_string_pretty(&JsonValue::Object(document))?;
        fs::write(&self.path, rendered)
            .with_context(|| format!("Writing statistics to {:?}", self.path))
    }
}

fn read_document(path: &std::path::Path) -> Result<Map<String, JsonValue>> {
    if !path.exists() {
        return Ok(Map::new());
    }
    let raw = fs::read_to_string(path).with_context(|| format!("Reading {path:?}"))?;
    match serde_json::from_str::<JsonValue>(&raw).with_context(|| format!("Parsing {path:?}"))? {
        JsonValue::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}
