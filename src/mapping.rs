//! The mutable destination → source correspondence.
//!
//! [`MappingStore`] is a partial function from destination column names to
//! source column names, validated against the column lists of the currently
//! loaded tables. A destination maps to at most one source; several
//! destinations may share a source. Every mutation queues a
//! [`MappingEvent`] so a front end can refresh exactly the rows that changed.

use std::collections::HashMap;

use log::debug;

use crate::{
    error::{MapperError, MapperResult},
    replay,
};

/// Placeholder shown by selection widgets when no source is chosen.
pub const UNSELECTED: &str = "-- Select Source Column --";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mapping {
    pub destination: String,
    pub source: String,
}

impl Mapping {
    pub fn new(destination: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            source: source.into(),
        }
    }
}

/// A source choice: either a real column or the "nothing selected" sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSelection {
    Unselected,
    Column(String),
}

impl From<&str> for SourceSelection {
    fn from(value: &str) -> Self {
        if value == UNSELECTED {
            SourceSelection::Unselected
        } else {
            SourceSelection::Column(value.to_string())
        }
    }
}

impl From<String> for SourceSelection {
    fn from(value: String) -> Self {
        SourceSelection::from(value.as_str())
    }
}

impl From<Option<String>> for SourceSelection {
    fn from(value: Option<String>) -> Self {
        value.map(SourceSelection::from).unwrap_or(SourceSelection::Unselected)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingEvent {
    Changed {
        destination: String,
        previous: Option<String>,
        current: Option<String>,
    },
    /// Emitted once after the per-entry `Changed` events of a clear.
    Cleared { removed: usize },
}

#[derive(Debug, Clone, Default)]
pub struct MappingStore {
    source_columns: Vec<String>,
    destination_columns: Vec<String>,
    entries: HashMap<String, String>,
    events: Vec<MappingEvent>,
}

impl MappingStore {
    pub fn new(source_columns: Vec<String>, destination_columns: Vec<String>) -> Self {
        Self {
            source_columns,
            destination_columns,
            entries: HashMap::new(),
            events: Vec::new(),
        }
    }

    /// Replaces the known column lists and drops every mapping without emitting events.
    pub fn reset(&mut self, source_columns: Vec<String>, destination_columns: Vec<String>) {
        self.source_columns = source_columns;
        self.destination_columns = destination_columns;
        self.entries.clear();
        self.events.clear();
    }

    pub fn source_columns(&self) -> &[String] {
        &self.source_columns
    }

    pub fn destination_columns(&self) -> &[String] {
        &self.destination_columns
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, destination: &str) -> Option<&str> {
        self.entries.get(destination).map(String::as_str)
    }

    pub fn set(&mut self, destination: &str, source: impl Into<SourceSelection>) -> MapperResult<()> {
        if !self.is_destination(destination) {
            return Err(MapperError::UnknownDestination(destination.to_string()));
        }
        let source = match source.into() {
            SourceSelection::Unselected => {
                self.unset(destination);
                return Ok(());
            }
            SourceSelection::Column(source) => source,
        };
        if !self.is_source(&source) {
            return Err(MapperError::UnknownSource(source));
        }

        debug!("Mapping '{destination}' <- '{source}'");
        let previous = self.entries.insert(destination.to_string(), source.clone());
        self.events.push(MappingEvent::Changed {
            destination: destination.to_string(),
            previous,
            current: Some(source),
        });
        Ok(())
    }

    /// Removing a destination that has no mapping is not an error.
    pub fn unset(&mut self, destination: &str) {
        if let Some(previous) = self.entries.remove(destination) {
            debug!("Unmapping '{destination}' (was '{previous}')");
            self.events.push(MappingEvent::Changed {
                destination: destination.to_string(),
                previous: Some(previous),
                current: None,
            });
        }
    }

    pub fn clear(&mut self) {
        let removed = self.snapshot();
        self.entries.clear();
        for mapping in &removed {
            self.events.push(MappingEvent::Changed {
                destination: mapping.destination.clone(),
                previous: Some(mapping.source.clone()),
                current: None,
            });
        }
        self.events.push(MappingEvent::Cleared {
            removed: removed.len(),
        });
    }

    /// Clears and installs `pairs`, or changes nothing if any pair names an unknown column.
    pub fn replace_all<I>(&mut self, pairs: I) -> MapperResult<()>
    where
        I: IntoIterator<Item = Mapping>,
    {
        let pairs = pairs.into_iter().collect::<Vec<_>>();
        let missing =
            replay::missing_columns(&pairs, &self.source_columns, &self.destination_columns);
        if !missing.is_empty() {
            return Err(MapperError::IncompatibleSession(missing));
        }

        self.clear();
        for mapping in pairs {
            self.set(&mapping.destination, SourceSelection::Column(mapping.source))?;
        }
        Ok(())
    }

    /// Current mappings ordered by destination column position.
    pub fn snapshot(&self) -> Vec<Mapping> {
        let mut seen = Vec::with_capacity(self.entries.len());
        for destination in &self.destination_columns {
            if let Some(source) = self.entries.get(destination)
                && !seen.iter().any(|m: &Mapping| &m.destination == destination)
            {
                seen.push(Mapping::new(destination.clone(), source.clone()));
            }
        }
        seen
    }

    pub fn is_source_mapped(&self, source: &str) -> bool {
        self.entries.values().any(|mapped| mapped == source)
    }

    /// Destinations currently fed by `source`, in destination column order.
    pub fn destinations_for(&self, source: &str) -> Vec<String> {
        self.snapshot()
            .into_iter()
            .filter(|mapping| mapping.source == source)
            .map(|mapping| mapping.destination)
            .collect()
    }

    pub fn drain_events(&mut self) -> Vec<MappingEvent> {
        std::mem::take(&mut self.events)
    }

    fn is_destination(&self, name: &str) -> bool {
        self.destination_columns.iter().any(|column| column == name)
    }

    fn is_source(&self, name: &str) -> bool {
        self.source_columns.iter().any(|column| column == name)
    }
}
