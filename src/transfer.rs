//! Materialises a mapping into a new output table.
//!
//! The output starts as a copy of the destination table. Each mapped
//! destination column is overwritten, row for row, with its source column.
//! When a source column is taller than the output built so far, the output
//! grows by null rows first; growth is measured against the running height,
//! so successive mappings only ever add what is still missing.

use log::{debug, info};

use crate::{
    error::{MapperError, MapperResult},
    frame::Table,
    mapping::{Mapping, MappingStore},
};

#[derive(Debug, Clone)]
pub struct TransferOutcome {
    pub table: Table,
    pub copied: Vec<Mapping>,
    /// Mappings whose source column no longer exists in the source table.
    pub skipped: Vec<Mapping>,
}

pub fn apply_mappings(
    mappings: &MappingStore,
    source: &Table,
    destination: &Table,
) -> MapperResult<Table> {
    run_transfer(mappings, source, destination).map(|outcome| outcome.table)
}

pub fn run_transfer(
    mappings: &MappingStore,
    source: &Table,
    destination: &Table,
) -> MapperResult<TransferOutcome> {
    if mappings.is_empty() {
        return Err(MapperError::EmptyMapping);
    }

    let mut result = destination.clone();
    let mut copied = Vec::with_capacity(mappings.len());
    let mut skipped = Vec::new();

    for mapping in mappings.snapshot() {
        let Some(values) = source.column(&mapping.source) else {
            debug!(
                "Skipping '{}' <- '{}': source column not present",
                mapping.destination, mapping.source
            );
            skipped.push(mapping);
            continue;
        };

        if values.len() > result.row_count() {
            let additional = values.len() - result.row_count();
            debug!("Growing output by {additional} row(s) for '{}'", mapping.source);
            result.grow(additional);
        }

        let index = result.ensure_column(&mapping.destination);
        result.overwrite_prefix(index, values);
        debug!("Copied '{}' <- '{}'", mapping.destination, mapping.source);
        copied.push(mapping);
    }

    info!(
        "Transferred {} column(s) into {} row(s)",
        copied.len(),
        result.row_count()
    );
    Ok(TransferOutcome {
        table: result,
        copied,
        skipped,
    })
}
