//! Spreadsheet ingestion and normalization
//!
//! Reads the exported downtime spreadsheet (CSV, one header row) into typed
//! [`Event`] records. The loader is the only fallible stage of the pipeline:
//! a missing required column or an unparseable timestamp aborts the load and
//! surfaces to the operator. Everything downstream degrades gracefully
//! instead of failing.
//!
//! Rows where `End Datetime` precedes `Start Datetime` are dropped here and
//! counted; the count travels with the table so the UI can report how many
//! rows were discarded.
//!
//! The raw file bytes are hashed (SHA-256) on load; [`TableCache`] uses that
//! hash to hand back the already-parsed table when the file on disk hasn't
//! changed between renders.

use crate::event::{Category, Event};
use chrono::NaiveDateTime;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Required spreadsheet columns, in no particular order.
pub const REQUIRED_COLUMNS: [&str; 11] = [
    "Original Equipment",
    "Reclassified Equipment",
    "Original Category",
    "Reclassified Category",
    "Original Sub Category",
    "Reclassified Sub Category",
    "Original Reason",
    "Reclassified Reason",
    "Start Datetime",
    "End Datetime",
    "PLC Code",
];

/// Timestamp formats accepted in the datetime columns. Exports from
/// different line systems disagree on the separator and on whether seconds
/// are present.
const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read spreadsheet: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column '{name}'")]
    MissingColumn { name: String },

    #[error("row {row}: cannot parse '{value}' in column '{column}' as a timestamp")]
    BadTimestamp {
        row: usize,
        column: String,
        value: String,
    },
}

/// An immutable, loaded event table. Every render derives fresh filtered and
/// aggregated views from it; nothing downstream mutates it.
#[derive(Debug)]
pub struct LoadedTable {
    pub events: Vec<Event>,
    /// Rows discarded at normalization because `end < start`.
    pub dropped_rows: usize,
    /// SHA-256 of the raw file bytes, hex-encoded. Cache key.
    pub content_hash: String,
}

impl LoadedTable {
    /// Distinct equipment names across both label sets, sorted.
    pub fn equipment_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .events
            .iter()
            .flat_map(|e| {
                [
                    e.equipment_original.clone(),
                    e.equipment_reclassified.clone(),
                ]
            })
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Distinct category names across both label sets, sorted.
    pub fn category_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .events
            .iter()
            .flat_map(|e| {
                [
                    e.category_original.to_string(),
                    e.category_reclassified.to_string(),
                ]
            })
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Earliest start and latest end across the table, if non-empty.
    pub fn time_span(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let first = self.events.iter().map(|e| e.start).min()?;
        let last = self.events.iter().map(|e| e.end).max()?;
        Some((first, last))
    }
}

/// Load and normalize a spreadsheet from disk.
pub fn load<P: AsRef<Path>>(path: P) -> Result<LoadedTable, LoadError> {
    let bytes = std::fs::read(path)?;
    load_bytes(&bytes)
}

/// Load and normalize a spreadsheet from raw bytes.
pub fn load_bytes(bytes: &[u8]) -> Result<LoadedTable, LoadError> {
    let content_hash = hash_bytes(bytes);

    let mut reader = csv::Reader::from_reader(bytes);
    let headers = reader.headers()?.clone();

    // Validate the schema up front so the operator sees one clear error
    // instead of a per-row cascade.
    let mut index = [0usize; REQUIRED_COLUMNS.len()];
    for (slot, name) in index.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| LoadError::MissingColumn {
                name: name.to_string(),
            })?;
    }
    let col = |record: &csv::StringRecord, i: usize| -> String {
        record.get(index[i]).unwrap_or("").trim().to_string()
    };

    let mut events = Vec::new();
    let mut dropped_rows = 0usize;

    for (row_num, record) in reader.records().enumerate() {
        let record = record?;
        // Header is row 1; data starts at row 2.
        let row = row_num + 2;

        let start = parse_timestamp(&col(&record, 8), row, "Start Datetime")?;
        let end = parse_timestamp(&col(&record, 9), row, "End Datetime")?;

        if end < start {
            dropped_rows += 1;
            continue;
        }

        events.push(Event {
            equipment_original: col(&record, 0),
            equipment_reclassified: col(&record, 1),
            category_original: Category::parse(&col(&record, 2)),
            category_reclassified: Category::parse(&col(&record, 3)),
            sub_category_original: col(&record, 4),
            sub_category_reclassified: col(&record, 5),
            reason_original: col(&record, 6),
            reason_reclassified: col(&record, 7),
            plc_code: col(&record, 10),
            start,
            end,
        });
    }

    Ok(LoadedTable {
        events,
        dropped_rows,
        content_hash,
    })
}

fn parse_timestamp(value: &str, row: usize, column: &str) -> Result<NaiveDateTime, LoadError> {
    for fmt in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(ts);
        }
    }
    Err(LoadError::BadTimestamp {
        row,
        column: column.to_string(),
        value: value.to_string(),
    })
}

fn hash_bytes(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Session-scoped cache of the loaded table, keyed by content hash.
///
/// Replaces the kind of process-wide memoized loader a notebook-style
/// dashboard would use: the cache is owned by whoever serves the session and
/// invalidates itself whenever the file's bytes change.
#[derive(Default)]
pub struct TableCache {
    entry: Option<Arc<LoadedTable>>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached table if the file's content hash still matches,
    /// otherwise reload and replace the entry.
    pub fn get_or_load<P: AsRef<Path>>(&mut self, path: P) -> Result<Arc<LoadedTable>, LoadError> {
        let bytes = std::fs::read(path)?;
        let hash = hash_bytes(&bytes);

        if let Some(cached) = &self.entry {
            if cached.content_hash == hash {
                return Ok(Arc::clone(cached));
            }
        }

        let table = Arc::new(load_bytes(&bytes)?);
        self.entry = Some(Arc::clone(&table));
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Original Equipment,Reclassified Equipment,Original Category,Reclassified Category,Original Sub Category,Reclassified Sub Category,Original Reason,Reclassified Reason,Start Datetime,End Datetime,PLC Code";

    fn sheet(rows: &[&str]) -> Vec<u8> {
        let mut s = String::from(HEADER);
        for r in rows {
            s.push('\n');
            s.push_str(r);
        }
        s.into_bytes()
    }

    // ==========================================================================
    // SCHEMA VALIDATION TESTS
    // ==========================================================================
    //
    // A load error must name the offending column or cell so the operator can
    // fix the export rather than guess.
    // ==========================================================================

    #[test]
    fn test_missing_column_is_reported_by_name() {
        let bad = b"Original Equipment,Start Datetime,End Datetime\nA,2024-01-01 06:00:00,2024-01-01 07:00:00".to_vec();
        let err = load_bytes(&bad).unwrap_err();
        match err {
            LoadError::MissingColumn { name } => {
                assert_eq!(name, "Reclassified Equipment");
            }
            other => panic!("expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_timestamp_reports_row_and_value() {
        let bytes = sheet(&[
            "A,A,Production Time,Production Time,,,,,not-a-date,2024-01-01 07:00:00,P1",
        ]);
        let err = load_bytes(&bytes).unwrap_err();
        match err {
            LoadError::BadTimestamp { row, column, value } => {
                assert_eq!(row, 2);
                assert_eq!(column, "Start Datetime");
                assert_eq!(value, "not-a-date");
            }
            other => panic!("expected BadTimestamp, got {:?}", other),
        }
    }

    #[test]
    fn test_accepts_iso_t_separator_and_minute_precision() {
        let bytes = sheet(&[
            "A,A,Production Time,Production Time,,,,,2024-01-01T06:00,2024-01-01T07:30,P1",
        ]);
        let table = load_bytes(&bytes).unwrap();
        assert_eq!(table.events.len(), 1);
        assert_eq!(table.events[0].duration_secs(), 5400.0);
    }

    // ==========================================================================
    // NORMALIZATION TESTS
    // ==========================================================================

    #[test]
    fn test_inverted_interval_is_dropped_and_counted() {
        let bytes = sheet(&[
            "A,A,Production Time,Production Time,,,,,2024-01-01 08:00:00,2024-01-01 06:00:00,P1",
            "A,A,Production Time,Production Time,,,,,2024-01-01 06:00:00,2024-01-01 08:00:00,P1",
        ]);
        let table = load_bytes(&bytes).unwrap();
        assert_eq!(table.events.len(), 1);
        assert_eq!(table.dropped_rows, 1);
    }

    #[test]
    fn test_zero_length_interval_survives() {
        let bytes = sheet(&[
            "A,A,Production Time,Production Time,,,,,2024-01-01 06:00:00,2024-01-01 06:00:00,P1",
        ]);
        let table = load_bytes(&bytes).unwrap();
        assert_eq!(table.events.len(), 1);
        assert_eq!(table.dropped_rows, 0);
    }

    #[test]
    fn test_fields_are_carried_through() {
        let bytes = sheet(&[
            "Filler 1,Capper 2,Unplanned Stoppages,Planned Stoppages,Jam,Changeover,Sensor fault,Format change,2024-01-01 06:00:00,2024-01-01 06:10:00,PLC-42",
        ]);
        let table = load_bytes(&bytes).unwrap();
        let e = &table.events[0];
        assert_eq!(e.equipment_original, "Filler 1");
        assert_eq!(e.equipment_reclassified, "Capper 2");
        assert_eq!(e.sub_category_original, "Jam");
        assert_eq!(e.reason_reclassified, "Format change");
        assert_eq!(e.plc_code, "PLC-42");
    }

    #[test]
    fn test_empty_sheet_loads_as_empty_table() {
        let bytes = sheet(&[]);
        let table = load_bytes(&bytes).unwrap();
        assert!(table.events.is_empty());
        assert!(table.time_span().is_none());
        assert!(table.equipment_names().is_empty());
    }

    // ==========================================================================
    // TABLE METADATA TESTS
    // ==========================================================================

    #[test]
    fn test_equipment_names_cover_both_label_sets() {
        let bytes = sheet(&[
            "Filler 1,Capper 2,Production Time,Production Time,,,,,2024-01-01 06:00:00,2024-01-01 07:00:00,P1",
        ]);
        let table = load_bytes(&bytes).unwrap();
        assert_eq!(table.equipment_names(), vec!["Capper 2", "Filler 1"]);
    }

    #[test]
    fn test_time_span_covers_whole_table() {
        let bytes = sheet(&[
            "A,A,Production Time,Production Time,,,,,2024-01-01 06:00:00,2024-01-01 07:00:00,P1",
            "A,A,Not Occupied,Not Occupied,,,,,2024-01-02 06:00:00,2024-01-02 09:00:00,P1",
        ]);
        let table = load_bytes(&bytes).unwrap();
        let (first, last) = table.time_span().unwrap();
        assert_eq!(first.to_string(), "2024-01-01 06:00:00");
        assert_eq!(last.to_string(), "2024-01-02 09:00:00");
    }

    #[test]
    fn test_content_hash_differs_for_different_bytes() {
        let a = load_bytes(&sheet(&[
            "A,A,Production Time,Production Time,,,,,2024-01-01 06:00:00,2024-01-01 07:00:00,P1",
        ]))
        .unwrap();
        let b = load_bytes(&sheet(&[
            "B,B,Production Time,Production Time,,,,,2024-01-01 06:00:00,2024-01-01 07:00:00,P1",
        ]))
        .unwrap();
        assert_ne!(a.content_hash, b.content_hash);
        assert_eq!(a.content_hash.len(), 64);
    }
}
