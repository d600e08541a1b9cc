//! Report generation for chart bundles
//!
//! Two formats, picked by file extension:
//!
//! - **JSON**: the full chart bundle, machine-readable, the same payload
//!   the `/api/charts` endpoint serves.
//! - **CSV**: the filtered-events table followed by the Pareto and
//!   waterfall summaries, for spreadsheet follow-up work.
//!
//! # Usage
//!
//! ```ignore
//! use stoppalot::report;
//!
//! report::generate("shift_report.json", &bundle)?;  // JSON
//! report::generate("shift_report.csv", &bundle)?;   // CSV (default)
//! ```

pub mod csv;
pub mod json;

use crate::chart::ChartBundle;
use std::io;
use std::path::Path;

/// Write a report in the format implied by the file extension.
pub fn generate<P: AsRef<Path>>(path: P, bundle: &ChartBundle) -> io::Result<()> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let mut file = std::fs::File::create(path)?;

    match ext.as_str() {
        "json" => json::write(&mut file, bundle),
        _ => csv::write(&mut file, bundle),
    }
}
