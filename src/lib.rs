//! Stoppalot - Downtime reporting for manufacturing equipment
//!
//! Stoppalot turns an exported spreadsheet of equipment-state events into
//! the three standard downtime-review charts, comparing the line's automatic
//! classification ("Original") against the corrections operators applied
//! afterwards ("Reclassified").
//!
//! # Overview
//!
//! Every event is a time interval on a piece of equipment with two parallel
//! label sets. The pipeline filters events by category, equipment, and time
//! window, then derives:
//!
//! 1. **Timeline** ("Gantt"): continuous same-category runs merged into
//!    display segments, one lane per equipment, one chart per label set.
//! 2. **Pareto**: total duration per category, sorted descending with a
//!    cumulative-percentage curve, for each label set.
//! 3. **Waterfall/gap**: per-category difference between the reclassified
//!    and original totals, so a review meeting can see exactly where the
//!    automatic classification loses or invents time.
//!
//! # Quick Start
//!
//! ```no_run
//! use stoppalot::{loader, DurationUnit, Pipeline};
//!
//! let table = loader::load("downtime.csv")?;
//! let bundle = Pipeline::new()
//!     .with_unit(DurationUnit::Hours)
//!     .run(&table.events);
//!
//! for pareto in &bundle.paretos {
//!     println!("{}: {} categories", pareto.title, pareto.categories.len());
//! }
//! # Ok::<(), stoppalot::loader::LoadError>(())
//! ```
//!
//! # Guarantees
//!
//! - Filtering is conjunctive, and the equipment predicate requires BOTH
//!   label sets to be selected: a reassigned event never leaks into a
//!   partial per-machine view.
//! - The waterfall always aligns on the canonical four categories
//!   (zero-filling absences) and flags its Total row explicitly.
//! - Empty filter results produce empty charts, never errors.
//!
//! # Modules
//!
//! - [`loader`]: spreadsheet ingestion, validation, and the session cache
//! - [`filter`]: conjunctive predicates and window modes
//! - [`pipeline`]: segment merging, aggregation, and the parallel render
//! - [`chart`]: chart-ready series shaping
//! - [`report`]: CSV/JSON report writers
//! - [`serve`]: interactive browser dashboard

pub mod chart;
pub mod event;
pub mod filter;
pub mod loader;
pub mod pipeline;
pub mod report;
pub mod serve;

pub use chart::ChartBundle;
pub use event::{Category, DurationUnit, Event, Field, CANONICAL_CATEGORIES};
pub use filter::{FilterParams, Window};
pub use loader::{LoadError, LoadedTable, TableCache};
pub use pipeline::Pipeline;
