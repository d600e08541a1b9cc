//! The render pipeline
//!
//! One [`Pipeline`] run turns the loaded event table into a [`ChartBundle`]:
//!
//! ```text
//! events ─ filter ─┬─ merge per equipment ──→ timeline charts (×2 axes)
//!                  ├─ pareto aggregate ─────→ pareto charts (×2 pivots)
//!                  ├─ waterfall aggregate ──→ waterfall chart + table
//!                  └─ row shaping ──────────→ filtered-events table
//! ```
//!
//! The four chart families are independent read-only passes over the same
//! filtered slice, so they run concurrently on the rayon pool. The joins
//! wait on every branch; nothing is returned until all charts exist.

pub mod aggregate;
pub mod merge;

use crate::chart::{self, ChartBundle};
use crate::event::{DurationUnit, Event, Field};
use crate::filter::{self, FilterParams};

/// A configured render: filter parameters plus display settings.
///
/// ```no_run
/// use stoppalot::{loader, DurationUnit, Pipeline};
///
/// let table = loader::load("downtime.csv")?;
/// let bundle = Pipeline::new()
///     .with_unit(DurationUnit::Hours)
///     .run(&table.events);
/// println!("{} events after filtering", bundle.event_count);
/// # Ok::<(), stoppalot::loader::LoadError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    params: FilterParams,
    unit: DurationUnit,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(mut self, params: FilterParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_unit(mut self, unit: DurationUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Filter once, then prepare all chart families concurrently.
    pub fn run(&self, events: &[Event]) -> ChartBundle {
        let filtered = filter::filter(events, &self.params);
        let unit = self.unit;

        let ((timelines, paretos), (waterfall_rows, rows)) = rayon::join(
            || {
                rayon::join(
                    || {
                        vec![
                            chart::timeline(&filtered, Field::Original, unit),
                            chart::timeline(&filtered, Field::Reclassified, unit),
                        ]
                    },
                    || {
                        [Field::Original, Field::Reclassified]
                            .into_iter()
                            .map(|f| {
                                let agg = aggregate::pareto(&filtered, f, unit);
                                chart::pareto_chart(&agg, f, unit)
                            })
                            .collect::<Vec<_>>()
                    },
                )
            },
            || {
                rayon::join(
                    || aggregate::waterfall(&filtered, unit),
                    || chart::event_rows(&filtered, unit),
                )
            },
        );

        ChartBundle {
            unit,
            pivot: self.params.category_field,
            event_count: filtered.len(),
            timelines,
            paretos,
            waterfall: chart::waterfall_chart(waterfall_rows, unit),
            events: rows,
        }
    }
}
