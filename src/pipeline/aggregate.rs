//! Duration aggregation: Pareto totals and the reclassification gap
//!
//! Two aggregates are derived from the filtered event set:
//!
//! 1. **Pareto**: total duration per category, sorted descending, with a
//!    running cumulative percentage. The classic "which 20% of stoppage
//!    categories cause 80% of the lost time" view.
//! 2. **Waterfall/gap**: per-category difference between the reclassified
//!    and original totals. A positive gap means operators moved time INTO
//!    that category when correcting the automatic classification.
//!
//! The waterfall always aligns on the canonical four-category order and
//! zero-fills categories absent from the filtered set, so the gap is defined
//! for all four regardless of what survived the filter. The appended Total
//! row carries an explicit `is_total` flag; consumers must exclude it from
//! the bar series and show it only in the tabular summary.

use crate::event::{Category, DurationUnit, Event, Field, CANONICAL_CATEGORIES};
use serde::Serialize;
use std::collections::HashMap;

/// One Pareto bucket: a category's summed duration in the selected unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParetoRow {
    pub category: Category,
    pub total: f64,
    /// Cumulative share of the grand total, 0-100.
    pub cumulative_pct: f64,
}

/// Group by the selected category pivot, sum durations, sort descending and
/// accumulate percentages. An empty filtered set yields an empty series;
/// the division by the grand total is guarded.
pub fn pareto(events: &[&Event], field: Field, unit: DurationUnit) -> Vec<ParetoRow> {
    let mut totals: Vec<(Category, f64)> = Vec::new();
    let mut index: HashMap<Category, usize> = HashMap::new();

    // First-seen order is kept for equal sums (stable sort below).
    for event in events {
        let cat = event.category(field);
        let secs = event.duration_secs();
        match index.get(cat) {
            Some(&i) => totals[i].1 += secs,
            None => {
                index.insert(cat.clone(), totals.len());
                totals.push((cat.clone(), secs));
            }
        }
    }

    let grand_total: f64 = totals.iter().map(|(_, d)| d).sum();
    if grand_total <= 0.0 {
        return Vec::new();
    }

    totals.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut running = 0.0;
    totals
        .into_iter()
        .map(|(category, secs)| {
            running += secs;
            ParetoRow {
                category,
                total: unit.convert(secs),
                cumulative_pct: 100.0 * running / grand_total,
            }
        })
        .collect()
}

/// One waterfall row: original vs. reclassified total and their gap, in the
/// selected unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaterfallRow {
    pub category: Category,
    pub original: f64,
    pub reclassified: f64,
    /// `reclassified - original`. Positive: time was moved into this
    /// category during reclassification.
    pub gap: f64,
    /// Marks the appended Total row. Never inferred from the numbers.
    pub is_total: bool,
}

/// Aggregate the original and reclassified pivots independently, align both
/// on the canonical four categories (zero-filling absences), compute the
/// per-category gap, sort by gap descending and append the flagged Total
/// row. The Total row is always last and always present, even for an empty
/// input (all zeros).
pub fn waterfall(events: &[&Event], unit: DurationUnit) -> Vec<WaterfallRow> {
    let original = totals_by_category(events, Field::Original);
    let reclassified = totals_by_category(events, Field::Reclassified);

    let mut rows: Vec<WaterfallRow> = CANONICAL_CATEGORIES
        .iter()
        .map(|cat| {
            let orig = unit.convert(original.get(cat).copied().unwrap_or(0.0));
            let reclass = unit.convert(reclassified.get(cat).copied().unwrap_or(0.0));
            WaterfallRow {
                category: cat.clone(),
                original: orig,
                reclassified: reclass,
                gap: reclass - orig,
                is_total: false,
            }
        })
        .collect();

    rows.sort_by(|a, b| b.gap.partial_cmp(&a.gap).unwrap_or(std::cmp::Ordering::Equal));

    let total = WaterfallRow {
        category: Category::Other("Total".to_string()),
        original: rows.iter().map(|r| r.original).sum(),
        reclassified: rows.iter().map(|r| r.reclassified).sum(),
        gap: rows.iter().map(|r| r.gap).sum(),
        is_total: true,
    };
    rows.push(total);
    rows
}

fn totals_by_category(events: &[&Event], field: Field) -> HashMap<Category, f64> {
    let mut totals = HashMap::new();
    for event in events {
        *totals.entry(event.category(field).clone()).or_insert(0.0) += event.duration_secs();
    }
    totals
}
