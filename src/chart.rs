//! Chart data assembly
//!
//! Shapes pipeline output into the serializable series the charting layer
//! (the embedded browser dashboard, or any other consumer of the JSON
//! bundle) draws directly. Everything here is parallel label/value vectors
//! and hover strings; no numeric computation happens in this module.

use crate::event::{DurationUnit, Event, Field};
use crate::pipeline::aggregate::{ParetoRow, WaterfallRow};
use crate::pipeline::merge::{self, Segment};
use serde::Serialize;
use std::collections::HashMap;

/// One equipment lane of a timeline chart.
#[derive(Debug, Clone, Serialize)]
pub struct TimelineLane {
    pub equipment: String,
    pub segments: Vec<SegmentBar>,
}

/// One merged bar on a timeline lane.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentBar {
    pub start: String,
    pub end: String,
    pub category: String,
    pub color: String,
    pub hover: String,
}

/// Timeline chart for one equipment-axis choice (original or reclassified
/// labels). Lanes are sorted by equipment name.
#[derive(Debug, Clone, Serialize)]
pub struct TimelineChart {
    pub field: Field,
    pub title: String,
    pub lanes: Vec<TimelineLane>,
}

/// Pareto combo chart: bars plus the cumulative-percentage line, as
/// parallel vectors indexed by category.
#[derive(Debug, Clone, Serialize)]
pub struct ParetoChart {
    pub field: Field,
    pub title: String,
    pub unit: DurationUnit,
    pub categories: Vec<String>,
    pub colors: Vec<String>,
    pub totals: Vec<f64>,
    pub cumulative_pct: Vec<f64>,
}

/// Waterfall chart plus its tabular summary. `categories`/`gaps` are the
/// bar series (Total row excluded); `table` carries every row including the
/// flagged Total for the summary shown beside the chart.
#[derive(Debug, Clone, Serialize)]
pub struct WaterfallChart {
    pub unit: DurationUnit,
    pub categories: Vec<String>,
    pub colors: Vec<String>,
    pub gaps: Vec<f64>,
    pub table: Vec<WaterfallRow>,
}

/// One row of the filtered-events data table, with the hover-annotation
/// fields the charts surface (sub-category, reason, duration, PLC code).
#[derive(Debug, Clone, Serialize)]
pub struct EventRow {
    pub equipment_original: String,
    pub equipment_reclassified: String,
    pub category_original: String,
    pub category_reclassified: String,
    pub sub_category_original: String,
    pub sub_category_reclassified: String,
    pub reason_original: String,
    pub reason_reclassified: String,
    pub plc_code: String,
    pub start: String,
    pub end: String,
    pub duration: f64,
}

/// Everything one render produces, ready to serialize.
#[derive(Debug, Clone, Serialize)]
pub struct ChartBundle {
    pub unit: DurationUnit,
    pub pivot: Field,
    pub event_count: usize,
    pub timelines: Vec<TimelineChart>,
    pub paretos: Vec<ParetoChart>,
    pub waterfall: WaterfallChart,
    pub events: Vec<EventRow>,
}

/// Build a timeline chart for one equipment-axis choice: group the filtered
/// events per equipment (read through `field`), merge each group into
/// display segments and annotate the bars.
pub fn timeline(events: &[&Event], field: Field, unit: DurationUnit) -> TimelineChart {
    let mut groups: HashMap<&str, Vec<&Event>> = HashMap::new();
    for &event in events {
        groups.entry(event.equipment(field)).or_default().push(event);
    }

    let mut lanes: Vec<TimelineLane> = groups
        .into_iter()
        .map(|(equipment, group)| TimelineLane {
            equipment: equipment.to_string(),
            segments: merge::merge(&group, field)
                .into_iter()
                .map(|seg| segment_bar(seg, unit))
                .collect(),
        })
        .collect();
    lanes.sort_by(|a, b| a.equipment.cmp(&b.equipment));

    TimelineChart {
        field,
        title: format!("Timeline ({} labels)", field.label()),
        lanes,
    }
}

fn segment_bar(seg: Segment, unit: DurationUnit) -> SegmentBar {
    let secs = (seg.end - seg.start).num_seconds() as f64;
    let hover = format!(
        "{}: {:.2} {}",
        seg.category,
        unit.convert(secs),
        unit.label()
    );
    SegmentBar {
        start: seg.start.to_string(),
        end: seg.end.to_string(),
        category: seg.category.to_string(),
        color: seg.color,
        hover,
    }
}

/// Shape a Pareto aggregate into parallel bar/line series.
pub fn pareto_chart(rows: &[ParetoRow], field: Field, unit: DurationUnit) -> ParetoChart {
    ParetoChart {
        field,
        title: format!("Pareto ({} category)", field.label()),
        unit,
        categories: rows.iter().map(|r| r.category.to_string()).collect(),
        colors: rows.iter().map(|r| r.category.color().to_string()).collect(),
        totals: rows.iter().map(|r| r.total).collect(),
        cumulative_pct: rows.iter().map(|r| r.cumulative_pct).collect(),
    }
}

/// Shape a waterfall aggregate: Total row stays in the table but is kept out
/// of the bar series.
pub fn waterfall_chart(rows: Vec<WaterfallRow>, unit: DurationUnit) -> WaterfallChart {
    let bars: Vec<&WaterfallRow> = rows.iter().filter(|r| !r.is_total).collect();
    WaterfallChart {
        unit,
        categories: bars.iter().map(|r| r.category.to_string()).collect(),
        colors: bars.iter().map(|r| r.category.color().to_string()).collect(),
        gaps: bars.iter().map(|r| r.gap).collect(),
        table: rows,
    }
}

/// Flatten filtered events into table rows with display-unit durations.
pub fn event_rows(events: &[&Event], unit: DurationUnit) -> Vec<EventRow> {
    events
        .iter()
        .map(|e| EventRow {
            equipment_original: e.equipment_original.clone(),
            equipment_reclassified: e.equipment_reclassified.clone(),
            category_original: e.category_original.to_string(),
            category_reclassified: e.category_reclassified.to_string(),
            sub_category_original: e.sub_category_original.clone(),
            sub_category_reclassified: e.sub_category_reclassified.clone(),
            reason_original: e.reason_original.clone(),
            reason_reclassified: e.reason_reclassified.clone(),
            plc_code: e.plc_code.clone(),
            start: e.start.to_string(),
            end: e.end.to_string(),
            duration: unit.convert(e.duration_secs()),
        })
        .collect()
}
