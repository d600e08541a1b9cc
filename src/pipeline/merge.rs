//! Timeline segment merging
//!
//! The timeline view draws one horizontal bar per continuous run of the same
//! category. Raw events are much finer than that: a PLC can log dozens of
//! back-to-back rows for what an operator sees as one stoppage, so this pass
//! coalesces temporally-adjacent same-category events into display segments.
//!
//! The merge is a greedy single pass over events sorted by start time. A new
//! segment opens whenever the category changes or a visible gap appears
//! (event starts after the running segment's current end); otherwise the
//! running segment's end is extended to cover the event. Overlapping
//! same-category events therefore collapse into one bar.

use crate::event::{Category, Event, Field};
use chrono::NaiveDateTime;
use serde::Serialize;

/// One merged, continuous display bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub category: Category,
    pub color: String,
}

impl Segment {
    fn open(event: &Event, field: Field) -> Self {
        let category = event.category(field).clone();
        let color = category.color().to_string();
        Segment {
            start: event.start,
            end: event.end,
            category,
            color,
        }
    }
}

/// Merge filtered events into timeline segments, reading the category
/// through `field`. Sorts by start time first (stable, so equal starts keep
/// input order). Empty input yields no segments.
pub fn merge(events: &[&Event], field: Field) -> Vec<Segment> {
    let mut sorted: Vec<&Event> = events.to_vec();
    sorted.sort_by_key(|e| e.start);

    let mut segments: Vec<Segment> = Vec::new();
    let mut current: Option<Segment> = None;

    for event in sorted {
        current = Some(match current.take() {
            Some(mut seg) if *event.category(field) == seg.category && event.start <= seg.end => {
                seg.end = seg.end.max(event.end);
                seg
            }
            Some(seg) => {
                segments.push(seg);
                Segment::open(event, field)
            }
            None => Segment::open(event, field),
        });
    }
    if let Some(seg) = current {
        segments.push(seg);
    }
    segments
}
