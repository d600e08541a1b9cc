//! Core data model for equipment downtime events
//!
//! An [`Event`] is one row of the uploaded spreadsheet: a time interval on a
//! piece of equipment carrying two parallel sets of labels. The *original*
//! labels come from the line's automatic classification (PLC-driven), the
//! *reclassified* labels are the manual corrections an operator applied
//! afterwards. Every chart in stoppalot exists to compare those two label
//! sets.
//!
//! Categories are a closed four-state vocabulary:
//!
//! ```text
//! Category            | Meaning                        | Chart color
//! --------------------|--------------------------------|------------
//! Production Time     | Equipment producing            | green
//! Unplanned Stoppages | Breakdown, jam, starvation     | red
//! Not Occupied        | No order scheduled             | grey
//! Planned Stoppages   | Changeover, maintenance, break | yellow
//! ```
//!
//! Values outside the vocabulary still flow through the pipeline as their own
//! bucket (they get the fallback color), but the waterfall's canonical
//! reindex only aligns on the four states above.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

/// The four canonical equipment states, plus a bucket for anything else
/// found in the spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    ProductionTime,
    UnplannedStoppages,
    NotOccupied,
    PlannedStoppages,
    /// Out-of-vocabulary value, carried verbatim.
    Other(String),
}

/// Canonical display/reindex order for the four known states.
pub const CANONICAL_CATEGORIES: [Category; 4] = [
    Category::ProductionTime,
    Category::UnplannedStoppages,
    Category::NotOccupied,
    Category::PlannedStoppages,
];

/// Fallback color for out-of-vocabulary categories.
pub const FALLBACK_COLOR: &str = "blue";

impl Category {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "Production Time" => Category::ProductionTime,
            "Unplanned Stoppages" => Category::UnplannedStoppages,
            "Not Occupied" => Category::NotOccupied,
            "Planned Stoppages" => Category::PlannedStoppages,
            other => Category::Other(other.to_string()),
        }
    }

    /// Chart color for this category (original dashboard palette).
    pub fn color(&self) -> &str {
        match self {
            Category::ProductionTime => "green",
            Category::UnplannedStoppages => "red",
            Category::NotOccupied => "grey",
            Category::PlannedStoppages => "yellow",
            Category::Other(_) => FALLBACK_COLOR,
        }
    }

    pub fn is_canonical(&self) -> bool {
        !matches!(self, Category::Other(_))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::ProductionTime => write!(f, "Production Time"),
            Category::UnplannedStoppages => write!(f, "Unplanned Stoppages"),
            Category::NotOccupied => write!(f, "Not Occupied"),
            Category::PlannedStoppages => write!(f, "Planned Stoppages"),
            Category::Other(s) => write!(f, "{}", s),
        }
    }
}

impl Serialize for Category {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Which label set a pipeline stage reads: the automatic classification or
/// the operator's manual correction. A closed enum so an invalid pivot is
/// unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Original,
    Reclassified,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Field::Original => "Original",
            Field::Reclassified => "Reclassified",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Display unit for durations. Events always store seconds; conversion is a
/// presentation step applied uniformly across an aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    Seconds,
    Hours,
    Days,
}

impl Default for DurationUnit {
    fn default() -> Self {
        DurationUnit::Seconds
    }
}

impl DurationUnit {
    /// Multiplier from seconds to this unit.
    pub fn factor(&self) -> f64 {
        match self {
            DurationUnit::Seconds => 1.0,
            DurationUnit::Hours => 1.0 / 3600.0,
            DurationUnit::Days => 1.0 / 86400.0,
        }
    }

    pub fn convert(&self, seconds: f64) -> f64 {
        seconds * self.factor()
    }

    pub fn label(&self) -> &'static str {
        match self {
            DurationUnit::Seconds => "Seconds",
            DurationUnit::Hours => "Hours",
            DurationUnit::Days => "Days",
        }
    }
}

/// One normalized spreadsheet row.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub equipment_original: String,
    pub equipment_reclassified: String,
    pub category_original: Category,
    pub category_reclassified: Category,
    pub sub_category_original: String,
    pub sub_category_reclassified: String,
    pub reason_original: String,
    pub reason_reclassified: String,
    /// Opaque controller code, passed through unmodified.
    pub plc_code: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Event {
    /// Duration in seconds, recomputed on every call. Loader guarantees
    /// `end >= start`, so this is never negative.
    pub fn duration_secs(&self) -> f64 {
        (self.end - self.start).num_seconds() as f64
    }

    pub fn category(&self, field: Field) -> &Category {
        match field {
            Field::Original => &self.category_original,
            Field::Reclassified => &self.category_reclassified,
        }
    }

    pub fn equipment(&self, field: Field) -> &str {
        match field {
            Field::Original => &self.equipment_original,
            Field::Reclassified => &self.equipment_reclassified,
        }
    }

    pub fn sub_category(&self, field: Field) -> &str {
        match field {
            Field::Original => &self.sub_category_original,
            Field::Reclassified => &self.sub_category_reclassified,
        }
    }

    pub fn reason(&self, field: Field) -> &str {
        match field {
            Field::Original => &self.reason_original,
            Field::Reclassified => &self.reason_reclassified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn event(start: NaiveDateTime, end: NaiveDateTime) -> Event {
        Event {
            equipment_original: "Filler 1".to_string(),
            equipment_reclassified: "Filler 1".to_string(),
            category_original: Category::ProductionTime,
            category_reclassified: Category::UnplannedStoppages,
            sub_category_original: String::new(),
            sub_category_reclassified: String::new(),
            reason_original: String::new(),
            reason_reclassified: String::new(),
            plc_code: "PLC-17".to_string(),
            start,
            end,
        }
    }

    // ==========================================================================
    // CATEGORY VOCABULARY TESTS
    // ==========================================================================

    #[test]
    fn test_parse_canonical_categories() {
        assert_eq!(Category::parse("Production Time"), Category::ProductionTime);
        assert_eq!(
            Category::parse("Unplanned Stoppages"),
            Category::UnplannedStoppages
        );
        assert_eq!(Category::parse("Not Occupied"), Category::NotOccupied);
        assert_eq!(
            Category::parse("Planned Stoppages"),
            Category::PlannedStoppages
        );
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert_eq!(Category::parse(" Production Time "), Category::ProductionTime);
    }

    #[test]
    fn test_unknown_category_becomes_own_bucket() {
        let cat = Category::parse("Micro Stops");
        assert_eq!(cat, Category::Other("Micro Stops".to_string()));
        assert!(!cat.is_canonical());
        assert_eq!(cat.color(), FALLBACK_COLOR);
    }

    #[test]
    fn test_category_colors_match_palette() {
        assert_eq!(Category::ProductionTime.color(), "green");
        assert_eq!(Category::UnplannedStoppages.color(), "red");
        assert_eq!(Category::NotOccupied.color(), "grey");
        assert_eq!(Category::PlannedStoppages.color(), "yellow");
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for cat in CANONICAL_CATEGORIES {
            assert_eq!(Category::parse(&cat.to_string()), cat);
        }
    }

    // ==========================================================================
    // DURATION UNIT TESTS
    // ==========================================================================

    #[test]
    fn test_unit_factors() {
        assert_eq!(DurationUnit::Seconds.factor(), 1.0);
        assert_eq!(DurationUnit::Hours.convert(3600.0), 1.0);
        assert_eq!(DurationUnit::Days.convert(86400.0), 1.0);
    }

    #[test]
    fn test_hours_round_trip_within_tolerance() {
        let seconds = 12345.0;
        let back = DurationUnit::Hours.convert(seconds) * 3600.0;
        assert!((back - seconds).abs() < 1e-9);
    }

    // ==========================================================================
    // EVENT ACCESSOR TESTS
    // ==========================================================================

    #[test]
    fn test_duration_is_recomputed_from_timestamps() {
        let e = event(ts(6, 0), ts(8, 0));
        assert_eq!(e.duration_secs(), 7200.0);
    }

    #[test]
    fn test_zero_length_event_has_zero_duration() {
        let e = event(ts(6, 0), ts(6, 0));
        assert_eq!(e.duration_secs(), 0.0);
    }

    #[test]
    fn test_field_pivot_selects_label_set() {
        let e = event(ts(6, 0), ts(7, 0));
        assert_eq!(*e.category(Field::Original), Category::ProductionTime);
        assert_eq!(
            *e.category(Field::Reclassified),
            Category::UnplannedStoppages
        );
        assert_eq!(e.equipment(Field::Original), "Filler 1");
    }
}
