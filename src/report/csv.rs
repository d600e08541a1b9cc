//! CSV report writer
//!
//! Sections: the filtered-events table (same column names as the input
//! schema plus a Duration column), the two Pareto summaries and the
//! waterfall gap table including the flagged Total row.

use crate::chart::ChartBundle;
use csv::WriterBuilder;
use std::io::{self, Write};

pub fn write<W: Write>(writer: &mut W, bundle: &ChartBundle) -> io::Result<()> {
    // Sections have different widths; the writer must not enforce one.
    let mut w = WriterBuilder::new().flexible(true).from_writer(writer);
    write_sections(&mut w, bundle).map_err(io::Error::other)?;
    w.flush()
}

fn write_sections<W: Write>(w: &mut csv::Writer<W>, bundle: &ChartBundle) -> csv::Result<()> {
    let unit = bundle.unit.label();

    w.write_record([
        "Original Equipment".to_string(),
        "Reclassified Equipment".to_string(),
        "Original Category".to_string(),
        "Reclassified Category".to_string(),
        "Original Sub Category".to_string(),
        "Reclassified Sub Category".to_string(),
        "Original Reason".to_string(),
        "Reclassified Reason".to_string(),
        "Start Datetime".to_string(),
        "End Datetime".to_string(),
        "PLC Code".to_string(),
        format!("Duration ({})", unit),
    ])?;
    for e in &bundle.events {
        w.write_record([
            e.equipment_original.clone(),
            e.equipment_reclassified.clone(),
            e.category_original.clone(),
            e.category_reclassified.clone(),
            e.sub_category_original.clone(),
            e.sub_category_reclassified.clone(),
            e.reason_original.clone(),
            e.reason_reclassified.clone(),
            e.start.clone(),
            e.end.clone(),
            e.plc_code.clone(),
            format!("{:.4}", e.duration),
        ])?;
    }

    for pareto in &bundle.paretos {
        w.write_record(None::<&[u8]>)?;
        w.write_record([
            format!("Pareto ({})", pareto.field.label()),
            format!("Duration ({})", unit),
            "Cumulative %".to_string(),
        ])?;
        for i in 0..pareto.categories.len() {
            w.write_record([
                pareto.categories[i].clone(),
                format!("{:.4}", pareto.totals[i]),
                format!("{:.2}", pareto.cumulative_pct[i]),
            ])?;
        }
    }

    w.write_record(None::<&[u8]>)?;
    w.write_record([
        "Waterfall Gap".to_string(),
        format!("Original ({})", unit),
        format!("Reclassified ({})", unit),
        format!("Gap ({})", unit),
    ])?;
    for row in &bundle.waterfall.table {
        w.write_record([
            row.category.to_string(),
            format!("{:.4}", row.original),
            format!("{:.4}", row.reclassified),
            format!("{:.4}", row.gap),
        ])?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Category, DurationUnit, Event};
    use crate::pipeline::Pipeline;
    use chrono::NaiveDate;

    fn bundle() -> ChartBundle {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap();
        let events = vec![Event {
            equipment_original: "Filler 1".to_string(),
            equipment_reclassified: "Filler 1".to_string(),
            category_original: Category::ProductionTime,
            category_reclassified: Category::UnplannedStoppages,
            sub_category_original: "Run".to_string(),
            sub_category_reclassified: "Jam".to_string(),
            reason_original: String::new(),
            reason_reclassified: "Sensor fault".to_string(),
            plc_code: "PLC-9".to_string(),
            start,
            end: start + chrono::Duration::hours(2),
        }];
        Pipeline::new().with_unit(DurationUnit::Hours).run(&events)
    }

    #[test]
    fn test_event_row_serialized_with_duration_column() {
        let mut buf = Vec::new();
        write(&mut buf, &bundle()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Duration (Hours)"));
        assert!(text.contains("Filler 1"));
        assert!(text.contains("2.0000"));
    }

    #[test]
    fn test_waterfall_section_includes_total_row() {
        let mut buf = Vec::new();
        write(&mut buf, &bundle()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let waterfall_section = text.split("Waterfall Gap").nth(1).unwrap();
        assert!(waterfall_section.contains("Total"));
        assert!(waterfall_section.contains("Production Time"));
    }

    #[test]
    fn test_both_pareto_pivots_present() {
        let mut buf = Vec::new();
        write(&mut buf, &bundle()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Pareto (Original)"));
        assert!(text.contains("Pareto (Reclassified)"));
    }
}
