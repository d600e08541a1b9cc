//! JSON report writer
//!
//! Serializes the full chart bundle, identical to the `/api/charts`
//! payload, so a saved report can be replayed through any consumer of the
//! API format.

use crate::chart::ChartBundle;
use std::io::{self, Write};

pub fn write<W: Write>(writer: &mut W, bundle: &ChartBundle) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, bundle)?;
    writer.write_all(b"\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::DurationUnit;
    use crate::pipeline::Pipeline;

    #[test]
    fn test_bundle_serializes_with_expected_top_level_keys() {
        let bundle = Pipeline::new().with_unit(DurationUnit::Days).run(&[]);
        let mut buf = Vec::new();
        write(&mut buf, &bundle).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        for key in ["unit", "pivot", "event_count", "timelines", "paretos", "waterfall", "events"] {
            assert!(value.get(key).is_some(), "missing key {}", key);
        }
        assert_eq!(value["unit"], "days");
        assert_eq!(value["timelines"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_waterfall_rows_expose_is_total_flag() {
        let bundle = Pipeline::new().run(&[]);
        let mut buf = Vec::new();
        write(&mut buf, &bundle).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        let table = value["waterfall"]["table"].as_array().unwrap();
        assert_eq!(table.len(), 5);
        assert_eq!(table.last().unwrap()["is_total"], true);
    }
}
