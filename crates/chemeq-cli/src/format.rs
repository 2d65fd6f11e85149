//! Text formatting for uploads and history.

use tabled::builder::Builder;
use tabled::settings::Style;
use time::format_description::well_known::Rfc3339;

use chemeq_types::{Aggregates, Upload, UploadSummary};

fn timestamp(at: time::OffsetDateTime) -> String {
    at.format(&Rfc3339).unwrap_or_else(|_| at.to_string())
}

fn categories(aggregates: &Aggregates) -> String {
    aggregates
        .category_counts
        .iter()
        .map(|(category, count)| format!("{}: {}", category, count))
        .collect::<Vec<_>>()
        .join(", ")
}

/// One block per upload, newest first.
pub fn format_history_text(uploads: &[UploadSummary]) -> String {
    if uploads.is_empty() {
        return "No uploads stored. Run 'chemeq ingest <file>' to add one.\n".to_string();
    }

    let mut output = String::new();
    for upload in uploads {
        let agg = upload.aggregates.rounded(2);
        output.push_str(&format!("{}  {}\n", upload.id, upload.filename));
        output.push_str(&format!("  Uploaded:    {}\n", timestamp(upload.created_at)));
        output.push_str(&format!("  Equipment:   {}\n", agg.count));
        output.push_str(&format!(
            "  Averages:    {:.2} m³/h, {:.2} bar, {:.2} °C\n",
            agg.avg_flowrate, agg.avg_pressure, agg.avg_temperature
        ));
        output.push_str(&format!("  Types:       {}\n", categories(&agg)));
    }
    output
}

/// Upload statistics followed by every record.
pub fn format_upload_text(upload: &Upload) -> String {
    let agg = upload.aggregates.rounded(2);
    let mut output = String::new();

    output.push_str(&format!("Upload:          {}\n", upload.id));
    output.push_str(&format!("File:            {}\n", upload.filename));
    output.push_str(&format!("Uploaded:        {}\n", timestamp(upload.created_at)));
    output.push_str(&format!("Equipment:       {}\n", agg.count));
    output.push_str(&format!("Avg Flowrate:    {:>10.2} m³/h\n", agg.avg_flowrate));
    output.push_str(&format!("Avg Pressure:    {:>10.2} bar\n", agg.avg_pressure));
    output.push_str(&format!("Avg Temperature: {:>10.2} °C\n", agg.avg_temperature));
    output.push_str(&format!("Types:           {}\n\n", categories(&agg)));

    let mut builder = Builder::default();
    builder.push_record(["Name", "Type", "Flowrate", "Pressure", "Temp"]);
    for record in &upload.records {
        builder.push_record([
            record.name.clone(),
            record.category.clone(),
            format!("{:.2}", record.flowrate),
            format!("{:.2}", record.pressure),
            format!("{:.2}", record.temperature),
        ]);
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    output.push_str(&table.to_string());
    output.push('\n');
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use chemeq_types::EquipmentRecord;
    use time::macros::datetime;

    fn upload() -> Upload {
        let records = vec![
            EquipmentRecord::new("R-1", "Reactor", 100.0, 50.0, 80.0),
            EquipmentRecord::new("P-1", "Pump", 60.0, 20.0, 30.0),
        ];
        Upload {
            id: "ds_20250115_103000_ab12cd34".to_string(),
            filename: "plant.csv".to_string(),
            created_at: datetime!(2025-01-15 10:30 UTC),
            aggregates: Aggregates {
                count: 2,
                avg_flowrate: 80.0,
                avg_pressure: 35.0,
                avg_temperature: 55.0,
                category_counts: [("Pump".to_string(), 1), ("Reactor".to_string(), 1)]
                    .into_iter()
                    .collect(),
            },
            records,
        }
    }

    #[test]
    fn test_history_empty() {
        assert!(format_history_text(&[]).contains("No uploads stored"));
    }

    #[test]
    fn test_history_lists_summary() {
        let text = format_history_text(&[upload().summary()]);
        assert!(text.starts_with("ds_20250115_103000_ab12cd34  plant.csv\n"));
        assert!(text.contains("2025-01-15T10:30:00Z"));
        assert!(text.contains("80.00 m³/h, 35.00 bar, 55.00 °C"));
        assert!(text.contains("Pump: 1, Reactor: 1"));
    }

    #[test]
    fn test_upload_lists_records() {
        let text = format_upload_text(&upload());
        assert!(text.contains("Equipment:       2"));
        assert!(text.contains("Reactor"));
        let row = text
            .lines()
            .find(|l| l.contains("P-1"))
            .unwrap_or_default();
        assert!(row.contains("Pump"));
        assert!(row.contains("60.00"));
        assert!(row.contains("20.00"));
    }
}
