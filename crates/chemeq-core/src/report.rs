//! Plain-text reports and dataset exports for a stored upload.
//!
//! Everything here reads an [`Upload`] as stored; nothing is recomputed.

use core::fmt;
use core::str::FromStr;

use tabled::builder::Builder;
use tabled::settings::Style;
use time::OffsetDateTime;
use time::macros::format_description;

use chemeq_types::{Field, Upload};

use crate::error::ExportError;

/// Number of equipment rows included in a text report.
pub const REPORT_ROW_LIMIT: usize = 20;

const REPORT_TITLE: &str = "Chemical Equipment Report";

/// Render a text report stamped with the current time.
pub fn render_text_report(upload: &Upload) -> String {
    render_text_report_at(upload, OffsetDateTime::now_utc())
}

/// Render a text report with an explicit generation time.
pub fn render_text_report_at(upload: &Upload, generated_at: OffsetDateTime) -> String {
    let agg = upload.aggregates.rounded(2);
    let mut output = String::new();

    output.push_str(&format!("{}\n{}\n\n", REPORT_TITLE, "=".repeat(REPORT_TITLE.len())));
    output.push_str(&format!("File:        {}\n", upload.filename));
    output.push_str(&format!("Upload ID:   {}\n", upload.id));
    output.push_str(&format!("Uploaded:    {}\n", format_time(upload.created_at)));
    output.push_str(&format!("Generated:   {}\n", format_time(generated_at)));
    output.push_str(&format!("Total Count: {}\n\n", agg.count));

    section(&mut output, "Summary Statistics");
    let mut summary = Builder::default();
    summary.push_record(["Metric", "Value"]);
    summary.push_record(["Total Count".to_string(), agg.count.to_string()]);
    summary.push_record(metric_row("Avg Flowrate", agg.avg_flowrate, Field::Flowrate));
    summary.push_record(metric_row("Avg Pressure", agg.avg_pressure, Field::Pressure));
    summary.push_record(metric_row("Avg Temperature", agg.avg_temperature, Field::Temperature));
    output.push_str(&render_table(summary));
    output.push('\n');

    section(&mut output, "Type Distribution");
    let mut distribution = Builder::default();
    distribution.push_record(["Type", "Count"]);
    for (category, count) in &agg.category_counts {
        distribution.push_record([category.clone(), count.to_string()]);
    }
    output.push_str(&render_table(distribution));
    output.push('\n');

    let shown = upload.records.len().min(REPORT_ROW_LIMIT);
    section(
        &mut output,
        &format!("Equipment Data (first {} of {})", shown, upload.records.len()),
    );
    let mut data = Builder::default();
    data.push_record(Field::ALL.iter().map(|f| match f.unit() {
        Some(unit) => format!("{} ({})", f.header(), unit),
        None => f.header().to_string(),
    }));
    for r in upload.records.iter().take(REPORT_ROW_LIMIT) {
        data.push_record([
            r.name.clone(),
            r.category.clone(),
            format!("{:.1}", r.flowrate),
            format!("{:.1}", r.pressure),
            format!("{:.1}", r.temperature),
        ]);
    }
    output.push_str(&render_table(data));

    output
}

fn metric_row(label: &str, value: f64, field: Field) -> [String; 2] {
    let unit = field.unit().unwrap_or_default();
    [label.to_string(), format!("{:.2} {}", value, unit)]
}

fn section(output: &mut String, title: &str) {
    output.push_str(&format!("{}\n{}\n", title, "-".repeat(title.chars().count())));
}

fn render_table(builder: Builder) -> String {
    let mut table = builder.build();
    table.with(Style::psql());
    format!("{}\n", table)
}

fn format_time(at: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second] UTC");
    at.to_offset(time::UtcOffset::UTC)
        .format(format)
        .unwrap_or_else(|_| at.to_string())
}

/// Export file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    /// MIME type for HTTP responses.
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Json => "application/json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(ExportError::UnknownFormat(s.to_string())),
        }
    }
}

/// Export an upload in the given format.
pub fn export(upload: &Upload, format: ExportFormat) -> Result<Vec<u8>, ExportError> {
    match format {
        ExportFormat::Csv => export_csv(upload),
        ExportFormat::Json => export_json(upload),
    }
}

/// Records as CSV with canonical headers, in dataset order.
pub fn export_csv(upload: &Upload) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(Field::ALL.iter().map(|f| f.header()))?;
    for record in &upload.records {
        writer.write_record(&[
            record.name.clone(),
            record.category.clone(),
            record.flowrate.to_string(),
            record.pressure.to_string(),
            record.temperature.to_string(),
        ])?;
    }
    writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))
}

/// The upload document as pretty-printed JSON.
pub fn export_json(upload: &Upload) -> Result<Vec<u8>, ExportError> {
    Ok(serde_json::to_vec_pretty(upload)?)
}

/// Suggested download name, e.g. `plant_ds_20250115_103000_ab12cd34.csv`.
pub fn export_filename(upload: &Upload, extension: &str) -> String {
    let stem = std::path::Path::new(&upload.filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("dataset");
    let stem: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("{}_{}.{}", stem, upload.id, extension)
}
