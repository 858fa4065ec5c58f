use super::ExportError;
use crate::models::DailyLoadRecord;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Flat CSV row; an undefined ratio becomes an empty cell
#[derive(Debug, Serialize)]
struct SeriesRow {
    date: String,
    stress: f64,
    fitness: f64,
    fatigue: f64,
    form: f64,
    acr: Option<f64>,
}

impl From<&DailyLoadRecord> for SeriesRow {
    fn from(record: &DailyLoadRecord) -> Self {
        SeriesRow {
            date: record.date.format("%Y-%m-%d").to_string(),
            stress: record.stress,
            fitness: record.fitness,
            fatigue: record.fatigue,
            form: record.form,
            acr: record.acr,
        }
    }
}

/// Write the load series as CSV (suitable for spreadsheet plotting)
pub fn write_series<W: Write>(records: &[DailyLoadRecord], writer: W) -> Result<(), ExportError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    // Header is written explicitly so an empty series still has one
    csv_writer.write_record(["date", "stress", "fitness", "fatigue", "form", "acr"])?;
    for record in records {
        csv_writer.serialize(SeriesRow::from(record))?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Write the load series to a CSV file
pub fn export_series<P: AsRef<Path>>(records: &[DailyLoadRecord], output_path: P) -> Result<(), ExportError> {
    let file = File::create(output_path)?;
    write_series(records, file)
}

pub fn series_to_csv_string(records: &[DailyLoadRecord]) -> Result<String, ExportError> {
    let mut buffer = Vec::new();
    write_series(records, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| ExportError::SerializationError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::tests::sample_records;

    #[test]
    fn test_csv_layout() {
        let csv = series_to_csv_string(&sample_records()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "date,stress,fitness,fatigue,form,acr");
        assert_eq!(lines[1], "2026-01-01,50.0,1.19,7.14,-5.95,6.0");
        assert_eq!(lines[2], "2026-01-02,0.0,0.0,0.0,0.0,");
    }

    #[test]
    fn test_empty_series_keeps_header() {
        let csv = series_to_csv_string(&[]).unwrap();
        assert_eq!(csv.trim_end(), "date,stress,fitness,fatigue,form,acr");
    }
}
