//! CSV export of the personal record ledger.

use crate::store::Ledger;
use crate::types::{format_weight, PersonalRecord};
use crate::Result;
use std::fs::File;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow<'a> {
    exercise: &'a str,
    pr_type: &'static str,
    reps: u32,
    weight: String,
    sets: u32,
    date: String,
    previous_value: Option<String>,
    previous_date: Option<String>,
    is_current: bool,
    is_manual: bool,
}

impl<'a> CsvRow<'a> {
    fn new(record: &PersonalRecord, exercise: &'a str) -> Self {
        CsvRow {
            exercise,
            pr_type: record.pr_type.as_str(),
            reps: record.reps,
            weight: format_weight(record.weight),
            sets: record.sets,
            date: record.date.to_string(),
            previous_value: record.previous_value.map(format_weight),
            previous_date: record.previous_date.map(|d| d.to_string()),
            is_current: record.is_current,
            is_manual: record.is_manual,
        }
    }
}

/// Write every record of `user` to `path`, ordered by exercise, date and type.
///
/// The file is replaced, flushed and synced before returning.
/// Returns the number of rows written.
pub fn export_records_csv(ledger: &Ledger, user: &str, path: &Path) -> Result<usize> {
    let mut rows: Vec<(&str, &PersonalRecord)> = ledger
        .records
        .iter()
        .filter(|r| r.user == user)
        .map(|r| {
            let name = ledger
                .exercise(r.exercise_id)
                .map(|e| e.name.as_str())
                .unwrap_or("");
            (name, r)
        })
        .collect();
    rows.sort_by_key(|(name, r)| (name.to_lowercase(), r.date, r.pr_type, r.reps));

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_writer(File::create(path)?);
    for (name, record) in &rows {
        writer.serialize(CsvRow::new(record, name))?;
    }

    // Flush and sync to disk
    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!("Exported {} records for {} to {:?}", rows.len(), user, path);
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::seed_default_exercises;
    use crate::service::add_sets;
    use chrono::NaiveDate;

    #[test]
    fn test_export_writes_header_and_rows() {
        let temp_dir = tempfile::tempdir().unwrap();
        let csv_path = temp_dir.path().join("out").join("records.csv");

        let mut ledger = Ledger::default();
        seed_default_exercises(&mut ledger);
        let deadlift = ledger.find_exercise("me", "deadlift").unwrap().id;
        let date = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        add_sets(&mut ledger, "me", deadlift, date, "2x3x180").unwrap();
        add_sets(&mut ledger, "bob", deadlift, date, "1x1x1").unwrap();

        let count = export_records_csv(&ledger, "me", &csv_path).unwrap();
        assert_eq!(count, 3);

        let mut reader = csv::Reader::from_path(&csv_path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "exercise");
        assert_eq!(&headers[1], "pr_type");

        let records: Vec<_> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| &r[0] == "Deadlift"));
        assert!(records.iter().any(|r| &r[1] == "sets" && &r[4] == "2"));
    }

    #[test]
    fn test_export_empty_ledger() {
        let temp_dir = tempfile::tempdir().unwrap();
        let csv_path = temp_dir.path().join("records.csv");

        let count = export_records_csv(&Ledger::default(), "me", &csv_path).unwrap();
        assert_eq!(count, 0);
        assert!(csv_path.exists());
    }
}
