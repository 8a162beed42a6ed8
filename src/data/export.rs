use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use super::model::PredictionRecord;

/// Fixed column header of an exported view.
pub const EXPORT_HEADER: [&str; 4] = ["id", "score_100", "score_20", "letter_grade"];

/// Serialise `rows` (already filtered and sorted) under [`EXPORT_HEADER`].
/// Fields containing the delimiter or quotes are quoted by the csv writer.
/// Scores are written at full precision so the grade column stays consistent
/// with them when the file is loaded again.
pub fn write_csv<W: Write>(writer: W, rows: &[&PredictionRecord]) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(EXPORT_HEADER)?;
    for rec in rows {
        wtr.write_record([
            rec.id.to_string(),
            rec.score_100.to_string(),
            rec.score_20.to_string(),
            rec.grade.as_str().to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn to_csv_bytes(rows: &[&PredictionRecord]) -> Result<Vec<u8>, csv::Error> {
    let mut buf = Vec::new();
    write_csv(&mut buf, rows)?;
    Ok(buf)
}

/// `{prefix}_{dataset stem}_{YYYY-MM-DD}.csv`.
pub fn export_file_name(prefix: &str, dataset_filename: &str, date: NaiveDate) -> String {
    let stem = Path::new(dataset_filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("dataset");
    format!("{prefix}_{stem}_{}.csv", date.format("%Y-%m-%d"))
}

/// Write the view to `path`, replacing any existing file.
pub fn save_view(path: &Path, rows: &[&PredictionRecord]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Cannot create {}", path.display()))?;
    write_csv(std::io::BufWriter::new(file), rows)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Exported {} rows to {}", rows.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::OriginalData;

    fn rec(id: i64, score: f64) -> PredictionRecord {
        PredictionRecord::new(id, score, OriginalData::new())
    }

    #[test]
    fn writes_header_and_rows_in_given_order() {
        let a = rec(2, 91.0);
        let b = rec(1, 73.456);
        let bytes = to_csv_bytes(&[&a, &b]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec![
            "id,score_100,score_20,letter_grade",
            "2,91,18.2,AD",
            "1,73.456,14.691200000000002,B",
        ]);
    }

    #[test]
    fn empty_view_is_header_only() {
        let text = String::from_utf8(to_csv_bytes(&[]).unwrap()).unwrap();
        assert_eq!(text.trim_end(), "id,score_100,score_20,letter_grade");
    }

    #[test]
    fn exported_row_loads_back_with_the_same_grade() {
        let near_threshold = rec(1, 89.996);
        assert_eq!(near_threshold.grade, crate::data::model::Grade::A);
        let bytes = to_csv_bytes(&[&near_threshold]).unwrap();
        assert_eq!(
            String::from_utf8(bytes.clone()).unwrap().lines().nth(1),
            Some("1,89.996,17.9992,A")
        );

        let reloaded = crate::data::loader::parse_results("export.csv", &bytes).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.records[0].score_100, 89.996);
        assert_eq!(reloaded.records[0].grade, near_threshold.grade);
    }

    #[test]
    fn file_name_uses_prefix_stem_and_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(
            export_file_name("prediction_results", "class_a.csv", date),
            "prediction_results_class_a_2024-03-09.csv"
        );
        assert_eq!(
            export_file_name("out", "", date),
            "out_dataset_2024-03-09.csv"
        );
    }

    #[test]
    fn save_view_writes_file() {
        let path = std::env::temp_dir().join(format!("predictscore_export_{}.csv", std::process::id()));
        let a = rec(1, 80.0);
        save_view(&path, &[&a]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("id,score_100"));
        assert!(text.contains("1,80,16,A"));
        let _ = std::fs::remove_file(&path);
    }
}
