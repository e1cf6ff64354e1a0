use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::clean::CleanReport;
use crate::columns;
use crate::config::Settings;
use crate::harvest::RawStore;
use crate::records::{CleanRecord, RawRow};

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
    }
    Ok(())
}

pub fn write_raw(path: &Path, rows: &[RawRow]) -> Result<()> {
    ensure_parent(path)?;
    let mut wtr = csv::Writer::from_path(path).with_context(|| format!("Failed to create {:?}", path))?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Read a raw results file. Header labels are trimmed; absent columns read as empty.
pub fn read_raw(path: &Path) -> Result<Vec<RawRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_path(path)
        .with_context(|| format!("Failed to open {:?}", path))?;
    let rows = rdr
        .deserialize()
        .collect::<Result<Vec<RawRow>, _>>()
        .with_context(|| format!("Failed to parse {:?}", path))?;
    Ok(rows)
}

pub fn write_cleaned(path: &Path, records: &[CleanRecord]) -> Result<()> {
    ensure_parent(path)?;
    let mut wtr = csv::Writer::from_path(path).with_context(|| format!("Failed to create {:?}", path))?;
    wtr.write_record(columns::header())?;
    for record in records {
        wtr.write_record(columns::row(record))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_dictionary(path: &Path, records: &[CleanRecord]) -> Result<()> {
    ensure_parent(path)?;
    let mut wtr = csv::Writer::from_path(path).with_context(|| format!("Failed to create {:?}", path))?;
    wtr.write_record(["Column", "Type", "Non-Null Count", "Sample Value"])?;
    for entry in columns::dictionary(records) {
        wtr.write_record([
            entry.column.to_string(),
            entry.kind.to_string(),
            entry.non_null.to_string(),
            entry.sample.unwrap_or_default(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub finished_at: DateTime<Utc>,
    pub input: PathBuf,
    pub output: PathBuf,
    pub original_records: usize,
    pub final_records: usize,
    pub records_removed: usize,
    pub steps: CleanReport,
}

impl RunSummary {
    pub fn new(input: &Path, output: &Path, report: CleanReport) -> Self {
        Self {
            finished_at: Utc::now(),
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            original_records: report.original,
            final_records: report.retained,
            records_removed: report.original - report.retained,
            steps: report,
        }
    }
}

pub fn write_summary(path: &Path, summary: &RunSummary) -> Result<()> {
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))?;
    Ok(())
}

/// Raw artifacts on disk, named after the configured dataset.
pub struct CsvStore {
    settings: Settings,
}

impl CsvStore {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }
}

impl RawStore for CsvStore {
    fn save_checkpoint(&mut self, page: u32, rows: &[RawRow]) -> Result<()> {
        let path = self.settings.checkpoint_path(page);
        write_raw(&path, rows)?;
        info!("Saved data at page {} to {:?}", page, path);
        Ok(())
    }

    fn save_final(&mut self, rows: &[RawRow]) -> Result<()> {
        let path = self.settings.final_raw_path();
        write_raw(&path, rows)?;
        info!("Final CSV saved as {:?}", path);
        Ok(())
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str) -> RawRow {
        RawRow {
            name: name.into(),
            finish_time: "1:10:00".into(),
            ..Default::default()
        }
    }

    #[test]
    fn raw_rows_keep_all_eleven_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/raw.csv");
        write_raw(&path, &[row("Ann"), row("Bea")]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(header.split(',').count(), 11);
        assert!(header.starts_with("Name,Gender,Age,Race,State,Country"));

        let back = read_raw(&path).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[1].name, "Bea");
        assert_eq!(back[1].state, "");
    }

    #[test]
    fn padded_header_labels_are_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.csv");
        fs::write(&path, " Name , Finish Time ,Pace\nAnn,1:10:00,7:00\n").unwrap();
        let rows = read_raw(&path).unwrap();
        assert_eq!(rows[0].name, "Ann");
        assert_eq!(rows[0].finish_time, "1:10:00");
    }

    #[test]
    fn store_names_checkpoints_by_page() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            raw_dir: dir.path().to_path_buf(),
            dataset: "Trial".into(),
            ..Settings::default()
        };
        let mut store = CsvStore::new(settings);
        store.save_checkpoint(20, &[row("Ann")]).unwrap();
        store.save_final(&[row("Ann"), row("Bea")]).unwrap();

        assert_eq!(read_raw(&dir.path().join("Trial_partial_p20.csv")).unwrap().len(), 1);
        assert_eq!(read_raw(&dir.path().join("Trial_final.csv")).unwrap().len(), 2);
    }

    #[test]
    fn summary_is_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        let report = CleanReport {
            original: 10,
            military_removed: 1,
            missing_removed: 2,
            outliers_removed: 3,
            retained: 4,
        };
        write_summary(&path, &RunSummary::new(Path::new("in.csv"), Path::new("out.csv"), report)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["records_removed"], 6);
        assert_eq!(value["steps"]["outliers_removed"], 3);
    }
}
