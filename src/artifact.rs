use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::analytics::Table;
use crate::error::{ExportError, Result};

/// `<root>/<YYYY>/<YYYY>-<MM>.csv` for the month containing `date`.
pub fn get_csv_path(root: &Path, date: NaiveDate) -> PathBuf {
    use chrono::Datelike;
    root.join(format!("{:04}", date.year()))
        .join(format!("{:04}-{:02}.csv", date.year(), date.month()))
}

/// Persists a table somewhere addressable by path.
pub trait ArtifactWriter {
    fn write(&self, path: &Path, table: &Table) -> Result<()>;
}

/// Plain comma separated output, header row first. Missing cells are left empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvArtifactWriter;

impl ArtifactWriter for CsvArtifactWriter {
    fn write(&self, path: &Path, table: &Table) -> Result<()> {
        let csv_err = |source: csv::Error| ExportError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
        // No columns means nothing came back; leave the file empty rather than `""`.
        if table.columns.is_empty() {
            writer.flush().map_err(|e| ExportError::io(path, e))?;
            return Ok(());
        }
        writer.write_record(&table.columns).map_err(csv_err)?;
        for row in &table.rows {
            let record = table
                .columns
                .iter()
                .map(|column| row.get(column).map(String::as_str).unwrap_or(""));
            writer.write_record(record).map_err(csv_err)?;
        }
        writer.flush().map_err(|e| ExportError::io(path, e))?;
        Ok(())
    }
}

/// Removes whatever got written to `path`. A file that was never created is fine.
pub fn remove_partial(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ExportError::io(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::ReportRow;
    use tempfile::TempDir;

    fn row(pairs: &[(&str, &str)]) -> ReportRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn csv_path_is_zero_padded() {
        let date = NaiveDate::from_ymd_opt(2019, 3, 17).unwrap();
        let path = get_csv_path(Path::new("data/spack.io/by_path"), date);
        assert_eq!(path, Path::new("data/spack.io/by_path/2019/2019-03.csv"));
    }

    #[test]
    fn writes_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("2021-06.csv");
        let table = Table::from(vec![
            row(&[("ga:date", "20210601"), ("ga:users", "4")]),
            row(&[("ga:date", "20210602"), ("ga:city", "Zürich, CH")]),
        ]);

        CsvArtifactWriter.write(&path, &table).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "ga:date,ga:users,ga:city\n20210601,4,\n20210602,,\"Zürich, CH\"\n"
        );
    }

    #[test]
    fn empty_table_writes_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.csv");
        CsvArtifactWriter.write(&path, &Table::default()).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn header_only_when_columns_but_no_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("quiet-month.csv");
        let table = Table {
            columns: vec!["ga:date".into(), "ga:users".into()],
            rows: vec![],
        };
        CsvArtifactWriter.write(&path, &table).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "ga:date,ga:users\n");
    }

    #[test]
    fn remove_partial_tolerates_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("never-written.csv");
        remove_partial(&path).unwrap();

        std::fs::write(&path, "half").unwrap();
        remove_partial(&path).unwrap();
        assert!(!path.exists());
    }
}
