use std::path::{Path, PathBuf};

use tracing::info;

use crate::analytics::{response_to_table, BatchGetRequest, DatasetSpec};
use crate::artifact::{get_csv_path, remove_partial, ArtifactWriter, CsvArtifactWriter};
use crate::client::ReportSource;
use crate::config::RunSpec;
use crate::error::{ExportError, Result};
use crate::months::{DateRange, MonthRange};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonthStatus {
    AlreadyExists,
    Downloaded { rows: usize },
}

/// What a run did, per artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub skipped: usize,
    pub downloaded: usize,
    pub written: Vec<PathBuf>,
}
impl ExportSummary {
    fn record(&mut self, path: PathBuf, status: &MonthStatus) {
        match status {
            MonthStatus::AlreadyExists => self.skipped += 1,
            MonthStatus::Downloaded { .. } => {
                self.downloaded += 1;
                self.written.push(path);
            }
        }
    }

    fn merge(&mut self, other: ExportSummary) {
        self.skipped += other.skipped;
        self.downloaded += other.downloaded;
        self.written.extend(other.written);
    }
}

/// Fetches reports one at a time and writes each to its own file, exactly once.
pub struct Exporter<S, W = CsvArtifactWriter> {
    source: S,
    writer: W,
    page_size: u32,
}

impl<S: ReportSource> Exporter<S> {
    pub fn new(source: S, page_size: u32) -> Self {
        Self::with_writer(source, CsvArtifactWriter, page_size)
    }
}

impl<S: ReportSource, W: ArtifactWriter> Exporter<S, W> {
    pub fn with_writer(source: S, writer: W, page_size: u32) -> Self {
        Self {
            source,
            writer,
            page_size,
        }
    }

    /// Ensures `path` holds the report for `range`. An existing file is trusted as-is.
    /// A failed transform or write removes whatever reached the disk before returning the error.
    async fn ensure_artifact(
        &self,
        path: &Path,
        view_id: &str,
        range: DateRange,
        dataset: &DatasetSpec,
    ) -> Result<MonthStatus> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ExportError::io(parent, e))?;
        }
        if tokio::fs::try_exists(path)
            .await
            .map_err(|e| ExportError::io(path, e))?
        {
            info!("{}: already exists", path.display());
            return Ok(MonthStatus::AlreadyExists);
        }

        info!("{}: fetching...", path.display());
        let request = BatchGetRequest::new(view_id, range, dataset, self.page_size);
        let body = self.source.batch_get(&request).await?;

        let written = response_to_table(&body)
            .and_then(|table| self.writer.write(path, &table).map(|()| table.len()));
        match written {
            Ok(rows) => {
                info!("{}: wrote {} rows", path.display(), rows);
                Ok(MonthStatus::Downloaded { rows })
            }
            Err(e) => {
                if let Err(cleanup) = remove_partial(path) {
                    tracing::warn!("{}: could not remove partial file: {}", path.display(), cleanup);
                }
                Err(e)
            }
        }
    }

    /// One step: the artifact for `month` of `dataset` under `root`.
    pub async fn dump_month(
        &self,
        root: &Path,
        view_id: &str,
        month: MonthRange,
        dataset: &DatasetSpec,
    ) -> Result<MonthStatus> {
        let path = get_csv_path(root, month.month_start);
        self.ensure_artifact(&path, view_id, month.as_date_range(), dataset)
            .await
    }

    /// Walks every month of `range`, writing `<root>/<YYYY>/<YYYY>-<MM>.csv` for each missing one.
    #[tracing::instrument(skip(self, root, dataset), fields(dataset = %dataset.name))]
    pub async fn dump_monthly(
        &self,
        root: &Path,
        view_id: &str,
        range: DateRange,
        dataset: &DatasetSpec,
    ) -> Result<ExportSummary> {
        let mut summary = ExportSummary::default();
        for month in range.months() {
            let status = self.dump_month(root, view_id, month, dataset).await?;
            summary.record(get_csv_path(root, month.month_start), &status);
        }
        Ok(summary)
    }

    /// Every dataset of a run, month by month, into `<data_root>/<run>/<dataset>/`.
    #[tracing::instrument(skip_all, fields(run = %run.name))]
    pub async fn dump(
        &self,
        data_root: &Path,
        run: &RunSpec,
        datasets: &[DatasetSpec],
    ) -> Result<ExportSummary> {
        let range = run.range()?;
        let mut summary = ExportSummary::default();
        for dataset in datasets {
            let root = data_root.join(&run.name).join(&dataset.name);
            info!("starting dataset {}", root.display());
            summary.merge(
                self.dump_monthly(&root, &run.source_id, range, dataset)
                    .await?,
            );
        }
        Ok(summary)
    }

    /// Every dataset of a run as a single request over the whole range,
    /// written to `<data_root>/<run>/<dataset>.csv`.
    #[tracing::instrument(skip_all, fields(run = %run.name))]
    pub async fn dump_totals(
        &self,
        data_root: &Path,
        run: &RunSpec,
        datasets: &[DatasetSpec],
    ) -> Result<ExportSummary> {
        let range = run.range()?;
        let mut summary = ExportSummary::default();
        for dataset in datasets {
            let path = data_root
                .join(&run.name)
                .join(format!("{}.csv", dataset.name));
            info!("starting dataset {}", path.display());
            let status = self
                .ensure_artifact(&path, &run.source_id, range, dataset)
                .await?;
            summary.record(path, &status);
        }
        Ok(summary)
    }
}
