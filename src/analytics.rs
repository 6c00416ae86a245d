use indexmap::{IndexMap, IndexSet};

use crate::error::{ExportError, Result};
use crate::months::DateRange;

/// A named combination of dimensions and metrics that get exported together.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DatasetSpec {
    pub name: String,
    /// Field names, e.g. `ga:date`
    pub dimensions: Vec<String>,
    /// Field expressions, e.g. `ga:users`
    pub metrics: Vec<String>,
}
impl DatasetSpec {
    pub fn new(name: &str, dimensions: &[&str], metrics: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            dimensions: dimensions.iter().map(|s| s.to_string()).collect(),
            metrics: metrics.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDateRange {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct RequestDimension {
    pub name: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct RequestMetric {
    pub expression: String,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub view_id: String,
    pub date_ranges: Vec<RequestDateRange>,
    pub dimensions: Vec<RequestDimension>,
    pub metrics: Vec<RequestMetric>,
    pub page_size: u32,
}

/// Body of a `reports:batchGet` call. We only ever send a single report request.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchGetRequest {
    pub report_requests: Vec<ReportRequest>,
}
impl BatchGetRequest {
    /// Asks for exactly `range` with a single page of at most `page_size` rows.
    /// Anything past the first page is never requested.
    pub fn new(view_id: &str, range: DateRange, dataset: &DatasetSpec, page_size: u32) -> Self {
        let req = ReportRequest {
            view_id: view_id.to_string(),
            date_ranges: vec![RequestDateRange {
                start_date: range.start().format("%Y-%m-%d").to_string(),
                end_date: range.end().format("%Y-%m-%d").to_string(),
            }],
            dimensions: dataset
                .dimensions
                .iter()
                .map(|name| RequestDimension { name: name.clone() })
                .collect(),
            metrics: dataset
                .metrics
                .iter()
                .map(|expression| RequestMetric {
                    expression: expression.clone(),
                })
                .collect(),
            page_size,
        };
        Self {
            report_requests: vec![req],
        }
    }
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct MetricHeaderEntry {
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_: Option<String>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricHeader {
    pub metric_header_entries: Vec<MetricHeaderEntry>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnHeader {
    pub dimensions: Vec<String>,
    pub metric_header: MetricHeader,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct DateRangeValues {
    pub values: Vec<String>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ReportRecord {
    pub dimensions: Vec<String>,
    pub metrics: Vec<DateRangeValues>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportData {
    pub rows: Vec<ReportRecord>,
    pub row_count: Option<u64>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Report {
    pub column_header: ColumnHeader,
    pub data: ReportData,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct BatchGetResponse {
    pub reports: Vec<Report>,
}
impl BatchGetResponse {
    pub fn parse(body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|e| ExportError::Transform(e.to_string()))
    }
}

/// One output line: column name to the raw value the service returned.
pub type ReportRow = IndexMap<String, String>;

/// Rows plus their columns: declared headers first, then any other keys, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<ReportRow>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl From<Vec<ReportRow>> for Table {
    fn from(rows: Vec<ReportRow>) -> Self {
        let mut columns = IndexSet::new();
        for row in &rows {
            columns.extend(row.keys().cloned());
        }
        Table {
            columns: columns.into_iter().collect(),
            rows,
        }
    }
}

/// Flattens every report in the response into rows, zipping headers with values.
/// Surplus values or headers on either side are dropped.
pub fn response_to_rows(response: &BatchGetResponse) -> Vec<ReportRow> {
    let mut list_rows = vec![];
    for report in &response.reports {
        let dimension_headers = &report.column_header.dimensions;
        let metric_headers = &report.column_header.metric_header.metric_header_entries;
        if report.next_page_token.is_some() {
            tracing::warn!(
                "report has more than one page, only the first {} rows are kept",
                report.data.rows.len()
            );
        }
        for record in &report.data.rows {
            let mut row = ReportRow::new();
            for (header, value) in dimension_headers.iter().zip(&record.dimensions) {
                row.insert(header.clone(), value.clone());
            }
            for date_range_values in &record.metrics {
                for (header, value) in metric_headers.iter().zip(&date_range_values.values) {
                    row.insert(header.name.clone(), value.clone());
                }
            }
            list_rows.push(row);
        }
    }
    list_rows
}

/// Dimension headers then metric headers of every report, first occurrence wins.
fn declared_columns(response: &BatchGetResponse) -> IndexSet<String> {
    let mut columns = IndexSet::new();
    for report in &response.reports {
        let header = &report.column_header;
        columns.extend(header.dimensions.iter().cloned());
        columns.extend(
            header
                .metric_header
                .metric_header_entries
                .iter()
                .map(|entry| entry.name.clone()),
        );
    }
    columns
}

/// Parses a raw `batchGet` body into a table ready to be written.
/// Columns come from the declared headers, so a month with no rows still gets a header line.
pub fn response_to_table(body: &str) -> Result<Table> {
    let response = BatchGetResponse::parse(body)?;
    let mut columns = declared_columns(&response);
    let rows = response_to_rows(&response);
    for row in &rows {
        columns.extend(row.keys().cloned());
    }
    Ok(Table {
        columns: columns.into_iter().collect(),
        rows,
    })
}
