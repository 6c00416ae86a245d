use std::{
    collections::HashSet,
    env,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use regex::Regex;

use crate::analytics::DatasetSpec;
use crate::error::{ExportError, Result};
use crate::months::DateRange;

pub const CONFIG_ENV: &str = "GA_EXPORT_CONFIG";
pub const KEY_FILE_ENV: &str = "GA_KEY_FILE";
pub const READONLY_SCOPE: &str = "https://www.googleapis.com/auth/analytics.readonly";
pub const DEFAULT_ENDPOINT: &str = "https://analyticsreporting.googleapis.com/v4/reports:batchGet";
/// The service's own per-request ceiling. Nothing past it is ever fetched.
pub const DEFAULT_PAGE_SIZE: u32 = 100_000;

/// One property to export over one date range.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RunSpec {
    /// Directory name under the data root
    pub name: String,
    /// The view id to query
    pub source_id: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}
impl RunSpec {
    pub fn new(name: &str, source_id: &str, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            name: name.to_string(),
            source_id: source_id.to_string(),
            start,
            end,
        }
    }

    pub fn range(&self) -> Result<DateRange> {
        DateRange::new(self.start, self.end)
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ExportConfig {
    pub credential_path: PathBuf,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    #[serde(default = "default_data_root")]
    pub data_root: PathBuf,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    pub datasets: Vec<DatasetSpec>,
    pub runs: Vec<RunSpec>,
}

fn default_scopes() -> Vec<String> {
    vec![READONLY_SCOPE.to_string()]
}

fn default_data_root() -> PathBuf {
    PathBuf::from("data")
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// Only ever called with the literal dates below; a typo there should fail loudly.
fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("built-in config date is not a calendar date")
}

fn spack_docs() -> RunSpec {
    RunSpec::new("spack_docs", "153247856", date(2017, 6, 17), date(2022, 11, 12))
}

fn eb_docs() -> RunSpec {
    RunSpec::new("eb_docs", "93323974", date(2016, 8, 23), date(2023, 1, 28))
}

const TRAFFIC_METRICS: &[&str] = &[
    "ga:users",
    "ga:pageViews",
    "ga:sessions",
    "ga:sessionDuration",
    "ga:pageviewsPerSession",
    "ga:bounceRate",
];

const CONTENT_METRICS: &[&str] = &[
    "ga:users",
    "ga:pageViews",
    "ga:sessionDuration",
    "ga:pageviewsPerSession",
    "ga:bounceRate",
];

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            credential_path: PathBuf::from("ga-credentials.json"),
            scopes: default_scopes(),
            data_root: default_data_root(),
            endpoint: default_endpoint(),
            page_size: DEFAULT_PAGE_SIZE,
            datasets: vec![
                DatasetSpec::new("by_country", &["ga:date", "ga:countryIsoCode"], TRAFFIC_METRICS),
                DatasetSpec::new(
                    "by_country_and_city",
                    &["ga:date", "ga:countryIsoCode", "ga:city"],
                    TRAFFIC_METRICS,
                ),
                DatasetSpec::new("by_path", &["ga:date", "ga:pagePath"], CONTENT_METRICS),
                DatasetSpec::new("by_source", &["ga:date", "ga:source"], CONTENT_METRICS),
            ],
            runs: vec![
                spack_docs(),
                RunSpec::new("spack.io", "153231804", date(2017, 6, 17), date(2023, 7, 16)),
                RunSpec::new("spack_tutorial", "204724438", date(2019, 10, 27), date(2023, 7, 4)),
                eb_docs(),
            ],
        }
    }
}

impl ExportConfig {
    /// Built-in config for whole-range exports: distinct users per month and country.
    pub fn users_per_month() -> Self {
        Self {
            datasets: vec![DatasetSpec::new(
                "users_per_month",
                &["ga:year", "ga:month", "ga:countryIsoCode"],
                &["ga:users"],
            )],
            runs: vec![spack_docs(), eb_docs()],
            ..Self::default()
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ExportError::io(path, e))?;
        let config: ExportConfig = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Reads `$GA_EXPORT_CONFIG` if set, otherwise starts from `fallback`.
    /// `$GA_KEY_FILE` then overrides the credential path. The result is validated.
    pub fn load_or(fallback: impl FnOnce() -> Self) -> Result<Self> {
        let mut config = match env::var_os(CONFIG_ENV) {
            Some(path) => {
                tracing::info!("reading config from {:?}", path);
                Self::from_path(Path::new(&path))?
            }
            None => fallback(),
        };
        if let Some(key_file) = env::var_os(KEY_FILE_ENV) {
            config.credential_path = PathBuf::from(key_file);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn load() -> Result<Self> {
        Self::load_or(Self::default)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(ExportError::Config("page_size must be positive".into()));
        }
        let safe_name = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$")
            .map_err(|e| ExportError::Config(e.to_string()))?;

        let mut seen = HashSet::new();
        for dataset in &self.datasets {
            if !safe_name.is_match(&dataset.name) {
                return Err(ExportError::Config(format!(
                    "dataset name {:?} is not a safe directory name",
                    dataset.name
                )));
            }
            if !seen.insert(dataset.name.as_str()) {
                return Err(ExportError::Config(format!(
                    "dataset {:?} is defined twice",
                    dataset.name
                )));
            }
            if dataset.metrics.is_empty() {
                return Err(ExportError::Config(format!(
                    "dataset {:?} needs at least one metric",
                    dataset.name
                )));
            }
        }

        for run in &self.runs {
            if !safe_name.is_match(&run.name) {
                return Err(ExportError::Config(format!(
                    "run name {:?} is not a safe directory name",
                    run.name
                )));
            }
            run.range()?;
        }
        Ok(())
    }
}
