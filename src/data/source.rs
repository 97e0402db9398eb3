//! Daily report providers (JHU CSSE archive over HTTP, or a local directory).

use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use tracing::{debug, warn};

use crate::error::AppError;

pub const DEFAULT_BASE_URL: &str = "https://raw.githubusercontent.com/CSSEGISandData/COVID-19/master/csse_covid_19_data/csse_covid_19_daily_reports";

/// File name the archive uses for a report date (`MM-DD-YYYY.csv`).
pub fn report_file_name(date: NaiveDate) -> String {
    format!("{}.csv", date.format("%m-%d-%Y"))
}

fn parse_report_file_name(name: &str) -> Option<NaiveDate> {
    let stem = name.strip_suffix(".csv")?;
    NaiveDate::parse_from_str(stem, "%m-%d-%Y").ok()
}

/// Anything that can hand out the raw CSV text of a daily report.
///
/// Implementations must be shareable across threads: reports for different
/// dates are fetched in parallel.
pub trait ReportSource: Send + Sync {
    /// Human-readable description for logs and summaries.
    fn describe(&self) -> String;

    /// Last date worth probing.
    fn end_date(&self, today: NaiveDate) -> NaiveDate {
        today
    }

    /// Whether a snapshot exists for `date`, without keeping its contents.
    fn available(&self, date: NaiveDate) -> Result<bool, AppError> {
        self.fetch(date).map(|text| text.is_some())
    }

    /// Fetch the report for `date`.
    ///
    /// `Ok(None)` means no snapshot exists for that date.
    fn fetch(&self, date: NaiveDate) -> Result<Option<String>, AppError>;
}

/// HTTP client for the CSSE daily-report archive.
pub struct CsseClient {
    client: Client,
    base_url: String,
    mirror_dir: Option<PathBuf>,
}

impl CsseClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            mirror_dir: None,
        }
    }

    /// Also write every fetched report into `dir`, so later runs can use
    /// [`LocalDir`] instead of the network.
    pub fn with_mirror(mut self, dir: PathBuf) -> Self {
        self.mirror_dir = Some(dir);
        self
    }

    fn url_for(&self, date: NaiveDate) -> String {
        format!("{}/{}", self.base_url, report_file_name(date))
    }

    fn mirror(&self, date: NaiveDate, body: &str) {
        let Some(dir) = &self.mirror_dir else { return };
        let path = dir.join(report_file_name(date));
        let result = fs::create_dir_all(dir).and_then(|_| fs::write(&path, body));
        if let Err(e) = result {
            // A failed mirror write never invalidates the fetched data.
            warn!(path = %path.display(), error = %e, "failed to mirror report");
        }
    }
}

impl ReportSource for CsseClient {
    fn describe(&self) -> String {
        self.base_url.clone()
    }

    fn available(&self, date: NaiveDate) -> Result<bool, AppError> {
        let resp = self
            .client
            .head(self.url_for(date))
            .send()
            .map_err(|e| AppError::new(4, format!("Availability check for {date} failed: {e}")))?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(AppError::new(
                4,
                format!("Availability check for {date} failed with status {status}."),
            )),
        }
    }

    fn fetch(&self, date: NaiveDate) -> Result<Option<String>, AppError> {
        let url = self.url_for(date);
        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| AppError::new(4, format!("Report request for {date} failed: {e}")))?;

        if resp.status() == StatusCode::NOT_FOUND {
            debug!(%date, "no report published");
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(AppError::new(
                4,
                format!("Report request for {date} failed with status {}.", resp.status()),
            ));
        }

        let body = resp
            .text()
            .map_err(|e| AppError::new(4, format!("Failed to read report body for {date}: {e}")))?;
        self.mirror(date, &body);
        Ok(Some(body))
    }
}

/// A directory of previously downloaded `MM-DD-YYYY.csv` reports.
pub struct LocalDir {
    dir: PathBuf,
}

impl LocalDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Latest report date present in the directory.
    pub fn latest_date(&self) -> Option<NaiveDate> {
        let entries = fs::read_dir(&self.dir).ok()?;
        entries
            .filter_map(Result::ok)
            .filter_map(|entry| parse_report_file_name(&entry.file_name().to_string_lossy()))
            .max()
    }
}

impl ReportSource for LocalDir {
    fn describe(&self) -> String {
        self.dir.display().to_string()
    }

    fn end_date(&self, today: NaiveDate) -> NaiveDate {
        self.latest_date().map_or(today, |d| d.min(today))
    }

    fn available(&self, date: NaiveDate) -> Result<bool, AppError> {
        Ok(self.dir.join(report_file_name(date)).is_file())
    }

    fn fetch(&self, date: NaiveDate) -> Result<Option<String>, AppError> {
        let path = self.dir.join(report_file_name(date));
        if !path.is_file() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| AppError::new(4, format!("Failed to read report '{}': {e}", path.display())))
    }
}
