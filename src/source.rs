use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Url};
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};

const USER_AGENT: &str = concat!("contract-map-dashboard/", env!("CARGO_PKG_VERSION"));

/// Where the dashboard's data files come from.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch_text(&self, path: &str) -> AppResult<String>;

    fn describe(&self) -> String;
}

pub struct HttpSource {
    http: Client,
    base: Url,
}

impl HttpSource {
    pub fn new(base: &str, timeout: Duration) -> AppResult<Self> {
        let base = normalize_base(base)?;
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { http, base })
    }

    fn resolve(&self, path: &str) -> AppResult<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|err| AppError::Path(format!("cannot resolve {path}: {err}")))
    }
}

#[async_trait]
impl DataSource for HttpSource {
    async fn fetch_text(&self, path: &str) -> AppResult<String> {
        let url = self.resolve(path)?;
        debug!(target: "data_source", %url, "fetching data file");
        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(target: "data_source", %url, status = status.as_u16(), "data fetch failed");
            return Err(AppError::Fetch {
                resource: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }

    fn describe(&self) -> String {
        self.base.to_string()
    }
}

pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> AppResult<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir))
        {
            return Err(AppError::Path(format!("refusing to read outside data root: {path}")));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl DataSource for FileSource {
    async fn fetch_text(&self, path: &str) -> AppResult<String> {
        let resolved = self.resolve(path)?;
        debug!(target: "data_source", path = %resolved.display(), "reading data file");
        Ok(tokio::fs::read_to_string(&resolved).await?)
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

pub fn source_from_config(config: &AppConfig) -> AppResult<Arc<dyn DataSource>> {
    if config.is_remote() {
        let source = HttpSource::new(
            &config.data_base,
            Duration::from_secs(config.http_timeout_secs),
        )?;
        Ok(Arc::new(source))
    } else {
        Ok(Arc::new(FileSource::new(&config.data_base)))
    }
}

/// Daily exports are published as `data_<YYYYMMDD>.csv`.
pub fn dated_contract_path(date: NaiveDate) -> String {
    format!("data_{}.csv", date.format("%Y%m%d"))
}

/// Accepts the date picker's `YYYY-MM-DD` as well as the compact `YYYYMMDD`.
pub fn parse_data_date(value: &str) -> AppResult<NaiveDate> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y%m%d"))
        .map_err(|_| AppError::Validation(format!("invalid data date: {trimmed}")))
}

fn normalize_base(base: &str) -> AppResult<Url> {
    let mut owned = base.trim().to_string();
    if !owned.ends_with('/') {
        owned.push('/');
    }
    Url::parse(&owned).map_err(|err| AppError::Config(format!("invalid data base url {base}: {err}")))
}
