use std::path::Path;
use std::{env, fs, io};

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{AppError, AppResult};
use crate::schema::{SchemaVersion, DEFAULT_DELAY_THRESHOLD};

const DEFAULT_INVENTORY_FILE: &str = "data/warehouse.csv";
const DEFAULT_DATE_FILE: &str = "data/date.txt";
const DEFAULT_MAP_CONFIG_FILE: &str = "config.json";
const DEFAULT_CONTRACT_LOOKUP_URL: &str = "https://erp.example.com/contract/view";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub data_base: String,
    pub schema: SchemaVersion,
    pub default_delay_days: i64,
    pub contract_file: Option<String>,
    pub inventory_file: String,
    pub date_file: String,
    pub map_config_file: String,
    pub contract_lookup_url: String,
    pub commits_api_url: Option<String>,
    pub http_timeout_secs: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct PublicAppConfig {
    pub data_base: String,
    pub schema: SchemaVersion,
    pub default_delay_days: i64,
    pub contract_file: Option<String>,
    pub inventory_file: String,
    pub date_file: String,
    pub contract_lookup_url: String,
    pub has_commits_api: bool,
    pub http_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        load_dotenv_if_applicable();
        Self {
            data_base: env::var("DASHBOARD_DATA_BASE").unwrap_or_else(|_| ".".to_string()),
            schema: env::var("DASHBOARD_SCHEMA")
                .ok()
                .and_then(|v| SchemaVersion::parse(&v).ok())
                .unwrap_or(SchemaVersion::Viko),
            default_delay_days: parse_i64("DASHBOARD_DEFAULT_DELAY_DAYS", DEFAULT_DELAY_THRESHOLD),
            contract_file: non_empty_var("DASHBOARD_CONTRACT_FILE"),
            inventory_file: env::var("DASHBOARD_INVENTORY_FILE")
                .unwrap_or_else(|_| DEFAULT_INVENTORY_FILE.to_string()),
            date_file: env::var("DASHBOARD_DATE_FILE")
                .unwrap_or_else(|_| DEFAULT_DATE_FILE.to_string()),
            map_config_file: env::var("DASHBOARD_MAP_CONFIG")
                .unwrap_or_else(|_| DEFAULT_MAP_CONFIG_FILE.to_string()),
            contract_lookup_url: env::var("CONTRACT_LOOKUP_URL")
                .unwrap_or_else(|_| DEFAULT_CONTRACT_LOOKUP_URL.to_string()),
            commits_api_url: non_empty_var("COMMITS_API_URL"),
            http_timeout_secs: parse_u64("DASHBOARD_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)
                .max(1),
        }
    }

    pub fn public_profile(&self) -> PublicAppConfig {
        PublicAppConfig {
            data_base: self.data_base.clone(),
            schema: self.schema,
            default_delay_days: self.default_delay_days,
            contract_file: self.contract_file.clone(),
            inventory_file: self.inventory_file.clone(),
            date_file: self.date_file.clone(),
            contract_lookup_url: self.contract_lookup_url.clone(),
            has_commits_api: self.commits_api_url.is_some(),
            http_timeout_secs: self.http_timeout_secs,
        }
    }

    pub fn is_remote(&self) -> bool {
        self.data_base.starts_with("http://") || self.data_base.starts_with("https://")
    }
}

/// Map-provider credentials shipped beside the dashboard as JSON.
#[derive(Clone, Debug)]
pub struct MapProviderConfig {
    pub client_id: String,
    pub access_token: Option<SecretString>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMapProviderConfig {
    client_id: String,
    #[serde(default)]
    access_token: Option<String>,
}

impl MapProviderConfig {
    pub fn from_json(text: &str) -> AppResult<Self> {
        let raw: RawMapProviderConfig = serde_json::from_str(text)?;
        if raw.client_id.trim().is_empty() {
            return Err(AppError::Config("map provider clientId is empty".into()));
        }
        Ok(Self {
            client_id: raw.client_id,
            access_token: raw
                .access_token
                .filter(|v| !v.trim().is_empty())
                .map(SecretString::from),
        })
    }

    pub fn load(path: &Path) -> AppResult<Self> {
        let text = fs::read_to_string(path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => {
                AppError::Path(format!("map provider config not found: {}", path.display()))
            }
            _ => AppError::Io(err),
        })?;
        Self::from_json(&text)
    }
}

fn load_dotenv_if_applicable() {
    if !should_load_dotenv() {
        debug!("skipping .env load outside dev mode");
        return;
    }

    if let Err(err) = dotenvy::dotenv() {
        match &err {
            dotenvy::Error::Io(io_err) if io_err.kind() == io::ErrorKind::NotFound => {}
            _ => debug!(?err, "unable to load .env file"),
        }
    }
}

fn should_load_dotenv() -> bool {
    cfg!(debug_assertions) || parse_bool("ALLOW_DOTENV", false)
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "True"))
        .unwrap_or(default)
}

fn parse_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_i64(key: &str, default: i64) -> i64 {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<i64>().ok())
        .unwrap_or(default)
}
