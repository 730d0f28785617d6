mod config;
mod controller;
mod errors;
mod filter;
mod grouping;
mod inventory;
mod links;
mod record;
mod render;
mod schema;
mod selection;
mod source;
mod state;
mod tokenizer;
mod updates;

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::OnceCell;
use reqwest::Client;
use serde::Serialize;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use config::{AppConfig, MapProviderConfig, PublicAppConfig};
pub use controller::{DashboardController, DataPaths, RefreshOutcome};
pub use errors::{AppError, AppResult};
pub use filter::{apply_filter, parse_delay_threshold, FilterSelector};
pub use grouping::{group_by_location, location_key, LocationGroup};
pub use inventory::{parse_inventory, InventoryItem};
pub use links::LinkBuilder;
pub use record::{decode_record, parse_contracts, ContractRecord};
pub use render::{render, MarkerSpec, RenderPlan, TableRow};
pub use schema::{DatasetSchema, FlagField, SchemaVersion};
pub use selection::{order_selected_first, SelectionSet};
pub use source::{
    dated_contract_path, parse_data_date, source_from_config, DataSource, FileSource, HttpSource,
};
pub use state::DashboardState;
pub use tokenizer::split_row;
pub use updates::fetch_last_updated;

pub struct DashboardApp {
    config: AppConfig,
    controller: DashboardController,
    links: LinkBuilder,
    map_provider: Option<MapProviderConfig>,
    http: Client,
}

/// Everything the page shows after one load.
#[derive(Debug, Serialize)]
pub struct DashboardSnapshot {
    pub config: PublicAppConfig,
    pub map_client_id: Option<String>,
    pub refresh: RefreshOutcome,
    pub plan: RenderPlan,
    pub inventory: Vec<InventoryItem>,
    pub data_date: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl DashboardApp {
    pub fn initialize(config: AppConfig) -> AppResult<Self> {
        init_tracing();
        let source = source_from_config(&config)?;
        let schema =
            DatasetSchema::for_version(config.schema).with_default_delay(config.default_delay_days);
        let paths = DataPaths {
            contract_file: config.contract_file.clone(),
            inventory_file: config.inventory_file.clone(),
            date_file: config.date_file.clone(),
        };
        let links = LinkBuilder::new(&config.contract_lookup_url)?;
        let map_provider = match MapProviderConfig::load(Path::new(&config.map_config_file)) {
            Ok(provider) => Some(provider),
            Err(err) => {
                warn!(?err, "map provider config unavailable");
                None
            }
        };
        let http = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .user_agent(concat!("contract-map-dashboard/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            controller: DashboardController::new(source, schema, paths),
            config,
            links,
            map_provider,
            http,
        })
    }

    pub fn controller(&self) -> &DashboardController {
        &self.controller
    }

    pub fn links(&self) -> &LinkBuilder {
        &self.links
    }

    /// Loads contracts for `date` plus the side panels. Side-panel failures are
    /// logged and leave their section empty.
    pub async fn load(&self, date: Option<NaiveDate>) -> AppResult<DashboardSnapshot> {
        let refresh = self.controller.refresh(date).await?;

        let inventory = self.controller.load_inventory().await.unwrap_or_else(|err| {
            warn!(?err, "failed to load inventory");
            Vec::new()
        });
        let data_date = match self.controller.load_update_date().await {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(?err, "failed to load data date");
                None
            }
        };

        Ok(DashboardSnapshot {
            config: self.config.public_profile(),
            map_client_id: self.map_provider.as_ref().map(|p| p.client_id.clone()),
            refresh,
            plan: self.controller.render(),
            inventory,
            data_date,
            last_updated: self.last_updated().await,
        })
    }

    async fn last_updated(&self) -> Option<DateTime<Utc>> {
        let url = self.config.commits_api_url.as_deref()?;
        let token = self
            .map_provider
            .as_ref()
            .and_then(|p| p.access_token.as_ref());
        match fetch_last_updated(&self.http, url, token).await {
            Ok(value) => value,
            Err(err) => {
                warn!(?err, "failed to look up last update time");
                None
            }
        }
    }
}

fn init_tracing() {
    static INIT: OnceCell<()> = OnceCell::new();
    let _ = INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,contract_map_lib=debug"));
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init();
    });
}
