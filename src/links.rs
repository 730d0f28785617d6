use reqwest::Url;

use crate::errors::{AppError, AppResult};

const NAVIGATION_SCHEME: &str = "nmap://navigation";
const MAP_SEARCH_BASE: &str = "https://map.naver.com/p/search/";
const NAVIGATION_APP_NAME: &str = "contract-map-dashboard";
const MAP_ZOOM: u8 = 15;

/// Builds deep links out of the dashboard into the systems operators jump to
/// from a table row or marker.
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    contract_lookup: Url,
}

impl LinkBuilder {
    pub fn new(contract_lookup_base: &str) -> AppResult<Self> {
        let contract_lookup = Url::parse(contract_lookup_base).map_err(|err| {
            AppError::Config(format!(
                "invalid contract lookup url {contract_lookup_base}: {err}"
            ))
        })?;
        Ok(Self { contract_lookup })
    }

    pub fn contract_lookup(&self, contract_no: &str) -> String {
        let mut url = self.contract_lookup.clone();
        url.query_pairs_mut().append_pair("contractNo", contract_no);
        url.to_string()
    }

    pub fn navigation(&self, destination: &str, latitude: f64, longitude: f64) -> Option<String> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return None;
        }
        let mut url = Url::parse(NAVIGATION_SCHEME).ok()?;
        url.query_pairs_mut()
            .append_pair("dlat", &latitude.to_string())
            .append_pair("dlng", &longitude.to_string())
            .append_pair("dname", destination)
            .append_pair("appname", NAVIGATION_APP_NAME);
        Some(url.to_string())
    }

    pub fn map_service(&self, latitude: f64, longitude: f64) -> Option<String> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return None;
        }
        let mut url = Url::parse(MAP_SEARCH_BASE)
            .ok()?
            .join(&format!("{latitude},{longitude}"))
            .ok()?;
        url.query_pairs_mut()
            .append_pair("c", &format!("{longitude},{latitude},{MAP_ZOOM},0,0,0,dh"));
        Some(url.to_string())
    }
}
