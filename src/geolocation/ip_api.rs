//! Remote lookups against the ip-api.com JSON endpoint
//!
//! The free tier is limited to 45 requests per minute per source address.
//! Rate-limited requests come back as non-success and resolve to nothing.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;

use super::{LocateValues, LocationResolver};

const SUCCESS: &str = "success";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpApiResponse {
    status: String,
    country: Option<String>,
    country_code: Option<String>,
    city: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Location resolver backed by ip-api.com
pub struct IpApiResolver {
    base_url: String,
    client: Client,
}

impl IpApiResolver {
    /// Create a resolver with a 5s connect / 10s total timeout
    pub fn new(base_url: &str) -> Self {
        Self::with_timeouts(base_url, Duration::from_secs(5), Duration::from_secs(10))
    }

    pub fn with_timeouts(base_url: &str, connect_timeout: Duration, timeout: Duration) -> Self {
        IpApiResolver {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::builder()
                .connect_timeout(connect_timeout)
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    async fn fetch(&self, ip_address: &str) -> Result<Option<LocateValues>, reqwest::Error> {
        let url = format!("{}/json/{}", self.base_url, ip_address);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            log::debug!("ip-api returned {} for {}", response.status(), ip_address);
            return Ok(None);
        }

        let data: IpApiResponse = response.json().await?;
        if data.status != SUCCESS {
            log::debug!("ip-api status '{}' for {}", data.status, ip_address);
            return Ok(None);
        }

        Ok(Some(LocateValues {
            country: data.country,
            country_code: data.country_code,
            city: data.city,
            latitude: data.lat,
            longitude: data.lon,
        }))
    }
}

#[async_trait]
impl LocationResolver for IpApiResolver {
    async fn resolve(&self, ip_address: &str) -> Option<LocateValues> {
        let ip_address = ip_address.trim();
        if ip_address.parse::<IpAddr>().is_err() {
            log::debug!("Not looking up invalid IP address '{}'", ip_address);
            return None;
        }

        match self.fetch(ip_address).await {
            Ok(values) => values,
            Err(e) => {
                log::warn!("ip-api lookup for {} failed: {}", ip_address, e);
                None
            }
        }
    }
}
