//! IP geolocation
//!
//! Two interchangeable resolvers sit behind [`LocationResolver`]: an offline
//! lookup in a MaxMind city database and a remote lookup against ip-api.com.
//! Resolvers never fail. Anything that goes wrong (bad address, missing
//! database, network error, rate limiting) comes back as `None`.

pub mod geoip;
pub mod ip_api;

pub use geoip::GeoIpResolver;
pub use ip_api::IpApiResolver;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{LocationConfig, LocationProvider};

/// A resolved location; every field may be independently unknown
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocateValues {
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl LocateValues {
    /// Flatten into a key/value mapping
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Rebuild from a mapping produced by [`LocateValues::to_map`]
    ///
    /// Missing keys read as unknown. Returns `None` when a value has the
    /// wrong type.
    pub fn from_map(map: &Map<String, Value>) -> Option<Self> {
        serde_json::from_value(Value::Object(map.clone())).ok()
    }

    /// Human-readable location string
    pub fn display_location(&self) -> String {
        match (&self.city, &self.country) {
            (Some(city), Some(country)) => format!("{}, {}", city, country),
            (None, Some(country)) => country.clone(),
            (Some(city), None) => city.clone(),
            (None, None) => match (self.latitude, self.longitude) {
                (Some(lat), Some(lon)) => format!("({:.4}, {:.4})", lat, lon),
                _ => "Unknown location".to_string(),
            },
        }
    }
}

/// Maps an IP address to an approximate location
#[async_trait]
pub trait LocationResolver: Send + Sync {
    /// Resolve `ip_address`, or return `None` if it cannot be located
    async fn resolve(&self, ip_address: &str) -> Option<LocateValues>;
}

/// Build the resolver selected by configuration
///
/// Returns `None` when no provider is configured, or when the configuration
/// is incomplete (`Config::validate` rejects that case up front).
pub fn build_resolver(config: &LocationConfig) -> Option<Arc<dyn LocationResolver>> {
    match config.provider {
        LocationProvider::None => None,
        LocationProvider::IpApi => Some(Arc::new(IpApiResolver::with_timeouts(
            &config.ip_api_base_url,
            Duration::from_secs(config.connect_timeout_secs),
            Duration::from_secs(config.timeout_secs),
        ))),
        LocationProvider::Geoip2 => match config.geoip2_database_path {
            Some(ref path) => Some(Arc::new(GeoIpResolver::new(path))),
            None => {
                log::warn!("geoip2 provider selected without a database path, locations disabled");
                None
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_roundtrip_full() {
        let values = LocateValues {
            country: Some("Japan".to_string()),
            country_code: Some("JP".to_string()),
            city: Some("Tokyo".to_string()),
            latitude: Some(35.6762),
            longitude: Some(139.6503),
        };

        let map = values.to_map();
        assert_eq!(map.len(), 5);
        assert!(map.values().all(|v| !v.is_object() && !v.is_array()));
        assert_eq!(LocateValues::from_map(&map), Some(values));
    }

    #[test]
    fn test_map_roundtrip_partial() {
        let country_only = LocateValues {
            country: Some("Canada".to_string()),
            country_code: Some("CA".to_string()),
            ..LocateValues::default()
        };
        let coordinates_only = LocateValues {
            latitude: Some(-33.8688),
            longitude: Some(151.2093),
            ..LocateValues::default()
        };

        for values in [country_only, coordinates_only, LocateValues::default()] {
            let map = values.to_map();
            assert_eq!(LocateValues::from_map(&map), Some(values));
        }
    }

    #[test]
    fn test_from_map_is_order_independent() {
        let mut map = Map::new();
        map.insert("longitude".to_string(), Value::from(2.35));
        map.insert("city".to_string(), Value::from("Paris"));
        map.insert("latitude".to_string(), Value::from(48.85));

        let values = LocateValues::from_map(&map).unwrap();
        assert_eq!(values.city.as_deref(), Some("Paris"));
        assert_eq!(values.latitude, Some(48.85));
        assert_eq!(values.longitude, Some(2.35));
        assert!(values.country.is_none());
    }

    #[test]
    fn test_from_map_rejects_wrong_types() {
        let mut map = Map::new();
        map.insert("latitude".to_string(), Value::from("north"));
        assert!(LocateValues::from_map(&map).is_none());
    }

    #[test]
    fn test_display_location() {
        let values = LocateValues {
            city: Some("Lyon".to_string()),
            country: Some("France".to_string()),
            ..LocateValues::default()
        };
        assert_eq!(values.display_location(), "Lyon, France");
        assert_eq!(LocateValues::default().display_location(), "Unknown location");
    }

    #[test]
    fn test_build_resolver_none() {
        assert!(build_resolver(&LocationConfig::default()).is_none());
    }

    #[test]
    fn test_build_resolver_variants() {
        let mut config = LocationConfig::default();
        config.provider = LocationProvider::IpApi;
        assert!(build_resolver(&config).is_some());

        config.provider = LocationProvider::Geoip2;
        assert!(build_resolver(&config).is_none());

        config.geoip2_database_path = Some("GeoLite2-City.mmdb".into());
        assert!(build_resolver(&config).is_some());
    }
}
