//! Offline lookups against a MaxMind GeoLite2/GeoIP2 city database
//!
//! The database file must be downloaded separately from MaxMind (free with
//! registration). It is opened on the first lookup and the handle is shared
//! for the rest of the process.

use async_trait::async_trait;
use maxminddb::{geoip2, MaxMindDBError, Reader};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use super::{LocateValues, LocationResolver};

/// Reasons an offline lookup produced nothing
#[derive(Error, Debug)]
pub enum GeoError {
    #[error("Failed to read database: {0}")]
    Database(#[from] MaxMindDBError),

    #[error("Database file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid IP address: {0}")]
    InvalidAddress(String),

    #[error("IP address not found in database")]
    NotFound,
}

/// Location resolver backed by a local `.mmdb` file
///
/// # Example
///
/// ```ignore
/// use authlog::geolocation::{GeoIpResolver, LocationResolver};
///
/// let resolver = GeoIpResolver::new("GeoLite2-City.mmdb");
/// if let Some(location) = resolver.resolve("8.8.8.8").await {
///     println!("Location: {}", location.display_location());
/// }
/// ```
pub struct GeoIpResolver {
    database_path: PathBuf,
    reader: Mutex<Option<Arc<Reader<Vec<u8>>>>>,
}

impl GeoIpResolver {
    /// Create a resolver; the database is not touched until the first lookup
    pub fn new<P: AsRef<Path>>(database_path: P) -> Self {
        GeoIpResolver {
            database_path: database_path.as_ref().to_path_buf(),
            reader: Mutex::new(None),
        }
    }

    /// Open the database if needed and return the shared handle
    fn reader(&self) -> Result<Arc<Reader<Vec<u8>>>, GeoError> {
        let mut guard = match self.reader.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(ref reader) = *guard {
            return Ok(Arc::clone(reader));
        }

        if !self.database_path.exists() {
            return Err(GeoError::FileNotFound(
                self.database_path.display().to_string(),
            ));
        }

        let reader = Arc::new(Reader::open_readfile(&self.database_path)?);
        log::info!("Opened GeoIP database {}", self.database_path.display());
        *guard = Some(Arc::clone(&reader));
        Ok(reader)
    }

    /// Look up an IP address, reporting why nothing was found
    pub fn lookup(&self, ip_address: &str) -> Result<LocateValues, GeoError> {
        let ip: IpAddr = ip_address
            .trim()
            .parse()
            .map_err(|_| GeoError::InvalidAddress(ip_address.to_string()))?;

        let reader = self.reader()?;
        let city: geoip2::City = reader.lookup(ip).map_err(|e| match e {
            MaxMindDBError::AddressNotFoundError(_) => GeoError::NotFound,
            other => GeoError::Database(other),
        })?;

        let country = city.country.as_ref();
        let location = city.location.as_ref();

        Ok(LocateValues {
            country: country
                .and_then(|c| c.names.as_ref())
                .and_then(|n| n.get("en").copied())
                .map(String::from),
            country_code: country.and_then(|c| c.iso_code).map(String::from),
            city: city
                .city
                .as_ref()
                .and_then(|c| c.names.as_ref())
                .and_then(|n| n.get("en").copied())
                .map(String::from),
            latitude: location.and_then(|l| l.latitude),
            longitude: location.and_then(|l| l.longitude),
        })
    }
}

#[async_trait]
impl LocationResolver for GeoIpResolver {
    async fn resolve(&self, ip_address: &str) -> Option<LocateValues> {
        match self.lookup(ip_address) {
            Ok(values) => Some(values),
            Err(GeoError::NotFound) | Err(GeoError::InvalidAddress(_)) => {
                log::debug!("No GeoIP record for {}", ip_address);
                None
            }
            Err(e) => {
                log::warn!("GeoIP lookup for {} failed: {}", ip_address, e);
                None
            }
        }
    }
}
