//! MaxMind database backed country lookup.

use super::lookup::{GeoIpLookup, public_ip};
use maxminddb::Reader;
use std::sync::Arc;
use tracing::trace;

/// Country lookup against a local GeoLite2/GeoIP2 Country or City database.
pub struct MaxMindGeoIp {
    reader: Arc<Reader<Vec<u8>>>,
}

impl MaxMindGeoIp {
    /// Loads the database file into memory.
    ///
    /// # Errors
    ///
    /// Returns the reader error if the file is missing or not a MaxMind database.
    pub fn open(path: &str) -> Result<Self, maxminddb::MaxMindDbError> {
        let reader = Reader::open_readfile(path)?;
        Ok(Self {
            reader: Arc::new(reader),
        })
    }

    fn lookup(&self, ip: &str) -> Option<String> {
        let addr = public_ip(ip)?;
        let result = self.reader.lookup(addr).ok()?;
        let country: maxminddb::geoip2::Country = result.decode().ok()??;
        let code = country.country.iso_code.map(|c| c.to_ascii_uppercase());

        trace!("MaxMind lookup for {}: country={:?}", ip, code);
        code.filter(|c| c.len() == 2)
    }
}

impl GeoIpLookup for MaxMindGeoIp {
    fn country_code(&self, ip: &str) -> String {
        self.lookup(ip).unwrap_or_default()
    }
}
