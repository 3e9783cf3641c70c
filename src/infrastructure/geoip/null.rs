//! Lookup used when no database is configured.

use super::lookup::GeoIpLookup;

/// Always answers "unknown".
#[derive(Debug, Default, Clone, Copy)]
pub struct NullGeoIp;

impl GeoIpLookup for NullGeoIp {
    fn country_code(&self, _ip: &str) -> String {
        String::new()
    }
}
