//! Best-effort IP to country resolution.
//!
//! - [`MaxMindGeoIp`] - Local MaxMind database
//! - [`NullGeoIp`] - No database configured

mod lookup;
mod maxmind;
mod null;

pub use lookup::{GeoIpLookup, public_ip};
pub use maxmind::MaxMindGeoIp;
pub use null::NullGeoIp;

use std::sync::Arc;
use tracing::{info, warn};

/// Builds the lookup for an optional database path.
///
/// A missing path or an unreadable database degrades to [`NullGeoIp`].
pub fn from_path(path: Option<&str>) -> Arc<dyn GeoIpLookup> {
    match path {
        Some(path) => match MaxMindGeoIp::open(path) {
            Ok(reader) => {
                info!("GeoIP database loaded from {}", path);
                Arc::new(reader)
            }
            Err(e) => {
                warn!(
                    "Failed to open GeoIP database {}: {}. Countries will be empty.",
                    path, e
                );
                Arc::new(NullGeoIp)
            }
        },
        None => {
            info!("GeoIP disabled (no database configured)");
            Arc::new(NullGeoIp)
        }
    }
}
