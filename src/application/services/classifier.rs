//! Click classification: device class, referrer domain and country.
//!
//! Every function here is total; unrecognized input falls into a default
//! bucket instead of failing.

use std::sync::Arc;

use url::Url;

use crate::domain::entities::DeviceClass;
use crate::infrastructure::geoip::GeoIpLookup;

/// Referrer bucket for visits without a usable `Referer` header.
pub const DIRECT: &str = "direct";

const MAX_REFERRER_LEN: usize = 255;

const BOT_TOKENS: [&str; 3] = ["bot", "crawl", "spider"];
const TABLET_TOKENS: [&str; 2] = ["ipad", "tablet"];
const MOBILE_TOKENS: [&str; 3] = ["mobile", "iphone", "android"];

/// Classifies a user agent. Checks run in priority order and the first
/// match wins: bots, then tablets, then mobiles, else desktop.
pub fn device_class(user_agent: &str) -> DeviceClass {
    let ua = user_agent.to_lowercase();
    let has = |tokens: &[&str]| tokens.iter().any(|t| ua.contains(t));

    if has(&BOT_TOKENS) {
        DeviceClass::Bot
    } else if has(&TABLET_TOKENS) {
        DeviceClass::Tablet
    } else if has(&MOBILE_TOKENS) {
        DeviceClass::Mobile
    } else {
        DeviceClass::Desktop
    }
}

/// Lowercase host of the referrer URL, or [`DIRECT`] when absent or unparsable.
pub fn referrer_domain(referrer: Option<&str>) -> String {
    referrer
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .and_then(|r| Url::parse(r).ok())
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
        .filter(|h| !h.is_empty() && h.len() <= MAX_REFERRER_LEN)
        .unwrap_or_else(|| DIRECT.to_string())
}

/// Classified dimensions of one click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub device_class: DeviceClass,
    pub referrer_domain: String,
    pub country_code: String,
}

/// Classifier bound to a GeoIP backend.
#[derive(Clone)]
pub struct Classifier {
    geoip: Arc<dyn GeoIpLookup>,
}

impl Classifier {
    pub fn new(geoip: Arc<dyn GeoIpLookup>) -> Self {
        Self { geoip }
    }

    /// Country code for `ip`, empty when unknown.
    pub fn country_code(&self, ip: Option<&str>) -> String {
        ip.map(|ip| self.geoip.country_code(ip)).unwrap_or_default()
    }

    pub fn classify(
        &self,
        user_agent: &str,
        referrer: Option<&str>,
        ip: Option<&str>,
    ) -> Classification {
        Classification {
            device_class: device_class(user_agent),
            referrer_domain: referrer_domain(referrer),
            country_code: self.country_code(ip),
        }
    }
}
