//! Country lookup trait and address filtering.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Resolves a client IP to an ISO-3166-1 alpha-2 country code.
///
/// Lookups never fail: invalid, private or reserved addresses, unknown
/// addresses and backend errors all produce an empty string.
pub trait GeoIpLookup: Send + Sync {
    fn country_code(&self, ip: &str) -> String;
}

/// Parses `ip` and returns it only if it is a globally routable address.
pub fn public_ip(ip: &str) -> Option<IpAddr> {
    let addr: IpAddr = ip.trim().parse().ok()?;
    let routable = match addr {
        IpAddr::V4(v4) => is_public_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_public_v4(v4),
            None => is_public_v6(v6),
        },
    };
    routable.then_some(addr)
}

fn is_public_v4(ip: Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();
    let shared = a == 100 && (64..128).contains(&b);
    let reserved = a >= 240;
    !(ip.is_private()
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || ip.is_documentation()
        || ip.is_multicast()
        || shared
        || reserved
        || a == 0)
}

fn is_public_v6(ip: Ipv6Addr) -> bool {
    let documentation = ip.segments()[0] == 0x2001 && ip.segments()[1] == 0x0db8;
    !(ip.is_loopback()
        || ip.is_unspecified()
        || ip.is_multicast()
        || ip.is_unique_local()
        || ip.is_unicast_link_local()
        || documentation)
}
