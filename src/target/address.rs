use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// `fec0::/10`, deprecated but still routed inside some networks.
const IPV6_SITE_LOCAL_PREFIX: u16 = 0xfec0;
const IPV6_SITE_LOCAL_MASK: u16 = 0xffc0;

/// True for addresses a load test must never reach: unspecified, loopback,
/// link-local, private/site-local, and multicast.
#[must_use]
pub fn is_blocked_address(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_blocked_v4(v4),
        IpAddr::V6(v6) => is_blocked_v6(v6),
    }
}

const fn is_blocked_v4(ip: Ipv4Addr) -> bool {
    ip.is_unspecified()
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_private()
        || ip.is_multicast()
}

fn is_blocked_v6(ip: Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_blocked_v4(v4);
    }
    let first = ip.segments().first().copied().unwrap_or(0);
    ip.is_unspecified()
        || ip.is_loopback()
        || ip.is_unicast_link_local()
        || ip.is_unique_local()
        || first & IPV6_SITE_LOCAL_MASK == IPV6_SITE_LOCAL_PREFIX
        || ip.is_multicast()
}
