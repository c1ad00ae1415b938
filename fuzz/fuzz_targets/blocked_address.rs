#![no_main]

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use libfuzzer_sys::fuzz_target;
use loadrun::target::is_blocked_address;

fuzz_target!(|data: &[u8]| {
    let mut bytes = [0u8; 16];
    let len = data.len().min(16);
    bytes[..len].copy_from_slice(&data[..len]);
    let v6 = Ipv6Addr::from(bytes);
    let blocked = is_blocked_address(IpAddr::V6(v6));

    // a mapped address must get the same answer as the bare IPv4 one
    if let Some(v4) = v6.to_ipv4_mapped() {
        debug_assert_eq!(blocked, is_blocked_address(IpAddr::V4(v4)));
    }
    let v4 = Ipv4Addr::new(bytes[0], bytes[1], bytes[2], bytes[3]);
    if v4.is_loopback() || v4.is_private() {
        debug_assert!(is_blocked_address(IpAddr::V4(v4)));
    }
});
