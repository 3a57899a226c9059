use std::net::Ipv4Addr;

use crate::error::CtError;

/// IPv4 addresses assigned to this host, as dotted quads, sorted and
/// deduplicated. Loopback is excluded: traffic to 127.0.0.1 says nothing
/// about which side of a real connection we are on.
pub fn local_ipv4_addrs() -> Result<Vec<String>, CtError> {
    let mut ifaddrs: *mut libc::ifaddrs = std::ptr::null_mut();

    if unsafe { libc::getifaddrs(&mut ifaddrs) } != 0 {
        return Err(CtError::AddressLookup(std::io::Error::last_os_error()));
    }

    // Ensure freeifaddrs is called on all exit paths
    let addrs = collect_ipv4_addrs(ifaddrs);

    unsafe { libc::freeifaddrs(ifaddrs) };

    Ok(addrs)
}

fn collect_ipv4_addrs(ifaddrs: *mut libc::ifaddrs) -> Vec<String> {
    let mut addrs = Vec::new();
    let mut current = ifaddrs;

    while !current.is_null() {
        let entry = unsafe { &*current };

        if !entry.ifa_addr.is_null() {
            let sa_family = unsafe { (*entry.ifa_addr).sa_family } as i32;
            if sa_family == libc::AF_INET {
                // s_addr is in network byte order, so its in-memory bytes
                // already read as the dotted quad.
                let sa_in = unsafe { &*(entry.ifa_addr as *const libc::sockaddr_in) };
                let addr_bytes = sa_in.sin_addr.s_addr.to_ne_bytes();
                let addr =
                    Ipv4Addr::new(addr_bytes[0], addr_bytes[1], addr_bytes[2], addr_bytes[3]);
                if is_reportable(addr) {
                    addrs.push(addr.to_string());
                }
            }
        }

        current = entry.ifa_next;
    }

    addrs.sort();
    addrs.dedup();
    addrs
}

fn is_reportable(addr: Ipv4Addr) -> bool {
    !addr.is_loopback()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loopback_is_not_reportable() {
        assert!(!is_reportable(Ipv4Addr::new(127, 0, 0, 1)));
        assert!(!is_reportable(Ipv4Addr::new(127, 1, 2, 3)));
    }

    #[test]
    fn private_and_public_addresses_are_reportable() {
        assert!(is_reportable(Ipv4Addr::new(10, 0, 0, 1)));
        assert!(is_reportable(Ipv4Addr::new(192, 168, 1, 44)));
        assert!(is_reportable(Ipv4Addr::new(93, 184, 216, 34)));
    }

    #[test]
    fn lookup_returns_sorted_unique_addresses() {
        // Interface sets vary by machine, so only check the shape.
        let addrs = local_ipv4_addrs().unwrap();
        for pair in addrs.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }
}
