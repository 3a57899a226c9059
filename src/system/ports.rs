use crate::error::CtError;

// /proc/net/tcp state column value for LISTEN.
const LISTEN_STATE: &str = "0A";

/// TCP ports with a listening socket on this host, as decimal strings in
/// ascending numeric order.
///
/// Reads both /proc/net/tcp and /proc/net/tcp6; a missing tcp6 file (kernel
/// built without IPv6) is not an error.
pub fn local_listening_ports() -> Result<Vec<String>, CtError> {
    let mut ports: Vec<u16> = Vec::new();
    for path in ["/proc/net/tcp", "/proc/net/tcp6"] {
        match std::fs::read_to_string(path) {
            Ok(content) => collect_listening_ports(&content, &mut ports),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(CtError::ListeningPorts(err)),
        }
    }
    ports.sort_unstable();
    ports.dedup();
    Ok(ports.iter().map(|p| p.to_string()).collect())
}

fn collect_listening_ports(content: &str, out: &mut Vec<u16>) {
    for line in content.lines().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 || fields[3] != LISTEN_STATE {
            continue;
        }
        // local_address is "<hex addr>:<hex port>"; only the port matters.
        let port_hex = match fields[1].rsplit_once(':') {
            Some((_, hex)) => hex,
            None => continue,
        };
        if let Ok(port) = u16::from_str_radix(port_hex, 16) {
            out.push(port);
        }
    }
}
