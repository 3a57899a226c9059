use std::collections::HashMap;
use std::io::Write;

use crate::conntrack::flow::{FlowDirection, HostFlow};
use crate::error::CtError;
use crate::output::NO_NAME;

/// Write flows as a human-readable aligned table.
///
/// One row per aggregated flow; the arrow column points away from the
/// local host for active opens and toward it for passive opens.
pub fn write_table(
    rows: &[&HostFlow],
    names: &HashMap<String, String>,
    writer: &mut impl Write,
) -> Result<(), CtError> {
    write_table_inner(rows, names, writer).map_err(CtError::Serialization)
}

fn write_table_inner(
    rows: &[&HostFlow],
    names: &HashMap<String, String>,
    w: &mut impl Write,
) -> Result<(), std::io::Error> {
    writeln!(
        w,
        "{:<16} {:^4} {:<21} {:<32} {:>8} {:>12} {:>8} {:>12}",
        "LOCAL:PORT",
        "<-->",
        "PEER:PORT",
        "FQDN",
        "IN_PKTS",
        "IN_BYTES",
        "OUT_PKTS",
        "OUT_BYTES",
    )?;

    for flow in rows {
        let arrow = match flow.direction {
            FlowDirection::Active => "-->",
            FlowDirection::Passive => "<--",
            FlowDirection::Unknown => "?",
        };
        let fqdn = names.get(&flow.peer.addr).map(String::as_str).unwrap_or(NO_NAME);
        writeln!(
            w,
            "{:<16} {:^4} {:<21} {:<32} {:>8} {:>12} {:>8} {:>12}",
            flow.local.to_string(),
            arrow,
            flow.peer.to_string(),
            truncate(fqdn, 32),
            flow.stat.total_inbound_packets,
            flow.stat.total_inbound_bytes,
            flow.stat.total_outbound_packets,
            flow.stat.total_outbound_bytes,
        )?;
    }

    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    // Hostnames from NSS can be non-ASCII; the cut must land on a char
    // boundary or the slice panics.
    let mut cut = max - 3;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &s[..cut])
}
