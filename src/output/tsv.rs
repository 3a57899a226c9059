use std::collections::HashMap;
use std::io::Write;

use crate::conntrack::flow::{FlowDirection, HostFlow};
use crate::error::CtError;
use crate::output::NO_NAME;

/// Write flows as TSV.
///
/// Output: header row + one data row per flow, in the order given.
/// Columns are tab-separated: direction, local, peer, fqdn,
/// in_packets, in_bytes, out_packets, out_bytes.
pub fn write_tsv(
    rows: &[&HostFlow],
    names: &HashMap<String, String>,
    writer: &mut impl Write,
) -> Result<(), CtError> {
    writeln!(
        writer,
        "direction\tlocal\tpeer\tfqdn\tin_packets\tin_bytes\tout_packets\tout_bytes"
    )
    .map_err(CtError::Serialization)?;

    for flow in rows {
        let fqdn = names.get(&flow.peer.addr).map(String::as_str).unwrap_or(NO_NAME);
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            direction_label(flow),
            flow.local,
            flow.peer,
            escape_tsv(fqdn),
            flow.stat.total_inbound_packets,
            flow.stat.total_inbound_bytes,
            flow.stat.total_outbound_packets,
            flow.stat.total_outbound_bytes,
        )
        .map_err(CtError::Serialization)?;
    }

    Ok(())
}

fn direction_label(flow: &HostFlow) -> &'static str {
    match flow.direction {
        FlowDirection::Active => "active",
        FlowDirection::Passive => "passive",
        FlowDirection::Unknown => "unknown",
    }
}

/// Escape tabs and newlines in a string for TSV output.
fn escape_tsv(s: &str) -> String {
    s.replace(['\t', '\n', '\r'], " ")
}
