pub mod json;
pub mod table;
pub mod tsv;

use std::collections::HashMap;
use std::io::Write;

use crate::cli::{DirectionFilter, OutputFormat};
use crate::conntrack::flow::{HostFlow, HostFlowMap};
use crate::error::CtError;

/// Placeholder for a peer with no resolved name.
pub const NO_NAME: &str = "-";

/// Render the flow table in the requested format.
///
/// Flows outside the direction filter are dropped; the rest are sorted by
/// total byte count descending so the busiest peers come first. `names`
/// maps peer addresses to reverse DNS names; pass an empty map to render
/// every peer numerically. JSON output never substitutes names.
pub fn write_flows(
    flows: &HostFlowMap,
    filter: DirectionFilter,
    format: OutputFormat,
    names: &HashMap<String, String>,
    writer: &mut impl Write,
) -> Result<(), CtError> {
    let rows = select_flows(flows, filter);
    match format {
        OutputFormat::Table => table::write_table(&rows, names, writer),
        OutputFormat::Tsv => tsv::write_tsv(&rows, names, writer),
        OutputFormat::Json => json::write_json(&rows, writer),
    }
}

/// Filter by direction, then order by total bytes descending with the peer
/// endpoint as tie-break so equal-volume rows come out stably.
fn select_flows(flows: &HostFlowMap, filter: DirectionFilter) -> Vec<&HostFlow> {
    let mut rows: Vec<&HostFlow> = flows
        .values()
        .filter(|f| filter.admits(f.direction))
        .collect();
    rows.sort_by(|a, b| {
        let total_a = a.stat.total_inbound_bytes + a.stat.total_outbound_bytes;
        let total_b = b.stat.total_inbound_bytes + b.stat.total_outbound_bytes;
        total_b
            .cmp(&total_a)
            .then_with(|| a.peer.addr.cmp(&b.peer.addr))
            .then_with(|| a.peer.port.cmp(&b.peer.port))
            .then_with(|| a.local.port.cmp(&b.local.port))
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conntrack::flow::{insert_flow, FlowStat};

    fn sample_flows() -> HostFlowMap {
        let mut flows = HostFlowMap::default();
        insert_flow(
            &mut flows,
            HostFlow::active(
                "10.0.100.1".into(),
                "3306".into(),
                FlowStat {
                    total_inbound_packets: 10,
                    total_inbound_bytes: 1000,
                    total_outbound_packets: 8,
                    total_outbound_bytes: 800,
                },
            ),
        );
        insert_flow(
            &mut flows,
            HostFlow::passive(
                "80".into(),
                "10.0.200.1".into(),
                FlowStat {
                    total_inbound_packets: 100,
                    total_inbound_bytes: 90000,
                    total_outbound_packets: 90,
                    total_outbound_bytes: 50000,
                },
            ),
        );
        flows
    }

    #[test]
    fn selection_respects_direction_filter() {
        let flows = sample_flows();

        let both = select_flows(&flows, DirectionFilter::both());
        assert_eq!(both.len(), 2);

        let active_only = select_flows(
            &flows,
            DirectionFilter {
                active: true,
                passive: false,
            },
        );
        assert_eq!(active_only.len(), 1);
        assert_eq!(active_only[0].peer.addr, "10.0.100.1");
    }

    #[test]
    fn selection_sorts_by_total_bytes_descending() {
        let flows = sample_flows();
        let rows = select_flows(&flows, DirectionFilter::both());
        // The passive flow carries 140000 bytes, the active one 1800.
        assert_eq!(rows[0].peer.addr, "10.0.200.1");
        assert_eq!(rows[1].peer.addr, "10.0.100.1");
    }

    #[test]
    fn equal_totals_order_by_peer_endpoint() {
        let mut flows = HostFlowMap::default();
        let stat = FlowStat {
            total_inbound_packets: 1,
            total_inbound_bytes: 10,
            total_outbound_packets: 1,
            total_outbound_bytes: 10,
        };
        insert_flow(&mut flows, HostFlow::active("10.0.0.9".into(), "443".into(), stat));
        insert_flow(&mut flows, HostFlow::active("10.0.0.2".into(), "443".into(), stat));

        let rows = select_flows(&flows, DirectionFilter::both());
        assert_eq!(rows[0].peer.addr, "10.0.0.2");
        assert_eq!(rows[1].peer.addr, "10.0.0.9");
    }
}
