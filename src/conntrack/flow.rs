use std::collections::hash_map::Entry;
use std::fmt;

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::conntrack::entry::RawEntry;

/// Who opened the connection, relative to this host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowDirection {
    /// Matched no classification rule; discarded before aggregation.
    Unknown,
    /// The local host initiated the connection (active open).
    Active,
    /// The local host accepted the connection (passive open).
    Passive,
}

/// An `addr:port` endpoint. Both halves are the decoder's opaque strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddrPort {
    pub addr: String,
    pub port: String,
}

impl fmt::Display for AddrPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.addr, self.port)
    }
}

/// Accumulated traffic counters for one aggregated flow, seen from the
/// local host: inbound is what arrived here, outbound what this host sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FlowStat {
    pub total_inbound_packets: u64,
    pub total_inbound_bytes: u64,
    pub total_outbound_packets: u64,
    pub total_outbound_bytes: u64,
}

impl FlowStat {
    /// Map the kernel's original/reply counters onto inbound/outbound for a
    /// flow of the given direction.
    ///
    /// For an active open the original tuple is traffic this host sent, so
    /// it feeds the outbound counters and the reply tuple feeds inbound.
    /// For a passive open the peer initiated the connection, so the roles
    /// invert. The swap lives here and nowhere else.
    pub fn from_entry(direction: FlowDirection, entry: &RawEntry) -> FlowStat {
        let (inbound, outbound) = match direction {
            FlowDirection::Active => (&entry.reply, &entry.original),
            FlowDirection::Passive => (&entry.original, &entry.reply),
            FlowDirection::Unknown => return FlowStat::default(),
        };
        FlowStat {
            total_inbound_packets: inbound.packets,
            total_inbound_bytes: inbound.bytes,
            total_outbound_packets: outbound.packets,
            total_outbound_bytes: outbound.bytes,
        }
    }

    /// Field-wise accumulation. Addition only, so merging is commutative
    /// and associative: totals do not depend on the order lines were read.
    pub fn merge(&mut self, other: &FlowStat) {
        self.total_inbound_packets += other.total_inbound_packets;
        self.total_inbound_bytes += other.total_inbound_bytes;
        self.total_outbound_packets += other.total_outbound_packets;
        self.total_outbound_bytes += other.total_outbound_bytes;
    }
}

/// One aggregated host flow: this host on one side, a peer on the other.
///
/// The collapsed side of each endpoint renders as `many`: an active flow
/// reaches the peer from whatever ephemeral ports, a passive flow receives
/// from whatever peer client ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostFlow {
    pub direction: FlowDirection,
    pub local: AddrPort,
    pub peer: AddrPort,
    pub stat: FlowStat,
}

const LOCAL_LABEL: &str = "localhost";
const PORT_MANY: &str = "many";

impl HostFlow {
    /// Active open: this host dialed out to `peer_addr:peer_port`.
    pub fn active(peer_addr: String, peer_port: String, stat: FlowStat) -> Self {
        HostFlow {
            direction: FlowDirection::Active,
            local: AddrPort {
                addr: LOCAL_LABEL.to_string(),
                port: PORT_MANY.to_string(),
            },
            peer: AddrPort {
                addr: peer_addr,
                port: peer_port,
            },
            stat,
        }
    }

    /// Passive open: `peer_addr` connected to our listening `local_port`.
    pub fn passive(local_port: String, peer_addr: String, stat: FlowStat) -> Self {
        HostFlow {
            direction: FlowDirection::Passive,
            local: AddrPort {
                addr: LOCAL_LABEL.to_string(),
                port: local_port,
            },
            peer: AddrPort {
                addr: peer_addr,
                port: PORT_MANY.to_string(),
            },
            stat,
        }
    }

    /// Aggregation identity, or `None` for a flow with no direction.
    ///
    /// The direction is the variant tag, so active and passive flows can
    /// never merge, and the `many` side of each direction stays out of the
    /// key: a busy listener aggregates all of a client's ephemeral ports
    /// into one entry.
    pub fn key(&self) -> Option<FlowKey> {
        match self.direction {
            FlowDirection::Active => Some(FlowKey::Active {
                peer_addr: self.peer.addr.clone(),
                peer_port: self.peer.port.clone(),
            }),
            FlowDirection::Passive => Some(FlowKey::Passive {
                local_port: self.local.port.clone(),
                peer_addr: self.peer.addr.clone(),
            }),
            FlowDirection::Unknown => None,
        }
    }
}

/// Aggregation identity for a host flow.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FlowKey {
    Active {
        peer_addr: String,
        peer_port: String,
    },
    Passive {
        local_port: String,
        peer_addr: String,
    },
}

/// Flow store for one parse pass: aggregation identity to accumulated flow.
pub type HostFlowMap = FxHashMap<FlowKey, HostFlow>;

/// Merge a classified flow into the store. The first sighting of an
/// identity inserts it; every later sighting adds its counters field-wise,
/// never overwriting.
pub fn insert_flow(flows: &mut HostFlowMap, flow: HostFlow) {
    if let Some(key) = flow.key() {
        match flows.entry(key) {
            Entry::Occupied(mut e) => e.get_mut().stat.merge(&flow.stat),
            Entry::Vacant(e) => {
                e.insert(flow);
            }
        }
    }
}
