pub mod entry;
pub mod flow;
pub mod source;

use std::collections::HashSet;
use std::io::{BufRead, BufReader, Read};

use crate::error::CtError;

use self::entry::{decode_entry, RawEntry};
use self::flow::{insert_flow, FlowDirection, FlowStat, HostFlow, HostFlowMap};

/// Port filters selecting which connections become flows.
///
/// The two sets behave differently when empty: an empty active set admits
/// every destination port, while an empty passive set admits none. Passive
/// classification needs to know which ports are ours, or every inbound
/// scan and stray packet would show up as a listener.
#[derive(Debug, Clone, Default)]
pub struct FilterPorts {
    pub active: HashSet<String>,
    pub passive: HashSet<String>,
}

impl FilterPorts {
    pub fn admits_active(&self, port: &str) -> bool {
        self.active.is_empty() || self.active.contains(port)
    }

    pub fn admits_passive(&self, port: &str) -> bool {
        self.passive.contains(port)
    }
}

/// Decide which side of a connection this host is on.
///
/// For each local address, in order, four rules are tried and the first
/// match wins:
///
/// 1. we are the original source, so we dialed out (active)
/// 2. the reply comes back to us, so we dialed out through NAT (active)
/// 3. we are the original destination on a service port (passive)
/// 4. the reply leaves from us on a service port (passive)
///
/// Callers pass `local_addrs` already sorted so the outcome for a
/// connection between two local addresses does not depend on enumeration
/// order. Returns `None` when no rule matches.
pub fn classify(
    entry: &RawEntry,
    local_addrs: &[String],
    filters: &FilterPorts,
) -> Option<HostFlow> {
    for addr in local_addrs {
        if entry.original.src_addr == *addr && filters.admits_active(&entry.original.dst_port) {
            return Some(HostFlow::active(
                entry.original.dst_addr.clone(),
                entry.original.dst_port.clone(),
                FlowStat::from_entry(FlowDirection::Active, entry),
            ));
        }
        if entry.reply.dst_addr == *addr && filters.admits_active(&entry.reply.src_port) {
            return Some(HostFlow::active(
                entry.reply.src_addr.clone(),
                entry.reply.src_port.clone(),
                FlowStat::from_entry(FlowDirection::Active, entry),
            ));
        }
        if entry.original.dst_addr == *addr && filters.admits_passive(&entry.original.dst_port) {
            return Some(HostFlow::passive(
                entry.original.dst_port.clone(),
                entry.original.src_addr.clone(),
                FlowStat::from_entry(FlowDirection::Passive, entry),
            ));
        }
        if entry.reply.src_addr == *addr && filters.admits_passive(&entry.reply.src_port) {
            return Some(HostFlow::passive(
                entry.reply.src_port.clone(),
                entry.reply.dst_addr.clone(),
                FlowStat::from_entry(FlowDirection::Passive, entry),
            ));
        }
    }
    None
}

/// Read a conntrack table and aggregate it into host flows.
///
/// Lines that are not TCP records pass through silently. Lines that look
/// like records but cannot be decoded are logged and skipped, so one
/// mangled entry never loses the rest of the table. Only I/O errors on
/// the underlying reader abort the pass.
pub fn parse_entries<R: Read>(
    source: R,
    local_addrs: &[String],
    filters: &FilterPorts,
) -> Result<HostFlowMap, CtError> {
    let mut addrs = local_addrs.to_vec();
    addrs.sort();
    addrs.dedup();

    let mut flows = HostFlowMap::default();
    for line in BufReader::new(source).lines() {
        let line = line.map_err(CtError::Read)?;
        let entry = match decode_entry(&line) {
            Ok(Some(entry)) => entry,
            Ok(None) => continue,
            Err(err) => {
                log::warn!("skipping conntrack line: {err}");
                continue;
            }
        };
        if let Some(flow) = classify(&entry, &addrs, filters) {
            insert_flow(&mut flows, flow);
        }
    }
    Ok(flows)
}
