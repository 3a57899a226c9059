use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::CtError;

/// Resolve reverse DNS names for a batch of peer addresses.
///
/// Spawns `n_workers` lookup threads and waits up to `deadline` for the
/// whole batch. The returned map only holds addresses that resolved:
/// strings that do not parse as an IP, lookups that fail, and lookups
/// still in flight at the deadline are left out, and the caller renders
/// those peers without a name.
///
/// The deadline bounds the wait, not the lookups themselves: a worker
/// still blocked in the resolver when it expires keeps running until its
/// call returns or the process exits, so at most `n_workers` threads can
/// outlive the batch.
pub fn resolve_peer_names(
    addrs: &[String],
    n_workers: usize,
    deadline: Duration,
) -> Result<HashMap<String, String>, CtError> {
    let mut seen = HashSet::new();
    let mut queries: Vec<(String, IpAddr)> = Vec::new();
    for addr in addrs {
        if let Ok(ip) = addr.parse::<IpAddr>() {
            if seen.insert(addr.clone()) {
                queries.push((addr.clone(), ip));
            }
        }
    }
    if queries.is_empty() {
        return Ok(HashMap::new());
    }

    // Both channels are sized to the batch, so enqueueing never blocks and
    // workers never stall on a full result channel.
    let (query_tx, query_rx) = crossbeam_channel::bounded::<(String, IpAddr)>(queries.len());
    let (result_tx, result_rx) = mpsc::sync_channel::<(String, Option<String>)>(queries.len());

    let n_workers = n_workers.clamp(1, queries.len());
    for i in 0..n_workers {
        let rx = query_rx.clone();
        let tx = result_tx.clone();
        thread::Builder::new()
            .name(format!("ctstat-rdns-{i}"))
            .spawn(move || {
                rdns_worker(rx, tx);
            })
            .map_err(CtError::Resolver)?;
    }
    drop(result_tx);

    let mut outstanding = queries.len();
    for query in queries {
        if query_tx.send(query).is_err() {
            outstanding -= 1;
        }
    }
    // Workers exit once the queue drains.
    drop(query_tx);

    let mut names = HashMap::new();
    let started = Instant::now();
    while outstanding > 0 {
        let remaining = match deadline.checked_sub(started.elapsed()) {
            Some(d) => d,
            None => break,
        };
        match result_rx.recv_timeout(remaining) {
            Ok((addr, Some(name))) => {
                names.insert(addr, name);
                outstanding -= 1;
            }
            Ok((_, None)) => outstanding -= 1,
            // Deadline passed, or every worker is gone.
            Err(_) => break,
        }
    }
    Ok(names)
}

/// Worker thread: reads addresses from the work queue, performs the
/// blocking reverse lookup, sends results back. Exits when the query
/// channel is dropped.
fn rdns_worker(
    rx: crossbeam_channel::Receiver<(String, IpAddr)>,
    tx: mpsc::SyncSender<(String, Option<String>)>,
) {
    while let Ok((addr, ip)) = rx.recv() {
        let result = dns_lookup::lookup_addr(&ip).ok();
        if tx.send((addr, result)).is_err() {
            return; // result channel closed
        }
    }
}
