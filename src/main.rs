use std::collections::HashMap;
use std::io;
use std::time::Duration;

use clap::Parser;

use ctstat::cli::{Cli, OutputFormat};
use ctstat::conntrack::{self, source};
use ctstat::enrichment::rdns;
use ctstat::error::CtError;
use ctstat::output;
use ctstat::system;

/// Reverse DNS batch settings: enough workers to hide a slow resolver, and
/// a bound on how long output may stall behind lookups.
const RDNS_WORKERS: usize = 8;
const RDNS_DEADLINE: Duration = Duration::from_secs(5);

/// Map an error to the process exit code.
fn exit_code(err: &CtError) -> i32 {
    match err {
        CtError::TableNotFound { .. } => 2,
        CtError::OpenTable { .. } | CtError::Read(_) => 3,
        CtError::AddressLookup(_) | CtError::ListeningPorts(_) => 4,
        _ => 1,
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(exit_code(&e));
    }
}

fn run(cli: Cli) -> Result<(), CtError> {
    // 1. Local addresses first: without them no line can be classified.
    let local_addrs = system::addresses::local_ipv4_addrs()?;
    log::debug!("local addresses: {local_addrs:?}");

    // 2. Port filters, applying the listening-port default to the passive
    //    side when no explicit list was given.
    let mut filters = cli.filter_ports();
    if cli.wants_listening_port_default() {
        let listening = system::ports::local_listening_ports()?;
        log::debug!("passive filter from {} listening ports", listening.len());
        filters.passive = listening.into_iter().collect();
    }

    // 3. Read the table and aggregate it into host flows.
    let flows = if cli.stdin {
        conntrack::parse_entries(io::stdin().lock(), &local_addrs, &filters)?
    } else {
        let path = match &cli.table {
            Some(path) => path.clone(),
            None => source::discover_table()?,
        };
        log::debug!("reading conntrack table from {}", path.display());
        let file = source::open_table(&path)?;
        conntrack::parse_entries(file, &local_addrs, &filters)?
    };

    // 4. Resolve peer names for the rows that will be shown. JSON output
    //    and --numeric skip resolution entirely.
    let filter = cli.direction_filter();
    let names = if cli.numeric || cli.format == OutputFormat::Json {
        HashMap::new()
    } else {
        let peers: Vec<String> = flows
            .values()
            .filter(|f| filter.admits(f.direction))
            .map(|f| f.peer.addr.clone())
            .collect();
        rdns::resolve_peer_names(&peers, RDNS_WORKERS, RDNS_DEADLINE)?
    };

    // 5. Render to stdout.
    output::write_flows(&flows, filter, cli.format, &names, &mut io::stdout().lock())
}
