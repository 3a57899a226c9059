use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::conntrack::flow::FlowDirection;
use crate::conntrack::FilterPorts;

#[derive(Parser, Debug)]
#[command(
    name = "ctstat",
    version,
    about = "Print aggregated connections between localhost and other hosts"
)]
pub struct Cli {
    /// Show connections this host opened (localhost to peer)
    #[arg(short = 'a', long)]
    pub active: bool,

    /// Show connections this host accepted (peer to localhost); defaults to
    /// filtering on the locally listening ports
    #[arg(short = 'p', long)]
    pub passive: bool,

    /// Count only active connections to this destination port (repeatable)
    #[arg(long = "active-port", alias = "aport", value_name = "PORT", value_parser = validate_port)]
    pub active_ports: Vec<String>,

    /// Count only passive connections on this listening port (repeatable)
    #[arg(long = "passive-port", alias = "pport", value_name = "PORT", value_parser = validate_port)]
    pub passive_ports: Vec<String>,

    /// Read conntrack entries from standard input
    #[arg(long)]
    pub stdin: bool,

    /// Read conntrack entries from this file instead of probing /proc
    #[arg(long, value_name = "PATH", conflicts_with = "stdin")]
    pub table: Option<PathBuf>,

    /// Show numeric addresses only, skipping reverse DNS
    #[arg(short = 'n', long)]
    pub numeric: bool,

    /// Output format
    #[arg(long, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Tsv,
    Json,
}

/// Which flow directions to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectionFilter {
    pub active: bool,
    pub passive: bool,
}

impl DirectionFilter {
    pub fn both() -> Self {
        DirectionFilter {
            active: true,
            passive: true,
        }
    }

    pub fn admits(&self, direction: FlowDirection) -> bool {
        match direction {
            FlowDirection::Active => self.active,
            FlowDirection::Passive => self.passive,
            FlowDirection::Unknown => false,
        }
    }
}

impl Cli {
    /// Direction selection: each flag narrows output to its direction,
    /// neither flag means both.
    pub fn direction_filter(&self) -> DirectionFilter {
        if !self.active && !self.passive {
            DirectionFilter::both()
        } else {
            DirectionFilter {
                active: self.active,
                passive: self.passive,
            }
        }
    }

    /// Port filters for the parse pass, before the listening-port default
    /// is applied.
    pub fn filter_ports(&self) -> FilterPorts {
        FilterPorts {
            active: self.active_ports.iter().cloned().collect(),
            passive: self.passive_ports.iter().cloned().collect(),
        }
    }

    /// True when passive flows are wanted but no explicit port list was
    /// given, so the listening-port default applies.
    pub fn wants_listening_port_default(&self) -> bool {
        self.direction_filter().passive && self.passive_ports.is_empty()
    }
}

fn validate_port(s: &str) -> Result<String, String> {
    match s.parse::<u16>() {
        Ok(_) => Ok(s.to_string()),
        Err(_) => Err(format!("'{s}' is not a port number")),
    }
}
