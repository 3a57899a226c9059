pub mod cli;
pub mod conntrack;
pub mod enrichment;
pub mod error;
pub mod output;
pub mod system;
