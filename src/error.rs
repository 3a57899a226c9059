use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CtError {
    #[error("no conntrack table found (tried {tried}): is the nf_conntrack module loaded?")]
    TableNotFound { tried: String },
    #[error("cannot open {}: {source}", path.display())]
    OpenTable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("read error: {0}")]
    Read(#[source] std::io::Error),
    #[error("malformed conntrack line ({reason}): {line:?}")]
    MalformedLine { reason: &'static str, line: String },
    #[error("local address lookup error: {0}")]
    AddressLookup(#[source] std::io::Error),
    #[error("listening port lookup error: {0}")]
    ListeningPorts(#[source] std::io::Error),

    #[error("resolver error: {0}")]
    Resolver(#[source] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[source] std::io::Error),
}
