use std::net::IpAddr;
use std::time::Duration;

use thiserror::Error;

use crate::dns::ParseError;
use crate::dns::enums::DNSResourceType;
use crate::report::{ProbeKind, ZoneReport};

/// Failure of a single DNS exchange or lookup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DnsError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid DNS packet: {0}")]
    InvalidPacket(String),

    #[error("Query timed out")]
    Timeout,

    #[error("Response id {got} does not match query id {expected}")]
    IdMismatch { expected: u16, got: u16 },

    #[error("Non-existent domain: {0}")]
    NxDomain(String),

    #[error("No {qtype} records for {name}")]
    NoAnswer { name: String, qtype: DNSResourceType },

    #[error("Server answered with rcode {0}")]
    Rcode(u8),

    #[error("No recursive resolvers configured")]
    NoResolvers,
}

impl DnsError {
    /// NXDOMAIN or NOERROR/NODATA
    pub fn is_negative_answer(&self) -> bool {
        matches!(self, DnsError::NxDomain(_) | DnsError::NoAnswer { .. })
    }
}

impl From<std::io::Error> for DnsError {
    fn from(err: std::io::Error) -> Self {
        DnsError::Io(err.to_string())
    }
}

impl From<ParseError> for DnsError {
    fn from(err: ParseError) -> Self {
        DnsError::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DnsError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid resolver address: {0}")]
    InvalidResolver(String),
    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),
    #[error("Invalid concurrency limit: {0}")]
    InvalidConcurrency(String),
    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

/// Everything that can go wrong while inspecting a zone. Only the kinds
/// for which `is_fatal` holds abort a run; the rest end up in the debug
/// trace.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InspectError {
    #[error("{zone} is not a zone")]
    NotAZone { zone: String },

    #[error("{qtype} query for {name} timed out")]
    QueryTimeout { name: String, qtype: DNSResourceType },

    #[error("no nameservers found for {zone}")]
    NoNameservers { zone: String },

    #[error("unable to resolve addresses of {host}: {source}")]
    Resolution { host: String, source: DnsError },

    #[error("{probe} probe of {address} failed: {source}")]
    Probe {
        probe: ProbeKind,
        address: IpAddr,
        source: DnsError,
    },

    #[error("{qtype} lookup for {name} failed: {source}")]
    DnssecLookup {
        name: String,
        qtype: DNSResourceType,
        source: DnsError,
    },

    #[error("inspection of {zone} did not finish within {deadline:?}")]
    DeadlineExceeded { zone: String, deadline: Duration },
}

impl InspectError {
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            InspectError::NotAZone { .. }
                | InspectError::QueryTimeout { .. }
                | InspectError::NoNameservers { .. }
                | InspectError::DeadlineExceeded { .. }
        )
    }
}

/// A fatal inspection error together with the stub report of the run:
/// zone name only, zero duration.
#[derive(Error, Debug, Clone)]
#[error("{error}")]
pub struct InspectFailure {
    #[source]
    pub error: InspectError,
    pub report: Box<ZoneReport>,
}
