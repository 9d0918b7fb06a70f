pub mod client;
pub mod config;
pub mod dns;
pub mod dnssec;
pub mod error;
pub mod inspect;
pub mod render;
pub mod report;
pub mod resolver;
pub mod trace;

pub use client::{NetworkClient, Query, QueryClient, Transport};
pub use config::InspectConfig;
pub use dns::DNSPacket;
pub use error::{ConfigError, DnsError, InspectError, InspectFailure};
pub use inspect::ZoneInspector;
pub use report::{KeySignature, NameServer, Nsec3Params, Zone, ZoneReport};
pub use resolver::{AddressResolver, SystemAddressResolver, UpstreamAddressResolver};
pub use trace::{DebugTrace, TraceSink};
