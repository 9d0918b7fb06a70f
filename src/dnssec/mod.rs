pub mod algorithm;
pub mod digest;
pub mod key_tag;

pub use algorithm::{DnsSecAlgorithm, algorithm_name};
pub use digest::{DigestType, digest_name};
pub use key_tag::{calculate_key_tag, is_secure_entry_point};

/// EDNS payload size used for DNSSEC lookups
pub const DNSSEC_UDP_SIZE: u16 = 4096;
