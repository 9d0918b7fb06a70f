use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::trace::DebugTrace;

/// The zone under inspection: the name as given and its normalised,
/// fully qualified form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Zone {
    pub name: String,
    pub fqdn: String,
}

impl Zone {
    pub fn new(name: &str) -> Self {
        let name = name.trim();
        let bare = name.trim_end_matches('.').to_ascii_lowercase();
        let fqdn = if name.is_empty() {
            String::new()
        } else if bare.is_empty() {
            ".".to_string()
        } else {
            format!("{}.", bare)
        };
        Self {
            name: name.to_string(),
            fqdn,
        }
    }

    /// Syntactic sanity: non-empty, labels of 1..=63 octets, at most 255 in total
    pub fn is_well_formed(&self) -> bool {
        if self.fqdn == "." {
            return true;
        }
        if self.fqdn.len() < 2 || self.fqdn.len() > 254 {
            return false;
        }
        self.fqdn
            .trim_end_matches('.')
            .split('.')
            .all(|label| !label.is_empty() && label.len() <= 63)
    }

    /// Name below this zone, e.g. the DLV lookup name `zone.dlv.isc.org.`
    pub fn under(&self, suffix: &str) -> String {
        let suffix = suffix.trim_start_matches('.');
        if self.fqdn == "." {
            suffix.to_string()
        } else {
            format!("{}{}", self.fqdn, suffix)
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fqdn)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NameServer {
    pub name: String,
    pub ipv4: Vec<Ipv4Addr>,
    pub ipv6: Vec<Ipv6Addr>,
}

impl NameServer {
    /// Split resolved addresses per family, dropping repeats.
    pub fn new(name: impl Into<String>, addresses: &[IpAddr]) -> Self {
        let mut ipv4 = Vec::new();
        let mut ipv6 = Vec::new();
        for address in addresses {
            match address {
                IpAddr::V4(v4) if !ipv4.contains(v4) => ipv4.push(*v4),
                IpAddr::V6(v6) if !ipv6.contains(v6) => ipv6.push(*v6),
                _ => {}
            }
        }
        Self {
            name: name.into(),
            ipv4,
            ipv6,
        }
    }

    /// IPv4 addresses first, then IPv6
    pub fn addresses(&self) -> impl Iterator<Item = IpAddr> + '_ {
        self.ipv4
            .iter()
            .map(|a| IpAddr::V4(*a))
            .chain(self.ipv6.iter().map(|a| IpAddr::V6(*a)))
    }

    pub fn address_count(&self) -> usize {
        self.ipv4.len() + self.ipv6.len()
    }
}

/// (keytag, algorithm); used for KSKs, ZSKs and DS/DLV digests alike
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct KeySignature {
    pub keytag: u16,
    pub algorithm: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Nsec3Params {
    pub hash_algorithm: u8,
    pub flags: u8,
    pub iterations: u16,
    pub salt_length: u8,
}

/// Validity period of one RRSIG over the DNSKEY set
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SignatureWindow {
    pub keytag: u16,
    pub algorithm: u8,
    pub inception: Option<DateTime<Utc>>,
    pub expiration: Option<DateTime<Utc>>,
    pub expired: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ProbeKind {
    Udp,
    Tcp,
    Edns0,
}

impl ProbeKind {
    pub const ALL: [ProbeKind; 3] = [ProbeKind::Udp, ProbeKind::Tcp, ProbeKind::Edns0];
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeKind::Udp => f.write_str("DNS/UDP"),
            ProbeKind::Tcp => f.write_str("DNS/TCP"),
            ProbeKind::Edns0 => f.write_str("EDNS0"),
        }
    }
}

/// Which probes a single nameserver address answered
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AddressStatus {
    pub nameserver: String,
    pub address: IpAddr,
    pub udp: bool,
    pub tcp: bool,
    pub edns0: bool,
}

/// Success counters for one probe kind, overall and per address family
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SuccessCount {
    pub all: usize,
    pub ip4: usize,
    pub ip6: usize,
}

impl SuccessCount {
    pub fn record(&mut self, address: IpAddr) {
        self.all += 1;
        match address {
            IpAddr::V4(_) => self.ip4 += 1,
            IpAddr::V6(_) => self.ip6 += 1,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ZoneReport {
    pub zone: Zone,

    /// NS records returned for the zone, including ones that did not resolve
    pub ns_count_all: usize,
    pub ns_count_ip4: usize,
    pub ns_count_ip6: usize,
    pub nsaddr_count_all: usize,
    pub nsaddr_count_ip4: usize,
    pub nsaddr_count_ip6: usize,
    pub nsaddr_success_udp: SuccessCount,
    pub nsaddr_success_tcp: SuccessCount,
    pub nsaddr_success_edns0: SuccessCount,

    pub has_ip6: bool,
    pub has_tcp: bool,
    pub has_dnssec: bool,
    pub has_nsec3: bool,
    pub has_ds: bool,
    pub has_dlv: bool,
    pub rrsig_expired: bool,

    pub nameservers: Vec<NameServer>,
    pub address_status: Vec<AddressStatus>,
    pub dnskey_ttl: Option<u32>,
    pub ksk_list: Vec<KeySignature>,
    pub zsk_list: Vec<KeySignature>,
    pub rrsig_windows: Vec<SignatureWindow>,
    pub nsec3_params: Vec<Nsec3Params>,
    pub ds_list: Vec<KeySignature>,
    pub dlv_list: Vec<KeySignature>,
    pub debug_trace: DebugTrace,

    pub check_start: DateTime<Utc>,
    pub check_duration: Duration,
}

impl ZoneReport {
    pub fn new(zone: Zone, debug_trace: DebugTrace) -> Self {
        Self {
            zone,
            ns_count_all: 0,
            ns_count_ip4: 0,
            ns_count_ip6: 0,
            nsaddr_count_all: 0,
            nsaddr_count_ip4: 0,
            nsaddr_count_ip6: 0,
            nsaddr_success_udp: SuccessCount::default(),
            nsaddr_success_tcp: SuccessCount::default(),
            nsaddr_success_edns0: SuccessCount::default(),
            has_ip6: false,
            has_tcp: false,
            has_dnssec: false,
            has_nsec3: false,
            has_ds: false,
            has_dlv: false,
            rrsig_expired: false,
            nameservers: Vec::new(),
            address_status: Vec::new(),
            dnskey_ttl: None,
            ksk_list: Vec::new(),
            zsk_list: Vec::new(),
            rrsig_windows: Vec::new(),
            nsec3_params: Vec::new(),
            ds_list: Vec::new(),
            dlv_list: Vec::new(),
            debug_trace,
            check_start: Utc::now(),
            check_duration: Duration::ZERO,
        }
    }

    /// The report handed back when a run aborts: zone name and start time only.
    pub fn stub(zone: Zone) -> Self {
        Self::new(zone, DebugTrace::new())
    }

    /// Add a resolved nameserver, keeping the address counters in step.
    pub fn record_nameserver(&mut self, nameserver: NameServer) {
        if !nameserver.ipv4.is_empty() {
            self.ns_count_ip4 += 1;
        }
        if !nameserver.ipv6.is_empty() {
            self.ns_count_ip6 += 1;
        }
        self.nsaddr_count_ip4 += nameserver.ipv4.len();
        self.nsaddr_count_ip6 += nameserver.ipv6.len();
        self.nsaddr_count_all = self.nsaddr_count_ip4 + self.nsaddr_count_ip6;
        self.has_ip6 |= !nameserver.ipv6.is_empty();
        self.nameservers.push(nameserver);
    }

    /// Every nameserver address answered over TCP. A zone without addresses
    /// does not count as TCP-reachable.
    pub fn all_tcp(&self) -> bool {
        self.nsaddr_count_all > 0 && self.nsaddr_success_tcp.all == self.nsaddr_count_all
    }

    /// Every nameserver address answered over UDP (derived, not stored).
    pub fn has_udp(&self) -> bool {
        self.nsaddr_count_all > 0 && self.nsaddr_success_udp.all == self.nsaddr_count_all
    }

    /// Addresses that did not answer the given probe
    pub fn unresponsive(&self, probe: ProbeKind) -> impl Iterator<Item = &AddressStatus> + '_ {
        self.address_status.iter().filter(move |s| match probe {
            ProbeKind::Udp => !s.udp,
            ProbeKind::Tcp => !s.tcp,
            ProbeKind::Edns0 => !s.edns0,
        })
    }

    pub fn ksk_for(&self, keytag: u16) -> Option<&KeySignature> {
        self.ksk_list.iter().find(|k| k.keytag == keytag)
    }
}
