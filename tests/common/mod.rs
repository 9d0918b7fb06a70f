//! Scripted network collaborators shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use zoneinfo::{
    client::{Query, QueryClient, Transport},
    config::InspectConfig,
    dns::{
        DNSPacket,
        constants::DNSRcode,
        enums::DNSResourceType,
        rdata::{DnsKey, Ds, Nsec3Param, RData, Rrsig, Soa},
        resource::DNSResource,
    },
    dnssec::calculate_key_tag,
    error::{DnsError, Result},
    resolver::AddressResolver,
};

/// What the recursive resolvers say about one (name, type).
#[derive(Clone, Debug)]
pub enum MockAnswer {
    Records(Vec<RData>),
    /// Truncated over UDP, complete over TCP
    Truncated(Vec<RData>),
    Rcode(u8),
    Timeout,
}

/// Which probes an authoritative address answers.
#[derive(Clone, Copy, Debug)]
pub struct ServerBehavior {
    pub udp: bool,
    pub tcp: bool,
    pub edns: bool,
}

impl ServerBehavior {
    pub fn all() -> Self {
        Self {
            udp: true,
            tcp: true,
            edns: true,
        }
    }

    pub fn no_edns() -> Self {
        Self {
            edns: false,
            ..Self::all()
        }
    }

    pub fn udp_only() -> Self {
        Self {
            udp: true,
            tcp: false,
            edns: false,
        }
    }
}

/// `QueryClient` that answers recursive queries from a table and
/// non-recursive (authoritative) queries per server address.
#[derive(Default)]
pub struct MockClient {
    answers: HashMap<(String, DNSResourceType), MockAnswer>,
    servers: HashMap<IpAddr, ServerBehavior>,
    dead_resolvers: HashSet<SocketAddr>,
    delay: Option<Duration>,
    calls: Mutex<Vec<(SocketAddr, Query)>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(self, name: &str, qtype: DNSResourceType, records: Vec<RData>) -> Self {
        self.answer_with(name, qtype, MockAnswer::Records(records))
    }

    pub fn answer_with(mut self, name: &str, qtype: DNSResourceType, answer: MockAnswer) -> Self {
        self.answers.insert((name.to_string(), qtype), answer);
        self
    }

    pub fn server(mut self, address: &str, behavior: ServerBehavior) -> Self {
        self.servers.insert(address.parse().unwrap(), behavior);
        self
    }

    /// Resolver that times out on every query.
    pub fn dead_resolver(mut self, resolver: SocketAddr) -> Self {
        self.dead_resolvers.insert(resolver);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<(SocketAddr, Query)> {
        self.calls.lock().clone()
    }

    /// Recursive queries of the given type that were sent.
    pub fn recursive_queries(&self, qtype: DNSResourceType) -> Vec<Query> {
        self.calls
            .lock()
            .iter()
            .filter(|(_, q)| q.recursion_desired && q.qtype == qtype)
            .map(|(_, q)| q.clone())
            .collect()
    }

    fn recursive_answer(&self, query: &Query) -> Result<DNSPacket> {
        let mut response = query.to_packet(1).generate_response();
        response.header.ra = true;

        let records = match self.answers.get(&(query.name.clone(), query.qtype)) {
            None => return Ok(response),
            Some(MockAnswer::Timeout) => return Err(DnsError::Timeout),
            Some(MockAnswer::Rcode(rcode)) => {
                response.header.rcode = *rcode;
                return Ok(response);
            }
            Some(MockAnswer::Truncated(_)) if query.transport == Transport::Udp => {
                response.header.tc = true;
                return Ok(response);
            }
            Some(MockAnswer::Records(records)) | Some(MockAnswer::Truncated(records)) => records,
        };

        for rdata in records {
            response
                .answers
                .push(DNSResource::new(&query.name, 3600, rdata.clone()).unwrap());
        }
        Ok(response)
    }

    fn authoritative_answer(&self, query: &Query, server: SocketAddr) -> Result<DNSPacket> {
        let behavior = self
            .servers
            .get(&server.ip())
            .copied()
            .ok_or(DnsError::Timeout)?;

        let answers = match query.transport {
            Transport::Tcp => behavior.tcp,
            Transport::Udp => behavior.udp,
        };
        if !answers {
            return Err(DnsError::Timeout);
        }

        let mut response = query.to_packet(1).generate_response();
        response.header.aa = true;
        response
            .answers
            .push(DNSResource::new(&query.name, 3600, soa(&query.name)).unwrap());
        if query.edns.is_some() && behavior.edns {
            response.add_edns(1232, false);
        }
        Ok(response)
    }
}

#[async_trait]
impl QueryClient for MockClient {
    async fn query(&self, query: &Query, server: SocketAddr) -> Result<DNSPacket> {
        self.calls.lock().push((server, query.clone()));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if query.recursion_desired {
            if self.dead_resolvers.contains(&server) {
                return Err(DnsError::Timeout);
            }
            self.recursive_answer(query)
        } else {
            self.authoritative_answer(query, server)
        }
    }
}

/// `AddressResolver` backed by a fixed table; unknown hosts have no addresses.
#[derive(Default)]
pub struct MockResolver {
    hosts: HashMap<String, std::result::Result<Vec<IpAddr>, DnsError>>,
}

impl MockResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host(mut self, name: &str, addresses: &[&str]) -> Self {
        let addresses = addresses.iter().map(|a| a.parse().unwrap()).collect();
        self.hosts.insert(name.to_string(), Ok(addresses));
        self
    }

    pub fn failing(mut self, name: &str, error: DnsError) -> Self {
        self.hosts.insert(name.to_string(), Err(error));
        self
    }
}

#[async_trait]
impl AddressResolver for MockResolver {
    async fn resolve_addresses(&self, host: &str) -> Result<Vec<IpAddr>> {
        match self.hosts.get(host) {
            Some(result) => result.clone(),
            None => Err(DnsError::NoAnswer {
                name: host.to_string(),
                qtype: DNSResourceType::A,
            }),
        }
    }
}

pub fn test_config() -> InspectConfig {
    InspectConfig {
        resolvers: vec!["192.0.2.53:53".parse().unwrap()],
        query_timeout: Duration::from_secs(1),
        ..Default::default()
    }
}

pub fn soa(zone: &str) -> RData {
    RData::SOA(Soa {
        mname: format!("ns1.{}", zone),
        rname: format!("hostmaster.{}", zone),
        serial: 2024060101,
        refresh: 7200,
        retry: 3600,
        expire: 1209600,
        minimum: 3600,
    })
}

pub fn ns(host: &str) -> RData {
    RData::NS(host.to_string())
}

/// A DNSKEY whose computed keytag is `tag`.
pub fn key_with_tag(flags: u16, algorithm: u8, tag: u16) -> DnsKey {
    // RSA exponent 65537 followed by a fixed modulus prefix
    let body = hex::decode("030100010000c0ffee5eed0123456789abcdef00112233445566778899aabbcc").unwrap();

    for seed in 0..=u8::MAX {
        let mut public_key = body.clone();
        public_key[4] = seed;
        public_key.extend_from_slice(&[0, 0]);
        let last = public_key.len() - 2;
        for filler in 0..=u16::MAX {
            public_key[last..].copy_from_slice(&filler.to_be_bytes());
            if calculate_key_tag(flags, 3, algorithm, &public_key) == tag {
                return DnsKey {
                    flags,
                    protocol: 3,
                    algorithm,
                    public_key,
                };
            }
        }
    }
    panic!("no key with tag {}", tag);
}

pub fn ksk(algorithm: u8, tag: u16) -> RData {
    RData::DNSKEY(key_with_tag(257, algorithm, tag))
}

pub fn zsk(algorithm: u8, tag: u16) -> RData {
    RData::DNSKEY(key_with_tag(256, algorithm, tag))
}

/// RRSIG over the DNSKEY set, valid from a week ago until `days_left` from now.
pub fn dnskey_rrsig(zone: &str, key_tag: u16, algorithm: u8, days_left: i64) -> RData {
    let now = Utc::now().timestamp();
    RData::RRSIG(Rrsig {
        type_covered: DNSResourceType::DNSKEY,
        algorithm,
        labels: zone.trim_end_matches('.').split('.').count() as u8,
        original_ttl: 3600,
        expiration: (now + days_left * 86400) as u32,
        inception: (now - 7 * 86400) as u32,
        key_tag,
        signer_name: zone.to_string(),
        signature: vec![0x5A; 256],
    })
}

pub fn ds(key_tag: u16, algorithm: u8) -> RData {
    RData::DS(Ds {
        key_tag,
        algorithm,
        digest_type: 2,
        digest: vec![0xD5; 32],
    })
}

pub fn dlv(key_tag: u16, algorithm: u8) -> RData {
    RData::DLV(Ds {
        key_tag,
        algorithm,
        digest_type: 2,
        digest: vec![0xD1; 32],
    })
}

pub fn nsec3param(iterations: u16, salt: &[u8]) -> RData {
    RData::NSEC3PARAM(Nsec3Param {
        hash_algorithm: 1,
        flags: 0,
        iterations,
        salt: salt.to_vec(),
    })
}

pub fn nxdomain() -> MockAnswer {
    MockAnswer::Rcode(DNSRcode::NXDOMAIN)
}
