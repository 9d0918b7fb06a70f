use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::client::{Query, QueryClient};
use crate::dns::constants::DNS_PORT;
use crate::dns::enums::DNSResourceType;
use crate::dns::rdata::RData;
use crate::error::{DnsError, Result};
use crate::inspect::lookup::lookup;

/// Turns a nameserver hostname into its IPv4 and IPv6 addresses.
#[async_trait]
pub trait AddressResolver: Send + Sync {
    async fn resolve_addresses(&self, host: &str) -> Result<Vec<IpAddr>>;
}

/// Resolves A and AAAA records through the recursive resolvers.
///
/// A family with no data contributes nothing; any other failure of either
/// lookup fails the whole resolution, as does ending up with no address.
pub struct UpstreamAddressResolver {
    client: Arc<dyn QueryClient>,
    resolvers: Vec<SocketAddr>,
}

impl UpstreamAddressResolver {
    pub fn new(client: Arc<dyn QueryClient>, resolvers: Vec<SocketAddr>) -> Self {
        Self { client, resolvers }
    }

    async fn family(&self, host: &str, qtype: DNSResourceType) -> Result<Vec<IpAddr>> {
        let query = Query::new(host, qtype);
        match lookup(self.client.as_ref(), &self.resolvers, &query).await {
            Ok(response) => Ok(response
                .answer_data(qtype)
                .filter_map(|rdata| match rdata {
                    RData::A(v4) => Some(IpAddr::V4(*v4)),
                    RData::AAAA(v6) => Some(IpAddr::V6(*v6)),
                    _ => None,
                })
                .collect()),
            Err(DnsError::NoAnswer { .. }) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl AddressResolver for UpstreamAddressResolver {
    async fn resolve_addresses(&self, host: &str) -> Result<Vec<IpAddr>> {
        let (v4, v6) = futures::join!(
            self.family(host, DNSResourceType::A),
            self.family(host, DNSResourceType::AAAA)
        );
        let mut addresses = v4?;
        addresses.extend(v6?);

        if addresses.is_empty() {
            return Err(DnsError::NoAnswer {
                name: host.to_string(),
                qtype: DNSResourceType::A,
            });
        }
        debug!("Resolved {} to {:?}", host, addresses);
        Ok(addresses)
    }
}

/// Resolves through the operating system's resolver.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAddressResolver;

#[async_trait]
impl AddressResolver for SystemAddressResolver {
    async fn resolve_addresses(&self, host: &str) -> Result<Vec<IpAddr>> {
        let bare = host.trim_end_matches('.');
        let mut addresses: Vec<IpAddr> = tokio::net::lookup_host((bare, DNS_PORT))
            .await?
            .map(|sa| sa.ip())
            .collect();
        addresses.dedup();

        if addresses.is_empty() {
            return Err(DnsError::NoAnswer {
                name: host.to_string(),
                qtype: DNSResourceType::A,
            });
        }
        Ok(addresses)
    }
}
