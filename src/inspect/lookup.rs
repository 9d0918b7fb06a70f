//! Recursive lookups through the configured resolvers.
//!
//! Resolvers are tried in order. A definite negative answer (NXDOMAIN or
//! NOERROR without data) ends the lookup; timeouts, transport errors and
//! other rcodes move on to the next resolver. A truncated UDP answer is
//! asked again over TCP on the same resolver.

use std::net::SocketAddr;

use tracing::{debug, warn};

use crate::client::{Query, QueryClient, Transport};
use crate::dns::DNSPacket;
use crate::dns::constants::DNSRcode;
use crate::error::{DnsError, Result};

pub async fn lookup(
    client: &dyn QueryClient,
    resolvers: &[SocketAddr],
    query: &Query,
) -> Result<DNSPacket> {
    let mut last_error = DnsError::NoResolvers;

    for &resolver in resolvers {
        let response = match exchange(client, resolver, query).await {
            Ok(response) => response,
            Err(e) => {
                debug!("Resolver {} failed for {}: {}", resolver, query, e);
                last_error = e;
                continue;
            }
        };

        match classify(query, response) {
            Ok(response) => return Ok(response),
            Err(e) if e.is_negative_answer() => return Err(e),
            Err(e) => {
                warn!("Resolver {} answered {} with an error: {}", resolver, query, e);
                last_error = e;
            }
        }
    }

    Err(last_error)
}

async fn exchange(
    client: &dyn QueryClient,
    resolver: SocketAddr,
    query: &Query,
) -> Result<DNSPacket> {
    let response = client.query(query, resolver).await?;
    if response.header.tc && query.transport == Transport::Udp {
        debug!("Truncated answer for {} from {}, retrying over TCP", query, resolver);
        let tcp_query = query.clone().over(Transport::Tcp);
        return client.query(&tcp_query, resolver).await;
    }
    Ok(response)
}

/// Map a response onto success or one of the negative outcomes.
pub fn classify(query: &Query, response: DNSPacket) -> Result<DNSPacket> {
    match response.header.rcode {
        DNSRcode::NOERROR => {
            if response.first_answer(query.qtype).is_some() {
                Ok(response)
            } else {
                Err(DnsError::NoAnswer {
                    name: query.name.clone(),
                    qtype: query.qtype,
                })
            }
        }
        DNSRcode::NXDOMAIN => Err(DnsError::NxDomain(query.name.clone())),
        rcode => Err(DnsError::Rcode(rcode)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::enums::DNSResourceType;
    use crate::dns::rdata::RData;
    use crate::dns::resource::DNSResource;

    fn response_for(query: &Query, rcode: u8) -> DNSPacket {
        let mut response = query.to_packet(1).generate_response();
        response.header.rcode = rcode;
        response
    }

    #[test]
    fn test_classify_nodata_and_nxdomain() {
        let query = Query::new("example.com.", DNSResourceType::SOA);

        let nodata = classify(&query, response_for(&query, DNSRcode::NOERROR));
        assert!(matches!(nodata, Err(DnsError::NoAnswer { .. })));

        let nxdomain = classify(&query, response_for(&query, DNSRcode::NXDOMAIN));
        assert_eq!(nxdomain.unwrap_err(), DnsError::NxDomain("example.com.".into()));

        let servfail = classify(&query, response_for(&query, DNSRcode::SERVFAIL));
        assert_eq!(servfail.unwrap_err(), DnsError::Rcode(DNSRcode::SERVFAIL));
    }

    #[test]
    fn test_classify_ignores_answers_of_other_types() {
        let query = Query::new("www.example.com.", DNSResourceType::AAAA);
        let mut response = response_for(&query, DNSRcode::NOERROR);
        response.answers.push(
            DNSResource::new("www.example.com.", 300, RData::A("192.0.2.1".parse().unwrap()))
                .unwrap(),
        );
        assert!(matches!(
            classify(&query, response),
            Err(DnsError::NoAnswer { .. })
        ));
    }
}
