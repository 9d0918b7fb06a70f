//! Reachability probing of every nameserver address.
//!
//! One future per (nameserver, address, probe kind), at most
//! `max_concurrent_probes` in flight. Each future yields a `ProbeOutcome`
//! and the outcomes are folded into a `ProbeTally`, whose counters do not
//! depend on completion order.

use std::collections::BTreeSet;
use std::net::{IpAddr, SocketAddr};

use futures::stream::{self, StreamExt};
use tracing::debug;

use super::ZoneInspector;
use crate::client::{Query, QueryClient, Transport};
use crate::dns::enums::DNSResourceType;
use crate::error::{DnsError, InspectError};
use crate::report::{AddressStatus, ProbeKind, SuccessCount, ZoneReport};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub nameserver: String,
    pub address: IpAddr,
    pub probe: ProbeKind,
    pub error: Option<DnsError>,
}

impl ProbeOutcome {
    pub fn answered(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProbeTally {
    pub udp: SuccessCount,
    pub tcp: SuccessCount,
    pub edns0: SuccessCount,
    answered: BTreeSet<(String, IpAddr, ProbeKind)>,
}

impl ProbeTally {
    pub fn record(&mut self, outcome: &ProbeOutcome) {
        if !outcome.answered() {
            return;
        }
        let key = (outcome.nameserver.clone(), outcome.address, outcome.probe);
        if !self.answered.insert(key) {
            return;
        }
        match outcome.probe {
            ProbeKind::Udp => self.udp.record(outcome.address),
            ProbeKind::Tcp => self.tcp.record(outcome.address),
            ProbeKind::Edns0 => self.edns0.record(outcome.address),
        }
    }

    pub fn answered(&self, nameserver: &str, address: IpAddr, probe: ProbeKind) -> bool {
        self.answered
            .contains(&(nameserver.to_string(), address, probe))
    }

    /// Copy the counters and per-address detail into the report.
    pub fn apply(&self, report: &mut ZoneReport) {
        report.nsaddr_success_udp = self.udp;
        report.nsaddr_success_tcp = self.tcp;
        report.nsaddr_success_edns0 = self.edns0;
        report.has_tcp = report.all_tcp();

        let status: Vec<AddressStatus> = report
            .nameservers
            .iter()
            .flat_map(|ns| {
                ns.addresses().map(move |address| AddressStatus {
                    nameserver: ns.name.clone(),
                    address,
                    udp: self.answered(&ns.name, address, ProbeKind::Udp),
                    tcp: self.answered(&ns.name, address, ProbeKind::Tcp),
                    edns0: self.answered(&ns.name, address, ProbeKind::Edns0),
                })
            })
            .collect();
        report.address_status = status;
    }
}

impl<'a> FromIterator<&'a ProbeOutcome> for ProbeTally {
    fn from_iter<I: IntoIterator<Item = &'a ProbeOutcome>>(iter: I) -> Self {
        let mut tally = ProbeTally::default();
        for outcome in iter {
            tally.record(outcome);
        }
        tally
    }
}

/// Non-recursive SOA query for one probe kind.
pub fn probe_query(zone: &str, probe: ProbeKind, edns_payload_size: u16) -> Query {
    let query = Query::new(zone, DNSResourceType::SOA).non_recursive();
    match probe {
        ProbeKind::Udp => query.over(Transport::Udp),
        ProbeKind::Tcp => query.over(Transport::Tcp),
        ProbeKind::Edns0 => query
            .over(Transport::Udp)
            .with_edns(edns_payload_size, false),
    }
}

/// Any response counts for UDP and TCP; EDNS0 also needs an OPT record
/// in the response.
pub async fn probe_address(
    client: &dyn QueryClient,
    query: &Query,
    probe: ProbeKind,
    server: SocketAddr,
) -> Result<(), DnsError> {
    let response = client.query(query, server).await?;
    if probe == ProbeKind::Edns0 && !response.supports_edns() {
        return Err(DnsError::InvalidPacket(
            "response carries no EDNS0 OPT record".to_string(),
        ));
    }
    Ok(())
}

pub(crate) async fn probe_nameservers(inspector: &ZoneInspector, report: &mut ZoneReport) {
    let config = &inspector.config;
    let zone = report.zone.fqdn.as_str();

    let jobs: Vec<(String, IpAddr, ProbeKind)> = report
        .nameservers
        .iter()
        .flat_map(|ns| {
            ns.addresses().flat_map(move |address| {
                ProbeKind::ALL
                    .into_iter()
                    .map(move |probe| (ns.name.clone(), address, probe))
            })
        })
        .collect();
    debug!("Running {} probes against {}", jobs.len(), zone);

    let mut outcomes: Vec<ProbeOutcome> = stream::iter(jobs)
        .map(|(nameserver, address, probe)| {
            let query = probe_query(zone, probe, config.edns_payload_size);
            let server = SocketAddr::new(address, config.nameserver_port);
            async move {
                let error = probe_address(inspector.client.as_ref(), &query, probe, server)
                    .await
                    .err();
                ProbeOutcome {
                    nameserver,
                    address,
                    probe,
                    error,
                }
            }
        })
        .buffer_unordered(config.max_concurrent_probes)
        .collect()
        .await;

    // Completion order is arbitrary; keep the trace stable
    outcomes.sort_by(|a, b| {
        (&a.nameserver, a.address, a.probe).cmp(&(&b.nameserver, b.address, b.probe))
    });
    for outcome in &outcomes {
        if let Some(source) = &outcome.error {
            let error = InspectError::Probe {
                probe: outcome.probe,
                address: outcome.address,
                source: source.clone(),
            };
            debug!("{} ({})", error, outcome.nameserver);
            report
                .debug_trace
                .push(format!("{} ({})", error, outcome.nameserver));
        }
    }

    let tally: ProbeTally = outcomes.iter().collect();
    tally.apply(report);

    for (probe, count) in [
        (ProbeKind::Udp, tally.udp),
        (ProbeKind::Tcp, tally.tcp),
        (ProbeKind::Edns0, tally.edns0),
    ] {
        report.debug_trace.push(format!(
            "{} response: {} of {} addresses",
            probe, count.all, report.nsaddr_count_all
        ));
    }
}
