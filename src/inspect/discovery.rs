use futures::future::join_all;
use tracing::{debug, warn};

use super::ZoneInspector;
use crate::client::Query;
use crate::dns::enums::DNSResourceType;
use crate::dns::rdata::RData;
use crate::error::InspectError;
use crate::report::{NameServer, ZoneReport};

/// Look up the zone's NS set and resolve every target.
///
/// Nothing here is fatal. A failed NS lookup leaves the nameserver list
/// empty and a nameserver whose addresses cannot be resolved is left out.
pub(crate) async fn discover_nameservers(inspector: &ZoneInspector, report: &mut ZoneReport) {
    let zone = report.zone.fqdn.clone();
    let query = Query::new(zone.clone(), DNSResourceType::NS);

    let targets: Vec<String> = match inspector.recursive(&query).await {
        Ok(response) => response
            .answer_data(DNSResourceType::NS)
            .filter_map(|rdata| match rdata {
                RData::NS(host) => Some(host.to_ascii_lowercase()),
                _ => None,
            })
            .collect(),
        Err(e) => {
            debug!("NS lookup for {} failed: {}", zone, e);
            report.debug_trace.push(format!("NS query for {} failed: {}", zone, e));
            Vec::new()
        }
    };

    report.ns_count_all = targets.len();
    report
        .debug_trace
        .push(format!("{} NS records for {}", targets.len(), zone));

    // Resolution results come back in NS order
    let resolved = join_all(
        targets
            .iter()
            .map(|host| inspector.resolver.resolve_addresses(host)),
    )
    .await;

    for (host, result) in targets.into_iter().zip(resolved) {
        match result {
            Ok(addresses) => {
                let nameserver = NameServer::new(host, &addresses);
                report.debug_trace.push(format!(
                    "{}: {} IPv4, {} IPv6 addresses",
                    nameserver.name,
                    nameserver.ipv4.len(),
                    nameserver.ipv6.len()
                ));
                report.record_nameserver(nameserver);
            }
            Err(source) => {
                let error = InspectError::Resolution { host, source };
                warn!("{}", error);
                report.debug_trace.warning(&error);
            }
        }
    }
}
