use tracing::debug;

use super::ZoneInspector;
use crate::client::Query;
use crate::dns::enums::DNSResourceType;
use crate::dns::rdata::RData;
use crate::error::{DnsError, InspectError};
use crate::report::ZoneReport;

/// Confirm the name is a zone apex by looking up its SOA.
///
/// A timeout is reported as such; every other failure, including a
/// malformed name, means the name is not a zone.
pub(crate) async fn validate_zone(
    inspector: &ZoneInspector,
    report: &mut ZoneReport,
) -> Result<(), InspectError> {
    let zone = report.zone.fqdn.clone();
    if !report.zone.is_well_formed() {
        return Err(InspectError::NotAZone {
            zone: report.zone.name.clone(),
        });
    }

    let query = Query::new(zone.clone(), DNSResourceType::SOA);
    match inspector.recursive(&query).await {
        Ok(response) => {
            if let Some(RData::SOA(soa)) = response.answer_data(DNSResourceType::SOA).next() {
                report.debug_trace.push(format!(
                    "SOA {}: primary {} serial {}",
                    zone, soa.mname, soa.serial
                ));
            }
            Ok(())
        }
        Err(DnsError::Timeout) => Err(InspectError::QueryTimeout {
            name: zone,
            qtype: DNSResourceType::SOA,
        }),
        Err(e) => {
            debug!("SOA lookup for {} failed: {}", zone, e);
            report.debug_trace.push(format!("SOA query for {} failed: {}", zone, e));
            Err(InspectError::NotAZone { zone })
        }
    }
}
