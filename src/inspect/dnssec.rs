//! DNSSEC inspection: DNSKEY and its signatures first, then NSEC3PARAM,
//! DS and DLV, but only for zones found to be signed.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::ZoneInspector;
use crate::client::Query;
use crate::dns::DNSPacket;
use crate::dns::enums::DNSResourceType;
use crate::dns::rdata::{Ds, RData, Rrsig};
use crate::dnssec::{DigestType, DnsSecAlgorithm, algorithm_name, digest_name};
use crate::error::InspectError;
use crate::report::{KeySignature, Nsec3Params, SignatureWindow, ZoneReport};

pub(crate) async fn inspect_dnssec(inspector: &ZoneInspector, report: &mut ZoneReport) {
    check_dnskey(inspector, report).await;
    if !report.has_dnssec {
        report
            .debug_trace
            .push("DNSSEC not detected, skipping NSEC3PARAM, DS and DLV");
        return;
    }

    check_nsec3param(inspector, report).await;
    check_ds(inspector, report).await;
    if inspector.config.check_dlv {
        check_dlv(inspector, report).await;
    } else {
        report.debug_trace.push("DLV lookup disabled");
    }
}

/// DO-bit lookup through the recursive resolvers. Failures go to the
/// trace and come back as `None`.
async fn dnssec_lookup(
    inspector: &ZoneInspector,
    report: &mut ZoneReport,
    name: &str,
    qtype: DNSResourceType,
) -> Option<DNSPacket> {
    let query = Query::new(name, qtype).with_edns(inspector.config.dnssec_payload_size, true);
    match inspector.recursive(&query).await {
        Ok(response) => Some(response),
        Err(source) => {
            let error = InspectError::DnssecLookup {
                name: name.to_string(),
                qtype,
                source,
            };
            debug!("{}", error);
            report.debug_trace.push(error.to_string());
            None
        }
    }
}

async fn check_dnskey(inspector: &ZoneInspector, report: &mut ZoneReport) {
    let zone = report.zone.fqdn.clone();
    let Some(response) = dnssec_lookup(inspector, report, &zone, DNSResourceType::DNSKEY).await
    else {
        return;
    };

    report.dnskey_ttl = response
        .first_answer(DNSResourceType::DNSKEY)
        .map(|rr| rr.ttl);

    for rdata in response.answer_data(DNSResourceType::DNSKEY) {
        let RData::DNSKEY(key) = rdata else { continue };
        let signature = KeySignature {
            keytag: key.key_tag(),
            algorithm: key.algorithm,
        };
        let role = if key.is_sep() { "KSK" } else { "ZSK" };
        report.debug_trace.push(format!(
            "DNSKEY {}: keytag {} algorithm {}",
            role,
            signature.keytag,
            algorithm_name(signature.algorithm)
        ));
        if DnsSecAlgorithm::from_u8(key.algorithm).is_some_and(|alg| alg.is_deprecated()) {
            report.debug_trace.warning(format!(
                "{} {} uses deprecated algorithm {}",
                role,
                signature.keytag,
                algorithm_name(signature.algorithm)
            ));
        }
        if key.is_sep() {
            report.ksk_list.push(signature);
        } else {
            report.zsk_list.push(signature);
        }
    }

    let now = Utc::now();
    let windows: Vec<SignatureWindow> = response
        .answer_data(DNSResourceType::RRSIG)
        .filter_map(|rdata| match rdata {
            RData::RRSIG(sig) if sig.type_covered == DNSResourceType::DNSKEY => Some(sig),
            _ => None,
        })
        .map(|sig| signature_window(sig, now))
        .collect();

    for window in &windows {
        if window.expired {
            report.rrsig_expired = true;
            report.debug_trace.warning(format!(
                "RRSIG over DNSKEY by keytag {} expired at {}",
                window.keytag,
                format_time(window.expiration)
            ));
        } else {
            report.debug_trace.push(format!(
                "RRSIG over DNSKEY by keytag {} valid until {}",
                window.keytag,
                format_time(window.expiration)
            ));
        }
    }

    if windows.is_empty() {
        report
            .debug_trace
            .warning(format!("DNSKEY records for {} carry no RRSIG", zone));
    } else {
        report.has_dnssec = true;
        info!(
            "{} is signed: {} KSK, {} ZSK",
            zone,
            report.ksk_list.len(),
            report.zsk_list.len()
        );
    }
    report.rrsig_windows = windows;
}

/// Inception and expiration as UTC times; expired when now is past expiration.
pub fn signature_window(sig: &Rrsig, now: DateTime<Utc>) -> SignatureWindow {
    let inception = DateTime::from_timestamp(i64::from(sig.inception), 0);
    let expiration = DateTime::from_timestamp(i64::from(sig.expiration), 0);
    SignatureWindow {
        keytag: sig.key_tag,
        algorithm: sig.algorithm,
        inception,
        expiration,
        expired: expiration.is_some_and(|expiration| now > expiration),
    }
}

fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "an unrepresentable time".to_string())
}

async fn check_nsec3param(inspector: &ZoneInspector, report: &mut ZoneReport) {
    let zone = report.zone.fqdn.clone();
    let Some(response) =
        dnssec_lookup(inspector, report, &zone, DNSResourceType::NSEC3PARAM).await
    else {
        return;
    };

    for rdata in response.answer_data(DNSResourceType::NSEC3PARAM) {
        let RData::NSEC3PARAM(param) = rdata else { continue };
        let params = Nsec3Params {
            hash_algorithm: param.hash_algorithm,
            flags: param.flags,
            iterations: param.iterations,
            salt_length: param.salt.len() as u8,
        };
        report.debug_trace.push(format!(
            "NSEC3PARAM: hash {} flags {} iterations {} salt length {}",
            params.hash_algorithm, params.flags, params.iterations, params.salt_length
        ));
        report.nsec3_params.push(params);
    }
    report.has_nsec3 = !report.nsec3_params.is_empty();
}

async fn check_ds(inspector: &ZoneInspector, report: &mut ZoneReport) {
    let zone = report.zone.fqdn.clone();
    let Some(response) = dnssec_lookup(inspector, report, &zone, DNSResourceType::DS).await
    else {
        return;
    };

    let records: Vec<&Ds> = response
        .answer_data(DNSResourceType::DS)
        .filter_map(|rdata| match rdata {
            RData::DS(ds) => Some(ds),
            _ => None,
        })
        .collect();
    report.ds_list = delegation_digests(report, "DS", &records);
    report.has_ds = !report.ds_list.is_empty();
}

async fn check_dlv(inspector: &ZoneInspector, report: &mut ZoneReport) {
    let name = report.zone.under(&inspector.config.dlv_suffix);
    let Some(response) = dnssec_lookup(inspector, report, &name, DNSResourceType::DLV).await
    else {
        return;
    };

    let records: Vec<&Ds> = response
        .answer_data(DNSResourceType::DLV)
        .filter_map(|rdata| match rdata {
            RData::DLV(dlv) => Some(dlv),
            _ => None,
        })
        .collect();
    report.dlv_list = delegation_digests(report, "DLV", &records);
    report.has_dlv = !report.dlv_list.is_empty();
}

/// (keytag, digest type) per DS or DLV record, warning about records that
/// reference no known KSK or whose digest has the wrong length.
fn delegation_digests(report: &mut ZoneReport, kind: &str, records: &[&Ds]) -> Vec<KeySignature> {
    let mut digests = Vec::with_capacity(records.len());
    for ds in records {
        report.debug_trace.push(format!(
            "{}: keytag {} algorithm {} digest {}",
            kind,
            ds.key_tag,
            algorithm_name(ds.algorithm),
            digest_name(ds.digest_type)
        ));

        if report.ksk_for(ds.key_tag).is_none() {
            report.debug_trace.warning(format!(
                "{} keytag {} does not match any KSK",
                kind, ds.key_tag
            ));
        }
        if let Some(digest_type) = DigestType::from_u8(ds.digest_type) {
            if ds.digest.len() != digest_type.digest_len() {
                report.debug_trace.warning(format!(
                    "{} keytag {} has a {} byte {} digest, expected {}",
                    kind,
                    ds.key_tag,
                    ds.digest.len(),
                    digest_type,
                    digest_type.digest_len()
                ));
            }
        }

        digests.push(KeySignature {
            keytag: ds.key_tag,
            algorithm: ds.digest_type,
        });
    }
    digests
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn rrsig(inception: u32, expiration: u32) -> Rrsig {
        Rrsig {
            type_covered: DNSResourceType::DNSKEY,
            algorithm: 13,
            labels: 2,
            original_ttl: 3600,
            expiration,
            inception,
            key_tag: 12834,
            signer_name: "example.com.".to_string(),
            signature: vec![0; 64],
        }
    }

    #[test]
    fn test_signature_window_expiry() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let jan = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap().timestamp() as u32;
        let dec = Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap().timestamp() as u32;

        let live = signature_window(&rrsig(jan, dec), now);
        assert!(!live.expired);
        assert_eq!(live.keytag, 12834);
        assert_eq!(live.inception.map(|t| t.timestamp() as u32), Some(jan));

        let stale = signature_window(&rrsig(jan - 86400, jan), now);
        assert!(stale.expired);
    }

    #[test]
    fn test_ds_cross_check_warnings() {
        use crate::report::Zone;

        let mut report = ZoneReport::stub(Zone::new("example.com"));
        report.ksk_list.push(KeySignature {
            keytag: 12834,
            algorithm: 10,
        });
        let good = Ds {
            key_tag: 12834,
            algorithm: 10,
            digest_type: 2,
            digest: vec![0xAB; 32],
        };
        let orphan = Ds {
            key_tag: 4242,
            algorithm: 10,
            digest_type: 2,
            digest: vec![0xAB; 20],
        };

        let digests = delegation_digests(&mut report, "DS", &[&good, &orphan]);
        assert_eq!(digests.len(), 2);
        assert_eq!(digests[0], KeySignature { keytag: 12834, algorithm: 2 });

        let warnings: Vec<&String> = report
            .debug_trace
            .entries()
            .iter()
            .filter(|e| e.starts_with("WARNING: "))
            .collect();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("4242 does not match any KSK"));
        assert!(warnings[1].contains("20 byte"));
    }
}
