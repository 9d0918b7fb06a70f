use std::fmt::{self, Write};

use crate::dnssec::{algorithm_name, digest_name};
use crate::report::{ProbeKind, SuccessCount, ZoneReport};

/// Plain-text summary of a finished report.
pub fn render_report(report: &ZoneReport) -> String {
    report.to_string()
}

impl fmt::Display for ZoneReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_report(f, self)
    }
}

fn write_report(out: &mut impl Write, report: &ZoneReport) -> fmt::Result {
    writeln!(out, "### Zone: {}", report.zone)?;
    writeln!(
        out,
        "Checked at {} in {:.3}s",
        report.check_start.format("%Y-%m-%d %H:%M:%S UTC"),
        report.check_duration.as_secs_f64()
    )?;
    writeln!(
        out,
        "{} Nameserver records ({} with IPv4, {} with IPv6)",
        report.ns_count_all, report.ns_count_ip4, report.ns_count_ip6
    )?;
    writeln!(
        out,
        "{} Nameserver addresses ({} IPv4, {} IPv6)",
        report.nsaddr_count_all, report.nsaddr_count_ip4, report.nsaddr_count_ip6
    )?;
    for ns in &report.nameservers {
        let addresses: Vec<String> = ns.addresses().map(|a| a.to_string()).collect();
        writeln!(out, "  {} {}", ns.name, addresses.join(" "))?;
    }

    for (probe, count) in [
        (ProbeKind::Udp, report.nsaddr_success_udp),
        (ProbeKind::Tcp, report.nsaddr_success_tcp),
        (ProbeKind::Edns0, report.nsaddr_success_edns0),
    ] {
        write_probe_line(out, report, probe, count)?;
    }
    if !report.has_tcp {
        writeln!(out, "Not all nameservers respond over TCP")?;
    }
    if !report.has_ip6 {
        writeln!(out, "No IPv6 nameserver addresses")?;
    }

    if !report.has_dnssec {
        writeln!(out, "Zone does not have DNSSEC enabled")?;
        return Ok(());
    }

    writeln!(out, "Zone has DNSSEC enabled")?;
    if let Some(ttl) = report.dnskey_ttl {
        writeln!(out, "  DNSKEY TTL: {}", ttl)?;
    }
    for ksk in &report.ksk_list {
        writeln!(
            out,
            "  KSK: keytag {} algorithm {} ({})",
            ksk.keytag,
            ksk.algorithm,
            algorithm_name(ksk.algorithm)
        )?;
    }
    for zsk in &report.zsk_list {
        writeln!(
            out,
            "  ZSK: keytag {} algorithm {} ({})",
            zsk.keytag,
            zsk.algorithm,
            algorithm_name(zsk.algorithm)
        )?;
    }
    for window in &report.rrsig_windows {
        let expiration = window
            .expiration
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_default();
        writeln!(
            out,
            "  RRSIG(DNSKEY): keytag {} expires {}{}",
            window.keytag,
            expiration,
            if window.expired { " (EXPIRED)" } else { "" }
        )?;
    }

    if report.has_nsec3 {
        for params in &report.nsec3_params {
            writeln!(
                out,
                "  NSEC3PARAM: hash {} flags {} iterations {} salt length {}",
                params.hash_algorithm, params.flags, params.iterations, params.salt_length
            )?;
        }
    } else {
        writeln!(out, "  No NSEC3PARAM record")?;
    }

    if report.has_ds {
        for ds in &report.ds_list {
            writeln!(
                out,
                "  DS: keytag {} digest {} ({})",
                ds.keytag,
                ds.algorithm,
                digest_name(ds.algorithm)
            )?;
        }
    } else {
        writeln!(out, "  No DS record in parent zone")?;
    }

    for dlv in &report.dlv_list {
        writeln!(
            out,
            "  DLV: keytag {} digest {} ({})",
            dlv.keytag,
            dlv.algorithm,
            digest_name(dlv.algorithm)
        )?;
    }
    Ok(())
}

fn write_probe_line(
    out: &mut impl Write,
    report: &ZoneReport,
    probe: ProbeKind,
    count: SuccessCount,
) -> fmt::Result {
    writeln!(
        out,
        "{} response: {} of {} servers ({} of {} IPv4, {} of {} IPv6)",
        probe,
        count.all,
        report.nsaddr_count_all,
        count.ip4,
        report.nsaddr_count_ip4,
        count.ip6,
        report.nsaddr_count_ip6
    )?;
    for status in report.unresponsive(probe) {
        writeln!(out, "  no response: {} {}", status.nameserver, status.address)?;
    }
    Ok(())
}
