use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use zoneinfo::dns::DNSPacket;
use zoneinfo::dns::enums::DNSResourceType;
use zoneinfo::dns::rdata::{DnsKey, RData, Rrsig};
use zoneinfo::dns::resource::DNSResource;

fn create_query_packet() -> Vec<u8> {
    let mut query = DNSPacket::query(0x1234, "example.com.", DNSResourceType::SOA, false);
    query.add_edns(1460, false);
    query.serialize().unwrap_or_default()
}

/// DNSKEY response the way a signed zone answers a DO query: two keys
/// and an RRSIG over them.
fn create_dnskey_response() -> Vec<u8> {
    let mut query = DNSPacket::query(0x4321, "example.com.", DNSResourceType::DNSKEY, true);
    query.add_edns(4096, true);
    let mut response = query.generate_response();
    response.add_edns(4096, true);

    for (flags, fill) in [(257u16, 0xA5u8), (256, 0x5A)] {
        let key = DnsKey {
            flags,
            protocol: 3,
            algorithm: 8,
            public_key: vec![fill; 260],
        };
        if let Ok(rr) = DNSResource::new("example.com.", 3600, RData::DNSKEY(key)) {
            response.answers.push(rr);
        }
    }
    let sig = Rrsig {
        type_covered: DNSResourceType::DNSKEY,
        algorithm: 8,
        labels: 2,
        original_ttl: 3600,
        expiration: 1_900_000_000,
        inception: 1_700_000_000,
        key_tag: 12834,
        signer_name: "example.com.".to_string(),
        signature: vec![0x11; 256],
    };
    if let Ok(rr) = DNSResource::new("example.com.", 3600, RData::RRSIG(sig)) {
        response.answers.push(rr);
    }
    response.serialize().unwrap_or_default()
}

fn bench_packet_parsing(c: &mut Criterion) {
    let query = create_query_packet();
    let dnskey = create_dnskey_response();

    c.bench_function("parse soa query", |b| {
        b.iter(|| DNSPacket::parse(black_box(&query)))
    });

    c.bench_function("parse dnskey response", |b| {
        b.iter(|| DNSPacket::parse(black_box(&dnskey)))
    });

    c.bench_function("key tags from dnskey response", |b| {
        b.iter(|| {
            let packet = DNSPacket::parse(black_box(&dnskey)).ok()?;
            let tags: Vec<u16> = packet
                .answer_data(DNSResourceType::DNSKEY)
                .filter_map(|rdata| match rdata {
                    RData::DNSKEY(key) => Some(key.key_tag()),
                    _ => None,
                })
                .collect();
            Some(tags)
        })
    });
}

criterion_group!(benches, bench_packet_parsing);
criterion_main!(benches);
