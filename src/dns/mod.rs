pub mod common;
pub mod constants;
pub mod edns;
pub mod enums;
pub mod header;
pub mod question;
pub mod rdata;
pub mod resource;

use bitstream_io::{BigEndian, BitReader, BitWrite, BitWriter};
use common::PacketComponent;
use edns::EdnsOpt;
use enums::DNSResourceType;
use header::DNSHeader;
use question::DNSQuestion;
use rdata::RData;
use resource::DNSResource;
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DNSPacket {
    pub header: DNSHeader,
    pub questions: Vec<DNSQuestion>,
    pub answers: Vec<DNSResource>,
    pub authorities: Vec<DNSResource>,
    pub resources: Vec<DNSResource>,
    /// EDNS0 OPT record if present (extracted from additional records)
    pub edns: Option<EdnsOpt>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Invalid DNS header")]
    InvalidHeader,
    #[error("Invalid DNS label")]
    InvalidLabel,
    #[error("DNS name too long")]
    NameTooLong,
    #[error("Compression pointer loop")]
    PointerLoop,
    #[error("Invalid EDNS option")]
    InvalidOption,
    #[error("Invalid {0} record data")]
    InvalidRecordData(DNSResourceType),
    #[error("Invalid bit stream: {0}")]
    InvalidBitStream(String),
}

impl From<std::io::Error> for ParseError {
    fn from(e: std::io::Error) -> Self {
        ParseError::InvalidBitStream(e.to_string())
    }
}

impl DNSPacket {
    /// Build a single-question query.
    pub fn query(id: u16, name: &str, qtype: DNSResourceType, recursion_desired: bool) -> Self {
        let mut packet = DNSPacket::default();
        packet.header.id = id;
        packet.header.rd = recursion_desired;
        packet.header.qdcount = 1;
        packet.questions.push(DNSQuestion::new(name, qtype));
        packet
    }

    pub fn parse(buf: &[u8]) -> Result<Self, ParseError> {
        trace!("Parsing DNS packet, size: {} bytes", buf.len());
        if buf.len() < 12 {
            return Err(ParseError::InvalidHeader);
        }
        let mut reader = BitReader::<_, BigEndian>::new(buf);
        let mut packet = DNSPacket::default();
        packet.header.read(&mut reader, buf)?;
        debug!(
            "Parsed DNS header: id={}, qr={}, rcode={}, answers={}",
            packet.header.id, packet.header.qr, packet.header.rcode, packet.header.ancount
        );

        for _ in 0..packet.header.qdcount {
            let mut question = DNSQuestion::default();
            question.read(&mut reader, buf)?;
            packet.questions.push(question);
        }

        for _ in 0..packet.header.ancount {
            let mut answer = DNSResource::default();
            answer.read(&mut reader, buf)?;
            packet.answers.push(answer);
        }

        for _ in 0..packet.header.nscount {
            let mut authority = DNSResource::default();
            authority.read(&mut reader, buf)?;
            packet.authorities.push(authority);
        }

        for _ in 0..packet.header.arcount {
            let mut resource = DNSResource::default();
            resource.read(&mut reader, buf)?;

            let is_root_owner = resource.labels.iter().all(|l| l.is_empty());
            if resource.rtype == DNSResourceType::OPT && is_root_owner && packet.edns.is_none() {
                match EdnsOpt::parse_from_resource(resource.raw_class, resource.ttl, &resource.rdata)
                {
                    Ok(edns_opt) => {
                        debug!("Parsed EDNS0 record: {}", edns_opt);
                        packet.edns = Some(edns_opt);
                        continue;
                    }
                    Err(e) => debug!("Failed to parse EDNS OPT record: {}", e),
                }
            }

            packet.resources.push(resource);
        }

        Ok(packet)
    }

    pub fn serialize(&self) -> Result<Vec<u8>, ParseError> {
        let mut header = self.header.clone();
        header.qdcount = self.questions.len() as u16;
        header.ancount = self.answers.len() as u16;
        header.nscount = self.authorities.len() as u16;
        header.arcount = self.resources.len() as u16 + u16::from(self.edns.is_some());

        let mut buf = Vec::new();
        {
            let mut writer: BitWriter<&mut Vec<u8>, BigEndian> = BitWriter::new(&mut buf);
            header.write(&mut writer)?;

            for question in &self.questions {
                question.write(&mut writer)?;
            }
            for record in self
                .answers
                .iter()
                .chain(&self.authorities)
                .chain(&self.resources)
            {
                record.write(&mut writer)?;
            }

            if let Some(edns) = &self.edns {
                let (udp_payload_size, ttl, rdata) = edns.to_resource_format();
                // Root owner name, then TYPE=OPT with the payload size in CLASS
                writer.write_var::<u8>(8, 0)?;
                writer.write_var::<u16>(16, DNSResourceType::OPT.into())?;
                writer.write_var::<u16>(16, udp_payload_size)?;
                writer.write_var::<u32>(32, ttl)?;
                writer.write_var::<u16>(16, rdata.len() as u16)?;
                writer.write_bytes(&rdata)?;
            }
        }

        Ok(buf)
    }

    /// Attach an OPT record advertising `payload_size`, optionally with DO set.
    pub fn add_edns(&mut self, payload_size: u16, do_flag: bool) {
        let mut edns = EdnsOpt::with_payload_size(payload_size);
        edns.set_do_flag(do_flag);
        self.edns = Some(edns);
    }

    pub fn supports_edns(&self) -> bool {
        self.edns.is_some()
    }

    /// Decoded answer-section RDATA of the given type.
    pub fn answer_data(&self, rtype: DNSResourceType) -> impl Iterator<Item = &RData> + '_ {
        self.answers
            .iter()
            .filter(move |rr| rr.rtype == rtype)
            .filter_map(|rr| rr.parsed_rdata.as_ref())
    }

    /// First answer record of the given type, if any.
    pub fn first_answer(&self, rtype: DNSResourceType) -> Option<&DNSResource> {
        self.answers.iter().find(|rr| rr.rtype == rtype)
    }

    /// Turn a query into an empty response carrying the same question.
    pub fn generate_response(&self) -> Self {
        let mut packet = self.clone();
        packet.header.qr = true;
        packet.answers.clear();
        packet.authorities.clear();
        packet.resources.clear();
        packet.edns = None;
        packet
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rdata::{DnsKey, Ds};

    #[test]
    fn test_query_serializes_and_parses() {
        let mut query = DNSPacket::query(0xBEEF, "example.com.", DNSResourceType::SOA, false);
        query.add_edns(1460, true);

        let bytes = query.serialize().unwrap();
        let parsed = DNSPacket::parse(&bytes).unwrap();

        assert_eq!(parsed.header.id, 0xBEEF);
        assert!(!parsed.header.rd);
        assert_eq!(parsed.header.arcount, 1);
        assert_eq!(parsed.questions[0].labels, vec!["example", "com", ""]);
        assert_eq!(parsed.questions[0].qtype, DNSResourceType::SOA);
        let edns = parsed.edns.expect("OPT record should be lifted out");
        assert_eq!(edns.udp_payload_size, 1460);
        assert!(edns.do_flag());
        assert!(parsed.resources.is_empty());
    }

    #[test]
    fn test_response_with_dnssec_records() {
        let query = DNSPacket::query(7, "example.com.", DNSResourceType::DNSKEY, true);
        let mut response = query.generate_response();
        let key = DnsKey {
            flags: 257,
            protocol: 3,
            algorithm: 13,
            public_key: vec![9; 64],
        };
        response
            .answers
            .push(DNSResource::new("example.com.", 3600, RData::DNSKEY(key.clone())).unwrap());
        response.answers.push(
            DNSResource::new(
                "example.com.",
                86400,
                RData::DS(Ds {
                    key_tag: key.key_tag(),
                    algorithm: 13,
                    digest_type: 2,
                    digest: vec![0xAB; 32],
                }),
            )
            .unwrap(),
        );

        let parsed = DNSPacket::parse(&response.serialize().unwrap()).unwrap();
        assert!(parsed.header.qr);
        assert_eq!(parsed.answers.len(), 2);
        assert_eq!(parsed.answers[0].ttl, 3600);
        assert_eq!(
            parsed.answer_data(DNSResourceType::DNSKEY).next(),
            Some(&RData::DNSKEY(key))
        );
        assert!(parsed.first_answer(DNSResourceType::DS).is_some());
    }

    #[test]
    fn test_compressed_answer_names() {
        // Response to "example.com. NS" whose answer owner and NS target
        // point back at the question name.
        let mut bytes = DNSPacket::query(1, "example.com.", DNSResourceType::NS, true)
            .serialize()
            .unwrap();
        bytes[2] |= 0x80; // QR
        bytes[7] = 1; // ANCOUNT
        bytes.extend_from_slice(&[0xC0, 0x0C, 0x00, 0x02, 0x00, 0x01]);
        bytes.extend_from_slice(&300u32.to_be_bytes());
        bytes.extend_from_slice(&[0x00, 0x06, 0x03, b'n', b's', b'1', 0xC0, 0x0C]);

        let parsed = DNSPacket::parse(&bytes).unwrap();
        assert_eq!(parsed.answers[0].name(), "example.com.");
        assert_eq!(
            parsed.answers[0].parsed_rdata,
            Some(RData::NS("ns1.example.com.".to_string()))
        );
    }

    #[test]
    fn test_short_buffer_is_an_error() {
        assert!(DNSPacket::parse(&[0, 1, 2]).is_err());
        let mut bytes = DNSPacket::query(1, "example.com.", DNSResourceType::A, true)
            .serialize()
            .unwrap();
        bytes[7] = 1; // claims an answer that is not there
        assert!(DNSPacket::parse(&bytes).is_err());
    }
}
