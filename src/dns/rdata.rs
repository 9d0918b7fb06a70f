use std::net::{Ipv4Addr, Ipv6Addr};

use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, BitWriter};

use super::ParseError;
use super::common::{labels_from_name, name_from_labels, read_name, write_name};
use super::enums::DNSResourceType;
use crate::dnssec::{calculate_key_tag, is_secure_entry_point};

/// Decoded RDATA for the record types the inspector looks at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RData {
    A(Ipv4Addr),
    AAAA(Ipv6Addr),
    NS(String),
    SOA(Soa),
    DNSKEY(DnsKey),
    RRSIG(Rrsig),
    DS(Ds),
    DLV(Ds),
    NSEC3PARAM(Nsec3Param),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Soa {
    pub mname: String,
    pub rname: String,
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub minimum: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DnsKey {
    pub flags: u16,
    pub protocol: u8,
    pub algorithm: u8,
    pub public_key: Vec<u8>,
}

impl DnsKey {
    pub fn key_tag(&self) -> u16 {
        calculate_key_tag(self.flags, self.protocol, self.algorithm, &self.public_key)
    }

    /// True for keys with the Secure Entry Point flag, i.e. key-signing keys
    pub fn is_sep(&self) -> bool {
        is_secure_entry_point(self.flags)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rrsig {
    pub type_covered: DNSResourceType,
    pub algorithm: u8,
    pub labels: u8,
    pub original_ttl: u32,
    pub expiration: u32,
    pub inception: u32,
    pub key_tag: u16,
    pub signer_name: String,
    pub signature: Vec<u8>,
}

/// DS and DLV share the same RDATA layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ds {
    pub key_tag: u16,
    pub algorithm: u8,
    pub digest_type: u8,
    pub digest: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Nsec3Param {
    pub hash_algorithm: u8,
    pub flags: u8,
    pub iterations: u16,
    pub salt: Vec<u8>,
}

const RRSIG_FIXED_LEN: usize = 18;

impl RData {
    /// Decode `rdata` for `rtype`. Types without a decoder yield `Ok(None)`.
    pub fn parse(
        rtype: DNSResourceType,
        rdata: &[u8],
        packet: &[u8],
    ) -> Result<Option<Self>, ParseError> {
        let invalid = || ParseError::InvalidRecordData(rtype);

        let parsed = match rtype {
            DNSResourceType::A => {
                let octets: [u8; 4] = rdata.try_into().map_err(|_| invalid())?;
                RData::A(Ipv4Addr::from(octets))
            }
            DNSResourceType::AAAA => {
                let octets: [u8; 16] = rdata.try_into().map_err(|_| invalid())?;
                RData::AAAA(Ipv6Addr::from(octets))
            }
            DNSResourceType::NS => {
                let mut pos = 0;
                let labels = read_name(rdata, &mut pos, packet)?;
                RData::NS(name_from_labels(&labels))
            }
            DNSResourceType::SOA => {
                let mut pos = 0;
                let mname = name_from_labels(&read_name(rdata, &mut pos, packet)?);
                let rname = name_from_labels(&read_name(rdata, &mut pos, packet)?);
                let tail = rdata.get(pos..).filter(|t| t.len() == 20).ok_or_else(invalid)?;
                let mut reader = BitReader::<_, BigEndian>::new(tail);
                RData::SOA(Soa {
                    mname,
                    rname,
                    serial: reader.read_var::<u32>(32)?,
                    refresh: reader.read_var::<u32>(32)?,
                    retry: reader.read_var::<u32>(32)?,
                    expire: reader.read_var::<u32>(32)?,
                    minimum: reader.read_var::<u32>(32)?,
                })
            }
            DNSResourceType::DNSKEY => {
                if rdata.len() < 4 {
                    return Err(invalid());
                }
                let mut reader = BitReader::<_, BigEndian>::new(rdata);
                RData::DNSKEY(DnsKey {
                    flags: reader.read_var::<u16>(16)?,
                    protocol: reader.read_var::<u8>(8)?,
                    algorithm: reader.read_var::<u8>(8)?,
                    public_key: rdata[4..].to_vec(),
                })
            }
            DNSResourceType::RRSIG => {
                if rdata.len() < RRSIG_FIXED_LEN + 1 {
                    return Err(invalid());
                }
                let mut reader = BitReader::<_, BigEndian>::new(&rdata[..RRSIG_FIXED_LEN]);
                let type_covered = reader.read_var::<u16>(16)?.into();
                let algorithm = reader.read_var::<u8>(8)?;
                let labels = reader.read_var::<u8>(8)?;
                let original_ttl = reader.read_var::<u32>(32)?;
                let expiration = reader.read_var::<u32>(32)?;
                let inception = reader.read_var::<u32>(32)?;
                let key_tag = reader.read_var::<u16>(16)?;
                let mut pos = RRSIG_FIXED_LEN;
                let signer = read_name(rdata, &mut pos, packet)?;
                RData::RRSIG(Rrsig {
                    type_covered,
                    algorithm,
                    labels,
                    original_ttl,
                    expiration,
                    inception,
                    key_tag,
                    signer_name: name_from_labels(&signer),
                    signature: rdata[pos..].to_vec(),
                })
            }
            DNSResourceType::DS | DNSResourceType::DLV => {
                if rdata.len() < 4 {
                    return Err(invalid());
                }
                let mut reader = BitReader::<_, BigEndian>::new(rdata);
                let ds = Ds {
                    key_tag: reader.read_var::<u16>(16)?,
                    algorithm: reader.read_var::<u8>(8)?,
                    digest_type: reader.read_var::<u8>(8)?,
                    digest: rdata[4..].to_vec(),
                };
                if rtype == DNSResourceType::DS {
                    RData::DS(ds)
                } else {
                    RData::DLV(ds)
                }
            }
            DNSResourceType::NSEC3PARAM => {
                if rdata.len() < 5 {
                    return Err(invalid());
                }
                let mut reader = BitReader::<_, BigEndian>::new(rdata);
                let hash_algorithm = reader.read_var::<u8>(8)?;
                let flags = reader.read_var::<u8>(8)?;
                let iterations = reader.read_var::<u16>(16)?;
                let salt_len = reader.read_var::<u8>(8)? as usize;
                let salt = rdata.get(5..5 + salt_len).ok_or_else(invalid)?.to_vec();
                RData::NSEC3PARAM(Nsec3Param {
                    hash_algorithm,
                    flags,
                    iterations,
                    salt,
                })
            }
            _ => return Ok(None),
        };

        Ok(Some(parsed))
    }

    pub fn rtype(&self) -> DNSResourceType {
        match self {
            RData::A(_) => DNSResourceType::A,
            RData::AAAA(_) => DNSResourceType::AAAA,
            RData::NS(_) => DNSResourceType::NS,
            RData::SOA(_) => DNSResourceType::SOA,
            RData::DNSKEY(_) => DNSResourceType::DNSKEY,
            RData::RRSIG(_) => DNSResourceType::RRSIG,
            RData::DS(_) => DNSResourceType::DS,
            RData::DLV(_) => DNSResourceType::DLV,
            RData::NSEC3PARAM(_) => DNSResourceType::NSEC3PARAM,
        }
    }

    /// Encode to uncompressed wire format.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ParseError> {
        let mut buf = Vec::new();
        {
            let mut writer: BitWriter<&mut Vec<u8>, BigEndian> = BitWriter::new(&mut buf);
            match self {
                RData::A(addr) => writer.write_bytes(&addr.octets())?,
                RData::AAAA(addr) => writer.write_bytes(&addr.octets())?,
                RData::NS(name) => write_name(&mut writer, &labels_from_name(name))?,
                RData::SOA(soa) => {
                    write_name(&mut writer, &labels_from_name(&soa.mname))?;
                    write_name(&mut writer, &labels_from_name(&soa.rname))?;
                    for value in [soa.serial, soa.refresh, soa.retry, soa.expire, soa.minimum] {
                        writer.write_var::<u32>(32, value)?;
                    }
                }
                RData::DNSKEY(key) => {
                    writer.write_var::<u16>(16, key.flags)?;
                    writer.write_var::<u8>(8, key.protocol)?;
                    writer.write_var::<u8>(8, key.algorithm)?;
                    writer.write_bytes(&key.public_key)?;
                }
                RData::RRSIG(sig) => {
                    writer.write_var::<u16>(16, sig.type_covered.into())?;
                    writer.write_var::<u8>(8, sig.algorithm)?;
                    writer.write_var::<u8>(8, sig.labels)?;
                    writer.write_var::<u32>(32, sig.original_ttl)?;
                    writer.write_var::<u32>(32, sig.expiration)?;
                    writer.write_var::<u32>(32, sig.inception)?;
                    writer.write_var::<u16>(16, sig.key_tag)?;
                    write_name(&mut writer, &labels_from_name(&sig.signer_name))?;
                    writer.write_bytes(&sig.signature)?;
                }
                RData::DS(ds) | RData::DLV(ds) => {
                    writer.write_var::<u16>(16, ds.key_tag)?;
                    writer.write_var::<u8>(8, ds.algorithm)?;
                    writer.write_var::<u8>(8, ds.digest_type)?;
                    writer.write_bytes(&ds.digest)?;
                }
                RData::NSEC3PARAM(param) => {
                    if param.salt.len() > u8::MAX as usize {
                        return Err(ParseError::InvalidRecordData(DNSResourceType::NSEC3PARAM));
                    }
                    writer.write_var::<u8>(8, param.hash_algorithm)?;
                    writer.write_var::<u8>(8, param.flags)?;
                    writer.write_var::<u16>(16, param.iterations)?;
                    writer.write_var::<u8>(8, param.salt.len() as u8)?;
                    writer.write_bytes(&param.salt)?;
                }
            }
        }
        Ok(buf)
    }
}
